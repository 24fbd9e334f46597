//! Cell values and per-column type inference
//!
//! Every column of a loaded CSV file is typed as a whole: a column becomes
//! boolean, integer or float only when *all* of its non-missing cells agree,
//! otherwise it stays text. Missing-value tokens always become `Null`.

use serde::{Serialize, Serializer};

/// Tokens treated as a missing value, compared verbatim against the raw cell
const MISSING_TOKENS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "NULL", "null", "None", "#N/A", "#NA",
    "<NA>",
];

/// A single scalar cell
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    /// Integers above `i64::MAX`
    Unsigned(u64),
    /// Always finite
    Float(f64),
    Text(String),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Integer(i) => serializer.serialize_i64(*i),
            Self::Unsigned(u) => serializer.serialize_u64(*u),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::Text(s) => serializer.serialize_str(s),
        }
    }
}

/// Inferred type of a whole column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// No non-missing cells at all
    Empty,
    Bool,
    Integer,
    Unsigned,
    Float,
    Text,
}

pub fn is_missing(raw: &str) -> bool {
    MISSING_TOKENS.contains(&raw)
}

fn parse_bool(raw: &str) -> Option<bool> {
    if raw.eq_ignore_ascii_case("true") {
        Some(true)
    } else if raw.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn parse_float(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Decide the type of a column from its raw cells
pub fn infer_column_type<'a, I>(cells: I) -> ColumnType
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut present = cells
        .into_iter()
        .flatten()
        .filter(|raw| !is_missing(raw))
        .map(str::trim)
        .peekable();

    if present.peek().is_none() {
        return ColumnType::Empty;
    }

    let (mut bools, mut ints, mut uints, mut floats) = (true, true, true, true);
    for raw in present {
        bools = bools && parse_bool(raw).is_some();
        ints = ints && raw.parse::<i64>().is_ok();
        uints = uints && raw.parse::<u64>().is_ok();
        floats = floats && parse_float(raw).is_some();
        if !bools && !floats {
            return ColumnType::Text;
        }
    }

    if bools {
        ColumnType::Bool
    } else if ints {
        ColumnType::Integer
    } else if uints {
        ColumnType::Unsigned
    } else if floats {
        ColumnType::Float
    } else {
        ColumnType::Text
    }
}

/// Convert a raw cell under an already inferred column type
///
/// `None` stands for a cell beyond the end of a short row.
pub fn convert_cell(raw: Option<&str>, column_type: ColumnType) -> Value {
    let Some(raw) = raw.filter(|r| !is_missing(r)) else {
        return Value::Null;
    };
    let trimmed = raw.trim();
    match column_type {
        ColumnType::Empty => Value::Null,
        ColumnType::Bool => parse_bool(trimmed).map_or(Value::Null, Value::Bool),
        ColumnType::Integer => trimmed.parse().map_or(Value::Null, Value::Integer),
        ColumnType::Unsigned => trimmed.parse().map_or(Value::Null, Value::Unsigned),
        ColumnType::Float => parse_float(trimmed).map_or(Value::Null, Value::Float),
        ColumnType::Text => Value::Text(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn infer(cells: &[&str]) -> ColumnType {
        infer_column_type(cells.iter().map(|c| Some(*c)))
    }

    #[test]
    fn test_integer_column() {
        assert_eq!(infer(&["10", "-3", " 7 "]), ColumnType::Integer);
    }

    #[test]
    fn test_mixed_int_and_float_is_float() {
        assert_eq!(infer(&["1", "2.5", "3e2"]), ColumnType::Float);
    }

    #[test]
    fn test_any_text_makes_text() {
        assert_eq!(infer(&["1", "2024-01-01"]), ColumnType::Text);
        assert_eq!(infer(&["true", "maybe"]), ColumnType::Text);
    }

    #[test]
    fn test_bool_column() {
        assert_eq!(infer(&["True", "false", "TRUE"]), ColumnType::Bool);
    }

    #[test]
    fn test_missing_cells_are_ignored_for_inference() {
        assert_eq!(infer(&["", "NaN", "4"]), ColumnType::Integer);
        assert_eq!(infer(&["", "NA", "null"]), ColumnType::Empty);
    }

    #[test]
    fn test_integers_beyond_i64_stay_exact() {
        assert_eq!(
            infer(&["9223372036854775808", "3"]),
            ColumnType::Unsigned
        );
        assert_eq!(
            convert_cell(Some("18446744073709551615"), ColumnType::Unsigned),
            Value::Unsigned(u64::MAX)
        );
        assert_eq!(
            serde_json::to_string(&Value::Unsigned(9_223_372_036_854_775_808)).unwrap(),
            "9223372036854775808"
        );
        assert_eq!(infer(&["9223372036854775808", "-1"]), ColumnType::Float);
    }

    #[test]
    fn test_infinity_is_not_numeric() {
        assert_eq!(infer(&["1.5", "inf"]), ColumnType::Text);
    }

    #[test]
    fn test_convert_cell() {
        assert_eq!(convert_cell(Some("12"), ColumnType::Integer), Value::Integer(12));
        assert_eq!(convert_cell(Some("1.25"), ColumnType::Float), Value::Float(1.25));
        assert_eq!(convert_cell(Some("N/A"), ColumnType::Integer), Value::Null);
        assert_eq!(convert_cell(None, ColumnType::Text), Value::Null);
        assert_eq!(
            convert_cell(Some(" Dal Lake "), ColumnType::Text),
            Value::Text(" Dal Lake ".to_string())
        );
    }

    #[test]
    fn test_serialize_values() {
        let values = vec![
            Value::Null,
            Value::Bool(true),
            Value::Integer(10),
            Value::Float(7.5),
            Value::from("x"),
        ];
        assert_eq!(
            serde_json::to_string(&values).unwrap(),
            r#"[null,true,10,7.5,"x"]"#
        );
    }
}
