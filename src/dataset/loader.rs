//! CSV file loading
//!
//! The first record is the header; every following record is a data row.
//! Column types are inferred once the whole file has been read.

use csv::StringRecord;
use std::path::Path;

use super::error::LoadError;
use super::value::{convert_cell, infer_column_type};
use super::Dataset;

/// Parse one CSV file into a `Dataset`
pub fn load_csv(path: &Path) -> Result<Dataset, LoadError> {
    let data = std::fs::read(path).map_err(|e| LoadError::from_io(path, e))?;

    // The csv reader silently closes a quoted field at EOF
    if let Some(line) = unterminated_quote_line(&data) {
        return Err(LoadError::parse(path, line, "unterminated quoted field"));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(data.as_slice());

    let mut records = reader.records();

    let header = match records.next() {
        Some(result) => result.map_err(|e| LoadError::from_csv(path, e))?,
        None => return Err(LoadError::parse(path, 1, "missing header row")),
    };
    if header.iter().all(|name| name.trim().is_empty()) {
        return Err(LoadError::parse(path, line_of(&header), "header row is empty"));
    }
    let columns = header_names(&header);

    let mut raw_rows = Vec::new();
    for result in records {
        let record = result.map_err(|e| LoadError::from_csv(path, e))?;
        if is_blank(&record) {
            continue;
        }
        if record.len() > columns.len() {
            return Err(LoadError::parse(
                path,
                line_of(&record),
                format!("expected {} fields, saw {}", columns.len(), record.len()),
            ));
        }
        raw_rows.push(record);
    }

    let column_types: Vec<_> = (0..columns.len())
        .map(|i| infer_column_type(raw_rows.iter().map(|r| r.get(i))))
        .collect();

    let rows = raw_rows
        .iter()
        .map(|record| {
            column_types
                .iter()
                .enumerate()
                .map(|(i, ty)| convert_cell(record.get(i), *ty))
                .collect()
        })
        .collect();

    Ok(Dataset::new(columns, rows))
}

/// Header names with blanks replaced by `Unnamed: <i>` and repeats suffixed `.1`, `.2`, ...
fn header_names(header: &StringRecord) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(header.len());
    for (i, raw) in header.iter().enumerate() {
        let base = if raw.trim().is_empty() {
            format!("Unnamed: {i}")
        } else {
            raw.to_string()
        };
        let mut name = base.clone();
        let mut suffix = 0;
        while names.contains(&name) {
            suffix += 1;
            name = format!("{base}.{suffix}");
        }
        names.push(name);
    }
    names
}

fn is_blank(record: &StringRecord) -> bool {
    record.len() == 1 && record.get(0).is_some_and(|f| f.trim().is_empty())
}

/// Line on which a quoted field opens without ever closing, if any
///
/// Follows the reader's rules: a quote only opens a field at its start and
/// `""` inside a quoted field is an escaped quote.
fn unterminated_quote_line(data: &[u8]) -> Option<u64> {
    let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);
    let mut line = 1;
    let mut field_start = true;
    let mut opened_at = None;

    let mut bytes = data.iter().peekable();
    while let Some(&b) = bytes.next() {
        if b == b'\n' {
            line += 1;
        }
        match opened_at {
            Some(_) if b == b'"' => {
                if bytes.peek() == Some(&&b'"') {
                    bytes.next();
                } else {
                    opened_at = None;
                }
            }
            Some(_) => {}
            None => {
                if field_start && b == b'"' {
                    opened_at = Some(line);
                }
                field_start = matches!(b, b',' | b'\n' | b'\r');
            }
        }
    }
    opened_at
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map_or(0, csv::Position::line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Value;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn load_str(content: &[u8]) -> Result<Dataset, LoadError> {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        load_csv(file.path())
    }

    #[test]
    fn test_load_typed_columns() {
        let dataset = load_str(
            b"Name of Lake,Year,Min pH,Monitored\nDal Lake,2020,7.1,true\nWular Lake,2020,6.8,false\n",
        )
        .unwrap();

        assert_eq!(dataset.columns(), ["Name of Lake", "Year", "Min pH", "Monitored"]);
        assert_eq!(dataset.len(), 2);

        let row = dataset.record(1).unwrap();
        assert_eq!(row.get("Name of Lake"), Some(&Value::from("Wular Lake")));
        assert_eq!(row.get("Year"), Some(&Value::Integer(2020)));
        assert_eq!(row.get("Min pH"), Some(&Value::Float(6.8)));
        assert_eq!(row.get("Monitored"), Some(&Value::Bool(false)));
    }

    #[test]
    fn test_short_rows_and_missing_tokens_become_null() {
        let dataset = load_str(b"a,b,c\n1,,NaN\n2\n").unwrap();

        let first = dataset.record(0).unwrap();
        assert_eq!(first.get("b"), Some(&Value::Null));
        assert_eq!(first.get("c"), Some(&Value::Null));

        let second = dataset.record(1).unwrap();
        assert_eq!(second.get("a"), Some(&Value::Integer(2)));
        assert_eq!(second.get("c"), Some(&Value::Null));
    }

    #[test]
    fn test_quoted_fields() {
        let dataset = load_str(b"label,note\n\"Dal, Srinagar\",\"said \"\"hi\"\"\"\n").unwrap();
        let row = dataset.record(0).unwrap();
        assert_eq!(row.get("label"), Some(&Value::from("Dal, Srinagar")));
        assert_eq!(row.get("note"), Some(&Value::from("said \"hi\"")));
    }

    #[test]
    fn test_duplicate_and_blank_header_names() {
        let dataset = load_str(b"x,,x,x\n1,2,3,4\n").unwrap();
        assert_eq!(dataset.columns(), ["x", "Unnamed: 1", "x.1", "x.2"]);
    }

    #[test]
    fn test_header_only_file_is_empty_dataset() {
        let dataset = load_str(b"date,value\n").unwrap();
        assert!(dataset.is_empty());
        assert_eq!(dataset.columns(), ["date", "value"]);
    }

    #[test]
    fn test_empty_file_is_parse_error() {
        let err = load_str(b"").unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
    }

    #[test]
    fn test_blank_header_is_parse_error() {
        let err = load_str(b",,\n1,2,3\n").unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
    }

    #[test]
    fn test_too_many_fields_is_parse_error() {
        let err = load_str(b"a,b\n1,2\n1,2,3\n").unwrap_err();
        match err {
            LoadError::Parse { line, message, .. } => {
                assert_eq!(line, 3);
                assert!(message.contains("expected 2 fields"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_utf8_is_parse_error() {
        let err = load_str(b"a,b\n\xff\xfe,1\n").unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
    }

    #[test]
    fn test_unterminated_quote_is_parse_error() {
        let err = load_str(b"a,b\n\"1,2\n3,4\n").unwrap_err();
        match err {
            LoadError::Parse { line, message, .. } => {
                assert_eq!(line, 2);
                assert!(message.contains("unterminated quoted field"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_closed_quotes_spanning_lines_are_accepted() {
        let dataset = load_str(b"label,note\n\"Wular\nLake\",ab\"c\n").unwrap();
        let row = dataset.record(0).unwrap();
        assert_eq!(row.get("label"), Some(&Value::from("Wular\nLake")));
        assert_eq!(row.get("note"), Some(&Value::from("ab\"c")));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err = load_csv(Path::new("no/such/dir/actual.csv")).unwrap_err();
        assert!(matches!(err, LoadError::NotFound { .. }));
    }
}
