//! Dataset module
//!
//! Loads the actual and forecast CSV files, tags each row with its provenance
//! and concatenates them into the single immutable table served by the API.

mod error;
mod loader;
mod merge;
mod value;

pub use error::LoadError;
pub use loader::load_csv;
pub use merge::{concat, tag, Provenance, SOURCE_COLUMN};
pub use value::Value;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::path::Path;

/// An ordered list of rows sharing one ordered column list
///
/// Every row holds exactly one value per column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Dataset {
    /// Build a dataset, padding short rows with nulls and cutting long ones
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Value::Null);
                row
            })
            .collect();
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn record(&self, index: usize) -> Option<Record<'_>> {
        self.rows.get(index).map(|values| Record {
            columns: &self.columns,
            values,
        })
    }

    pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
        self.rows.iter().map(|values| Record {
            columns: &self.columns,
            values,
        })
    }

    pub(crate) fn into_parts(self) -> (Vec<String>, Vec<Vec<Value>>) {
        (self.columns, self.rows)
    }
}

/// Borrowed view of one row as a column-name to value mapping
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    columns: &'a [String],
    values: &'a [Value],
}

impl<'a> Record<'a> {
    pub fn get(&self, column: &str) -> Option<&'a Value> {
        let values: &'a [Value] = self.values;
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|i| values.get(i))
    }

    pub fn fields(&self) -> impl Iterator<Item = (&'a str, &'a Value)> {
        let (columns, values): (&'a [String], &'a [Value]) = (self.columns, self.values);
        columns.iter().map(String::as_str).zip(values)
    }
}

impl Serialize for Record<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, value) in self.fields() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Serialized as a JSON array of objects, keys in column order
impl Serialize for Dataset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for record in self.records() {
            seq.serialize_element(&record)?;
        }
        seq.end()
    }
}

/// Load both input files and merge them: actual rows first, then forecast rows
pub fn load(actual_path: &Path, forecast_path: &Path) -> Result<Dataset, LoadError> {
    let actual = tag(load_csv(actual_path)?, Provenance::Actual);
    let forecast = tag(load_csv(forecast_path)?, Provenance::Forecast);
    Ok(concat(actual, forecast))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_date_value_scenario() {
        let actual = csv_file("date,value\n2024-01-01,10\n");
        let forecast = csv_file("date,value\n2024-01-02,12\n");

        let dataset = load(actual.path(), forecast.path()).unwrap();
        assert_eq!(
            serde_json::to_string(&dataset).unwrap(),
            r#"[{"date":"2024-01-01","value":10,"Source":"Actual"},{"date":"2024-01-02","value":12,"Source":"Forecast"}]"#
        );
    }

    #[test]
    fn test_length_and_source_order() {
        let actual = csv_file("Year,Min pH\n2019,7.1\n2020,7.3\n2021,7.2\n");
        let forecast = csv_file("Year,Min pH\n2022,7.0\n2023,6.9\n");

        let dataset = load(actual.path(), forecast.path()).unwrap();
        assert_eq!(dataset.len(), 5);

        let years: Vec<_> = dataset.records().map(|r| r.get("Year").cloned()).collect();
        let expected: Vec<_> = (2019..=2023).map(|y| Some(Value::Integer(y))).collect();
        assert_eq!(years, expected);

        for (i, record) in dataset.records().enumerate() {
            let source = record.get(SOURCE_COLUMN).and_then(Value::as_str);
            let expected = if i < 3 { "Actual" } else { "Forecast" };
            assert_eq!(source, Some(expected));
        }
    }

    #[test]
    fn test_column_union_fills_nulls() {
        let actual = csv_file("Year,Max BOD\n2020,2.5\n");
        let forecast = csv_file("Year,Lower,Upper\n2024,1,3\n");

        let dataset = load(actual.path(), forecast.path()).unwrap();
        assert_eq!(
            dataset.columns(),
            ["Year", "Max BOD", "Source", "Lower", "Upper"]
        );

        let first = dataset.record(0).unwrap();
        assert_eq!(first.get("Lower"), Some(&Value::Null));
        assert_eq!(first.get("Upper"), Some(&Value::Null));

        let second = dataset.record(1).unwrap();
        assert_eq!(second.get("Max BOD"), Some(&Value::Null));
        assert_eq!(second.get("Upper"), Some(&Value::Integer(3)));

        let json = serde_json::to_value(&dataset).unwrap();
        for object in json.as_array().unwrap() {
            assert_eq!(object.as_object().unwrap().len(), 5);
        }
    }

    #[test]
    fn test_missing_actual_file_names_path() {
        let forecast = csv_file("date,value\n2024-01-02,12\n");
        let missing = forecast.path().with_file_name("definitely-missing-actual.csv");

        let err = load(&missing, forecast.path()).unwrap_err();
        assert!(matches!(err, LoadError::NotFound { .. }));
        assert_eq!(err.path(), missing.as_path());
        assert!(err.to_string().contains("definitely-missing-actual.csv"));
    }

    #[test]
    fn test_new_pads_short_rows() {
        let dataset = Dataset::new(
            vec!["a".to_string(), "b".to_string()],
            vec![vec![Value::Integer(1)]],
        );
        assert_eq!(dataset.record(0).unwrap().get("b"), Some(&Value::Null));
    }
}
