//! Provenance tagging and concatenation

use std::fmt;

use super::{Dataset, Value};

/// Name of the column holding the provenance label
pub const SOURCE_COLUMN: &str = "Source";

/// Which input file a record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    Actual,
    Forecast,
}

impl Provenance {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Actual => "Actual",
            Self::Forecast => "Forecast",
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Set the `Source` column of every row to `provenance`
///
/// An existing `Source` column is overwritten in place; otherwise the column
/// is appended.
pub fn tag(dataset: Dataset, provenance: Provenance) -> Dataset {
    let index = dataset.column_index(SOURCE_COLUMN);
    let (mut columns, mut rows) = dataset.into_parts();
    let label = Value::from(provenance.label());

    match index {
        Some(i) => {
            for row in &mut rows {
                row[i] = label.clone();
            }
        }
        None => {
            columns.push(SOURCE_COLUMN.to_string());
            for row in &mut rows {
                row.push(label.clone());
            }
        }
    }

    Dataset::new(columns, rows)
}

/// Rows of `first` followed by rows of `second`, over the union of their columns
///
/// Columns keep their order of first appearance: all of `first`'s columns,
/// then those only `second` has. Cells a side has no column for are `Null`.
pub fn concat(first: Dataset, second: Dataset) -> Dataset {
    let (mut columns, mut rows) = first.into_parts();
    let (second_columns, second_rows) = second.into_parts();

    let mut positions = Vec::with_capacity(second_columns.len());
    for name in second_columns {
        match columns.iter().position(|c| *c == name) {
            Some(i) => positions.push(i),
            None => {
                columns.push(name);
                positions.push(columns.len() - 1);
            }
        }
    }

    let width = columns.len();
    for row in &mut rows {
        row.resize(width, Value::Null);
    }

    rows.reserve(second_rows.len());
    for source_row in second_rows {
        let mut row = vec![Value::Null; width];
        for (value, &position) in source_row.into_iter().zip(&positions) {
            row[position] = value;
        }
        rows.push(row);
    }

    Dataset::new(columns, rows)
}
