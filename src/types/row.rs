use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShimError};
use crate::types::SqlValue;

/// A flat column -> value record, as stored and returned by a table store.
/// Columns iterate in name order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    values: BTreeMap<String, SqlValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, handy for literals in callers and tests.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.values.insert(column.into(), value.into());
        self
    }

    /// Sets a column, returning the previous value if any.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<SqlValue>) -> Option<SqlValue> {
        self.values.insert(column.into(), value.into())
    }

    pub fn remove(&mut self, column: &str) -> Option<SqlValue> {
        self.values.remove(column)
    }

    /// Gets a value by column name.
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.values.get(column)
    }

    /// Gets a value by column name, failing if the column is absent.
    pub fn get_required(&self, column: &str) -> Result<&SqlValue> {
        self.values
            .get(column)
            .ok_or_else(|| ShimError::ColumnNotFound(column.to_string()))
    }

    /// Returns all column names in this record.
    pub fn columns(&self) -> Vec<&str> {
        self.values.keys().map(|s| s.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SqlValue)> {
        self.values.iter()
    }

    /// Overwrites this record's columns with those of `other`.
    pub fn merge(&mut self, other: &Record) {
        for (column, value) in other.iter() {
            self.values.insert(column.clone(), value.clone());
        }
    }

    /// Returns the number of columns in this record.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if this record has no columns.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<SqlValue>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl IntoIterator for Record {
    type Item = (String, SqlValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, SqlValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

/// Result of a store request: zero or more records in arrival order, plus the
/// exact match count when one was asked for.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    rows: Vec<Record>,
    count: Option<u64>,
}

impl RowSet {
    pub fn new(rows: Vec<Record>) -> Self {
        Self { rows, count: None }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_count(mut self, count: u64) -> Self {
        self.count = Some(count);
        self
    }

    /// Extracts a single row from the result.
    /// Returns an error if the result contains zero or more than one row.
    pub fn single_row(self) -> Result<Record> {
        let actual = self.rows.len();
        let mut rows = self.rows.into_iter();
        match (rows.next(), rows.next()) {
            (Some(row), None) => Ok(row),
            _ => Err(ShimError::UnexpectedRowCount {
                expected: 1,
                actual,
            }),
        }
    }

    /// Returns the first row, if any, dropping the rest.
    pub fn first(self) -> Option<Record> {
        self.rows.into_iter().next()
    }

    /// Returns all rows from the result.
    pub fn rows(self) -> Vec<Record> {
        self.rows
    }

    /// Returns a reference to the rows without consuming the result.
    pub fn rows_ref(&self) -> &[Record] {
        &self.rows
    }

    /// The exact count reported by the store, if requested.
    pub fn count(&self) -> Option<u64> {
        self.count
    }

    /// Returns the number of rows in this result.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if this result contains no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_get() {
        let record = Record::new().with("id", 1).with("name", "John");

        assert_eq!(record.get("id"), Some(&SqlValue::Int(1)));
        assert_eq!(record.get("name"), Some(&SqlValue::Text("John".into())));
        assert!(record.get("missing").is_none());
        assert!(matches!(
            record.get_required("missing"),
            Err(ShimError::ColumnNotFound(c)) if c == "missing"
        ));
    }

    #[test]
    fn test_record_serializes_flat() {
        let record = Record::new().with("nome", "Tela").with("preco_venda", 120.5);
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"nome":"Tela","preco_venda":120.5}"#);
    }

    #[test]
    fn test_row_set_single_row() {
        let rows = RowSet::new(vec![Record::new().with("id", 1)]);
        let row = rows.single_row().unwrap();
        assert_eq!(row.get("id"), Some(&SqlValue::Int(1)));
    }

    #[test]
    fn test_row_set_single_row_error_on_empty() {
        let err = RowSet::empty().single_row().unwrap_err();
        match err {
            ShimError::UnexpectedRowCount { expected, actual } => {
                assert_eq!(expected, 1);
                assert_eq!(actual, 0);
            }
            _ => panic!("Expected UnexpectedRowCount error"),
        }
    }

    #[test]
    fn test_row_set_single_row_error_on_multiple() {
        let rows = RowSet::new(vec![
            Record::new().with("id", 1),
            Record::new().with("id", 2),
        ]);
        let err = rows.single_row().unwrap_err();
        match err {
            ShimError::UnexpectedRowCount { expected, actual } => {
                assert_eq!(expected, 1);
                assert_eq!(actual, 2);
            }
            _ => panic!("Expected UnexpectedRowCount error"),
        }
    }
}
