//! The tabular result boundary: column labels and row access.

use crate::value::SqlValue;

/// One result row, addressed by 1-based column position.
pub trait ResultRow {
    fn get(&self, position: usize) -> Option<&SqlValue>;
}

impl ResultRow for [SqlValue] {
    fn get(&self, position: usize) -> Option<&SqlValue> {
        position.checked_sub(1).and_then(|index| <[SqlValue]>::get(self, index))
    }
}

impl ResultRow for Vec<SqlValue> {
    fn get(&self, position: usize) -> Option<&SqlValue> {
        ResultRow::get(self.as_slice(), position)
    }
}

/// A result column: its 1-based position and its label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLabel {
    pub position: usize,
    pub label: String,
}

impl ColumnLabel {
    #[must_use]
    pub fn new(position: usize, label: impl Into<String>) -> Self {
        Self {
            position,
            label: label.into(),
        }
    }
}

/// A materialized result: labelled columns and the rows under them.
pub trait ResultSet {
    /// Column labels in position order.
    fn columns(&self) -> Vec<ColumnLabel>;

    fn rows(&self) -> Box<dyn Iterator<Item = &dyn ResultRow> + '_>;
}

/// An in-memory [`ResultSet`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultTable {
    labels: Vec<String>,
    rows: Vec<Vec<SqlValue>>,
}

impl ResultTable {
    #[must_use]
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
            rows: vec![],
        }
    }

    /// Appends a row; missing trailing cells read as absent.
    #[must_use]
    pub fn with_row(mut self, row: Vec<SqlValue>) -> Self {
        self.push_row(row);
        self
    }

    pub fn push_row(&mut self, row: Vec<SqlValue>) {
        self.rows.push(row);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl ResultSet for ResultTable {
    fn columns(&self) -> Vec<ColumnLabel> {
        self.labels
            .iter()
            .enumerate()
            .map(|(index, label)| ColumnLabel::new(index + 1, label.clone()))
            .collect()
    }

    fn rows(&self) -> Box<dyn Iterator<Item = &dyn ResultRow> + '_> {
        Box::new(self.rows.iter().map(|row| row as &dyn ResultRow))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positions_are_one_based() {
        let row = vec![SqlValue::Int(1), SqlValue::Int(2)];
        assert_eq!(ResultRow::get(&row, 1), Some(&SqlValue::Int(1)));
        assert_eq!(ResultRow::get(&row, 2), Some(&SqlValue::Int(2)));
        assert_eq!(ResultRow::get(&row, 0), None);
        assert_eq!(ResultRow::get(&row, 3), None);
    }

    #[test]
    fn test_table_columns() {
        let table = ResultTable::new(["id", "name"]).with_row(vec![SqlValue::Int(1)]);
        assert_eq!(
            table.columns(),
            vec![ColumnLabel::new(1, "id"), ColumnLabel::new(2, "name")]
        );
        assert_eq!(table.rows().count(), 1);
    }
}
