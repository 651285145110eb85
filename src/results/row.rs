use std::ops::Index;

use super::schema::Schema;
use crate::types::RowValues;

/// A row from a query result
///
/// Values are kept in column order exactly as the backend decoded them. Rows do not
/// carry column names; look columns up through the [`Schema`] returned alongside them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    values: Vec<RowValues>,
}

impl Row {
    #[must_use]
    pub fn new(values: Vec<RowValues>) -> Self {
        Self { values }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get a value from the row by column index
    ///
    /// # Returns
    ///
    /// The value at the index, or None if the index is out of bounds
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&RowValues> {
        self.values.get(index)
    }

    /// Get a value by column name, resolving the position through `schema`.
    ///
    /// Returns `None` when the schema has no such column or the row is shorter than
    /// the schema says (a stale schema from a differently shaped query).
    #[must_use]
    pub fn get(&self, schema: &Schema, column_name: &str) -> Option<&RowValues> {
        schema
            .position(column_name)
            .and_then(|idx| self.values.get(idx))
    }

    #[must_use]
    pub fn values(&self) -> &[RowValues] {
        &self.values
    }

    #[must_use]
    pub fn into_values(self) -> Vec<RowValues> {
        self.values
    }
}

impl From<Vec<RowValues>> for Row {
    fn from(values: Vec<RowValues>) -> Self {
        Self::new(values)
    }
}

impl Index<usize> for Row {
    type Output = RowValues;

    fn index(&self, index: usize) -> &Self::Output {
        &self.values[index]
    }
}

impl IntoIterator for Row {
    type Item = RowValues;
    type IntoIter = std::vec::IntoIter<RowValues>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl<'a> IntoIterator for &'a Row {
    type Item = &'a RowValues;
    type IntoIter = std::slice::Iter<'a, RowValues>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}
