use std::collections::HashMap;

/// Column layout of a result set: column name to zero-based position.
///
/// Built from the column description of a zero-row probe. The ordered column list
/// is kept next to the lookup map; when a name repeats, the map points at its last
/// occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<String>,
    positions: HashMap<String, usize>,
}

impl Schema {
    #[must_use]
    pub fn from_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let positions = columns
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), idx))
            .collect();
        Self { columns, positions }
    }

    #[must_use]
    pub fn position(&self, column_name: &str) -> Option<usize> {
        self.positions.get(column_name).copied()
    }

    #[must_use]
    pub fn contains(&self, column_name: &str) -> bool {
        self.positions.contains_key(column_name)
    }

    /// Column names in result order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn as_map(&self) -> &HashMap<String, usize> {
        &self.positions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
