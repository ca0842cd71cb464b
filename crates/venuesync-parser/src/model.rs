use std::collections::HashMap;

/// One spreadsheet line keyed by column header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    columns: HashMap<String, String>,
}

impl RawRow {
    pub fn new(columns: HashMap<String, String>) -> Self {
        Self { columns }
    }

    /// Returns the cell for `column`, or an empty string when the column is missing.
    pub fn get(&self, column: &str) -> &str {
        self.columns.get(column).map(String::as_str).unwrap_or("")
    }

    /// Trimmed cell value, `None` when missing or blank.
    pub fn non_empty(&self, column: &str) -> Option<&str> {
        let value = self.get(column).trim();
        (!value.is_empty()).then_some(value)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl From<HashMap<String, String>> for RawRow {
    fn from(columns: HashMap<String, String>) -> Self {
        Self::new(columns)
    }
}

impl<K, V> FromIterator<(K, V)> for RawRow
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            columns: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}
