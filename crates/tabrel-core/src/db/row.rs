use crate::{db::query::unqualified, value::Value};
use derive_more::IntoIterator;
use serde::{Deserialize, Serialize};

///
/// Row
///
/// Ordered column → value mapping as returned by the query executor.
/// Column order is preserved; aggregate rows rely on the aggregate column
/// coming first.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, IntoIterator, PartialEq, Serialize)]
#[into_iterator(owned, ref)]
pub struct Row(Vec<(String, Value)>);

impl Row {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    /// Set a column, replacing an existing value in place.
    /// Returns the previous value when the column was already present.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let column = column.into();
        let value = value.into();

        match self.position(&column) {
            Some(index) => Some(std::mem::replace(&mut self.0[index].1, value)),
            None => {
                self.0.push((column, value));
                None
            }
        }
    }

    /// Look up a column; a qualified name (`table.column`) also matches the
    /// bare column name.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.position(column).map(|index| &self.0[index].1)
    }

    pub fn remove(&mut self, column: &str) -> Option<Value> {
        self.position(column).map(|index| self.0.remove(index).1)
    }

    #[must_use]
    pub fn contains(&self, column: &str) -> bool {
        self.position(column).is_some()
    }

    /// First column value in row order.
    #[must_use]
    pub fn first_value(&self) -> Option<&Value> {
        self.0.first().map(|(_, value)| value)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(column, _)| column.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(column, value)| (column.as_str(), value))
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn position(&self, column: &str) -> Option<usize> {
        self.0
            .iter()
            .position(|(name, _)| name == column)
            .or_else(|| {
                let bare = unqualified(column);
                self.0
                    .iter()
                    .position(|(name, _)| unqualified(name) == bare)
            })
    }
}

impl<K, V> FromIterator<(K, V)> for Row
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Self::new();
        for (column, value) in iter {
            row.insert(column, value);
        }
        row
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use crate::{db::Row, value::Value};

    #[test]
    fn insert_replaces_in_place_and_keeps_order() {
        let mut row = Row::new().with("id", 1).with("name", "a");
        let previous = row.insert("id", 2);

        assert_eq!(previous, Some(Value::Int(1)));
        assert_eq!(row.columns().collect::<Vec<_>>(), vec!["id", "name"]);
        assert_eq!(row.first_value(), Some(&Value::Int(2)));
    }

    #[test]
    fn qualified_lookup_falls_back_to_bare_column() {
        let row = Row::new().with("author_id", 3);

        assert_eq!(row.get("books.author_id"), Some(&Value::Int(3)));
        assert!(row.contains("author_id"));
        assert_eq!(row.get("books.title"), None);
    }

    #[test]
    fn serializes_as_ordered_pairs() {
        let row = Row::new().with("id", 1).with("title", "Solaris");
        let json = serde_json::to_string(&row).expect("serialize");

        assert_eq!(json, r#"[["id",{"Int":1}],["title",{"Text":"Solaris"}]]"#);
        assert_eq!(serde_json::from_str::<Row>(&json).expect("deserialize"), row);
    }

    #[test]
    fn remove_drops_column() {
        let mut row: Row = [("id", Value::Int(1)), ("name", Value::from("x"))]
            .into_iter()
            .collect();

        assert_eq!(row.remove("id"), Some(Value::Int(1)));
        assert_eq!(row.len(), 1);
        assert_eq!(row.remove("id"), None);
    }
}
