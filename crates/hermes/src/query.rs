//! Ordered query parameters.
//!
//! Query entries keep insertion order and allow repeated keys, so both
//! multi-value (`id=1&id=2`) and array-style (`id[]=1`) query strings can be
//! reproduced by the active query serializer.

use crate::error::{ApiError, ApiResult};

/// Value of a single query entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    /// A scalar value.
    Single(String),
    /// An array value.
    Many(Vec<String>),
}

impl QueryValue {
    /// All values carried by this entry.
    pub fn values(&self) -> &[String] {
        match self {
            Self::Single(value) => std::slice::from_ref(value),
            Self::Many(values) => values,
        }
    }

    /// Returns true for array values.
    pub fn is_many(&self) -> bool {
        matches!(self, Self::Many(_))
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<&String> for QueryValue {
    fn from(value: &String) -> Self {
        Self::Single(value.clone())
    }
}

impl From<Vec<String>> for QueryValue {
    fn from(values: Vec<String>) -> Self {
        Self::Many(values)
    }
}

impl From<Vec<&str>> for QueryValue {
    fn from(values: Vec<&str>) -> Self {
        Self::Many(values.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for QueryValue {
    fn from(values: &[&str]) -> Self {
        Self::Many(values.iter().map(|v| (*v).to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for QueryValue {
    fn from(values: [&str; N]) -> Self {
        Self::Many(values.iter().map(|v| (*v).to_string()).collect())
    }
}

macro_rules! query_value_from_display {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for QueryValue {
                fn from(value: $ty) -> Self {
                    Self::Single(value.to_string())
                }
            }
        )*
    };
}

query_value_from_display!(bool, i32, i64, u16, u32, u64, usize);

/// Ordered sequence of query entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    entries: Vec<(String, QueryValue)>,
}

impl QueryParams {
    /// Creates an empty set of query parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry. Existing entries with the same key are kept.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<QueryValue>) {
        self.entries.push((key.into(), value.into()));
    }

    /// Parses a literal query string and merges it in.
    ///
    /// A leading `?` is ignored and pairs are percent-decoded. For each key
    /// in the literal, the first existing entry with that key is replaced in
    /// place and any later entries with that key are dropped. A key repeated
    /// inside the literal becomes an array value. New keys are appended.
    ///
    /// # Example
    ///
    /// ```
    /// use hermes::{QueryParams, QueryValue};
    ///
    /// let mut params = QueryParams::new();
    /// params.push("page", "1");
    /// params.push("sort", "name");
    /// params.merge_literal("page=2&tag=a&tag=b").unwrap();
    ///
    /// assert_eq!(params.get("page"), Some(&QueryValue::Single("2".into())));
    /// assert_eq!(params.get("tag").unwrap().values(), ["a", "b"]);
    /// ```
    pub fn merge_literal(&mut self, literal: &str) -> ApiResult<()> {
        let literal = literal.strip_prefix('?').unwrap_or(literal);
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(literal)
            .map_err(|e| ApiError::invalid_request(format!("invalid query string: {e}")))?;

        let mut grouped: indexmap::IndexMap<String, Vec<String>> = indexmap::IndexMap::new();
        for (key, value) in pairs {
            grouped.entry(key).or_default().push(value);
        }

        for (key, mut values) in grouped {
            let value = if values.len() == 1 {
                QueryValue::Single(values.remove(0))
            } else {
                QueryValue::Many(values)
            };
            self.replace(key, value);
        }

        Ok(())
    }

    fn replace(&mut self, key: String, value: QueryValue) {
        match self.entries.iter().position(|(k, _)| *k == key) {
            Some(first) => {
                self.entries[first].1 = value;
                let mut index = 0;
                self.entries.retain(|(k, _)| {
                    let keep = index <= first || *k != key;
                    index += 1;
                    keep
                });
            }
            None => self.entries.push((key, value)),
        }
    }

    /// Returns the first entry for `key`.
    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value)
    }

    /// Returns every value recorded for `key`, across all entries.
    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(k, _)| k == key)
            .flat_map(|(_, value)| value.values())
            .map(String::as_str)
            .collect()
    }

    /// Iterates over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &QueryValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no entries were added.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> Extend<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Into<QueryValue>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.push(key, value);
        }
    }
}

impl<K, V> FromIterator<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Into<QueryValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        params.extend(iter);
        params
    }
}
