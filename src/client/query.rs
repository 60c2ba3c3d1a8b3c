//! Query string building.

/// Query parameter value: a single value or a list rendered as repeated keys.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueryValue {
    Single(String),
    List(Vec<String>),
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

impl From<bool> for QueryValue {
    fn from(value: bool) -> Self {
        Self::Single(value.to_string())
    }
}

macro_rules! query_value_from_number {
    ($($t:ty),*) => {
        $(impl From<$t> for QueryValue {
            fn from(value: $t) -> Self {
                Self::Single(value.to_string())
            }
        })*
    };
}

query_value_from_number!(i32, i64, u16, u32, u64, usize);

impl<T: Into<String>> From<Vec<T>> for QueryValue {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

/// Ordered query parameters. Absent values are skipped when rendered.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Query {
    entries: Vec<(String, Option<QueryValue>)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.entries.push((key.into(), Some(value.into())));
        self
    }

    pub fn param_opt<V: Into<QueryValue>>(mut self, key: impl Into<String>, value: Option<V>) -> Self {
        self.entries.push((key.into(), value.map(Into::into)));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(|(_, v)| v.is_none())
    }

    /// Render as `?k=v&k=v`, or an empty string when nothing is present.
    pub fn to_query_string(&self) -> String {
        let mut pairs = Vec::new();
        for (key, value) in &self.entries {
            let key = urlencoding::encode(key);
            match value {
                None => {}
                Some(QueryValue::Single(v)) => {
                    pairs.push(format!("{}={}", key, urlencoding::encode(v)));
                }
                Some(QueryValue::List(values)) => {
                    for v in values {
                        pairs.push(format!("{}={}", key, urlencoding::encode(v)));
                    }
                }
            }
        }

        if pairs.is_empty() {
            String::new()
        } else {
            format!("?{}", pairs.join("&"))
        }
    }
}

impl<K, V> FromIterator<(K, Option<V>)> for Query
where
    K: Into<String>,
    V: Into<QueryValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, Option<V>)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.map(Into::into)))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skips_absent_and_repeats_lists() {
        let query = Query::new()
            .param("a", "1")
            .param_opt::<&str>("b", None)
            .param("c", vec!["x", "y"]);
        assert_eq!(query.to_query_string(), "?a=1&c=x&c=y");
    }

    #[test]
    fn test_empty() {
        assert_eq!(Query::new().to_query_string(), "");
        let query = Query::new().param_opt::<String>("only", None);
        assert!(query.is_empty());
        assert_eq!(query.to_query_string(), "");
    }

    #[test]
    fn test_encodes_keys_and_values() {
        let query = Query::new()
            .param("secret path", "/a b/c&d")
            .param("tags", vec!["k=v", "ü"]);
        assert_eq!(
            query.to_query_string(),
            "?secret%20path=%2Fa%20b%2Fc%26d&tags=k%3Dv&tags=%C3%BC"
        );
    }

    #[test]
    fn test_scalars() {
        let query = Query::new()
            .param("recursive", true)
            .param("limit", 50u32)
            .param("offset", 0i64);
        assert_eq!(query.to_query_string(), "?recursive=true&limit=50&offset=0");
    }

    #[test]
    fn test_from_iter() {
        let query: Query = vec![("a", Some("1")), ("b", None), ("c", Some("3"))]
            .into_iter()
            .collect();
        assert_eq!(query.to_query_string(), "?a=1&c=3");
    }
}
