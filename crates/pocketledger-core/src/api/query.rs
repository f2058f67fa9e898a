use std::fmt::Display;

/// Ordered URL query pairs. Empty values are never recorded, so a filter
/// left blank does not show up in the request at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: &str, value: impl Display) {
        let value = value.to_string();
        if !value.is_empty() {
            self.0.push((key.to_string(), value));
        }
    }

    pub fn push_opt<V: Display>(&mut self, key: &str, value: Option<V>) {
        if let Some(value) = value {
            self.push(key, value);
        }
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_values_are_skipped() {
        let mut params = QueryParams::new();
        params.push("type", "");
        params.push_opt::<&str>("category", None);
        params.push_opt("startDate", Some("2024-01-01"));
        params.push("page", 2);
        assert_eq!(
            params.pairs(),
            &[
                ("startDate".to_string(), "2024-01-01".to_string()),
                ("page".to_string(), "2".to_string()),
            ]
        );
    }

    #[test]
    fn test_whitespace_is_a_value() {
        let mut params = QueryParams::new();
        params.push("q", " ");
        assert!(!params.is_empty());
    }
}
