//! Filter arguments for list requests (`label=key=value`, `service=id`, ...).

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Set of filter terms grouped by key.
///
/// Terms with the same key are AND-ed for `label` and OR-ed for everything else,
/// matching how list endpoints interpret them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filters {
    terms: BTreeMap<String, BTreeSet<String>>,
}

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a term.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.terms.entry(key.into()).or_default().insert(value.into());
    }

    /// Builder form of [`Filters::add`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.add(key, value);
        self
    }

    /// Parse a `key=value` argument as given on the command line.
    pub fn parse_arg(arg: &str) -> Result<(String, String), String> {
        match arg.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                Ok((key.trim().to_lowercase(), value.to_string()))
            }
            _ => Err(format!("Bad format of filter (expected name=value): {}", arg)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Values given for `key`.
    pub fn get(&self, key: &str) -> impl Iterator<Item = &str> {
        self.terms.get(key).into_iter().flat_map(|values| values.iter().map(String::as_str))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.terms.contains_key(key)
    }

    /// Flatten into (key, value) pairs.
    pub fn pairs(&self) -> Vec<(String, String)> {
        self.terms
            .iter()
            .flat_map(|(key, values)| values.iter().map(move |v| (key.clone(), v.clone())))
            .collect()
    }

    /// Check `labels` against every `key` term of the form `name` or `name=value`.
    ///
    /// A bare name requires the label to be present; `name=value` requires an exact value.
    pub fn match_kv_list(&self, key: &str, labels: &HashMap<String, String>) -> bool {
        self.get(key).all(|term| match term.split_once('=') {
            Some((name, value)) => labels.get(name).map(|v| v == value).unwrap_or(false),
            None => labels.contains_key(term),
        })
    }

    /// True when no `key` term is given or any term equals `value`.
    pub fn exact_match(&self, key: &str, value: &str) -> bool {
        match self.terms.get(key) {
            None => true,
            Some(values) => values.contains(value),
        }
    }
}

impl FromIterator<(String, String)> for Filters {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut filters = Filters::new();
        for (key, value) in iter {
            filters.add(key, value);
        }
        filters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_label_terms_are_anded() {
        let filters = Filters::new().with("label", "role=web").with("label", "env");

        assert!(filters.match_kv_list("label", &labels(&[("role", "web"), ("env", "prod")])));
        assert!(!filters.match_kv_list("label", &labels(&[("role", "web")])));
        assert!(!filters.match_kv_list("label", &labels(&[("role", "db"), ("env", "prod")])));
    }

    #[test]
    fn test_no_terms_matches_everything() {
        let filters = Filters::new();
        assert!(filters.match_kv_list("label", &HashMap::new()));
        assert!(filters.exact_match("name", "anything"));
    }

    #[test]
    fn test_exact_match() {
        let filters = Filters::new().with("name", "a").with("name", "b");
        assert!(filters.exact_match("name", "b"));
        assert!(!filters.exact_match("name", "c"));
    }

    #[test]
    fn test_parse_arg() {
        assert_eq!(
            Filters::parse_arg("label=com.example=1").unwrap(),
            ("label".to_string(), "com.example=1".to_string())
        );
        assert!(Filters::parse_arg("label").is_err());
        assert!(Filters::parse_arg("=x").is_err());
    }
}
