//! Stack namespacing.
//!
//! Objects belonging to a stack carry the namespace label and a
//! `<namespace>_<name>` name.

use crate::types::Filters;
use std::collections::HashMap;

/// Label holding the stack namespace.
pub const LABEL_NAMESPACE: &str = "com.berth.stack.namespace";

/// Add the namespace label to `labels`, creating the map when absent.
pub fn stack_labels(
    namespace: &str,
    labels: Option<HashMap<String, String>>,
) -> HashMap<String, String> {
    let mut labels = labels.unwrap_or_default();
    labels.insert(LABEL_NAMESPACE.to_string(), namespace.to_string());
    labels
}

/// Filter selecting objects of one stack.
pub fn stack_filter(namespace: &str) -> Filters {
    Filters::new().with("label", format!("{}={}", LABEL_NAMESPACE, namespace))
}

/// Name of a stack object as seen by the manager.
pub fn scoped_name(namespace: &str, name: &str) -> String {
    format!("{}_{}", namespace, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stack_labels_keep_existing() {
        let mut existing = HashMap::new();
        existing.insert("tier".to_string(), "web".to_string());

        let labels = stack_labels("shop", Some(existing));

        assert_eq!(labels.get("tier").unwrap(), "web");
        assert_eq!(labels.get(LABEL_NAMESPACE).unwrap(), "shop");
    }

    #[test]
    fn test_stack_labels_override_namespace() {
        let mut existing = HashMap::new();
        existing.insert(LABEL_NAMESPACE.to_string(), "other".to_string());

        let labels = stack_labels("shop", Some(existing));
        assert_eq!(labels.get(LABEL_NAMESPACE).unwrap(), "shop");
    }

    #[test]
    fn test_stack_filter_matches_only_its_stack() {
        let filter = stack_filter("shop");

        assert!(filter.match_kv_list("label", &stack_labels("shop", None)));
        assert!(!filter.match_kv_list("label", &stack_labels("blog", None)));
        assert!(!filter.match_kv_list("label", &HashMap::new()));
    }

    #[test]
    fn test_scoped_name() {
        assert_eq!(scoped_name("shop", "front"), "shop_front");
    }
}
