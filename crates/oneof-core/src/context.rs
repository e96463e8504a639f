//! # Dispatch Context
//!
//! Auxiliary key-value state (current user, request locale, ...) handed
//! from a dispatcher to each delegate schema. Contexts are values, not
//! shared cells: every dispatch computes the effective context for its
//! delegate by merging, and nothing is written back.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Key-value mapping threaded through every dispatch call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DispatchContext(BTreeMap<String, Value>);

impl DispatchContext {
    /// An empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace `key`, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Look up `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns true if `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Return a new context holding `self` overlaid by `overlay`.
    ///
    /// Entries from `overlay` win on key collision; entries only in
    /// `self` are kept.
    pub fn merged_with(&self, overlay: &DispatchContext) -> DispatchContext {
        if overlay.is_empty() {
            return self.clone();
        }
        let mut merged = self.0.clone();
        merged.extend(overlay.0.iter().map(|(k, v)| (k.clone(), v.clone())));
        DispatchContext(merged)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for DispatchContext {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_overlay_wins_on_collision() {
        let base = DispatchContext::new().with("user", "alice").with("locale", "en");
        let overlay = DispatchContext::new().with("user", "bob");
        let merged = base.merged_with(&overlay);
        assert_eq!(merged.get("user"), Some(&json!("bob")));
        assert_eq!(merged.get("locale"), Some(&json!("en")));
    }

    #[test]
    fn test_merge_does_not_mutate_inputs() {
        let base = DispatchContext::new().with("k", 1);
        let overlay = DispatchContext::new().with("k", 2).with("extra", true);
        let _ = base.merged_with(&overlay);
        assert_eq!(base.len(), 1);
        assert_eq!(base.get("k"), Some(&json!(1)));
        assert_eq!(overlay.len(), 2);
    }

    #[test]
    fn test_merge_with_empty_overlay() {
        let base = DispatchContext::new().with("k", "v");
        assert_eq!(base.merged_with(&DispatchContext::new()), base);
    }

    #[test]
    fn test_from_iterator() {
        let ctx: DispatchContext = [("a", 1), ("b", 2)].into_iter().collect();
        assert_eq!(ctx.len(), 2);
        assert!(ctx.contains_key("b"));
    }

    proptest::proptest! {
        #[test]
        fn prop_merge_keeps_every_key(
            base in proptest::collection::btree_map("[a-d]", 0i64..10, 0..4),
            overlay in proptest::collection::btree_map("[a-d]", 10i64..20, 0..4),
        ) {
            let b: DispatchContext = base.clone().into_iter().collect();
            let o: DispatchContext = overlay.clone().into_iter().collect();
            let merged = b.merged_with(&o);
            for (k, v) in &overlay {
                proptest::prop_assert_eq!(merged.get(k).cloned(), Some(json!(v)));
            }
            for (k, v) in &base {
                if !overlay.contains_key(k) {
                    proptest::prop_assert_eq!(merged.get(k).cloned(), Some(json!(v)));
                }
            }
        }
    }
}
