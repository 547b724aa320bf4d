//! Transformer registry view.
//!
//! The host application owns its transformers; this module only needs to
//! enumerate them. [`SharedRegistry`] is an in-process implementation whose
//! snapshot can be swapped atomically while readers keep listing.

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};

/// Registry-side description of a transformer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformerEntry {
    /// HTTP endpoint the transformer handles, if it exposes one.
    #[serde(rename = "endPoint", default)]
    pub end_point: Option<String>,
}

impl TransformerEntry {
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            end_point: Some(endpoint.into()),
        }
    }
}

/// Read-only projection returned to API clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformerDescriptor {
    pub name: String,
    pub endpoint: Option<String>,
}

/// Source of currently loaded transformers.
pub trait TransformerRegistry: Send + Sync {
    /// All entries in registry enumeration order.
    fn entries(&self) -> Vec<(String, TransformerEntry)>;
}

/// In-process registry backed by an atomically swapped snapshot.
#[derive(Debug, Default)]
pub struct SharedRegistry {
    entries: ArcSwap<Vec<(String, TransformerEntry)>>,
}

impl SharedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from `(name, entry)` pairs, keeping their order.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, TransformerEntry)>,
    {
        let registry = Self::new();
        for (name, entry) in entries {
            registry.register(name, entry);
        }
        registry
    }

    /// Add a transformer, or replace an existing one in place.
    pub fn register(&self, name: impl Into<String>, entry: TransformerEntry) {
        let name = name.into();
        self.entries.rcu(|current| {
            let mut next = Vec::clone(current);
            match next.iter_mut().find(|(existing, _)| *existing == name) {
                Some(slot) => slot.1 = entry.clone(),
                None => next.push((name.clone(), entry.clone())),
            }
            next
        });
    }

    /// Remove a transformer. Returns whether it was present.
    pub fn unregister(&self, name: &str) -> bool {
        let previous = self.entries.rcu(|current| {
            current
                .iter()
                .filter(|(existing, _)| existing != name)
                .cloned()
                .collect::<Vec<_>>()
        });
        previous.iter().any(|(existing, _)| existing == name)
    }

    pub fn len(&self) -> usize {
        self.entries.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.load().is_empty()
    }
}

impl TransformerRegistry for SharedRegistry {
    fn entries(&self) -> Vec<(String, TransformerEntry)> {
        Vec::clone(&self.entries.load())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_preserves_order() {
        let registry = SharedRegistry::new();
        registry.register("anthropic", TransformerEntry::with_endpoint("/v1/messages"));
        registry.register("deepseek", TransformerEntry::default());
        registry.register("gemini", TransformerEntry::with_endpoint("/v1beta/models/:modelAndAction"));

        let names: Vec<_> = registry.entries().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["anthropic", "deepseek", "gemini"]);
    }

    #[test]
    fn test_register_replaces_in_place() {
        let registry = SharedRegistry::new();
        registry.register("a", TransformerEntry::default());
        registry.register("b", TransformerEntry::default());
        registry.register("a", TransformerEntry::with_endpoint("/x"));

        let entries = registry.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, "a");
        assert_eq!(entries[0].1.end_point.as_deref(), Some("/x"));
    }

    #[test]
    fn test_unregister() {
        let registry = SharedRegistry::from_entries(vec![
            ("a".to_string(), TransformerEntry::default()),
            ("b".to_string(), TransformerEntry::default()),
        ]);

        assert!(registry.unregister("a"));
        assert!(!registry.unregister("a"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_entry_uses_end_point_key() {
        let entry: TransformerEntry = serde_json::from_str(r#"{"endPoint": "http://x"}"#).unwrap();
        assert_eq!(entry.end_point.as_deref(), Some("http://x"));

        let entry: TransformerEntry = serde_json::from_str("{}").unwrap();
        assert_eq!(entry.end_point, None);
    }
}
