//! Configuration data model.
//!
//! The configuration is a schema-flexible JSON object. Downstream consumers
//! interpret it; this crate only passes it through. A typed, read-only view
//! of the provider list is offered for tooling.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key holding the provider list.
pub const PROVIDERS_KEY: &str = "Providers";

/// The managed configuration document.
///
/// Always a JSON object at the top level. Values are kept verbatim,
/// including credentials.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Configuration(Map<String, Value>);

impl Configuration {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a top-level value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Set a top-level value, returning the previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the underlying JSON object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Typed view of the provider list.
    ///
    /// Entries that are not objects are skipped. Missing list yields an
    /// empty vector.
    pub fn providers(&self) -> Vec<ProviderEntry> {
        self.0
            .get(PROVIDERS_KEY)
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| serde_json::from_value(entry.clone()).ok())
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl From<Map<String, Value>> for Configuration {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for Configuration {
    type Error = Value;

    /// Accepts only JSON objects; anything else is handed back.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(other),
        }
    }
}

/// One upstream service definition inside the configuration.
///
/// Names are not required to be unique. Unknown keys are preserved in
/// `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderEntry {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub api_base_url: String,

    #[serde(default)]
    pub api_key: String,

    #[serde(default)]
    pub models: Vec<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_providers_view() {
        let config: Configuration = serde_json::from_value(json!({
            "APIKEY": "k",
            "Providers": [
                {
                    "name": "deepseek",
                    "api_base_url": "https://api.deepseek.com/chat/completions",
                    "api_key": "sk-1",
                    "models": ["deepseek-chat", "deepseek-reasoner"],
                    "transformer": { "use": ["deepseek"] }
                },
                "not-an-object"
            ]
        }))
        .unwrap();

        let providers = config.providers();
        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0].name, "deepseek");
        assert_eq!(providers[0].api_key, "sk-1");
        assert_eq!(providers[0].models.len(), 2);
        assert!(providers[0].extra.contains_key("transformer"));
    }

    #[test]
    fn test_providers_missing() {
        let config = Configuration::new();
        assert!(config.providers().is_empty());
    }

    #[test]
    fn test_try_from_rejects_non_object() {
        assert!(Configuration::try_from(json!([1, 2])).is_err());
        assert!(Configuration::try_from(json!({"LOG": true})).is_ok());
    }

    #[test]
    fn test_deserialize_rejects_non_object() {
        assert!(serde_json::from_str::<Configuration>("\"text\"").is_err());
    }
}
