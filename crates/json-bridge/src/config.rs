//! Marshalling options.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Options shared by every call on a [`SerializerRegistry`](crate::SerializerRegistry).
///
/// Missing fields take their defaults, so partial documents are accepted:
///
/// ```
/// use json_bridge::SerializerConfig;
///
/// let config = SerializerConfig::from_json_str(r#"{"fixup_duplicates": false}"#).unwrap();
/// assert!(!config.fixup_duplicates);
/// assert!(config.fixup_circular_refs);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializerConfig {
    /// Replace cycles with back-references. When off, a cycle is an error.
    pub fixup_circular_refs: bool,
    /// Replace repeated non-cyclic objects with back-references. When off,
    /// they are serialized again in full.
    pub fixup_duplicates: bool,
    /// Emit `javaClass` hints on beans and containers.
    pub marshal_class_hints: bool,
    /// Emit bean properties whose value is null.
    pub marshal_null_attributes: bool,
    /// Bean properties never read or written.
    pub excluded_properties: Vec<String>,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            fixup_circular_refs: true,
            fixup_duplicates: true,
            marshal_class_hints: true,
            marshal_null_attributes: true,
            excluded_properties: vec!["declaringClass".to_string()],
        }
    }
}

impl SerializerConfig {
    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn is_excluded(&self, property: &str) -> bool {
        self.excluded_properties.iter().any(|p| p == property)
    }
}
