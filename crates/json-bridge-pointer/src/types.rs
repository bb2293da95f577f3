//! Type definitions for typed JSON Pointer paths.

use std::fmt;

/// A single step in a path.
///
/// Object members are addressed by key, array elements by index. When a path
/// is parsed back from a pointer string, purely numeric components become
/// [`PathStep::Index`]; lookups accept either form against either container.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathStep {
    /// Object member name.
    Key(String),
    /// Array element position.
    Index(usize),
}

impl PathStep {
    /// Returns the index if this step addresses an array element.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            PathStep::Index(i) => Some(*i),
            PathStep::Key(k) => {
                if crate::is_valid_index(k) {
                    k.parse().ok()
                } else {
                    None
                }
            }
        }
    }

    /// Returns the step as an object key.
    pub fn to_key(&self) -> String {
        match self {
            PathStep::Key(k) => k.clone(),
            PathStep::Index(i) => i.to_string(),
        }
    }

    /// Converts the step to its JSON form: a string for keys, a number for
    /// indices.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            PathStep::Key(k) => serde_json::Value::String(k.clone()),
            PathStep::Index(i) => serde_json::Value::from(*i as u64),
        }
    }
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathStep::Key(k) => f.write_str(k),
            PathStep::Index(i) => write!(f, "{}", i),
        }
    }
}

impl From<&str> for PathStep {
    fn from(key: &str) -> Self {
        PathStep::Key(key.to_string())
    }
}

impl From<String> for PathStep {
    fn from(key: String) -> Self {
        PathStep::Key(key)
    }
}

impl From<usize> for PathStep {
    fn from(index: usize) -> Self {
        PathStep::Index(index)
    }
}

/// A path from the document root.
pub type Path = Vec<PathStep>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_step_as_index() {
        assert_eq!(PathStep::Index(3).as_index(), Some(3));
        assert_eq!(PathStep::from("12").as_index(), Some(12));
        assert_eq!(PathStep::from("012").as_index(), None);
        assert_eq!(PathStep::from("name").as_index(), None);
    }

    #[test]
    fn test_step_to_json() {
        assert_eq!(PathStep::from("list").to_json(), json!("list"));
        assert_eq!(PathStep::Index(4).to_json(), json!(4));
    }

    #[test]
    fn test_step_display() {
        assert_eq!(PathStep::from("a/b").to_string(), "a/b");
        assert_eq!(PathStep::Index(7).to_string(), "7");
    }
}
