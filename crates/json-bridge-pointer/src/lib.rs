//! Typed JSON Pointer (RFC 6901) paths.
//!
//! Paths are sequences of [`PathStep`]s, either object keys or array
//! indices. They are rendered as JSON Pointer strings for error messages and
//! back-reference markers, and resolved against `serde_json` documents.
//!
//! # Example
//!
//! ```
//! use json_bridge_pointer::{format_json_pointer, get, parse_json_pointer, PathStep};
//! use serde_json::json;
//!
//! let path = vec![PathStep::from("items"), PathStep::Index(1)];
//! assert_eq!(format_json_pointer(&path), "/items/1");
//!
//! let doc = json!({"items": [10, 20]});
//! assert_eq!(get(&doc, &path), Some(&json!(20)));
//! assert_eq!(parse_json_pointer("/items/1").unwrap(), path);
//! ```

use serde_json::Value;
use thiserror::Error;

pub mod types;
pub use types::{Path, PathStep};

/// Maximum allowed pointer string length.
const MAX_POINTER_LENGTH: usize = 4096;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PointerError {
    #[error("no value at path")]
    NotFound,
    #[error("not an index into the array")]
    InvalidIndex,
    #[error("root has no parent")]
    NoParent,
    #[error("pointer must be empty or start with '/'")]
    PointerInvalid,
    #[error("pointer longer than 4096 bytes")]
    PointerTooLong,
}

/// Unescapes a JSON Pointer path component.
///
/// `~1` becomes `/` and `~0` becomes `~`.
///
/// ```
/// use json_bridge_pointer::unescape_component;
///
/// assert_eq!(unescape_component("a~0b"), "a~b");
/// assert_eq!(unescape_component("c~1d"), "c/d");
/// ```
pub fn unescape_component(component: &str) -> String {
    if !component.contains('~') {
        return component.to_string();
    }
    // ~1 first, otherwise "~01" would decode to "/"
    component.replace("~1", "/").replace("~0", "~")
}

/// Escapes a JSON Pointer path component.
///
/// ```
/// use json_bridge_pointer::escape_component;
///
/// assert_eq!(escape_component("a~b"), "a~0b");
/// assert_eq!(escape_component("c/d"), "c~1d");
/// ```
pub fn escape_component(component: &str) -> String {
    if !component.contains('/') && !component.contains('~') {
        return component.to_string();
    }
    component.replace('~', "~0").replace('/', "~1")
}

/// Validates a JSON Pointer string.
///
/// The empty string (root) is valid; anything else must start with `/`.
pub fn validate_json_pointer(pointer: &str) -> Result<(), PointerError> {
    if pointer.is_empty() {
        return Ok(());
    }
    if !pointer.starts_with('/') {
        return Err(PointerError::PointerInvalid);
    }
    if pointer.len() > MAX_POINTER_LENGTH {
        return Err(PointerError::PointerTooLong);
    }
    Ok(())
}

/// Parses a JSON Pointer string into typed steps.
///
/// Canonical array indices (`0`, `17`, never `017`) become
/// [`PathStep::Index`]; every other component is a [`PathStep::Key`].
pub fn parse_json_pointer(pointer: &str) -> Result<Path, PointerError> {
    validate_json_pointer(pointer)?;
    if pointer.is_empty() {
        return Ok(Vec::new());
    }
    Ok(pointer[1..]
        .split('/')
        .map(|raw| {
            let component = unescape_component(raw);
            if is_valid_index(&component) {
                match component.parse::<usize>() {
                    Ok(i) => PathStep::Index(i),
                    Err(_) => PathStep::Key(component),
                }
            } else {
                PathStep::Key(component)
            }
        })
        .collect())
}

/// Formats typed steps as a JSON Pointer string. The root path is `""`.
pub fn format_json_pointer(path: &[PathStep]) -> String {
    let mut out = String::new();
    for step in path {
        out.push('/');
        match step {
            PathStep::Key(k) => out.push_str(&escape_component(k)),
            PathStep::Index(i) => out.push_str(&i.to_string()),
        }
    }
    out
}

/// Checks if a string is a canonical non-negative array index.
pub fn is_valid_index(index: &str) -> bool {
    if index.is_empty() {
        return false;
    }
    let bytes = index.as_bytes();
    if bytes.len() > 1 && bytes[0] == b'0' {
        return false;
    }
    bytes.iter().all(|b| b.is_ascii_digit())
}

/// Returns the parent of a path.
pub fn parent(path: &[PathStep]) -> Result<&[PathStep], PointerError> {
    match path.split_last() {
        Some((_, rest)) => Ok(rest),
        None => Err(PointerError::NoParent),
    }
}

/// Checks if `parent` is a strict prefix of `child`.
pub fn is_child(parent: &[PathStep], child: &[PathStep]) -> bool {
    parent.len() < child.len() && child[..parent.len()] == *parent
}

fn step_into<'a>(current: &'a Value, step: &PathStep) -> Option<&'a Value> {
    match current {
        Value::Array(arr) => arr.get(step.as_index()?),
        Value::Object(map) => map.get(&step.to_key()),
        _ => None,
    }
}

fn step_into_mut<'a>(current: &'a mut Value, step: &PathStep) -> Option<&'a mut Value> {
    match current {
        Value::Array(arr) => arr.get_mut(step.as_index()?),
        Value::Object(map) => map.get_mut(&step.to_key()),
        _ => None,
    }
}

/// Gets a value from a document by path.
///
/// Returns `None` if any step does not exist.
pub fn get<'a>(doc: &'a Value, path: &[PathStep]) -> Option<&'a Value> {
    path.iter().try_fold(doc, |current, step| step_into(current, step))
}

/// Gets a mutable reference to a value in a document by path.
pub fn get_mut<'a>(doc: &'a mut Value, path: &[PathStep]) -> Option<&'a mut Value> {
    let mut current = doc;
    for step in path {
        current = step_into_mut(current, step)?;
    }
    Some(current)
}

/// Writes `value` at `path`.
///
/// The parent container must exist. Object members are inserted or replaced;
/// array elements are replaced, or appended when the index equals the length.
/// Writing at the root replaces the whole document.
pub fn set(doc: &mut Value, path: &[PathStep], value: Value) -> Result<(), PointerError> {
    let Some((last, parent_path)) = path.split_last() else {
        *doc = value;
        return Ok(());
    };
    let container = get_mut(doc, parent_path).ok_or(PointerError::NotFound)?;
    match container {
        Value::Array(arr) => {
            let idx = last.as_index().ok_or(PointerError::InvalidIndex)?;
            if idx < arr.len() {
                arr[idx] = value;
            } else if idx == arr.len() {
                arr.push(value);
            } else {
                return Err(PointerError::InvalidIndex);
            }
            Ok(())
        }
        Value::Object(map) => {
            map.insert(last.to_key(), value);
            Ok(())
        }
        _ => Err(PointerError::NotFound),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn p(steps: &[&str]) -> Path {
        steps.iter().map(|s| PathStep::from(*s)).collect()
    }

    #[test]
    fn test_escape_roundtrip() {
        for raw in ["plain", "a/b", "a~b", "~1", "/~/"] {
            assert_eq!(unescape_component(&escape_component(raw)), raw);
        }
    }

    #[test]
    fn test_format_json_pointer() {
        assert_eq!(format_json_pointer(&[]), "");
        assert_eq!(format_json_pointer(&p(&["a/b", "c~d"])), "/a~1b/c~0d");
        assert_eq!(
            format_json_pointer(&[PathStep::from("list"), PathStep::Index(0)]),
            "/list/0"
        );
    }

    #[test]
    fn test_parse_json_pointer() {
        assert_eq!(parse_json_pointer("").unwrap(), Vec::<PathStep>::new());
        assert_eq!(
            parse_json_pointer("/map/01/2").unwrap(),
            vec![
                PathStep::from("map"),
                PathStep::from("01"),
                PathStep::Index(2)
            ]
        );
        assert_eq!(
            parse_json_pointer("no-slash"),
            Err(PointerError::PointerInvalid)
        );
    }

    #[test]
    fn test_get_accepts_both_step_forms() {
        let doc = json!({"0": "key zero", "arr": ["x", "y"]});
        assert_eq!(get(&doc, &[PathStep::Index(0)]), Some(&json!("key zero")));
        assert_eq!(get(&doc, &p(&["arr", "1"])), Some(&json!("y")));
        assert_eq!(get(&doc, &p(&["arr", "5"])), None);
        assert_eq!(get(&doc, &p(&["missing"])), None);
    }

    #[test]
    fn test_set_object_and_array() {
        let mut doc = json!({"a": [1, null, 3]});
        set(&mut doc, &p(&["a", "1"]), json!(2)).unwrap();
        set(&mut doc, &[PathStep::from("a"), PathStep::Index(3)], json!(4)).unwrap();
        set(&mut doc, &p(&["b"]), json!(true)).unwrap();
        assert_eq!(doc, json!({"a": [1, 2, 3, 4], "b": true}));
    }

    #[test]
    fn test_set_errors() {
        let mut doc = json!({"a": [1]});
        assert_eq!(
            set(&mut doc, &p(&["x", "y"]), json!(1)),
            Err(PointerError::NotFound)
        );
        assert_eq!(
            set(&mut doc, &[PathStep::from("a"), PathStep::Index(5)], json!(1)),
            Err(PointerError::InvalidIndex)
        );
    }

    #[test]
    fn test_parent_and_is_child() {
        let path = p(&["a", "b"]);
        assert_eq!(parent(&path).unwrap(), &p(&["a"])[..]);
        assert_eq!(parent(&[]), Err(PointerError::NoParent));
        assert!(is_child(&p(&["a"]), &path));
        assert!(!is_child(&path, &path));
        assert!(!is_child(&p(&["b"]), &path));
    }
}
