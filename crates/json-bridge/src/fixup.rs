//! The fixup pass.
//!
//! While marshalling, a repeated object is left out of the document: a
//! `null` stands in for it inside arrays and the key is omitted inside
//! objects. Each omission is recorded as a [`FixUp`] pointing from the
//! placeholder location back to the object's first location. Once the walk
//! is complete the table can either travel next to the document, or be
//! applied to it with [`apply_fixups`], which writes a `{"$ref": "<pointer>"}`
//! marker at every placeholder.
//!
//! ```
//! use json_bridge::{apply_fixups, FixUp};
//! use json_bridge_pointer::PathStep;
//! use serde_json::json;
//!
//! let mut doc = json!({"list": [{"id": 1}, null]});
//! let fixup = FixUp {
//!     location: vec![PathStep::from("list"), PathStep::Index(1)],
//!     original: vec![PathStep::from("list"), PathStep::Index(0)],
//! };
//! apply_fixups(&mut doc, &[fixup]).unwrap();
//! assert_eq!(doc, json!({"list": [{"id": 1}, {"$ref": "/list/0"}]}));
//! ```

use json_bridge_pointer::{format_json_pointer, set, Path, PathStep};
use log::debug;
use serde_json::{json, Map, Value};

use crate::error::FixupError;

/// Key of the back-reference marker object.
pub const BACK_REFERENCE_KEY: &str = "$ref";

/// A pending patch: the value at `location` is the object first written at
/// `original`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixUp {
    pub location: Path,
    pub original: Path,
}

impl FixUp {
    /// Wire form: `[[location steps...], [original steps...]]`.
    pub fn to_json(&self) -> Value {
        let steps = |path: &Path| Value::Array(path.iter().map(PathStep::to_json).collect());
        json!([steps(&self.location), steps(&self.original)])
    }

    pub fn from_json(value: &Value) -> Result<Self, FixupError> {
        let pair = value
            .as_array()
            .filter(|pair| pair.len() == 2)
            .ok_or_else(|| FixupError::Malformed("expected a [location, original] pair".into()))?;
        Ok(FixUp {
            location: path_from_json(&pair[0])?,
            original: path_from_json(&pair[1])?,
        })
    }
}

fn path_from_json(value: &Value) -> Result<Path, FixupError> {
    let steps = value
        .as_array()
        .ok_or_else(|| FixupError::Malformed(format!("path must be an array, got {value}")))?;
    steps
        .iter()
        .map(|step| match step {
            Value::String(key) => Ok(PathStep::Key(key.clone())),
            Value::Number(n) => n
                .as_u64()
                .map(|i| PathStep::Index(i as usize))
                .ok_or_else(|| FixupError::Malformed(format!("bad index {n}"))),
            other => Err(FixupError::Malformed(format!("bad path step {other}"))),
        })
        .collect()
}

pub fn fixups_to_json(fixups: &[FixUp]) -> Value {
    Value::Array(fixups.iter().map(FixUp::to_json).collect())
}

pub fn fixups_from_json(value: &Value) -> Result<Vec<FixUp>, FixupError> {
    value
        .as_array()
        .ok_or_else(|| FixupError::Malformed("fixups must be an array".into()))?
        .iter()
        .map(FixUp::from_json)
        .collect()
}

/// The marker written in place of a repeated object.
pub fn back_reference(original: &[PathStep]) -> Value {
    let mut marker = Map::new();
    marker.insert(
        BACK_REFERENCE_KEY.to_string(),
        Value::String(format_json_pointer(original)),
    );
    Value::Object(marker)
}

/// The pointer of a back-reference marker, if `value` is one.
pub fn back_reference_target(value: &Value) -> Option<&str> {
    match value {
        Value::Object(map) if map.len() == 1 => map.get(BACK_REFERENCE_KEY)?.as_str(),
        _ => None,
    }
}

/// Writes a back-reference marker at the location of every fixup.
///
/// Placeholders inside arrays are overwritten; omitted object keys are
/// inserted.
pub fn apply_fixups(doc: &mut Value, fixups: &[FixUp]) -> Result<(), FixupError> {
    if !fixups.is_empty() {
        debug!("applying {} fixups", fixups.len());
    }
    for fixup in fixups {
        set(doc, &fixup.location, back_reference(&fixup.original)).map_err(|source| {
            FixupError::Unreachable {
                location: format_json_pointer(&fixup.location),
                source,
            }
        })?;
    }
    Ok(())
}
