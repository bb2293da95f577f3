//! Type serializers.
//!
//! Each serializer converts one family of native types. The registry picks
//! the first serializer, in registration order, whose [`Serializer::can_serialize`]
//! accepts the native type and JSON shape at hand; serializers call back into
//! the registry for their children.

use std::fmt;

use serde_json::{Map, Value};

use crate::class::ClassTable;
use crate::error::{MarshalError, MarshalErrorKind, UnmarshalError, UnmarshalErrorKind};
use crate::native::{HeapObject, Native, NativeType, ObjectHeap};
use crate::registry::SerializerRegistry;
use crate::score::MatchScore;
use crate::state::SerializerState;

mod array;
mod bean;
mod boolean;
mod collection;
mod date;
mod enumeration;
mod number;
mod raw_json;
mod reference;
mod string;

pub use array::ArraySerializer;
pub use bean::{BeanCache, BeanData, BeanSerializer};
pub use boolean::BooleanSerializer;
pub use collection::CollectionSerializer;
pub use date::DateSerializer;
pub use enumeration::EnumSerializer;
pub(crate) use number::natural_primitive;
pub use number::{NumberSerializer, PrimitiveSerializer};
pub use raw_json::RawJsonSerializer;
pub use reference::ReferenceSerializer;
pub use string::StringSerializer;

/// Envelope member carrying the concrete class name.
pub const CLASS_HINT: &str = "javaClass";
pub const LIST_KEY: &str = "list";
pub const SET_KEY: &str = "set";
pub const MAP_KEY: &str = "map";
pub const TIME_KEY: &str = "time";
pub const REFERENCE_TYPE_KEY: &str = "JSONRPCType";
pub const OBJECT_ID_KEY: &str = "objectID";

/// The shape of a JSON value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JsonKind {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
}

impl JsonKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => JsonKind::Null,
            Value::Bool(_) => JsonKind::Bool,
            Value::Number(_) => JsonKind::Number,
            Value::String(_) => JsonKind::String,
            Value::Array(_) => JsonKind::Array,
            Value::Object(_) => JsonKind::Object,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            JsonKind::Null => "null",
            JsonKind::Bool => "boolean",
            JsonKind::Number => "number",
            JsonKind::String => "string",
            JsonKind::Array => "array",
            JsonKind::Object => "object",
        }
    }
}

impl fmt::Display for JsonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of marshalling one child.
#[derive(Debug, Clone, PartialEq)]
pub enum Marshalled {
    Json(Value),
    /// The child was already written elsewhere; a fixup has been recorded
    /// and the caller must leave a placeholder.
    CircularOrDuplicate,
}

impl Marshalled {
    /// The value to store in an array slot: repeats become `null`.
    pub fn into_array_slot(self) -> Value {
        match self {
            Marshalled::Json(value) => value,
            Marshalled::CircularOrDuplicate => Value::Null,
        }
    }

    /// The value to store under an object key; `None` means omit the key.
    pub fn into_member(self) -> Option<Value> {
        match self {
            Marshalled::Json(value) => Some(value),
            Marshalled::CircularOrDuplicate => None,
        }
    }
}

/// Converter between one family of native types and JSON.
pub trait Serializer: Send + Sync {
    /// Unique name, used to reject double registration.
    fn name(&self) -> &'static str;

    /// Whether this serializer handles `ty`. `json` is the shape being
    /// unmarshalled, or `None` when marshalling.
    fn can_serialize(&self, classes: &ClassTable, ty: &NativeType, json: Option<JsonKind>) -> bool;

    fn marshal(
        &self,
        ser: &SerializerRegistry,
        state: &mut SerializerState,
        heap: &ObjectHeap,
        value: &Native,
    ) -> Result<Value, MarshalError>;

    /// Scores how well `json` fits `ty` without building anything.
    fn try_unmarshal(
        &self,
        ser: &SerializerRegistry,
        state: &mut SerializerState,
        ty: &NativeType,
        json: &Value,
    ) -> Result<MatchScore, UnmarshalError>;

    fn unmarshal(
        &self,
        ser: &SerializerRegistry,
        state: &mut SerializerState,
        heap: &mut ObjectHeap,
        ty: &NativeType,
        json: &Value,
    ) -> Result<Native, UnmarshalError>;
}

pub(crate) fn unexpected(serializer: &'static str, value: &Native) -> MarshalError {
    MarshalError::new(MarshalErrorKind::UnexpectedValue {
        serializer,
        found: format!("{value:?}"),
    })
}

/// The heap object behind a `Ref`.
pub(crate) fn deref<'h>(
    serializer: &'static str,
    heap: &'h ObjectHeap,
    value: &Native,
) -> Result<&'h HeapObject, MarshalError> {
    let Native::Ref(id) = value else {
        return Err(unexpected(serializer, value));
    };
    heap.get(*id)
        .ok_or_else(|| MarshalError::new(MarshalErrorKind::DanglingReference(id.as_u64())))
}

pub(crate) fn type_mismatch(expected: impl fmt::Display, json: &Value) -> UnmarshalError {
    UnmarshalError::new(UnmarshalErrorKind::TypeMismatch {
        expected: expected.to_string(),
        found: JsonKind::of(json),
    })
}

pub(crate) fn as_object<'a>(
    ty: &NativeType,
    json: &'a Value,
) -> Result<&'a Map<String, Value>, UnmarshalError> {
    json.as_object().ok_or_else(|| type_mismatch(ty, json))
}

/// Starts an envelope object, with a class hint when hints are enabled.
pub(crate) fn envelope(ser: &SerializerRegistry, class: &str) -> Map<String, Value> {
    let mut obj = Map::new();
    if ser.config().marshal_class_hints {
        obj.insert(CLASS_HINT.to_string(), Value::String(class.to_string()));
    }
    obj
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_kind_of() {
        assert_eq!(JsonKind::of(&json!(null)), JsonKind::Null);
        assert_eq!(JsonKind::of(&json!(1.5)), JsonKind::Number);
        assert_eq!(JsonKind::of(&json!({})), JsonKind::Object);
        assert_eq!(JsonKind::Array.to_string(), "array");
    }

    #[test]
    fn test_marshalled_placeholders() {
        assert_eq!(Marshalled::CircularOrDuplicate.into_array_slot(), Value::Null);
        assert_eq!(Marshalled::CircularOrDuplicate.into_member(), None);
        assert_eq!(
            Marshalled::Json(json!(1)).into_member(),
            Some(json!(1))
        );
    }
}
