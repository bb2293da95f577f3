use serde_json::Value;

use crate::class::ClassTable;
use crate::error::{MarshalError, UnmarshalError};
use crate::native::{Native, NativeType, ObjectHeap, Primitive};
use crate::registry::SerializerRegistry;
use crate::score::MatchScore;
use crate::state::SerializerState;

use super::{type_mismatch, unexpected, JsonKind, Serializer};

/// `boolean` and `java.lang.Boolean`.
///
/// Strings are accepted and read case-insensitively: `"TRUE"` is `true`,
/// anything else is `false`. Only `"true"` and `"false"` score as exact
/// matches; every other string scores [`MatchScore::ROUGHLY_SIMILAR`].
#[derive(Debug, Default)]
pub struct BooleanSerializer;

impl Serializer for BooleanSerializer {
    fn name(&self) -> &'static str {
        "boolean"
    }

    fn can_serialize(
        &self,
        _classes: &ClassTable,
        ty: &NativeType,
        json: Option<JsonKind>,
    ) -> bool {
        matches!(
            ty,
            NativeType::Primitive(Primitive::Boolean) | NativeType::Boxed(Primitive::Boolean)
        ) && matches!(json, None | Some(JsonKind::Bool) | Some(JsonKind::String))
    }

    fn marshal(
        &self,
        _ser: &SerializerRegistry,
        _state: &mut SerializerState,
        _heap: &ObjectHeap,
        value: &Native,
    ) -> Result<Value, MarshalError> {
        match value {
            Native::Bool(b) => Ok(Value::Bool(*b)),
            other => Err(unexpected(self.name(), other)),
        }
    }

    fn try_unmarshal(
        &self,
        _ser: &SerializerRegistry,
        _state: &mut SerializerState,
        ty: &NativeType,
        json: &Value,
    ) -> Result<MatchScore, UnmarshalError> {
        match json {
            Value::Bool(_) => Ok(MatchScore::OKAY),
            Value::String(s) if s == "true" || s == "false" => Ok(MatchScore::OKAY),
            Value::String(_) => Ok(MatchScore::ROUGHLY_SIMILAR),
            other => Err(type_mismatch(ty, other)),
        }
    }

    fn unmarshal(
        &self,
        _ser: &SerializerRegistry,
        _state: &mut SerializerState,
        _heap: &mut ObjectHeap,
        ty: &NativeType,
        json: &Value,
    ) -> Result<Native, UnmarshalError> {
        match json {
            Value::Bool(b) => Ok(Native::Bool(*b)),
            Value::String(s) => Ok(Native::Bool(s.eq_ignore_ascii_case("true"))),
            other => Err(type_mismatch(ty, other)),
        }
    }
}
