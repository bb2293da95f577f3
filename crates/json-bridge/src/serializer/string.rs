use serde_json::Value;

use crate::class::ClassTable;
use crate::error::{MarshalError, MarshalErrorKind, UnmarshalError, UnmarshalErrorKind};
use crate::native::{Native, NativeType, ObjectData, ObjectHeap, Primitive, PrimitiveArray};
use crate::registry::SerializerRegistry;
use crate::score::MatchScore;
use crate::state::SerializerState;

use super::{deref, type_mismatch, unexpected, JsonKind, Serializer};

/// Text: `String`, `char`, `byte[]` and `char[]` all travel as a JSON string.
///
/// `byte[]` is read as UTF-8; invalid sequences are a marshal error.
/// Numbers are accepted for text targets in their decimal form.
#[derive(Debug, Default)]
pub struct StringSerializer;

fn is_text(ty: &NativeType) -> bool {
    match ty {
        NativeType::String
        | NativeType::Primitive(Primitive::Char)
        | NativeType::Boxed(Primitive::Char) => true,
        NativeType::Array(component) => matches!(
            **component,
            NativeType::Primitive(Primitive::Byte) | NativeType::Primitive(Primitive::Char)
        ),
        _ => false,
    }
}

fn text_of(json: &Value) -> Option<String> {
    match json {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl Serializer for StringSerializer {
    fn name(&self) -> &'static str {
        "string"
    }

    fn can_serialize(
        &self,
        _classes: &ClassTable,
        ty: &NativeType,
        json: Option<JsonKind>,
    ) -> bool {
        is_text(ty) && matches!(json, None | Some(JsonKind::String) | Some(JsonKind::Number))
    }

    fn marshal(
        &self,
        _ser: &SerializerRegistry,
        _state: &mut SerializerState,
        heap: &ObjectHeap,
        value: &Native,
    ) -> Result<Value, MarshalError> {
        match value {
            Native::Str(s) => Ok(Value::String(s.clone())),
            Native::Char(c) => Ok(Value::String(c.to_string())),
            Native::Ref(_) => match &deref(self.name(), heap, value)?.data {
                ObjectData::PrimitiveArray(PrimitiveArray::Char(chars)) => {
                    Ok(Value::String(chars.iter().collect()))
                }
                ObjectData::PrimitiveArray(PrimitiveArray::Byte(bytes)) => {
                    let bytes: Vec<u8> = bytes.iter().map(|b| *b as u8).collect();
                    String::from_utf8(bytes)
                        .map(Value::String)
                        .map_err(|_| MarshalError::new(MarshalErrorKind::InvalidUtf8))
                }
                _ => Err(unexpected(self.name(), value)),
            },
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
        let text = text_of(json).ok_or_else(|| type_mismatch(ty, json))?;
        if matches!(ty, NativeType::Primitive(Primitive::Char) | NativeType::Boxed(Primitive::Char))
            && text.is_empty()
        {
            return Err(UnmarshalError::new(UnmarshalErrorKind::EmptyChar));
        }
        Ok(MatchScore::OKAY)
    }

    fn unmarshal(
        &self,
        _ser: &SerializerRegistry,
        _state: &mut SerializerState,
        heap: &mut ObjectHeap,
        ty: &NativeType,
        json: &Value,
    ) -> Result<Native, UnmarshalError> {
        let text = text_of(json).ok_or_else(|| type_mismatch(ty, json))?;
        let array = match ty {
            NativeType::String => return Ok(Native::Str(text)),
            NativeType::Primitive(Primitive::Char) | NativeType::Boxed(Primitive::Char) => {
                return text
                    .chars()
                    .next()
                    .map(Native::Char)
                    .ok_or_else(|| UnmarshalError::new(UnmarshalErrorKind::EmptyChar));
            }
            NativeType::Array(component)
                if **component == NativeType::Primitive(Primitive::Char) =>
            {
                PrimitiveArray::Char(text.chars().collect())
            }
            NativeType::Array(_) => PrimitiveArray::Byte(text.bytes().map(|b| b as i8).collect()),
            _ => return Err(type_mismatch(ty, json)),
        };
        Ok(heap.new_primitive_array(array))
    }
}
