use serde_json::Value;

use crate::class::{ClassKind, ClassTable};
use crate::error::{MarshalError, UnmarshalError, UnmarshalErrorKind};
use crate::native::{Native, NativeType, ObjectHeap};
use crate::registry::SerializerRegistry;
use crate::score::MatchScore;
use crate::state::SerializerState;

use super::{as_object, envelope, unexpected, JsonKind, Serializer, TIME_KEY};

/// Dates: `{"javaClass": "java.util.Date", "time": <epoch millis>}`.
#[derive(Debug, Default)]
pub struct DateSerializer;

fn millis(ty: &NativeType, json: &Value) -> Result<i64, UnmarshalError> {
    as_object(ty, json)?
        .get(TIME_KEY)
        .and_then(Value::as_i64)
        .ok_or_else(|| UnmarshalError::new(UnmarshalErrorKind::MissingField(TIME_KEY)))
}

impl Serializer for DateSerializer {
    fn name(&self) -> &'static str {
        "date"
    }

    fn can_serialize(&self, classes: &ClassTable, ty: &NativeType, json: Option<JsonKind>) -> bool {
        ty.class_name()
            .is_some_and(|c| matches!(classes.kind(c), Some(ClassKind::Date)))
            && matches!(json, None | Some(JsonKind::Object))
    }

    fn marshal(
        &self,
        ser: &SerializerRegistry,
        _state: &mut SerializerState,
        _heap: &ObjectHeap,
        value: &Native,
    ) -> Result<Value, MarshalError> {
        let Native::Date(millis) = value else {
            return Err(unexpected(self.name(), value));
        };
        let mut obj = envelope(ser, crate::class::names::DATE);
        obj.insert(TIME_KEY.to_string(), Value::from(*millis));
        Ok(Value::Object(obj))
    }

    fn try_unmarshal(
        &self,
        _ser: &SerializerRegistry,
        _state: &mut SerializerState,
        ty: &NativeType,
        json: &Value,
    ) -> Result<MatchScore, UnmarshalError> {
        millis(ty, json).map(|_| MatchScore::OKAY)
    }

    fn unmarshal(
        &self,
        _ser: &SerializerRegistry,
        _state: &mut SerializerState,
        _heap: &mut ObjectHeap,
        ty: &NativeType,
        json: &Value,
    ) -> Result<Native, UnmarshalError> {
        millis(ty, json).map(Native::Date)
    }
}
