use serde_json::Value;

use crate::class::{ClassKind, ClassTable};
use crate::error::{MarshalError, UnmarshalError, UnmarshalErrorKind};
use crate::native::{Native, NativeType, ObjectHeap};
use crate::registry::SerializerRegistry;
use crate::score::MatchScore;
use crate::state::SerializerState;

use super::{type_mismatch, unexpected, JsonKind, Serializer};

/// Enum constants travel as their name.
#[derive(Debug, Default)]
pub struct EnumSerializer;

fn constant(
    ser: &SerializerRegistry,
    ty: &NativeType,
    json: &Value,
) -> Result<Native, UnmarshalError> {
    let name = json.as_str().ok_or_else(|| type_mismatch(ty, json))?;
    let class = ty.class_name().ok_or_else(|| type_mismatch(ty, json))?;
    match ser.classes().kind(class) {
        Some(ClassKind::Enum(constants)) if constants.iter().any(|c| &**c == name) => {
            Ok(Native::enum_constant(class, name))
        }
        _ => Err(UnmarshalError::new(UnmarshalErrorKind::UnknownEnumConstant {
            class: class.to_string(),
            name: name.to_string(),
        })),
    }
}

impl Serializer for EnumSerializer {
    fn name(&self) -> &'static str {
        "enum"
    }

    fn can_serialize(&self, classes: &ClassTable, ty: &NativeType, json: Option<JsonKind>) -> bool {
        ty.class_name().is_some_and(|c| classes.is_enum(c))
            && matches!(json, None | Some(JsonKind::String))
    }

    fn marshal(
        &self,
        _ser: &SerializerRegistry,
        _state: &mut SerializerState,
        _heap: &ObjectHeap,
        value: &Native,
    ) -> Result<Value, MarshalError> {
        match value {
            Native::Enum(e) => Ok(Value::String(e.name.to_string())),
            other => Err(unexpected(self.name(), other)),
        }
    }

    fn try_unmarshal(
        &self,
        ser: &SerializerRegistry,
        _state: &mut SerializerState,
        ty: &NativeType,
        json: &Value,
    ) -> Result<MatchScore, UnmarshalError> {
        constant(ser, ty, json).map(|_| MatchScore::OKAY)
    }

    fn unmarshal(
        &self,
        ser: &SerializerRegistry,
        _state: &mut SerializerState,
        _heap: &mut ObjectHeap,
        ty: &NativeType,
        json: &Value,
    ) -> Result<Native, UnmarshalError> {
        constant(ser, ty, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::ClassInfo;
    use crate::config::SerializerConfig;
    use serde_json::json;

    #[test]
    fn test_constants_by_name() {
        let mut ser = SerializerRegistry::new(SerializerConfig::default());
        ser.register_class(ClassInfo::enumeration("com.example.Color", ["RED", "GREEN"]))
            .unwrap();
        let ty = NativeType::class("com.example.Color");
        let mut state = SerializerState::new();
        let mut heap = ObjectHeap::new();
        let s = EnumSerializer;

        assert!(s.can_serialize(ser.classes(), &ty, Some(JsonKind::String)));
        assert_eq!(
            s.unmarshal(&ser, &mut state, &mut heap, &ty, &json!("RED")).unwrap(),
            Native::enum_constant("com.example.Color", "RED")
        );
        assert!(matches!(
            s.try_unmarshal(&ser, &mut state, &ty, &json!("BLUE")).unwrap_err().kind,
            UnmarshalErrorKind::UnknownEnumConstant { .. }
        ));
        assert_eq!(
            s.marshal(&ser, &mut state, &heap, &Native::enum_constant("com.example.Color", "GREEN"))
                .unwrap(),
            json!("GREEN")
        );
    }
}
