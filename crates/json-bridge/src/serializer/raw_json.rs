use indexmap::IndexMap;
use json_bridge_pointer::PathStep;
use serde_json::Value;

use crate::class::{names, ClassKind, ClassTable};
use crate::error::{MarshalError, UnmarshalError, UnmarshalErrorKind};
use crate::fixup::back_reference_target;
use crate::native::{Native, NativeType, ObjectData, ObjectHeap};
use crate::registry::SerializerRegistry;
use crate::score::MatchScore;
use crate::state::SerializerState;

use super::{deref, type_mismatch, unexpected, JsonKind, Serializer};

/// Untyped JSON held natively (`org.json.JSONObject` / `JSONArray`).
///
/// Members still go through the registry on marshal, so a raw holder that
/// contains itself or shares a member is subject to fixups like any other
/// container. Unmarshal copies the JSON without typed dispatch, resolving
/// back-reference markers to the holders already built.
#[derive(Debug, Default)]
pub struct RawJsonSerializer;

fn raw_kind(classes: &ClassTable, ty: &NativeType) -> Option<JsonKind> {
    match classes.kind(ty.class_name()?)? {
        ClassKind::RawObject => Some(JsonKind::Object),
        ClassKind::RawArray => Some(JsonKind::Array),
        _ => None,
    }
}

/// Builds natives mirroring `json`. The outermost holder gets `class`, nested
/// ones the built-in classes.
fn raw_from_json(
    state: &mut SerializerState,
    heap: &mut ObjectHeap,
    class: Option<&str>,
    json: &Value,
) -> Result<Native, UnmarshalError> {
    if let Some(pointer) = back_reference_target(json) {
        return state.serialized(pointer).cloned().ok_or_else(|| {
            UnmarshalErrorKind::UnresolvedBackReference(pointer.to_string()).into()
        });
    }
    let value = match json {
        Value::Null => Native::Null,
        Value::Bool(b) => Native::Bool(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => i32::try_from(i).map_or(Native::Long(i), Native::Int),
            None => n.as_f64().map_or(Native::Null, Native::Double),
        },
        Value::String(s) => Native::Str(s.clone()),
        Value::Array(elements) => {
            let class = class.unwrap_or(names::JSON_ARRAY);
            let id = heap.alloc(class, ObjectData::RawArray(Vec::new()));
            // registered before the members so they can point back at it
            state.set_serialized(Native::Ref(id));
            let mut items = Vec::with_capacity(elements.len());
            for (i, element) in elements.iter().enumerate() {
                items.push(raw_child(state, heap, i.into(), element)?);
            }
            if let Some(object) = heap.get_mut(id) {
                object.data = ObjectData::RawArray(items);
            }
            Native::Ref(id)
        }
        Value::Object(members) => {
            let class = class.unwrap_or(names::JSON_OBJECT);
            let id = heap.alloc(class, ObjectData::RawObject(IndexMap::new()));
            state.set_serialized(Native::Ref(id));
            let mut fields = IndexMap::with_capacity(members.len());
            for (key, member) in members {
                fields.insert(key.clone(), raw_child(state, heap, key.as_str().into(), member)?);
            }
            if let Some(object) = heap.get_mut(id) {
                object.data = ObjectData::RawObject(fields);
            }
            Native::Ref(id)
        }
    };
    Ok(value)
}

fn raw_child(
    state: &mut SerializerState,
    heap: &mut ObjectHeap,
    key: PathStep,
    json: &Value,
) -> Result<Native, UnmarshalError> {
    state.push_step(key.clone());
    let result = raw_from_json(state, heap, None, json);
    state.pop_step();
    result.map_err(|e| e.within(key))
}

impl Serializer for RawJsonSerializer {
    fn name(&self) -> &'static str {
        "raw_json"
    }

    fn can_serialize(&self, classes: &ClassTable, ty: &NativeType, json: Option<JsonKind>) -> bool {
        match raw_kind(classes, ty) {
            Some(expected) => json.map_or(true, |kind| kind == expected),
            None => false,
        }
    }

    fn marshal(
        &self,
        ser: &SerializerRegistry,
        state: &mut SerializerState,
        heap: &ObjectHeap,
        value: &Native,
    ) -> Result<Value, MarshalError> {
        match &deref(self.name(), heap, value)?.data {
            ObjectData::RawObject(fields) => {
                let mut out = serde_json::Map::new();
                for (key, field) in fields {
                    let json = ser.marshal_child(state, heap, key.as_str().into(), field)?;
                    if let Some(json) = json.into_member() {
                        out.insert(key.clone(), json);
                    }
                }
                Ok(Value::Object(out))
            }
            ObjectData::RawArray(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    out.push(ser.marshal_child(state, heap, i.into(), item)?.into_array_slot());
                }
                Ok(Value::Array(out))
            }
            _ => Err(unexpected(self.name(), value)),
        }
    }

    fn try_unmarshal(
        &self,
        ser: &SerializerRegistry,
        _state: &mut SerializerState,
        ty: &NativeType,
        json: &Value,
    ) -> Result<MatchScore, UnmarshalError> {
        if raw_kind(ser.classes(), ty) == Some(JsonKind::of(json)) {
            Ok(MatchScore::OKAY)
        } else {
            Err(type_mismatch(ty, json))
        }
    }

    fn unmarshal(
        &self,
        ser: &SerializerRegistry,
        state: &mut SerializerState,
        heap: &mut ObjectHeap,
        ty: &NativeType,
        json: &Value,
    ) -> Result<Native, UnmarshalError> {
        if raw_kind(ser.classes(), ty) != Some(JsonKind::of(json)) {
            return Err(type_mismatch(ty, json));
        }
        raw_from_json(state, heap, ty.class_name(), json)
    }
}
