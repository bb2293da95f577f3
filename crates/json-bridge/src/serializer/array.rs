use serde_json::Value;

use crate::class::ClassTable;
use crate::error::{MarshalError, UnmarshalError};
use crate::native::{Native, NativeType, ObjectData, ObjectHeap, PrimitiveArray};
use crate::registry::SerializerRegistry;
use crate::score::MatchScore;
use crate::state::SerializerState;

use super::number::number_to_json;
use super::{deref, type_mismatch, unexpected, JsonKind, Serializer};

/// Native arrays as JSON arrays.
///
/// Primitive elements are widened to their JSON form on marshal and narrowed
/// back to the exact component type on unmarshal; a failing element reports
/// its index. Object arrays unmarshalled for an `Object[]` target take the
/// most specific class common to their elements as component type.
#[derive(Debug, Default)]
pub struct ArraySerializer;

fn component(ty: &NativeType) -> Option<&NativeType> {
    match ty {
        NativeType::Array(component) => Some(component),
        _ => None,
    }
}

fn primitive_to_json(value: &Native) -> Result<Value, MarshalError> {
    match value {
        Native::Bool(b) => Ok(Value::Bool(*b)),
        Native::Char(c) => Ok(Value::String(c.to_string())),
        other => number_to_json("array", other),
    }
}

fn common_supertype(classes: &ClassTable, a: &NativeType, b: &NativeType) -> Option<NativeType> {
    if classes.is_assignable(b, a) {
        return Some(a.clone());
    }
    if classes.is_assignable(a, b) {
        return Some(b.clone());
    }
    let name = a.class_name()?;
    classes
        .ancestry(name)
        .into_iter()
        .map(NativeType::Class)
        .find(|candidate| classes.is_assignable(b, candidate))
}

/// Most specific type every non-null element is assignable to.
fn infer_component(classes: &ClassTable, heap: &ObjectHeap, items: &[Native]) -> NativeType {
    let mut types = items.iter().filter_map(|item| heap.runtime_type(item));
    let Some(first) = types.next() else {
        return NativeType::Object;
    };
    types
        .try_fold(first, |acc, ty| common_supertype(classes, &acc, &ty))
        .unwrap_or(NativeType::Object)
}

impl Serializer for ArraySerializer {
    fn name(&self) -> &'static str {
        "array"
    }

    fn can_serialize(
        &self,
        _classes: &ClassTable,
        ty: &NativeType,
        json: Option<JsonKind>,
    ) -> bool {
        matches!(ty, NativeType::Array(_)) && matches!(json, None | Some(JsonKind::Array))
    }

    fn marshal(
        &self,
        ser: &SerializerRegistry,
        state: &mut SerializerState,
        heap: &ObjectHeap,
        value: &Native,
    ) -> Result<Value, MarshalError> {
        match &deref(self.name(), heap, value)?.data {
            ObjectData::PrimitiveArray(values) => values
                .iter()
                .enumerate()
                .map(|(i, v)| primitive_to_json(&v).map_err(|e| e.within(i)))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            ObjectData::ObjectArray { items, .. } => {
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
        state: &mut SerializerState,
        ty: &NativeType,
        json: &Value,
    ) -> Result<MatchScore, UnmarshalError> {
        let component = component(ty).ok_or_else(|| type_mismatch(ty, json))?;
        let elements = json.as_array().ok_or_else(|| type_mismatch(ty, json))?;
        let mut score = MatchScore::OKAY;
        for (i, element) in elements.iter().enumerate() {
            score = score.combine(ser.try_unmarshal_child(state, i.into(), component, element)?);
        }
        Ok(score)
    }

    fn unmarshal(
        &self,
        ser: &SerializerRegistry,
        state: &mut SerializerState,
        heap: &mut ObjectHeap,
        ty: &NativeType,
        json: &Value,
    ) -> Result<Native, UnmarshalError> {
        let component = component(ty).ok_or_else(|| type_mismatch(ty, json))?;
        let elements = json.as_array().ok_or_else(|| type_mismatch(ty, json))?;

        if let NativeType::Primitive(p) = component {
            let id = heap.alloc(
                ty.name(),
                ObjectData::PrimitiveArray(PrimitiveArray::with_capacity(*p, 0)),
            );
            state.set_serialized(Native::Ref(id));
            let mut values = PrimitiveArray::with_capacity(*p, elements.len());
            for (i, element) in elements.iter().enumerate() {
                let value = ser.unmarshal_child(state, heap, i.into(), component, element)?;
                if !values.push(&value) {
                    return Err(type_mismatch(component, element).within(i));
                }
            }
            if let Some(object) = heap.get_mut(id) {
                object.data = ObjectData::PrimitiveArray(values);
            }
            return Ok(Native::Ref(id));
        }

        let id = heap.alloc(
            ty.name(),
            ObjectData::ObjectArray {
                component: component.clone(),
                items: Vec::new(),
            },
        );
        state.set_serialized(Native::Ref(id));
        let mut items = Vec::with_capacity(elements.len());
        for (i, element) in elements.iter().enumerate() {
            items.push(ser.unmarshal_child(state, heap, i.into(), component, element)?);
        }
        let component = match component {
            NativeType::Object => infer_component(ser.classes(), heap, &items),
            declared => declared.clone(),
        };
        if let Some(object) = heap.get_mut(id) {
            object.class = NativeType::array(component.clone()).name().into();
            object.data = ObjectData::ObjectArray { component, items };
        }
        Ok(Native::Ref(id))
    }
}
