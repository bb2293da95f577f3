//! Lists, sets, maps and dictionaries.
//!
//! All four travel in an envelope naming the concrete class:
//!
//! ```text
//! {"javaClass": "java.util.ArrayList", "list": [ ... ]}
//! {"javaClass": "java.util.HashSet",   "set":  {"<key>": <element>, ...}}
//! {"javaClass": "java.util.HashMap",   "map":  {"<key>": <value>, ...}}
//! ```
//!
//! Map keys and set elements are keyed by their string form, so keys come
//! back as strings whatever their original type. On unmarshal the hint is
//! mandatory and must name an instantiable class of the right shape.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::class::{ClassKind, ClassTable, ContainerKind};
use crate::error::{MarshalError, MarshalErrorKind, UnmarshalError, UnmarshalErrorKind};
use crate::native::{HeapObject, Native, NativeType, ObjectData, ObjectHeap};
use crate::registry::SerializerRegistry;
use crate::score::MatchScore;
use crate::state::SerializerState;

use super::{
    as_object, deref, envelope, JsonKind, Serializer, CLASS_HINT, LIST_KEY, MAP_KEY,
    SET_KEY,
};

/// One serializer per [`ContainerKind`].
#[derive(Debug, Clone, Copy)]
pub struct CollectionSerializer {
    kind: ContainerKind,
}

impl CollectionSerializer {
    pub fn new(kind: ContainerKind) -> Self {
        Self { kind }
    }

    pub fn list() -> Self {
        Self::new(ContainerKind::List)
    }

    pub fn set() -> Self {
        Self::new(ContainerKind::Set)
    }

    pub fn map() -> Self {
        Self::new(ContainerKind::Map)
    }

    pub fn dictionary() -> Self {
        Self::new(ContainerKind::Dictionary)
    }

    fn member_key(&self) -> &'static str {
        match self.kind {
            ContainerKind::List => LIST_KEY,
            ContainerKind::Set => SET_KEY,
            ContainerKind::Map | ContainerKind::Dictionary => MAP_KEY,
        }
    }

    /// The concrete class named by the envelope hint.
    fn concrete_class(
        &self,
        ser: &SerializerRegistry,
        ty: &NativeType,
        envelope: &Map<String, Value>,
    ) -> Result<Arc<str>, UnmarshalError> {
        let hint = envelope
            .get(CLASS_HINT)
            .ok_or(UnmarshalErrorKind::MissingHint)?
            .as_str()
            .ok_or(UnmarshalErrorKind::InvalidHint)?;
        let info = ser
            .classes()
            .get(hint)
            .ok_or_else(|| UnmarshalErrorKind::UnknownHint(hint.to_string()))?;
        let mismatch = || UnmarshalErrorKind::HintMismatch {
            hint: hint.to_string(),
            target: ty.name(),
        };
        match info.kind {
            ClassKind::Container {
                kind,
                instantiable: true,
            } if kind == self.kind => {}
            ClassKind::Container { kind, .. } if kind == self.kind => {
                return Err(UnmarshalErrorKind::NotInstantiable(hint.to_string()).into())
            }
            _ => return Err(mismatch().into()),
        }
        if !ser
            .classes()
            .is_assignable(&NativeType::Class(info.name.clone()), ty)
        {
            return Err(mismatch().into());
        }
        Ok(info.name.clone())
    }

    fn members<'a>(&self, envelope: &'a Map<String, Value>) -> Result<&'a Value, UnmarshalError> {
        let key = self.member_key();
        let members = envelope
            .get(key)
            .ok_or(UnmarshalErrorKind::MissingField(key))?;
        let well_formed = match self.kind {
            ContainerKind::List => members.is_array(),
            _ => members.is_object(),
        };
        if well_formed {
            Ok(members)
        } else {
            Err(UnmarshalErrorKind::MissingField(key).into())
        }
    }

    fn marshal_members(
        &self,
        ser: &SerializerRegistry,
        state: &mut SerializerState,
        heap: &ObjectHeap,
        object: &HeapObject,
    ) -> Result<Value, MarshalError> {
        match (&object.data, self.kind) {
            (ObjectData::List(items), ContainerKind::List) => {
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    out.push(ser.marshal_child(state, heap, i.into(), item)?.into_array_slot());
                }
                Ok(Value::Array(out))
            }
            (ObjectData::Set(items), ContainerKind::Set) => {
                let mut out = Map::new();
                for item in items {
                    let key = key_string(heap, item);
                    let json = ser.marshal_child(state, heap, key.clone().into(), item)?;
                    if let Some(json) = json.into_member() {
                        out.insert(key, json);
                    }
                }
                Ok(Value::Object(out))
            }
            (ObjectData::Map(entries), ContainerKind::Map)
            | (ObjectData::Dictionary(entries), ContainerKind::Dictionary) => {
                let mut out = Map::new();
                for (key, value) in entries {
                    let key = key_string(heap, key);
                    let json = ser.marshal_child(state, heap, key.clone().into(), value)?;
                    if let Some(json) = json.into_member() {
                        out.insert(key, json);
                    }
                }
                Ok(Value::Object(out))
            }
            _ => Err(MarshalError::new(MarshalErrorKind::UnexpectedValue {
                serializer: self.name(),
                found: object.class.to_string(),
            })),
        }
    }

    fn try_members(
        &self,
        ser: &SerializerRegistry,
        state: &mut SerializerState,
        members: &Value,
    ) -> Result<MatchScore, UnmarshalError> {
        let any = NativeType::Object;
        let mut score = MatchScore::OKAY;
        match members {
            Value::Array(elements) => {
                for (i, element) in elements.iter().enumerate() {
                    score = score.combine(ser.try_unmarshal_child(state, i.into(), &any, element)?);
                }
            }
            Value::Object(entries) => {
                for (key, value) in entries {
                    score = score.combine(ser.try_unmarshal_child(
                        state,
                        key.as_str().into(),
                        &NativeType::Object,
                        value,
                    )?);
                }
            }
            _ => {}
        }
        Ok(score)
    }

    fn unmarshal_members(
        &self,
        ser: &SerializerRegistry,
        state: &mut SerializerState,
        heap: &mut ObjectHeap,
        members: &Value,
    ) -> Result<ObjectData, UnmarshalError> {
        let any = NativeType::Object;
        match (members, self.kind) {
            (Value::Array(elements), ContainerKind::List) => {
                let mut items = Vec::with_capacity(elements.len());
                for (i, element) in elements.iter().enumerate() {
                    items.push(ser.unmarshal_child(state, heap, i.into(), &any, element)?);
                }
                Ok(ObjectData::List(items))
            }
            (Value::Object(entries), ContainerKind::Set) => {
                let mut items = Vec::with_capacity(entries.len());
                for (key, element) in entries {
                    let key = key.as_str().into();
                    items.push(ser.unmarshal_child(state, heap, key, &any, element)?);
                }
                Ok(ObjectData::Set(items))
            }
            (Value::Object(entries), kind) => {
                let mut pairs = Vec::with_capacity(entries.len());
                for (key, value) in entries {
                    let value = ser.unmarshal_child(state, heap, key.as_str().into(), &any, value)?;
                    pairs.push((Native::Str(key.clone()), value));
                }
                Ok(match kind {
                    ContainerKind::Dictionary => ObjectData::Dictionary(pairs),
                    _ => ObjectData::Map(pairs),
                })
            }
            _ => Err(UnmarshalErrorKind::MissingField(self.member_key()).into()),
        }
    }
}

/// String form of a map key or set element.
pub(crate) fn key_string(heap: &ObjectHeap, key: &Native) -> String {
    match key {
        Native::Null => "null".to_string(),
        Native::Bool(v) => v.to_string(),
        Native::Char(v) => v.to_string(),
        Native::Byte(v) => v.to_string(),
        Native::Short(v) => v.to_string(),
        Native::Int(v) => v.to_string(),
        Native::Long(v) => v.to_string(),
        Native::Float(v) => v.to_string(),
        Native::Double(v) => v.to_string(),
        Native::Str(v) => v.clone(),
        Native::Enum(e) => e.name.to_string(),
        Native::Date(millis) => millis.to_string(),
        Native::Ref(id) => {
            let class = heap.get(*id).map(|o| o.class.to_string()).unwrap_or_default();
            format!("{}@{:x}", class, id.as_u64())
        }
    }
}

impl Serializer for CollectionSerializer {
    fn name(&self) -> &'static str {
        match self.kind {
            ContainerKind::List => "list",
            ContainerKind::Set => "set",
            ContainerKind::Map => "map",
            ContainerKind::Dictionary => "dictionary",
        }
    }

    fn can_serialize(&self, classes: &ClassTable, ty: &NativeType, json: Option<JsonKind>) -> bool {
        ty.class_name()
            .is_some_and(|c| classes.container_kind(c) == Some(self.kind))
            && matches!(json, None | Some(JsonKind::Object))
    }

    fn marshal(
        &self,
        ser: &SerializerRegistry,
        state: &mut SerializerState,
        heap: &ObjectHeap,
        value: &Native,
    ) -> Result<Value, MarshalError> {
        let object = deref(self.name(), heap, value)?;
        let key = self.member_key();
        let mut out = envelope(ser, &object.class);
        state.push_step(key.into());
        let members = self.marshal_members(ser, state, heap, object);
        state.pop_step();
        let members = members.map_err(|e| e.within(key))?;
        out.insert(key.to_string(), members);
        Ok(Value::Object(out))
    }

    fn try_unmarshal(
        &self,
        ser: &SerializerRegistry,
        state: &mut SerializerState,
        ty: &NativeType,
        json: &Value,
    ) -> Result<MatchScore, UnmarshalError> {
        let envelope = as_object(ty, json)?;
        self.concrete_class(ser, ty, envelope)?;
        let members = self.members(envelope)?;
        let key = self.member_key();
        state.push_step(key.into());
        let score = self.try_members(ser, state, members);
        state.pop_step();
        score.map_err(|e| e.within(key))
    }

    fn unmarshal(
        &self,
        ser: &SerializerRegistry,
        state: &mut SerializerState,
        heap: &mut ObjectHeap,
        ty: &NativeType,
        json: &Value,
    ) -> Result<Native, UnmarshalError> {
        let envelope = as_object(ty, json)?;
        let class = self.concrete_class(ser, ty, envelope)?;
        let members = self.members(envelope)?;
        let empty = match self.kind {
            ContainerKind::List => ObjectData::List(Vec::new()),
            ContainerKind::Set => ObjectData::Set(Vec::new()),
            ContainerKind::Map => ObjectData::Map(Vec::new()),
            ContainerKind::Dictionary => ObjectData::Dictionary(Vec::new()),
        };
        let id = heap.alloc(class, empty);
        state.set_serialized(Native::Ref(id));

        let key = self.member_key();
        state.push_step(key.into());
        let data = self.unmarshal_members(ser, state, heap, members);
        state.pop_step();
        let data = data.map_err(|e| e.within(key))?;
        if let Some(object) = heap.get_mut(id) {
            object.data = data;
        }
        Ok(Native::Ref(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::names;
    use crate::config::SerializerConfig;
    use serde_json::json;

    fn registry() -> SerializerRegistry {
        SerializerRegistry::with_defaults(SerializerConfig::default())
    }

    #[test]
    fn test_key_strings() {
        let mut heap = ObjectHeap::new();
        let list = heap.new_list(names::ARRAY_LIST, vec![]);
        assert_eq!(key_string(&heap, &Native::Int(5)), "5");
        assert_eq!(key_string(&heap, &Native::from("k")), "k");
        assert_eq!(
            key_string(&heap, &Native::enum_constant("com.example.Color", "RED")),
            "RED"
        );
        assert_eq!(key_string(&heap, &list), "java.util.ArrayList@0");
    }

    #[test]
    fn test_can_serialize_by_kind() {
        let classes = ClassTable::with_builtins();
        let linked = NativeType::class(names::LINKED_LIST);
        assert!(CollectionSerializer::list().can_serialize(&classes, &linked, None));
        assert!(!CollectionSerializer::set().can_serialize(&classes, &linked, None));
        assert!(!CollectionSerializer::list().can_serialize(
            &classes,
            &linked,
            Some(JsonKind::Array)
        ));
        assert!(CollectionSerializer::dictionary().can_serialize(
            &classes,
            &NativeType::class(names::HASHTABLE),
            None
        ));
    }

    #[test]
    fn test_hint_must_be_instantiable() {
        let ser = registry();
        let mut state = SerializerState::new();
        let mut heap = ObjectHeap::new();
        let err = CollectionSerializer::list()
            .unmarshal(
                &ser,
                &mut state,
                &mut heap,
                &NativeType::class(names::LIST),
                &json!({"javaClass": "java.util.List", "list": []}),
            )
            .unwrap_err();
        assert_eq!(
            err.kind,
            UnmarshalErrorKind::NotInstantiable("java.util.List".into())
        );
    }

    #[test]
    fn test_hint_must_match_shape() {
        let ser = registry();
        let mut state = SerializerState::new();
        let err = CollectionSerializer::list()
            .try_unmarshal(
                &ser,
                &mut state,
                &NativeType::class(names::LIST),
                &json!({"javaClass": "java.util.HashMap", "list": []}),
            )
            .unwrap_err();
        assert!(matches!(err.kind, UnmarshalErrorKind::HintMismatch { .. }));
    }

    #[test]
    fn test_missing_members() {
        let ser = registry();
        let mut state = SerializerState::new();
        let err = CollectionSerializer::map()
            .try_unmarshal(
                &ser,
                &mut state,
                &NativeType::class(names::MAP),
                &json!({"javaClass": "java.util.HashMap", "map": []}),
            )
            .unwrap_err();
        assert_eq!(err.kind, UnmarshalErrorKind::MissingField("map"));
    }

    #[test]
    fn test_child_error_path_includes_member_key() {
        let ser = registry();
        let mut state = SerializerState::new();
        let mut heap = ObjectHeap::new();
        let err = CollectionSerializer::map()
            .unmarshal(
                &ser,
                &mut state,
                &mut heap,
                &NativeType::class(names::HASH_MAP),
                &json!({"javaClass": "java.util.HashMap", "map": {"a": 1, "b": {}}}),
            )
            .unwrap_err();
        assert_eq!(err.kind, UnmarshalErrorKind::MissingHint);
        assert_eq!(err.pointer(), "/map/b");
    }
}
