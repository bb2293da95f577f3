//! The serializer registry and the marshal/unmarshal entry points.
//!
//! The registry owns the ordered serializer list, the class table, the bean
//! cache and the configuration. It is built once and then shared read-only;
//! every top-level call creates its own [`SerializerState`].
//!
//! Dispatch is first-match-wins in registration order, so more specific
//! serializers must be registered before general ones. Reference handling, when
//! enabled, is inserted at the front for that reason.
//!
//! # Example
//!
//! ```
//! use json_bridge::{
//!     bean_class, Native, NativeType, ObjectHeap, SerializerConfig, SerializerRegistry,
//! };
//! use serde_json::json;
//!
//! let mut registry = SerializerRegistry::with_defaults(SerializerConfig::default());
//! registry
//!     .register_class(bean_class!("com.example.Node" {
//!         name: NativeType::String,
//!         next: NativeType::Object,
//!     }))
//!     .unwrap();
//!
//! let mut heap = ObjectHeap::new();
//! let node = heap.new_bean("com.example.Node", [("name", Native::from("a"))]);
//! let id = node.as_ref_id().unwrap();
//! heap.set_field(id, "next", node.clone());
//!
//! let json = registry.to_json(&heap, &node).unwrap();
//! assert_eq!(
//!     json,
//!     json!({"javaClass": "com.example.Node", "name": "a", "next": {"$ref": ""}})
//! );
//!
//! let mut copy = ObjectHeap::new();
//! let back = registry.unmarshal(&mut copy, &NativeType::Object, &json).unwrap();
//! let back_id = back.as_ref_id().unwrap();
//! assert_eq!(copy.field(back_id, "next"), Some(&back));
//! ```

use std::sync::Arc;

use json_bridge_pointer::PathStep;
use log::{debug, trace};
use serde_json::Value;

use crate::class::{ClassInfo, ClassTable};
use crate::config::SerializerConfig;
use crate::error::{
    MarshalError, MarshalErrorKind, RegistryError, UnmarshalError, UnmarshalErrorKind,
};
use crate::fixup::{apply_fixups, back_reference_target, fixups_to_json, FixUp};
use crate::native::{Native, NativeType, ObjectHeap, Primitive};
use crate::reference::ReferenceBridge;
use crate::score::MatchScore;
use crate::serializer::{
    natural_primitive, ArraySerializer, BeanCache, BeanData, BeanSerializer, BooleanSerializer,
    CollectionSerializer, DateSerializer, EnumSerializer, JsonKind, Marshalled, NumberSerializer,
    PrimitiveSerializer, RawJsonSerializer, ReferenceSerializer, Serializer, StringSerializer,
    CLASS_HINT,
};
use crate::state::SerializerState;

/// Result of a top-level marshal: the document with placeholders where
/// repeated objects were left out, and the fixups that describe them.
#[derive(Debug, Clone, PartialEq)]
pub struct MarshalResult {
    pub json: Value,
    pub fixups: Vec<FixUp>,
}

impl MarshalResult {
    /// The document with back-reference markers written in.
    pub fn into_json_with_markers(self) -> Result<Value, MarshalError> {
        let mut json = self.json;
        apply_fixups(&mut json, &self.fixups).map_err(|e| MarshalError::new(e.into()))?;
        Ok(json)
    }

    /// `{"result": <json>, "fixups": [...]}`, fixups omitted when empty.
    pub fn to_envelope(&self) -> Value {
        let mut out = serde_json::Map::new();
        out.insert("result".to_string(), self.json.clone());
        if !self.fixups.is_empty() {
            out.insert("fixups".to_string(), fixups_to_json(&self.fixups));
        }
        Value::Object(out)
    }
}

pub struct SerializerRegistry {
    serializers: Vec<Arc<dyn Serializer>>,
    classes: ClassTable,
    config: SerializerConfig,
    beans: BeanCache,
}

impl std::fmt::Debug for SerializerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerializerRegistry")
            .field("serializers", &self.serializer_names())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SerializerRegistry {
    /// A registry with the built-in classes and no serializers.
    pub fn new(config: SerializerConfig) -> Self {
        Self {
            serializers: Vec::new(),
            classes: ClassTable::with_builtins(),
            config,
            beans: BeanCache::new(),
        }
    }

    /// A registry with the default serializers registered.
    pub fn with_defaults(config: SerializerConfig) -> Self {
        let mut registry = Self::new(config);
        registry.register_default_serializers();
        registry
    }

    /// Appends the default serializers that are not registered yet, most
    /// specific first.
    pub fn register_default_serializers(&mut self) {
        let defaults: [Arc<dyn Serializer>; 13] = [
            Arc::new(PrimitiveSerializer),
            Arc::new(BooleanSerializer),
            Arc::new(NumberSerializer),
            Arc::new(StringSerializer),
            Arc::new(EnumSerializer),
            Arc::new(DateSerializer),
            Arc::new(ArraySerializer),
            Arc::new(CollectionSerializer::list()),
            Arc::new(CollectionSerializer::set()),
            Arc::new(CollectionSerializer::dictionary()),
            Arc::new(CollectionSerializer::map()),
            Arc::new(RawJsonSerializer),
            Arc::new(BeanSerializer),
        ];
        for serializer in defaults {
            if self.register_serializer(serializer).is_err() {
                trace!("default serializer already registered");
            }
        }
    }

    /// Appends a serializer. Names must be unique.
    pub fn register_serializer(
        &mut self,
        serializer: Arc<dyn Serializer>,
    ) -> Result<(), RegistryError> {
        self.check_unique(serializer.name())?;
        debug!("registering serializer {}", serializer.name());
        self.serializers.push(serializer);
        Ok(())
    }

    /// Puts a reference serializer backed by `bridge` in front of all others.
    pub fn enable_references(
        &mut self,
        bridge: Arc<dyn ReferenceBridge>,
    ) -> Result<(), RegistryError> {
        let serializer = ReferenceSerializer::new(bridge);
        self.check_unique(serializer.name())?;
        debug!("enabling references");
        self.serializers.insert(0, Arc::new(serializer));
        Ok(())
    }

    fn check_unique(&self, name: &'static str) -> Result<(), RegistryError> {
        if self.serializers.iter().any(|s| s.name() == name) {
            return Err(RegistryError::DuplicateSerializer(name));
        }
        Ok(())
    }

    /// Registers class metadata. Cached bean analyses are dropped since
    /// inherited properties may have changed.
    pub fn register_class(&mut self, info: ClassInfo) -> Result<(), RegistryError> {
        self.classes.register(info)?;
        self.beans.clear();
        Ok(())
    }

    pub fn classes(&self) -> &ClassTable {
        &self.classes
    }

    pub fn config(&self) -> &SerializerConfig {
        &self.config
    }

    pub fn serializer_names(&self) -> Vec<&'static str> {
        self.serializers.iter().map(|s| s.name()).collect()
    }

    /// Cached bean analysis of `class`.
    pub fn bean_data(&self, class: &str) -> Option<Arc<BeanData>> {
        self.beans.get_or_analyze(&self.classes, &self.config, class)
    }

    /// The first serializer accepting `ty` and, when unmarshalling, `json`.
    pub fn find_serializer(
        &self,
        ty: &NativeType,
        json: Option<JsonKind>,
    ) -> Option<&dyn Serializer> {
        self.serializers
            .iter()
            .find(|s| s.can_serialize(&self.classes, ty, json))
            .map(|s| s.as_ref())
    }

    /// Marshals `value`. Repeated objects are left as placeholders and
    /// described by the returned fixups.
    pub fn marshal(
        &self,
        heap: &ObjectHeap,
        value: &Native,
    ) -> Result<MarshalResult, MarshalError> {
        let mut state = SerializerState::new();
        let json = self.marshal_value(&mut state, heap, value)?.into_array_slot();
        Ok(MarshalResult {
            json,
            fixups: state.into_fixups(),
        })
    }

    /// Marshals `value` and applies the fixups in place.
    pub fn to_json(&self, heap: &ObjectHeap, value: &Native) -> Result<Value, MarshalError> {
        self.marshal(heap, value)?.into_json_with_markers()
    }

    /// Unmarshals `json` as `ty`, building objects in `heap`.
    pub fn unmarshal(
        &self,
        heap: &mut ObjectHeap,
        ty: &NativeType,
        json: &Value,
    ) -> Result<Native, UnmarshalError> {
        let mut state = SerializerState::new();
        self.unmarshal_value(&mut state, heap, ty, json)
    }

    /// Unmarshals a document that travelled with a separate fixup table.
    pub fn unmarshal_with_fixups(
        &self,
        heap: &mut ObjectHeap,
        ty: &NativeType,
        json: &Value,
        fixups: &[FixUp],
    ) -> Result<Native, UnmarshalError> {
        let mut json = json.clone();
        apply_fixups(&mut json, fixups)?;
        self.unmarshal(heap, ty, &json)
    }

    /// Scores how well `json` fits `ty` without building anything.
    pub fn try_unmarshal(
        &self,
        ty: &NativeType,
        json: &Value,
    ) -> Result<MatchScore, UnmarshalError> {
        let mut state = SerializerState::new();
        self.try_unmarshal_value(&mut state, ty, json)
    }

    /// Index of the candidate parameter list that fits `args` best.
    ///
    /// Candidates of the wrong arity or that fail to score are skipped. Among
    /// the rest the lowest score wins, ties going to the earliest candidate.
    pub fn select_candidate(
        &self,
        candidates: &[Vec<NativeType>],
        args: &[Value],
    ) -> Result<usize, UnmarshalError> {
        let mut best: Option<(usize, MatchScore)> = None;
        for (index, params) in candidates.iter().enumerate() {
            if params.len() != args.len() {
                continue;
            }
            let mut state = SerializerState::new();
            let score = params
                .iter()
                .zip(args)
                .enumerate()
                .try_fold(MatchScore::OKAY, |acc, (pos, (ty, arg))| {
                    self.try_unmarshal_child(&mut state, pos.into(), ty, arg)
                        .map(|s| acc.combine(s))
                });
            match score {
                Ok(score) => {
                    trace!("candidate {} scored {}", index, score);
                    if best.map_or(true, |(_, b)| score < b) {
                        best = Some((index, score));
                    }
                }
                Err(e) => trace!("candidate {} rejected: {}", index, e),
            }
        }
        best.map(|(index, _)| index)
            .ok_or_else(|| UnmarshalErrorKind::NoMatchingCandidate.into())
    }

    /// Marshals one value at the current location.
    ///
    /// Objects already seen in this call are not visited again: a cycle
    /// back to an ancestor, or a repeat when duplicate fixups are on, records
    /// a fixup and yields [`Marshalled::CircularOrDuplicate`].
    pub fn marshal_value(
        &self,
        state: &mut SerializerState,
        heap: &ObjectHeap,
        value: &Native,
    ) -> Result<Marshalled, MarshalError> {
        let Native::Ref(id) = value else {
            if value.is_null() {
                return Ok(Marshalled::Json(Value::Null));
            }
            return self.dispatch_marshal(state, heap, value).map(Marshalled::Json);
        };
        let id = *id;
        if let Some(original) = state.processed_location(id) {
            let circular = state.is_ancestor(id);
            if circular && !self.config.fixup_circular_refs {
                return Err(MarshalErrorKind::CircularReference.into());
            }
            if circular || self.config.fixup_duplicates {
                let original = original.clone();
                trace!("{} at {} repeats an earlier object", id, state.pointer());
                state.add_fixup(original);
                return Ok(Marshalled::CircularOrDuplicate);
            }
        }
        state.enter(id);
        let result = self.dispatch_marshal(state, heap, value);
        state.leave(id);
        result.map(Marshalled::Json)
    }

    /// [`marshal_value`](Self::marshal_value) one step below the current
    /// location; errors are annotated with `key`.
    pub fn marshal_child(
        &self,
        state: &mut SerializerState,
        heap: &ObjectHeap,
        key: PathStep,
        value: &Native,
    ) -> Result<Marshalled, MarshalError> {
        state.push_step(key.clone());
        let result = self.marshal_value(state, heap, value);
        state.pop_step();
        result.map_err(|e| e.within(key))
    }

    fn dispatch_marshal(
        &self,
        state: &mut SerializerState,
        heap: &ObjectHeap,
        value: &Native,
    ) -> Result<Value, MarshalError> {
        let ty = match heap.runtime_type(value) {
            Some(ty) => ty,
            None => {
                let id = value.as_ref_id().map_or(0, |id| id.as_u64());
                return Err(MarshalErrorKind::DanglingReference(id).into());
            }
        };
        let serializer = self
            .find_serializer(&ty, None)
            .ok_or_else(|| MarshalError::new(MarshalErrorKind::NoSerializer(ty.name())))?;
        trace!("marshalling {} with {}", ty, serializer.name());
        serializer.marshal(self, state, heap, value)
    }

    /// The type to build: the `javaClass` hint when present, otherwise the
    /// target, with `Object` targets resolved from the JSON shape.
    fn resolve_target(&self, ty: &NativeType, json: &Value) -> Result<NativeType, UnmarshalError> {
        if let Some(hint) = json.as_object().and_then(|o| o.get(CLASS_HINT)) {
            let hint = hint.as_str().ok_or(UnmarshalErrorKind::InvalidHint)?;
            if !self.classes.contains(hint) {
                return Err(UnmarshalErrorKind::UnknownHint(hint.to_string()).into());
            }
            let hinted = NativeType::class(hint);
            if !self.classes.is_assignable(&hinted, ty) {
                return Err(UnmarshalErrorKind::HintMismatch {
                    hint: hint.to_string(),
                    target: ty.name(),
                }
                .into());
            }
            return Ok(hinted);
        }
        if *ty != NativeType::Object {
            return Ok(ty.clone());
        }
        match json {
            Value::Bool(_) => Ok(NativeType::Boxed(Primitive::Boolean)),
            Value::Number(n) => Ok(NativeType::Boxed(natural_primitive(n))),
            Value::String(_) => Ok(NativeType::String),
            Value::Array(_) => Ok(NativeType::array(NativeType::Object)),
            Value::Object(_) => Err(UnmarshalErrorKind::MissingHint.into()),
            Value::Null => Ok(NativeType::Object),
        }
    }

    fn find_for_json(
        &self,
        ty: &NativeType,
        json: &Value,
    ) -> Result<&dyn Serializer, UnmarshalError> {
        let kind = JsonKind::of(json);
        self.find_serializer(ty, Some(kind)).ok_or_else(|| {
            UnmarshalErrorKind::NoSerializer {
                target: ty.name(),
                json: kind,
            }
            .into()
        })
    }

    /// Unmarshals one value at the current location.
    pub fn unmarshal_value(
        &self,
        state: &mut SerializerState,
        heap: &mut ObjectHeap,
        ty: &NativeType,
        json: &Value,
    ) -> Result<Native, UnmarshalError> {
        if let Some(pointer) = back_reference_target(json) {
            return state.serialized(pointer).cloned().ok_or_else(|| {
                UnmarshalErrorKind::UnresolvedBackReference(pointer.to_string()).into()
            });
        }
        if json.is_null() {
            if ty.is_primitive() {
                return Err(UnmarshalErrorKind::NullPrimitive(ty.name()).into());
            }
            return Ok(Native::Null);
        }
        let ty = self.resolve_target(ty, json)?;
        let serializer = self.find_for_json(&ty, json)?;
        trace!("unmarshalling {} with {}", ty, serializer.name());
        let value = serializer.unmarshal(self, state, heap, &ty, json)?;
        // scalars too: a byte[] written as a string can still be repeated
        state.set_serialized(value.clone());
        Ok(value)
    }

    /// [`unmarshal_value`](Self::unmarshal_value) one step below the current
    /// location; errors are annotated with `key`.
    pub fn unmarshal_child(
        &self,
        state: &mut SerializerState,
        heap: &mut ObjectHeap,
        key: PathStep,
        ty: &NativeType,
        json: &Value,
    ) -> Result<Native, UnmarshalError> {
        state.push_step(key.clone());
        let result = self.unmarshal_value(state, heap, ty, json);
        state.pop_step();
        result.map_err(|e| e.within(key))
    }

    /// Scores one value at the current location.
    pub fn try_unmarshal_value(
        &self,
        state: &mut SerializerState,
        ty: &NativeType,
        json: &Value,
    ) -> Result<MatchScore, UnmarshalError> {
        if let Some(pointer) = back_reference_target(json) {
            return state.score_at(pointer).ok_or_else(|| {
                UnmarshalErrorKind::UnresolvedBackReference(pointer.to_string()).into()
            });
        }
        if json.is_null() {
            if ty.is_primitive() {
                return Err(UnmarshalErrorKind::NullPrimitive(ty.name()).into());
            }
            return Ok(MatchScore::NULL);
        }
        let ty = self.resolve_target(ty, json)?;
        let serializer = self.find_for_json(&ty, json)?;
        let composite = json.is_object() || json.is_array();
        if composite {
            // provisional, so back-references from descendants resolve
            state.set_score(MatchScore::OKAY);
        }
        let score = serializer.try_unmarshal(self, state, &ty, json)?;
        state.set_score(score);
        Ok(score)
    }

    /// [`try_unmarshal_value`](Self::try_unmarshal_value) one step below the
    /// current location; errors are annotated with `key`.
    pub fn try_unmarshal_child(
        &self,
        state: &mut SerializerState,
        key: PathStep,
        ty: &NativeType,
        json: &Value,
    ) -> Result<MatchScore, UnmarshalError> {
        state.push_step(key.clone());
        let result = self.try_unmarshal_value(state, ty, json);
        state.pop_step();
        result.map_err(|e| e.within(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::names;
    use crate::reference::ReferenceTable;
    use crate::native::ObjectData;
    use crate::{bean_class, PrimitiveArray};
    use serde_json::json;

    fn registry() -> SerializerRegistry {
        let mut registry = SerializerRegistry::with_defaults(SerializerConfig::default());
        registry
            .register_class(bean_class!("com.example.Pair" {
                left: NativeType::Object,
                right: NativeType::Object,
            }))
            .unwrap();
        registry
    }

    #[test]
    fn test_default_order() {
        let registry = SerializerRegistry::with_defaults(SerializerConfig::default());
        assert_eq!(
            registry.serializer_names(),
            vec![
                "primitive", "boolean", "number", "string", "enum", "date", "array", "list",
                "set", "dictionary", "map", "raw_json", "bean"
            ]
        );
    }

    #[test]
    fn test_duplicate_serializer_rejected() {
        let mut registry = registry();
        assert_eq!(
            registry.register_serializer(Arc::new(BeanSerializer)),
            Err(RegistryError::DuplicateSerializer("bean"))
        );
        let table = Arc::new(ReferenceTable::new());
        registry.enable_references(table.clone()).unwrap();
        assert_eq!(registry.serializer_names()[0], "reference");
        assert_eq!(
            registry.enable_references(table),
            Err(RegistryError::DuplicateSerializer("reference"))
        );
    }

    #[test]
    fn test_first_match_wins() {
        let registry = registry();
        let mut heap = ObjectHeap::new();
        let bytes = heap.new_primitive_array(PrimitiveArray::Byte(vec![104, 105]));
        // string is registered before array
        assert_eq!(registry.to_json(&heap, &bytes).unwrap(), json!("hi"));
        let found = registry
            .find_serializer(&NativeType::class(names::HASHTABLE), None)
            .unwrap();
        assert_eq!(found.name(), "dictionary");
    }

    #[test]
    fn test_duplicate_becomes_back_reference() {
        let registry = registry();
        let mut heap = ObjectHeap::new();
        let shared = heap.new_list(names::ARRAY_LIST, vec![Native::Int(1)]);
        let pair = heap.new_bean(
            "com.example.Pair",
            [("left", shared.clone()), ("right", shared)],
        );
        let result = registry.marshal(&heap, &pair).unwrap();
        assert!(result.json.get("right").is_none());
        assert_eq!(
            result.fixups,
            vec![FixUp {
                location: vec![PathStep::from("right")],
                original: vec![PathStep::from("left")],
            }]
        );
        assert_eq!(
            result.into_json_with_markers().unwrap()["right"],
            json!({"$ref": "/left"})
        );
    }

    #[test]
    fn test_duplicates_inline_when_disabled() {
        let mut registry = SerializerRegistry::with_defaults(SerializerConfig {
            fixup_duplicates: false,
            ..SerializerConfig::default()
        });
        registry
            .register_class(bean_class!("com.example.Pair" {
                left: NativeType::Object,
                right: NativeType::Object,
            }))
            .unwrap();
        let mut heap = ObjectHeap::new();
        let shared = heap.new_list(names::ARRAY_LIST, vec![]);
        let pair = heap.new_bean(
            "com.example.Pair",
            [("left", shared.clone()), ("right", shared)],
        );
        let result = registry.marshal(&heap, &pair).unwrap();
        assert!(result.fixups.is_empty());
        assert_eq!(result.json["left"], result.json["right"]);
    }

    #[test]
    fn test_cycle_is_error_when_fixups_disabled() {
        let registry = SerializerRegistry::with_defaults(SerializerConfig {
            fixup_circular_refs: false,
            ..SerializerConfig::default()
        });
        let mut heap = ObjectHeap::new();
        let list = heap.new_list(names::ARRAY_LIST, vec![]);
        heap.push_element(list.as_ref_id().unwrap(), list.clone());
        let err = registry.marshal(&heap, &list).unwrap_err();
        assert_eq!(err.kind, MarshalErrorKind::CircularReference);
        assert_eq!(err.pointer(), "/list/0");
    }

    #[test]
    fn test_marshal_error_path() {
        let registry = registry();
        let mut heap = ObjectHeap::new();
        let inner = heap.new_list(names::ARRAY_LIST, vec![Native::Double(f64::NAN)]);
        let pair = heap.new_bean("com.example.Pair", [("left", inner)]);
        let err = registry.marshal(&heap, &pair).unwrap_err();
        assert_eq!(err.pointer(), "/left/list/0");
    }

    #[test]
    fn test_no_serializer_for_unknown_class() {
        let registry = registry();
        let mut heap = ObjectHeap::new();
        let value = heap.new_bean("com.example.Unknown", []);
        assert_eq!(
            registry.marshal(&heap, &value).unwrap_err().kind,
            MarshalErrorKind::NoSerializer("com.example.Unknown".into())
        );
    }

    #[test]
    fn test_object_target_uses_json_shape() {
        let registry = registry();
        let mut heap = ObjectHeap::new();
        let any = NativeType::Object;
        assert_eq!(registry.unmarshal(&mut heap, &any, &json!(5)).unwrap(), Native::Int(5));
        assert_eq!(
            registry.unmarshal(&mut heap, &any, &json!(1i64 << 40)).unwrap(),
            Native::Long(1 << 40)
        );
        assert_eq!(
            registry.unmarshal(&mut heap, &any, &json!(0.5)).unwrap(),
            Native::Double(0.5)
        );
        assert_eq!(
            registry.unmarshal(&mut heap, &any, &json!(true)).unwrap(),
            Native::Bool(true)
        );
        assert_eq!(
            registry.unmarshal(&mut heap, &any, &json!({"a": 1})).unwrap_err().kind,
            UnmarshalErrorKind::MissingHint
        );
    }

    #[test]
    fn test_hint_overrides_and_is_checked() {
        let registry = registry();
        let mut heap = ObjectHeap::new();
        let list = json!({"javaClass": "java.util.LinkedList", "list": [1]});
        let value = registry
            .unmarshal(&mut heap, &NativeType::class(names::LIST), &list)
            .unwrap();
        assert_eq!(
            &*heap.get(value.as_ref_id().unwrap()).unwrap().class,
            names::LINKED_LIST
        );
        assert!(matches!(
            registry
                .unmarshal(&mut heap, &NativeType::class(names::MAP), &list)
                .unwrap_err()
                .kind,
            UnmarshalErrorKind::HintMismatch { .. }
        ));
        assert_eq!(
            registry
                .unmarshal(&mut heap, &any_list(), &json!({"javaClass": "com.nowhere.X"}))
                .unwrap_err()
                .kind,
            UnmarshalErrorKind::UnknownHint("com.nowhere.X".into())
        );
    }

    fn any_list() -> NativeType {
        NativeType::class(names::LIST)
    }

    #[test]
    fn test_null_handling() {
        let registry = registry();
        let mut heap = ObjectHeap::new();
        assert_eq!(
            registry
                .unmarshal(&mut heap, &NativeType::Boxed(Primitive::Int), &Value::Null)
                .unwrap(),
            Native::Null
        );
        assert_eq!(
            registry
                .unmarshal(&mut heap, &NativeType::Primitive(Primitive::Int), &Value::Null)
                .unwrap_err()
                .kind,
            UnmarshalErrorKind::NullPrimitive("int".into())
        );
        assert_eq!(
            registry.try_unmarshal(&NativeType::String, &Value::Null).unwrap(),
            MatchScore::NULL
        );
    }

    #[test]
    fn test_unresolved_back_reference() {
        let registry = registry();
        let mut heap = ObjectHeap::new();
        let err = registry
            .unmarshal(
                &mut heap,
                &NativeType::Object,
                &json!({"javaClass": "java.util.ArrayList", "list": [{"$ref": "/list/5"}]}),
            )
            .unwrap_err();
        assert_eq!(
            err.kind,
            UnmarshalErrorKind::UnresolvedBackReference("/list/5".into())
        );
        assert_eq!(err.pointer(), "/list/0");
    }

    #[test]
    fn test_repeated_byte_array_resolves() {
        let registry = registry();
        let mut heap = ObjectHeap::new();
        let bytes = heap.new_primitive_array(PrimitiveArray::Byte(vec![104, 105]));
        let list = heap.new_list(names::ARRAY_LIST, vec![bytes.clone(), bytes]);
        let json = registry.to_json(&heap, &list).unwrap();
        assert_eq!(json["list"], json!(["hi", {"$ref": "/list/0"}]));

        let mut copy = ObjectHeap::new();
        let back = registry.unmarshal(&mut copy, &NativeType::Object, &json).unwrap();
        let items = match copy.get(back.as_ref_id().unwrap()).map(|o| &o.data) {
            Some(ObjectData::List(items)) => items.clone(),
            other => panic!("not a list: {:?}", other),
        };
        assert_eq!(items, vec![Native::from("hi"), Native::from("hi")]);
        assert_eq!(
            registry.try_unmarshal(&NativeType::Object, &json).unwrap(),
            MatchScore::OKAY
        );

        // with a byte[] component both slots share one array
        let ty = NativeType::array(NativeType::array(NativeType::Primitive(Primitive::Byte)));
        let back = registry
            .unmarshal(&mut copy, &ty, &json!(["hi", {"$ref": "/0"}]))
            .unwrap();
        match copy.get(back.as_ref_id().unwrap()).map(|o| &o.data) {
            Some(ObjectData::ObjectArray { items, .. }) => {
                assert!(items[0].as_ref_id().is_some());
                assert_eq!(items[0], items[1]);
            }
            other => panic!("not an object array: {:?}", other),
        }
    }

    #[test]
    fn test_select_candidate() {
        let registry = registry();
        let candidates = vec![
            vec![NativeType::Primitive(Primitive::Boolean)],
            vec![NativeType::String],
            vec![NativeType::String, NativeType::String],
        ];
        assert_eq!(registry.select_candidate(&candidates, &[json!("yes")]).unwrap(), 1);
        assert_eq!(registry.select_candidate(&candidates, &[json!("true")]).unwrap(), 0);
        assert_eq!(
            registry
                .select_candidate(&candidates, &[json!("a"), json!("b")])
                .unwrap(),
            2
        );
        assert_eq!(
            registry
                .select_candidate(&candidates, &[json!([1])])
                .unwrap_err()
                .kind,
            UnmarshalErrorKind::NoMatchingCandidate
        );
    }

    #[test]
    fn test_envelope_carries_fixups() {
        let registry = registry();
        let mut heap = ObjectHeap::new();
        let list = heap.new_list(names::ARRAY_LIST, vec![]);
        heap.push_element(list.as_ref_id().unwrap(), list.clone());
        let result = registry.marshal(&heap, &list).unwrap();
        assert_eq!(
            result.to_envelope(),
            json!({
                "result": {"javaClass": "java.util.ArrayList", "list": [null]},
                "fixups": [[["list", 0], []]]
            })
        );
    }
}
