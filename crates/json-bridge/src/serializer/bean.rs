//! Beans: objects described by a list of named properties.
//!
//! A bean marshals to a flat JSON object of its readable properties, plus a
//! `javaClass` hint when hints are on. Unmarshal builds a default instance and
//! assigns every writable property present in the JSON. Property lists,
//! including inherited ones, are computed once per class and cached.

use std::sync::Arc;

use indexmap::IndexMap;
use log::debug;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::class::{ClassKind, ClassTable, PropertyDescriptor};
use crate::config::SerializerConfig;
use crate::error::{MarshalError, MarshalErrorKind, UnmarshalError, UnmarshalErrorKind};
use crate::native::{Native, NativeType, ObjectData, ObjectHeap};
use crate::registry::SerializerRegistry;
use crate::score::MatchScore;
use crate::state::SerializerState;

use super::{
    as_object, deref, envelope, type_mismatch, unexpected, JsonKind, Serializer, CLASS_HINT,
};

/// The flattened property list of one bean class.
#[derive(Debug, Clone, PartialEq)]
pub struct BeanData {
    pub class: Arc<str>,
    /// Own and inherited properties, base classes first, minus exclusions.
    pub properties: IndexMap<String, PropertyDescriptor>,
    pub constructible: bool,
}

impl BeanData {
    /// Flattens the properties of `class` and its bean supertypes. `None` if
    /// `class` is not a registered bean.
    pub fn analyze(classes: &ClassTable, config: &SerializerConfig, class: &str) -> Option<Self> {
        let info = classes.get(class)?;
        let ClassKind::Bean(bean) = &info.kind else {
            return None;
        };
        let mut properties = IndexMap::new();
        for ancestor in classes.ancestry(class).iter().rev() {
            if let Some(ClassKind::Bean(ancestor)) = classes.kind(ancestor) {
                for property in &ancestor.properties {
                    if !config.is_excluded(&property.name) {
                        properties.insert(property.name.clone(), property.clone());
                    }
                }
            }
        }
        Some(BeanData {
            class: info.name.clone(),
            properties,
            constructible: bean.constructible,
        })
    }

    pub fn readable(&self) -> impl Iterator<Item = &PropertyDescriptor> {
        self.properties.values().filter(|p| p.readable)
    }

    pub fn writable(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.get(name).filter(|p| p.writable)
    }

    pub fn writable_count(&self) -> usize {
        self.properties.values().filter(|p| p.writable).count()
    }
}

/// Process-wide cache of [`BeanData`], shared by all calls on a registry.
#[derive(Debug, Default)]
pub struct BeanCache {
    entries: RwLock<FxHashMap<Arc<str>, Arc<BeanData>>>,
}

impl BeanCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached analysis of `class`, computing it on first use.
    pub fn get_or_analyze(
        &self,
        classes: &ClassTable,
        config: &SerializerConfig,
        class: &str,
    ) -> Option<Arc<BeanData>> {
        if let Some(data) = self.entries.read().get(class) {
            return Some(Arc::clone(data));
        }
        let mut entries = self.entries.write();
        // another thread may have filled it between the two locks
        if let Some(data) = entries.get(class) {
            return Some(Arc::clone(data));
        }
        let data = Arc::new(BeanData::analyze(classes, config, class)?);
        debug!("analyzed bean {} ({} properties)", class, data.properties.len());
        entries.insert(Arc::clone(&data.class), Arc::clone(&data));
        Some(data)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

#[derive(Debug, Default)]
pub struct BeanSerializer;

fn bean_data(
    ser: &SerializerRegistry,
    ty: &NativeType,
    json: &Value,
) -> Result<Arc<BeanData>, UnmarshalError> {
    let class = ty.class_name().ok_or_else(|| type_mismatch(ty, json))?;
    ser.bean_data(class)
        .ok_or_else(|| UnmarshalErrorKind::NotABean(class.to_string()).into())
}

impl Serializer for BeanSerializer {
    fn name(&self) -> &'static str {
        "bean"
    }

    fn can_serialize(&self, classes: &ClassTable, ty: &NativeType, json: Option<JsonKind>) -> bool {
        ty.class_name()
            .is_some_and(|c| matches!(classes.kind(c), Some(ClassKind::Bean(_))))
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
        let ObjectData::Bean(fields) = &object.data else {
            return Err(unexpected(self.name(), value));
        };
        let data = ser.bean_data(&object.class).ok_or_else(|| {
            MarshalError::new(MarshalErrorKind::NotABean(object.class.to_string()))
        })?;
        let mut out = envelope(ser, &object.class);
        for property in data.readable() {
            let field = fields.get(&property.name).unwrap_or(&Native::Null);
            if field.is_null() && !ser.config().marshal_null_attributes {
                continue;
            }
            let marshalled = ser.marshal_child(state, heap, property.name.as_str().into(), field)?;
            if let Some(json) = marshalled.into_member() {
                out.insert(property.name.clone(), json);
            }
        }
        Ok(Value::Object(out))
    }

    fn try_unmarshal(
        &self,
        ser: &SerializerRegistry,
        state: &mut SerializerState,
        ty: &NativeType,
        json: &Value,
    ) -> Result<MatchScore, UnmarshalError> {
        let members = as_object(ty, json)?;
        let data = bean_data(ser, ty, json)?;
        let mut matched = 0;
        let mut unknown = 0;
        let mut score = MatchScore::OKAY;
        for (key, value) in members {
            if key == CLASS_HINT {
                continue;
            }
            match data.writable(key) {
                Some(property) => {
                    matched += 1;
                    score = score.combine(ser.try_unmarshal_child(
                        state,
                        key.as_str().into(),
                        &property.ty,
                        value,
                    )?);
                }
                None => unknown += 1,
            }
        }
        if matched == 0 {
            return Err(UnmarshalErrorKind::BeanNoMatches(data.class.to_string()).into());
        }
        let mismatch = (data.writable_count() - matched) + unknown;
        if mismatch > 0 {
            score = score.combine(MatchScore::mismatch(mismatch as u32));
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
        let members = as_object(ty, json)?;
        let data = bean_data(ser, ty, json)?;
        if !data.constructible {
            return Err(UnmarshalErrorKind::NotConstructible(data.class.to_string()).into());
        }
        if !members.keys().any(|key| data.writable(key).is_some()) {
            return Err(UnmarshalErrorKind::BeanNoMatches(data.class.to_string()).into());
        }

        let defaults = data
            .properties
            .values()
            .map(|p| (p.name.clone(), p.default_value()))
            .collect();
        let id = heap.alloc(Arc::clone(&data.class), ObjectData::Bean(defaults));
        state.set_serialized(Native::Ref(id));

        for (key, value) in members {
            let Some(property) = data.writable(key) else {
                continue;
            };
            let field = ser.unmarshal_child(state, heap, key.as_str().into(), &property.ty, value)?;
            heap.set_field(id, key, field);
        }
        Ok(Native::Ref(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::Primitive;
    use crate::{bean_class, ClassInfo};
    use serde_json::json;
    use std::thread;

    fn registry() -> SerializerRegistry {
        let mut ser = SerializerRegistry::with_defaults(SerializerConfig::default());
        ser.register_class(bean_class!("com.example.Base" {
            id: NativeType::Primitive(Primitive::Long) => read_only,
            declaringClass: NativeType::String,
        }))
        .unwrap();
        ser.register_class(bean_class!("com.example.Item", extends ["com.example.Base"] {
            name: NativeType::String,
            count: NativeType::Primitive(Primitive::Int),
        }))
        .unwrap();
        ser.register_class(ClassInfo::bean("com.example.Sealed").not_constructible()
            .property(PropertyDescriptor::read_write("x", NativeType::String)))
        .unwrap();
        ser
    }

    #[test]
    fn test_analyze_flattens_and_excludes() {
        let ser = registry();
        let data = BeanData::analyze(ser.classes(), ser.config(), "com.example.Item").unwrap();
        let names: Vec<&str> = data.properties.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["id", "name", "count"]);
        assert_eq!(data.writable_count(), 2);
        assert!(data.writable("id").is_none());
        assert!(BeanData::analyze(ser.classes(), ser.config(), "java.util.ArrayList").is_none());
    }

    #[test]
    fn test_cache_is_shared_between_threads() {
        let ser = registry();
        let cache = Arc::new(BeanCache::new());
        let classes = Arc::new(ser.classes().clone());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let classes = Arc::clone(&classes);
                thread::spawn(move || {
                    cache
                        .get_or_analyze(&classes, &SerializerConfig::default(), "com.example.Item")
                        .unwrap()
                })
            })
            .collect();
        let results: Vec<Arc<BeanData>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(cache.len(), 1);
        assert!(results.iter().all(|r| Arc::ptr_eq(r, &results[0])));
    }

    #[test]
    fn test_try_counts_mismatches() {
        let ser = registry();
        let ty = NativeType::class("com.example.Item");
        let mut state = SerializerState::new();
        let exact = json!({"javaClass": "com.example.Item", "name": "a", "count": 1});
        assert_eq!(
            BeanSerializer.try_unmarshal(&ser, &mut state, &ty, &exact).unwrap(),
            MatchScore::OKAY
        );
        let partial = json!({"name": "a", "colour": "red"});
        assert_eq!(
            BeanSerializer.try_unmarshal(&ser, &mut state, &ty, &partial).unwrap(),
            MatchScore::mismatch(2)
        );
        let none = json!({"colour": "red"});
        assert_eq!(
            BeanSerializer.try_unmarshal(&ser, &mut state, &ty, &none).unwrap_err().kind,
            UnmarshalErrorKind::BeanNoMatches("com.example.Item".into())
        );
    }

    #[test]
    fn test_unmarshal_sets_defaults_and_writable_fields() {
        let ser = registry();
        let ty = NativeType::class("com.example.Item");
        let mut state = SerializerState::new();
        let mut heap = ObjectHeap::new();
        let value = BeanSerializer
            .unmarshal(&ser, &mut state, &mut heap, &ty, &json!({"name": "a", "id": 9}))
            .unwrap();
        let id = value.as_ref_id().unwrap();
        assert_eq!(heap.field(id, "name"), Some(&Native::from("a")));
        assert_eq!(heap.field(id, "count"), Some(&Native::Int(0)));
        assert_eq!(heap.field(id, "id"), Some(&Native::Long(0)));
    }

    #[test]
    fn test_not_constructible() {
        let ser = registry();
        let mut state = SerializerState::new();
        let mut heap = ObjectHeap::new();
        let err = BeanSerializer
            .unmarshal(
                &ser,
                &mut state,
                &mut heap,
                &NativeType::class("com.example.Sealed"),
                &json!({"x": "1"}),
            )
            .unwrap_err();
        assert_eq!(err.kind, UnmarshalErrorKind::NotConstructible("com.example.Sealed".into()));
    }
}
