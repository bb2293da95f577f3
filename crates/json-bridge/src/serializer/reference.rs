use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::class::ClassTable;
use crate::error::{MarshalError, UnmarshalError, UnmarshalErrorKind};
use crate::native::{Native, NativeType, ObjectData, ObjectHeap};
use crate::reference::{ReferenceBridge, ReferenceTarget};
use crate::registry::SerializerRegistry;
use crate::score::MatchScore;
use crate::state::SerializerState;

use super::{
    as_object, deref, unexpected, JsonKind, Serializer, CLASS_HINT, OBJECT_ID_KEY,
    REFERENCE_TYPE_KEY,
};

const REFERENCE: &str = "Reference";
const CALLABLE_REFERENCE: &str = "CallableReference";

/// Objects of classes the bridge marks as references travel as a handle:
///
/// ```text
/// {"JSONRPCType": "Reference", "javaClass": "com.example.Session", "objectID": 12}
/// ```
///
/// The payload stays in the bridge. Unmarshalling the handle places that same
/// payload in the destination heap, reusing the object that already holds it
/// there.
pub struct ReferenceSerializer {
    bridge: Arc<dyn ReferenceBridge>,
}

impl fmt::Debug for ReferenceSerializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReferenceSerializer").finish_non_exhaustive()
    }
}

impl ReferenceSerializer {
    pub fn new(bridge: Arc<dyn ReferenceBridge>) -> Self {
        Self { bridge }
    }

    /// Whether `class` or any supertype is registered as callable.
    fn is_callable(&self, classes: &ClassTable, class: &str) -> bool {
        classes
            .ancestry(class)
            .iter()
            .any(|c| self.bridge.is_callable_reference(c))
    }

    fn is_reference(&self, classes: &ClassTable, class: &str) -> bool {
        classes
            .ancestry(class)
            .iter()
            .any(|c| self.bridge.is_reference(c) || self.bridge.is_callable_reference(c))
    }

    fn resolve(&self, ty: &NativeType, json: &Value) -> Result<ReferenceTarget, UnmarshalError> {
        let handle = as_object(ty, json)?;
        let id = handle
            .get(OBJECT_ID_KEY)
            .and_then(Value::as_u64)
            .ok_or(UnmarshalErrorKind::MissingField(OBJECT_ID_KEY))?;
        self.bridge
            .get_reference(id)
            .ok_or_else(|| UnmarshalErrorKind::UnknownReference(id).into())
    }
}

impl Serializer for ReferenceSerializer {
    fn name(&self) -> &'static str {
        "reference"
    }

    fn can_serialize(&self, classes: &ClassTable, ty: &NativeType, json: Option<JsonKind>) -> bool {
        ty.class_name().is_some_and(|c| self.is_reference(classes, c))
            && matches!(json, None | Some(JsonKind::Object))
    }

    fn marshal(
        &self,
        ser: &SerializerRegistry,
        _state: &mut SerializerState,
        heap: &ObjectHeap,
        value: &Native,
    ) -> Result<Value, MarshalError> {
        let object = deref(self.name(), heap, value)?;
        let ObjectData::Opaque(payload) = &object.data else {
            return Err(unexpected(self.name(), value));
        };
        let target = ReferenceTarget::new(object.class.clone(), payload.clone());
        let (kind, id) = if self.is_callable(ser.classes(), &object.class) {
            (CALLABLE_REFERENCE, self.bridge.register_object(target))
        } else {
            (REFERENCE, self.bridge.add_reference(target))
        };
        let mut handle = Map::new();
        handle.insert(REFERENCE_TYPE_KEY.to_string(), Value::from(kind));
        handle.insert(CLASS_HINT.to_string(), Value::from(&*object.class));
        handle.insert(OBJECT_ID_KEY.to_string(), Value::from(id));
        Ok(Value::Object(handle))
    }

    fn try_unmarshal(
        &self,
        _ser: &SerializerRegistry,
        _state: &mut SerializerState,
        ty: &NativeType,
        json: &Value,
    ) -> Result<MatchScore, UnmarshalError> {
        self.resolve(ty, json).map(|_| MatchScore::OKAY)
    }

    fn unmarshal(
        &self,
        _ser: &SerializerRegistry,
        _state: &mut SerializerState,
        heap: &mut ObjectHeap,
        ty: &NativeType,
        json: &Value,
    ) -> Result<Native, UnmarshalError> {
        let target = self.resolve(ty, json)?;
        Ok(heap.adopt_opaque(target.class, target.payload))
    }
}
