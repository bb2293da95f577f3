//! Object graph <-> JSON marshalling.
//!
//! Native values ([`Native`]) and the objects they point to ([`ObjectHeap`])
//! are converted to JSON by a [`SerializerRegistry`] holding an ordered list of
//! type [`Serializer`]s. Class metadata ([`ClassTable`]) decides which
//! serializer handles a value and which properties a bean has.
//!
//! Object identity is preserved: an object reached twice is written once and
//! the repeat is recorded as a [`FixUp`]. Unmarshalling reverses this, so
//! shared and cyclic structure comes back shared and cyclic. When a JSON value
//! could be read as more than one type, [`MatchScore`]s rank the candidates.
//!
//! # Example
//!
//! ```
//! use json_bridge::{names, Native, NativeType, ObjectHeap, SerializerConfig, SerializerRegistry};
//! use serde_json::json;
//!
//! let registry = SerializerRegistry::with_defaults(SerializerConfig::default());
//! let mut heap = ObjectHeap::new();
//! let list = heap.new_list(names::ARRAY_LIST, vec![Native::Int(1), Native::from("two")]);
//!
//! let json = registry.to_json(&heap, &list).unwrap();
//! assert_eq!(json, json!({"javaClass": "java.util.ArrayList", "list": [1, "two"]}));
//!
//! let mut other = ObjectHeap::new();
//! let back = registry.unmarshal(&mut other, &NativeType::Object, &json).unwrap();
//! assert!(heap.deep_equals(&list, &other, &back));
//! ```

mod class;
pub use class::{
    names, BeanDescriptor, ClassInfo, ClassKind, ClassTable, ContainerKind, PropertyDescriptor,
};

mod config;
pub use config::SerializerConfig;

mod error;
pub use error::{
    ConfigError, FixupError, MarshalError, MarshalErrorKind, RegistryError, UnmarshalError,
    UnmarshalErrorKind,
};

mod fixup;
pub use fixup::{
    apply_fixups, back_reference, back_reference_target, fixups_from_json, fixups_to_json, FixUp,
    BACK_REFERENCE_KEY,
};

mod native;
pub use native::{
    EnumValue, HeapObject, Native, NativeType, ObjectData, ObjectHeap, ObjectId, Primitive,
    PrimitiveArray,
};

mod reference;
pub use reference::{ReferenceBridge, ReferenceRecord, ReferenceTable, ReferenceTarget};

mod registry;
pub use registry::{MarshalResult, SerializerRegistry};

mod score;
pub use score::MatchScore;

pub mod serializer;
pub use serializer::{JsonKind, Marshalled, Serializer};

mod state;
pub use state::SerializerState;
