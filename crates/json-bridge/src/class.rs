//! Class metadata: what kind of thing each class name denotes, its bean
//! properties, and which classes it is assignable to.

use std::collections::VecDeque;
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::RegistryError;
use crate::native::{Native, NativeType};

/// Well-known class names used as wire hints.
pub mod names {
    pub const OBJECT: &str = "java.lang.Object";
    pub const STRING: &str = "java.lang.String";
    pub const DATE: &str = "java.util.Date";

    pub const COLLECTION: &str = "java.util.Collection";
    pub const LIST: &str = "java.util.List";
    pub const ARRAY_LIST: &str = "java.util.ArrayList";
    pub const LINKED_LIST: &str = "java.util.LinkedList";
    pub const VECTOR: &str = "java.util.Vector";

    pub const SET: &str = "java.util.Set";
    pub const HASH_SET: &str = "java.util.HashSet";
    pub const TREE_SET: &str = "java.util.TreeSet";
    pub const LINKED_HASH_SET: &str = "java.util.LinkedHashSet";

    pub const MAP: &str = "java.util.Map";
    pub const HASH_MAP: &str = "java.util.HashMap";
    pub const TREE_MAP: &str = "java.util.TreeMap";
    pub const LINKED_HASH_MAP: &str = "java.util.LinkedHashMap";

    pub const DICTIONARY: &str = "java.util.Dictionary";
    pub const HASHTABLE: &str = "java.util.Hashtable";

    pub const JSON_OBJECT: &str = "org.json.JSONObject";
    pub const JSON_ARRAY: &str = "org.json.JSONArray";
}

/// The four collection shapes with their own wire envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    List,
    Set,
    Map,
    Dictionary,
}

/// One bean property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDescriptor {
    pub name: String,
    pub ty: NativeType,
    pub readable: bool,
    pub writable: bool,
}

impl PropertyDescriptor {
    pub fn read_write(name: impl Into<String>, ty: NativeType) -> Self {
        Self {
            name: name.into(),
            ty,
            readable: true,
            writable: true,
        }
    }

    pub fn read_only(name: impl Into<String>, ty: NativeType) -> Self {
        Self {
            writable: false,
            ..Self::read_write(name, ty)
        }
    }

    pub fn write_only(name: impl Into<String>, ty: NativeType) -> Self {
        Self {
            readable: false,
            ..Self::read_write(name, ty)
        }
    }

    /// Value of a freshly constructed instance: zero for primitives, null
    /// otherwise.
    pub fn default_value(&self) -> Native {
        match &self.ty {
            NativeType::Primitive(p) => p.default_value(),
            _ => Native::Null,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeanDescriptor {
    pub properties: Vec<PropertyDescriptor>,
    /// Whether a no-argument instance can be created on unmarshal.
    pub constructible: bool,
}

impl Default for BeanDescriptor {
    fn default() -> Self {
        Self {
            properties: Vec::new(),
            constructible: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassKind {
    Bean(BeanDescriptor),
    Container {
        kind: ContainerKind,
        /// `false` for interfaces and abstract bases, which a hint may not
        /// name on unmarshal.
        instantiable: bool,
    },
    Enum(Vec<Arc<str>>),
    Date,
    RawObject,
    RawArray,
    /// Host objects that are only ever passed by reference.
    Opaque,
    /// A pure supertype with no shape of its own.
    Interface,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassInfo {
    pub name: Arc<str>,
    pub kind: ClassKind,
    pub supertypes: Vec<Arc<str>>,
}

impl ClassInfo {
    pub fn new(name: impl Into<Arc<str>>, kind: ClassKind) -> Self {
        Self {
            name: name.into(),
            kind,
            supertypes: Vec::new(),
        }
    }

    pub fn bean(name: impl Into<Arc<str>>) -> Self {
        Self::new(name, ClassKind::Bean(BeanDescriptor::default()))
    }

    pub fn enumeration<I, S>(name: impl Into<Arc<str>>, constants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Arc<str>>,
    {
        Self::new(
            name,
            ClassKind::Enum(constants.into_iter().map(Into::into).collect()),
        )
    }

    pub fn extends(mut self, supertype: impl Into<Arc<str>>) -> Self {
        self.supertypes.push(supertype.into());
        self
    }

    /// Adds a bean property. No-op for non-bean classes.
    pub fn property(mut self, property: PropertyDescriptor) -> Self {
        if let ClassKind::Bean(bean) = &mut self.kind {
            bean.properties.push(property);
        }
        self
    }

    pub fn not_constructible(mut self) -> Self {
        if let ClassKind::Bean(bean) = &mut self.kind {
            bean.constructible = false;
        }
        self
    }
}

/// Declares a bean class.
///
/// ```
/// use json_bridge::{bean_class, ClassKind, NativeType, Primitive};
///
/// let info = bean_class!("com.example.Person", extends ["com.example.Party"] {
///     name: NativeType::String,
///     age: NativeType::Primitive(Primitive::Int),
///     id: NativeType::Boxed(Primitive::Long) => read_only,
/// });
/// let ClassKind::Bean(bean) = &info.kind else { unreachable!() };
/// assert_eq!(bean.properties.len(), 3);
/// assert!(!bean.properties[2].writable);
/// assert_eq!(&*info.supertypes[0], "com.example.Party");
/// ```
#[macro_export]
macro_rules! bean_class {
    (@prop $prop:ident, $ty:expr) => {
        $crate::PropertyDescriptor::read_write(stringify!($prop), $ty)
    };
    (@prop $prop:ident, $ty:expr, read_only) => {
        $crate::PropertyDescriptor::read_only(stringify!($prop), $ty)
    };
    (@prop $prop:ident, $ty:expr, write_only) => {
        $crate::PropertyDescriptor::write_only(stringify!($prop), $ty)
    };
    ($name:literal $(, extends [$($sup:literal),* $(,)?])? {
        $($prop:ident : $ty:expr $(=> $access:ident)?),* $(,)?
    }) => {{
        #[allow(unused_mut)]
        let mut info = $crate::ClassInfo::bean($name);
        $($(info = info.extends($sup);)*)?
        $(info = info.property($crate::bean_class!(@prop $prop, $ty $(, $access)?));)*
        info
    }};
}

/// Registry of class metadata.
#[derive(Debug, Clone)]
pub struct ClassTable {
    classes: FxHashMap<Arc<str>, ClassInfo>,
}

impl Default for ClassTable {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl ClassTable {
    /// An empty table; even the collection hints are unknown.
    pub fn empty() -> Self {
        Self {
            classes: FxHashMap::default(),
        }
    }

    /// A table with the built-in collection, date and raw JSON classes.
    pub fn with_builtins() -> Self {
        use names::*;
        let mut table = Self::empty();
        fn container(
            name: &str,
            kind: ContainerKind,
            instantiable: bool,
            supertypes: &[&str],
        ) -> ClassInfo {
            let mut info = ClassInfo::new(name, ClassKind::Container { kind, instantiable });
            for sup in supertypes {
                info = info.extends(*sup);
            }
            info
        }
        let builtins = [
            ClassInfo::new(COLLECTION, ClassKind::Interface),
            container(LIST, ContainerKind::List, false, &[COLLECTION]),
            container(ARRAY_LIST, ContainerKind::List, true, &[LIST]),
            container(LINKED_LIST, ContainerKind::List, true, &[LIST]),
            container(VECTOR, ContainerKind::List, true, &[LIST]),
            container(SET, ContainerKind::Set, false, &[COLLECTION]),
            container(HASH_SET, ContainerKind::Set, true, &[SET]),
            container(LINKED_HASH_SET, ContainerKind::Set, true, &[HASH_SET]),
            container(TREE_SET, ContainerKind::Set, true, &[SET]),
            container(MAP, ContainerKind::Map, false, &[]),
            container(HASH_MAP, ContainerKind::Map, true, &[MAP]),
            container(LINKED_HASH_MAP, ContainerKind::Map, true, &[HASH_MAP]),
            container(TREE_MAP, ContainerKind::Map, true, &[MAP]),
            container(DICTIONARY, ContainerKind::Dictionary, false, &[]),
            container(HASHTABLE, ContainerKind::Dictionary, true, &[DICTIONARY, MAP]),
            ClassInfo::new(DATE, ClassKind::Date),
            ClassInfo::new(JSON_OBJECT, ClassKind::RawObject),
            ClassInfo::new(JSON_ARRAY, ClassKind::RawArray),
        ];
        for info in builtins {
            table.classes.insert(info.name.clone(), info);
        }
        table
    }

    /// Registers a class. Names must be unique.
    pub fn register(&mut self, info: ClassInfo) -> Result<(), RegistryError> {
        if self.classes.contains_key(&info.name) {
            return Err(RegistryError::DuplicateClass(info.name.to_string()));
        }
        self.classes.insert(info.name.clone(), info);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ClassInfo> {
        self.classes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    pub fn kind(&self, name: &str) -> Option<&ClassKind> {
        self.get(name).map(|info| &info.kind)
    }

    /// `name` followed by all of its transitive supertypes, breadth first.
    pub fn ancestry(&self, name: &str) -> Vec<Arc<str>> {
        let mut seen: FxHashSet<Arc<str>> = FxHashSet::default();
        let mut order = Vec::new();
        let mut queue: VecDeque<Arc<str>> = VecDeque::new();
        queue.push_back(Arc::from(name));
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current.clone()) {
                continue;
            }
            if let Some(info) = self.get(&current) {
                queue.extend(info.supertypes.iter().cloned());
            }
            order.push(current);
        }
        order
    }

    /// Whether class `from` is `to` or one of its subclasses.
    pub fn is_subclass(&self, from: &str, to: &str) -> bool {
        from == to || self.ancestry(from).iter().any(|c| &**c == to)
    }

    /// Whether a value of type `from` may be stored where `to` is expected.
    pub fn is_assignable(&self, from: &NativeType, to: &NativeType) -> bool {
        match (from, to) {
            (_, NativeType::Object) => !from.is_primitive(),
            (NativeType::Class(f), NativeType::Class(t)) => self.is_subclass(f, t),
            (NativeType::Array(f), NativeType::Array(t)) => {
                f == t || (!f.is_primitive() && !t.is_primitive() && self.is_assignable(f, t))
            }
            (NativeType::Boxed(p), NativeType::Primitive(q))
            | (NativeType::Primitive(p), NativeType::Boxed(q)) => p == q,
            _ => from == to,
        }
    }

    pub fn is_enum(&self, name: &str) -> bool {
        matches!(self.kind(name), Some(ClassKind::Enum(_)))
    }

    pub fn container_kind(&self, name: &str) -> Option<ContainerKind> {
        match self.kind(name) {
            Some(ClassKind::Container { kind, .. }) => Some(*kind),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::Primitive;

    fn table() -> ClassTable {
        let mut table = ClassTable::with_builtins();
        table
            .register(bean_class!("com.example.Animal" {}))
            .unwrap();
        table
            .register(bean_class!("com.example.Dog", extends ["com.example.Animal"] {
                name: NativeType::String,
            }))
            .unwrap();
        table
    }

    #[test]
    fn test_builtin_hints_registered() {
        let table = ClassTable::with_builtins();
        for name in [names::ARRAY_LIST, names::HASH_MAP, names::TREE_SET, names::HASHTABLE] {
            assert!(table.contains(name), "{name}");
        }
        assert_eq!(table.container_kind(names::VECTOR), Some(ContainerKind::List));
        assert_eq!(table.container_kind(names::DATE), None);
    }

    #[test]
    fn test_ancestry_is_transitive() {
        let table = ClassTable::with_builtins();
        let ancestry = table.ancestry(names::LINKED_HASH_MAP);
        let chain: Vec<&str> = ancestry.iter().map(|c| &**c).collect();
        assert_eq!(chain, vec![names::LINKED_HASH_MAP, names::HASH_MAP, names::MAP]);
        assert!(table.is_subclass(names::LINKED_HASH_SET, names::COLLECTION));
    }

    #[test]
    fn test_assignability() {
        let table = table();
        let dog = NativeType::class("com.example.Dog");
        let animal = NativeType::class("com.example.Animal");
        assert!(table.is_assignable(&dog, &animal));
        assert!(!table.is_assignable(&animal, &dog));
        assert!(table.is_assignable(&dog, &NativeType::Object));
        assert!(table.is_assignable(
            &NativeType::array(dog.clone()),
            &NativeType::array(animal)
        ));
        assert!(!table.is_assignable(&NativeType::Primitive(Primitive::Int), &NativeType::Object));
        assert!(table.is_assignable(
            &NativeType::Boxed(Primitive::Int),
            &NativeType::Primitive(Primitive::Int)
        ));
    }

    #[test]
    fn test_duplicate_class_rejected() {
        let mut table = table();
        assert_eq!(
            table.register(bean_class!("com.example.Dog" {})),
            Err(RegistryError::DuplicateClass("com.example.Dog".into()))
        );
    }

    #[test]
    fn test_bean_class_macro_access_modes() {
        let info = bean_class!("com.example.Account" {
            balance: NativeType::Primitive(Primitive::Long) => read_only,
            password: NativeType::String => write_only,
            owner: NativeType::String,
        });
        let ClassKind::Bean(bean) = info.kind else {
            panic!("not a bean");
        };
        let modes: Vec<(bool, bool)> = bean
            .properties
            .iter()
            .map(|p| (p.readable, p.writable))
            .collect();
        assert_eq!(modes, vec![(true, false), (false, true), (true, true)]);
        assert_eq!(bean.properties[0].default_value(), Native::Long(0));
    }
}
