//! The native object model.
//!
//! Scalars are carried inline in [`Native`]; everything with identity
//! (arrays, collections, beans, raw JSON holders) lives in an [`ObjectHeap`]
//! and is referred to through an [`ObjectId`]. Two `Native::Ref`s with the
//! same id are the same object, which is what the marshaller's cycle and
//! duplicate detection keys on.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::FxHashSet;

use crate::class::names;

/// Primitive value kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Boolean,
    Char,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl Primitive {
    /// The primitive's keyword name (`int`, `double`, ...).
    pub fn name(self) -> &'static str {
        match self {
            Primitive::Boolean => "boolean",
            Primitive::Char => "char",
            Primitive::Byte => "byte",
            Primitive::Short => "short",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Float => "float",
            Primitive::Double => "double",
        }
    }

    /// The class name of the boxed form.
    pub fn boxed_name(self) -> &'static str {
        match self {
            Primitive::Boolean => "java.lang.Boolean",
            Primitive::Char => "java.lang.Character",
            Primitive::Byte => "java.lang.Byte",
            Primitive::Short => "java.lang.Short",
            Primitive::Int => "java.lang.Integer",
            Primitive::Long => "java.lang.Long",
            Primitive::Float => "java.lang.Float",
            Primitive::Double => "java.lang.Double",
        }
    }

    pub fn is_numeric(self) -> bool {
        !matches!(self, Primitive::Boolean | Primitive::Char)
    }

    /// The zero value used to initialise unset primitive slots.
    pub fn default_value(self) -> Native {
        match self {
            Primitive::Boolean => Native::Bool(false),
            Primitive::Char => Native::Char('\0'),
            Primitive::Byte => Native::Byte(0),
            Primitive::Short => Native::Short(0),
            Primitive::Int => Native::Int(0),
            Primitive::Long => Native::Long(0),
            Primitive::Float => Native::Float(0.0),
            Primitive::Double => Native::Double(0.0),
        }
    }

    fn from_boxed_name(name: &str) -> Option<Primitive> {
        ALL_PRIMITIVES
            .iter()
            .copied()
            .find(|p| p.boxed_name() == name)
    }
}

const ALL_PRIMITIVES: [Primitive; 8] = [
    Primitive::Boolean,
    Primitive::Char,
    Primitive::Byte,
    Primitive::Short,
    Primitive::Int,
    Primitive::Long,
    Primitive::Float,
    Primitive::Double,
];

/// A static type: the target of an unmarshal, or the runtime type of a value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NativeType {
    /// The universal supertype; JSON shape decides what gets built.
    Object,
    /// An unboxed primitive; `null` is not assignable.
    Primitive(Primitive),
    /// A boxed primitive; `null` is assignable.
    Boxed(Primitive),
    String,
    Array(Box<NativeType>),
    /// Any class registered in the [`ClassTable`](crate::ClassTable).
    Class(Arc<str>),
}

impl NativeType {
    pub fn class(name: impl Into<Arc<str>>) -> Self {
        let name = name.into();
        match Primitive::from_boxed_name(&name) {
            Some(p) => NativeType::Boxed(p),
            None if &*name == names::STRING => NativeType::String,
            None if &*name == names::OBJECT => NativeType::Object,
            None => NativeType::Class(name),
        }
    }

    pub fn array(component: NativeType) -> Self {
        NativeType::Array(Box::new(component))
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, NativeType::Primitive(_))
    }

    /// The fully qualified name, e.g. `int[]` or `java.util.ArrayList`.
    pub fn name(&self) -> String {
        match self {
            NativeType::Object => names::OBJECT.to_string(),
            NativeType::Primitive(p) => p.name().to_string(),
            NativeType::Boxed(p) => p.boxed_name().to_string(),
            NativeType::String => names::STRING.to_string(),
            NativeType::Array(component) => format!("{}[]", component.name()),
            NativeType::Class(name) => name.to_string(),
        }
    }

    /// The class name when this type is a registered class.
    pub fn class_name(&self) -> Option<&str> {
        match self {
            NativeType::Class(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Handle of an object in an [`ObjectHeap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl ObjectId {
    pub fn from_raw(raw: u64) -> Self {
        ObjectId(raw)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An enum constant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumValue {
    pub class: Arc<str>,
    pub name: Arc<str>,
}

/// A native value.
#[derive(Debug, Clone, PartialEq)]
pub enum Native {
    Null,
    Bool(bool),
    Char(char),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Str(String),
    Enum(EnumValue),
    /// Milliseconds since the Unix epoch.
    Date(i64),
    Ref(ObjectId),
}

impl Native {
    pub fn is_null(&self) -> bool {
        matches!(self, Native::Null)
    }

    pub fn as_ref_id(&self) -> Option<ObjectId> {
        match self {
            Native::Ref(id) => Some(*id),
            _ => None,
        }
    }

    pub fn enum_constant(class: impl Into<Arc<str>>, name: impl Into<Arc<str>>) -> Self {
        Native::Enum(EnumValue {
            class: class.into(),
            name: name.into(),
        })
    }

    /// The primitive kind of an inline scalar.
    pub fn primitive(&self) -> Option<Primitive> {
        Some(match self {
            Native::Bool(_) => Primitive::Boolean,
            Native::Char(_) => Primitive::Char,
            Native::Byte(_) => Primitive::Byte,
            Native::Short(_) => Primitive::Short,
            Native::Int(_) => Primitive::Int,
            Native::Long(_) => Primitive::Long,
            Native::Float(_) => Primitive::Float,
            Native::Double(_) => Primitive::Double,
            _ => return None,
        })
    }
}

impl From<bool> for Native {
    fn from(v: bool) -> Self {
        Native::Bool(v)
    }
}

impl From<i32> for Native {
    fn from(v: i32) -> Self {
        Native::Int(v)
    }
}

impl From<i64> for Native {
    fn from(v: i64) -> Self {
        Native::Long(v)
    }
}

impl From<f64> for Native {
    fn from(v: f64) -> Self {
        Native::Double(v)
    }
}

impl From<char> for Native {
    fn from(v: char) -> Self {
        Native::Char(v)
    }
}

impl From<&str> for Native {
    fn from(v: &str) -> Self {
        Native::Str(v.to_string())
    }
}

impl From<String> for Native {
    fn from(v: String) -> Self {
        Native::Str(v)
    }
}

impl From<ObjectId> for Native {
    fn from(id: ObjectId) -> Self {
        Native::Ref(id)
    }
}

/// Dense storage for arrays of a primitive component type.
#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveArray {
    Boolean(Vec<bool>),
    Char(Vec<char>),
    Byte(Vec<i8>),
    Short(Vec<i16>),
    Int(Vec<i32>),
    Long(Vec<i64>),
    Float(Vec<f32>),
    Double(Vec<f64>),
}

impl PrimitiveArray {
    pub fn with_capacity(component: Primitive, capacity: usize) -> Self {
        match component {
            Primitive::Boolean => PrimitiveArray::Boolean(Vec::with_capacity(capacity)),
            Primitive::Char => PrimitiveArray::Char(Vec::with_capacity(capacity)),
            Primitive::Byte => PrimitiveArray::Byte(Vec::with_capacity(capacity)),
            Primitive::Short => PrimitiveArray::Short(Vec::with_capacity(capacity)),
            Primitive::Int => PrimitiveArray::Int(Vec::with_capacity(capacity)),
            Primitive::Long => PrimitiveArray::Long(Vec::with_capacity(capacity)),
            Primitive::Float => PrimitiveArray::Float(Vec::with_capacity(capacity)),
            Primitive::Double => PrimitiveArray::Double(Vec::with_capacity(capacity)),
        }
    }

    pub fn component(&self) -> Primitive {
        match self {
            PrimitiveArray::Boolean(_) => Primitive::Boolean,
            PrimitiveArray::Char(_) => Primitive::Char,
            PrimitiveArray::Byte(_) => Primitive::Byte,
            PrimitiveArray::Short(_) => Primitive::Short,
            PrimitiveArray::Int(_) => Primitive::Int,
            PrimitiveArray::Long(_) => Primitive::Long,
            PrimitiveArray::Float(_) => Primitive::Float,
            PrimitiveArray::Double(_) => Primitive::Double,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            PrimitiveArray::Boolean(v) => v.len(),
            PrimitiveArray::Char(v) => v.len(),
            PrimitiveArray::Byte(v) => v.len(),
            PrimitiveArray::Short(v) => v.len(),
            PrimitiveArray::Int(v) => v.len(),
            PrimitiveArray::Long(v) => v.len(),
            PrimitiveArray::Float(v) => v.len(),
            PrimitiveArray::Double(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element `index` as an inline native.
    pub fn get(&self, index: usize) -> Option<Native> {
        match self {
            PrimitiveArray::Boolean(v) => v.get(index).map(|x| Native::Bool(*x)),
            PrimitiveArray::Char(v) => v.get(index).map(|x| Native::Char(*x)),
            PrimitiveArray::Byte(v) => v.get(index).map(|x| Native::Byte(*x)),
            PrimitiveArray::Short(v) => v.get(index).map(|x| Native::Short(*x)),
            PrimitiveArray::Int(v) => v.get(index).map(|x| Native::Int(*x)),
            PrimitiveArray::Long(v) => v.get(index).map(|x| Native::Long(*x)),
            PrimitiveArray::Float(v) => v.get(index).map(|x| Native::Float(*x)),
            PrimitiveArray::Double(v) => v.get(index).map(|x| Native::Double(*x)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Native> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i))
    }

    /// Appends `value`, which must be a scalar of exactly the component kind.
    /// Returns `false` and leaves the array untouched otherwise.
    pub fn push(&mut self, value: &Native) -> bool {
        match (self, value) {
            (PrimitiveArray::Boolean(v), Native::Bool(x)) => v.push(*x),
            (PrimitiveArray::Char(v), Native::Char(x)) => v.push(*x),
            (PrimitiveArray::Byte(v), Native::Byte(x)) => v.push(*x),
            (PrimitiveArray::Short(v), Native::Short(x)) => v.push(*x),
            (PrimitiveArray::Int(v), Native::Int(x)) => v.push(*x),
            (PrimitiveArray::Long(v), Native::Long(x)) => v.push(*x),
            (PrimitiveArray::Float(v), Native::Float(x)) => v.push(*x),
            (PrimitiveArray::Double(v), Native::Double(x)) => v.push(*x),
            _ => return false,
        }
        true
    }
}

/// The payload of a heap object.
#[derive(Clone)]
pub enum ObjectData {
    PrimitiveArray(PrimitiveArray),
    ObjectArray {
        component: NativeType,
        items: Vec<Native>,
    },
    List(Vec<Native>),
    Set(Vec<Native>),
    Map(Vec<(Native, Native)>),
    Dictionary(Vec<(Native, Native)>),
    Bean(IndexMap<String, Native>),
    RawObject(IndexMap<String, Native>),
    RawArray(Vec<Native>),
    /// Host data the engine never looks inside; only reference serializers
    /// can marshal it.
    Opaque(Arc<dyn Any + Send + Sync>),
}

impl fmt::Debug for ObjectData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectData::PrimitiveArray(a) => f.debug_tuple("PrimitiveArray").field(a).finish(),
            ObjectData::ObjectArray { component, items } => f
                .debug_struct("ObjectArray")
                .field("component", component)
                .field("items", items)
                .finish(),
            ObjectData::List(v) => f.debug_tuple("List").field(v).finish(),
            ObjectData::Set(v) => f.debug_tuple("Set").field(v).finish(),
            ObjectData::Map(v) => f.debug_tuple("Map").field(v).finish(),
            ObjectData::Dictionary(v) => f.debug_tuple("Dictionary").field(v).finish(),
            ObjectData::Bean(v) => f.debug_tuple("Bean").field(v).finish(),
            ObjectData::RawObject(v) => f.debug_tuple("RawObject").field(v).finish(),
            ObjectData::RawArray(v) => f.debug_tuple("RawArray").field(v).finish(),
            ObjectData::Opaque(_) => f.write_str("Opaque(..)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HeapObject {
    pub class: Arc<str>,
    pub data: ObjectData,
}

/// Arena owning every object of a graph.
///
/// ```
/// use json_bridge::{Native, ObjectHeap};
///
/// let mut heap = ObjectHeap::new();
/// let list = heap.new_list("java.util.ArrayList", vec![Native::Int(1)]);
/// let id = list.as_ref_id().unwrap();
/// assert!(heap.push_element(id, list.clone()));
/// assert_eq!(heap.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ObjectHeap {
    objects: Vec<HeapObject>,
}

impl ObjectHeap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn alloc(&mut self, class: impl Into<Arc<str>>, data: ObjectData) -> ObjectId {
        let id = ObjectId(self.objects.len() as u64);
        self.objects.push(HeapObject {
            class: class.into(),
            data,
        });
        id
    }

    pub fn get(&self, id: ObjectId) -> Option<&HeapObject> {
        self.objects.get(id.index())
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut HeapObject> {
        self.objects.get_mut(id.index())
    }

    pub fn new_list(&mut self, class: impl Into<Arc<str>>, items: Vec<Native>) -> Native {
        Native::Ref(self.alloc(class, ObjectData::List(items)))
    }

    pub fn new_set(&mut self, class: impl Into<Arc<str>>, items: Vec<Native>) -> Native {
        Native::Ref(self.alloc(class, ObjectData::Set(items)))
    }

    pub fn new_map(
        &mut self,
        class: impl Into<Arc<str>>,
        entries: Vec<(Native, Native)>,
    ) -> Native {
        Native::Ref(self.alloc(class, ObjectData::Map(entries)))
    }

    pub fn new_dictionary(
        &mut self,
        class: impl Into<Arc<str>>,
        entries: Vec<(Native, Native)>,
    ) -> Native {
        Native::Ref(self.alloc(class, ObjectData::Dictionary(entries)))
    }

    pub fn new_bean<'a>(
        &mut self,
        class: impl Into<Arc<str>>,
        fields: impl IntoIterator<Item = (&'a str, Native)>,
    ) -> Native {
        let fields = fields
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        Native::Ref(self.alloc(class, ObjectData::Bean(fields)))
    }

    pub fn new_primitive_array(&mut self, values: PrimitiveArray) -> Native {
        let class = NativeType::array(NativeType::Primitive(values.component())).name();
        Native::Ref(self.alloc(class, ObjectData::PrimitiveArray(values)))
    }

    pub fn new_object_array(&mut self, component: NativeType, items: Vec<Native>) -> Native {
        let class = NativeType::array(component.clone()).name();
        Native::Ref(self.alloc(class, ObjectData::ObjectArray { component, items }))
    }

    pub fn new_opaque(
        &mut self,
        class: impl Into<Arc<str>>,
        payload: Arc<dyn Any + Send + Sync>,
    ) -> Native {
        Native::Ref(self.alloc(class, ObjectData::Opaque(payload)))
    }

    /// The object in this heap that already holds `payload`, or a new one.
    pub fn adopt_opaque(
        &mut self,
        class: impl Into<Arc<str>>,
        payload: Arc<dyn Any + Send + Sync>,
    ) -> Native {
        let existing = self.objects.iter().position(|o| match &o.data {
            ObjectData::Opaque(held) => Arc::ptr_eq(held, &payload),
            _ => false,
        });
        match existing {
            Some(index) => Native::Ref(ObjectId(index as u64)),
            None => self.new_opaque(class, payload),
        }
    }

    /// Appends to a list, set, raw JSON array or object array.
    pub fn push_element(&mut self, id: ObjectId, value: Native) -> bool {
        match self.get_mut(id).map(|o| &mut o.data) {
            Some(ObjectData::List(v))
            | Some(ObjectData::Set(v))
            | Some(ObjectData::RawArray(v))
            | Some(ObjectData::ObjectArray { items: v, .. }) => {
                v.push(value);
                true
            }
            _ => false,
        }
    }

    /// Sets a bean property or raw JSON object member.
    pub fn set_field(&mut self, id: ObjectId, name: &str, value: Native) -> bool {
        match self.get_mut(id).map(|o| &mut o.data) {
            Some(ObjectData::Bean(fields)) | Some(ObjectData::RawObject(fields)) => {
                fields.insert(name.to_string(), value);
                true
            }
            _ => false,
        }
    }

    /// Reads a bean property or raw JSON object member.
    pub fn field(&self, id: ObjectId, name: &str) -> Option<&Native> {
        match self.get(id).map(|o| &o.data) {
            Some(ObjectData::Bean(fields)) | Some(ObjectData::RawObject(fields)) => {
                fields.get(name)
            }
            _ => None,
        }
    }

    /// The runtime type of `value`. `None` for `Null` and dangling handles.
    pub fn runtime_type(&self, value: &Native) -> Option<NativeType> {
        Some(match value {
            Native::Null => return None,
            Native::Str(_) => NativeType::String,
            Native::Enum(e) => NativeType::Class(e.class.clone()),
            Native::Date(_) => NativeType::Class(names::DATE.into()),
            Native::Ref(id) => {
                let object = self.get(*id)?;
                match &object.data {
                    ObjectData::PrimitiveArray(a) => {
                        NativeType::array(NativeType::Primitive(a.component()))
                    }
                    ObjectData::ObjectArray { component, .. } => {
                        NativeType::array(component.clone())
                    }
                    _ => NativeType::Class(object.class.clone()),
                }
            }
            scalar => NativeType::Boxed(scalar.primitive()?),
        })
    }

    /// Structural equality of `a` in this heap and `b` in `other`.
    ///
    /// Object identity is ignored but graph shape is not: cycles are followed
    /// once, so two isomorphic cyclic graphs compare equal.
    pub fn deep_equals(&self, a: &Native, other: &ObjectHeap, b: &Native) -> bool {
        let mut visited = FxHashSet::default();
        self.deep_equals_inner(a, other, b, &mut visited)
    }

    fn deep_equals_inner(
        &self,
        a: &Native,
        other: &ObjectHeap,
        b: &Native,
        visited: &mut FxHashSet<(ObjectId, ObjectId)>,
    ) -> bool {
        let (Native::Ref(ia), Native::Ref(ib)) = (a, b) else {
            return a == b;
        };
        if !visited.insert((*ia, *ib)) {
            return true;
        }
        let (Some(oa), Some(ob)) = (self.get(*ia), other.get(*ib)) else {
            return false;
        };
        if oa.class != ob.class {
            return false;
        }
        let mut same = |x: &Native, y: &Native| self.deep_equals_inner(x, other, y, visited);
        match (&oa.data, &ob.data) {
            (ObjectData::PrimitiveArray(x), ObjectData::PrimitiveArray(y)) => x == y,
            (
                ObjectData::ObjectArray {
                    component: cx,
                    items: x,
                },
                ObjectData::ObjectArray {
                    component: cy,
                    items: y,
                },
            ) => cx == cy && x.len() == y.len() && x.iter().zip(y).all(|(p, q)| same(p, q)),
            (ObjectData::List(x), ObjectData::List(y))
            | (ObjectData::Set(x), ObjectData::Set(y))
            | (ObjectData::RawArray(x), ObjectData::RawArray(y)) => {
                x.len() == y.len() && x.iter().zip(y).all(|(p, q)| same(p, q))
            }
            (ObjectData::Map(x), ObjectData::Map(y))
            | (ObjectData::Dictionary(x), ObjectData::Dictionary(y)) => {
                x.len() == y.len()
                    && x
                        .iter()
                        .zip(y)
                        .all(|((kp, vp), (kq, vq))| same(kp, kq) && same(vp, vq))
            }
            (ObjectData::Bean(x), ObjectData::Bean(y))
            | (ObjectData::RawObject(x), ObjectData::RawObject(y)) => {
                x.len() == y.len()
                    && x
                        .iter()
                        .all(|(k, p)| y.get(k).is_some_and(|q| same(p, q)))
            }
            (ObjectData::Opaque(x), ObjectData::Opaque(y)) => Arc::ptr_eq(x, y),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_type_names() {
        assert_eq!(NativeType::Primitive(Primitive::Int).name(), "int");
        assert_eq!(NativeType::Boxed(Primitive::Long).name(), "java.lang.Long");
        assert_eq!(
            NativeType::array(NativeType::array(NativeType::Primitive(Primitive::Byte))).name(),
            "byte[][]"
        );
        assert_eq!(NativeType::class("java.util.ArrayList").to_string(), "java.util.ArrayList");
    }

    #[test]
    fn test_class_constructor_recognises_builtins() {
        assert_eq!(NativeType::class("java.lang.Integer"), NativeType::Boxed(Primitive::Int));
        assert_eq!(NativeType::class("java.lang.String"), NativeType::String);
        assert_eq!(NativeType::class("java.lang.Object"), NativeType::Object);
    }

    #[test]
    fn test_runtime_types() {
        let mut heap = ObjectHeap::new();
        let ints = heap.new_primitive_array(PrimitiveArray::Int(vec![1, 2]));
        let list = heap.new_list("java.util.ArrayList", vec![]);
        assert_eq!(
            heap.runtime_type(&ints),
            Some(NativeType::array(NativeType::Primitive(Primitive::Int)))
        );
        assert_eq!(heap.runtime_type(&list), Some(NativeType::class("java.util.ArrayList")));
        assert_eq!(heap.runtime_type(&Native::Int(1)), Some(NativeType::Boxed(Primitive::Int)));
        assert_eq!(heap.runtime_type(&Native::Null), None);
        assert_eq!(heap.runtime_type(&Native::Ref(ObjectId::from_raw(99))), None);
    }

    #[test]
    fn test_primitive_array_push_checks_kind() {
        let mut arr = PrimitiveArray::with_capacity(Primitive::Short, 2);
        assert!(arr.push(&Native::Short(4)));
        assert!(!arr.push(&Native::Int(4)));
        assert_eq!(arr.iter().collect::<Vec<_>>(), vec![Native::Short(4)]);
    }

    #[test]
    fn test_deep_equals_follows_cycles() {
        let build = || {
            let mut heap = ObjectHeap::new();
            let list = heap.new_list("java.util.ArrayList", vec![Native::from("x")]);
            let id = list.as_ref_id().unwrap();
            heap.push_element(id, list.clone());
            (heap, list)
        };
        let (h1, a) = build();
        let (mut h2, b) = build();
        assert!(h1.deep_equals(&a, &h2, &b));
        h2.push_element(b.as_ref_id().unwrap(), Native::Int(1));
        assert!(!h1.deep_equals(&a, &h2, &b));
    }

    #[test]
    fn test_bean_fields() {
        let mut heap = ObjectHeap::new();
        let bean = heap.new_bean("com.example.Point", [("x", Native::Int(1))]);
        let id = bean.as_ref_id().unwrap();
        assert!(heap.set_field(id, "y", Native::Int(2)));
        assert_eq!(heap.field(id, "y"), Some(&Native::Int(2)));
        assert!(!heap.push_element(id, Native::Null));
    }
}
