//! Objects passed by reference.
//!
//! Classes registered as references are never inlined; the marshaller emits a
//! small handle carrying an object id and the [`ReferenceBridge`] keeps the
//! payload so the handle can be resolved later, possibly from another thread,
//! into another heap and long after the call that produced it.
//!
//! Object ids belong to the bridge, not to any heap: a payload keeps the id it
//! was first exported under for as long as it stays registered.

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::debug;
use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};

/// What a handle stands for, independent of any [`ObjectHeap`](crate::ObjectHeap).
#[derive(Clone)]
pub struct ReferenceTarget {
    pub class: Arc<str>,
    pub payload: Arc<dyn Any + Send + Sync>,
}

impl ReferenceTarget {
    pub fn new(class: impl Into<Arc<str>>, payload: Arc<dyn Any + Send + Sync>) -> Self {
        Self {
            class: class.into(),
            payload,
        }
    }

    /// Identity of the payload allocation.
    fn key(&self) -> usize {
        Arc::as_ptr(&self.payload) as *const () as usize
    }
}

impl fmt::Debug for ReferenceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReferenceTarget")
            .field("class", &self.class)
            .field("payload", &format_args!("{:#x}", self.key()))
            .finish()
    }
}

impl PartialEq for ReferenceTarget {
    fn eq(&self, other: &Self) -> bool {
        self.class == other.class && Arc::ptr_eq(&self.payload, &other.payload)
    }
}

/// The side table a reference serializer talks to.
pub trait ReferenceBridge: Send + Sync {
    /// Whether instances of `class` are passed as plain references.
    fn is_reference(&self, class: &str) -> bool;
    /// Whether instances of `class` are passed as callable references.
    fn is_callable_reference(&self, class: &str) -> bool;
    /// Keeps a plain reference alive and returns its object id. Exporting a
    /// payload that is already registered returns its existing id.
    fn add_reference(&self, target: ReferenceTarget) -> u64;
    /// [`add_reference`](Self::add_reference) for callable references.
    fn register_object(&self, target: ReferenceTarget) -> u64;
    /// Resolves a handle produced by either of the above.
    fn get_reference(&self, id: u64) -> Option<ReferenceTarget>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceRecord {
    pub id: u64,
    pub target: ReferenceTarget,
    pub callable: bool,
}

#[derive(Debug, Default)]
struct Records {
    by_id: FxHashMap<u64, ReferenceRecord>,
    /// Payload identity to object id.
    ids: FxHashMap<usize, u64>,
}

/// Thread-safe [`ReferenceBridge`] keyed by class name.
///
/// ```
/// use std::sync::Arc;
/// use json_bridge::{ReferenceBridge, ReferenceTable, ReferenceTarget};
///
/// let table = Arc::new(ReferenceTable::new());
/// table.register_reference_class("com.example.Session");
/// assert!(table.is_reference("com.example.Session"));
///
/// let target = ReferenceTarget::new("com.example.Session", Arc::new("token"));
/// let id = table.add_reference(target.clone());
/// assert_eq!(table.add_reference(target.clone()), id);
/// assert_eq!(table.get_reference(id), Some(target));
/// ```
#[derive(Debug, Default)]
pub struct ReferenceTable {
    reference_classes: RwLock<FxHashSet<Arc<str>>>,
    callable_classes: RwLock<FxHashSet<Arc<str>>>,
    records: RwLock<Records>,
    next_id: AtomicU64,
}

impl ReferenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_reference_class(&self, class: impl Into<Arc<str>>) {
        self.reference_classes.write().insert(class.into());
    }

    pub fn register_callable_class(&self, class: impl Into<Arc<str>>) {
        self.callable_classes.write().insert(class.into());
    }

    pub fn record(&self, id: u64) -> Option<ReferenceRecord> {
        self.records.read().by_id.get(&id).cloned()
    }

    /// Drops a handle. Returns the record if it existed. Exporting the same
    /// payload afterwards hands out a fresh id.
    pub fn remove(&self, id: u64) -> Option<ReferenceRecord> {
        let mut records = self.records.write();
        let record = records.by_id.remove(&id)?;
        records.ids.remove(&record.target.key());
        Some(record)
    }

    pub fn len(&self) -> usize {
        self.records.read().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().by_id.is_empty()
    }

    fn export(&self, target: ReferenceTarget, callable: bool) -> u64 {
        let key = target.key();
        let mut records = self.records.write();
        if let Some(&id) = records.ids.get(&key) {
            return id;
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(
            "registering {} reference {} ({})",
            if callable { "callable" } else { "plain" },
            id,
            target.class
        );
        records.ids.insert(key, id);
        records.by_id.insert(
            id,
            ReferenceRecord {
                id,
                target,
                callable,
            },
        );
        id
    }
}

impl ReferenceBridge for ReferenceTable {
    fn is_reference(&self, class: &str) -> bool {
        self.reference_classes.read().contains(class)
    }

    fn is_callable_reference(&self, class: &str) -> bool {
        self.callable_classes.read().contains(class)
    }

    fn add_reference(&self, target: ReferenceTarget) -> u64 {
        self.export(target, false)
    }

    fn register_object(&self, target: ReferenceTarget) -> u64 {
        self.export(target, true)
    }

    fn get_reference(&self, id: u64) -> Option<ReferenceTarget> {
        self.records.read().by_id.get(&id).map(|r| r.target.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn target(class: &str, payload: u32) -> ReferenceTarget {
        ReferenceTarget::new(class, Arc::new(payload))
    }

    #[test]
    fn test_records_flag_callable() {
        let table = ReferenceTable::new();
        let a = table.add_reference(target("com.example.Session", 1));
        let b = table.register_object(target("com.example.Service", 2));
        assert_ne!(a, b);
        assert!(!table.record(a).unwrap().callable);
        assert!(table.record(b).unwrap().callable);
        assert_eq!(table.len(), 2);
        assert!(table.remove(a).is_some());
        assert_eq!(table.get_reference(a), None);
    }

    #[test]
    fn test_same_payload_keeps_its_id() {
        let table = ReferenceTable::new();
        let shared = target("com.example.Session", 7);
        let id = table.add_reference(shared.clone());
        // equal value, different allocation
        let other = table.add_reference(target("com.example.Session", 7));
        assert_ne!(id, other);
        assert_eq!(table.add_reference(shared.clone()), id);
        assert_eq!(table.len(), 2);

        table.remove(id);
        let fresh = table.add_reference(shared);
        assert_ne!(fresh, id);
    }

    #[test]
    fn test_class_sets_are_independent() {
        let table = ReferenceTable::new();
        table.register_callable_class("com.example.Service");
        assert!(table.is_callable_reference("com.example.Service"));
        assert!(!table.is_reference("com.example.Service"));
    }

    #[test]
    fn test_shared_across_threads() {
        let table = Arc::new(ReferenceTable::new());
        let handles: Vec<_> = (0..4u32)
            .map(|i| {
                let table = Arc::clone(&table);
                thread::spawn(move || table.add_reference(target("com.example.Session", i)))
            })
            .collect();
        let mut ids: Vec<u64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![0, 1, 2, 3]);
        assert_eq!(table.len(), 4);
    }
}
