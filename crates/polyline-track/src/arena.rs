//! Slot arena backing the polyline node storage
//!
//! Nodes are addressed internally by plain slot indices, which stay valid for as long as
//! the node is alive. Public handles additionally carry the owning polyline's identity and
//! the slot generation so that stale or foreign handles resolve to nothing.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_OWNER_ID: AtomicU32 = AtomicU32::new(1);

/// Allocate a process-unique owner identity for a new polyline
pub(crate) fn next_owner_id() -> u32 {
    NEXT_OWNER_ID.fetch_add(1, Ordering::Relaxed)
}

/// Generation-checked reference to a node owned by one polyline
///
/// `K` is a marker distinguishing vertex handles from segment handles.
pub struct NodeId<K> {
    owner: u32,
    slot: u32,
    generation: u32,
    _kind: PhantomData<fn() -> K>,
}

impl<K> NodeId<K> {
    pub(crate) fn new(owner: u32, slot: usize, generation: u32) -> Self {
        Self {
            owner,
            slot: slot as u32,
            generation,
            _kind: PhantomData,
        }
    }

    #[inline]
    pub(crate) fn owner(&self) -> u32 {
        self.owner
    }

    #[inline]
    pub(crate) fn slot(&self) -> usize {
        self.slot as usize
    }

    #[inline]
    pub(crate) fn generation(&self) -> u32 {
        self.generation
    }
}

// Manual impls: derives would put bounds on the marker type.
impl<K> Clone for NodeId<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for NodeId<K> {}

impl<K> PartialEq for NodeId<K> {
    fn eq(&self, other: &Self) -> bool {
        self.owner == other.owner && self.slot == other.slot && self.generation == other.generation
    }
}

impl<K> Eq for NodeId<K> {}

impl<K> Hash for NodeId<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.owner.hash(state);
        self.slot.hash(state);
        self.generation.hash(state);
    }
}

impl<K> fmt::Debug for NodeId<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({}:{}@{})", self.owner, self.slot, self.generation)
    }
}

#[derive(Clone, Debug)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Vec-backed storage with a free list; removing bumps the slot generation
#[derive(Clone, Debug)]
pub(crate) struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<usize>,
    len: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }
}

impl<T> Arena<T> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            len: 0,
        }
    }

    /// Store a value and return its slot
    pub(crate) fn insert(&mut self, value: T) -> usize {
        self.len += 1;
        match self.free.pop() {
            Some(slot) => {
                self.slots[slot].value = Some(value);
                slot
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    value: Some(value),
                });
                self.slots.len() - 1
            }
        }
    }

    /// Take the value out of a slot, invalidating every handle to it
    pub(crate) fn remove(&mut self, slot: usize) -> Option<T> {
        let entry = self.slots.get_mut(slot)?;
        let value = entry.value.take()?;
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(slot);
        self.len -= 1;
        Some(value)
    }

    #[inline]
    pub(crate) fn get(&self, slot: usize) -> Option<&T> {
        self.slots.get(slot)?.value.as_ref()
    }

    /// Current generation of a live slot
    #[inline]
    pub(crate) fn generation(&self, slot: usize) -> Option<u32> {
        let entry = self.slots.get(slot)?;
        entry.value.as_ref().map(|_| entry.generation)
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }
}

impl<T> Index<usize> for Arena<T> {
    type Output = T;

    fn index(&self, slot: usize) -> &T {
        match self.get(slot) {
            Some(value) => value,
            None => panic!("dangling node link to slot {slot}"),
        }
    }
}

impl<T> IndexMut<usize> for Arena<T> {
    fn index_mut(&mut self, slot: usize) -> &mut T {
        match self.slots.get_mut(slot).and_then(|entry| entry.value.as_mut()) {
            Some(value) => value,
            None => panic!("dangling node link to slot {slot}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_remove_reuses_slots() {
        let mut arena = Arena::default();
        let a = arena.insert("a");
        let b = arena.insert("b");
        assert_eq!(arena.len(), 2);

        assert_eq!(arena.remove(a), Some("a"));
        assert_eq!(arena.len(), 1);
        assert!(arena.get(a).is_none());

        let c = arena.insert("c");
        assert_eq!(c, a);
        assert_eq!(arena[c], "c");
        assert_eq!(arena[b], "b");
    }

    #[test]
    fn test_remove_bumps_generation() {
        let mut arena = Arena::default();
        let a = arena.insert(1);
        let before = arena.generation(a).unwrap();
        arena.remove(a);
        assert!(arena.generation(a).is_none());
        let again = arena.insert(2);
        assert_eq!(again, a);
        assert_ne!(arena.generation(again).unwrap(), before);
    }

    #[test]
    fn test_double_remove_is_none() {
        let mut arena = Arena::default();
        let a = arena.insert(1);
        assert_eq!(arena.remove(a), Some(1));
        assert_eq!(arena.remove(a), None);
        assert_eq!(arena.len(), 0);
    }

    #[test]
    fn test_node_ids_compare_all_parts() {
        struct Marker;
        let a: NodeId<Marker> = NodeId::new(1, 3, 0);
        let same: NodeId<Marker> = NodeId::new(1, 3, 0);
        let other_owner: NodeId<Marker> = NodeId::new(2, 3, 0);
        let other_generation: NodeId<Marker> = NodeId::new(1, 3, 1);
        assert_eq!(a, same);
        assert_ne!(a, other_owner);
        assert_ne!(a, other_generation);
    }

    #[test]
    #[should_panic(expected = "dangling node link")]
    fn test_index_of_free_slot_panics() {
        let mut arena = Arena::default();
        let a = arena.insert(1);
        arena.remove(a);
        let value = arena[a];
        assert_eq!(value, 1);
    }
}
