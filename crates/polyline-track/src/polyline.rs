//! Generic alternating vertex/segment chain
//!
//! `Polyline` owns every node of a V-S-V-...-V chain and keeps the structural invariants:
//! `segments == max(vertices - 1, 0)`, consistent cross-links, and every segment value
//! computed from its two current endpoints through [`Span`]. All structural edits go through
//! a single splice primitive that only creates segments at the (at most two) seams.

use crate::arena::{Arena, next_owner_id};
use crate::node::{SegmentId, SegmentNode, SegmentRef, VertexId, VertexNode, VertexRef};
use crate::{Result, TrackError};
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Segment values derived purely from the two vertices they span
pub trait Span<V> {
    fn span(prev: &V, next: &V) -> Self;
}

/// Vertex and segment counts
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Size {
    pub vertices: usize,
    pub segments: usize,
}

/// Outcome of a splice at slot level
pub(crate) struct Spliced<V, S> {
    /// The detached run as a standalone chain
    pub(crate) removed: Option<Polyline<V, S>>,
    /// First and last slot of the inserted run
    pub(crate) inserted: Option<(usize, usize)>,
}

impl<V, S> Spliced<V, S> {
    fn unchanged() -> Self {
        Self {
            removed: None,
            inserted: None,
        }
    }

    pub(crate) fn is_unchanged(&self) -> bool {
        self.removed.is_none() && self.inserted.is_none()
    }
}

/// Doubly linked chain of vertices alternating with the segments between them
pub struct Polyline<V, S> {
    owner: u32,
    pub(crate) vertices: Arena<VertexNode<V>>,
    pub(crate) segments: Arena<SegmentNode<S>>,
    pub(crate) first_vertex: Option<usize>,
    pub(crate) last_vertex: Option<usize>,
    pub(crate) first_segment: Option<usize>,
    pub(crate) last_segment: Option<usize>,
}

impl<V, S> Default for Polyline<V, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, S> Polyline<V, S> {
    /// Create an empty polyline with a fresh node identity
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(vertices: usize) -> Self {
        Self {
            owner: next_owner_id(),
            vertices: Arena::with_capacity(vertices),
            segments: Arena::with_capacity(vertices.saturating_sub(1)),
            first_vertex: None,
            last_vertex: None,
            first_segment: None,
            last_segment: None,
        }
    }

    pub(crate) fn vertex_id(&self, slot: usize) -> VertexId {
        let generation = self.vertices.generation(slot).unwrap_or_default();
        VertexId::new(self.owner, slot, generation)
    }

    pub(crate) fn segment_id(&self, slot: usize) -> SegmentId {
        let generation = self.segments.generation(slot).unwrap_or_default();
        SegmentId::new(self.owner, slot, generation)
    }

    /// Resolve a handle to a live slot of this polyline
    pub(crate) fn vertex_slot(&self, id: VertexId) -> Option<usize> {
        (id.owner() == self.owner
            && self.vertices.generation(id.slot()) == Some(id.generation()))
        .then(|| id.slot())
    }

    pub(crate) fn segment_slot(&self, id: SegmentId) -> Option<usize> {
        (id.owner() == self.owner
            && self.segments.generation(id.slot()) == Some(id.generation()))
        .then(|| id.slot())
    }

    /// Whether the handle refers to a live vertex of this polyline
    pub fn contains(&self, id: VertexId) -> bool {
        self.vertex_slot(id).is_some()
    }

    pub fn vertex(&self, id: VertexId) -> Option<VertexRef<'_, V, S>> {
        self.vertex_slot(id).map(|slot| VertexRef::new(self, slot))
    }

    pub fn segment(&self, id: SegmentId) -> Option<SegmentRef<'_, V, S>> {
        self.segment_slot(id).map(|slot| SegmentRef::new(self, slot))
    }

    pub fn first_vertex(&self) -> Option<VertexRef<'_, V, S>> {
        self.first_vertex.map(|slot| VertexRef::new(self, slot))
    }

    pub fn last_vertex(&self) -> Option<VertexRef<'_, V, S>> {
        self.last_vertex.map(|slot| VertexRef::new(self, slot))
    }

    pub fn first_segment(&self) -> Option<SegmentRef<'_, V, S>> {
        self.first_segment.map(|slot| SegmentRef::new(self, slot))
    }

    pub fn last_segment(&self) -> Option<SegmentRef<'_, V, S>> {
        self.last_segment.map(|slot| SegmentRef::new(self, slot))
    }

    #[inline]
    pub fn size(&self) -> Size {
        Size {
            vertices: self.vertices.len(),
            segments: self.segments.len(),
        }
    }

    /// Number of vertices
    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.first_vertex.is_none()
    }

    /// Vertices in path order
    pub fn iter(&self) -> Vertices<'_, V, S> {
        Vertices {
            polyline: self,
            next: self.first_vertex,
            remaining: self.vertices.len(),
        }
    }

    /// Segments in path order
    pub fn segments(&self) -> Segments<'_, V, S> {
        Segments {
            polyline: self,
            next: self.first_segment,
            remaining: self.segments.len(),
        }
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|vertex| vertex.value())
    }

    pub fn segment_values(&self) -> impl Iterator<Item = &S> + '_ {
        self.segments().map(|segment| segment.value())
    }

    /// Slots of all vertices matching the predicate, in path order
    pub(crate) fn slots_where(&self, mut predicate: impl FnMut(&V) -> bool) -> Vec<usize> {
        self.iter()
            .filter(|vertex| predicate(vertex.value()))
            .map(|vertex| vertex.slot())
            .collect()
    }

    /// Order two live slots by path position
    ///
    /// Walks forward from both at once so the cost is bounded by their distance.
    pub(crate) fn in_path_order(&self, a: usize, b: usize) -> (usize, usize) {
        let mut from_a = Some(a);
        let mut from_b = Some(b);
        loop {
            match from_a {
                Some(slot) if slot == b => return (a, b),
                Some(slot) => from_a = self.vertices[slot].next,
                None => return (b, a),
            }
            match from_b {
                Some(slot) if slot == a => return (b, a),
                Some(slot) => from_b = self.vertices[slot].next,
                None => return (a, b),
            }
        }
    }

    /// Check every structural invariant, walking the whole chain
    pub fn validate(&self) -> Result<()> {
        let size = self.size();
        if size.segments != size.vertices.saturating_sub(1) {
            return Err(TrackError::Invariant(format!(
                "{} vertices but {} segments",
                size.vertices, size.segments
            )));
        }

        let mut previous: Option<usize> = None;
        let mut cursor = self.first_vertex;
        let mut visited = 0usize;
        while let Some(slot) = cursor {
            let vertex = self
                .vertices
                .get(slot)
                .ok_or_else(|| TrackError::Invariant(format!("dead vertex slot {slot} linked")))?;
            if vertex.prev != previous {
                return Err(TrackError::Invariant(format!(
                    "vertex {slot} prev link {:?}, expected {previous:?}",
                    vertex.prev
                )));
            }
            match previous {
                None => {
                    if vertex.prev_seg.is_some() {
                        return Err(TrackError::Invariant(
                            "first vertex has a previous segment".to_string(),
                        ));
                    }
                }
                Some(prev_slot) => {
                    let seg_slot = vertex.prev_seg.ok_or_else(|| {
                        TrackError::Invariant(format!("interior vertex {slot} lacks prev segment"))
                    })?;
                    let segment = self.segments.get(seg_slot).ok_or_else(|| {
                        TrackError::Invariant(format!("dead segment slot {seg_slot} linked"))
                    })?;
                    let prev_vertex = &self.vertices[prev_slot];
                    if segment.prev_vert != prev_slot
                        || segment.next_vert != slot
                        || prev_vertex.next_seg != Some(seg_slot)
                    {
                        return Err(TrackError::Invariant(format!(
                            "segment {seg_slot} does not span vertices {prev_slot} and {slot}"
                        )));
                    }
                    if segment.prev != prev_vertex.prev_seg {
                        return Err(TrackError::Invariant(format!(
                            "segment {seg_slot} prev link out of sync"
                        )));
                    }
                }
            }
            if vertex.next.is_none() && vertex.next_seg.is_some() {
                return Err(TrackError::Invariant(
                    "last vertex has a next segment".to_string(),
                ));
            }
            visited += 1;
            if visited > size.vertices {
                return Err(TrackError::Invariant("vertex chain has a cycle".to_string()));
            }
            previous = Some(slot);
            cursor = vertex.next;
        }

        if visited != size.vertices {
            return Err(TrackError::Invariant(format!(
                "{visited} vertices reachable out of {}",
                size.vertices
            )));
        }
        if previous != self.last_vertex {
            return Err(TrackError::Invariant("last vertex out of sync".to_string()));
        }
        let expected_first_segment = self.first_vertex.and_then(|v| self.vertices[v].next_seg);
        let expected_last_segment = self.last_vertex.and_then(|v| self.vertices[v].prev_seg);
        if self.first_segment != expected_first_segment
            || self.last_segment != expected_last_segment
        {
            return Err(TrackError::Invariant("segment ends out of sync".to_string()));
        }

        let mut previous: Option<usize> = None;
        let mut cursor = self.first_segment;
        let mut visited = 0usize;
        while let Some(slot) = cursor {
            let segment = &self.segments[slot];
            if segment.prev != previous {
                return Err(TrackError::Invariant(format!(
                    "segment {slot} prev link {:?}, expected {previous:?}",
                    segment.prev
                )));
            }
            visited += 1;
            if visited > size.segments {
                return Err(TrackError::Invariant("segment chain has a cycle".to_string()));
            }
            previous = Some(slot);
            cursor = segment.next;
        }
        if visited != size.segments || previous != self.last_segment {
            return Err(TrackError::Invariant(format!(
                "{visited} segments reachable out of {}",
                size.segments
            )));
        }
        Ok(())
    }
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl<V, S: Span<V>> Polyline<V, S> {
    /// Build a chain from values in path order
    pub fn from_values(values: impl IntoIterator<Item = V>) -> Self {
        let values = values.into_iter();
        let mut polyline = Self::with_capacity(values.size_hint().0);
        for value in values {
            polyline.push_back(value);
        }
        polyline
    }

    pub fn push_back(&mut self, value: V) -> VertexId {
        let slot = self.vertices.insert(VertexNode::detached(value));
        let last = self.last_vertex;
        self.connect(last, Some(slot));
        self.connect(Some(slot), None);
        self.refresh_segment_ends();
        self.vertex_id(slot)
    }

    pub fn push_front(&mut self, value: V) -> VertexId {
        let slot = self.vertices.insert(VertexNode::detached(value));
        let first = self.first_vertex;
        self.connect(Some(slot), first);
        self.connect(None, Some(slot));
        self.refresh_segment_ends();
        self.vertex_id(slot)
    }

    /// Detach the inclusive run `first..=last`, joining its neighbours with a new segment
    ///
    /// `last` may precede `first`; the run is taken in path order either way.
    pub fn remove_range(&mut self, first: VertexId, last: VertexId) -> Option<Self> {
        let (first, last) = self.in_path_order(self.vertex_slot(first)?, self.vertex_slot(last)?);
        let prev = self.vertices[first].prev;
        let next = self.vertices[last].next;
        self.splice(prev, next, None).removed
    }

    /// Move every vertex of `chain` in after `anchor`; returns the number moved in
    pub fn insert_after(&mut self, anchor: VertexId, chain: Self) -> usize {
        let Some(anchor) = self.vertex_slot(anchor) else {
            return 0;
        };
        let count = chain.len();
        let next = self.vertices[anchor].next;
        self.splice(Some(anchor), next, Some(chain));
        count
    }

    /// Move every vertex of `chain` in before `anchor`; returns the number moved in
    pub fn insert_before(&mut self, anchor: VertexId, chain: Self) -> usize {
        let Some(anchor) = self.vertex_slot(anchor) else {
            return 0;
        };
        let count = chain.len();
        let prev = self.vertices[anchor].prev;
        self.splice(prev, Some(anchor), Some(chain));
        count
    }

    /// Cut the chain after `at`, returning everything that followed it
    pub fn split_after(&mut self, at: VertexId) -> Option<Self> {
        let at = self.vertex_slot(at)?;
        self.splice(Some(at), None, None).removed
    }

    /// Recompute every segment from its current endpoints
    pub fn recompute_segments(&mut self) {
        let mut cursor = self.first_segment;
        while let Some(slot) = cursor {
            let (prev_vert, next_vert) = {
                let segment = &self.segments[slot];
                (segment.prev_vert, segment.next_vert)
            };
            let value = S::span(
                &self.vertices[prev_vert].value,
                &self.vertices[next_vert].value,
            );
            let segment = &mut self.segments[slot];
            segment.value = value;
            cursor = segment.next;
        }
    }

    /// Replace the vertices strictly between `prev` and `next` with the vertices of `insert`
    ///
    /// `None` for `prev` means "before the head", `None` for `next` "after the tail";
    /// `next` must be reachable from `prev`, and equal bounds leave the chain untouched. Only the seam segments are created; the moved
    /// nodes keep their values.
    pub(crate) fn splice(
        &mut self,
        prev: Option<usize>,
        next: Option<usize>,
        insert: Option<Self>,
    ) -> Spliced<V, S> {
        if prev.is_some() && prev == next {
            return Spliced::unchanged();
        }
        let first_removed = match prev {
            Some(p) => self.vertices[p].next,
            None => self.first_vertex,
        };
        let removed_range = match first_removed {
            Some(first) if Some(first) != next => {
                let last = match next {
                    Some(n) => self.vertices[n].prev,
                    None => self.last_vertex,
                };
                last.map(|last| (first, last))
            }
            _ => None,
        };
        let insert = insert.filter(|chain| !chain.is_empty());
        if removed_range.is_none() && insert.is_none() {
            return Spliced::unchanged();
        }

        // The old seam segments go away, they get recreated against the new neighbours
        if let Some(p) = prev {
            if let Some(seg) = self.vertices[p].next_seg.take() {
                self.segments.remove(seg);
            }
        }
        if let Some(n) = next {
            let seg = self.vertices[n].prev_seg.take();
            if let (Some(seg), Some(_)) = (seg, removed_range) {
                self.segments.remove(seg);
            }
        }

        let removed = removed_range.map(|(first, last)| {
            let mut detached = Self::new();
            let (new_first, new_last) = self.move_chain(first, last, &mut detached);
            detached.first_vertex = Some(new_first);
            detached.last_vertex = Some(new_last);
            detached.refresh_segment_ends();
            detached
        });

        let inserted = insert.map(|mut chain| {
            let (first, last) = match (chain.first_vertex, chain.last_vertex) {
                (Some(first), Some(last)) => (first, last),
                _ => unreachable!("empty chains are filtered out"),
            };
            chain.move_chain(first, last, self)
        });

        match inserted {
            Some((first, last)) => {
                self.connect(prev, Some(first));
                self.connect(Some(last), next);
            }
            None => self.connect(prev, next),
        }
        self.refresh_segment_ends();

        Spliced { removed, inserted }
    }

    /// Join two vertices (or close an end when one side is `None`)
    fn connect(&mut self, a: Option<usize>, b: Option<usize>) {
        match (a, b) {
            (Some(a), Some(b)) => {
                let value = S::span(&self.vertices[a].value, &self.vertices[b].value);
                let prev_seg = self.vertices[a].prev_seg;
                let next_seg = self.vertices[b].next_seg;
                let seg = self.segments.insert(SegmentNode {
                    value,
                    prev: prev_seg,
                    next: next_seg,
                    prev_vert: a,
                    next_vert: b,
                });
                if let Some(p) = prev_seg {
                    self.segments[p].next = Some(seg);
                }
                if let Some(n) = next_seg {
                    self.segments[n].prev = Some(seg);
                }
                let vertex_a = &mut self.vertices[a];
                vertex_a.next = Some(b);
                vertex_a.next_seg = Some(seg);
                let vertex_b = &mut self.vertices[b];
                vertex_b.prev = Some(a);
                vertex_b.prev_seg = Some(seg);
            }
            (Some(a), None) => {
                let vertex = &mut self.vertices[a];
                vertex.next = None;
                vertex.next_seg = None;
                if let Some(p) = vertex.prev_seg {
                    self.segments[p].next = None;
                }
                self.last_vertex = Some(a);
            }
            (None, Some(b)) => {
                let vertex = &mut self.vertices[b];
                vertex.prev = None;
                vertex.prev_seg = None;
                if let Some(n) = vertex.next_seg {
                    self.segments[n].prev = None;
                }
                self.first_vertex = Some(b);
            }
            (None, None) => {
                self.first_vertex = None;
                self.last_vertex = None;
            }
        }
    }
}

impl<V, S> Polyline<V, S> {
    fn refresh_segment_ends(&mut self) {
        self.first_segment = self.first_vertex.and_then(|v| self.vertices[v].next_seg);
        self.last_segment = self.last_vertex.and_then(|v| self.vertices[v].prev_seg);
    }

    /// Move the run `first..=last` and the segments inside it into `dst`
    ///
    /// The moved run is left unattached in `dst` (open ends); the segments bordering the
    /// run in `self` are not touched and must be dealt with by the caller.
    fn move_chain(&mut self, first: usize, last: usize, dst: &mut Self) -> (usize, usize) {
        let mut cursor = first;
        let mut prev_new: Option<usize> = None;
        let mut pending_seg: Option<usize> = None;
        let mut first_new: Option<usize> = None;
        loop {
            let node = match self.vertices.remove(cursor) {
                Some(node) => node,
                None => panic!("moving dead vertex slot {cursor}"),
            };
            let slot = dst.vertices.insert(VertexNode {
                value: node.value,
                prev: prev_new,
                next: None,
                prev_seg: pending_seg,
                next_seg: None,
            });
            if let Some(p) = prev_new {
                dst.vertices[p].next = Some(slot);
            }
            if let Some(seg) = pending_seg {
                dst.segments[seg].next_vert = slot;
            }
            first_new.get_or_insert(slot);
            prev_new = Some(slot);
            if cursor == last {
                break;
            }

            let (Some(next_vertex), Some(seg_slot)) = (node.next, node.next_seg) else {
                panic!("run ended before reaching slot {last}");
            };
            let segment = match self.segments.remove(seg_slot) {
                Some(segment) => segment,
                None => panic!("moving dead segment slot {seg_slot}"),
            };
            let new_seg = dst.segments.insert(SegmentNode {
                value: segment.value,
                prev: dst.vertices[slot].prev_seg,
                next: None,
                prev_vert: slot,
                // Patched once the next vertex lands
                next_vert: slot,
            });
            if let Some(prev_seg) = dst.vertices[slot].prev_seg {
                dst.segments[prev_seg].next = Some(new_seg);
            }
            dst.vertices[slot].next_seg = Some(new_seg);
            pending_seg = Some(new_seg);
            cursor = next_vertex;
        }
        match (first_new, prev_new) {
            (Some(first), Some(last)) => (first, last),
            _ => unreachable!("at least one vertex is moved"),
        }
    }
}

impl<V: Clone, S: Clone> Polyline<V, S> {
    /// Deep copy of the inclusive run `first..=last` (path order assumed)
    pub(crate) fn clone_range(&self, first: usize, last: usize) -> Self {
        let mut copy = Self::new();
        let mut cursor = first;
        let mut prev_new: Option<usize> = None;
        loop {
            let node = &self.vertices[cursor];
            let slot = copy
                .vertices
                .insert(VertexNode::detached(node.value.clone()));
            if let Some(p) = prev_new {
                let prev_seg = copy.vertices[p].prev_seg;
                let seg_value = match self.vertices[cursor].prev_seg {
                    Some(seg) => self.segments[seg].value.clone(),
                    None => panic!("interior vertex {cursor} lacks prev segment"),
                };
                let seg = copy.segments.insert(SegmentNode {
                    value: seg_value,
                    prev: prev_seg,
                    next: None,
                    prev_vert: p,
                    next_vert: slot,
                });
                if let Some(prev_seg) = prev_seg {
                    copy.segments[prev_seg].next = Some(seg);
                }
                copy.vertices[p].next = Some(slot);
                copy.vertices[p].next_seg = Some(seg);
                let vertex = &mut copy.vertices[slot];
                vertex.prev = Some(p);
                vertex.prev_seg = Some(seg);
            } else {
                copy.first_vertex = Some(slot);
            }
            prev_new = Some(slot);
            if cursor == last {
                break;
            }
            cursor = match node.next {
                Some(next) => next,
                None => panic!("run ended before reaching slot {last}"),
            };
        }
        copy.last_vertex = prev_new;
        copy.refresh_segment_ends();
        copy
    }
}

impl<V: Clone, S: Clone> Clone for Polyline<V, S> {
    /// Deep copy with a new node identity; handles into the source do not resolve here
    fn clone(&self) -> Self {
        Self {
            owner: next_owner_id(),
            vertices: self.vertices.clone(),
            segments: self.segments.clone(),
            first_vertex: self.first_vertex,
            last_vertex: self.last_vertex,
            first_segment: self.first_segment,
            last_segment: self.last_segment,
        }
    }
}

/// Value equality over the vertex sequence; node identity is ignored
impl<V: PartialEq, S> PartialEq for Polyline<V, S> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.values().eq(other.values())
    }
}

impl<V: fmt::Debug, S> fmt::Debug for Polyline<V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.values()).finish()
    }
}

/// Iterator over vertices in path order
pub struct Vertices<'a, V, S> {
    polyline: &'a Polyline<V, S>,
    next: Option<usize>,
    remaining: usize,
}

impl<'a, V, S> Iterator for Vertices<'a, V, S> {
    type Item = VertexRef<'a, V, S>;

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.next?;
        self.next = self.polyline.vertices[slot].next;
        self.remaining = self.remaining.saturating_sub(1);
        Some(VertexRef::new(self.polyline, slot))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

/// Iterator over segments in path order
pub struct Segments<'a, V, S> {
    polyline: &'a Polyline<V, S>,
    next: Option<usize>,
    remaining: usize,
}

impl<'a, V, S> Iterator for Segments<'a, V, S> {
    type Item = SegmentRef<'a, V, S>;

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.next?;
        self.next = self.polyline.segments[slot].next;
        self.remaining = self.remaining.saturating_sub(1);
        Some(SegmentRef::new(self.polyline, slot))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}
