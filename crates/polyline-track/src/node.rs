//! Vertex and segment nodes of the alternating V-S-V chain
//!
//! Nodes link to their neighbours through arena slots. Outside the crate they are only
//! visible through the borrowed [`VertexRef`] / [`SegmentRef`] cursors.

use crate::arena::NodeId;
use crate::polyline::Polyline;

/// Marker for vertex handles
#[derive(Debug)]
pub enum VertexKind {}

/// Marker for segment handles
#[derive(Debug)]
pub enum SegmentKind {}

/// Handle to a vertex node of a specific polyline
pub type VertexId = NodeId<VertexKind>;

/// Handle to a segment node of a specific polyline
pub type SegmentId = NodeId<SegmentKind>;

/// A vertex: owns its value, links to neighbouring vertices and bordering segments
#[derive(Clone, Debug)]
pub(crate) struct VertexNode<V> {
    pub(crate) value: V,
    pub(crate) prev: Option<usize>,
    pub(crate) next: Option<usize>,
    pub(crate) prev_seg: Option<usize>,
    pub(crate) next_seg: Option<usize>,
}

impl<V> VertexNode<V> {
    pub(crate) fn detached(value: V) -> Self {
        Self {
            value,
            prev: None,
            next: None,
            prev_seg: None,
            next_seg: None,
        }
    }
}

/// A segment: owns its value, links to neighbouring segments and the two spanned vertices
#[derive(Clone, Debug)]
pub(crate) struct SegmentNode<S> {
    pub(crate) value: S,
    pub(crate) prev: Option<usize>,
    pub(crate) next: Option<usize>,
    pub(crate) prev_vert: usize,
    pub(crate) next_vert: usize,
}

/// Borrowed cursor over a live vertex
pub struct VertexRef<'a, V, S> {
    polyline: &'a Polyline<V, S>,
    slot: usize,
}

// Manual impls avoid `V: Clone` / `S: Clone` bounds.
impl<V, S> Clone for VertexRef<'_, V, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V, S> Copy for VertexRef<'_, V, S> {}

impl<'a, V, S> VertexRef<'a, V, S> {
    pub(crate) fn new(polyline: &'a Polyline<V, S>, slot: usize) -> Self {
        Self { polyline, slot }
    }

    #[inline]
    fn node(&self) -> &'a VertexNode<V> {
        &self.polyline.vertices[self.slot]
    }

    #[inline]
    pub(crate) fn slot(&self) -> usize {
        self.slot
    }

    /// Handle that can be used to address this vertex later
    pub fn id(&self) -> VertexId {
        self.polyline.vertex_id(self.slot)
    }

    pub fn value(&self) -> &'a V {
        &self.node().value
    }

    pub fn prev(&self) -> Option<VertexRef<'a, V, S>> {
        self.node().prev.map(|slot| VertexRef::new(self.polyline, slot))
    }

    pub fn next(&self) -> Option<VertexRef<'a, V, S>> {
        self.node().next.map(|slot| VertexRef::new(self.polyline, slot))
    }

    /// Segment ending at this vertex, `None` on the head
    pub fn prev_segment(&self) -> Option<SegmentRef<'a, V, S>> {
        self.node()
            .prev_seg
            .map(|slot| SegmentRef::new(self.polyline, slot))
    }

    /// Segment starting at this vertex, `None` on the tail
    pub fn next_segment(&self) -> Option<SegmentRef<'a, V, S>> {
        self.node()
            .next_seg
            .map(|slot| SegmentRef::new(self.polyline, slot))
    }

    pub fn is_first(&self) -> bool {
        self.node().prev.is_none()
    }

    pub fn is_last(&self) -> bool {
        self.node().next.is_none()
    }
}

/// Borrowed cursor over a live segment
pub struct SegmentRef<'a, V, S> {
    polyline: &'a Polyline<V, S>,
    slot: usize,
}

impl<V, S> Clone for SegmentRef<'_, V, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V, S> Copy for SegmentRef<'_, V, S> {}

impl<'a, V, S> SegmentRef<'a, V, S> {
    pub(crate) fn new(polyline: &'a Polyline<V, S>, slot: usize) -> Self {
        Self { polyline, slot }
    }

    #[inline]
    fn node(&self) -> &'a SegmentNode<S> {
        &self.polyline.segments[self.slot]
    }

    pub fn id(&self) -> SegmentId {
        self.polyline.segment_id(self.slot)
    }

    pub fn value(&self) -> &'a S {
        &self.node().value
    }

    pub fn prev(&self) -> Option<SegmentRef<'a, V, S>> {
        self.node().prev.map(|slot| SegmentRef::new(self.polyline, slot))
    }

    pub fn next(&self) -> Option<SegmentRef<'a, V, S>> {
        self.node().next.map(|slot| SegmentRef::new(self.polyline, slot))
    }

    /// Vertex this segment starts at
    pub fn prev_vertex(&self) -> VertexRef<'a, V, S> {
        VertexRef::new(self.polyline, self.node().prev_vert)
    }

    /// Vertex this segment ends at
    pub fn next_vertex(&self) -> VertexRef<'a, V, S> {
        VertexRef::new(self.polyline, self.node().next_vert)
    }
}
