//! Timestamp-indexed track engine with seam-limited recomputation

use crate::node::{VertexId, VertexRef};
use crate::point::{PathProperties, PointInTime, TimeRange};
use crate::polyline::{Polyline, Size, Spliced, Vertices};
use crate::segment::SegmentValue;
use crate::target::Target;
use crate::time_index::TimeIndex;
use crate::{Result, TrackError};
use std::fmt;
use tracing::{debug, trace};

pub(crate) type Chain = Polyline<PointInTime, SegmentValue>;

/// Items to splice into a track
///
/// Point lists are first built into a sub-track with a full property pass. A whole track is
/// moved in as-is, keeping its interior values.
#[derive(Clone, Debug)]
pub enum Insertion {
    Point(PointInTime),
    Points(Vec<PointInTime>),
    Track(PolylineTrack),
}

impl Insertion {
    fn into_chain(self) -> Chain {
        match self {
            Insertion::Point(point) => PolylineTrack::new([point]).polyline,
            Insertion::Points(points) => PolylineTrack::new(points).polyline,
            Insertion::Track(track) => track.polyline,
        }
    }
}

impl From<PointInTime> for Insertion {
    fn from(point: PointInTime) -> Self {
        Insertion::Point(point)
    }
}

impl From<Vec<PointInTime>> for Insertion {
    fn from(points: Vec<PointInTime>) -> Self {
        Insertion::Points(points)
    }
}

impl From<PolylineTrack> for Insertion {
    fn from(track: PolylineTrack) -> Self {
        Insertion::Track(track)
    }
}

/// Outcome of a replace operation
#[derive(Clone, Debug, PartialEq)]
pub struct Replacement {
    /// The detached run, possibly empty
    pub removed: PolylineTrack,
    /// Number of vertices spliced in
    pub inserted: usize,
}

/// A GPS track as an alternating chain of points and segments
///
/// Every segment value is derived from its two endpoints and every point's
/// [`PathProperties`] from its bordering segments. Construction runs one full pass; every
/// edit afterwards only repairs the vertices bordering the edited range.
#[derive(Default)]
pub struct PolylineTrack {
    pub(crate) polyline: Chain,
    pub(crate) index: TimeIndex,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl PolylineTrack {
    /// Build a track from points in path order and compute all derived values
    pub fn new(points: impl IntoIterator<Item = PointInTime>) -> Self {
        #[cfg(feature = "profiling")]
        profiling::scope!("polyline_track::new");

        let mut track = Self::from_chain(Chain::from_values(points));
        track.add_properties();
        track
    }

    /// Adopt a chain whose interior values are current, repairing its two ends
    pub(crate) fn from_chain(polyline: Chain) -> Self {
        let index = TimeIndex::build(&polyline);
        let mut track = Self { polyline, index };
        if let Some(first) = track.polyline.first_vertex {
            track.repair_vertex(first);
        }
        if let Some(last) = track.polyline.last_vertex {
            track.repair_vertex(last);
        }
        track
    }

    /// Recompute every segment and then every point's path properties
    pub fn add_properties(&mut self) {
        #[cfg(feature = "profiling")]
        profiling::scope!("polyline_track::add_properties");

        self.polyline.recompute_segments();
        let mut cursor = self.polyline.first_vertex;
        while let Some(slot) = cursor {
            self.repair_vertex(slot);
            cursor = self.polyline.vertices[slot].next;
        }
    }

    /// Recompute only the elevation-derived fields of segments and points
    ///
    /// Fields whose inputs are missing are reset to absent.
    pub fn add_elevation_properties(&mut self) {
        #[cfg(feature = "profiling")]
        profiling::scope!("polyline_track::add_elevation_properties");

        let polyline = &mut self.polyline;
        let mut cursor = polyline.first_segment;
        while let Some(slot) = cursor {
            let segment = &mut polyline.segments[slot];
            let prev = &polyline.vertices[segment.prev_vert].value;
            let next = &polyline.vertices[segment.next_vert].value;
            segment.value.refresh_elevation(prev, next);
            cursor = segment.next;
        }

        let mut cursor = polyline.first_vertex;
        while let Some(slot) = cursor {
            let (prev, next) = self.bordering_segments(slot);
            let node = &mut self.polyline.vertices[slot];
            let path = match node.value.path() {
                Some(path) => Some(path.with_elevation_from(prev.as_ref(), next.as_ref())),
                None => PathProperties::from_segments(prev.as_ref(), next.as_ref()),
            };
            node.value.set_path(path);
            cursor = node.next;
        }
    }

    // --- Queries ---

    /// Number of points
    #[inline]
    pub fn len(&self) -> usize {
        self.polyline.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.polyline.is_empty()
    }

    #[inline]
    pub fn size(&self) -> Size {
        self.polyline.size()
    }

    /// The underlying chain, for read-only traversal
    #[inline]
    pub fn polyline(&self) -> &Polyline<PointInTime, SegmentValue> {
        &self.polyline
    }

    /// Point views in path order
    pub fn iter(&self) -> Vertices<'_, PointInTime, SegmentValue> {
        self.polyline.iter()
    }

    /// Copy of all points in path order
    pub fn vertices(&self) -> Vec<PointInTime> {
        self.polyline.values().cloned().collect()
    }

    /// Copy of all segment values in path order
    pub fn segments(&self) -> Vec<SegmentValue> {
        self.polyline.segment_values().copied().collect()
    }

    pub fn first_vertex(&self) -> Option<VertexRef<'_, PointInTime, SegmentValue>> {
        self.polyline.first_vertex()
    }

    pub fn last_vertex(&self) -> Option<VertexRef<'_, PointInTime, SegmentValue>> {
        self.polyline.last_vertex()
    }

    pub fn vertex(&self, id: VertexId) -> Option<VertexRef<'_, PointInTime, SegmentValue>> {
        self.polyline.vertex(id)
    }

    /// The point carrying `timestamp` (the first in path order if several do)
    pub fn vertex_node_by_time(
        &self,
        timestamp: &str,
    ) -> Option<VertexRef<'_, PointInTime, SegmentValue>> {
        self.index
            .get(timestamp, &self.polyline)
            .map(|slot| VertexRef::new(&self.polyline, slot))
    }

    /// All points equal to `point`, in path order
    pub fn vertex_nodes_by_point(
        &self,
        point: &PointInTime,
    ) -> Vec<VertexRef<'_, PointInTime, SegmentValue>> {
        self.vertex_nodes_by(|value| value == point)
    }

    /// All points matching `predicate`, in path order
    pub fn vertex_nodes_by(
        &self,
        predicate: impl FnMut(&PointInTime) -> bool,
    ) -> Vec<VertexRef<'_, PointInTime, SegmentValue>> {
        self.polyline
            .slots_where(predicate)
            .into_iter()
            .map(|slot| VertexRef::new(&self.polyline, slot))
            .collect()
    }

    /// Timestamps of the first and last point
    pub fn time_range(&self) -> Option<TimeRange> {
        let first = self.polyline.first_vertex()?;
        let last = self.polyline.last_vertex()?;
        Some(TimeRange::new(
            first.value().timestamp(),
            last.value().timestamp(),
        ))
    }

    /// Sum of all segment lengths in meters
    pub fn total_length(&self) -> f64 {
        self.polyline.segment_values().map(|s| s.length).sum()
    }

    /// Seconds from the first to the last point, if both timestamps parse
    pub fn total_duration(&self) -> Option<f64> {
        let first = self.polyline.first_vertex()?;
        let last = self.polyline.last_vertex()?;
        first.value().seconds_until(last.value())
    }

    /// Check the chain structure, the timestamp index and every derived value
    pub fn validate(&self) -> Result<()> {
        self.polyline.validate()?;

        for vertex in self.polyline.iter() {
            let timestamp = vertex.value().timestamp();
            let found = self
                .index
                .get(timestamp, &self.polyline)
                .map(|slot| self.polyline.vertices[slot].value.timestamp());
            if found != Some(timestamp) {
                return Err(TrackError::Invariant(format!(
                    "timestamp {timestamp} missing from the index"
                )));
            }

            let prev = vertex.prev_segment().map(|s| *s.value());
            let next = vertex.next_segment().map(|s| *s.value());
            let expected = PathProperties::from_segments(prev.as_ref(), next.as_ref());
            if vertex.value().path() != expected.as_ref() {
                return Err(TrackError::Invariant(format!(
                    "stale path properties at {timestamp}"
                )));
            }
        }

        for segment in self.polyline.segments() {
            let expected = SegmentValue::between(
                segment.prev_vertex().value(),
                segment.next_vertex().value(),
            );
            if *segment.value() != expected {
                return Err(TrackError::Invariant(format!(
                    "stale segment ending at {}",
                    segment.next_vertex().value().timestamp()
                )));
            }
        }
        Ok(())
    }

    // --- Trim ---

    /// Remove every point before `target`, returning them as a track
    pub fn trim_before<'a>(&mut self, target: impl Into<Target<'a>>) -> Option<PolylineTrack> {
        let slot = self.resolve(target.into())?;
        self.detach(None, Some(slot))
    }

    /// Remove every point after `target`, returning them as a track
    pub fn trim_after<'a>(&mut self, target: impl Into<Target<'a>>) -> Option<PolylineTrack> {
        let slot = self.resolve(target.into())?;
        self.detach(Some(slot), None)
    }

    /// Keep only `start..=end`; an absent bound leaves that end untouched
    ///
    /// Returns what was trimmed from the front and from the back.
    pub fn trim_to(
        &mut self,
        start: Option<Target<'_>>,
        end: Option<Target<'_>>,
    ) -> (Option<PolylineTrack>, Option<PolylineTrack>) {
        let before = start.and_then(|start| self.trim_before(start));
        let after = end.and_then(|end| self.trim_after(end));
        (before, after)
    }

    // --- Remove ---

    /// Remove a single point
    pub fn remove_at<'a>(&mut self, target: impl Into<Target<'a>>) -> Option<PointInTime> {
        let slot = self.resolve(target.into())?;
        let (prev, next) = self.neighbours(slot);
        let removed = self.detach(prev, next)?;
        removed.first_vertex().map(|vertex| vertex.value().clone())
    }

    /// Remove every point addressed by `targets`, skipping misses
    ///
    /// A point target removes every equal point.
    pub fn remove_at_any<'a, T>(&mut self, targets: impl IntoIterator<Item = T>) -> Vec<PointInTime>
    where
        T: Into<Target<'a>>,
    {
        let mut removed = Vec::new();
        for target in targets {
            for slot in self.resolve_all(target.into()) {
                // Removing a point frees only its own slot, the other matches stay live
                let (prev, next) = self.neighbours(slot);
                if let Some(chain) = self.detach(prev, next) {
                    removed.extend(chain.polyline.values().cloned());
                }
            }
        }
        removed
    }

    /// Remove the points strictly between `a` and `b` (in either order)
    pub fn remove_between<'a, 'b>(
        &mut self,
        a: impl Into<Target<'a>>,
        b: impl Into<Target<'b>>,
    ) -> Option<PolylineTrack> {
        let a = self.resolve(a.into())?;
        let b = self.resolve(b.into())?;
        let (first, last) = self.polyline.in_path_order(a, b);
        self.detach(Some(first), Some(last))
    }

    /// Remove the points from `a` to `b` inclusive; an absent bound means that end
    pub fn remove_from_to(
        &mut self,
        a: Option<Target<'_>>,
        b: Option<Target<'_>>,
    ) -> Option<PolylineTrack> {
        let (first, last) = self.inclusive_range(a, b)?;
        let prev = self.neighbours(first).0;
        let next = self.neighbours(last).1;
        self.detach(prev, next)
    }

    // --- Insert ---

    /// Splice `items` in before `target`; returns the number of points inserted
    pub fn insert_before<'a>(
        &mut self,
        target: impl Into<Target<'a>>,
        items: impl Into<Insertion>,
    ) -> usize {
        let Some(slot) = self.resolve(target.into()) else {
            return 0;
        };
        let prev = self.polyline.vertices[slot].prev;
        self.attach(prev, Some(slot), items.into())
    }

    /// Splice `items` in after `target`; returns the number of points inserted
    pub fn insert_after<'a>(
        &mut self,
        target: impl Into<Target<'a>>,
        items: impl Into<Insertion>,
    ) -> usize {
        let Some(slot) = self.resolve(target.into()) else {
            return 0;
        };
        let next = self.polyline.vertices[slot].next;
        self.attach(Some(slot), next, items.into())
    }

    /// Splice `items` in after the last point
    pub fn append(&mut self, items: impl Into<Insertion>) -> usize {
        let last = self.polyline.last_vertex;
        self.attach(last, None, items.into())
    }

    // --- Replace ---

    /// Replace a single point with `items`
    pub fn replace_at<'a>(
        &mut self,
        target: impl Into<Target<'a>>,
        items: impl Into<Insertion>,
    ) -> Option<Replacement> {
        let slot = self.resolve(target.into())?;
        let (prev, next) = self.neighbours(slot);
        self.replace(prev, next, items.into())
    }

    /// Replace the points strictly between `a` and `b` (possibly none) with `items`
    ///
    /// An absent bound opens the range to that end of the track.
    pub fn replace_between(
        &mut self,
        a: Option<Target<'_>>,
        b: Option<Target<'_>>,
        items: impl Into<Insertion>,
    ) -> Option<Replacement> {
        let (prev, next) = match (a, b) {
            (None, None) => return None,
            (Some(a), None) => (Some(self.resolve(a)?), None),
            (None, Some(b)) => (None, Some(self.resolve(b)?)),
            (Some(a), Some(b)) => {
                let (first, last) = self
                    .polyline
                    .in_path_order(self.resolve(a)?, self.resolve(b)?);
                (Some(first), Some(last))
            }
        };
        self.replace(prev, next, items.into())
    }

    /// Replace the points from `a` to `b` inclusive with `items`
    pub fn replace_from_to(
        &mut self,
        a: Option<Target<'_>>,
        b: Option<Target<'_>>,
        items: impl Into<Insertion>,
    ) -> Option<Replacement> {
        let (first, last) = self.inclusive_range(a, b)?;
        let prev = self.neighbours(first).0;
        let next = self.neighbours(last).1;
        self.replace(prev, next, items.into())
    }

    // --- Internals ---

    /// Slot addressed by `target` (the first match for points)
    pub(crate) fn resolve(&self, target: Target<'_>) -> Option<usize> {
        let slot = match target {
            Target::Time(timestamp) => self.index.get(timestamp, &self.polyline),
            Target::Point(point) => self
                .polyline
                .iter()
                .find(|vertex| vertex.value() == point)
                .map(|vertex| vertex.slot()),
            Target::Vertex(id) => self.polyline.vertex_slot(id),
        };
        if slot.is_none() {
            trace!(?target, "target not found");
        }
        slot
    }

    fn resolve_all(&self, target: Target<'_>) -> Vec<usize> {
        match target {
            Target::Point(point) => self.polyline.slots_where(|value| value == point),
            other => self.resolve(other).into_iter().collect(),
        }
    }

    /// Inclusive run between two optional bounds, in path order
    fn inclusive_range(
        &self,
        a: Option<Target<'_>>,
        b: Option<Target<'_>>,
    ) -> Option<(usize, usize)> {
        if a.is_none() && b.is_none() {
            return None;
        }
        let first = match a {
            Some(a) => self.resolve(a)?,
            None => self.polyline.first_vertex?,
        };
        let last = match b {
            Some(b) => self.resolve(b)?,
            None => self.polyline.last_vertex?,
        };
        Some(self.polyline.in_path_order(first, last))
    }

    fn detach(&mut self, prev: Option<usize>, next: Option<usize>) -> Option<PolylineTrack> {
        let removed = self.splice_at(prev, next, None).removed?;
        Some(PolylineTrack::from_chain(removed))
    }

    fn attach(&mut self, prev: Option<usize>, next: Option<usize>, items: Insertion) -> usize {
        let chain = items.into_chain();
        let count = chain.len();
        self.splice_at(prev, next, Some(chain));
        count
    }

    fn replace(
        &mut self,
        prev: Option<usize>,
        next: Option<usize>,
        items: Insertion,
    ) -> Option<Replacement> {
        let chain = items.into_chain();
        let inserted = chain.len();
        let spliced = self.splice_at(prev, next, Some(chain));
        if spliced.is_unchanged() {
            return None;
        }
        Some(Replacement {
            removed: spliced
                .removed
                .map(PolylineTrack::from_chain)
                .unwrap_or_default(),
            inserted,
        })
    }

    /// Splice the chain, then bring the index and the seam values up to date
    pub(crate) fn splice_at(
        &mut self,
        prev: Option<usize>,
        next: Option<usize>,
        insert: Option<Chain>,
    ) -> Spliced<PointInTime, SegmentValue> {
        let spliced = self.polyline.splice(prev, next, insert);
        if spliced.is_unchanged() {
            trace!(?prev, ?next, "splice left the track unchanged");
            return spliced;
        }

        if let Some(removed) = &spliced.removed {
            for point in removed.values() {
                self.index.prune(point.timestamp(), &self.polyline);
            }
        }
        let mut seam = [prev, next, None, None];
        if let Some((first, last)) = spliced.inserted {
            let mut cursor = Some(first);
            while let Some(slot) = cursor {
                let id = self.polyline.vertex_id(slot);
                self.index
                    .insert(self.polyline.vertices[slot].value.timestamp(), id);
                cursor = (slot != last)
                    .then(|| self.polyline.vertices[slot].next)
                    .flatten();
            }
            seam[2] = Some(first);
            seam[3] = Some(last);
        }
        for slot in seam.into_iter().flatten() {
            self.repair_vertex(slot);
        }

        debug!(
            removed = spliced.removed.as_ref().map_or(0, |r| r.len()),
            inserted = spliced.inserted.is_some(),
            vertices = self.polyline.len(),
            "spliced track"
        );
        spliced
    }

    #[inline]
    fn neighbours(&self, slot: usize) -> (Option<usize>, Option<usize>) {
        let node = &self.polyline.vertices[slot];
        (node.prev, node.next)
    }

    fn bordering_segments(&self, slot: usize) -> (Option<SegmentValue>, Option<SegmentValue>) {
        let node = &self.polyline.vertices[slot];
        (
            node.prev_seg.map(|seg| self.polyline.segments[seg].value),
            node.next_seg.map(|seg| self.polyline.segments[seg].value),
        )
    }

    /// Recompute one point's path properties from its current bordering segments
    fn repair_vertex(&mut self, slot: usize) {
        let (prev, next) = self.bordering_segments(slot);
        let path = PathProperties::from_segments(prev.as_ref(), next.as_ref());
        self.polyline.vertices[slot].value.set_path(path);
    }
}

impl Clone for PolylineTrack {
    /// Deep copy; handles into the source do not resolve in the copy
    fn clone(&self) -> Self {
        let polyline = self.polyline.clone();
        let index = TimeIndex::build(&polyline);
        Self { polyline, index }
    }
}

impl PartialEq for PolylineTrack {
    fn eq(&self, other: &Self) -> bool {
        self.polyline == other.polyline
    }
}

impl fmt::Debug for PolylineTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolylineTrack")
            .field("points", &self.polyline)
            .finish()
    }
}

impl FromIterator<PointInTime> for PolylineTrack {
    fn from_iter<I: IntoIterator<Item = PointInTime>>(iter: I) -> Self {
        Self::new(iter)
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::geometry::{Latitudinal, Longitudinal};

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-6,
            "expected {expected}, got {actual}"
        );
    }

    fn snapshot(track: &PolylineTrack) -> (Vec<Option<PathProperties>>, Vec<SegmentValue>) {
        (
            track.iter().map(|v| v.value().path().copied()).collect(),
            track.segments(),
        )
    }

    #[test]
    fn test_add_properties_values() {
        let track = track();
        track.validate().unwrap();
        assert_eq!(
            track.size(),
            Size {
                vertices: 6,
                segments: 5
            }
        );

        let segments = track.segments();
        let second = &segments[1];
        assert_close(second.length, 18.721455141738108);
        assert_eq!(second.duration, Some(11.0));
        assert_close(second.speed.unwrap(), 1.701950467430737);
        assert_close(second.angle, 0.9348428553767313);
        assert_eq!(second.direction.lat, Latitudinal::N);
        assert_eq!(second.direction.lng, Longitudinal::E);
        assert_eq!(second.height, Some(-1.0));

        let points = track.vertices();
        let path = points[1].path().unwrap();
        assert_close(path.speed.unwrap(), 1.643513617701334);
        assert_close(path.rotation.unwrap(), 0.14156439778370578);
        assert_close(path.rotation_rate.unwrap(), 0.009133186953787469);
        assert_close(path.ascent_rate.unwrap(), 0.1);
        assert_close(path.descent_rate.unwrap(), 0.09090909090909091);

        let head = points[0].path().unwrap();
        assert_eq!(head.rotation, None);
        assert_eq!(head.rotation_rate, None);
        assert_close(head.speed.unwrap(), 1.5850767679719309);
        let tail = points[5].path().unwrap();
        assert_eq!(tail.rotation, None);
        assert_close(tail.speed.unwrap(), 1.8300502167354957);
    }

    #[test]
    fn test_queries() {
        let track = track();
        assert_eq!(
            track.time_range(),
            Some(TimeRange::new(TIMES[0], TIMES[5]))
        );
        assert_eq!(track.total_duration(), Some(115.0));
        let expected: f64 = track.segments().iter().map(|s| s.length).sum();
        assert_close(track.total_length(), expected);
        assert!(track.total_length() > 150.0);

        let found = track.vertex_node_by_time(TIMES[3]).unwrap();
        assert_eq!(found.value().timestamp(), TIMES[3]);
        assert!(track.vertex_node_by_time("2000-01-01T00:00:00Z").is_none());

        let third = points()[2].clone();
        assert_eq!(track.vertex_nodes_by_point(&third).len(), 1);
        let high = track.vertex_nodes_by(|p| p.elevation().unwrap_or_default() > 102.5);
        assert_eq!(high.len(), 3);
    }

    #[test]
    fn test_empty_track() {
        let mut track = PolylineTrack::default();
        track.validate().unwrap();
        assert!(track.trim_before(TIMES[0]).is_none());
        assert!(track.remove_from_to(None, None).is_none());
        assert!(track.remove_from_to(Some(TIMES[0].into()), None).is_none());
        assert_eq!(track.size(), Size::default());
        assert!(track.time_range().is_none());
        assert_eq!(track.total_length(), 0.0);

        assert_eq!(track.append(point(0.0, 0.0, TIMES[0])), 1);
        track.validate().unwrap();
        assert!(track.first_vertex().unwrap().value().path().is_none());
    }

    #[test]
    fn test_trim_before_and_after() {
        let mut track = track();
        let head = track.trim_before(TIMES[2]).unwrap();
        track.validate().unwrap();
        head.validate().unwrap();
        assert_eq!(timestamps(&head), &TIMES[..2]);
        assert_eq!(timestamps(&track), &TIMES[2..]);
        assert!(track.first_vertex().unwrap().value().path().unwrap().rotation.is_none());

        let tail = track.trim_after(TIMES[4]).unwrap();
        track.validate().unwrap();
        assert_eq!(timestamps(&tail), &TIMES[5..]);
        assert_eq!(timestamps(&track), &TIMES[2..5]);
        assert!(track.vertex_node_by_time(TIMES[5]).is_none());
    }

    #[test]
    fn test_trim_noops() {
        let mut track = track();
        assert!(track.trim_before(TIMES[0]).is_none());
        assert!(track.trim_after(TIMES[5]).is_none());
        assert!(track.trim_before("missing").is_none());
        assert_eq!(track, super::fixtures::track());
        track.validate().unwrap();
    }

    #[test]
    fn test_trim_to() {
        let mut track = track();
        let (before, after) = track.trim_to(Some(TIMES[1].into()), Some(TIMES[3].into()));
        track.validate().unwrap();
        assert_eq!(before.unwrap().len(), 1);
        assert_eq!(after.unwrap().len(), 2);
        assert_eq!(timestamps(&track), &TIMES[1..4]);

        let (before, after) = track.trim_to(None, Some(TIMES[3].into()));
        assert!(before.is_none());
        assert!(after.is_none());
    }

    #[test]
    fn test_remove_at_repairs_only_the_seam() {
        let mut track = track();
        let (paths, segments) = snapshot(&track);

        let removed = track.remove_at(TIMES[2]).unwrap();
        assert_eq!(removed, points()[2]);
        track.validate().unwrap();

        let (new_paths, new_segments) = snapshot(&track);
        assert_eq!(new_paths.len(), 5);
        assert_eq!(new_paths[0], paths[0]);
        assert_ne!(new_paths[1], paths[1]);
        assert_ne!(new_paths[2], paths[3]);
        assert_eq!(new_paths[3], paths[4]);
        assert_eq!(new_paths[4], paths[5]);

        assert_eq!(new_segments[0], segments[0]);
        assert_eq!(new_segments[2], segments[3]);
        assert_eq!(new_segments[3], segments[4]);
        let gap = &new_segments[1];
        assert_close(gap.length, 53.71856080027861);
        assert_close(gap.angle, 0.5952954369195185);
        assert_eq!(gap.duration, Some(33.0));
        assert_eq!(gap.height, Some(3.0));
    }

    #[test]
    fn test_remove_at_addressing_modes() {
        let mut track = track();
        let third = points()[2].clone();
        assert!(track.remove_at(&third).is_some());
        let id = track.vertex_node_by_time(TIMES[4]).unwrap().id();
        assert!(track.remove_at(id).is_some());
        assert!(track.remove_at(id).is_none());
        assert!(track.remove_at("missing").is_none());
        track.validate().unwrap();
        assert_eq!(track.len(), 4);
    }

    #[test]
    fn test_remove_ends() {
        let mut track = track();
        assert!(track.remove_at(TIMES[0]).is_some());
        assert!(track.remove_at(TIMES[5]).is_some());
        track.validate().unwrap();
        assert_eq!(timestamps(&track), &TIMES[1..5]);
        let head = track.first_vertex().unwrap();
        assert!(head.prev_segment().is_none());
        assert!(head.value().path().unwrap().rotation.is_none());
    }

    #[test]
    fn test_remove_at_any() {
        let mut track = track();
        let first = points()[0].clone();
        let removed = track.remove_at_any([
            Target::Time(TIMES[3]),
            Target::Time("missing"),
            Target::Point(&first),
            Target::Time(TIMES[3]),
        ]);
        track.validate().unwrap();
        assert_eq!(removed.len(), 2);
        assert_eq!(removed[0].timestamp(), TIMES[3]);
        assert_eq!(removed[1].timestamp(), TIMES[0]);

        assert!(track.remove_at_any(["nope", "nada"]).is_empty());
        assert_eq!(track.len(), 4);
    }

    #[test]
    fn test_remove_at_any_point_removes_every_match() {
        let p = point(1.0, 1.0, "x");
        let mut track = PolylineTrack::new([
            p.clone(),
            point(2.0, 2.0, "y"),
            p.clone(),
            point(3.0, 3.0, "z"),
        ]);
        let removed = track.remove_at_any([&p]);
        assert_eq!(removed.len(), 2);
        track.validate().unwrap();
        assert_eq!(timestamps(&track), ["y", "z"]);
    }

    #[test]
    fn test_remove_between() {
        let mut track = track();
        let removed = track.remove_between(TIMES[4], TIMES[1]).unwrap();
        track.validate().unwrap();
        removed.validate().unwrap();
        assert_eq!(timestamps(&removed), &TIMES[2..4]);
        assert_eq!(timestamps(&track), [TIMES[0], TIMES[1], TIMES[4], TIMES[5]]);

        // Adjacent, identical or unresolved bounds
        assert!(track.remove_between(TIMES[1], TIMES[4]).is_none());
        assert!(track.remove_between(TIMES[1], TIMES[1]).is_none());
        assert!(track.remove_between(TIMES[0], "missing").is_none());
        assert_eq!(track.len(), 4);
    }

    #[test]
    fn test_remove_from_to() {
        let mut track = track();
        let removed = track
            .remove_from_to(Some(TIMES[1].into()), Some(TIMES[2].into()))
            .unwrap();
        track.validate().unwrap();
        assert_eq!(timestamps(&removed), &TIMES[1..3]);

        let single = track
            .remove_from_to(Some(TIMES[3].into()), Some(TIMES[3].into()))
            .unwrap();
        assert_eq!(single.len(), 1);
        assert!(single.first_vertex().unwrap().value().path().is_none());

        let tail = track.remove_from_to(Some(TIMES[4].into()), None).unwrap();
        assert_eq!(timestamps(&tail), &TIMES[4..]);
        assert_eq!(timestamps(&track), [TIMES[0]]);
        track.validate().unwrap();

        assert!(track.remove_from_to(None, None).is_none());
        assert!(track.remove_from_to(Some("missing".into()), None).is_none());
    }

    #[test]
    fn test_insert_points() {
        let mut track = track();
        let extra = vec![
            point(47.37005, 8.54015, "2023-06-10T08:00:05Z"),
            point(47.37010, 8.54020, "2023-06-10T08:00:10Z"),
        ];
        assert_eq!(track.insert_after(TIMES[0], extra), 2);
        track.validate().unwrap();
        assert_eq!(track.len(), 8);
        assert!(track.vertex_node_by_time("2023-06-10T08:00:10Z").is_some());

        let before = point(47.36990, 8.53990, "2023-06-10T07:59:50Z");
        assert_eq!(track.insert_before(TIMES[0], before), 1);
        track.validate().unwrap();
        assert_eq!(
            track.first_vertex().unwrap().value().timestamp(),
            "2023-06-10T07:59:50Z"
        );

        assert_eq!(track.insert_after("missing", point(0.0, 0.0, "q")), 0);
        assert_eq!(track.insert_after(TIMES[1], Vec::<PointInTime>::new()), 0);
        assert_eq!(track.len(), 9);
    }

    #[test]
    fn test_insert_track_keeps_interior_values() {
        let mut track = track();
        let tail = track.trim_after(TIMES[2]).unwrap();
        let interior = tail.vertex_node_by_time(TIMES[4]).unwrap().value().clone();
        let interior_path = *interior.path().unwrap();

        let mut donor = tail;
        let moved = track.append(std::mem::take(&mut donor));
        assert_eq!(moved, 3);
        assert!(donor.is_empty());
        track.validate().unwrap();

        let after = track.vertex_node_by_time(TIMES[4]).unwrap();
        assert_eq!(after.value().path(), Some(&interior_path));
        assert_eq!(track, super::fixtures::track());
        assert_eq!(track.vertices(), super::fixtures::track().vertices());
    }

    #[test]
    fn test_replace_at() {
        let mut track = track();
        let replacement = track
            .replace_at(
                TIMES[2],
                vec![
                    point(47.37025, 8.54035, "2023-06-10T08:00:25Z"),
                    point(47.37030, 8.54050, "2023-06-10T08:00:35Z"),
                ],
            )
            .unwrap();
        track.validate().unwrap();
        assert_eq!(replacement.inserted, 2);
        assert_eq!(timestamps(&replacement.removed), [TIMES[2]]);
        assert_eq!(track.len(), 7);
        assert!(track.replace_at("missing", point(0.0, 0.0, "q")).is_none());
    }

    #[test]
    fn test_replace_between() {
        let mut track = track();
        let replacement = track
            .replace_between(
                Some(TIMES[1].into()),
                Some(TIMES[4].into()),
                point(47.3704, 8.5406, "2023-06-10T08:00:40Z"),
            )
            .unwrap();
        track.validate().unwrap();
        assert_eq!(timestamps(&replacement.removed), &TIMES[2..4]);
        assert_eq!(replacement.inserted, 1);
        assert_eq!(track.len(), 5);

        // Empty interior, pure insertion
        let replacement = track
            .replace_between(
                Some(TIMES[0].into()),
                Some(TIMES[1].into()),
                point(47.3701, 8.5401, "2023-06-10T08:00:10Z"),
            )
            .unwrap();
        assert!(replacement.removed.is_empty());
        assert_eq!(replacement.inserted, 1);
        track.validate().unwrap();

        // Open-ended: everything after the bound
        let replacement = track
            .replace_between(Some(TIMES[4].into()), None, Vec::<PointInTime>::new())
            .unwrap();
        assert_eq!(timestamps(&replacement.removed), &TIMES[5..]);
        track.validate().unwrap();

        assert!(track.replace_between(None, None, Vec::<PointInTime>::new()).is_none());
        assert!(
            track
                .replace_between(
                    Some(TIMES[1].into()),
                    Some("2023-06-10T08:00:40Z".into()),
                    Vec::<PointInTime>::new()
                )
                .is_none()
        );
    }

    #[test]
    fn test_replace_from_to() {
        let mut track = track();
        let sub = PolylineTrack::new([
            point(47.3703, 8.5404, "2023-06-10T08:00:30Z"),
            point(47.3705, 8.5406, "2023-06-10T08:00:45Z"),
            point(47.3706, 8.5410, "2023-06-10T08:01:10Z"),
        ]);
        let replacement = track
            .replace_from_to(Some(TIMES[2].into()), Some(TIMES[4].into()), sub)
            .unwrap();
        track.validate().unwrap();
        assert_eq!(timestamps(&replacement.removed), &TIMES[2..5]);
        assert_eq!(replacement.inserted, 3);
        assert_eq!(track.len(), 6);

        let replacement = track
            .replace_from_to(None, Some(TIMES[1].into()), Vec::<PointInTime>::new())
            .unwrap();
        assert_eq!(replacement.removed.len(), 2);
        track.validate().unwrap();
        assert!(track.replace_from_to(None, None, Vec::<PointInTime>::new()).is_none());
    }

    #[test]
    fn test_add_elevation_properties_resets_missing_fields() {
        let mut track = PolylineTrack::new([
            point(0.0, 0.0, "2023-06-10T08:00:00Z").with_elevation(10.0),
            point(0.0, 0.001, "2023-06-10T08:00:10Z"),
            point(0.0, 0.002, "2023-06-10T08:00:20Z").with_elevation(30.0),
        ]);
        track.add_elevation_properties();
        track.validate().unwrap();
        assert!(track.segments().iter().all(|s| s.height.is_none()));
        assert!(
            track
                .iter()
                .all(|v| v.value().path().unwrap().ascent_rate.is_none())
        );

        // Without the middle point the remaining segment climbs
        track.remove_at("2023-06-10T08:00:10Z").unwrap();
        track.add_elevation_properties();
        track.validate().unwrap();
        assert_eq!(track.segments()[0].height, Some(20.0));
        assert_eq!(
            track.first_vertex().unwrap().value().path().unwrap().ascent_rate,
            Some(1.0)
        );
    }

    #[test]
    fn test_duplicate_timestamps_resolve_to_first() {
        let mut track = PolylineTrack::new([
            point(1.0, 1.0, "a"),
            point(2.0, 2.0, "dup"),
            point(3.0, 3.0, "b"),
            point(4.0, 4.0, "dup"),
        ]);
        track.validate().unwrap();
        assert_eq!(track.vertex_node_by_time("dup").unwrap().value().lat(), 2.0);
        let removed = track.remove_at("dup").unwrap();
        assert_eq!(removed.lat(), 2.0);
        assert_eq!(track.vertex_node_by_time("dup").unwrap().value().lat(), 4.0);
        track.validate().unwrap();
    }

    #[test]
    fn test_clone_is_independent() {
        let track = track();
        let mut copy = track.clone();
        assert_eq!(track, copy);
        copy.validate().unwrap();

        let id = track.vertex_node_by_time(TIMES[2]).unwrap().id();
        assert!(copy.remove_at(id).is_none());
        copy.remove_at(TIMES[2]).unwrap();
        assert_ne!(track, copy);
        assert_eq!(track.len(), 6);
        assert!(track.vertex(id).is_some());
    }

    #[test]
    fn test_invariants_through_an_edit_sequence() {
        let mut track = track();
        let mut other = track.clone();
        other.trim_before(TIMES[3]);
        let ops: Vec<Box<dyn Fn(&mut PolylineTrack)>> = vec![
            Box::new(|t: &mut PolylineTrack| {
                t.remove_at(TIMES[1]);
            }),
            Box::new(|t: &mut PolylineTrack| {
                t.insert_after(TIMES[0], point(47.3701, 8.5401, "2023-06-10T08:00:08Z"));
            }),
            Box::new(|t: &mut PolylineTrack| {
                t.remove_between(TIMES[0], TIMES[5]);
            }),
            Box::new(|t: &mut PolylineTrack| {
                t.append(super::fixtures::track());
            }),
            Box::new(|t: &mut PolylineTrack| {
                t.trim_to(Some(TIMES[0].into()), Some(TIMES[4].into()));
            }),
            Box::new(|t: &mut PolylineTrack| {
                t.replace_from_to(None, None, Vec::<PointInTime>::new());
            }),
        ];
        for op in &ops {
            op(&mut track);
            track.validate().unwrap();
            op(&mut other);
            other.validate().unwrap();
        }
    }
}
