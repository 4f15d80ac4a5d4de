//! Splitting a track into fragments and copying time ranges out of it

use crate::point::{PointInTime, TimeRange};
use crate::polyline_track::{Chain, PolylineTrack};
use std::collections::HashSet;
use tracing::debug;

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl PolylineTrack {
    /// Split after the point at `timestamp`
    ///
    /// The second fragment starts with a copy of the split point. Splitting at a missing
    /// timestamp or at either end returns the track unchanged as the only element.
    pub fn split_by_time(self, timestamp: &str) -> Vec<PolylineTrack> {
        self.split_by_times([timestamp])
    }

    /// Split at every listed timestamp, in path order
    ///
    /// Duplicates, missing timestamps and the two ends are ignored, so `N` valid cuts give
    /// `N + 1` fragments. Fragments without a segment are dropped.
    pub fn split_by_times<T: AsRef<str>>(
        mut self,
        timestamps: impl IntoIterator<Item = T>,
    ) -> Vec<PolylineTrack> {
        #[cfg(feature = "profiling")]
        profiling::scope!("polyline_track::split_by_times");

        let (first, last) = (self.polyline.first_vertex, self.polyline.last_vertex);
        let wanted: HashSet<usize> = timestamps
            .into_iter()
            .filter_map(|timestamp| self.index.get(timestamp.as_ref(), &self.polyline))
            .filter(|slot| Some(*slot) != first && Some(*slot) != last)
            .collect();
        if wanted.is_empty() {
            return vec![self];
        }
        let cuts: Vec<usize> = self
            .polyline
            .slots_where(|_| true)
            .into_iter()
            .filter(|slot| wanted.contains(slot))
            .collect();

        // Cut from the tail backwards so every remaining cut stays in `self`
        let mut fragments = Vec::with_capacity(cuts.len() + 1);
        for slot in cuts.into_iter().rev() {
            if let Some(tail) = self.split_after_slot(slot) {
                fragments.push(tail);
            }
        }
        fragments.push(self);
        fragments.reverse();
        fragments.retain(|fragment| fragment.size().segments > 0);

        debug!(fragments = fragments.len(), "split track");
        fragments
    }

    /// Split at the start and the end of `range`
    pub fn split_by_time_range(self, range: &TimeRange) -> Vec<PolylineTrack> {
        self.split_by_times([range.start_time.as_str(), range.end_time.as_str()])
    }

    /// Deep copy of `start..=end`; an absent bound means that end of the track
    ///
    /// Returns `None` when a bound is missing from the track or the bounds are reversed.
    pub fn clone_from_to_times(
        &self,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Option<PolylineTrack> {
        let first = match start {
            Some(timestamp) => self.index.get(timestamp, &self.polyline)?,
            None => self.polyline.first_vertex?,
        };
        let last = match end {
            Some(timestamp) => self.index.get(timestamp, &self.polyline)?,
            None => self.polyline.last_vertex?,
        };
        if self.polyline.in_path_order(first, last) != (first, last) {
            return None;
        }
        Some(PolylineTrack::from_chain(
            self.polyline.clone_range(first, last),
        ))
    }

    /// Detach everything after `slot`, returning it headed by a copy of `slot`'s point
    fn split_after_slot(&mut self, slot: usize) -> Option<PolylineTrack> {
        let head: PointInTime = self.polyline.vertices[slot].value.clone();
        let removed = self.splice_at(Some(slot), None, None).removed?;
        let mut tail = PolylineTrack::from_chain(removed);
        let first = tail.polyline.first_vertex;
        tail.splice_at(None, first, Some(Chain::from_values([head])));
        Some(tail)
    }
}

#[cfg(test)]
mod tests {
    use crate::polyline_track::fixtures::*;
    use crate::{PolylineTrack, TimeRange};

    fn concatenated(fragments: &[PolylineTrack]) -> Vec<String> {
        let mut all: Vec<String> = Vec::new();
        for fragment in fragments {
            let stamps = timestamps(fragment);
            // Each fragment after the first repeats the previous split point
            let skip = usize::from(!all.is_empty());
            all.extend(stamps.into_iter().skip(skip));
        }
        all
    }

    #[test]
    fn test_split_by_time() {
        let fragments = track().split_by_time(TIMES[2]);
        assert_eq!(fragments.len(), 2);
        for fragment in &fragments {
            fragment.validate().unwrap();
        }
        assert_eq!(timestamps(&fragments[0]), &TIMES[..3]);
        assert_eq!(timestamps(&fragments[1]), &TIMES[2..]);

        let a_tail = fragments[0].last_vertex().unwrap();
        let b_head = fragments[1].first_vertex().unwrap();
        assert_eq!(a_tail.value(), b_head.value());
        assert!(a_tail.value().path().unwrap().rotation.is_none());
        assert!(b_head.value().path().unwrap().rotation.is_none());
        assert_eq!(
            b_head.value().path().unwrap().speed,
            b_head.next_segment().unwrap().value().speed
        );
    }

    #[test]
    fn test_split_reconstructs_the_track() {
        let fragments = track().split_by_time(TIMES[3]);
        assert_eq!(concatenated(&fragments), TIMES);
    }

    #[test]
    fn test_split_noops() {
        for timestamp in [TIMES[0], TIMES[5], "missing"] {
            let fragments = track().split_by_time(timestamp);
            assert_eq!(fragments.len(), 1);
            assert_eq!(fragments[0], track());
            fragments[0].validate().unwrap();
        }
        assert_eq!(PolylineTrack::default().split_by_time(TIMES[0]).len(), 1);
    }

    #[test]
    fn test_split_by_times_in_path_order() {
        let fragments = track().split_by_times([TIMES[4], TIMES[1], "missing", TIMES[0]]);
        assert_eq!(fragments.len(), 3);
        assert_eq!(timestamps(&fragments[0]), &TIMES[..2]);
        assert_eq!(timestamps(&fragments[1]), &TIMES[1..5]);
        assert_eq!(timestamps(&fragments[2]), &TIMES[4..]);
        for fragment in &fragments {
            fragment.validate().unwrap();
        }
        assert_eq!(concatenated(&fragments), TIMES);
    }

    #[test]
    fn test_split_by_times_ignores_duplicates() {
        let once = track().split_by_times([TIMES[2]]);
        let twice = track().split_by_times([TIMES[2], TIMES[2]]);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_split_at_every_interior_point() {
        let fragments = track().split_by_times(&TIMES[1..5]);
        assert_eq!(fragments.len(), 5);
        assert!(fragments.iter().all(|f| f.len() == 2));
        assert_eq!(concatenated(&fragments), TIMES);
    }

    #[test]
    fn test_split_by_time_range() {
        let range = TimeRange::new(TIMES[1], TIMES[3]);
        let fragments = track().split_by_time_range(&range);
        assert_eq!(fragments.len(), 3);
        assert_eq!(timestamps(&fragments[1]), &TIMES[1..4]);
    }

    #[test]
    fn test_clone_from_to_times() {
        let track = track();
        let middle = track
            .clone_from_to_times(Some(TIMES[1]), Some(TIMES[3]))
            .unwrap();
        middle.validate().unwrap();
        assert_eq!(timestamps(&middle), &TIMES[1..4]);
        assert!(middle.first_vertex().unwrap().value().path().unwrap().rotation.is_none());

        let head = track.clone_from_to_times(None, Some(TIMES[1])).unwrap();
        assert_eq!(timestamps(&head), &TIMES[..2]);
        let whole = track.clone_from_to_times(None, None).unwrap();
        assert_eq!(whole, track);

        assert!(track.clone_from_to_times(Some("missing"), None).is_none());
        assert!(
            track
                .clone_from_to_times(Some(TIMES[3]), Some(TIMES[1]))
                .is_none()
        );
        assert!(
            PolylineTrack::default()
                .clone_from_to_times(None, None)
                .is_none()
        );
    }

    #[test]
    fn test_clone_range_is_independent() {
        let track = track();
        let mut copy = track.clone_from_to_times(None, None).unwrap();
        copy.remove_at(TIMES[2]).unwrap();
        assert_eq!(track.len(), 6);
        track.validate().unwrap();
        copy.validate().unwrap();
    }
}
