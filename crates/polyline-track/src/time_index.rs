//! Timestamp to vertex index, patched in step with every splice

use crate::node::VertexId;
use crate::point::PointInTime;
use crate::polyline::Polyline;
use crate::segment::SegmentValue;
use smallvec::SmallVec;
use std::collections::HashMap;

type Chain = Polyline<PointInTime, SegmentValue>;

/// Maps each timestamp to the vertices carrying it
///
/// Timestamps are expected to be unique; when they are not, lookups return the vertex that
/// comes first in path order.
#[derive(Clone, Debug, Default)]
pub(crate) struct TimeIndex {
    entries: HashMap<String, SmallVec<[VertexId; 1]>>,
}

impl TimeIndex {
    pub(crate) fn build(chain: &Chain) -> Self {
        let mut index = Self {
            entries: HashMap::with_capacity(chain.len()),
        };
        for vertex in chain.iter() {
            index.insert(vertex.value().timestamp(), vertex.id());
        }
        index
    }

    pub(crate) fn insert(&mut self, timestamp: &str, id: VertexId) {
        match self.entries.get_mut(timestamp) {
            Some(ids) => ids.push(id),
            None => {
                let mut ids = SmallVec::new();
                ids.push(id);
                self.entries.insert(timestamp.to_string(), ids);
            }
        }
    }

    /// Drop the handles under `timestamp` that no longer resolve in `chain`
    pub(crate) fn prune(&mut self, timestamp: &str, chain: &Chain) {
        if let Some(ids) = self.entries.get_mut(timestamp) {
            ids.retain(|id| chain.contains(*id));
            if ids.is_empty() {
                self.entries.remove(timestamp);
            }
        }
    }

    /// Slot of the first vertex in path order carrying `timestamp`
    pub(crate) fn get(&self, timestamp: &str, chain: &Chain) -> Option<usize> {
        match self.entries.get(timestamp)?.as_slice() {
            [] => None,
            [only] => chain.vertex_slot(*only),
            several => chain
                .iter()
                .find(|vertex| several.contains(&vertex.id()))
                .map(|vertex| vertex.slot()),
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.values().map(|ids| ids.len()).sum()
    }
}
