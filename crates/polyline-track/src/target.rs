//! Ways of addressing a vertex of a track

use crate::node::VertexId;
use crate::point::PointInTime;

/// A vertex address: by timestamp, by point value, or by node handle
///
/// Timestamps resolve through the track's index (first match in path order), points by a
/// value scan, and handles directly. An address that does not resolve turns the operation
/// into a no-op.
#[derive(Clone, Copy, Debug)]
pub enum Target<'a> {
    Time(&'a str),
    Point(&'a PointInTime),
    Vertex(VertexId),
}

impl<'a> From<&'a str> for Target<'a> {
    fn from(timestamp: &'a str) -> Self {
        Target::Time(timestamp)
    }
}

impl<'a> From<&'a String> for Target<'a> {
    fn from(timestamp: &'a String) -> Self {
        Target::Time(timestamp.as_str())
    }
}

impl<'a> From<&'a PointInTime> for Target<'a> {
    fn from(point: &'a PointInTime) -> Self {
        Target::Point(point)
    }
}

impl From<VertexId> for Target<'_> {
    fn from(id: VertexId) -> Self {
        Target::Vertex(id)
    }
}
