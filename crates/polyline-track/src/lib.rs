//! Polyline Track - Editable GPS Tracks with Incrementally Maintained Motion Statistics
//!
//! This library stores a time-ordered GPS track as an alternating chain of vertices (points in
//! time) and segments (the motion between two consecutive points). Structural edits such as
//! trimming, removal, insertion, replacement and splitting are applied by splicing the chain,
//! and only the derived values at the edited seams are recomputed.
//!
//! # Architecture
//!
//! - **[`Polyline`]**: Generic arena-backed V-S-V chain with a single splice primitive
//! - **[`PointInTime`]** / **[`SegmentValue`]**: Kinematic values and their derivation formulas
//! - **[`PolylineTrack`]**: Timestamp-indexed track with time/point/handle addressed mutators
//! - **[`Track`]**: GPX-facing façade keeping a `geo::LineString` in sync with the engine
//!
//! # Performance Characteristics
//!
//! - **Build Time**: O(N) for construction plus the full property pass
//! - **Time Lookup**: O(1) through the timestamp index
//! - **Edits**: O(K) in the number of removed vertices; derived values are repaired at two seams

mod arena;
pub mod geometry;
mod node;
mod point;
mod polyline;
mod polyline_track;
mod segment;
mod split;
mod target;
mod time_index;
mod track;

// Public API exports
pub use arena::NodeId;
pub use geometry::{Direction, Latitudinal, Longitudinal};
pub use node::{SegmentId, SegmentKind, SegmentRef, VertexId, VertexKind, VertexRef};
pub use point::{PathProperties, PointInTime, TimeRange};
pub use polyline::{Polyline, Segments, Size, Span, Vertices};
pub use polyline_track::{Insertion, PolylineTrack, Replacement};
pub use segment::SegmentValue;
pub use target::Target;
pub use track::{Change, Track};

/// Error types for track construction, import and validation
#[derive(Debug, thiserror::Error)]
pub enum TrackError {
    #[error("GPX parsing error: {0}")]
    GpxParse(#[from] gpx::errors::GpxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid coordinate: lat {lat}, lng {lng}")]
    InvalidCoordinate { lat: f64, lng: f64 },

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Empty track")]
    EmptyTrack,

    #[error("Broken track structure: {0}")]
    Invariant(String),
}

pub type Result<T> = std::result::Result<T, TrackError>;
