//! GPX-facing track façade
//!
//! [`Track`] pairs the editing engine with a `geo` representation of its points. Edits go
//! through [`Track::edit`], which regenerates the representation only when the edit reports
//! a change.

use crate::point::PointInTime;
use crate::polyline_track::PolylineTrack;
use crate::{Result, TrackError};
use geo::{BoundingRect, LineString, Rect};
use std::path::Path;
use tracing::{debug, warn};

/// Whether an edit result means the track changed
pub trait Change {
    fn is_change(&self) -> bool;
}

impl<T> Change for Option<T> {
    fn is_change(&self) -> bool {
        self.is_some()
    }
}

impl<T> Change for Vec<T> {
    fn is_change(&self) -> bool {
        !self.is_empty()
    }
}

impl Change for usize {
    fn is_change(&self) -> bool {
        *self != 0
    }
}

impl Change for bool {
    fn is_change(&self) -> bool {
        *self
    }
}

impl<A: Change, B: Change> Change for (A, B) {
    fn is_change(&self) -> bool {
        self.0.is_change() || self.1.is_change()
    }
}

/// A named track with a cached line string and bounding box
#[derive(Clone, Debug)]
pub struct Track {
    name: Option<String>,
    engine: PolylineTrack,
    line: LineString<f64>,
    bounds: Option<Rect<f64>>,
    revision: u64,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl Track {
    pub fn new(engine: PolylineTrack) -> Self {
        let mut track = Self {
            name: None,
            engine,
            line: LineString::new(Vec::new()),
            bounds: None,
            revision: 0,
        };
        track.refresh();
        track
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[inline]
    pub fn engine(&self) -> &PolylineTrack {
        &self.engine
    }

    pub fn into_engine(self) -> PolylineTrack {
        self.engine
    }

    /// Points as a line string (x = longitude, y = latitude)
    #[inline]
    pub fn line_string(&self) -> &LineString<f64> {
        &self.line
    }

    /// Bounding box of all points, `None` for an empty track
    #[inline]
    pub fn bounding_rect(&self) -> Option<Rect<f64>> {
        self.bounds
    }

    /// Number of times the representation was regenerated after an edit
    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Run an edit on the engine and resync the representation if it changed anything
    pub fn edit<R: Change>(&mut self, edit: impl FnOnce(&mut PolylineTrack) -> R) -> R {
        let result = edit(&mut self.engine);
        if result.is_change() {
            self.refresh();
            self.revision += 1;
        }
        result
    }

    /// Split into named fragments, see [`PolylineTrack::split_by_times`]
    pub fn split_by_times<T: AsRef<str>>(self, timestamps: impl IntoIterator<Item = T>) -> Vec<Track> {
        let name = self.name;
        self.engine
            .split_by_times(timestamps)
            .into_iter()
            .map(|engine| Track {
                name: name.clone(),
                ..Track::new(engine)
            })
            .collect()
    }

    /// Build one track per GPX track, concatenating its segments
    ///
    /// Waypoints without a time or with invalid coordinates are skipped.
    pub fn from_gpx(gpx: gpx::Gpx) -> Result<Vec<Track>> {
        #[cfg(feature = "profiling")]
        profiling::scope!("track::from_gpx");

        let mut tracks = Vec::with_capacity(gpx.tracks.len());
        for gpx_track in gpx.tracks {
            let mut points = Vec::new();
            for waypoint in gpx_track.segments.iter().flat_map(|s| s.points.iter()) {
                match PointInTime::try_from(waypoint) {
                    Ok(point) => points.push(point),
                    Err(err) => warn!(
                        "Skipping waypoint at ({}, {}): {}",
                        waypoint.point().y(),
                        waypoint.point().x(),
                        err
                    ),
                }
            }
            if points.is_empty() {
                warn!(name = ?gpx_track.name, "Skipping track without usable points");
                continue;
            }
            debug!(name = ?gpx_track.name, points = points.len(), "Loaded track");
            let track = Track::new(PolylineTrack::new(points));
            tracks.push(match gpx_track.name {
                Some(name) => track.with_name(name),
                None => track,
            });
        }

        if tracks.is_empty() {
            return Err(TrackError::EmptyTrack);
        }
        Ok(tracks)
    }

    /// Read and import a GPX file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Vec<Track>> {
        #[cfg(feature = "profiling")]
        profiling::scope!("track::load_from_file");

        let file = std::fs::File::open(path.as_ref())?;
        let reader = std::io::BufReader::new(file);
        Self::from_gpx(gpx::read(reader)?)
    }

    fn refresh(&mut self) {
        self.line = self.engine.iter().map(|v| v.value().point()).collect();
        self.bounds = self.line.bounding_rect();
    }
}
