//! Track points and the motion properties derived for them

use crate::segment::SegmentValue;
use crate::{Result, TrackError, geometry};
use geo::Point;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Motion properties of a vertex, derived from its bordering segments
///
/// Every field is independently absent when its inputs are missing. `rotation` and
/// `rotation_rate` need both bordering segments and are absent on the ends of a track.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PathProperties {
    /// Signed turn between incoming and outgoing bearing, radians, clockwise positive
    pub rotation: Option<f64>,
    /// Rotation per second over the mean duration of both bordering segments
    pub rotation_rate: Option<f64>,
    /// Meters per second
    pub speed: Option<f64>,
    /// Meters of climb per second
    pub ascent_rate: Option<f64>,
    /// Meters of descent per second (positive)
    pub descent_rate: Option<f64>,
}

impl PathProperties {
    /// Compute the properties of a vertex from its bordering segments
    ///
    /// Returns `None` for a lone vertex (no segment on either side).
    pub fn from_segments(
        prev: Option<&SegmentValue>,
        next: Option<&SegmentValue>,
    ) -> Option<Self> {
        match (prev, next) {
            (None, None) => None,
            (Some(only), None) | (None, Some(only)) => Some(Self {
                rotation: None,
                rotation_rate: None,
                speed: only.speed,
                ascent_rate: only.ascent_rate(),
                descent_rate: only.descent_rate(),
            }),
            (Some(prev), Some(next)) => {
                let rotation = geometry::turn_angle(prev.angle, next.angle);
                let rotation_rate = mean(prev.duration, next.duration)
                    .filter(|duration| *duration > 0.0)
                    .map(|duration| rotation / duration);
                Some(Self {
                    rotation: Some(rotation),
                    rotation_rate,
                    speed: mean(prev.speed, next.speed),
                    ascent_rate: mean(prev.ascent_rate(), next.ascent_rate()),
                    descent_rate: mean(prev.descent_rate(), next.descent_rate()),
                })
            }
        }
    }

    /// Recompute only the elevation-derived fields, keeping the rest
    pub fn with_elevation_from(
        mut self,
        prev: Option<&SegmentValue>,
        next: Option<&SegmentValue>,
    ) -> Self {
        let ascent = |s: Option<&SegmentValue>| s.and_then(SegmentValue::ascent_rate);
        let descent = |s: Option<&SegmentValue>| s.and_then(SegmentValue::descent_rate);
        self.ascent_rate = mean(ascent(prev), ascent(next));
        self.descent_rate = mean(descent(prev), descent(next));
        self
    }
}

/// Average of the values that are present
fn mean(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some((a + b) / 2.0),
        (Some(x), None) | (None, Some(x)) => Some(x),
        (None, None) => None,
    }
}

/// A position at an instant, with optional elevation and derived path properties
///
/// Equality compares position, elevation and timestamp; the derived `path` is ignored.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PointInTime {
    lat: f64,
    lng: f64,
    elevation: Option<f64>,
    timestamp: String,
    path: Option<PathProperties>,
}

impl PointInTime {
    /// Create a point, rejecting coordinates outside WGS84 bounds
    ///
    /// The timestamp is an opaque, ordered string; RFC 3339 timestamps also yield
    /// durations, speeds and rates.
    pub fn new(lat: f64, lng: f64, timestamp: impl Into<String>) -> Result<Self> {
        if !geometry::is_valid_coordinate(lat, lng) {
            return Err(TrackError::InvalidCoordinate { lat, lng });
        }
        Ok(Self {
            lat,
            lng,
            elevation: None,
            timestamp: timestamp.into(),
            path: None,
        })
    }

    /// Attach an elevation in meters (non-finite values are ignored)
    pub fn with_elevation(mut self, elevation: f64) -> Self {
        self.elevation = elevation.is_finite().then_some(elevation);
        self
    }

    #[inline]
    pub fn lat(&self) -> f64 {
        self.lat
    }

    #[inline]
    pub fn lng(&self) -> f64 {
        self.lng
    }

    #[inline]
    pub fn elevation(&self) -> Option<f64> {
        self.elevation
    }

    #[inline]
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    #[inline]
    pub fn path(&self) -> Option<&PathProperties> {
        self.path.as_ref()
    }

    /// Position as a `geo` point (x = longitude, y = latitude)
    #[inline]
    pub fn point(&self) -> Point<f64> {
        Point::new(self.lng, self.lat)
    }

    /// Parsed timestamp, `None` if it is not RFC 3339
    pub fn time(&self) -> Option<OffsetDateTime> {
        OffsetDateTime::parse(&self.timestamp, &Rfc3339).ok()
    }

    /// Seconds from this point to `later` (negative if `later` is earlier)
    pub fn seconds_until(&self, later: &PointInTime) -> Option<f64> {
        Some((later.time()? - self.time()?).as_seconds_f64())
    }

    pub(crate) fn set_path(&mut self, path: Option<PathProperties>) {
        self.path = path;
    }
}

impl PartialEq for PointInTime {
    fn eq(&self, other: &Self) -> bool {
        self.lat == other.lat
            && self.lng == other.lng
            && self.elevation == other.elevation
            && self.timestamp == other.timestamp
    }
}

impl TryFrom<&gpx::Waypoint> for PointInTime {
    type Error = TrackError;

    /// Convert a GPX waypoint; waypoints without a time cannot be placed on a track
    fn try_from(waypoint: &gpx::Waypoint) -> Result<Self> {
        let time = waypoint
            .time
            .clone()
            .ok_or_else(|| TrackError::InvalidTimestamp("waypoint has no time".to_string()))?;
        let timestamp = OffsetDateTime::from(time)
            .format(&Rfc3339)
            .map_err(|e| TrackError::InvalidTimestamp(e.to_string()))?;
        let position = waypoint.point();
        let point = PointInTime::new(position.y(), position.x(), timestamp)?;
        Ok(match waypoint.elevation {
            Some(elevation) => point.with_elevation(elevation),
            None => point,
        })
    }
}

/// Inclusive span between two timestamps
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimeRange {
    pub start_time: String,
    pub end_time: String,
}

impl TimeRange {
    pub fn new(start_time: impl Into<String>, end_time: impl Into<String>) -> Self {
        Self {
            start_time: start_time.into(),
            end_time: end_time.into(),
        }
    }
}
