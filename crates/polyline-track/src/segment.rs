//! Segment values derived from the two points they span

use crate::geometry::{self, Direction};
use crate::point::PointInTime;
use crate::polyline::Span;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Motion between two consecutive track points
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SegmentValue {
    /// Great-circle distance in meters
    pub length: f64,
    /// Seconds between the two timestamps
    pub duration: Option<f64>,
    /// Meters per second, absent unless the duration is positive
    pub speed: Option<f64>,
    /// Initial bearing in radians, clockwise from north
    pub angle: f64,
    pub direction: Direction,
    /// Elevation change in meters, absent unless both ends carry an elevation
    pub height: Option<f64>,
    /// Elevation change per second
    pub height_rate: Option<f64>,
}

impl SegmentValue {
    /// Derive every field from the two endpoints
    pub fn between(prev: &PointInTime, next: &PointInTime) -> Self {
        let length = geometry::haversine_distance(prev.point(), next.point());
        let angle = geometry::initial_bearing(prev.point(), next.point());
        let duration = prev.seconds_until(next);
        let positive = duration.filter(|d| *d > 0.0);
        let height = elevation_delta(prev, next);
        Self {
            length,
            duration,
            speed: positive.map(|d| length / d),
            angle,
            direction: Direction::from_bearing(angle),
            height,
            height_rate: height.zip(positive).map(|(h, d)| h / d),
        }
    }

    /// Recompute only the elevation fields against the current endpoints
    pub fn refresh_elevation(&mut self, prev: &PointInTime, next: &PointInTime) {
        self.height = elevation_delta(prev, next);
        self.height_rate = self
            .height
            .zip(self.duration.filter(|d| *d > 0.0))
            .map(|(h, d)| h / d);
    }

    /// Climb rate, present only on ascending segments
    #[inline]
    pub fn ascent_rate(&self) -> Option<f64> {
        self.height_rate.filter(|rate| *rate > 0.0)
    }

    /// Descent rate as a positive number, present only on descending segments
    #[inline]
    pub fn descent_rate(&self) -> Option<f64> {
        self.height_rate.filter(|rate| *rate < 0.0).map(f64::abs)
    }
}

fn elevation_delta(prev: &PointInTime, next: &PointInTime) -> Option<f64> {
    Some(next.elevation()? - prev.elevation()?)
}

impl Span<PointInTime> for SegmentValue {
    fn span(prev: &PointInTime, next: &PointInTime) -> Self {
        Self::between(prev, next)
    }
}
