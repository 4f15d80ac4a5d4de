//! Spherical geometry helpers for WGS84 coordinates

use geo::Point;
use std::f64::consts::PI;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Maximum absolute latitude in degrees
pub const MAX_LATITUDE: f64 = 90.0;

/// Maximum absolute longitude in degrees
pub const MAX_LONGITUDE: f64 = 180.0;

/// Check that a latitude/longitude pair is finite and within WGS84 bounds
#[inline]
pub fn is_valid_coordinate(lat: f64, lng: f64) -> bool {
    lat.is_finite()
        && lng.is_finite()
        && lat.abs() <= MAX_LATITUDE
        && lng.abs() <= MAX_LONGITUDE
}

/// Great-circle distance between two points in meters (haversine formula)
///
/// Points follow the `geo` convention: `x` is longitude, `y` is latitude, in degrees.
#[inline]
pub fn haversine_distance(p1: Point<f64>, p2: Point<f64>) -> f64 {
    let lat1 = p1.y().to_radians();
    let lat2 = p2.y().to_radians();
    let delta_lat = (p2.y() - p1.y()).to_radians();
    let delta_lon = (p2.x() - p1.x()).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Initial great-circle bearing from `p1` towards `p2` in radians
///
/// Measured clockwise from north, in `(-PI, PI]`.
#[inline]
pub fn initial_bearing(p1: Point<f64>, p2: Point<f64>) -> f64 {
    let lat1 = p1.y().to_radians();
    let lat2 = p2.y().to_radians();
    let delta_lon = (p2.x() - p1.x()).to_radians();

    let y = delta_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lon.cos();
    y.atan2(x)
}

/// Wrap an angle into `(-PI, PI]`
#[inline]
pub fn normalize_angle(angle: f64) -> f64 {
    let wrapped = (angle + PI).rem_euclid(2.0 * PI) - PI;
    if wrapped == -PI { PI } else { wrapped }
}

/// Signed turn from `from` to `to` (both bearings in radians), positive clockwise
#[inline]
pub fn turn_angle(from: f64, to: f64) -> f64 {
    normalize_angle(to - from)
}

/// North/south half of a compass direction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Latitudinal {
    N,
    S,
}

/// East/west half of a compass direction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Longitudinal {
    E,
    W,
}

/// Compass letters of a heading, one per axis
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Direction {
    pub lat: Latitudinal,
    pub lng: Longitudinal,
}

impl Direction {
    /// Direction of a bearing in radians (clockwise from north)
    pub fn from_bearing(bearing: f64) -> Self {
        Self {
            lat: if bearing.cos() >= 0.0 {
                Latitudinal::N
            } else {
                Latitudinal::S
            },
            lng: if bearing.sin() >= 0.0 {
                Longitudinal::E
            } else {
                Longitudinal::W
            },
        }
    }
}
