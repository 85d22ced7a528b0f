//! World and screen coordinates plus the geometry collaborator.
//!
//! World positions are Cartesian triples in metres. What the axes mean depends
//! on the [`Geometry`] in use: [`Planar`] treats them as a local tangent plane
//! with `z` pointing up, [`Ellipsoid`] treats them as Earth-centred,
//! Earth-fixed coordinates on the WGS84 ellipsoid. The engine never assumes
//! either; it only asks the geometry for distances and azimuths.

#[cfg(test)]
#[path = "geo_test.rs"]
mod geo_test;

use std::f64::consts::TAU;
use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

use crate::consts::{WGS84_A, WGS84_B};

/// A point in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0, z: 0.0 };

    #[must_use]
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[must_use]
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    #[must_use]
    pub fn cross(self, other: Self) -> Self {
        Self {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    #[must_use]
    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Unit vector in the same direction, or `None` for the zero vector.
    #[must_use]
    pub fn normalize(self) -> Option<Self> {
        let len = self.length();
        if len <= f64::EPSILON || !len.is_finite() {
            return None;
        }
        Some(self * (1.0 / len))
    }

    #[must_use]
    pub fn midpoint(self, other: Self) -> Self {
        (self + other) * 0.5
    }

    /// Component-wise comparison within `eps`.
    #[must_use]
    pub fn approx_eq(self, other: Self, eps: f64) -> bool {
        (self.x - other.x).abs() <= eps && (self.y - other.y).abs() <= eps && (self.z - other.z).abs() <= eps
    }
}

impl Add for Vec3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// A point on the rendering surface in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    #[must_use]
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self { x: self.x + dx, y: self.y + dy }
    }
}

/// Distance and angle calculations supplied by the coordinate collaborator.
pub trait Geometry {
    /// Straight-line distance between two world points.
    fn distance(&self, a: Vec3, b: Vec3) -> f64;

    /// East, north and up unit vectors of the local frame at `origin`.
    fn local_frame(&self, origin: Vec3) -> Option<LocalFrame>;

    /// Azimuth of `target` seen from `origin`, in radians clockwise from north, in `[0, 2π)`.
    ///
    /// Returns `None` when the two points coincide or the frame is undefined.
    fn azimuth(&self, origin: Vec3, target: Vec3) -> Option<f64> {
        let frame = self.local_frame(origin)?;
        let d = target - origin;
        let east = d.dot(frame.east);
        let north = d.dot(frame.north);
        if east.abs() <= f64::EPSILON && north.abs() <= f64::EPSILON {
            return None;
        }
        Some(normalize_angle(east.atan2(north)))
    }

    /// Sum of consecutive segment lengths.
    fn path_length(&self, points: &[Vec3]) -> f64 {
        points.windows(2).map(|w| self.distance(w[0], w[1])).sum()
    }
}

/// Local east-north-up basis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalFrame {
    pub east: Vec3,
    pub north: Vec3,
    pub up: Vec3,
}

/// Flat local tangent plane: x east, y north, z up.
#[derive(Debug, Clone, Copy, Default)]
pub struct Planar;

impl Geometry for Planar {
    fn distance(&self, a: Vec3, b: Vec3) -> f64 {
        (b - a).length()
    }

    fn local_frame(&self, _origin: Vec3) -> Option<LocalFrame> {
        Some(LocalFrame {
            east: Vec3::new(1.0, 0.0, 0.0),
            north: Vec3::new(0.0, 1.0, 0.0),
            up: Vec3::new(0.0, 0.0, 1.0),
        })
    }
}

/// Earth-centred Cartesian coordinates on the WGS84 ellipsoid.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ellipsoid;

impl Geometry for Ellipsoid {
    fn distance(&self, a: Vec3, b: Vec3) -> f64 {
        (b - a).length()
    }

    fn local_frame(&self, origin: Vec3) -> Option<LocalFrame> {
        let a2 = WGS84_A * WGS84_A;
        let b2 = WGS84_B * WGS84_B;
        let up = Vec3::new(origin.x / a2, origin.y / a2, origin.z / b2).normalize()?;
        // East is undefined at the poles; use +y there.
        let east = Vec3::new(-up.y, up.x, 0.0)
            .normalize()
            .unwrap_or(Vec3::new(0.0, 1.0, 0.0));
        let north = up.cross(east);
        Some(LocalFrame { east, north, up })
    }
}

/// Wrap an angle into `[0, 2π)`.
#[must_use]
pub fn normalize_angle(rad: f64) -> f64 {
    if !rad.is_finite() {
        return 0.0;
    }
    rad.rem_euclid(TAU)
}

/// Signed shortest difference `current - start`, wrapped into `(-π, π]`.
#[must_use]
pub fn signed_angle_delta(current: f64, start: f64) -> f64 {
    let delta = current - start;
    if !delta.is_finite() {
        return 0.0;
    }
    let mut wrapped = delta.rem_euclid(TAU);
    if wrapped > std::f64::consts::PI {
        wrapped -= TAU;
    }
    wrapped
}

/// Arithmetic mean of a set of points.
#[must_use]
pub fn centroid(points: &[Vec3]) -> Option<Vec3> {
    if points.is_empty() {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = points.len() as f64;
    let sum = points.iter().fold(Vec3::ZERO, |acc, p| acc + *p);
    Some(sum * (1.0 / n))
}
