// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pixel-space points and frame bounds

use crate::error::{Error, Result};
use nalgebra::{Point2, Vector2};

/// A 2D pixel coordinate
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn to_nalgebra(&self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }

    pub fn from_nalgebra(p: &Point2<f64>) -> Self {
        Self { x: p.x, y: p.y }
    }

    pub fn distance_to(&self, other: &Point2D) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Dot product of the point (as a vector from the origin) with `axis`
    #[inline]
    pub fn dot(&self, axis: &Vector2<f64>) -> f64 {
        self.x * axis.x + self.y * axis.y
    }

    /// Drop the fractional part of both coordinates (toward zero)
    #[inline]
    pub fn truncated(&self) -> Self {
        Self::new(self.x.trunc(), self.y.trunc())
    }
}

impl From<(i32, i32)> for Point2D {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x as f64, y as f64)
    }
}

impl From<(f64, f64)> for Point2D {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

/// Dimensions of the frame a point set lives in.
///
/// Every point that is later used to index a per-pixel map goes through
/// [`ImageBounds::clamp`] first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImageBounds {
    pub width: u32,
    pub height: u32,
}

impl ImageBounds {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::EmptyBounds { width, height });
        }
        Ok(Self { width, height })
    }

    /// Saturate into `[0, width-1] x [0, height-1]`, then truncate to whole pixels
    pub fn clamp(&self, point: &Point2D) -> Point2D {
        let max_x = (self.width - 1) as f64;
        let max_y = (self.height - 1) as f64;
        // NaN coordinates collapse to 0 instead of leaking into index math
        let x = if point.x.is_nan() { 0.0 } else { point.x.clamp(0.0, max_x) };
        let y = if point.y.is_nan() { 0.0 } else { point.y.clamp(0.0, max_y) };
        Point2D::new(x, y).truncated()
    }

    /// Pixel indices of a point already passed through [`ImageBounds::clamp`]
    pub fn pixel(&self, point: &Point2D) -> (u32, u32) {
        let p = self.clamp(point);
        (p.x as u32, p.y as u32)
    }

    pub fn contains(&self, point: &Point2D) -> bool {
        point.x >= 0.0
            && point.y >= 0.0
            && point.x <= (self.width - 1) as f64
            && point.y <= (self.height - 1) as f64
    }
}
