// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Oriented marker footprints

use crate::point::Point2D;
use nalgebra::{Rotation2, Vector2};

/// Unscaled marker length in pixels (scale factor 1.0)
pub const BASE_MARKER_LENGTH: f64 = 450.0;
/// Unscaled marker width in pixels (scale factor 1.0)
pub const BASE_MARKER_WIDTH: f64 = 240.0;

/// Quadrilateral with a fixed winding order.
///
/// Edge `i` joins `corners[i]` and `corners[(i + 1) % 4]` for every consumer.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rectangle {
    pub corners: [Point2D; 4],
}

impl Rectangle {
    pub fn new(corners: [Point2D; 4]) -> Self {
        Self { corners }
    }

    /// Axis-aligned rectangle with one corner at `origin`, extending
    /// `length` along +x and `width` along +y.
    pub fn axis_aligned(origin: Point2D, length: f64, width: f64) -> Self {
        Self::new([
            origin,
            Point2D::new(origin.x + length, origin.y),
            Point2D::new(origin.x + length, origin.y + width),
            Point2D::new(origin.x, origin.y + width),
        ])
    }

    /// Edges as (from, to) corner pairs, in winding order
    pub fn edges(&self) -> impl Iterator<Item = (Point2D, Point2D)> + '_ {
        (0..4).map(move |i| (self.corners[i], self.corners[(i + 1) % 4]))
    }

    /// Rotate every corner about `pivot` by `angle` radians, truncating the
    /// results to whole pixels.
    pub fn rotated_about(&self, pivot: &Point2D, angle: f64) -> Self {
        let rotation = Rotation2::new(angle);
        let origin = pivot.to_nalgebra();
        let mut corners = self.corners;
        for corner in corners.iter_mut() {
            let rotated = origin + rotation * (corner.to_nalgebra() - origin);
            *corner = Point2D::from_nalgebra(&rotated).truncated();
        }
        Self::new(corners)
    }

    /// Extent of the corners projected onto `axis`, as `(min, max)`
    pub fn project(&self, axis: &Vector2<f64>) -> (f64, f64) {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for corner in &self.corners {
            let dot = corner.dot(axis);
            if dot < lo {
                lo = dot;
            }
            if dot > hi {
                hi = dot;
            }
        }
        (lo, hi)
    }

    /// Shoelace area
    pub fn area(&self) -> f64 {
        let mut area = 0.0;
        for (a, b) in self.edges() {
            area += a.x * b.y - b.x * a.y;
        }
        (area / 2.0).abs()
    }
}

/// How scaled marker dimensions are reduced to whole pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DimensionRounding {
    /// Toward zero
    #[default]
    Truncate,
    /// To the nearest integer, halves away from zero
    Nearest,
}

impl DimensionRounding {
    pub fn apply(self, value: f64) -> f64 {
        match self {
            DimensionRounding::Truncate => value.trunc(),
            DimensionRounding::Nearest => value.round(),
        }
    }
}

/// Builds depth-scaled, oriented marker rectangles
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RectangleBuilder {
    pub base_length: f64,
    pub base_width: f64,
    pub rounding: DimensionRounding,
}

impl Default for RectangleBuilder {
    fn default() -> Self {
        Self {
            base_length: BASE_MARKER_LENGTH,
            base_width: BASE_MARKER_WIDTH,
            rounding: DimensionRounding::Truncate,
        }
    }
}

impl RectangleBuilder {
    /// Marker `(length, width)` in whole pixels for a given scale factor
    pub fn dimensions(&self, scale: f64) -> (f64, f64) {
        (
            self.rounding.apply(self.base_length * scale),
            self.rounding.apply(self.base_width * scale),
        )
    }

    /// Marker anchored at `anchor`, sized by `scale` and turned by `angle`
    pub fn build(&self, anchor: &Point2D, scale: f64, angle: f64) -> Rectangle {
        let (length, width) = self.dimensions(scale);
        Rectangle::axis_aligned(*anchor, length, width).rotated_about(anchor, angle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_axis_aligned_winding() {
        let rect = Rectangle::axis_aligned(Point2D::new(10.0, 20.0), 5.0, 3.0);
        assert_eq!(
            rect.corners,
            [
                Point2D::new(10.0, 20.0),
                Point2D::new(15.0, 20.0),
                Point2D::new(15.0, 23.0),
                Point2D::new(10.0, 23.0),
            ]
        );
        assert!((rect.area() - 15.0).abs() < 0.001);
    }

    #[test]
    fn test_zero_angle_keeps_corners() {
        let builder = RectangleBuilder::default();
        let rect = builder.build(&Point2D::new(100.0, 50.0), 0.5, 0.0);

        assert_eq!(rect.corners[0], Point2D::new(100.0, 50.0));
        assert_eq!(rect.corners[2], Point2D::new(325.0, 170.0));
    }

    #[test]
    fn test_quarter_turn() {
        let builder = RectangleBuilder::default();
        let rect = builder.build(&Point2D::new(500.0, 500.0), 1.0, FRAC_PI_2);

        // anchor stays put, the long side now runs along +y
        assert_eq!(rect.corners[0], Point2D::new(500.0, 500.0));
        assert!((rect.corners[1].x - 500.0).abs() <= 1.0);
        assert!((rect.corners[1].y - 950.0).abs() <= 1.0);
        assert!((rect.corners[3].x - 260.0).abs() <= 1.0);
        assert!((rect.corners[3].y - 500.0).abs() <= 1.0);
    }

    #[test]
    fn test_dimension_rounding() {
        let truncating = RectangleBuilder::default();
        assert_eq!(truncating.dimensions(0.999_999_9), (449.0, 239.0));

        let nearest = RectangleBuilder {
            rounding: DimensionRounding::Nearest,
            ..Default::default()
        };
        assert_eq!(nearest.dimensions(0.999_999_9), (450.0, 240.0));
        assert_eq!(nearest.dimensions(0.0), (0.0, 0.0));
    }
}
