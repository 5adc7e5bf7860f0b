// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Separating-axis overlap test for marker quadrilaterals
//!
//! Both rectangles contribute the normals of their four edges as candidate
//! axes. The first axis whose projection intervals do not overlap certifies
//! the pair as disjoint and ends the test.

use crate::point::Point2D;
use crate::rectangle::Rectangle;
use nalgebra::Vector2;

/// Knobs for [`OverlapPolicy::overlaps`]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OverlapPolicy {
    /// When `true`, intervals that only share an endpoint are not a
    /// separation, so rectangles touching along an edge or at a corner
    /// overlap. When `false`, touching rectangles are disjoint.
    pub touching_overlaps: bool,
    /// Any corner pair closer than this counts as overlap. Disabled when `None`.
    pub min_corner_distance: Option<f64>,
}

impl OverlapPolicy {
    /// Whether `a` and `b` conflict under this policy
    pub fn overlaps(&self, a: &Rectangle, b: &Rectangle) -> bool {
        if self.intersects(a, b) {
            return true;
        }
        match self.min_corner_distance {
            Some(min_distance) => corners_within(a, b, min_distance),
            None => false,
        }
    }

    fn intersects(&self, a: &Rectangle, b: &Rectangle) -> bool {
        for rect in [a, b] {
            for (from, to) in rect.edges() {
                let axis = edge_normal(&from, &to);
                let (min_a, max_a) = a.project(&axis);
                let (min_b, max_b) = b.project(&axis);
                let separated = if self.touching_overlaps {
                    max_a < min_b || max_b < min_a
                } else {
                    max_a <= min_b || max_b <= min_a
                };
                if separated {
                    return false;
                }
            }
        }
        true
    }
}

/// Separating-axis test with the default policy: touching rectangles are
/// disjoint and corner proximity is ignored.
pub fn rectangles_overlap(a: &Rectangle, b: &Rectangle) -> bool {
    OverlapPolicy::default().overlaps(a, b)
}

/// Perpendicular of the edge vector `to - from` (not normalized)
fn edge_normal(from: &Point2D, to: &Point2D) -> Vector2<f64> {
    Vector2::new(-(to.y - from.y), to.x - from.x)
}

fn corners_within(a: &Rectangle, b: &Rectangle, min_distance: f64) -> bool {
    a.corners
        .iter()
        .any(|ca| b.corners.iter().any(|cb| ca.distance_to(cb) < min_distance))
}
