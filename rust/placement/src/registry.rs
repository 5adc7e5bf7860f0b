// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Append-only registry of accepted markers

use stopmark_geometry::{OverlapPolicy, Point2D, Rectangle};

/// Outcome of offering a candidate to the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Registered at this index
    Accepted(usize),
    /// Discarded because of the marker at this index
    Rejected { conflict: usize },
}

/// Markers accepted so far in one frame.
///
/// No two registered markers overlap under the registry's policy. Markers
/// are never removed.
#[derive(Debug, Clone, Default)]
pub struct PlacementRegistry {
    policy: OverlapPolicy,
    markers: Vec<Rectangle>,
}

impl PlacementRegistry {
    pub fn new(policy: OverlapPolicy) -> Self {
        Self {
            policy,
            markers: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn markers(&self) -> &[Rectangle] {
        &self.markers
    }

    /// First registered marker, in registration order, that conflicts with `candidate`
    pub fn find_conflict(&self, candidate: &Rectangle) -> Option<usize> {
        self.markers
            .iter()
            .position(|placed| self.policy.overlaps(candidate, placed))
    }

    /// Register `candidate` unless it conflicts with a marker already present
    pub fn try_place(&mut self, candidate: Rectangle) -> Placement {
        match self.find_conflict(&candidate) {
            Some(conflict) => Placement::Rejected { conflict },
            None => {
                self.markers.push(candidate);
                Placement::Accepted(self.markers.len() - 1)
            }
        }
    }

    /// All corners, four per marker, in registration order
    pub fn flattened_corners(&self) -> Vec<Point2D> {
        self.markers.iter().flat_map(|m| m.corners).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x: f64, y: f64, size: f64) -> Rectangle {
        Rectangle::axis_aligned(Point2D::new(x, y), size, size)
    }

    #[test]
    fn test_accept_then_reject_overlapping() {
        let mut registry = PlacementRegistry::default();

        assert_eq!(registry.try_place(square(0.0, 0.0, 10.0)), Placement::Accepted(0));
        assert_eq!(registry.try_place(square(30.0, 0.0, 10.0)), Placement::Accepted(1));
        assert_eq!(
            registry.try_place(square(35.0, 5.0, 10.0)),
            Placement::Rejected { conflict: 1 }
        );
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_first_conflict_wins() {
        let mut registry = PlacementRegistry::default();
        registry.try_place(square(0.0, 0.0, 10.0));
        registry.try_place(square(10.0, 0.0, 10.0));

        // spans both registered squares
        assert_eq!(registry.find_conflict(&square(5.0, 2.0, 10.0)), Some(0));
    }

    #[test]
    fn test_registered_markers_pairwise_disjoint() {
        let mut registry = PlacementRegistry::default();
        for i in 0..20 {
            registry.try_place(square((i * 7) as f64, (i % 3 * 4) as f64, 12.0));
        }

        let markers = registry.markers();
        for (i, a) in markers.iter().enumerate() {
            for b in &markers[i + 1..] {
                assert!(!OverlapPolicy::default().overlaps(a, b));
            }
        }
    }

    #[test]
    fn test_flattened_corners() {
        let mut registry = PlacementRegistry::default();
        registry.try_place(square(0.0, 0.0, 1.0));
        registry.try_place(square(5.0, 5.0, 1.0));

        let corners = registry.flattened_corners();
        assert_eq!(corners.len(), 8);
        assert_eq!(corners[4], Point2D::new(5.0, 5.0));
    }
}
