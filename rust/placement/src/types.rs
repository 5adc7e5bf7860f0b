// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core types for marker placement

use crate::error::{PlacementError, Result};
use image::{GrayImage, ImageBuffer, Luma};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use stopmark_geometry::{ImageBounds, Point2D, Rectangle, Segment};

/// Per-pixel depth proxy, same layout as the boundary mask
pub type DepthImage = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Ordered pixel coordinates of one boundary cluster
pub type Cluster = Vec<Point2D>;

/// One frame's mask/depth pair, validated to share dimensions
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub mask: &'a GrayImage,
    pub depth: &'a DepthImage,
    pub bounds: ImageBounds,
}

impl<'a> Frame<'a> {
    pub fn new(mask: &'a GrayImage, depth: &'a DepthImage) -> Result<Self> {
        if mask.dimensions() != depth.dimensions() {
            return Err(PlacementError::DimensionMismatch {
                mask: mask.dimensions(),
                depth: depth.dimensions(),
            });
        }
        let bounds = ImageBounds::new(mask.width(), mask.height()).map_err(|_| {
            PlacementError::InvalidInput(format!(
                "frame must not be empty, got {}x{}",
                mask.width(),
                mask.height()
            ))
        })?;
        Ok(Self {
            mask,
            depth,
            bounds,
        })
    }

    /// Raw depth at `point`, clamped into the frame
    pub fn depth_at(&self, point: &Point2D) -> f64 {
        let (x, y) = self.bounds.pixel(point);
        self.depth.get_pixel(x, y).0[0] as f64
    }

    /// Length of a segment over (x, y, depth) with depth sampled at both ends
    pub fn length_3d(&self, segment: &Segment) -> f64 {
        let dx = segment.start.x - segment.end.x;
        let dy = segment.start.y - segment.end.y;
        let dz = self.depth_at(&segment.start) - self.depth_at(&segment.end);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// An accepted marker together with where it came from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacedMarker {
    /// Index of the source cluster in the input order
    pub cluster: usize,
    /// Position of this marker along its edge (0 unless fill-edge mode adds more)
    pub slot: usize,
    pub rectangle: Rectangle,
    /// Segment the marker is anchored on
    pub segment: Segment,
    /// Mean normalized depth scale of the segment endpoints
    pub scale: f64,
    pub length: f64,
    pub width: f64,
}

/// What happened to one placement attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    /// Cluster had fewer pixels than the fitter needs
    TooFewPoints { points: usize },
    /// Cluster pixels have no principal direction
    Degenerate,
    /// Depth-augmented length at or below the threshold
    TooShort { segment: Segment, length: f64 },
    /// Road depth calibration failed for this frame
    DepthUnavailable { segment: Segment },
    /// Fill-edge follow-up whose scaled marker has zero length
    NoExtent { segment: Segment, scale: f64 },
    /// Candidate overlapped the registry entry at `conflict`
    Rejected {
        segment: Segment,
        candidate: Rectangle,
        conflict: usize,
    },
    /// Candidate was registered as `marker`
    Accepted { segment: Segment, marker: usize },
}

impl Decision {
    /// Segment that survived fitting, if any
    pub fn segment(&self) -> Option<&Segment> {
        match self {
            Decision::TooFewPoints { .. } | Decision::Degenerate => None,
            Decision::TooShort { segment, .. }
            | Decision::DepthUnavailable { segment }
            | Decision::NoExtent { segment, .. }
            | Decision::Rejected { segment, .. }
            | Decision::Accepted { segment, .. } => Some(segment),
        }
    }

    /// Whether the segment passed the length filter
    pub fn is_retained(&self) -> bool {
        matches!(
            self,
            Decision::DepthUnavailable { .. }
                | Decision::NoExtent { .. }
                | Decision::Rejected { .. }
                | Decision::Accepted { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub cluster: usize,
    #[serde(flatten)]
    pub decision: Decision,
}

/// Result of one pipeline run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlacementOutcome {
    /// Accepted markers in acceptance order
    pub markers: Vec<PlacedMarker>,
    /// Every attempt in processing order
    pub decisions: Vec<DecisionRecord>,
    /// Pixels in the road calibration region
    pub road_pixels: usize,
    /// `(min, max)` of the calibrated road depth range
    pub depth_range: Option<(f64, f64)>,
}

impl PlacementOutcome {
    pub fn rectangles(&self) -> Vec<Rectangle> {
        self.markers.iter().map(|m| m.rectangle).collect()
    }

    pub fn rejected_count(&self) -> usize {
        self.decisions
            .iter()
            .filter(|r| matches!(r.decision, Decision::Rejected { .. }))
            .count()
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
