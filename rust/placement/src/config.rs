// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Placement configuration

use crate::depth::check_calibration;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use stopmark_geometry::{
    DimensionRounding, OverlapPolicy, RectangleBuilder, SegmentFitter, BASE_MARKER_LENGTH,
    BASE_MARKER_WIDTH, DEFAULT_MIN_CLUSTER_POINTS,
};

/// How the top-ranked road components become the calibration region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoadSelection {
    /// Each ranked component replaces the previous one; the smallest kept
    /// component is what survives.
    #[default]
    LastOfTopK,
    /// All kept components together
    UnionTopK,
}

/// Which statistics of the road depth population bound the normalization
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum DepthCalibration {
    /// Population minimum and maximum
    #[default]
    MinMax,
    /// Percentiles in `[0, 100]`, trimming outliers at both ends
    Percentile { low: f64, high: f64 },
}

/// Configuration for the marker placement pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Clusters with fewer pixels are skipped
    pub min_cluster_points: usize,
    /// Segments whose depth-augmented length is at or below this are noise
    pub min_segment_length: f64,
    /// Marker length at scale 1.0 (pixels)
    pub base_marker_length: f64,
    /// Marker width at scale 1.0 (pixels)
    pub base_marker_width: f64,
    /// Reduction of scaled marker dimensions to whole pixels
    pub dimension_rounding: DimensionRounding,
    /// Guard added to the depth range and inset from its bounds
    pub depth_epsilon: f64,
    pub depth_calibration: DepthCalibration,
    /// Mask label of road surface pixels
    pub road_label: u8,
    /// Mask label of boundary pixels
    pub border_label: u8,
    /// Number of largest labelled components considered for the road region
    pub road_keep_count: usize,
    pub road_selection: RoadSelection,
    /// Canny thresholds used when extracting boundary clusters from the mask
    pub canny_low: f32,
    pub canny_high: f32,
    /// Rectangles sharing only an edge or a corner count as overlapping
    pub touching_overlaps: bool,
    /// Corner pairs closer than this count as overlapping (disabled when unset)
    pub min_corner_distance: Option<f64>,
    /// Keep placing markers along an edge while space remains after the last one
    pub fill_edge: bool,
    /// Upper bound on markers per edge in fill-edge mode
    pub max_markers_per_edge: usize,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            min_cluster_points: DEFAULT_MIN_CLUSTER_POINTS,
            min_segment_length: 350.0,
            base_marker_length: BASE_MARKER_LENGTH,
            base_marker_width: BASE_MARKER_WIDTH,
            dimension_rounding: DimensionRounding::Truncate,
            depth_epsilon: 1e-6,
            depth_calibration: DepthCalibration::MinMax,
            road_label: 0,
            border_label: 1,
            road_keep_count: 4,
            road_selection: RoadSelection::LastOfTopK,
            canny_low: 100.0,
            canny_high: 200.0,
            touching_overlaps: false,
            min_corner_distance: None,
            fill_edge: false,
            max_markers_per_edge: 8,
        }
    }
}

impl PlacementConfig {
    /// Load a JSON configuration; missing fields keep their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no frame can be processed with
    pub fn validate(&self) -> Result<()> {
        check_calibration(self.depth_calibration)
    }

    pub fn fitter(&self) -> SegmentFitter {
        SegmentFitter::new(self.min_cluster_points)
    }

    pub fn rectangle_builder(&self) -> RectangleBuilder {
        RectangleBuilder {
            base_length: self.base_marker_length,
            base_width: self.base_marker_width,
            rounding: self.dimension_rounding,
        }
    }

    pub fn overlap_policy(&self) -> OverlapPolicy {
        OverlapPolicy {
            touching_overlaps: self.touching_overlaps,
            min_corner_distance: self.min_corner_distance,
        }
    }
}
