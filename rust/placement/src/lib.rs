// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Depth-scaled stopping-position markers along road boundaries
//!
//! Given one frame's boundary mask and depth map, this crate:
//! 1. Fits a straight segment to every boundary-pixel cluster
//! 2. Drops segments that are short once depth is taken into account
//! 3. Sizes a marker per segment from the road depth range
//! 4. Accepts markers greedily, rejecting any that overlap an accepted one
//!
//! # Usage
//!
//! ```rust,ignore
//! use stopmark_placement::{place_markers, PlacementConfig};
//!
//! let outcome = place_markers(&mask, &depth, &PlacementConfig::default())?;
//! for marker in &outcome.markers {
//!     println!("{:?}", marker.rectangle.corners);
//! }
//! ```

pub mod config;
pub mod depth;
pub mod error;
pub mod image_ops;
pub mod pipeline;
pub mod registry;
pub mod render;
pub mod road_region;
pub mod types;

// Re-export commonly used types and functions
pub use config::{DepthCalibration, PlacementConfig, RoadSelection};
pub use depth::DepthNormalizer;
pub use error::{DepthRangeIssue, PlacementError, Result};
pub use image_ops::{boundary_clusters, load_depth, load_mask, resize_depth};
pub use pipeline::SegmentPipeline;
pub use registry::{Placement, PlacementRegistry};
pub use render::render_overlay;
pub use road_region::RoadRegion;
pub use types::{
    Cluster, Decision, DecisionRecord, DepthImage, Frame, PlacedMarker, PlacementOutcome,
};

use image::GrayImage;

/// Run the whole pipeline on one mask/depth pair.
///
/// Boundary clusters are extracted from the mask's border label, then
/// placed in the order the contour follower found them.
pub fn place_markers(
    mask: &GrayImage,
    depth: &DepthImage,
    config: &PlacementConfig,
) -> Result<PlacementOutcome> {
    config.validate()?;
    let frame = Frame::new(mask, depth)?;
    let clusters = boundary_clusters(mask, config.border_label, config.canny_low, config.canny_high);
    tracing::debug!(clusters = clusters.len(), "Extracted boundary clusters");

    Ok(SegmentPipeline::new(config.clone()).run(&frame, &clusters))
}
