// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for marker placement.

use std::fmt;

/// Result type alias for placement operations.
pub type Result<T> = std::result::Result<T, PlacementError>;

/// Why a road depth population cannot calibrate a normalizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DepthRangeIssue {
    /// The road region holds no usable depth sample.
    Empty,
    /// Every road sample has the same value.
    Flat(f64),
}

impl fmt::Display for DepthRangeIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DepthRangeIssue::Empty => write!(f, "road region has no depth samples"),
            DepthRangeIssue::Flat(value) => {
                write!(f, "all road depth samples equal {}", value)
            }
        }
    }
}

/// Errors that can occur while placing markers.
#[derive(Debug, thiserror::Error)]
pub enum PlacementError {
    /// Inputs that cannot be processed at all.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Mask and depth map disagree on frame size.
    #[error("mask is {}x{} but depth map is {}x{}", mask.0, mask.1, depth.0, depth.1)]
    DimensionMismatch { mask: (u32, u32), depth: (u32, u32) },

    /// Depth normalization is undefined for this road population.
    #[error("degenerate road depth range: {0}")]
    DegenerateDepthRange(DepthRangeIssue),

    #[error(transparent)]
    Geometry(#[from] stopmark_geometry::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
