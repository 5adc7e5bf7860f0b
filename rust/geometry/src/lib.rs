// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Stopmark Geometry
//!
//! Planar primitives behind marker placement: total-least-squares segment
//! fitting for boundary clusters, depth-scaled oriented rectangles, and the
//! separating-axis overlap test, built on nalgebra.

pub mod error;
pub mod line_fit;
pub mod overlap;
pub mod point;
pub mod rectangle;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point2, Vector2};

pub use error::{Error, Result};
pub use line_fit::{fit_line, Segment, SegmentFitter, DEFAULT_MIN_CLUSTER_POINTS};
pub use overlap::{rectangles_overlap, OverlapPolicy};
pub use point::{ImageBounds, Point2D};
pub use rectangle::{
    DimensionRounding, Rectangle, RectangleBuilder, BASE_MARKER_LENGTH, BASE_MARKER_WIDTH,
};
