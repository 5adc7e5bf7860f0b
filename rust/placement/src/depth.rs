// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Depth-to-scale normalization calibrated on the road depth population

use crate::config::DepthCalibration;
use crate::error::{DepthRangeIssue, PlacementError, Result};

/// Maps raw depth values to marker scale factors.
///
/// Under this depth convention smaller raw values are closer to the camera,
/// so the road minimum maps to a scale near 1 and the maximum near 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthNormalizer {
    min: f64,
    max: f64,
    epsilon: f64,
}

impl DepthNormalizer {
    pub fn new(min: f64, max: f64, epsilon: f64) -> Self {
        Self { min, max, epsilon }
    }

    /// Derive the depth range from road samples.
    ///
    /// Non-finite samples are ignored. Fails when no sample remains or all
    /// remaining samples are equal, and rejects percentile bounds that are
    /// not strictly increasing.
    pub fn calibrate(samples: &[f32], calibration: DepthCalibration, epsilon: f64) -> Result<Self> {
        check_calibration(calibration)?;

        let mut values: Vec<f64> = samples
            .iter()
            .filter(|v| v.is_finite())
            .map(|&v| v as f64)
            .collect();
        if values.is_empty() {
            return Err(PlacementError::DegenerateDepthRange(DepthRangeIssue::Empty));
        }

        let (min, max) = match calibration {
            DepthCalibration::MinMax => values
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                    (lo.min(v), hi.max(v))
                }),
            DepthCalibration::Percentile { low, high } => {
                values.sort_by(|a, b| a.total_cmp(b));
                (percentile(&values, low), percentile(&values, high))
            }
        };

        if max <= min {
            return Err(PlacementError::DegenerateDepthRange(DepthRangeIssue::Flat(min)));
        }
        Ok(Self::new(min, max, epsilon))
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// Scale factor for one raw depth value.
    ///
    /// The value is clipped into `[min + eps, max - eps]` first, so the
    /// result stays strictly inside (0, 1) for a non-degenerate range.
    /// A flat range yields 1.0.
    pub fn scale(&self, value: f64) -> f64 {
        let span = self.max - self.min;
        if span <= 0.0 {
            return 1.0;
        }
        let clipped = value.max(self.min + self.epsilon).min(self.max - self.epsilon);
        (self.max - clipped) / (span + self.epsilon)
    }

    /// Average scale of a segment's two endpoint depths
    pub fn mean_scale(&self, start: f64, end: f64) -> f64 {
        (self.scale(start) + self.scale(end)) / 2.0
    }

    /// `ln(1 + max(v - min, 0)) / ln(1 + (max - min))`, reported for
    /// diagnostics only.
    pub fn log_compressed(&self, value: f64) -> f64 {
        let span = self.max - self.min;
        if span <= 0.0 {
            return 0.0;
        }
        (value - self.min).max(0.0).ln_1p() / span.ln_1p()
    }
}

/// Percentile bounds must be strictly increasing
pub fn check_calibration(calibration: DepthCalibration) -> Result<()> {
    if let DepthCalibration::Percentile { low, high } = calibration {
        if !(low < high) {
            return Err(PlacementError::InvalidInput(format!(
                "percentile bounds must satisfy low < high, got {} and {}",
                low, high
            )));
        }
    }
    Ok(())
}

/// Percentile of sorted values with linear interpolation between order
/// statistics; `q` is clamped into `[0, 100]`.
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let rank = (q.clamp(0.0, 100.0) / 100.0) * (n - 1) as f64;
            let lower = rank.floor() as usize;
            let upper = rank.ceil() as usize;
            let frac = rank - lower as f64;
            sorted[lower] + (sorted[upper] - sorted[lower]) * frac
        }
    }
}
