// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Straight-line fitting for boundary-pixel clusters
//!
//! A cluster is reduced to a [`Segment`]: the total-least-squares line through
//! its pixels, cut to the extent of the cluster along that line.

use crate::point::{ImageBounds, Point2D};
use nalgebra::{Matrix2, SymmetricEigen, Vector2};

/// Minimum number of pixels a cluster needs before a fit is attempted
pub const DEFAULT_MIN_CLUSTER_POINTS: usize = 10;

/// Straight approximation of one boundary cluster
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Segment {
    /// Extreme point with the smallest projection onto `direction`
    pub start: Point2D,
    /// Extreme point with the largest projection onto `direction`
    pub end: Point2D,
    /// Unit direction of the fitted line
    pub direction: Vector2<f64>,
    /// `atan2(direction.y, direction.x)` in radians
    pub angle: f64,
}

impl Segment {
    /// Build a segment running from `start` towards `end`.
    ///
    /// Returns `None` when the two points coincide.
    pub fn between(start: Point2D, end: Point2D) -> Option<Self> {
        let delta = Vector2::new(end.x - start.x, end.y - start.y);
        let norm = delta.norm();
        if !norm.is_finite() || norm < 1e-9 {
            return None;
        }
        let direction = delta / norm;
        Some(Self {
            start,
            end,
            direction,
            angle: direction.y.atan2(direction.x),
        })
    }

    /// Planar length in pixels
    pub fn length(&self) -> f64 {
        self.start.distance_to(&self.end)
    }

    /// Scalar position of `point` along the segment, measured from `start`
    pub fn project(&self, point: &Point2D) -> f64 {
        (point.x - self.start.x) * self.direction.x + (point.y - self.start.y) * self.direction.y
    }

    /// Point at distance `t` from `start` along the segment direction
    pub fn point_at(&self, t: f64) -> Point2D {
        Point2D::new(
            self.start.x + t * self.direction.x,
            self.start.y + t * self.direction.y,
        )
    }
}

/// Fits segments to ordered pixel clusters
#[derive(Debug, Clone, Copy)]
pub struct SegmentFitter {
    min_points: usize,
}

impl Default for SegmentFitter {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_CLUSTER_POINTS)
    }
}

impl SegmentFitter {
    pub fn new(min_points: usize) -> Self {
        Self { min_points }
    }

    pub fn min_points(&self) -> usize {
        self.min_points
    }

    /// Whether a cluster carries enough pixels to be fitted
    pub fn has_support(&self, cluster: &[Point2D]) -> bool {
        cluster.len() >= self.min_points && !cluster.is_empty()
    }

    /// Fit a line through `cluster` and return its clamped extreme points.
    ///
    /// `None` means the cluster is too small or has no principal direction
    /// (all pixels coincide).
    pub fn fit(&self, cluster: &[Point2D], bounds: &ImageBounds) -> Option<Segment> {
        if !self.has_support(cluster) {
            return None;
        }

        let (centroid, direction) = fit_line(cluster)?;

        let mut min_t = f64::INFINITY;
        let mut max_t = f64::NEG_INFINITY;
        for point in cluster {
            let t = (point.x - centroid.x) * direction.x + (point.y - centroid.y) * direction.y;
            // strict comparisons keep the first extreme on ties
            if t < min_t {
                min_t = t;
            }
            if t > max_t {
                max_t = t;
            }
        }

        let on_line = |t: f64| {
            Point2D::new(centroid.x + t * direction.x, centroid.y + t * direction.y)
        };

        Some(Segment {
            start: bounds.clamp(&on_line(min_t)),
            end: bounds.clamp(&on_line(max_t)),
            direction,
            angle: direction.y.atan2(direction.x),
        })
    }
}

/// Total-least-squares line through `points`.
///
/// Returns the centroid and the unit principal direction of the scatter
/// matrix, with its sign fixed so that `x > 0`, or `y > 0` when `x` vanishes.
pub fn fit_line(points: &[Point2D]) -> Option<(Point2D, Vector2<f64>)> {
    if points.len() < 2 {
        return None;
    }

    let n = points.len() as f64;
    let cx = points.iter().map(|p| p.x).sum::<f64>() / n;
    let cy = points.iter().map(|p| p.y).sum::<f64>() / n;

    let mut sxx = 0.0;
    let mut syy = 0.0;
    let mut sxy = 0.0;
    for p in points {
        let dx = p.x - cx;
        let dy = p.y - cy;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }

    let scatter = Matrix2::new(sxx / n, sxy / n, sxy / n, syy / n);
    let eig = SymmetricEigen::new(scatter);
    let (principal, lambda) = if eig.eigenvalues[0] >= eig.eigenvalues[1] {
        (eig.eigenvectors.column(0).into_owned(), eig.eigenvalues[0])
    } else {
        (eig.eigenvectors.column(1).into_owned(), eig.eigenvalues[1])
    };
    if !lambda.is_finite() || lambda <= 0.0 {
        return None;
    }

    let norm = principal.norm();
    if !norm.is_finite() || norm < 1e-12 {
        return None;
    }
    let mut direction = principal / norm;
    if direction.x < -1e-12 || (direction.x.abs() <= 1e-12 && direction.y < 0.0) {
        direction = -direction;
    }

    Some((Point2D::new(cx, cy), direction))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn bounds() -> ImageBounds {
        ImageBounds::new(640, 480).unwrap()
    }

    #[test]
    fn test_horizontal_cluster() {
        let cluster: Vec<Point2D> = (0..12).map(|x| Point2D::new(x as f64, 0.0)).collect();
        let segment = SegmentFitter::default().fit(&cluster, &bounds()).unwrap();

        assert_eq!(segment.start, Point2D::new(0.0, 0.0));
        assert_eq!(segment.end, Point2D::new(11.0, 0.0));
        assert_abs_diff_eq!(segment.angle, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_diagonal_cluster_angle_matches_slope() {
        // y = 2x + 5
        let cluster: Vec<Point2D> = (0..20)
            .map(|x| Point2D::new(x as f64 * 3.0, x as f64 * 6.0 + 5.0))
            .collect();
        let segment = SegmentFitter::default().fit(&cluster, &bounds()).unwrap();

        assert_abs_diff_eq!(segment.angle, 2.0_f64.atan(), epsilon = 1e-9);
        // truncation may land one pixel short of an exact extreme
        assert_abs_diff_eq!(segment.start.x, 0.0, epsilon = 1.0);
        assert_abs_diff_eq!(segment.start.y, 5.0, epsilon = 1.0);
        assert_abs_diff_eq!(segment.end.x, 57.0, epsilon = 1.0);
        assert_abs_diff_eq!(segment.end.y, 119.0, epsilon = 1.0);
    }

    #[test]
    fn test_result_independent_of_ordering() {
        let mut cluster: Vec<Point2D> = (0..15)
            .map(|i| Point2D::new(100.0 - i as f64 * 4.0, 40.0 + i as f64 * 3.0))
            .collect();
        let forward = SegmentFitter::default().fit(&cluster, &bounds()).unwrap();
        cluster.reverse();
        cluster.swap(3, 9);
        let shuffled = SegmentFitter::default().fit(&cluster, &bounds()).unwrap();

        assert!(forward.start.distance_to(&shuffled.start) <= 1.5);
        assert!(forward.end.distance_to(&shuffled.end) <= 1.5);
        assert_abs_diff_eq!(forward.angle, shuffled.angle, epsilon = 1e-12);
    }

    #[test]
    fn test_vertical_direction_points_down() {
        let cluster: Vec<Point2D> = (0..10).map(|y| Point2D::new(7.0, 30.0 - y as f64)).collect();
        let segment = SegmentFitter::default().fit(&cluster, &bounds()).unwrap();

        assert_abs_diff_eq!(segment.angle, std::f64::consts::FRAC_PI_2, epsilon = 1e-9);
        assert_eq!(segment.start, Point2D::new(7.0, 21.0));
        assert_eq!(segment.end, Point2D::new(7.0, 30.0));
    }

    #[test]
    fn test_small_and_degenerate_clusters_rejected() {
        let fitter = SegmentFitter::default();
        let short: Vec<Point2D> = (0..9).map(|x| Point2D::new(x as f64, 1.0)).collect();
        assert!(fitter.fit(&short, &bounds()).is_none());

        let stacked = vec![Point2D::new(5.0, 5.0); 25];
        assert!(fitter.fit(&stacked, &bounds()).is_none());
    }

    #[test]
    fn test_endpoints_clamped_to_frame() {
        let cluster: Vec<Point2D> = (0..30).map(|x| Point2D::new(x as f64 * 10.0, 2.0)).collect();
        let small = ImageBounds::new(100, 10).unwrap();
        let segment = SegmentFitter::default().fit(&cluster, &small).unwrap();

        assert_eq!(segment.end, Point2D::new(99.0, 2.0));
    }

    #[test]
    fn test_segment_between() {
        let segment = Segment::between(Point2D::new(0.0, 0.0), Point2D::new(0.0, 10.0)).unwrap();
        assert_abs_diff_eq!(segment.length(), 10.0);
        assert_abs_diff_eq!(segment.project(&Point2D::new(3.0, 4.0)), 4.0);
        assert_eq!(segment.point_at(2.5), Point2D::new(0.0, 2.5));
        assert!(Segment::between(Point2D::new(1.0, 1.0), Point2D::new(1.0, 1.0)).is_none());
    }
}
