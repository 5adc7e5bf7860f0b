// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-frame orchestration: fit, filter, scale, build, place
//!
//! Clusters are fitted in parallel. Everything after fitting runs
//! sequentially in cluster order, because whether a marker is accepted
//! depends on every marker accepted before it.

use crate::config::PlacementConfig;
use crate::depth::DepthNormalizer;
use crate::error::Result;
use crate::registry::{Placement, PlacementRegistry};
use crate::road_region::RoadRegion;
use crate::types::{Cluster, Decision, DecisionRecord, Frame, PlacedMarker, PlacementOutcome};
use rayon::prelude::*;
use stopmark_geometry::{Rectangle, RectangleBuilder, Segment, SegmentFitter};

/// Greedy, order-dependent marker placement for one frame
#[derive(Debug, Clone, Default)]
pub struct SegmentPipeline {
    config: PlacementConfig,
}

/// Mutable state of one run
struct FrameState<'f, 'a> {
    frame: &'f Frame<'a>,
    normalizer: Option<DepthNormalizer>,
    registry: PlacementRegistry,
    outcome: PlacementOutcome,
}

impl SegmentPipeline {
    pub fn new(config: PlacementConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlacementConfig {
        &self.config
    }

    /// Place markers for every cluster of `frame`, in the order given.
    ///
    /// A fresh registry is used per call, so identical inputs always give
    /// identical outcomes.
    pub fn run(&self, frame: &Frame, clusters: &[Cluster]) -> PlacementOutcome {
        let road = RoadRegion::extract(
            frame.mask,
            self.config.road_label,
            self.config.road_keep_count,
            self.config.road_selection,
        );
        let normalizer = self.calibrate(frame, &road).ok();

        let fitter = self.config.fitter();
        let segments: Vec<Option<Segment>> = clusters
            .par_iter()
            .map(|cluster| fitter.fit(cluster, &frame.bounds))
            .collect();

        let mut state = FrameState {
            frame,
            normalizer,
            registry: PlacementRegistry::new(self.config.overlap_policy()),
            outcome: PlacementOutcome {
                road_pixels: road.pixel_count(),
                depth_range: normalizer.map(|n| (n.min(), n.max())),
                ..Default::default()
            },
        };

        for (index, (cluster, segment)) in clusters.iter().zip(segments).enumerate() {
            match segment {
                Some(segment) => self.place_along(&mut state, index, segment),
                None => {
                    let decision = if fitter.has_support(cluster) {
                        Decision::Degenerate
                    } else {
                        Decision::TooFewPoints {
                            points: cluster.len(),
                        }
                    };
                    tracing::debug!(cluster = index, points = cluster.len(), ?decision, "Skipping cluster");
                    state.record(index, decision);
                }
            }
        }

        tracing::info!(
            clusters = clusters.len(),
            accepted = state.outcome.markers.len(),
            rejected = state.outcome.rejected_count(),
            road_pixels = state.outcome.road_pixels,
            "Marker placement complete"
        );

        state.outcome
    }

    fn calibrate(&self, frame: &Frame, road: &RoadRegion) -> Result<DepthNormalizer> {
        let samples = road.depth_samples(frame.depth);
        let result = DepthNormalizer::calibrate(
            &samples,
            self.config.depth_calibration,
            self.config.depth_epsilon,
        );
        match &result {
            Ok(normalizer) => tracing::debug!(
                samples = samples.len(),
                min = normalizer.min(),
                max = normalizer.max(),
                "Calibrated road depth range"
            ),
            Err(error) => tracing::warn!(
                samples = samples.len(),
                %error,
                "Road depth calibration failed; retained segments will be skipped"
            ),
        }
        result
    }

    /// Place the marker for one fitted segment, then keep filling the edge
    /// while fill-edge mode is on and space remains.
    fn place_along(&self, state: &mut FrameState, cluster: usize, segment: Segment) {
        let builder = self.config.rectangle_builder();
        let limit = if self.config.fill_edge {
            self.config.max_markers_per_edge.max(1)
        } else {
            1
        };

        let mut current = segment;
        for slot in 0..limit {
            let Some(marker) = self.place_one(state, &builder, cluster, slot, current) else {
                return;
            };
            if slot + 1 == limit {
                return;
            }
            match follow_up(&current, &marker, state.frame) {
                Some(next) => current = next,
                None => return,
            }
        }
    }

    /// Run one segment through the length filter, scaling, building and
    /// the registry. Returns the accepted marker, if any.
    fn place_one(
        &self,
        state: &mut FrameState,
        builder: &RectangleBuilder,
        cluster: usize,
        slot: usize,
        segment: Segment,
    ) -> Option<PlacedMarker> {
        let length = state.frame.length_3d(&segment);
        // NaN depth at an endpoint must not pass the filter
        if !(length > self.config.min_segment_length) {
            tracing::debug!(cluster, slot, length, "Segment too short");
            state.record(cluster, Decision::TooShort { segment, length });
            return None;
        }

        let Some(normalizer) = state.normalizer else {
            state.record(cluster, Decision::DepthUnavailable { segment });
            return None;
        };

        let start_depth = state.frame.depth_at(&segment.start);
        let end_depth = state.frame.depth_at(&segment.end);
        let scale = normalizer.mean_scale(start_depth, end_depth);
        tracing::debug!(
            cluster,
            slot,
            scale,
            log_start = normalizer.log_compressed(start_depth),
            log_end = normalizer.log_compressed(end_depth),
            "Depth scale"
        );

        let (marker_length, marker_width) = builder.dimensions(scale);
        if slot > 0 && marker_length <= 0.0 {
            tracing::debug!(cluster, slot, scale, "Follow-up marker has no extent");
            state.record(cluster, Decision::NoExtent { segment, scale });
            return None;
        }

        let rectangle = builder.build(&segment.start, scale, segment.angle);
        match state.registry.try_place(rectangle) {
            Placement::Accepted(marker) => {
                tracing::debug!(cluster, slot, marker, "Marker accepted");
                let placed = PlacedMarker {
                    cluster,
                    slot,
                    rectangle,
                    segment,
                    scale,
                    length: marker_length,
                    width: marker_width,
                };
                state.outcome.markers.push(placed.clone());
                state.record(cluster, Decision::Accepted { segment, marker });
                Some(placed)
            }
            Placement::Rejected { conflict } => {
                tracing::debug!(cluster, slot, conflict, "Marker overlaps a placed marker");
                state.record(
                    cluster,
                    Decision::Rejected {
                        segment,
                        candidate: rectangle,
                        conflict,
                    },
                );
                None
            }
        }
    }
}

impl FrameState<'_, '_> {
    fn record(&mut self, cluster: usize, decision: Decision) {
        self.outcome.decisions.push(DecisionRecord { cluster, decision });
    }
}

/// Segment covering the rest of `segment` after `marker`, when the space
/// left exceeds the marker's own length.
fn follow_up(segment: &Segment, marker: &PlacedMarker, frame: &Frame) -> Option<Segment> {
    if marker.length <= 0.0 {
        return None;
    }
    let far_edge = far_projection(segment, &marker.rectangle);
    let remaining = segment.length() - far_edge;
    if remaining <= marker.length {
        return None;
    }

    let start = frame.bounds.clamp(&segment.point_at(far_edge + 1.0));
    if start == segment.start || start == segment.end {
        return None;
    }
    Some(Segment {
        start,
        end: segment.end,
        direction: segment.direction,
        angle: segment.angle,
    })
}

/// Largest corner position along `segment`, measured from its start
fn far_projection(segment: &Segment, rectangle: &Rectangle) -> f64 {
    rectangle
        .corners
        .iter()
        .map(|corner| segment.project(corner))
        .fold(f64::NEG_INFINITY, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DepthImage;
    use image::{GrayImage, Luma};
    use stopmark_geometry::Point2D;

    /// Whole frame is road; depth rises linearly from 10 at the top row to
    /// 50 at the bottom row.
    fn frame_inputs(width: u32, height: u32) -> (GrayImage, DepthImage) {
        let mask = GrayImage::from_pixel(width, height, Luma([0]));
        let depth = DepthImage::from_fn(width, height, |_, y| {
            Luma([10.0 + 40.0 * y as f32 / (height - 1) as f32])
        });
        (mask, depth)
    }

    fn horizontal(x0: i32, x1: i32, y: i32) -> Cluster {
        (x0..=x1).map(|x| Point2D::from((x, y))).collect()
    }

    #[test]
    fn test_short_segments_are_dropped() {
        let (mask, depth) = frame_inputs(800, 600);
        let frame = Frame::new(&mask, &depth).unwrap();
        let clusters = vec![horizontal(100, 500, 100), horizontal(100, 200, 400)];

        let outcome = SegmentPipeline::default().run(&frame, &clusters);

        assert_eq!(outcome.markers.len(), 1);
        assert_eq!(outcome.markers[0].cluster, 0);
        assert!(matches!(
            outcome.decisions[1].decision,
            Decision::TooShort { length, .. } if (length - 100.0).abs() < 1e-9
        ));
    }

    #[test]
    fn test_nan_endpoint_depth_is_dropped() {
        let (mask, mut depth) = frame_inputs(800, 600);
        depth.put_pixel(100, 100, Luma([f32::NAN]));
        let frame = Frame::new(&mask, &depth).unwrap();

        let outcome = SegmentPipeline::default().run(&frame, &[horizontal(100, 200, 100)]);

        assert!(outcome.markers.is_empty());
        assert!(matches!(
            outcome.decisions[0].decision,
            Decision::TooShort { length, .. } if length.is_nan()
        ));
    }

    #[test]
    fn test_marker_size_follows_depth() {
        let (mask, depth) = frame_inputs(800, 600);
        let frame = Frame::new(&mask, &depth).unwrap();
        // near edge on the top row, far edge on the bottom row
        let clusters = vec![horizontal(0, 400, 0), horizontal(0, 400, 599)];

        let outcome = SegmentPipeline::default().run(&frame, &clusters);
        assert_eq!(outcome.markers.len(), 2);

        let near = &outcome.markers[0];
        assert_eq!((near.length, near.width), (449.0, 239.0));
        assert_eq!(near.rectangle.corners[0], Point2D::new(0.0, 0.0));
        assert_eq!(near.rectangle.corners[2], Point2D::new(449.0, 239.0));

        let far = &outcome.markers[1];
        assert!(far.scale < 1e-3);
        assert_eq!((far.length, far.width), (0.0, 0.0));
    }

    #[test]
    fn test_overlapping_candidate_is_rejected() {
        let (mask, depth) = frame_inputs(800, 600);
        let frame = Frame::new(&mask, &depth).unwrap();
        let clusters = vec![horizontal(100, 500, 100), horizontal(100, 500, 110)];

        let outcome = SegmentPipeline::default().run(&frame, &clusters);

        assert_eq!(outcome.markers.len(), 1);
        assert_eq!(outcome.rejected_count(), 1);
        assert!(matches!(
            outcome.decisions[1].decision,
            Decision::Rejected { conflict: 0, .. }
        ));
    }

    #[test]
    fn test_empty_cluster_list() {
        let (mask, depth) = frame_inputs(64, 64);
        let frame = Frame::new(&mask, &depth).unwrap();

        let outcome = SegmentPipeline::default().run(&frame, &[]);
        assert!(outcome.markers.is_empty());
        assert!(outcome.decisions.is_empty());
        assert_eq!(outcome.road_pixels, 64 * 64);
    }

    #[test]
    fn test_small_and_degenerate_clusters() {
        let (mask, depth) = frame_inputs(800, 600);
        let frame = Frame::new(&mask, &depth).unwrap();
        let clusters = vec![
            horizontal(0, 5, 10),
            vec![Point2D::new(30.0, 30.0); 12],
        ];

        let outcome = SegmentPipeline::default().run(&frame, &clusters);
        assert!(outcome.markers.is_empty());
        assert_eq!(outcome.decisions[0].decision, Decision::TooFewPoints { points: 6 });
        assert_eq!(outcome.decisions[1].decision, Decision::Degenerate);
    }

    #[test]
    fn test_runs_are_idempotent() {
        let (mask, depth) = frame_inputs(800, 600);
        let frame = Frame::new(&mask, &depth).unwrap();
        let clusters = vec![
            horizontal(0, 420, 50),
            horizontal(50, 480, 55),
            horizontal(200, 700, 500),
        ];
        let pipeline = SegmentPipeline::default();

        let first = pipeline.run(&frame, &clusters);
        let second = pipeline.run(&frame, &clusters);
        assert_eq!(first.rectangles(), second.rectangles());
        assert_eq!(first.decisions, second.decisions);
    }

    #[test]
    fn test_flat_road_depth_skips_segments() {
        let mask = GrayImage::from_pixel(800, 600, Luma([0]));
        let depth = DepthImage::from_pixel(800, 600, Luma([25.0]));
        let frame = Frame::new(&mask, &depth).unwrap();

        let outcome = SegmentPipeline::default().run(&frame, &[horizontal(0, 400, 10)]);

        assert!(outcome.markers.is_empty());
        assert!(outcome.depth_range.is_none());
        assert!(matches!(
            outcome.decisions[0].decision,
            Decision::DepthUnavailable { .. }
        ));
    }

    #[test]
    fn test_fill_edge_places_consecutive_markers() {
        let (mask, depth) = frame_inputs(1600, 600);
        let frame = Frame::new(&mask, &depth).unwrap();
        let clusters = vec![horizontal(0, 1500, 0)];

        let single = SegmentPipeline::default().run(&frame, &clusters);
        assert_eq!(single.markers.len(), 1);

        let config = PlacementConfig {
            fill_edge: true,
            ..Default::default()
        };
        let filled = SegmentPipeline::new(config).run(&frame, &clusters);

        let starts: Vec<f64> = filled.markers.iter().map(|m| m.segment.start.x).collect();
        assert_eq!(starts, vec![0.0, 450.0, 900.0]);
        assert_eq!(
            filled.markers.iter().map(|m| m.slot).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn test_fill_edge_records_vanishing_follow_up() {
        // far half of the edge sits at the road maximum: the first marker
        // gets half scale, the follow-up none
        let mask = GrayImage::from_pixel(1600, 600, Luma([0]));
        let depth = DepthImage::from_fn(1600, 600, |x, y| {
            if y == 0 && x >= 200 {
                Luma([50.0])
            } else {
                Luma([10.0 + 40.0 * y as f32 / 599.0])
            }
        });
        let frame = Frame::new(&mask, &depth).unwrap();
        let config = PlacementConfig {
            fill_edge: true,
            ..Default::default()
        };

        let outcome = SegmentPipeline::new(config).run(&frame, &[horizontal(0, 1500, 0)]);

        assert_eq!(outcome.markers.len(), 1);
        assert_eq!(outcome.markers[0].length, 224.0);
        assert_eq!(outcome.decisions.len(), 2);
        match &outcome.decisions[1].decision {
            Decision::NoExtent { segment, scale } => {
                assert_eq!(segment.start, Point2D::new(225.0, 0.0));
                assert!(*scale < 1e-3);
            }
            other => panic!("unexpected decision {:?}", other),
        }
    }

    #[test]
    fn test_fill_edge_respects_cap() {
        let (mask, depth) = frame_inputs(1600, 600);
        let frame = Frame::new(&mask, &depth).unwrap();

        let config = PlacementConfig {
            fill_edge: true,
            max_markers_per_edge: 2,
            ..Default::default()
        };
        let outcome = SegmentPipeline::new(config).run(&frame, &[horizontal(0, 1500, 0)]);
        assert_eq!(outcome.markers.len(), 2);
    }
}
