// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Road region used to calibrate depth normalization

use crate::config::RoadSelection;
use crate::types::DepthImage;
use image::{GrayImage, Luma};
use imageproc::region_labelling::{connected_components, Connectivity};
use rustc_hash::{FxHashMap, FxHashSet};

/// Pixels of the kept road components
#[derive(Debug, Clone)]
pub struct RoadRegion {
    width: u32,
    height: u32,
    members: Vec<bool>,
    pixel_count: usize,
    /// Component labels that make up the region, in selection order
    pub components: Vec<u32>,
}

impl RoadRegion {
    /// Select road pixels of `mask`, label their 4-connected components and
    /// keep the largest according to `selection`.
    ///
    /// All labels, the non-road background (label 0) included, are ranked by
    /// pixel count (descending, ties by label) and the first `keep` are
    /// visited in that order. The background is skipped when visited.
    pub fn extract(mask: &GrayImage, road_label: u8, keep: usize, selection: RoadSelection) -> Self {
        let (width, height) = mask.dimensions();

        let mut road = GrayImage::new(width, height);
        for (x, y, pixel) in mask.enumerate_pixels() {
            if pixel.0[0] == road_label {
                road.put_pixel(x, y, Luma([255]));
            }
        }

        let labels = connected_components(&road, Connectivity::Four, Luma([0u8]));

        let mut counts: FxHashMap<u32, usize> = FxHashMap::default();
        for pixel in labels.pixels() {
            *counts.entry(pixel.0[0]).or_insert(0) += 1;
        }

        let mut ranked: Vec<(u32, usize)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        let mut components: Vec<u32> = Vec::new();
        for &(label, _) in ranked.iter().take(keep) {
            if label == 0 {
                continue;
            }
            match selection {
                RoadSelection::LastOfTopK => {
                    components.clear();
                    components.push(label);
                }
                RoadSelection::UnionTopK => components.push(label),
            }
        }

        let selected: FxHashSet<u32> = components.iter().copied().collect();
        let members: Vec<bool> = labels.pixels().map(|p| selected.contains(&p.0[0])).collect();
        let pixel_count = members.iter().filter(|&&m| m).count();

        Self {
            width,
            height,
            members,
            pixel_count,
            components,
        }
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.members[(y * self.width + x) as usize]
    }

    pub fn pixel_count(&self) -> usize {
        self.pixel_count
    }

    pub fn is_empty(&self) -> bool {
        self.pixel_count == 0
    }

    /// Depth values under the region, in raster order
    pub fn depth_samples(&self, depth: &DepthImage) -> Vec<f32> {
        depth
            .enumerate_pixels()
            .filter(|(x, y, _)| self.contains(*x, *y))
            .map(|(_, _, p)| p.0[0])
            .collect()
    }
}
