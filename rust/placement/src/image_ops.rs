// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Image-side collaborators: boundary cluster extraction and input loading

use crate::error::Result;
use crate::types::{Cluster, DepthImage};
use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, Luma};
use imageproc::contours::find_contours;
use std::path::Path;
use stopmark_geometry::Point2D;

/// Binary image with 255 where `mask` carries `label`
pub fn label_mask(mask: &GrayImage, label: u8) -> GrayImage {
    let mut result = GrayImage::new(mask.width(), mask.height());
    for (x, y, pixel) in mask.enumerate_pixels() {
        if pixel.0[0] == label {
            result.put_pixel(x, y, Luma([255]));
        }
    }
    result
}

/// Apply Canny edge detection
pub fn canny_edges(image: &GrayImage, low_threshold: f32, high_threshold: f32) -> GrayImage {
    imageproc::edges::canny(image, low_threshold, high_threshold)
}

/// Ordered pixel clusters along the outer contours of the boundary pixels.
///
/// Boundary pixels are edge-detected and each outermost contour becomes
/// one cluster, in the order the contour follower discovers them.
pub fn boundary_clusters(
    mask: &GrayImage,
    border_label: u8,
    canny_low: f32,
    canny_high: f32,
) -> Vec<Cluster> {
    let border = label_mask(mask, border_label);
    let edges = canny_edges(&border, canny_low, canny_high);

    find_contours::<i32>(&edges)
        .into_iter()
        .filter(|contour| contour.parent.is_none())
        .map(|contour| {
            contour
                .points
                .iter()
                .map(|p| Point2D::new(p.x as f64, p.y as f64))
                .collect()
        })
        .collect()
}

/// Load a label mask; each 8-bit gray value is one label
pub fn load_mask(path: impl AsRef<Path>) -> Result<GrayImage> {
    Ok(image::open(path)?.into_luma8())
}

/// Load a depth map, keeping raw 8- or 16-bit gray values as depth proxies
pub fn load_depth(path: impl AsRef<Path>) -> Result<DepthImage> {
    let depth = match image::open(path)? {
        DynamicImage::ImageLuma8(img) => {
            DepthImage::from_fn(img.width(), img.height(), |x, y| {
                Luma([img.get_pixel(x, y).0[0] as f32])
            })
        }
        other => {
            let img = other.into_luma16();
            DepthImage::from_fn(img.width(), img.height(), |x, y| {
                Luma([img.get_pixel(x, y).0[0] as f32])
            })
        }
    };
    Ok(depth)
}

/// Bilinear resize of a depth map, preserving its raw value range
pub fn resize_depth(depth: &DepthImage, width: u32, height: u32) -> DepthImage {
    if depth.dimensions() == (width, height) {
        return depth.clone();
    }

    let (lo, hi) = depth
        .pixels()
        .map(|p| p.0[0])
        .filter(|v| v.is_finite())
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !(hi > lo) {
        let fill = if lo.is_finite() { lo } else { 0.0 };
        return DepthImage::from_pixel(width, height, Luma([fill]));
    }

    // float resampling saturates to [0, 1], so resample in unit range
    let span = hi - lo;
    let unit = DepthImage::from_fn(depth.width(), depth.height(), |x, y| {
        Luma([(depth.get_pixel(x, y).0[0] - lo) / span])
    });
    let resized = image::imageops::resize(&unit, width, height, FilterType::Triangle);
    DepthImage::from_fn(width, height, |x, y| {
        Luma([resized.get_pixel(x, y).0[0] * span + lo])
    })
}
