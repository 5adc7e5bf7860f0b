// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Overlay rendering of retained segments and accepted markers

use crate::types::PlacementOutcome;
use image::{GrayImage, Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;
use stopmark_geometry::Point2D;

/// Segment color (green)
pub const SEGMENT_COLOR: Rgb<u8> = Rgb([0, 200, 0]);
/// Marker outline color (red)
pub const MARKER_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Gray label mask stretched to visible contrast
pub fn mask_background(mask: &GrayImage) -> RgbImage {
    let top = mask.pixels().map(|p| p.0[0]).max().unwrap_or(0).max(1) as u32;
    let mut img = RgbImage::new(mask.width(), mask.height());
    for (x, y, pixel) in mask.enumerate_pixels() {
        let v = (pixel.0[0] as u32 * 200 / top) as u8;
        img.put_pixel(x, y, Rgb([v, v, v]));
    }
    img
}

/// Draw every retained segment and every accepted marker over `background`
/// (or a black canvas of `width` x `height`).
pub fn render_overlay(
    background: Option<&RgbImage>,
    width: u32,
    height: u32,
    outcome: &PlacementOutcome,
) -> RgbImage {
    let mut img = match background {
        Some(bg) => bg.clone(),
        None => RgbImage::new(width, height),
    };

    for record in &outcome.decisions {
        if !record.decision.is_retained() {
            continue;
        }
        if let Some(segment) = record.decision.segment() {
            draw_thick_line(&mut img, &segment.start, &segment.end, SEGMENT_COLOR, 1);
        }
    }

    for marker in &outcome.markers {
        for (a, b) in marker.rectangle.edges() {
            draw_thick_line(&mut img, &a, &b, MARKER_COLOR, 1);
        }
    }

    img
}

fn draw_thick_line(img: &mut RgbImage, a: &Point2D, b: &Point2D, color: Rgb<u8>, thickness: i32) {
    for dy in -thickness..=thickness {
        for dx in -thickness..=thickness {
            draw_line_segment_mut(
                img,
                ((a.x as i32 + dx) as f32, (a.y as i32 + dy) as f32),
                ((b.x as i32 + dx) as f32, (b.y as i32 + dy) as f32),
                color,
            );
        }
    }
}
