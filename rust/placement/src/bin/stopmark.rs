// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Stopmark CLI
//!
//! Places depth-scaled stopping-position markers for one frame and writes
//! them out as JSON, optionally with an overlay image.
//!
//! Usage:
//!   stopmark place --mask mask.png --depth depth.png [--out markers.json] [--overlay overlay.png]
//!   stopmark default-config

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Instant;
use stopmark_placement::render::mask_background;
use stopmark_placement::{
    load_depth, load_mask, place_markers, render_overlay, resize_depth, PlacementConfig,
    RoadSelection,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stopmark")]
#[command(about = "Place non-overlapping, depth-scaled markers along road boundaries")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Place markers for one mask/depth pair.
    Place(PlaceArgs),

    /// Print the default configuration as JSON.
    DefaultConfig,
}

#[derive(Debug, Clone, Args)]
struct PlaceArgs {
    /// Label mask (8-bit, one label per pixel).
    #[arg(long)]
    mask: PathBuf,

    /// Depth map (8- or 16-bit grayscale, raw values used as depth).
    #[arg(long)]
    depth: PathBuf,

    /// JSON configuration; missing fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where to write accepted markers and decisions (JSON).
    #[arg(long, default_value = "markers.json")]
    out: PathBuf,

    /// Where to write an overlay image of segments and markers.
    #[arg(long)]
    overlay: Option<PathBuf>,

    /// Image to draw the overlay on (defaults to the mask).
    #[arg(long)]
    background: Option<PathBuf>,

    /// Resize the depth map to the mask size when they differ.
    #[arg(long)]
    resize_depth: bool,

    /// Keep placing markers along an edge while space remains.
    #[arg(long)]
    fill_edge: bool,

    /// Calibrate depth on the union of the largest road components.
    #[arg(long)]
    union_road: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Place(args) => place(args),
        Commands::DefaultConfig => {
            println!("{}", serde_json::to_string_pretty(&PlacementConfig::default())?);
            Ok(())
        }
    }
}

fn place(args: PlaceArgs) -> Result<()> {
    let start = Instant::now();

    let mut config = match &args.config {
        Some(path) => PlacementConfig::from_json_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => PlacementConfig::default(),
    };
    if args.fill_edge {
        config.fill_edge = true;
    }
    if args.union_road {
        config.road_selection = RoadSelection::UnionTopK;
    }

    let mask = load_mask(&args.mask)
        .with_context(|| format!("failed to load mask {}", args.mask.display()))?;
    let mut depth = load_depth(&args.depth)
        .with_context(|| format!("failed to load depth map {}", args.depth.display()))?;

    if depth.dimensions() != mask.dimensions() {
        if !args.resize_depth {
            bail!(
                "depth map is {}x{} but mask is {}x{} (pass --resize-depth to resample)",
                depth.width(),
                depth.height(),
                mask.width(),
                mask.height()
            );
        }
        tracing::info!(
            from = ?depth.dimensions(),
            to = ?mask.dimensions(),
            "Resizing depth map to mask size"
        );
        depth = resize_depth(&depth, mask.width(), mask.height());
    }

    let outcome = place_markers(&mask, &depth, &config)?;

    outcome
        .write_json(&args.out)
        .with_context(|| format!("failed to write {}", args.out.display()))?;

    if let Some(overlay_path) = &args.overlay {
        let background = match &args.background {
            Some(path) => {
                let img = image::open(path)
                    .with_context(|| format!("failed to load background {}", path.display()))?
                    .into_rgb8();
                if img.dimensions() == mask.dimensions() {
                    img
                } else {
                    image::imageops::resize(
                        &img,
                        mask.width(),
                        mask.height(),
                        image::imageops::FilterType::Triangle,
                    )
                }
            }
            None => mask_background(&mask),
        };
        render_overlay(Some(&background), mask.width(), mask.height(), &outcome)
            .save(overlay_path)
            .with_context(|| format!("failed to write overlay {}", overlay_path.display()))?;
    }

    tracing::info!(
        markers = outcome.markers.len(),
        out = %args.out.display(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Done"
    );

    Ok(())
}
