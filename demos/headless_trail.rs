// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Headless gaze-trail rendering.
//!
//! This demo drives an [`OverlayDriver`] with a synthetic pointer that sweeps a
//! figure-eight across the surface, then writes the last presented frame to a PNG.
//! No window or GPU is involved; everything runs on the software backend.
//!
//! ## What it shows
//!
//! - **Driver lifecycle**: creation, settings updates, a mid-run resize, teardown
//! - **Frame pacing**: ticks arrive faster than the frame rate and some are throttled
//! - **Reporting**: a closure reporter prints aspect-ratio changes and shape reloads
//!
//! ## Usage
//!
//! ```bash
//! cargo run --example headless_trail -- trail.png
//! cargo run --example headless_trail -- heatmap.png heatmap
//! ```
//!
//! The optional second argument picks the shape mode: `bubble` (the default), `solid`
//! or `heatmap`.

use gaze_trail::images::{
    CompositorConfig, DriverConfig, OverlayColor, OverlayDriver, Point, RenderSettings, Report,
    ShapeMode, TickOutcome,
};
use gaze_trail::Device;
use std::fs::File;
use std::io::BufWriter;
use std::time::{Duration, Instant};

const WIDTH: u32 = 800;
const HEIGHT: u32 = 450;
const TICKS: u32 = 360;

fn shape_mode(arg: Option<&str>) -> ShapeMode {
    match arg {
        Some("solid") => ShapeMode::Solid,
        Some("heatmap") => ShapeMode::Heatmap,
        _ => ShapeMode::Bubble,
    }
}

/// Pointer position on a figure-eight at phase `t` in 0..1.
fn figure_eight(t: f32, width: u32, height: u32) -> Point {
    let angle = t * std::f32::consts::TAU;
    let (w, h) = (width as f32, height as f32);
    Point::new(w * (0.5 + 0.4 * angle.sin()), h * (0.5 + 0.3 * (2.0 * angle).sin()))
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let output = args.get(1).map(String::as_str).unwrap_or("headless_trail.png");
    let mode = shape_mode(args.get(2).map(String::as_str));

    let device = Device::new();
    let mut driver = OverlayDriver::new(
        &device,
        WIDTH,
        HEIGHT,
        CompositorConfig::default(),
        DriverConfig::default(),
        |report: &Report| match report {
            Report::AspectRatioChanged { aspect_ratio } => println!("aspect ratio {aspect_ratio:.3}"),
            Report::ShapeReloaded(mode) => println!("shape strip reloaded for {mode:?}"),
            Report::FrameDegraded(err) => eprintln!("frame degraded: {err}"),
        },
    )
    .expect("Failed to create overlay driver");

    driver
        .update_settings(RenderSettings {
            shape_mode: mode,
            color: OverlayColor::new(0.1, 0.6, 1.0, 0.85),
            background_color: OverlayColor::new(0.05, 0.05, 0.08, 0.6),
            size: 0.35,
            trail: 0.8,
            responsiveness: 0.4,
            ..Default::default()
        })
        .expect("Failed to apply settings");

    // ticks come in at 200 Hz; the driver renders at 120
    let start = Instant::now();
    let tick_interval = Duration::from_millis(5);
    let (mut rendered, mut throttled) = (0u32, 0u32);
    for i in 0..TICKS {
        if i == TICKS / 2 {
            driver.request_resize(WIDTH, HEIGHT * 4 / 3);
        }
        let (width, height) = driver.compositor().size();
        let pointer = figure_eight(i as f32 / TICKS as f32, width, height);
        match driver.tick(pointer, start + tick_interval * i) {
            Ok(TickOutcome::Rendered) => rendered += 1,
            Ok(TickOutcome::Throttled) => throttled += 1,
            Ok(TickOutcome::Occluded(_)) => {}
            Err(e) => eprintln!("tick {i} failed: {e}"),
        }
    }
    let stats = driver.compositor().stats();
    println!(
        "{rendered} frames rendered, {throttled} ticks throttled, {swaps} accumulation swaps",
        swaps = stats.swaps
    );

    let frame = driver
        .swap_chain()
        .last_frame()
        .expect("No frame was presented");
    let file = File::create(output).expect("Failed to create output file");
    frame
        .write_png(BufWriter::new(file))
        .expect("Failed to write PNG");
    println!("wrote {}x{} frame to {output}", frame.width, frame.height);
}
