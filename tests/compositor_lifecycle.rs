// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Compositor creation, reconfiguration, resize and teardown.

use gaze_trail::bindings::Stage;
use gaze_trail::bindings::state::Viewport;
use gaze_trail::images::shape::{SHAPE_STRIP_WIDTH, ShapeError};
use gaze_trail::images::{
    CompositorConfig, FeedbackCompositor, FrameError, InitError, OverlayColor, Point,
    RecordingReporter, RenderSettings, Report, ShapeMode, ShapeSource,
};
use gaze_trail::pipeline::StatefulContext;
use gaze_trail::pixel_formats::Unorm4;
use gaze_trail::resources::{BufferDesc, BufferKind, ObjectKind, ShaderCode};
use gaze_trail::{Context, Device, Frame, SwapChain};
use std::sync::{Arc, Mutex};

fn compositor_at(
    device: &Device,
    width: u32,
    height: u32,
    config: CompositorConfig,
) -> (SwapChain, FeedbackCompositor, RecordingReporter) {
    let swap_chain = SwapChain::new(device, width, height).expect("swap chain");
    let reporter = RecordingReporter::new();
    let compositor =
        FeedbackCompositor::new(device, &swap_chain, config, reporter.clone()).expect("compositor");
    (swap_chain, compositor, reporter)
}

fn strip_png(width: u32, color: Unorm4) -> Arc<[u8]> {
    let frame = Frame {
        width,
        height: 1,
        pixels: vec![color; width as usize],
    };
    let mut bytes = Vec::new();
    frame.write_png(&mut bytes).expect("encode");
    bytes.into()
}

#[test]
fn full_lifecycle_leaks_nothing() {
    let device = Device::new();
    let mut context = Context::new(&device);
    let (mut swap_chain, mut compositor, _reporter) =
        compositor_at(&device, 1200, 600, CompositorConfig::default());
    for (i, mode) in [ShapeMode::Heatmap, ShapeMode::Solid, ShapeMode::Bubble]
        .into_iter()
        .enumerate()
    {
        let settings = RenderSettings {
            shape_mode: mode,
            ..Default::default()
        };
        compositor.update_settings(&mut context, settings).expect("settings");
        compositor.push_gaze_point(true, Point::new(100.0 * i as f32, 50.0));
        compositor.render(&mut context).expect("render");
    }
    compositor.resize(&mut swap_chain, 640, 480).expect("resize");
    compositor.render(&mut context).expect("render");
    assert!(device.live_objects() > 0);

    compositor.dispose();
    drop(swap_chain);
    drop(context);
    assert_eq!(device.live_objects(), 0);
}

#[test]
fn resize_to_current_size_changes_nothing() {
    let device = Device::new();
    let mut context = Context::new(&device);
    let (mut swap_chain, mut compositor, _reporter) =
        compositor_at(&device, 1200, 600, CompositorConfig::default());
    compositor.push_gaze_point(true, Point::new(600.0, 300.0));
    compositor.render(&mut context).expect("render");

    let textures = device.created_count(ObjectKind::Texture2D);
    let views = device.created_count(ObjectKind::RenderTargetView);
    let queue = compositor.gaze_queue().clone();
    let front = compositor
        .accumulation()
        .map(|a| a.front().texture().clone())
        .expect("accumulation");
    let back_buffer = swap_chain.back_buffer();

    compositor.resize(&mut swap_chain, 1200, 600).expect("resize");

    assert_eq!(device.created_count(ObjectKind::Texture2D), textures);
    assert_eq!(device.created_count(ObjectKind::RenderTargetView), views);
    assert_eq!(compositor.gaze_queue(), &queue);
    let accumulation = compositor.accumulation().expect("accumulation");
    assert!(accumulation.front().texture().same_object(&front));
    assert!(swap_chain.back_buffer().same_object(&back_buffer));
}

#[test]
fn resize_rebuilds_downsampled_targets() {
    let device = Device::new();
    let mut context = Context::new(&device);
    let config = CompositorConfig {
        downsample_factor: 8,
        ..Default::default()
    };
    let (mut swap_chain, mut compositor, _reporter) = compositor_at(&device, 1200, 600, config);
    assert_eq!(
        compositor.accumulation().map(|a| (a.width(), a.height())),
        Some((150, 75))
    );
    compositor.push_gaze_point(true, Point::new(10.0, 10.0));
    compositor.resize(&mut swap_chain, 4, 3).expect("resize");
    assert!(compositor.gaze_queue().is_empty());
    // never smaller than one texel
    assert_eq!(compositor.accumulation().map(|a| (a.width(), a.height())), Some((1, 1)));
    assert_eq!(compositor.size(), (4, 3));
    compositor.render(&mut context).expect("render");
}

#[test]
fn each_shape_toggle_reloads_and_clears_once() {
    let device = Device::new();
    let mut context = Context::new(&device);
    let (_swap_chain, mut compositor, reporter) =
        compositor_at(&device, 320, 240, CompositorConfig::default());
    let mut settings = RenderSettings::default();
    let modes = [ShapeMode::Solid, ShapeMode::Heatmap, ShapeMode::Bubble, ShapeMode::Heatmap];
    for (toggles, mode) in modes.into_iter().enumerate() {
        settings.shape_mode = mode;
        compositor.update_settings(&mut context, settings).expect("settings");
        let stats = compositor.stats();
        assert_eq!(stats.shape_reloads, toggles as u64 + 1);
        assert_eq!(stats.accumulation_clears, toggles as u64 + 1);

        // trail, size and color alone touch neither
        settings.trail = 0.1 * toggles as f32;
        settings.size = 0.2 + 0.1 * toggles as f32;
        settings.color = OverlayColor::new(1.0, 0.5, 0.0, 0.7);
        compositor.update_settings(&mut context, settings).expect("settings");
        assert_eq!(compositor.stats(), stats);
    }
    let reloaded: Vec<ShapeMode> = reporter
        .reports()
        .into_iter()
        .filter_map(|r| match r {
            Report::ShapeReloaded(mode) => Some(mode),
            _ => None,
        })
        .collect();
    assert_eq!(reloaded, modes);
}

#[test]
fn png_shape_strips_are_used() {
    let device = Device::new();
    let teal = Unorm4 {
        r: 0,
        g: 128,
        b: 128,
        a: 255,
    };
    let source = ShapeSource::Png {
        bubble: strip_png(SHAPE_STRIP_WIDTH, teal),
        solid: strip_png(SHAPE_STRIP_WIDTH, teal),
        heatmap: strip_png(SHAPE_STRIP_WIDTH, teal),
    };
    let config = CompositorConfig {
        shape_source: source,
        ..Default::default()
    };
    let (_swap_chain, compositor, _reporter) = compositor_at(&device, 64, 64, config);
    let shape = compositor.shape().expect("shape");
    assert_eq!(shape.mode(), ShapeMode::Bubble);
    let texel = shape.texture().read_texel(SHAPE_STRIP_WIDTH - 1, 0);
    assert_eq!(texel.r, 0.0);
    assert!((texel.g - 128.0 / 255.0).abs() < 1e-6);
    assert_eq!(texel.a, 1.0);
}

#[test]
fn badly_sized_png_strip_fails_init_cleanly() {
    let device = Device::new();
    let swap_chain = SwapChain::new(&device, 64, 64).expect("swap chain");
    let baseline = device.live_objects();
    let short = strip_png(256, Unorm4 { r: 1, g: 2, b: 3, a: 4 });
    let config = CompositorConfig {
        shape_source: ShapeSource::Png {
            bubble: short.clone(),
            solid: short.clone(),
            heatmap: short,
        },
        ..Default::default()
    };
    let result = FeedbackCompositor::new(&device, &swap_chain, config, RecordingReporter::new());
    assert!(matches!(
        result,
        Err(InitError::Shape(ShapeError::WrongSize {
            width: 256,
            height: 1
        }))
    ));
    assert_eq!(device.live_objects(), baseline);
}

#[test]
fn closures_receive_degraded_frames() {
    let device = Device::new();
    let mut context = Context::new(&device);
    let swap_chain = SwapChain::new(&device, 32, 32).expect("swap chain");
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let mut compositor = FeedbackCompositor::new(
        &device,
        &swap_chain,
        CompositorConfig::default(),
        move |report: &Report| sink.lock().expect("poisoned").push(report.clone()),
    )
    .expect("compositor");

    context.fail_next_map();
    assert!(compositor.render(&mut context).is_err());
    let seen = seen.lock().expect("poisoned");
    assert!(
        seen.iter()
            .any(|r| matches!(r, Report::FrameDegraded(FrameError::Upload(_))))
    );
    assert!(seen.iter().any(|r| matches!(r, Report::AspectRatioChanged { .. })));
}

#[test]
fn host_bindings_survive_many_frames() {
    let device = Device::new();
    let mut context = Context::new(&device);
    let (_swap_chain, mut compositor, _reporter) =
        compositor_at(&device, 96, 48, CompositorConfig::default());

    let host_buffer = device
        .create_buffer(BufferDesc::new(BufferKind::Constant, 16), None)
        .expect("buffer");
    let host_shader = device
        .create_shader(Stage::Pixel, ShaderCode::CompositeNormal)
        .expect("shader");
    context.set_constant_buffers(Stage::Pixel, 0, &[Some(host_buffer.clone())]);
    context.set_shader(Stage::Pixel, Some(&host_shader), &[]);
    context.set_viewports(&[Viewport::sized(96.0, 48.0)]);
    let before = context.state().clone();
    let buffer_refs = host_buffer.ref_count();

    for i in 0..10 {
        compositor.push_gaze_point(i % 2 == 0, Point::new(i as f32 * 9.0, 24.0));
        compositor.render(&mut context).expect("render");
        assert_eq!(context.state(), &before);
    }
    assert_eq!(host_buffer.ref_count(), buffer_refs);
    assert_eq!(compositor.stats().swaps, 10);
}
