// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! End-to-end gaze smoothing and trail rendering.

use gaze_trail::images::gaze::{GAZE_QUEUE_CAPACITY, interpolation_rate};
use gaze_trail::images::{
    CompositorConfig, DriverConfig, FeedbackCompositor, GazeSmoother, OverlayColor,
    OverlayDriver, Point, RecordingReporter, RenderSettings, TickOutcome,
};
use gaze_trail::{Context, Device, SwapChain};
use std::time::{Duration, Instant};

fn scenario_settings() -> RenderSettings {
    RenderSettings {
        size: 0.8,
        color: OverlayColor::new(0.0, 0.0, 0.0, 0.8),
        background_color: OverlayColor::new(1.0, 1.0, 1.0, 0.3),
        ..Default::default()
    }
}

fn close(a: Point, b: Point) -> bool {
    (a.x - b.x).abs() < 1e-3 && (a.y - b.y).abs() < 1e-3
}

#[test]
fn three_ticks_swap_three_times_and_drain() {
    let device = Device::new();
    let mut context = Context::new(&device);
    let swap_chain = SwapChain::new(&device, 1200, 600).expect("swap chain");
    let mut compositor = FeedbackCompositor::new(
        &device,
        &swap_chain,
        CompositorConfig::default(),
        RecordingReporter::new(),
    )
    .expect("compositor");
    compositor
        .update_settings(&mut context, scenario_settings())
        .expect("settings");

    compositor.push_gaze_point(true, Point::new(600.0, 300.0));
    compositor.render(&mut context).expect("tick 1");
    for tick in 2..=3 {
        compositor.push_gaze_point(false, Point::new(0.0, 0.0));
        compositor
            .render(&mut context)
            .unwrap_or_else(|e| panic!("tick {tick}: {e}"));
    }

    let stats = compositor.stats();
    assert_eq!(stats.swaps, 3);
    assert_eq!(stats.frames, 3);
    assert_eq!(stats.degraded_frames, 0);
    assert!(compositor.gaze_queue().is_empty());
    assert_eq!(context.draw_count(), 6);

    // the trail darkens the middle; the corner shows only the background
    let back_buffer = swap_chain.back_buffer();
    let corner = back_buffer.read_texel(0, 0);
    let center = back_buffer.read_texel(600, 300);
    assert!((corner.r - 0.3).abs() < 0.01, "corner {corner:?}");
    assert!((corner.a - 0.3).abs() < 0.01, "corner {corner:?}");
    assert!(center.r < corner.r - 0.05, "center {center:?} corner {corner:?}");
    assert!(center.a > corner.a, "center {center:?} corner {corner:?}");
}

#[test]
fn driver_runs_the_same_scenario() {
    let device = Device::new();
    let mut driver = OverlayDriver::new(
        &device,
        1200,
        600,
        CompositorConfig::default(),
        DriverConfig::default(),
        RecordingReporter::new(),
    )
    .expect("driver");
    driver.update_settings(scenario_settings()).expect("settings");

    let start = Instant::now();
    let interval = Duration::from_millis(10);
    // the pointer stays put after the first tick, so later samples are inactive
    for tick in 0..3 {
        let outcome = driver
            .tick(Point::new(600.0, 300.0), start + interval * tick)
            .expect("tick");
        assert_eq!(outcome, TickOutcome::Rendered);
    }
    assert_eq!(driver.compositor().stats().swaps, 3);
    assert!(driver.compositor().gaze_queue().is_empty());
    assert_eq!(driver.swap_chain().presented_count(), 3);
    let frame = driver.swap_chain().last_frame().expect("frame");
    assert_eq!((frame.width, frame.height), (1200, 600));
}

#[test]
fn active_samples_step_toward_target() {
    for responsiveness in [0.0f32, 0.25, 0.5, 1.0] {
        let mut smoother = GazeSmoother::new();
        let origin = Point::new(100.0, 50.0);
        let target = Point::new(400.0, -250.0);
        smoother.push(true, true, responsiveness, origin);
        // drain one of the two seed points
        smoother.push(false, true, responsiveness, origin);
        assert_eq!(smoother.queue().back(), Some(origin));

        let rate = interpolation_rate(responsiveness);
        let drawn = smoother
            .push(true, true, responsiveness, target)
            .expect("point");
        let mut points = vec![drawn];
        points.extend(smoother.queue().iter());
        // the seed point is evicted, so the drawn point is the first new one
        assert_eq!(points.len(), GAZE_QUEUE_CAPACITY);
        for (k, point) in [1.0f32, 2.0, 3.0].iter().zip(&points) {
            let expected = origin + (target - origin) * (k / 3.0 * rate);
            assert!(close(*point, expected), "r={responsiveness} k={k}: {point:?} vs {expected:?}");
        }
    }
}

#[test]
fn inactive_ticks_drain_min_of_ticks_and_queue() {
    // an active tick leaves two points behind, an inactive one takes one away
    let setups: [&[bool]; 3] = [&[], &[true, false], &[true]];
    for (queued, setup) in setups.iter().enumerate() {
        for ticks in 0..5usize {
            let mut smoother = GazeSmoother::new();
            for &active in setup.iter() {
                smoother.push(active, true, 0.5, Point::new(40.0, 30.0));
            }
            assert_eq!(smoother.len(), queued);
            let drained = (0..ticks)
                .filter_map(|_| smoother.push(false, true, 0.5, Point::new(1.0, 1.0)))
                .count();
            assert_eq!(drained, ticks.min(queued));
            assert_eq!(smoother.len(), queued - drained);
        }
    }
}

#[test]
fn queue_is_bounded_under_any_input() {
    let mut smoother = GazeSmoother::new();
    for i in 0..64u32 {
        let active = i % 3 != 1;
        let enabled = i % 7 != 0;
        smoother.push(active, enabled, (i % 5) as f32 / 4.0, Point::new(i as f32, (i * i) as f32));
        assert!(smoother.len() <= GAZE_QUEUE_CAPACITY);
    }
}
