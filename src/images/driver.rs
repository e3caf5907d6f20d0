// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
The host loop around the compositor.

An [`OverlayDriver`] is ticked by the host as often as it likes.  It paces rendering to
the configured frame rate, backs off while the surface is occluded, and applies resize
requests between frames.

```
use std::time::{Duration, Instant};
use gaze_trail::Device;
use gaze_trail::images::{CompositorConfig, DriverConfig, LogReporter, OverlayDriver, Point, TickOutcome};

let device = Device::new();
let mut driver = OverlayDriver::new(
    &device,
    120,
    60,
    CompositorConfig::default(),
    DriverConfig::default(),
    LogReporter,
)
.unwrap();
let start = Instant::now();
assert_eq!(driver.tick(Point::new(10.0, 10.0), start).unwrap(), TickOutcome::Rendered);
// too soon for another frame
assert_eq!(driver.tick(Point::new(12.0, 10.0), start).unwrap(), TickOutcome::Throttled);
let later = start + Duration::from_millis(20);
assert_eq!(driver.tick(Point::new(12.0, 10.0), later).unwrap(), TickOutcome::Rendered);
```
*/

use crate::images::compositor::{FeedbackCompositor, FrameError, InitError, ResizeError, SettingsError};
use crate::images::config::{CompositorConfig, ConfigError, DriverConfig};
use crate::images::gaze::Point;
use crate::images::reporter::Reporter;
use crate::images::settings::RenderSettings;
use crate::imp::{self, Context, Device, PresentMode, PresentStatus, SwapChain};
use std::time::{Duration, Instant};

/// Turns raw pointer positions into gaze samples.
///
/// A sample is active when the pointer lies within the surface (edges included) and has
/// moved since the previous sample.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointerSampler {
    last: Point,
}

impl PointerSampler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sample(&mut self, position: Point, width: u32, height: u32) -> (bool, Point) {
        let moved = position != self.last;
        let inside = position.x >= 0.0
            && position.x <= width as f32
            && position.y >= 0.0
            && position.y <= height as f32;
        if moved {
            self.last = position;
        }
        (inside && moved, position)
    }
}

/// Lets at most one frame through per interval.
#[derive(Debug, Clone, Copy)]
pub struct FramePacer {
    interval: Duration,
    last_frame: Option<Instant>,
}

impl FramePacer {
    pub fn new(interval: Duration) -> Self {
        FramePacer {
            interval,
            last_frame: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether a frame may start at `now`.  If so, `now` becomes the last frame time.
    pub fn ready(&mut self, now: Instant) -> bool {
        let due = self
            .last_frame
            .is_none_or(|last| now.saturating_duration_since(last) >= self.interval);
        if due {
            self.last_frame = Some(now);
        }
        due
    }
}

/// What one [`OverlayDriver::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A frame was rendered and handed to the swap chain.
    Rendered,
    /// Too soon after the previous frame.
    Throttled,
    /// The surface is still occluded; tick again after the given back-off.
    Occluded(Duration),
}

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("invalid driver configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("creating the swap chain failed: {0}")]
    SwapChain(#[from] imp::Error),
    #[error(transparent)]
    Init(#[from] InitError),
}

#[derive(Debug, thiserror::Error)]
pub enum TickError {
    #[error(transparent)]
    Resize(#[from] ResizeError),
    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// Owns the context, swap chain and compositor and runs the per-tick protocol.
#[derive(Debug)]
pub struct OverlayDriver {
    context: Context,
    swap_chain: SwapChain,
    compositor: FeedbackCompositor,
    config: DriverConfig,
    pacer: FramePacer,
    sampler: PointerSampler,
    occluded: bool,
    pending_resize: Option<(u32, u32)>,
}

impl OverlayDriver {
    pub fn new(
        device: &Device,
        width: u32,
        height: u32,
        compositor_config: CompositorConfig,
        config: DriverConfig,
        reporter: impl Reporter + 'static,
    ) -> Result<Self, DriverError> {
        config.validate()?;
        let swap_chain = SwapChain::new(device, width, height)?;
        let compositor = FeedbackCompositor::new(device, &swap_chain, compositor_config, reporter)?;
        Ok(OverlayDriver {
            context: Context::new(device),
            swap_chain,
            compositor,
            config,
            pacer: FramePacer::new(config.frame_interval()),
            sampler: PointerSampler::new(),
            occluded: false,
            pending_resize: None,
        })
    }

    pub fn compositor(&self) -> &FeedbackCompositor {
        &self.compositor
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn swap_chain(&self) -> &SwapChain {
        &self.swap_chain
    }

    /// The swap chain, for hosts that drive occlusion themselves.
    pub fn swap_chain_mut(&mut self) -> &mut SwapChain {
        &mut self.swap_chain
    }

    pub fn update_settings(&mut self, settings: RenderSettings) -> Result<(), SettingsError> {
        self.compositor.update_settings(&mut self.context, settings)
    }

    /// Queues a resize for the next tick.  Zero-sized requests are ignored.
    pub fn request_resize(&mut self, width: u32, height: u32) {
        if width != 0 && height != 0 {
            self.pending_resize = Some((width, height));
        }
    }

    /// Runs one host tick with the pointer at `pointer` (surface pixels).
    pub fn tick(&mut self, pointer: Point, now: Instant) -> Result<TickOutcome, TickError> {
        if self.occluded {
            if self.swap_chain.present(PresentMode::Test) == PresentStatus::Occluded {
                return Ok(TickOutcome::Occluded(self.config.occluded_backoff));
            }
            logwise::info_sync!("surface visible again");
            self.occluded = false;
        }

        if let Some((width, height)) = self.pending_resize.take() {
            self.compositor.resize(&mut self.swap_chain, width, height)?;
        }

        if !self.pacer.ready(now) {
            return Ok(TickOutcome::Throttled);
        }
        let (width, height) = self.compositor.size();
        let (is_active, point) = self.sampler.sample(pointer, width, height);
        self.compositor.push_gaze_point(is_active, point);
        self.compositor.render(&mut self.context)?;

        if self.swap_chain.present(PresentMode::Present) == PresentStatus::Occluded {
            logwise::info_sync!("surface occluded");
            self.occluded = true;
        }
        Ok(TickOutcome::Rendered)
    }
}
