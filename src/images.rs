// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! The gaze-trail renderer: smoothing, accumulation and composition. */

pub mod accumulation;
pub mod compositor;
pub mod config;
pub mod constants;
pub mod driver;
pub mod gaze;
pub mod reporter;
pub mod settings;
pub mod shape;

pub use compositor::{CompositorStats, FeedbackCompositor, FrameError, InitError, ResizeError, SettingsError};
pub use config::{CompositorConfig, ConfigError, DriverConfig};
pub use driver::{DriverError, FramePacer, OverlayDriver, PointerSampler, TickError, TickOutcome};
pub use gaze::{GazeSmoother, Point};
pub use reporter::{LogReporter, RecordingReporter, Report, Reporter};
pub use settings::{OverlayColor, RenderSettings, ShapeMode};
pub use shape::{ShapeCache, ShapeResource, ShapeSource};
