// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Construction-time configuration.

use crate::images::shape::ShapeSource;
use crate::imp::resources::Format;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("downsample factor must be at least 1")]
    ZeroDownsample,
    #[error("accumulation format {0:?} has more than one channel")]
    MultiChannelAccumulation(Format),
    #[error("frame rate must be at least 1")]
    ZeroFrameRate,
}

/// Configures a [`FeedbackCompositor`](crate::images::FeedbackCompositor).
///
/// # Examples
///
/// ```
/// use gaze_trail::images::CompositorConfig;
/// use gaze_trail::resources::Format;
///
/// let config = CompositorConfig {
///     downsample_factor: 2,
///     accumulation_format: Format::R16Float,
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct CompositorConfig {
    /// The accumulation surfaces are this many times smaller than the main surface
    /// on each axis.
    pub downsample_factor: u32,
    /// Single-channel float format for the accumulation surfaces.
    pub accumulation_format: Format,
    pub shape_source: ShapeSource,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        CompositorConfig {
            downsample_factor: 4,
            accumulation_format: Format::R32Float,
            shape_source: ShapeSource::Builtin,
        }
    }
}

impl CompositorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.downsample_factor == 0 {
            return Err(ConfigError::ZeroDownsample);
        }
        if self.accumulation_format.channels() != 1 {
            return Err(ConfigError::MultiChannelAccumulation(self.accumulation_format));
        }
        Ok(())
    }
}

/// Configures an [`OverlayDriver`](crate::images::OverlayDriver).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverConfig {
    /// Ticks per second the driver renders at, at most.
    pub frame_rate: u32,
    /// How long the host should wait after finding the surface occluded.
    pub occluded_backoff: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        DriverConfig {
            frame_rate: 120,
            occluded_backoff: Duration::from_millis(10),
        }
    }
}

impl DriverConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_rate == 0 {
            return Err(ConfigError::ZeroFrameRate);
        }
        Ok(())
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs(1) / self.frame_rate.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(CompositorConfig::default().validate(), Ok(()));
        assert_eq!(DriverConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_bad_values() {
        let config = CompositorConfig {
            downsample_factor: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroDownsample));
        let config = CompositorConfig {
            accumulation_format: Format::RGBA8Unorm,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::MultiChannelAccumulation(_))));
        let driver = DriverConfig {
            frame_rate: 0,
            ..Default::default()
        };
        assert_eq!(driver.validate(), Err(ConfigError::ZeroFrameRate));
    }

    #[test]
    fn frame_interval_at_120hz() {
        let interval = DriverConfig::default().frame_interval();
        assert_eq!(interval, Duration::from_nanos(8_333_333));
    }
}
