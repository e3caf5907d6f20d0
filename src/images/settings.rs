// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! User-facing overlay settings.

use crate::pixel_formats::Float4;

/// A straight-alpha RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OverlayColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl OverlayColor {
    pub const TRANSPARENT: OverlayColor = OverlayColor::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        OverlayColor { r, g, b, a }
    }

    pub const fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Color channels multiplied by alpha; alpha unchanged.
    pub fn premultiplied(self) -> [f32; 4] {
        Float4::from_array(self.to_array()).premultiplied().to_array()
    }
}

/// How the accumulated trail is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ShapeMode {
    #[default]
    Bubble,
    Solid,
    Heatmap,
}

/// Settings applied with
/// [`FeedbackCompositor::update_settings`](crate::images::FeedbackCompositor::update_settings).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSettings {
    pub color: OverlayColor,
    pub background_color: OverlayColor,
    pub shape_mode: ShapeMode,
    /// Radius of the gaze stamp; negative values are treated as zero.
    pub size: f32,
    pub trail: f32,
    /// Heatmap persistence, 0 (longest) to 1 (shortest).  Ignored by other modes.
    pub decay: f32,
    /// How far each tick's interpolation moves toward a new gaze sample, 0 to 1.
    pub responsiveness: f32,
    pub enable: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        RenderSettings {
            color: OverlayColor::new(0.0, 0.74, 1.0, 0.8),
            background_color: OverlayColor::TRANSPARENT,
            shape_mode: ShapeMode::Bubble,
            size: 0.5,
            trail: 0.5,
            decay: 0.5,
            responsiveness: 0.25,
            enable: true,
        }
    }
}

/// Accumulation decay used outside heatmap mode.
pub const TRAIL_DECAY: f32 = 0.95;

/// Scale from [`RenderSettings::size`] to distance in normalized surface units.
pub const SIZE_SCALE: f32 = 0.15;

impl RenderSettings {
    /// Per-frame multiplier applied to the accumulation.
    pub fn effective_decay(&self) -> f32 {
        match self.shape_mode {
            ShapeMode::Heatmap => 0.9975 - self.decay * 0.0025,
            _ => TRAIL_DECAY,
        }
    }

    /// Squared stamp radius as seen by the pixel programs.
    pub fn size_squared(&self) -> f32 {
        let scaled = self.size.max(0.0) * SIZE_SCALE;
        scaled * scaled
    }

    /// The color written into the constant block.  Heatmaps draw with a fixed white.
    pub fn effective_color(&self) -> OverlayColor {
        match self.shape_mode {
            ShapeMode::Heatmap => OverlayColor::new(1.0, 1.0, 1.0, 0.6),
            _ => self.color,
        }
    }

    /// The background written into the constant block.  Heatmaps draw without one.
    pub fn effective_background(&self) -> OverlayColor {
        match self.shape_mode {
            ShapeMode::Heatmap => OverlayColor::TRANSPARENT,
            _ => self.background_color,
        }
    }

    /// Whether going from `self` to `next` needs the main surface cleared.
    pub(crate) fn background_changes(&self, next: &RenderSettings) -> bool {
        self.background_color != next.background_color
            || self.enable != next.enable
            || self.shape_mode != next.shape_mode
    }
}
