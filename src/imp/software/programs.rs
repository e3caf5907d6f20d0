// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Built-in shader programs.
//!
//! Programs read the pixel constant block from constant-buffer slot 0, the accumulation
//! texture from shader-resource slot 0 and the shape strip from slot 1.

use crate::bindings::category::Stage;
use crate::images::constants::{PixelConstants, QuadVertex};
use crate::imp::software::texture::{Normalized, TexelStorage};
use crate::imp::resources::SamplerDesc;
use crate::pixel_formats::Float4;

/// Identifies a precompiled program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderCode {
    /// Passes clip-space position and texture coordinate through.
    FullscreenQuad,
    /// Decays the previous accumulation.
    AccumulateSolid,
    /// Decays, then stamps a disc around the gaze point.
    AccumulateBubble,
    /// Decays slowly, then adds a gaussian splat around the gaze point.
    AccumulateHeatmap,
    /// Tints the accumulation with the overlay color over the background.
    CompositeNormal,
    /// Maps the accumulation through the shape strip as a color gradient.
    CompositeHeatmap,
}

impl ShaderCode {
    pub const fn stage(self) -> Stage {
        match self {
            ShaderCode::FullscreenQuad => Stage::Vertex,
            _ => Stage::Pixel,
        }
    }
}

/// Added per heatmap splat at the gaze point.
const HEATMAP_GAIN: f32 = 0.02;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct VertexOutput {
    pub position: [f32; 2],
    pub uv: [f32; 2],
}

pub(crate) fn run_vertex(code: ShaderCode, vertex: &QuadVertex) -> VertexOutput {
    debug_assert_eq!(code, ShaderCode::FullscreenQuad);
    VertexOutput {
        position: vertex.position,
        uv: vertex.uv,
    }
}

pub(crate) struct PixelInput<'a> {
    pub uv: [f32; 2],
    pub constants: &'a PixelConstants,
    pub accumulation: Option<&'a TexelStorage>,
    pub shape: Option<&'a TexelStorage>,
    pub sampler: SamplerDesc,
}

impl PixelInput<'_> {
    fn sample(&self, texture: Option<&TexelStorage>, u: f32, v: f32) -> Option<Float4> {
        texture.map(|t| {
            t.sample(
                Normalized::new_clamping(u, v),
                self.sampler.filter,
                self.sampler.address,
            )
        })
    }

    fn previous(&self) -> f32 {
        self.sample(self.accumulation, self.uv[0], self.uv[1])
            .map_or(0.0, |t| t.r)
    }

    /// Squared distance to the gaze point, with x corrected for aspect ratio.
    fn gaze_distance_squared(&self) -> f32 {
        let c = self.constants;
        let dx = (self.uv[0] - c.gaze_point[0]) * c.aspect_ratio;
        let dy = self.uv[1] - c.gaze_point[1];
        dx * dx + dy * dy
    }
}

pub(crate) fn run_pixel(code: ShaderCode, input: &PixelInput<'_>) -> Float4 {
    let c = input.constants;
    match code {
        ShaderCode::FullscreenQuad => Float4::TRANSPARENT,
        ShaderCode::AccumulateSolid => Float4::splat_red(input.previous() * c.decay),
        ShaderCode::AccumulateBubble => {
            let coverage = if c.size_squared > 0.0 {
                (1.0 - input.gaze_distance_squared() / c.size_squared).clamp(0.0, 1.0)
            } else {
                0.0
            };
            Float4::splat_red((input.previous() * c.decay + coverage).min(1.0))
        }
        ShaderCode::AccumulateHeatmap => {
            let splat = if c.size_squared > 0.0 {
                (-4.0 * input.gaze_distance_squared() / c.size_squared).exp()
            } else {
                0.0
            };
            Float4::splat_red((input.previous() * c.decay + splat * HEATMAP_GAIN).min(1.0))
        }
        ShaderCode::CompositeNormal => {
            let intensity = input.previous().clamp(0.0, 1.0);
            // short trails fall off faster
            let shaped = intensity.powf(1.0 + 4.0 * (1.0 - c.trail.clamp(0.0, 1.0)));
            let strength = input
                .sample(input.shape, shaped, 0.5)
                .map_or(shaped, |s| s.a);
            let a = strength * c.color[3];
            let fg = Float4::new(c.color[0] * a, c.color[1] * a, c.color[2] * a, a);
            fg + Float4::from_array(c.background_color).premultiplied() * (1.0 - a)
        }
        ShaderCode::CompositeHeatmap => {
            let intensity = input.previous().clamp(0.0, 1.0);
            let g = input
                .sample(input.shape, intensity, 0.5)
                .unwrap_or(Float4::new(intensity, intensity, intensity, intensity));
            let a = g.a * c.color[3];
            let fg = Float4::new(g.r * c.color[0] * a, g.g * c.color[1] * a, g.b * c.color[2] * a, a);
            fg + Float4::from_array(c.background_color).premultiplied() * (1.0 - a)
        }
    }
}
