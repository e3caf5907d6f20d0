// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Pixel values exchanged with textures.
//!
//! Textures store texels in their own [`Format`](crate::resources::Format), but every read
//! and write goes through one of the two value types here:
//!
//! - [`Float4`] is the working type of the pipeline (sampling, pixel programs, blending).
//! - [`Unorm4`] is the 8-bit RGBA layout used for shape strips and frame readback.
//!
//! ```
//! use gaze_trail::pixel_formats::{Float4, Unorm4};
//!
//! let half_red = Float4::new(1.0, 0.0, 0.0, 0.5);
//! let premultiplied = half_red.premultiplied();
//! assert_eq!(premultiplied, Float4::new(0.5, 0.0, 0.0, 0.5));
//! assert_eq!(Unorm4::from_floats(premultiplied), Unorm4 { r: 128, g: 0, b: 0, a: 128 });
//! ```

pub(crate) mod png_support;

pub use png_support::PngError;

use bytemuck::{Pod, Zeroable};
use std::ops::{Add, Mul};

pub use half::f16;

/// Four 32-bit float channels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
#[repr(C)]
pub struct Float4 {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Float4 {
    pub const TRANSPARENT: Float4 = Float4::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Float4 { r, g, b, a }
    }

    /// A single-channel value, as read from a one-channel texture.
    pub const fn splat_red(r: f32) -> Self {
        Float4::new(r, 0.0, 0.0, 1.0)
    }

    pub const fn from_array(c: [f32; 4]) -> Self {
        Float4::new(c[0], c[1], c[2], c[3])
    }

    pub const fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Color channels multiplied by alpha.
    pub fn premultiplied(self) -> Self {
        Float4::new(self.r * self.a, self.g * self.a, self.b * self.a, self.a)
    }

    /// `self * (1 - t) + other * t`, channel-wise.
    pub fn lerp(self, other: Float4, t: f32) -> Self {
        self * (1.0 - t) + other * t
    }

    pub fn saturate(self) -> Self {
        Float4::new(
            self.r.clamp(0.0, 1.0),
            self.g.clamp(0.0, 1.0),
            self.b.clamp(0.0, 1.0),
            self.a.clamp(0.0, 1.0),
        )
    }
}

impl Add for Float4 {
    type Output = Float4;
    fn add(self, rhs: Float4) -> Float4 {
        Float4::new(self.r + rhs.r, self.g + rhs.g, self.b + rhs.b, self.a + rhs.a)
    }
}

impl Mul<f32> for Float4 {
    type Output = Float4;
    fn mul(self, rhs: f32) -> Float4 {
        Float4::new(self.r * rhs, self.g * rhs, self.b * rhs, self.a * rhs)
    }
}

/// Four 8-bit normalized channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Pod, Zeroable)]
#[repr(C)]
pub struct Unorm4 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Unorm4 {
    /// Convert from normalized float values (0.0-1.0) to 8-bit values (0-255).
    ///
    /// Values are clamped to the valid range and rounded to nearest integer.
    pub fn from_floats(float4: Float4) -> Self {
        Unorm4 {
            r: unorm8(float4.r),
            g: unorm8(float4.g),
            b: unorm8(float4.b),
            a: unorm8(float4.a),
        }
    }
}

impl From<Unorm4> for Float4 {
    fn from(value: Unorm4) -> Self {
        Float4::new(
            value.r as f32 / 255.0,
            value.g as f32 / 255.0,
            value.b as f32 / 255.0,
            value.a as f32 / 255.0,
        )
    }
}

pub(crate) fn unorm8(value: f32) -> u8 {
    (value * 255.0).round().clamp(0.0, 255.0) as u8
}
