// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Texel storage for software textures.

Storage is row-major with the origin at the top-left.  Values are written as [`Float4`]
and quantized to the texture's [`Format`] on the way in, so reading back a texel returns
exactly what a hardware texture of that format would hold.
*/

use crate::pixel_formats::{Float4, Unorm4, f16, unorm8};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    R32Float,
    R16Float,
    R8Unorm,
    RGBA8Unorm,
}

impl Format {
    pub const fn channels(self) -> usize {
        match self {
            Format::R32Float | Format::R16Float | Format::R8Unorm => 1,
            Format::RGBA8Unorm => 4,
        }
    }

    pub const fn bytes_per_texel(self) -> usize {
        match self {
            Format::R32Float => 4,
            Format::R16Float => 2,
            Format::R8Unorm => 1,
            Format::RGBA8Unorm => 4,
        }
    }
}

/// Integer texel coordinates.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Texel {
    pub x: u32,
    pub y: u32,
}

/// Normalized texture coordinates; (0,0) is the top-left corner of the top-left texel.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Normalized {
    pub x: f32,
    pub y: f32,
}

impl Normalized {
    pub fn new_clamping(x: f32, y: f32) -> Self {
        Normalized {
            x: x.clamp(0.0, 1.0),
            y: y.clamp(0.0, 1.0),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Hash)]
pub enum Filter {
    Point,
    #[default]
    Linear,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Hash)]
pub enum AddressMode {
    #[default]
    Clamp,
    Wrap,
}

#[derive(Debug, Clone, PartialEq)]
enum Texels {
    R32(Vec<f32>),
    R16(Vec<f16>),
    R8(Vec<u8>),
    Rgba8(Vec<Unorm4>),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TexelStorage {
    width: u32,
    height: u32,
    texels: Texels,
}

impl TexelStorage {
    /// Zero-initialized storage.
    pub fn new(width: u32, height: u32, format: Format) -> Self {
        let len = width as usize * height as usize;
        let texels = match format {
            Format::R32Float => Texels::R32(vec![0.0; len]),
            Format::R16Float => Texels::R16(vec![f16::ZERO; len]),
            Format::R8Unorm => Texels::R8(vec![0; len]),
            Format::RGBA8Unorm => Texels::Rgba8(vec![Unorm4::default(); len]),
        };
        TexelStorage {
            width,
            height,
            texels,
        }
    }

    pub fn from_rgba8(width: u32, height: u32, pixels: Vec<Unorm4>) -> Self {
        debug_assert_eq!(pixels.len(), width as usize * height as usize);
        TexelStorage {
            width,
            height,
            texels: Texels::Rgba8(pixels),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> Format {
        match self.texels {
            Texels::R32(_) => Format::R32Float,
            Texels::R16(_) => Format::R16Float,
            Texels::R8(_) => Format::R8Unorm,
            Texels::Rgba8(_) => Format::RGBA8Unorm,
        }
    }

    const fn offset(&self, texel: Texel) -> usize {
        self.width as usize * texel.y as usize + texel.x as usize
    }

    /// Single-channel formats read as `(r, 0, 0, 1)`.
    pub fn read(&self, texel: Texel) -> Float4 {
        let i = self.offset(texel);
        match &self.texels {
            Texels::R32(v) => Float4::splat_red(v[i]),
            Texels::R16(v) => Float4::splat_red(v[i].to_f32()),
            Texels::R8(v) => Float4::splat_red(v[i] as f32 / 255.0),
            Texels::Rgba8(v) => Float4::from(v[i]),
        }
    }

    pub fn write(&mut self, texel: Texel, value: Float4) {
        let i = self.offset(texel);
        match &mut self.texels {
            Texels::R32(v) => v[i] = value.r,
            Texels::R16(v) => v[i] = f16::from_f32(value.r),
            Texels::R8(v) => v[i] = unorm8(value.r),
            Texels::Rgba8(v) => v[i] = Unorm4::from_floats(value),
        }
    }

    pub fn fill(&mut self, value: Float4) {
        match &mut self.texels {
            Texels::R32(v) => v.fill(value.r),
            Texels::R16(v) => v.fill(f16::from_f32(value.r)),
            Texels::R8(v) => v.fill(unorm8(value.r)),
            Texels::Rgba8(v) => v.fill(Unorm4::from_floats(value)),
        }
    }

    fn address(coord: i64, size: u32, mode: AddressMode) -> u32 {
        let size = size as i64;
        match mode {
            AddressMode::Clamp => coord.clamp(0, size - 1) as u32,
            AddressMode::Wrap => coord.rem_euclid(size) as u32,
        }
    }

    /// Samples at `uv` with the given filter and address mode.
    pub fn sample(&self, uv: Normalized, filter: Filter, address: AddressMode) -> Float4 {
        let fx = uv.x * self.width as f32 - 0.5;
        let fy = uv.y * self.height as f32 - 0.5;
        match filter {
            Filter::Point => {
                let x = Self::address(fx.round() as i64, self.width, address);
                let y = Self::address(fy.round() as i64, self.height, address);
                self.read(Texel { x, y })
            }
            Filter::Linear => {
                let x0 = fx.floor();
                let y0 = fy.floor();
                let (tx, ty) = (fx - x0, fy - y0);
                let (x0, y0) = (x0 as i64, y0 as i64);
                let at = |x: i64, y: i64| {
                    self.read(Texel {
                        x: Self::address(x, self.width, address),
                        y: Self::address(y, self.height, address),
                    })
                };
                let top = at(x0, y0).lerp(at(x0 + 1, y0), tx);
                let bottom = at(x0, y0 + 1).lerp(at(x0 + 1, y0 + 1), tx);
                top.lerp(bottom, ty)
            }
        }
    }

    /// Every texel converted to 8-bit RGBA.
    pub fn to_rgba8(&self) -> Vec<Unorm4> {
        match &self.texels {
            Texels::Rgba8(v) => v.clone(),
            _ => (0..self.height)
                .flat_map(|y| (0..self.width).map(move |x| Texel { x, y }))
                .map(|t| Unorm4::from_floats(self.read(t)))
                .collect(),
        }
    }
}
