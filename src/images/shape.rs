// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Shape strips: 1-D lookup textures indexed by accumulated intensity.

use crate::bindings::handle::ResourceHandle;
use crate::images::settings::ShapeMode;
use crate::imp::resources::{Format, ShaderResourceView, Texture2D, TextureDesc, TextureUsage};
use crate::imp::{self, Device};
use crate::pixel_formats::png_support::{self, PngError};
use crate::pixel_formats::{Float4, Unorm4};
use std::sync::Arc;

/// Texels in a shape strip.
pub const SHAPE_STRIP_WIDTH: u32 = 1536;

#[derive(Debug, thiserror::Error)]
pub enum ShapeError {
    #[error("creating the shape texture failed: {0}")]
    Imp(#[from] imp::Error),
    #[error("shape strip is not valid PNG: {0}")]
    Png(#[from] PngError),
    #[error("shape strip must be {SHAPE_STRIP_WIDTH}x1, found {width}x{height}")]
    WrongSize { width: u32, height: u32 },
}

/// Where shape strips come from.
#[derive(Debug, Clone, Default)]
pub enum ShapeSource {
    /// Procedurally generated strips.
    #[default]
    Builtin,
    /// PNG-encoded strips, one per mode, each [`SHAPE_STRIP_WIDTH`]×1 8-bit RGBA.
    Png {
        bubble: Arc<[u8]>,
        solid: Arc<[u8]>,
        heatmap: Arc<[u8]>,
    },
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Four-stop blue, cyan, yellow, red ramp.
fn heat(t: f32) -> Float4 {
    const STOPS: [Float4; 4] = [
        Float4::new(0.0, 0.2, 1.0, 1.0),
        Float4::new(0.0, 1.0, 1.0, 1.0),
        Float4::new(1.0, 1.0, 0.0, 1.0),
        Float4::new(1.0, 0.0, 0.0, 1.0),
    ];
    let scaled = t.clamp(0.0, 1.0) * (STOPS.len() - 1) as f32;
    let i = (scaled.floor() as usize).min(STOPS.len() - 2);
    let color = STOPS[i].lerp(STOPS[i + 1], scaled - i as f32);
    Float4 {
        a: smoothstep(0.0, 0.25, t),
        ..color
    }
}

/// The built-in strip for `mode`.
pub fn builtin_strip(mode: ShapeMode) -> Vec<Unorm4> {
    (0..SHAPE_STRIP_WIDTH)
        .map(|i| {
            let t = i as f32 / (SHAPE_STRIP_WIDTH - 1) as f32;
            let texel = match mode {
                ShapeMode::Solid => Float4::new(1.0, 1.0, 1.0, smoothstep(0.02, 0.08, t)),
                // soft-edged disc with a brighter rim
                ShapeMode::Bubble => {
                    let rim = smoothstep(0.55, 0.75, t) * (1.0 - smoothstep(0.85, 1.0, t));
                    Float4::new(1.0, 1.0, 1.0, (t * 0.6 + rim * 0.4).min(1.0))
                }
                ShapeMode::Heatmap => heat(t),
            };
            Unorm4::from_floats(texel)
        })
        .collect()
}

impl ShapeSource {
    fn strip(&self, mode: ShapeMode) -> Result<Vec<Unorm4>, ShapeError> {
        match self {
            ShapeSource::Builtin => Ok(builtin_strip(mode)),
            ShapeSource::Png {
                bubble,
                solid,
                heatmap,
            } => {
                let bytes = match mode {
                    ShapeMode::Bubble => bubble,
                    ShapeMode::Solid => solid,
                    ShapeMode::Heatmap => heatmap,
                };
                let image = png_support::decode_rgba8(bytes)?;
                if image.width != SHAPE_STRIP_WIDTH || image.height != 1 {
                    return Err(ShapeError::WrongSize {
                        width: image.width,
                        height: image.height,
                    });
                }
                Ok(image.pixels)
            }
        }
    }
}

/// A shape strip texture and its view.
#[derive(Debug)]
pub struct ShapeResource {
    mode: ShapeMode,
    texture: ResourceHandle<Texture2D>,
    view: ResourceHandle<ShaderResourceView>,
}

impl ShapeResource {
    pub fn create(device: &Device, source: &ShapeSource, mode: ShapeMode) -> Result<Self, ShapeError> {
        let pixels = source.strip(mode)?;
        let texture = device.create_texture_2d_with_rgba8(
            TextureDesc {
                width: SHAPE_STRIP_WIDTH,
                height: 1,
                format: Format::RGBA8Unorm,
                usage: TextureUsage::SHADER_RESOURCE,
            },
            pixels,
        )?;
        let view = device.create_shader_resource_view(&texture)?;
        Ok(ShapeResource {
            mode,
            texture,
            view,
        })
    }

    pub fn mode(&self) -> ShapeMode {
        self.mode
    }

    pub fn texture(&self) -> &ResourceHandle<Texture2D> {
        &self.texture
    }

    pub fn view(&self) -> &ResourceHandle<ShaderResourceView> {
        &self.view
    }
}

/// Owns the shape strip for the current mode.
#[derive(Debug)]
pub struct ShapeCache {
    device: Device,
    source: ShapeSource,
    current: Option<ShapeResource>,
    reloads: u64,
}

impl ShapeCache {
    pub fn new(device: &Device, source: ShapeSource) -> Self {
        ShapeCache {
            device: device.clone(),
            source,
            current: None,
            reloads: 0,
        }
    }

    /// Replaces the cached strip with the one for `mode`.
    ///
    /// The previous strip is released first.  On failure the cache is left empty and
    /// composition proceeds without a strip.
    pub fn load(&mut self, mode: ShapeMode) -> Result<(), ShapeError> {
        self.current = None;
        self.reloads += 1;
        match ShapeResource::create(&self.device, &self.source, mode) {
            Ok(resource) => {
                logwise::info_sync!("loaded {mode} shape strip", mode = logwise::privacy::LogIt(&mode));
                self.current = Some(resource);
                Ok(())
            }
            Err(e) => {
                logwise::error_sync!(
                    "loading {mode} shape strip failed: {err}",
                    mode = logwise::privacy::LogIt(&mode),
                    err = logwise::privacy::LogIt(&e)
                );
                Err(e)
            }
        }
    }

    pub fn current(&self) -> Option<&ShapeResource> {
        self.current.as_ref()
    }

    /// Loads performed, successful or not.
    pub fn reloads(&self) -> u64 {
        self.reloads
    }

    pub fn release(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_strips_ramp_up() {
        for mode in [ShapeMode::Bubble, ShapeMode::Solid, ShapeMode::Heatmap] {
            let strip = builtin_strip(mode);
            assert_eq!(strip.len(), SHAPE_STRIP_WIDTH as usize);
            assert_eq!(strip[0].a, 0, "{mode:?} starts transparent");
            assert!(strip[SHAPE_STRIP_WIDTH as usize - 1].a > 200, "{mode:?} ends opaque");
        }
    }

    #[test]
    fn load_replaces_strip() {
        let device = Device::new();
        let mut cache = ShapeCache::new(&device, ShapeSource::Builtin);
        cache.load(ShapeMode::Bubble).expect("bubble");
        let first = cache.current().map(|s| s.texture().clone()).expect("strip");
        cache.load(ShapeMode::Heatmap).expect("heatmap");
        assert_eq!(cache.current().map(|s| s.mode()), Some(ShapeMode::Heatmap));
        // only our clone keeps the old strip alive
        assert_eq!(first.ref_count(), 1);
        assert_eq!(cache.reloads(), 2);
    }

    #[test]
    fn png_strip_of_wrong_size_is_rejected() {
        let mut bytes = Vec::new();
        png_support::encode_rgba8(&mut bytes, 4, 1, &[Unorm4::default(); 4]).expect("encode");
        let bytes: Arc<[u8]> = bytes.into();
        let source = ShapeSource::Png {
            bubble: bytes.clone(),
            solid: bytes.clone(),
            heatmap: bytes,
        };
        let device = Device::new();
        let mut cache = ShapeCache::new(&device, source);
        assert!(matches!(
            cache.load(ShapeMode::Solid),
            Err(ShapeError::WrongSize { width: 4, height: 1 })
        ));
        assert!(cache.current().is_none());
    }

    #[test]
    fn png_strip_loads() {
        let strip = builtin_strip(ShapeMode::Solid);
        let mut bytes = Vec::new();
        png_support::encode_rgba8(&mut bytes, SHAPE_STRIP_WIDTH, 1, &strip).expect("encode");
        let bytes: Arc<[u8]> = bytes.into();
        let source = ShapeSource::Png {
            bubble: bytes.clone(),
            solid: bytes.clone(),
            heatmap: bytes,
        };
        let device = Device::new();
        let resource = ShapeResource::create(&device, &source, ShapeMode::Solid).expect("strip");
        assert_eq!(resource.texture().to_rgba8(), strip);
    }
}
