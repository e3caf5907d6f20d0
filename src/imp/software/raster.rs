// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Triangle rasterization for [`Context::draw`](super::Context::draw).

use crate::bindings::category::Stage;
use crate::bindings::state::{PipelineState, PrimitiveTopology, Rect};
use crate::images::constants::{PixelConstants, QuadVertex};
use crate::imp::resources::{BlendMode, ShaderResourceView, TexelStorage, lock};
use crate::imp::software::Error;
use crate::imp::software::programs::{self, PixelInput, VertexOutput};
use crate::imp::software::texture::Texel;
use crate::bindings::handle::ResourceHandle;
use std::sync::MutexGuard;

/// Pixel-space bounds, `max` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Bounds {
    min_x: i64,
    min_y: i64,
    max_x: i64,
    max_y: i64,
}

impl Bounds {
    fn intersect(self, other: Bounds) -> Bounds {
        Bounds {
            min_x: self.min_x.max(other.min_x),
            min_y: self.min_y.max(other.min_y),
            max_x: self.max_x.min(other.max_x),
            max_y: self.max_y.min(other.max_y),
        }
    }

    fn from_rect(rect: Rect) -> Bounds {
        Bounds {
            min_x: rect.left as i64,
            min_y: rect.top as i64,
            max_x: rect.right as i64,
            max_y: rect.bottom as i64,
        }
    }
}

struct ScreenVertex {
    x: f32,
    y: f32,
    uv: [f32; 2],
}

fn edge(a: &ScreenVertex, b: &ScreenVertex, px: f32, py: f32) -> f32 {
    (b.x - a.x) * (py - a.y) - (b.y - a.y) * (px - a.x)
}

fn read_vertices(state: &PipelineState, count: usize, start: usize) -> Result<Vec<QuadVertex>, Error> {
    let binding = &state.vertex_buffers[0];
    let buffer = binding
        .buffer
        .as_ref()
        .ok_or(Error::MissingBinding("vertex buffer"))?;
    let bytes = lock(&buffer.bytes);
    let stride = binding.stride.max(QuadVertex::STRIDE) as usize;
    let base = binding.offset as usize;
    let vertex_size = std::mem::size_of::<QuadVertex>();
    let available = bytes.len().saturating_sub(base).saturating_add(stride - vertex_size) / stride;
    if start + count > available {
        return Err(Error::VertexBufferTooSmall {
            required: start + count,
            available,
        });
    }
    Ok((start..start + count)
        .map(|i| {
            let at = base + i * stride;
            bytemuck::pod_read_unaligned::<QuadVertex>(&bytes[at..at + vertex_size])
        })
        .collect())
}

fn lock_input(view: Option<&ResourceHandle<ShaderResourceView>>) -> Option<MutexGuard<'_, TexelStorage>> {
    view.map(|v| lock(&v.texture().texels))
}

/// Runs one draw against `state`.  Returns the number of pixels shaded.
pub(super) fn draw(state: &PipelineState, vertex_count: u32, start_vertex: u32) -> Result<u64, Error> {
    if state.primitive_topology != PrimitiveTopology::TriangleList {
        return Err(Error::UnsupportedTopology);
    }
    if state.input_layout.is_none() {
        return Err(Error::MissingBinding("input layout"));
    }
    let vertex_shader = state
        .stage(Stage::Vertex)
        .shader
        .shader
        .as_ref()
        .ok_or(Error::MissingBinding("vertex shader"))?;
    let pixel_shader = state
        .stage(Stage::Pixel)
        .shader
        .shader
        .as_ref()
        .ok_or(Error::MissingBinding("pixel shader"))?;
    let target_view = state.output.render_targets[0]
        .as_ref()
        .ok_or(Error::MissingBinding("render target"))?;
    let viewport = *state
        .viewports
        .first()
        .ok_or(Error::MissingBinding("viewport"))?;

    let pixel_stage = state.stage(Stage::Pixel);
    let target = target_view.texture();
    let inputs = [pixel_stage.shader_resources[0].as_ref(), pixel_stage.shader_resources[1].as_ref()];
    if inputs.iter().flatten().any(|srv| srv.texture().same_object(target)) {
        return Err(Error::ReadWriteHazard);
    }

    let constants = pixel_stage.constant_buffers[0]
        .as_ref()
        .and_then(|b| PixelConstants::read_from(&lock(&b.bytes)))
        .unwrap_or_default();
    let sampler = pixel_stage.samplers[0]
        .as_ref()
        .map(|s| s.desc())
        .unwrap_or_default();
    let blend = state
        .blend
        .state
        .as_ref()
        .map(|b| b.mode())
        .unwrap_or_default();

    let vertices = read_vertices(state, vertex_count as usize, start_vertex as usize)?;
    let screen: Vec<ScreenVertex> = vertices
        .iter()
        .map(|v| {
            let VertexOutput { position, uv } = programs::run_vertex(vertex_shader.code(), v);
            ScreenVertex {
                x: viewport.top_left_x + (position[0] + 1.0) * 0.5 * viewport.width,
                y: viewport.top_left_y + (1.0 - position[1]) * 0.5 * viewport.height,
                uv,
            }
        })
        .collect();

    // both slots may view one texture; its mutex is taken once
    let shared_input = matches!(inputs, [Some(a), Some(b)] if a.texture().same_object(b.texture()));
    let accumulation = lock_input(inputs[0]);
    let shape_guard = if shared_input { None } else { lock_input(inputs[1]) };
    let shape = if shared_input {
        accumulation.as_deref()
    } else {
        shape_guard.as_deref()
    };
    let mut out = lock(&target.texels);

    let mut clip = Bounds {
        min_x: viewport.top_left_x.floor() as i64,
        min_y: viewport.top_left_y.floor() as i64,
        max_x: (viewport.top_left_x + viewport.width).ceil() as i64,
        max_y: (viewport.top_left_y + viewport.height).ceil() as i64,
    }
    .intersect(Bounds {
        min_x: 0,
        min_y: 0,
        max_x: out.width() as i64,
        max_y: out.height() as i64,
    });
    let scissor_enable = state
        .rasterizer_state
        .as_ref()
        .is_some_and(|r| r.desc().scissor_enable);
    if scissor_enable {
        let rect = state.scissor_rects.first().copied().unwrap_or_default();
        clip = clip.intersect(Bounds::from_rect(rect));
    }
    if clip.min_x >= clip.max_x || clip.min_y >= clip.max_y {
        return Ok(0);
    }

    let clip_width = (clip.max_x - clip.min_x) as usize;
    let mut shaded = vec![false; clip_width * (clip.max_y - clip.min_y) as usize];
    let mut pixels = 0u64;
    for tri in screen.chunks_exact(3) {
        let (a, b, c) = (&tri[0], &tri[1], &tri[2]);
        let area = edge(a, b, c.x, c.y);
        if area == 0.0 {
            continue;
        }
        let tri_bounds = Bounds {
            min_x: a.x.min(b.x).min(c.x).floor() as i64,
            min_y: a.y.min(b.y).min(c.y).floor() as i64,
            max_x: a.x.max(b.x).max(c.x).ceil() as i64,
            max_y: a.y.max(b.y).max(c.y).ceil() as i64,
        }
        .intersect(clip);
        for y in tri_bounds.min_y..tri_bounds.max_y {
            for x in tri_bounds.min_x..tri_bounds.max_x {
                let index = (y - clip.min_y) as usize * clip_width + (x - clip.min_x) as usize;
                if shaded[index] {
                    continue;
                }
                let (px, py) = (x as f32 + 0.5, y as f32 + 0.5);
                let w0 = edge(b, c, px, py) / area;
                let w1 = edge(c, a, px, py) / area;
                let w2 = edge(a, b, px, py) / area;
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }
                shaded[index] = true;
                let uv = [
                    w0 * a.uv[0] + w1 * b.uv[0] + w2 * c.uv[0],
                    w0 * a.uv[1] + w1 * b.uv[1] + w2 * c.uv[1],
                ];
                let input = PixelInput {
                    uv,
                    constants: &constants,
                    accumulation: accumulation.as_deref(),
                    shape,
                    sampler,
                };
                let src = programs::run_pixel(pixel_shader.code(), &input);
                let texel = Texel {
                    x: x as u32,
                    y: y as u32,
                };
                let value = match blend {
                    BlendMode::Opaque => src,
                    BlendMode::PremultipliedOver => src + out.read(texel) * (1.0 - src.a),
                };
                out.write(texel, value);
                pixels += 1;
            }
        }
    }
    Ok(pixels)
}
