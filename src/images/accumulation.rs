// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Ping-pong accumulation surfaces.

use crate::bindings::handle::ResourceHandle;
use crate::imp::resources::{
    Format, RenderTargetView, ShaderResourceView, Texture2D, TextureDesc, TextureUsage,
};
use crate::imp::{Context, Device, Error};

/// A texture usable both as a render target and as a shader input.
#[derive(Debug)]
pub struct RenderTargetResource {
    texture: ResourceHandle<Texture2D>,
    render_target: ResourceHandle<RenderTargetView>,
    shader_resource: ResourceHandle<ShaderResourceView>,
}

impl RenderTargetResource {
    pub fn new(device: &Device, width: u32, height: u32, format: Format) -> Result<Self, Error> {
        let texture = device.create_texture_2d(TextureDesc {
            width,
            height,
            format,
            usage: TextureUsage::RENDER_TARGET,
        })?;
        let render_target = device.create_render_target_view(&texture)?;
        let shader_resource = device.create_shader_resource_view(&texture)?;
        Ok(RenderTargetResource {
            texture,
            render_target,
            shader_resource,
        })
    }

    pub fn texture(&self) -> &ResourceHandle<Texture2D> {
        &self.texture
    }

    pub fn render_target(&self) -> &ResourceHandle<RenderTargetView> {
        &self.render_target
    }

    pub fn shader_resource(&self) -> &ResourceHandle<ShaderResourceView> {
        &self.shader_resource
    }
}

/// Size of an accumulation surface for a `width`×`height` main surface.
pub fn downsampled_extent(width: u32, height: u32, downsample_factor: u32) -> (u32, u32) {
    let factor = downsample_factor.max(1);
    ((width / factor).max(1), (height / factor).max(1))
}

/// Two equally sized accumulation surfaces.
///
/// `front` always holds the most recent completed accumulation; `back` is the one drawn
/// into next.
#[derive(Debug)]
pub struct AccumulationBufferPair {
    front: RenderTargetResource,
    back: RenderTargetResource,
    width: u32,
    height: u32,
    swaps: u64,
}

impl AccumulationBufferPair {
    /// Creates the pair for a main surface of `width`×`height`.
    pub fn new(
        device: &Device,
        width: u32,
        height: u32,
        downsample_factor: u32,
        format: Format,
    ) -> Result<Self, Error> {
        let (width, height) = downsampled_extent(width, height, downsample_factor);
        let front = RenderTargetResource::new(device, width, height, format)?;
        let back = RenderTargetResource::new(device, width, height, format)?;
        Ok(AccumulationBufferPair {
            front,
            back,
            width,
            height,
            swaps: 0,
        })
    }

    pub fn front(&self) -> &RenderTargetResource {
        &self.front
    }

    pub fn back(&self) -> &RenderTargetResource {
        &self.back
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Exchanges the roles of the two surfaces.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.front, &mut self.back);
        self.swaps += 1;
    }

    pub fn swap_count(&self) -> u64 {
        self.swaps
    }

    /// Zeroes both surfaces.
    pub fn clear_both(&self, context: &mut Context) {
        context.clear_render_target_view(self.front.render_target(), [0.0; 4]);
        context.clear_render_target_view(self.back.render_target(), [0.0; 4]);
    }
}
