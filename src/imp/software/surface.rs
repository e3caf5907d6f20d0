// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Presentation surface.

use crate::bindings::handle::ResourceHandle;
use crate::imp::resources::{Format, TextureDesc, TextureUsage, Texture2D};
use crate::imp::software::{Device, Error};
use crate::pixel_formats::Unorm4;
use crate::pixel_formats::png_support::{self, PngError};
use std::io::Write;

/// How [`SwapChain::present`] treats the back buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PresentMode {
    /// Publish the back buffer.
    #[default]
    Present,
    /// Only report whether presentation would succeed.
    Test,
}

/// Outcome of a presentation.  Occlusion is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PresentStatus {
    Presented,
    Occluded,
}

/// A presented frame, as 8-bit RGBA rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Unorm4>,
}

impl Frame {
    /// Encodes the frame as an 8-bit RGBA PNG.
    pub fn write_png<W: Write>(&self, writer: W) -> Result<(), PngError> {
        png_support::encode_rgba8(writer, self.width, self.height, &self.pixels)
    }
}

/// Owns the back buffer that composited frames are drawn into.
#[derive(Debug)]
pub struct SwapChain {
    device: Device,
    back_buffer: ResourceHandle<Texture2D>,
    occluded: bool,
    presented: u64,
    last_frame: Option<Frame>,
}

fn back_buffer_desc(width: u32, height: u32) -> TextureDesc {
    TextureDesc {
        width,
        height,
        format: Format::RGBA8Unorm,
        usage: TextureUsage::RENDER_TARGET,
    }
}

impl SwapChain {
    pub fn new(device: &Device, width: u32, height: u32) -> Result<Self, Error> {
        let back_buffer = device.create_texture_2d(back_buffer_desc(width, height))?;
        Ok(SwapChain {
            device: device.clone(),
            back_buffer,
            occluded: false,
            presented: 0,
            last_frame: None,
        })
    }

    /// The current back buffer.  The returned handle is a new reference.
    pub fn back_buffer(&self) -> ResourceHandle<Texture2D> {
        self.back_buffer.acquire()
    }

    pub fn width(&self) -> u32 {
        self.back_buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.back_buffer.height()
    }

    /// Reallocates the back buffer at a new size.
    ///
    /// Fails while anything other than the swap chain still references the back buffer,
    /// including views created over it.
    pub fn resize_buffers(&mut self, width: u32, height: u32) -> Result<(), Error> {
        let outstanding = self.back_buffer.ref_count() - 1;
        if outstanding > 0 {
            return Err(Error::BackBufferInUse { outstanding });
        }
        self.back_buffer = self.device.create_texture_2d(back_buffer_desc(width, height))?;
        Ok(())
    }

    /// Simulates the host window becoming hidden or visible.
    pub fn set_occluded(&mut self, occluded: bool) {
        self.occluded = occluded;
    }

    pub fn present(&mut self, mode: PresentMode) -> PresentStatus {
        if self.occluded {
            return PresentStatus::Occluded;
        }
        if mode == PresentMode::Present {
            self.presented += 1;
            self.last_frame = Some(Frame {
                width: self.width(),
                height: self.height(),
                pixels: self.back_buffer.to_rgba8(),
            });
        }
        PresentStatus::Presented
    }

    pub fn presented_count(&self) -> u64 {
        self.presented
    }

    pub fn last_frame(&self) -> Option<&Frame> {
        self.last_frame.as_ref()
    }
}
