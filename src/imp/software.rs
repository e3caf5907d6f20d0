// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
CPU implementation of a binding-style graphics device.

The backend mirrors the shape of an immediate-mode device API: a [`Device`] creates
reference-counted objects, a [`Context`] holds the pipeline bindings and executes draws,
and a [`SwapChain`] owns the presentable back buffer.  Shader programs are built into
the backend and selected by [`ShaderCode`](resources::ShaderCode).
*/

mod context;
mod device;
mod error;
pub(crate) mod programs;
mod raster;
pub mod resources;
mod surface;
pub(crate) mod texture;

pub use context::{Context, MappedWrite};
pub use device::Device;
pub use error::Error;
pub use surface::{Frame, PresentMode, PresentStatus, SwapChain};
pub use resources::*;
