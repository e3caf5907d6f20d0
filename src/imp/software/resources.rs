// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Objects created by a [`Device`](crate::Device).
//!
//! All of them are reached through [`ResourceHandle`]s.  Objects with mutable contents
//! keep them behind a [`Mutex`], so every type here is `Send + Sync`.

use crate::bindings::category::Stage;
use crate::bindings::handle::ResourceHandle;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

pub use super::programs::ShaderCode;
pub(crate) use super::texture::TexelStorage;
pub use super::texture::{AddressMode, Filter, Format, Normalized, Texel};
use crate::pixel_formats::{Float4, Unorm4};

/// Locks `mutex`, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// The kinds of object a device can create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Buffer,
    Texture2D,
    ShaderResourceView,
    RenderTargetView,
    DepthStencilView,
    UnorderedAccessView,
    Shader,
    InputLayout,
    ClassInstance,
    SamplerState,
    RasterizerState,
    BlendState,
    DepthStencilState,
    Predicate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    Vertex,
    Index,
    Constant,
    StreamOutput,
}

/// Whether the CPU may map a buffer for writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BufferUsage {
    #[default]
    Default,
    Immutable,
    Dynamic,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BufferDesc {
    pub kind: BufferKind,
    pub byte_width: usize,
    pub usage: BufferUsage,
}

impl BufferDesc {
    pub fn new(kind: BufferKind, byte_width: usize) -> Self {
        BufferDesc {
            kind,
            byte_width,
            usage: BufferUsage::Default,
        }
    }

    pub fn with_usage(mut self, usage: BufferUsage) -> Self {
        self.usage = usage;
        self
    }
}

#[derive(Debug)]
pub struct Buffer {
    desc: BufferDesc,
    pub(crate) bytes: Mutex<Vec<u8>>,
}

impl Buffer {
    pub(crate) fn new(desc: BufferDesc, initial: Option<&[u8]>) -> Self {
        let mut bytes = vec![0; desc.byte_width];
        if let Some(initial) = initial {
            bytes[..initial.len()].copy_from_slice(initial);
        }
        Buffer {
            desc,
            bytes: Mutex::new(bytes),
        }
    }

    pub fn desc(&self) -> &BufferDesc {
        &self.desc
    }

    /// A copy of the buffer's current contents.
    pub fn contents(&self) -> Vec<u8> {
        lock(&self.bytes).clone()
    }
}

/// Which views may be created over a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextureUsage {
    pub shader_resource: bool,
    pub render_target: bool,
    pub depth_stencil: bool,
    pub unordered_access: bool,
}

impl TextureUsage {
    pub const SHADER_RESOURCE: TextureUsage = TextureUsage {
        shader_resource: true,
        render_target: false,
        depth_stencil: false,
        unordered_access: false,
    };
    pub const RENDER_TARGET: TextureUsage = TextureUsage {
        shader_resource: true,
        render_target: true,
        depth_stencil: false,
        unordered_access: false,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub format: Format,
    pub usage: TextureUsage,
}

#[derive(Debug)]
pub struct Texture2D {
    desc: TextureDesc,
    pub(crate) texels: Mutex<TexelStorage>,
}

impl Texture2D {
    pub(crate) fn new(desc: TextureDesc, texels: TexelStorage) -> Self {
        Texture2D {
            desc,
            texels: Mutex::new(texels),
        }
    }

    pub fn desc(&self) -> &TextureDesc {
        &self.desc
    }

    pub fn width(&self) -> u32 {
        self.desc.width
    }

    pub fn height(&self) -> u32 {
        self.desc.height
    }

    pub fn read_texel(&self, x: u32, y: u32) -> Float4 {
        lock(&self.texels).read(Texel { x, y })
    }

    /// The whole texture as 8-bit RGBA, row-major.
    pub fn to_rgba8(&self) -> Vec<Unorm4> {
        lock(&self.texels).to_rgba8()
    }
}

macro_rules! texture_view {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug)]
        pub struct $name {
            texture: ResourceHandle<Texture2D>,
        }

        impl $name {
            pub(crate) fn new(texture: &ResourceHandle<Texture2D>) -> Self {
                $name {
                    texture: texture.acquire(),
                }
            }

            /// The viewed texture.  The view holds its own reference to it.
            pub fn texture(&self) -> &ResourceHandle<Texture2D> {
                &self.texture
            }
        }
    };
}

texture_view!(
    /// Read access to a texture from a programmable stage.
    ShaderResourceView
);
texture_view!(RenderTargetView);
texture_view!(DepthStencilView);
texture_view!(UnorderedAccessView);

#[derive(Debug)]
pub struct Shader {
    stage: Stage,
    code: ShaderCode,
}

impl Shader {
    pub(crate) fn new(stage: Stage, code: ShaderCode) -> Self {
        Shader { stage, code }
    }
    pub fn stage(&self) -> Stage {
        self.stage
    }
    pub fn code(&self) -> ShaderCode {
        self.code
    }
}

/// One vertex attribute: a semantic name and its byte offset within a vertex.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InputElement {
    pub semantic: &'static str,
    pub offset: u32,
    pub components: u8,
}

#[derive(Debug)]
pub struct InputLayout {
    elements: Vec<InputElement>,
}

impl InputLayout {
    pub(crate) fn new(elements: Vec<InputElement>) -> Self {
        InputLayout { elements }
    }
    pub fn elements(&self) -> &[InputElement] {
        &self.elements
    }
}

#[derive(Debug)]
pub struct ClassInstance {
    name: String,
}

impl ClassInstance {
    pub(crate) fn new(name: String) -> Self {
        ClassInstance { name }
    }
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SamplerDesc {
    pub filter: Filter,
    pub address: AddressMode,
}

#[derive(Debug)]
pub struct SamplerState {
    desc: SamplerDesc,
}

impl SamplerState {
    pub(crate) fn new(desc: SamplerDesc) -> Self {
        SamplerState { desc }
    }
    pub fn desc(&self) -> SamplerDesc {
        self.desc
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RasterizerDesc {
    pub scissor_enable: bool,
}

#[derive(Debug)]
pub struct RasterizerState {
    desc: RasterizerDesc,
}

impl RasterizerState {
    pub(crate) fn new(desc: RasterizerDesc) -> Self {
        RasterizerState { desc }
    }
    pub fn desc(&self) -> RasterizerDesc {
        self.desc
    }
}

/// How pixel program output combines with the render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    /// Output replaces the target.
    #[default]
    Opaque,
    /// `src + dst * (1 - src.a)`, for premultiplied output.
    PremultipliedOver,
}

#[derive(Debug)]
pub struct BlendState {
    mode: BlendMode,
}

impl BlendState {
    pub(crate) fn new(mode: BlendMode) -> Self {
        BlendState { mode }
    }
    pub fn mode(&self) -> BlendMode {
        self.mode
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DepthStencilDesc {
    pub depth_enable: bool,
}

#[derive(Debug)]
pub struct DepthStencilState {
    desc: DepthStencilDesc,
}

impl DepthStencilState {
    pub(crate) fn new(desc: DepthStencilDesc) -> Self {
        DepthStencilState { desc }
    }
    pub fn desc(&self) -> DepthStencilDesc {
        self.desc
    }
}

/// A predicate whose result gates draws.
///
/// Draws are skipped while a predicate is bound and its result equals the value it was
/// bound with.
#[derive(Debug, Default)]
pub struct Predicate {
    result: AtomicBool,
}

impl Predicate {
    pub fn result(&self) -> bool {
        self.result.load(Ordering::Relaxed)
    }
    pub fn set_result(&self, result: bool) {
        self.result.store(result, Ordering::Relaxed);
    }
}
