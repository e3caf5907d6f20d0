// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Object factory.

use crate::bindings::category::Stage;
use crate::bindings::handle::ResourceHandle;
use crate::imp::resources::{
    BlendMode, BlendState, Buffer, BufferDesc, ClassInstance, DepthStencilDesc,
    DepthStencilState, DepthStencilView, InputElement, InputLayout, ObjectKind, Predicate,
    RasterizerDesc, RasterizerState, RenderTargetView, SamplerDesc, SamplerState, Shader,
    ShaderCode, ShaderResourceView, TexelStorage, Texture2D, TextureDesc, UnorderedAccessView,
    lock,
};
use crate::imp::software::Error;
use crate::pixel_formats::Unorm4;
use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Mutex, Weak};

#[derive(Default)]
struct Registry {
    armed_faults: HashSet<ObjectKind>,
    created: HashMap<ObjectKind, u64>,
    live: Vec<(ObjectKind, Weak<dyn Any + Send + Sync>)>,
}

/// Creates graphics objects.
///
/// Cloning a `Device` yields another reference to the same device.  The device keeps
/// weak references to everything it created so tests can detect leaks through
/// [`live_objects`](Self::live_objects).
#[derive(Clone)]
pub struct Device {
    registry: Arc<Mutex<Registry>>,
}

impl Debug for Device {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("live_objects", &self.live_objects())
            .finish()
    }
}

impl Default for Device {
    fn default() -> Self {
        Self::new()
    }
}

impl Device {
    pub fn new() -> Self {
        Device {
            registry: Arc::new(Mutex::new(Registry::default())),
        }
    }

    /// Makes the next creation of `kind` fail with [`Error::CreationFailed`].
    pub fn fail_next_creation(&self, kind: ObjectKind) {
        lock(&self.registry).armed_faults.insert(kind);
    }

    /// Successful creations of `kind` over the device's lifetime.
    pub fn created_count(&self, kind: ObjectKind) -> u64 {
        lock(&self.registry).created.get(&kind).copied().unwrap_or(0)
    }

    /// Objects created by this device that are still referenced.
    pub fn live_objects(&self) -> usize {
        let mut registry = lock(&self.registry);
        registry.live.retain(|(_, weak)| weak.strong_count() > 0);
        registry.live.len()
    }

    pub fn live_count(&self, kind: ObjectKind) -> usize {
        let mut registry = lock(&self.registry);
        registry.live.retain(|(_, weak)| weak.strong_count() > 0);
        registry.live.iter().filter(|(k, _)| *k == kind).count()
    }

    fn admit(&self, kind: ObjectKind) -> Result<(), Error> {
        if lock(&self.registry).armed_faults.remove(&kind) {
            logwise::warn_sync!(
                "injected creation failure for {kind}",
                kind = logwise::privacy::LogIt(&kind)
            );
            return Err(Error::CreationFailed(kind));
        }
        Ok(())
    }

    fn register<R: Send + Sync + 'static>(&self, kind: ObjectKind, resource: R) -> ResourceHandle<R> {
        let handle = ResourceHandle::new(resource);
        let erased: Arc<dyn Any + Send + Sync> = handle.as_arc().clone();
        let weak = Arc::downgrade(&erased);
        let mut registry = lock(&self.registry);
        *registry.created.entry(kind).or_insert(0) += 1;
        registry.live.push((kind, weak));
        handle
    }

    pub fn create_buffer(
        &self,
        desc: BufferDesc,
        initial: Option<&[u8]>,
    ) -> Result<ResourceHandle<Buffer>, Error> {
        if let Some(initial) = initial
            && initial.len() > desc.byte_width
        {
            return Err(Error::InitialDataTooLarge {
                provided: initial.len(),
                capacity: desc.byte_width,
            });
        }
        self.admit(ObjectKind::Buffer)?;
        Ok(self.register(ObjectKind::Buffer, Buffer::new(desc, initial)))
    }

    pub fn create_texture_2d(&self, desc: TextureDesc) -> Result<ResourceHandle<Texture2D>, Error> {
        if desc.width == 0 || desc.height == 0 {
            return Err(Error::InvalidDimensions {
                width: desc.width,
                height: desc.height,
            });
        }
        self.admit(ObjectKind::Texture2D)?;
        let texels = TexelStorage::new(desc.width, desc.height, desc.format);
        Ok(self.register(ObjectKind::Texture2D, Texture2D::new(desc, texels)))
    }

    /// Creates an RGBA8 texture holding `pixels`.
    pub fn create_texture_2d_with_rgba8(
        &self,
        desc: TextureDesc,
        pixels: Vec<Unorm4>,
    ) -> Result<ResourceHandle<Texture2D>, Error> {
        if desc.width == 0
            || desc.height == 0
            || pixels.len() != desc.width as usize * desc.height as usize
            || desc.format != crate::imp::resources::Format::RGBA8Unorm
        {
            return Err(Error::InvalidDimensions {
                width: desc.width,
                height: desc.height,
            });
        }
        self.admit(ObjectKind::Texture2D)?;
        let texels = TexelStorage::from_rgba8(desc.width, desc.height, pixels);
        Ok(self.register(ObjectKind::Texture2D, Texture2D::new(desc, texels)))
    }

    pub fn create_shader_resource_view(
        &self,
        texture: &ResourceHandle<Texture2D>,
    ) -> Result<ResourceHandle<ShaderResourceView>, Error> {
        let kind = ObjectKind::ShaderResourceView;
        if !texture.desc().usage.shader_resource {
            return Err(Error::MissingBindUsage { kind });
        }
        self.admit(kind)?;
        Ok(self.register(kind, ShaderResourceView::new(texture)))
    }

    pub fn create_render_target_view(
        &self,
        texture: &ResourceHandle<Texture2D>,
    ) -> Result<ResourceHandle<RenderTargetView>, Error> {
        let kind = ObjectKind::RenderTargetView;
        if !texture.desc().usage.render_target {
            return Err(Error::MissingBindUsage { kind });
        }
        self.admit(kind)?;
        Ok(self.register(kind, RenderTargetView::new(texture)))
    }

    pub fn create_depth_stencil_view(
        &self,
        texture: &ResourceHandle<Texture2D>,
    ) -> Result<ResourceHandle<DepthStencilView>, Error> {
        let kind = ObjectKind::DepthStencilView;
        if !texture.desc().usage.depth_stencil {
            return Err(Error::MissingBindUsage { kind });
        }
        self.admit(kind)?;
        Ok(self.register(kind, DepthStencilView::new(texture)))
    }

    pub fn create_unordered_access_view(
        &self,
        texture: &ResourceHandle<Texture2D>,
    ) -> Result<ResourceHandle<UnorderedAccessView>, Error> {
        let kind = ObjectKind::UnorderedAccessView;
        if !texture.desc().usage.unordered_access {
            return Err(Error::MissingBindUsage { kind });
        }
        self.admit(kind)?;
        Ok(self.register(kind, UnorderedAccessView::new(texture)))
    }

    pub fn create_shader(&self, stage: Stage, code: ShaderCode) -> Result<ResourceHandle<Shader>, Error> {
        if code.stage() != stage {
            return Err(Error::StageMismatch {
                program: code.stage(),
                requested: stage,
            });
        }
        self.admit(ObjectKind::Shader)?;
        Ok(self.register(ObjectKind::Shader, Shader::new(stage, code)))
    }

    pub fn create_input_layout(
        &self,
        elements: Vec<InputElement>,
    ) -> Result<ResourceHandle<InputLayout>, Error> {
        self.admit(ObjectKind::InputLayout)?;
        Ok(self.register(ObjectKind::InputLayout, InputLayout::new(elements)))
    }

    pub fn create_class_instance(&self, name: &str) -> Result<ResourceHandle<ClassInstance>, Error> {
        self.admit(ObjectKind::ClassInstance)?;
        Ok(self.register(ObjectKind::ClassInstance, ClassInstance::new(name.to_owned())))
    }

    pub fn create_sampler_state(&self, desc: SamplerDesc) -> Result<ResourceHandle<SamplerState>, Error> {
        self.admit(ObjectKind::SamplerState)?;
        Ok(self.register(ObjectKind::SamplerState, SamplerState::new(desc)))
    }

    pub fn create_rasterizer_state(
        &self,
        desc: RasterizerDesc,
    ) -> Result<ResourceHandle<RasterizerState>, Error> {
        self.admit(ObjectKind::RasterizerState)?;
        Ok(self.register(ObjectKind::RasterizerState, RasterizerState::new(desc)))
    }

    pub fn create_blend_state(&self, mode: BlendMode) -> Result<ResourceHandle<BlendState>, Error> {
        self.admit(ObjectKind::BlendState)?;
        Ok(self.register(ObjectKind::BlendState, BlendState::new(mode)))
    }

    pub fn create_depth_stencil_state(
        &self,
        desc: DepthStencilDesc,
    ) -> Result<ResourceHandle<DepthStencilState>, Error> {
        self.admit(ObjectKind::DepthStencilState)?;
        Ok(self.register(ObjectKind::DepthStencilState, DepthStencilState::new(desc)))
    }

    pub fn create_predicate(&self) -> Result<ResourceHandle<Predicate>, Error> {
        self.admit(ObjectKind::Predicate)?;
        Ok(self.register(ObjectKind::Predicate, Predicate::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imp::resources::{Format, TextureUsage};

    fn desc(usage: TextureUsage) -> TextureDesc {
        TextureDesc {
            width: 4,
            height: 4,
            format: Format::R32Float,
            usage,
        }
    }

    #[test]
    fn injected_fault_fires_once() {
        let device = Device::new();
        device.fail_next_creation(ObjectKind::Texture2D);
        assert_eq!(
            device.create_texture_2d(desc(TextureUsage::RENDER_TARGET)).err(),
            Some(Error::CreationFailed(ObjectKind::Texture2D))
        );
        assert!(device.create_texture_2d(desc(TextureUsage::RENDER_TARGET)).is_ok());
        assert_eq!(device.created_count(ObjectKind::Texture2D), 1);
    }

    #[test]
    fn live_objects_track_drops() {
        let device = Device::new();
        let texture = device
            .create_texture_2d(desc(TextureUsage::RENDER_TARGET))
            .expect("texture");
        let view = device.create_render_target_view(&texture).expect("rtv");
        assert_eq!(device.live_objects(), 2);
        drop(texture);
        // the view still holds the texture
        assert_eq!(device.live_count(ObjectKind::Texture2D), 1);
        drop(view);
        assert_eq!(device.live_objects(), 0);
    }

    #[test]
    fn views_require_bind_usage() {
        let device = Device::new();
        let texture = device
            .create_texture_2d(desc(TextureUsage::SHADER_RESOURCE))
            .expect("texture");
        assert_eq!(
            device.create_render_target_view(&texture).err(),
            Some(Error::MissingBindUsage {
                kind: ObjectKind::RenderTargetView
            })
        );
        assert!(device.create_shader_resource_view(&texture).is_ok());
    }

    #[test]
    fn shader_stage_must_match_program() {
        let device = Device::new();
        assert!(matches!(
            device.create_shader(Stage::Vertex, ShaderCode::AccumulateSolid),
            Err(Error::StageMismatch { .. })
        ));
    }

    #[test]
    fn zero_sized_texture_is_rejected() {
        let device = Device::new();
        let mut d = desc(TextureUsage::RENDER_TARGET);
        d.width = 0;
        assert!(matches!(
            device.create_texture_2d(d),
            Err(Error::InvalidDimensions { width: 0, .. })
        ));
    }
}
