// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! The immediate context.

use crate::bindings::category::{
    MAX_CLASS_INSTANCES, STREAM_OUTPUT_SLOT_COUNT, Stage, VIEWPORT_AND_SCISSOR_COUNT,
};
use crate::bindings::handle::ResourceHandle;
use crate::bindings::state::{
    BlendBinding, DepthStencilBinding, IndexBufferBinding, IndexFormat, OutputTargets,
    PipelineState, PredicationBinding, PrimitiveTopology, Rect, ShaderBinding, Slot,
    StreamOutputBinding, VertexBufferBinding, Viewport,
};
use crate::imp::resources::{
    BlendState, Buffer, BufferUsage, ClassInstance, DepthStencilState, DepthStencilView,
    InputLayout, Predicate, RasterizerState, RenderTargetView, SamplerState, Shader,
    ShaderResourceView, UnorderedAccessView, lock,
};
use crate::imp::software::{Device, Error, raster};
use crate::pipeline::StatefulContext;
use std::ops::{Deref, DerefMut};
use std::sync::MutexGuard;

fn read_range<T: Clone + Default>(slots: &[T], start_slot: usize, count: usize) -> Vec<T> {
    (start_slot..start_slot + count)
        .map(|i| slots.get(i).cloned().unwrap_or_default())
        .collect()
}

fn bind_range<T: Clone>(slots: &mut [T], start_slot: usize, values: &[T]) {
    debug_assert!(
        start_slot + values.len() <= slots.len(),
        "binding slots {}..{} of {}",
        start_slot,
        start_slot + values.len(),
        slots.len()
    );
    for (slot, value) in slots.iter_mut().skip(start_slot).zip(values) {
        *slot = value.clone();
    }
}

/// Replaces every slot: the first `values.len()` from `values`, the rest with defaults.
fn replace_all<T: Clone + Default>(slots: &mut [T], values: &[T]) {
    debug_assert!(values.len() <= slots.len());
    for (i, slot) in slots.iter_mut().enumerate() {
        *slot = values.get(i).cloned().unwrap_or_default();
    }
}

/// Executes binding calls and draws against a [`PipelineState`].
///
/// A new context starts from the cleared state.
#[derive(Debug)]
pub struct Context {
    device: Device,
    state: PipelineState,
    draws: u64,
    skipped_draws: u64,
    pixels_shaded: u64,
    fail_next_map: bool,
}

impl Context {
    pub fn new(device: &Device) -> Self {
        Context {
            device: device.clone(),
            state: PipelineState::default(),
            draws: 0,
            skipped_draws: 0,
            pixels_shaded: 0,
            fail_next_map: false,
        }
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    /// The complete binding state, for inspection.
    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Unbinds everything.
    pub fn clear_state(&mut self) {
        self.state = PipelineState::default();
    }

    /// Draws executed so far, excluding predicated-away draws.
    pub fn draw_count(&self) -> u64 {
        self.draws
    }

    pub fn skipped_draw_count(&self) -> u64 {
        self.skipped_draws
    }

    pub fn pixels_shaded(&self) -> u64 {
        self.pixels_shaded
    }

    /// Draws `vertex_count` vertices of the bound triangle list starting at `start_vertex`.
    pub fn draw(&mut self, vertex_count: u32, start_vertex: u32) -> Result<(), Error> {
        let predication = &self.state.predication;
        if let Some(predicate) = &predication.predicate
            && predicate.result() == predication.value
        {
            self.skipped_draws += 1;
            return Ok(());
        }
        let pixels = raster::draw(&self.state, vertex_count, start_vertex)?;
        self.draws += 1;
        self.pixels_shaded += pixels;
        Ok(())
    }

    pub fn clear_render_target_view(&mut self, view: &ResourceHandle<RenderTargetView>, color: [f32; 4]) {
        lock(&view.texture().texels).fill(crate::pixel_formats::Float4::from_array(color));
    }

    /// Maps a dynamic buffer for writing, discarding its previous contents.
    ///
    /// The buffer is unmapped when the returned guard drops.
    pub fn map_write_discard<'b>(
        &mut self,
        buffer: &'b ResourceHandle<Buffer>,
    ) -> Result<MappedWrite<'b>, Error> {
        if buffer.desc().usage != BufferUsage::Dynamic {
            return Err(Error::NotMappable);
        }
        if std::mem::take(&mut self.fail_next_map) {
            logwise::warn_sync!("injected map failure");
            return Err(Error::MapFailed);
        }
        let mut bytes = lock(&buffer.bytes);
        bytes.fill(0);
        Ok(MappedWrite { bytes })
    }

    /// Makes the next [`map_write_discard`](Self::map_write_discard) fail.
    pub fn fail_next_map(&mut self) {
        self.fail_next_map = true;
    }
}

/// A mapped buffer.  Dropping it unmaps.
#[derive(Debug)]
pub struct MappedWrite<'b> {
    bytes: MutexGuard<'b, Vec<u8>>,
}

impl Deref for MappedWrite<'_> {
    type Target = [u8];
    fn deref(&self) -> &[u8] {
        &self.bytes
    }
}

impl DerefMut for MappedWrite<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

impl StatefulContext for Context {
    fn primitive_topology(&self) -> PrimitiveTopology {
        self.state.primitive_topology
    }
    fn set_primitive_topology(&mut self, topology: PrimitiveTopology) {
        self.state.primitive_topology = topology;
    }

    fn index_buffer(&self) -> IndexBufferBinding {
        self.state.index_buffer.clone()
    }
    fn set_index_buffer(
        &mut self,
        buffer: Option<&ResourceHandle<Buffer>>,
        format: IndexFormat,
        offset: u32,
    ) {
        self.state.index_buffer = IndexBufferBinding {
            buffer: buffer.cloned(),
            format,
            offset,
        };
    }

    fn vertex_buffers(&self, start_slot: usize, count: usize) -> Vec<VertexBufferBinding> {
        read_range(&self.state.vertex_buffers, start_slot, count)
    }
    fn set_vertex_buffers(&mut self, start_slot: usize, bindings: &[VertexBufferBinding]) {
        bind_range(&mut self.state.vertex_buffers, start_slot, bindings);
    }

    fn input_layout(&self) -> Slot<InputLayout> {
        self.state.input_layout.clone()
    }
    fn set_input_layout(&mut self, layout: Option<&ResourceHandle<InputLayout>>) {
        self.state.input_layout = layout.cloned();
    }

    fn shader(&self, stage: Stage) -> ShaderBinding {
        self.state.stage(stage).shader.clone()
    }
    fn set_shader(
        &mut self,
        stage: Stage,
        shader: Option<&ResourceHandle<Shader>>,
        class_instances: &[ResourceHandle<ClassInstance>],
    ) {
        debug_assert!(class_instances.len() <= MAX_CLASS_INSTANCES);
        self.state.stage_mut(stage).shader = ShaderBinding {
            shader: shader.cloned(),
            class_instances: class_instances.to_vec(),
        };
    }

    fn constant_buffers(&self, stage: Stage, start_slot: usize, count: usize) -> Vec<Slot<Buffer>> {
        read_range(&self.state.stage(stage).constant_buffers, start_slot, count)
    }
    fn set_constant_buffers(&mut self, stage: Stage, start_slot: usize, buffers: &[Slot<Buffer>]) {
        bind_range(&mut self.state.stage_mut(stage).constant_buffers, start_slot, buffers);
    }

    fn shader_resources(
        &self,
        stage: Stage,
        start_slot: usize,
        count: usize,
    ) -> Vec<Slot<ShaderResourceView>> {
        read_range(&self.state.stage(stage).shader_resources, start_slot, count)
    }
    fn set_shader_resources(
        &mut self,
        stage: Stage,
        start_slot: usize,
        views: &[Slot<ShaderResourceView>],
    ) {
        bind_range(&mut self.state.stage_mut(stage).shader_resources, start_slot, views);
    }

    fn samplers(&self, stage: Stage, start_slot: usize, count: usize) -> Vec<Slot<SamplerState>> {
        read_range(&self.state.stage(stage).samplers, start_slot, count)
    }
    fn set_samplers(&mut self, stage: Stage, start_slot: usize, samplers: &[Slot<SamplerState>]) {
        bind_range(&mut self.state.stage_mut(stage).samplers, start_slot, samplers);
    }

    fn stream_output_targets(&self) -> Vec<StreamOutputBinding> {
        read_range(&self.state.stream_output, 0, STREAM_OUTPUT_SLOT_COUNT)
    }
    fn set_stream_output_targets(&mut self, targets: &[StreamOutputBinding]) {
        replace_all(&mut self.state.stream_output, targets);
    }

    fn rasterizer_state(&self) -> Slot<RasterizerState> {
        self.state.rasterizer_state.clone()
    }
    fn set_rasterizer_state(&mut self, state: Option<&ResourceHandle<RasterizerState>>) {
        self.state.rasterizer_state = state.cloned();
    }

    fn viewports(&self) -> Vec<Viewport> {
        self.state.viewports.clone()
    }
    fn set_viewports(&mut self, viewports: &[Viewport]) {
        debug_assert!(viewports.len() <= VIEWPORT_AND_SCISSOR_COUNT);
        self.state.viewports = viewports.to_vec();
    }

    fn scissor_rects(&self) -> Vec<Rect> {
        self.state.scissor_rects.clone()
    }
    fn set_scissor_rects(&mut self, rects: &[Rect]) {
        debug_assert!(rects.len() <= VIEWPORT_AND_SCISSOR_COUNT);
        self.state.scissor_rects = rects.to_vec();
    }

    fn blend_state(&self) -> BlendBinding {
        self.state.blend.clone()
    }
    fn set_blend_state(
        &mut self,
        state: Option<&ResourceHandle<BlendState>>,
        blend_factor: [f32; 4],
        sample_mask: u32,
    ) {
        self.state.blend = BlendBinding {
            state: state.cloned(),
            blend_factor,
            sample_mask,
        };
    }

    fn depth_stencil_state(&self) -> DepthStencilBinding {
        self.state.depth_stencil.clone()
    }
    fn set_depth_stencil_state(
        &mut self,
        state: Option<&ResourceHandle<DepthStencilState>>,
        stencil_ref: u32,
    ) {
        self.state.depth_stencil = DepthStencilBinding {
            state: state.cloned(),
            stencil_ref,
        };
    }

    fn render_targets(&self) -> OutputTargets {
        self.state.output.clone()
    }
    fn set_render_targets(
        &mut self,
        views: &[Slot<RenderTargetView>],
        depth_stencil: Option<&ResourceHandle<DepthStencilView>>,
    ) {
        replace_all(&mut self.state.output.render_targets, views);
        self.state.output.depth_stencil = depth_stencil.cloned();
    }

    fn render_targets_and_unordered_access_views(
        &self,
        uav_start_slot: usize,
        uav_count: usize,
    ) -> (OutputTargets, Vec<Slot<UnorderedAccessView>>) {
        (
            self.state.output.clone(),
            read_range(&self.state.output_unordered_access_views, uav_start_slot, uav_count),
        )
    }
    fn set_render_targets_and_unordered_access_views(
        &mut self,
        views: &[Slot<RenderTargetView>],
        depth_stencil: Option<&ResourceHandle<DepthStencilView>>,
        uav_start_slot: usize,
        uavs: &[Slot<UnorderedAccessView>],
    ) {
        self.set_render_targets(views, depth_stencil);
        bind_range(&mut self.state.output_unordered_access_views, uav_start_slot, uavs);
    }

    fn compute_unordered_access_views(
        &self,
        start_slot: usize,
        count: usize,
    ) -> Vec<Slot<UnorderedAccessView>> {
        read_range(&self.state.compute_unordered_access_views, start_slot, count)
    }
    fn set_compute_unordered_access_views(
        &mut self,
        start_slot: usize,
        uavs: &[Slot<UnorderedAccessView>],
    ) {
        bind_range(&mut self.state.compute_unordered_access_views, start_slot, uavs);
    }

    fn predication(&self) -> PredicationBinding {
        self.state.predication.clone()
    }
    fn set_predication(&mut self, predicate: Option<&ResourceHandle<Predicate>>, value: bool) {
        self.state.predication = PredicationBinding {
            predicate: predicate.cloned(),
            value,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::constants::{FULLSCREEN_QUAD, QuadVertex};
    use crate::imp::resources::{
        BufferDesc, BufferKind, Format, InputElement, RasterizerDesc, ShaderCode, TextureDesc,
        TextureUsage,
    };

    fn quad_context(device: &Device) -> (Context, ResourceHandle<RenderTargetView>) {
        let mut context = Context::new(device);
        let vb = device
            .create_buffer(
                BufferDesc::new(BufferKind::Vertex, std::mem::size_of_val(&FULLSCREEN_QUAD)),
                Some(bytemuck::cast_slice(&FULLSCREEN_QUAD)),
            )
            .expect("vb");
        let layout = device
            .create_input_layout(vec![InputElement {
                semantic: "POSITION",
                offset: 0,
                components: 2,
            }])
            .expect("layout");
        let vs = device
            .create_shader(Stage::Vertex, ShaderCode::FullscreenQuad)
            .expect("vs");
        let ps = device
            .create_shader(Stage::Pixel, ShaderCode::CompositeNormal)
            .expect("ps");
        let texture = device
            .create_texture_2d(TextureDesc {
                width: 8,
                height: 4,
                format: Format::RGBA8Unorm,
                usage: TextureUsage::RENDER_TARGET,
            })
            .expect("texture");
        let rtv = device.create_render_target_view(&texture).expect("rtv");
        context.set_primitive_topology(PrimitiveTopology::TriangleList);
        context.set_input_layout(Some(&layout));
        context.set_vertex_buffers(
            0,
            &[VertexBufferBinding {
                buffer: Some(vb),
                stride: QuadVertex::STRIDE,
                offset: 0,
            }],
        );
        context.set_shader(Stage::Vertex, Some(&vs), &[]);
        context.set_shader(Stage::Pixel, Some(&ps), &[]);
        context.set_render_targets(&[Some(rtv.clone())], None);
        context.set_viewports(&[Viewport::sized(8.0, 4.0)]);
        (context, rtv)
    }

    #[test]
    fn fullscreen_quad_shades_every_pixel_once() {
        let device = Device::new();
        let (mut context, _rtv) = quad_context(&device);
        context.draw(6, 0).expect("draw");
        assert_eq!(context.pixels_shaded(), 32);
        assert_eq!(context.draw_count(), 1);
    }

    #[test]
    fn scissor_limits_coverage() {
        let device = Device::new();
        let (mut context, _rtv) = quad_context(&device);
        let rs = device
            .create_rasterizer_state(RasterizerDesc { scissor_enable: true })
            .expect("rs");
        context.set_rasterizer_state(Some(&rs));
        context.set_scissor_rects(&[Rect::sized(2, 2)]);
        context.draw(6, 0).expect("draw");
        assert_eq!(context.pixels_shaded(), 4);
    }

    #[test]
    fn predicated_draw_is_skipped() {
        let device = Device::new();
        let (mut context, _rtv) = quad_context(&device);
        let predicate = device.create_predicate().expect("predicate");
        predicate.set_result(true);
        context.set_predication(Some(&predicate), true);
        context.draw(6, 0).expect("draw");
        assert_eq!(context.draw_count(), 0);
        assert_eq!(context.skipped_draw_count(), 1);
        context.set_predication(Some(&predicate), false);
        context.draw(6, 0).expect("draw");
        assert_eq!(context.draw_count(), 1);
    }

    #[test]
    fn draw_without_pixel_shader_fails() {
        let device = Device::new();
        let (mut context, _rtv) = quad_context(&device);
        context.set_shader(Stage::Pixel, None, &[]);
        assert_eq!(context.draw(6, 0), Err(Error::MissingBinding("pixel shader")));
    }

    #[test]
    fn reading_past_vertex_buffer_fails() {
        let device = Device::new();
        let (mut context, _rtv) = quad_context(&device);
        assert_eq!(
            context.draw(6, 3),
            Err(Error::VertexBufferTooSmall {
                required: 9,
                available: 6
            })
        );
    }

    #[test]
    fn map_requires_dynamic_buffer_and_honours_injected_failure() {
        let device = Device::new();
        let mut context = Context::new(&device);
        let fixed = device
            .create_buffer(BufferDesc::new(BufferKind::Constant, 16), None)
            .expect("buffer");
        assert_eq!(context.map_write_discard(&fixed).err(), Some(Error::NotMappable));
        let dynamic = device
            .create_buffer(
                BufferDesc::new(BufferKind::Constant, 16).with_usage(BufferUsage::Dynamic),
                Some(&[9; 16]),
            )
            .expect("buffer");
        {
            let mut mapped = context.map_write_discard(&dynamic).expect("map");
            assert!(mapped.iter().all(|b| *b == 0));
            mapped[0] = 7;
        }
        assert_eq!(dynamic.contents()[0], 7);
        context.fail_next_map();
        assert_eq!(context.map_write_discard(&dynamic).err(), Some(Error::MapFailed));
        assert!(context.map_write_discard(&dynamic).is_ok());
    }

    #[test]
    fn getters_acquire_references() {
        let device = Device::new();
        let mut context = Context::new(&device);
        let layout = device.create_input_layout(Vec::new()).expect("layout");
        context.set_input_layout(Some(&layout));
        assert_eq!(layout.ref_count(), 2);
        let queried = context.input_layout();
        assert_eq!(layout.ref_count(), 3);
        drop(queried);
        context.clear_state();
        assert_eq!(layout.ref_count(), 1);
    }
}
