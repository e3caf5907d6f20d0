// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! The binding-style context abstraction.

use crate::bindings::category::Stage;
use crate::bindings::handle::ResourceHandle;
use crate::bindings::state::{
    BlendBinding, DepthStencilBinding, IndexBufferBinding, IndexFormat, OutputTargets,
    PredicationBinding, PrimitiveTopology, Rect, ShaderBinding, Slot, StreamOutputBinding,
    VertexBufferBinding, Viewport,
};
use crate::imp;

/// A stateful device context whose pipeline is configured by binding calls.
///
/// Every getter is an *owning query*: handles it returns have been acquired on the
/// caller's behalf.  Every setter takes borrowed handles and acquires whatever it keeps,
/// releasing whatever it displaces.
///
/// Slot-array getters take a start slot and count and return exactly `count` entries.
/// Slot-array setters bind `values.len()` slots starting at `start_slot` and leave the
/// other slots alone, except where noted: stream-output targets, viewports, scissor
/// rectangles and render targets replace the whole category.
pub trait StatefulContext {
    // input assembler
    fn primitive_topology(&self) -> PrimitiveTopology;
    fn set_primitive_topology(&mut self, topology: PrimitiveTopology);

    fn index_buffer(&self) -> IndexBufferBinding;
    fn set_index_buffer(
        &mut self,
        buffer: Option<&ResourceHandle<imp::Buffer>>,
        format: IndexFormat,
        offset: u32,
    );

    fn vertex_buffers(&self, start_slot: usize, count: usize) -> Vec<VertexBufferBinding>;
    fn set_vertex_buffers(&mut self, start_slot: usize, bindings: &[VertexBufferBinding]);

    fn input_layout(&self) -> Slot<imp::InputLayout>;
    fn set_input_layout(&mut self, layout: Option<&ResourceHandle<imp::InputLayout>>);

    // programmable stages
    fn shader(&self, stage: Stage) -> ShaderBinding;
    fn set_shader(
        &mut self,
        stage: Stage,
        shader: Option<&ResourceHandle<imp::Shader>>,
        class_instances: &[ResourceHandle<imp::ClassInstance>],
    );

    fn constant_buffers(&self, stage: Stage, start_slot: usize, count: usize) -> Vec<Slot<imp::Buffer>>;
    fn set_constant_buffers(&mut self, stage: Stage, start_slot: usize, buffers: &[Slot<imp::Buffer>]);

    fn shader_resources(
        &self,
        stage: Stage,
        start_slot: usize,
        count: usize,
    ) -> Vec<Slot<imp::ShaderResourceView>>;
    fn set_shader_resources(
        &mut self,
        stage: Stage,
        start_slot: usize,
        views: &[Slot<imp::ShaderResourceView>],
    );

    fn samplers(&self, stage: Stage, start_slot: usize, count: usize) -> Vec<Slot<imp::SamplerState>>;
    fn set_samplers(&mut self, stage: Stage, start_slot: usize, samplers: &[Slot<imp::SamplerState>]);

    // stream output and rasterizer
    fn stream_output_targets(&self) -> Vec<StreamOutputBinding>;
    /// Binds `targets` to the first slots and unbinds the rest.
    fn set_stream_output_targets(&mut self, targets: &[StreamOutputBinding]);

    fn rasterizer_state(&self) -> Slot<imp::RasterizerState>;
    fn set_rasterizer_state(&mut self, state: Option<&ResourceHandle<imp::RasterizerState>>);

    fn viewports(&self) -> Vec<Viewport>;
    fn set_viewports(&mut self, viewports: &[Viewport]);

    fn scissor_rects(&self) -> Vec<Rect>;
    fn set_scissor_rects(&mut self, rects: &[Rect]);

    // output merger
    fn blend_state(&self) -> BlendBinding;
    fn set_blend_state(
        &mut self,
        state: Option<&ResourceHandle<imp::BlendState>>,
        blend_factor: [f32; 4],
        sample_mask: u32,
    );

    fn depth_stencil_state(&self) -> DepthStencilBinding;
    fn set_depth_stencil_state(
        &mut self,
        state: Option<&ResourceHandle<imp::DepthStencilState>>,
        stencil_ref: u32,
    );

    fn render_targets(&self) -> OutputTargets;
    /// Binds `views` to the first render-target slots, unbinds the rest, and replaces the
    /// depth-stencil view.
    fn set_render_targets(
        &mut self,
        views: &[Slot<imp::RenderTargetView>],
        depth_stencil: Option<&ResourceHandle<imp::DepthStencilView>>,
    );

    fn render_targets_and_unordered_access_views(
        &self,
        uav_start_slot: usize,
        uav_count: usize,
    ) -> (OutputTargets, Vec<Slot<imp::UnorderedAccessView>>);
    fn set_render_targets_and_unordered_access_views(
        &mut self,
        views: &[Slot<imp::RenderTargetView>],
        depth_stencil: Option<&ResourceHandle<imp::DepthStencilView>>,
        uav_start_slot: usize,
        uavs: &[Slot<imp::UnorderedAccessView>],
    );

    // compute
    fn compute_unordered_access_views(
        &self,
        start_slot: usize,
        count: usize,
    ) -> Vec<Slot<imp::UnorderedAccessView>>;
    fn set_compute_unordered_access_views(
        &mut self,
        start_slot: usize,
        uavs: &[Slot<imp::UnorderedAccessView>],
    );

    // other
    fn predication(&self) -> PredicationBinding;
    fn set_predication(&mut self, predicate: Option<&ResourceHandle<imp::Predicate>>, value: bool);
}
