// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Scoped pipeline-state mutation.

A [`PipelineStateTransaction`] borrows a [`StatefulContext`] mutably for the duration of a
draw routine.  Every setter first captures the category's current value (once per
transaction) and then forwards to the context.  When the transaction closes, every
captured category is put back, in [`RESTORE_ORDER`](crate::bindings::category::RESTORE_ORDER),
and the snapshot's handles are released.

```
use gaze_trail::{Context, Device};
use gaze_trail::bindings::state::{PrimitiveTopology, Viewport};
use gaze_trail::pipeline::{PipelineStateTransaction, StatefulContext};

let device = Device::new();
let mut context = Context::new(&device);
context.set_viewports(&[Viewport::sized(64.0, 64.0)]);
{
    let mut tx = PipelineStateTransaction::new(&mut context);
    tx.set_primitive_topology(PrimitiveTopology::TriangleList);
    tx.set_viewports(&[Viewport::sized(16.0, 16.0)]);
    // draw here
}
assert_eq!(context.primitive_topology(), PrimitiveTopology::Undefined);
assert_eq!(context.viewports(), vec![Viewport::sized(64.0, 64.0)]);
```
*/

use crate::bindings::category::{BindingCategory, Stage};
use crate::bindings::dirty_tracking::DirtySet;
use crate::bindings::handle::ResourceHandle;
use crate::bindings::snapshot::{BindingValue, StateSnapshot};
use crate::bindings::state::{
    IndexFormat, PrimitiveTopology, Rect, Slot, StreamOutputBinding, VertexBufferBinding,
    Viewport,
};
use crate::imp;
use crate::pipeline::StatefulContext;

/// Memoizing wrapper that restores every binding it touched when it closes.
///
/// Restoration runs from [`Drop`], so it happens on every exit path of the enclosing
/// scope.  [`restore`](Self::restore) can also be called early; it is idempotent.
pub struct PipelineStateTransaction<'ctx, C: StatefulContext + ?Sized> {
    context: &'ctx mut C,
    snapshot: StateSnapshot,
}

impl<'ctx, C: StatefulContext + ?Sized> PipelineStateTransaction<'ctx, C> {
    pub fn new(context: &'ctx mut C) -> Self {
        PipelineStateTransaction {
            context,
            snapshot: StateSnapshot::new(),
        }
    }

    /// Captures the current value of `category` unless this transaction already did.
    fn capture(&mut self, category: BindingCategory) {
        if self.snapshot.is_captured(category) {
            return;
        }
        let value = BindingValue::capture(&*self.context, category);
        logwise::trace_sync!(
            "capturing {category} ({handles} handles)",
            category = logwise::privacy::LogIt(&category),
            handles = value.handle_count()
        );
        self.snapshot.record(value);
    }

    /// Replaces a whole category with `value`.
    pub fn set_binding(&mut self, value: BindingValue) {
        self.capture(value.category());
        value.apply(&mut *self.context);
    }

    pub fn is_dirty(&self, category: BindingCategory) -> bool {
        self.snapshot.is_captured(category)
    }

    pub fn dirty(&self) -> &DirtySet {
        self.snapshot.dirty()
    }

    /// Read access to the wrapped context.
    pub fn context(&self) -> &C {
        self.context
    }

    /// Mutable access to the wrapped context for non-binding operations.
    ///
    /// Binding changes made through this reference bypass capture and are not restored.
    pub fn context_mut(&mut self) -> &mut C {
        self.context
    }

    /// Puts back every captured category and empties the snapshot.
    pub fn restore(&mut self) {
        if self.snapshot.is_empty() {
            return;
        }
        let values = self.snapshot.drain_in_restore_order();
        logwise::trace_sync!("restoring {count} categories", count = values.len());
        for value in values {
            value.apply(&mut *self.context);
            // `value` drops here, releasing the snapshot's references
        }
    }

    pub fn set_primitive_topology(&mut self, topology: PrimitiveTopology) {
        self.capture(BindingCategory::PrimitiveTopology);
        self.context.set_primitive_topology(topology);
    }

    pub fn set_index_buffer(
        &mut self,
        buffer: Option<&ResourceHandle<imp::Buffer>>,
        format: IndexFormat,
        offset: u32,
    ) {
        self.capture(BindingCategory::IndexBuffer);
        self.context.set_index_buffer(buffer, format, offset);
    }

    pub fn set_vertex_buffers(&mut self, start_slot: usize, bindings: &[VertexBufferBinding]) {
        self.capture(BindingCategory::VertexBuffers);
        self.context.set_vertex_buffers(start_slot, bindings);
    }

    pub fn set_input_layout(&mut self, layout: Option<&ResourceHandle<imp::InputLayout>>) {
        self.capture(BindingCategory::InputLayout);
        self.context.set_input_layout(layout);
    }

    pub fn set_shader(
        &mut self,
        stage: Stage,
        shader: Option<&ResourceHandle<imp::Shader>>,
        class_instances: &[ResourceHandle<imp::ClassInstance>],
    ) {
        debug_assert!(
            shader.is_none_or(|s| s.stage() == stage),
            "shader bound to the wrong stage"
        );
        self.capture(BindingCategory::Shader(stage));
        self.context.set_shader(stage, shader, class_instances);
    }

    pub fn set_constant_buffers(
        &mut self,
        stage: Stage,
        start_slot: usize,
        buffers: &[Slot<imp::Buffer>],
    ) {
        self.capture(BindingCategory::ConstantBuffers(stage));
        self.context.set_constant_buffers(stage, start_slot, buffers);
    }

    pub fn set_shader_resources(
        &mut self,
        stage: Stage,
        start_slot: usize,
        views: &[Slot<imp::ShaderResourceView>],
    ) {
        self.capture(BindingCategory::ShaderResources(stage));
        self.context.set_shader_resources(stage, start_slot, views);
    }

    pub fn set_samplers(
        &mut self,
        stage: Stage,
        start_slot: usize,
        samplers: &[Slot<imp::SamplerState>],
    ) {
        self.capture(BindingCategory::Samplers(stage));
        self.context.set_samplers(stage, start_slot, samplers);
    }

    pub fn set_stream_output_targets(&mut self, targets: &[StreamOutputBinding]) {
        self.capture(BindingCategory::StreamOutputTargets);
        self.context.set_stream_output_targets(targets);
    }

    pub fn set_rasterizer_state(&mut self, state: Option<&ResourceHandle<imp::RasterizerState>>) {
        self.capture(BindingCategory::RasterizerState);
        self.context.set_rasterizer_state(state);
    }

    pub fn set_viewports(&mut self, viewports: &[Viewport]) {
        self.capture(BindingCategory::Viewports);
        self.context.set_viewports(viewports);
    }

    pub fn set_scissor_rects(&mut self, rects: &[Rect]) {
        self.capture(BindingCategory::ScissorRects);
        self.context.set_scissor_rects(rects);
    }

    pub fn set_blend_state(
        &mut self,
        state: Option<&ResourceHandle<imp::BlendState>>,
        blend_factor: [f32; 4],
        sample_mask: u32,
    ) {
        self.capture(BindingCategory::BlendState);
        self.context.set_blend_state(state, blend_factor, sample_mask);
    }

    pub fn set_depth_stencil_state(
        &mut self,
        state: Option<&ResourceHandle<imp::DepthStencilState>>,
        stencil_ref: u32,
    ) {
        self.capture(BindingCategory::DepthStencilState);
        self.context.set_depth_stencil_state(state, stencil_ref);
    }

    pub fn set_render_targets(
        &mut self,
        views: &[Slot<imp::RenderTargetView>],
        depth_stencil: Option<&ResourceHandle<imp::DepthStencilView>>,
    ) {
        self.capture(BindingCategory::RenderTargets);
        self.context.set_render_targets(views, depth_stencil);
    }

    pub fn set_render_targets_and_unordered_access_views(
        &mut self,
        views: &[Slot<imp::RenderTargetView>],
        depth_stencil: Option<&ResourceHandle<imp::DepthStencilView>>,
        uav_start_slot: usize,
        uavs: &[Slot<imp::UnorderedAccessView>],
    ) {
        self.capture(BindingCategory::RenderTargetsAndUnorderedAccessViews);
        self.context
            .set_render_targets_and_unordered_access_views(views, depth_stencil, uav_start_slot, uavs);
    }

    pub fn set_compute_unordered_access_views(
        &mut self,
        start_slot: usize,
        uavs: &[Slot<imp::UnorderedAccessView>],
    ) {
        self.capture(BindingCategory::ComputeUnorderedAccessViews);
        self.context.set_compute_unordered_access_views(start_slot, uavs);
    }

    pub fn set_predication(&mut self, predicate: Option<&ResourceHandle<imp::Predicate>>, value: bool) {
        self.capture(BindingCategory::Predication);
        self.context.set_predication(predicate, value);
    }
}

impl<C: StatefulContext + ?Sized> Drop for PipelineStateTransaction<'_, C> {
    fn drop(&mut self) {
        self.restore();
    }
}

impl<C: StatefulContext + ?Sized> std::fmt::Debug for PipelineStateTransaction<'_, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineStateTransaction")
            .field("dirty", self.snapshot.dirty())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Device;
    use crate::imp::Context;
    use crate::imp::resources::{BufferDesc, BufferKind, ShaderCode};

    #[test]
    fn second_set_does_not_recapture() {
        let device = Device::new();
        let mut context = Context::new(&device);
        let first = device
            .create_rasterizer_state(Default::default())
            .expect("rasterizer");
        let second = device
            .create_rasterizer_state(Default::default())
            .expect("rasterizer");
        context.set_rasterizer_state(Some(&first));
        {
            let mut tx = PipelineStateTransaction::new(&mut context);
            tx.set_rasterizer_state(Some(&second));
            tx.set_rasterizer_state(None);
            assert_eq!(tx.dirty().len(), 1);
            match tx.snapshot.get(BindingCategory::RasterizerState) {
                Some(BindingValue::RasterizerState(Some(h))) => assert!(h.same_object(&first)),
                other => panic!("unexpected snapshot {other:?}"),
            }
        }
        assert!(context.rasterizer_state().is_some_and(|h| h.same_object(&first)));
    }

    #[test]
    fn restore_is_idempotent() {
        let device = Device::new();
        let mut context = Context::new(&device);
        let mut tx = PipelineStateTransaction::new(&mut context);
        tx.set_primitive_topology(PrimitiveTopology::TriangleList);
        tx.restore();
        assert!(tx.dirty().is_empty());
        tx.context_mut().set_primitive_topology(PrimitiveTopology::PointList);
        tx.restore();
        assert_eq!(tx.context().primitive_topology(), PrimitiveTopology::PointList);
    }

    #[test]
    fn partial_range_restores_whole_category() {
        let device = Device::new();
        let mut context = Context::new(&device);
        let desc = BufferDesc::new(BufferKind::Constant, 64);
        let a = device.create_buffer(desc.clone(), None).expect("buffer");
        let b = device.create_buffer(desc, None).expect("buffer");
        context.set_constant_buffers(Stage::Pixel, 3, &[Some(a.clone())]);
        {
            let mut tx = PipelineStateTransaction::new(&mut context);
            tx.set_constant_buffers(Stage::Pixel, 0, &[Some(b.clone()), None, None, None]);
            assert_eq!(a.ref_count(), 3);
        }
        let bound = context.constant_buffers(Stage::Pixel, 0, 4);
        assert!(bound[0].is_none());
        assert!(bound[3].as_ref().is_some_and(|h| h.same_object(&a)));
        assert_eq!(b.ref_count(), 1);
        drop(bound);
        assert_eq!(a.ref_count(), 2);
    }

    #[test]
    fn set_binding_replaces_category() {
        let device = Device::new();
        let mut context = Context::new(&device);
        let shader = device
            .create_shader(Stage::Vertex, ShaderCode::FullscreenQuad)
            .expect("shader");
        {
            let mut tx = PipelineStateTransaction::new(&mut context);
            tx.set_binding(BindingValue::Shader(
                Stage::Vertex,
                crate::bindings::state::ShaderBinding {
                    shader: Some(shader.clone()),
                    class_instances: Vec::new(),
                },
            ));
            assert!(tx.is_dirty(BindingCategory::Shader(Stage::Vertex)));
            assert!(tx.context().shader(Stage::Vertex).shader.is_some());
        }
        assert!(context.shader(Stage::Vertex).shader.is_none());
        assert_eq!(shader.ref_count(), 1);
    }
}
