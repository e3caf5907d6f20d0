// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Captured pre-mutation binding values.

use crate::bindings::category::{
    BindingCategory, CONSTANT_BUFFER_SLOT_COUNT, INPUT_RESOURCE_SLOT_COUNT, SAMPLER_SLOT_COUNT,
    Stage, UAV_SLOT_COUNT, VERTEX_INPUT_SLOT_COUNT,
};
use crate::bindings::dirty_tracking::DirtySet;
use crate::bindings::state::{
    BlendBinding, DepthStencilBinding, IndexBufferBinding, OutputTargets, PredicationBinding,
    PrimitiveTopology, Rect, ShaderBinding, Slot, StreamOutputBinding, VertexBufferBinding,
    Viewport,
};
use crate::imp;
use crate::pipeline::StatefulContext;

/// The full value of one binding category.
///
/// Slot-array variants always span the category's whole slot range, so applying a value
/// replaces the category exactly.
#[derive(Debug, Clone, PartialEq)]
pub enum BindingValue {
    PrimitiveTopology(PrimitiveTopology),
    IndexBuffer(IndexBufferBinding),
    VertexBuffers(Vec<VertexBufferBinding>),
    InputLayout(Slot<imp::InputLayout>),
    Shader(Stage, ShaderBinding),
    ConstantBuffers(Stage, Vec<Slot<imp::Buffer>>),
    ShaderResources(Stage, Vec<Slot<imp::ShaderResourceView>>),
    Samplers(Stage, Vec<Slot<imp::SamplerState>>),
    StreamOutputTargets(Vec<StreamOutputBinding>),
    RasterizerState(Slot<imp::RasterizerState>),
    Viewports(Vec<Viewport>),
    ScissorRects(Vec<Rect>),
    BlendState(BlendBinding),
    DepthStencilState(DepthStencilBinding),
    RenderTargets(OutputTargets),
    RenderTargetsAndUnorderedAccessViews(OutputTargets, Vec<Slot<imp::UnorderedAccessView>>),
    ComputeUnorderedAccessViews(Vec<Slot<imp::UnorderedAccessView>>),
    Predication(PredicationBinding),
}

fn occupied<R>(slots: &[Slot<R>]) -> usize {
    slots.iter().filter(|s| s.is_some()).count()
}

impl BindingValue {
    pub fn category(&self) -> BindingCategory {
        match self {
            BindingValue::PrimitiveTopology(_) => BindingCategory::PrimitiveTopology,
            BindingValue::IndexBuffer(_) => BindingCategory::IndexBuffer,
            BindingValue::VertexBuffers(_) => BindingCategory::VertexBuffers,
            BindingValue::InputLayout(_) => BindingCategory::InputLayout,
            BindingValue::Shader(s, _) => BindingCategory::Shader(*s),
            BindingValue::ConstantBuffers(s, _) => BindingCategory::ConstantBuffers(*s),
            BindingValue::ShaderResources(s, _) => BindingCategory::ShaderResources(*s),
            BindingValue::Samplers(s, _) => BindingCategory::Samplers(*s),
            BindingValue::StreamOutputTargets(_) => BindingCategory::StreamOutputTargets,
            BindingValue::RasterizerState(_) => BindingCategory::RasterizerState,
            BindingValue::Viewports(_) => BindingCategory::Viewports,
            BindingValue::ScissorRects(_) => BindingCategory::ScissorRects,
            BindingValue::BlendState(_) => BindingCategory::BlendState,
            BindingValue::DepthStencilState(_) => BindingCategory::DepthStencilState,
            BindingValue::RenderTargets(_) => BindingCategory::RenderTargets,
            BindingValue::RenderTargetsAndUnorderedAccessViews(..) => {
                BindingCategory::RenderTargetsAndUnorderedAccessViews
            }
            BindingValue::ComputeUnorderedAccessViews(_) => {
                BindingCategory::ComputeUnorderedAccessViews
            }
            BindingValue::Predication(_) => BindingCategory::Predication,
        }
    }

    /// Queries the context's current value for `category`.
    ///
    /// The returned value owns one reference on every handle it contains.
    pub fn capture<C: StatefulContext + ?Sized>(context: &C, category: BindingCategory) -> Self {
        match category {
            BindingCategory::PrimitiveTopology => {
                BindingValue::PrimitiveTopology(context.primitive_topology())
            }
            BindingCategory::IndexBuffer => BindingValue::IndexBuffer(context.index_buffer()),
            BindingCategory::VertexBuffers => {
                BindingValue::VertexBuffers(context.vertex_buffers(0, VERTEX_INPUT_SLOT_COUNT))
            }
            BindingCategory::InputLayout => BindingValue::InputLayout(context.input_layout()),
            BindingCategory::Shader(s) => BindingValue::Shader(s, context.shader(s)),
            BindingCategory::ConstantBuffers(s) => BindingValue::ConstantBuffers(
                s,
                context.constant_buffers(s, 0, CONSTANT_BUFFER_SLOT_COUNT),
            ),
            BindingCategory::ShaderResources(s) => BindingValue::ShaderResources(
                s,
                context.shader_resources(s, 0, INPUT_RESOURCE_SLOT_COUNT),
            ),
            BindingCategory::Samplers(s) => {
                BindingValue::Samplers(s, context.samplers(s, 0, SAMPLER_SLOT_COUNT))
            }
            BindingCategory::StreamOutputTargets => {
                BindingValue::StreamOutputTargets(context.stream_output_targets())
            }
            BindingCategory::RasterizerState => {
                BindingValue::RasterizerState(context.rasterizer_state())
            }
            BindingCategory::Viewports => BindingValue::Viewports(context.viewports()),
            BindingCategory::ScissorRects => BindingValue::ScissorRects(context.scissor_rects()),
            BindingCategory::BlendState => BindingValue::BlendState(context.blend_state()),
            BindingCategory::DepthStencilState => {
                BindingValue::DepthStencilState(context.depth_stencil_state())
            }
            BindingCategory::RenderTargets => BindingValue::RenderTargets(context.render_targets()),
            BindingCategory::RenderTargetsAndUnorderedAccessViews => {
                let (targets, uavs) =
                    context.render_targets_and_unordered_access_views(0, UAV_SLOT_COUNT);
                BindingValue::RenderTargetsAndUnorderedAccessViews(targets, uavs)
            }
            BindingCategory::ComputeUnorderedAccessViews => BindingValue::ComputeUnorderedAccessViews(
                context.compute_unordered_access_views(0, UAV_SLOT_COUNT),
            ),
            BindingCategory::Predication => BindingValue::Predication(context.predication()),
        }
    }

    /// Binds this value over the category's full slot range.
    pub fn apply<C: StatefulContext + ?Sized>(&self, context: &mut C) {
        match self {
            BindingValue::PrimitiveTopology(t) => context.set_primitive_topology(*t),
            BindingValue::IndexBuffer(b) => {
                context.set_index_buffer(b.buffer.as_ref(), b.format, b.offset)
            }
            BindingValue::VertexBuffers(v) => context.set_vertex_buffers(0, v),
            BindingValue::InputLayout(l) => context.set_input_layout(l.as_ref()),
            BindingValue::Shader(s, b) => {
                context.set_shader(*s, b.shader.as_ref(), &b.class_instances)
            }
            BindingValue::ConstantBuffers(s, v) => context.set_constant_buffers(*s, 0, v),
            BindingValue::ShaderResources(s, v) => context.set_shader_resources(*s, 0, v),
            BindingValue::Samplers(s, v) => context.set_samplers(*s, 0, v),
            BindingValue::StreamOutputTargets(v) => context.set_stream_output_targets(v),
            BindingValue::RasterizerState(r) => context.set_rasterizer_state(r.as_ref()),
            BindingValue::Viewports(v) => context.set_viewports(v),
            BindingValue::ScissorRects(v) => context.set_scissor_rects(v),
            BindingValue::BlendState(b) => {
                context.set_blend_state(b.state.as_ref(), b.blend_factor, b.sample_mask)
            }
            BindingValue::DepthStencilState(d) => {
                context.set_depth_stencil_state(d.state.as_ref(), d.stencil_ref)
            }
            BindingValue::RenderTargets(t) => {
                context.set_render_targets(&t.render_targets, t.depth_stencil.as_ref())
            }
            BindingValue::RenderTargetsAndUnorderedAccessViews(t, uavs) => context
                .set_render_targets_and_unordered_access_views(
                    &t.render_targets,
                    t.depth_stencil.as_ref(),
                    0,
                    uavs,
                ),
            BindingValue::ComputeUnorderedAccessViews(v) => {
                context.set_compute_unordered_access_views(0, v)
            }
            BindingValue::Predication(p) => context.set_predication(p.predicate.as_ref(), p.value),
        }
    }

    /// Length of the captured slot array, or `None` for single-valued categories.
    pub fn slot_count(&self) -> Option<usize> {
        match self {
            BindingValue::PrimitiveTopology(_)
            | BindingValue::IndexBuffer(_)
            | BindingValue::InputLayout(_)
            | BindingValue::RasterizerState(_)
            | BindingValue::BlendState(_)
            | BindingValue::DepthStencilState(_)
            | BindingValue::Predication(_) => None,
            BindingValue::VertexBuffers(v) => Some(v.len()),
            BindingValue::Shader(_, b) => Some(b.class_instances.len()),
            BindingValue::ConstantBuffers(_, v) => Some(v.len()),
            BindingValue::ShaderResources(_, v) => Some(v.len()),
            BindingValue::Samplers(_, v) => Some(v.len()),
            BindingValue::StreamOutputTargets(v) => Some(v.len()),
            BindingValue::Viewports(v) => Some(v.len()),
            BindingValue::ScissorRects(v) => Some(v.len()),
            BindingValue::RenderTargets(t) => Some(t.render_targets.len()),
            BindingValue::RenderTargetsAndUnorderedAccessViews(t, uavs) => {
                Some(t.render_targets.len() + uavs.len())
            }
            BindingValue::ComputeUnorderedAccessViews(v) => Some(v.len()),
        }
    }

    /// Number of handles this value owns.
    pub fn handle_count(&self) -> usize {
        match self {
            BindingValue::PrimitiveTopology(_)
            | BindingValue::Viewports(_)
            | BindingValue::ScissorRects(_) => 0,
            BindingValue::IndexBuffer(b) => b.buffer.is_some() as usize,
            BindingValue::VertexBuffers(v) => v.iter().filter(|b| b.buffer.is_some()).count(),
            BindingValue::InputLayout(l) => l.is_some() as usize,
            BindingValue::Shader(_, b) => b.shader.is_some() as usize + b.class_instances.len(),
            BindingValue::ConstantBuffers(_, v) => occupied(v),
            BindingValue::ShaderResources(_, v) => occupied(v),
            BindingValue::Samplers(_, v) => occupied(v),
            BindingValue::StreamOutputTargets(v) => v.iter().filter(|b| b.buffer.is_some()).count(),
            BindingValue::RasterizerState(r) => r.is_some() as usize,
            BindingValue::BlendState(b) => b.state.is_some() as usize,
            BindingValue::DepthStencilState(d) => d.state.is_some() as usize,
            BindingValue::RenderTargets(t) => {
                occupied(&t.render_targets) + t.depth_stencil.is_some() as usize
            }
            BindingValue::RenderTargetsAndUnorderedAccessViews(t, uavs) => {
                occupied(&t.render_targets) + t.depth_stencil.is_some() as usize + occupied(uavs)
            }
            BindingValue::ComputeUnorderedAccessViews(v) => occupied(v),
            BindingValue::Predication(p) => p.predicate.is_some() as usize,
        }
    }
}

/// Captured values for the categories of one open transaction.
///
/// The first value recorded for a category wins; later records for the same category
/// are ignored.
#[derive(Debug)]
pub struct StateSnapshot {
    values: [Option<BindingValue>; BindingCategory::COUNT],
    dirty: DirtySet,
}

impl Default for StateSnapshot {
    fn default() -> Self {
        StateSnapshot {
            values: std::array::from_fn(|_| None),
            dirty: DirtySet::new(),
        }
    }
}

impl StateSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_captured(&self, category: BindingCategory) -> bool {
        self.dirty.contains(category)
    }

    /// Stores `value` unless its category was already captured.
    ///
    /// Returns whether the value was stored.  A rejected value is dropped, releasing its
    /// handles.
    pub fn record(&mut self, value: BindingValue) -> bool {
        let category = value.category();
        if !self.dirty.insert(category) {
            return false;
        }
        self.values[category.index()] = Some(value);
        true
    }

    pub fn get(&self, category: BindingCategory) -> Option<&BindingValue> {
        self.values[category.index()].as_ref()
    }

    pub fn dirty(&self) -> &DirtySet {
        &self.dirty
    }

    pub fn is_empty(&self) -> bool {
        self.dirty.is_empty()
    }

    /// Removes every captured value, in restore order, leaving the snapshot empty.
    pub fn drain_in_restore_order(&mut self) -> Vec<BindingValue> {
        let drained = self
            .dirty
            .iter()
            .filter_map(|category| self.values[category.index()].take())
            .collect();
        self.dirty.clear();
        drained
    }
}
