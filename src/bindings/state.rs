// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Values that can be bound to the pipeline.
//!
//! These are the per-category payloads exchanged with a
//! [`StatefulContext`](crate::pipeline::StatefulContext).  Cloning one acquires every
//! handle it holds; dropping it releases them.

use crate::bindings::category::{
    CONSTANT_BUFFER_SLOT_COUNT, INPUT_RESOURCE_SLOT_COUNT, RENDER_TARGET_SLOT_COUNT,
    SAMPLER_SLOT_COUNT, STREAM_OUTPUT_SLOT_COUNT, Stage, UAV_SLOT_COUNT, VERTEX_INPUT_SLOT_COUNT,
};
use crate::bindings::handle::ResourceHandle;
use crate::imp;

/// Optional handle occupying one slot of a slot array.
pub type Slot<R> = Option<ResourceHandle<R>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveTopology {
    #[default]
    Undefined,
    PointList,
    LineList,
    LineStrip,
    TriangleList,
    TriangleStrip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IndexFormat {
    #[default]
    Unknown,
    R16Uint,
    R32Uint,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct IndexBufferBinding {
    pub buffer: Slot<imp::Buffer>,
    pub format: IndexFormat,
    pub offset: u32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct VertexBufferBinding {
    pub buffer: Slot<imp::Buffer>,
    pub stride: u32,
    pub offset: u32,
}

/// A shader together with the class instances it was bound with.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShaderBinding {
    pub shader: Slot<imp::Shader>,
    pub class_instances: Vec<ResourceHandle<imp::ClassInstance>>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StreamOutputBinding {
    pub buffer: Slot<imp::Buffer>,
    pub offset: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub top_left_x: f32,
    pub top_left_y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    /// A viewport covering `width`×`height` pixels at the origin with depth range 0..1.
    pub fn sized(width: f32, height: f32) -> Self {
        Viewport {
            top_left_x: 0.0,
            top_left_y: 0.0,
            width,
            height,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

/// A scissor rectangle.  `right` and `bottom` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub const fn sized(width: u32, height: u32) -> Self {
        Rect {
            left: 0,
            top: 0,
            right: width as i32,
            bottom: height as i32,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlendBinding {
    pub state: Slot<imp::BlendState>,
    pub blend_factor: [f32; 4],
    pub sample_mask: u32,
}

impl Default for BlendBinding {
    fn default() -> Self {
        BlendBinding {
            state: None,
            blend_factor: [1.0; 4],
            sample_mask: u32::MAX,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DepthStencilBinding {
    pub state: Slot<imp::DepthStencilState>,
    pub stencil_ref: u32,
}

/// Render targets and depth-stencil view of the output merger.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputTargets {
    pub render_targets: Vec<Slot<imp::RenderTargetView>>,
    pub depth_stencil: Slot<imp::DepthStencilView>,
}

impl Default for OutputTargets {
    fn default() -> Self {
        OutputTargets {
            render_targets: vec![None; RENDER_TARGET_SLOT_COUNT],
            depth_stencil: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PredicationBinding {
    pub predicate: Slot<imp::Predicate>,
    pub value: bool,
}

/// Everything bound to one programmable stage.
#[derive(Debug, Clone, PartialEq)]
pub struct StageBindings {
    pub shader: ShaderBinding,
    pub constant_buffers: Vec<Slot<imp::Buffer>>,
    pub shader_resources: Vec<Slot<imp::ShaderResourceView>>,
    pub samplers: Vec<Slot<imp::SamplerState>>,
}

impl Default for StageBindings {
    fn default() -> Self {
        StageBindings {
            shader: ShaderBinding::default(),
            constant_buffers: vec![None; CONSTANT_BUFFER_SLOT_COUNT],
            shader_resources: vec![None; INPUT_RESOURCE_SLOT_COUNT],
            samplers: vec![None; SAMPLER_SLOT_COUNT],
        }
    }
}

/// The complete binding state of a context.
///
/// A freshly created context starts from [`PipelineState::default`], the cleared state.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineState {
    pub primitive_topology: PrimitiveTopology,
    pub index_buffer: IndexBufferBinding,
    pub vertex_buffers: Vec<VertexBufferBinding>,
    pub input_layout: Slot<imp::InputLayout>,
    pub stages: [StageBindings; 6],
    pub stream_output: Vec<StreamOutputBinding>,
    pub rasterizer_state: Slot<imp::RasterizerState>,
    pub viewports: Vec<Viewport>,
    pub scissor_rects: Vec<Rect>,
    pub blend: BlendBinding,
    pub depth_stencil: DepthStencilBinding,
    pub output: OutputTargets,
    pub output_unordered_access_views: Vec<Slot<imp::UnorderedAccessView>>,
    pub compute_unordered_access_views: Vec<Slot<imp::UnorderedAccessView>>,
    pub predication: PredicationBinding,
}

impl Default for PipelineState {
    fn default() -> Self {
        PipelineState {
            primitive_topology: PrimitiveTopology::default(),
            index_buffer: IndexBufferBinding::default(),
            vertex_buffers: vec![VertexBufferBinding::default(); VERTEX_INPUT_SLOT_COUNT],
            input_layout: None,
            stages: std::array::from_fn(|_| StageBindings::default()),
            stream_output: vec![StreamOutputBinding::default(); STREAM_OUTPUT_SLOT_COUNT],
            rasterizer_state: None,
            viewports: Vec::new(),
            scissor_rects: Vec::new(),
            blend: BlendBinding::default(),
            depth_stencil: DepthStencilBinding::default(),
            output: OutputTargets::default(),
            output_unordered_access_views: vec![None; UAV_SLOT_COUNT],
            compute_unordered_access_views: vec![None; UAV_SLOT_COUNT],
            predication: PredicationBinding::default(),
        }
    }
}

impl PipelineState {
    pub fn stage(&self, stage: Stage) -> &StageBindings {
        &self.stages[stage.index()]
    }
    pub fn stage_mut(&mut self, stage: Stage) -> &mut StageBindings {
        &mut self.stages[stage.index()]
    }
}
