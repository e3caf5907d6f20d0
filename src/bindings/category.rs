// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! The enumeration of mutable pipeline binding categories.
//!
//! A *binding category* is one named pipeline slot or slot array that a caller can
//! mutate through a [`StatefulContext`](crate::pipeline::StatefulContext), such as the
//! pixel stage's shader resources or the output merger's blend state.
//!
//! The order of [`RESTORE_ORDER`] is a contract.  Back-ends reject or mis-render state
//! changes issued out of pipeline order, so restoration always walks input assembly,
//! the pre-rasterization stages, the rasterizer, the pixel stage, the output merger,
//! the compute stage and finally predication.

use std::fmt::{Display, Formatter};

/// Vertex buffer slots in the input assembler.
pub const VERTEX_INPUT_SLOT_COUNT: usize = 32;
/// Constant buffer slots per programmable stage.
pub const CONSTANT_BUFFER_SLOT_COUNT: usize = 14;
/// Shader resource slots per programmable stage.
pub const INPUT_RESOURCE_SLOT_COUNT: usize = 128;
/// Sampler slots per programmable stage.
pub const SAMPLER_SLOT_COUNT: usize = 16;
/// Class instances that can accompany one shader binding.
pub const MAX_CLASS_INSTANCES: usize = 253;
/// Stream-output target slots.
pub const STREAM_OUTPUT_SLOT_COUNT: usize = 4;
/// Viewports, and independently scissor rectangles, per pipeline.
pub const VIEWPORT_AND_SCISSOR_COUNT: usize = 16;
/// Simultaneously bound render targets.
pub const RENDER_TARGET_SLOT_COUNT: usize = 8;
/// Unordered-access view slots.
pub const UAV_SLOT_COUNT: usize = 64;

/// A programmable pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Vertex,
    Hull,
    Domain,
    Geometry,
    Pixel,
    Compute,
}

impl Stage {
    /// All stages, in pipeline order.
    pub const ALL: [Stage; 6] = [
        Stage::Vertex,
        Stage::Hull,
        Stage::Domain,
        Stage::Geometry,
        Stage::Pixel,
        Stage::Compute,
    ];

    pub const fn index(self) -> usize {
        match self {
            Stage::Vertex => 0,
            Stage::Hull => 1,
            Stage::Domain => 2,
            Stage::Geometry => 3,
            Stage::Pixel => 4,
            Stage::Compute => 5,
        }
    }

    const fn prefix(self) -> &'static str {
        match self {
            Stage::Vertex => "VS",
            Stage::Hull => "HS",
            Stage::Domain => "DS",
            Stage::Geometry => "GS",
            Stage::Pixel => "PS",
            Stage::Compute => "CS",
        }
    }
}

/// How many slots a category spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotCardinality {
    /// One value.
    Scalar,
    /// A fixed-length slot array, always captured and restored in full.
    Fixed(usize),
    /// A variable-length array whose count is part of the captured value.
    Variable { max: usize },
}

/// One mutable pipeline binding category.
///
/// Per-stage categories carry their [`Stage`].  Compute unordered-access views are a
/// category of their own because only the compute stage exposes them; the graphics
/// pipeline binds its UAVs together with its render targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingCategory {
    PrimitiveTopology,
    IndexBuffer,
    VertexBuffers,
    InputLayout,
    Shader(Stage),
    ConstantBuffers(Stage),
    ShaderResources(Stage),
    Samplers(Stage),
    StreamOutputTargets,
    RasterizerState,
    Viewports,
    ScissorRects,
    BlendState,
    DepthStencilState,
    RenderTargets,
    RenderTargetsAndUnorderedAccessViews,
    ComputeUnorderedAccessViews,
    Predication,
}

impl BindingCategory {
    /// Number of distinct categories.
    pub const COUNT: usize = 38;

    /// Dense index in `0..COUNT`, suitable for table lookups.
    pub const fn index(self) -> usize {
        const fn stage_block(base: usize, stage: Stage) -> usize {
            base + stage.index()
        }
        match self {
            BindingCategory::PrimitiveTopology => 0,
            BindingCategory::IndexBuffer => 1,
            BindingCategory::VertexBuffers => 2,
            BindingCategory::InputLayout => 3,
            BindingCategory::Shader(s) => stage_block(4, s),
            BindingCategory::ConstantBuffers(s) => stage_block(10, s),
            BindingCategory::ShaderResources(s) => stage_block(16, s),
            BindingCategory::Samplers(s) => stage_block(22, s),
            BindingCategory::StreamOutputTargets => 28,
            BindingCategory::RasterizerState => 29,
            BindingCategory::Viewports => 30,
            BindingCategory::ScissorRects => 31,
            BindingCategory::BlendState => 32,
            BindingCategory::DepthStencilState => 33,
            BindingCategory::RenderTargets => 34,
            BindingCategory::RenderTargetsAndUnorderedAccessViews => 35,
            BindingCategory::ComputeUnorderedAccessViews => 36,
            BindingCategory::Predication => 37,
        }
    }

    pub const fn cardinality(self) -> SlotCardinality {
        match self {
            BindingCategory::PrimitiveTopology
            | BindingCategory::IndexBuffer
            | BindingCategory::InputLayout
            | BindingCategory::RasterizerState
            | BindingCategory::BlendState
            | BindingCategory::DepthStencilState
            | BindingCategory::Predication => SlotCardinality::Scalar,
            BindingCategory::VertexBuffers => SlotCardinality::Fixed(VERTEX_INPUT_SLOT_COUNT),
            BindingCategory::Shader(_) => SlotCardinality::Variable {
                max: MAX_CLASS_INSTANCES,
            },
            BindingCategory::ConstantBuffers(_) => {
                SlotCardinality::Fixed(CONSTANT_BUFFER_SLOT_COUNT)
            }
            BindingCategory::ShaderResources(_) => {
                SlotCardinality::Fixed(INPUT_RESOURCE_SLOT_COUNT)
            }
            BindingCategory::Samplers(_) => SlotCardinality::Fixed(SAMPLER_SLOT_COUNT),
            BindingCategory::StreamOutputTargets => {
                SlotCardinality::Fixed(STREAM_OUTPUT_SLOT_COUNT)
            }
            BindingCategory::Viewports | BindingCategory::ScissorRects => {
                SlotCardinality::Variable {
                    max: VIEWPORT_AND_SCISSOR_COUNT,
                }
            }
            BindingCategory::RenderTargets => SlotCardinality::Fixed(RENDER_TARGET_SLOT_COUNT),
            BindingCategory::RenderTargetsAndUnorderedAccessViews => {
                SlotCardinality::Fixed(RENDER_TARGET_SLOT_COUNT + UAV_SLOT_COUNT)
            }
            BindingCategory::ComputeUnorderedAccessViews => SlotCardinality::Fixed(UAV_SLOT_COUNT),
        }
    }
}

impl Display for BindingCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BindingCategory::PrimitiveTopology => write!(f, "IAPrimitiveTopology"),
            BindingCategory::IndexBuffer => write!(f, "IAIndexBuffer"),
            BindingCategory::VertexBuffers => write!(f, "IAVertexBuffers"),
            BindingCategory::InputLayout => write!(f, "IAInputLayout"),
            BindingCategory::Shader(s) => write!(f, "{}Shader", s.prefix()),
            BindingCategory::ConstantBuffers(s) => write!(f, "{}ConstantBuffers", s.prefix()),
            BindingCategory::ShaderResources(s) => write!(f, "{}ShaderResources", s.prefix()),
            BindingCategory::Samplers(s) => write!(f, "{}Samplers", s.prefix()),
            BindingCategory::StreamOutputTargets => write!(f, "SOTargets"),
            BindingCategory::RasterizerState => write!(f, "RSState"),
            BindingCategory::Viewports => write!(f, "RSViewports"),
            BindingCategory::ScissorRects => write!(f, "RSScissorRects"),
            BindingCategory::BlendState => write!(f, "OMBlendState"),
            BindingCategory::DepthStencilState => write!(f, "OMDepthStencilState"),
            BindingCategory::RenderTargets => write!(f, "OMRenderTargets"),
            BindingCategory::RenderTargetsAndUnorderedAccessViews => {
                write!(f, "OMRenderTargetsAndUnorderedAccessViews")
            }
            BindingCategory::ComputeUnorderedAccessViews => write!(f, "CSUnorderedAccessViews"),
            BindingCategory::Predication => write!(f, "Predication"),
        }
    }
}

const fn stage_categories(stage: Stage) -> [BindingCategory; 4] {
    [
        BindingCategory::Shader(stage),
        BindingCategory::ConstantBuffers(stage),
        BindingCategory::ShaderResources(stage),
        BindingCategory::Samplers(stage),
    ]
}

const VS: [BindingCategory; 4] = stage_categories(Stage::Vertex);
const HS: [BindingCategory; 4] = stage_categories(Stage::Hull);
const DS: [BindingCategory; 4] = stage_categories(Stage::Domain);
const GS: [BindingCategory; 4] = stage_categories(Stage::Geometry);
const PS: [BindingCategory; 4] = stage_categories(Stage::Pixel);
const CS: [BindingCategory; 4] = stage_categories(Stage::Compute);

/// The order in which a transaction restores dirty categories.
pub const RESTORE_ORDER: [BindingCategory; BindingCategory::COUNT] = [
    // input assembler
    BindingCategory::PrimitiveTopology,
    BindingCategory::IndexBuffer,
    BindingCategory::VertexBuffers,
    BindingCategory::InputLayout,
    // VS -> HS -> DS -> GS
    VS[0], VS[1], VS[2], VS[3],
    HS[0], HS[1], HS[2], HS[3],
    DS[0], DS[1], DS[2], DS[3],
    GS[0], GS[1], GS[2], GS[3],
    // stream output and rasterizer
    BindingCategory::StreamOutputTargets,
    BindingCategory::RasterizerState,
    BindingCategory::Viewports,
    BindingCategory::ScissorRects,
    PS[0], PS[1], PS[2], PS[3],
    // output merger
    BindingCategory::BlendState,
    BindingCategory::DepthStencilState,
    BindingCategory::RenderTargets,
    BindingCategory::RenderTargetsAndUnorderedAccessViews,
    // compute runs outside the graphics pipeline
    CS[0], CS[1], CS[2], CS[3],
    BindingCategory::ComputeUnorderedAccessViews,
    BindingCategory::Predication,
];
