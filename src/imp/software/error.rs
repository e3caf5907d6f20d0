// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use crate::bindings::category::Stage;
use crate::imp::resources::ObjectKind;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    #[error("creating {0:?} failed")]
    CreationFailed(ObjectKind),
    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("initial data of {provided} bytes exceeds buffer of {capacity} bytes")]
    InitialDataTooLarge { provided: usize, capacity: usize },
    #[error("{kind:?} cannot be created for a texture without that bind usage")]
    MissingBindUsage { kind: ObjectKind },
    #[error("shader program belongs to the {program:?} stage, not {requested:?}")]
    StageMismatch { program: Stage, requested: Stage },
    #[error("buffer is not CPU-writable")]
    NotMappable,
    #[error("mapping the buffer failed")]
    MapFailed,
    #[error("no {0} bound for draw")]
    MissingBinding(&'static str),
    #[error("draw requires a triangle list")]
    UnsupportedTopology,
    #[error("vertex buffer holds {available} vertices, draw needs {required}")]
    VertexBufferTooSmall { required: usize, available: usize },
    #[error("texture is bound both as input and as render target")]
    ReadWriteHazard,
    #[error("back buffer still referenced {outstanding} times outside the swap chain")]
    BackBufferInUse { outstanding: usize },
}
