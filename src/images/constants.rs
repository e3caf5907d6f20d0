// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! GPU-facing data layouts.

use bytemuck::{Pod, Zeroable};

/// The constant block read by every pixel program.
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
#[repr(C)]
pub struct PixelConstants {
    pub color: [f32; 4],
    pub background_color: [f32; 4],
    /// Gaze point divided by the surface size.
    pub gaze_point: [f32; 2],
    /// Surface width over height.
    pub aspect_ratio: f32,
    pub size_squared: f32,
    pub trail: f32,
    pub decay: f32,
    pub padding: [f32; 2],
}

const _: () = assert!(std::mem::size_of::<PixelConstants>() == 64);

impl PixelConstants {
    pub const BYTE_SIZE: usize = std::mem::size_of::<PixelConstants>();

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    /// Reads a block from the start of `bytes`, or `None` if there are too few.
    pub fn read_from(bytes: &[u8]) -> Option<Self> {
        bytes
            .get(..Self::BYTE_SIZE)
            .map(bytemuck::pod_read_unaligned::<PixelConstants>)
    }
}

/// A clip-space position and its texture coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
#[repr(C)]
pub struct QuadVertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
}

impl QuadVertex {
    pub const STRIDE: u32 = std::mem::size_of::<QuadVertex>() as u32;
}

/// Two triangles covering the whole viewport.  `uv` (0,0) is the top-left corner.
pub const FULLSCREEN_QUAD: [QuadVertex; 6] = [
    QuadVertex { position: [-1.0, -1.0], uv: [0.0, 1.0] },
    QuadVertex { position: [-1.0, 1.0], uv: [0.0, 0.0] },
    QuadVertex { position: [1.0, -1.0], uv: [1.0, 1.0] },
    QuadVertex { position: [-1.0, 1.0], uv: [0.0, 0.0] },
    QuadVertex { position: [1.0, 1.0], uv: [1.0, 0.0] },
    QuadVertex { position: [1.0, -1.0], uv: [1.0, 1.0] },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_read_back_from_bytes() {
        let c = PixelConstants {
            gaze_point: [0.5, 0.25],
            aspect_ratio: 2.0,
            decay: 0.95,
            ..Default::default()
        };
        assert_eq!(PixelConstants::read_from(c.as_bytes()), Some(c));
        assert_eq!(PixelConstants::read_from(&[0u8; 16]), None);
    }

    #[test]
    fn field_offsets_match_block_layout() {
        let c = PixelConstants {
            aspect_ratio: 1.5,
            ..Default::default()
        };
        let bytes = c.as_bytes();
        assert_eq!(&bytes[40..44], &1.5f32.to_ne_bytes());
    }
}
