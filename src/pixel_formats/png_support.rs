// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! PNG decoding and encoding for 8-bit RGBA images.

use crate::pixel_formats::Unorm4;
use png::{BitDepth, ColorType};
use std::io::{Cursor, Write};

#[derive(Debug, thiserror::Error)]
pub enum PngError {
    #[error("PNG decoding failed: {0}")]
    Decode(#[from] png::DecodingError),
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] png::EncodingError),
    #[error("expected 8-bit RGBA, found {color_type:?} at {bit_depth:?}")]
    UnsupportedLayout {
        color_type: ColorType,
        bit_depth: BitDepth,
    },
    #[error("pixel count {actual} does not match {width}x{height}")]
    SizeMismatch {
        width: u32,
        height: u32,
        actual: usize,
    },
}

/// A decoded 8-bit RGBA image, rows top to bottom.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RgbaImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Unorm4>,
}

pub(crate) fn decode_rgba8(bytes: &[u8]) -> Result<RgbaImage, PngError> {
    let decoder = png::Decoder::new(Cursor::new(bytes));
    let mut reader = decoder.read_info()?;
    let (color_type, bit_depth) = (reader.info().color_type, reader.info().bit_depth);
    if color_type != ColorType::Rgba || bit_depth != BitDepth::Eight {
        return Err(PngError::UnsupportedLayout {
            color_type,
            bit_depth,
        });
    }
    let (width, height) = (reader.info().width, reader.info().height);
    let mut buf = vec![0u8; width as usize * height as usize * 4];
    let info = reader.next_frame(&mut buf)?;
    buf.truncate(info.buffer_size());
    let pixels: Vec<Unorm4> = bytemuck::cast_slice(&buf).to_vec();
    if pixels.len() != width as usize * height as usize {
        return Err(PngError::SizeMismatch {
            width,
            height,
            actual: pixels.len(),
        });
    }
    Ok(RgbaImage {
        width,
        height,
        pixels,
    })
}

pub(crate) fn encode_rgba8<W: Write>(
    writer: W,
    width: u32,
    height: u32,
    pixels: &[Unorm4],
) -> Result<(), PngError> {
    if pixels.len() != width as usize * height as usize {
        return Err(PngError::SizeMismatch {
            width,
            height,
            actual: pixels.len(),
        });
    }
    let mut encoder = png::Encoder::new(writer, width, height);
    encoder.set_color(ColorType::Rgba);
    encoder.set_depth(BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(bytemuck::cast_slice(pixels))?;
    writer.finish()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_survives_encode_and_decode() {
        let pixels: Vec<Unorm4> = (0..16u8)
            .map(|i| Unorm4 { r: i, g: 255 - i, b: 7, a: i * 16 })
            .collect();
        let mut bytes = Vec::new();
        encode_rgba8(&mut bytes, 16, 1, &pixels).expect("encode");
        let decoded = decode_rgba8(&bytes).expect("decode");
        assert_eq!(decoded.width, 16);
        assert_eq!(decoded.height, 1);
        assert_eq!(decoded.pixels, pixels);
    }

    #[test]
    fn wrong_pixel_count_is_rejected() {
        let mut bytes = Vec::new();
        let err = encode_rgba8(&mut bytes, 4, 4, &[Unorm4::default()]).unwrap_err();
        assert!(matches!(err, PngError::SizeMismatch { actual: 1, .. }));
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(matches!(decode_rgba8(b"not a png"), Err(PngError::Decode(_))));
    }
}
