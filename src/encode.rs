//! Surface level encoding.
use crate::{
    buffer::OutputBuffer,
    registry::{self, FormatEntry},
    tile::Tiles,
    CompressionFormat, Quality, SurfaceError,
};

// One encode call: validated tiles in, one block per tile out.
// Dropped on the first error so a partial buffer is never observable.
struct EncodeSession<'a> {
    tiles: Tiles<'a>,
    entry: &'static FormatEntry,
    quality: Quality,
    buffer: OutputBuffer,
}

impl<'a> EncodeSession<'a> {
    fn new(
        width: u32,
        height: u32,
        rgba8: &'a [u8],
        entry: &'static FormatEntry,
        quality: Quality,
    ) -> Result<Self, SurfaceError> {
        let tiles = Tiles::new(width, height, rgba8)?;
        let buffer =
            OutputBuffer::for_blocks(tiles.tiles_x(), tiles.tiles_y(), entry.block_size_in_bytes)?;
        Ok(Self {
            tiles,
            entry,
            quality,
            buffer,
        })
    }

    fn run(mut self) -> Result<Vec<u8>, SurfaceError> {
        for tile in &mut self.tiles {
            let block = (self.entry.encode)(&tile, self.quality);
            self.buffer.append(block.as_bytes())?;
        }
        Ok(self.buffer.finish())
    }
}

/// Encode a `width` x `height` RGBA8 surface.
///
/// The result always has exactly
/// `ceil(width / 4) * ceil(height / 4) * block_size` bytes.
/// Surfaces with dimensions that aren't multiples of 4 are padded by
/// repeating edge pixels, so decoding returns the original dimensions.
pub fn bcn_from_rgba8(
    width: u32,
    height: u32,
    rgba8: &[u8],
    format: CompressionFormat,
    quality: Quality,
) -> Result<Vec<u8>, SurfaceError> {
    EncodeSession::new(width, height, rgba8, registry::entry(format), quality)?.run()
}

/// Encode using a raw DXGI format code, as read from a DDS container.
///
/// Unknown codes fail with [SurfaceError::UnsupportedFormat] before
/// validating or allocating anything.
pub fn bcn_from_rgba8_code(
    width: u32,
    height: u32,
    rgba8: &[u8],
    code: u32,
    quality: Quality,
) -> Result<Vec<u8>, SurfaceError> {
    let entry = registry::lookup(code)?;
    EncodeSession::new(width, height, rgba8, entry, quality)?.run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoded_size;

    #[test]
    fn encoded_lengths_are_exact() {
        for (width, height) in [(1, 1), (3, 5), (4, 4), (5, 5), (8, 2), (16, 16)] {
            let rgba = vec![255u8; (width * height * 4) as usize];
            for format in [
                CompressionFormat::Bc1,
                CompressionFormat::Bc2,
                CompressionFormat::Bc3,
                CompressionFormat::Bc4,
                CompressionFormat::Bc5,
                CompressionFormat::Bc6h,
                CompressionFormat::Bc7,
            ] {
                let encoded =
                    bcn_from_rgba8(width, height, &rgba, format, Quality::Fast).unwrap();
                assert_eq!(
                    encoded_size(width as usize, height as usize, format),
                    Some(encoded.len()),
                    "{format:?} at {width} x {height}"
                );
            }
        }
    }

    #[test]
    fn large_surface_fills_the_buffer_exactly() {
        // 65536 blocks, large enough to catch block count truncation.
        let rgba = vec![0u8; 1024 * 1024 * 4];
        let encoded =
            bcn_from_rgba8(1024, 1024, &rgba, CompressionFormat::Bc1, Quality::Fast).unwrap();
        assert_eq!(256 * 256 * 8, encoded.len());
    }

    #[test]
    fn quality_does_not_change_the_length() {
        let rgba: Vec<u8> = (0..16 * 16 * 4).map(|i| i as u8).collect();
        for quality in [Quality::Fast, Quality::Normal, Quality::Slow] {
            let encoded =
                bcn_from_rgba8(16, 16, &rgba, CompressionFormat::Bc7, quality).unwrap();
            assert_eq!(16 * 16, encoded.len());
        }
    }

    #[test]
    fn zero_dimensions_fail() {
        assert!(matches!(
            bcn_from_rgba8(0, 0, &[], CompressionFormat::Bc1, Quality::Fast),
            Err(SurfaceError::InvalidDimensions {
                width: 0,
                height: 0
            })
        ));
    }

    #[test]
    fn short_input_fails() {
        let rgba = vec![0u8; 4 * 4 * 4 - 4];
        assert!(matches!(
            bcn_from_rgba8(4, 4, &rgba, CompressionFormat::Bc3, Quality::Fast),
            Err(SurfaceError::NotEnoughData { .. })
        ));
    }

    #[test]
    fn encode_by_code_dispatches_like_the_enum() {
        let rgba = vec![128u8; 8 * 8 * 4];
        let by_format =
            bcn_from_rgba8(8, 8, &rgba, CompressionFormat::Bc7, Quality::Fast).unwrap();
        let by_code = bcn_from_rgba8_code(8, 8, &rgba, 98, Quality::Fast).unwrap();
        assert_eq!(by_format, by_code);
    }

    #[test]
    fn unknown_code_fails_before_validation() {
        // Invalid dimensions and data, but the unknown code wins.
        assert!(matches!(
            bcn_from_rgba8_code(0, 0, &[], 12345, Quality::Fast),
            Err(SurfaceError::UnsupportedFormat { code: 12345 })
        ));
    }
}
