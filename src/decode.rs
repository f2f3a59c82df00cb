//! Surface level decoding.
use crate::{
    div_round_up, registry, tile::put_rgba_block, CompressionFormat, SurfaceError, BLOCK_HEIGHT,
    BLOCK_WIDTH,
};

struct DecodedLayout {
    tiles_x: usize,
    pixel_count: usize,
    encoded_len: usize,
}

fn validate(
    width: u32,
    height: u32,
    data: &[u8],
    block_size_in_bytes: usize,
) -> Result<DecodedLayout, SurfaceError> {
    if width == 0 || height == 0 {
        return Err(SurfaceError::InvalidDimensions { width, height });
    }

    let pixel_count = (width as usize)
        .checked_mul(height as usize)
        .and_then(|pixels| pixels.checked_mul(4))
        .ok_or(SurfaceError::PixelCountWouldOverflow { width, height })?;

    let tiles_x = div_round_up(width as usize, BLOCK_WIDTH);
    let tiles_y = div_round_up(height as usize, BLOCK_HEIGHT);
    let encoded_len = tiles_x
        .checked_mul(tiles_y)
        .and_then(|tiles| tiles.checked_mul(block_size_in_bytes))
        .ok_or(SurfaceError::PixelCountWouldOverflow { width, height })?;
    if data.len() < encoded_len {
        return Err(SurfaceError::NotEnoughData {
            expected: encoded_len,
            actual: data.len(),
        });
    }

    Ok(DecodedLayout {
        tiles_x,
        pixel_count,
        encoded_len,
    })
}

/// Decode a surface to `width * height` RGBA8 pixels.
///
/// Tiles past the surface edges are cropped. A corrupt block fails the whole
/// surface; use the per block functions in [crate::bcn] to apply a different
/// policy. BC6H decodes through [f16](half::f16) and saturates to `[0, 255]`.
pub fn rgba8_from_bcn(
    width: u32,
    height: u32,
    data: &[u8],
    format: CompressionFormat,
) -> Result<Vec<u8>, SurfaceError> {
    let entry = registry::entry(format);
    let layout = validate(width, height, data, entry.block_size_in_bytes)?;

    let mut rgba = vec![0u8; layout.pixel_count];
    for (block_index, block) in data[..layout.encoded_len]
        .chunks_exact(entry.block_size_in_bytes)
        .enumerate()
    {
        let decoded = (entry.decode)(block).map_err(|source| source.at(block_index))?;
        put_rgba_block(
            &mut rgba,
            decoded,
            (block_index % layout.tiles_x) * BLOCK_WIDTH,
            (block_index / layout.tiles_x) * BLOCK_HEIGHT,
            width as usize,
            height as usize,
        );
    }
    Ok(rgba)
}

/// Decode a surface to `width * height` RGBA pixels with `f32` components.
///
/// BC6H decodes directly without tone mapping. The LDR formats normalize
/// `[0, 255]` to `[0.0, 1.0]`.
pub fn rgbaf32_from_bcn(
    width: u32,
    height: u32,
    data: &[u8],
    format: CompressionFormat,
) -> Result<Vec<f32>, SurfaceError> {
    let entry = registry::entry(format);

    match entry.decode_f32 {
        Some(decode_f32) => {
            let layout = validate(width, height, data, entry.block_size_in_bytes)?;
            let mut rgba = vec![0f32; layout.pixel_count];
            for (block_index, block) in data[..layout.encoded_len]
                .chunks_exact(entry.block_size_in_bytes)
                .enumerate()
            {
                let decoded = decode_f32(block).map_err(|source| source.at(block_index))?;
                put_rgba_block(
                    &mut rgba,
                    decoded,
                    (block_index % layout.tiles_x) * BLOCK_WIDTH,
                    (block_index / layout.tiles_x) * BLOCK_HEIGHT,
                    width as usize,
                    height as usize,
                );
            }
            Ok(rgba)
        }
        None => Ok(rgba8_from_bcn(width, height, data, format)?
            .into_iter()
            .map(|value| value as f32 / 255.0)
            .collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{bcn_from_rgba8, Quality};

    #[test]
    fn bc1_solid_red_round_trips_exactly() {
        let rgba: Vec<u8> = [255u8, 0, 0, 255].repeat(4 * 4);
        let encoded = bcn_from_rgba8(4, 4, &rgba, CompressionFormat::Bc1, Quality::Fast).unwrap();
        assert_eq!(
            rgba,
            rgba8_from_bcn(4, 4, &encoded, CompressionFormat::Bc1).unwrap()
        );
    }

    #[test]
    fn non_multiple_of_four_crops_to_original_dimensions() {
        // Distinct colors past each 4 pixel boundary, flat within every tile,
        // so the clamped row and column must decode back to the edge values.
        let mut rgba = Vec::new();
        for y in 0..5u8 {
            for x in 0..5u8 {
                let r = if x < 4 { 50 } else { 200 };
                let g = if y < 4 { 60 } else { 220 };
                rgba.extend_from_slice(&[r, g, 0, 255]);
            }
        }
        let encoded = bcn_from_rgba8(5, 5, &rgba, CompressionFormat::Bc1, Quality::Fast).unwrap();
        assert_eq!(4 * 8, encoded.len());

        let decoded = rgba8_from_bcn(5, 5, &encoded, CompressionFormat::Bc1).unwrap();
        assert_eq!(5 * 5 * 4, decoded.len());
        for i in 0..5 {
            for (x, y) in [(i, 4), (4, i)] {
                let offset = (y * 5 + x) * 4;
                for c in 0..4 {
                    let expected = rgba[offset + c] as i32;
                    let actual = decoded[offset + c] as i32;
                    assert!(
                        (expected - actual).abs() <= 4,
                        "channel {c} at ({x}, {y}): {expected} vs {actual}"
                    );
                }
            }
        }
    }

    #[test]
    fn every_format_round_trips_within_tolerance() {
        let mut rgba = Vec::new();
        for i in 0..8 * 8 {
            let v = 100 + (i % 16) as u8;
            rgba.extend_from_slice(&[v, v, v, 255]);
        }
        for format in [
            CompressionFormat::Bc1,
            CompressionFormat::Bc2,
            CompressionFormat::Bc3,
            CompressionFormat::Bc6h,
            CompressionFormat::Bc7,
        ] {
            let encoded = bcn_from_rgba8(8, 8, &rgba, format, Quality::Normal).unwrap();
            let decoded = rgba8_from_bcn(8, 8, &encoded, format).unwrap();
            for (expected, actual) in rgba.iter().zip(&decoded) {
                assert!(
                    (*expected as i32 - *actual as i32).abs() <= 8,
                    "{format:?}: {expected} vs {actual}"
                );
            }
        }
    }

    #[test]
    fn corrupt_bc7_block_reports_its_index() {
        // A valid first block followed by the all zero corrupt encoding.
        let mut data = vec![0u8; 32];
        data[0] = 1;
        assert!(matches!(
            rgba8_from_bcn(8, 4, &data, CompressionFormat::Bc7),
            Err(SurfaceError::DecodeCorruption { block_index: 1, .. })
        ));
    }

    #[test]
    fn arbitrary_bytes_decode_for_formats_without_invalid_modes() {
        let data: Vec<u8> = (0..4 * 8).map(|i| (i * 37) as u8).collect();
        for format in [
            CompressionFormat::Bc1,
            CompressionFormat::Bc4,
        ] {
            let decoded = rgba8_from_bcn(4, 4, &data[..8], format).unwrap();
            assert_eq!(4 * 4 * 4, decoded.len());
        }
        for format in [
            CompressionFormat::Bc2,
            CompressionFormat::Bc3,
            CompressionFormat::Bc5,
        ] {
            let decoded = rgba8_from_bcn(4, 4, &data[..16], format).unwrap();
            assert_eq!(4 * 4 * 4, decoded.len());
        }
    }

    #[test]
    fn truncated_data_fails() {
        let data = vec![0u8; 8 * 3];
        assert!(matches!(
            rgba8_from_bcn(8, 8, &data, CompressionFormat::Bc1),
            Err(SurfaceError::NotEnoughData {
                expected: 32,
                actual: 24
            })
        ));
    }

    #[test]
    fn zero_dimensions_fail() {
        assert!(matches!(
            rgba8_from_bcn(0, 4, &[], CompressionFormat::Bc1),
            Err(SurfaceError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn bc6h_decodes_to_f32_without_tone_mapping() {
        let rgba = vec![255u8; 4 * 4 * 4];
        let encoded = bcn_from_rgba8(4, 4, &rgba, CompressionFormat::Bc6h, Quality::Fast).unwrap();
        let decoded = rgbaf32_from_bcn(4, 4, &encoded, CompressionFormat::Bc6h).unwrap();
        assert_eq!(vec![1.0f32; 4 * 4 * 4], decoded);
    }

    #[test]
    fn ldr_formats_normalize_to_f32() {
        let rgba: Vec<u8> = [255u8, 0, 0, 255].repeat(4 * 4);
        let encoded = bcn_from_rgba8(4, 4, &rgba, CompressionFormat::Bc1, Quality::Fast).unwrap();
        let decoded = rgbaf32_from_bcn(4, 4, &encoded, CompressionFormat::Bc1).unwrap();
        assert_eq!(&[1.0f32, 0.0, 0.0, 1.0], &decoded[..4]);
    }
}
