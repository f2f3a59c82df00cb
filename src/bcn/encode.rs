//! Encoding for the LDR formats BC1-BC5 and BC7.
//!
//! Endpoints come from the per channel bounding box of the 16 samples.
//! Palette indices minimize squared distance with ties going to the lower
//! index, so identical input always produces identical output.
use crate::{
    bcn::{interpolate, Bitwriter, Rgba8Block, PARTITIONS_2, WEIGHTS3, WEIGHTS4},
    Quality,
};

fn pixels_from_block(rgba: &Rgba8Block) -> [[u8; 4]; 16] {
    bytemuck::cast(*rgba)
}

fn pack565(rgb: [u8; 3]) -> u16 {
    let r = (rgb[0] as u16 * 31 + 127) / 255;
    let g = (rgb[1] as u16 * 63 + 127) / 255;
    let b = (rgb[2] as u16 * 31 + 127) / 255;
    (r << 11) | (g << 5) | b
}

// Matches the decoder's 565 expansion so palettes agree bit for bit.
fn expand565(c: u16) -> [u8; 3] {
    let r = (((c >> 11) & 0x1F) * 527 + 23) >> 6;
    let g = (((c >> 5) & 0x3F) * 259 + 33) >> 6;
    let b = ((c & 0x1F) * 527 + 23) >> 6;
    [r as u8, g as u8, b as u8]
}

fn four_color_palette(c0: u16, c1: u16) -> [[u8; 3]; 4] {
    let e0 = expand565(c0);
    let e1 = expand565(c1);
    let mut palette = [e0, e1, [0; 3], [0; 3]];
    for c in 0..3 {
        palette[2][c] = ((2 * e0[c] as u16 + e1[c] as u16 + 1) / 3) as u8;
        palette[3][c] = ((e0[c] as u16 + 2 * e1[c] as u16 + 1) / 3) as u8;
    }
    palette
}

fn rgb_distance(a: [u8; 3], b: [u8; 4]) -> u32 {
    (0..3)
        .map(|c| {
            let delta = a[c] as i32 - b[c] as i32;
            (delta * delta) as u32
        })
        .sum()
}

fn rgb_bounds(pixels: &[[u8; 4]; 16]) -> ([u8; 3], [u8; 3]) {
    let mut min = [255u8; 3];
    let mut max = [0u8; 3];
    for pixel in pixels {
        for c in 0..3 {
            min[c] = min[c].min(pixel[c]);
            max[c] = max[c].max(pixel[c]);
        }
    }
    (min, max)
}

// The shared color half of BC1, BC2, and BC3.
// The caller decides whether the three color mode is allowed.
fn color_block(pixels: &[[u8; 4]; 16], force_four_color: bool) -> [u8; 8] {
    let (min, max) = rgb_bounds(pixels);
    let mut c0 = pack565(max);
    let mut c1 = pack565(min);
    // Four color mode needs c0 > c1. The index assignment below runs
    // against the final palette, so swapping here needs no index fixup.
    if c0 < c1 && !force_four_color {
        core::mem::swap(&mut c0, &mut c1);
    }

    let mut block = [0u8; 8];
    block[0..2].copy_from_slice(&c0.to_le_bytes());
    block[2..4].copy_from_slice(&c1.to_le_bytes());

    // Equal endpoints decode as the three color mode where index 3 is
    // transparent black, so stay on index 0.
    if c0 == c1 && !force_four_color {
        return block;
    }

    let palette = four_color_palette(c0, c1);
    let mut indices = 0u32;
    for (k, pixel) in pixels.iter().enumerate() {
        let mut best = 0u32;
        let mut best_distance = u32::MAX;
        for (candidate, color) in palette.iter().enumerate() {
            let distance = rgb_distance(*color, *pixel);
            if distance < best_distance {
                best_distance = distance;
                best = candidate as u32;
            }
        }
        indices |= best << (2 * k);
    }
    block[4..8].copy_from_slice(&indices.to_le_bytes());
    block
}

// The interpolated single channel half of BC3, BC4, and BC5.
fn smooth_channel_block(values: [u8; 16]) -> [u8; 8] {
    let a0 = values.iter().fold(0u8, |acc, v| acc.max(*v));
    let a1 = values.iter().fold(255u8, |acc, v| acc.min(*v));

    let mut bits = a0 as u64 | (a1 as u64) << 8;

    if a0 > a1 {
        // The decoder's eight value palette for a0 > a1.
        let a0 = a0 as u32;
        let a1 = a1 as u32;
        let palette = [
            a0,
            a1,
            (6 * a0 + a1 + 1) / 7,
            (5 * a0 + 2 * a1 + 1) / 7,
            (4 * a0 + 3 * a1 + 1) / 7,
            (3 * a0 + 4 * a1 + 1) / 7,
            (2 * a0 + 5 * a1 + 1) / 7,
            (a0 + 6 * a1 + 1) / 7,
        ];
        for (k, value) in values.iter().enumerate() {
            let mut best = 0u64;
            let mut best_distance = u32::MAX;
            for (candidate, entry) in palette.iter().enumerate() {
                let distance = (*value as i32 - *entry as i32).unsigned_abs();
                if distance < best_distance {
                    best_distance = distance;
                    best = candidate as u64;
                }
            }
            bits |= best << (16 + 3 * k);
        }
    }

    bits.to_le_bytes()
}

fn channel_values(pixels: &[[u8; 4]; 16], channel: usize) -> [u8; 16] {
    let mut values = [0u8; 16];
    for (value, pixel) in values.iter_mut().zip(pixels) {
        *value = pixel[channel];
    }
    values
}

pub fn bc1_from_rgba8(rgba: &Rgba8Block) -> [u8; 8] {
    color_block(&pixels_from_block(rgba), false)
}

pub fn bc2_from_rgba8(rgba: &Rgba8Block) -> [u8; 16] {
    let pixels = pixels_from_block(rgba);

    let mut block = [0u8; 16];
    for y in 0..4 {
        let mut row = 0u16;
        for x in 0..4 {
            let nibble = (pixels[y * 4 + x][3] as u16 + 8) / 17;
            row |= nibble << (4 * x);
        }
        block[y * 2..y * 2 + 2].copy_from_slice(&row.to_le_bytes());
    }

    block[8..16].copy_from_slice(&color_block(&pixels, true));
    block
}

pub fn bc3_from_rgba8(rgba: &Rgba8Block) -> [u8; 16] {
    let pixels = pixels_from_block(rgba);

    let mut block = [0u8; 16];
    block[0..8].copy_from_slice(&smooth_channel_block(channel_values(&pixels, 3)));
    block[8..16].copy_from_slice(&color_block(&pixels, true));
    block
}

pub fn bc4_from_rgba8(rgba: &Rgba8Block) -> [u8; 8] {
    smooth_channel_block(channel_values(&pixels_from_block(rgba), 0))
}

pub fn bc5_from_rgba8(rgba: &Rgba8Block) -> [u8; 16] {
    let pixels = pixels_from_block(rgba);

    let mut block = [0u8; 16];
    block[0..8].copy_from_slice(&smooth_channel_block(channel_values(&pixels, 0)));
    block[8..16].copy_from_slice(&smooth_channel_block(channel_values(&pixels, 1)));
    block
}

// Pick the 7 bit endpoint and shared P-bit reconstructing closest to the
// target. Mode 6 reconstructs each channel as exactly (q << 1) | p.
fn quantize7(target: [u8; 4]) -> ([u8; 4], u8, u32) {
    let mut best = ([0u8; 4], 0u8, u32::MAX);
    for p in 0..2u8 {
        let mut q = [0u8; 4];
        let mut error = 0u32;
        for c in 0..4 {
            let t = target[c] as i32;
            let ideal = ((t - p as i32 + 1) >> 1).clamp(0, 127);
            q[c] = ideal as u8;
            let recon = (ideal << 1) | p as i32;
            error += ((t - recon) * (t - recon)) as u32;
        }
        if error < best.2 {
            best = (q, p, error);
        }
    }
    best
}

fn mode6_recon(q: [u8; 4], p: u8) -> [u8; 4] {
    let mut recon = [0u8; 4];
    for c in 0..4 {
        recon[c] = (q[c] << 1) | p;
    }
    recon
}

fn rgba_distance(a: [u8; 4], b: [u8; 4]) -> u64 {
    (0..4)
        .map(|c| {
            let delta = a[c] as i64 - b[c] as i64;
            (delta * delta) as u64
        })
        .sum()
}

// Mode 6: one subset, 7.7.7.7 endpoints with per endpoint P-bits
// and 4 bit indices.
fn bc7_mode6(pixels: &[[u8; 4]; 16]) -> ([u8; 16], u64) {
    let mut min = [255u8; 4];
    let mut max = [0u8; 4];
    for pixel in pixels {
        for c in 0..4 {
            min[c] = min[c].min(pixel[c]);
            max[c] = max[c].max(pixel[c]);
        }
    }

    let (mut q0, mut p0, _) = quantize7(min);
    let (mut q1, mut p1, _) = quantize7(max);

    let palette_entry = |q0: [u8; 4], p0: u8, q1: [u8; 4], p1: u8, index: usize| -> [u8; 4] {
        let e0 = mode6_recon(q0, p0);
        let e1 = mode6_recon(q1, p1);
        let mut entry = [0u8; 4];
        for c in 0..4 {
            entry[c] = interpolate(e0[c] as u64, e1[c] as u64, &WEIGHTS4, index) as u8;
        }
        entry
    };

    let mut indices = [0usize; 16];
    let mut error = 0u64;
    for (pixel, index) in pixels.iter().zip(&mut indices) {
        let mut best_distance = u64::MAX;
        for candidate in 0..16 {
            let distance = rgba_distance(palette_entry(q0, p0, q1, p1, candidate), *pixel);
            if distance < best_distance {
                best_distance = distance;
                *index = candidate;
            }
        }
        error += best_distance;
    }

    // The anchor index at pixel 0 drops its MSB.
    if indices[0] & 0x8 != 0 {
        core::mem::swap(&mut q0, &mut q1);
        core::mem::swap(&mut p0, &mut p1);
        for index in &mut indices {
            *index = 15 - *index;
        }
    }

    let mut writer = Bitwriter::new();
    writer.put_bits(0b100_0000, 7);
    for c in 0..4 {
        writer.put_bits(q0[c] as u128, 7);
        writer.put_bits(q1[c] as u128, 7);
    }
    writer.put_bits(p0 as u128, 1);
    writer.put_bits(p1 as u128, 1);
    writer.put_bits(indices[0] as u128, 3);
    for index in &indices[1..] {
        writer.put_bits(*index as u128, 4);
    }
    (writer.finish(), error)
}

// Mode 1 reconstructs 6 bit endpoints by appending the subset's shared
// P-bit and replicating the MSB into bit 0.
fn mode1_recon(q: u8, p: u8) -> u8 {
    let v7 = (q << 1) | p;
    (v7 << 1) | (v7 >> 6)
}

fn quantize6(target: u8, p: u8) -> u8 {
    let mut best = 0u8;
    let mut best_distance = u32::MAX;
    for q in 0..64u8 {
        let distance = (target as i32 - mode1_recon(q, p) as i32).unsigned_abs();
        if distance < best_distance {
            best_distance = distance;
            best = q;
        }
    }
    best
}

// Mode 1: two subsets, 6.6.6 endpoints with one P-bit per subset
// and 3 bit indices. Alpha always decodes as opaque.
fn bc7_mode1(pixels: &[[u8; 4]; 16], partition: usize) -> ([u8; 16], u64) {
    let shape = &PARTITIONS_2[partition];
    let subset_of = |k: usize| (shape[k / 4][k % 4] & 0x03) as usize;

    // Endpoints per subset: [subset][endpoint][channel].
    let mut endpoints = [[[0u8; 3]; 2]; 2];
    let mut pbits = [0u8; 2];
    for subset in 0..2 {
        let mut min = [255u8; 3];
        let mut max = [0u8; 3];
        for (k, pixel) in pixels.iter().enumerate() {
            if subset_of(k) == subset {
                for c in 0..3 {
                    min[c] = min[c].min(pixel[c]);
                    max[c] = max[c].max(pixel[c]);
                }
            }
        }

        let mut best_error = u32::MAX;
        for p in 0..2u8 {
            let low: [u8; 3] = [
                quantize6(min[0], p),
                quantize6(min[1], p),
                quantize6(min[2], p),
            ];
            let high: [u8; 3] = [
                quantize6(max[0], p),
                quantize6(max[1], p),
                quantize6(max[2], p),
            ];
            let mut error = 0u32;
            for c in 0..3 {
                let low_delta = min[c] as i32 - mode1_recon(low[c], p) as i32;
                let high_delta = max[c] as i32 - mode1_recon(high[c], p) as i32;
                error += (low_delta * low_delta + high_delta * high_delta) as u32;
            }
            if error < best_error {
                best_error = error;
                endpoints[subset] = [low, high];
                pbits[subset] = p;
            }
        }
    }

    let palette_entry = |subset: usize, index: usize| -> [u8; 4] {
        let p = pbits[subset];
        let mut entry = [0u8; 4];
        for c in 0..3 {
            entry[c] = interpolate(
                mode1_recon(endpoints[subset][0][c], p) as u64,
                mode1_recon(endpoints[subset][1][c], p) as u64,
                &WEIGHTS3,
                index,
            ) as u8;
        }
        entry[3] = 255;
        entry
    };

    let mut indices = [0usize; 16];
    let mut error = 0u64;
    for (k, pixel) in pixels.iter().enumerate() {
        let subset = subset_of(k);
        let mut best_distance = u64::MAX;
        for candidate in 0..8 {
            let distance = rgba_distance(palette_entry(subset, candidate), *pixel);
            if distance < best_distance {
                best_distance = distance;
                indices[k] = candidate;
            }
        }
        error += best_distance;
    }

    // Each subset's anchor index drops its MSB. The anchor for subset 0
    // is pixel 0 and the one for subset 1 is marked in the shape.
    for subset in 0..2 {
        let anchor = (0..16)
            .position(|k| shape[k / 4][k % 4] & 0x80 != 0 && subset_of(k) == subset)
            .unwrap_or(0);
        if indices[anchor] & 0x4 != 0 {
            endpoints[subset].swap(0, 1);
            for (k, index) in indices.iter_mut().enumerate() {
                if subset_of(k) == subset {
                    *index = 7 - *index;
                }
            }
        }
    }

    let mut writer = Bitwriter::new();
    writer.put_bits(0b10, 2);
    writer.put_bits(partition as u128, 6);
    for c in 0..3 {
        for subset in 0..2 {
            for endpoint in 0..2 {
                writer.put_bits(endpoints[subset][endpoint][c] as u128, 6);
            }
        }
    }
    writer.put_bits(pbits[0] as u128, 1);
    writer.put_bits(pbits[1] as u128, 1);
    for (k, index) in indices.iter().enumerate() {
        let bits = if shape[k / 4][k % 4] & 0x80 != 0 { 2 } else { 3 };
        writer.put_bits(*index as u128, bits);
    }
    (writer.finish(), error)
}

/// Encode one tile as BC7.
///
/// [Quality::Fast] only evaluates the single subset mode. Higher qualities
/// also search all 64 two subset shapes and keep the candidate with the
/// lowest total squared error.
pub fn bc7_from_rgba8(rgba: &Rgba8Block, quality: Quality) -> [u8; 16] {
    let pixels = pixels_from_block(rgba);

    match quality {
        Quality::Fast => bc7_mode6(&pixels).0,
        Quality::Normal | Quality::Slow => {
            let (mut best_block, mut best_error) = bc7_mode1(&pixels, 0);
            for partition in 1..64 {
                let (block, error) = bc7_mode1(&pixels, partition);
                if error < best_error {
                    best_block = block;
                    best_error = error;
                }
            }
            let (block, error) = bc7_mode6(&pixels);
            if error < best_error {
                block
            } else {
                best_block
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bcn::decode::{
        rgba8_from_bc1, rgba8_from_bc2, rgba8_from_bc3, rgba8_from_bc4, rgba8_from_bc5,
        rgba8_from_bc7,
    };

    fn assert_rgba_close(expected: &Rgba8Block, actual: &Rgba8Block, tolerance: i32) {
        for y in 0..4 {
            for x in 0..4 {
                for c in 0..4 {
                    let expected = expected[y][x][c] as i32;
                    let actual = actual[y][x][c] as i32;
                    assert!(
                        (expected - actual).abs() <= tolerance,
                        "channel {c} at ({x}, {y}): {expected} vs {actual}"
                    );
                }
            }
        }
    }

    #[test]
    fn bc1_solid_red_is_exact() {
        let rgba = [[[255u8, 0, 0, 255]; 4]; 4];
        let block = bc1_from_rgba8(&rgba);
        assert_eq!(rgba, rgba8_from_bc1(&block));
    }

    #[test]
    fn bc1_flat_tile_within_tolerance() {
        let rgba = [[[130u8, 61, 210, 255]; 4]; 4];
        let block = bc1_from_rgba8(&rgba);
        assert_rgba_close(&rgba, &rgba8_from_bc1(&block), 4);
    }

    #[test]
    fn bc1_two_color_tile_keeps_both_colors() {
        let mut rgba = [[[255u8, 255, 255, 255]; 4]; 4];
        for row in &mut rgba[2..] {
            *row = [[0, 0, 0, 255]; 4];
        }
        let block = bc1_from_rgba8(&rgba);
        assert_eq!(rgba, rgba8_from_bc1(&block));
    }

    #[test]
    fn bc2_alpha_multiples_of_17_are_exact() {
        let mut rgba = [[[0u8; 4]; 4]; 4];
        for y in 0..4 {
            for x in 0..4 {
                rgba[y][x] = [60, 60, 60, (y * 4 + x) as u8 * 17];
            }
        }
        let block = bc2_from_rgba8(&rgba);
        let decoded = rgba8_from_bc2(&block);
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(rgba[y][x][3], decoded[y][x][3]);
            }
        }
    }

    #[test]
    fn bc3_alpha_endpoints_are_exact() {
        let mut rgba = [[[90u8, 90, 90, 30]; 4]; 4];
        rgba[3][3][3] = 220;
        let block = bc3_from_rgba8(&rgba);
        let decoded = rgba8_from_bc3(&block);
        assert_eq!(30, decoded[0][0][3]);
        assert_eq!(220, decoded[3][3][3]);
    }

    #[test]
    fn bc3_alpha_gradient_within_tolerance() {
        let mut rgba = [[[0u8; 4]; 4]; 4];
        for y in 0..4 {
            for x in 0..4 {
                rgba[y][x] = [0, 0, 0, (y * 4 + x) as u8 * 16];
            }
        }
        let block = bc3_from_rgba8(&rgba);
        let decoded = rgba8_from_bc3(&block);
        for y in 0..4 {
            for x in 0..4 {
                let expected = rgba[y][x][3] as i32;
                let actual = decoded[y][x][3] as i32;
                assert!((expected - actual).abs() <= 20);
            }
        }
    }

    #[test]
    fn bc4_endpoint_values_are_exact() {
        let mut rgba = [[[25u8, 0, 0, 255]; 4]; 4];
        rgba[0][1][0] = 231;
        let block = bc4_from_rgba8(&rgba);
        let decoded = rgba8_from_bc4(&block);
        assert_eq!([25, 25, 25, 255], decoded[0][0]);
        assert_eq!([231, 231, 231, 255], decoded[0][1]);
    }

    #[test]
    fn bc5_channels_are_independent() {
        let rgba = [[[17u8, 240, 99, 12]; 4]; 4];
        let block = bc5_from_rgba8(&rgba);
        let decoded = rgba8_from_bc5(&block);
        assert_eq!([[[17, 240, 0, 255]; 4]; 4], decoded);
    }

    #[test]
    fn bc7_flat_tile_within_one() {
        for quality in [Quality::Fast, Quality::Normal, Quality::Slow] {
            let rgba = [[[128u8, 65, 203, 77]; 4]; 4];
            let block = bc7_from_rgba8(&rgba, quality);
            assert_rgba_close(&rgba, &rgba8_from_bc7(&block).unwrap(), 1);
        }
    }

    #[test]
    fn bc7_two_color_tile_round_trips() {
        let mut rgba = [[[250u8, 10, 10, 255]; 4]; 4];
        for row in &mut rgba[2..] {
            *row = [[10, 10, 250, 255]; 4];
        }
        let block = bc7_from_rgba8(&rgba, Quality::Normal);
        assert_rgba_close(&rgba, &rgba8_from_bc7(&block).unwrap(), 2);
    }

    #[test]
    fn bc7_is_deterministic() {
        let mut rgba = [[[0u8; 4]; 4]; 4];
        for y in 0..4 {
            for x in 0..4 {
                rgba[y][x] = [x as u8 * 80, y as u8 * 60, 200, 255];
            }
        }
        assert_eq!(
            bc7_from_rgba8(&rgba, Quality::Normal),
            bc7_from_rgba8(&rgba, Quality::Normal)
        );
    }

    #[test]
    fn encoded_blocks_always_decode() {
        let mut rgba = [[[0u8; 4]; 4]; 4];
        for y in 0..4 {
            for x in 0..4 {
                rgba[y][x] = [
                    (x * 67 + y * 13) as u8,
                    (x * 31) as u8,
                    (y * 59) as u8,
                    (x * y * 17) as u8,
                ];
            }
        }
        rgba8_from_bc1(&bc1_from_rgba8(&rgba));
        rgba8_from_bc2(&bc2_from_rgba8(&rgba));
        rgba8_from_bc3(&bc3_from_rgba8(&rgba));
        rgba8_from_bc4(&bc4_from_rgba8(&rgba));
        rgba8_from_bc5(&bc5_from_rgba8(&rgba));
        rgba8_from_bc7(&bc7_from_rgba8(&rgba, Quality::Normal)).unwrap();
    }
}
