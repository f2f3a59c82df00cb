//! BC6H unsigned HDR blocks.
//!
//! BC6H stores RGB endpoints as quantized half precision floats in one of
//! 14 modes. Decoding supports all of them. Encoding always emits the
//! single region mode with two raw 10 bit endpoints per channel, which every
//! conformant decoder accepts.
use half::f16;

use crate::{
    bcn::{interpolate, Bitstream, Bitwriter, RgbaF32Block, PARTITIONS_2, WEIGHTS3, WEIGHTS4},
    CompressionFormat, CorruptBlock, Rgba8Block,
};

// Endpoint precision and delta precision per channel for each mode.
const BITS_W: [i32; 14] = [10, 7, 11, 11, 11, 9, 8, 8, 8, 6, 10, 11, 12, 16];
const BITS_DR: [i32; 14] = [5, 6, 5, 4, 4, 5, 6, 5, 5, 6, 10, 9, 8, 4];
const BITS_DG: [i32; 14] = [5, 6, 4, 5, 4, 5, 5, 6, 5, 6, 10, 9, 8, 4];
const BITS_DB: [i32; 14] = [5, 6, 4, 4, 5, 5, 5, 5, 6, 6, 10, 9, 8, 4];

fn extend_sign(value: i32, bits: i32) -> i32 {
    if value & (1 << (bits - 1)) != 0 {
        value | !((1 << bits) - 1)
    } else {
        value
    }
}

// Deltas are stored relative to the first endpoint with wrapping arithmetic.
fn transform_inverse(delta: i32, base: i32, bits: i32) -> i32 {
    (delta + base) & ((1 << bits) - 1)
}

// Expand a quantized endpoint to the 17 bit interpolation space.
fn unquantize(value: i32, bits: i32) -> i32 {
    if bits >= 15 || value == 0 {
        value
    } else if value == (1 << bits) - 1 {
        0xFFFF
    } else {
        ((value << 16) + 0x8000) >> bits
    }
}

// Scale an interpolated value back down to half float bits.
fn finish_unquantize(value: u64) -> u16 {
    ((value * 31) >> 6) as u16
}

/// Decode one block to `f32` RGB pixels with an opaque alpha.
pub fn rgbaf32_from_bc6h(block: &[u8; 16]) -> Result<RgbaF32Block, CorruptBlock> {
    let mut bstream = Bitstream::new(block);

    // One region uses endpoints 0 and 1, two regions add 2 and 3.
    let mut r = [0i32; 4];
    let mut g = [0i32; 4];
    let mut b = [0i32; 4];
    let mut partition = 0;

    let mut raw_mode = bstream.read_bits(2);
    if raw_mode > 1 {
        raw_mode |= bstream.read_bits(3) << 2;
    }

    let mode = match raw_mode {
        // Two region modes.
        0b00 => {
            // 10.555 with delta transform
            g[2] |= (bstream.read_bit() << 4) as i32;
            b[2] |= (bstream.read_bit() << 4) as i32;
            b[3] |= (bstream.read_bit() << 4) as i32;
            r[0] |= bstream.read_bits(10) as i32;
            g[0] |= bstream.read_bits(10) as i32;
            b[0] |= bstream.read_bits(10) as i32;
            r[1] |= bstream.read_bits(5) as i32;
            g[3] |= (bstream.read_bit() << 4) as i32;
            g[2] |= bstream.read_bits(4) as i32;
            g[1] |= bstream.read_bits(5) as i32;
            b[3] |= bstream.read_bit() as i32;
            g[3] |= bstream.read_bits(4) as i32;
            b[1] |= bstream.read_bits(5) as i32;
            b[3] |= (bstream.read_bit() << 1) as i32;
            b[2] |= bstream.read_bits(4) as i32;
            r[2] |= bstream.read_bits(5) as i32;
            b[3] |= (bstream.read_bit() << 2) as i32;
            r[3] |= bstream.read_bits(5) as i32;
            b[3] |= (bstream.read_bit() << 3) as i32;
            partition = bstream.read_bits(5) as usize;
            0
        }
        0b01 => {
            // 7.666 with delta transform
            g[2] |= (bstream.read_bit() << 5) as i32;
            g[3] |= (bstream.read_bit() << 4) as i32;
            g[3] |= (bstream.read_bit() << 5) as i32;
            r[0] |= bstream.read_bits(7) as i32;
            b[3] |= bstream.read_bit() as i32;
            b[3] |= (bstream.read_bit() << 1) as i32;
            b[2] |= (bstream.read_bit() << 4) as i32;
            g[0] |= bstream.read_bits(7) as i32;
            b[2] |= (bstream.read_bit() << 5) as i32;
            b[3] |= (bstream.read_bit() << 2) as i32;
            g[2] |= (bstream.read_bit() << 4) as i32;
            b[0] |= bstream.read_bits(7) as i32;
            b[3] |= (bstream.read_bit() << 3) as i32;
            b[3] |= (bstream.read_bit() << 5) as i32;
            b[3] |= (bstream.read_bit() << 4) as i32;
            r[1] |= bstream.read_bits(6) as i32;
            g[2] |= bstream.read_bits(4) as i32;
            g[1] |= bstream.read_bits(6) as i32;
            g[3] |= bstream.read_bits(4) as i32;
            b[1] |= bstream.read_bits(6) as i32;
            b[2] |= bstream.read_bits(4) as i32;
            r[2] |= bstream.read_bits(6) as i32;
            r[3] |= bstream.read_bits(6) as i32;
            partition = bstream.read_bits(5) as usize;
            1
        }
        0b00010 => {
            // 11.544
            r[0] |= bstream.read_bits(10) as i32;
            g[0] |= bstream.read_bits(10) as i32;
            b[0] |= bstream.read_bits(10) as i32;
            r[1] |= bstream.read_bits(5) as i32;
            r[0] |= (bstream.read_bit() << 10) as i32;
            g[2] |= bstream.read_bits(4) as i32;
            g[1] |= bstream.read_bits(4) as i32;
            g[0] |= (bstream.read_bit() << 10) as i32;
            b[3] |= bstream.read_bit() as i32;
            g[3] |= bstream.read_bits(4) as i32;
            b[1] |= bstream.read_bits(4) as i32;
            b[0] |= (bstream.read_bit() << 10) as i32;
            b[3] |= (bstream.read_bit() << 1) as i32;
            b[2] |= bstream.read_bits(4) as i32;
            r[2] |= bstream.read_bits(5) as i32;
            b[3] |= (bstream.read_bit() << 2) as i32;
            r[3] |= bstream.read_bits(5) as i32;
            b[3] |= (bstream.read_bit() << 3) as i32;
            partition = bstream.read_bits(5) as usize;
            2
        }
        0b00110 => {
            // 11.454
            r[0] |= bstream.read_bits(10) as i32;
            g[0] |= bstream.read_bits(10) as i32;
            b[0] |= bstream.read_bits(10) as i32;
            r[1] |= bstream.read_bits(4) as i32;
            r[0] |= (bstream.read_bit() << 10) as i32;
            g[3] |= (bstream.read_bit() << 4) as i32;
            g[2] |= bstream.read_bits(4) as i32;
            g[1] |= bstream.read_bits(5) as i32;
            g[0] |= (bstream.read_bit() << 10) as i32;
            g[3] |= bstream.read_bits(4) as i32;
            b[1] |= bstream.read_bits(4) as i32;
            b[0] |= (bstream.read_bit() << 10) as i32;
            b[3] |= (bstream.read_bit() << 1) as i32;
            b[2] |= bstream.read_bits(4) as i32;
            r[2] |= bstream.read_bits(4) as i32;
            b[3] |= bstream.read_bit() as i32;
            b[3] |= (bstream.read_bit() << 2) as i32;
            r[3] |= bstream.read_bits(4) as i32;
            g[2] |= (bstream.read_bit() << 4) as i32;
            b[3] |= (bstream.read_bit() << 3) as i32;
            partition = bstream.read_bits(5) as usize;
            3
        }
        0b01010 => {
            // 11.445
            r[0] |= bstream.read_bits(10) as i32;
            g[0] |= bstream.read_bits(10) as i32;
            b[0] |= bstream.read_bits(10) as i32;
            r[1] |= bstream.read_bits(4) as i32;
            r[0] |= (bstream.read_bit() << 10) as i32;
            b[2] |= (bstream.read_bit() << 4) as i32;
            g[2] |= bstream.read_bits(4) as i32;
            g[1] |= bstream.read_bits(4) as i32;
            g[0] |= (bstream.read_bit() << 10) as i32;
            b[3] |= bstream.read_bit() as i32;
            g[3] |= bstream.read_bits(4) as i32;
            b[1] |= bstream.read_bits(5) as i32;
            b[0] |= (bstream.read_bit() << 10) as i32;
            b[2] |= bstream.read_bits(4) as i32;
            r[2] |= bstream.read_bits(4) as i32;
            b[3] |= (bstream.read_bit() << 1) as i32;
            b[3] |= (bstream.read_bit() << 2) as i32;
            r[3] |= bstream.read_bits(4) as i32;
            b[3] |= (bstream.read_bit() << 4) as i32;
            b[3] |= (bstream.read_bit() << 3) as i32;
            partition = bstream.read_bits(5) as usize;
            4
        }
        0b01110 => {
            // 9.555
            r[0] |= bstream.read_bits(9) as i32;
            b[2] |= (bstream.read_bit() << 4) as i32;
            g[0] |= bstream.read_bits(9) as i32;
            g[2] |= (bstream.read_bit() << 4) as i32;
            b[0] |= bstream.read_bits(9) as i32;
            b[3] |= (bstream.read_bit() << 4) as i32;
            r[1] |= bstream.read_bits(5) as i32;
            g[3] |= (bstream.read_bit() << 4) as i32;
            g[2] |= bstream.read_bits(4) as i32;
            g[1] |= bstream.read_bits(5) as i32;
            b[3] |= bstream.read_bit() as i32;
            g[3] |= bstream.read_bits(4) as i32;
            b[1] |= bstream.read_bits(5) as i32;
            b[3] |= (bstream.read_bit() << 1) as i32;
            b[2] |= bstream.read_bits(4) as i32;
            r[2] |= bstream.read_bits(5) as i32;
            b[3] |= (bstream.read_bit() << 2) as i32;
            r[3] |= bstream.read_bits(5) as i32;
            b[3] |= (bstream.read_bit() << 3) as i32;
            partition = bstream.read_bits(5) as usize;
            5
        }
        0b10010 => {
            // 8.655
            r[0] |= bstream.read_bits(8) as i32;
            g[3] |= (bstream.read_bit() << 4) as i32;
            b[2] |= (bstream.read_bit() << 4) as i32;
            g[0] |= bstream.read_bits(8) as i32;
            b[3] |= (bstream.read_bit() << 2) as i32;
            g[2] |= (bstream.read_bit() << 4) as i32;
            b[0] |= bstream.read_bits(8) as i32;
            b[3] |= (bstream.read_bit() << 3) as i32;
            b[3] |= (bstream.read_bit() << 4) as i32;
            r[1] |= bstream.read_bits(6) as i32;
            g[2] |= bstream.read_bits(4) as i32;
            g[1] |= bstream.read_bits(5) as i32;
            b[3] |= bstream.read_bit() as i32;
            g[3] |= bstream.read_bits(4) as i32;
            b[1] |= bstream.read_bits(5) as i32;
            b[3] |= (bstream.read_bit() << 1) as i32;
            b[2] |= bstream.read_bits(4) as i32;
            r[2] |= bstream.read_bits(6) as i32;
            r[3] |= bstream.read_bits(6) as i32;
            partition = bstream.read_bits(5) as usize;
            6
        }
        0b10110 => {
            // 8.565
            r[0] |= bstream.read_bits(8) as i32;
            b[3] |= bstream.read_bit() as i32;
            b[2] |= (bstream.read_bit() << 4) as i32;
            g[0] |= bstream.read_bits(8) as i32;
            g[2] |= (bstream.read_bit() << 5) as i32;
            g[2] |= (bstream.read_bit() << 4) as i32;
            b[0] |= bstream.read_bits(8) as i32;
            g[3] |= (bstream.read_bit() << 5) as i32;
            b[3] |= (bstream.read_bit() << 4) as i32;
            r[1] |= bstream.read_bits(5) as i32;
            g[3] |= (bstream.read_bit() << 4) as i32;
            g[2] |= bstream.read_bits(4) as i32;
            g[1] |= bstream.read_bits(6) as i32;
            g[3] |= bstream.read_bits(4) as i32;
            b[1] |= bstream.read_bits(5) as i32;
            b[3] |= (bstream.read_bit() << 1) as i32;
            b[2] |= bstream.read_bits(4) as i32;
            r[2] |= bstream.read_bits(5) as i32;
            b[3] |= (bstream.read_bit() << 2) as i32;
            r[3] |= bstream.read_bits(5) as i32;
            b[3] |= (bstream.read_bit() << 3) as i32;
            partition = bstream.read_bits(5) as usize;
            7
        }
        0b11010 => {
            // 8.556
            r[0] |= bstream.read_bits(8) as i32;
            b[3] |= (bstream.read_bit() << 1) as i32;
            b[2] |= (bstream.read_bit() << 4) as i32;
            g[0] |= bstream.read_bits(8) as i32;
            b[2] |= (bstream.read_bit() << 5) as i32;
            g[2] |= (bstream.read_bit() << 4) as i32;
            b[0] |= bstream.read_bits(8) as i32;
            b[3] |= (bstream.read_bit() << 5) as i32;
            b[3] |= (bstream.read_bit() << 4) as i32;
            r[1] |= bstream.read_bits(5) as i32;
            g[3] |= (bstream.read_bit() << 4) as i32;
            g[2] |= bstream.read_bits(4) as i32;
            g[1] |= bstream.read_bits(5) as i32;
            b[3] |= bstream.read_bit() as i32;
            g[3] |= bstream.read_bits(4) as i32;
            b[1] |= bstream.read_bits(6) as i32;
            b[2] |= bstream.read_bits(4) as i32;
            r[2] |= bstream.read_bits(5) as i32;
            b[3] |= (bstream.read_bit() << 2) as i32;
            r[3] |= bstream.read_bits(5) as i32;
            b[3] |= (bstream.read_bit() << 3) as i32;
            partition = bstream.read_bits(5) as usize;
            8
        }
        0b11110 => {
            // 6.666 with raw endpoints
            r[0] |= bstream.read_bits(6) as i32;
            g[3] |= (bstream.read_bit() << 4) as i32;
            b[3] |= bstream.read_bit() as i32;
            b[3] |= (bstream.read_bit() << 1) as i32;
            b[2] |= (bstream.read_bit() << 4) as i32;
            g[0] |= bstream.read_bits(6) as i32;
            g[2] |= (bstream.read_bit() << 5) as i32;
            b[2] |= (bstream.read_bit() << 5) as i32;
            b[3] |= (bstream.read_bit() << 2) as i32;
            g[2] |= (bstream.read_bit() << 4) as i32;
            b[0] |= bstream.read_bits(6) as i32;
            g[3] |= (bstream.read_bit() << 5) as i32;
            b[3] |= (bstream.read_bit() << 3) as i32;
            b[3] |= (bstream.read_bit() << 5) as i32;
            b[3] |= (bstream.read_bit() << 4) as i32;
            r[1] |= bstream.read_bits(6) as i32;
            g[2] |= bstream.read_bits(4) as i32;
            g[1] |= bstream.read_bits(6) as i32;
            g[3] |= bstream.read_bits(4) as i32;
            b[1] |= bstream.read_bits(6) as i32;
            b[2] |= bstream.read_bits(4) as i32;
            r[2] |= bstream.read_bits(6) as i32;
            r[3] |= bstream.read_bits(6) as i32;
            partition = bstream.read_bits(5) as usize;
            9
        }
        // One region modes.
        0b00011 => {
            // 10.10 with raw endpoints
            r[0] |= bstream.read_bits(10) as i32;
            g[0] |= bstream.read_bits(10) as i32;
            b[0] |= bstream.read_bits(10) as i32;
            r[1] |= bstream.read_bits(10) as i32;
            g[1] |= bstream.read_bits(10) as i32;
            b[1] |= bstream.read_bits(10) as i32;
            10
        }
        0b00111 => {
            // 11.9
            r[0] |= bstream.read_bits(10) as i32;
            g[0] |= bstream.read_bits(10) as i32;
            b[0] |= bstream.read_bits(10) as i32;
            r[1] |= bstream.read_bits(9) as i32;
            r[0] |= (bstream.read_bit() << 10) as i32;
            g[1] |= bstream.read_bits(9) as i32;
            g[0] |= (bstream.read_bit() << 10) as i32;
            b[1] |= bstream.read_bits(9) as i32;
            b[0] |= (bstream.read_bit() << 10) as i32;
            11
        }
        0b01011 => {
            // 12.8 with the base's high bits stored MSB first
            r[0] |= bstream.read_bits(10) as i32;
            g[0] |= bstream.read_bits(10) as i32;
            b[0] |= bstream.read_bits(10) as i32;
            r[1] |= bstream.read_bits(8) as i32;
            r[0] |= (bstream.read_bits_r(2) << 10) as i32;
            g[1] |= bstream.read_bits(8) as i32;
            g[0] |= (bstream.read_bits_r(2) << 10) as i32;
            b[1] |= bstream.read_bits(8) as i32;
            b[0] |= (bstream.read_bits_r(2) << 10) as i32;
            12
        }
        0b01111 => {
            // 16.4 with the base's high bits stored MSB first
            r[0] |= bstream.read_bits(10) as i32;
            g[0] |= bstream.read_bits(10) as i32;
            b[0] |= bstream.read_bits(10) as i32;
            r[1] |= bstream.read_bits(4) as i32;
            r[0] |= (bstream.read_bits_r(6) << 10) as i32;
            g[1] |= bstream.read_bits(4) as i32;
            g[0] |= (bstream.read_bits_r(6) << 10) as i32;
            b[1] |= bstream.read_bits(4) as i32;
            b[0] |= (bstream.read_bits_r(6) << 10) as i32;
            13
        }
        // 10011, 10111, 11011, and 11111 are reserved.
        _ => {
            return Err(CorruptBlock {
                format: CompressionFormat::Bc6h,
            })
        }
    };

    let num_partitions = if mode >= 10 { 1 } else { 2 };
    let num_endpoints = num_partitions * 2;

    // Deltas are signed two's complement even for the unsigned format.
    if mode != 9 && mode != 10 {
        for i in 1..num_endpoints {
            r[i] = extend_sign(r[i], BITS_DR[mode]);
            g[i] = extend_sign(g[i], BITS_DG[mode]);
            b[i] = extend_sign(b[i], BITS_DB[mode]);

            r[i] = transform_inverse(r[i], r[0], BITS_W[mode]);
            g[i] = transform_inverse(g[i], g[0], BITS_W[mode]);
            b[i] = transform_inverse(b[i], b[0], BITS_W[mode]);
        }
    }

    let mut unq = [[0u64; 3]; 4];
    for i in 0..num_endpoints {
        unq[i] = [
            unquantize(r[i], BITS_W[mode]) as u64,
            unquantize(g[i], BITS_W[mode]) as u64,
            unquantize(b[i], BITS_W[mode]) as u64,
        ];
    }

    let weights = if num_partitions == 1 {
        &WEIGHTS4[..]
    } else {
        &WEIGHTS3[..]
    };

    let mut rgba = [[[0f32; 4]; 4]; 4];
    for i in 0..4 {
        for j in 0..4 {
            let partition_set = if num_partitions == 1 {
                if i | j != 0 {
                    0
                } else {
                    128
                }
            } else {
                PARTITIONS_2[partition][i][j] as usize
            };

            let mut index_bits = if num_partitions == 1 { 4 } else { 3 };
            // The fix-up index for each subset is stored with one less bit.
            if partition_set & 0x80 != 0 {
                index_bits -= 1;
            }
            let subset = partition_set & 0x01;

            let index = bstream.read_bits(index_bits) as usize;

            let e0 = unq[subset * 2];
            let e1 = unq[subset * 2 + 1];
            rgba[i][j] = [
                f16::from_bits(finish_unquantize(interpolate(e0[0], e1[0], weights, index)))
                    .to_f32(),
                f16::from_bits(finish_unquantize(interpolate(e0[1], e1[1], weights, index)))
                    .to_f32(),
                f16::from_bits(finish_unquantize(interpolate(e0[2], e1[2], weights, index)))
                    .to_f32(),
                1.0,
            ];
        }
    }

    Ok(rgba)
}

/// Decode one block and tone map to RGBA8 by scaling `[0.0, 1.0]` to `[0, 255]`.
pub fn rgba8_from_bc6h(block: &[u8; 16]) -> Result<Rgba8Block, CorruptBlock> {
    let pixels = rgbaf32_from_bc6h(block)?;
    let mut rgba = [[[0u8; 4]; 4]; 4];
    for y in 0..4 {
        for x in 0..4 {
            for c in 0..4 {
                rgba[y][x][c] = (pixels[y][x][c] * 255.0) as u8;
            }
        }
    }
    Ok(rgba)
}

// Quantize half float bits to a 10 bit endpoint.
// Decoding expands a 10 bit endpoint q to the half bits 31 * q + 15,
// so pick the nearest q and clamp to the representable range.
fn quantize(half_bits: u16) -> i32 {
    if half_bits == 0 {
        0
    } else {
        ((half_bits as i32 + 15) / 31).min(1023)
    }
}

fn half_bits_from_unorm(value: u8) -> u16 {
    f16::from_f32(value as f32 / 255.0).to_bits()
}

/// Encode one tile using the single region 10 bit mode.
///
/// RGBA8 input is treated as UNORM color, so 255 maps to 1.0 and alpha is
/// discarded. The per channel endpoint range covers all 16 pixels.
pub fn bc6h_from_rgba8(rgba: &Rgba8Block) -> [u8; 16] {
    // Work on half float bit patterns. For non negative half floats the bit
    // pattern ordering matches the value ordering.
    let mut pixels = [[0u16; 3]; 16];
    for y in 0..4 {
        for x in 0..4 {
            for c in 0..3 {
                pixels[y * 4 + x][c] = half_bits_from_unorm(rgba[y][x][c]);
            }
        }
    }

    let mut min = [u16::MAX; 3];
    let mut max = [0u16; 3];
    for pixel in &pixels {
        for c in 0..3 {
            min[c] = min[c].min(pixel[c]);
            max[c] = max[c].max(pixel[c]);
        }
    }

    let e0 = [quantize(min[0]), quantize(min[1]), quantize(min[2])];
    let e1 = [quantize(max[0]), quantize(max[1]), quantize(max[2])];

    // Reproduce the decoder's palette to assign indices.
    let mut palette = [[0u16; 3]; 16];
    for (index, entry) in palette.iter_mut().enumerate() {
        for c in 0..3 {
            let a = unquantize(e0[c], 10) as u64;
            let b = unquantize(e1[c], 10) as u64;
            entry[c] = finish_unquantize(interpolate(a, b, &WEIGHTS4, index));
        }
    }

    // Squared error is measured on decoded values, not bit patterns.
    // Bit distances are not comparable across exponents.
    let mut indices = [0usize; 16];
    for (pixel, index) in pixels.iter().zip(&mut indices) {
        let mut best_error = f32::MAX;
        for (candidate, entry) in palette.iter().enumerate() {
            let mut error = 0f32;
            for c in 0..3 {
                let delta = f16::from_bits(pixel[c]).to_f32() - f16::from_bits(entry[c]).to_f32();
                error += delta * delta;
            }
            if error < best_error {
                best_error = error;
                *index = candidate;
            }
        }
    }

    // The anchor index at pixel 0 drops its MSB, so flip the endpoints
    // and invert the indices when it would need that bit.
    let (e0, e1) = if indices[0] & 0x8 != 0 {
        for index in &mut indices {
            *index = 15 - *index;
        }
        (e1, e0)
    } else {
        (e0, e1)
    };

    let mut writer = Bitwriter::new();
    writer.put_bits(0b00011, 5);
    writer.put_bits(e0[0] as u128, 10);
    writer.put_bits(e0[1] as u128, 10);
    writer.put_bits(e0[2] as u128, 10);
    writer.put_bits(e1[0] as u128, 10);
    writer.put_bits(e1[1] as u128, 10);
    writer.put_bits(e1[2] as u128, 10);

    writer.put_bits(indices[0] as u128, 3);
    for index in &indices[1..] {
        writer.put_bits(*index as u128, 4);
    }
    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantize_extremes() {
        assert_eq!(0, quantize(0));
        // 1.0 in f16 is 15360 = 31 * 495 + 15, which round trips exactly.
        assert_eq!(495, quantize(15360));
        assert_eq!(15360, finish_unquantize(unquantize(495, 10) as u64));
        assert_eq!(1023, quantize(u16::MAX));
    }

    #[test]
    fn unquantize_full_range() {
        assert_eq!(0, unquantize(0, 10));
        assert_eq!(0xFFFF, unquantize(1023, 10));
        // Half float 1.0 survives the full decode chain.
        assert_eq!(
            f16::from_f32(1.0),
            f16::from_bits(finish_unquantize(unquantize(495, 10) as u64))
        );
    }

    #[test]
    fn reserved_mode_headers_are_corrupt() {
        for header in [0b10011u8, 0b10111, 0b11011, 0b11111] {
            let mut block = [0u8; 16];
            block[0] = header;
            assert_eq!(
                Err(CorruptBlock {
                    format: CompressionFormat::Bc6h
                }),
                rgbaf32_from_bc6h(&block)
            );
        }
    }

    #[test]
    fn every_valid_mode_header_decodes() {
        for header in 0..32u8 {
            if matches!(header, 0b10011 | 0b10111 | 0b11011 | 0b11111) {
                continue;
            }
            let mut block = [0x5Au8; 16];
            block[0] = (block[0] & !0x1F) | header;
            // Two bit headers only constrain the low bits.
            if header & 0b11 < 2 {
                block[0] = (block[0] & !0b11) | (header & 0b11);
            }
            rgbaf32_from_bc6h(&block).unwrap();
        }
    }

    #[test]
    fn flat_white_round_trips_exactly() {
        let rgba = [[[255u8, 255, 255, 255]; 4]; 4];
        let block = bc6h_from_rgba8(&rgba);
        let decoded = rgbaf32_from_bc6h(&block).unwrap();
        for row in decoded {
            for pixel in row {
                assert_eq!([1.0, 1.0, 1.0, 1.0], pixel);
            }
        }
    }

    #[test]
    fn flat_black_round_trips_exactly() {
        let rgba = [[[0u8, 0, 0, 255]; 4]; 4];
        let block = bc6h_from_rgba8(&rgba);
        let decoded = rgba8_from_bc6h(&block).unwrap();
        for row in decoded {
            for pixel in row {
                assert_eq!([0, 0, 0, 255], pixel);
            }
        }
    }

    #[test]
    fn gradient_round_trips_within_tolerance() {
        // Interpolation is linear in half float bits, so per tile accuracy
        // depends on the tile's dynamic range. This mirrors a smooth gradient
        // where neighboring pixels stay close.
        let mut rgba = [[[0u8; 4]; 4]; 4];
        for y in 0..4 {
            for x in 0..4 {
                let v = 200 + (y * 4 + x) as u8 * 2;
                rgba[y][x] = [v, v - 60, v - 120, 255];
            }
        }
        let block = bc6h_from_rgba8(&rgba);
        let decoded = rgba8_from_bc6h(&block).unwrap();
        for y in 0..4 {
            for x in 0..4 {
                for c in 0..3 {
                    let expected = rgba[y][x][c] as i32;
                    let actual = decoded[y][x][c] as i32;
                    assert!(
                        (expected - actual).abs() <= 6,
                        "channel {c} at ({x}, {y}): {expected} vs {actual}"
                    );
                }
            }
        }
    }

    #[test]
    fn dim_channel_does_not_dominate_index_selection() {
        // The faint blue alternation covers far more half float bit steps
        // than the red ramp but barely registers in the decoded values,
        // so the shared index has to follow red.
        let mut rgba = [[[0u8; 4]; 4]; 4];
        for y in 0..4 {
            for x in 0..4 {
                let k = (y * 4 + x) as u8;
                rgba[y][x] = [200 + k * 2, 150, 2 + (k & 1), 255];
            }
        }
        let block = bc6h_from_rgba8(&rgba);
        let decoded = rgba8_from_bc6h(&block).unwrap();
        for y in 0..4 {
            for x in 0..4 {
                let expected = rgba[y][x][0] as i32;
                let actual = decoded[y][x][0] as i32;
                assert!(
                    (expected - actual).abs() <= 6,
                    "red at ({x}, {y}): {expected} vs {actual}"
                );
            }
        }
    }
}
