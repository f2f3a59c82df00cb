//! Decoding for the LDR formats BC1-BC5 and BC7.
//!
//! Every function accepts any bit pattern of the right length and fills all
//! 16 pixels. Only BC7 can fail since its mode field has unused encodings.
use crate::{
    bcn::{
        interpolate, Bitstream, Rgba8Block, PARTITIONS_2, PARTITIONS_3, WEIGHTS2, WEIGHTS3,
        WEIGHTS4,
    },
    CompressionFormat, CorruptBlock,
};

pub fn rgba8_from_bc1(block: &[u8; 8]) -> Rgba8Block {
    color_block(block, false)
}

pub fn rgba8_from_bc2(block: &[u8; 16]) -> Rgba8Block {
    let mut rgba = color_block(block[8..16].try_into().unwrap(), true);
    let alpha = sharp_alpha_block(block[0..8].try_into().unwrap());
    for y in 0..4 {
        for x in 0..4 {
            rgba[y][x][3] = alpha[y][x];
        }
    }
    rgba
}

pub fn rgba8_from_bc3(block: &[u8; 16]) -> Rgba8Block {
    let mut rgba = color_block(block[8..16].try_into().unwrap(), true);
    let alpha = smooth_alpha_block(block[0..8].try_into().unwrap());
    for y in 0..4 {
        for x in 0..4 {
            rgba[y][x][3] = alpha[y][x];
        }
    }
    rgba
}

pub fn rgba8_from_bc4(block: &[u8; 8]) -> Rgba8Block {
    let red = smooth_alpha_block(block);
    let mut rgba = [[[0u8; 4]; 4]; 4];
    for y in 0..4 {
        for x in 0..4 {
            let r = red[y][x];
            rgba[y][x] = [r, r, r, 255];
        }
    }
    rgba
}

pub fn rgba8_from_bc5(block: &[u8; 16]) -> Rgba8Block {
    let red = smooth_alpha_block(block[0..8].try_into().unwrap());
    let green = smooth_alpha_block(block[8..16].try_into().unwrap());
    let mut rgba = [[[0u8; 4]; 4]; 4];
    for y in 0..4 {
        for x in 0..4 {
            rgba[y][x] = [red[y][x], green[y][x], 0, 255];
        }
    }
    rgba
}

fn color_block(block: &[u8; 8], only_opaque_mode: bool) -> Rgba8Block {
    let mut ref_colors = [[0u8; 4]; 4];

    let c0 = u16::from_le_bytes(block[0..2].try_into().unwrap());
    let c1 = u16::from_le_bytes(block[2..4].try_into().unwrap());

    // Expand 565 ref colors to 888
    let r0 = (((c0 >> 11) & 0x1F) * 527 + 23) >> 6;
    let g0 = (((c0 >> 5) & 0x3F) * 259 + 33) >> 6;
    let b0 = ((c0 & 0x1F) * 527 + 23) >> 6;
    ref_colors[0] = [r0 as u8, g0 as u8, b0 as u8, 255u8];

    let r1 = (((c1 >> 11) & 0x1F) * 527 + 23) >> 6;
    let g1 = (((c1 >> 5) & 0x3F) * 259 + 33) >> 6;
    let b1 = ((c1 & 0x1F) * 527 + 23) >> 6;
    ref_colors[1] = [r1 as u8, g1 as u8, b1 as u8, 255u8];

    if c0 > c1 || only_opaque_mode {
        // Four color mode. The BC2 and BC3 color block uses only this mode.
        // color_2 = 2/3*color_0 + 1/3*color_1
        // color_3 = 1/3*color_0 + 2/3*color_1
        let r = (2 * r0 + r1 + 1) / 3;
        let g = (2 * g0 + g1 + 1) / 3;
        let b = (2 * b0 + b1 + 1) / 3;
        ref_colors[2] = [r as u8, g as u8, b as u8, 255u8];

        let r = (r0 + 2 * r1 + 1) / 3;
        let g = (g0 + 2 * g1 + 1) / 3;
        let b = (b0 + 2 * b1 + 1) / 3;
        ref_colors[3] = [r as u8, g as u8, b as u8, 255u8];
    } else {
        // Three color mode with 1 bit alpha.
        // color_2 = 1/2*color_0 + 1/2*color_1
        // color_3 = transparent black
        let r = (r0 + r1 + 1) >> 1;
        let g = (g0 + g1 + 1) >> 1;
        let b = (b0 + b1 + 1) >> 1;
        ref_colors[2] = [r as u8, g as u8, b as u8, 255u8];

        ref_colors[3] = [0u8; 4];
    }

    let mut color_indices = u32::from_le_bytes(block[4..8].try_into().unwrap());

    let mut rgba = [[[0u8; 4]; 4]; 4];
    for row in &mut rgba {
        for pixel in row {
            *pixel = ref_colors[(color_indices & 0x03) as usize];
            color_indices >>= 2;
        }
    }
    rgba
}

// BC2 stores one alpha nibble per pixel.
fn sharp_alpha_block(block: &[u8; 8]) -> [[u8; 4]; 4] {
    let mut values = [[0u8; 4]; 4];
    for y in 0..4 {
        let row = u16::from_le_bytes(block[y * 2..y * 2 + 2].try_into().unwrap());
        for x in 0..4 {
            values[y][x] = ((row >> (4 * x)) & 0x0F) as u8 * 17;
        }
    }
    values
}

// BC3 alpha and the BC4/BC5 channels share this layout of
// two endpoints and 16 3-bit palette indices.
fn smooth_alpha_block(block: &[u8; 8]) -> [[u8; 4]; 4] {
    let mut alpha = [0u32; 8];

    alpha[0] = block[0] as u32;
    alpha[1] = block[1] as u32;

    if alpha[0] > alpha[1] {
        // 6 interpolated alpha values.
        alpha[2] = (6 * alpha[0] + alpha[1] + 1) / 7;
        alpha[3] = (5 * alpha[0] + 2 * alpha[1] + 1) / 7;
        alpha[4] = (4 * alpha[0] + 3 * alpha[1] + 1) / 7;
        alpha[5] = (3 * alpha[0] + 4 * alpha[1] + 1) / 7;
        alpha[6] = (2 * alpha[0] + 5 * alpha[1] + 1) / 7;
        alpha[7] = (alpha[0] + 6 * alpha[1] + 1) / 7;
    } else {
        // 4 interpolated alpha values plus transparent and opaque.
        alpha[2] = (4 * alpha[0] + alpha[1] + 1) / 5;
        alpha[3] = (3 * alpha[0] + 2 * alpha[1] + 1) / 5;
        alpha[4] = (2 * alpha[0] + 3 * alpha[1] + 1) / 5;
        alpha[5] = (alpha[0] + 4 * alpha[1] + 1) / 5;
        alpha[6] = 0x00;
        alpha[7] = 0xFF;
    }

    let mut indices = u64::from_le_bytes(*block) >> 16;
    let mut values = [[0u8; 4]; 4];
    for row in &mut values {
        for value in row {
            *value = alpha[(indices & 0x07) as usize] as u8;
            indices >>= 3;
        }
    }
    values
}

pub fn rgba8_from_bc7(block: &[u8; 16]) -> Result<Rgba8Block, CorruptBlock> {
    // Endpoint bits per mode for RGB and alpha.
    let actual_bits_count = [[4, 6, 5, 7, 5, 7, 7, 5], [0, 0, 0, 0, 6, 8, 7, 5]];

    let s_mode_has_pbits: u64 = 0b11001011;

    let mut bstream = Bitstream::new(block);

    let mut endpoints = [[0u64; 4]; 6];
    let mut indices = [[0u64; 4]; 4];

    // The mode is encoded in the position of the lowest set bit.
    let mut mode = 0;
    while mode < 8 && 0 == bstream.read_bit() {
        mode += 1;
    }

    // All zero low bits is the one BC7 encoding with no meaning.
    if mode >= 8 {
        return Err(CorruptBlock {
            format: CompressionFormat::Bc7,
        });
    }

    let mut partition = 0;
    let mut num_partitions = 1;
    let mut rotation = 0;
    let mut index_selection_bit = 0;

    if mode == 0 || mode == 1 || mode == 2 || mode == 3 || mode == 7 {
        num_partitions = if mode == 0 || mode == 2 { 3 } else { 2 };
        partition = bstream.read_bits(if mode == 0 { 4 } else { 6 });
    }

    let num_endpoints = num_partitions * 2;

    if mode == 4 || mode == 5 {
        rotation = bstream.read_bits(2);

        if mode == 4 {
            index_selection_bit = bstream.read_bit();
        }
    }

    // Raw RGB endpoints, then raw alpha endpoints if the mode stores alpha.
    for i in 0..3 {
        for endpoint in endpoints.iter_mut().take(num_endpoints) {
            endpoint[i] = bstream.read_bits(actual_bits_count[0][mode]);
        }
    }
    if actual_bits_count[1][mode] > 0 {
        for endpoint in endpoints.iter_mut().take(num_endpoints) {
            endpoint[3] = bstream.read_bits(actual_bits_count[1][mode]);
        }
    }

    // Apply the P-bits before expanding to 8 bits.
    if mode == 0 || mode == 1 || mode == 3 || mode == 6 || mode == 7 {
        for endpoint in endpoints.iter_mut().take(num_endpoints) {
            for component in endpoint {
                *component <<= 1;
            }
        }

        if mode == 1 {
            // One P-bit shared by each pair of endpoints.
            let i = bstream.read_bit();
            let j = bstream.read_bit();

            for k in 0..3 {
                endpoints[0][k] |= i;
                endpoints[1][k] |= i;
                endpoints[2][k] |= j;
                endpoints[3][k] |= j;
            }
        } else if (s_mode_has_pbits & (1 << mode)) != 0 {
            // Unique P-bit per endpoint.
            for endpoint in endpoints.iter_mut().take(num_endpoints) {
                let j = bstream.read_bit();
                for component in endpoint {
                    *component |= j;
                }
            }
        }
    }

    for endpoint in endpoints.iter_mut().take(num_endpoints) {
        // Left shift so the MSB lands in bit 7, then replicate the
        // top bits into the LSBs revealed by the shift.
        let j = actual_bits_count[0][mode] + ((s_mode_has_pbits >> mode) & 1);
        for component in endpoint.iter_mut().take(3) {
            *component <<= 8 - j;
            *component |= *component >> j;
        }

        let j = actual_bits_count[1][mode] + ((s_mode_has_pbits >> mode) & 1);
        endpoint[3] <<= 8 - j;
        endpoint[3] |= endpoint[3] >> j;
    }

    // Modes without stored alpha decode as fully opaque.
    if actual_bits_count[1][mode] == 0 {
        for endpoint in endpoints.iter_mut().take(num_endpoints) {
            endpoint[3] = 0xFF;
        }
    }

    let index_bits: u64 = match mode {
        0 | 1 => 3,
        6 => 4,
        _ => 2,
    };
    let index_bits2: u64 = match mode {
        4 => 3,
        5 => 2,
        _ => 0,
    };
    let weights = match index_bits {
        2 => &WEIGHTS2[..],
        3 => &WEIGHTS3[..],
        _ => &WEIGHTS4[..],
    };
    let weights2 = if index_bits2 == 2 {
        &WEIGHTS2[..]
    } else {
        &WEIGHTS3[..]
    };

    let subset_of = |i: usize, j: usize| -> u64 {
        if num_partitions == 1 {
            if i | j != 0 {
                0
            } else {
                128
            }
        } else if num_partitions == 2 {
            PARTITIONS_2[partition as usize][i][j] as u64
        } else {
            PARTITIONS_3[partition as usize][i][j] as u64
        }
    };

    // The color and alpha index planes are stored back to back,
    // so collect all color indices before interpolating.
    for i in 0..4 {
        for j in 0..4 {
            // The fix-up index for each subset is stored with one less bit.
            let bits = if subset_of(i, j) & 0x80 != 0 {
                index_bits - 1
            } else {
                index_bits
            };
            indices[i][j] = bstream.read_bits(bits);
        }
    }

    let mut rgba = [[[0u8; 4]; 4]; 4];
    for i in 0..4 {
        for j in 0..4 {
            let subset = (subset_of(i, j) & 0x03) as usize;
            let index = indices[i][j] as usize;

            let e0 = endpoints[subset * 2];
            let e1 = endpoints[subset * 2 + 1];

            let (mut r, mut g, mut b, mut a) = if index_bits2 == 0 {
                (
                    interpolate(e0[0], e1[0], weights, index),
                    interpolate(e0[1], e1[1], weights, index),
                    interpolate(e0[2], e1[2], weights, index),
                    interpolate(e0[3], e1[3], weights, index),
                )
            } else {
                let index2 = bstream.read_bits(if i | j != 0 {
                    index_bits2
                } else {
                    index_bits2 - 1
                }) as usize;
                // The index selection bit swaps which index plane drives
                // color and which drives alpha.
                if index_selection_bit == 0 {
                    (
                        interpolate(e0[0], e1[0], weights, index),
                        interpolate(e0[1], e1[1], weights, index),
                        interpolate(e0[2], e1[2], weights, index),
                        interpolate(e0[3], e1[3], weights2, index2),
                    )
                } else {
                    (
                        interpolate(e0[0], e1[0], weights2, index2),
                        interpolate(e0[1], e1[1], weights2, index2),
                        interpolate(e0[2], e1[2], weights2, index2),
                        interpolate(e0[3], e1[3], weights, index),
                    )
                }
            };

            match rotation {
                // Scalar(R) Vector(AGB)
                1 => core::mem::swap(&mut a, &mut r),
                // Scalar(G) Vector(RAB)
                2 => core::mem::swap(&mut a, &mut g),
                // Scalar(B) Vector(RGA)
                3 => core::mem::swap(&mut a, &mut b),
                _ => (),
            }

            rgba[i][j] = [r as u8, g as u8, b as u8, a as u8];
        }
    }

    Ok(rgba)
}
