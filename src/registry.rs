//! The per format dispatch table.
//!
//! Every format branch in the crate goes through a [FormatEntry], so adding
//! a format means adding one record here.
use crate::{
    bcn::{bc6h, decode, encode, Rgba8Block, RgbaF32Block},
    ChannelLayout, CompressionFormat, CorruptBlock, Quality, SurfaceError,
};

/// One encoded block. The valid length depends only on the format.
pub(crate) struct EncodedBlock {
    bytes: [u8; 16],
    len: usize,
}

impl EncodedBlock {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }
}

fn block8(bytes: [u8; 8]) -> EncodedBlock {
    let mut padded = [0u8; 16];
    padded[..8].copy_from_slice(&bytes);
    EncodedBlock {
        bytes: padded,
        len: 8,
    }
}

fn block16(bytes: [u8; 16]) -> EncodedBlock {
    EncodedBlock { bytes, len: 16 }
}

/// The registry record for one compressed format.
pub struct FormatEntry {
    pub format: CompressionFormat,
    /// The DXGI format code identifying this format in DDS containers.
    pub dxgi_code: u32,
    pub block_size_in_bytes: usize,
    pub channel_layout: ChannelLayout,
    pub(crate) encode: fn(&Rgba8Block, Quality) -> EncodedBlock,
    /// Decode a block of exactly `block_size_in_bytes` bytes.
    pub(crate) decode: fn(&[u8]) -> Result<Rgba8Block, CorruptBlock>,
    /// Only HDR formats decode to `f32` without tone mapping.
    pub(crate) decode_f32: Option<fn(&[u8]) -> Result<RgbaF32Block, CorruptBlock>>,
}

fn encode_bc1(rgba: &Rgba8Block, _: Quality) -> EncodedBlock {
    block8(encode::bc1_from_rgba8(rgba))
}

fn encode_bc2(rgba: &Rgba8Block, _: Quality) -> EncodedBlock {
    block16(encode::bc2_from_rgba8(rgba))
}

fn encode_bc3(rgba: &Rgba8Block, _: Quality) -> EncodedBlock {
    block16(encode::bc3_from_rgba8(rgba))
}

fn encode_bc4(rgba: &Rgba8Block, _: Quality) -> EncodedBlock {
    block8(encode::bc4_from_rgba8(rgba))
}

fn encode_bc5(rgba: &Rgba8Block, _: Quality) -> EncodedBlock {
    block16(encode::bc5_from_rgba8(rgba))
}

fn encode_bc6h(rgba: &Rgba8Block, _: Quality) -> EncodedBlock {
    block16(bc6h::bc6h_from_rgba8(rgba))
}

fn encode_bc7(rgba: &Rgba8Block, quality: Quality) -> EncodedBlock {
    block16(encode::bc7_from_rgba8(rgba, quality))
}

fn decode_bc1(block: &[u8]) -> Result<Rgba8Block, CorruptBlock> {
    Ok(decode::rgba8_from_bc1(block.try_into().unwrap()))
}

fn decode_bc2(block: &[u8]) -> Result<Rgba8Block, CorruptBlock> {
    Ok(decode::rgba8_from_bc2(block.try_into().unwrap()))
}

fn decode_bc3(block: &[u8]) -> Result<Rgba8Block, CorruptBlock> {
    Ok(decode::rgba8_from_bc3(block.try_into().unwrap()))
}

fn decode_bc4(block: &[u8]) -> Result<Rgba8Block, CorruptBlock> {
    Ok(decode::rgba8_from_bc4(block.try_into().unwrap()))
}

fn decode_bc5(block: &[u8]) -> Result<Rgba8Block, CorruptBlock> {
    Ok(decode::rgba8_from_bc5(block.try_into().unwrap()))
}

fn decode_bc6h(block: &[u8]) -> Result<Rgba8Block, CorruptBlock> {
    bc6h::rgba8_from_bc6h(block.try_into().unwrap())
}

fn decode_bc6h_f32(block: &[u8]) -> Result<RgbaF32Block, CorruptBlock> {
    bc6h::rgbaf32_from_bc6h(block.try_into().unwrap())
}

fn decode_bc7(block: &[u8]) -> Result<Rgba8Block, CorruptBlock> {
    decode::rgba8_from_bc7(block.try_into().unwrap())
}

// Indexed by CompressionFormat discriminant.
static REGISTRY: [FormatEntry; 7] = [
    FormatEntry {
        format: CompressionFormat::Bc1,
        dxgi_code: 71,
        block_size_in_bytes: 8,
        channel_layout: ChannelLayout::Color,
        encode: encode_bc1,
        decode: decode_bc1,
        decode_f32: None,
    },
    FormatEntry {
        format: CompressionFormat::Bc2,
        dxgi_code: 74,
        block_size_in_bytes: 16,
        channel_layout: ChannelLayout::ColorAlpha,
        encode: encode_bc2,
        decode: decode_bc2,
        decode_f32: None,
    },
    FormatEntry {
        format: CompressionFormat::Bc3,
        dxgi_code: 77,
        block_size_in_bytes: 16,
        channel_layout: ChannelLayout::ColorAlpha,
        encode: encode_bc3,
        decode: decode_bc3,
        decode_f32: None,
    },
    FormatEntry {
        format: CompressionFormat::Bc4,
        dxgi_code: 80,
        block_size_in_bytes: 8,
        channel_layout: ChannelLayout::SingleChannel,
        encode: encode_bc4,
        decode: decode_bc4,
        decode_f32: None,
    },
    FormatEntry {
        format: CompressionFormat::Bc5,
        dxgi_code: 83,
        block_size_in_bytes: 16,
        channel_layout: ChannelLayout::DualChannel,
        encode: encode_bc5,
        decode: decode_bc5,
        decode_f32: None,
    },
    FormatEntry {
        format: CompressionFormat::Bc6h,
        dxgi_code: 95,
        block_size_in_bytes: 16,
        channel_layout: ChannelLayout::HdrColor,
        encode: encode_bc6h,
        decode: decode_bc6h,
        decode_f32: Some(decode_bc6h_f32),
    },
    FormatEntry {
        format: CompressionFormat::Bc7,
        dxgi_code: 98,
        block_size_in_bytes: 16,
        channel_layout: ChannelLayout::ColorAlpha,
        encode: encode_bc7,
        decode: decode_bc7,
        decode_f32: None,
    },
];

/// The registry record for a format.
pub(crate) fn entry(format: CompressionFormat) -> &'static FormatEntry {
    &REGISTRY[format as usize]
}

/// Look up a format by its raw DXGI code without allocating.
pub fn lookup(code: u32) -> Result<&'static FormatEntry, SurfaceError> {
    REGISTRY
        .iter()
        .find(|entry| entry.dxgi_code == code)
        .ok_or(SurfaceError::UnsupportedFormat { code })
}
