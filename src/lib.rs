//! # bcn_codec
//!
//! Encode and decode the BCn family of block compressed texture formats
//! (BC1-BC5, BC6H, BC7) used by DDS surface payloads.
//!
//! Images are processed as 4x4 pixel tiles in row major order.
//! Each tile compresses to a fixed size block of 8 or 16 bytes depending
//! only on the format, so the encoded size of a surface is always
//! `ceil(width / 4) * ceil(height / 4) * block_size`.
//! Encoded output is written through a capacity checked buffer,
//! so no input can ever write past the precomputed output size.
//!
//! ```rust
//! use bcn_codec::{bcn_from_rgba8, rgba8_from_bcn, CompressionFormat, Quality};
//!
//! let rgba = vec![255u8; 8 * 8 * 4];
//! let encoded = bcn_from_rgba8(8, 8, &rgba, CompressionFormat::Bc1, Quality::Normal)?;
//! assert_eq!(encoded.len(), 2 * 2 * 8);
//!
//! let decoded = rgba8_from_bcn(8, 8, &encoded, CompressionFormat::Bc1)?;
//! assert_eq!(decoded, rgba);
//! # Ok::<(), bcn_codec::SurfaceError>(())
//! ```
//!
//! Encoding is lossy. Decoding reverses the bit packing exactly but not the
//! quantization, so round tripped pixels are only close to the originals.
//! The per format tolerances are documented in [bcn].

pub mod bcn;
mod buffer;
mod decode;
mod encode;
mod error;
mod registry;
mod tile;

pub use buffer::OutputBuffer;
pub use decode::{rgba8_from_bcn, rgbaf32_from_bcn};
pub use encode::{bcn_from_rgba8, bcn_from_rgba8_code};
pub use error::{CorruptBlock, SurfaceError};
pub use registry::{lookup, FormatEntry};
pub use tile::Tiles;

pub use bcn::{Rgba8Block, RgbaF32Block, BLOCK_HEIGHT, BLOCK_WIDTH};

/// The block compressed formats supported by this crate.
///
/// Each format maps a 4x4 pixel tile to a block of
/// [block_size_in_bytes](CompressionFormat::block_size_in_bytes) bytes.
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "strum", derive(strum::EnumIter, strum::Display))]
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum CompressionFormat {
    /// RGB color with an implicit opaque alpha. 8 bytes per block.
    Bc1,
    /// RGB color and 4 bit per pixel alpha. 16 bytes per block.
    Bc2,
    /// RGB color and interpolated alpha. 16 bytes per block.
    Bc3,
    /// A single interpolated channel. 8 bytes per block.
    Bc4,
    /// Two independently interpolated channels. 16 bytes per block.
    Bc5,
    /// Unsigned HDR RGB color stored as half precision floats. 16 bytes per block.
    Bc6h,
    /// RGBA color with multiple partition and bit allocation modes. 16 bytes per block.
    Bc7,
}

/// The channels stored by a compressed format.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ChannelLayout {
    /// RGB color without stored alpha.
    Color,
    /// RGB color with stored alpha.
    ColorAlpha,
    /// A single channel like BC4.
    SingleChannel,
    /// Two channels like BC5.
    DualChannel,
    /// HDR RGB color like BC6H.
    HdrColor,
}

/// The conversion quality when converting to compressed formats.
///
/// Higher quality settings run significantly slower.
/// Block compressed formats use a fixed compression ratio,
/// so lower quality settings do not use less space than slower ones.
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Quality {
    /// Faster exports with slightly lower quality.
    Fast,
    /// Normal export speed and quality.
    Normal,
    /// Slower exports for slightly higher quality.
    Slow,
}

impl CompressionFormat {
    /// The fixed size of one compressed block in bytes.
    pub fn block_size_in_bytes(&self) -> usize {
        registry::entry(*self).block_size_in_bytes
    }

    /// The channels stored by this format.
    pub fn channel_layout(&self) -> ChannelLayout {
        registry::entry(*self).channel_layout
    }

    /// The DXGI format code used to identify this format in DDS containers.
    pub fn dxgi_code(&self) -> u32 {
        registry::entry(*self).dxgi_code
    }
}

fn div_round_up(x: usize, d: usize) -> usize {
    x.div_ceil(d)
}

/// The encoded size in bytes of a `width` x `height` surface
/// or `None` if the calculation overflows.
pub fn encoded_size(width: usize, height: usize, format: CompressionFormat) -> Option<usize> {
    div_round_up(width, BLOCK_WIDTH)
        .checked_mul(div_round_up(height, BLOCK_HEIGHT))?
        .checked_mul(format.block_size_in_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn div_round_up_multiple() {
        assert_eq!(2, div_round_up(8, 4));
    }

    #[test]
    fn div_round_up_remainder() {
        assert_eq!(3, div_round_up(9, 4));
    }

    #[test]
    fn div_round_up_near_usize_max() {
        assert_eq!(usize::MAX / 4 + 1, div_round_up(usize::MAX, 4));
    }

    #[test]
    fn encoded_size_bc1() {
        assert_eq!(Some(8), encoded_size(1, 1, CompressionFormat::Bc1));
        assert_eq!(Some(8), encoded_size(4, 4, CompressionFormat::Bc1));
        assert_eq!(Some(4 * 8), encoded_size(5, 5, CompressionFormat::Bc1));
    }

    #[test]
    fn encoded_size_overflow() {
        assert_eq!(
            None,
            encoded_size(usize::MAX, usize::MAX, CompressionFormat::Bc7)
        );
    }
}
