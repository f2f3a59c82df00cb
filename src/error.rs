use thiserror::Error;

use crate::CompressionFormat;

/// Errors that can occur when encoding or decoding block compressed surfaces.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("surface dimensions {width} x {height} are not valid")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("surface pixel count {width} x {height} would overflow")]
    PixelCountWouldOverflow { width: u32, height: u32 },

    #[error("expected surface to have at least {expected} bytes but found {actual}")]
    NotEnoughData { expected: usize, actual: usize },

    #[error("format code {code} is not a recognized block compressed format")]
    UnsupportedFormat { code: u32 },

    #[error(
        "writing {additional} additional bytes at length {length} would exceed the buffer capacity of {capacity} bytes"
    )]
    BufferOverflow {
        capacity: usize,
        length: usize,
        additional: usize,
    },

    #[error("compressed block {block_index} is corrupt: {source}")]
    DecodeCorruption {
        block_index: usize,
        source: CorruptBlock,
    },
}

/// A compressed block whose bits do not select a representable mode for its format.
///
/// Reported per block so batch decoders can choose whether a corrupt block
/// aborts the whole surface.
#[derive(Debug, PartialEq, Eq, Error)]
#[error("block bits do not select a representable {format:?} mode")]
pub struct CorruptBlock {
    pub format: CompressionFormat,
}

impl CorruptBlock {
    pub(crate) fn at(self, block_index: usize) -> SurfaceError {
        SurfaceError::DecodeCorruption {
            block_index,
            source: self,
        }
    }
}
