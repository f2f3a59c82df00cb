//! A bounds checked sink for encoded blocks.
use crate::SurfaceError;

/// An output buffer whose capacity is fixed at creation.
///
/// The capacity is the exact encoded size of the surface, computed once with
/// checked arithmetic. Every [append](OutputBuffer::append) validates against
/// that capacity before copying, so an encoder bug can report
/// [SurfaceError::BufferOverflow] but can never write past the bound.
pub struct OutputBuffer {
    bytes: Vec<u8>,
    capacity: usize,
}

impl OutputBuffer {
    /// Allocate a buffer for `tiles_x * tiles_y` blocks of
    /// `block_size_in_bytes` bytes.
    pub fn for_blocks(
        tiles_x: usize,
        tiles_y: usize,
        block_size_in_bytes: usize,
    ) -> Result<Self, SurfaceError> {
        let capacity = tiles_x
            .checked_mul(tiles_y)
            .and_then(|tiles| tiles.checked_mul(block_size_in_bytes))
            .ok_or(SurfaceError::PixelCountWouldOverflow {
                width: tiles_x as u32,
                height: tiles_y as u32,
            })?;
        Ok(Self {
            bytes: Vec::with_capacity(capacity),
            capacity,
        })
    }

    /// Append one encoded block, or fail without writing anything.
    pub fn append(&mut self, block: &[u8]) -> Result<(), SurfaceError> {
        if self.bytes.len() + block.len() > self.capacity {
            return Err(SurfaceError::BufferOverflow {
                capacity: self.capacity,
                length: self.bytes.len(),
                additional: block.len(),
            });
        }
        self.bytes.extend_from_slice(block);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Take the encoded bytes once every block has been appended.
    ///
    /// Panics if the buffer is not completely filled, since a partially
    /// encoded surface should never be observable.
    pub fn finish(self) -> Vec<u8> {
        assert_eq!(self.bytes.len(), self.capacity);
        self.bytes
    }
}
