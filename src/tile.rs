//! Row major iteration over the 4x4 tiles of an RGBA8 surface.
use bytemuck::Pod;

use crate::{div_round_up, Rgba8Block, SurfaceError, BLOCK_HEIGHT, BLOCK_WIDTH};

/// An iterator over the 4x4 pixel tiles of a surface in row major order.
///
/// Tiles are always fully populated. Pixels outside the surface clamp to the
/// nearest valid row and column, so edge tiles repeat the border pixels.
/// The iterator is cheap to [Clone] for restarting from the first tile.
#[derive(Clone)]
pub struct Tiles<'a> {
    rgba8: &'a [u8],
    width: usize,
    height: usize,
    tiles_x: usize,
    tiles_y: usize,
    index: usize,
}

impl<'a> Tiles<'a> {
    /// Validate the surface dimensions and data length before any tile work.
    pub fn new(width: u32, height: u32, rgba8: &'a [u8]) -> Result<Self, SurfaceError> {
        if width == 0 || height == 0 {
            return Err(SurfaceError::InvalidDimensions { width, height });
        }

        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(4))
            .ok_or(SurfaceError::PixelCountWouldOverflow { width, height })?;
        if rgba8.len() < expected {
            return Err(SurfaceError::NotEnoughData {
                expected,
                actual: rgba8.len(),
            });
        }

        Ok(Self {
            rgba8,
            width: width as usize,
            height: height as usize,
            tiles_x: div_round_up(width as usize, BLOCK_WIDTH),
            tiles_y: div_round_up(height as usize, BLOCK_HEIGHT),
            index: 0,
        })
    }

    /// The number of tile columns.
    pub fn tiles_x(&self) -> usize {
        self.tiles_x
    }

    /// The number of tile rows.
    pub fn tiles_y(&self) -> usize {
        self.tiles_y
    }

    fn tile_at(&self, tile_x: usize, tile_y: usize) -> Rgba8Block {
        let mut tile = [[[0u8; 4]; 4]; 4];
        for (row, row_pixels) in tile.iter_mut().enumerate() {
            let y = (tile_y * BLOCK_HEIGHT + row).min(self.height - 1);
            for (col, pixel) in row_pixels.iter_mut().enumerate() {
                let x = (tile_x * BLOCK_WIDTH + col).min(self.width - 1);
                let offset = (y * self.width + x) * 4;
                *pixel = self.rgba8[offset..offset + 4].try_into().unwrap();
            }
        }
        tile
    }
}

impl Iterator for Tiles<'_> {
    type Item = Rgba8Block;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.tiles_x * self.tiles_y {
            return None;
        }
        let tile = self.tile_at(self.index % self.tiles_x, self.index / self.tiles_x);
        self.index += 1;
        Some(tile)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.tiles_x * self.tiles_y - self.index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Tiles<'_> {}

/// Copy a decoded tile into a surface, cropping pixels past the edges.
pub(crate) fn put_rgba_block<T: Pod>(
    surface: &mut [T],
    block: [[[T; 4]; 4]; 4],
    x: usize,
    y: usize,
    width: usize,
    height: usize,
) {
    let copy_width = BLOCK_WIDTH.min(width - x);
    let copy_height = BLOCK_HEIGHT.min(height - y);
    for (row, row_pixels) in block.iter().enumerate().take(copy_height) {
        let offset = ((y + row) * width + x) * 4;
        surface[offset..offset + copy_width * 4]
            .copy_from_slice(bytemuck::cast_slice(&row_pixels[..copy_width]));
    }
}
