// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Iteration-count buffers.
//!
//! A `PartialImage` is what one worker computes: the counts for its
//! own span of flat pixel offsets.  A `Raster` is the whole image,
//! row-major, owned by the coordinator once the gather completes.
//! Both allocate through `alloc_cells`, which reports allocation
//! failure as an error instead of aborting.

use std::slice::Chunks;

use crate::error::{MandelError, Result};
use crate::partition::WorkRange;

/// Allocates `len` zeroed cells, or fails with `AllocationFailed`.
pub fn alloc_cells(len: usize) -> Result<Vec<u32>> {
    let mut cells: Vec<u32> = Vec::new();
    cells
        .try_reserve_exact(len)
        .map_err(|_| MandelError::AllocationFailed { cells: len })?;
    cells.resize(len, 0);
    Ok(cells)
}

/// An empty byte buffer able to hold `len` bytes without growing, or
/// `AllocationFailed`.
pub fn reserve_bytes(len: usize) -> Result<Vec<u8>> {
    let mut bytes: Vec<u8> = Vec::new();
    bytes
        .try_reserve_exact(len)
        .map_err(|_| MandelError::AllocationFailed { cells: len })?;
    Ok(bytes)
}

/// One worker's share of the image.
#[derive(Clone, Debug, PartialEq)]
pub struct PartialImage {
    span: WorkRange,
    cells: Vec<u32>,
}

impl PartialImage {
    /// A zeroed buffer for the given span of pixel offsets.
    pub fn new(span: WorkRange) -> Result<PartialImage> {
        Ok(PartialImage {
            span,
            cells: alloc_cells(span.len())?,
        })
    }

    /// The pixel offsets these cells belong to.
    pub fn span(&self) -> WorkRange {
        self.span
    }

    /// Iteration counts in offset order.
    pub fn cells(&self) -> &[u32] {
        &self.cells
    }

    /// Mutable access for the kernel.
    pub fn cells_mut(&mut self) -> &mut [u32] {
        &mut self.cells
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True for a worker that was assigned nothing.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// The merged image: `width * height` iteration counts, row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct Raster {
    width: usize,
    height: usize,
    cells: Vec<u32>,
}

impl Raster {
    /// A zeroed image.
    pub fn new(width: usize, height: usize) -> Result<Raster> {
        Ok(Raster {
            width,
            height,
            cells: alloc_cells(width * height)?,
        })
    }

    /// Wraps an existing buffer, which must hold exactly
    /// `width * height` cells.
    pub fn from_cells(width: usize, height: usize, cells: Vec<u32>) -> Result<Raster> {
        if cells.len() != width * height {
            return Err(MandelError::OutOfBounds {
                offset: 0,
                len: cells.len(),
                size: width * height,
            });
        }
        Ok(Raster {
            width,
            height,
            cells,
        })
    }

    /// Image width.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Total cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True for a zero-area image.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Every cell, row-major.
    pub fn cells(&self) -> &[u32] {
        &self.cells
    }

    /// The count at column `x`, row `y`.
    pub fn get(&self, x: usize, y: usize) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells.get(y * self.width + x).cloned()
    }

    /// One row of the image.
    pub fn row(&self, y: usize) -> Option<&[u32]> {
        if y >= self.height {
            return None;
        }
        let start = y * self.width;
        self.cells.get(start..start + self.width)
    }

    /// Iterates over rows, top to bottom.
    pub fn rows(&self) -> Chunks<u32> {
        // chunks() rejects a zero chunk size
        self.cells.chunks(self.width.max(1))
    }

    /// A mutable window of `len` cells starting at flat offset `offset`.
    pub fn block_mut(&mut self, offset: usize, len: usize) -> Result<&mut [u32]> {
        let size = self.cells.len();
        match offset.checked_add(len) {
            Some(end) if end <= size => Ok(&mut self.cells[offset..end]),
            _ => Err(MandelError::OutOfBounds { offset, len, size }),
        }
    }

    /// Copies a partial image into place at its own span.
    pub fn place(&mut self, partial: &PartialImage) -> Result<()> {
        let span = partial.span();
        self.block_mut(span.start, span.len())?
            .copy_from_slice(partial.cells());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_are_bounds_checked() {
        let raster = Raster::from_cells(3, 2, vec![0, 1, 2, 3, 4, 5]).unwrap();
        assert_eq!(raster.get(2, 1), Some(5));
        assert_eq!(raster.get(3, 0), None);
        assert_eq!(raster.get(0, 2), None);
        assert_eq!(raster.row(1), Some(&[3, 4, 5][..]));
        assert_eq!(raster.row(2), None);
        assert_eq!(raster.rows().count(), 2);
    }

    #[test]
    fn block_mut_rejects_overruns() {
        let mut raster = Raster::new(4, 4).unwrap();
        assert!(raster.block_mut(12, 4).is_ok());
        match raster.block_mut(13, 4) {
            Err(MandelError::OutOfBounds { offset, len, size }) => {
                assert_eq!((offset, len, size), (13, 4, 16))
            }
            other => panic!("expected OutOfBounds, got {:?}", other),
        }
        assert!(raster.block_mut(usize::max_value(), 2).is_err());
    }

    #[test]
    fn place_copies_at_the_partial_span() {
        let mut raster = Raster::new(4, 2).unwrap();
        let mut partial = PartialImage::new(WorkRange { start: 4, end: 8 }).unwrap();
        partial.cells_mut().copy_from_slice(&[7, 7, 7, 7]);
        raster.place(&partial).unwrap();
        assert_eq!(raster.cells(), &[0, 0, 0, 0, 7, 7, 7, 7]);
    }

    #[test]
    fn from_cells_checks_length() {
        assert!(Raster::from_cells(2, 2, vec![0; 3]).is_err());
    }

    #[test]
    fn huge_allocation_fails_cleanly() {
        match alloc_cells(usize::max_value() / 2) {
            Err(MandelError::AllocationFailed { .. }) => (),
            other => panic!("expected AllocationFailed, got {:?}", other.map(|c| c.len())),
        }
        match reserve_bytes(usize::max_value()) {
            Err(MandelError::AllocationFailed { cells }) => assert_eq!(cells, usize::max_value()),
            other => panic!("expected AllocationFailed, got {:?}", other.map(|b| b.len())),
        }
    }

    #[test]
    fn reserved_bytes_start_empty() {
        let bytes = reserve_bytes(64).unwrap();
        assert!(bytes.is_empty());
        assert!(bytes.capacity() >= 64);
    }
}
