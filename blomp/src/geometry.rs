//! Block geometry shared by the tree builder and the decoder.
//!
//! The file format stores no dimensions at all, so the decoder has to walk
//! exactly the same grid the builder walked. Both go through [`subdivide`].

use crate::error::{Error, Result};

/// Deepest subdivision level a block tree may use.
pub const MAX_DEPTH: u8 = 10;

/// An axis aligned rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockDim {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl BlockDim {
    pub const fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    /// The rectangle covering a whole `width`×`height` image.
    pub const fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub const fn is_pixel(&self) -> bool {
        self.w == 1 && self.h == 1
    }

    pub const fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    pub const fn right(&self) -> u32 {
        self.x + self.w
    }

    pub const fn bottom(&self) -> u32 {
        self.y + self.h
    }

    /// Whether the rectangle lies within a `width`×`height` image.
    pub const fn fits_in(&self, width: u32, height: u32) -> bool {
        self.right() <= width && self.bottom() <= height
    }
}

/// Nominal edge length of a block at `depth`: `2^(max_depth - depth)`.
pub fn edge_len(max_depth: u8, depth: u8) -> Result<u32> {
    if depth > max_depth || max_depth > MAX_DEPTH {
        return Err(Error::ConfigInvariantViolation {
            depth: depth as u32,
            max_depth: max_depth as u32,
        });
    }

    Ok(1 << (max_depth - depth))
}

/// Split `region` into the regions of its children at `child_depth`.
///
/// The root covers the whole image and its children are the depth 0
/// blocks, every other block at depth `d` has its children at `d + 1`.
pub fn subdivide(region: BlockDim, max_depth: u8, child_depth: u8) -> Result<SubRegions> {
    Ok(SubRegions::new(region, edge_len(max_depth, child_depth)?))
}

/// Row-major walk over a region in steps of `edge` pixels, with the last
/// row and column clipped to the region.
#[derive(Debug, Clone)]
pub struct SubRegions {
    region: BlockDim,
    edge: u32,

    x: u32,
    y: u32,
}

impl SubRegions {
    pub fn new(region: BlockDim, edge: u32) -> Self {
        Self {
            region,
            edge: edge.max(1),
            x: region.x,
            y: region.y,
        }
    }
}

impl Iterator for SubRegions {
    type Item = BlockDim;

    fn next(&mut self) -> Option<BlockDim> {
        if self.region.is_empty() || self.y >= self.region.bottom() {
            return None;
        }

        let dim = BlockDim {
            x: self.x,
            y: self.y,
            w: self.edge.min(self.region.right() - self.x),
            h: self.edge.min(self.region.bottom() - self.y),
        };

        self.x += self.edge;
        if self.x >= self.region.right() {
            self.x = self.region.x;
            self.y += self.edge;
        }

        Some(dim)
    }
}
