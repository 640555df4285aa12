use log::trace;
use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::{
    block::Block,
    error::{Error, Result},
    geometry::{subdivide, BlockDim, MAX_DEPTH},
    pixel::Pixel,
    raster::Image,
};

/// Parameters controlling how an image is split into blocks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockTreeDesc {
    /// Depth of the smallest (single pixel) blocks. Blocks at depth 0 are
    /// `2^max_depth` pixels wide.
    pub max_depth: u8,

    /// Highest color variation a region may have and still be merged into
    /// a single block.
    pub variation_threshold: f32,
}

impl Default for BlockTreeDesc {
    fn default() -> Self {
        Self {
            max_depth: 4,
            variation_threshold: 0.02,
        }
    }
}

impl BlockTreeDesc {
    /// Create a description, checking that both values are in range.
    pub fn new(max_depth: u8, variation_threshold: f32) -> Result<Self> {
        if max_depth > MAX_DEPTH {
            return Err(Error::InvalidDescriptor(format!(
                "max depth {max_depth} is not in 0..={MAX_DEPTH}"
            )));
        }

        if !(0.0..=1.0).contains(&variation_threshold) {
            return Err(Error::InvalidDescriptor(format!(
                "variation threshold {variation_threshold} is not in 0.0..=1.0"
            )));
        }

        Ok(Self {
            max_depth,
            variation_threshold,
        })
    }

    pub fn with_threshold(self, variation_threshold: f32) -> Self {
        Self {
            variation_threshold,
            ..self
        }
    }

    pub fn with_depth(self, max_depth: u8) -> Self {
        Self { max_depth, ..self }
    }
}

/// Free list of child buffers.
///
/// Most regions get split speculatively and then merged back into a single
/// color block, so their child lists are handed back here and reused for
/// the next region instead of being reallocated.
#[derive(Debug, Default)]
pub struct BlockPool {
    free: Vec<Vec<Block>>,
}

impl BlockPool {
    pub fn take(&mut self) -> Vec<Block> {
        self.free.pop().unwrap_or_else(|| Vec::with_capacity(4))
    }

    pub fn give(&mut self, mut children: Vec<Block>) {
        children.clear();
        self.free.push(children);
    }

    /// Number of buffers waiting to be reused
    pub fn len(&self) -> usize {
        self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }
}

/// Mean color and variation of a set of sibling color blocks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct BlockMetrics {
    pub mean: Pixel,

    /// Mean squared deviation from `mean`, over all samples and channels.
    pub variation: f32,
}

impl BlockMetrics {
    /// Every child counts once, whatever its size.
    pub fn from_children(children: &[Block]) -> Self {
        let colors = || children.iter().filter_map(Block::fill);
        let count = colors().count().max(1) as f32;

        let mean = colors().sum::<Pixel>() / count;
        let variation = colors()
            .map(|c| {
                let diff = c - mean;
                (diff * diff).channel_sum()
            })
            .sum::<f32>()
            / (3.0 * count);

        Self { mean, variation }
    }
}

/// Build the block tree of `img`.
///
/// The returned root is always a [`Block::Parent`] covering the whole image.
pub fn build_tree(img: &Image, desc: &BlockTreeDesc) -> Result<Block> {
    let mut pool = BlockPool::default();
    build_tree_with_pool(img, desc, &mut pool)
}

/// Like [`build_tree`], reusing the buffers in `pool`.
pub fn build_tree_with_pool(img: &Image, desc: &BlockTreeDesc, pool: &mut BlockPool) -> Result<Block> {
    let root = BlockDim::full(img.width(), img.height());

    let children = subdivide(root, desc.max_depth, 0)?
        .map(|region| build_block(img, desc, pool, region, 0))
        .collect::<Result<Vec<_>>>()?;

    trace!(
        "built {}x{} block tree (depth {}, threshold {}) with {} top level blocks",
        root.w,
        root.h,
        desc.max_depth,
        desc.variation_threshold,
        children.len()
    );

    Ok(Block::parent(root, children))
}

/// Build the block tree of `img`, building the top level blocks in parallel.
///
/// The result is identical to [`build_tree`].
pub fn build_tree_parallel(img: &Image, desc: &BlockTreeDesc) -> Result<Block> {
    let root = BlockDim::full(img.width(), img.height());
    let regions: Vec<BlockDim> = subdivide(root, desc.max_depth, 0)?.collect();

    let children = regions
        .into_par_iter()
        .map_init(BlockPool::default, |pool, region| {
            build_block(img, desc, pool, region, 0)
        })
        .collect::<Result<Vec<_>>>()?;

    trace!(
        "built {}x{} block tree in parallel (depth {}, threshold {}) with {} top level blocks",
        root.w,
        root.h,
        desc.max_depth,
        desc.variation_threshold,
        children.len()
    );

    Ok(Block::parent(root, children))
}

fn build_block(
    img: &Image,
    desc: &BlockTreeDesc,
    pool: &mut BlockPool,
    region: BlockDim,
    depth: u8,
) -> Result<Block> {
    if region.is_pixel() {
        return Ok(Block::color(region, img.get(region.x, region.y)));
    }

    let mut children = pool.take();
    let mut has_parent = false;
    for sub_region in subdivide(region, desc.max_depth, depth + 1)? {
        let child = build_block(img, desc, pool, sub_region, depth + 1)?;
        has_parent |= child.is_parent();
        children.push(child);
    }

    if has_parent {
        return Ok(Block::parent(region, children));
    }

    let metrics = BlockMetrics::from_children(&children);
    if metrics.variation > desc.variation_threshold {
        return Ok(Block::parent(region, children));
    }

    pool.give(children);
    Ok(Block::color(region, metrics.mean))
}
