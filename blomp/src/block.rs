use crate::{
    bitstream::BitStream,
    error::{Error, Result},
    geometry::BlockDim,
    pixel::Pixel,
    raster::Image,
};

/// One node of a block tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// A region filled with a single color.
    Color(ColorBlock),

    /// A region split into child blocks, stored row-major.
    Parent(ParentBlock),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorBlock {
    pub dim: BlockDim,
    pub color: Pixel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParentBlock {
    pub dim: BlockDim,
    pub children: Vec<Block>,
}

impl Block {
    pub fn color(dim: BlockDim, color: Pixel) -> Self {
        Block::Color(ColorBlock { dim, color })
    }

    pub fn parent(dim: BlockDim, children: Vec<Block>) -> Self {
        Block::Parent(ParentBlock { dim, children })
    }

    pub fn dim(&self) -> BlockDim {
        match self {
            Block::Color(b) => b.dim,
            Block::Parent(b) => b.dim,
        }
    }

    pub fn is_parent(&self) -> bool {
        matches!(self, Block::Parent(_))
    }

    /// The fill color of a color block, `None` for parents.
    pub fn fill(&self) -> Option<Pixel> {
        match self {
            Block::Color(b) => Some(b.color),
            Block::Parent(_) => None,
        }
    }

    /// Child blocks, empty for color blocks.
    pub fn children(&self) -> &[Block] {
        match self {
            Block::Color(_) => &[],
            Block::Parent(b) => &b.children,
        }
    }

    /// Total number of blocks in this subtree, including itself.
    pub fn node_count(&self) -> u64 {
        match self {
            Block::Color(_) => 1,
            Block::Parent(b) => 1 + b.children.iter().map(Block::node_count).sum::<u64>(),
        }
    }

    /// Number of color blocks in this subtree.
    pub fn leaf_count(&self) -> u64 {
        match self {
            Block::Color(_) => 1,
            Block::Parent(b) => b.children.iter().map(Block::leaf_count).sum(),
        }
    }

    /// Paint every color block into `img`.
    pub fn rasterize(&self, img: &mut Image) -> Result<()> {
        match self {
            Block::Color(b) => fill_rect(img, b.dim, b.color),
            Block::Parent(b) => b.children.iter().try_for_each(|c| c.rasterize(img)),
        }
    }

    /// Paint every color block grey, brighter the deeper it sits in the
    /// tree. `self` is treated as the root, so its children are at depth 0.
    pub fn write_heatmap(&self, img: &mut Image, max_depth: u8) -> Result<()> {
        match self {
            Block::Color(_) => self.heatmap_at(img, max_depth, 0),
            Block::Parent(b) => b
                .children
                .iter()
                .try_for_each(|c| c.heatmap_at(img, max_depth, 0)),
        }
    }

    fn heatmap_at(&self, img: &mut Image, max_depth: u8, depth: u32) -> Result<()> {
        match self {
            Block::Color(b) => fill_rect(img, b.dim, heat_color(max_depth, depth)),
            Block::Parent(b) => b
                .children
                .iter()
                .try_for_each(|c| c.heatmap_at(img, max_depth, depth + 1)),
        }
    }

    /// Append this subtree to `stream` in depth-first order: a `1` bit for
    /// a parent followed by its children, or a `0` bit and 24 bits of color.
    pub fn serialize(&self, stream: &mut BitStream) -> Result<()> {
        match self {
            Block::Color(b) => {
                stream.write_bit(false);
                stream.write_bits(&b.color.to_bytes(), 24, 0)
            }
            Block::Parent(b) => {
                stream.write_bit(true);
                b.children.iter().try_for_each(|c| c.serialize(stream))
            }
        }
    }
}

fn heat_color(max_depth: u8, depth: u32) -> Pixel {
    let intensity = (depth + 1) as f32 / (max_depth as u32 + 1) as f32;
    Pixel::splat(intensity.min(1.0))
}

fn fill_rect(img: &mut Image, dim: BlockDim, color: Pixel) -> Result<()> {
    if !dim.fits_in(img.width(), img.height()) {
        return Err(Error::DimensionMismatch {
            expected: (dim.right(), dim.bottom()),
            found: img.dimensions(),
        });
    }

    for y in dim.y..dim.bottom() {
        for x in dim.x..dim.right() {
            img.set(x, y, color);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Pixel = Pixel::new(1.0, 0.0, 0.0);
    const BLUE: Pixel = Pixel::new(0.0, 0.0, 1.0);

    /// 2×2 image: a parent with a red left column and a blue pixel
    /// bottom right.
    fn sample_tree() -> Block {
        Block::parent(
            BlockDim::full(2, 2),
            vec![Block::parent(
                BlockDim::full(2, 2),
                vec![
                    Block::color(BlockDim::new(0, 0, 1, 1), RED),
                    Block::color(BlockDim::new(1, 0, 1, 1), Pixel::WHITE),
                    Block::color(BlockDim::new(0, 1, 1, 1), RED),
                    Block::color(BlockDim::new(1, 1, 1, 1), BLUE),
                ],
            )],
        )
    }

    #[test]
    fn counts() {
        let tree = sample_tree();
        assert_eq!(tree.node_count(), 6);
        assert_eq!(tree.leaf_count(), 4);

        let leaf = Block::color(BlockDim::full(3, 3), RED);
        assert_eq!(leaf.node_count(), 1);
        assert_eq!(leaf.leaf_count(), 1);
    }

    #[test]
    fn rasterize_fills_regions() {
        let mut img = Image::new(2, 2);
        sample_tree().rasterize(&mut img).unwrap();

        assert_eq!(img.get(0, 0), RED);
        assert_eq!(img.get(1, 0), Pixel::WHITE);
        assert_eq!(img.get(0, 1), RED);
        assert_eq!(img.get(1, 1), BLUE);
    }

    #[test]
    fn rasterize_into_small_image() {
        let mut img = Image::new(1, 2);
        let err = sample_tree().rasterize(&mut img).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { .. }));
    }

    #[test]
    fn heatmap_by_depth() {
        let tree = Block::parent(
            BlockDim::full(3, 2),
            vec![
                Block::color(BlockDim::new(0, 0, 2, 2), RED),
                Block::parent(
                    BlockDim::new(2, 0, 1, 2),
                    vec![
                        Block::color(BlockDim::new(2, 0, 1, 1), RED),
                        Block::color(BlockDim::new(2, 1, 1, 1), RED),
                    ],
                ),
            ],
        );

        let mut img = Image::new(3, 2);
        tree.write_heatmap(&mut img, 3).unwrap();

        assert_eq!(img.get(0, 0), Pixel::splat(0.25));
        assert_eq!(img.get(1, 1), Pixel::splat(0.25));
        assert_eq!(img.get(2, 0), Pixel::splat(0.5));
        assert_eq!(img.get(2, 1), Pixel::splat(0.5));
    }

    #[test]
    fn heatmap_with_zero_depth() {
        let tree = Block::parent(
            BlockDim::full(1, 1),
            vec![Block::color(BlockDim::full(1, 1), RED)],
        );

        let mut img = Image::new(1, 1);
        tree.write_heatmap(&mut img, 0).unwrap();
        assert_eq!(img.get(0, 0), Pixel::WHITE);
    }

    #[test]
    fn serialized_layout() {
        let mut stream = BitStream::new();
        sample_tree().serialize(&mut stream).unwrap();

        // Two parent bits, then four leaves of 1 + 24 bits
        assert_eq!(stream.len(), 2 + 4 * 25);

        assert!(stream.read_bit().unwrap());
        assert!(stream.read_bit().unwrap());
        assert!(!stream.read_bit().unwrap());

        let mut rgb = [0u8; 3];
        stream.read_bits(&mut rgb, 24, 0).unwrap();
        assert_eq!(rgb, [255, 0, 0]);
    }
}
