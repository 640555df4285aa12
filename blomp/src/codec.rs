//! Conversion between block trees and bit streams.
//!
//! A tree is written depth first. Every block starts with one bit: `1` for
//! a parent, followed by its children in row-major order, or `0` for a
//! color block, followed by its quantized color as three bytes (R, G, B).
//! Nothing else is stored; block sizes are recomputed from the image size
//! and maximum depth in the [`FileHeader`].

use crate::{
    bitstream::BitStream,
    block::Block,
    error::{Corruption, Error, Result},
    geometry::{subdivide, BlockDim},
    header::FileHeader,
    pixel::Pixel,
};

/// Bits taken by the file header.
pub const HEADER_BITS: u64 = FileHeader::LEN as u64 * 8;

/// Bits taken by the bit count in front of the tree.
pub const LENGTH_PREFIX_BITS: u64 = 64;

/// Serialize a tree into a new bit stream.
pub fn serialize(tree: &Block) -> Result<BitStream> {
    let mut stream = BitStream::with_capacity(tree_bits(tree));
    tree.serialize(&mut stream)?;
    Ok(stream)
}

/// Rebuild a tree from `stream`, reading from its current read position.
pub fn deserialize(header: &FileHeader, stream: &mut BitStream) -> Result<Block> {
    if !read_bit(stream)? {
        return Err(Corruption::RootNotParent.into());
    }

    let root = BlockDim::full(header.width, header.height);
    let children = subdivide(root, header.max_depth, 0)?
        .map(|region| decode_block(stream, header.max_depth, region, 0))
        .collect::<Result<Vec<_>>>()?;

    Ok(Block::parent(root, children))
}

fn decode_block(stream: &mut BitStream, max_depth: u8, region: BlockDim, depth: u8) -> Result<Block> {
    if !read_bit(stream)? {
        let mut rgb = [0u8; 3];
        stream.read_bits(&mut rgb, 24, 0).map_err(exhausted)?;
        return Ok(Block::color(region, Pixel::from_bytes(rgb)));
    }

    if region.is_pixel() || depth >= max_depth {
        return Err(Corruption::InvalidSubdivision.into());
    }

    let children = subdivide(region, max_depth, depth + 1)?
        .map(|sub_region| decode_block(stream, max_depth, sub_region, depth + 1))
        .collect::<Result<Vec<_>>>()?;

    Ok(Block::parent(region, children))
}

fn read_bit(stream: &mut BitStream) -> Result<bool> {
    stream.read_bit().map_err(exhausted)
}

/// Running out of bits while decoding means the data was cut short.
fn exhausted(err: Error) -> Error {
    match err {
        Error::OutOfBounds { .. } => Corruption::Truncated.into(),
        other => other,
    }
}

/// Number of bits the serialized tree takes.
pub fn tree_bits(tree: &Block) -> u64 {
    tree.node_count() + tree.leaf_count() * 24
}

/// Size in bytes of the file `tree` would be saved as, without actually
/// serializing it.
pub fn estimated_size(tree: &Block) -> u64 {
    (HEADER_BITS + LENGTH_PREFIX_BITS + tree_bits(tree)).div_ceil(8)
}
