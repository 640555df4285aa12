//! Functions and other utilities surrounding the [`BlompPicture`] type.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use byteorder::{ReadBytesExt, WriteBytesExt};

use crate::{
    bitstream::BitStream,
    block::Block,
    builder::{build_tree_parallel, BlockTreeDesc},
    codec::{deserialize, estimated_size, serialize},
    error::{Error, Result},
    geometry::MAX_DEPTH,
    header::FileHeader,
    raster::Image,
};

/// Largest number of pixels [`BlompPicture::to_image`] and
/// [`BlompPicture::heatmap`] will render. Headers may declare far larger
/// images than their tree needs, so this is checked before allocating.
pub const MAX_RENDER_PIXELS: u64 = 1 << 28;

/// The basic Blomp picture: a header and the block tree it describes.
#[derive(Debug, Clone, PartialEq)]
pub struct BlompPicture {
    header: FileHeader,
    tree: Block,
}

impl BlompPicture {
    /// Build the block tree for `img`. Nothing is serialized at this point.
    pub fn from_image(img: &Image, desc: &BlockTreeDesc) -> Result<Self> {
        let tree = build_tree_parallel(img, desc)?;

        Ok(Self {
            header: FileHeader::new(img.width(), img.height(), desc.max_depth),
            tree,
        })
    }

    /// Wrap an already built tree. The root must be a parent block covering
    /// the whole image.
    pub fn from_tree(tree: Block, max_depth: u8) -> Result<Self> {
        if !tree.is_parent() {
            return Err(Error::InvalidDescriptor("root block must be a parent block".into()));
        }

        if max_depth > MAX_DEPTH {
            return Err(Error::InvalidDescriptor(format!(
                "max depth {max_depth} is not in 0..={MAX_DEPTH}"
            )));
        }

        let dim = tree.dim();
        if dim.x != 0 || dim.y != 0 {
            return Err(Error::InvalidDescriptor(format!(
                "root block starts at {},{} instead of the origin",
                dim.x, dim.y
            )));
        }

        Ok(Self {
            header: FileHeader::new(dim.w, dim.h, max_depth),
            tree,
        })
    }

    /// Encode the picture into anything that implements [`Write`]. Returns
    /// the number of bytes written.
    pub fn encode<O: Write + WriteBytesExt>(&self, mut output: O) -> Result<usize> {
        let mut count = self.header.write_into(&mut output)?;

        let stream = serialize(&self.tree)?;
        count += stream.write_into(&mut output)?;

        Ok(count)
    }

    /// Decode a picture from anything that implements [`Read`].
    pub fn decode<I: Read + ReadBytesExt>(mut input: I) -> Result<Self> {
        let header = FileHeader::read_from(&mut input)?;
        let mut stream = BitStream::read_from(&mut input)?;
        let tree = deserialize(&header, &mut stream)?;

        Ok(Self { header, tree })
    }

    /// Encode and write the picture out to a file.
    pub fn save<P: ?Sized + AsRef<Path>>(&self, path: &P) -> Result<()> {
        let mut out_file = BufWriter::new(File::create(path.as_ref())?);

        self.encode(&mut out_file)?;
        out_file.flush()?;

        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.header.width
    }

    pub fn height(&self) -> u32 {
        self.header.height
    }

    pub fn max_depth(&self) -> u8 {
        self.header.max_depth
    }

    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    pub fn tree(&self) -> &Block {
        &self.tree
    }

    pub fn into_tree(self) -> Block {
        self.tree
    }

    /// Size in bytes this picture takes once encoded.
    pub fn estimated_size(&self) -> u64 {
        estimated_size(&self.tree)
    }

    /// Render the tree back into an image.
    pub fn to_image(&self) -> Result<Image> {
        let mut img = self.canvas()?;
        self.tree.rasterize(&mut img)?;

        Ok(img)
    }

    /// Render the depth of every color block as a grayscale image.
    pub fn heatmap(&self) -> Result<Image> {
        let mut img = self.canvas()?;
        self.tree.write_heatmap(&mut img, self.max_depth())?;

        Ok(img)
    }

    fn canvas(&self) -> Result<Image> {
        let (width, height) = (self.width(), self.height());
        if width as u64 * height as u64 > MAX_RENDER_PIXELS {
            return Err(Error::TooLarge {
                width,
                height,
                limit: MAX_RENDER_PIXELS,
            });
        }

        Ok(Image::new(width, height))
    }
}

/// Open a file and decode it as a Blomp picture.
pub fn open<P: ?Sized + AsRef<Path>>(path: &P) -> Result<BlompPicture> {
    let input = File::open(path.as_ref())?;

    BlompPicture::decode(BufReader::new(input))
}

/// Load a file, returning its header and block tree.
pub fn load_file<P: ?Sized + AsRef<Path>>(path: &P) -> Result<(FileHeader, Block)> {
    let picture = open(path)?;

    Ok((picture.header, picture.tree))
}

/// Save a block tree built with `max_depth` to a file.
pub fn save_file<P: ?Sized + AsRef<Path>>(tree: &Block, max_depth: u8, path: &P) -> Result<()> {
    if !tree.is_parent() {
        return Err(Error::InvalidDescriptor("root block must be a parent block".into()));
    }

    let dim = tree.dim();
    let header = FileHeader::new(dim.w, dim.h, max_depth);

    let mut out_file = BufWriter::new(File::create(path.as_ref())?);
    header.write_into(&mut out_file)?;
    serialize(tree)?.write_into(&mut out_file)?;
    out_file.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::{error::Corruption, geometry::BlockDim, pixel::Pixel};

    fn stripes(width: u32, height: u32) -> Image {
        let mut img = Image::new(width, height);
        for y in 0..height {
            for x in 0..width {
                let v = ((x + 2 * y) % 5) as f32 / 4.0;
                img.set(x, y, Pixel::new(v, 1.0 - v, 0.5));
            }
        }
        img
    }

    #[test]
    fn encoded_size_matches_estimate() {
        for (width, height, max_depth) in [(17, 9, 3), (64, 64, 6), (1, 1, 0), (3, 30, 10)] {
            let desc = BlockTreeDesc::new(max_depth, 0.01).unwrap();
            let picture = BlompPicture::from_image(&stripes(width, height), &desc).unwrap();

            let mut buf = Vec::new();
            let written = picture.encode(&mut buf).unwrap();

            assert_eq!(written, buf.len());
            assert_eq!(buf.len() as u64, picture.estimated_size());
        }
    }

    #[test]
    fn decode_encoded() {
        let desc = BlockTreeDesc::new(4, 0.0).unwrap();
        let img = stripes(21, 13);
        let picture = BlompPicture::from_image(&img, &desc).unwrap();

        let mut buf = Vec::new();
        picture.encode(&mut buf).unwrap();
        let decoded = BlompPicture::decode(Cursor::new(buf)).unwrap();

        assert_eq!(decoded.header(), picture.header());
        assert_eq!(decoded.max_depth(), 4);

        // A zero threshold keeps every quantized color
        assert_eq!(decoded.to_image().unwrap().to_rgb8(), img.to_rgb8());
    }

    #[test]
    fn trailing_garbage_is_ignored() {
        let picture = BlompPicture::from_image(&stripes(4, 4), &BlockTreeDesc::default()).unwrap();
        let mut buf = Vec::new();
        picture.encode(&mut buf).unwrap();
        buf.extend_from_slice(b"garbage");

        let decoded = BlompPicture::decode(Cursor::new(buf)).unwrap();
        assert_eq!(
            decoded.to_image().unwrap().to_rgb8(),
            picture.to_image().unwrap().to_rgb8()
        );
    }

    #[test]
    fn cut_off_file() {
        let picture = BlompPicture::from_image(&stripes(8, 8), &BlockTreeDesc::default()).unwrap();
        let mut buf = Vec::new();
        picture.encode(&mut buf).unwrap();
        buf.truncate(buf.len() - 2);

        let err = BlompPicture::decode(Cursor::new(buf)).unwrap_err();
        assert!(matches!(err, Error::CorruptData(Corruption::Truncated)));
    }

    #[test]
    fn heatmap_levels() {
        let img = Image::filled(8, 8, Pixel::splat(0.25));
        let desc = BlockTreeDesc::new(3, 0.0).unwrap();
        let heat = BlompPicture::from_image(&img, &desc).unwrap().heatmap().unwrap();

        // A single depth 0 block covers everything
        assert!(heat.pixels().iter().all(|p| *p == Pixel::splat(0.25)));
    }

    #[test]
    fn from_tree_checks_root() {
        let leaf = Block::color(BlockDim::full(2, 2), Pixel::WHITE);
        assert!(BlompPicture::from_tree(leaf.clone(), 2).is_err());

        let root = Block::parent(BlockDim::full(2, 2), vec![leaf]);
        assert!(BlompPicture::from_tree(root.clone(), 11).is_err());

        let picture = BlompPicture::from_tree(root, 2).unwrap();
        assert_eq!((picture.width(), picture.height()), (2, 2));
    }

    #[test]
    fn huge_declared_size_is_not_rendered() {
        let root = BlockDim::full(65536, 65536);
        let children = crate::geometry::subdivide(root, 10, 0)
            .unwrap()
            .map(|region| Block::color(region, Pixel::WHITE))
            .collect::<Vec<_>>();
        assert_eq!(children.len(), 4096);

        let picture = BlompPicture::from_tree(Block::parent(root, children), 10).unwrap();
        let mut buf = Vec::new();
        picture.encode(&mut buf).unwrap();

        // Small file, decodes fine
        assert!(buf.len() < 16 * 1024);
        let decoded = BlompPicture::decode(Cursor::new(buf)).unwrap();
        assert_eq!(decoded.tree().leaf_count(), 4096);

        assert!(matches!(
            decoded.to_image().unwrap_err(),
            Error::TooLarge { width: 65536, height: 65536, limit: MAX_RENDER_PIXELS }
        ));
        assert!(matches!(decoded.heatmap().unwrap_err(), Error::TooLarge { .. }));
    }
}
