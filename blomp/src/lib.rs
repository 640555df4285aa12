//! Blomp (**Bl**ock c**omp**ression) is a lossy image format. An image is
//! split into a tree of square blocks, and every region whose colors are
//! close enough is merged into a single solid block. Only the shape of the
//! tree and the colors of its leaves are stored.
//!
//! How much detail survives is controlled by a [`BlockTreeDesc`]: the
//! maximum depth sets the size of the largest blocks, and the variation
//! threshold sets how different colors may be before a region is kept
//! split.
//!
//! This format is mostly for experimentation. There are no guarantees about
//! stability, breaking changes, or features.
//!
//! # Example
//! ## Encoding an image
//! ```no_run
//! use blomp::{BlompPicture, BlockTreeDesc, Image, Pixel};
//!
//! // A 2×2 image with one bright pixel
//! let mut image = Image::new(2, 2);
//! image.set(1, 1, Pixel::new(1.0, 0.9, 0.2));
//!
//! // Build the block tree. Nothing is written at this point.
//! let desc = BlockTreeDesc::new(4, 0.02).expect("Invalid parameters");
//! let picture = BlompPicture::from_image(&image, &desc).expect("Could not build tree");
//!
//! // Write it out to a file. This serializes the tree.
//! picture.save("my_image.blp").expect("Could not save the image");
//! ```
//!
//! ## Reading a Blomp file
//! ```no_run
//! use std::fs::File;
//! use blomp::BlompPicture;
//!
//! // Load it directly with the `open` function...
//! let picture = blomp::open("my_image.blp").expect("Could not open file");
//! let image = picture.to_image().expect("Could not render the tree");
//!
//! // ...or from something implementing Read.
//! let input_file = File::open("my_image.blp").expect("Could not open image file");
//! let picture2 = BlompPicture::decode(&input_file);
//! ```

pub mod bitstream;
pub mod block;
pub mod builder;
pub mod codec;
pub mod compare;
pub mod error;
pub mod geometry;
pub mod header;
pub mod picture;
pub mod pixel;
pub mod raster;
pub mod search;

// ----------------------- //
// INLINED USEFUL FEATURES //
// ----------------------- //
#[doc(inline)]
pub use picture::BlompPicture;

#[doc(inline)]
pub use picture::{load_file, open, save_file};

#[doc(inline)]
pub use builder::{build_tree, build_tree_parallel, BlockTreeDesc};

#[doc(inline)]
pub use block::Block;

#[doc(inline)]
pub use error::{Corruption, Error, Result};

#[doc(inline)]
pub use raster::Image;

#[doc(inline)]
pub use pixel::Pixel;

#[doc(inline)]
pub use search::{search_depth_and_threshold, search_threshold, SearchTarget};
