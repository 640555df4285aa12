use std::io::{Read, Write};

use byteorder::{NativeEndian, ReadBytesExt, WriteBytesExt};

use crate::{
    error::{truncated_on_eof, Corruption, Error, Result},
    geometry::MAX_DEPTH,
};

/// A blomp file header. This must be included at the beginning of a valid
/// blomp file, and is followed by the bit stream holding the block tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    /// Identifier. Must be set to "BLMP".
    pub magic: [u8; 4],

    /// Width of the image in pixels.
    pub width: u32,

    /// Height of the image in pixels.
    pub height: u32,

    /// Maximum depth the block tree was built with. Needed to recover the
    /// block geometry when decoding.
    pub max_depth: u8,
}

impl Default for FileHeader {
    fn default() -> Self {
        Self {
            magic: Self::MAGIC,
            width: 0,
            height: 0,
            max_depth: 0,
        }
    }
}

impl FileHeader {
    pub const MAGIC: [u8; 4] = *b"BLMP";

    /// Size of the header in bytes.
    pub const LEN: usize = 16;

    pub fn new(width: u32, height: u32, max_depth: u8) -> Self {
        Self {
            width,
            height,
            max_depth,
            ..Default::default()
        }
    }

    /// Write the header, every field after the magic as a native endian
    /// `i32`. Returns the number of bytes written.
    pub fn write_into<T: WriteBytesExt + Write>(&self, output: &mut T) -> Result<usize> {
        let width = to_field(self.width, "width")?;
        let height = to_field(self.height, "height")?;

        output.write_all(&self.magic)?;
        output.write_i32::<NativeEndian>(width)?;
        output.write_i32::<NativeEndian>(height)?;
        output.write_i32::<NativeEndian>(self.max_depth as i32)?;

        Ok(Self::LEN)
    }

    pub fn read_from<T: Read + ReadBytesExt>(input: &mut T) -> Result<Self> {
        let mut magic = [0u8; 4];
        input.read_exact(&mut magic).map_err(truncated_on_eof)?;

        if magic != Self::MAGIC {
            return Err(Corruption::InvalidIdentifier(magic).into());
        }

        let width = input.read_i32::<NativeEndian>().map_err(truncated_on_eof)?;
        let height = input.read_i32::<NativeEndian>().map_err(truncated_on_eof)?;
        let max_depth = input.read_i32::<NativeEndian>().map_err(truncated_on_eof)?;

        Ok(Self {
            magic,
            width: u32::try_from(width).map_err(|_| Corruption::InvalidHeader("width"))?,
            height: u32::try_from(height).map_err(|_| Corruption::InvalidHeader("height"))?,
            max_depth: u8::try_from(max_depth)
                .ok()
                .filter(|d| *d <= MAX_DEPTH)
                .ok_or(Corruption::InvalidHeader("max_depth"))?,
        })
    }
}

fn to_field(value: u32, name: &str) -> Result<i32> {
    i32::try_from(value)
        .map_err(|_| Error::InvalidDescriptor(format!("image {name} {value} does not fit in the header")))
}
