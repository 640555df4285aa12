use std::io::{Read, Write};

use byteorder::{NativeEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{truncated_on_eof, Corruption, Error, Result};

/// A growable sequence of bits with independent read and write cursors.
///
/// Bits are packed least significant bit first, so bit `i` of the stream is
/// bit `i % 8` of byte `i / 8`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitStream {
    data: Vec<u8>,

    len: u64,

    read_offset: u64,
    write_offset: u64,
}

impl BitStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty stream with room for at least `bits` bits.
    pub fn with_capacity(bits: u64) -> Self {
        Self {
            data: vec![0; min_bytes(bits)],
            ..Default::default()
        }
    }

    /// Number of valid bits in the stream
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of bits the stream can hold before it has to grow
    pub fn capacity(&self) -> u64 {
        self.data.len() as u64 * 8
    }

    pub fn read_position(&self) -> u64 {
        self.read_offset
    }

    pub fn write_position(&self) -> u64 {
        self.write_offset
    }

    /// The packed bytes backing the valid bits of the stream.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..min_bytes(self.len)]
    }

    /// Empty the stream and move both cursors back to the start.
    pub fn reset(&mut self) {
        self.data.clear();
        self.len = 0;
        self.read_offset = 0;
        self.write_offset = 0;
    }

    /// Write a single bit at the write cursor, growing the stream if needed.
    pub fn write_bit(&mut self, value: bool) {
        let position = self.write_offset;
        self.write_offset += 1;

        if self.write_offset > self.capacity() {
            self.reserve(self.write_offset);
        }
        self.len = self.len.max(self.write_offset);

        let (byte, bit) = split_offset(position);
        if value {
            self.data[byte] |= 1 << bit;
        } else {
            self.data[byte] &= !(1 << bit);
        }
    }

    /// Read the bit under the read cursor.
    pub fn read_bit(&mut self) -> Result<bool> {
        if self.read_offset >= self.len {
            return Err(Error::OutOfBounds {
                position: self.read_offset,
                len: self.len,
            });
        }

        let (byte, bit) = split_offset(self.read_offset);
        self.read_offset += 1;

        Ok((self.data[byte] >> bit) & 1 == 1)
    }

    /// Write `bit_len` bits from `src`, starting at bit `src_offset` of the
    /// source buffer.
    pub fn write_bits(&mut self, src: &[u8], bit_len: u64, src_offset: u64) -> Result<()> {
        check_buffer(src.len(), bit_len, src_offset)?;

        for i in src_offset..src_offset + bit_len {
            let (byte, bit) = split_offset(i);
            self.write_bit((src[byte] >> bit) & 1 == 1);
        }

        Ok(())
    }

    /// Read `bit_len` bits into `dest`, starting at bit `dest_offset` of
    /// the destination buffer. Nothing is read if the stream does not hold
    /// enough bits.
    pub fn read_bits(&mut self, dest: &mut [u8], bit_len: u64, dest_offset: u64) -> Result<()> {
        check_buffer(dest.len(), bit_len, dest_offset)?;

        if self.read_offset + bit_len > self.len {
            return Err(Error::OutOfBounds {
                position: self.read_offset + bit_len,
                len: self.len,
            });
        }

        for i in dest_offset..dest_offset + bit_len {
            let (byte, bit) = split_offset(i);
            if self.read_bit()? {
                dest[byte] |= 1 << bit;
            } else {
                dest[byte] &= !(1 << bit);
            }
        }

        Ok(())
    }

    /// Write the stream in its persisted form: a `u64` bit count followed
    /// by the packed bits. Returns the number of bytes written.
    pub fn write_into<T: WriteBytesExt + Write>(&self, output: &mut T) -> std::io::Result<usize> {
        output.write_u64::<NativeEndian>(self.len)?;

        let bytes = self.as_bytes();
        if let Some((last, body)) = bytes.split_last() {
            output.write_all(body)?;

            // Bits past the end are never meaningful, keep them zeroed
            let used = self.len % 8;
            let mask = if used == 0 { 0xFF } else { (1u8 << used) - 1 };
            output.write_u8(last & mask)?;
        }

        Ok(8 + bytes.len())
    }

    /// Read a stream written by [`BitStream::write_into`]. Both cursors
    /// start at zero.
    pub fn read_from<T: Read + ReadBytesExt>(input: &mut T) -> Result<Self> {
        let len = input.read_u64::<NativeEndian>().map_err(truncated_on_eof)?;
        let byte_len = min_bytes(len);

        let mut data = Vec::new();
        input.by_ref().take(byte_len as u64).read_to_end(&mut data)?;
        if data.len() != byte_len {
            return Err(Corruption::Truncated.into());
        }

        Ok(Self {
            data,
            len,
            read_offset: 0,
            write_offset: 0,
        })
    }

    fn reserve(&mut self, bits: u64) {
        let reserved = bits + bits / 2;
        self.data.resize(min_bytes(reserved), 0);
    }
}

/// Smallest number of bytes that can hold `bits` bits.
pub fn min_bytes(bits: u64) -> usize {
    bits.div_ceil(8) as usize
}

#[inline]
fn split_offset(offset: u64) -> (usize, u32) {
    ((offset / 8) as usize, (offset % 8) as u32)
}

fn check_buffer(byte_len: usize, bit_len: u64, offset: u64) -> Result<()> {
    let available = byte_len as u64 * 8;
    if offset + bit_len > available {
        return Err(Error::OutOfBounds {
            position: offset + bit_len,
            len: available,
        });
    }

    Ok(())
}
