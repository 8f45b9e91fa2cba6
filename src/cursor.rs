//! Bit-addressable cursor over the archive byte stream.
//!
//! Positions are in bits. Bits are consumed LSB first within each byte and
//! multi-byte integers are little-endian, which is how every RAR 1.5-4.x
//! header field is laid out.

use crate::error::{RarError, Result, StructuralFault};

/// Text decoding applied by [`ByteCursor::read_fixed_text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    /// One byte per code point (ISO-8859-1).
    #[default]
    Latin1,
    /// UTF-8, with invalid sequences replaced by U+FFFD.
    Utf8Lossy,
}

impl TextEncoding {
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            Self::Latin1 => bytes.iter().map(|&b| b as char).collect(),
            Self::Utf8Lossy => String::from_utf8_lossy(bytes).into_owned(),
        }
    }
}

/// Sequential, seekable reader the block decoder pulls fields from.
///
/// A read that would run past the end of the stream must fail with a
/// structural error and leave the position unchanged.
pub trait ByteCursor {
    /// Current position in bits.
    fn position(&self) -> u64;

    /// Total stream length in bits.
    fn len_bits(&self) -> u64;

    /// Move to an absolute bit offset (at most `len_bits()`).
    fn seek(&mut self, bit_offset: u64) -> Result<()>;

    /// Read `count` (<= 64) bits, LSB first.
    fn read_bits(&mut self, count: u32) -> Result<u64>;

    /// Read a little-endian unsigned integer of `width` (1, 2, 4 or 8) bytes.
    fn read_uint(&mut self, width: usize) -> Result<u64> {
        debug_assert!(matches!(width, 1 | 2 | 4 | 8));
        self.read_bits(width as u32 * 8)
    }

    /// Read exactly `len` bytes.
    fn read_bytes(&mut self, len: u64) -> Result<Vec<u8>>;

    /// Read `len` bytes and decode them as text.
    fn read_fixed_text(&mut self, len: u64, encoding: TextEncoding) -> Result<String> {
        Ok(encoding.decode(&self.read_bytes(len)?))
    }

    fn at_end(&self) -> bool {
        self.position() >= self.len_bits()
    }

    /// Whether at least `bits` bits remain after the current position.
    fn size_at_least(&self, bits: u64) -> bool {
        self.len_bits().saturating_sub(self.position()) >= bits
    }

    /// Current position in whole bytes (rounded down).
    fn byte_position(&self) -> u64 {
        self.position() / 8
    }

    fn len_bytes(&self) -> u64 {
        self.len_bits() / 8
    }
}

/// [`ByteCursor`] over an in-memory byte slice.
#[derive(Debug, Clone)]
pub struct SliceCursor<'a> {
    data: &'a [u8],
    bit_pos: u64,
}

impl<'a> SliceCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, bit_pos: 0 }
    }

    /// The bytes not yet consumed (from the current byte boundary).
    pub fn remaining_slice(&self) -> &'a [u8] {
        let start = (self.byte_position() as usize).min(self.data.len());
        &self.data[start..]
    }

    fn ensure(&self, bits: u64) -> Result<()> {
        if self.size_at_least(bits) {
            Ok(())
        } else {
            Err(RarError::structural(
                self.byte_position(),
                StructuralFault::UnexpectedEof {
                    needed: bits,
                    available: self.len_bits().saturating_sub(self.bit_pos),
                },
            ))
        }
    }
}

impl ByteCursor for SliceCursor<'_> {
    fn position(&self) -> u64 {
        self.bit_pos
    }

    fn len_bits(&self) -> u64 {
        self.data.len() as u64 * 8
    }

    fn seek(&mut self, bit_offset: u64) -> Result<()> {
        if bit_offset > self.len_bits() {
            return Err(RarError::structural(
                self.byte_position(),
                StructuralFault::UnexpectedEof {
                    needed: bit_offset - self.bit_pos.min(bit_offset),
                    available: self.len_bits().saturating_sub(self.bit_pos),
                },
            ));
        }
        self.bit_pos = bit_offset;
        Ok(())
    }

    fn read_bits(&mut self, count: u32) -> Result<u64> {
        debug_assert!(count <= 64);
        self.ensure(count as u64)?;

        let mut value = 0u64;
        let mut filled = 0u32;
        while filled < count {
            let byte = self.data[(self.bit_pos / 8) as usize];
            let shift = (self.bit_pos % 8) as u32;
            let take = (8 - shift).min(count - filled);
            let bits = (byte as u64 >> shift) & ((1u64 << take) - 1);
            value |= bits << filled;
            filled += take;
            self.bit_pos += take as u64;
        }
        Ok(value)
    }

    fn read_uint(&mut self, width: usize) -> Result<u64> {
        debug_assert!(matches!(width, 1 | 2 | 4 | 8));
        if self.bit_pos % 8 != 0 {
            return self.read_bits(width as u32 * 8);
        }
        self.ensure(width as u64 * 8)?;
        let start = self.byte_position() as usize;
        let mut buf = [0u8; 8];
        buf[..width].copy_from_slice(&self.data[start..start + width]);
        self.bit_pos += width as u64 * 8;
        Ok(u64::from_le_bytes(buf))
    }

    fn read_bytes(&mut self, len: u64) -> Result<Vec<u8>> {
        let bits = len.checked_mul(8).ok_or_else(|| {
            RarError::structural(
                self.byte_position(),
                StructuralFault::UnexpectedEof {
                    needed: u64::MAX,
                    available: self.len_bits().saturating_sub(self.bit_pos),
                },
            )
        })?;
        self.ensure(bits)?;
        if self.bit_pos % 8 != 0 {
            let mut out = Vec::with_capacity(len as usize);
            for _ in 0..len {
                out.push(self.read_bits(8)? as u8);
            }
            return Ok(out);
        }
        let start = self.byte_position() as usize;
        let end = start + len as usize;
        self.bit_pos += bits;
        Ok(self.data[start..end].to_vec())
    }
}
