//! Prologue shared by every block.
//!
//! Each block opens with a 2-byte CRC and a 1-byte type tag. Most variants
//! follow that with the same 16-bit flag word and 16-bit header size:
//!
//! ```text
//! bits 0-7   unused
//! bit  8     has extended size (a 32-bit ADD_SIZE follows the size field)
//! bit  9     ignorable by old versions when copying
//! bits 10-15 unused
//! ```

use super::accountant::SizeAccountant;
use crate::cursor::ByteCursor;
use crate::error::Result;
use crate::formats::BlockType;

/// The CRC and type tag that open every block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    /// Byte offset of the block in the stream.
    pub offset: u64,
    pub crc16: u16,
    pub block_type: BlockType,
}

impl BlockHeader {
    /// Size of the CRC plus type tag.
    pub const SIZE: u64 = 3;

    pub fn read(acct: &mut SizeAccountant, cursor: &mut dyn ByteCursor) -> Result<Self> {
        let crc16 = acct.u16(cursor)?;
        let block_type = BlockType::from_u8(acct.u8(cursor)?);
        Ok(Self {
            offset: acct.offset(),
            crc16,
            block_type,
        })
    }
}

/// The common 16-bit flag word.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BaseFlags {
    pub low_bits: u8,
    pub has_extended_size: bool,
    pub is_ignorable: bool,
    pub high_bits: u8,
}

impl BaseFlags {
    pub fn read(acct: &mut SizeAccountant, cursor: &mut dyn ByteCursor) -> Result<Self> {
        Ok(Self {
            low_bits: acct.bits(cursor, 8)? as u8,
            has_extended_size: acct.bit(cursor)?,
            is_ignorable: acct.bit(cursor)?,
            high_bits: acct.bits(cursor, 6)? as u8,
        })
    }

    /// The flag word as stored on disk.
    pub fn raw(&self) -> u16 {
        self.low_bits as u16
            | (self.has_extended_size as u16) << 8
            | (self.is_ignorable as u16) << 9
            | ((self.high_bits & 0x3f) as u16) << 10
    }
}

/// Flag word, header size and optional size extension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SizePrologue {
    pub flags: BaseFlags,
    pub head_size: u16,
    pub added_size: Option<u32>,
}

impl SizePrologue {
    /// Prologue width without the extension, counting CRC and type.
    pub const SIZE: u64 = 7;

    /// Read flags and size, honouring the extended-size bit.
    ///
    /// Declares the effective size on `acct` and checks it against
    /// `minimum` (plus 4 when the extension is present).
    pub fn read(
        acct: &mut SizeAccountant,
        cursor: &mut dyn ByteCursor,
        minimum: u64,
    ) -> Result<Self> {
        Self::read_inner(acct, cursor, minimum, true)
    }

    /// Read flags and size for blocks that never carry an extension.
    pub fn read_unextended(
        acct: &mut SizeAccountant,
        cursor: &mut dyn ByteCursor,
        minimum: u64,
    ) -> Result<Self> {
        Self::read_inner(acct, cursor, minimum, false)
    }

    fn read_inner(
        acct: &mut SizeAccountant,
        cursor: &mut dyn ByteCursor,
        minimum: u64,
        extendable: bool,
    ) -> Result<Self> {
        let flags = BaseFlags::read(acct, cursor)?;
        let head_size = acct.u16(cursor)?;
        let added_size = if extendable && flags.has_extended_size {
            Some(acct.u32(cursor)?)
        } else {
            None
        };

        let prologue = Self {
            flags,
            head_size,
            added_size,
        };
        acct.declare(prologue.declared_size());
        acct.require_minimum(minimum + if added_size.is_some() { 4 } else { 0 })?;
        Ok(prologue)
    }

    /// Header size with the extension summed in.
    pub fn declared_size(&self) -> u64 {
        self.head_size as u64 + self.added_size.unwrap_or(0) as u64
    }
}
