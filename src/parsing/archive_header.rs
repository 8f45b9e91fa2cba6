//! Archive header parser.
//!
//! The archive header follows the marker block and carries archive-level
//! flags, two reserved words and an optional nested comment block.

use super::{Block, BlockBody, BlockContext, Parsed};
use crate::error::Result;

/// Archive flag word: six named bits then ten reserved ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchiveFlags {
    pub is_volume: bool,
    pub has_comment: bool,
    pub is_locked: bool,
    pub is_solid: bool,
    pub unused: bool,
    pub has_authenticity_info: bool,
    /// Bits 6-15, reserved for internal use.
    pub internal: u16,
}

impl ArchiveFlags {
    pub fn raw(&self) -> u16 {
        self.is_volume as u16
            | (self.has_comment as u16) << 1
            | (self.is_locked as u16) << 2
            | (self.is_solid as u16) << 3
            | (self.unused as u16) << 4
            | (self.has_authenticity_info as u16) << 5
            | (self.internal & 0x3ff) << 6
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveBlock {
    pub flags: ArchiveFlags,
    pub head_size: u16,
    pub reserved1: u16,
    pub reserved2: u32,
    /// Header bytes past the reserved words.
    pub extra: Vec<u8>,
    /// Archive comment, present when `flags.has_comment` is set.
    pub comment: Option<Box<Block>>,
}

pub struct ArchiveHeaderParser;

impl ArchiveHeaderParser {
    pub const HEADER_SIZE: u64 = 13;

    pub(crate) fn parse(ctx: &mut BlockContext<'_>) -> Result<Parsed> {
        let cursor = &mut *ctx.cursor;
        let acct = &mut ctx.acct;

        let flags = ArchiveFlags {
            is_volume: acct.bit(cursor)?,
            has_comment: acct.bit(cursor)?,
            is_locked: acct.bit(cursor)?,
            is_solid: acct.bit(cursor)?,
            unused: acct.bit(cursor)?,
            has_authenticity_info: acct.bit(cursor)?,
            internal: acct.bits(cursor, 10)? as u16,
        };
        let head_size = acct.u16(cursor)?;
        acct.declare(head_size as u64);
        acct.require_minimum(Self::HEADER_SIZE)?;
        let reserved1 = acct.u16(cursor)?;
        let reserved2 = acct.u32(cursor)?;

        let extra = ctx.trailing_bytes()?;
        let comment = if flags.has_comment {
            ctx.nested_comment()?
        } else {
            None
        };

        Ok(Parsed {
            has_extended_size: false,
            is_ignorable: false,
            body: BlockBody::Archive(ArchiveBlock {
                flags,
                head_size,
                reserved1,
                reserved2,
                extra,
                comment,
            }),
        })
    }
}
