//! Parser for blocks decoded as prologue plus opaque bytes.
//!
//! Extra info, subblocks, recovery records, authenticity blocks, new-format
//! subblocks and every unrecognised tag share this layout. Unknown tags are
//! not an error; their declared size is simply skipped over as data.

use super::block_header::{BaseFlags, SizePrologue};
use super::{BlockBody, BlockContext, Parsed, Payload};
use crate::error::Result;
use crate::formats::BlockType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpaqueBlock {
    pub flags: BaseFlags,
    pub head_size: u16,
    pub added_size: Option<u32>,
    /// Everything after the prologue, up to the declared size.
    pub data: Payload,
}

pub struct OpaqueHeaderParser;

impl OpaqueHeaderParser {
    pub const HEADER_SIZE: u64 = 7;

    pub(crate) fn parse(ctx: &mut BlockContext<'_>) -> Result<Parsed> {
        let prologue = SizePrologue::read(&mut ctx.acct, &mut *ctx.cursor, Self::HEADER_SIZE)?;
        let data = ctx.trailing_payload()?;
        let block = OpaqueBlock {
            flags: prologue.flags,
            head_size: prologue.head_size,
            added_size: prologue.added_size,
            data,
        };

        let body = match ctx.header.block_type {
            BlockType::ExtraInfo => BlockBody::ExtraInfo(block),
            BlockType::Subblock => BlockBody::Subblock(block),
            BlockType::Recovery => BlockBody::Recovery(block),
            BlockType::Signature => BlockBody::Signature(block),
            BlockType::NewSubblock => BlockBody::NewSubblock(block),
            _ => BlockBody::Unknown(block),
        };
        Ok(Parsed {
            has_extended_size: prologue.flags.has_extended_size,
            is_ignorable: prologue.flags.is_ignorable,
            body,
        })
    }
}
