//! Terminator header parser.
//!
//! The end-of-archive block (`0x7B`) carries only the common prologue.
//! Archives may omit it, so the decoder never relies on it to stop.

use super::block_header::{BaseFlags, SizePrologue};
use super::{BlockBody, BlockContext, Parsed};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndBlock {
    pub flags: BaseFlags,
    pub head_size: u16,
    /// Header bytes beyond the prologue (archive-end extensions).
    pub extra: Vec<u8>,
}

pub struct TerminatorHeaderParser;

impl TerminatorHeaderParser {
    pub const HEADER_SIZE: u64 = 7;

    pub(crate) fn parse(ctx: &mut BlockContext<'_>) -> Result<Parsed> {
        let prologue =
            SizePrologue::read_unextended(&mut ctx.acct, &mut *ctx.cursor, Self::HEADER_SIZE)?;
        let extra = ctx.trailing_bytes()?;
        Ok(Parsed {
            has_extended_size: prologue.flags.has_extended_size,
            is_ignorable: prologue.flags.is_ignorable,
            body: BlockBody::End(EndBlock {
                flags: prologue.flags,
                head_size: prologue.head_size,
                extra,
            }),
        })
    }
}
