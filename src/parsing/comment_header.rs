//! Comment header parser.
//!
//! Comments appear stand-alone or nested in archive and file blocks. The
//! size field is the total size: 13 fixed bytes plus the packed comment.

use super::block_header::{BaseFlags, SizePrologue};
use super::{BlockBody, BlockContext, Parsed, Payload};
use crate::error::Result;
use crate::formats::{CompressionMethod, RequiredVersion};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentBlock {
    pub flags: BaseFlags,
    /// Comment header size plus packed comment size.
    pub total_size: u16,
    pub added_size: Option<u32>,
    pub uncompressed_size: u16,
    pub version: RequiredVersion,
    pub method: CompressionMethod,
    pub comment_crc: u16,
    /// Packed comment bytes.
    pub data: Payload,
}

pub struct CommentHeaderParser;

impl CommentHeaderParser {
    pub const HEADER_SIZE: u64 = 13;

    pub(crate) fn parse(ctx: &mut BlockContext<'_>) -> Result<Parsed> {
        let prologue = SizePrologue::read(&mut ctx.acct, &mut *ctx.cursor, Self::HEADER_SIZE)?;
        let cursor = &mut *ctx.cursor;
        let acct = &mut ctx.acct;
        let uncompressed_size = acct.u16(cursor)?;
        let version = RequiredVersion(acct.u8(cursor)?);
        let method = CompressionMethod::from_u8(acct.u8(cursor)?);
        let comment_crc = acct.u16(cursor)?;
        let data = ctx.trailing_payload()?;

        Ok(Parsed {
            has_extended_size: prologue.flags.has_extended_size,
            is_ignorable: prologue.flags.is_ignorable,
            body: BlockBody::Comment(CommentBlock {
                flags: prologue.flags,
                total_size: prologue.head_size,
                added_size: prologue.added_size,
                uncompressed_size,
                version,
                method,
                comment_crc,
                data,
            }),
        })
    }
}
