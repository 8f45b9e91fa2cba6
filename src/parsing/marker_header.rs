//! Marker header parser - RAR signature.
//!
//! The marker block is the fixed 7-byte sequence
//! `0x52 0x61 0x72 0x21 0x1A 0x07 0x00`. Read as a generic block it is
//! crc `0x6152`, type `0x72`, flags `0x1A21` and head size 7.

use log::debug;

use super::block_header::{BaseFlags, SizePrologue};
use super::{BlockBody, BlockContext, Parsed};
use crate::cursor::ByteCursor;
use crate::error::{RarError, Result};
use crate::formats::{Signature, RAR15_SIGNATURE};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerBlock {
    pub flags: BaseFlags,
    pub head_size: u16,
    /// Bytes beyond the 7 the marker normally occupies.
    pub extra: Vec<u8>,
}

pub struct MarkerHeaderParser;

impl MarkerHeaderParser {
    pub const HEADER_SIZE: u64 = 7;

    /// Check that the stream continues with the RAR 1.5-4.x signature.
    ///
    /// The cursor is left where it was.
    pub fn validate(cursor: &mut dyn ByteCursor) -> Result<()> {
        if !cursor.size_at_least(Self::HEADER_SIZE * 8) {
            return Err(RarError::InvalidSignature);
        }
        let start = cursor.position();
        let peek_len = if cursor.size_at_least(8 * 8) { 8 } else { 7 };
        let magic = cursor.read_bytes(peek_len)?;
        cursor.seek(start)?;

        match Signature::from_bytes(&magic) {
            Some(Signature::Rar15) => Ok(()),
            Some(Signature::Rar50) => {
                debug!("RAR 5.0 signature found; only RAR 1.5-4.x blocks are decoded");
                Err(RarError::InvalidSignature)
            }
            None => Err(RarError::InvalidSignature),
        }
    }

    /// Whether `buffer` starts with the marker.
    pub fn matches(buffer: &[u8]) -> bool {
        buffer.starts_with(RAR15_SIGNATURE)
    }

    pub(crate) fn parse(ctx: &mut BlockContext<'_>) -> Result<Parsed> {
        let prologue =
            SizePrologue::read_unextended(&mut ctx.acct, &mut *ctx.cursor, Self::HEADER_SIZE)?;
        let extra = ctx.trailing_bytes()?;
        Ok(Parsed {
            has_extended_size: prologue.flags.has_extended_size,
            is_ignorable: prologue.flags.is_ignorable,
            body: BlockBody::Marker(MarkerBlock {
                flags: prologue.flags,
                head_size: prologue.head_size,
                extra,
            }),
        })
    }
}
