//! RAR block decoding.
//!
//! A block is decoded by the [`BlockDispatcher`]: it reads the CRC and type
//! tag, picks the variant parser for the tag and hands it a
//! [`SizeAccountant`] that every header field is read through.
//!
//! | Tag | Variant | Parser |
//! |-----|---------|--------|
//! | `0x72` | Marker | [`MarkerHeaderParser`] |
//! | `0x73` | Archive | [`ArchiveHeaderParser`] |
//! | `0x74` | File | [`FileHeaderParser`] |
//! | `0x75` | Comment | [`CommentHeaderParser`] |
//! | `0x76`-`0x7A` | Extra info, subblocks, recovery, authenticity | [`OpaqueHeaderParser`] |
//! | `0x7B` | End | [`TerminatorHeaderParser`] |
//! | other | Unknown | [`OpaqueHeaderParser`] |

pub mod accountant;
pub mod archive_header;
pub mod block_header;
pub mod comment_header;
pub mod dispatcher;
pub mod file_header;
pub mod marker_header;
pub mod opaque_header;
pub mod terminator_header;

#[cfg(test)]
mod tests;

pub use accountant::SizeAccountant;
pub use archive_header::{ArchiveBlock, ArchiveFlags, ArchiveHeaderParser};
pub use block_header::{BaseFlags, BlockHeader, SizePrologue};
pub use comment_header::{CommentBlock, CommentHeaderParser};
pub use dispatcher::BlockDispatcher;
pub use file_header::{FileBlock, FileFlags, FileHeaderParser};
pub use marker_header::{MarkerBlock, MarkerHeaderParser};
pub use opaque_header::{OpaqueBlock, OpaqueHeaderParser};
pub use terminator_header::{EndBlock, TerminatorHeaderParser};

use log::debug;

use crate::cursor::ByteCursor;
use crate::error::Result;
use crate::formats::BlockType;

/// Byte range of a payload, with its bytes when they were kept.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Payload {
    /// Byte offset of the first payload byte.
    pub offset: u64,
    pub len: u64,
    /// `None` when decoded with `keep_payloads` off.
    pub data: Option<Vec<u8>>,
}

impl Payload {
    /// Read (or skip) `len` bytes at the cursor.
    pub fn read(cursor: &mut dyn ByteCursor, len: u64, keep: bool) -> Result<Self> {
        let offset = cursor.byte_position();
        let data = if keep {
            Some(cursor.read_bytes(len)?)
        } else {
            let target = cursor.position().saturating_add(len.saturating_mul(8));
            cursor.seek(target)?;
            None
        };
        Ok(Self { offset, len, data })
    }

    pub fn bytes(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// One decoded block.
///
/// Built once by [`BlockDispatcher::decode`] and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub header: BlockHeader,
    /// Header size from the size field, extension included.
    pub declared_size: u64,
    pub has_extended_size: bool,
    pub is_ignorable: bool,
    /// Bytes the block spans in the stream: header, payload and nested blocks.
    pub total_size: u64,
    pub body: BlockBody,
}

/// Type-specific part of a [`Block`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockBody {
    Marker(MarkerBlock),
    Archive(ArchiveBlock),
    File(Box<FileBlock>),
    Comment(CommentBlock),
    ExtraInfo(OpaqueBlock),
    Subblock(OpaqueBlock),
    Recovery(OpaqueBlock),
    Signature(OpaqueBlock),
    NewSubblock(OpaqueBlock),
    End(EndBlock),
    Unknown(OpaqueBlock),
}

impl Block {
    pub fn block_type(&self) -> BlockType {
        self.header.block_type
    }

    pub fn offset(&self) -> u64 {
        self.header.offset
    }

    /// Offset just past the block.
    pub fn end_offset(&self) -> u64 {
        self.header.offset + self.total_size
    }

    pub fn as_file(&self) -> Option<&FileBlock> {
        match &self.body {
            BlockBody::File(file) => Some(file),
            _ => None,
        }
    }

    pub fn as_archive(&self) -> Option<&ArchiveBlock> {
        match &self.body {
            BlockBody::Archive(archive) => Some(archive),
            _ => None,
        }
    }

    pub fn as_comment(&self) -> Option<&CommentBlock> {
        match &self.body {
            BlockBody::Comment(comment) => Some(comment),
            _ => None,
        }
    }

    /// The block nested inside this one, if any.
    pub fn nested(&self) -> Option<&Block> {
        match &self.body {
            BlockBody::Archive(archive) => archive.comment.as_deref(),
            BlockBody::File(file) => file.comment.as_deref(),
            _ => None,
        }
    }

    pub fn description(&self) -> String {
        match &self.body {
            BlockBody::File(file) => file.description(),
            _ => self.block_type().to_string(),
        }
    }
}

/// What a variant parser hands back to the dispatcher.
#[derive(Debug)]
pub(crate) struct Parsed {
    pub has_extended_size: bool,
    pub is_ignorable: bool,
    pub body: BlockBody,
}

/// State threaded through one block decode.
pub(crate) struct BlockContext<'a> {
    pub(crate) cursor: &'a mut dyn ByteCursor,
    pub(crate) acct: SizeAccountant,
    pub(crate) header: BlockHeader,
    dispatcher: &'a BlockDispatcher,
}

impl<'a> BlockContext<'a> {
    pub(crate) fn keep_payloads(&self) -> bool {
        self.dispatcher.keep_payloads()
    }

    /// Decode the Comment block embedded in the current one and charge it
    /// as following data.
    ///
    /// Any other block, or too few bytes for a block header, is left in
    /// place for the caller to decode at top level.
    pub(crate) fn nested_comment(&mut self) -> Result<Option<Box<Block>>> {
        match self.peek_block_type()? {
            Some(BlockType::Comment) => {}
            other => {
                debug!(
                    "block at {}: comment flag set but next block is {:?}",
                    self.header.offset, other
                );
                return Ok(None);
            }
        }
        let dispatcher = self.dispatcher;
        let block = dispatcher.decode(&mut *self.cursor)?;
        self.acct.follow(block.total_size);
        Ok(Some(Box::new(block)))
    }

    /// Type tag of the block at the cursor, without moving it.
    fn peek_block_type(&mut self) -> Result<Option<BlockType>> {
        if !self.cursor.size_at_least(BlockHeader::SIZE * 8) {
            return Ok(None);
        }
        let start = self.cursor.position();
        self.cursor.seek(start + 16)?;
        let tag = self.cursor.read_uint(1)? as u8;
        self.cursor.seek(start)?;
        Ok(Some(BlockType::from_u8(tag)))
    }

    /// Read the trailing header segment as kept bytes.
    pub(crate) fn trailing_bytes(&mut self) -> Result<Vec<u8>> {
        self.acct.finish(&mut *self.cursor)
    }

    /// Read the trailing header segment as the block's payload.
    pub(crate) fn trailing_payload(&mut self) -> Result<Payload> {
        let offset = self.cursor.byte_position();
        if self.keep_payloads() {
            let data = self.acct.finish(&mut *self.cursor)?;
            Ok(Payload {
                offset,
                len: data.len() as u64,
                data: Some(data),
            })
        } else {
            let len = self.acct.skip_trailing(&mut *self.cursor)?;
            Ok(Payload {
                offset,
                len,
                data: None,
            })
        }
    }

    /// Read `len` bytes of data that follow the header.
    pub(crate) fn following_payload(&mut self, len: u64) -> Result<Payload> {
        let keep = self.keep_payloads();
        Payload::read(&mut *self.cursor, len, keep)
    }
}
