//! Block dispatch by type tag.

use log::{debug, warn};

use super::{
    ArchiveHeaderParser, Block, BlockContext, BlockHeader, CommentHeaderParser, FileHeaderParser,
    MarkerHeaderParser, OpaqueHeaderParser, Parsed, SizeAccountant, TerminatorHeaderParser,
};
use crate::cursor::ByteCursor;
use crate::error::Result;
use crate::formats::BlockType;

type ParseFn = fn(&mut BlockContext<'_>) -> Result<Parsed>;

/// Variant table. Unrecognised tags share the opaque layout.
fn parser_for(block_type: BlockType) -> ParseFn {
    match block_type {
        BlockType::Marker => MarkerHeaderParser::parse,
        BlockType::Archive => ArchiveHeaderParser::parse,
        BlockType::File => FileHeaderParser::parse,
        BlockType::Comment => CommentHeaderParser::parse,
        BlockType::End => TerminatorHeaderParser::parse,
        BlockType::ExtraInfo
        | BlockType::Subblock
        | BlockType::Recovery
        | BlockType::Signature
        | BlockType::NewSubblock
        | BlockType::Unknown(_) => OpaqueHeaderParser::parse,
    }
}

/// Decodes one block at a time from a cursor.
#[derive(Debug, Clone, Copy)]
pub struct BlockDispatcher {
    keep_payloads: bool,
}

impl Default for BlockDispatcher {
    fn default() -> Self {
        Self::new(true)
    }
}

impl BlockDispatcher {
    /// With `keep_payloads` off, packed data and opaque bodies are skipped
    /// and only their position and length are recorded.
    pub fn new(keep_payloads: bool) -> Self {
        Self { keep_payloads }
    }

    pub fn keep_payloads(&self) -> bool {
        self.keep_payloads
    }

    /// Decode the block at the cursor.
    ///
    /// On success the cursor sits exactly `total_size` bytes past the block
    /// start. On a block-level failure the cursor is moved past the block
    /// when its declared extent is known and inside the stream, and to the
    /// end of the stream otherwise, so the caller can always carry on.
    pub fn decode(&self, cursor: &mut dyn ByteCursor) -> Result<Block> {
        let offset = cursor.byte_position();
        let mut ctx = BlockContext {
            cursor,
            acct: SizeAccountant::new(offset),
            header: BlockHeader {
                offset,
                crc16: 0,
                block_type: BlockType::Unknown(0),
            },
            dispatcher: self,
        };

        match Self::decode_in(&mut ctx) {
            Ok(block) => {
                let end = block.end_offset();
                if ctx.cursor.byte_position() != end {
                    debug!(
                        "block at {}: cursor at {}, repositioning to {}",
                        offset,
                        ctx.cursor.byte_position(),
                        end
                    );
                    ctx.cursor.seek(end * 8)?;
                }
                Ok(block)
            }
            Err(err) => {
                Self::resynchronise(&mut ctx);
                Err(err)
            }
        }
    }

    fn decode_in(ctx: &mut BlockContext<'_>) -> Result<Block> {
        ctx.header = BlockHeader::read(&mut ctx.acct, &mut *ctx.cursor)?;
        let parsed = parser_for(ctx.header.block_type)(ctx)?;

        let declared_size = ctx.acct.declared().unwrap_or(BlockHeader::SIZE);
        let total_size = ctx.acct.extent().unwrap_or(BlockHeader::SIZE);
        debug!(
            "{} at {}: header {} bytes, total {} bytes",
            ctx.header.block_type, ctx.header.offset, declared_size, total_size
        );
        Ok(Block {
            header: ctx.header,
            declared_size,
            has_extended_size: parsed.has_extended_size,
            is_ignorable: parsed.is_ignorable,
            total_size,
            body: parsed.body,
        })
    }

    /// Move past a block that failed to decode.
    fn resynchronise(ctx: &mut BlockContext<'_>) {
        let here = ctx.cursor.byte_position();
        let stream_end = ctx.cursor.len_bytes();
        // A failed nested block has already moved the cursor past itself.
        let target = ctx
            .acct
            .extent()
            .map(|extent| ctx.acct.offset().saturating_add(extent))
            .filter(|&target| target <= stream_end)
            .map(|target| target.max(here));

        let target = match target {
            Some(target) => target,
            None => {
                debug!(
                    "block at {}: extent unknown or past end of stream, skipping to end",
                    ctx.acct.offset()
                );
                stream_end
            }
        };
        // The block's own error is the one reported; a failed seek is only logged.
        if let Err(err) = ctx.cursor.seek(target * 8) {
            warn!(
                "block at {}: cannot resynchronise to {}: {}",
                ctx.acct.offset(),
                target,
                err
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::SliceCursor;
    use crate::error::{RarError, StructuralFault};

    /// Reads like a slice but refuses every seek.
    struct FixedCursor<'a>(SliceCursor<'a>);

    impl ByteCursor for FixedCursor<'_> {
        fn position(&self) -> u64 {
            self.0.position()
        }

        fn len_bits(&self) -> u64 {
            self.0.len_bits()
        }

        fn seek(&mut self, _bit_offset: u64) -> Result<()> {
            Err(RarError::Io(std::io::Error::other("seek refused")))
        }

        fn read_bits(&mut self, count: u32) -> Result<u64> {
            self.0.read_bits(count)
        }

        fn read_bytes(&mut self, len: u64) -> Result<Vec<u8>> {
            self.0.read_bytes(len)
        }
    }

    #[test]
    fn test_resync_failure_keeps_block_error() {
        let _ = env_logger::builder().is_test(true).try_init();
        // Archive header declaring 9 bytes, below its minimum.
        let buffer = [0x00, 0x00, 0x73, 0x00, 0x00, 0x09, 0x00, 0x00, 0x00, 0x00];
        let mut cursor = FixedCursor(SliceCursor::new(&buffer));
        let err = BlockDispatcher::default().decode(&mut cursor).unwrap_err();
        assert!(matches!(
            err,
            RarError::Structural {
                offset: 0,
                fault: StructuralFault::HeaderTooSmall {
                    declared: 9,
                    minimum: 13
                }
            }
        ));
        assert_eq!(cursor.byte_position(), 7);
    }

    #[test]
    fn test_resync_skips_declared_extent() {
        let buffer = [0x00, 0x00, 0x73, 0x00, 0x00, 0x09, 0x00, 0x00, 0x00, 0x00];
        let mut cursor = SliceCursor::new(&buffer);
        BlockDispatcher::default().decode(&mut cursor).unwrap_err();
        assert_eq!(cursor.byte_position(), 9);
    }
}
