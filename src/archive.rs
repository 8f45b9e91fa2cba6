//! Archive decoder - drives the block dispatcher over a whole stream.

use log::{debug, warn};

use crate::cursor::{ByteCursor, SliceCursor, TextEncoding};
use crate::error::{RarError, Result};
use crate::formats::BlockType;
use crate::lazy::LazyProperty;
use crate::parsing::file_header::MIMETYPE_ENTRY;
use crate::parsing::{ArchiveBlock, Block, BlockDispatcher, FileBlock, MarkerHeaderParser};

/// Static description of the format.
pub const FORMAT_DESCRIPTION: &str = "Compressed archive in RAR (Roshal ARchive) format";

/// MIME type reported for archives without a `mimetype` entry.
pub const DEFAULT_MIME_TYPE: &str = "application/rar";

/// MIME type reported when detection fails.
pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// Suffix reported for archives without a recognised `mimetype` entry.
pub const DEFAULT_SUFFIX: &str = ".rar";

/// Container MIME types that name their own filename suffix.
const MIME_SUFFIXES: &[(&str, &str)] = &[
    ("application/vnd.oasis.opendocument.text", "odt"),
    ("application/vnd.oasis.opendocument.spreadsheet", "ods"),
    ("application/vnd.oasis.opendocument.presentation", "odp"),
    ("application/vnd.oasis.opendocument.graphics", "odg"),
    ("application/vnd.oasis.opendocument.chart", "odc"),
    ("application/vnd.oasis.opendocument.formula", "odf"),
    ("application/vnd.oasis.opendocument.image", "odi"),
    ("application/vnd.oasis.opendocument.text-master", "odm"),
    ("application/vnd.sun.xml.writer", "sxw"),
    ("application/vnd.sun.xml.calc", "sxc"),
    ("application/vnd.sun.xml.impress", "sxi"),
    ("application/vnd.sun.xml.draw", "sxd"),
    ("application/epub+zip", "epub"),
];

/// Options for decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Stop after this many top-level blocks (the marker counts).
    pub max_blocks: Option<usize>,
    /// Stop at the first end-of-archive block instead of at end of stream.
    pub stop_at_end_block: bool,
    /// Keep packed data and opaque bodies in memory.
    pub keep_payloads: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_blocks: None,
            stop_at_end_block: false,
            keep_payloads: true,
        }
    }
}

impl DecodeOptions {
    pub fn max_blocks(mut self, max: usize) -> Self {
        self.max_blocks = Some(max);
        self
    }

    pub fn stop_at_end_block(mut self, stop: bool) -> Self {
        self.stop_at_end_block = stop;
        self
    }

    pub fn keep_payloads(mut self, keep: bool) -> Self {
        self.keep_payloads = keep;
        self
    }
}

/// A block that could not be decoded, and why.
#[derive(Debug)]
pub struct BlockWarning {
    /// Byte offset where the block started.
    pub offset: u64,
    pub error: RarError,
}

/// A decoded archive: its blocks in stream order.
#[derive(Debug)]
pub struct Archive {
    blocks: Vec<Block>,
    warnings: Vec<BlockWarning>,
    description: LazyProperty<String>,
    mime_type: LazyProperty<String>,
    filename_suffix: LazyProperty<Option<String>>,
    content_size: LazyProperty<Option<u64>>,
}

impl Archive {
    fn new(blocks: Vec<Block>, warnings: Vec<BlockWarning>) -> Self {
        Self {
            blocks,
            warnings,
            description: LazyProperty::new(),
            mime_type: LazyProperty::new(),
            filename_suffix: LazyProperty::new(),
            content_size: LazyProperty::new(),
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// File entries in stream order.
    pub fn files(&self) -> impl Iterator<Item = &FileBlock> {
        self.blocks.iter().filter_map(Block::as_file)
    }

    /// The first archive header, if any.
    pub fn archive_header(&self) -> Option<&ArchiveBlock> {
        self.blocks.iter().find_map(Block::as_archive)
    }

    /// One entry per block that failed to decode.
    pub fn warnings(&self) -> &[BlockWarning] {
        &self.warnings
    }

    /// Whether every block decoded cleanly.
    pub fn is_complete(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn description(&self) -> &str {
        self.description.get_or_compute(
            "archive description",
            || self.create_description(),
            || FORMAT_DESCRIPTION.to_string(),
        )
    }

    pub fn mime_type(&self) -> &str {
        self.mime_type.get_or_compute(
            "archive MIME type",
            || self.create_mime_type(),
            || FALLBACK_MIME_TYPE.to_string(),
        )
    }

    pub fn filename_suffix(&self) -> Option<&str> {
        self.filename_suffix
            .get_or_compute(
                "archive filename suffix",
                || self.create_filename_suffix().map(Some),
                || None,
            )
            .as_deref()
    }

    /// Bytes covered by the decoded blocks, from the stream start.
    pub fn content_size(&self) -> Option<u64> {
        *self.content_size.get_or_compute(
            "archive content size",
            || self.create_content_size().map(Some),
            || None,
        )
    }

    /// Computations run so far for description, MIME type, suffix and size.
    #[cfg(test)]
    pub(crate) fn computations(&self) -> [usize; 4] {
        [
            self.description.computations(),
            self.mime_type.computations(),
            self.filename_suffix.computations(),
            self.content_size.computations(),
        ]
    }

    fn create_description(&self) -> Result<String> {
        let header = self.archive_header().ok_or(RarError::DerivedProperty {
            property: "description",
            reason: "no archive header block",
        })?;
        let flags = header.flags;
        let traits: Vec<&str> = [
            (flags.is_volume, "volume"),
            (flags.is_locked, "locked"),
            (flags.is_solid, "solid"),
            (flags.has_authenticity_info, "authenticity information"),
        ]
        .into_iter()
        .filter_map(|(set, name)| set.then_some(name))
        .collect();

        if traits.is_empty() {
            Ok(FORMAT_DESCRIPTION.to_string())
        } else {
            Ok(format!("{} ({})", FORMAT_DESCRIPTION, traits.join(", ")))
        }
    }

    fn first_file(&self, property: &'static str) -> Result<&FileBlock> {
        self.files().next().ok_or(RarError::DerivedProperty {
            property,
            reason: "no file entry",
        })
    }

    /// The MIME type stored by a leading `mimetype` entry.
    fn embedded_mime_type(&self, property: &'static str) -> Result<Option<String>> {
        let file = self.first_file(property)?;
        if file.filename != MIMETYPE_ENTRY {
            return Ok(None);
        }
        let data = file.data.bytes().ok_or(RarError::DerivedProperty {
            property,
            reason: "mimetype payload was not kept",
        })?;
        Ok(Some(TextEncoding::Latin1.decode(data).trim().to_string()))
    }

    fn create_mime_type(&self) -> Result<String> {
        Ok(self
            .embedded_mime_type("MIME type")?
            .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string()))
    }

    fn create_filename_suffix(&self) -> Result<String> {
        let suffix = self
            .embedded_mime_type("filename suffix")?
            .and_then(|mime| {
                MIME_SUFFIXES
                    .iter()
                    .find(|(known, _)| *known == mime)
                    .map(|(_, ext)| format!(".{}", ext))
            });
        Ok(suffix.unwrap_or_else(|| DEFAULT_SUFFIX.to_string()))
    }

    fn create_content_size(&self) -> Result<u64> {
        let last = self.blocks.last().ok_or(RarError::DerivedProperty {
            property: "content size",
            reason: "no blocks",
        })?;
        last.header
            .offset
            .checked_add(last.total_size)
            .ok_or(RarError::DerivedProperty {
                property: "content size",
                reason: "block extent overflows",
            })
    }
}

/// Decodes a whole archive stream into an [`Archive`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ArchiveDecoder {
    options: DecodeOptions,
}

impl ArchiveDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: DecodeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    pub fn decode_bytes(&self, data: &[u8]) -> Result<Archive> {
        self.decode(&mut SliceCursor::new(data))
    }

    /// Validate the signature, then decode blocks until the stream ends.
    ///
    /// A block that fails on its own is recorded in [`Archive::warnings`] and
    /// decoding resumes after it.
    pub fn decode(&self, cursor: &mut dyn ByteCursor) -> Result<Archive> {
        MarkerHeaderParser::validate(cursor)?;

        let dispatcher = BlockDispatcher::new(self.options.keep_payloads);
        let mut blocks = Vec::new();
        let mut warnings = Vec::new();

        while !cursor.at_end() {
            if self
                .options
                .max_blocks
                .is_some_and(|max| blocks.len() >= max)
            {
                debug!("stopping after {} blocks", blocks.len());
                break;
            }

            let offset = cursor.byte_position();
            match dispatcher.decode(cursor) {
                Ok(block) => {
                    let is_end = block.block_type() == BlockType::End;
                    blocks.push(block);
                    if is_end && self.options.stop_at_end_block {
                        break;
                    }
                }
                Err(error) if error.is_block_local() => {
                    warn!("skipping block at offset {}: {}", offset, error);
                    warnings.push(BlockWarning { offset, error });
                }
                Err(error) => return Err(error),
            }
        }

        Ok(Archive::new(blocks, warnings))
    }
}
