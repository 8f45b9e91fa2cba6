//! RAR block decoding library.
//!
//! Decodes the block structure of RAR 1.5-4.x archives: the marker, archive
//! header, file entries, comments, recovery and authenticity records and the
//! end-of-archive block. Every header is read through a size accountant, so
//! a block can never claim more (or less) of the stream than it declares.
//!
//! Decompression and decryption are out of scope; packed data is exposed as
//! raw bytes.
//!
//! ## Features
//! - `async` - Async loading of archive bytes with tokio
//!
//! ## Example
//!
//! ```
//! use rar_blocks::ArchiveDecoder;
//!
//! let archive = ArchiveDecoder::new().decode_bytes(b"Rar!\x1a\x07\x00").unwrap();
//! assert_eq!(archive.blocks().len(), 1);
//! assert_eq!(archive.mime_type(), "application/octet-stream");
//! ```

pub mod archive;
pub mod cursor;
pub mod error;
pub mod field;
mod file_media;
pub mod formats;
pub mod lazy;
pub mod parsing;

pub use archive::{Archive, ArchiveDecoder, BlockWarning, DecodeOptions};
pub use cursor::{ByteCursor, SliceCursor, TextEncoding};
pub use error::{RarError, Result};
pub use file_media::{LocalFileMedia, ReadInterval};
pub use parsing::{Block, BlockBody, BlockDispatcher, FileBlock};

#[cfg(feature = "async")]
pub use file_media::FileMedia;
