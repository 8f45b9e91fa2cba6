//! Error types for RAR block decoding.
//!
//! This module provides the [`RarError`] type which covers every failure the
//! block decoder can report.
//!
//! ## Error Categories
//!
//! | Category | Errors | Scope |
//! |----------|--------|-------|
//! | Signature | [`InvalidSignature`] | Whole decode, raised before any block is read |
//! | Structure | [`Structural`] | Current block; the archive loop resynchronises |
//! | Feature | [`UnsupportedFeature`] | Current block only |
//! | I/O | [`Io`] | Whole decode |
//! | Derived | [`DerivedProperty`] | Never surfaced; see [`crate::lazy::LazyProperty`] |
//!
//! ## Example
//!
//! ```rust
//! use rar_blocks::{ArchiveDecoder, RarError};
//!
//! match ArchiveDecoder::new().decode_bytes(b"PK\x03\x04 not a rar") {
//!     Err(RarError::InvalidSignature) => {}
//!     other => panic!("unexpected: {:?}", other.map(|a| a.blocks().len())),
//! }
//! ```
//!
//! [`InvalidSignature`]: RarError::InvalidSignature
//! [`Structural`]: RarError::Structural
//! [`UnsupportedFeature`]: RarError::UnsupportedFeature
//! [`Io`]: RarError::Io
//! [`DerivedProperty`]: RarError::DerivedProperty

use std::io;

use thiserror::Error;

/// Error type for RAR block decoding.
#[derive(Debug, Error)]
pub enum RarError {
    /// The stream does not start with the RAR 1.5-4.x marker
    /// `Rar!\x1a\x07\x00`.
    #[error("not a valid RAR archive: invalid signature")]
    InvalidSignature,

    /// A block's size accounting does not hold.
    ///
    /// `offset` is the byte offset of the block (or field) that failed.
    #[error("malformed block at offset {offset}: {fault}")]
    Structural { offset: u64, fault: StructuralFault },

    /// The block uses a feature this decoder refuses to guess at.
    #[error("unsupported feature at offset {offset}: {feature}")]
    UnsupportedFeature { offset: u64, feature: Feature },

    /// A derived archive property could not be computed.
    ///
    /// Only ever produced inside a lazy property computation, where it is
    /// logged and replaced by the property's fallback.
    #[error("cannot derive {property}: {reason}")]
    DerivedProperty {
        property: &'static str,
        reason: &'static str,
    },

    /// An I/O error occurred while loading the archive.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl RarError {
    pub(crate) fn structural(offset: u64, fault: StructuralFault) -> Self {
        Self::Structural { offset, fault }
    }

    /// Whether the error only invalidates the block it was raised in.
    ///
    /// The archive loop records these as warnings and moves on to the next
    /// block; every other error aborts the decode.
    pub fn is_block_local(&self) -> bool {
        matches!(
            self,
            Self::Structural { .. } | Self::UnsupportedFeature { .. }
        )
    }
}

/// What exactly went wrong inside a malformed block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StructuralFault {
    /// A field runs past the end of the stream.
    #[error("unexpected end of stream: need {needed} bits, {available} available")]
    UnexpectedEof { needed: u64, available: u64 },

    /// The declared header size cannot even hold the fixed fields.
    #[error("declared header size {declared} is below the minimum {minimum}")]
    HeaderTooSmall { declared: u64, minimum: u64 },

    /// More bytes were consumed than the header declared.
    #[error("header declares {declared} bytes but {consumed} were consumed")]
    NegativeRemainder { declared: u64, consumed: u64 },
}

/// Format features that are detected but deliberately not decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Feature {
    #[error("unicode filenames")]
    UnicodeFilename,
}

pub type Result<T> = std::result::Result<T, RarError>;
