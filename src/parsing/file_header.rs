//! File header parser.
//!
//! Each file in a RAR archive has a file header that describes the file's
//! name, size, compression method, etc., followed by the packed data.
//!
//! Header layout after the 3-byte CRC/type:
//!
//! ```text
//! flags        u16   see FileFlags
//! head_size    u16   full header size, filename included
//! packed_size  u32
//! unp_size     u32
//! host_os      u8
//! file_crc     u32
//! ftime        u32   MS-DOS date/time
//! version      u8
//! method       u8
//! name_size    u16
//! attr         u32
//! [high sizes  u64]  when is_large: high packed u32, high unpacked u32
//! [salt        u8]   when has_salt
//! [time_flags  u16]  when has_extended_time
//! name         name_size bytes
//! [extra]            whatever head_size leaves over
//! ```

use super::{Block, BlockBody, BlockContext, Parsed, Payload};
use crate::cursor::TextEncoding;
use crate::error::{Feature, RarError, Result};
use crate::formats::{
    Attributes, CompressionMethod, DictionarySize, DosTimestamp, HostOs, RequiredVersion,
};

/// File header type constant.
pub const FILE_HEADER_TYPE: u8 = 0x74; // 116

/// Filename announcing a MIME type stored as the entry's data.
pub const MIMETYPE_ENTRY: &str = "mimetype";

/// File header flag word, LSB first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileFlags {
    pub continued_from_previous: bool,
    pub continued_in_next: bool,
    pub is_encrypted: bool,
    pub has_comment: bool,
    /// Information from previous files is used (solid flag).
    pub is_solid: bool,
    pub dictionary_size: DictionarySize,
    pub has_extended_size: bool,
    pub is_ignorable: bool,
    /// 64-bit size extension follows the attribute word.
    pub is_large: bool,
    pub is_unicode: bool,
    pub has_salt: bool,
    pub uses_file_version: bool,
    pub has_extended_time: bool,
    pub has_extended_flag: bool,
}

impl FileFlags {
    pub fn raw(&self) -> u16 {
        let dict = match self.dictionary_size {
            DictionarySize::Kib64 => 0,
            DictionarySize::Kib128 => 1,
            DictionarySize::Kib256 => 2,
            DictionarySize::Kib512 => 3,
            DictionarySize::Kib1024 => 4,
            DictionarySize::Reserved1 => 5,
            DictionarySize::Reserved2 => 6,
            DictionarySize::Directory => 7,
        };
        self.continued_from_previous as u16
            | (self.continued_in_next as u16) << 1
            | (self.is_encrypted as u16) << 2
            | (self.has_comment as u16) << 3
            | (self.is_solid as u16) << 4
            | dict << 5
            | (self.has_extended_size as u16) << 8
            | (self.is_ignorable as u16) << 9
            | (self.is_large as u16) << 10
            | (self.is_unicode as u16) << 11
            | (self.has_salt as u16) << 12
            | (self.uses_file_version as u16) << 13
            | (self.has_extended_time as u16) << 14
            | (self.has_extended_flag as u16) << 15
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileBlock {
    pub flags: FileFlags,
    pub head_size: u16,
    /// Packed size, high half included when `flags.is_large`.
    pub compressed_size: u64,
    /// Unpacked size, high half included when `flags.is_large`.
    pub uncompressed_size: u64,
    /// The raw 64-bit size extension.
    pub large_size: Option<u64>,
    pub host_os: HostOs,
    pub file_crc: u32,
    pub timestamp: DosTimestamp,
    pub version: RequiredVersion,
    pub method: CompressionMethod,
    pub filename_length: u16,
    pub attributes: Attributes,
    pub salt: Option<u8>,
    /// Extended time flags, kept undecoded.
    pub time_flags: Option<u16>,
    pub filename: String,
    /// Header bytes no known field accounts for.
    pub extra: Vec<u8>,
    /// The packed file data.
    pub data: Payload,
    pub comment: Option<Box<Block>>,
}

impl FileBlock {
    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn compressed_size(&self) -> u64 {
        self.compressed_size
    }

    pub fn uncompressed_size(&self) -> u64 {
        self.uncompressed_size
    }

    pub fn method(&self) -> CompressionMethod {
        self.method
    }

    pub fn crc(&self) -> u32 {
        self.file_crc
    }

    pub fn timestamp(&self) -> DosTimestamp {
        self.timestamp
    }

    pub fn attributes(&self) -> Attributes {
        self.attributes
    }

    pub fn is_directory(&self) -> bool {
        self.flags.dictionary_size == DictionarySize::Directory
    }

    pub fn description(&self) -> String {
        format!(
            "File entry: {} ({} bytes)",
            self.filename, self.compressed_size
        )
    }
}

pub struct FileHeaderParser;

impl FileHeaderParser {
    /// Minimum fixed header size before optional fields and filename.
    pub const MIN_HEADER_SIZE: u64 = 32;

    pub(crate) fn parse(ctx: &mut BlockContext<'_>) -> Result<Parsed> {
        let offset = ctx.header.offset;
        let cursor = &mut *ctx.cursor;
        let acct = &mut ctx.acct;

        let flags = FileFlags {
            continued_from_previous: acct.bit(cursor)?,
            continued_in_next: acct.bit(cursor)?,
            is_encrypted: acct.bit(cursor)?,
            has_comment: acct.bit(cursor)?,
            is_solid: acct.bit(cursor)?,
            dictionary_size: DictionarySize::from_bits(acct.bits(cursor, 3)? as u8),
            has_extended_size: acct.bit(cursor)?,
            is_ignorable: acct.bit(cursor)?,
            is_large: acct.bit(cursor)?,
            is_unicode: acct.bit(cursor)?,
            has_salt: acct.bit(cursor)?,
            uses_file_version: acct.bit(cursor)?,
            has_extended_time: acct.bit(cursor)?,
            has_extended_flag: acct.bit(cursor)?,
        };
        let head_size = acct.u16(cursor)?;
        acct.declare(head_size as u64);
        acct.require_minimum(Self::MIN_HEADER_SIZE)?;

        let mut compressed_size = acct.u32(cursor)? as u64;
        let mut uncompressed_size = acct.u32(cursor)? as u64;
        let host_os = HostOs::from_u8(acct.u8(cursor)?);
        let file_crc = acct.u32(cursor)?;
        let timestamp = DosTimestamp(acct.u32(cursor)?);
        let version = RequiredVersion(acct.u8(cursor)?);
        let method = CompressionMethod::from_u8(acct.u8(cursor)?);
        let filename_length = acct.u16(cursor)?;
        let attributes = Attributes::new(host_os, acct.u32(cursor)?);

        // LHD_LARGE: high halves of both sizes, packed first.
        let large_size = if flags.is_large {
            let large = acct.u64(cursor)?;
            compressed_size |= (large & 0xFFFF_FFFF) << 32;
            uncompressed_size |= (large >> 32) << 32;
            Some(large)
        } else {
            None
        };
        acct.follow(compressed_size);

        if flags.is_unicode {
            return Err(RarError::UnsupportedFeature {
                offset,
                feature: Feature::UnicodeFilename,
            });
        }

        let salt = if flags.has_salt {
            Some(acct.u8(cursor)?)
        } else {
            None
        };
        let time_flags = if flags.has_extended_time {
            Some(acct.u16(cursor)?)
        } else {
            None
        };
        let filename = if filename_length > 0 {
            acct.text(cursor, filename_length as u64, TextEncoding::Utf8Lossy)?
        } else {
            String::new()
        };

        let extra = ctx.trailing_bytes()?;
        let data = ctx.following_payload(compressed_size)?;
        let comment = if flags.has_comment {
            ctx.nested_comment()?
        } else {
            None
        };

        Ok(Parsed {
            has_extended_size: flags.has_extended_size,
            is_ignorable: flags.is_ignorable,
            body: BlockBody::File(Box::new(FileBlock {
                flags,
                head_size,
                compressed_size,
                uncompressed_size,
                large_size,
                host_os,
                file_crc,
                timestamp,
                version,
                method,
                filename_length,
                attributes,
                salt,
                time_flags,
                filename,
                extra,
                data,
                comment,
            })),
        })
    }
}
