//! Enumerated header values and their display names.
//!
//! Every enum has an `Unknown` arm so an unexpected byte never fails a decode.

use std::fmt;

/// Block type tag, the third byte of every block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockType {
    Marker,
    Archive,
    File,
    Comment,
    ExtraInfo,
    Subblock,
    Recovery,
    Signature,
    NewSubblock,
    End,
    Unknown(u8),
}

impl BlockType {
    pub fn from_u8(tag: u8) -> Self {
        match tag {
            0x72 => Self::Marker,
            0x73 => Self::Archive,
            0x74 => Self::File,
            0x75 => Self::Comment,
            0x76 => Self::ExtraInfo,
            0x77 => Self::Subblock,
            0x78 => Self::Recovery,
            0x79 => Self::Signature,
            0x7A => Self::NewSubblock,
            0x7B => Self::End,
            other => Self::Unknown(other),
        }
    }

    pub fn tag(self) -> u8 {
        match self {
            Self::Marker => 0x72,
            Self::Archive => 0x73,
            Self::File => 0x74,
            Self::Comment => 0x75,
            Self::ExtraInfo => 0x76,
            Self::Subblock => 0x77,
            Self::Recovery => 0x78,
            Self::Signature => 0x79,
            Self::NewSubblock => 0x7A,
            Self::End => 0x7B,
            Self::Unknown(tag) => tag,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Marker => "Marker",
            Self::Archive => "Archive",
            Self::File => "File",
            Self::Comment => "Comment",
            Self::ExtraInfo => "Extra info",
            Self::Subblock => "Subblock",
            Self::Recovery => "Recovery record",
            Self::Signature => "Archive authenticity",
            Self::NewSubblock => "New-format subblock",
            Self::End => "Archive end",
            Self::Unknown(_) => "Unknown block",
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(tag) => write!(f, "Unknown block (0x{:02x})", tag),
            other => f.write_str(other.name()),
        }
    }
}

/// Packing method byte of file headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressionMethod {
    /// Store (no compression)
    Store,
    Fastest,
    Fast,
    Normal,
    Good,
    Best,
    Unknown(u8),
}

impl CompressionMethod {
    pub fn from_u8(v: u8) -> Self {
        match v {
            0x30 => Self::Store,
            0x31 => Self::Fastest,
            0x32 => Self::Fast,
            0x33 => Self::Normal,
            0x34 => Self::Good,
            0x35 => Self::Best,
            other => Self::Unknown(other),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Store => "Storing",
            Self::Fastest => "Fastest compression",
            Self::Fast => "Fast compression",
            Self::Normal => "Normal compression",
            Self::Good => "Good compression",
            Self::Best => "Best compression",
            Self::Unknown(_) => "Unknown method",
        }
    }

    /// Whether this method requires decompression.
    pub fn needs_decompression(self) -> bool {
        self != Self::Store
    }
}

impl fmt::Display for CompressionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(v) => write!(f, "Unknown(0x{:02x})", v),
            other => f.write_str(other.name()),
        }
    }
}

/// Operating system the file was archived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostOs {
    MsDos,
    Os2,
    Win32,
    Unix,
    Unknown(u8),
}

impl HostOs {
    pub fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::MsDos,
            1 => Self::Os2,
            2 => Self::Win32,
            3 => Self::Unix,
            other => Self::Unknown(other),
        }
    }

    /// Hosts whose attribute word is a FILE_ATTRIBUTE_* bit set.
    pub fn has_dos_attributes(self) -> bool {
        matches!(self, Self::MsDos | Self::Win32)
    }
}

impl fmt::Display for HostOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MsDos => f.write_str("MS DOS"),
            Self::Os2 => f.write_str("OS/2"),
            Self::Win32 => f.write_str("Win32"),
            Self::Unix => f.write_str("Unix"),
            Self::Unknown(v) => write!(f, "Unknown({})", v),
        }
    }
}

/// 3-bit dictionary size class from the file header flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DictionarySize {
    Kib64,
    Kib128,
    Kib256,
    Kib512,
    Kib1024,
    Reserved1,
    Reserved2,
    /// The entry is a directory, not a file.
    Directory,
}

impl DictionarySize {
    /// Decode the low three bits of `v`.
    pub fn from_bits(v: u8) -> Self {
        match v & 0x07 {
            0 => Self::Kib64,
            1 => Self::Kib128,
            2 => Self::Kib256,
            3 => Self::Kib512,
            4 => Self::Kib1024,
            5 => Self::Reserved1,
            6 => Self::Reserved2,
            _ => Self::Directory,
        }
    }

    pub fn kib(self) -> Option<u32> {
        match self {
            Self::Kib64 => Some(64),
            Self::Kib128 => Some(128),
            Self::Kib256 => Some(256),
            Self::Kib512 => Some(512),
            Self::Kib1024 => Some(1024),
            Self::Reserved1 | Self::Reserved2 | Self::Directory => None,
        }
    }
}

impl fmt::Display for DictionarySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self, self.kib()) {
            (_, Some(kib)) => write!(f, "Dictionary size {:>4} Kb", kib),
            (Self::Reserved1, None) => f.write_str("Reserved1"),
            (Self::Reserved2, None) => f.write_str("Reserved2"),
            _ => f.write_str("File is a directory"),
        }
    }
}
