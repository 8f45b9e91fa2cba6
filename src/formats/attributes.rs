//! File attribute words.

use std::fmt;

use super::HostOs;

/// FILE_ATTRIBUTE_* bits as used by MS-DOS and Win32 hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FileAttributes(pub u32);

impl FileAttributes {
    pub const READ_ONLY: u32 = 0x0001;
    pub const HIDDEN: u32 = 0x0002;
    pub const SYSTEM: u32 = 0x0004;
    pub const DIRECTORY: u32 = 0x0010;
    pub const ARCHIVE: u32 = 0x0020;
    pub const DEVICE: u32 = 0x0040;
    pub const NORMAL: u32 = 0x0080;
    pub const TEMPORARY: u32 = 0x0100;
    pub const SPARSE_FILE: u32 = 0x0200;
    pub const REPARSE_POINT: u32 = 0x0400;
    pub const COMPRESSED: u32 = 0x0800;
    pub const OFFLINE: u32 = 0x1000;
    pub const NOT_CONTENT_INDEXED: u32 = 0x2000;
    pub const ENCRYPTED: u32 = 0x4000;

    const NAMES: [(u32, &'static str); 14] = [
        (Self::READ_ONLY, "Read-only"),
        (Self::HIDDEN, "Hidden"),
        (Self::SYSTEM, "System"),
        (Self::DIRECTORY, "Directory"),
        (Self::ARCHIVE, "Archive"),
        (Self::DEVICE, "Device"),
        (Self::NORMAL, "Normal"),
        (Self::TEMPORARY, "Temporary"),
        (Self::SPARSE_FILE, "Sparse file"),
        (Self::REPARSE_POINT, "Reparse point"),
        (Self::COMPRESSED, "Compressed"),
        (Self::OFFLINE, "Offline"),
        (Self::NOT_CONTENT_INDEXED, "Not content indexed"),
        (Self::ENCRYPTED, "Encrypted"),
    ];

    pub fn contains(self, bit: u32) -> bool {
        self.0 & bit == bit
    }

    pub fn is_directory(self) -> bool {
        self.contains(Self::DIRECTORY)
    }

    /// Names of the set bits, lowest bit first. Unnamed bits are skipped.
    pub fn names(self) -> impl Iterator<Item = &'static str> {
        Self::NAMES
            .into_iter()
            .filter(move |&(bit, _)| self.contains(bit))
            .map(|(_, name)| name)
    }
}

impl fmt::Display for FileAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, name) in self.names().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(name)?;
        }
        Ok(())
    }
}

/// OS-dependent attribute word of a file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attributes {
    Dos(FileAttributes),
    /// Any other host; the word is kept uninterpreted.
    Opaque(u32),
}

impl Attributes {
    pub fn new(host_os: HostOs, raw: u32) -> Self {
        if host_os.has_dos_attributes() {
            Self::Dos(FileAttributes(raw))
        } else {
            Self::Opaque(raw)
        }
    }

    pub fn raw(self) -> u32 {
        match self {
            Self::Dos(attrs) => attrs.0,
            Self::Opaque(raw) => raw,
        }
    }
}

impl fmt::Display for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dos(attrs) => attrs.fmt(f),
            Self::Opaque(raw) => write!(f, "0x{:08x}", raw),
        }
    }
}
