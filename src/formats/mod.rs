//! RAR format constants and small value decoders.
//!
//! Zero dependencies.

mod attributes;
mod tables;

pub use attributes::{Attributes, FileAttributes};
pub use tables::{BlockType, CompressionMethod, DictionarySize, HostOs};

use std::fmt;

/// RAR 1.5-4.x marker block, read as the first 7 bytes of every archive.
pub const RAR15_SIGNATURE: &[u8; 7] = b"Rar!\x1a\x07\x00";

/// RAR 5.0+ signature. Recognised only to give a precise rejection.
pub const RAR50_SIGNATURE: &[u8; 8] = b"Rar!\x1a\x07\x01\x00";

/// RAR file signature detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signature {
    /// RAR 1.5 to 4.x
    Rar15,
    /// RAR 5.0+
    Rar50,
}

impl Signature {
    pub fn size(&self) -> u64 {
        match self {
            Self::Rar15 => 7,
            Self::Rar50 => 8,
        }
    }

    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.starts_with(RAR50_SIGNATURE) {
            Some(Self::Rar50)
        } else if data.starts_with(RAR15_SIGNATURE) {
            Some(Self::Rar15)
        } else {
            None
        }
    }
}

/// Version needed to extract, stored as `major * 10 + minor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequiredVersion(pub u8);

impl RequiredVersion {
    pub fn major(self) -> u8 {
        self.0 / 10
    }

    pub fn minor(self) -> u8 {
        self.0 % 10
    }
}

impl fmt::Display for RequiredVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major(), self.minor())
    }
}

/// MS-DOS packed date/time as stored in file headers.
///
/// Bits 0-4 seconds/2, 5-10 minutes, 11-15 hours, 16-20 day,
/// 21-24 month, 25-31 years since 1980.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DosTimestamp(pub u32);

impl DosTimestamp {
    pub fn second(self) -> u32 {
        (self.0 & 0x1f) * 2
    }

    pub fn minute(self) -> u32 {
        (self.0 >> 5) & 0x3f
    }

    pub fn hour(self) -> u32 {
        (self.0 >> 11) & 0x1f
    }

    pub fn day(self) -> u32 {
        (self.0 >> 16) & 0x1f
    }

    pub fn month(self) -> u32 {
        (self.0 >> 21) & 0x0f
    }

    pub fn year(self) -> u32 {
        (self.0 >> 25) + 1980
    }

    /// Seconds since the Unix epoch, treating the stored time as UTC.
    ///
    /// Out-of-range day or month fields are clamped rather than rejected.
    pub fn to_unix_seconds(self) -> i64 {
        let year = self.year() as i64;
        let month = self.month().clamp(1, 12) as usize;
        let day = self.day().max(1) as i64;

        let is_leap = |y: i64| y % 4 == 0 && (y % 100 != 0 || y % 400 == 0);
        let mut days: i64 = (1970..year)
            .map(|y| if is_leap(y) { 366 } else { 365 })
            .sum();
        let month_days = [
            31,
            if is_leap(year) { 29 } else { 28 },
            31,
            30,
            31,
            30,
            31,
            31,
            30,
            31,
            30,
            31,
        ];
        days += month_days[..month - 1].iter().sum::<i64>();
        days += day - 1;

        days * 86400 + self.hour() as i64 * 3600 + self.minute() as i64 * 60 + self.second() as i64
    }
}

impl fmt::Display for DosTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year(),
            self.month(),
            self.day(),
            self.hour(),
            self.minute(),
            self.second()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_detection() {
        assert_eq!(
            Signature::from_bytes(b"Rar!\x1a\x07\x00\x00"),
            Some(Signature::Rar15)
        );
        assert_eq!(
            Signature::from_bytes(b"Rar!\x1a\x07\x01\x00"),
            Some(Signature::Rar50)
        );
        assert_eq!(Signature::from_bytes(b"Rar!"), None);
        assert_eq!(Signature::Rar15.size(), 7);
    }

    #[test]
    fn test_required_version() {
        assert_eq!(RequiredVersion(29).to_string(), "2.9");
        assert_eq!(RequiredVersion(20).to_string(), "2.0");
    }

    #[test]
    fn test_dos_timestamp() {
        // 2024-03-15 13:45:30
        let raw = (44 << 25) | (3 << 21) | (15 << 16) | (13 << 11) | (45 << 5) | 15;
        let ts = DosTimestamp(raw);
        assert_eq!(ts.to_string(), "2024-03-15 13:45:30");
        assert_eq!(ts.to_unix_seconds(), 1_710_510_330);
    }

    #[test]
    fn test_dos_epoch() {
        // 1980-01-01 00:00:00
        let ts = DosTimestamp((1 << 21) | (1 << 16));
        assert_eq!(ts.to_unix_seconds(), 315_532_800);
    }
}
