//! Decoded primitive fields.
//!
//! A [`FieldValue`] knows its own width, which is what the
//! [`SizeAccountant`](crate::parsing::SizeAccountant) charges against a
//! block's declared header size.

use crate::cursor::{ByteCursor, TextEncoding};
use crate::error::Result;

/// Shape of a field about to be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Bit,
    /// A run of 1..=64 bits.
    Bits(u32),
    /// Raw bytes of the given length.
    Bytes(u64),
    /// Text of the given byte length.
    Text(u64, TextEncoding),
}

impl FieldKind {
    /// Width in bits.
    pub fn bit_width(self) -> u64 {
        match self {
            Self::UInt8 => 8,
            Self::UInt16 => 16,
            Self::UInt32 => 32,
            Self::UInt64 => 64,
            Self::Bit => 1,
            Self::Bits(n) => n as u64,
            Self::Bytes(len) | Self::Text(len, _) => len.saturating_mul(8),
        }
    }

    pub fn read(self, cursor: &mut dyn ByteCursor) -> Result<FieldValue> {
        Ok(match self {
            Self::UInt8 => FieldValue::UInt8(cursor.read_uint(1)? as u8),
            Self::UInt16 => FieldValue::UInt16(cursor.read_uint(2)? as u16),
            Self::UInt32 => FieldValue::UInt32(cursor.read_uint(4)? as u32),
            Self::UInt64 => FieldValue::UInt64(cursor.read_uint(8)?),
            Self::Bit => FieldValue::Bit(cursor.read_bits(1)? != 0),
            Self::Bits(width) => FieldValue::Bits {
                value: cursor.read_bits(width)?,
                width,
            },
            Self::Bytes(len) => FieldValue::Bytes(cursor.read_bytes(len)?),
            Self::Text(len, encoding) => {
                let raw = cursor.read_bytes(len)?;
                FieldValue::Text {
                    value: encoding.decode(&raw),
                    byte_len: len,
                }
            }
        })
    }
}

/// A decoded primitive together with its on-disk width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Bit(bool),
    Bits { value: u64, width: u32 },
    Bytes(Vec<u8>),
    Text { value: String, byte_len: u64 },
}

impl FieldValue {
    pub fn bit_width(&self) -> u64 {
        match self {
            Self::UInt8(_) => 8,
            Self::UInt16(_) => 16,
            Self::UInt32(_) => 32,
            Self::UInt64(_) => 64,
            Self::Bit(_) => 1,
            Self::Bits { width, .. } => *width as u64,
            Self::Bytes(b) => b.len() as u64 * 8,
            Self::Text { byte_len, .. } => byte_len * 8,
        }
    }

    /// Numeric value of integer and bit fields.
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Self::UInt8(v) => Some(v as u64),
            Self::UInt16(v) => Some(v as u64),
            Self::UInt32(v) => Some(v as u64),
            Self::UInt64(v) => Some(v),
            Self::Bit(b) => Some(b as u64),
            Self::Bits { value, .. } => Some(value),
            Self::Bytes(_) | Self::Text { .. } => None,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Bytes(b) => b,
            Self::Text { value, .. } => value.into_bytes(),
            other => other.as_u64().unwrap_or(0).to_le_bytes().to_vec(),
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Self::Text { value, .. } => value,
            Self::Bytes(b) => TextEncoding::Latin1.decode(&b),
            other => other.as_u64().unwrap_or(0).to_string(),
        }
    }
}
