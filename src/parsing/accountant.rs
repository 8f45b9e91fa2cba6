//! Header size accounting.
//!
//! Every field of a block header is read through a [`SizeAccountant`], which
//! charges the field's width against the header size the block declared.
//! Whatever the known fields leave over is surfaced as an opaque trailing
//! segment, so the next block always starts where the declared size says.

use log::trace;

use crate::cursor::{ByteCursor, TextEncoding};
use crate::error::{RarError, Result, StructuralFault};
use crate::field::{FieldKind, FieldValue};

/// Running "declared minus consumed" counter for one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeAccountant {
    offset: u64,
    consumed_bits: u64,
    declared: Option<u64>,
    following: u64,
}

impl SizeAccountant {
    /// Start accounting for a block at byte `offset`, nothing consumed yet.
    pub fn new(offset: u64) -> Self {
        Self {
            offset,
            consumed_bits: 0,
            declared: None,
            following: 0,
        }
    }

    /// Byte offset of the block being accounted.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Whole bytes consumed so far (partial bytes are not counted).
    pub fn consumed(&self) -> u64 {
        self.consumed_bits / 8
    }

    pub fn declared(&self) -> Option<u64> {
        self.declared
    }

    /// Fix the header size once its size field (and extension) is read.
    pub fn declare(&mut self, size: u64) {
        self.declared = Some(size);
    }

    /// Fail if the declared size cannot hold `minimum` bytes of fixed fields.
    pub fn require_minimum(&self, minimum: u64) -> Result<()> {
        match self.declared {
            Some(declared) if declared < minimum => Err(RarError::structural(
                self.offset,
                StructuralFault::HeaderTooSmall { declared, minimum },
            )),
            _ => Ok(()),
        }
    }

    /// Record bytes that belong to the block but follow its header
    /// (packed data, nested blocks).
    pub fn follow(&mut self, bytes: u64) {
        self.following = self.following.saturating_add(bytes);
    }

    /// Declared header size plus everything recorded with [`follow`].
    ///
    /// `None` until the header size is known.
    ///
    /// [`follow`]: Self::follow
    pub fn extent(&self) -> Option<u64> {
        self.declared
            .map(|declared| declared.saturating_add(self.following))
    }

    /// Declared size minus consumed bytes; negative when the header overran.
    ///
    /// Before a size is declared this is minus the bytes consumed.
    pub fn remaining(&self) -> i64 {
        self.declared.unwrap_or(0) as i64 - self.consumed() as i64
    }

    /// Read one field and charge its width.
    ///
    /// Once a size is declared, a field that would not fit inside it is
    /// refused before anything is read.
    pub fn take(&mut self, cursor: &mut dyn ByteCursor, kind: FieldKind) -> Result<FieldValue> {
        let width = kind.bit_width();
        if let Some(declared) = self.declared {
            let after = self.consumed_bits.saturating_add(width);
            if after > declared.saturating_mul(8) {
                return Err(RarError::structural(
                    self.offset,
                    StructuralFault::NegativeRemainder {
                        declared,
                        consumed: after.div_ceil(8),
                    },
                ));
            }
        }
        let value = kind.read(cursor)?;
        self.consumed_bits += value.bit_width();
        Ok(value)
    }

    pub fn u8(&mut self, cursor: &mut dyn ByteCursor) -> Result<u8> {
        Ok(self.uint(cursor, FieldKind::UInt8)? as u8)
    }

    pub fn u16(&mut self, cursor: &mut dyn ByteCursor) -> Result<u16> {
        Ok(self.uint(cursor, FieldKind::UInt16)? as u16)
    }

    pub fn u32(&mut self, cursor: &mut dyn ByteCursor) -> Result<u32> {
        Ok(self.uint(cursor, FieldKind::UInt32)? as u32)
    }

    pub fn u64(&mut self, cursor: &mut dyn ByteCursor) -> Result<u64> {
        self.uint(cursor, FieldKind::UInt64)
    }

    pub fn bit(&mut self, cursor: &mut dyn ByteCursor) -> Result<bool> {
        Ok(self.uint(cursor, FieldKind::Bit)? != 0)
    }

    pub fn bits(&mut self, cursor: &mut dyn ByteCursor, count: u32) -> Result<u64> {
        self.uint(cursor, FieldKind::Bits(count))
    }

    pub fn text(
        &mut self,
        cursor: &mut dyn ByteCursor,
        len: u64,
        encoding: TextEncoding,
    ) -> Result<String> {
        Ok(self.take(cursor, FieldKind::Text(len, encoding))?.into_text())
    }

    fn uint(&mut self, cursor: &mut dyn ByteCursor, kind: FieldKind) -> Result<u64> {
        // Integer kinds always yield a numeric value.
        Ok(self.take(cursor, kind)?.as_u64().unwrap_or_default())
    }

    /// Byte count of the trailing segment left by the known fields.
    pub fn trailing_len(&self) -> Result<u64> {
        let declared = self.declared.unwrap_or(0);
        match u64::try_from(self.remaining()) {
            Ok(len) => Ok(len),
            Err(_) => Err(RarError::structural(
                self.offset,
                StructuralFault::NegativeRemainder {
                    declared,
                    consumed: self.consumed(),
                },
            )),
        }
    }

    /// Read the trailing segment, reconciling consumed with declared.
    ///
    /// Yields nothing when the header is exactly accounted for.
    pub fn finish(&mut self, cursor: &mut dyn ByteCursor) -> Result<Vec<u8>> {
        let len = self.trailing_len()?;
        if len == 0 {
            return Ok(Vec::new());
        }
        trace!(
            "block at {}: {} trailing header bytes",
            self.offset,
            len
        );
        Ok(self.take(cursor, FieldKind::Bytes(len))?.into_bytes())
    }

    /// Skip the trailing segment without keeping it; returns its length.
    pub fn skip_trailing(&mut self, cursor: &mut dyn ByteCursor) -> Result<u64> {
        let len = self.trailing_len()?;
        if len > 0 {
            let target = cursor.position() + len * 8;
            cursor.seek(target)?;
            self.consumed_bits += len * 8;
        }
        Ok(len)
    }
}
