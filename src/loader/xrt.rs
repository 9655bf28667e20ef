//! External Relocation Table (XRT): spec §4.B — inter-module reference fix-ups.

use super::cursor::{field, pack};
use super::{header_word, TableType, WordCursor, WordWriter};
use crate::error::Result;
use alloc::vec::Vec;

/// One XRT entry, one per word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XrtEntry {
    pub block_index: u8,
    pub parcel_flag: bool,
    pub external_index: u16,
    /// Field width in bits; `0` means 64 (spec §4.B).
    pub field_width_code: u8,
    pub bit_address: u32,
}

impl XrtEntry {
    pub fn field_width(&self) -> u8 {
        if self.field_width_code == 0 {
            64
        } else {
            self.field_width_code
        }
    }

    fn from_word(word: u64) -> Self {
        XrtEntry {
            block_index: field(word, 57, 63) as u8,
            parcel_flag: field(word, 56, 56) != 0,
            external_index: field(word, 42, 55) as u16,
            field_width_code: field(word, 36, 41) as u8,
            bit_address: field(word, 0, 29) as u32,
        }
    }

    fn to_word(self) -> u64 {
        pack(57, 63, self.block_index as u64)
            | pack(56, 56, self.parcel_flag as u64)
            | pack(42, 55, self.external_index as u64)
            | pack(36, 41, self.field_width_code as u64)
            | pack(0, 29, self.bit_address as u64)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Xrt {
    pub entries: Vec<XrtEntry>,
}

impl Xrt {
    pub fn parse(header_w: u64, cursor: &mut WordCursor) -> Result<Self> {
        let wc = super::word_count(header_w, TableType::Xrt);
        let payload_words = wc.saturating_sub(1);
        let mut entries = Vec::with_capacity(payload_words);
        for _ in 0..payload_words {
            entries.push(XrtEntry::from_word(cursor.read_word()?));
        }
        Ok(Xrt { entries })
    }

    pub fn emit(&self) -> Vec<u8> {
        let mut out = WordWriter::new();
        out.write_word(header_word(TableType::Xrt, self.entries.len() + 1));
        for e in &self.entries {
            out.write_word(e.to_word());
        }
        out.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let xrt = Xrt {
            entries: alloc::vec![XrtEntry {
                block_index: 2,
                parcel_flag: false,
                external_index: 7,
                field_width_code: 22,
                bit_address: 0,
            }],
        };
        let bytes = xrt.emit();
        let mut cursor = WordCursor::new(&bytes);
        let header = cursor.read_word().unwrap();
        let parsed = Xrt::parse(header, &mut cursor).unwrap();
        assert_eq!(parsed, xrt);
    }
}
