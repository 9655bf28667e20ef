//! Block Relocation Table (BRT): spec §4.B — intra-program address fix-ups.
//!
//! Two independent wire formats share one table type, selected by bit 28 of
//! the header word ("X"): standard entries pack two per word; extended
//! entries take a full word each and carry an arbitrary-width bit address
//! for use with the [`crate::bitfield`] engine.

use super::cursor::{field, pack};
use super::{header_word, TableType, WordCursor, WordWriter};
use crate::error::Result;
use alloc::vec::Vec;

const FORMAT_BIT: u32 = 28;

/// One standard-format entry: a 24-bit parcel address plus the block it
/// targets, packed two per word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrtStandardEntry {
    pub block_index: u8,
    pub parcel_flag: bool,
    pub parcel_address: u32,
}

/// Sentinel standard entry that readers silently ignore (spec §4.B).
const FILLER_BLOCK_INDEX: u8 = 0x7F;
const FILLER_PARCEL_ADDRESS: u32 = 0xFF_FFFF;

impl BrtStandardEntry {
    fn is_filler(&self) -> bool {
        self.block_index == FILLER_BLOCK_INDEX && self.parcel_address == FILLER_PARCEL_ADDRESS
    }

    fn from_half(half: u64) -> Self {
        BrtStandardEntry {
            block_index: field(half, 25, 31) as u8,
            parcel_flag: field(half, 24, 24) != 0,
            parcel_address: field(half, 0, 23) as u32,
        }
    }

    fn to_half(self) -> u64 {
        pack(25, 31, self.block_index as u64) | pack(24, 24, self.parcel_flag as u64) | pack(0, 23, self.parcel_address as u64)
    }
}

/// One extended-format entry: a wide (1-64 bit) field addressed directly by
/// its global bit address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrtExtendedEntry {
    pub block_index: u8,
    /// Field width in bits; `0` means 64 (spec §4.B).
    pub field_width_code: u8,
    pub parcel_flag: bool,
    pub negative_flag: bool,
    pub bit_address: u32,
}

impl BrtExtendedEntry {
    /// The effective field width, resolving the `0 => 64` encoding.
    pub fn field_width(&self) -> u8 {
        if self.field_width_code == 0 {
            64
        } else {
            self.field_width_code
        }
    }

    fn from_word(word: u64) -> Self {
        BrtExtendedEntry {
            block_index: field(word, 57, 63) as u8,
            field_width_code: field(word, 51, 56) as u8,
            parcel_flag: field(word, 50, 50) != 0,
            negative_flag: field(word, 49, 49) != 0,
            bit_address: field(word, 0, 29) as u32,
        }
    }

    fn to_word(self) -> u64 {
        pack(57, 63, self.block_index as u64)
            | pack(51, 56, self.field_width_code as u64)
            | pack(50, 50, self.parcel_flag as u64)
            | pack(49, 49, self.negative_flag as u64)
            | pack(0, 29, self.bit_address as u64)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrtBody {
    Standard(Vec<BrtStandardEntry>),
    Extended(Vec<BrtExtendedEntry>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Brt {
    pub body: BrtBody,
}

impl Brt {
    pub fn parse(header_w: u64, cursor: &mut WordCursor) -> Result<Self> {
        let extended = field(header_w, FORMAT_BIT, FORMAT_BIT) != 0;
        let wc = super::word_count(header_w, TableType::Brt);
        let payload_words = wc.saturating_sub(1);
        let body = if extended {
            let mut entries = Vec::with_capacity(payload_words);
            for _ in 0..payload_words {
                entries.push(BrtExtendedEntry::from_word(cursor.read_word()?));
            }
            BrtBody::Extended(entries)
        } else {
            let mut entries = Vec::with_capacity(payload_words * 2);
            for _ in 0..payload_words {
                let word = cursor.read_word()?;
                let first = BrtStandardEntry::from_half((word >> 32) & 0xFFFF_FFFF);
                let second = BrtStandardEntry::from_half(word & 0xFFFF_FFFF);
                if !first.is_filler() {
                    entries.push(first);
                }
                if !second.is_filler() {
                    entries.push(second);
                }
            }
            BrtBody::Standard(entries)
        };
        Ok(Brt { body })
    }

    pub fn emit(&self) -> Vec<u8> {
        let mut out = WordWriter::new();
        let (extended, payload_words) = match &self.body {
            BrtBody::Standard(entries) => (false, entries.len().div_ceil(2)),
            BrtBody::Extended(entries) => (true, entries.len()),
        };
        let header = header_word(TableType::Brt, payload_words + 1) | pack(FORMAT_BIT, FORMAT_BIT, extended as u64);
        out.write_word(header);
        match &self.body {
            BrtBody::Standard(entries) => {
                let filler = BrtStandardEntry {
                    block_index: FILLER_BLOCK_INDEX,
                    parcel_flag: false,
                    parcel_address: FILLER_PARCEL_ADDRESS,
                };
                let mut it = entries.iter().copied();
                loop {
                    let first = match it.next() {
                        Some(e) => e,
                        None => break,
                    };
                    let second = it.next().unwrap_or(filler);
                    out.write_word((first.to_half() << 32) | second.to_half());
                }
            }
            BrtBody::Extended(entries) => {
                for e in entries {
                    out.write_word(e.to_word());
                }
            }
        }
        out.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_round_trips_with_filler_padding() {
        let brt = Brt {
            body: BrtBody::Standard(alloc::vec![BrtStandardEntry {
                block_index: 5,
                parcel_flag: true,
                parcel_address: 0o1234,
            }]),
        };
        let bytes = brt.emit();
        let mut cursor = WordCursor::new(&bytes);
        let header = cursor.read_word().unwrap();
        let parsed = Brt::parse(header, &mut cursor).unwrap();
        assert_eq!(parsed, brt);
    }

    #[test]
    fn extended_round_trips() {
        let brt = Brt {
            body: BrtBody::Extended(alloc::vec![BrtExtendedEntry {
                block_index: 1,
                field_width_code: 0,
                parcel_flag: false,
                negative_flag: false,
                bit_address: 0,
            }]),
        };
        let bytes = brt.emit();
        let mut cursor = WordCursor::new(&bytes);
        let header = cursor.read_word().unwrap();
        let parsed = Brt::parse(header, &mut cursor).unwrap();
        assert_eq!(parsed, brt);
        if let BrtBody::Extended(entries) = &parsed.body {
            assert_eq!(entries[0].field_width(), 64);
        } else {
            panic!("expected extended body");
        }
    }
}
