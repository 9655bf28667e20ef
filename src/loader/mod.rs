//! The loader-table codec (spec §4.B): parsing and emitting the eight COS
//! loader-table layouts as sequences of bit-precise 64-bit words.
//!
//! Every table opens with a header word whose top 4 bits name its
//! [`TableType`]. The [`crate::link`] engine parses PDT, TXT, BRT, XRT, and
//! DFT; the remaining types (PWT, DMT, SMT, DPT) are only ever skipped, so
//! this module exposes just enough of them ([`TableType`] recognition and
//! [`skip_table`]) to let the engine step over them.
//!
//! A note on bit layout: this specification fixes some sub-fields (PDT
//! block descriptor, TXT header, BRT/XRT entries) bit-for-bit, but a few —
//! noted inline — would overlap the universal top-4-bit type tag if taken
//! completely literally. Those are resolved here with adjusted, disjoint
//! bit ranges and recorded as judgment calls in this crate's design notes,
//! the same way spec §9's own Open Question (a) resolves a self-disagreeing
//! field by picking one reading and documenting it.

mod cursor;
mod pdt;
mod txt;
mod brt;
mod xrt;
mod dft;

pub use cursor::{WordCursor, WordWriter};
pub use pdt::{
    BlockDescriptor, BlockLocation, BlockTypeCode, EntryDescriptor, Pdt, PdtHeaderEntry, Trailer,
    HEADER_ENTRY_MAGIC,
};
pub use txt::Txt;
pub use brt::{Brt, BrtBody, BrtExtendedEntry, BrtStandardEntry};
pub use xrt::{Xrt, XrtEntry};
pub use dft::{Dft, DftModule};

use crate::error::{Error, Result};
use cursor::field;

/// The nine loader-table types, tagged by the top 4 bits of every table's
/// header word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableType {
    Pwt,
    Dmt,
    Dft,
    Smt,
    Dpt,
    Xrt,
    Brt,
    Txt,
    Pdt,
}

impl TableType {
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0o006 => Some(TableType::Pwt),
            0o007 => Some(TableType::Dmt),
            0o010 => Some(TableType::Dft),
            0o011 => Some(TableType::Smt),
            0o013 => Some(TableType::Dpt),
            0o014 => Some(TableType::Xrt),
            0o015 => Some(TableType::Brt),
            0o016 => Some(TableType::Txt),
            0o017 => Some(TableType::Pdt),
            _ => None,
        }
    }

    pub fn tag(self) -> u8 {
        match self {
            TableType::Pwt => 0o006,
            TableType::Dmt => 0o007,
            TableType::Dft => 0o010,
            TableType::Smt => 0o011,
            TableType::Dpt => 0o013,
            TableType::Xrt => 0o014,
            TableType::Brt => 0o015,
            TableType::Txt => 0o016,
            TableType::Pdt => 0o017,
        }
    }
}

/// Bit range (inclusive, LSB-counted) of the table-type tag, common to
/// every header word.
const TYPE_LO: u32 = 60;
const TYPE_HI: u32 = 63;

/// Bit range of the generic word-count field, used by every table except DFT.
const WORD_COUNT_LO: u32 = 4;
const WORD_COUNT_HI: u32 = 27;

/// Bit range of the DFT's own word-count field.
const DFT_WORD_COUNT_LO: u32 = 16;
const DFT_WORD_COUNT_HI: u32 = 39;

/// Reads the table type out of a table's first (header) word without
/// consuming anything, mirroring the link engine's "peek the first 8 bytes"
/// step (spec §4.D) used to distinguish a library (DFT-first) from a plain
/// object file.
pub fn peek_table_type(header_word: u64) -> Result<TableType> {
    let tag = field(header_word, TYPE_LO, TYPE_HI) as u8;
    TableType::from_tag(tag).ok_or_else(|| Error::Format(alloc::format!("unrecognised table type tag {tag:#o}")))
}

/// Public wrapper over [`word_count`] for callers outside this module (the
/// link engine, scanning a file's table stream one table at a time).
pub fn table_word_count(header_word: u64, table_type: TableType) -> usize {
    word_count(header_word, table_type)
}

fn word_count(header_word: u64, table_type: TableType) -> usize {
    if table_type == TableType::Dft {
        field(header_word, DFT_WORD_COUNT_LO, DFT_WORD_COUNT_HI) as usize
    } else {
        field(header_word, WORD_COUNT_LO, WORD_COUNT_HI) as usize
    }
}

fn header_word(table_type: TableType, word_count: usize) -> u64 {
    let wc_field = if table_type == TableType::Dft {
        cursor::pack(DFT_WORD_COUNT_LO, DFT_WORD_COUNT_HI, word_count as u64)
    } else {
        cursor::pack(WORD_COUNT_LO, WORD_COUNT_HI, word_count as u64)
    };
    cursor::pack(TYPE_LO, TYPE_HI, table_type.tag() as u64) | wc_field
}

/// Skips an unparsed table (PWT, DMT, SMT, DPT): `(wordCount - 1) * 8` bytes
/// of payload following the already-consumed header word.
pub fn skip_table(cursor: &mut WordCursor, header: u64, table_type: TableType) -> Result<()> {
    let wc = word_count(header, table_type);
    if wc == 0 {
        return Err(Error::Format("table declares zero words including its own header".into()));
    }
    cursor.skip_words(wc - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_every_tag() {
        for (tag, expect) in [
            (0o006u8, TableType::Pwt),
            (0o007, TableType::Dmt),
            (0o010, TableType::Dft),
            (0o011, TableType::Smt),
            (0o013, TableType::Dpt),
            (0o014, TableType::Xrt),
            (0o015, TableType::Brt),
            (0o016, TableType::Txt),
            (0o017, TableType::Pdt),
        ] {
            assert_eq!(TableType::from_tag(tag), Some(expect));
            assert_eq!(expect.tag(), tag);
        }
    }

    #[test]
    fn header_word_round_trips_type_and_count() {
        let h = header_word(TableType::Txt, 42);
        assert_eq!(peek_table_type(h).unwrap(), TableType::Txt);
        assert_eq!(word_count(h, TableType::Txt), 42);
    }

    #[test]
    fn dft_uses_its_own_word_count_field() {
        let h = header_word(TableType::Dft, 1000);
        assert_eq!(peek_table_type(h).unwrap(), TableType::Dft);
        assert_eq!(word_count(h, TableType::Dft), 1000);
    }

    #[test]
    fn unrecognised_tag_is_an_error() {
        let h = cursor::pack(TYPE_LO, TYPE_HI, 0o012);
        assert!(peek_table_type(h).is_err());
    }
}
