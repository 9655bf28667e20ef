//! Directory File Table (DFT): spec §4.B — a library's index of module
//! names and their blocks/entries/externals.
//!
//! The DFT's own header word carries only the table's overall word count
//! (bits 16-39, unlike every other table's bits 4-27). Per module it lists
//! a name word followed by a counts word using the same bit positions as a
//! [`crate::loader::pdt`] header (spec §4.B: "counts are in the same
//! positions as a PDT header but in the DFT's header word"), then that many
//! block/entry/external name words.

use super::cursor::field;
use super::{header_word, TableType, WordCursor, WordWriter};
use crate::error::Result;
use crate::ident::Ident;
use alloc::vec::Vec;

const EXTERNAL_COUNT_LO: u32 = 28;
const EXTERNAL_COUNT_HI: u32 = 41;
const ENTRY_COUNT_LO: u32 = 42;
const ENTRY_COUNT_HI: u32 = 55;
const BLOCK_COUNT_LO: u32 = 56;
const BLOCK_COUNT_HI: u32 = 59;

/// One module's listing within a DFT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DftModule {
    pub name: Ident,
    pub blocks: Vec<Ident>,
    pub entries: Vec<Ident>,
    pub externals: Vec<Ident>,
}

impl DftModule {
    fn parse(cursor: &mut WordCursor) -> Result<Self> {
        let name = cursor.read_ident()?;
        let counts = cursor.read_word()?;
        let block_count = field(counts, BLOCK_COUNT_LO, BLOCK_COUNT_HI) as usize;
        let entry_count = field(counts, ENTRY_COUNT_LO, ENTRY_COUNT_HI) as usize;
        let external_count = field(counts, EXTERNAL_COUNT_LO, EXTERNAL_COUNT_HI) as usize;

        let mut blocks = Vec::with_capacity(block_count);
        for _ in 0..block_count {
            blocks.push(cursor.read_ident()?);
        }
        let mut entries = Vec::with_capacity(entry_count);
        for _ in 0..entry_count {
            entries.push(cursor.read_ident()?);
        }
        let mut externals = Vec::with_capacity(external_count);
        for _ in 0..external_count {
            externals.push(cursor.read_ident()?);
        }
        Ok(DftModule { name, blocks, entries, externals })
    }

    fn emit(&self, out: &mut WordWriter) {
        out.write_ident(&self.name);
        let counts = super::cursor::pack(BLOCK_COUNT_LO, BLOCK_COUNT_HI, self.blocks.len() as u64)
            | super::cursor::pack(ENTRY_COUNT_LO, ENTRY_COUNT_HI, self.entries.len() as u64)
            | super::cursor::pack(EXTERNAL_COUNT_LO, EXTERNAL_COUNT_HI, self.externals.len() as u64);
        out.write_word(counts);
        for b in &self.blocks {
            out.write_ident(b);
        }
        for e in &self.entries {
            out.write_ident(e);
        }
        for x in &self.externals {
            out.write_ident(x);
        }
    }

    fn word_len(&self) -> usize {
        2 + self.blocks.len() + self.entries.len() + self.externals.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dft {
    pub modules: Vec<DftModule>,
}

impl Dft {
    /// Parses a DFT given its already-read header word and a cursor
    /// positioned at the word immediately following it.
    pub fn parse(header_w: u64, cursor: &mut WordCursor) -> Result<Self> {
        let wc = super::word_count(header_w, TableType::Dft);
        let payload_words = wc.saturating_sub(1);
        let end_words = cursor.position_words() + payload_words;
        let mut modules = Vec::new();
        while cursor.position_words() < end_words {
            modules.push(DftModule::parse(cursor)?);
        }
        Ok(Dft { modules })
    }

    pub fn emit(&self) -> Vec<u8> {
        let mut out = WordWriter::new();
        out.write_word(0);
        for m in &self.modules {
            m.emit(&mut out);
        }
        let header = header_word(TableType::Dft, out.word_count());
        out.patch_word(0, header);
        out.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_several_modules() {
        let dft = Dft {
            modules: alloc::vec![
                DftModule {
                    name: Ident::from("M1"),
                    blocks: alloc::vec![Ident::from("B1")],
                    entries: alloc::vec![Ident::from("X")],
                    externals: alloc::vec![Ident::from("Y")],
                },
                DftModule {
                    name: Ident::from("M2"),
                    blocks: Vec::new(),
                    entries: alloc::vec![Ident::from("Y")],
                    externals: Vec::new(),
                },
            ],
        };
        let bytes = dft.emit();
        let mut cursor = WordCursor::new(&bytes);
        let header = cursor.read_word().unwrap();
        assert_eq!(super::super::peek_table_type(header).unwrap(), TableType::Dft);
        let parsed = Dft::parse(header, &mut cursor).unwrap();
        assert_eq!(parsed, dft);
    }

    #[test]
    fn word_len_matches_emitted_size() {
        let m = DftModule {
            name: Ident::from("M"),
            blocks: alloc::vec![Ident::from("A"), Ident::from("B")],
            entries: Vec::new(),
            externals: Vec::new(),
        };
        let mut out = WordWriter::new();
        m.emit(&mut out);
        assert_eq!(out.word_count(), m.word_len());
    }
}
