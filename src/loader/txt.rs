//! Text Table (TXT): spec §4.B — payload bytes destined for one block.

use super::cursor::{field, pack};
use super::{header_word, TableType, WordCursor, WordWriter};
use crate::error::{Error, Result};
use alloc::vec::Vec;

const DEST_BLOCK_LO: u32 = 32;
const DEST_BLOCK_HI: u32 = 38;
const RELOC_MODE_BIT: u32 = 39;
const LOAD_ADDR_LO: u32 = 40;
const LOAD_ADDR_HI: u32 = 63;

/// A Text Table: raw words to be loaded at `load_addr` within the block
/// named by `dest_block_index`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Txt {
    pub dest_block_index: u8,
    pub load_addr: u32,
    /// Raw payload words, in file order.
    pub words: Vec<u64>,
}

impl Txt {
    pub fn parse(header_w: u64, cursor: &mut WordCursor) -> Result<Self> {
        let reloc_mode = field(header_w, RELOC_MODE_BIT, RELOC_MODE_BIT);
        if reloc_mode != 0 {
            return Err(Error::Format("TXT relocation-mode bit must be zero".into()));
        }
        let dest_block_index = field(header_w, DEST_BLOCK_LO, DEST_BLOCK_HI) as u8;
        let load_addr = field(header_w, LOAD_ADDR_LO, LOAD_ADDR_HI) as u32;
        let payload_words = cursor.remaining_words();
        let mut words = Vec::with_capacity(payload_words);
        for _ in 0..payload_words {
            words.push(cursor.read_word()?);
        }
        Ok(Txt { dest_block_index, load_addr, words })
    }

    /// Only consumes the payload words named by the table's own word count,
    /// leaving any following tables in `cursor` untouched (used when a TXT
    /// shares a buffer with subsequent tables, unlike the single-table
    /// buffers `parse` above assumes in isolation).
    pub fn parse_bounded(header_w: u64, cursor: &mut WordCursor) -> Result<Self> {
        let reloc_mode = field(header_w, RELOC_MODE_BIT, RELOC_MODE_BIT);
        if reloc_mode != 0 {
            return Err(Error::Format("TXT relocation-mode bit must be zero".into()));
        }
        let dest_block_index = field(header_w, DEST_BLOCK_LO, DEST_BLOCK_HI) as u8;
        let load_addr = field(header_w, LOAD_ADDR_LO, LOAD_ADDR_HI) as u32;
        let wc = super::word_count(header_w, TableType::Txt);
        if wc == 0 {
            return Err(Error::Format("TXT declares zero words including its header".into()));
        }
        let mut words = Vec::with_capacity(wc - 1);
        for _ in 0..wc - 1 {
            words.push(cursor.read_word()?);
        }
        Ok(Txt { dest_block_index, load_addr, words })
    }

    pub fn emit(&self) -> Vec<u8> {
        let mut out = WordWriter::new();
        let header = header_word(TableType::Txt, self.words.len() + 1)
            | pack(DEST_BLOCK_LO, DEST_BLOCK_HI, self.dest_block_index as u64)
            | pack(LOAD_ADDR_LO, LOAD_ADDR_HI, self.load_addr as u64);
        out.write_word(header);
        for w in &self.words {
            out.write_word(*w);
        }
        out.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let txt = Txt { dest_block_index: 3, load_addr: 0o200, words: alloc::vec![0x10, 0x20, 0x30] };
        let bytes = txt.emit();
        let mut cursor = WordCursor::new(&bytes);
        let header = cursor.read_word().unwrap();
        let parsed = Txt::parse_bounded(header, &mut cursor).unwrap();
        assert_eq!(parsed, txt);
    }
}
