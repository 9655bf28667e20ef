//! The COS blocked-record stream codec (spec §4.A).
//!
//! A dataset is a sequence of fixed-size 4096-byte blocks. Every block opens
//! with a Block Control Word (BCW); Record Control Words (RCWs), an
//! End-of-File (EOF), and an End-of-Data (EOD) word delimit records, files,
//! and the dataset within and across blocks. Control words are distinguished
//! by the top 4 bits ("M") of the word; the forward-word-index (FWI) chains
//! each control word to the next one in the *same* block (an FWI of zero
//! means "no further control word in this block" — the reader/writer keep
//! reading/writing straight through to the block boundary).
//!
//! The exact sub-fields of FWI/BWI/UBC below this crate's top-level M field
//! are not pinned down by bit position anywhere the original specification
//! is explicit about (unlike the loader tables in [`crate::loader`], whose
//! layouts are given bit-for-bit); the layout chosen here keeps a 4-bit M
//! field, a 24-bit FWI, a 24-bit BWI (meaningful only on a BCW), and a 6-bit
//! UBC (meaningful only on RCW/EOF), and is documented as a judgment call in
//! this crate's design notes rather than presented as a literal reproduction
//! of Cray's COS encoding.

mod reader;
mod writer;

pub use reader::DatasetReader;
pub use writer::DatasetWriter;

/// Bytes per block.
pub const BLOCK_BYTES: usize = 4096;
/// Words per block.
pub const WORDS_PER_BLOCK: usize = BLOCK_BYTES / 8;

/// The four control-word classes, distinguished by the top 4 bits of the word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlWordKind {
    /// `0000` — opens every block.
    Bcw,
    /// `1000` — closes a record.
    Eor,
    /// `1110` — closes a file.
    Eof,
    /// `1111` — closes the dataset.
    Eod,
}

impl ControlWordKind {
    fn from_m(m: u8) -> Option<Self> {
        match m {
            0b0000 => Some(ControlWordKind::Bcw),
            0b1000 => Some(ControlWordKind::Eor),
            0b1110 => Some(ControlWordKind::Eof),
            0b1111 => Some(ControlWordKind::Eod),
            _ => None,
        }
    }

    fn to_m(self) -> u8 {
        match self {
            ControlWordKind::Bcw => 0b0000,
            ControlWordKind::Eor => 0b1000,
            ControlWordKind::Eof => 0b1110,
            ControlWordKind::Eod => 0b1111,
        }
    }
}

/// A decoded control word: the kind plus the fields the reader needs to
/// continue (`fwi`) or that a caller might want to inspect (`ubc`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlWord {
    pub kind: ControlWordKind,
    /// Forward word index: offset in words, from this control word, to the
    /// next control word in the same block. Zero means none follows.
    pub fwi: u32,
    /// Backward block index: on a BCW, the number of blocks back to the
    /// previous BCW. Zero for the first block.
    pub bwi: u32,
    /// Unused-bit-count of the last data byte preceding this control word
    /// (meaningful on RCW/EOF; always zero for the byte-aligned records
    /// this crate produces and consumes).
    pub ubc: u8,
}

const M_SHIFT: u32 = 60;
const FWI_SHIFT: u32 = 36;
const FWI_MASK: u64 = (1 << 24) - 1;
const BWI_SHIFT: u32 = 12;
const BWI_MASK: u64 = (1 << 24) - 1;
const UBC_SHIFT: u32 = 6;
const UBC_MASK: u64 = (1 << 6) - 1;

fn encode_control_word(cw: ControlWord) -> u64 {
    ((cw.kind.to_m() as u64) << M_SHIFT)
        | (((cw.fwi as u64) & FWI_MASK) << FWI_SHIFT)
        | (((cw.bwi as u64) & BWI_MASK) << BWI_SHIFT)
        | (((cw.ubc as u64) & UBC_MASK) << UBC_SHIFT)
}

fn decode_control_word(word: u64) -> Option<ControlWord> {
    let m = ((word >> M_SHIFT) & 0xF) as u8;
    let kind = ControlWordKind::from_m(m)?;
    Some(ControlWord {
        kind,
        fwi: ((word >> FWI_SHIFT) & FWI_MASK) as u32,
        bwi: ((word >> BWI_SHIFT) & BWI_MASK) as u32,
        ubc: ((word >> UBC_SHIFT) & UBC_MASK) as u8,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_word_round_trips() {
        let cw = ControlWord { kind: ControlWordKind::Eor, fwi: 17, bwi: 0, ubc: 3 };
        let word = encode_control_word(cw);
        assert_eq!(decode_control_word(word), Some(cw));
    }

    #[test]
    fn unknown_m_decodes_to_none() {
        let word = 0b0101u64 << M_SHIFT;
        assert_eq!(decode_control_word(word), None);
    }
}
