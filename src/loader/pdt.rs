//! Program Description Table (PDT): spec §4.B.

use super::cursor::{field, pack};
use super::{header_word, TableType, WordCursor, WordWriter};
use crate::error::{Error, Result};
use crate::ident::Ident;
use crate::options::{ParseOptions, Permissive};
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

/// Bit ranges within the PDT header word, past the universal type tag
/// (bits 60-63) and the generic word-count field (bits 4-27).
///
/// The specification gives the block-descriptor-word-count field as bits
/// 56-63, which would overlap the type tag; this module instead uses bits
/// 56-59 (4 bits) so the two fields stay disjoint (see crate design notes).
const EXTERNAL_COUNT_LO: u32 = 28;
const EXTERNAL_COUNT_HI: u32 = 41;
const ENTRY_COUNT_LO: u32 = 42;
const ENTRY_COUNT_HI: u32 = 55;
const BLOCK_COUNT_LO: u32 = 56;
const BLOCK_COUNT_HI: u32 = 59;

/// Number of words in the fixed header entry following the PDT header word.
pub const HEADER_ENTRY_WORDS: usize = 20;
/// Number of words in the fixed trailer preceding the optional comment.
pub const TRAILER_WORDS: usize = 11;

/// Magic constant for "machine type extensions, calling sequence, PDT type"
/// written verbatim into the header entry on emission (spec §9 Open
/// Question (b)): its bit-level derivation isn't documented anywhere this
/// crate's corpus reaches, so it is reproduced bit-exact rather than
/// decomposed into named sub-fields.
pub const HEADER_ENTRY_MAGIC: u64 = 0x0980_0000_0000_0000;

/// The 20-word block following the PDT header word: module identity plus
/// the undocumented machine/calling-sequence word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdtHeaderEntry {
    pub module_name: Ident,
    pub absolute: bool,
    pub machine_extensions: u64,
}

impl PdtHeaderEntry {
    fn parse(cursor: &mut WordCursor) -> Result<Self> {
        let module_name = cursor.read_ident()?;
        let flags = cursor.read_word()?;
        let absolute = field(flags, 0, 0) != 0;
        let machine_extensions = cursor.read_word()?;
        cursor.skip_words(HEADER_ENTRY_WORDS - 3)?;
        Ok(PdtHeaderEntry { module_name, absolute, machine_extensions })
    }

    fn emit(&self, out: &mut WordWriter) {
        out.write_ident(&self.module_name);
        out.write_word(pack(0, 0, self.absolute as u64));
        out.write_word(self.machine_extensions);
        for _ in 0..HEADER_ENTRY_WORDS - 3 {
            out.write_word(0);
        }
    }
}

/// A COS block type, folding any unrecognised on-disk code to `Mixed` with
/// a warning (spec §4.B: "Unknown types fold to Mixed with a warning").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockTypeCode {
    Common,
    Mixed,
    Code,
    Data,
    Const,
    Dynamic,
    TaskCom,
}

impl BlockTypeCode {
    fn from_code(code: u64, opts: &ParseOptions) -> Result<Self> {
        let result: core::result::Result<Self, String> = match code {
            0 => Ok(BlockTypeCode::Common),
            1 => Ok(BlockTypeCode::Mixed),
            2 => Ok(BlockTypeCode::Code),
            3 => Ok(BlockTypeCode::Data),
            4 => Ok(BlockTypeCode::Const),
            5 => Ok(BlockTypeCode::Dynamic),
            6 => Ok(BlockTypeCode::TaskCom),
            _ => Err(format!("unknown block type code {code}")),
        };
        result
            .or_permissive(opts, "block type code", BlockTypeCode::Mixed)
            .map_err(Error::Format)
    }

    fn to_code(self) -> u64 {
        match self {
            BlockTypeCode::Common => 0,
            BlockTypeCode::Mixed => 1,
            BlockTypeCode::Code => 2,
            BlockTypeCode::Data => 3,
            BlockTypeCode::Const => 4,
            BlockTypeCode::Dynamic => 5,
            BlockTypeCode::TaskCom => 6,
        }
    }
}

/// Where a non-absolute block lives: central memory or extended memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockLocation {
    CentralMemory,
    ExtendedMemory,
}

impl BlockLocation {
    fn from_code(code: u64) -> BlockLocation {
        if code == 2 {
            BlockLocation::ExtendedMemory
        } else {
            BlockLocation::CentralMemory
        }
    }

    fn to_code(self) -> u64 {
        match self {
            BlockLocation::CentralMemory => 0,
            BlockLocation::ExtendedMemory => 2,
        }
    }
}

/// One block descriptor (2 words): spec §4.B.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockDescriptor {
    pub name: Ident,
    pub absolute: bool,
    pub error: bool,
    pub length: u32,
    /// Meaningful only when `absolute`.
    pub origin: u32,
    /// Meaningful only when `!absolute`.
    pub block_type: BlockTypeCode,
    /// Meaningful only when `!absolute`.
    pub location: BlockLocation,
}

impl BlockDescriptor {
    fn parse(cursor: &mut WordCursor, opts: &ParseOptions) -> Result<Self> {
        let name = cursor.read_ident()?;
        let w = cursor.read_word()?;
        let absolute = field(w, 0, 0) != 0;
        let error = field(w, 1, 1) != 0;
        let length = field(w, 40, 63) as u32;
        let origin = field(w, 16, 39) as u32;
        let block_type = BlockTypeCode::from_code(field(w, 2, 11), opts)?;
        let location = BlockLocation::from_code(field(w, 12, 15));
        Ok(BlockDescriptor { name, absolute, error, length, origin, block_type, location })
    }

    fn emit(&self, out: &mut WordWriter) {
        out.write_ident(&self.name);
        let w = pack(0, 0, self.absolute as u64)
            | pack(1, 1, self.error as u64)
            | pack(2, 11, self.block_type.to_code())
            | pack(12, 15, self.location.to_code())
            | pack(16, 39, self.origin as u64)
            | pack(40, 63, self.length as u64);
        out.write_word(w);
    }
}

/// One entry descriptor (3 words): name, flags, value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDescriptor {
    pub name: Ident,
    pub primary: bool,
    pub parcel_address: bool,
    pub value: u64,
}

impl EntryDescriptor {
    fn parse(cursor: &mut WordCursor) -> Result<Self> {
        let name = cursor.read_ident()?;
        let flags = cursor.read_word()?;
        let primary = field(flags, 0, 0) != 0;
        let parcel_address = field(flags, 1, 1) != 0;
        let value = cursor.read_word()?;
        Ok(EntryDescriptor { name, primary, parcel_address, value })
    }

    fn emit(&self, out: &mut WordWriter) {
        out.write_ident(&self.name);
        out.write_word(pack(0, 0, self.primary as u64) | pack(1, 1, self.parcel_address as u64));
        out.write_word(self.value);
    }
}

/// The fixed 11-word trailer plus optional comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trailer {
    /// `MM/DD/YY`, exactly 8 ASCII bytes.
    pub date: Ident,
    /// `HH:MM:SS`, exactly 8 ASCII bytes.
    pub time: Ident,
    pub os_identifier: Ident,
    pub linker_name: Ident,
    pub linker_version: Ident,
    pub comment: String,
}

impl Trailer {
    fn parse(cursor: &mut WordCursor) -> Result<Self> {
        let date = cursor.read_ident()?;
        let time = cursor.read_ident()?;
        let os_identifier = cursor.read_ident()?;
        cursor.skip_words(1)?; // reserved OS-identifier continuation word
        let linker_name = cursor.read_ident()?;
        let linker_version = cursor.read_ident()?;
        cursor.skip_words(TRAILER_WORDS - 6)?;
        let remaining = cursor.remaining_words();
        let mut comment_bytes = Vec::with_capacity(remaining * 8);
        for _ in 0..remaining {
            comment_bytes.extend_from_slice(&cursor.read_word()?.to_be_bytes());
        }
        let comment = String::from_utf8_lossy(&comment_bytes)
            .trim_end_matches(|c| c == '\0' || c == ' ')
            .into();
        Ok(Trailer { date, time, os_identifier, linker_name, linker_version, comment })
    }

    fn emit(&self, out: &mut WordWriter) {
        out.write_ident(&self.date);
        out.write_ident(&self.time);
        out.write_ident(&self.os_identifier);
        out.write_word(0);
        out.write_ident(&self.linker_name);
        out.write_ident(&self.linker_version);
        for _ in 0..TRAILER_WORDS - 6 {
            out.write_word(0);
        }
        let mut bytes = self.comment.as_bytes().to_vec();
        while bytes.len() % 8 != 0 {
            bytes.push(0);
        }
        out.bytes.extend_from_slice(&bytes);
    }
}

/// A fully decoded Program Description Table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pdt {
    pub header: PdtHeaderEntry,
    pub blocks: Vec<BlockDescriptor>,
    pub entries: Vec<EntryDescriptor>,
    pub externals: Vec<Ident>,
    pub trailer: Trailer,
}

impl Pdt {
    /// Parses a PDT given its already-read header word and a cursor
    /// positioned at the word immediately following it.
    pub fn parse(header_w: u64, cursor: &mut WordCursor, opts: &ParseOptions) -> Result<Self> {
        let external_count = field(header_w, EXTERNAL_COUNT_LO, EXTERNAL_COUNT_HI) as usize;
        let entry_count = field(header_w, ENTRY_COUNT_LO, ENTRY_COUNT_HI) as usize;
        let block_count = field(header_w, BLOCK_COUNT_LO, BLOCK_COUNT_HI) as usize;

        let header = PdtHeaderEntry::parse(cursor)?;

        let mut blocks = Vec::with_capacity(block_count);
        for _ in 0..block_count {
            blocks.push(BlockDescriptor::parse(cursor, opts)?);
        }

        let mut entries = Vec::with_capacity(entry_count);
        for _ in 0..entry_count {
            entries.push(EntryDescriptor::parse(cursor)?);
        }

        let mut externals = Vec::with_capacity(external_count);
        for _ in 0..external_count {
            externals.push(cursor.read_ident()?);
        }

        let trailer = Trailer::parse(cursor)?;

        Ok(Pdt { header, blocks, entries, externals, trailer })
    }

    /// Emits this PDT, including its header word, returning the full word
    /// sequence (header word included).
    pub fn emit(&self) -> Vec<u8> {
        let mut out = WordWriter::new();
        out.write_word(0); // placeholder header, patched below
        self.header.emit(&mut out);
        for b in &self.blocks {
            b.emit(&mut out);
        }
        for e in &self.entries {
            e.emit(&mut out);
        }
        for x in &self.externals {
            out.write_ident(x);
        }
        self.trailer.emit(&mut out);

        let header_w = header_word(TableType::Pdt, out.word_count())
            | pack(EXTERNAL_COUNT_LO, EXTERNAL_COUNT_HI, self.externals.len() as u64)
            | pack(ENTRY_COUNT_LO, ENTRY_COUNT_HI, self.entries.len() as u64)
            | pack(BLOCK_COUNT_LO, BLOCK_COUNT_HI, self.blocks.len() as u64);
        out.patch_word(0, header_w);
        out.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Pdt {
        Pdt {
            header: PdtHeaderEntry {
                module_name: Ident::from("MAIN"),
                absolute: true,
                machine_extensions: HEADER_ENTRY_MAGIC,
            },
            blocks: alloc::vec![BlockDescriptor {
                name: Ident::from("CODE"),
                absolute: true,
                error: false,
                length: 1,
                origin: 0o200,
                block_type: BlockTypeCode::Code,
                location: BlockLocation::CentralMemory,
            }],
            entries: alloc::vec![EntryDescriptor {
                name: Ident::from("MAIN"),
                primary: true,
                parcel_address: true,
                value: 0o200 * 4,
            }],
            externals: Vec::new(),
            trailer: Trailer {
                date: Ident::from("01/01/86"),
                time: Ident::from("00:00:00"),
                os_identifier: Ident::from("COS"),
                linker_name: Ident::from("CRAYLINK"),
                linker_version: Ident::from("0.1.0"),
                comment: String::new(),
            },
        }
    }

    #[test]
    fn round_trips_through_emit_and_parse() {
        let pdt = sample();
        let bytes = pdt.emit();
        let mut cursor = WordCursor::new(&bytes);
        let header_w = cursor.read_word().unwrap();
        assert_eq!(super::super::peek_table_type(header_w).unwrap(), TableType::Pdt);
        let parsed = Pdt::parse(header_w, &mut cursor, &ParseOptions::strict()).unwrap();
        assert_eq!(parsed, pdt);
    }

    #[test]
    fn unknown_block_type_is_strict_error_but_permissive_mixed() {
        assert!(BlockTypeCode::from_code(9, &ParseOptions::strict()).is_err());
        assert_eq!(
            BlockTypeCode::from_code(9, &ParseOptions::permissive()).unwrap(),
            BlockTypeCode::Mixed
        );
    }
}
