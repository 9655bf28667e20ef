//! The load map (spec §6 "Load map"): a structured summary of a completed
//! link, handed back as data rather than a formatted report — rendering it
//! into text is a thin layer on top, left to a caller.

use crate::ident::Ident;
use crate::loader::BlockTypeCode;
use alloc::vec::Vec;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockMapEntry {
    pub name: Ident,
    pub block_type: BlockTypeCode,
    pub index: usize,
    pub base_address: u32,
    pub length: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryMapEntry {
    pub name: Ident,
    pub value: u64,
    pub parcel_address: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalResolution {
    /// `resolving_module` names the module whose entry symbol satisfied
    /// this external (spec §6 "Load map": "its externals (name, resolving
    /// module, address)").
    Resolved { resolving_module: Ident, address: u64 },
    Unsatisfied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExternalMapEntry {
    pub name: Ident,
    pub resolution: ExternalResolution,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleMap {
    pub name: Ident,
    pub blocks: Vec<BlockMapEntry>,
    pub entries: Vec<EntryMapEntry>,
    pub externals: Vec<ExternalMapEntry>,
}

/// Word address plus parcel index (spec §6: "start address (word + parcel
/// index)").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartAddress {
    pub word: u32,
    pub parcel: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadMap {
    pub modules: Vec<ModuleMap>,
    pub total_length_words: u32,
    pub hlm: u32,
    pub start_address: Option<StartAddress>,
}
