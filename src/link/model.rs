//! The in-memory module/block/symbol graph built by pass 1 (spec §3, §4.D).

use crate::ident::Ident;
use crate::loader::{BlockLocation, BlockTypeCode};
use alloc::string::String;
use alloc::vec::Vec;

/// Layout order walked during pass 1 step 6 (spec §4.D).
pub const BLOCK_TYPE_ORDER: [BlockTypeCode; 7] = [
    BlockTypeCode::Code,
    BlockTypeCode::Mixed,
    BlockTypeCode::Const,
    BlockTypeCode::Common,
    BlockTypeCode::TaskCom,
    BlockTypeCode::Data,
    BlockTypeCode::Dynamic,
];

/// Reserved low memory; the first relocatable block's base address (spec §4.D step 6).
pub const INITIAL_BLOCK_LIMIT: u32 = 0o200;

/// Index of a [`Module`] within [`crate::link::engine::LinkEngine`]'s module list.
///
/// Symbols reference blocks by `(ModuleHandle, usize)` rather than by
/// pointer (spec §9 "Block membership and indexing"), so the symbol table
/// survives independent of any reallocation of the module list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModuleHandle(pub usize);

/// A block, addressed by owning module plus its ordinal index within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockHandle {
    pub module: ModuleHandle,
    pub index: usize,
}

/// A contiguous named region of storage, owned by exactly one [`Module`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub name: Ident,
    pub block_type: BlockTypeCode,
    pub location: BlockLocation,
    pub absolute: bool,
    pub error: bool,
    pub origin: u32,
    pub length: u32,
    /// Assigned once, during layout (pass 1 step 6); `0` beforehand.
    pub base_address: u32,
}

/// An entry or start symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbol {
    pub name: Ident,
    pub block: BlockHandle,
    /// Raw value as read from the PDT entry descriptor; adjusted in place
    /// by pass 1 step 7 once `block.base_address` is known.
    pub value: u64,
    pub parcel_address: bool,
    /// Mirrors [`crate::loader::EntryDescriptor::primary`]; at most one
    /// loaded symbol should carry this (spec §4.D emission: "zero or one
    /// primary entry").
    pub primary: bool,
}

/// A unit of relocatable (or absolute) code: one PDT's worth of blocks,
/// entries, and external references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub name: Ident,
    pub absolute: bool,
    pub blocks: Vec<Block>,
    pub external_refs: Vec<Ident>,
    pub comment: String,
    /// `true` for a module ingested from a library rather than supplied
    /// directly as an object file.
    pub is_library_module: bool,
    /// Names this module exports, for library transitive-pull-in (spec §3
    /// "Module" / §4.D step 4).
    pub entry_names: Vec<Ident>,
    /// Set once this library module is selected by transitive external
    /// resolution; object modules are always `true`.
    pub do_load: bool,
}

impl Module {
    pub fn block(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }
}
