//! Library-module bookkeeping (spec §3 "Library", §4.D steps 4-5).
//!
//! A library file is scanned twice, per the crate's design notes: once
//! cheaply by its Directory File Table (just names, to know what a library
//! *could* supply) and once, lazily and only for modules actually selected,
//! by the PDT/TXT/BRT/XRT group that table names (the expensive ingest). This
//! module holds the state for both: [`LibraryIndex`] answers "who exports
//! this name", [`LibraryFile`] holds the raw bytes an ingest needs once the
//! answer is "yes, load it".

use crate::ident::Ident;
use crate::loader::Dft;
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

/// One library input file: its directory plus the raw bytes of each
/// module's PDT+TXT+BRT+XRT group, in the same relative order as
/// `dft.modules` (this crate treats a library file as one DFT followed by
/// per-module groups in DFT order).
pub struct LibraryFile {
    pub label: String,
    pub dft: Dft,
    pub groups: Vec<Vec<u8>>,
    /// The module index in the engine's module list, once ingested; `None`
    /// until this position's `doLoad` flag flips (spec §4.D step 5).
    pub loaded: Vec<Option<usize>>,
}

/// Maps an entry name to the library file and module position that exports
/// it, built once from every library's DFT.
#[derive(Default)]
pub struct LibraryIndex {
    by_entry_name: BTreeMap<Ident, (usize, usize)>,
}

impl LibraryIndex {
    pub fn new() -> Self {
        LibraryIndex::default()
    }

    /// Registers every entry name a library's modules export. Returns names
    /// that collided with an already-registered export — the earlier
    /// registration is kept (spec §7: "duplicate library-module names,
    /// first wins").
    pub fn register_library(&mut self, lib_idx: usize, dft: &Dft) -> Vec<Ident> {
        let mut collisions = Vec::new();
        for (mod_pos, module) in dft.modules.iter().enumerate() {
            for entry in &module.entries {
                if self.by_entry_name.contains_key(entry) {
                    collisions.push(*entry);
                } else {
                    self.by_entry_name.insert(*entry, (lib_idx, mod_pos));
                }
            }
        }
        collisions
    }

    pub fn lookup(&self, name: &Ident) -> Option<(usize, usize)> {
        self.by_entry_name.get(name).copied()
    }
}
