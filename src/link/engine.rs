//! The two-pass link engine (spec §4.D): the only public entry point this
//! crate exposes for driving a link (§6: "only `LinkEngine::link(...)` and
//! its supporting types are part of the public surface").

use super::image::Image;
use super::library::{LibraryFile, LibraryIndex};
use super::map::{BlockMapEntry, EntryMapEntry, ExternalMapEntry, ExternalResolution, LoadMap, ModuleMap, StartAddress};
use super::model::{Block, BlockHandle, Module, ModuleHandle, Symbol, BLOCK_TYPE_ORDER, INITIAL_BLOCK_LIMIT};
use crate::dataset::DatasetReader;
use crate::error::{Error, LinkError, Result};
use crate::ident::Ident;
use crate::loader::{
    peek_table_type, skip_table, table_word_count, BlockDescriptor, BlockLocation, BlockTypeCode, Brt, BrtBody,
    Dft, EntryDescriptor, Pdt, PdtHeaderEntry, TableType, Trailer, Txt, WordCursor, Xrt, HEADER_ENTRY_MAGIC,
};
use crate::options::ParseOptions;
use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use core::ops::Range;
use std::io::{Read, Seek};

/// Blanket marker so the engine can accept any `Read + Seek` input file as a
/// trait object (a dataset and a plain in-memory `Cursor` both qualify).
pub trait InputFile: Read + Seek {}
impl<T: Read + Seek + ?Sized> InputFile for T {}

/// The caller-supplied emission timestamp and linker identity (spec §7
/// [CFG-CLOCK]): kept out of the library so emission stays a pure function
/// of its inputs.
#[derive(Debug, Clone, Copy)]
pub struct BuildStamp {
    pub date: Ident,
    pub time: Ident,
    pub linker_name: Ident,
    pub linker_version: Ident,
}

/// Everything a completed (possibly partially failed, per §7) link produced.
#[derive(Debug, Clone)]
pub struct LinkOutput {
    /// The absolute program image, word address 0 through HLM.
    pub image: Vec<u8>,
    /// The emitted output PDT, as loader-table bytes.
    pub pdt: Vec<u8>,
    /// The emitted output TXT, as loader-table bytes.
    pub txt: Vec<u8>,
    pub errors: Vec<LinkError>,
    pub load_map: LoadMap,
}

impl LinkOutput {
    /// `true` iff nothing in `errors` was recorded (spec §7: a non-empty
    /// `LinkError` vector is the signal a caller should translate into a
    /// failing exit status).
    pub fn is_successful(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Clone)]
struct PendingPatch {
    txts: Vec<Txt>,
    brt: Option<Brt>,
    xrt: Option<Xrt>,
}

struct ParsedGroup {
    pdt: Pdt,
    txts: Vec<Txt>,
    brt: Option<Brt>,
    xrt: Option<Xrt>,
}

/// Drives a link across a set of object files and libraries, in the order
/// supplied (spec §4.D: "each pass iterates input files in command-line
/// order").
pub struct LinkEngine {
    opts: ParseOptions,
    modules: Vec<Module>,
    pending: Vec<PendingPatch>,
    symbols: Vec<Symbol>,
    entry_symbols: BTreeMap<Ident, usize>,
    libraries: Vec<LibraryFile>,
    library_index: LibraryIndex,
    link_errors: Vec<LinkError>,
    hlm: u32,
}

impl LinkEngine {
    pub fn new(opts: ParseOptions) -> Self {
        LinkEngine {
            opts,
            modules: Vec::new(),
            pending: Vec::new(),
            symbols: Vec::new(),
            entry_symbols: BTreeMap::new(),
            libraries: Vec::new(),
            library_index: LibraryIndex::new(),
            link_errors: Vec::new(),
            hlm: INITIAL_BLOCK_LIMIT,
        }
    }

    /// Links `inputs` (each a dataset opened by the caller) into a single
    /// absolute program, producing a [`LinkOutput`].
    pub fn link(mut self, inputs: Vec<alloc::boxed::Box<dyn InputFile>>, stamp: BuildStamp) -> Result<LinkOutput> {
        for input in inputs {
            let bytes = drain_dataset(input)?;
            let tables = scan_tables(&bytes)?;
            if tables.is_empty() {
                continue;
            }
            if tables[0].1 == TableType::Dft {
                self.ingest_library_file(&bytes, &tables)?;
            } else {
                for group_range in group_modules(&tables) {
                    let parsed = parse_group(&bytes[group_range], &self.opts)?;
                    self.load_module(parsed, false);
                }
            }
        }

        self.resolve_externals();
        self.layout();
        self.adjust_entry_points();

        let image_size = (self.hlm as usize) * 8;
        let mut image = Image::new(image_size);
        for module_index in 0..self.modules.len() {
            if self.modules[module_index].do_load {
                self.patch_module(module_index, &mut image);
            }
        }
        self.record_unsatisfied_externals();

        let (pdt, txt) = self.emit(&image, &stamp);
        let load_map = self.build_load_map();

        Ok(LinkOutput { image: image.bytes, pdt, txt, errors: self.link_errors, load_map })
    }

    fn ingest_library_file(&mut self, bytes: &[u8], tables: &[(u64, TableType, Range<usize>)]) -> Result<()> {
        let dft_range = tables[0].2.clone();
        let mut cursor = WordCursor::new(&bytes[dft_range]);
        let header_w = cursor.read_word()?;
        let dft = Dft::parse(header_w, &mut cursor)?;

        let module_ranges = group_modules(&tables[1..]);
        let mut groups = Vec::with_capacity(module_ranges.len());
        for r in &module_ranges {
            groups.push(bytes[r.clone()].to_vec());
        }
        if groups.len() != dft.modules.len() {
            #[cfg(feature = "log")]
            log::warn!(
                "library directory lists {} modules but {} PDT groups were found; trusting the PDT scan",
                dft.modules.len(),
                groups.len()
            );
        }

        let lib_idx = self.libraries.len();
        let collisions = self.library_index.register_library(lib_idx, &dft);
        for name in collisions {
            #[cfg(feature = "log")]
            log::warn!("duplicate library export {name}, keeping the first registration");
            #[cfg(not(feature = "log"))]
            let _ = name;
        }
        let loaded = vec![None; dft.modules.len()];
        self.libraries.push(LibraryFile { label: format!("library#{lib_idx}"), dft, groups, loaded });
        Ok(())
    }

    fn ensure_library_module_loaded(&mut self, lib_idx: usize, mod_pos: usize) -> Option<usize> {
        if let Some(existing) = self.libraries[lib_idx].loaded[mod_pos] {
            return Some(existing);
        }
        let group_bytes = match self.libraries[lib_idx].groups.get(mod_pos) {
            Some(bytes) => bytes.clone(),
            None => {
                self.link_errors.push(LinkError::MissingLibraryPdt {
                    module: self.libraries[lib_idx].dft.modules[mod_pos].name.trimmed().into(),
                    library: self.libraries[lib_idx].label.clone(),
                });
                return None;
            }
        };
        let parsed = match parse_group(&group_bytes, &self.opts) {
            Ok(p) => p,
            Err(_) => {
                self.link_errors.push(LinkError::MissingLibraryPdt {
                    module: self.libraries[lib_idx].dft.modules[mod_pos].name.trimmed().into(),
                    library: self.libraries[lib_idx].label.clone(),
                });
                return None;
            }
        };
        let module_index = self.load_module(parsed, true);
        self.libraries[lib_idx].loaded[mod_pos] = Some(module_index);
        Some(module_index)
    }

    fn load_module(&mut self, parsed: ParsedGroup, is_library_module: bool) -> usize {
        let ParsedGroup { pdt, txts, brt, xrt } = parsed;

        let blocks: Vec<Block> = pdt
            .blocks
            .iter()
            .map(|bd: &BlockDescriptor| Block {
                name: bd.name,
                block_type: bd.block_type,
                location: bd.location,
                absolute: bd.absolute,
                error: bd.error,
                origin: bd.origin,
                length: bd.length,
                base_address: 0,
            })
            .collect();
        for bd in &pdt.blocks {
            if bd.error {
                #[cfg(feature = "log")]
                log::warn!("block {} in module {} carries a propagated error flag", bd.name, pdt.header.module_name);
                self.link_errors.push(LinkError::SourceBlockError {
                    module: pdt.header.module_name.trimmed().into(),
                    block: bd.name.trimmed().into(),
                });
            }
        }
        let primary_block_index = blocks.iter().position(|b| b.block_type == BlockTypeCode::Code).unwrap_or(0);

        let module_index = self.modules.len();
        let entry_names: Vec<Ident> = pdt.entries.iter().map(|e| e.name).collect();
        let module = Module {
            name: pdt.header.module_name,
            absolute: pdt.header.absolute,
            blocks,
            external_refs: pdt.externals.clone(),
            comment: pdt.trailer.comment.clone(),
            is_library_module,
            entry_names,
            do_load: true,
        };
        self.modules.push(module);

        for ed in &pdt.entries {
            if self.entry_symbols.contains_key(&ed.name) {
                self.link_errors.push(LinkError::DuplicateEntry { name: ed.name.trimmed().into() });
                continue;
            }
            let handle = BlockHandle { module: ModuleHandle(module_index), index: primary_block_index };
            let symbol = Symbol { name: ed.name, block: handle, value: ed.value, parcel_address: ed.parcel_address, primary: ed.primary };
            let sym_idx = self.symbols.len();
            self.symbols.push(symbol);
            self.entry_symbols.insert(ed.name, sym_idx);
        }

        self.pending.push(PendingPatch { txts, brt, xrt });
        module_index
    }

    /// Spec §4.D step 4: resolve externals, recursively pulling in any
    /// library module an unresolved one points to.
    fn resolve_externals(&mut self) {
        let mut queue: Vec<usize> = (0..self.modules.len()).collect();
        let mut queued = vec![true; self.modules.len()];
        let mut i = 0;
        while i < queue.len() {
            let module_index = queue[i];
            i += 1;
            let refs = self.modules[module_index].external_refs.clone();
            for name in refs {
                if self.entry_symbols.contains_key(&name) {
                    continue;
                }
                if let Some((lib_idx, mod_pos)) = self.library_index.lookup(&name) {
                    if let Some(new_index) = self.ensure_library_module_loaded(lib_idx, mod_pos) {
                        if new_index >= queued.len() {
                            queued.resize(new_index + 1, false);
                        }
                        if !queued[new_index] {
                            queued[new_index] = true;
                            queue.push(new_index);
                        }
                    }
                }
            }
        }
    }

    /// Spec §4.D step 6, extended with the "per-type image chain" fusion
    /// rule from §9 — restricted to the Common/TaskCom block types, where
    /// it models Fortran `COMMON`/task-common semantics: blocks there that
    /// share a name across modules occupy one base address, sized to the
    /// widest request. Every other block type lays out each module's block
    /// as its own contiguous region, even when two modules happen to share
    /// a block name, so distinct Code/Data/Const/Dynamic/Mixed blocks never
    /// overlay one another's TXT payload.
    fn layout(&mut self) {
        let mut block_limit: u32 = INITIAL_BLOCK_LIMIT;
        for &block_type in BLOCK_TYPE_ORDER.iter() {
            for module in self.modules.iter_mut() {
                if !module.do_load {
                    continue;
                }
                for block in module.blocks.iter_mut() {
                    if block.block_type != block_type || !block.absolute {
                        continue;
                    }
                    block.base_address = 0;
                    block_limit = block_limit.max(block.origin + block.length);
                }
            }

            if fuses_by_name(block_type) {
                let mut order: Vec<Ident> = Vec::new();
                let mut widest: BTreeMap<Ident, u32> = BTreeMap::new();
                for module in self.modules.iter() {
                    if !module.do_load {
                        continue;
                    }
                    for block in &module.blocks {
                        if block.block_type != block_type || block.absolute {
                            continue;
                        }
                        if !widest.contains_key(&block.name) {
                            order.push(block.name);
                        }
                        let entry = widest.entry(block.name).or_insert(0);
                        if block.length > *entry {
                            *entry = block.length;
                        }
                    }
                }
                let mut base_of: BTreeMap<Ident, u32> = BTreeMap::new();
                for name in &order {
                    base_of.insert(*name, block_limit);
                    block_limit += widest[name];
                }
                for module in self.modules.iter_mut() {
                    if !module.do_load {
                        continue;
                    }
                    for block in module.blocks.iter_mut() {
                        if block.block_type == block_type && !block.absolute {
                            block.base_address = base_of[&block.name];
                        }
                    }
                }
            } else {
                for module in self.modules.iter_mut() {
                    if !module.do_load {
                        continue;
                    }
                    for block in module.blocks.iter_mut() {
                        if block.block_type != block_type || block.absolute {
                            continue;
                        }
                        block.base_address = block_limit;
                        block_limit += block.length;
                    }
                }
            }
        }
        self.hlm = block_limit;
    }

    /// Spec §4.D step 7.
    fn adjust_entry_points(&mut self) {
        for index in 0..self.symbols.len() {
            let (module_idx, block_idx) = {
                let handle = self.symbols[index].block;
                (handle.module.0, handle.index)
            };
            let base = self
                .modules
                .get(module_idx)
                .and_then(|m| m.block(block_idx))
                .map(|b| b.base_address as u64)
                .unwrap_or(0);
            let symbol = &mut self.symbols[index];
            symbol.value = symbol.value.wrapping_add(if symbol.parcel_address { base * 4 } else { base });
        }
    }

    fn patch_module(&mut self, module_index: usize, image: &mut Image) {
        let module_name = self.modules[module_index].name;
        let blocks = self.modules[module_index].blocks.clone();
        let external_refs = self.modules[module_index].external_refs.clone();
        let PendingPatch { txts, brt, xrt } = self.pending[module_index].clone();

        for txt in &txts {
            let block = match blocks.get(txt.dest_block_index as usize) {
                Some(b) => b,
                None => {
                    self.link_errors.push(LinkError::BlockIndexOutOfRange {
                        module: module_name.trimmed().into(),
                        index: txt.dest_block_index as u32,
                    });
                    continue;
                }
            };
            let dst_byte = (block.base_address as usize + txt.load_addr as usize) * 8;
            if let Err(LinkError::ImageOverflow { offset, len, image_size }) = image.load_words(dst_byte, &txt.words) {
                self.link_errors.push(LinkError::ImageOverflow { offset, len, image_size });
            }
        }

        if let Some(brt) = &brt {
            match &brt.body {
                BrtBody::Standard(entries) => {
                    for e in entries {
                        let target = match blocks.get(e.block_index as usize) {
                            Some(b) => b,
                            None => {
                                self.link_errors.push(LinkError::BlockIndexOutOfRange {
                                    module: module_name.trimmed().into(),
                                    index: e.block_index as u32,
                                });
                                continue;
                            }
                        };
                        let byte_addr = (target.base_address as usize * 4 + e.parcel_address as usize) * 2;
                        let bit_addr = (byte_addr as u64) * 8;
                        let delta: u64 =
                            if e.parcel_flag { (target.base_address as u64) << 2 } else { target.base_address as u64 };
                        let current = image.read_field(bit_addr, 24);
                        let updated = current.wrapping_add(delta) & 0x00FF_FFFF;
                        image.write_field(bit_addr, 24, updated);
                    }
                }
                BrtBody::Extended(entries) => {
                    for e in entries {
                        let target = match blocks.get(e.block_index as usize) {
                            Some(b) => b,
                            None => {
                                self.link_errors.push(LinkError::BlockIndexOutOfRange {
                                    module: module_name.trimmed().into(),
                                    index: e.block_index as u32,
                                });
                                continue;
                            }
                        };
                        let bit_addr = e.bit_address as u64 + (target.base_address as u64) * 64;
                        let l = e.field_width();
                        let mask = field_mask(l);
                        let raw = image.read_field(bit_addr, l);
                        let delta = if e.parcel_flag { (target.base_address as u64) << 2 } else { target.base_address as u64 };
                        let updated = if e.negative_flag { raw.wrapping_sub(delta) } else { raw.wrapping_add(delta) };
                        image.write_field(bit_addr, l, updated & mask);
                    }
                }
            }
        }

        if let Some(xrt) = &xrt {
            for e in &xrt.entries {
                let target = match blocks.get(e.block_index as usize) {
                    Some(b) => b,
                    None => {
                        self.link_errors.push(LinkError::BlockIndexOutOfRange {
                            module: module_name.trimmed().into(),
                            index: e.block_index as u32,
                        });
                        continue;
                    }
                };
                let ext_name = match external_refs.get(e.external_index as usize) {
                    Some(n) => *n,
                    None => {
                        self.link_errors.push(LinkError::BlockIndexOutOfRange {
                            module: module_name.trimmed().into(),
                            index: e.external_index as u32,
                        });
                        continue;
                    }
                };
                let symbol = match self.entry_symbols.get(&ext_name) {
                    Some(&idx) => self.symbols[idx],
                    None => continue, // unsatisfied; reported once in record_unsatisfied_externals
                };
                let bit_addr = e.bit_address as u64 + (target.base_address as u64) * 64;
                let l = e.field_width();
                let mask = field_mask(l);
                let raw = image.read_field(bit_addr, l);
                let delta = match (e.parcel_flag, symbol.parcel_address) {
                    (true, true) => symbol.value,
                    (true, false) => symbol.value << 2,
                    (false, true) => symbol.value >> 2,
                    (false, false) => symbol.value,
                };
                image.write_field(bit_addr, l, raw.wrapping_add(delta) & mask);
            }
        }
    }

    fn record_unsatisfied_externals(&mut self) {
        for module in &self.modules {
            if !module.do_load {
                continue;
            }
            for name in &module.external_refs {
                if !self.entry_symbols.contains_key(name) {
                    self.link_errors.push(LinkError::UnsatisfiedExternal {
                        name: name.trimmed().into(),
                        referencing_module: module.name.trimmed().into(),
                    });
                }
            }
        }
    }

    fn emit(&self, image: &Image, stamp: &BuildStamp) -> (Vec<u8>, Vec<u8>) {
        let start = INITIAL_BLOCK_LIMIT;
        let length = self.hlm.saturating_sub(start);
        let block = BlockDescriptor {
            name: Ident::from("PROGRAM"),
            absolute: true,
            error: false,
            length,
            origin: start,
            block_type: BlockTypeCode::Code,
            location: BlockLocation::CentralMemory,
        };

        let primary_symbol = self.symbols.iter().find(|s| s.primary).copied();
        let entries = match primary_symbol {
            Some(sym) => {
                vec![EntryDescriptor { name: sym.name, primary: true, parcel_address: sym.parcel_address, value: sym.value }]
            }
            None => {
                #[cfg(feature = "log")]
                log::warn!("no primary entry symbol found; emitting a program with no start address");
                Vec::new()
            }
        };

        let pdt = Pdt {
            header: PdtHeaderEntry { module_name: Ident::from("LINKOUT"), absolute: true, machine_extensions: HEADER_ENTRY_MAGIC },
            blocks: vec![block],
            entries,
            externals: Vec::new(),
            trailer: Trailer {
                date: stamp.date,
                time: stamp.time,
                os_identifier: Ident::from("COS"),
                linker_name: stamp.linker_name,
                linker_version: stamp.linker_version,
                comment: String::new(),
            },
        };

        let start_byte = (start as usize) * 8;
        let end_byte = (self.hlm as usize) * 8;
        let mut words = Vec::with_capacity(length as usize);
        let mut off = start_byte;
        while off < end_byte {
            let w = u64::from_be_bytes(image.bytes[off..off + 8].try_into().unwrap());
            words.push(w);
            off += 8;
        }
        let txt = Txt { dest_block_index: 0, load_addr: start, words };

        (pdt.emit(), txt.emit())
    }

    fn build_load_map(&self) -> LoadMap {
        let mut modules = Vec::new();
        for (module_index, module) in self.modules.iter().enumerate() {
            if !module.do_load {
                continue;
            }
            let blocks: Vec<BlockMapEntry> = module
                .blocks
                .iter()
                .enumerate()
                .map(|(i, b)| BlockMapEntry { name: b.name, block_type: b.block_type, index: i, base_address: b.base_address, length: b.length })
                .collect();
            let entries: Vec<EntryMapEntry> = self
                .symbols
                .iter()
                .filter(|s| s.block.module.0 == module_index)
                .map(|s| EntryMapEntry { name: s.name, value: s.value, parcel_address: s.parcel_address })
                .collect();
            let externals: Vec<ExternalMapEntry> = module
                .external_refs
                .iter()
                .map(|name| {
                    let resolution = match self.entry_symbols.get(name) {
                        Some(&idx) => {
                            let symbol = &self.symbols[idx];
                            let resolving_module = self.modules[symbol.block.module.0].name;
                            ExternalResolution::Resolved { resolving_module, address: symbol.value }
                        }
                        None => ExternalResolution::Unsatisfied,
                    };
                    ExternalMapEntry { name: *name, resolution }
                })
                .collect();
            modules.push(ModuleMap { name: module.name, blocks, entries, externals });
        }

        let start_address = self.symbols.iter().find(|s| s.primary).map(|s| {
            if s.parcel_address {
                StartAddress { word: (s.value >> 2) as u32, parcel: (s.value & 0b11) as u8 }
            } else {
                StartAddress { word: s.value as u32, parcel: 0 }
            }
        });

        LoadMap {
            modules,
            total_length_words: self.hlm.saturating_sub(INITIAL_BLOCK_LIMIT),
            hlm: self.hlm,
            start_address,
        }
    }
}

/// Only `Common`/`TaskCom` blocks fuse same-named instances onto a shared
/// base address (Fortran `COMMON`/task-common semantics, spec §9's "common
/// blocks from different modules fuse at the same base address"). Every
/// other block type is laid out per-instance, per [`LinkEngine::layout`].
fn fuses_by_name(block_type: BlockTypeCode) -> bool {
    matches!(block_type, BlockTypeCode::Common | BlockTypeCode::TaskCom)
}

fn field_mask(length: u8) -> u64 {
    if length >= 64 {
        u64::MAX
    } else {
        (1u64 << length) - 1
    }
}

/// Drains an entire dataset (every record, file, to end-of-data) into one
/// flat byte buffer, so the table scanner below can treat a whole input file
/// as one contiguous stream of loader tables (spec §4.D: "peek the first 8
/// bytes ... otherwise the file is a plain object file").
fn drain_dataset<R: Read + Seek>(inner: R) -> Result<Vec<u8>> {
    use crate::dataset::ControlWordKind;

    let mut reader = DatasetReader::new(inner)?;
    let mut out = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = reader.read(&mut chunk)?;
        if n == 0 {
            if matches!(reader.read_control_word().map(|cw| cw.kind), Some(ControlWordKind::Eod)) {
                break;
            }
            continue;
        }
        out.extend_from_slice(&chunk[..n]);
    }
    Ok(out)
}

/// Scans a flat byte buffer into its top-level tables: `(header_word, type,
/// byte_range_including_header)`.
fn scan_tables(bytes: &[u8]) -> Result<Vec<(u64, TableType, Range<usize>)>> {
    let mut cursor = WordCursor::new(bytes);
    let mut out = Vec::new();
    while cursor.remaining_words() > 0 {
        let start_word = cursor.position_words();
        let header = cursor.read_word()?;
        let ty = peek_table_type(header)?;
        let wc = table_word_count(header, ty);
        if wc == 0 {
            return Err(Error::Format("table declares zero words including its own header".into()));
        }
        cursor.skip_words(wc - 1)?;
        out.push((header, ty, start_word * 8..(start_word + wc) * 8));
    }
    Ok(out)
}

/// Groups consecutive tables into module groups, each starting at a PDT and
/// running through any following TXT/BRT/XRT/unparsed tables up to (but not
/// including) the next PDT or DFT.
fn group_modules(tables: &[(u64, TableType, Range<usize>)]) -> Vec<Range<usize>> {
    let mut groups = Vec::new();
    let mut i = 0;
    while i < tables.len() {
        if tables[i].1 != TableType::Pdt {
            i += 1;
            continue;
        }
        let start = tables[i].2.start;
        let mut j = i + 1;
        while j < tables.len() && tables[j].1 != TableType::Pdt && tables[j].1 != TableType::Dft {
            j += 1;
        }
        let end = tables[j - 1].2.end;
        groups.push(start..end);
        i = j;
    }
    groups
}

/// Parses one module group (a PDT followed by its TXT/BRT/XRT tables) out of
/// an isolated byte slice.
fn parse_group(bytes: &[u8], opts: &ParseOptions) -> Result<ParsedGroup> {
    let mut cursor = WordCursor::new(bytes);
    let header = cursor.read_word()?;
    let ty = peek_table_type(header)?;
    if ty != TableType::Pdt {
        return Err(Error::Format("module group does not start with a PDT".into()));
    }
    let pdt = Pdt::parse(header, &mut cursor, opts)?;

    let mut txts = Vec::new();
    let mut brt = None;
    let mut xrt = None;
    while cursor.remaining_words() > 0 {
        let h = cursor.read_word()?;
        let t = peek_table_type(h)?;
        match t {
            TableType::Txt => txts.push(Txt::parse_bounded(h, &mut cursor)?),
            TableType::Brt => brt = Some(Brt::parse(h, &mut cursor)?),
            TableType::Xrt => xrt = Some(Xrt::parse(h, &mut cursor)?),
            TableType::Pwt | TableType::Dmt | TableType::Smt | TableType::Dpt => {
                skip_table(&mut cursor, h, t)?;
            }
            TableType::Pdt | TableType::Dft => {
                return Err(Error::Format("unexpected table inside a module group".into()));
            }
        }
    }
    Ok(ParsedGroup { pdt, txts, brt, xrt })
}
