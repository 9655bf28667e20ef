//! The two-pass COS linker (spec §4.D): consumes relocatable object modules
//! and libraries, resolves externals, lays out memory, applies BRT/XRT
//! relocation through [`crate::bitfield`], and emits an absolute PDT+TXT.

mod engine;
mod image;
mod library;
mod map;
mod model;

pub use engine::{BuildStamp, InputFile, LinkEngine, LinkOutput};
pub use image::Image;
pub use map::{BlockMapEntry, EntryMapEntry, ExternalMapEntry, ExternalResolution, LoadMap, ModuleMap, StartAddress};
pub use model::{Block, BlockHandle, Module, ModuleHandle, Symbol, BLOCK_TYPE_ORDER, INITIAL_BLOCK_LIMIT};
