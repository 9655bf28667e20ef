//! `craylink`: a COS 1.17 blocked-dataset codec and relocating linker for
//! Cray X-MP object code.
//!
//! Four cooperating pieces, leaves first:
//!
//! - [`bitfield`] — arbitrary-length bit-field read/write into a byte image.
//! - [`dataset`] — the COS blocked-record stream codec (control words,
//!   records, end-of-file/end-of-data).
//! - [`loader`] — the eight loader-table layouts (PDT, TXT, BRT, XRT, DFT,
//!   DPT, PWT, SMT) as sequences of bit-precise 64-bit words.
//! - [`link`] — the two-pass engine that drives the above to resolve
//!   references, lay out memory, relocate, and emit an absolute binary.
//!
//! `no_std` by default; the `alloc` feature (implied by `std`, which is the
//! crate default) is required for anything beyond the bitfield engine, since
//! tables, modules, and the image buffer are all heap-backed.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

pub mod bitfield;
pub mod ident;
pub mod options;

// `Error`/`LinkError` both hold `alloc::string::String` fields, so the
// module as a whole needs the `alloc` feature — consistent with this
// crate's own promise that only the bitfield engine compiles without it.
#[cfg(feature = "alloc")]
pub mod error;

#[cfg(feature = "alloc")]
pub mod loader;

// The blocked-dataset codec and link engine drive `std::io::{Read, Write,
// Seek}` file handles directly, so (unlike the table codec, which only
// needs an in-memory byte cursor) they require the `std` feature, not just
// `alloc`.
#[cfg(feature = "std")]
pub mod dataset;
#[cfg(feature = "std")]
pub mod link;

#[cfg(feature = "alloc")]
pub use error::{Error, Result};
pub use ident::Ident;
pub use options::{ParseMode, ParseOptions};
