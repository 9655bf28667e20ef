//! A minimal big-endian, word-oriented cursor over loader-table bytes.
//!
//! Modeled on the teacher's `scroll::Pread`-based parsing idiom (an
//! explicit running offset, one field read per call, errors propagated
//! with `?`), but specialised to whole 64-bit words since every field in
//! §4.B lives inside one word or spans an integral number of them.

use crate::error::{Error, Result};
use crate::ident::Ident;
use alloc::vec::Vec;
use scroll::Pread;

/// Reads 64-bit big-endian words out of a byte slice.
pub struct WordCursor<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> WordCursor<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        WordCursor { bytes, offset: 0 }
    }

    /// Reads the next 64-bit big-endian word.
    pub fn read_word(&mut self) -> Result<u64> {
        self.bytes
            .gread_with::<u64>(&mut self.offset, scroll::BE)
            .map_err(Error::from)
    }

    /// Reads the next word as an [`Ident`].
    pub fn read_ident(&mut self) -> Result<Ident> {
        Ok(Ident::from_bytes(self.read_word()?.to_be_bytes()))
    }

    /// Skips `n` words without interpreting them (used for unparsed table
    /// types, per spec §4.B: "skipped by (wordCount−1)×8 bytes").
    pub fn skip_words(&mut self, n: usize) -> Result<()> {
        let bytes = n
            .checked_mul(8)
            .ok_or_else(|| Error::Format("word skip count overflowed".into()))?;
        if self.offset + bytes > self.bytes.len() {
            return Err(Error::Format("table truncated while skipping".into()));
        }
        self.offset += bytes;
        Ok(())
    }

    /// Number of whole words left unread.
    pub fn remaining_words(&self) -> usize {
        (self.bytes.len() - self.offset) / 8
    }

    pub fn position_words(&self) -> usize {
        self.offset / 8
    }
}

/// Accumulates 64-bit big-endian words into a byte buffer (patterned on the
/// teacher's `scroll::Pwrite`-style emission).
#[derive(Default)]
pub struct WordWriter {
    pub bytes: Vec<u8>,
}

impl WordWriter {
    pub fn new() -> Self {
        WordWriter { bytes: Vec::new() }
    }

    pub fn write_word(&mut self, word: u64) {
        self.bytes.extend_from_slice(&word.to_be_bytes());
    }

    pub fn write_ident(&mut self, ident: &Ident) {
        self.bytes.extend_from_slice(ident.as_bytes());
    }

    pub fn word_count(&self) -> usize {
        self.bytes.len() / 8
    }

    /// Patches a previously-written word (used to back-fill a header's
    /// word-count field once the table body has been emitted).
    pub fn patch_word(&mut self, word_index: usize, word: u64) {
        let start = word_index * 8;
        self.bytes[start..start + 8].copy_from_slice(&word.to_be_bytes());
    }
}

/// Extracts a bit field `value` where `lo..=hi` are bit indices counted from
/// the least-significant bit (bit 0), inclusive.
pub(crate) fn field(word: u64, lo: u32, hi: u32) -> u64 {
    debug_assert!(lo <= hi && hi < 64);
    let width = hi - lo + 1;
    let mask = if width >= 64 { u64::MAX } else { (1u64 << width) - 1 };
    (word >> lo) & mask
}

/// Packs `value` into bits `lo..=hi` of an accumulator word.
pub(crate) fn pack(lo: u32, hi: u32, value: u64) -> u64 {
    debug_assert!(lo <= hi && hi < 64);
    let width = hi - lo + 1;
    let mask = if width >= 64 { u64::MAX } else { (1u64 << width) - 1 };
    (value & mask) << lo
}
