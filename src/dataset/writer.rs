use super::{encode_control_word, ControlWord, ControlWordKind, BLOCK_BYTES, WORDS_PER_BLOCK};
use crate::error::{Error, Result};
use std::io::{Seek, Write};

/// Writes a COS blocked-record stream to any `Write + Seek` sink.
///
/// Block buffering happens in a fixed-size stack array (spec §5: "scratch
/// buffers ... are stack-sized, not heap allocations, for the 4096-byte
/// block buffer"); a block is flushed to `inner` only once it fills or the
/// writer is closed.
pub struct DatasetWriter<W> {
    inner: W,
    block: [u8; BLOCK_BYTES],
    /// Next free word slot in `block`, `0..=WORDS_PER_BLOCK`.
    word_in_block: usize,
    /// Partial word accumulated across `write()` calls that don't land on
    /// an 8-byte boundary.
    partial: [u8; 8],
    partial_len: usize,
    /// Word index, within the current in-memory block, of the most recent
    /// control word — so its FWI can be patched in place when the next one
    /// is written.
    last_cw_word: Option<usize>,
    block_index: u64,
    prev_bcw_block: u64,
    closed: bool,
}

impl<W: Write + Seek> DatasetWriter<W> {
    /// Opens a new dataset for writing, emitting the first block's BCW.
    pub fn new(inner: W) -> Result<Self> {
        let mut w = DatasetWriter {
            inner,
            block: [0u8; BLOCK_BYTES],
            word_in_block: 0,
            partial: [0u8; 8],
            partial_len: 0,
            last_cw_word: None,
            block_index: 0,
            prev_bcw_block: 0,
            closed: false,
        };
        w.place_control_word(ControlWordKind::Bcw, 0, 0)?;
        Ok(w)
    }

    fn place_control_word(&mut self, kind: ControlWordKind, bwi: u32, ubc: u8) -> Result<()> {
        if self.word_in_block >= WORDS_PER_BLOCK {
            self.roll_block(kind == ControlWordKind::Bcw)?;
        }
        let idx = self.word_in_block;
        let cw = ControlWord { kind, fwi: 0, bwi, ubc };
        self.write_raw_word(idx, encode_control_word(cw));
        if let Some(prev) = self.last_cw_word {
            let prev_word = u64::from_be_bytes(self.word_bytes(prev));
            let mut prev_cw = super::decode_control_word(prev_word)
                .ok_or_else(|| Error::Format("corrupt control word while patching FWI".into()))?;
            prev_cw.fwi = (idx - prev) as u32;
            self.write_raw_word(prev, encode_control_word(prev_cw));
        }
        self.last_cw_word = Some(idx);
        self.word_in_block = idx + 1;
        Ok(())
    }

    fn word_bytes(&self, word_idx: usize) -> [u8; 8] {
        let mut b = [0u8; 8];
        b.copy_from_slice(&self.block[word_idx * 8..word_idx * 8 + 8]);
        b
    }

    fn write_raw_word(&mut self, word_idx: usize, word: u64) {
        self.block[word_idx * 8..word_idx * 8 + 8].copy_from_slice(&word.to_be_bytes());
    }

    /// Flushes the current block to `inner` and starts a fresh one, unless
    /// `starting_with_bcw` is true and we're already about to place one
    /// (avoids emitting two BCWs back to back for an empty final block).
    fn roll_block(&mut self, starting_with_bcw: bool) -> Result<()> {
        self.inner.write_all(&self.block)?;
        self.block = [0u8; BLOCK_BYTES];
        self.word_in_block = 0;
        self.last_cw_word = None;
        self.block_index += 1;
        if !starting_with_bcw {
            let bwi = (self.block_index - self.prev_bcw_block) as u32;
            self.prev_bcw_block = self.block_index;
            self.place_control_word(ControlWordKind::Bcw, bwi, 0)?;
        } else {
            self.prev_bcw_block = self.block_index;
        }
        Ok(())
    }

    fn push_data_byte(&mut self, byte: u8) -> Result<()> {
        self.partial[self.partial_len] = byte;
        self.partial_len += 1;
        if self.partial_len == 8 {
            if self.word_in_block >= WORDS_PER_BLOCK {
                self.roll_block(false)?;
            }
            let idx = self.word_in_block;
            self.block[idx * 8..idx * 8 + 8].copy_from_slice(&self.partial);
            self.word_in_block = idx + 1;
            self.partial_len = 0;
        }
        Ok(())
    }

    /// Writes raw data bytes into the current record.
    pub fn write(&mut self, buf: &[u8]) -> Result<()> {
        for &b in buf {
            self.push_data_byte(b)?;
        }
        Ok(())
    }

    /// Writes one big-endian 64-bit data word, byte-aligned.
    pub fn write_word(&mut self, word: u64) -> Result<()> {
        debug_assert_eq!(self.partial_len, 0, "write_word requires byte-aligned position");
        self.write(&word.to_be_bytes())
    }

    /// Closes the current record with an RCW.
    pub fn write_eor(&mut self) -> Result<()> {
        debug_assert_eq!(self.partial_len, 0, "records must be byte-aligned to close");
        self.place_control_word(ControlWordKind::Eor, 0, 0)
    }

    /// Closes the current file with an EOF (implicitly closing any open record).
    pub fn write_eof(&mut self) -> Result<()> {
        self.place_control_word(ControlWordKind::Eof, 0, 0)
    }

    /// Closes the dataset with an EOD, flushing all remaining buffered data.
    pub fn write_eod(&mut self) -> Result<()> {
        self.place_control_word(ControlWordKind::Eod, 0, 0)?;
        self.inner.write_all(&self.block)?;
        self.inner.flush()?;
        self.closed = true;
        Ok(())
    }

    /// Explicit close; equivalent to what `Drop` does, but lets a caller
    /// observe the `Result`.
    pub fn close(mut self) -> Result<()> {
        self.close_mut()
    }

    fn close_mut(&mut self) -> Result<()> {
        if !self.closed {
            self.write_eod()?;
        }
        Ok(())
    }
}

impl<W: Write + Seek> Drop for DatasetWriter<W> {
    fn drop(&mut self) {
        let _ = self.close_mut();
    }
}

#[cfg(feature = "std")]
impl DatasetWriter<std::fs::File> {
    /// Creates (truncating) a dataset file on disk.
    pub fn create<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::create(path)?;
        DatasetWriter::new(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::DatasetReader;
    use std::io::Cursor;

    #[test]
    fn single_record_round_trips() {
        let mut buf = Vec::new();
        {
            let cursor = Cursor::new(&mut buf);
            let mut w = DatasetWriter::new(cursor).unwrap();
            w.write(b"hello, cos").unwrap();
            w.write_eor().unwrap();
            w.write_eod().unwrap();
        }
        let mut r = DatasetReader::new(Cursor::new(buf)).unwrap();
        let mut out = [0u8; 10];
        let n = r.read(&mut out).unwrap();
        assert_eq!(n, 10);
        assert_eq!(&out, b"hello, cos");
        assert_eq!(r.read_control_word().unwrap().kind, ControlWordKind::Eor);
    }

    #[test]
    fn record_spanning_multiple_blocks() {
        let payload = vec![0xABu8; BLOCK_BYTES * 2 + 40];
        let mut buf = Vec::new();
        {
            let cursor = Cursor::new(&mut buf);
            let mut w = DatasetWriter::new(cursor).unwrap();
            w.write(&payload).unwrap();
            w.write_eor().unwrap();
            w.write_eod().unwrap();
        }
        let mut r = DatasetReader::new(Cursor::new(buf)).unwrap();
        let mut out = vec![0u8; payload.len()];
        let mut filled = 0;
        while filled < out.len() {
            let n = r.read(&mut out[filled..]).unwrap();
            assert!(n > 0, "reader stalled before record fully consumed");
            filled += n;
        }
        assert_eq!(out, payload);
    }
}
