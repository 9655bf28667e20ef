use super::{decode_control_word, ControlWord, ControlWordKind, BLOCK_BYTES};
use crate::error::{Error, Result};
use std::io::{Read, Seek, SeekFrom};

/// Reads a COS blocked-record stream from any `Read + Seek` source.
pub struct DatasetReader<R> {
    inner: R,
    block: [u8; BLOCK_BYTES],
    /// Read cursor within `block`, `0..=BLOCK_BYTES`. `BLOCK_BYTES` means
    /// the next read must load a fresh block.
    byte_in_block: usize,
    /// Word index (within the current block) of the next control word, if
    /// the most recent control word's FWI named one.
    next_cw_word: Option<usize>,
    last_control_word: Option<ControlWord>,
}

impl<R: Read + Seek> DatasetReader<R> {
    pub fn new(inner: R) -> Result<Self> {
        let mut r = DatasetReader {
            inner,
            block: [0u8; BLOCK_BYTES],
            byte_in_block: BLOCK_BYTES,
            next_cw_word: None,
            last_control_word: None,
        };
        r.load_next_block()?;
        Ok(r)
    }

    fn load_next_block(&mut self) -> Result<()> {
        self.inner.read_exact(&mut self.block).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                Error::Format("dataset truncated: short block read".into())
            } else {
                Error::Io(e)
            }
        })?;
        let word0 = u64::from_be_bytes(self.block[0..8].try_into().unwrap());
        let cw = decode_control_word(word0)
            .ok_or_else(|| Error::Format("block does not begin with a recognised control word".into()))?;
        if cw.kind != ControlWordKind::Bcw {
            return Err(Error::Format("block does not begin with a BCW".into()));
        }
        self.next_cw_word = if cw.fwi == 0 { None } else { Some(cw.fwi as usize) };
        self.last_control_word = Some(cw);
        self.byte_in_block = 8;
        Ok(())
    }

    fn consume_control_word(&mut self, word_idx: usize) -> Result<()> {
        let start = word_idx * 8;
        let word = u64::from_be_bytes(self.block[start..start + 8].try_into().unwrap());
        let cw = decode_control_word(word)
            .ok_or_else(|| Error::Format("corrupt control word".into()))?;
        self.next_cw_word = if cw.fwi == 0 { None } else { Some(word_idx + cw.fwi as usize) };
        self.last_control_word = Some(cw);
        self.byte_in_block = (word_idx + 1) * 8;
        Ok(())
    }

    /// Reads up to `buf.len()` data bytes, transparently skipping BCWs.
    /// Returns `Ok(0)` exactly when the read stopped at a record-ending
    /// control word; call [`Self::read_control_word`] to find out which one.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            if self.byte_in_block >= BLOCK_BYTES {
                self.load_next_block()?;
                continue;
            }
            let word_idx = self.byte_in_block / 8;
            let at_word_boundary = self.byte_in_block % 8 == 0;
            if at_word_boundary && self.next_cw_word == Some(word_idx) {
                if filled > 0 {
                    break;
                }
                self.consume_control_word(word_idx)?;
                return Ok(0);
            }
            buf[filled] = self.block[self.byte_in_block];
            filled += 1;
            self.byte_in_block += 1;
        }
        Ok(filled)
    }

    /// The control word that ended the most recently completed record (or
    /// the dataset's opening BCW, before any record has ended).
    pub fn read_control_word(&self) -> Option<ControlWord> {
        self.last_control_word
    }

    /// Rewinds to the start of the dataset and reloads its first block.
    pub fn rewind(&mut self) -> Result<()> {
        self.inner.seek(SeekFrom::Start(0))?;
        self.byte_in_block = BLOCK_BYTES;
        self.next_cw_word = None;
        self.last_control_word = None;
        self.load_next_block()
    }
}

#[cfg(feature = "std")]
impl DatasetReader<std::fs::File> {
    pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        DatasetReader::new(file)
    }
}
