//! Little-endian stream plumbing for the serialized function format.
//!
//! Readers track their byte offset so a malformed field can be reported by
//! position. Streams are owned by the caller; nothing here opens, closes or
//! buffers them.

use std::io::{ErrorKind, Read, Write};

use crate::error::MphfError;

/// Wraps a stream and decodes fixed-width little-endian fields while
/// counting consumed bytes.
pub(crate) struct ByteReader<R> {
    inner: R,
    offset: u64,
}

impl<R: Read> ByteReader<R> {
    pub(crate) fn new(inner: R) -> Self {
        ByteReader { inner, offset: 0 }
    }

    /// Byte offset of the next field to be read.
    pub(crate) fn offset(&self) -> u64 {
        self.offset
    }

    fn fill(&mut self, buf: &mut [u8]) -> Result<(), MphfError> {
        let at = self.offset;
        match self.inner.read_exact(buf) {
            Ok(()) => {
                self.offset += buf.len() as u64;
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => Err(MphfError::Format {
                offset: at,
                reason: "unexpected end of stream".to_string(),
            }),
            Err(e) => Err(MphfError::Io(e)),
        }
    }

    pub(crate) fn read_u32(&mut self) -> Result<u32, MphfError> {
        let mut buf = [0u8; 4];
        self.fill(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    pub(crate) fn read_u64(&mut self) -> Result<u64, MphfError> {
        let mut buf = [0u8; 8];
        self.fill(&mut buf)?;
        Ok(u64::from_le_bytes(buf))
    }

    pub(crate) fn read_f64(&mut self) -> Result<f64, MphfError> {
        let mut buf = [0u8; 8];
        self.fill(&mut buf)?;
        Ok(f64::from_le_bytes(buf))
    }

    /// Reads `len` consecutive little-endian words. Callers bound `len`
    /// before asking for the allocation.
    pub(crate) fn read_words(&mut self, len: usize) -> Result<Vec<u64>, MphfError> {
        let mut buf = vec![0u8; len * 8];
        self.fill(&mut buf)?;
        Ok(buf
            .chunks_exact(8)
            .map(|chunk| u64::from_le_bytes(chunk.try_into().unwrap()))
            .collect())
    }
}

/// Encodes fixed-width fields as little-endian bytes onto a stream.
pub(crate) struct ByteWriter<W> {
    inner: W,
}

impl<W: Write> ByteWriter<W> {
    pub(crate) fn new(inner: W) -> Self {
        ByteWriter { inner }
    }

    pub(crate) fn write_u32(&mut self, value: u32) -> Result<(), MphfError> {
        self.inner.write_all(&value.to_le_bytes())?;
        Ok(())
    }

    pub(crate) fn write_u64(&mut self, value: u64) -> Result<(), MphfError> {
        self.inner.write_all(&value.to_le_bytes())?;
        Ok(())
    }

    pub(crate) fn write_f64(&mut self, value: f64) -> Result<(), MphfError> {
        self.inner.write_all(&value.to_le_bytes())?;
        Ok(())
    }

    pub(crate) fn write_words(&mut self, words: &[u64]) -> Result<(), MphfError> {
        for &word in words {
            self.inner.write_all(&word.to_le_bytes())?;
        }
        Ok(())
    }
}
