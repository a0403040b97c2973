//! `RankedBits` is a fixed-size bit vector with sampled ranks, the storage
//! primitive behind every cascade level.
//!
//! Bits are kept in little-endian word order (bit `i` of the vector is bit
//! `i % 64` of word `i / 64`) with one padding word always present, and a
//! cumulative popcount is sampled every 512 bits so `rank` resolves with at
//! most seven in-block popcounts. Both the word array and the samples are
//! part of the portable binary format, so their layout cannot change.

use std::io::{Read, Write};
use std::mem::size_of_val;

use crate::error::MphfError;
use crate::io::{ByteReader, ByteWriter};

/// Number of bits covered by one rank sample.
const BITS_PER_RANK_SAMPLE: u64 = 512;
/// Words spanned by one rank sample.
const WORDS_PER_RANK_SAMPLE: u64 = BITS_PER_RANK_SAMPLE / 64;
/// Upper bound on a deserialized bit count. A corrupt header is rejected
/// here instead of turning into an enormous allocation.
const MAX_SERIALIZED_BITS: u64 = 1 << 44;

/// A fixed-size bit vector with precomputed rank samples.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RankedBits {
    /// Number of addressable bits.
    size: u64,
    /// Word storage, always `1 + size / 64` words.
    words: Box<[u64]>,
    /// Cumulative popcount sampled before every 8th word.
    ranks: Vec<u64>,
}

impl RankedBits {
    /// Allocates an all-zero vector of `size` bits.
    pub fn new(size: u64) -> Self {
        RankedBits {
            size,
            words: vec![0u64; (1 + size / 64) as usize].into_boxed_slice(),
            ranks: Vec::new(),
        }
    }

    /// Number of addressable bits.
    #[inline]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Number of 64-bit words backing the vector, padding word included.
    #[inline]
    pub fn word_count(&self) -> u64 {
        self.words.len() as u64
    }

    /// Returns the `i`-th backing word.
    #[inline]
    pub fn word(&self, i: u64) -> u64 {
        self.words[i as usize]
    }

    /// Returns the bit at `pos`. Requires `pos < size`.
    #[inline]
    pub fn get(&self, pos: u64) -> bool {
        debug_assert!(pos < self.size);
        (self.words[(pos >> 6) as usize] >> (pos & 63)) & 1 == 1
    }

    /// Sets the bit at `pos` to 1. Idempotent. Requires `pos < size`.
    #[inline]
    pub fn set(&mut self, pos: u64) {
        debug_assert!(pos < self.size);
        self.words[(pos >> 6) as usize] |= 1u64 << (pos & 63);
    }

    /// Sets the bit at `pos` to 0. Requires `pos < size`.
    #[inline]
    pub fn clear(&mut self, pos: u64) {
        debug_assert!(pos < self.size);
        self.words[(pos >> 6) as usize] &= !(1u64 << (pos & 63));
    }

    /// Computes the rank samples, seeding the running popcount with
    /// `offset`.
    ///
    /// A sample is recorded before each 512-bit block (word indices 0, 8,
    /// 16, ...) and only then is the word's popcount folded into the
    /// running total. Returns the final total, which the caller chains
    /// into the next vector's offset.
    pub fn build_ranks(&mut self, offset: u64) -> u64 {
        self.ranks = Vec::with_capacity((2 + self.size / BITS_PER_RANK_SAMPLE) as usize);
        let mut current = offset;
        for (i, word) in self.words.iter().enumerate() {
            if (i as u64 * 64) % BITS_PER_RANK_SAMPLE == 0 {
                self.ranks.push(current);
            }
            current += word.count_ones() as u64;
        }
        current
    }

    /// Returns the number of set bits at indices below `pos`, plus the
    /// offset passed to [`build_ranks`](Self::build_ranks).
    ///
    /// Only meaningful after `build_ranks` has run. Accepts `pos <= size`.
    #[inline]
    pub fn rank(&self, pos: u64) -> u64 {
        let mut rank = self.ranks[(pos / BITS_PER_RANK_SAMPLE) as usize];
        let block_start = pos / BITS_PER_RANK_SAMPLE * WORDS_PER_RANK_SAMPLE;
        for w in block_start..pos / 64 {
            rank += self.words[w as usize].count_ones() as u64;
        }
        let partial = self.words[(pos / 64) as usize] & ((1u64 << (pos & 63)) - 1);
        rank + partial.count_ones() as u64
    }

    /// Approximate number of bytes occupied by the vector.
    pub fn size_bytes(&self) -> usize {
        size_of_val(self) + size_of_val(self.words.as_ref()) + size_of_val(self.ranks.as_slice())
    }

    /// Writes the vector to `stream` in the portable binary layout:
    /// `size`, word count, words, sample count, samples, all as
    /// little-endian `u64`.
    pub fn save<W: Write>(&self, stream: &mut W) -> Result<(), MphfError> {
        self.write_into(&mut ByteWriter::new(stream))
    }

    /// Reads a vector previously written by [`save`](Self::save).
    pub fn load<R: Read>(stream: &mut R) -> Result<Self, MphfError> {
        Self::read_from(&mut ByteReader::new(stream))
    }

    pub(crate) fn write_into<W: Write>(&self, writer: &mut ByteWriter<W>) -> Result<(), MphfError> {
        writer.write_u64(self.size)?;
        writer.write_u64(self.words.len() as u64)?;
        writer.write_words(&self.words)?;
        writer.write_u64(self.ranks.len() as u64)?;
        writer.write_words(&self.ranks)?;
        Ok(())
    }

    pub(crate) fn read_from<R: Read>(reader: &mut ByteReader<R>) -> Result<Self, MphfError> {
        let size_at = reader.offset();
        let size = reader.read_u64()?;
        if size > MAX_SERIALIZED_BITS {
            return Err(MphfError::Format {
                offset: size_at,
                reason: format!("bit vector of {size} bits is implausibly large"),
            });
        }

        // The format mandates one padding word even when `size` is a
        // multiple of 64; anything else is a corrupt stream.
        let nchar_at = reader.offset();
        let nchar = reader.read_u64()?;
        if nchar != 1 + size / 64 {
            return Err(MphfError::Format {
                offset: nchar_at,
                reason: format!(
                    "word count {nchar} does not match {} expected for {size} bits",
                    1 + size / 64
                ),
            });
        }
        let words = reader.read_words(nchar as usize)?.into_boxed_slice();

        let ranks_at = reader.offset();
        let ranks_count = reader.read_u64()?;
        if ranks_count != nchar.div_ceil(WORDS_PER_RANK_SAMPLE) {
            return Err(MphfError::Format {
                offset: ranks_at,
                reason: format!(
                    "rank sample count {ranks_count} does not match {} expected for {nchar} words",
                    nchar.div_ceil(WORDS_PER_RANK_SAMPLE)
                ),
            });
        }
        let ranks = reader.read_words(ranks_count as usize)?;

        Ok(RankedBits { size, words, ranks })
    }
}
