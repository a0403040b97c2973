//! Minimal perfect hashing over static `u64` key sets, built as a cascade
//! of bit sets.
//!
//! The construction follows the BBHash method described in
//! [Fast and scalable minimal perfect hashing for massive key sets](https://arxiv.org/abs/1702.03154):
//! each level hashes the still-unassigned keys into a bit vector sized
//! `gamma` times their count, keys that land alone own their bit, colliding
//! keys cascade to the next level, and whatever survives all 25 levels is
//! stored in a direct fallback table. Lookup probes the levels in order and
//! turns the first set bit into a dense index through the chained rank
//! samples of [`RankedBits`].

use std::collections::HashMap;
use std::io::{Read, Write};
use std::mem::{size_of, size_of_val};

use crate::error::MphfError;
use crate::hash::probe;
use crate::io::{ByteReader, ByteWriter};
use crate::rank::RankedBits;

/// Default `gamma` load factor.
pub const DEFAULT_GAMMA: f64 = 2.0;

/// Number of cascade levels in every built function.
pub const NB_LEVELS: u32 = 25;

/// Loader sanity band for the serialized level count. Every known writer,
/// the original C++ implementation included, produces 25; values far
/// outside that indicate a stream that is not a serialized function at all.
const MAX_SERIALIZED_LEVELS: u32 = 64;

/// A minimal perfect hash function over a static set of `u64` keys.
///
/// Maps the `n` build keys bijectively onto `0..n`. Immutable once built;
/// concurrent lookups need no synchronization. Keys outside the build set
/// are hashed to an arbitrary index or to [`NOT_FOUND`](Self::NOT_FOUND),
/// so this is not a membership test.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Mphf {
    /// Load factor the function was built with.
    gamma: f64,
    /// Cumulative rank after the last level, the base index for fallback
    /// entries.
    lastbitsetrank: u64,
    /// Number of keys the function was built over.
    nelem: u64,
    /// One ranked bit vector per cascade level.
    levels: Vec<RankedBits>,
    /// Keys that collided on every level, mapped straight to their index.
    fallback: HashMap<u64, u64>,
}

impl Mphf {
    /// Sentinel returned by [`lookup`](Self::lookup) for keys with no
    /// assignment.
    pub const NOT_FOUND: u64 = u64::MAX;

    /// Builds a minimal perfect hash function over `keys` with load factor
    /// `gamma`.
    ///
    /// `keys` must not contain duplicates; duplicated keys waste cascade
    /// capacity and their assignments collapse onto one index, although
    /// construction still terminates. Larger `gamma` values trade memory
    /// for fewer occupied levels.
    ///
    /// # Examples
    /// ```
    /// use cascade_mphf::{Mphf, DEFAULT_GAMMA};
    ///
    /// let mphf = Mphf::from_slice(&[10, 20, 30], DEFAULT_GAMMA).unwrap();
    /// assert!(mphf.lookup(20) < 3);
    /// ```
    pub fn from_slice(keys: &[u64], gamma: f64) -> Result<Self, MphfError> {
        Self::build_with_levels(keys, gamma, NB_LEVELS)
    }

    fn build_with_levels(keys: &[u64], gamma: f64, nb_levels: u32) -> Result<Self, MphfError> {
        if !gamma.is_finite() || gamma < 1.0 {
            return Err(MphfError::InvalidGamma(gamma));
        }

        let mut remaining = keys.to_vec();
        let mut levels = Vec::with_capacity(nb_levels as usize);

        for level in 0..nb_levels as u64 {
            let domain = level_domain(gamma, remaining.len());
            let mut bits = RankedBits::new(domain);
            // Collision marks live only for the duration of this level.
            let mut collisions = RankedBits::new(domain);

            for &key in &remaining {
                let pos = probe(key, level, domain);
                if bits.get(pos) {
                    collisions.set(pos);
                } else {
                    bits.set(pos);
                }
            }

            let mut survivors = Vec::new();
            for &key in &remaining {
                let pos = probe(key, level, domain);
                if collisions.get(pos) {
                    // Two or more keys probed this position, so none of
                    // them may own it.
                    bits.clear(pos);
                    survivors.push(key);
                }
            }

            levels.push(bits);
            remaining = survivors;
        }

        // Chain the rank samples so that every level continues the count
        // where the previous one stopped; a set bit's rank is then its
        // global index.
        let mut offset = 0;
        for level in &mut levels {
            offset = level.build_ranks(offset);
        }
        let lastbitsetrank = offset;

        let mut fallback = HashMap::with_capacity(remaining.len());
        for (i, &key) in remaining.iter().enumerate() {
            fallback.insert(key, lastbitsetrank + i as u64);
        }

        Ok(Mphf {
            gamma,
            lastbitsetrank,
            nelem: keys.len() as u64,
            levels,
            fallback,
        })
    }

    /// Returns the index assigned to `key`.
    ///
    /// For keys that were part of the build this is their unique index in
    /// `0..len()`. For any other key the result is an arbitrary in-range
    /// index or [`NOT_FOUND`](Self::NOT_FOUND); lookup itself never fails.
    #[inline]
    pub fn lookup(&self, key: u64) -> u64 {
        for (level, bits) in self.levels.iter().enumerate() {
            let pos = probe(key, level as u64, bits.size());
            if bits.get(pos) {
                return bits.rank(pos);
            }
        }
        self.fallback.get(&key).copied().unwrap_or(Self::NOT_FOUND)
    }

    /// Number of keys the function was built over.
    #[inline]
    pub fn len(&self) -> u64 {
        self.nelem
    }

    /// Returns `true` if the function was built over an empty key set.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nelem == 0
    }

    /// Load factor the function was built with.
    #[inline]
    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    /// Approximate number of bytes occupied by the function.
    pub fn size_bytes(&self) -> usize {
        size_of_val(self)
            + self.levels.iter().map(RankedBits::size_bytes).sum::<usize>()
            + self.fallback.len() * size_of::<(u64, u64)>()
    }

    /// Writes the function to `stream` in the portable binary layout.
    ///
    /// The layout is little-endian throughout: a header of `gamma` (f64),
    /// level count (u32), last rank (u64) and key count (u64), followed by
    /// each level's bit vector and the fallback table as (key, index)
    /// pairs. Identical functions serialize to identical bytes; fallback
    /// entries are written ordered by index to keep that reproducible.
    /// The stream stays open; flushing and closing belong to the caller.
    pub fn save<W: Write>(&self, stream: &mut W) -> Result<(), MphfError> {
        let mut writer = ByteWriter::new(stream);
        writer.write_f64(self.gamma)?;
        writer.write_u32(self.levels.len() as u32)?;
        writer.write_u64(self.lastbitsetrank)?;
        writer.write_u64(self.nelem)?;

        for level in &self.levels {
            level.write_into(&mut writer)?;
        }

        writer.write_u64(self.fallback.len() as u64)?;
        let mut entries: Vec<(u64, u64)> = self.fallback.iter().map(|(&k, &v)| (k, v)).collect();
        entries.sort_unstable_by_key(|&(_, index)| index);
        for (key, index) in entries {
            writer.write_u64(key)?;
            writer.write_u64(index)?;
        }
        Ok(())
    }

    /// Reads a function previously written by [`save`](Self::save), by this
    /// or any other conforming implementation.
    ///
    /// # Errors
    ///
    /// Returns [`MphfError::Format`] with the byte offset of the offending
    /// field when a header value is out of range, a bit vector disagrees
    /// with its stored word count, or the stream ends early. Stream
    /// failures other than a short read surface as [`MphfError::Io`].
    pub fn load<R: Read>(stream: &mut R) -> Result<Self, MphfError> {
        let mut reader = ByteReader::new(stream);

        let gamma_at = reader.offset();
        let gamma = reader.read_f64()?;
        if !gamma.is_finite() || gamma < 1.0 {
            return Err(MphfError::Format {
                offset: gamma_at,
                reason: format!("gamma {gamma} is outside the valid range"),
            });
        }

        let nb_levels_at = reader.offset();
        let nb_levels = reader.read_u32()?;
        if nb_levels == 0 || nb_levels > MAX_SERIALIZED_LEVELS {
            return Err(MphfError::Format {
                offset: nb_levels_at,
                reason: format!("level count {nb_levels} is outside the supported range"),
            });
        }

        let lastbitsetrank = reader.read_u64()?;
        let nelem = reader.read_u64()?;

        let mut levels = Vec::with_capacity(nb_levels as usize);
        for _ in 0..nb_levels {
            let level_at = reader.offset();
            let level = RankedBits::read_from(&mut reader)?;
            // Lookup reduces probes modulo the level size, so a level with
            // no bits at all would divide by zero. No conforming writer
            // emits one; the smallest level is a single bit.
            if level.size() == 0 {
                return Err(MphfError::Format {
                    offset: level_at,
                    reason: "cascade level has no bits".to_string(),
                });
            }
            levels.push(level);
        }

        let fallback_at = reader.offset();
        let fallback_count = reader.read_u64()?;
        if fallback_count > nelem {
            return Err(MphfError::Format {
                offset: fallback_at,
                reason: format!(
                    "fallback table of {fallback_count} entries exceeds the key count {nelem}"
                ),
            });
        }
        let mut fallback = HashMap::with_capacity(fallback_count as usize);
        for _ in 0..fallback_count {
            let key = reader.read_u64()?;
            let index = reader.read_u64()?;
            fallback.insert(key, index);
        }

        Ok(Mphf {
            gamma,
            lastbitsetrank,
            nelem,
            levels,
            fallback,
        })
    }
}

/// Bits allocated for a level that still holds `remaining` keys.
#[inline]
fn level_domain(gamma: f64, remaining: usize) -> u64 {
    ((gamma * remaining as f64).ceil() as u64).max(1)
}
