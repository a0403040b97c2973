//! # Minimal perfect hashing via cascaded bit sets
//!
//! This crate builds minimal perfect hash functions (MPHFs) over static
//! sets of `u64` keys using the BBHash/BooPHF cascade, as described in
//! [Fast and scalable minimal perfect hashing for massive key sets](https://arxiv.org/abs/1702.03154).
//! An [`Mphf`] maps its `n` build keys bijectively onto `0..n` and answers
//! lookups in constant expected time; it cannot tell foreign keys apart
//! from build keys, so callers needing membership must keep that check
//! themselves.
//!
//! Functions serialize to a fixed little-endian binary layout that is
//! interchangeable with the original C++ implementation: a file written by
//! either side loads on the other with pointwise-identical lookups.
//!
//! ```
//! use cascade_mphf::{Mphf, DEFAULT_GAMMA};
//!
//! let keys = vec![1u64, 10, 1000, 23, 457];
//! let mphf = Mphf::from_slice(&keys, DEFAULT_GAMMA).unwrap();
//!
//! let mut indices: Vec<u64> = keys.iter().map(|&k| mphf.lookup(k)).collect();
//! indices.sort_unstable();
//! assert_eq!(indices, vec![0, 1, 2, 3, 4]);
//!
//! let mut bytes = Vec::new();
//! mphf.save(&mut bytes).unwrap();
//! let reloaded = Mphf::load(&mut bytes.as_slice()).unwrap();
//! assert_eq!(reloaded.lookup(1000), mphf.lookup(1000));
//! ```

mod error;
mod hash;
mod io;
mod mphf;
mod rank;

pub use error::MphfError;
pub use mphf::{Mphf, DEFAULT_GAMMA, NB_LEVELS};
pub use rank::RankedBits;
