use thiserror::Error;

/// Errors that can occur while building or (de)serializing an [`Mphf`](crate::Mphf).
///
/// Lookups never fail: a key with no assignment yields the
/// [`Mphf::NOT_FOUND`](crate::Mphf::NOT_FOUND) sentinel instead of an error.
#[derive(Debug, Error)]
pub enum MphfError {
    /// The `gamma` load factor must be at least 1.0.
    #[error("gamma must be at least 1.0, got {0}")]
    InvalidGamma(f64),

    /// A serialized field held a value the binary format does not permit,
    /// or the stream ended before the field was complete.
    #[error("malformed mphf data at byte {offset}: {reason}")]
    Format {
        /// Byte offset of the offending field, counted from the start of
        /// the serialized function.
        offset: u64,
        /// Human-readable description of the violation.
        reason: String,
    },

    /// The underlying stream failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
