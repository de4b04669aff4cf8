//! Error types for the quick-fit allocator.
//!
//! Every failure is returned to the immediate caller. None of these leave the
//! allocator in a partially updated state.

use thiserror::Error;

/// Failure reported by [`crate::QuickFitAllocator`] operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuickFitError {
    /// The requested size is larger than every configured threshold.
    #[error("requested size {requested} exceeds the largest size class ({largest} bytes)")]
    SizeNotSupported { requested: usize, largest: usize },
    /// The bulk provider could not supply a fresh block.
    #[error("out of memory acquiring a {requested}-byte block: {source}")]
    OutOfMemory {
        requested: usize,
        #[source]
        source: ProviderError,
    },
    /// A released block carried a stored size no class accepts. The block was
    /// handed back to the provider instead of being pushed onto a free list.
    #[error("released block has unclassifiable stored size {size}")]
    UnclassifiedBlockOnRelease { size: usize },
    /// A released handle names a slot whose region was already handed back
    /// to the provider. Only a handle from another instance can do this.
    #[error("released block {block} was already retired")]
    RetiredBlockOnRelease { block: usize },
}

/// Failure reported by a [`crate::BulkProvider`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// A bounded provider has no budget left for this request.
    #[error("provider budget exhausted: requested {requested} bytes, {remaining} remaining")]
    Exhausted { requested: usize, remaining: usize },
    /// The system allocator refused the reservation.
    #[error("system allocator refused a {requested}-byte region")]
    SystemRefused { requested: usize },
    /// The provider returned a region of the wrong length.
    #[error("provider returned {actual} bytes for a {requested}-byte request")]
    WrongLength { requested: usize, actual: usize },
}

/// Invalid allocator configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("size-class table is empty")]
    Empty,
    #[error("size class {index} has a zero threshold")]
    ZeroThreshold { index: usize },
    #[error("size class {index} ({threshold}) is not above the previous class ({previous})")]
    NotAscending {
        index: usize,
        threshold: usize,
        previous: usize,
    },
    #[error("threshold {threshold} does not fit the block header size field")]
    TooLarge { threshold: usize },
    #[error("cannot parse {value:?} for {key}")]
    Parse { key: &'static str, value: String },
}

/// Result alias for allocator operations.
pub type QuickFitResult<T> = Result<T, QuickFitError>;
