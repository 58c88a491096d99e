//! Error type for generator operations.

use thiserror::Error;

/// Errors returned by the generator.
///
/// These are recoverable: the caller decides whether to retry with different
/// arguments or give up.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// Requested selection size is outside `1..=pool size`.
    #[error("cannot select {requested} distinct items from a pool of {available}")]
    Cardinality { requested: usize, available: usize },

    /// Property has no example values in the categorical domain.
    #[error("no values for {0}")]
    NoValues(String),

    /// Use case name is not recognised.
    #[error("unknown use case '{0}' (expected one of: devops, events)")]
    UnknownUseCase(String),

    /// Generator configuration is not usable.
    #[error("invalid generator configuration: {0}")]
    InvalidConfig(String),

    /// Header derivation or row rendering failed.
    #[error("interchange error: {0}")]
    Interchange(#[from] bench_core::InterchangeError),
}
