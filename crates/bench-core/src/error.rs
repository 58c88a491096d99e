//! Error types for decoding and coercing interchange data.

use thiserror::Error;

/// Errors raised while reading or writing the interchange format.
///
/// Every variant is a data-contract violation between producer and consumer.
#[derive(Error, Debug)]
pub enum InterchangeError {
    /// Header declares a different number of tag names and tag types.
    #[error("wrong number of tag names ({names}) and tag types ({types})")]
    TagCountMismatch { names: usize, types: usize },

    /// Header line could not be parsed.
    #[error("malformed header line: '{0}'")]
    MalformedHeader(String),

    /// Row line could not be parsed.
    #[error("malformed row: {0}")]
    MalformedRow(String),

    /// Row references a table the header does not declare.
    #[error("table '{0}' not declared in header")]
    UnknownTable(String),

    /// Inline payload would contain the substituted separator.
    #[error("inline payload contains reserved separator ';': {0}")]
    ReservedSeparator(String),

    /// Inline payload failed to (de)serialize.
    #[error("inline payload error: {0}")]
    Payload(#[from] serde_json::Error),

    /// Header type tag is not recognised.
    #[error(transparent)]
    Coerce(#[from] CoerceError),

    /// Underlying reader or writer failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while coercing a textual value to its native column type.
#[derive(Error, Debug)]
pub enum CoerceError {
    /// Serialized type tag is not one of the supported scalar types.
    #[error("unrecognized serialized type '{0}'")]
    UnknownType(String),

    /// Literal does not parse as the declared type.
    #[error("could not parse '{value}' to {kind}")]
    Unparseable { value: String, kind: String },

    /// Map column received a value without the inline `map`/`json` prefix.
    #[error("expected inline map payload, got '{0}'")]
    ExpectedInlineMap(String),

    /// Inline payload is not valid JSON after restoring separators.
    #[error("invalid inline payload '{value}': {source}")]
    InvalidPayload {
        value: String,
        #[source]
        source: serde_json::Error,
    },
}
