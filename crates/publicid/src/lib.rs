//! Opaque public identifiers.
//!
//! Ids are [`LENGTH`] characters drawn from a 58-character alphabet without
//! visually ambiguous characters (`0`, `O`, `I`, `l`). An optional prefix is
//! joined with an underscore: `u_4fZk9qTr2mXa`.

use rand::Rng;
use thiserror::Error;

/// Base58 alphabet.
pub const ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Length of an id, excluding any prefix.
pub const LENGTH: usize = 12;

/// Validation failures, one per rule.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PublicIdError {
    #[error("{field} cannot be blank")]
    Blank { field: String },

    #[error("{field} should be {expected} characters long")]
    WrongLength { field: String, expected: usize },

    #[error("{field} has invalid characters")]
    InvalidCharacters { field: String },

    #[error("{field} must start with the prefix {prefix}")]
    MissingPrefix { field: String, prefix: String },
}

/// Generate an id using the given RNG.
pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> String {
    let alphabet = ALPHABET.as_bytes();
    (0..LENGTH)
        .map(|_| char::from(alphabet[rng.gen_range(0..alphabet.len())]))
        .collect()
}

/// Generate a prefixed id using the given RNG.
pub fn generate_with_prefix<R: Rng + ?Sized>(rng: &mut R, prefix: &str) -> String {
    format!("{prefix}_{}", generate(rng))
}

/// Generate an id from the thread-local RNG.
pub fn new() -> String {
    generate(&mut rand::thread_rng())
}

/// Generate a prefixed id from the thread-local RNG.
pub fn with_prefix(prefix: &str) -> String {
    generate_with_prefix(&mut rand::thread_rng(), prefix)
}

/// Check an unprefixed id. `field` names the value in error messages.
pub fn validate(field: &str, id: &str) -> Result<(), PublicIdError> {
    if id.is_empty() {
        return Err(PublicIdError::Blank {
            field: field.to_string(),
        });
    }

    if id.len() != LENGTH {
        return Err(PublicIdError::WrongLength {
            field: field.to_string(),
            expected: LENGTH,
        });
    }

    if !id.chars().all(|c| ALPHABET.contains(c)) {
        return Err(PublicIdError::InvalidCharacters {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Check an id that must carry `prefix` followed by an underscore.
pub fn validate_with_prefix(field: &str, id: &str, prefix: &str) -> Result<(), PublicIdError> {
    if id.is_empty() {
        return Err(PublicIdError::Blank {
            field: field.to_string(),
        });
    }

    let expected = format!("{prefix}_");
    let Some(trimmed) = id.strip_prefix(&expected) else {
        return Err(PublicIdError::MissingPrefix {
            field: field.to_string(),
            prefix: prefix.to_string(),
        });
    };

    validate(field, trimmed)
}
