//! Inline sub-format for structured values inside a comma-delimited row.
//!
//! A structured value is rendered as a type prefix (`map` or `json`) followed
//! by a JSON object in which every `,` has been replaced by `;`, so splitting
//! the enclosing row on `,` never fragments the payload:
//!
//! ```text
//! map{"email":"hello@world.com";"name":"john doe"}
//! ```
//!
//! Decoding strips the prefix, restores `,` and parses the JSON.
//!
//! Format precondition: a payload never contains a literal `;`. The encoder
//! refuses such payloads; the decoder assumes the precondition holds.

use crate::error::{CoerceError, InterchangeError};
use std::collections::BTreeMap;

const SEPARATOR: char = ',';
const SUBSTITUTE: char = ';';

/// Which inline prefix a payload carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InlineKind {
    /// Structured map, stored in a map column.
    Map,
    /// JSON document, stored as text.
    Json,
}

impl InlineKind {
    /// Literal prefix written before the JSON object.
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Map => "map",
            Self::Json => "json",
        }
    }
}

/// A decoded inline payload with separators restored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlinePayload {
    pub kind: InlineKind,
    /// JSON object text with `,` restored.
    pub json: String,
}

impl InlinePayload {
    /// Check that the restored text is a JSON document.
    pub fn validate(&self) -> Result<(), CoerceError> {
        serde_json::from_str::<serde_json::Value>(&self.json)
            .map(|_| ())
            .map_err(|source| CoerceError::InvalidPayload {
                value: self.json.clone(),
                source,
            })
    }

    /// Parse the restored text as a flat string map.
    pub fn into_map(self) -> Result<BTreeMap<String, String>, CoerceError> {
        serde_json::from_str(&self.json).map_err(|source| CoerceError::InvalidPayload {
            value: self.json,
            source,
        })
    }
}

/// Render a map with the given inline prefix.
pub fn encode_inline(
    kind: InlineKind,
    map: &BTreeMap<String, String>,
) -> Result<String, InterchangeError> {
    let json = serde_json::to_string(map)?;
    if json.contains(SUBSTITUTE) {
        return Err(InterchangeError::ReservedSeparator(json));
    }

    let escaped = json.replace(SEPARATOR, &SUBSTITUTE.to_string());
    Ok(format!("{}{escaped}", kind.prefix()))
}

/// Detect and unwrap an inline payload.
///
/// Returns `None` when the value does not start with `map{` or `json{`.
pub fn decode_inline(raw: &str) -> Option<InlinePayload> {
    let (kind, body) = [InlineKind::Map, InlineKind::Json]
        .into_iter()
        .find_map(|kind| {
            raw.strip_prefix(kind.prefix())
                .filter(|body| body.starts_with('{'))
                .map(|body| (kind, body))
        })?;

    Some(InlinePayload {
        kind,
        json: body.replace(SUBSTITUTE, &SEPARATOR.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_encoded_payload_has_no_outer_separator() {
        let map = sample_map(&[("url", "https://www.seznam.cz"), ("name", "john doe")]);
        let encoded = encode_inline(InlineKind::Map, &map).unwrap();

        assert!(encoded.starts_with("map{"));
        assert!(!encoded.contains(','));
        assert_eq!(
            encoded,
            r#"map{"name":"john doe";"url":"https://www.seznam.cz"}"#
        );
    }

    #[test]
    fn test_round_trip_with_and_without_commas() {
        let maps = [
            sample_map(&[("email", "hello@world.com"), ("phone", "+420602303222")]),
            sample_map(&[("name", "doe, john"), ("address", "1, Main St, Prague")]),
            BTreeMap::new(),
        ];

        for map in maps {
            for kind in [InlineKind::Map, InlineKind::Json] {
                let encoded = encode_inline(kind, &map).unwrap();
                let decoded = decode_inline(&encoded).unwrap();
                assert_eq!(decoded.kind, kind);
                assert_eq!(decoded.into_map().unwrap(), map);
            }
        }
    }

    #[test]
    fn test_encoder_refuses_reserved_separator() {
        let map = sample_map(&[("note", "a;b")]);
        let err = encode_inline(InlineKind::Json, &map).unwrap_err();
        assert!(matches!(err, InterchangeError::ReservedSeparator(_)));
    }

    #[test]
    fn test_plain_values_are_not_inline() {
        assert!(decode_inline("mapping").is_none());
        assert!(decode_inline("jsonify").is_none());
        assert!(decode_inline("host_0").is_none());
        assert!(decode_inline("").is_none());
    }

    #[test]
    fn test_invalid_payload_is_reported() {
        let payload = decode_inline("map{not json}").unwrap();
        assert!(matches!(
            payload.into_map(),
            Err(CoerceError::InvalidPayload { .. })
        ));
    }
}
