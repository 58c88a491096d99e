//! Column types for the chbench load harness.
//!
//! The header declares one [`SerializedType`] per tag column. Two reserved
//! column names override the declared type: see [`ColumnKind::resolve`].
//! Coercion from interchange text into a [`ColumnValue`] is a total function
//! over [`ColumnKind`].

use crate::error::CoerceError;
use crate::inline::decode_inline;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Reserved column name stored as a structured string map.
pub const PROPERTIES_MAP_COLUMN: &str = "properties_map";

/// Reserved column name stored as unstructured text.
pub const PROPERTIES_JSON_COLUMN: &str = "properties_json";

/// Type tag declared for a column in the interchange header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SerializedType {
    String,
    Int32,
    Int64,
    Float32,
    Float64,
}

impl SerializedType {
    /// The tag as it appears in the header.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
        }
    }
}

impl fmt::Display for SerializedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SerializedType {
    type Err = CoerceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(Self::String),
            "int32" => Ok(Self::Int32),
            "int64" => Ok(Self::Int64),
            "float32" => Ok(Self::Float32),
            "float64" => Ok(Self::Float64),
            other => Err(CoerceError::UnknownType(other.to_string())),
        }
    }
}

/// Storage kind of a column once reserved names have been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    String,
    Int32,
    Int64,
    Float32,
    Float64,
    /// Structured `String -> String` map.
    Map,
    /// Unstructured text holding a JSON document.
    Text,
}

impl ColumnKind {
    /// Resolve the storage kind of a column from its name and declared type.
    ///
    /// `properties_map` is always a map column and `properties_json` is always
    /// a text column, whatever type the header declares for them.
    pub fn resolve(column: &str, declared: SerializedType) -> Self {
        match column {
            PROPERTIES_MAP_COLUMN => Self::Map,
            PROPERTIES_JSON_COLUMN => Self::Text,
            _ => declared.into(),
        }
    }

    /// Coerce an interchange literal into a native value of this kind.
    ///
    /// Empty text is `NULL` for every kind. String-like kinds accept the inline
    /// `map{..}`/`json{..}` sub-format; numeric kinds never do.
    pub fn coerce(self, raw: &str) -> Result<ColumnValue, CoerceError> {
        if raw.is_empty() {
            return Ok(ColumnValue::Null);
        }

        match self {
            Self::String | Self::Text => match decode_inline(raw) {
                Some(payload) => {
                    payload.validate()?;
                    Ok(ColumnValue::String(payload.json))
                }
                None => Ok(ColumnValue::String(raw.to_string())),
            },
            Self::Map => match decode_inline(raw) {
                Some(payload) => Ok(ColumnValue::Map(payload.into_map()?)),
                None => Err(CoerceError::ExpectedInlineMap(raw.to_string())),
            },
            Self::Int32 => raw
                .parse::<i32>()
                .map(ColumnValue::Int32)
                .map_err(|_| self.unparseable(raw)),
            Self::Int64 => raw
                .parse::<i64>()
                .map(ColumnValue::Int64)
                .map_err(|_| self.unparseable(raw)),
            Self::Float32 => raw
                .parse::<f32>()
                .map(ColumnValue::Float32)
                .map_err(|_| self.unparseable(raw)),
            Self::Float64 => raw
                .parse::<f64>()
                .map(ColumnValue::Float64)
                .map_err(|_| self.unparseable(raw)),
        }
    }

    fn unparseable(self, raw: &str) -> CoerceError {
        CoerceError::Unparseable {
            value: raw.to_string(),
            kind: self.to_string(),
        }
    }
}

impl From<SerializedType> for ColumnKind {
    fn from(value: SerializedType) -> Self {
        match value {
            SerializedType::String => Self::String,
            SerializedType::Int32 => Self::Int32,
            SerializedType::Int64 => Self::Int64,
            SerializedType::Float32 => Self::Float32,
            SerializedType::Float64 => Self::Float64,
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Map => "map",
            Self::Text => "text",
        };
        f.write_str(name)
    }
}

/// Native value bound to a column in a bulk insert.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Null,
    String(String),
    Int32(i32),
    Int64(i64),
    UInt32(u32),
    Float32(f32),
    Float64(f64),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
    Map(BTreeMap<String, String>),
}

impl ColumnValue {
    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Try to get this value as a string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get this value as an f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float64(f) => Some(*f),
            Self::Float32(f) => Some(f64::from(*f)),
            _ => None,
        }
    }

    /// Try to get this value as a surrogate id.
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Self::UInt32(id) => Some(*id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_type_round_trips_through_header_tag() {
        for ty in [
            SerializedType::String,
            SerializedType::Int32,
            SerializedType::Int64,
            SerializedType::Float32,
            SerializedType::Float64,
        ] {
            assert_eq!(ty.as_str().parse::<SerializedType>().unwrap(), ty);
        }
    }

    #[test]
    fn test_unknown_serialized_type() {
        let err = "decimal".parse::<SerializedType>().unwrap_err();
        assert!(matches!(err, CoerceError::UnknownType(ref t) if t == "decimal"));
    }

    #[test]
    fn test_reserved_columns_override_declared_type() {
        assert_eq!(
            ColumnKind::resolve("properties_map", SerializedType::String),
            ColumnKind::Map
        );
        assert_eq!(
            ColumnKind::resolve("properties_json", SerializedType::String),
            ColumnKind::Text
        );
        assert_eq!(
            ColumnKind::resolve("rack", SerializedType::Int32),
            ColumnKind::Int32
        );
    }

    #[test]
    fn test_coerce_scalars() {
        assert_eq!(
            ColumnKind::Int32.coerce("42").unwrap(),
            ColumnValue::Int32(42)
        );
        assert_eq!(
            ColumnKind::Int64.coerce("-9000000000").unwrap(),
            ColumnValue::Int64(-9_000_000_000)
        );
        assert_eq!(
            ColumnKind::Float32.coerce("1.5").unwrap(),
            ColumnValue::Float32(1.5)
        );
        assert_eq!(
            ColumnKind::String.coerce("host_0").unwrap(),
            ColumnValue::String("host_0".to_string())
        );
    }

    #[test]
    fn test_coerce_empty_is_null() {
        for kind in [ColumnKind::Int32, ColumnKind::Map, ColumnKind::String] {
            assert!(kind.coerce("").unwrap().is_null());
        }
    }

    #[test]
    fn test_coerce_unparseable_literal() {
        let err = ColumnKind::Int32.coerce("abc").unwrap_err();
        assert_eq!(err.to_string(), "could not parse 'abc' to int32");

        // Out of range for int32 is also a contract violation
        assert!(ColumnKind::Int32.coerce("3000000000").is_err());
    }

    #[test]
    fn test_coerce_inline_map() {
        let value = ColumnKind::Map
            .coerce(r#"map{"email":"hello@world.com";"name":"john, doe"}"#)
            .unwrap();
        let ColumnValue::Map(map) = value else {
            panic!("Expected Map, got {value:?}");
        };
        assert_eq!(map["email"], "hello@world.com");
        assert_eq!(map["name"], "john, doe");
    }

    #[test]
    fn test_coerce_inline_json_into_text() {
        let value = ColumnKind::Text
            .coerce(r#"json{"a":"1";"b":"2"}"#)
            .unwrap();
        assert_eq!(value, ColumnValue::String(r#"{"a":"1","b":"2"}"#.to_string()));
    }

    #[test]
    fn test_map_column_requires_inline_payload() {
        let err = ColumnKind::Map.coerce("plain").unwrap_err();
        assert!(matches!(err, CoerceError::ExpectedInlineMap(_)));
    }

    #[test]
    fn test_numeric_column_rejects_inline_payload() {
        assert!(ColumnKind::Float64.coerce(r#"map{"a":"b"}"#).is_err());
    }
}
