//! Sample rows and their dual delimited-string rendering.
//!
//! A [`Row`] renders to an [`InsertData`]:
//!
//! - tags string: `key=value` pairs joined by `,` in header order
//! - fields string: sample time in nanoseconds since epoch, then the field
//!   values joined by `,` in header order; `NULL` renders as an empty value
//!
//! ```text
//! tags:   hostname=host_0,region=eu-west-1
//! fields: 1451606400000000000,58,2
//! ```

use crate::error::InterchangeError;
use crate::inline::{encode_inline, InlineKind};
use crate::types::SerializedType;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Value produced by the generator, before rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleValue {
    Null,
    String(String),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    /// Rendered with the `map` inline prefix.
    Map(BTreeMap<String, String>),
    /// Rendered with the `json` inline prefix.
    Json(BTreeMap<String, String>),
}

impl SampleValue {
    /// Type tag declared in the header for a column holding this value.
    pub fn serialized_type(&self) -> SerializedType {
        match self {
            Self::Int32(_) => SerializedType::Int32,
            Self::Int64(_) => SerializedType::Int64,
            Self::Float32(_) => SerializedType::Float32,
            Self::Float64(_) => SerializedType::Float64,
            Self::Null | Self::String(_) | Self::Map(_) | Self::Json(_) => SerializedType::String,
        }
    }

    /// Render the value as interchange text.
    pub fn render(&self) -> Result<String, InterchangeError> {
        Ok(match self {
            Self::Null => String::new(),
            Self::String(s) => s.clone(),
            Self::Int32(i) => i.to_string(),
            Self::Int64(i) => i.to_string(),
            Self::Float32(f) => f.to_string(),
            Self::Float64(f) => f.to_string(),
            Self::Map(m) => encode_inline(InlineKind::Map, m)?,
            Self::Json(m) => encode_inline(InlineKind::Json, m)?,
        })
    }
}

impl From<String> for SampleValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for SampleValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<f64> for SampleValue {
    fn from(value: f64) -> Self {
        Self::Float64(value)
    }
}

impl From<i64> for SampleValue {
    fn from(value: i64) -> Self {
        Self::Int64(value)
    }
}

/// One sample: a table, an instant, a tag snapshot and field values.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub table: String,
    pub timestamp: DateTime<Utc>,
    pub tags: Vec<(String, SampleValue)>,
    pub fields: Vec<SampleValue>,
}

impl Row {
    /// Render the row to its tags and fields strings.
    pub fn to_insert_data(&self) -> Result<InsertData, InterchangeError> {
        let mut tags = String::new();
        for (i, (key, value)) in self.tags.iter().enumerate() {
            if i > 0 {
                tags.push(',');
            }
            tags.push_str(key);
            tags.push('=');
            tags.push_str(&value.render()?);
        }

        let nanos = self.timestamp.timestamp_nanos_opt().ok_or_else(|| {
            InterchangeError::MalformedRow(format!(
                "timestamp {} out of nanosecond range",
                self.timestamp
            ))
        })?;
        let mut fields = nanos.to_string();
        for value in &self.fields {
            fields.push(',');
            fields.push_str(&value.render()?);
        }

        Ok(InsertData { tags, fields })
    }
}

/// The dual-string rendering of one row, as carried between producer and loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertData {
    pub tags: String,
    pub fields: String,
}

/// Extract the values of the first `count` tags, dropping the `key=` part.
///
/// Tags beyond `count` are ignored.
pub fn split_tag_values(tags: &str, count: usize) -> Result<Vec<&str>, InterchangeError> {
    let values = tags
        .splitn(count + 1, ',')
        .take(count)
        .map(|pair| {
            pair.split_once('=')
                .map(|(_, value)| value)
                .ok_or_else(|| InterchangeError::MalformedRow(format!("tag without '=': '{pair}'")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if values.len() != count {
        return Err(InterchangeError::MalformedRow(format!(
            "expected {count} tags, got {}: '{tags}'",
            values.len()
        )));
    }
    Ok(values)
}

/// Split a fields string into its sample time and the remaining raw values.
pub fn split_fields(fields: &str) -> Result<(DateTime<Utc>, Vec<&str>), InterchangeError> {
    let mut parts = fields.split(',');
    let raw_time = parts.next().unwrap_or_default();
    let nanos: i64 = raw_time.parse().map_err(|_| {
        InterchangeError::MalformedRow(format!("invalid sample time '{raw_time}'"))
    })?;

    Ok((DateTime::from_timestamp_nanos(nanos), parts.collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cpu_row() -> Row {
        Row {
            table: "cpu".to_string(),
            timestamp: DateTime::from_timestamp(1_451_606_400, 0).unwrap(),
            tags: vec![
                ("hostname".to_string(), "host_0".into()),
                ("region".to_string(), "eu-west-1".into()),
            ],
            fields: vec![58.0.into(), SampleValue::Null, 2.5.into()],
        }
    }

    #[test]
    fn test_render_row() {
        let data = cpu_row().to_insert_data().unwrap();
        assert_eq!(data.tags, "hostname=host_0,region=eu-west-1");
        assert_eq!(data.fields, "1451606400000000000,58,,2.5");
    }

    #[test]
    fn test_split_rendered_row() {
        let data = cpu_row().to_insert_data().unwrap();

        let tags = split_tag_values(&data.tags, 2).unwrap();
        assert_eq!(tags, vec!["host_0", "eu-west-1"]);

        let (time, values) = split_fields(&data.fields).unwrap();
        assert_eq!(time, cpu_row().timestamp);
        assert_eq!(values, vec!["58", "", "2.5"]);
    }

    #[test]
    fn test_inline_tag_survives_split() {
        let mut props = BTreeMap::new();
        props.insert("name".to_string(), "doe, john".to_string());
        props.insert("url".to_string(), "https://www.seznam.cz".to_string());

        let row = Row {
            table: "readings".to_string(),
            timestamp: DateTime::from_timestamp(0, 0).unwrap(),
            tags: vec![
                ("session_id".to_string(), "s_abc".into()),
                ("properties_map".to_string(), SampleValue::Map(props)),
                ("tail".to_string(), "x".into()),
            ],
            fields: vec![],
        };
        let data = row.to_insert_data().unwrap();
        let tags = split_tag_values(&data.tags, 3).unwrap();
        assert_eq!(tags[0], "s_abc");
        assert_eq!(
            tags[1],
            r#"map{"name":"doe; john";"url":"https://www.seznam.cz"}"#
        );
        assert_eq!(tags[2], "x");
    }

    #[test]
    fn test_extra_tags_are_ignored() {
        let tags = split_tag_values("a=1,b=2,c=3,d=4", 2).unwrap();
        assert_eq!(tags, vec!["1", "2"]);
    }

    #[test]
    fn test_missing_tags_are_rejected() {
        assert!(split_tag_values("a=1", 2).is_err());
        assert!(split_tag_values("a=1,b", 2).is_err());
    }

    #[test]
    fn test_invalid_sample_time() {
        assert!(split_fields("yesterday,1,2").is_err());
        assert!(split_fields("").is_err());
    }

    #[test]
    fn test_serialized_type_of_values() {
        assert_eq!(
            SampleValue::Int64(1).serialized_type(),
            SerializedType::Int64
        );
        assert_eq!(
            SampleValue::Map(BTreeMap::new()).serialized_type(),
            SerializedType::String
        );
    }
}
