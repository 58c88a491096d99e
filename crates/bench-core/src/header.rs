//! Run header: tag keys/types and per-table field columns.
//!
//! The header is produced once by the generator and consumed once by the
//! loader before any row. Its order is the column order of every DDL
//! statement and every insert, so both sides must agree on it exactly.
//!
//! Textual form:
//!
//! ```text
//! tags,hostname string,region string
//! cpu,usage_user,usage_system
//!
//! ```

use crate::error::InterchangeError;
use crate::types::{ColumnKind, SerializedType};

/// Literal that starts the tag declaration line and every tags row.
pub const TAGS_PREFIX: &str = "tags";

/// Ordered field columns of one measurement table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableColumns {
    pub name: String,
    pub fields: Vec<String>,
}

/// Header shared by the generator and the loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    tag_keys: Vec<String>,
    tag_types: Vec<SerializedType>,
    tables: Vec<TableColumns>,
}

impl Header {
    /// Create a header from parallel tag key and tag type lists.
    pub fn new(
        tag_keys: Vec<String>,
        tag_types: Vec<SerializedType>,
    ) -> Result<Self, InterchangeError> {
        if tag_keys.len() != tag_types.len() {
            return Err(InterchangeError::TagCountMismatch {
                names: tag_keys.len(),
                types: tag_types.len(),
            });
        }
        Ok(Self {
            tag_keys,
            tag_types,
            tables: Vec::new(),
        })
    }

    /// Declare a measurement table and its field columns.
    pub fn with_table(mut self, name: impl Into<String>, fields: Vec<String>) -> Self {
        self.add_table(name, fields);
        self
    }

    /// Declare a measurement table, replacing any previous declaration.
    pub fn add_table(&mut self, name: impl Into<String>, fields: Vec<String>) {
        let name = name.into();
        match self.tables.iter_mut().find(|t| t.name == name) {
            Some(existing) => existing.fields = fields,
            None => self.tables.push(TableColumns { name, fields }),
        }
    }

    pub fn tag_keys(&self) -> &[String] {
        &self.tag_keys
    }

    pub fn tag_types(&self) -> &[SerializedType] {
        &self.tag_types
    }

    pub fn tables(&self) -> &[TableColumns] {
        &self.tables
    }

    /// The tag whose value receives a surrogate id (first declared tag).
    pub fn primary_tag(&self) -> Option<&str> {
        self.tag_keys.first().map(String::as_str)
    }

    /// Look up a table's field columns.
    pub fn table(&self, name: &str) -> Option<&TableColumns> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Storage kinds of the tag columns, in header order.
    pub fn tag_kinds(&self) -> Vec<ColumnKind> {
        self.tag_keys
            .iter()
            .zip(&self.tag_types)
            .map(|(key, ty)| ColumnKind::resolve(key, *ty))
            .collect()
    }

    /// Render the header block, terminated by a blank line.
    pub fn render(&self) -> String {
        let mut out = String::from(TAGS_PREFIX);
        for (key, ty) in self.tag_keys.iter().zip(&self.tag_types) {
            out.push(',');
            out.push_str(key);
            out.push(' ');
            out.push_str(ty.as_str());
        }
        out.push('\n');

        for table in &self.tables {
            out.push_str(&table.name);
            for field in &table.fields {
                out.push(',');
                out.push_str(field);
            }
            out.push('\n');
        }
        out.push('\n');
        out
    }

    /// Parse the header block lines (without the terminating blank line).
    pub fn parse<'a, I>(lines: I) -> Result<Self, InterchangeError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut lines = lines.into_iter();
        let tags_line = lines
            .next()
            .ok_or_else(|| InterchangeError::MalformedHeader(String::new()))?;

        let mut parts = tags_line.split(',');
        if parts.next() != Some(TAGS_PREFIX) {
            return Err(InterchangeError::MalformedHeader(tags_line.to_string()));
        }

        let mut tag_keys = Vec::new();
        let mut tag_types = Vec::new();
        for part in parts {
            let (key, ty) = part
                .split_once(' ')
                .ok_or_else(|| InterchangeError::MalformedHeader(tags_line.to_string()))?;
            tag_keys.push(key.to_string());
            tag_types.push(ty.trim().parse()?);
        }

        let mut header = Self::new(tag_keys, tag_types)?;
        for line in lines {
            let mut parts = line.split(',');
            let name = parts
                .next()
                .filter(|n| !n.is_empty() && *n != TAGS_PREFIX)
                .ok_or_else(|| InterchangeError::MalformedHeader(line.to_string()))?;
            header.add_table(name, parts.map(str::to_string).collect());
        }

        Ok(header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn devops_header() -> Header {
        Header::new(
            vec!["hostname".to_string(), "region".to_string()],
            vec![SerializedType::String, SerializedType::String],
        )
        .unwrap()
        .with_table(
            "cpu",
            vec!["usage_user".to_string(), "usage_system".to_string()],
        )
    }

    #[test]
    fn test_render_header() {
        assert_eq!(
            devops_header().render(),
            "tags,hostname string,region string\ncpu,usage_user,usage_system\n\n"
        );
    }

    #[test]
    fn test_parse_rendered_header() {
        let header = devops_header();
        let rendered = header.render();
        let parsed = Header::parse(rendered.lines().take_while(|l| !l.is_empty())).unwrap();
        assert_eq!(parsed, header);
        assert_eq!(parsed.primary_tag(), Some("hostname"));
    }

    #[test]
    fn test_tag_count_mismatch() {
        let err = Header::new(vec!["a".to_string()], vec![]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "wrong number of tag names (1) and tag types (0)"
        );
    }

    #[test]
    fn test_parse_rejects_unknown_type() {
        let err = Header::parse(["tags,hostname varchar"]).unwrap_err();
        assert!(matches!(err, InterchangeError::Coerce(_)));
    }

    #[test]
    fn test_parse_rejects_missing_type() {
        let err = Header::parse(["tags,hostname"]).unwrap_err();
        assert!(matches!(err, InterchangeError::MalformedHeader(_)));
    }

    #[test]
    fn test_tag_kinds_apply_reserved_names() {
        let header = Header::new(
            vec!["session_id".to_string(), "properties_map".to_string()],
            vec![SerializedType::String, SerializedType::String],
        )
        .unwrap();
        assert_eq!(header.tag_kinds(), vec![ColumnKind::String, ColumnKind::Map]);
    }
}
