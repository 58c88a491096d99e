//! Line-oriented interchange stream.
//!
//! A stream is the header block followed by two lines per row:
//!
//! ```text
//! tags,hostname string,region string
//! cpu,usage_user,usage_system
//!
//! tags,hostname=host_0,region=eu-west-1
//! cpu,1451606400000000000,58,2
//! ```

use crate::error::InterchangeError;
use crate::header::{Header, TAGS_PREFIX};
use crate::row::{InsertData, Row};
use std::io::{BufRead, Write};

/// Writes a header and rows to any `Write` sink.
pub struct InterchangeWriter<W: Write> {
    inner: W,
    rows_written: u64,
}

impl<W: Write> InterchangeWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            rows_written: 0,
        }
    }

    /// Write the header block. Must be called once, before any row.
    pub fn write_header(&mut self, header: &Header) -> Result<(), InterchangeError> {
        self.inner.write_all(header.render().as_bytes())?;
        Ok(())
    }

    /// Write one row as a tags line and a table-prefixed fields line.
    pub fn write_row(&mut self, row: &Row) -> Result<(), InterchangeError> {
        let data = row.to_insert_data()?;
        writeln!(self.inner, "{TAGS_PREFIX},{}", data.tags)?;
        writeln!(self.inner, "{},{}", row.table, data.fields)?;
        self.rows_written += 1;
        Ok(())
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Flush and return the underlying sink.
    pub fn into_inner(mut self) -> Result<W, InterchangeError> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

/// Reads a header and then `(table, InsertData)` rows from a `BufRead` source.
pub struct InterchangeReader<R: BufRead> {
    inner: R,
    line: String,
}

impl<R: BufRead> InterchangeReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            line: String::new(),
        }
    }

    fn next_line(&mut self) -> Result<Option<&str>, InterchangeError> {
        self.line.clear();
        if self.inner.read_line(&mut self.line)? == 0 {
            return Ok(None);
        }
        Ok(Some(self.line.trim_end_matches(['\n', '\r'])))
    }

    /// Read the header block up to and including its terminating blank line.
    pub fn read_header(&mut self) -> Result<Header, InterchangeError> {
        let mut lines = Vec::new();
        while let Some(line) = self.next_line()? {
            if line.is_empty() {
                break;
            }
            lines.push(line.to_string());
        }
        Header::parse(lines.iter().map(String::as_str))
    }

    /// Read the next row, or `None` at end of stream.
    pub fn read_row(&mut self) -> Result<Option<(String, InsertData)>, InterchangeError> {
        let tags = loop {
            match self.next_line()? {
                None => return Ok(None),
                Some("") => continue,
                Some(line) => {
                    let tags = line
                        .strip_prefix(TAGS_PREFIX)
                        .and_then(|rest| rest.strip_prefix(','))
                        .ok_or_else(|| InterchangeError::MalformedRow(line.to_string()))?;
                    break tags.to_string();
                }
            }
        };

        let line = self.next_line()?.ok_or_else(|| {
            InterchangeError::MalformedRow(format!("tags line without fields line: '{tags}'"))
        })?;
        let (table, fields) = line
            .split_once(',')
            .ok_or_else(|| InterchangeError::MalformedRow(line.to_string()))?;

        Ok(Some((
            table.to_string(),
            InsertData {
                tags,
                fields: fields.to_string(),
            },
        )))
    }
}

impl<R: BufRead> Iterator for InterchangeReader<R> {
    type Item = Result<(String, InsertData), InterchangeError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_row().transpose()
    }
}
