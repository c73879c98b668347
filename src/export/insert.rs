//! INSERT script writer
//!
//! Writes one `INSERT` statement per record into a sink, wrapping the rows in
//! transactions of at most `commit_every` rows:
//!
//! ```text
//! BEGIN;
//! INSERT ...;          (x commit_every)
//! COMMIT;
//! BEGIN;
//! ...
//! COMMIT;
//! ```

use super::ExportError;
use super::ddl::{ColumnSource, FileSchema};
use crate::convert::{ConvertError, OnError, ValueEncoder, event_timestamp_literal};
use apache_avro::types::Value;
use std::io::Write;
use tracing::debug;

/// Rows per transaction unless configured otherwise.
pub const DEFAULT_COMMIT_EVERY: usize = 100;

/// Streams INSERT statements for one partition table.
pub struct StatementWriter<W: Write> {
    writer: W,
    table_name: String,
    commit_every: usize,
    rows: usize,
    started: bool,
}

impl<W: Write> StatementWriter<W> {
    /// Create a writer; `commit_every` of 0 is treated as 1.
    pub fn new(writer: W, table_name: impl Into<String>, commit_every: usize) -> Self {
        Self {
            writer,
            table_name: table_name.into(),
            commit_every: commit_every.max(1),
            rows: 0,
            started: false,
        }
    }

    /// Rows written so far.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Write the INSERT for one record.
    ///
    /// The record's fields are matched to the schema's columns by position;
    /// a record whose field names disagree with the schema is rejected.
    pub fn write_record(
        &mut self,
        schema: &FileSchema,
        record: &Value,
        encoder: &ValueEncoder,
    ) -> Result<(), ExportError> {
        let statement = self.render_statement(schema, record, encoder)?;

        if !self.started {
            self.write_str("BEGIN;\n")?;
            self.started = true;
        }
        self.write_str(&statement)?;
        self.rows += 1;
        if self.rows % self.commit_every == 0 {
            self.write_str("COMMIT;\nBEGIN;\n")?;
        }
        Ok(())
    }

    /// Close the open transaction and flush the sink. Returns the number of
    /// rows written.
    pub fn finish(mut self) -> Result<usize, ExportError> {
        if !self.started {
            self.write_str("BEGIN;\n")?;
        }
        self.write_str("COMMIT;\n")?;
        self.writer
            .flush()
            .map_err(|e| ExportError::IoError(e.to_string()))?;
        debug!("{}: {} rows", self.table_name, self.rows);
        Ok(self.rows)
    }

    fn render_statement(
        &self,
        schema: &FileSchema,
        record: &Value,
        encoder: &ValueEncoder,
    ) -> Result<String, ExportError> {
        let fields = match record {
            Value::Record(fields) => fields,
            other => {
                return Err(ExportError::RecordShape(format!(
                    "expected a record, got {:?}",
                    other
                )));
            }
        };
        if fields.len() != schema.field_count() {
            return Err(ExportError::RecordShape(format!(
                "record has {} fields, schema has {}",
                fields.len(),
                schema.field_count()
            )));
        }

        let mut values = fields.iter();
        let mut last_value: Option<&Value> = None;
        let mut names = Vec::with_capacity(schema.columns.len());
        let mut literals = Vec::with_capacity(schema.columns.len());

        for column in &schema.columns {
            let literal = match &column.source {
                ColumnSource::Field { node, descriptor } => {
                    let (name, value) = values.next().ok_or_else(|| {
                        ExportError::RecordShape(format!("missing field '{}'", column.name))
                    })?;
                    if *name != column.name {
                        return Err(ExportError::RecordShape(format!(
                            "field '{}' found where '{}' was expected",
                            name, column.name
                        )));
                    }
                    last_value = Some(value);
                    encoder.encode(node, descriptor, value)?
                }
                ColumnSource::EventTimestamp => {
                    let literal = match last_value {
                        Some(source) => event_timestamp_literal(source),
                        None => Ok("NULL".to_string()),
                    };
                    match literal {
                        Err(ConvertError::Conversion { .. })
                            if encoder.on_error() == OnError::NullOnError =>
                        {
                            "NULL".to_string()
                        }
                        result => result?,
                    }
                }
            };
            names.push(column.name.as_str());
            literals.push(literal);
        }

        Ok(format!(
            "INSERT INTO {} (\n    {}\n)\nVALUES (\n    {}\n);\n",
            self.table_name,
            names.join("\n  , "),
            literals.join("\n  , ")
        ))
    }

    fn write_str(&mut self, text: &str) -> Result<(), ExportError> {
        self.writer
            .write_all(text.as_bytes())
            .map_err(|e| ExportError::IoError(e.to_string()))
    }
}
