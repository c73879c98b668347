//! Avro object container file reader.
//!
//! The writer schema is taken from the raw `avro.schema` header entry rather
//! than from `apache_avro::Schema`, which drops attributes such as `sqlType`
//! that drive column typing.

use super::ImportError;
use crate::models::AvroSchema;
use apache_avro::types::Value;
use apache_avro::{Reader, Schema, from_avro_datum};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File name pattern of the daily exports.
pub const DEFAULT_FILE_PATTERN: &str = r"^events_.*\.avro$";

const MAGIC: [u8; 4] = [b'O', b'b', b'j', 1];
const SCHEMA_KEY: &str = "avro.schema";

static HEADER_SCHEMA: Lazy<Result<Schema, String>> = Lazy::new(|| {
    Schema::parse_str(r#"{"type": "map", "values": "bytes"}"#).map_err(|e| e.to_string())
});

/// One Avro container file with its parsed writer schema.
#[derive(Debug, Clone)]
pub struct AvroFile {
    path: PathBuf,
    table_name: String,
    schema_json: serde_json::Value,
    schema: AvroSchema,
}

impl AvroFile {
    /// Read the container header of `path`.
    ///
    /// Only the header is read here; records are streamed by [`AvroFile::records`].
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ImportError> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| ImportError::IoError(format!("Failed to open {}: {}", path.display(), e)))?;
        let mut reader = BufReader::new(file);

        let schema_json = read_header_schema(&mut reader)
            .map_err(|e| context(path, e))?;
        let schema = AvroSchema::from_json(&schema_json)?;

        let table_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .map(str::to_lowercase)
            .ok_or_else(|| {
                ImportError::ParseError(format!("Invalid file name: {}", path.display()))
            })?;

        debug!(
            "Read schema of {} ({} fields)",
            path.display(),
            schema.fields().len()
        );

        Ok(Self {
            path: path.to_path_buf(),
            table_name,
            schema_json,
            schema,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lower-cased file stem, used as the partition table name.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn schema(&self) -> &AvroSchema {
        &self.schema
    }

    /// The writer schema exactly as stored in the header.
    pub fn schema_json(&self) -> &serde_json::Value {
        &self.schema_json
    }

    /// Stream the file's records in file order.
    pub fn records(&self) -> Result<AvroRecords, ImportError> {
        let file = File::open(&self.path).map_err(|e| {
            ImportError::IoError(format!("Failed to open {}: {}", self.path.display(), e))
        })?;
        let reader = Reader::new(BufReader::new(file)).map_err(|e| {
            ImportError::AvroError(format!("Invalid Avro file {}: {}", self.path.display(), e))
        })?;
        Ok(AvroRecords {
            path: self.path.clone(),
            reader,
        })
    }
}

/// Iterator over the records of one container file.
pub struct AvroRecords {
    path: PathBuf,
    reader: Reader<'static, BufReader<File>>,
}

impl Iterator for AvroRecords {
    type Item = Result<Value, ImportError>;

    fn next(&mut self) -> Option<Self::Item> {
        let value = self.reader.next()?;
        Some(match value {
            Ok(record @ Value::Record(_)) => Ok(record),
            Ok(other) => Err(ImportError::ParseError(format!(
                "{}: top-level value is not a record: {:?}",
                self.path.display(),
                other
            ))),
            Err(e) => Err(ImportError::AvroError(format!(
                "{}: {}",
                self.path.display(),
                e
            ))),
        })
    }
}

fn read_header_schema(reader: &mut impl Read) -> Result<serde_json::Value, ImportError> {
    let mut magic = [0u8; 4];
    reader
        .read_exact(&mut magic)
        .map_err(|e| ImportError::IoError(format!("Failed to read header: {}", e)))?;
    if magic != MAGIC {
        return Err(ImportError::ParseError(
            "not an Avro object container file".to_string(),
        ));
    }

    let header_schema = HEADER_SCHEMA
        .as_ref()
        .map_err(|e| ImportError::AvroError(e.clone()))?;
    let metadata = from_avro_datum(header_schema, reader, None)
        .map_err(|e| ImportError::AvroError(format!("Failed to read header metadata: {}", e)))?;

    let Value::Map(entries) = metadata else {
        return Err(ImportError::ParseError(
            "header metadata is not a map".to_string(),
        ));
    };
    let raw = match entries.get(SCHEMA_KEY) {
        Some(Value::Bytes(bytes)) => bytes,
        _ => {
            return Err(ImportError::ParseError(format!(
                "header has no '{}' entry",
                SCHEMA_KEY
            )));
        }
    };

    serde_json::from_slice(raw)
        .map_err(|e| ImportError::ParseError(format!("Invalid writer schema JSON: {}", e)))
}

fn context(path: &Path, error: ImportError) -> ImportError {
    match error {
        ImportError::ParseError(msg) => {
            ImportError::ParseError(format!("{}: {}", path.display(), msg))
        }
        ImportError::IoError(msg) => ImportError::IoError(format!("{}: {}", path.display(), msg)),
        ImportError::AvroError(msg) => {
            ImportError::AvroError(format!("{}: {}", path.display(), msg))
        }
        other => other,
    }
}

/// Find `<root>/<subdir>/<file>` where the file name matches `pattern`,
/// newest first (descending path order).
///
/// A missing root yields no files.
pub fn discover_avro_files(root: &Path, pattern: &Regex) -> Result<Vec<PathBuf>, ImportError> {
    if !root.is_dir() {
        info!("Avro home {} does not exist", root.display());
        return Ok(Vec::new());
    }

    let read_dir = |dir: &Path| {
        std::fs::read_dir(dir)
            .map_err(|e| ImportError::IoError(format!("Failed to list {}: {}", dir.display(), e)))
    };

    let mut files = Vec::new();
    for entry in read_dir(root)? {
        let subdir = entry
            .map_err(|e| ImportError::IoError(e.to_string()))?
            .path();
        if !subdir.is_dir() {
            continue;
        }
        for entry in read_dir(&subdir)? {
            let path = entry
                .map_err(|e| ImportError::IoError(e.to_string()))?
                .path();
            let matches = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| pattern.is_match(name));
            if matches && path.is_file() {
                files.push(path);
            }
        }
    }

    files.sort_by(|a, b| b.cmp(a));
    info!("Found {} Avro files under {}", files.len(), root.display());
    Ok(files)
}
