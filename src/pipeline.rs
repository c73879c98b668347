//! The generate run.
//!
//! 1. Read every input file's schema, generate its DDL fragment, derive its
//!    partition and check it against the newest file's fragment.
//! 2. Encode every file's records into staged temp files next to their final
//!    location.
//! 3. Persist the INSERT scripts, replace any earlier DDL script, then
//!    persist the new one.
//!
//! Nothing becomes visible under the SQL home unless every file succeeds.

use crate::config::{Config, ConfigError};
use crate::convert::{ConvertError, OnError, ValueEncoder};
use crate::export::{
    DdlGenerator, DdlScript, ExportError, FileSchema, StatementWriter, ddl_script_name,
    derive_partition, is_ddl_script,
};
use crate::import::{AvroFile, ImportError, discover_avro_files};
use crate::models::PartitionSpec;
use crate::validation::{ConsistencyError, SchemaConsistencyValidator};
use regex::Regex;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Error during a generate run
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error(transparent)]
    Convert(#[from] ConvertError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Consistency(#[from] ConsistencyError),
    #[error("IO error: {0}")]
    IoError(String),
}

/// Resolved settings of one run.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub avro_home: PathBuf,
    pub sql_home: PathBuf,
    pub file_pattern: Regex,
    pub type_prefix: String,
    pub parent_table: String,
    pub partition_column: String,
    pub commit_every: usize,
    pub on_error: OnError,
}

impl GenerateOptions {
    /// Resolve a validated configuration against the workspace directory.
    pub fn from_config(config: &Config, workspace_path: &Path) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self {
            avro_home: config.avro_home(workspace_path),
            sql_home: config.sql_home(workspace_path),
            file_pattern: config.file_regex()?,
            type_prefix: config.schema.type_prefix.clone(),
            parent_table: config.schema.parent_table.clone(),
            partition_column: config.schema.partition_column.clone(),
            commit_every: config.insert.commit_every,
            on_error: if config.insert.null_on_error {
                OnError::NullOnError
            } else {
                OnError::Abort
            },
        })
    }
}

/// Outcome for one input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub table_name: String,
    pub source: PathBuf,
    pub output: PathBuf,
    pub rows: usize,
}

/// Outcome of a generate run. Empty when no input files were found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateReport {
    pub ddl_path: Option<PathBuf>,
    pub files: Vec<FileReport>,
    /// sha256 of the shared schema
    pub schema_fingerprint: Option<String>,
}

impl GenerateReport {
    pub fn total_rows(&self) -> usize {
        self.files.iter().map(|f| f.rows).sum()
    }
}

struct PlannedFile {
    avro: AvroFile,
    schema: FileSchema,
}

struct StagedFile {
    temp: NamedTempFile,
    report: FileReport,
}

/// Run all three phases.
pub fn generate(options: &GenerateOptions) -> Result<GenerateReport, PipelineError> {
    let paths = discover_avro_files(&options.avro_home, &options.file_pattern)?;
    if paths.is_empty() {
        info!("No Avro files found; nothing to generate");
        return Ok(GenerateReport::default());
    }

    // Phase 1: schemas, partitions, consistency
    let generator = DdlGenerator::new(options.type_prefix.as_str());
    let mut validator = SchemaConsistencyValidator::new();
    let mut planned = Vec::with_capacity(paths.len());
    let mut partitions: Vec<PartitionSpec> = Vec::with_capacity(paths.len());
    for path in &paths {
        let avro = AvroFile::open(path)?;
        let schema = generator.generate(avro.schema())?;
        partitions.push(derive_partition(avro.table_name())?);
        validator.check(path, &schema.fragment)?;
        planned.push(PlannedFile { avro, schema });
    }
    let schema_fingerprint = validator.fingerprint();
    info!(
        "{} files share one schema (sha256 {})",
        planned.len(),
        schema_fingerprint.as_deref().unwrap_or("-")
    );

    // Phase 2: staged INSERT scripts
    create_dir(&options.sql_home)?;
    let encoder = ValueEncoder::new(options.on_error);
    let mut staged = Vec::with_capacity(planned.len());
    for (index, file) in planned.iter().enumerate() {
        let staged_file = stage_inserts(options, file, &encoder)?;
        info!(
            "({}) {}.sql: {} rows",
            index + 1,
            staged_file.report.table_name,
            staged_file.report.rows
        );
        staged.push(staged_file);
    }

    // Phase 3: publish
    let newest = &planned[0];
    let canonical = validator.canonical().unwrap_or(&newest.schema.fragment);
    let ddl = DdlScript {
        parent_table: &options.parent_table,
        partition_column: &options.partition_column,
        canonical,
        partitions: &partitions,
    }
    .render();
    let ddl_path = options
        .sql_home
        .join(ddl_script_name(newest.avro.table_name()));
    let mut ddl_temp = new_temp(&options.sql_home)?;
    ddl_temp
        .write_all(ddl.as_bytes())
        .map_err(|e| PipelineError::IoError(format!("Failed to write DDL: {}", e)))?;

    let mut files = Vec::with_capacity(staged.len());
    for StagedFile { temp, report } in staged {
        persist(temp, &report.output)?;
        files.push(report);
    }
    // The SQL home holds exactly one DDL script.
    remove_stale_ddl_scripts(&options.sql_home, &ddl_path)?;
    persist(ddl_temp, &ddl_path)?;
    info!(
        "Wrote {} ({} partitions, {} rows)",
        ddl_path.display(),
        partitions.len(),
        files.iter().map(|f| f.rows).sum::<usize>()
    );

    Ok(GenerateReport {
        ddl_path: Some(ddl_path),
        files,
        schema_fingerprint,
    })
}

fn stage_inserts(
    options: &GenerateOptions,
    file: &PlannedFile,
    encoder: &ValueEncoder,
) -> Result<StagedFile, PipelineError> {
    let out_dir = output_dir(options, file.avro.path());
    create_dir(&out_dir)?;
    let table_name = file.avro.table_name().to_string();
    let output = out_dir.join(format!("{}.sql", table_name));

    let mut temp = new_temp(&out_dir)?;
    let mut writer = StatementWriter::new(
        BufWriter::new(&mut temp),
        table_name.as_str(),
        options.commit_every,
    );
    for record in file.avro.records()? {
        writer.write_record(&file.schema, &record?, encoder)?;
    }
    let rows = writer.finish()?;
    debug!("Staged {} at {}", output.display(), temp.path().display());

    Ok(StagedFile {
        temp,
        report: FileReport {
            table_name,
            source: file.avro.path().to_path_buf(),
            output,
            rows,
        },
    })
}

/// `<sql_home>/<input dir relative to avro_home>`
fn output_dir(options: &GenerateOptions, input: &Path) -> PathBuf {
    let parent = input.parent().unwrap_or(Path::new(""));
    match parent.strip_prefix(&options.avro_home) {
        Ok(relative) => options.sql_home.join(relative),
        Err(_) => match parent.file_name() {
            Some(name) => options.sql_home.join(name),
            None => options.sql_home.clone(),
        },
    }
}

fn create_dir(dir: &Path) -> Result<(), PipelineError> {
    std::fs::create_dir_all(dir).map_err(|e| {
        PipelineError::IoError(format!("Failed to create {}: {}", dir.display(), e))
    })
}

fn new_temp(dir: &Path) -> Result<NamedTempFile, PipelineError> {
    NamedTempFile::new_in(dir).map_err(|e| {
        PipelineError::IoError(format!(
            "Failed to create temp file in {}: {}",
            dir.display(),
            e
        ))
    })
}

fn remove_stale_ddl_scripts(sql_home: &Path, keep: &Path) -> Result<(), PipelineError> {
    let entries = std::fs::read_dir(sql_home).map_err(|e| {
        PipelineError::IoError(format!("Failed to list {}: {}", sql_home.display(), e))
    })?;
    for entry in entries {
        let path = entry
            .map_err(|e| PipelineError::IoError(e.to_string()))?
            .path();
        if path == keep || !path.is_file() || !is_ddl_script(&path) {
            continue;
        }
        warn!("Removing superseded DDL script {}", path.display());
        std::fs::remove_file(&path).map_err(|e| {
            PipelineError::IoError(format!("Failed to remove {}: {}", path.display(), e))
        })?;
    }
    Ok(())
}

fn persist(temp: NamedTempFile, path: &Path) -> Result<(), PipelineError> {
    temp.persist(path).map(|_| ()).map_err(|e| {
        PipelineError::IoError(format!("Failed to write {}: {}", path.display(), e.error))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(avro_home: &str, sql_home: &str) -> GenerateOptions {
        GenerateOptions::from_config(&Config::default(), Path::new("/unused"))
        .map(|mut o| {
            o.avro_home = PathBuf::from(avro_home);
            o.sql_home = PathBuf::from(sql_home);
            o
        })
        .unwrap()
    }

    #[test]
    fn test_output_dir_mirrors_input_subdir() {
        let opts = options("/data/avro", "/data/sql");
        assert_eq!(
            output_dir(&opts, Path::new("/data/avro/202311/events_20231101.avro")),
            PathBuf::from("/data/sql/202311")
        );
        assert_eq!(
            output_dir(&opts, Path::new("/elsewhere/202310/events_20231031.avro")),
            PathBuf::from("/data/sql/202310")
        );
    }

    #[test]
    fn test_options_from_config() {
        let mut config = Config::default();
        config.insert.null_on_error = true;
        config.local.sql_home = "/abs/sql".to_string();
        let opts = GenerateOptions::from_config(&config, Path::new("/ws")).unwrap();
        assert_eq!(opts.avro_home, PathBuf::from("/ws/avro"));
        assert_eq!(opts.sql_home, PathBuf::from("/abs/sql"));
        assert_eq!(opts.on_error, OnError::NullOnError);
        assert_eq!(opts.commit_every, 100);
    }

    #[test]
    fn test_no_input_files_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let opts = options(
            dir.path().join("avro").to_str().unwrap(),
            dir.path().join("sql").to_str().unwrap(),
        );
        let report = generate(&opts).unwrap();
        assert_eq!(report, GenerateReport::default());
        assert!(!dir.path().join("sql").exists());
    }
}
