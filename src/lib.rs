//! avro-to-postgres - PostgreSQL schema and data scripts from Avro exports
//!
//! Reads daily Avro object container files (`<avro_home>/<yyyymm>/events_YYYYMMDD.avro`)
//! and produces:
//! - one transactional DDL script: composite types, a parent table
//!   partitioned by range on `event_date`, and one partition per file
//! - one INSERT script per file, batched into bounded transactions
//!
//! Generation refuses to write anything unless every file shares the same
//! schema and every value can be encoded.
//!
//! # Example
//!
//! ```rust,no_run
//! use avro_to_postgres::config::Config;
//! use avro_to_postgres::pipeline::{GenerateOptions, generate};
//! use std::path::Path;
//!
//! let workspace = Path::new(".");
//! let config = Config::load(workspace)?;
//! let report = generate(&GenerateOptions::from_config(&config, workspace)?)?;
//! println!("{} rows", report.total_rows());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod convert;
pub mod database;
pub mod export;
pub mod import;
pub mod models;
pub mod pipeline;
pub mod validation;

// Re-export commonly used types
pub use config::{Config, ConfigError};
pub use convert::{ConvertError, OnError, TypeMapper, ValueEncoder};
pub use export::{DdlGenerator, DdlScript, ExportError, FileSchema, StatementWriter};
pub use import::{AvroFile, ImportError};
pub use models::{AvroSchema, AvroTypeNode, DdlFragment, PartitionSpec, SchemaError};
pub use pipeline::{GenerateOptions, GenerateReport, PipelineError, generate};
pub use validation::{ConsistencyError, SchemaConsistencyValidator};

#[cfg(feature = "postgres-backend")]
pub use database::PostgresExecutor;
pub use database::{DatabaseError, SqlExecutor, load_scripts};
