//! CLI binary entry point for avro-to-postgres

#[cfg(feature = "cli")]
use anyhow::Context;
#[cfg(feature = "cli")]
use avro_to_postgres::cli::commands::generate::{GenerateArgs, handle_generate};
#[cfg(feature = "cli")]
use avro_to_postgres::cli::commands::init::handle_init_config;
#[cfg(feature = "cli")]
use avro_to_postgres::cli::commands::load_config;
#[cfg(feature = "cli")]
use avro_to_postgres::cli::commands::inspect::{InspectArgs, handle_inspect};
#[cfg(all(feature = "cli", feature = "postgres-backend"))]
use avro_to_postgres::cli::commands::load::{LoadArgs, handle_load};
#[cfg(feature = "cli")]
use avro_to_postgres::cli::logging;
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "avro-to-postgres")]
#[command(about = "Generate partitioned PostgreSQL DDL and INSERT scripts from daily Avro exports")]
#[command(version)]
struct Cli {
    /// Workspace directory; relative paths in the config resolve against it
    #[arg(short, long, global = true, default_value = ".")]
    workspace: PathBuf,
    /// Config file (default: <workspace>/avro-to-postgres.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Debug logging for this crate
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Generate the DDL script and one INSERT script per Avro file
    Generate {
        /// Override [local] avro_home
        #[arg(long)]
        avro_home: Option<PathBuf>,
        /// Override [local] sql_home
        #[arg(long)]
        sql_home: Option<PathBuf>,
        /// Rows per BEGIN/COMMIT batch
        #[arg(long)]
        commit_every: Option<usize>,
        /// Write NULL for values that cannot be encoded
        #[arg(long)]
        null_on_error: bool,
    },

    /// Execute the generated scripts against PostgreSQL
    #[cfg(feature = "postgres-backend")]
    Load {
        /// Override [postgres] connection_string
        #[arg(long)]
        connection_string: Option<String>,
    },

    /// Print the DDL a single Avro file produces
    Inspect {
        /// Avro container file
        file: PathBuf,
        /// Print the writer schema JSON before the DDL
        #[arg(long)]
        schema: bool,
    },

    /// Write a sample avro-to-postgres.toml into the workspace
    InitConfig {
        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },
}

#[cfg(feature = "cli")]
fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Generate {
            avro_home,
            sql_home,
            commit_every,
            null_on_error,
        } => {
            let args = GenerateArgs {
                workspace: cli.workspace,
                config: cli.config,
                avro_home,
                sql_home,
                commit_every,
                null_on_error,
            };
            handle_generate(&args).context("generate failed")
        }

        #[cfg(feature = "postgres-backend")]
        Commands::Load { connection_string } => {
            let args = LoadArgs {
                workspace: cli.workspace,
                config: cli.config,
                connection_string,
            };
            handle_load(&args).context("load failed")
        }

        Commands::Inspect { file, schema } => {
            let config = load_config(&cli.workspace, cli.config.as_ref())
                .context("failed to load config")?;
            let args = InspectArgs {
                file,
                type_prefix: config.schema.type_prefix,
                parent_table: config.schema.parent_table,
                partition_column: config.schema.partition_column,
                show_schema: schema,
            };
            handle_inspect(&args)
                .with_context(|| format!("inspect {} failed", args.file.display()))
        }

        Commands::InitConfig { force } => handle_init_config(&cli.workspace, force)
            .map(|_| ())
            .context("init-config failed"),
    }
}

#[cfg(feature = "cli")]
fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature is not enabled. Build with --features cli");
    std::process::exit(1);
}
