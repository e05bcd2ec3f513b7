pub(crate) mod generate;
pub(crate) mod order;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rowseed")]
#[command(version)]
#[command(
    about = "Generate boundary-value test rows for a relational schema",
    long_about = None
)]
pub struct Cli {
    /// Verbose logging (same as RUST_LOG=rowseed=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate rows for every table of a DDL schema file
    Generate {
        /// DDL file with CREATE TABLE / CREATE INDEX / ALTER TABLE statements
        file: PathBuf,

        /// Output directory (csv) or file (sql, stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format: csv or sql
        #[arg(short, long, default_value = "csv")]
        format: String,

        /// SQL dialect for sql output: mysql, postgres, sqlite, mssql
        #[arg(short, long, default_value = "postgres")]
        dialect: String,

        /// YAML config with per-table domains and checks
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Seed for unique-token domains (random if not specified)
        #[arg(long)]
        seed: Option<u64>,

        /// Maximum rows per table
        #[arg(long)]
        max_rows: Option<usize>,

        /// Do not add boundary-value check rows
        #[arg(long)]
        no_default_checks: bool,

        /// Stop starting new tables after this many seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Output results as JSON instead of human-readable text
        #[arg(long)]
        json: bool,

        /// Show progress during generation
        #[arg(short, long)]
        progress: bool,

        /// Generate without writing any output files
        #[arg(long)]
        dry_run: bool,
    },

    /// Print tables in foreign-key insertion order
    Order {
        /// DDL file with CREATE TABLE / ALTER TABLE statements
        file: PathBuf,

        /// Print children before parents (deletion order)
        #[arg(long)]
        reverse: bool,

        /// Output results as JSON instead of plain text
        #[arg(long)]
        json: bool,
    },

    /// Print JSON Schemas for --json outputs and the config file
    Schema {
        /// Only print the schema with this name (generate, order, config)
        #[arg(short, long)]
        command: Option<String>,

        /// List available schema names
        #[arg(long)]
        list: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Generate {
            file,
            output,
            format,
            dialect,
            config,
            seed,
            max_rows,
            no_default_checks,
            timeout,
            json,
            progress,
            dry_run,
        } => generate::run(generate::GenerateArgs {
            file,
            output,
            format: format.parse().map_err(anyhow::Error::msg)?,
            dialect: dialect.parse().map_err(anyhow::Error::msg)?,
            config,
            seed,
            max_rows,
            no_default_checks,
            timeout,
            json,
            progress,
            dry_run,
        }),
        Commands::Order {
            file,
            reverse,
            json,
        } => order::run(file, reverse, json),
        Commands::Schema { command, list } => run_schema(command, list),
        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "rowseed", &mut io::stdout());
            Ok(())
        }
    }
}

fn run_schema(command: Option<String>, list: bool) -> anyhow::Result<()> {
    if list {
        for name in crate::json_schema::schema_names() {
            println!("{}", name);
        }
        return Ok(());
    }

    match command {
        Some(name) => {
            let Some(schema) = crate::json_schema::get_schema(&name) else {
                anyhow::bail!(
                    "unknown schema '{}'. Available: {}",
                    name,
                    crate::json_schema::schema_names().join(", ")
                );
            };
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
        None => {
            let schemas = crate::json_schema::all_schemas();
            println!("{}", serde_json::to_string_pretty(&schemas)?);
        }
    }
    Ok(())
}
