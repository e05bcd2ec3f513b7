use indicatif::{ProgressBar, ProgressStyle};
use rowseed::domain::RhaiHost;
use rowseed::generator::{
    GenerateOptions, GenerateYamlConfig, GenerationReport, GenerationWarning, Generator,
};
use rowseed::schema::{load_schema, Schema};
use rowseed::writer::{CsvSink, OutputFormat, Sink, SqlDialect, SqlSink, WRITER_BUFFER_SIZE};
use schemars::JsonSchema;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::debug;

/// Arguments of the generate command after parsing
pub struct GenerateArgs {
    pub file: PathBuf,
    pub output: Option<PathBuf>,
    pub format: OutputFormat,
    pub dialect: SqlDialect,
    pub config: Option<PathBuf>,
    pub seed: Option<u64>,
    pub max_rows: Option<usize>,
    pub no_default_checks: bool,
    pub timeout: Option<u64>,
    pub json: bool,
    pub progress: bool,
    pub dry_run: bool,
}

/// JSON output for the generate command
#[derive(Serialize, JsonSchema)]
pub(crate) struct GenerateJsonOutput {
    pub input_file: String,
    pub output: Option<String>,
    pub format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dialect: Option<String>,
    pub seed: u64,
    pub dry_run: bool,
    pub elapsed_secs: f64,
    /// All tables in insertion order
    pub order: Vec<String>,
    pub tables: Vec<TableJsonOutput>,
    pub total_rows: usize,
    pub warnings: Vec<GenerationWarning>,
    pub dropped_warnings: usize,
}

#[derive(Serialize, JsonSchema)]
pub(crate) struct TableJsonOutput {
    pub name: String,
    pub rows: usize,
    pub columns: Vec<String>,
    /// Fill rows stopped because a unique domain ran out of values
    pub exhausted: bool,
}

pub fn run(args: GenerateArgs) -> anyhow::Result<()> {
    if !args.file.exists() {
        anyhow::bail!("input file does not exist: {}", args.file.display());
    }
    if args.json && args.format == OutputFormat::Sql && args.output.is_none() && !args.dry_run {
        anyhow::bail!("--json with sql format requires --output");
    }

    let start = Instant::now();
    let schema = load_schema(&args.file)?;

    let config = match &args.config {
        Some(path) => Some(GenerateYamlConfig::load(path)?),
        None => None,
    };

    let mut options = GenerateOptions::default();
    if let Some(ref cfg) = config {
        cfg.apply_options(&mut options)?;
    }
    if let Some(seed) = args.seed {
        options.seed = seed;
    }
    if let Some(max_rows) = args.max_rows {
        options.max_rows = max_rows;
    }
    if args.no_default_checks {
        options.default_checks = false;
    }
    if let Some(secs) = args.timeout {
        options.deadline = Some(Instant::now() + Duration::from_secs(secs));
    }
    let seed = options.seed;

    if !args.json {
        eprintln!(
            "Generating rows for {} tables from {:?} (seed {})",
            schema.len(),
            args.file,
            seed
        );
    }

    let mut generator = Generator::new(&schema, options);
    if let (Some(cfg), Some(path)) = (&config, &args.config) {
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        cfg.apply(&mut generator, &RhaiHost::new(), base_dir)?;
    }

    let progress_bar = if args.progress && !args.json {
        let pb = ProgressBar::new(schema.len() as u64);
        pb.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} tables {msg}",
            )?
            .progress_chars("█▓▒░  "),
        );
        Some(pb)
    } else {
        None
    };

    let report = generator.run_with_progress(|p| {
        if let Some(ref pb) = progress_bar {
            pb.set_position(p.done as u64);
            pb.set_message(p.table.canonical());
        }
    })?;

    if let Some(pb) = progress_bar {
        pb.finish_and_clear();
    }

    let output = if args.dry_run {
        None
    } else {
        match args.format {
            OutputFormat::Csv => {
                let dir = args
                    .output
                    .clone()
                    .unwrap_or_else(|| PathBuf::from("output"));
                let mut sink = CsvSink::new(dir.clone());
                sink.ensure_output_dir()?;
                write_tables(&mut sink, &schema, &report)?;
                debug!(files = sink.files().len(), dir = %dir.display(), "csv files written");
                Some(dir)
            }
            OutputFormat::Sql => {
                let writer: Box<dyn Write> = match &args.output {
                    Some(path) => {
                        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                            std::fs::create_dir_all(parent)?;
                        }
                        Box::new(File::create(path)?)
                    }
                    None => Box::new(io::stdout()),
                };
                let mut sink = SqlSink::new(
                    BufWriter::with_capacity(WRITER_BUFFER_SIZE, writer),
                    args.dialect,
                );
                write_tables(&mut sink, &schema, &report)?;
                debug!(statements = sink.statements(), "sql written");
                args.output.clone()
            }
        }
    };

    let elapsed = start.elapsed();

    if args.json {
        let out = GenerateJsonOutput {
            input_file: args.file.display().to_string(),
            output: output.as_ref().map(|p| p.display().to_string()),
            format: args.format.to_string(),
            dialect: (args.format == OutputFormat::Sql).then(|| args.dialect.to_string()),
            seed,
            dry_run: args.dry_run,
            elapsed_secs: elapsed.as_secs_f64(),
            order: report.order.clone(),
            tables: report
                .tables
                .iter()
                .map(|t| TableJsonOutput {
                    name: t.name.canonical(),
                    rows: t.records.len(),
                    columns: t.records.columns().iter().map(|c| c.name.clone()).collect(),
                    exhausted: t.exhausted,
                })
                .collect(),
            total_rows: report.total_rows(),
            warnings: report.warnings.clone(),
            dropped_warnings: report.dropped_warnings,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    eprintln!();
    if args.dry_run {
        eprintln!("Dry run complete (no files written)");
    } else {
        eprintln!("Generation completed successfully!");
    }
    eprintln!(
        "  Tables: {} of {}",
        report.tables.len(),
        report.order.len()
    );
    eprintln!("  Rows: {}", report.total_rows());
    for table in &report.tables {
        let note = if table.exhausted { " (values exhausted)" } else { "" };
        eprintln!(
            "    {}: {} rows{}",
            table.name,
            table.records.len(),
            note
        );
    }
    if let Some(ref path) = output {
        eprintln!("  Output: {}", path.display());
    }
    eprintln!("  Elapsed: {:.3?}", elapsed);

    report.print_warnings();

    Ok(())
}

fn write_tables(
    sink: &mut dyn Sink,
    schema: &Schema,
    report: &GenerationReport,
) -> anyhow::Result<()> {
    for output in &report.tables {
        let Some(table) = schema.table(output.table) else {
            continue;
        };
        sink.write_table(table, &output.records)?;
    }
    sink.finish()
}
