//! Snowplow Extractor CLI - enriched-event TSV to typed NDJSON rows
//!
//! # Commands
//!
//! ```bash
//! snowplow-extract extract events.tsv --schema schema.json           # Rows as NDJSON on stdout
//! snowplow-extract extract a.tsv b.tsv -s schema.json -o out/        # One <stem>.ndjson per input
//! snowplow-extract validate --schema schema.json                     # Check a schema against the catalog
//! snowplow-extract transform events.tsv                              # Canonical JSON per line
//! snowplow-extract catalog                                           # List known fields
//! ```
//!
//! Options not given on the command line fall back to `SNOWPLOW_*`
//! environment variables (a `.env` file is loaded if present).

use clap::{Parser, Subcommand};
use futures::future::join_all;
use snowplow_extractor::{
    catalog, extract_file_with, extract_with, logs, validate_schema, write_ndjson,
    EnrichedEventTransformer, ExtractOptions, ExtractionError, ExtractionSummary, LineTransformer,
    Schema,
};
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "snowplow-extract")]
#[command(about = "Extract schema-typed rows from Snowplow enriched-event TSV", long_about = None)]
struct Cli {
    /// Suppress diagnostic logging
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract typed rows as NDJSON
    Extract {
        /// Input TSV files (stdin if none)
        inputs: Vec<PathBuf>,

        /// Schema file (default: $SNOWPLOW_SCHEMA)
        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// Write one <stem>.ndjson per input here (default: stdout)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Do not add geo_location
        #[arg(long)]
        no_geolocation: bool,
    },

    /// Validate a schema file against the field catalog
    Validate {
        /// Schema file (default: $SNOWPLOW_SCHEMA)
        #[arg(short, long)]
        schema: Option<PathBuf>,
    },

    /// Print the canonical JSON record for each line
    Transform {
        /// Input TSV file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Do not add geo_location
        #[arg(long)]
        no_geolocation: bool,
    },

    /// List catalog fields and their expected column types
    Catalog,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut options = ExtractOptions::from_env();
    options.quiet |= cli.quiet;
    options.log_json |= cli.log_json;
    logs::set_quiet(options.quiet);
    logs::set_json(options.log_json);

    let result = match cli.command {
        Commands::Extract {
            inputs,
            schema,
            output_dir,
            no_geolocation,
        } => {
            if schema.is_some() {
                options.schema_path = schema;
            }
            if output_dir.is_some() {
                options.output_dir = output_dir;
            }
            if no_geolocation {
                options.add_geolocation = false;
            }
            cmd_extract(&inputs, &options).await
        }

        Commands::Validate { schema } => {
            if schema.is_some() {
                options.schema_path = schema;
            }
            cmd_validate(&options)
        }

        Commands::Transform {
            input,
            output,
            no_geolocation,
        } => cmd_transform(&input, output.as_deref(), !no_geolocation && options.add_geolocation),

        Commands::Catalog => cmd_catalog(),
    };

    if let Err(e) = result {
        match e.downcast_ref::<ExtractionError>() {
            Some(extraction) => {
                eprintln!("❌ Error: {}", extraction.kind());
                for message in extraction.messages() {
                    eprintln!("   - {}", message);
                }
            }
            None => eprintln!("❌ Error: {}", e),
        }
        std::process::exit(1);
    }
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn load_schema(options: &ExtractOptions) -> CliResult<Arc<Schema>> {
    let path = options
        .schema_path
        .as_deref()
        .ok_or("no schema given (use --schema or SNOWPLOW_SCHEMA)")?;

    let schema = Schema::load(path)?;
    logs::log_info(format!("Schema {}: {} columns", path.display(), schema.len()));
    Ok(Arc::new(schema))
}

async fn cmd_extract(inputs: &[PathBuf], options: &ExtractOptions) -> CliResult<()> {
    let schema = load_schema(options)?;
    let transformer = EnrichedEventTransformer::new(options.add_geolocation);

    let summaries = match &options.output_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            extract_to_dir(inputs, dir, schema, transformer).await?
        }
        None => extract_to_stdout(inputs, schema, transformer)?,
    };

    let total: usize = summaries.iter().map(|s| s.rows).sum();
    logs::log_success(format!("{} rows from {} input(s)", total, summaries.len()));
    Ok(())
}

/// Inputs one after another into a single stdout stream.
fn extract_to_stdout(
    inputs: &[PathBuf],
    schema: Arc<Schema>,
    transformer: EnrichedEventTransformer,
) -> CliResult<Vec<ExtractionSummary>> {
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    if inputs.is_empty() {
        let stdin = io::stdin();
        let rows = extract_with(stdin.lock(), schema, transformer).with_source("<stdin>");
        let written = write_ndjson(rows, &mut out)?;
        return Ok(vec![ExtractionSummary { source: "<stdin>".to_string(), rows: written }]);
    }

    let mut summaries = Vec::with_capacity(inputs.len());
    for input in inputs {
        let rows = extract_file_with(input, Arc::clone(&schema), transformer.clone())?;
        let written = write_ndjson(rows, &mut out)?;
        summaries.push(ExtractionSummary { source: input.display().to_string(), rows: written });
    }
    Ok(summaries)
}

/// One blocking task per input, each writing its own file.
async fn extract_to_dir(
    inputs: &[PathBuf],
    dir: &Path,
    schema: Arc<Schema>,
    transformer: EnrichedEventTransformer,
) -> CliResult<Vec<ExtractionSummary>> {
    if inputs.is_empty() {
        return Err("--output-dir needs at least one input file".into());
    }

    let tasks = inputs.iter().map(|input| {
        let input = input.clone();
        let target = output_path(dir, &input);
        let schema = Arc::clone(&schema);
        let transformer = transformer.clone();

        tokio::task::spawn_blocking(move || -> Result<ExtractionSummary, ExtractionError> {
            let rows = extract_file_with(&input, schema, transformer)?;
            let out = BufWriter::new(File::create(&target)?);
            let written = write_ndjson(rows, out)?;
            logs::log_info_indent(format!("{} → {}", input.display(), target.display()), 1);
            Ok(ExtractionSummary { source: input.display().to_string(), rows: written })
        })
    });

    let mut summaries = Vec::with_capacity(inputs.len());
    for joined in join_all(tasks).await {
        summaries.push(joined??);
    }
    Ok(summaries)
}

fn output_path(dir: &Path, input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "events".to_string());
    dir.join(format!("{}.ndjson", stem))
}

fn cmd_validate(options: &ExtractOptions) -> CliResult<()> {
    let schema = load_schema(options)?;

    match validate_schema(&schema) {
        Ok(()) => {
            logs::log_success(format!("All {} columns valid", schema.len()));
            Ok(())
        }
        Err(violations) => {
            for violation in &violations {
                println!("{}", violation);
            }
            logs::log_error(format!("{} of {} columns invalid", violations.len(), schema.len()));
            std::process::exit(1);
        }
    }
}

fn cmd_transform(input: &Path, output: Option<&Path>, add_geolocation: bool) -> CliResult<()> {
    let transformer = EnrichedEventTransformer::new(add_geolocation);
    let reader = BufReader::new(File::open(input)?);

    let mut out: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let mut count = 0;
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let json = transformer
            .transform(&line)
            .map_err(|e| ExtractionError::transformation(index + 1, e))?;
        writeln!(out, "{}", json)?;
        count += 1;
    }
    out.flush()?;

    logs::log_success(format!("Transformed {} lines", count));
    if let Some(path) = output {
        logs::log_info(format!("Output written to: {}", path.display()));
    }
    Ok(())
}

fn cmd_catalog() -> CliResult<()> {
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    for (name, _) in catalog::fields() {
        if let Some(expected) = catalog::expected_column_type(name) {
            writeln!(out, "{}\t{}", name, expected)?;
        }
    }
    for prefix in catalog::DYNAMIC_FAMILY_PREFIXES {
        writeln!(out, "{}*\t{}", prefix, catalog::dynamic_family_type())?;
    }
    out.flush()?;
    Ok(())
}
