pub mod aggregate;
pub mod analysis;
pub mod bucket;
pub mod cli;
pub mod config;
pub mod data;
pub mod dataset;
pub mod error;
pub mod export;
pub mod field;
pub mod frequency;
pub mod indicators;
pub mod io_utils;
pub mod labels;
pub mod narrative;
pub mod resolver;
pub mod table;

use std::{env, path::Path, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use encoding_rs::Encoding;
use log::{LevelFilter, debug, info};

use crate::{
    cli::{Cli, Commands},
    config::SurveyConfig,
    dataset::Dataset,
    export::{CsvDirectorySink, StdoutSink, TableSink},
    resolver::SemanticField,
};

pub const SUMMARY_FILE: &str = "summary.json";
pub const ENRICHED_FILE: &str = "enriched.csv";
pub const REPORT_FILE: &str = "report.md";

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("survey_inclusion", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Analyze(args) => handle_analyze(&args),
        Commands::Resolve(args) => handle_resolve(&args),
        Commands::Frequency(args) => handle_frequency(&args),
    }
}

fn load_config(path: Option<&Path>) -> Result<SurveyConfig> {
    let config = SurveyConfig::load_or_default(path)
        .with_context(|| format!("Loading configuration from {path:?}"))?;
    if let Some(path) = path {
        debug!("Loaded configuration from {path:?}");
    }
    Ok(config)
}

fn load_dataset(path: &Path, delimiter: Option<u8>, encoding: &'static Encoding) -> Result<Dataset> {
    let delimiter = io_utils::resolve_input_delimiter(path, delimiter);
    info!(
        "Reading '{}' with delimiter '{}' and encoding {}",
        path.display(),
        printable_delimiter(delimiter),
        encoding.name()
    );
    let dataset = Dataset::from_csv_path(path, delimiter, encoding)
        .with_context(|| format!("Loading {path:?}"))?;
    debug!(
        "Loaded {} row(s) and {} column(s) from {:?}",
        dataset.len(),
        dataset.headers().len(),
        path
    );
    Ok(dataset)
}

fn handle_analyze(args: &cli::AnalyzeArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let individuals = load_dataset(&args.individuals, args.delimiter, encoding)?;
    let households = load_dataset(&args.households, args.delimiter, encoding)?;

    let merged = individuals
        .left_join(&households, &config.join_keys)
        .context("Joining individuals with households")?;
    info!("Merged dataset has {} respondent(s)", merged.len());

    let analysis = analysis::analyze(&merged, &config).context("Analyzing survey data")?;

    let mut sink = CsvDirectorySink::create(&args.output, io_utils::DEFAULT_CSV_DELIMITER)?;
    let written = export::export_tables(&analysis.tables, &mut sink)?;
    info!("Wrote {written} table(s) to {:?}", args.output);
    if args.table {
        let mut stdout = StdoutSink;
        for table in &analysis.tables {
            stdout.write_table(table)?;
        }
    }

    export::write_json(&args.output.join(SUMMARY_FILE), &analysis.summary)?;
    export::write_dataset_csv(
        &args.output.join(ENRICHED_FILE),
        &analysis.dataset,
        io_utils::DEFAULT_CSV_DELIMITER,
    )?;
    let report = narrative::render_report(&analysis.tables, &analysis.summary, &args.year);
    export::write_document(&args.output.join(REPORT_FILE), &report)?;
    info!(
        "Total exclusion {:.2}% across {} respondent(s); report written to {:?}",
        analysis.summary.exclusion_total_pct,
        analysis.summary.respondents,
        args.output.join(REPORT_FILE)
    );
    Ok(())
}

fn handle_resolve(args: &cli::ResolveArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let dataset = load_dataset(&args.input, args.delimiter, encoding)?;
    let headers = vec![
        "Field".to_string(),
        "Column".to_string(),
        "Aliases".to_string(),
    ];
    let rows = SemanticField::ALL
        .iter()
        .map(|field| {
            let column = config
                .aliases
                .resolve(dataset.headers(), *field)
                .unwrap_or("not found");
            vec![
                field.to_string(),
                column.to_string(),
                config.aliases.for_field(*field).join(", "),
            ]
        })
        .collect::<Vec<_>>();
    table::print_table(&headers, &rows);
    Ok(())
}

fn handle_frequency(args: &cli::FrequencyArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let dataset = load_dataset(&args.input, args.delimiter, encoding)?;
    let table = frequency::frequency_table(
        &dataset,
        &args.column,
        args.weight.as_deref(),
        &config,
        args.top,
    )
    .with_context(|| format!("Counting values of '{}'", args.column))?;
    table::print_table(&table.headers(), &table.render_rows());
    Ok(())
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
