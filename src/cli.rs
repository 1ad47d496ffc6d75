use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Weighted digital-inclusion tables and reports from survey CSV files",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Join individual and household files and write tables, summary and report
    Analyze(AnalyzeArgs),
    /// Show which column each semantic field (age, sex, ...) resolves to
    Resolve(ResolveArgs),
    /// Produce labelled, optionally weighted frequency counts for one column
    Frequency(FrequencyArgs),
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// Individual-level survey CSV file
    #[arg(short = 'i', long = "individuals")]
    pub individuals: PathBuf,
    /// Household-level survey CSV file
    #[arg(short = 'H', long = "households")]
    pub households: PathBuf,
    /// Directory receiving the tables, summary.json, enriched.csv and report.md
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,
    /// Survey year shown in the report title
    #[arg(long, default_value = "2024")]
    pub year: String,
    /// YAML file overriding column names, aliases, code tables or join keys
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Also print every table to stdout
    #[arg(long = "table")]
    pub table: bool,
}

#[derive(Debug, Args)]
pub struct ResolveArgs {
    /// Input CSV file whose headers are inspected
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// YAML file overriding the alias lists
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct FrequencyArgs {
    /// Input CSV file
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Column to count
    #[arg(short = 'C', long = "column")]
    pub column: String,
    /// Numeric column holding sampling weights
    #[arg(short, long)]
    pub weight: Option<String>,
    /// Number of most frequent categories to display (0 shows all)
    #[arg(long, default_value_t = 0)]
    pub top: usize,
    /// YAML file overriding aliases or code tables
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_delimiter_accepts_names_and_single_characters() {
        assert_eq!(parse_delimiter("tab"), Ok(b'\t'));
        assert_eq!(parse_delimiter("semicolon"), Ok(b';'));
        assert_eq!(parse_delimiter("#"), Ok(b'#'));
        assert!(parse_delimiter("").is_err());
        assert!(parse_delimiter("ab").is_err());
        assert!(parse_delimiter("é").is_err());
    }

    #[test]
    fn analyze_arguments_parse() {
        let cli = Cli::try_parse_from([
            "survey-inclusion",
            "analyze",
            "-i",
            "ind.csv",
            "-H",
            "hog.csv",
            "-o",
            "out",
            "--delimiter",
            ";",
            "--table",
        ])
        .unwrap();
        match cli.command {
            Commands::Analyze(args) => {
                assert_eq!(args.delimiter, Some(b';'));
                assert_eq!(args.year, "2024");
                assert!(args.table);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
