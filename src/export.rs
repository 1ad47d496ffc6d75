//! Output sinks for tables, the summary, the enriched dataset and the report.
//!
//! Tables go through the [`TableSink`] trait so the analysis does not care
//! whether they end up as CSV files, on stdout, or in a spreadsheet writer.
//! Names are derived from the table title the way a spreadsheet sheet name
//! would be: characters a sheet name cannot hold are dropped and the result
//! is capped at [`SHEET_NAME_LIMIT`] characters.

use std::{
    collections::HashSet,
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    sync::OnceLock,
};

use anyhow::{Context, Result};
use heck::ToSnakeCase;
use log::{debug, info};
use regex::Regex;
use serde::Serialize;

use crate::{
    dataset::Dataset,
    io_utils,
    table::{self, AggregateTable, TableSet},
};

pub const SHEET_NAME_LIMIT: usize = 31;

pub trait TableSink {
    fn write_table(&mut self, table: &AggregateTable) -> Result<()>;
}

/// Writes every table of `tables` to `sink`, returning how many were written.
pub fn export_tables(tables: &TableSet, sink: &mut dyn TableSink) -> Result<usize> {
    let mut written = 0usize;
    for table in tables {
        sink.write_table(table)
            .with_context(|| format!("Exporting table '{}'", table.title))?;
        written += 1;
    }
    Ok(written)
}

fn invalid_sheet_chars() -> &'static Regex {
    static INVALID: OnceLock<Regex> = OnceLock::new();
    INVALID.get_or_init(|| Regex::new(r"[\[\]:*?/\\]").expect("valid sheet-name pattern"))
}

/// Title reduced to a valid spreadsheet sheet name.
pub fn sheet_name(title: &str) -> String {
    let cleaned = invalid_sheet_chars().replace_all(title, "");
    truncate_chars(cleaned.trim(), SHEET_NAME_LIMIT)
}

/// Snake-case file stem for a table title, within the sheet-name limit.
pub fn file_stem(title: &str) -> String {
    let stem = sheet_name(title).to_snake_case();
    let stem = truncate_chars(&stem, SHEET_NAME_LIMIT);
    let stem = stem.trim_end_matches('_').to_string();
    if stem.is_empty() {
        "table".to_string()
    } else {
        stem
    }
}

fn truncate_chars(value: &str, limit: usize) -> String {
    value.chars().take(limit).collect()
}

/// One CSV file per table inside a directory.
pub struct CsvDirectorySink {
    dir: PathBuf,
    delimiter: u8,
    used_stems: HashSet<String>,
    written: Vec<PathBuf>,
}

impl CsvDirectorySink {
    pub fn create(dir: &Path, delimiter: u8) -> Result<Self> {
        fs::create_dir_all(dir).with_context(|| format!("Creating output directory {dir:?}"))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            delimiter,
            used_stems: HashSet::new(),
            written: Vec::new(),
        })
    }

    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn unique_stem(&mut self, title: &str) -> String {
        let base = file_stem(title);
        let mut candidate = base.clone();
        let mut counter = 2usize;
        while self.used_stems.contains(&candidate) {
            let suffix = format!("_{counter}");
            let keep = SHEET_NAME_LIMIT.saturating_sub(suffix.chars().count());
            candidate = format!("{}{suffix}", truncate_chars(&base, keep));
            counter += 1;
        }
        self.used_stems.insert(candidate.clone());
        candidate
    }
}

impl TableSink for CsvDirectorySink {
    fn write_table(&mut self, table: &AggregateTable) -> Result<()> {
        let stem = self.unique_stem(&table.title);
        let path = self.dir.join(format!("{stem}.csv"));
        let mut writer = io_utils::open_csv_writer(&path, self.delimiter)?;
        writer
            .write_record(table.headers())
            .with_context(|| format!("Writing headers to {path:?}"))?;
        for row in table.render_rows() {
            writer
                .write_record(&row)
                .with_context(|| format!("Writing row to {path:?}"))?;
        }
        writer.flush().with_context(|| format!("Flushing {path:?}"))?;
        debug!("Wrote table '{}' to {:?}", table.title, path);
        self.written.push(path);
        Ok(())
    }
}

/// Prints each table under its title.
pub struct StdoutSink;

impl TableSink for StdoutSink {
    fn write_table(&mut self, table: &AggregateTable) -> Result<()> {
        let marker = if table.degraded {
            " (row-position buckets, not age)"
        } else {
            ""
        };
        println!("== {}{marker}", table.title);
        table::print_table(&table.headers(), &table.render_rows());
        println!();
        Ok(())
    }
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Creating {path:?}"))?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)
        .with_context(|| format!("Writing JSON to {path:?}"))
}

pub fn write_dataset_csv(path: &Path, dataset: &Dataset, delimiter: u8) -> Result<()> {
    let mut writer = io_utils::open_csv_writer(path, delimiter)?;
    writer
        .write_record(dataset.headers())
        .with_context(|| format!("Writing headers to {path:?}"))?;
    for row in 0..dataset.len() {
        writer
            .write_record(dataset.row_strings(row))
            .with_context(|| format!("Writing row {} to {path:?}", row + 2))?;
    }
    writer.flush().with_context(|| format!("Flushing {path:?}"))?;
    info!("Wrote {} enriched row(s) to {:?}", dataset.len(), path);
    Ok(())
}

pub fn write_document(path: &Path, contents: &str) -> Result<()> {
    let mut file = File::create(path).with_context(|| format!("Creating {path:?}"))?;
    file.write_all(contents.as_bytes())
        .with_context(|| format!("Writing {path:?}"))?;
    file.flush()?;
    Ok(())
}
