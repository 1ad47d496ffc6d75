//! In-memory survey dataset and the household join.
//!
//! A [`Dataset`] is column-major: each column is a vector of loosely parsed
//! [`Value`] cells, `None` marking a missing answer. The individual and
//! household exports are loaded separately and combined with
//! [`Dataset::left_join`], which keeps every individual row.

use std::{
    collections::{HashMap, HashSet},
    io::Read,
    path::Path,
};

use encoding_rs::Encoding;
use log::debug;

use crate::{
    data::{Value, parse_cell},
    error::DatasetError,
    io_utils,
};

const KEY_SEPARATOR: &str = "\u{1f}";
const BYTE_ORDER_MARK: char = '\u{feff}';
const HOUSEHOLD_PREFIX: &str = "household_";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    headers: Vec<String>,
    columns: Vec<Vec<Option<Value>>>,
    rows: usize,
}

impl Dataset {
    pub fn from_columns<I, S>(columns: I) -> Result<Self, DatasetError>
    where
        I: IntoIterator<Item = (S, Vec<Option<Value>>)>,
        S: Into<String>,
    {
        let mut dataset = Dataset::default();
        for (name, values) in columns {
            dataset.push_column(name, values)?;
        }
        Ok(dataset)
    }

    pub fn from_csv_path(
        path: &Path,
        delimiter: u8,
        encoding: &'static Encoding,
    ) -> Result<Self, DatasetError> {
        let reader = io_utils::open_csv_reader_from_path(path, delimiter)?;
        Self::load(reader, encoding, path)
    }

    pub fn from_csv_reader<R: Read>(
        reader: R,
        delimiter: u8,
        encoding: &'static Encoding,
    ) -> Result<Self, DatasetError> {
        let reader = io_utils::open_csv_reader(reader, delimiter);
        Self::load(reader, encoding, Path::new("-"))
    }

    fn load<R: Read>(
        mut reader: csv::Reader<R>,
        encoding: &'static Encoding,
        path: &Path,
    ) -> Result<Self, DatasetError> {
        let header_record = reader
            .byte_headers()
            .map_err(|source| DatasetError::Read {
                path: path.to_path_buf(),
                row: 1,
                source,
            })?
            .clone();
        let headers = io_utils::decode_record(&header_record, encoding)?
            .into_iter()
            .map(|h| h.trim_start_matches(BYTE_ORDER_MARK).trim().to_string())
            .collect::<Vec<_>>();

        let mut columns: Vec<Vec<Option<Value>>> = vec![Vec::new(); headers.len()];
        let mut rows = 0usize;
        for (row_idx, record) in reader.byte_records().enumerate() {
            let record = record.map_err(|source| DatasetError::Read {
                path: path.to_path_buf(),
                row: row_idx + 2,
                source,
            })?;
            if record.iter().all(|field| field.is_empty()) {
                continue;
            }
            if record.len() != headers.len() {
                return Err(DatasetError::RaggedRow {
                    row: row_idx + 2,
                    expected: headers.len(),
                    found: record.len(),
                });
            }
            let decoded = io_utils::decode_record(&record, encoding)?;
            for (column, raw) in columns.iter_mut().zip(decoded.iter()) {
                column.push(parse_cell(raw));
            }
            rows += 1;
        }
        debug!(
            "Loaded {} row(s) across {} column(s) from {:?}",
            rows,
            headers.len(),
            path
        );

        let mut dataset = Dataset {
            rows,
            ..Dataset::default()
        };
        for (name, values) in headers.into_iter().zip(columns) {
            dataset.push_column(name, values)?;
        }
        Ok(dataset)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column(&self, name: &str) -> Option<&[Option<Value>]> {
        self.column_index(name).map(|idx| self.columns[idx].as_slice())
    }

    pub fn push_column(
        &mut self,
        name: impl Into<String>,
        values: Vec<Option<Value>>,
    ) -> Result<(), DatasetError> {
        let name = name.into();
        if self.has_column(&name) {
            return Err(DatasetError::DuplicateColumn(name));
        }
        if self.headers.is_empty() {
            self.rows = values.len();
        }
        self.check_length(&name, values.len())?;
        self.headers.push(name);
        self.columns.push(values);
        Ok(())
    }

    /// Replaces an existing column or appends it when absent.
    pub fn set_column(
        &mut self,
        name: &str,
        values: Vec<Option<Value>>,
    ) -> Result<(), DatasetError> {
        match self.column_index(name) {
            Some(idx) => {
                self.check_length(name, values.len())?;
                self.columns[idx] = values;
                Ok(())
            }
            None => self.push_column(name, values),
        }
    }

    fn check_length(&self, name: &str, found: usize) -> Result<(), DatasetError> {
        if found != self.rows {
            return Err(DatasetError::ColumnLength {
                name: name.to_string(),
                expected: self.rows,
                found,
            });
        }
        Ok(())
    }

    /// Row `idx` rendered as display strings, missing cells as empty.
    pub fn row_strings(&self, idx: usize) -> Vec<String> {
        self.columns
            .iter()
            .map(|column| {
                column
                    .get(idx)
                    .and_then(|cell| cell.as_ref())
                    .map(Value::as_display)
                    .unwrap_or_default()
            })
            .collect()
    }

    /// Left join of `self` (individuals) onto `households`.
    ///
    /// The join uses every expected key present in both datasets. Household
    /// keys must be unique; individuals without a household keep `None` in
    /// every household-side column.
    pub fn left_join(
        &self,
        households: &Dataset,
        expected_keys: &[String],
    ) -> Result<Dataset, DatasetError> {
        let keys = expected_keys
            .iter()
            .filter(|key| self.has_column(key) && households.has_column(key))
            .cloned()
            .collect::<Vec<_>>();
        if keys.is_empty() {
            return Err(DatasetError::NoJoinKeys {
                expected: expected_keys.to_vec(),
            });
        }
        debug!("Joining on key column(s): {}", keys.join(", "));

        let left_key_columns = key_columns(self, &keys);
        let right_key_columns = key_columns(households, &keys);

        let mut lookup: HashMap<String, usize> = HashMap::with_capacity(households.len());
        for row in 0..households.len() {
            let key = build_key(&right_key_columns, row);
            if lookup.insert(key.clone(), row).is_some() {
                return Err(DatasetError::DuplicateJoinKey {
                    key: key.replace(KEY_SEPARATOR, "/"),
                });
            }
        }

        let matches = (0..self.len())
            .map(|row| lookup.get(&build_key(&left_key_columns, row)).copied())
            .collect::<Vec<_>>();

        let mut joined = self.clone();
        let mut seen: HashSet<String> = joined.headers.iter().cloned().collect();
        for (name, values) in households.headers.iter().zip(&households.columns) {
            if keys.contains(name) {
                continue;
            }
            let output_name = unique_name(name, &seen);
            seen.insert(output_name.clone());
            let column = matches
                .iter()
                .map(|matched| matched.and_then(|row| values[row].clone()))
                .collect::<Vec<_>>();
            joined.push_column(output_name, column)?;
        }
        debug!(
            "Matched {} of {} individual row(s) to a household",
            matches.iter().filter(|m| m.is_some()).count(),
            self.len()
        );
        Ok(joined)
    }
}

fn key_columns<'a>(dataset: &'a Dataset, keys: &[String]) -> Vec<&'a [Option<Value>]> {
    keys.iter()
        .filter_map(|key| dataset.column(key))
        .collect()
}

fn build_key(columns: &[&[Option<Value>]], row: usize) -> String {
    columns
        .iter()
        .map(|column| {
            column[row]
                .as_ref()
                .map(Value::as_display)
                .unwrap_or_default()
        })
        .collect::<Vec<_>>()
        .join(KEY_SEPARATOR)
}

fn unique_name(name: &str, seen: &HashSet<String>) -> String {
    if !seen.contains(name) {
        return name.to_string();
    }
    let base = format!("{HOUSEHOLD_PREFIX}{name}");
    let mut candidate = base.clone();
    let mut counter = 1usize;
    while seen.contains(&candidate) {
        candidate = format!("{base}_{counter}");
        counter += 1;
    }
    candidate
}
