//! Composite digital-exclusion indicators.
//!
//! Derivation runs on labelled fields: a respondent counts as answering "no"
//! when the canonical label equals the yes/no table's "No" label. Raw codes
//! are never compared here, so the result does not depend on how the export
//! happened to type the column.

use std::fmt;

use serde::Serialize;

use crate::{data::Value, field::CategoricalField};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionLevel {
    None,
    Partial,
    Total,
}

impl ExclusionLevel {
    pub const ALL: [ExclusionLevel; 3] = [
        ExclusionLevel::None,
        ExclusionLevel::Partial,
        ExclusionLevel::Total,
    ];

    pub fn from_answers(no_computer: bool, no_internet: bool) -> Self {
        match (no_computer, no_internet) {
            (true, true) => ExclusionLevel::Total,
            (true, false) | (false, true) => ExclusionLevel::Partial,
            (false, false) => ExclusionLevel::None,
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            ExclusionLevel::None => 0,
            ExclusionLevel::Partial => 1,
            ExclusionLevel::Total => 2,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(ExclusionLevel::None),
            1 => Some(ExclusionLevel::Partial),
            2 => Some(ExclusionLevel::Total),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExclusionLevel::None => "No exclusion",
            ExclusionLevel::Partial => "Partial exclusion",
            ExclusionLevel::Total => "Total exclusion",
        }
    }

    pub fn is_total(&self) -> bool {
        matches!(self, ExclusionLevel::Total)
    }
}

impl fmt::Display for ExclusionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-respondent exclusion indicators.
#[derive(Debug, Clone, PartialEq)]
pub struct ExclusionIndicators {
    pub levels: Vec<ExclusionLevel>,
}

impl ExclusionIndicators {
    /// Derives indicators from labelled computer-use and internet-use fields.
    /// A missing answer never counts as "no".
    pub fn derive(computer: &CategoricalField, internet: &CategoricalField, no_label: &str) -> Self {
        let levels = computer
            .flag_eq(no_label)
            .into_iter()
            .zip(internet.flag_eq(no_label))
            .map(|(no_computer, no_internet)| ExclusionLevel::from_answers(no_computer, no_internet))
            .collect();
        Self { levels }
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Binary indicator: fully excluded (no computer use and no internet use).
    pub fn excluded(&self) -> Vec<bool> {
        self.levels.iter().map(ExclusionLevel::is_total).collect()
    }

    pub fn binary_column(&self) -> Vec<Option<Value>> {
        self.levels
            .iter()
            .map(|level| Some(Value::Integer(i64::from(level.is_total()))))
            .collect()
    }

    pub fn ordinal_column(&self) -> Vec<Option<Value>> {
        self.levels
            .iter()
            .map(|level| Some(Value::Integer(i64::from(level.code()))))
            .collect()
    }

    /// Ordinal codes as categories ("0", "1", "2") for tabulation.
    pub fn ordinal_categories(&self) -> Vec<Option<String>> {
        self.levels
            .iter()
            .map(|level| Some(level.code().to_string()))
            .collect()
    }
}
