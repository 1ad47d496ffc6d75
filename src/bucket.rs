//! Banding of continuous fields: fixed age bands and income quintiles.

use log::warn;

use crate::field::NumericField;

pub const AGE_BANDS: [&str; 5] = ["0-17", "18-29", "30-44", "45-64", "65+"];
/// Right-closed upper edges of [`AGE_BANDS`]; the first band opens at -0.1.
const AGE_UPPER_EDGES: [f64; 5] = [17.0, 29.0, 44.0, 64.0, 150.0];
const AGE_MIN: f64 = 0.0;
const AGE_MAX: f64 = 100.0;

pub const QUINTILE_COUNT: usize = 5;
pub const QUINTILE_LABELS: [&str; QUINTILE_COUNT] = ["Q1 (lowest)", "Q2", "Q3", "Q4", "Q5 (highest)"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketMode {
    /// Buckets follow the age of each respondent.
    Semantic,
    /// No usable age column: respondents are split into equal-size buckets by
    /// row position. The grouping carries no meaning.
    RowPosition,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgeBuckets {
    pub bands: Vec<Option<String>>,
    pub mode: BucketMode,
}

impl AgeBuckets {
    pub fn is_semantic(&self) -> bool {
        self.mode == BucketMode::Semantic
    }
}

/// Band for one age, after clipping to `[0, 100]`.
pub fn age_band(age: f64) -> Option<&'static str> {
    if !age.is_finite() {
        return None;
    }
    let clipped = age.clamp(AGE_MIN, AGE_MAX);
    AGE_UPPER_EDGES
        .iter()
        .position(|edge| clipped <= *edge)
        .map(|idx| AGE_BANDS[idx])
}

/// Age bands for `rows` respondents, falling back to row-position buckets
/// when no numeric age field is available.
pub fn bucket_ages(age: Option<&NumericField>, rows: usize) -> AgeBuckets {
    match age {
        Some(field) => AgeBuckets {
            bands: field
                .values
                .iter()
                .map(|v| v.and_then(age_band).map(str::to_string))
                .collect(),
            mode: BucketMode::Semantic,
        },
        None => {
            warn!("No numeric age column found; grouping {rows} row(s) by position instead");
            AgeBuckets {
                bands: (0..rows)
                    .map(|idx| Some(format!("Row bucket {}", quantile_bin(idx, rows) + 1)))
                    .collect(),
                mode: BucketMode::RowPosition,
            }
        }
    }
}

/// Income quintile per respondent (`None` where income is missing).
///
/// Incomes are ranked with ties broken by row order and the ranks are split
/// into five equal-width quantile bins. Returns `None` when fewer than five
/// respondents report an income.
pub fn income_quintiles(income: &NumericField) -> Option<Vec<Option<String>>> {
    let mut ranked = income
        .values
        .iter()
        .enumerate()
        .filter_map(|(idx, v)| v.filter(|x| x.is_finite()).map(|x| (idx, x)))
        .collect::<Vec<_>>();
    if ranked.len() < QUINTILE_COUNT {
        return None;
    }
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));

    let total = ranked.len();
    let mut quintiles = vec![None; income.len()];
    for (position, (idx, _)) in ranked.into_iter().enumerate() {
        let bin = quantile_bin(position, total);
        quintiles[idx] = Some(QUINTILE_LABELS[bin].to_string());
    }
    Some(quintiles)
}

/// Bin of the `position`-th of `count` ordered items in a five-way quantile
/// split with right-closed edges at `k * (count - 1) / 5`.
fn quantile_bin(position: usize, count: usize) -> usize {
    let span = count.saturating_sub(1);
    (0..QUINTILE_COUNT)
        .find(|k| QUINTILE_COUNT * position <= (k + 1) * span)
        .unwrap_or(QUINTILE_COUNT - 1)
}
