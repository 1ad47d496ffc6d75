//! Weighted value counts and weighted group proportions.
//!
//! Every entry point takes an optional weight slice parallel to the data.
//! A weight slice whose length does not match the data is ignored and the
//! computation falls back to unweighted counting; a null weight contributes
//! nothing to either numerator or denominator.

use std::collections::HashMap;

use itertools::Itertools;
use log::debug;
use serde::Serialize;

/// Display text for the missing-value category.
pub const MISSING_CATEGORY: &str = "<empty>";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub category: Option<String>,
    pub count: i64,
}

impl CategoryCount {
    pub fn display(&self) -> &str {
        self.category.as_deref().unwrap_or(MISSING_CATEGORY)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupRate {
    pub group: String,
    /// Percentage in `[0, 100]`, rounded to 2 decimals.
    pub percent: f64,
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn effective_weights(weights: Option<&[Option<f64>]>, len: usize) -> Option<&[Option<f64>]> {
    match weights {
        Some(w) if w.len() == len => Some(w),
        Some(w) => {
            debug!(
                "Ignoring weight series of length {} for {} row(s); counting unweighted",
                w.len(),
                len
            );
            None
        }
        None => None,
    }
}

fn weight_at(weights: &[Option<f64>], idx: usize) -> f64 {
    weights[idx].filter(|w| w.is_finite()).unwrap_or(0.0)
}

/// One row per distinct category, missing included, sorted by display text.
///
/// Counts are weight sums rounded to the nearest integer when weights are
/// given, occurrence counts otherwise.
pub fn value_counts(
    categories: &[Option<String>],
    weights: Option<&[Option<f64>]>,
) -> Vec<CategoryCount> {
    let weights = effective_weights(weights, categories.len());
    let mut totals: HashMap<Option<&str>, f64> = HashMap::new();
    for (idx, category) in categories.iter().enumerate() {
        let increment = weights.map_or(1.0, |w| weight_at(w, idx));
        *totals.entry(category.as_deref()).or_insert(0.0) += increment;
    }
    totals
        .into_iter()
        .map(|(category, total)| CategoryCount {
            category: category.map(str::to_string),
            count: total.round() as i64,
        })
        .sorted_by(|a, b| a.display().cmp(b.display()))
        .collect()
}

/// Share of each count in the total, as percentages rounded to 2 decimals.
pub fn percentages(counts: &[CategoryCount]) -> Vec<f64> {
    let total: i64 = counts.iter().map(|c| c.count).sum();
    counts
        .iter()
        .map(|c| {
            if total > 0 {
                round2(c.count as f64 / total as f64 * 100.0)
            } else {
                0.0
            }
        })
        .collect()
}

/// Percentage of flagged rows within each group.
///
/// Rows with a missing group are dropped. Groups are ordered by their text.
/// A group whose weights sum to zero reports 0.
pub fn proportions_by_group(
    groups: &[Option<String>],
    flags: &[bool],
    weights: Option<&[Option<f64>]>,
) -> Vec<GroupRate> {
    let weights = effective_weights(weights, groups.len());
    let mut sums: HashMap<&str, (f64, f64)> = HashMap::new();
    for (idx, (group, flag)) in groups.iter().zip(flags).enumerate() {
        let Some(group) = group.as_deref() else {
            continue;
        };
        let weight = weights.map_or(1.0, |w| weight_at(w, idx));
        let entry = sums.entry(group).or_insert((0.0, 0.0));
        if *flag {
            entry.0 += weight;
        }
        entry.1 += weight;
    }
    sums.into_iter()
        .sorted_by(|a, b| a.0.cmp(b.0))
        .map(|(group, (numerator, denominator))| GroupRate {
            group: group.to_string(),
            percent: round2(ratio(numerator, denominator) * 100.0),
        })
        .collect()
}

/// Overall (weighted) proportion of flagged rows, as a fraction.
pub fn weighted_proportion(flags: &[bool], weights: Option<&[Option<f64>]>) -> f64 {
    let weights = effective_weights(weights, flags.len());
    let (numerator, denominator) =
        flags
            .iter()
            .enumerate()
            .fold((0.0, 0.0), |(num, den), (idx, flag)| {
                let weight = weights.map_or(1.0, |w| weight_at(w, idx));
                (num + if *flag { weight } else { 0.0 }, den + weight)
            });
    ratio(numerator, denominator)
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}
