//! Aggregate tables and their plain-text rendering.

use std::fmt::Write as _;

use serde::Serialize;

use crate::aggregate::{CategoryCount, GroupRate, percentages};

pub const COUNT_HEADER: &str = "Count";
pub const PERCENT_HEADER: &str = "%";
pub const RATE_HEADER: &str = "Percent";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    /// Marginal distribution: group, count and share of the total.
    Distribution,
    /// Rate of an indicator within each group.
    Breakdown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub group: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateTable {
    pub title: String,
    pub group_header: String,
    pub value_header: String,
    pub kind: TableKind,
    pub rows: Vec<TableRow>,
    /// Set when the grouping is not meaningful (row-position age buckets).
    pub degraded: bool,
}

impl AggregateTable {
    pub fn distribution(
        title: impl Into<String>,
        group_header: impl Into<String>,
        counts: &[CategoryCount],
    ) -> Self {
        let rows = counts
            .iter()
            .zip(percentages(counts))
            .map(|(count, percent)| TableRow {
                group: count.display().to_string(),
                count: Some(count.count),
                percent,
            })
            .collect();
        Self {
            title: title.into(),
            group_header: group_header.into(),
            value_header: PERCENT_HEADER.to_string(),
            kind: TableKind::Distribution,
            rows,
            degraded: false,
        }
    }

    pub fn breakdown(
        title: impl Into<String>,
        group_header: impl Into<String>,
        value_header: impl Into<String>,
        rates: &[GroupRate],
    ) -> Self {
        let rows = rates
            .iter()
            .map(|rate| TableRow {
                group: rate.group.clone(),
                count: None,
                percent: rate.percent,
            })
            .collect();
        Self {
            title: title.into(),
            group_header: group_header.into(),
            value_header: value_header.into(),
            kind: TableKind::Breakdown,
            rows,
            degraded: false,
        }
    }

    pub fn mark_degraded(mut self, degraded: bool) -> Self {
        self.degraded = degraded;
        self
    }

    pub fn headers(&self) -> Vec<String> {
        match self.kind {
            TableKind::Distribution => vec![
                self.group_header.clone(),
                COUNT_HEADER.to_string(),
                self.value_header.clone(),
            ],
            TableKind::Breakdown => vec![self.group_header.clone(), self.value_header.clone()],
        }
    }

    pub fn render_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                let mut cells = vec![row.group.clone()];
                if self.kind == TableKind::Distribution {
                    cells.push(row.count.unwrap_or_default().to_string());
                }
                cells.push(format!("{:.2}", row.percent));
                cells
            })
            .collect()
    }

    pub fn row(&self, group: &str) -> Option<&TableRow> {
        self.rows.iter().find(|r| r.group == group)
    }

    pub fn percent_total(&self) -> f64 {
        self.rows.iter().map(|r| r.percent).sum()
    }

    /// First row with the highest percentage.
    pub fn highest(&self) -> Option<&TableRow> {
        self.rows
            .iter()
            .fold(None, |best: Option<&TableRow>, row| match best {
                Some(b) if b.percent >= row.percent => Some(b),
                _ => Some(row),
            })
    }

    /// First row with the lowest percentage.
    pub fn lowest(&self) -> Option<&TableRow> {
        self.rows
            .iter()
            .fold(None, |best: Option<&TableRow>, row| match best {
                Some(b) if b.percent <= row.percent => Some(b),
                _ => Some(row),
            })
    }
}

/// Tables of one run, kept in the order they were built.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TableSet {
    tables: Vec<AggregateTable>,
}

impl TableSet {
    /// Adds `table`, replacing any table with the same title.
    pub fn insert(&mut self, table: AggregateTable) {
        match self.tables.iter_mut().find(|t| t.title == table.title) {
            Some(existing) => *existing = table,
            None => self.tables.push(table),
        }
    }

    pub fn get(&self, title: &str) -> Option<&AggregateTable> {
        self.tables.iter().find(|t| t.title == title)
    }

    pub fn contains(&self, title: &str) -> bool {
        self.get(title).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AggregateTable> {
        self.tables.iter()
    }

    pub fn titles(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.title.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl<'a> IntoIterator for &'a TableSet {
    type Item = &'a AggregateTable;
    type IntoIter = std::slice::Iter<'a, AggregateTable>;

    fn into_iter(self) -> Self::IntoIter {
        self.tables.iter()
    }
}

/// Column-aligned text rendering; numeric cells are right-aligned.
pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths = headers.iter().map(|h| h.chars().count()).collect::<Vec<_>>();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_line(headers, &widths));
    let rule = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_line(&rule, &widths));
    for row in rows {
        let _ = writeln!(output, "{}", format_line(row, &widths));
    }
    output
}

pub fn print_table(headers: &[String], rows: &[Vec<String>]) {
    print!("{}", render_table(headers, rows));
}

fn format_line(cells: &[String], widths: &[usize]) -> String {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let cell = cell.replace(['\n', '\r', '\t'], " ");
            if is_numeric(&cell) {
                format!("{cell:>width$}")
            } else {
                format!("{cell:<width$}")
            }
        })
        .collect::<Vec<_>>()
        .join("  ");
    line.trim_end().to_string()
}

fn is_numeric(cell: &str) -> bool {
    !cell.is_empty() && cell.parse::<f64>().is_ok()
}
