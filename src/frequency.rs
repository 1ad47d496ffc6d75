use anyhow::{Result, anyhow};
use log::debug;

use crate::{
    aggregate,
    config::SurveyConfig,
    dataset::Dataset,
    field::{CategoricalField, NumericField},
    labels::LabelMapper,
    resolver::SemanticField,
    table::AggregateTable,
};

/// Labelled, optionally weighted value counts for one column.
///
/// Code tables follow the same bindings an analysis would use: the yes/no
/// table for the configured survey columns, and the sex and education tables
/// when `column` is the one those fields resolve to. `top` keeps the most
/// frequent categories only (0 keeps all).
pub fn frequency_table(
    dataset: &Dataset,
    column: &str,
    weight: Option<&str>,
    config: &SurveyConfig,
    top: usize,
) -> Result<AggregateTable> {
    if !dataset.has_column(column) {
        return Err(anyhow!("Column '{column}' not found in input"));
    }

    let headers = dataset.headers();
    let mut mapper = LabelMapper::new(&config.labels);
    if config.aliases.resolve(headers, SemanticField::Sex) == Some(column) {
        mapper.bind(column, &config.labels.sex);
    }
    if config.aliases.resolve(headers, SemanticField::Education) == Some(column) {
        mapper.bind(column, &config.labels.education);
    }

    let weights = match weight {
        Some(name) => {
            if !dataset.has_column(name) {
                return Err(anyhow!("Weight column '{name}' not found in input"));
            }
            let field = NumericField::from_dataset(dataset, name)
                .ok_or_else(|| anyhow!("Weight column '{name}' is not numeric"))?;
            Some(field.values)
        }
        None => None,
    };

    let field = CategoricalField::from_dataset(dataset, column, &mapper)
        .ok_or_else(|| anyhow!("Column '{column}' not found in input"))?;
    let counts = aggregate::value_counts(&field.values, weights.as_deref());
    debug!("Column '{column}' has {} distinct value(s)", counts.len());
    let mut table = AggregateTable::distribution(format!("Frequency of {column}"), column, &counts);
    if top > 0 && table.rows.len() > top {
        // Shares stay relative to the full total; the stable sort keeps the
        // display order among equal counts.
        table.rows.sort_by(|a, b| b.count.cmp(&a.count));
        table.rows.truncate(top);
    }
    Ok(table)
}
