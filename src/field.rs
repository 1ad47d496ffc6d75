//! Typed views over dataset columns.
//!
//! Columns are converted once, at the start of an analysis run, into either a
//! [`CategoricalField`] (canonical display labels) or a [`NumericField`]
//! (continuous values). Downstream code works against these containers and
//! never inspects raw cell types again.

use crate::{dataset::Dataset, data::Value, labels::LabelMapper};

#[derive(Debug, Clone, PartialEq)]
pub struct CategoricalField {
    pub name: String,
    pub values: Vec<Option<String>>,
}

impl CategoricalField {
    /// Labels `name` through the mapper; columns without a bound code table
    /// keep their raw display text.
    pub fn from_dataset(dataset: &Dataset, name: &str, mapper: &LabelMapper<'_>) -> Option<Self> {
        let column = dataset.column(name)?;
        let values = column
            .iter()
            .map(|cell| cell.as_ref().map(|v| mapper.map(name, v).as_display()))
            .collect();
        Some(Self {
            name: name.to_string(),
            values,
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Per-row flag: `true` where the label equals `label`. Missing is `false`.
    pub fn flag_eq(&self, label: &str) -> Vec<bool> {
        self.values
            .iter()
            .map(|v| v.as_deref() == Some(label))
            .collect()
    }

    pub fn to_values(&self) -> Vec<Option<Value>> {
        self.values
            .iter()
            .map(|v| v.clone().map(Value::Text))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumericField {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

impl NumericField {
    /// Numeric view of `name`. Returns `None` when any present cell is text,
    /// since a partially numeric column cannot be banded meaningfully.
    pub fn from_dataset(dataset: &Dataset, name: &str) -> Option<Self> {
        let column = dataset.column(name)?;
        let values = column
            .iter()
            .map(|cell| match cell {
                None => Some(None),
                Some(value) => value.as_f64().map(Some),
            })
            .collect::<Option<Vec<_>>>()?;
        Some(Self {
            name: name.to_string(),
            values,
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::LabelConfig;

    fn dataset() -> Dataset {
        Dataset::from_columns([
            (
                "IP_III_04",
                vec![
                    Some(Value::Integer(1)),
                    Some(Value::Text("no".to_string())),
                    None,
                ],
            ),
            (
                "CH06",
                vec![Some(Value::Integer(30)), Some(Value::Float(41.5)), None],
            ),
            (
                "ITF",
                vec![
                    Some(Value::Integer(100)),
                    Some(Value::Text("n/d".to_string())),
                    None,
                ],
            ),
        ])
        .expect("dataset")
    }

    #[test]
    fn categorical_field_applies_labels() {
        let config = LabelConfig::default();
        let mapper = LabelMapper::new(&config);
        let field = CategoricalField::from_dataset(&dataset(), "IP_III_04", &mapper).unwrap();
        assert_eq!(
            field.values,
            vec![Some("Yes".to_string()), Some("No".to_string()), None]
        );
        assert_eq!(field.flag_eq("No"), vec![false, true, false]);
    }

    #[test]
    fn numeric_field_requires_numeric_cells() {
        let data = dataset();
        let age = NumericField::from_dataset(&data, "CH06").unwrap();
        assert_eq!(age.values, vec![Some(30.0), Some(41.5), None]);
        assert!(NumericField::from_dataset(&data, "ITF").is_none());
        assert!(NumericField::from_dataset(&data, "EDAD").is_none());
    }
}
