//! Code tables and the label mapper.
//!
//! Survey answers are numeric codes (`1` = yes, `2` = no, ...) but exports
//! also carry them as strings or already-labelled free text in any casing.
//! A [`CodeTable`] maps every such representation to one canonical label;
//! values the table does not know pass through untouched, so mapping never
//! fails and mapping twice equals mapping once.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::data::Value;

pub const YES_CODE: i64 = 1;
pub const NO_CODE: i64 = 2;
pub const UNKNOWN_CODE: i64 = 9;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CodeTable {
    pub labels: BTreeMap<i64, String>,
    /// Extra spellings accepted for a code, compared case- and
    /// accent-insensitively.
    #[serde(default)]
    pub aliases: BTreeMap<i64, Vec<String>>,
}

impl CodeTable {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = (i64, S)>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(|(c, l)| (c, l.into())).collect(),
            aliases: BTreeMap::new(),
        }
    }

    pub fn with_aliases(mut self, code: i64, aliases: &[&str]) -> Self {
        self.aliases
            .entry(code)
            .or_default()
            .extend(aliases.iter().map(|a| a.to_string()));
        self
    }

    pub fn yes_no() -> Self {
        Self::new([(YES_CODE, "Yes"), (NO_CODE, "No"), (UNKNOWN_CODE, "Unknown")])
            .with_aliases(YES_CODE, &["si", "s", "y", "true"])
            .with_aliases(NO_CODE, &["n", "false"])
            .with_aliases(UNKNOWN_CODE, &["ns/nc", "nsnc", "ns", "dont know"])
    }

    pub fn sex() -> Self {
        Self::new([(1, "Male"), (2, "Female")])
            .with_aliases(1, &["varon", "hombre", "m"])
            .with_aliases(2, &["mujer", "f"])
    }

    pub fn education() -> Self {
        Self::new([
            (1, "No schooling"),
            (2, "Primary incomplete"),
            (3, "Primary complete"),
            (4, "Secondary incomplete"),
            (5, "Secondary complete"),
            (6, "Higher incomplete"),
            (7, "Higher complete"),
            (UNKNOWN_CODE, "Unknown"),
        ])
        .with_aliases(1, &["sin instruccion"])
        .with_aliases(2, &["primaria incompleta"])
        .with_aliases(3, &["primaria completa"])
        .with_aliases(4, &["secundaria incompleta"])
        .with_aliases(5, &["secundaria completa"])
        .with_aliases(6, &["superior incompleto", "superior universitario incompleto"])
        .with_aliases(7, &["superior completo", "superior universitario completo"])
        .with_aliases(UNKNOWN_CODE, &["ns/nc"])
    }

    pub fn label(&self, code: i64) -> Option<&str> {
        self.labels.get(&code).map(String::as_str)
    }

    /// Code whose label or alias matches `text`.
    pub fn code_for_text(&self, text: &str) -> Option<i64> {
        let needle = normalize_text(text);
        if needle.is_empty() {
            return None;
        }
        self.labels
            .iter()
            .find(|(_, label)| normalize_text(label) == needle)
            .map(|(code, _)| *code)
            .or_else(|| {
                self.aliases
                    .iter()
                    .find(|(_, aliases)| aliases.iter().any(|a| normalize_text(a) == needle))
                    .map(|(code, _)| *code)
            })
    }

    pub fn map_value(&self, value: &Value) -> Value {
        let code = value.as_code().or_else(|| match value {
            Value::Text(text) => self.code_for_text(text),
            _ => None,
        });
        match code.and_then(|c| self.label(c)) {
            Some(label) => Value::Text(label.to_string()),
            None => value.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LabelConfig {
    pub yes_no: CodeTable,
    /// Columns coded with the yes/no table.
    pub yes_no_fields: Vec<String>,
    pub sex: CodeTable,
    pub education: CodeTable,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            yes_no: CodeTable::yes_no(),
            yes_no_fields: ["IP_III_04", "IP_III_05", "IP_III_06", "IH_II_01", "IH_II_02"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            sex: CodeTable::sex(),
            education: CodeTable::education(),
        }
    }
}

impl LabelConfig {
    pub fn yes_label(&self) -> &str {
        self.yes_no.label(YES_CODE).unwrap_or("Yes")
    }

    pub fn no_label(&self) -> &str {
        self.yes_no.label(NO_CODE).unwrap_or("No")
    }
}

/// Field-to-table assignment for one analysis run.
///
/// The yes/no fields are bound from the configuration; the sex and education
/// tables are bound to whichever alias the resolver found in the dataset.
#[derive(Debug, Clone)]
pub struct LabelMapper<'a> {
    tables: BTreeMap<String, &'a CodeTable>,
}

impl<'a> LabelMapper<'a> {
    pub fn new(config: &'a LabelConfig) -> Self {
        let tables = config
            .yes_no_fields
            .iter()
            .map(|field| (field.clone(), &config.yes_no))
            .collect();
        Self { tables }
    }

    pub fn bind(&mut self, field: &str, table: &'a CodeTable) {
        self.tables.insert(field.to_string(), table);
    }

    pub fn table_for(&self, field: &str) -> Option<&'a CodeTable> {
        self.tables.get(field).copied()
    }

    pub fn map(&self, field: &str, value: &Value) -> Value {
        match self.table_for(field) {
            Some(table) => table.map_value(value),
            None => value.clone(),
        }
    }

    pub fn map_column(&self, field: &str, values: &[Option<Value>]) -> Vec<Option<Value>> {
        values
            .iter()
            .map(|cell| cell.as_ref().map(|v| self.map(field, v)))
            .collect()
    }
}

/// Lowercases, folds Spanish/Portuguese accents and collapses whitespace.
pub fn normalize_text(value: &str) -> String {
    let folded = value
        .trim()
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ä' | 'ã' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'ö' | 'õ' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ñ' => 'n',
            'ç' => 'c',
            other => other,
        })
        .collect::<String>();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    #[test]
    fn yes_no_table_tolerates_type_drift() {
        let table = CodeTable::yes_no();
        assert_eq!(table.map_value(&Value::Integer(2)), text("No"));
        assert_eq!(table.map_value(&Value::Float(1.0)), text("Yes"));
        assert_eq!(table.map_value(&text("9")), text("Unknown"));
        for raw in ["SI", "si", "Si", "Sí", "yes"] {
            assert_eq!(table.map_value(&text(raw)), text("Yes"), "raw {raw}");
        }
    }

    #[test]
    fn unmapped_values_pass_through() {
        let table = CodeTable::yes_no();
        assert_eq!(table.map_value(&Value::Integer(5)), Value::Integer(5));
        assert_eq!(table.map_value(&text("Maybe")), text("Maybe"));
        assert_eq!(table.map_value(&Value::Float(1.5)), Value::Float(1.5));
    }

    #[test]
    fn education_table_maps_codes_and_spanish_text() {
        let table = CodeTable::education();
        assert_eq!(table.map_value(&Value::Integer(4)), text("Secondary incomplete"));
        assert_eq!(
            table.map_value(&text("Superior Completo")),
            text("Higher complete")
        );
    }

    #[test]
    fn mapper_only_touches_bound_fields() {
        let config = LabelConfig::default();
        let mut mapper = LabelMapper::new(&config);
        assert_eq!(mapper.map("IP_III_04", &Value::Integer(1)), text("Yes"));
        assert_eq!(mapper.map("CH04", &Value::Integer(1)), Value::Integer(1));
        mapper.bind("CH04", &config.sex);
        assert_eq!(mapper.map("CH04", &Value::Integer(1)), text("Male"));
    }

    #[test]
    fn map_column_keeps_missing_cells() {
        let config = LabelConfig::default();
        let mapper = LabelMapper::new(&config);
        let mapped = mapper.map_column("IP_III_06", &[Some(Value::Integer(2)), None]);
        assert_eq!(mapped, vec![Some(text("No")), None]);
    }

    #[test]
    fn normalize_text_folds_case_accents_and_spaces() {
        assert_eq!(normalize_text("  Sin   Instrucción "), "sin instruccion");
        assert_eq!(normalize_text("VARÓN"), "varon");
    }

    fn any_value() -> impl Strategy<Value = Value> {
        prop_oneof![
            (-3i64..12).prop_map(Value::Integer),
            (-3i64..12).prop_map(|i| Value::Float(i as f64)),
            (-30.0f64..30.0).prop_map(Value::Float),
            prop::sample::select(vec![
                "SI", "si", "No", "NO", "ns/nc", "Varón", "mujer", "Maybe", "2", "7", "",
            ])
            .prop_map(|s| Value::Text(s.to_string())),
            "[a-zA-Z ]{0,8}".prop_map(Value::Text),
        ]
    }

    proptest! {
        #[test]
        fn mapping_is_idempotent(value in any_value()) {
            for table in [CodeTable::yes_no(), CodeTable::sex(), CodeTable::education()] {
                let once = table.map_value(&value);
                let twice = table.map_value(&once);
                prop_assert_eq!(once, twice);
            }
        }
    }
}
