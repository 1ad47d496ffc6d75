//! Survey configuration: core column names, alias lists, code tables and
//! join keys.
//!
//! Every section defaults to the labour-survey layout, so a YAML file only
//! needs to list what differs, e.g.
//!
//! ```yaml
//! aliases:
//!   weight: [PONDERA_TIC]
//! labels:
//!   yes_no:
//!     labels: {1: "Sí", 2: "No", 9: "Ns/Nc"}
//! ```

use std::{fs::File, io::BufReader, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    error::ConfigError,
    labels::{CodeTable, LabelConfig, NO_CODE, YES_CODE},
    resolver::{FieldAliases, SemanticField},
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CoreFields {
    pub computer_use: String,
    pub mobile_use: String,
    pub internet_use: String,
    pub household_computer: String,
    pub household_internet: String,
}

impl Default for CoreFields {
    fn default() -> Self {
        Self {
            computer_use: "IP_III_04".to_string(),
            mobile_use: "IP_III_05".to_string(),
            internet_use: "IP_III_06".to_string(),
            household_computer: "IH_II_01".to_string(),
            household_internet: "IH_II_02".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SurveyConfig {
    pub core: CoreFields,
    pub aliases: FieldAliases,
    pub labels: LabelConfig,
    pub join_keys: Vec<String>,
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            core: CoreFields::default(),
            aliases: FieldAliases::default(),
            labels: LabelConfig::default(),
            join_keys: ["CODUSU", "NRO_HOGAR", "AGLOMERADO"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl SurveyConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file = File::open(path).map_err(|source| ConfigError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let config: SurveyConfig = serde_yaml::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: SurveyConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Alias lists must be non-empty and the yes/no table must label both
    /// the yes and the no code, since indicator derivation compares labels.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for field in SemanticField::ALL {
            if self.aliases.for_field(field).is_empty() {
                return Err(ConfigError::EmptyAliases {
                    field: field.to_string(),
                });
            }
        }
        if self.join_keys.is_empty() {
            return Err(ConfigError::EmptyAliases {
                field: "join_keys".to_string(),
            });
        }
        require_label(&self.labels.yes_no, "yes_no", YES_CODE)?;
        require_label(&self.labels.yes_no, "yes_no", NO_CODE)?;
        Ok(())
    }

    /// The two fields an analysis cannot run without.
    pub fn required_fields(&self) -> [&str; 2] {
        [self.core.computer_use.as_str(), self.core.internet_use.as_str()]
    }
}

fn require_label(table: &CodeTable, name: &str, code: i64) -> Result<(), ConfigError> {
    if table.label(code).is_none() {
        return Err(ConfigError::MissingLabel {
            table: name.to_string(),
            code,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_yields_defaults() {
        let config = SurveyConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, SurveyConfig::default());
        assert_eq!(config.required_fields(), ["IP_III_04", "IP_III_06"]);
    }

    #[test]
    fn partial_yaml_overrides_only_named_sections() {
        let yaml = r#"
aliases:
  weight: [PONDERA_TIC]
labels:
  yes_no:
    labels: {1: "Sí", 2: "No", 9: "Ns/Nc"}
"#;
        let config = SurveyConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.aliases.weight, vec!["PONDERA_TIC".to_string()]);
        assert_eq!(config.aliases.age, FieldAliases::default().age);
        assert_eq!(config.labels.yes_label(), "Sí");
        assert_eq!(config.labels.sex, CodeTable::sex());
    }

    #[test]
    fn rejects_empty_alias_lists() {
        let err = SurveyConfig::from_yaml_str("aliases:\n  age: []\n").unwrap_err();
        assert!(matches!(err, ConfigError::EmptyAliases { ref field } if field == "age"));
    }

    #[test]
    fn rejects_yes_no_table_without_no_label() {
        let yaml = "labels:\n  yes_no:\n    labels: {1: \"Yes\"}\n";
        let err = SurveyConfig::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::MissingLabel { code: 2, .. }));
    }
}
