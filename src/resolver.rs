//! Column alias resolution.
//!
//! Column names drift between survey waves (`CH06` one quarter, `EDAD` the
//! next), so optional fields are looked up through ordered alias lists and
//! the first alias present in the dataset wins.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SemanticField {
    Age,
    Sex,
    Education,
    Income,
    Weight,
}

impl SemanticField {
    pub const ALL: [SemanticField; 5] = [
        SemanticField::Age,
        SemanticField::Sex,
        SemanticField::Education,
        SemanticField::Income,
        SemanticField::Weight,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SemanticField::Age => "age",
            SemanticField::Sex => "sex",
            SemanticField::Education => "education",
            SemanticField::Income => "income",
            SemanticField::Weight => "weight",
        }
    }
}

impl fmt::Display for SemanticField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FieldAliases {
    pub age: Vec<String>,
    pub sex: Vec<String>,
    pub education: Vec<String>,
    pub income: Vec<String>,
    pub weight: Vec<String>,
}

impl Default for FieldAliases {
    fn default() -> Self {
        Self {
            age: strings(&["CH06", "EDAD", "edad"]),
            sex: strings(&["CH04", "SEXO"]),
            education: strings(&["NIVEL_ED", "NIVEL_EDUC", "NIVEL_EDUCATIVO"]),
            income: strings(&["ITF", "ITF_HOGAR", "ingreso_total_hogar"]),
            weight: strings(&["PONDERA", "PONDIIO", "PONDIH", "PESO", "FACTOR", "FACTOR_EXP"]),
        }
    }
}

impl FieldAliases {
    pub fn for_field(&self, field: SemanticField) -> &[String] {
        match field {
            SemanticField::Age => &self.age,
            SemanticField::Sex => &self.sex,
            SemanticField::Education => &self.education,
            SemanticField::Income => &self.income,
            SemanticField::Weight => &self.weight,
        }
    }

    pub fn resolve<'h>(&self, headers: &'h [String], field: SemanticField) -> Option<&'h str> {
        resolve_column(headers, self.for_field(field))
    }
}

/// First alias present in `headers`, in alias order.
pub fn resolve_column<'h, S: AsRef<str>>(headers: &'h [String], aliases: &[S]) -> Option<&'h str> {
    aliases.iter().find_map(|alias| {
        headers
            .iter()
            .find(|header| header.as_str() == alias.as_ref())
            .map(String::as_str)
    })
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}
