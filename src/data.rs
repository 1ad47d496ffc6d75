use std::fmt;

use serde::{Deserialize, Serialize};

/// Tokens that survey exports use for an absent answer.
const PLACEHOLDER_TOKENS: &[&str] = &["na", "n/a", "nan", "null", "none", "-"];

/// A single survey cell after loose parsing.
///
/// Exports arrive with inconsistent typing: the same column can carry `2`,
/// `"2"`, `2.0` or `"No"` depending on who saved the file, so every cell is
/// parsed into the narrowest variant that fits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Value {
    pub fn as_display(&self) -> String {
        match self {
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => {
                if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                    (*f as i64).to_string()
                } else {
                    f.to_string()
                }
            }
            Value::Text(s) => s.clone(),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Text(_) => None,
        }
    }

    /// Integer code carried by the value, if it is integer-valued in any of
    /// its possible representations (`2`, `2.0`, `"2"`, `" 2.0 "`).
    pub fn as_code(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Float(f) => float_to_code(*f),
            Value::Text(s) => {
                let trimmed = s.trim();
                trimmed
                    .parse::<i64>()
                    .ok()
                    .or_else(|| trimmed.parse::<f64>().ok().and_then(float_to_code))
            }
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Float(_))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

fn float_to_code(value: f64) -> Option<i64> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Some(value as i64)
    } else {
        None
    }
}

/// Parses a raw CSV field. Empty fields and placeholder tokens are missing.
pub fn parse_cell(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || is_placeholder(trimmed) {
        return None;
    }
    if let Ok(parsed) = trimmed.parse::<i64>() {
        return Some(Value::Integer(parsed));
    }
    if let Ok(parsed) = trimmed.parse::<f64>()
        && parsed.is_finite()
    {
        return Some(Value::Float(parsed));
    }
    Some(Value::Text(trimmed.to_string()))
}

fn is_placeholder(value: &str) -> bool {
    PLACEHOLDER_TOKENS
        .iter()
        .any(|token| value.eq_ignore_ascii_case(token))
}
