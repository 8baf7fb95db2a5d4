#![forbid(unsafe_code)]

//! Field values and coercion rules.
//!
//! A [`FieldValue`] is one of three primitive shapes. Two coercion families
//! exist:
//!
//! - **Remote coercion** ([`FieldValue::from_remote`]): applied to whatever
//!   the surface pushes. Strings `"true"`/`"false"` (trimmed, any case)
//!   become booleans, strings that parse as finite numbers become numbers,
//!   anything else stays text.
//! - **Typed coercion** ([`FieldValue::truthy`], [`FieldValue::to_number`],
//!   [`FieldValue::to_text`]): applied when a value is stored into a property
//!   of known type. These never fail.
//!
//! # Coercion table
//!
//! | Input | `truthy` | `to_number` | `to_text` |
//! |-------|----------|-------------|-----------|
//! | `Bool(b)` | `b` | `1` / `0` | `"true"` / `"false"` |
//! | `Number(n)` | `n != 0 && !NaN` | `n` | integral without `.0` |
//! | `Text(s)` | `!s.is_empty()` | trimmed parse, `""` → 0, junk → NaN | `s` |

use serde_json::Value;

/// A primitive field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Coerce a raw value delivered by the surface.
    #[must_use]
    pub fn from_remote(raw: &Value) -> Self {
        match raw {
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => Self::Number(n.as_f64().unwrap_or(f64::NAN)),
            Value::String(s) => Self::from_remote_str(s),
            Value::Null => Self::Text(String::new()),
            other => Self::Text(other.to_string()),
        }
    }

    /// Convert a raw value without reading meaning into strings: text stays
    /// text, even when it looks like a number or a boolean.
    #[must_use]
    pub fn from_raw_json(raw: &Value) -> Self {
        match raw {
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => Self::Number(n.as_f64().unwrap_or(f64::NAN)),
            Value::String(s) => Self::Text(s.clone()),
            Value::Null => Self::Text(String::new()),
            other => Self::Text(other.to_string()),
        }
    }

    /// Coerce a raw string delivered by the surface.
    #[must_use]
    pub fn from_remote_str(s: &str) -> Self {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("true") {
            return Self::Bool(true);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return Self::Bool(false);
        }
        match parse_finite(trimmed) {
            Some(n) => Self::Number(n),
            None => Self::Text(s.to_string()),
        }
    }

    /// Truthiness used for boolean-typed properties.
    #[must_use]
    pub fn truthy(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::Text(s) => !s.is_empty(),
        }
    }

    /// Numeric conversion used for numeric-typed properties.
    #[must_use]
    pub fn to_number(&self) -> f64 {
        match self {
            Self::Bool(true) => 1.0,
            Self::Bool(false) => 0.0,
            Self::Number(n) => *n,
            Self::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse::<f64>().unwrap_or(f64::NAN)
                }
            }
        }
    }

    /// String conversion used for string-typed properties.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => format_number(*n),
            Self::Text(s) => s.clone(),
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Raw JSON value for path-level writes.
    ///
    /// Non-finite numbers have no JSON form and are written as `null`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Bool(b) => Value::Bool(*b),
            Self::Number(n) => number_to_json(*n),
            Self::Text(s) => Value::String(s.clone()),
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for FieldValue {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<u32> for FieldValue {
    fn from(n: u32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// Interpret a raw trigger value as an integer counter.
///
/// Numbers are truncated, numeric strings are parsed, `true` counts as 1.
/// Everything else is 0 (idle).
#[must_use]
pub fn trigger_count(raw: &Value) -> i64 {
    let n = match raw {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => parse_finite(s.trim()).unwrap_or(0.0),
        Value::Bool(true) => 1.0,
        _ => 0.0,
    };
    // `as` saturates for out-of-range floats.
    n.trunc() as i64
}

/// Format a number the way the surface displays it: integral values carry
/// no fractional part.
#[must_use]
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let text = if n > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

pub(crate) fn number_to_json(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n).map_or(Value::Null, Value::Number)
    }
}

fn parse_finite(s: &str) -> Option<f64> {
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok().filter(|n| n.is_finite())
}
