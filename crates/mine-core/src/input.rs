//! Coercion of user-edited fields into finite numbers.
//!
//! Form fields arrive as text while the user is still typing, so partial
//! input such as `"-"` or `"."` resolves to the fallback instead of zero.

use serde::{Deserialize, Serialize};

/// A raw editable field as stored in a save document.
///
/// JSON `null` and missing fields are modelled as `None` at the use site.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputValue {
    Number(f64),
    Text(String),
    /// Anything else (booleans, arrays, objects); always resolves to the fallback.
    Other(serde_json::Value),
}

impl From<f64> for InputValue {
    fn from(n: f64) -> Self {
        InputValue::Number(n)
    }
}

impl From<&str> for InputValue {
    fn from(s: &str) -> Self {
        InputValue::Text(s.to_string())
    }
}

/// Resolve an editable field to a finite number, or `fallback`.
///
/// Example:
/// assert_eq!(normalize_number(Some(&InputValue::from(" 12.5 ")), 0.0), 12.5);
/// assert_eq!(normalize_number(Some(&InputValue::from("-")), 7.0), 7.0);
pub fn normalize_number(value: Option<&InputValue>, fallback: f64) -> f64 {
    let parsed = match value {
        Some(InputValue::Number(n)) => Some(*n),
        Some(InputValue::Text(s)) => match s.trim() {
            "" | "-" | "." | "-." => None,
            t => t.parse::<f64>().ok(),
        },
        Some(InputValue::Other(_)) | None => None,
    };
    parsed.filter(|n| n.is_finite()).unwrap_or(fallback)
}

/// Clamp a probability into [0, 1]; non-finite values become 0.
pub fn clamp01(x: f64) -> f64 {
    if x.is_finite() {
        x.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Interpret a number as a table level. Fractional and non-finite values are
/// not levels.
pub fn as_level(x: f64) -> Option<i64> {
    if x.is_finite() && x.fract() == 0.0 {
        Some(x as i64)
    } else {
        None
    }
}
