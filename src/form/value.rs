use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Number,
    Flag,
}

impl FieldKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Number => "number",
            FieldKind::Flag => "flag",
        }
    }
}

impl Display for FieldKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed scalar held by a field.
///
/// The variant a field starts with is the variant it keeps for its whole
/// lifetime; writes of another kind are rejected by the controller.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Text(String),
    Number(Decimal),
    Flag(bool),
}

impl FieldValue {
    pub const fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Text(_) => FieldKind::Text,
            FieldValue::Number(_) => FieldKind::Number,
            FieldValue::Flag(_) => FieldKind::Flag,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            FieldValue::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            FieldValue::Flag(value) => Some(*value),
            _ => None,
        }
    }

    /// Checkbox projection: empty text and zero count as unchecked.
    pub fn is_truthy(&self) -> bool {
        match self {
            FieldValue::Text(value) => !value.is_empty(),
            FieldValue::Number(value) => !value.is_zero(),
            FieldValue::Flag(value) => *value,
        }
    }
}

impl Display for FieldValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Text(value) => f.write_str(value),
            FieldValue::Number(value) => write!(f, "{}", value.normalize()),
            FieldValue::Flag(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<Decimal> for FieldValue {
    fn from(value: Decimal) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Number(Decimal::from(value))
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(Decimal::from(value))
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Flag(value)
    }
}

/// Snapshot of every field's value, keyed by field name.
pub type FormValues = BTreeMap<String, FieldValue>;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
#[error("expected a {expected} value, found {found}")]
pub struct KindMismatch {
    pub expected: FieldKind,
    pub found: FieldKind,
}

impl TryFrom<FieldValue> for String {
    type Error = KindMismatch;

    fn try_from(value: FieldValue) -> Result<Self, Self::Error> {
        match value {
            FieldValue::Text(text) => Ok(text),
            other => Err(KindMismatch {
                expected: FieldKind::Text,
                found: other.kind(),
            }),
        }
    }
}

impl TryFrom<FieldValue> for Decimal {
    type Error = KindMismatch;

    fn try_from(value: FieldValue) -> Result<Self, Self::Error> {
        match value {
            FieldValue::Number(number) => Ok(number),
            other => Err(KindMismatch {
                expected: FieldKind::Number,
                found: other.kind(),
            }),
        }
    }
}

impl TryFrom<FieldValue> for bool {
    type Error = KindMismatch;

    fn try_from(value: FieldValue) -> Result<Self, Self::Error> {
        match value {
            FieldValue::Flag(flag) => Ok(flag),
            other => Err(KindMismatch {
                expected: FieldKind::Flag,
                found: other.kind(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_bound_input_text() {
        assert_eq!(FieldValue::from("abc").to_string(), "abc");
        assert_eq!(
            FieldValue::Number(Decimal::from_i128_with_scale(1200, 2)).to_string(),
            "12"
        );
        assert_eq!(FieldValue::from(false).to_string(), "false");
    }

    #[test]
    fn try_from_reports_both_kinds() {
        let error = String::try_from(FieldValue::from(true)).expect_err("flag is not text");
        assert_eq!(
            error,
            KindMismatch {
                expected: FieldKind::Text,
                found: FieldKind::Flag,
            }
        );
    }

    #[test]
    fn truthiness_follows_checkbox_semantics() {
        assert!(!FieldValue::from("").is_truthy());
        assert!(FieldValue::from("x").is_truthy());
        assert!(!FieldValue::from(0).is_truthy());
        assert!(FieldValue::from(true).is_truthy());
    }
}
