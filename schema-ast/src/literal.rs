//! Literal values, symbols and keys.

use serde::ser::Error as _;
use serde::{Deserialize, Serialize, Serializer};

/// A literal constant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LiteralValue {
    /// `null`
    Null,

    /// `true` / `false`
    Boolean(bool),

    /// Finite number
    Number(#[serde(serialize_with = "finite")] f64),

    /// String
    String(String),

    /// Big integer, as a decimal string
    BigInt {
        #[serde(rename = "bigint")]
        digits: String,
    },
}

impl LiteralValue {
    /// Create a big integer literal from its decimal digits.
    pub fn big_int(digits: impl Into<String>) -> Self {
        LiteralValue::BigInt {
            digits: digits.into(),
        }
    }

    /// The literal as a plain JSON value (big integers as strings).
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            LiteralValue::Null => serde_json::Value::Null,
            LiteralValue::Boolean(b) => serde_json::Value::Bool(*b),
            LiteralValue::Number(n) => number_to_json(*n),
            LiteralValue::String(s) => serde_json::Value::String(s.clone()),
            LiteralValue::BigInt { digits } => serde_json::Value::String(digits.clone()),
        }
    }
}

impl From<&str> for LiteralValue {
    fn from(value: &str) -> Self {
        LiteralValue::String(value.to_string())
    }
}

impl From<String> for LiteralValue {
    fn from(value: String) -> Self {
        LiteralValue::String(value)
    }
}

impl From<f64> for LiteralValue {
    fn from(value: f64) -> Self {
        LiteralValue::Number(value)
    }
}

impl From<i64> for LiteralValue {
    fn from(value: i64) -> Self {
        LiteralValue::Number(value as f64)
    }
}

impl From<bool> for LiteralValue {
    fn from(value: bool) -> Self {
        LiteralValue::Boolean(value)
    }
}

/// A member value of an enum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnumValue {
    /// Numeric member
    Number(#[serde(serialize_with = "finite")] f64),

    /// String member
    String(String),
}

impl EnumValue {
    /// The member as a plain JSON value.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            EnumValue::Number(n) => number_to_json(*n),
            EnumValue::String(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl From<&str> for EnumValue {
    fn from(value: &str) -> Self {
        EnumValue::String(value.to_string())
    }
}

impl From<f64> for EnumValue {
    fn from(value: f64) -> Self {
        EnumValue::Number(value)
    }
}

/// A symbol. Registry-backed symbols (`Symbol.for(key)`) have a key;
/// anonymous ones only a description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbolKey {
    /// Global registry key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    /// Description shown by `toString`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SymbolKey {
    /// A registry-backed symbol.
    pub fn registered(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            description: None,
        }
    }

    /// An anonymous symbol with a description.
    pub fn anonymous(description: impl Into<String>) -> Self {
        Self {
            key: None,
            description: Some(description.into()),
        }
    }

    /// Check whether the symbol can be recreated from the global registry.
    pub fn is_registered(&self) -> bool {
        self.key.is_some()
    }

    /// String form, e.g. `Symbol(key)`.
    pub fn display(&self) -> String {
        let inner = self
            .key
            .as_deref()
            .or(self.description.as_deref())
            .unwrap_or_default();
        format!("Symbol({})", inner)
    }
}

/// A property name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyKey {
    /// String key
    String(String),

    /// Numeric key
    Number(#[serde(serialize_with = "finite")] f64),

    /// Symbol key
    Symbol { symbol: SymbolKey },
}

impl PropertyKey {
    /// A symbol key.
    pub fn symbol(symbol: SymbolKey) -> Self {
        PropertyKey::Symbol { symbol }
    }

    /// String form used where only string keys exist (JSON objects).
    /// Symbol keys have none.
    pub fn as_json_key(&self) -> Option<String> {
        match self {
            PropertyKey::String(s) => Some(s.clone()),
            PropertyKey::Number(n) => Some(format_number(*n)),
            PropertyKey::Symbol { .. } => None,
        }
    }
}

impl From<&str> for PropertyKey {
    fn from(value: &str) -> Self {
        PropertyKey::String(value.to_string())
    }
}

impl From<String> for PropertyKey {
    fn from(value: String) -> Self {
        PropertyKey::String(value)
    }
}

/// Union evaluation mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UnionMode {
    /// At least one member matches
    #[default]
    AnyOf,

    /// Exactly one member matches
    OneOf,
}

/// Format a number the way a JavaScript engine prints it for integral
/// values (`1`, not `1.0`).
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let sign = if n > 0.0 { "" } else { "-" };
        format!("{}Infinity", sign)
    } else {
        format!("{}", n)
    }
}

/// Integral finite numbers become JSON integers, everything else a float.
pub fn number_to_json(n: f64) -> serde_json::Value {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        serde_json::Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    }
}

/// Serialise a number, failing on NaN and the infinities: JSON has no
/// spelling for them.
pub fn finite<S: Serializer>(n: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if n.is_finite() {
        serializer.serialize_f64(*n)
    } else {
        Err(S::Error::custom(format!(
            "non-finite number {} has no JSON form",
            format_number(*n)
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(1.0), "1");
        assert_eq!(format_number(-2.5), "-2.5");
        assert_eq!(format_number(f64::INFINITY), "Infinity");
    }

    #[test]
    fn test_literal_json_forms() {
        assert_eq!(
            serde_json::to_value(LiteralValue::big_int("12")).unwrap(),
            json!({"bigint": "12"})
        );
        assert_eq!(serde_json::to_value(LiteralValue::Null).unwrap(), json!(null));
        let back: LiteralValue = serde_json::from_value(json!(3)).unwrap();
        assert_eq!(back, LiteralValue::Number(3.0));
        let back: LiteralValue = serde_json::from_value(json!({"bigint": "7"})).unwrap();
        assert_eq!(back, LiteralValue::big_int("7"));
    }

    #[test]
    fn test_non_finite_numbers_do_not_serialise() {
        let error = serde_json::to_value(LiteralValue::Number(f64::NAN)).unwrap_err();
        assert!(error.to_string().contains("NaN"));
        assert!(serde_json::to_value(EnumValue::Number(f64::INFINITY)).is_err());
        assert!(serde_json::to_value(PropertyKey::Number(f64::NEG_INFINITY)).is_err());
        assert_eq!(serde_json::to_value(LiteralValue::Number(1.5)).unwrap(), json!(1.5));
    }

    #[test]
    fn test_symbol_display() {
        assert_eq!(SymbolKey::registered("app/id").display(), "Symbol(app/id)");
        assert!(!SymbolKey::anonymous("x").is_registered());
    }
}
