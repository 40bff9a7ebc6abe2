//! Validation keyword images of filters.
//!
//! Each filter maps to a small set of JSON Schema keywords (its *fragment*).
//! Filters without an image (custom filters, `isFinite`, bigint bounds) are
//! skipped by the encoder.

use serde_json::{json, Map, Value};

use schema_ast::{number_to_json, Filter, FilterKind};

use crate::error::{InterchangeError, Result};

/// Keywords that only ever come from checks.
pub const CHECK_KEYWORDS: &[&str] = &[
    "minLength",
    "maxLength",
    "pattern",
    "minimum",
    "maximum",
    "exclusiveMinimum",
    "exclusiveMaximum",
    "multipleOf",
    "minItems",
    "maxItems",
    "uniqueItems",
    "minProperties",
    "maxProperties",
];

const TRIMMED_PATTERN: &str = r"^\S[\s\S]*\S$|^\S?$";
const LOWERCASED_PATTERN: &str = "^[^A-Z]*$";
const UPPERCASED_PATTERN: &str = "^[^a-z]*$";

/// Keyword image of a filter kind, if it has one.
pub fn filter_keywords(kind: &FilterKind) -> Option<Map<String, Value>> {
    let mut map = Map::new();
    match kind {
        FilterKind::MinLength(n) => {
            map.insert("minLength".into(), json!(n));
        }
        FilterKind::MaxLength(n) => {
            map.insert("maxLength".into(), json!(n));
        }
        FilterKind::Length(n) => {
            map.insert("minLength".into(), json!(n));
            map.insert("maxLength".into(), json!(n));
        }
        FilterKind::Pattern(regex) => {
            map.insert("pattern".into(), json!(regex));
        }
        FilterKind::StartsWith(prefix) => {
            map.insert("pattern".into(), json!(format!("^{}", regex::escape(prefix))));
        }
        FilterKind::EndsWith(suffix) => {
            map.insert("pattern".into(), json!(format!("{}$", regex::escape(suffix))));
        }
        FilterKind::Includes(needle) => {
            map.insert("pattern".into(), json!(regex::escape(needle)));
        }
        FilterKind::Trimmed => {
            map.insert("pattern".into(), json!(TRIMMED_PATTERN));
        }
        FilterKind::Lowercased => {
            map.insert("pattern".into(), json!(LOWERCASED_PATTERN));
        }
        FilterKind::Uppercased => {
            map.insert("pattern".into(), json!(UPPERCASED_PATTERN));
        }
        FilterKind::GreaterThan(n) => {
            map.insert("exclusiveMinimum".into(), number_to_json(*n));
        }
        FilterKind::GreaterThanOrEqualTo(n) => {
            map.insert("minimum".into(), number_to_json(*n));
        }
        FilterKind::LessThan(n) => {
            map.insert("exclusiveMaximum".into(), number_to_json(*n));
        }
        FilterKind::LessThanOrEqualTo(n) => {
            map.insert("maximum".into(), number_to_json(*n));
        }
        FilterKind::Between { minimum, maximum } => {
            map.insert("minimum".into(), number_to_json(*minimum));
            map.insert("maximum".into(), number_to_json(*maximum));
        }
        FilterKind::MultipleOf(n) => {
            map.insert("multipleOf".into(), number_to_json(*n));
        }
        FilterKind::Int => {
            map.insert("type".into(), json!("integer"));
        }
        FilterKind::MinItems(n) => {
            map.insert("minItems".into(), json!(n));
        }
        FilterKind::MaxItems(n) => {
            map.insert("maxItems".into(), json!(n));
        }
        FilterKind::ItemsLength(n) => {
            map.insert("minItems".into(), json!(n));
            map.insert("maxItems".into(), json!(n));
        }
        FilterKind::UniqueItems => {
            map.insert("uniqueItems".into(), json!(true));
        }
        FilterKind::MinProperties(n) => {
            map.insert("minProperties".into(), json!(n));
        }
        FilterKind::MaxProperties(n) => {
            map.insert("maxProperties".into(), json!(n));
        }
        FilterKind::Finite
        | FilterKind::GreaterThanBigInt(_)
        | FilterKind::GreaterThanOrEqualToBigInt(_)
        | FilterKind::LessThanBigInt(_)
        | FilterKind::LessThanOrEqualToBigInt(_)
        | FilterKind::Custom { .. } => return None,
    }
    Some(map)
}

/// Full fragment of a filter: keywords, title (explicit or default) and
/// description.
pub fn filter_fragment(filter: &Filter) -> Option<Map<String, Value>> {
    let mut fragment = filter_keywords(&filter.kind)?;
    fragment.insert("title".into(), json!(filter.title()));
    if let Some(description) = &filter.annotations.description {
        fragment.insert("description".into(), json!(description));
    }
    Some(fragment)
}

/// Rebuild a filter kind from a keyword set produced by [`filter_keywords`].
///
/// Pattern-based string filters come back as [`FilterKind::Pattern`];
/// their explicit title keeps the re-encoded fragment identical.
pub fn filter_from_keywords(keywords: &Map<String, Value>, pointer: &str) -> Result<FilterKind> {
    let count = |key: &str| -> Result<Option<usize>> {
        match keywords.get(key) {
            None => Ok(None),
            Some(value) => value
                .as_u64()
                .map(|n| Some(n as usize))
                .ok_or_else(|| InterchangeError::malformed(pointer, format!("{} must be a non-negative integer", key))),
        }
    };
    let number = |key: &str| -> Result<Option<f64>> {
        match keywords.get(key) {
            None => Ok(None),
            Some(value) => value
                .as_f64()
                .map(Some)
                .ok_or_else(|| InterchangeError::malformed(pointer, format!("{} must be a number", key))),
        }
    };

    let mut keys: Vec<&str> = keywords.keys().map(String::as_str).collect();
    keys.sort_unstable();
    let kind = match keys.as_slice() {
        ["maxLength", "minLength"] => {
            let (min, max) = (count("minLength")?, count("maxLength")?);
            match (min, max) {
                (Some(min), Some(max)) if min == max => FilterKind::Length(min),
                _ => return Err(mismatched(pointer, "minLength", "maxLength")),
            }
        }
        ["maxItems", "minItems"] => {
            let (min, max) = (count("minItems")?, count("maxItems")?);
            match (min, max) {
                (Some(min), Some(max)) if min == max => FilterKind::ItemsLength(min),
                _ => return Err(mismatched(pointer, "minItems", "maxItems")),
            }
        }
        ["maximum", "minimum"] => match (number("minimum")?, number("maximum")?) {
            (Some(minimum), Some(maximum)) => FilterKind::Between { minimum, maximum },
            _ => return Err(mismatched(pointer, "minimum", "maximum")),
        },
        ["minLength"] => FilterKind::MinLength(count("minLength")?.unwrap_or_default()),
        ["maxLength"] => FilterKind::MaxLength(count("maxLength")?.unwrap_or_default()),
        ["minItems"] => FilterKind::MinItems(count("minItems")?.unwrap_or_default()),
        ["maxItems"] => FilterKind::MaxItems(count("maxItems")?.unwrap_or_default()),
        ["minProperties"] => FilterKind::MinProperties(count("minProperties")?.unwrap_or_default()),
        ["maxProperties"] => FilterKind::MaxProperties(count("maxProperties")?.unwrap_or_default()),
        ["minimum"] => FilterKind::GreaterThanOrEqualTo(number("minimum")?.unwrap_or_default()),
        ["maximum"] => FilterKind::LessThanOrEqualTo(number("maximum")?.unwrap_or_default()),
        ["exclusiveMinimum"] => FilterKind::GreaterThan(number("exclusiveMinimum")?.unwrap_or_default()),
        ["exclusiveMaximum"] => FilterKind::LessThan(number("exclusiveMaximum")?.unwrap_or_default()),
        ["multipleOf"] => FilterKind::MultipleOf(number("multipleOf")?.unwrap_or_default()),
        ["uniqueItems"] => match keywords.get("uniqueItems") {
            Some(Value::Bool(true)) => FilterKind::UniqueItems,
            _ => return Err(InterchangeError::malformed(pointer, "uniqueItems must be true")),
        },
        ["pattern"] => match keywords.get("pattern") {
            // ECMA-262 syntax; carried through unparsed.
            Some(Value::String(pattern)) => FilterKind::Pattern(pattern.clone()),
            _ => return Err(InterchangeError::malformed(pointer, "pattern must be a string")),
        },
        ["type"] => match keywords.get("type") {
            Some(Value::String(ty)) if ty == "integer" => FilterKind::Int,
            _ => return Err(InterchangeError::malformed(pointer, "unsupported check type")),
        },
        [] => return Err(InterchangeError::malformed(pointer, "check without keywords")),
        other => {
            return Err(InterchangeError::malformed(
                pointer,
                format!("unsupported keyword combination: {}", other.join(", ")),
            ))
        }
    };
    Ok(kind)
}

fn mismatched(pointer: &str, a: &str, b: &str) -> InterchangeError {
    InterchangeError::malformed(pointer, format!("{} and {} must be equal", a, b))
}
