//! Annotation definitions.
//!
//! Annotations carry information that doesn't change the shape of a schema
//! but is useful for documentation, naming and tooling. A handful of keys are
//! well known and get their own field; anything else lands in
//! [`Annotations::extra`] and is threaded through every transformation
//! unchanged.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Open annotation bag attached to schema nodes, property signatures and
/// checks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotations {
    /// Name under which the node is hoisted into a definitions table
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,

    /// Short human readable title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Longer description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Free-form documentation (markdown)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,

    /// Default value, as JSON
    #[serde(
        default,
        deserialize_with = "some_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub default: Option<Value>,

    /// Example values, as JSON
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<Value>,

    /// Constructor used to express a declaration as source
    /// (e.g. `"Option"` renders as `Schema.Option(...)`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constructor: Option<String>,

    /// Unrecognised extension keys, in insertion order
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// Keeps an explicit `null` default instead of collapsing it to `None`.
fn some_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl Annotations {
    /// Create an empty annotation bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create annotations carrying only an identifier.
    pub fn identified(identifier: impl Into<String>) -> Self {
        Self::new().with_identifier(identifier)
    }

    /// Set the identifier.
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the documentation.
    pub fn with_documentation(mut self, documentation: impl Into<String>) -> Self {
        self.documentation = Some(documentation.into());
        self
    }

    /// Set the default value.
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Add an example value.
    pub fn with_example(mut self, example: Value) -> Self {
        self.examples.push(example);
        self
    }

    /// Set the declaration constructor.
    pub fn with_constructor(mut self, constructor: impl Into<String>) -> Self {
        self.constructor = Some(constructor.into());
        self
    }

    /// Add an extension key.
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Check whether no annotation is set.
    pub fn is_empty(&self) -> bool {
        self.identifier.is_none()
            && self.title.is_none()
            && self.description.is_none()
            && self.documentation.is_none()
            && self.default.is_none()
            && self.examples.is_empty()
            && self.constructor.is_none()
            && self.extra.is_empty()
    }

    /// Overlay `other` on top of `self`. Keys set in `other` win.
    pub fn merge(&self, other: &Annotations) -> Annotations {
        let mut merged = self.clone();
        if other.identifier.is_some() {
            merged.identifier.clone_from(&other.identifier);
        }
        if other.title.is_some() {
            merged.title.clone_from(&other.title);
        }
        if other.description.is_some() {
            merged.description.clone_from(&other.description);
        }
        if other.documentation.is_some() {
            merged.documentation.clone_from(&other.documentation);
        }
        if other.default.is_some() {
            merged.default.clone_from(&other.default);
        }
        if !other.examples.is_empty() {
            merged.examples.clone_from(&other.examples);
        }
        if other.constructor.is_some() {
            merged.constructor.clone_from(&other.constructor);
        }
        for (key, value) in &other.extra {
            merged.extra.insert(key.clone(), value.clone());
        }
        merged
    }

    /// All annotations as an ordered JSON object, well-known keys first.
    pub fn to_json_map(&self) -> serde_json::Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_annotations() {
        assert!(Annotations::new().is_empty());
        assert!(!Annotations::identified("ID").is_empty());
        assert!(!Annotations::new().with_extra("x-kind", json!(1)).is_empty());
    }

    #[test]
    fn test_merge_prefers_other() {
        let base = Annotations::new().with_title("a").with_description("keep");
        let merged = base.merge(&Annotations::new().with_title("b"));
        assert_eq!(merged.title.as_deref(), Some("b"));
        assert_eq!(merged.description.as_deref(), Some("keep"));
    }

    #[test]
    fn test_extra_keys_roundtrip() {
        let annotations = Annotations::identified("User")
            .with_default(json!(null))
            .with_extra("x-owner", json!("team"));
        let value = serde_json::to_value(&annotations).unwrap();
        assert_eq!(
            value,
            json!({"identifier": "User", "default": null, "x-owner": "team"})
        );
        let back: Annotations = serde_json::from_value(value).unwrap();
        assert_eq!(back, annotations);
    }
}
