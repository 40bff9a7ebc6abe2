//! Member structures shared by the live AST and document nodes.
//!
//! These are generic over the child type so both [`crate::Ast`] graphs and
//! [`crate::Node`] trees use the same shapes for tuple elements, property
//! signatures, index signatures and template literal parts.

use serde::{Deserialize, Serialize};

use crate::annotations::Annotations;
use crate::literal::PropertyKey;

/// A positional tuple element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element<T> {
    /// Element type
    #[serde(rename = "type")]
    pub ty: T,

    /// Whether the element may be absent
    #[serde(default)]
    pub is_optional: bool,
}

impl<T> Element<T> {
    /// A required element.
    pub fn required(ty: T) -> Self {
        Self {
            ty,
            is_optional: false,
        }
    }

    /// An optional element.
    pub fn optional(ty: T) -> Self {
        Self {
            ty,
            is_optional: true,
        }
    }

    /// Rebuild the element around a different child type.
    pub fn map<U>(&self, f: impl FnOnce(&T) -> U) -> Element<U> {
        Element {
            ty: f(&self.ty),
            is_optional: self.is_optional,
        }
    }
}

/// A named property of an object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySignature<T> {
    /// Property key
    pub name: PropertyKey,

    /// Property value type
    #[serde(rename = "type")]
    pub ty: T,

    /// Whether the key may be absent
    #[serde(default)]
    pub is_optional: bool,

    /// Whether the property is writable
    #[serde(default)]
    pub is_mutable: bool,

    /// Key-level annotations
    #[serde(default, skip_serializing_if = "Annotations::is_empty")]
    pub annotations: Annotations,
}

impl<T> PropertySignature<T> {
    /// A required, readonly property.
    pub fn new(name: impl Into<PropertyKey>, ty: T) -> Self {
        Self {
            name: name.into(),
            ty,
            is_optional: false,
            is_mutable: false,
            annotations: Annotations::default(),
        }
    }

    /// Mark the key optional.
    pub fn optional(mut self) -> Self {
        self.is_optional = true;
        self
    }

    /// Mark the property mutable.
    pub fn mutable(mut self) -> Self {
        self.is_mutable = true;
        self
    }

    /// Attach key-level annotations.
    pub fn annotate(mut self, annotations: Annotations) -> Self {
        self.annotations = annotations;
        self
    }

    /// Rebuild the signature around a different child type.
    pub fn map<U>(&self, f: impl FnOnce(&T) -> U) -> PropertySignature<U> {
        PropertySignature {
            name: self.name.clone(),
            ty: f(&self.ty),
            is_optional: self.is_optional,
            is_mutable: self.is_mutable,
            annotations: self.annotations.clone(),
        }
    }
}

/// An index signature (`Record<K, V>` member).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexSignature<T> {
    /// Key type
    pub parameter: T,

    /// Value type
    #[serde(rename = "type")]
    pub ty: T,

    /// Whether entries are writable
    #[serde(default)]
    pub is_mutable: bool,
}

impl<T> IndexSignature<T> {
    /// A readonly index signature.
    pub fn new(parameter: T, ty: T) -> Self {
        Self {
            parameter,
            ty,
            is_mutable: false,
        }
    }

    /// Mark the entries mutable.
    pub fn mutable(mut self) -> Self {
        self.is_mutable = true;
        self
    }
}

/// One part of a template literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_tag")]
pub enum TemplatePart<T> {
    /// Verbatim text
    Text { text: String },

    /// An embedded schema (string, number, literal or a union of those)
    Schema { schema: T },
}

impl<T> TemplatePart<T> {
    /// Verbatim text part.
    pub fn text(text: impl Into<String>) -> Self {
        TemplatePart::Text { text: text.into() }
    }

    /// Embedded schema part.
    pub fn schema(schema: T) -> Self {
        TemplatePart::Schema { schema }
    }
}
