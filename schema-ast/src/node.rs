//! Document nodes.
//!
//! A [`Node`] is the plain, owned, serialisable image of a live
//! [`crate::Ast`]. It carries no identity and no thunks: suspended nodes hold
//! their resolved target, and shared or recursive structure is expressed with
//! [`NodeKind::Reference`] into a definitions table.
//!
//! The serialised form tags each variant with `_tag` and uses camelCase
//! field names:
//!
//! ```json
//! { "_tag": "String", "checks": [], "annotations": { "identifier": "ID" } }
//! ```

use serde::{Deserialize, Serialize};

use crate::annotations::Annotations;
use crate::check::Check;
use crate::literal::{EnumValue, LiteralValue, SymbolKey, UnionMode};
use crate::members::{Element, IndexSignature, PropertySignature, TemplatePart};

/// A document node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Node shape
    #[serde(flatten)]
    pub kind: NodeKind,

    /// Checks in declaration order
    #[serde(default)]
    pub checks: Vec<Check>,

    /// Node annotations
    #[serde(default)]
    pub annotations: Annotations,
}

/// Shapes a document node can take.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_tag")]
pub enum NodeKind {
    Never,
    Any,
    Unknown,
    Void,
    Undefined,
    Null,
    Boolean,
    String,
    Number,
    BigInt,
    Symbol,
    ObjectKeyword,

    Literal {
        literal: LiteralValue,
    },

    UniqueSymbol {
        symbol: SymbolKey,
    },

    Enum {
        enums: Vec<(String, EnumValue)>,
    },

    TemplateLiteral {
        parts: Vec<TemplatePart<Node>>,
    },

    Arrays {
        elements: Vec<Element<Node>>,
        rest: Vec<Node>,
    },

    #[serde(rename_all = "camelCase")]
    Objects {
        property_signatures: Vec<PropertySignature<Node>>,
        index_signatures: Vec<IndexSignature<Node>>,
    },

    Union {
        types: Vec<Node>,
        #[serde(default)]
        mode: UnionMode,
    },

    /// Resolved target of a lazy node (often a [`NodeKind::Reference`])
    Suspend {
        thunk: Box<Node>,
    },

    /// Pointer into the owning definitions table
    Reference {
        target: String,
    },

    #[serde(rename_all = "camelCase")]
    Declaration {
        type_parameters: Vec<Node>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        encoded: Option<Box<Node>>,
    },
}

impl Node {
    /// Create a node without checks or annotations.
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            checks: Vec::new(),
            annotations: Annotations::default(),
        }
    }

    /// A reference to a definition.
    pub fn reference(target: impl Into<String>) -> Self {
        Self::new(NodeKind::Reference {
            target: target.into(),
        })
    }

    /// A suspended node wrapping its resolved target.
    pub fn suspend(target: Node) -> Self {
        Self::new(NodeKind::Suspend {
            thunk: Box::new(target),
        })
    }

    /// Replace the checks.
    pub fn with_checks(mut self, checks: Vec<Check>) -> Self {
        self.checks = checks;
        self
    }

    /// Replace the annotations.
    pub fn with_annotations(mut self, annotations: Annotations) -> Self {
        self.annotations = annotations;
        self
    }

    /// Target name when this node is a reference.
    pub fn reference_target(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Reference { target } => Some(target),
            _ => None,
        }
    }

    /// Check whether this node is a bare reference.
    pub fn is_reference(&self) -> bool {
        self.reference_target().is_some()
    }

    /// The `identifier` annotation, if any.
    pub fn identifier(&self) -> Option<&str> {
        self.annotations.identifier.as_deref()
    }

    /// Direct children, in field order.
    pub fn children(&self) -> Vec<&Node> {
        match &self.kind {
            NodeKind::TemplateLiteral { parts } => parts
                .iter()
                .filter_map(|part| match part {
                    TemplatePart::Schema { schema } => Some(schema),
                    TemplatePart::Text { .. } => None,
                })
                .collect(),
            NodeKind::Arrays { elements, rest } => elements
                .iter()
                .map(|element| &element.ty)
                .chain(rest.iter())
                .collect(),
            NodeKind::Objects {
                property_signatures,
                index_signatures,
            } => property_signatures
                .iter()
                .map(|ps| &ps.ty)
                .chain(
                    index_signatures
                        .iter()
                        .flat_map(|is| [&is.parameter, &is.ty]),
                )
                .collect(),
            NodeKind::Union { types, .. } => types.iter().collect(),
            NodeKind::Suspend { thunk } => vec![thunk.as_ref()],
            NodeKind::Declaration {
                type_parameters,
                encoded,
            } => type_parameters
                .iter()
                .chain(encoded.as_deref())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Direct children, mutably, in field order.
    pub fn children_mut(&mut self) -> Vec<&mut Node> {
        match &mut self.kind {
            NodeKind::TemplateLiteral { parts } => parts
                .iter_mut()
                .filter_map(|part| match part {
                    TemplatePart::Schema { schema } => Some(schema),
                    TemplatePart::Text { .. } => None,
                })
                .collect(),
            NodeKind::Arrays { elements, rest } => elements
                .iter_mut()
                .map(|element| &mut element.ty)
                .chain(rest.iter_mut())
                .collect(),
            NodeKind::Objects {
                property_signatures,
                index_signatures,
            } => property_signatures
                .iter_mut()
                .map(|ps| &mut ps.ty)
                .chain(
                    index_signatures
                        .iter_mut()
                        .flat_map(|is| [&mut is.parameter, &mut is.ty]),
                )
                .collect(),
            NodeKind::Union { types, .. } => types.iter_mut().collect(),
            NodeKind::Suspend { thunk } => vec![thunk.as_mut()],
            NodeKind::Declaration {
                type_parameters,
                encoded,
            } => type_parameters
                .iter_mut()
                .chain(encoded.as_deref_mut())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Reference targets reachable from this node without crossing a
    /// definition boundary, in pre-order. `eager_only` skips references
    /// found under a [`NodeKind::Suspend`].
    pub fn references(&self, eager_only: bool) -> Vec<&str> {
        let mut found = Vec::new();
        collect_references(self, eager_only, &mut found);
        found
    }
}

fn collect_references<'a>(node: &'a Node, eager_only: bool, found: &mut Vec<&'a str>) {
    if let Some(target) = node.reference_target() {
        found.push(target);
        return;
    }
    if eager_only && matches!(node.kind, NodeKind::Suspend { .. }) {
        return;
    }
    for child in node.children() {
        collect_references(child, eager_only, found);
    }
}

impl From<NodeKind> for Node {
    fn from(kind: NodeKind) -> Self {
        Node::new(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::filters;
    use serde_json::json;

    #[test]
    fn test_node_serialization_shape() {
        let node = Node::new(NodeKind::String)
            .with_checks(vec![filters::min_length(1)])
            .with_annotations(Annotations::identified("ID"));
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["_tag"], json!("String"));
        assert_eq!(value["annotations"], json!({"identifier": "ID"}));
        let back: Node = serde_json::from_value(value).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn test_objects_use_camel_case() {
        let node = Node::new(NodeKind::Objects {
            property_signatures: vec![PropertySignature::new("a", Node::new(NodeKind::Number))],
            index_signatures: Vec::new(),
        });
        let value = serde_json::to_value(&node).unwrap();
        assert!(value.get("propertySignatures").is_some());
        assert_eq!(value["propertySignatures"][0]["isOptional"], json!(false));
    }

    #[test]
    fn test_references_skip_suspended_when_eager() {
        let node = Node::new(NodeKind::Union {
            types: vec![Node::reference("A"), Node::suspend(Node::reference("B"))],
            mode: UnionMode::AnyOf,
        });
        assert_eq!(node.references(false), vec!["A", "B"]);
        assert_eq!(node.references(true), vec!["A"]);
    }
}
