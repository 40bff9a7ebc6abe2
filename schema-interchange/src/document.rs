//! Reference-normalised documents.
//!
//! A [`Document`] is the output of extraction: a root [`Node`] plus an
//! ordered table of hoisted definitions. Every [`NodeKind::Reference`] in the
//! root or in a definition names a key of that table, and no definition is
//! itself a bare reference.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use schema_ast::{Node, NodeKind};

/// Ordered definitions table, keyed by identifier.
pub type Definitions = IndexMap<String, Node>;

/// A single-root document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Root node
    pub schema: Node,

    /// Hoisted definitions, in identifier assignment order
    #[serde(default)]
    pub definitions: Definitions,
}

/// A document with several roots sharing one definitions table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiDocument {
    /// Root nodes, in input order
    pub schemas: Vec<Node>,

    /// Hoisted definitions shared by all roots
    #[serde(default)]
    pub definitions: Definitions,
}

impl Document {
    /// Create a document from its parts.
    pub fn new(schema: Node, definitions: Definitions) -> Self {
        Self {
            schema,
            definitions,
        }
    }

    /// Look up a definition.
    pub fn definition(&self, identifier: &str) -> Option<&Node> {
        self.definitions.get(identifier)
    }

    /// Reference targets that have no definition.
    pub fn dangling_references(&self) -> Vec<String> {
        dangling(std::iter::once(&self.schema), &self.definitions)
    }
}

impl MultiDocument {
    /// Create a multi-root document from its parts.
    pub fn new(schemas: Vec<Node>, definitions: Definitions) -> Self {
        Self {
            schemas,
            definitions,
        }
    }

    /// Split into one [`Document`] per root, each with the full table.
    pub fn documents(&self) -> Vec<Document> {
        self.schemas
            .iter()
            .map(|schema| Document::new(schema.clone(), self.definitions.clone()))
            .collect()
    }

    /// Reference targets that have no definition.
    pub fn dangling_references(&self) -> Vec<String> {
        dangling(self.schemas.iter(), &self.definitions)
    }
}

fn dangling<'a>(roots: impl Iterator<Item = &'a Node>, definitions: &'a Definitions) -> Vec<String> {
    let mut missing = Vec::new();
    for node in roots.chain(definitions.values()) {
        for target in node.references(false) {
            if !definitions.contains_key(target) && !missing.iter().any(|m| m == target) {
                missing.push(target.to_string());
            }
        }
    }
    missing
}

/// Strip redundant suspensions: a `Suspend` whose resolved target is a bare
/// reference carries no more information than the reference for consumers
/// that resolve names eagerly.
pub(crate) fn unwrap_suspend(node: &Node) -> &Node {
    match &node.kind {
        NodeKind::Suspend { thunk } if node.checks.is_empty() && node.annotations.is_empty() => {
            unwrap_suspend(thunk)
        }
        _ => node,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dangling_references() {
        let mut definitions = Definitions::new();
        definitions.insert("A".into(), Node::new(NodeKind::String));
        let document = Document::new(
            Node::new(NodeKind::Union {
                types: vec![Node::reference("A"), Node::reference("B")],
                mode: Default::default(),
            }),
            definitions,
        );
        assert_eq!(document.dangling_references(), vec!["B".to_string()]);
    }

    #[test]
    fn test_multi_document_split() {
        let multi = MultiDocument::new(
            vec![Node::reference("A"), Node::new(NodeKind::Number)],
            Definitions::from([("A".to_string(), Node::new(NodeKind::String))]),
        );
        let documents = multi.documents();
        assert_eq!(documents.len(), 2);
        assert_eq!(documents[1].definitions.len(), 1);
    }
}
