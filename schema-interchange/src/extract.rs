//! Reference extraction.
//!
//! Turns a live [`Ast`] graph into a [`Document`]: every node carrying an
//! `identifier` annotation is hoisted into the definitions table and its use
//! sites become [`NodeKind::Reference`]. Traversal is pre-order and memoised
//! by node identity, so shared nodes are visited once and cycles terminate.
//!
//! # Naming
//!
//! Names are assigned at first encounter. When two distinct nodes share an
//! identifier the first keeps it and later ones get `-1`, `-2`, ...
//!
//! # Recursion
//!
//! A node re-entered while it is still being built is recursion:
//!
//! - a named node becomes a reference to its own definition;
//! - an unnamed node is expanded once more when a named node sits between
//!   its two occurrences, so the cycle closes on that name;
//! - otherwise the cycle cannot be named and extraction fails with
//!   [`InterchangeError::MissingIdentifier`].

use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::{debug, trace};

use schema_ast::{
    Ast, AstKind, Element, IndexSignature, Node, NodeKind, PropertySignature, TemplatePart,
};

use crate::document::{Definitions, Document, MultiDocument};
use crate::error::{InterchangeError, Result};
use crate::naming::NameAllocator;

/// Extract a single schema.
///
/// # Example
///
/// ```rust
/// use schema_ast::{Annotations, Ast, NodeKind};
/// use schema_interchange::extract;
///
/// let id = Ast::string().annotate(Annotations::identified("ID"));
/// let document = extract(&id).unwrap();
/// assert_eq!(document.schema.reference_target(), Some("ID"));
/// assert!(matches!(document.definitions["ID"].kind, NodeKind::String));
/// ```
#[tracing::instrument(skip_all)]
pub fn extract(ast: &Ast) -> Result<Document> {
    let mut ctx = ExtractContext::new();
    let schema = ctx.visit(ast)?;
    let definitions = ctx.finish();
    debug!(definitions = definitions.len(), "Extracted document");
    Ok(Document::new(schema, definitions))
}

/// Extract several schemas into one shared definitions table.
///
/// Naming is root-major: all names found under the first root are assigned
/// before any name under the second.
#[tracing::instrument(skip_all, fields(roots = asts.len()))]
pub fn extract_many(asts: &[Ast]) -> Result<MultiDocument> {
    let mut ctx = ExtractContext::new();
    let schemas = asts
        .iter()
        .enumerate()
        .map(|(index, ast)| {
            ctx.path.push(index.to_string());
            let node = ctx.visit(ast);
            ctx.path.pop();
            node
        })
        .collect::<Result<Vec<_>>>()?;
    let definitions = ctx.finish();
    debug!(definitions = definitions.len(), "Extracted multi-document");
    Ok(MultiDocument::new(schemas, definitions))
}

// =============================================================================
// Extraction context
// =============================================================================

/// A node currently being built.
#[derive(Debug, Clone, Copy)]
struct Frame {
    id: usize,
    named: bool,
}

/// Per-call traversal state.
struct ExtractContext {
    /// Use-site node of every finished node, by identity
    memo: HashMap<usize, Node>,

    /// Nodes being built, outermost first
    stack: Vec<Frame>,

    /// Assigned definition names, by identity
    names: HashMap<usize, String>,

    allocator: NameAllocator,

    /// Resolved thunks, by resolver identity. Holding the resolved handles
    /// also keeps their identities from being reused during the call.
    resolved: HashMap<usize, Ast>,

    /// Definition bodies in name assignment order
    slots: IndexMap<String, Option<Node>>,

    /// Current location, for errors
    path: Vec<String>,
}

impl ExtractContext {
    fn new() -> Self {
        Self {
            memo: HashMap::new(),
            stack: Vec::new(),
            names: HashMap::new(),
            allocator: NameAllocator::new(),
            resolved: HashMap::new(),
            slots: IndexMap::new(),
            path: Vec::new(),
        }
    }

    fn finish(self) -> Definitions {
        self.slots
            .into_iter()
            .filter_map(|(name, body)| body.map(|body| (name, body)))
            .collect()
    }

    /// Name assigned to `ast`, allocating one at first encounter.
    fn name_of(&mut self, ast: &Ast) -> Option<String> {
        let id = ast.id();
        if let Some(name) = self.names.get(&id) {
            return Some(name.clone());
        }
        let base = ast.identifier()?;
        let name = self.allocator.allocate(base);
        if name != base {
            debug!(identifier = %base, name = %name, "Disambiguated identifier");
        } else {
            debug!(identifier = %base, "Hoisting definition");
        }
        self.names.insert(id, name.clone());
        self.slots.insert(name.clone(), None);
        Some(name)
    }

    fn visit(&mut self, ast: &Ast) -> Result<Node> {
        let id = ast.id();
        if let Some(node) = self.memo.get(&id) {
            trace!(id, "Reusing extracted node");
            return Ok(node.clone());
        }

        if let Some(position) = self.stack.iter().rposition(|frame| frame.id == id) {
            if let Some(name) = self.names.get(&id) {
                trace!(name = %name, "Recursive reference");
                return Ok(Node::reference(name.clone()));
            }
            let closes_on_name = self.stack[position + 1..].iter().any(|frame| frame.named);
            if !closes_on_name {
                return Err(InterchangeError::MissingIdentifier {
                    path: self.path.clone(),
                });
            }
            trace!(id, "Expanding unnamed node inside a named cycle");
        }

        let name = self.name_of(ast);
        self.stack.push(Frame {
            id,
            named: name.is_some(),
        });
        let built = self.build(ast);
        self.stack.pop();
        let body = built?;

        let use_site = match name {
            Some(name) => {
                self.slots.insert(name.clone(), Some(body));
                Node::reference(name)
            }
            None => body,
        };
        self.memo.insert(id, use_site.clone());
        Ok(use_site)
    }

    /// Build the full body of `ast`.
    fn build(&mut self, ast: &Ast) -> Result<Node> {
        let kind = match ast.kind() {
            AstKind::Never => NodeKind::Never,
            AstKind::Any => NodeKind::Any,
            AstKind::Unknown => NodeKind::Unknown,
            AstKind::Void => NodeKind::Void,
            AstKind::Undefined => NodeKind::Undefined,
            AstKind::Null => NodeKind::Null,
            AstKind::Boolean => NodeKind::Boolean,
            AstKind::String => NodeKind::String,
            AstKind::Number => NodeKind::Number,
            AstKind::BigInt => NodeKind::BigInt,
            AstKind::Symbol => NodeKind::Symbol,
            AstKind::ObjectKeyword => NodeKind::ObjectKeyword,
            AstKind::Literal(literal) => NodeKind::Literal {
                literal: literal.clone(),
            },
            AstKind::UniqueSymbol(symbol) => NodeKind::UniqueSymbol {
                symbol: symbol.clone(),
            },
            AstKind::Enum(enums) => NodeKind::Enum {
                enums: enums.clone(),
            },
            AstKind::TemplateLiteral(parts) => NodeKind::TemplateLiteral {
                parts: self.visit_template(parts)?,
            },
            AstKind::Arrays { elements, rest } => NodeKind::Arrays {
                elements: self.visit_elements(elements)?,
                rest: self.visit_indexed("rest", rest)?,
            },
            AstKind::Objects {
                property_signatures,
                index_signatures,
            } => NodeKind::Objects {
                property_signatures: self.visit_properties(property_signatures)?,
                index_signatures: self.visit_index_signatures(index_signatures)?,
            },
            AstKind::Union { types, mode } => NodeKind::Union {
                types: self.visit_indexed("anyOf", types)?,
                mode: *mode,
            },
            AstKind::Suspend(thunk) => {
                let target = self
                    .resolved
                    .entry(thunk.id())
                    .or_insert_with(|| {
                        trace!("Resolving suspended node");
                        thunk.resolve()
                    })
                    .clone();
                NodeKind::Suspend {
                    thunk: Box::new(self.visit_at("suspend", &target)?),
                }
            }
            AstKind::Reference(target) => NodeKind::Reference {
                target: target.clone(),
            },
            AstKind::Declaration {
                type_parameters,
                encoded,
            } => NodeKind::Declaration {
                type_parameters: self.visit_indexed("typeParameters", type_parameters)?,
                encoded: match encoded {
                    Some(encoded) => Some(Box::new(self.visit_at("encoded", encoded)?)),
                    None => None,
                },
            },
        };
        Ok(Node {
            kind,
            checks: ast.checks().to_vec(),
            annotations: ast.annotations().clone(),
        })
    }

    // =========================================================================
    // Children
    // =========================================================================

    fn visit_at(&mut self, segment: &str, ast: &Ast) -> Result<Node> {
        self.path.push(segment.to_string());
        let node = self.visit(ast);
        self.path.pop();
        node
    }

    fn visit_indexed(&mut self, segment: &str, asts: &[Ast]) -> Result<Vec<Node>> {
        self.path.push(segment.to_string());
        let nodes = asts
            .iter()
            .enumerate()
            .map(|(index, ast)| self.visit_at(&index.to_string(), ast))
            .collect();
        self.path.pop();
        nodes
    }

    fn visit_elements(&mut self, elements: &[Element<Ast>]) -> Result<Vec<Element<Node>>> {
        self.path.push("elements".to_string());
        let nodes = elements
            .iter()
            .enumerate()
            .map(|(index, element)| {
                Ok(Element {
                    ty: self.visit_at(&index.to_string(), &element.ty)?,
                    is_optional: element.is_optional,
                })
            })
            .collect::<Result<Vec<_>>>();
        self.path.pop();
        nodes
    }

    fn visit_properties(
        &mut self,
        properties: &[PropertySignature<Ast>],
    ) -> Result<Vec<PropertySignature<Node>>> {
        properties
            .iter()
            .map(|ps| {
                let segment = ps
                    .name
                    .as_json_key()
                    .unwrap_or_else(|| match &ps.name {
                        schema_ast::PropertyKey::Symbol { symbol } => symbol.display(),
                        _ => String::new(),
                    });
                let ty = self.visit_at(&segment, &ps.ty)?;
                Ok(PropertySignature {
                    name: ps.name.clone(),
                    ty,
                    is_optional: ps.is_optional,
                    is_mutable: ps.is_mutable,
                    annotations: ps.annotations.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()
    }

    fn visit_index_signatures(
        &mut self,
        signatures: &[IndexSignature<Ast>],
    ) -> Result<Vec<IndexSignature<Node>>> {
        signatures
            .iter()
            .map(|is| {
                Ok(IndexSignature {
                    parameter: self.visit_at("[key]", &is.parameter)?,
                    ty: self.visit_at("[value]", &is.ty)?,
                    is_mutable: is.is_mutable,
                })
            })
            .collect::<Result<Vec<_>>>()
    }

    fn visit_template(&mut self, parts: &[TemplatePart<Ast>]) -> Result<Vec<TemplatePart<Node>>> {
        self.path.push("parts".to_string());
        let nodes = parts
            .iter()
            .enumerate()
            .map(|(index, part)| match part {
                TemplatePart::Text { text } => Ok(TemplatePart::Text { text: text.clone() }),
                TemplatePart::Schema { schema } => Ok(TemplatePart::Schema {
                    schema: self.visit_at(&index.to_string(), schema)?,
                }),
            })
            .collect::<Result<Vec<_>>>();
        self.path.pop();
        nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schema_ast::{filters, Annotations};

    #[test]
    fn test_identified_string_is_hoisted() {
        let id = Ast::string().annotate(Annotations::identified("ID"));
        let document = extract(&id).unwrap();
        assert_eq!(document.schema, Node::reference("ID"));
        assert_eq!(
            document.definitions["ID"],
            Node::new(NodeKind::String).with_annotations(Annotations::identified("ID"))
        );
    }

    #[test]
    fn test_unnamed_nodes_stay_inline() {
        let ast = Ast::array(Ast::number().check(filters::int()));
        let document = extract(&ast).unwrap();
        assert!(document.definitions.is_empty());
        let NodeKind::Arrays { rest, .. } = &document.schema.kind else {
            panic!("expected arrays");
        };
        assert_eq!(rest[0].checks, vec![filters::int()]);
    }

    #[test]
    fn test_missing_identifier_reports_path() {
        let ast = Ast::recursive(|this| Ast::union(vec![Ast::string(), Ast::array(this)]));
        let error = extract(&ast).unwrap_err();
        let InterchangeError::MissingIdentifier { path } = error else {
            panic!("expected MissingIdentifier, got {error:?}");
        };
        assert_eq!(path, vec!["anyOf", "1", "rest", "0", "suspend"]);
    }

    #[test]
    fn test_thunk_resolves_once_per_call() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let target = Ast::string().identified("S");
        let lazy = Ast::suspend(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            target.clone()
        });
        let tuple = Ast::tuple(vec![
            Element::required(lazy.clone()),
            Element::required(lazy.annotate(Annotations::new().with_title("again"))),
        ]);
        let document = extract(&tuple).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(document.definitions.len(), 1);
    }
}
