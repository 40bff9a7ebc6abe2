//! Source rendering.
//!
//! [`to_code`] turns a [`Document`] into TypeScript-flavoured builder calls
//! that reconstruct an equivalent schema:
//!
//! ```text
//! const Category = Schema.Struct({ "name": Schema.String, "children": Schema.Array(Schema.suspend(() => Category)) }).annotate({ identifier: "Category" });
//! const schema = Category;
//! ```
//!
//! Definitions are declared in dependency order. A reference to a binding
//! that is not initialised yet (self or forward reference) is wrapped in
//! `Schema.suspend(() => X)`.

mod emitter;
mod reviver;

use indexmap::IndexMap;
use petgraph::algo::tarjan_scc;
use petgraph::graph::DiGraph;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use schema_ast::Node;

use crate::config::RenderOptions;
use crate::document::{Definitions, Document, MultiDocument};
use crate::error::Result;
use crate::naming::{sanitize_binding, NameAllocator};

use emitter::Emitter;

pub use reviver::Reviver;

/// Rendered source and what it declares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedCode {
    /// The rendered source
    pub code: String,

    /// Definition identifier to declared binding
    pub bindings: IndexMap<String, String>,

    /// Locations rendered with a placeholder (declarations without a
    /// constructor), as `/`-separated paths
    pub lossy: Vec<String>,
}

impl GeneratedCode {
    /// Check whether every node was rendered faithfully.
    pub fn is_lossless(&self) -> bool {
        self.lossy.is_empty()
    }
}

/// Render a document as source.
///
/// # Example
///
/// ```rust
/// use schema_ast::{filters, Ast};
/// use schema_interchange::{extract, to_code, RenderOptions};
///
/// let ast = Ast::string().check(filters::min_length(1));
/// let document = extract(&ast).unwrap();
/// let generated = to_code(&document, &RenderOptions::default()).unwrap();
/// assert_eq!(
///     generated.code,
///     "const schema = Schema.String.check(Schema.isMinLength(1));\n"
/// );
/// ```
#[tracing::instrument(skip_all, fields(definitions = document.definitions.len()))]
pub fn to_code(document: &Document, options: &RenderOptions) -> Result<GeneratedCode> {
    options.validate()?;
    let mut names = binding_allocator(options);
    let root = names.allocate(&options.root_binding);
    render(
        &document.definitions,
        vec![(root, Vec::new(), &document.schema)],
        options,
        names,
    )
}

/// Render a multi-root document as source, one root binding per schema
/// (`schema`, `schema_1`, ...).
#[tracing::instrument(skip_all, fields(roots = document.schemas.len()))]
pub fn to_code_many(document: &MultiDocument, options: &RenderOptions) -> Result<GeneratedCode> {
    options.validate()?;
    let mut names = binding_allocator(options);
    let roots = document
        .schemas
        .iter()
        .enumerate()
        .map(|(index, schema)| {
            let path = vec!["schemas".to_string(), index.to_string()];
            (names.allocate(&options.root_binding), path, schema)
        })
        .collect();
    render(&document.definitions, roots, options, names)
}

fn binding_allocator(options: &RenderOptions) -> NameAllocator {
    let mut names = NameAllocator::with_separator("_");
    names.reserve(options.namespace.clone());
    names
}

fn render(
    definitions: &Definitions,
    roots: Vec<(String, Vec<String>, &Node)>,
    options: &RenderOptions,
    mut names: NameAllocator,
) -> Result<GeneratedCode> {
    let bindings: IndexMap<String, String> = definitions
        .keys()
        .map(|identifier| {
            let binding = names.allocate(&sanitize_binding(identifier));
            trace!(identifier = %identifier, binding = %binding, "Allocated binding");
            (identifier.clone(), binding)
        })
        .collect();

    let keyword = options.export_style.keyword();
    let mut emitter = Emitter::new(options, &bindings);
    let mut lines = Vec::with_capacity(definitions.len() + roots.len());

    for index in dependency_order(definitions) {
        let Some((identifier, node)) = definitions.get_index(index) else {
            continue;
        };
        let path = vec!["definitions".to_string(), identifier.clone()];
        let expression = emitter.emit(node, path)?;
        let binding = bindings.get(identifier).cloned().unwrap_or_default();
        lines.push(format!("{} {} = {};", keyword, binding, expression));
        emitter.declare(identifier);
    }

    for (binding, path, node) in roots {
        let expression = emitter.emit(node, path)?;
        lines.push(format!("{} {} = {};", keyword, binding, expression));
    }

    let line_ending = options.line_ending.as_str();
    let mut code = lines.join(line_ending);
    code.push_str(line_ending);

    let lossy = emitter.into_lossy();
    debug!(bindings = bindings.len(), lossy = lossy.len(), "Rendered source");
    Ok(GeneratedCode {
        code,
        bindings,
        lossy,
    })
}

/// Definition indices ordered so that eager dependencies come first.
/// Members of an eager cycle keep their table order.
fn dependency_order(definitions: &Definitions) -> Vec<usize> {
    let mut graph: DiGraph<usize, ()> = DiGraph::new();
    let nodes: Vec<_> = (0..definitions.len()).map(|i| graph.add_node(i)).collect();
    for (index, node) in definitions.values().enumerate() {
        for target in node.references(true) {
            if let Some(target) = definitions.get_index_of(target) {
                graph.update_edge(nodes[index], nodes[target], ());
            }
        }
    }
    // Components come out dependencies first.
    tarjan_scc(&graph)
        .into_iter()
        .flat_map(|mut component| {
            component.sort();
            component
        })
        .map(|node| graph[node])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExportStyle;
    use schema_ast::{Annotations, NodeKind, UnionMode};

    fn definition(kind: NodeKind, identifier: &str) -> Node {
        Node::new(kind).with_annotations(Annotations::identified(identifier))
    }

    #[test]
    fn test_dependencies_render_first() {
        let mut definitions = Definitions::new();
        definitions.insert(
            "A".into(),
            definition(
                NodeKind::Union {
                    types: vec![Node::reference("B"), Node::new(NodeKind::Null)],
                    mode: UnionMode::AnyOf,
                },
                "A",
            ),
        );
        definitions.insert("B".into(), definition(NodeKind::String, "B"));
        let document = Document::new(Node::reference("A"), definitions);
        let generated = to_code(&document, &RenderOptions::default()).unwrap();
        assert_eq!(
            generated.code,
            "const B = Schema.String.annotate({ identifier: \"B\" });\n\
             const A = Schema.Union([B, Schema.Null]).annotate({ identifier: \"A\" });\n\
             const schema = A;\n"
        );
    }

    #[test]
    fn test_bindings_are_sanitised_and_unique() {
        let mut definitions = Definitions::new();
        definitions.insert("ID".into(), definition(NodeKind::String, "ID"));
        definitions.insert("ID-1".into(), definition(NodeKind::Number, "ID"));
        definitions.insert("Schema".into(), definition(NodeKind::Boolean, "Schema"));
        let document = Document::new(Node::new(NodeKind::Null), definitions);
        let generated = to_code(&document, &RenderOptions::default()).unwrap();
        assert_eq!(generated.bindings["ID"], "ID");
        assert_eq!(generated.bindings["ID-1"], "ID_1");
        assert_eq!(generated.bindings["Schema"], "Schema_1");
    }

    #[test]
    fn test_many_roots_and_export_style() {
        let document = MultiDocument::new(
            vec![Node::new(NodeKind::String), Node::new(NodeKind::Number)],
            Definitions::new(),
        );
        let options = RenderOptions::new().with_export_style(ExportStyle::Export);
        let generated = to_code_many(&document, &options).unwrap();
        assert_eq!(
            generated.code,
            "export const schema = Schema.String;\nexport const schema_1 = Schema.Number;\n"
        );
    }

    #[test]
    fn test_invalid_options_rejected() {
        let document = Document::new(Node::new(NodeKind::String), Definitions::new());
        let options = RenderOptions::new().with_namespace("not valid");
        assert!(to_code(&document, &options).is_err());
    }
}
