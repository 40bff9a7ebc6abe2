//! Rehydration: document back to a live schema.
//!
//! Every definition is built at most once and shared by all of its
//! references, so identity-based extraction of the result reproduces the
//! definitions table. Suspended nodes become factory suspends that build
//! their target on first use and keep it.
//!
//! Built schemas are owned by the state behind the returned [`Rehydrated`]
//! handle. Suspends reach that state through weak links only, so a
//! recursive definition does not keep itself alive.

mod factory;

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, Mutex, OnceLock, PoisonError, Weak};

use tracing::{debug, trace, warn};

use schema_ast::{Element, IndexSignature, Node, NodeKind, PropertySignature, TemplatePart};

use crate::document::{Definitions, Document, MultiDocument};

pub use factory::{AstFactory, LazySchema, SchemaFactory};

/// A rehydrated schema together with the state its suspends resolve
/// through.
///
/// Dereferences to the schema. Suspends inside it stay resolvable while any
/// clone of the handle is alive; afterwards they resolve to
/// [`SchemaFactory::any`].
#[derive(Clone)]
pub struct Rehydrated<T> {
    value: T,
    state: Arc<dyn Any + Send + Sync>,
}

impl<T> Rehydrated<T> {
    /// The rehydrated value.
    pub fn get(&self) -> &T {
        &self.value
    }
}

impl<T> Deref for Rehydrated<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> AsRef<T> for Rehydrated<T> {
    fn as_ref(&self) -> &T {
        &self.value
    }
}

impl<T: fmt::Debug> fmt::Debug for Rehydrated<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Rehydrated").field(&self.value).finish()
    }
}

/// State shared by the builder and every suspend it hands out.
struct Shared<F: SchemaFactory> {
    factory: Arc<F>,
    definitions: Definitions,
    slots: HashMap<String, OnceLock<F::Schema>>,
    /// Targets of inline suspends, resolved on demand.
    cells: Mutex<Vec<Arc<OnceLock<F::Schema>>>>,
}

impl<F: SchemaFactory> Shared<F> {
    fn new(factory: F, definitions: &Definitions) -> Arc<Self> {
        Arc::new(Self {
            factory: Arc::new(factory),
            definitions: definitions.clone(),
            slots: definitions
                .keys()
                .map(|name| (name.clone(), OnceLock::new()))
                .collect(),
            cells: Mutex::new(Vec::new()),
        })
    }

    /// Register a fresh cell and hand back a weak link to it.
    fn cell(&self) -> Weak<OnceLock<F::Schema>> {
        let cell = Arc::new(OnceLock::new());
        let weak = Arc::downgrade(&cell);
        self.cells
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(cell);
        weak
    }
}

fn handle<F: SchemaFactory, T>(shared: Arc<Shared<F>>, value: T) -> Rehydrated<T> {
    Rehydrated {
        value,
        state: shared,
    }
}

/// Fallback for a suspend resolved after its state was dropped.
fn released<F: SchemaFactory>(factory: &F) -> F::Schema {
    warn!("Suspend resolved after its rehydrated schema was dropped; rebuilt as Any");
    factory.any()
}

/// Rebuild a live schema from a document.
///
/// # Example
///
/// ```rust
/// use schema_ast::Ast;
/// use schema_interchange::{extract, to_schema, AstFactory};
///
/// let ast = Ast::string().identified("ID");
/// let document = extract(&ast).unwrap();
/// let rebuilt = to_schema(&document, AstFactory);
/// assert_eq!(extract(&rebuilt).unwrap(), document);
/// ```
#[tracing::instrument(skip_all, fields(definitions = document.definitions.len()))]
pub fn to_schema<F: SchemaFactory>(document: &Document, factory: F) -> Rehydrated<F::Schema> {
    let shared = Shared::new(factory, &document.definitions);
    let schema = build(&shared, &document.schema, &mut HashSet::new());
    handle(shared, schema)
}

/// Rebuild every root of a multi-root document. Roots share definitions.
#[tracing::instrument(skip_all, fields(roots = document.schemas.len()))]
pub fn to_schema_many<F: SchemaFactory>(
    document: &MultiDocument,
    factory: F,
) -> Rehydrated<Vec<F::Schema>> {
    let shared = Shared::new(factory, &document.definitions);
    let schemas = document
        .schemas
        .iter()
        .map(|schema| build(&shared, schema, &mut HashSet::new()))
        .collect();
    handle(shared, schemas)
}

/// Build (or fetch) a definition. A definition reached again while it is
/// being built is returned as a suspend.
fn definition<F: SchemaFactory>(
    shared: &Arc<Shared<F>>,
    name: &str,
    building: &mut HashSet<String>,
) -> F::Schema {
    let (Some(slot), Some(node)) = (shared.slots.get(name), shared.definitions.get(name)) else {
        warn!(target_name = %name, "Reference to a missing definition rebuilt as Any");
        return shared.factory.any();
    };
    if let Some(schema) = slot.get() {
        return schema.clone();
    }
    if building.contains(name) {
        trace!(definition = %name, "Eager self reference suspended");
        let state = Arc::downgrade(shared);
        let factory = Arc::clone(&shared.factory);
        let name = name.to_string();
        return shared.factory.suspend(Arc::new(move || match state.upgrade() {
            Some(shared) => definition(&shared, &name, &mut HashSet::new()),
            None => released(&*factory),
        }));
    }

    building.insert(name.to_string());
    let schema = build(shared, node, building);
    building.remove(name);
    debug!(definition = %name, "Rebuilt definition");
    slot.get_or_init(|| schema).clone()
}

fn build<F: SchemaFactory>(
    shared: &Arc<Shared<F>>,
    node: &Node,
    building: &mut HashSet<String>,
) -> F::Schema {
    let factory = &shared.factory;
    let schema = match &node.kind {
        NodeKind::Never => factory.never(),
        NodeKind::Any => factory.any(),
        NodeKind::Unknown => factory.unknown(),
        NodeKind::Void => factory.void(),
        NodeKind::Undefined => factory.undefined(),
        NodeKind::Null => factory.null(),
        NodeKind::Boolean => factory.boolean(),
        NodeKind::String => factory.string(),
        NodeKind::Number => factory.number(),
        NodeKind::BigInt => factory.big_int(),
        NodeKind::Symbol => factory.symbol(),
        NodeKind::ObjectKeyword => factory.object_keyword(),
        NodeKind::Literal { literal } => factory.literal(literal.clone()),
        NodeKind::UniqueSymbol { symbol } => factory.unique_symbol(symbol.clone()),
        NodeKind::Enum { enums } => factory.enums(enums.clone()),
        NodeKind::TemplateLiteral { parts } => {
            let parts = parts
                .iter()
                .map(|part| match part {
                    TemplatePart::Text { text } => TemplatePart::Text { text: text.clone() },
                    TemplatePart::Schema { schema } => TemplatePart::Schema {
                        schema: build(shared, schema, building),
                    },
                })
                .collect();
            factory.template_literal(parts)
        }
        NodeKind::Arrays { elements, rest } => {
            let elements = elements
                .iter()
                .map(|element| Element {
                    ty: build(shared, &element.ty, building),
                    is_optional: element.is_optional,
                })
                .collect();
            let rest = rest.iter().map(|ty| build(shared, ty, building)).collect();
            factory.arrays(elements, rest)
        }
        NodeKind::Objects {
            property_signatures,
            index_signatures,
        } => {
            let properties = property_signatures
                .iter()
                .map(|ps| PropertySignature {
                    name: ps.name.clone(),
                    ty: build(shared, &ps.ty, building),
                    is_optional: ps.is_optional,
                    is_mutable: ps.is_mutable,
                    annotations: ps.annotations.clone(),
                })
                .collect();
            let signatures = index_signatures
                .iter()
                .map(|is| IndexSignature {
                    parameter: build(shared, &is.parameter, building),
                    ty: build(shared, &is.ty, building),
                    is_mutable: is.is_mutable,
                })
                .collect();
            factory.objects(properties, signatures)
        }
        NodeKind::Union { types, mode } => {
            let types = types.iter().map(|ty| build(shared, ty, building)).collect();
            factory.union(types, *mode)
        }
        NodeKind::Suspend { thunk } => {
            let cell = shared.cell();
            let state = Arc::downgrade(shared);
            let fallback = Arc::clone(&shared.factory);
            let target = thunk.as_ref().clone();
            factory.suspend(Arc::new(move || match (state.upgrade(), cell.upgrade()) {
                (Some(shared), Some(cell)) => cell
                    .get_or_init(|| build(&shared, &target, &mut HashSet::new()))
                    .clone(),
                _ => released(&*fallback),
            }))
        }
        NodeKind::Reference { target } => definition(shared, target, building),
        NodeKind::Declaration {
            type_parameters,
            encoded,
        } => match encoded {
            Some(encoded) => {
                let type_parameters = type_parameters
                    .iter()
                    .map(|ty| build(shared, ty, building))
                    .collect();
                let encoded = build(shared, encoded, building);
                factory.declaration(type_parameters, encoded)
            }
            None => {
                debug!("Declaration without an encoded form rebuilt as Any");
                factory.any()
            }
        },
    };

    let schema = if node.checks.is_empty() {
        schema
    } else {
        factory.with_checks(schema, node.checks.clone())
    };
    if node.annotations.is_empty() {
        schema
    } else {
        factory.with_annotations(schema, node.annotations.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract;
    use schema_ast::{
        filters, Annotations, Ast, AstKind, Check, EnumValue, LiteralValue, PropertySignature,
        SymbolKey, UnionMode,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Schema whose instances are counted while alive.
    #[derive(Clone)]
    struct Counted(Arc<Tracked>);

    struct Tracked {
        live: Arc<AtomicUsize>,
        children: Vec<Counted>,
        thunk: Option<LazySchema<Counted>>,
    }

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.live.fetch_sub(1, Ordering::SeqCst);
        }
    }

    struct CountingFactory {
        live: Arc<AtomicUsize>,
    }

    impl CountingFactory {
        fn make(&self, children: Vec<Counted>, thunk: Option<LazySchema<Counted>>) -> Counted {
            self.live.fetch_add(1, Ordering::SeqCst);
            Counted(Arc::new(Tracked {
                live: Arc::clone(&self.live),
                children,
                thunk,
            }))
        }

        fn leaf(&self) -> Counted {
            self.make(Vec::new(), None)
        }
    }

    impl SchemaFactory for CountingFactory {
        type Schema = Counted;

        fn never(&self) -> Counted {
            self.leaf()
        }
        fn any(&self) -> Counted {
            self.leaf()
        }
        fn unknown(&self) -> Counted {
            self.leaf()
        }
        fn void(&self) -> Counted {
            self.leaf()
        }
        fn undefined(&self) -> Counted {
            self.leaf()
        }
        fn null(&self) -> Counted {
            self.leaf()
        }
        fn boolean(&self) -> Counted {
            self.leaf()
        }
        fn string(&self) -> Counted {
            self.leaf()
        }
        fn number(&self) -> Counted {
            self.leaf()
        }
        fn big_int(&self) -> Counted {
            self.leaf()
        }
        fn symbol(&self) -> Counted {
            self.leaf()
        }
        fn object_keyword(&self) -> Counted {
            self.leaf()
        }
        fn literal(&self, _literal: LiteralValue) -> Counted {
            self.leaf()
        }
        fn unique_symbol(&self, _symbol: SymbolKey) -> Counted {
            self.leaf()
        }
        fn enums(&self, _enums: Vec<(String, EnumValue)>) -> Counted {
            self.leaf()
        }
        fn template_literal(&self, parts: Vec<TemplatePart<Counted>>) -> Counted {
            let children = parts
                .into_iter()
                .filter_map(|part| match part {
                    TemplatePart::Schema { schema } => Some(schema),
                    TemplatePart::Text { .. } => None,
                })
                .collect();
            self.make(children, None)
        }
        fn arrays(&self, elements: Vec<Element<Counted>>, rest: Vec<Counted>) -> Counted {
            let children = elements.into_iter().map(|e| e.ty).chain(rest).collect();
            self.make(children, None)
        }
        fn objects(
            &self,
            property_signatures: Vec<PropertySignature<Counted>>,
            index_signatures: Vec<IndexSignature<Counted>>,
        ) -> Counted {
            let children = property_signatures
                .into_iter()
                .map(|ps| ps.ty)
                .chain(index_signatures.into_iter().flat_map(|is| [is.parameter, is.ty]))
                .collect();
            self.make(children, None)
        }
        fn union(&self, types: Vec<Counted>, _mode: UnionMode) -> Counted {
            self.make(types, None)
        }
        fn suspend(&self, thunk: LazySchema<Counted>) -> Counted {
            self.make(Vec::new(), Some(thunk))
        }
        fn declaration(&self, type_parameters: Vec<Counted>, encoded: Counted) -> Counted {
            let children = type_parameters.into_iter().chain([encoded]).collect();
            self.make(children, None)
        }
        fn with_checks(&self, schema: Counted, _checks: Vec<Check>) -> Counted {
            self.make(vec![schema], None)
        }
        fn with_annotations(&self, schema: Counted, _annotations: Annotations) -> Counted {
            self.make(vec![schema], None)
        }
    }

    /// Resolve every suspend down to `depth`.
    fn force(schema: &Counted, depth: usize) {
        if depth == 0 {
            return;
        }
        if let Some(thunk) = &schema.0.thunk {
            force(&thunk(), depth - 1);
        }
        for child in &schema.0.children {
            force(child, depth - 1);
        }
    }

    fn category() -> Ast {
        Ast::recursive(|this| {
            Ast::object(vec![
                PropertySignature::new("name", Ast::string().check(filters::min_length(1))),
                PropertySignature::new("children", Ast::array(this)),
            ])
            .identified("Category")
        })
    }

    fn self_referencing_union() -> Document {
        let mut definitions = Definitions::new();
        definitions.insert(
            "A".into(),
            Node::new(NodeKind::Union {
                types: vec![Node::new(NodeKind::Null), Node::reference("A")],
                mode: UnionMode::AnyOf,
            })
            .with_annotations(Annotations::identified("A")),
        );
        Document::new(Node::reference("A"), definitions)
    }

    #[test]
    fn test_definitions_are_shared() {
        let mut definitions = Definitions::new();
        definitions.insert(
            "ID".into(),
            Node::new(NodeKind::String).with_annotations(Annotations::identified("ID")),
        );
        let document = Document::new(
            Node::new(NodeKind::Arrays {
                elements: vec![
                    Element::required(Node::reference("ID")),
                    Element::required(Node::reference("ID")),
                ],
                rest: Vec::new(),
            }),
            definitions,
        );
        let ast = to_schema(&document, AstFactory);
        let AstKind::Arrays { elements, .. } = ast.kind() else {
            panic!("expected arrays");
        };
        assert!(elements[0].ty.ptr_eq(&elements[1].ty));
    }

    #[test]
    fn test_recursive_document_round_trips() {
        let document = extract(&category()).unwrap();
        let rebuilt = to_schema(&document, AstFactory);
        assert_eq!(extract(&rebuilt).unwrap(), document);
    }

    #[test]
    fn test_suspend_resolves_once() {
        let document = Document::new(Node::suspend(Node::new(NodeKind::Number)), Definitions::new());
        let ast = to_schema(&document, AstFactory);
        let AstKind::Suspend(thunk) = ast.kind() else {
            panic!("expected suspend");
        };
        assert!(thunk.resolve().ptr_eq(&thunk.resolve()));
    }

    #[test]
    fn test_declaration_without_encoded_accepts_anything() {
        let document = Document::new(
            Node::new(NodeKind::Declaration {
                type_parameters: Vec::new(),
                encoded: None,
            }),
            Definitions::new(),
        );
        let ast = to_schema(&document, AstFactory);
        assert!(matches!(ast.kind(), AstKind::Any));
    }

    #[test]
    fn test_recursive_schema_is_freed_on_drop() {
        let live = Arc::new(AtomicUsize::new(0));
        let document = extract(&category()).unwrap();
        let rebuilt = to_schema(
            &document,
            CountingFactory {
                live: Arc::clone(&live),
            },
        );
        force(&rebuilt, 8);
        assert!(live.load(Ordering::SeqCst) > 0);
        drop(rebuilt);
        assert_eq!(live.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_self_referencing_union_is_freed_on_drop() {
        let live = Arc::new(AtomicUsize::new(0));
        let rebuilt = to_schema(
            &self_referencing_union(),
            CountingFactory {
                live: Arc::clone(&live),
            },
        );
        force(&rebuilt, 8);
        drop(rebuilt);
        assert_eq!(live.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_suspend_outliving_its_handle_resolves_to_any() {
        let document = Document::new(Node::suspend(Node::new(NodeKind::Number)), Definitions::new());
        let ast = to_schema(&document, AstFactory).get().clone();
        let AstKind::Suspend(thunk) = ast.kind() else {
            panic!("expected suspend");
        };
        assert!(matches!(thunk.resolve().kind(), AstKind::Any));
    }

    #[test]
    fn test_eager_self_reference_is_suspended() {
        let document = self_referencing_union();
        let rebuilt = to_schema(&document, AstFactory);
        let AstKind::Union { types, .. } = rebuilt.kind() else {
            panic!("expected union");
        };
        let AstKind::Suspend(thunk) = types[1].kind() else {
            panic!("expected suspend");
        };
        assert!(thunk.resolve().ptr_eq(&rebuilt));

        let extracted = extract(&rebuilt).unwrap();
        assert_eq!(extracted.schema, Node::reference("A"));
        let NodeKind::Union { types, .. } = &extracted.definitions["A"].kind else {
            panic!("expected union");
        };
        assert_eq!(types[1], Node::suspend(Node::reference("A")));
    }
}
