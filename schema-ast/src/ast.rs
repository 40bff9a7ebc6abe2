//! Live schema AST.
//!
//! An [`Ast`] is a shared handle to an immutable [`AstNode`]. Handles are
//! cheap to clone and clones keep the same *identity*: two handles are the
//! same node iff they point at the same allocation. Traversals memoise on
//! [`Ast::id`], never on structural equality.
//!
//! Recursion goes through [`AstKind::Suspend`], whose [`Thunk`] resolves the
//! target lazily:
//!
//! ```rust
//! use schema_ast::{Annotations, Ast, PropertySignature};
//!
//! let category = Ast::recursive(|this| {
//!     Ast::object(vec![
//!         PropertySignature::new("name", Ast::string()),
//!         PropertySignature::new("children", Ast::array(this)),
//!     ])
//!     .annotate(Annotations::identified("Category"))
//! });
//! assert_eq!(category.identifier(), Some("Category"));
//! ```

use std::fmt;
use std::sync::{Arc, Weak};

use crate::annotations::Annotations;
use crate::check::Check;
use crate::literal::{EnumValue, LiteralValue, SymbolKey, UnionMode};
use crate::members::{Element, IndexSignature, PropertySignature, TemplatePart};

/// Shared handle to a schema node.
#[derive(Clone)]
pub struct Ast(Arc<AstNode>);

/// A schema node: shape, ordered checks and annotations.
#[derive(Debug, Clone)]
pub struct AstNode {
    /// Node shape
    pub kind: AstKind,

    /// Checks in declaration order
    pub checks: Vec<Check>,

    /// Node annotations
    pub annotations: Annotations,
}

/// Shapes a live node can take.
#[derive(Debug, Clone)]
pub enum AstKind {
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
    Literal(LiteralValue),
    UniqueSymbol(SymbolKey),
    Enum(Vec<(String, EnumValue)>),
    TemplateLiteral(Vec<TemplatePart<Ast>>),

    /// Tuples and arrays: fixed elements followed by rest types
    Arrays {
        elements: Vec<Element<Ast>>,
        rest: Vec<Ast>,
    },

    /// Structs and records
    Objects {
        property_signatures: Vec<PropertySignature<Ast>>,
        index_signatures: Vec<IndexSignature<Ast>>,
    },

    Union {
        types: Vec<Ast>,
        mode: UnionMode,
    },

    /// Lazily resolved node, possibly cyclic
    Suspend(Thunk),

    /// Named pointer into a definitions table
    Reference(String),

    /// Opaque declared type
    Declaration {
        type_parameters: Vec<Ast>,
        encoded: Option<Ast>,
    },
}

/// Deferred resolver of a [`AstKind::Suspend`] target.
#[derive(Clone)]
pub struct Thunk(Arc<dyn Fn() -> Ast + Send + Sync>);

impl Thunk {
    /// Wrap a resolver.
    pub fn new(resolve: impl Fn() -> Ast + Send + Sync + 'static) -> Self {
        Self(Arc::new(resolve))
    }

    /// Run the resolver.
    pub fn resolve(&self) -> Ast {
        (self.0)()
    }

    /// Identity of the resolver, shared by clones.
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }
}

impl fmt::Debug for Thunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Thunk(..)")
    }
}

impl fmt::Debug for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Ast {
    /// Create a node without checks or annotations.
    pub fn new(kind: AstKind) -> Self {
        Self(Arc::new(AstNode {
            kind,
            checks: Vec::new(),
            annotations: Annotations::default(),
        }))
    }

    /// Create a node from all of its parts.
    pub fn from_parts(kind: AstKind, checks: Vec<Check>, annotations: Annotations) -> Self {
        Self(Arc::new(AstNode {
            kind,
            checks,
            annotations,
        }))
    }

    /// Identity of the node (stable while any handle is alive).
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }

    /// Check whether two handles point at the same node.
    pub fn ptr_eq(&self, other: &Ast) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// The underlying node.
    pub fn node(&self) -> &AstNode {
        &self.0
    }

    /// Node shape.
    pub fn kind(&self) -> &AstKind {
        &self.0.kind
    }

    /// Checks in declaration order.
    pub fn checks(&self) -> &[Check] {
        &self.0.checks
    }

    /// Node annotations.
    pub fn annotations(&self) -> &Annotations {
        &self.0.annotations
    }

    /// The `identifier` annotation, if any.
    pub fn identifier(&self) -> Option<&str> {
        self.0.annotations.identifier.as_deref()
    }

    // =========================================================================
    // Keywords
    // =========================================================================

    pub fn never() -> Self {
        Self::new(AstKind::Never)
    }

    pub fn any() -> Self {
        Self::new(AstKind::Any)
    }

    pub fn unknown() -> Self {
        Self::new(AstKind::Unknown)
    }

    pub fn void() -> Self {
        Self::new(AstKind::Void)
    }

    pub fn undefined() -> Self {
        Self::new(AstKind::Undefined)
    }

    pub fn null() -> Self {
        Self::new(AstKind::Null)
    }

    pub fn boolean() -> Self {
        Self::new(AstKind::Boolean)
    }

    pub fn string() -> Self {
        Self::new(AstKind::String)
    }

    pub fn number() -> Self {
        Self::new(AstKind::Number)
    }

    pub fn big_int() -> Self {
        Self::new(AstKind::BigInt)
    }

    pub fn symbol() -> Self {
        Self::new(AstKind::Symbol)
    }

    pub fn object_keyword() -> Self {
        Self::new(AstKind::ObjectKeyword)
    }

    // =========================================================================
    // Constants
    // =========================================================================

    /// A literal constant.
    pub fn literal(value: impl Into<LiteralValue>) -> Self {
        Self::new(AstKind::Literal(value.into()))
    }

    /// A unique symbol.
    pub fn unique_symbol(symbol: SymbolKey) -> Self {
        Self::new(AstKind::UniqueSymbol(symbol))
    }

    /// An enum from `(name, value)` pairs.
    pub fn enums<N, V>(members: impl IntoIterator<Item = (N, V)>) -> Self
    where
        N: Into<String>,
        V: Into<EnumValue>,
    {
        Self::new(AstKind::Enum(
            members
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        ))
    }

    /// A template literal.
    pub fn template_literal(parts: Vec<TemplatePart<Ast>>) -> Self {
        Self::new(AstKind::TemplateLiteral(parts))
    }

    // =========================================================================
    // Composites
    // =========================================================================

    /// A fixed-length tuple.
    pub fn tuple(elements: Vec<Element<Ast>>) -> Self {
        Self::tuple_with_rest(elements, Vec::new())
    }

    /// A homogeneous array.
    pub fn array(item: Ast) -> Self {
        Self::tuple_with_rest(Vec::new(), vec![item])
    }

    /// Fixed elements followed by rest types.
    pub fn tuple_with_rest(elements: Vec<Element<Ast>>, rest: Vec<Ast>) -> Self {
        Self::new(AstKind::Arrays { elements, rest })
    }

    /// A struct.
    pub fn object(property_signatures: Vec<PropertySignature<Ast>>) -> Self {
        Self::object_with_index(property_signatures, Vec::new())
    }

    /// A record.
    pub fn record(key: Ast, value: Ast) -> Self {
        Self::object_with_index(Vec::new(), vec![IndexSignature::new(key, value)])
    }

    /// A struct extended with index signatures.
    pub fn object_with_index(
        property_signatures: Vec<PropertySignature<Ast>>,
        index_signatures: Vec<IndexSignature<Ast>>,
    ) -> Self {
        Self::new(AstKind::Objects {
            property_signatures,
            index_signatures,
        })
    }

    /// An `anyOf` union.
    pub fn union(types: Vec<Ast>) -> Self {
        Self::new(AstKind::Union {
            types,
            mode: UnionMode::AnyOf,
        })
    }

    /// A `oneOf` union.
    pub fn one_of(types: Vec<Ast>) -> Self {
        Self::new(AstKind::Union {
            types,
            mode: UnionMode::OneOf,
        })
    }

    /// A lazily resolved node.
    pub fn suspend(resolve: impl Fn() -> Ast + Send + Sync + 'static) -> Self {
        Self::new(AstKind::Suspend(Thunk::new(resolve)))
    }

    /// Build a self-referential node. `build` receives a suspended handle
    /// that resolves to the node being built.
    pub fn recursive(build: impl FnOnce(Ast) -> Ast) -> Self {
        Self(Arc::new_cyclic(|weak: &Weak<AstNode>| {
            let weak = weak.clone();
            let this = Ast::suspend(move || match weak.upgrade() {
                Some(node) => Ast(node),
                None => Ast::never(),
            });
            Arc::unwrap_or_clone(build(this).0)
        }))
    }

    /// A named pointer into a definitions table.
    pub fn reference(target: impl Into<String>) -> Self {
        Self::new(AstKind::Reference(target.into()))
    }

    /// An opaque declaration.
    pub fn declaration(type_parameters: Vec<Ast>, encoded: Option<Ast>) -> Self {
        Self::new(AstKind::Declaration {
            type_parameters,
            encoded,
        })
    }

    // =========================================================================
    // Modifiers (each returns a new node)
    // =========================================================================

    /// Append a check.
    pub fn check(&self, check: impl Into<Check>) -> Self {
        let mut node = self.node().clone();
        node.checks.push(check.into());
        Self(Arc::new(node))
    }

    /// Append several checks in order.
    pub fn checks_all(&self, checks: impl IntoIterator<Item = Check>) -> Self {
        let mut node = self.node().clone();
        node.checks.extend(checks);
        Self(Arc::new(node))
    }

    /// Overlay annotations.
    pub fn annotate(&self, annotations: Annotations) -> Self {
        let mut node = self.node().clone();
        node.annotations = node.annotations.merge(&annotations);
        Self(Arc::new(node))
    }

    /// Shorthand for annotating with an identifier.
    pub fn identified(&self, identifier: impl Into<String>) -> Self {
        self.annotate(Annotations::identified(identifier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::filters;

    #[test]
    fn test_identity_follows_handles() {
        let a = Ast::string();
        let b = a.clone();
        let c = Ast::string();
        assert!(a.ptr_eq(&b));
        assert_eq!(a.id(), b.id());
        assert!(!a.ptr_eq(&c));
    }

    #[test]
    fn test_modifiers_create_new_nodes() {
        let base = Ast::string();
        let checked = base.check(filters::min_length(1));
        assert!(!base.ptr_eq(&checked));
        assert!(base.checks().is_empty());
        assert_eq!(checked.checks().len(), 1);
    }

    #[test]
    fn test_recursive_thunk_resolves_to_self() {
        let node = Ast::recursive(|this| Ast::array(this).identified("List"));
        let AstKind::Arrays { rest, .. } = node.kind() else {
            panic!("expected arrays");
        };
        let AstKind::Suspend(thunk) = rest[0].kind() else {
            panic!("expected suspend");
        };
        assert!(thunk.resolve().ptr_eq(&node));
        assert_eq!(node.identifier(), Some("List"));
    }
}
