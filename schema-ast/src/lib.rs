//! # schema-ast
//!
//! Node model for schema descriptions.
//!
//! The crate defines two views of the same schema language:
//!
//! - [`Ast`]: the *live* graph. Nodes are shared handles with identity,
//!   recursion is expressed with lazy [`AstKind::Suspend`] thunks, and
//!   modifiers such as [`Ast::check`] and [`Ast::annotate`] always return a
//!   new node.
//! - [`Node`]: the *document* tree. Plain owned data that serialises with
//!   `serde`, where shared and recursive structure is expressed by
//!   [`NodeKind::Reference`] into a definitions table.
//!
//! Both views share [`Check`], [`Annotations`], the literal/key types and the
//! generic member structures ([`Element`], [`PropertySignature`],
//! [`IndexSignature`], [`TemplatePart`]).
//!
//! ## Quick Start
//!
//! ```rust
//! use schema_ast::{filters, Annotations, Ast, Element, PropertySignature};
//!
//! let id = Ast::string()
//!     .check(filters::min_length(1))
//!     .annotate(Annotations::identified("ID"));
//!
//! let user = Ast::object(vec![
//!     PropertySignature::new("id", id.clone()),
//!     PropertySignature::new("nickname", Ast::string()).optional(),
//!     PropertySignature::new("pair", Ast::tuple(vec![
//!         Element::required(id.clone()),
//!         Element::required(id),
//!     ])),
//! ]);
//! assert!(user.checks().is_empty());
//! ```
//!
//! This crate performs no value validation. Transformations between the two
//! views live in `schema-interchange`.

pub mod annotations;
pub mod ast;
pub mod check;
pub mod literal;
pub mod members;
pub mod node;

#[cfg(test)]
mod proptest;

pub use annotations::Annotations;
pub use ast::{Ast, AstKind, AstNode, Thunk};
pub use check::{filters, Check, Filter, FilterGroup, FilterKind};
pub use literal::{
    format_number, number_to_json, EnumValue, LiteralValue, PropertyKey, SymbolKey, UnionMode,
};
pub use members::{Element, IndexSignature, PropertySignature, TemplatePart};
pub use node::{Node, NodeKind};
