//! # schema-interchange
//!
//! Conversions between a live schema graph ([`schema_ast::Ast`]) and portable
//! representations:
//!
//! - [`extract`]: live graph to a reference-normalised [`Document`], with
//!   identifier hoisting, `-1`/`-2` disambiguation and recursion handling;
//! - [`to_json`] / [`from_json`]: lossless plain JSON;
//! - [`to_json_schema`] / [`from_json_schema`]: JSON Schema (draft-07,
//!   2020-12 or OpenAPI 3.1) with ordered `allOf` for conflicting checks;
//! - [`to_code`]: builder-call source text, with a [`Reviver`] hook;
//! - [`to_schema`]: back to a live schema through a [`SchemaFactory`],
//!   held by a [`Rehydrated`] handle.
//!
//! ## Quick Start
//!
//! ```rust
//! use schema_ast::{filters, Ast, PropertySignature};
//! use schema_interchange::{extract, to_json_schema, to_schema, AstFactory, JsonSchemaConfig};
//!
//! let category = Ast::recursive(|this| {
//!     Ast::object(vec![
//!         PropertySignature::new("name", Ast::string().check(filters::min_length(1))),
//!         PropertySignature::new("children", Ast::array(this)),
//!     ])
//!     .identified("Category")
//! });
//!
//! let document = extract(&category).unwrap();
//! assert!(document.definitions.contains_key("Category"));
//!
//! let json_schema = to_json_schema(&document, &JsonSchemaConfig::default()).unwrap();
//! assert_eq!(json_schema.schema["$ref"], "#/$defs/Category");
//!
//! let rebuilt = to_schema(&document, AstFactory);
//! assert_eq!(extract(&rebuilt).unwrap(), document);
//! ```
//!
//! ## Logging
//!
//! Entry points are instrumented with `tracing` spans; hoisting, naming and
//! lossy rendering decisions are logged as events. No subscriber is
//! installed by this crate.

pub mod config;
pub mod document;
pub mod error;
pub mod extract;
pub mod json;
pub mod json_schema;
pub mod naming;
pub mod rehydrate;
pub mod render;

pub use config::{
    ConfigValidationError, ExportStyle, JsonSchemaConfig, JsonSchemaTarget, LineEnding,
    RenderOptions,
};
pub use document::{Definitions, Document, MultiDocument};
pub use error::{InterchangeError, Result};
pub use extract::{extract, extract_many};
pub use json::{from_json, from_json_multi, to_json, to_json_multi};
pub use json_schema::{
    from_json_schema, to_json_schema, to_json_schema_multi, JsonSchemaDocument,
    JsonSchemaMultiDocument,
};
pub use rehydrate::{to_schema, to_schema_many, AstFactory, LazySchema, Rehydrated, SchemaFactory};
pub use render::{to_code, to_code_many, GeneratedCode, Reviver};
