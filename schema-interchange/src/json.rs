//! Plain JSON codec.
//!
//! A lossless echo of the document: every node keeps its `_tag`, its checks
//! and its annotations, next to a format marker and the definitions table.
//!
//! ```json
//! {
//!   "format": "draft-2020-12",
//!   "schema": { "_tag": "Reference", "target": "ID", "checks": [], "annotations": {} },
//!   "definitions": { "ID": { "_tag": "String", "checks": [], "annotations": { "identifier": "ID" } } }
//! }
//! ```

use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{trace, warn};

use schema_ast::Node;

use crate::document::{Definitions, Document, MultiDocument};
use crate::error::Result;

/// Format marker written by [`to_json`] and [`to_json_multi`].
pub const FORMAT: &str = "draft-2020-12";

#[derive(Serialize)]
struct DocumentRef<'a> {
    format: &'a str,
    schema: &'a Node,
    definitions: &'a Definitions,
}

#[derive(Serialize)]
struct MultiDocumentRef<'a> {
    format: &'a str,
    schemas: &'a [Node],
    definitions: &'a Definitions,
}

#[derive(Deserialize)]
struct DocumentOwned {
    format: String,
    schema: Node,
    #[serde(default)]
    definitions: Definitions,
}

#[derive(Deserialize)]
struct MultiDocumentOwned {
    format: String,
    schemas: Vec<Node>,
    #[serde(default)]
    definitions: Definitions,
}

/// Serialise a document to its plain JSON form.
///
/// Fails on a non-finite number anywhere in the tree.
pub fn to_json(document: &Document) -> Result<Value> {
    encode(&DocumentRef {
        format: FORMAT,
        schema: &document.schema,
        definitions: &document.definitions,
    })
}

/// Serialise a multi-root document to its plain JSON form.
pub fn to_json_multi(document: &MultiDocument) -> Result<Value> {
    encode(&MultiDocumentRef {
        format: FORMAT,
        schemas: &document.schemas,
        definitions: &document.definitions,
    })
}

/// Parse the output of [`to_json`].
///
/// Fails when the payload does not have the document shape, carries another
/// format marker, or holds references with no matching definition.
pub fn from_json(value: &Value) -> Result<Document> {
    let owned = DocumentOwned::deserialize(value)?;
    check_format(&owned.format)?;
    let document = Document::new(owned.schema, owned.definitions);
    check_dangling(document.dangling_references())?;
    trace!(definitions = document.definitions.len(), "Parsed document");
    Ok(document)
}

/// Parse the output of [`to_json_multi`].
pub fn from_json_multi(value: &Value) -> Result<MultiDocument> {
    let owned = MultiDocumentOwned::deserialize(value)?;
    check_format(&owned.format)?;
    let document = MultiDocument::new(owned.schemas, owned.definitions);
    check_dangling(document.dangling_references())?;
    Ok(document)
}

fn encode<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|error| {
        warn!(error = %error, "Document serialisation failed");
        error.into()
    })
}

fn check_format(format: &str) -> Result<()> {
    if format == FORMAT {
        Ok(())
    } else {
        Err(serde_json::Error::custom(format!("unsupported format '{}'", format)).into())
    }
}

fn check_dangling(missing: Vec<String>) -> Result<()> {
    match missing.first() {
        None => Ok(()),
        Some(target) => Err(serde_json::Error::custom(format!(
            "reference to missing definition '{}'",
            target
        ))
        .into()),
    }
}
