//! JSON Schema codec.
//!
//! [`to_json_schema`] maps a [`Document`] onto a JSON Schema document for a
//! chosen [`JsonSchemaTarget`]; [`from_json_schema`] maps the produced
//! subset back. Checks compile to validation keywords with an ordered
//! intersection policy: a check's fragment is merged into the schema only
//! when none of its keys is present yet, otherwise it is appended to
//! `allOf`. Nothing is merged numerically.
//!
//! Round trip guarantee:
//!
//! ```text
//! to_json_schema(from_json_schema(to_json_schema(d))) == to_json_schema(d)
//! ```

mod decode;
mod encode;
mod keywords;
mod template;

use std::collections::{HashMap, HashSet};

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, trace};

use schema_ast::{Node, NodeKind};

use crate::config::{JsonSchemaConfig, JsonSchemaTarget};
use crate::document::{unwrap_suspend, Definitions, Document, MultiDocument};
use crate::error::{InterchangeError, Result};
use crate::naming::NameAllocator;

use decode::Decoder;
use encode::Encoder;

pub use keywords::{filter_fragment, filter_keywords};
pub use template::{parse_pattern, template_pattern, NUMBER_PATTERN, STRING_PATTERN};

/// A JSON Schema split into its root and its definitions table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonSchemaDocument {
    /// Dialect the schema is written in
    pub dialect: JsonSchemaTarget,

    /// Root schema
    pub schema: Value,

    /// Definitions, keyed by identifier
    pub definitions: Map<String, Value>,
}

/// Several root schemas sharing one definitions table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonSchemaMultiDocument {
    /// Dialect the schemas are written in
    pub dialect: JsonSchemaTarget,

    /// One `$ref` per root, in input order
    pub schemas: Vec<Value>,

    /// Shared definitions, keyed by identifier
    pub definitions: Map<String, Value>,
}

impl JsonSchemaDocument {
    /// Standalone document: `$schema`, the root keywords and the
    /// definitions table at the dialect's location.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("$schema".into(), Value::from(self.dialect.schema_uri()));
        if let Value::Object(root) = &self.schema {
            map.extend(root.clone());
        }
        insert_definitions(&mut map, self.dialect, &self.definitions);
        Value::Object(map)
    }

    /// Consume into a standalone document.
    pub fn into_value(self) -> Value {
        self.to_value()
    }

    /// Split a standalone document into root and definitions.
    ///
    /// The dialect comes from `$schema` and the location of the definitions
    /// table; without either, 2020-12 is assumed.
    pub fn from_value(value: &Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(InterchangeError::malformed("", "document must be an object"));
        };
        let mut map = map.clone();
        let declared = match map.remove("$schema") {
            None => None,
            Some(Value::String(uri)) => match JsonSchemaTarget::from_schema_uri(&uri) {
                Some(target) => Some(target),
                None => {
                    return Err(InterchangeError::malformed(
                        "/$schema",
                        format!("unsupported dialect '{}'", uri),
                    ))
                }
            },
            Some(_) => return Err(InterchangeError::malformed("/$schema", "must be a string")),
        };

        let (dialect, definitions) = if let Some(components) = map.remove("components") {
            (JsonSchemaTarget::OpenApi31, take_components(components)?)
        } else if let Some(defs) = map.remove("$defs") {
            (JsonSchemaTarget::Draft2020_12, expect_object(defs, "/$defs")?)
        } else if let Some(defs) = map.remove("definitions") {
            (JsonSchemaTarget::Draft07, expect_object(defs, "/definitions")?)
        } else {
            (declared.unwrap_or_default(), Map::new())
        };

        if dialect == JsonSchemaTarget::Draft07 && declared == Some(JsonSchemaTarget::Draft2020_12)
        {
            return Err(InterchangeError::malformed(
                "/definitions",
                "draft-07 definitions in a 2020-12 document",
            ));
        }

        Ok(Self {
            dialect,
            schema: Value::Object(map),
            definitions,
        })
    }
}

impl JsonSchemaMultiDocument {
    /// Standalone document holding `$schema` and the shared definitions.
    /// The roots are `$ref`s into it.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("$schema".into(), Value::from(self.dialect.schema_uri()));
        insert_definitions(&mut map, self.dialect, &self.definitions);
        Value::Object(map)
    }

    /// Consume into a standalone document.
    pub fn into_value(self) -> Value {
        self.to_value()
    }
}

/// Convert a document to JSON Schema.
///
/// # Example
///
/// ```rust
/// use schema_ast::{filters, Ast};
/// use schema_interchange::{extract, to_json_schema, JsonSchemaConfig};
/// use serde_json::json;
///
/// let ast = Ast::string().check(filters::min_length(1)).check(filters::min_length(2));
/// let document = extract(&ast).unwrap();
/// let schema = to_json_schema(&document, &JsonSchemaConfig::default()).unwrap();
/// assert_eq!(schema.schema, json!({
///     "type": "string",
///     "minLength": 1,
///     "title": "isMinLength(1)",
///     "allOf": [{"minLength": 2, "title": "isMinLength(2)"}]
/// }));
/// ```
#[tracing::instrument(skip_all, fields(target = ?config.target))]
pub fn to_json_schema(document: &Document, config: &JsonSchemaConfig) -> Result<JsonSchemaDocument> {
    config.validate()?;
    let encoder = Encoder::new(config.target);
    let definitions = encode_definitions(&encoder, &document.definitions);
    let schema = encoder.encode(&document.schema);
    debug!(definitions = definitions.len(), "Generated JSON Schema");
    Ok(JsonSchemaDocument {
        dialect: config.target,
        schema,
        definitions,
    })
}

/// Convert a multi-root document to JSON Schema.
///
/// Every root becomes a `$ref`. Roots that are not already references are
/// hoisted under [`JsonSchemaConfig::root_identifier`], disambiguated with
/// `-1`, `-2`, ... against the existing definitions.
#[tracing::instrument(skip_all, fields(target = ?config.target, roots = document.schemas.len()))]
pub fn to_json_schema_multi(
    document: &MultiDocument,
    config: &JsonSchemaConfig,
) -> Result<JsonSchemaMultiDocument> {
    config.validate()?;
    let encoder = Encoder::new(config.target);
    let mut definitions = encode_definitions(&encoder, &document.definitions);
    let mut names = NameAllocator::new();
    for name in definitions.keys() {
        names.reserve(name.clone());
    }

    let schemas = document
        .schemas
        .iter()
        .map(|root| {
            let target = match unwrap_suspend(root).reference_target() {
                Some(target) => target.to_string(),
                None => {
                    let name = names.allocate(&config.root_identifier);
                    debug!(name = %name, "Hoisting root schema");
                    definitions.insert(name.clone(), encoder.encode(root));
                    name
                }
            };
            reference_value(config.target, &target)
        })
        .collect();

    Ok(JsonSchemaMultiDocument {
        dialect: config.target,
        schemas,
        definitions,
    })
}

/// Convert a JSON Schema produced by [`to_json_schema`] back to a document.
///
/// Definitions get an `identifier` annotation equal to their key, and
/// references that close a cycle between definitions are wrapped in
/// [`NodeKind::Suspend`].
#[tracing::instrument(skip_all, fields(dialect = ?document.dialect))]
pub fn from_json_schema(document: &JsonSchemaDocument) -> Result<Document> {
    let decoder = Decoder::new(document.dialect, &document.definitions);
    let prefix = definitions_pointer(document.dialect);

    let mut definitions = Definitions::new();
    for (name, value) in &document.definitions {
        let pointer = format!("{}/{}", prefix, escape_pointer(name));
        let mut node = decoder.decode(value, &pointer)?;
        node.annotations.identifier = Some(name.clone());
        definitions.insert(name.clone(), node);
    }
    suspend_cycles(&mut definitions);

    let schema = decoder.decode(&document.schema, "")?;
    debug!(definitions = definitions.len(), "Decoded JSON Schema");
    Ok(Document::new(schema, definitions))
}

// =============================================================================
// Helpers
// =============================================================================

fn encode_definitions(encoder: &Encoder, definitions: &Definitions) -> Map<String, Value> {
    definitions
        .iter()
        .map(|(name, node)| (name.clone(), encoder.encode(node)))
        .collect()
}

/// `{"$ref": ...}` pointing at a definition; the name is pointer-escaped.
fn reference_value(target: JsonSchemaTarget, name: &str) -> Value {
    let mut map = Map::new();
    map.insert(
        "$ref".into(),
        Value::String(format!("{}{}", target.ref_prefix(), escape_pointer(name))),
    );
    Value::Object(map)
}

/// An empty table is omitted, except under `components`: that key is all
/// that tells an OpenAPI document apart from a 2020-12 one.
fn insert_definitions(map: &mut Map<String, Value>, target: JsonSchemaTarget, definitions: &Map<String, Value>) {
    if definitions.is_empty() && target != JsonSchemaTarget::OpenApi31 {
        return;
    }
    let table = Value::Object(definitions.clone());
    match target.definitions_path() {
        [key] => {
            map.insert((*key).to_string(), table);
        }
        [outer, inner] => {
            let mut nested = Map::new();
            nested.insert((*inner).to_string(), table);
            map.insert((*outer).to_string(), Value::Object(nested));
        }
        _ => {}
    }
}

fn take_components(components: Value) -> Result<Map<String, Value>> {
    let mut components = expect_object(components, "/components")?;
    let schemas = match components.remove("schemas") {
        Some(schemas) => expect_object(schemas, "/components/schemas")?,
        None => Map::new(),
    };
    if let Some(key) = components.keys().next() {
        return Err(InterchangeError::malformed(
            "/components",
            format!("unsupported component '{}'", key),
        ));
    }
    Ok(schemas)
}

fn expect_object(value: Value, pointer: &str) -> Result<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(InterchangeError::malformed(pointer, "must be an object")),
    }
}

fn definitions_pointer(target: JsonSchemaTarget) -> String {
    target
        .definitions_path()
        .iter()
        .map(|segment| format!("/{}", escape_pointer(segment)))
        .collect()
}

/// Escape a JSON pointer segment.
fn escape_pointer(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// Unescape a JSON pointer segment. `None` for a raw `/` or a `~` not
/// followed by `0` or `1`.
fn unescape_pointer(segment: &str) -> Option<String> {
    let mut out = String::with_capacity(segment.len());
    let mut chars = segment.chars();
    while let Some(c) = chars.next() {
        match c {
            '~' => match chars.next()? {
                '0' => out.push('~'),
                '1' => out.push('/'),
                _ => return None,
            },
            '/' => return None,
            other => out.push(other),
        }
    }
    Some(out)
}

/// Wrap every reference between members of the same strongly connected
/// component of the definitions graph in a `Suspend`.
fn suspend_cycles(definitions: &mut Definitions) {
    let mut graph: DiGraph<String, ()> = DiGraph::new();
    let indices: HashMap<String, NodeIndex> = definitions
        .keys()
        .map(|name| (name.clone(), graph.add_node(name.clone())))
        .collect();
    for (name, node) in definitions.iter() {
        for target in node.references(false) {
            if let (Some(&from), Some(&to)) = (indices.get(name), indices.get(target)) {
                graph.update_edge(from, to, ());
            }
        }
    }

    let mut component: HashMap<String, usize> = HashMap::new();
    let mut cyclic: HashSet<usize> = HashSet::new();
    for (index, scc) in tarjan_scc(&graph).iter().enumerate() {
        let self_loop = scc.len() == 1 && graph.contains_edge(scc[0], scc[0]);
        if scc.len() > 1 || self_loop {
            cyclic.insert(index);
        }
        for member in scc {
            component.insert(graph[*member].clone(), index);
        }
    }

    for (name, node) in definitions.iter_mut() {
        let Some(&own) = component.get(name) else {
            continue;
        };
        if cyclic.contains(&own) {
            trace!(definition = %name, "Suspending cyclic references");
            suspend_references(node, &|target| component.get(target) == Some(&own));
        }
    }
}

fn suspend_references(node: &mut Node, in_cycle: &dyn Fn(&str) -> bool) {
    if let Some(target) = node.reference_target() {
        if in_cycle(target) {
            let reference = std::mem::replace(node, Node::new(NodeKind::Never));
            *node = Node::suspend(reference);
        }
        return;
    }
    if matches!(node.kind, NodeKind::Suspend { .. }) {
        return;
    }
    for child in node.children_mut() {
        suspend_references(child, in_cycle);
    }
}
