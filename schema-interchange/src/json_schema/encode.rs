//! Node to JSON Schema.

use serde_json::{json, Map, Value};
use tracing::{debug, trace, warn};

use schema_ast::{
    number_to_json, Annotations, Check, Element, EnumValue, IndexSignature, LiteralValue, Node,
    NodeKind, PropertyKey, PropertySignature, UnionMode,
};

use super::keywords::filter_fragment;
use super::reference_value;
use super::template::{template_pattern, NUMBER_PATTERN};
use crate::config::JsonSchemaTarget;

/// Encodes document nodes for one target dialect.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Encoder {
    target: JsonSchemaTarget,
}

impl Encoder {
    pub(crate) fn new(target: JsonSchemaTarget) -> Self {
        Self { target }
    }

    /// Encode a node: its shape, then its annotations, then its checks.
    pub(crate) fn encode(&self, node: &Node) -> Value {
        let mut schema = self.encode_kind(&node.kind);
        apply_annotations(&mut schema, &node.annotations);
        apply_checks(&mut schema, &node.checks);
        Value::Object(schema)
    }

    fn encode_kind(&self, kind: &NodeKind) -> Map<String, Value> {
        match kind {
            NodeKind::Never | NodeKind::Undefined => object(json!({"not": {}})),
            NodeKind::Any | NodeKind::Unknown | NodeKind::Void => Map::new(),
            NodeKind::Null => object(json!({"type": "null"})),
            NodeKind::Boolean => object(json!({"type": "boolean"})),
            NodeKind::String => object(json!({"type": "string"})),
            NodeKind::Number => object(json!({"type": "number"})),
            NodeKind::BigInt => object(json!({"type": "string", "format": "bigint"})),
            NodeKind::Symbol => object(json!({"type": "string", "format": "symbol"})),
            NodeKind::ObjectKeyword => object(json!({"type": ["object", "array"]})),
            NodeKind::Literal { literal } => encode_literal(literal),
            NodeKind::UniqueSymbol { symbol } => object(json!({
                "type": "string",
                "format": "symbol",
                "const": symbol.display(),
            })),
            NodeKind::Enum { enums } => encode_enum(enums),
            NodeKind::TemplateLiteral { parts } => object(json!({
                "type": "string",
                "pattern": template_pattern(parts),
            })),
            NodeKind::Arrays { elements, rest } => self.encode_arrays(elements, rest),
            NodeKind::Objects {
                property_signatures,
                index_signatures,
            } => self.encode_objects(property_signatures, index_signatures),
            NodeKind::Union { types, mode } => {
                if types.is_empty() {
                    return object(json!({"not": {}}));
                }
                let keyword = match mode {
                    UnionMode::AnyOf => "anyOf",
                    UnionMode::OneOf => "oneOf",
                };
                let members: Vec<Value> = types.iter().map(|ty| self.encode(ty)).collect();
                let mut map = Map::new();
                map.insert(keyword.into(), Value::Array(members));
                map
            }
            NodeKind::Suspend { thunk } => object(self.encode(thunk)),
            NodeKind::Reference { target } => object(reference_value(self.target, target)),
            NodeKind::Declaration { encoded, .. } => match encoded {
                Some(encoded) => object(self.encode(encoded)),
                None => {
                    debug!("Declaration without an encoded form; accepting anything");
                    Map::new()
                }
            },
        }
    }

    // =========================================================================
    // Arrays
    // =========================================================================

    fn encode_arrays(&self, elements: &[Element<Node>], rest: &[Node]) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("type".into(), json!("array"));

        let items: Vec<Value> = elements.iter().map(|e| self.encode(&e.ty)).collect();
        let rest_schema = match rest {
            [] => None,
            [only] => Some(self.encode(only)),
            // Elements after the rest element widen the item type.
            many => Some(json!({
                "anyOf": many.iter().map(|ty| self.encode(ty)).collect::<Vec<_>>()
            })),
        };
        let rest_value = rest_schema.unwrap_or(Value::Bool(false));

        if elements.is_empty() {
            map.insert("items".into(), rest_value);
            return map;
        }

        if self.target.uses_prefix_items() {
            map.insert("prefixItems".into(), Value::Array(items));
            map.insert("items".into(), rest_value);
        } else {
            map.insert("items".into(), Value::Array(items));
            map.insert("additionalItems".into(), rest_value);
        }
        let required = elements.iter().filter(|e| !e.is_optional).count();
        map.insert("minItems".into(), json!(required));
        map
    }

    // =========================================================================
    // Objects
    // =========================================================================

    fn encode_objects(
        &self,
        property_signatures: &[PropertySignature<Node>],
        index_signatures: &[IndexSignature<Node>],
    ) -> Map<String, Value> {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for ps in property_signatures {
            let key = json_property_name(&ps.name);
            let mut value = object(self.encode(&ps.ty));
            apply_annotations(&mut value, &ps.annotations);
            properties.insert(key.clone(), Value::Object(value));
            if !ps.is_optional {
                required.push(Value::String(key));
            }
        }

        let mut additional: Option<Value> = None;
        let mut patterns = Map::new();
        for is in index_signatures {
            let value = self.encode(&is.ty);
            match index_key(&is.parameter) {
                IndexKey::Any => {
                    additional = Some(match additional {
                        None => value,
                        Some(previous) => json!({"anyOf": [previous, value]}),
                    });
                }
                IndexKey::Pattern(pattern) => {
                    patterns.insert(pattern, value);
                }
                IndexKey::Literals(keys) => {
                    for key in keys {
                        if !properties.contains_key(&key) {
                            required.push(Value::String(key.clone()));
                        }
                        properties.insert(key, value.clone());
                    }
                }
                IndexKey::Skip => {
                    warn!("Symbol index signature has no JSON Schema image; skipping");
                }
            }
        }

        let mut map = Map::new();
        map.insert("type".into(), json!("object"));
        if !properties.is_empty() {
            map.insert("properties".into(), Value::Object(properties));
        }
        if !required.is_empty() {
            map.insert("required".into(), Value::Array(required));
        }
        if !patterns.is_empty() {
            map.insert("patternProperties".into(), Value::Object(patterns));
        }
        map.insert(
            "additionalProperties".into(),
            additional.unwrap_or(Value::Bool(false)),
        );
        map
    }
}

/// JSON object key for a property. Symbol keys fall back to their display
/// form, which decodes as a plain string key.
fn json_property_name(name: &PropertyKey) -> String {
    match name {
        PropertyKey::Symbol { symbol } => {
            warn!(symbol = %symbol.display(), "Symbol-keyed property encoded under its display name");
            symbol.display()
        }
        _ => name.as_json_key().unwrap_or_default(),
    }
}

/// How an index signature's key constrains property names.
enum IndexKey {
    /// Any string key
    Any,
    /// Keys matching a pattern
    Pattern(String),
    /// A finite set of keys
    Literals(Vec<String>),
    /// Keys with no JSON image (symbols)
    Skip,
}

fn index_key(parameter: &Node) -> IndexKey {
    match &parameter.kind {
        NodeKind::String => {
            let pattern = parameter.checks.iter().flat_map(Check::filters).find_map(|f| {
                match &f.kind {
                    schema_ast::FilterKind::Pattern(p) => Some(p.clone()),
                    _ => None,
                }
            });
            match pattern {
                Some(pattern) => IndexKey::Pattern(pattern),
                None => IndexKey::Any,
            }
        }
        NodeKind::Number => IndexKey::Pattern(format!("^{}$", NUMBER_PATTERN)),
        NodeKind::TemplateLiteral { parts } => IndexKey::Pattern(template_pattern(parts)),
        NodeKind::Symbol | NodeKind::UniqueSymbol { .. } => IndexKey::Skip,
        NodeKind::Literal { literal } => match literal_key(literal) {
            Some(key) => IndexKey::Literals(vec![key]),
            None => IndexKey::Any,
        },
        NodeKind::Union { types, .. } => {
            let keys: Option<Vec<String>> = types
                .iter()
                .map(|ty| match &ty.kind {
                    NodeKind::Literal { literal } => literal_key(literal),
                    _ => None,
                })
                .collect();
            match keys {
                Some(keys) => IndexKey::Literals(keys),
                None => IndexKey::Any,
            }
        }
        NodeKind::Suspend { thunk } => index_key(thunk),
        _ => IndexKey::Any,
    }
}

fn literal_key(literal: &LiteralValue) -> Option<String> {
    match literal {
        LiteralValue::String(s) => Some(s.clone()),
        LiteralValue::Number(n) => Some(schema_ast::format_number(*n)),
        _ => None,
    }
}

fn encode_literal(literal: &LiteralValue) -> Map<String, Value> {
    match literal {
        LiteralValue::Null => object(json!({"type": "null"})),
        LiteralValue::Boolean(b) => object(json!({"type": "boolean", "const": b})),
        LiteralValue::Number(n) => object(json!({"type": "number", "const": number_to_json(*n)})),
        LiteralValue::String(s) => object(json!({"type": "string", "const": s})),
        LiteralValue::BigInt { digits } => object(json!({
            "type": "string",
            "format": "bigint",
            "const": digits,
        })),
    }
}

fn encode_enum(enums: &[(String, EnumValue)]) -> Map<String, Value> {
    let values: Vec<Value> = enums.iter().map(|(_, value)| value.to_json()).collect();
    let mut map = Map::new();
    if !enums.is_empty() {
        if enums.iter().all(|(_, v)| matches!(v, EnumValue::String(_))) {
            map.insert("type".into(), json!("string"));
        } else if enums.iter().all(|(_, v)| matches!(v, EnumValue::Number(_))) {
            map.insert("type".into(), json!("number"));
        }
    }
    map.insert("enum".into(), Value::Array(values));
    map
}

// =============================================================================
// Annotations and checks
// =============================================================================

/// Overlay the JSON Schema annotation keywords.
fn apply_annotations(schema: &mut Map<String, Value>, annotations: &Annotations) {
    if let Some(title) = &annotations.title {
        schema.insert("title".into(), json!(title));
    }
    if let Some(description) = &annotations.description {
        schema.insert("description".into(), json!(description));
    }
    if let Some(default) = &annotations.default {
        schema.insert("default".into(), default.clone());
    }
    if !annotations.examples.is_empty() {
        schema.insert("examples".into(), Value::Array(annotations.examples.clone()));
    }
}

/// Apply checks in declaration order with the ordered-intersection policy:
/// a fragment merges into the schema only when none of its keys is present
/// yet; otherwise it is appended to `allOf`.
fn apply_checks(schema: &mut Map<String, Value>, checks: &[Check]) {
    for filter in checks.iter().flat_map(Check::filters) {
        let Some(fragment) = filter_fragment(filter) else {
            debug!(filter = %filter.kind.name(), "Filter has no JSON Schema image; skipping");
            continue;
        };
        if fragment.keys().any(|key| schema.contains_key(key)) {
            trace!(filter = %filter.kind.name(), "Check conflicts; appending to allOf");
            let all_of = schema
                .entry("allOf")
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(entries) = all_of {
                entries.push(Value::Object(fragment));
            }
        } else {
            schema.extend(fragment);
        }
    }
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schema_ast::{filters, SymbolKey};

    fn encode(node: &Node) -> Value {
        Encoder::new(JsonSchemaTarget::Draft2020_12).encode(node)
    }

    #[test]
    fn test_conflicting_checks_go_to_all_of() {
        let node = Node::new(NodeKind::String)
            .with_checks(vec![filters::min_length(1), filters::min_length(2)]);
        assert_eq!(
            encode(&node),
            json!({
                "type": "string",
                "minLength": 1,
                "title": "isMinLength(1)",
                "allOf": [{"minLength": 2, "title": "isMinLength(2)"}]
            })
        );
    }

    #[test]
    fn test_int_nests_under_number() {
        let node = Node::new(NodeKind::Number).with_checks(vec![filters::int()]);
        assert_eq!(
            encode(&node),
            json!({"type": "number", "allOf": [{"type": "integer", "title": "isInt"}]})
        );
    }

    #[test]
    fn test_tuple_with_optional_and_rest() {
        let node = Node::new(NodeKind::Arrays {
            elements: vec![
                Element::required(Node::new(NodeKind::String)),
                Element::optional(Node::new(NodeKind::Number)),
            ],
            rest: vec![Node::new(NodeKind::Boolean)],
        });
        assert_eq!(
            encode(&node),
            json!({
                "type": "array",
                "prefixItems": [{"type": "string"}, {"type": "number"}],
                "items": {"type": "boolean"},
                "minItems": 1
            })
        );
        let draft07 = Encoder::new(JsonSchemaTarget::Draft07).encode(&node);
        assert_eq!(draft07["items"], json!([{"type": "string"}, {"type": "number"}]));
        assert_eq!(draft07["additionalItems"], json!({"type": "boolean"}));
    }

    #[test]
    fn test_record_with_literal_keys() {
        let keys = Node::new(NodeKind::Union {
            types: vec![
                Node::new(NodeKind::Literal {
                    literal: LiteralValue::from("a"),
                }),
                Node::new(NodeKind::Literal {
                    literal: LiteralValue::from("b"),
                }),
            ],
            mode: UnionMode::AnyOf,
        });
        let node = Node::new(NodeKind::Objects {
            property_signatures: Vec::new(),
            index_signatures: vec![IndexSignature::new(keys, Node::new(NodeKind::Number))],
        });
        assert_eq!(
            encode(&node),
            json!({
                "type": "object",
                "properties": {"a": {"type": "number"}, "b": {"type": "number"}},
                "required": ["a", "b"],
                "additionalProperties": false
            })
        );
    }

    #[test]
    fn test_property_annotations_override() {
        let node = Node::new(NodeKind::Objects {
            property_signatures: vec![PropertySignature::new(
                "name",
                Node::new(NodeKind::String)
                    .with_annotations(Annotations::new().with_title("inner")),
            )
            .optional()
            .annotate(Annotations::new().with_title("outer"))],
            index_signatures: vec![IndexSignature::new(
                Node::new(NodeKind::String),
                Node::new(NodeKind::Boolean),
            )],
        });
        assert_eq!(
            encode(&node),
            json!({
                "type": "object",
                "properties": {"name": {"type": "string", "title": "outer"}},
                "additionalProperties": {"type": "boolean"}
            })
        );
    }

    #[test]
    fn test_symbol_property_uses_display_name() {
        let node = Node::new(NodeKind::Objects {
            property_signatures: vec![
                PropertySignature::new(
                    PropertyKey::symbol(SymbolKey::registered("app/id")),
                    Node::new(NodeKind::String),
                ),
                PropertySignature::new("n", Node::new(NodeKind::Number)),
            ],
            index_signatures: Vec::new(),
        });
        assert_eq!(
            encode(&node),
            json!({
                "type": "object",
                "properties": {
                    "Symbol(app/id)": {"type": "string"},
                    "n": {"type": "number"}
                },
                "required": ["Symbol(app/id)", "n"],
                "additionalProperties": false
            })
        );
    }
}
