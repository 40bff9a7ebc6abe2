//! JSON Schema to Node.
//!
//! Decoding accepts the subset the encoder produces. It is built so that
//! re-encoding a decoded schema gives back the same JSON, even where the
//! original node cannot be recovered exactly (a template literal carrying a
//! title decodes as a string with a pattern check, for instance).

use serde_json::{Map, Value};

use schema_ast::{
    format_number, Annotations, Check, Element, EnumValue, Filter, FilterKind, IndexSignature,
    LiteralValue, Node, NodeKind, PropertySignature, SymbolKey, TemplatePart, UnionMode,
};

use super::keywords::{filter_from_keywords, CHECK_KEYWORDS};
use super::unescape_pointer;
use super::template::{parse_pattern, NUMBER_PATTERN};
use crate::config::JsonSchemaTarget;
use crate::error::{InterchangeError, Result};

/// Decodes JSON Schema values against one definitions table.
pub(crate) struct Decoder<'a> {
    target: JsonSchemaTarget,
    definitions: &'a Map<String, Value>,
}

impl<'a> Decoder<'a> {
    pub(crate) fn new(target: JsonSchemaTarget, definitions: &'a Map<String, Value>) -> Self {
        Self {
            target,
            definitions,
        }
    }

    pub(crate) fn decode(&self, value: &Value, pointer: &str) -> Result<Node> {
        let mut map = match value {
            Value::Object(map) => map.clone(),
            Value::Bool(true) => return Ok(Node::new(NodeKind::Any)),
            Value::Bool(false) => return Ok(Node::new(NodeKind::Never)),
            _ => return Err(InterchangeError::malformed(pointer, "schema must be an object")),
        };

        let all_of = map.remove("allOf");
        let title = take_string(&mut map, "title", pointer)?;
        let description = take_string(&mut map, "description", pointer)?;

        let mut annotations = Annotations::new();
        if let Some(default) = map.remove("default") {
            annotations.default = Some(default);
        }
        match map.remove("examples") {
            None => {}
            Some(Value::Array(examples)) => annotations.examples = examples,
            Some(_) => return Err(InterchangeError::malformed(pointer, "examples must be an array")),
        }

        // At most one check is merged into the primary schema; its keywords
        // sit next to the structural ones.
        let check_keywords = self.take_check_keywords(&mut map, title.is_some());
        let mut checks = Vec::new();
        if check_keywords.is_empty() {
            annotations.title = title;
            annotations.description = description;
        } else {
            let kind = filter_from_keywords(&check_keywords, pointer)?;
            let mut filter_annotations = Annotations::new();
            filter_annotations.title = title;
            filter_annotations.description = description;
            checks.push(Check::Filter(
                Filter::new(kind).with_annotations(filter_annotations),
            ));
        }

        match all_of {
            None => {}
            Some(Value::Array(entries)) => {
                for (index, entry) in entries.iter().enumerate() {
                    let entry_pointer = format!("{}/allOf/{}", pointer, index);
                    checks.push(decode_fragment(entry, &entry_pointer)?);
                }
            }
            Some(_) => return Err(InterchangeError::malformed(pointer, "allOf must be an array")),
        }

        let kind = self.decode_kind(&mut map, pointer)?;
        if let Some(key) = map.keys().next() {
            return Err(InterchangeError::malformed(
                pointer,
                format!("unsupported keyword '{}'", key),
            ));
        }

        Ok(Node {
            kind,
            checks,
            annotations,
        })
    }

    /// Remove and return the keywords of a merged check.
    fn take_check_keywords(&self, map: &mut Map<String, Value>, titled: bool) -> Map<String, Value> {
        let is_tuple =
            map.contains_key("prefixItems") || matches!(map.get("items"), Some(Value::Array(_)));
        let mut keywords = Map::new();
        for key in CHECK_KEYWORDS {
            if *key == "minItems" && is_tuple {
                continue;
            }
            if let Some(value) = map.get(*key) {
                keywords.insert(key.to_string(), value.clone());
            }
        }
        if map.get("type").and_then(Value::as_str) == Some("integer") {
            keywords.insert("type".into(), Value::from("integer"));
        }
        // Without a title, or next to other check keywords, a pattern
        // belongs to a template literal.
        if keywords.contains_key("pattern") && (!titled || keywords.len() > 1) {
            keywords.remove("pattern");
        }
        for key in keywords.keys() {
            map.remove(key);
        }
        keywords
    }

    fn decode_kind(&self, map: &mut Map<String, Value>, pointer: &str) -> Result<NodeKind> {
        if let Some(reference) = map.remove("$ref") {
            return self.decode_reference(&reference, pointer);
        }
        if let Some(not) = map.remove("not") {
            return match not.as_object() {
                Some(inner) if inner.is_empty() => Ok(NodeKind::Never),
                _ => Err(InterchangeError::malformed(pointer, "only {\"not\": {}} is supported")),
            };
        }
        for (keyword, mode) in [("anyOf", UnionMode::AnyOf), ("oneOf", UnionMode::OneOf)] {
            if let Some(members) = map.remove(keyword) {
                let Value::Array(members) = members else {
                    return Err(InterchangeError::malformed(pointer, format!("{} must be an array", keyword)));
                };
                let types = members
                    .iter()
                    .enumerate()
                    .map(|(i, member)| self.decode(member, &format!("{}/{}/{}", pointer, keyword, i)))
                    .collect::<Result<Vec<_>>>()?;
                return Ok(NodeKind::Union { types, mode });
            }
        }
        if let Some(values) = map.remove("enum") {
            map.remove("type");
            return decode_enum(&values, pointer);
        }

        let ty = map.remove("type");
        let kind = match ty {
            None => {
                if map.contains_key("const") {
                    return Err(InterchangeError::malformed(pointer, "const requires a type"));
                }
                NodeKind::Any
            }
            Some(Value::Array(types)) => {
                if types == [Value::from("object"), Value::from("array")] {
                    NodeKind::ObjectKeyword
                } else {
                    return Err(InterchangeError::malformed(pointer, "unsupported type list"));
                }
            }
            Some(Value::String(ty)) => match ty.as_str() {
                "null" => NodeKind::Null,
                "boolean" => match map.remove("const") {
                    None => NodeKind::Boolean,
                    Some(Value::Bool(b)) => literal(LiteralValue::Boolean(b)),
                    Some(_) => return Err(InterchangeError::malformed(pointer, "boolean const expected")),
                },
                "number" => match map.remove("const") {
                    None => NodeKind::Number,
                    Some(value) => match value.as_f64() {
                        Some(n) => literal(LiteralValue::Number(n)),
                        None => return Err(InterchangeError::malformed(pointer, "number const expected")),
                    },
                },
                "string" => self.decode_string(map, pointer)?,
                "array" => self.decode_arrays(map, pointer)?,
                "object" => self.decode_objects(map, pointer)?,
                other => {
                    return Err(InterchangeError::malformed(
                        pointer,
                        format!("unsupported type '{}'", other),
                    ))
                }
            },
            Some(_) => return Err(InterchangeError::malformed(pointer, "type must be a string")),
        };
        Ok(kind)
    }

    fn decode_reference(&self, reference: &Value, pointer: &str) -> Result<NodeKind> {
        let Some(reference) = reference.as_str() else {
            return Err(InterchangeError::malformed(pointer, "$ref must be a string"));
        };
        let target = reference
            .strip_prefix(self.target.ref_prefix())
            .and_then(unescape_pointer);
        let Some(target) = target else {
            return Err(InterchangeError::malformed(
                pointer,
                format!("unsupported $ref '{}'", reference),
            ));
        };
        if !self.definitions.contains_key(&target) {
            return Err(InterchangeError::malformed(
                pointer,
                format!("dangling $ref '{}'", reference),
            ));
        }
        Ok(NodeKind::Reference { target })
    }

    fn decode_string(&self, map: &mut Map<String, Value>, pointer: &str) -> Result<NodeKind> {
        let format = take_string(map, "format", pointer)?;
        let constant = map.remove("const");
        let pattern = take_string(map, "pattern", pointer)?;
        let kind = match (format.as_deref(), constant, pattern) {
            (None, None, None) => NodeKind::String,
            (None, Some(Value::String(s)), None) => literal(LiteralValue::String(s)),
            (Some("bigint"), None, None) => NodeKind::BigInt,
            (Some("bigint"), Some(Value::String(digits)), None) => {
                literal(LiteralValue::big_int(digits))
            }
            (Some("symbol"), None, None) => NodeKind::Symbol,
            (Some("symbol"), Some(Value::String(display)), None) => {
                let key = display
                    .strip_prefix("Symbol(")
                    .and_then(|rest| rest.strip_suffix(')'))
                    .ok_or_else(|| InterchangeError::malformed(pointer, "symbol const must read Symbol(key)"))?;
                NodeKind::UniqueSymbol {
                    symbol: SymbolKey::registered(key),
                }
            }
            (None, None, Some(pattern)) => match parse_pattern(&pattern) {
                Some(parts) => NodeKind::TemplateLiteral { parts },
                None => {
                    return Err(InterchangeError::malformed(
                        pointer,
                        format!("pattern '{}' is not a template literal", pattern),
                    ))
                }
            },
            _ => {
                return Err(InterchangeError::malformed(
                    pointer,
                    "unsupported string keyword combination",
                ))
            }
        };
        Ok(kind)
    }

    fn decode_arrays(&self, map: &mut Map<String, Value>, pointer: &str) -> Result<NodeKind> {
        let (items_list, rest_value) = if self.target.uses_prefix_items() {
            match map.remove("prefixItems") {
                Some(Value::Array(items)) => (items, map.remove("items")),
                Some(_) => return Err(InterchangeError::malformed(pointer, "prefixItems must be an array")),
                None => (Vec::new(), map.remove("items")),
            }
        } else {
            match map.remove("items") {
                Some(Value::Array(items)) => (items, map.remove("additionalItems")),
                other => (Vec::new(), other),
            }
        };

        let required = if items_list.is_empty() {
            0
        } else {
            match map.remove("minItems") {
                Some(value) => value
                    .as_u64()
                    .ok_or_else(|| InterchangeError::malformed(pointer, "minItems must be an integer"))?
                    as usize,
                None => items_list.len(),
            }
        };

        let elements = items_list
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let ty = self.decode(item, &format!("{}/prefixItems/{}", pointer, i))?;
                Ok(Element {
                    ty,
                    is_optional: i >= required,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let rest = match rest_value {
            None => vec![Node::new(NodeKind::Any)],
            Some(Value::Bool(false)) => Vec::new(),
            Some(value) => vec![self.decode(&value, &format!("{}/items", pointer))?],
        };
        Ok(NodeKind::Arrays { elements, rest })
    }

    fn decode_objects(&self, map: &mut Map<String, Value>, pointer: &str) -> Result<NodeKind> {
        let required: Vec<String> = match map.remove("required") {
            None => Vec::new(),
            Some(Value::Array(names)) => names
                .into_iter()
                .map(|name| match name {
                    Value::String(name) => Ok(name),
                    _ => Err(InterchangeError::malformed(pointer, "required must list strings")),
                })
                .collect::<Result<Vec<_>>>()?,
            Some(_) => return Err(InterchangeError::malformed(pointer, "required must be an array")),
        };

        let mut property_signatures = Vec::new();
        match map.remove("properties") {
            None => {}
            Some(Value::Object(properties)) => {
                for (name, value) in &properties {
                    let ty = self.decode(value, &format!("{}/properties/{}", pointer, name))?;
                    let mut ps = PropertySignature::new(name.as_str(), ty);
                    ps.is_optional = !required.contains(name);
                    property_signatures.push(ps);
                }
            }
            Some(_) => return Err(InterchangeError::malformed(pointer, "properties must be an object")),
        }

        let mut index_signatures = Vec::new();
        match map.remove("patternProperties") {
            None => {}
            Some(Value::Object(patterns)) => {
                for (pattern, value) in &patterns {
                    let ty = self.decode(value, &format!("{}/patternProperties/{}", pointer, pattern))?;
                    index_signatures.push(IndexSignature::new(pattern_key(pattern), ty));
                }
            }
            Some(_) => {
                return Err(InterchangeError::malformed(
                    pointer,
                    "patternProperties must be an object",
                ))
            }
        }

        match map.remove("additionalProperties") {
            None | Some(Value::Bool(false)) => {}
            Some(value) => {
                let ty = self.decode(&value, &format!("{}/additionalProperties", pointer))?;
                index_signatures.push(IndexSignature::new(Node::new(NodeKind::String), ty));
            }
        }

        Ok(NodeKind::Objects {
            property_signatures,
            index_signatures,
        })
    }
}

/// Decode one `allOf` entry into a check.
fn decode_fragment(entry: &Value, pointer: &str) -> Result<Check> {
    let Value::Object(entry) = entry else {
        return Err(InterchangeError::malformed(pointer, "allOf entries must be objects"));
    };
    let mut keywords = entry.clone();
    let title = take_string(&mut keywords, "title", pointer)?;
    let description = take_string(&mut keywords, "description", pointer)?;
    let kind = filter_from_keywords(&keywords, pointer)?;
    let mut annotations = Annotations::new();
    annotations.title = title;
    annotations.description = description;
    Ok(Check::Filter(Filter::new(kind).with_annotations(annotations)))
}

fn decode_enum(values: &Value, pointer: &str) -> Result<NodeKind> {
    let Value::Array(values) = values else {
        return Err(InterchangeError::malformed(pointer, "enum must be an array"));
    };
    let enums = values
        .iter()
        .map(|value| match value {
            Value::String(s) => Ok((s.clone(), EnumValue::String(s.clone()))),
            Value::Number(n) => {
                let n = n.as_f64().unwrap_or_default();
                Ok((format_number(n), EnumValue::Number(n)))
            }
            _ => Err(InterchangeError::malformed(pointer, "enum values must be strings or numbers")),
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(NodeKind::Enum { enums })
}

/// Key node for a `patternProperties` entry.
fn pattern_key(pattern: &str) -> Node {
    if pattern == format!("^{}$", NUMBER_PATTERN) {
        return Node::new(NodeKind::Number);
    }
    if let Some(parts) = parse_pattern(pattern) {
        if parts.iter().any(|part| matches!(part, TemplatePart::Schema { .. })) {
            return Node::new(NodeKind::TemplateLiteral { parts });
        }
    }
    Node::new(NodeKind::String).with_checks(vec![Check::Filter(Filter::new(
        FilterKind::Pattern(pattern.to_string()),
    ))])
}

fn literal(literal: LiteralValue) -> NodeKind {
    NodeKind::Literal { literal }
}

fn take_string(map: &mut Map<String, Value>, key: &str, pointer: &str) -> Result<Option<String>> {
    match map.remove(key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(InterchangeError::malformed(
            pointer,
            format!("{} must be a string", key),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(value: Value) -> Result<Node> {
        let definitions = Map::new();
        Decoder::new(JsonSchemaTarget::Draft2020_12, &definitions).decode(&value, "")
    }

    #[test]
    fn test_first_check_takes_top_level_title() {
        let node = decode(json!({
            "type": "string",
            "minLength": 1,
            "title": "isMinLength(1)",
            "allOf": [{"minLength": 2, "title": "isMinLength(2)"}]
        }))
        .unwrap();
        assert_eq!(node.kind, NodeKind::String);
        assert!(node.annotations.is_empty());
        assert_eq!(node.checks.len(), 2);
        let Check::Filter(first) = &node.checks[0] else {
            panic!("expected filter");
        };
        assert_eq!(first.kind, FilterKind::MinLength(1));
        assert_eq!(first.annotations.title.as_deref(), Some("isMinLength(1)"));
    }

    #[test]
    fn test_title_without_checks_is_annotation() {
        let node = decode(json!({"type": "number", "title": "Age"})).unwrap();
        assert_eq!(node.annotations.title.as_deref(), Some("Age"));
        assert!(node.checks.is_empty());
    }

    #[test]
    fn test_untitled_pattern_is_template() {
        let node = decode(json!({"type": "string", "pattern": "^a[\\s\\S]*$"})).unwrap();
        assert!(matches!(node.kind, NodeKind::TemplateLiteral { .. }));
    }

    #[test]
    fn test_dangling_ref_is_malformed() {
        let error = decode(json!({"$ref": "#/$defs/Missing"})).unwrap_err();
        assert!(matches!(error, InterchangeError::MalformedJsonSchema { .. }));
    }

    #[test]
    fn test_unknown_keyword_is_malformed() {
        let error = decode(json!({"type": "string", "contentEncoding": "base64"})).unwrap_err();
        let InterchangeError::MalformedJsonSchema { reason, .. } = error else {
            panic!("expected MalformedJsonSchema");
        };
        assert!(reason.contains("contentEncoding"));
    }

    #[test]
    fn test_tuple_min_items_marks_optional() {
        let node = decode(json!({
            "type": "array",
            "prefixItems": [{"type": "string"}, {"type": "number"}],
            "items": false,
            "minItems": 1
        }))
        .unwrap();
        let NodeKind::Arrays { elements, rest } = node.kind else {
            panic!("expected arrays");
        };
        assert!(!elements[0].is_optional);
        assert!(elements[1].is_optional);
        assert!(rest.is_empty());
    }

    #[test]
    fn test_lookaround_patterns_are_kept() {
        let node = decode(json!({
            "type": "string",
            "pattern": "^(?!admin).*$",
            "title": "isPattern(^(?!admin).*$)"
        }))
        .unwrap();
        let Check::Filter(filter) = &node.checks[0] else {
            panic!("expected filter");
        };
        assert_eq!(filter.kind, FilterKind::Pattern("^(?!admin).*$".into()));

        let node = decode(json!({
            "type": "object",
            "patternProperties": {"^(a)\\1$": {"type": "number"}},
            "additionalProperties": false
        }))
        .unwrap();
        let NodeKind::Objects { index_signatures, .. } = node.kind else {
            panic!("expected objects");
        };
        assert_eq!(
            index_signatures[0].parameter.checks,
            vec![Check::Filter(Filter::new(FilterKind::Pattern("^(a)\\1$".into())))]
        );
    }
}
