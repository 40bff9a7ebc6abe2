//! Node to builder expression.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::warn;

use schema_ast::{
    format_number, Annotations, Check, Element, Filter, FilterKind, IndexSignature, LiteralValue,
    Node, NodeKind, PropertyKey, PropertySignature, SymbolKey, TemplatePart, UnionMode,
};

use crate::config::RenderOptions;
use crate::error::{InterchangeError, Result};
use crate::naming::sanitize_binding;

/// Renders nodes as chained builder calls under the configured namespace.
pub(crate) struct Emitter<'a> {
    options: &'a RenderOptions,
    bindings: &'a IndexMap<String, String>,
    declared: HashSet<String>,
    lossy: Vec<String>,
    path: Vec<String>,
    lazy: usize,
}

impl<'a> Emitter<'a> {
    pub(crate) fn new(options: &'a RenderOptions, bindings: &'a IndexMap<String, String>) -> Self {
        Self {
            options,
            bindings,
            declared: HashSet::new(),
            lossy: Vec::new(),
            path: Vec::new(),
            lazy: 0,
        }
    }

    /// Render one top-level expression. `path` prefixes error and lossy
    /// locations.
    pub(crate) fn emit(&mut self, node: &Node, path: Vec<String>) -> Result<String> {
        self.path = path;
        self.lazy = 0;
        self.render(node)
    }

    /// Mark a definition's binding as declared; later references to it are
    /// rendered eagerly.
    pub(crate) fn declare(&mut self, identifier: &str) {
        self.declared.insert(identifier.to_string());
    }

    pub(crate) fn into_lossy(self) -> Vec<String> {
        self.lossy
    }

    fn ns(&self) -> &'a str {
        let options: &'a RenderOptions = self.options;
        &options.namespace
    }

    fn render(&mut self, node: &Node) -> Result<String> {
        if let Some(reviver) = &self.options.reviver {
            if let Some(text) = reviver.revive(node) {
                return Ok(text);
            }
        }
        let mut out = self.render_kind(node)?;
        if !node.annotations.is_empty() {
            out.push_str(&format!(".annotate({})", annotations_literal(&node.annotations)));
        }
        for check in &node.checks {
            out.push_str(&format!(".check({})", self.render_check(check)));
        }
        Ok(out)
    }

    fn render_kind(&mut self, node: &Node) -> Result<String> {
        let ns = self.ns();
        let out = match &node.kind {
            NodeKind::Never => format!("{}.Never", ns),
            NodeKind::Any => format!("{}.Any", ns),
            NodeKind::Unknown => format!("{}.Unknown", ns),
            NodeKind::Void => format!("{}.Void", ns),
            NodeKind::Undefined => format!("{}.Undefined", ns),
            NodeKind::Null => format!("{}.Null", ns),
            NodeKind::Boolean => format!("{}.Boolean", ns),
            NodeKind::String => format!("{}.String", ns),
            NodeKind::Number => format!("{}.Number", ns),
            NodeKind::BigInt => format!("{}.BigInt", ns),
            NodeKind::Symbol => format!("{}.Symbol", ns),
            NodeKind::ObjectKeyword => format!("{}.ObjectKeyword", ns),
            NodeKind::Literal { literal } => format!("{}.Literal({})", ns, render_literal(literal)),
            NodeKind::UniqueSymbol { symbol } => {
                format!("{}.UniqueSymbol({})", ns, self.render_symbol(symbol)?)
            }
            NodeKind::Enum { enums } => {
                let entries: Vec<String> = enums
                    .iter()
                    .map(|(name, value)| format!("{}: {}", object_key(name), value.to_json()))
                    .collect();
                format!("{}.Enum({})", ns, braced(&entries))
            }
            NodeKind::TemplateLiteral { parts } => {
                let parts = self.render_template(parts)?;
                format!("{}.TemplateLiteral([{}])", ns, parts.join(", "))
            }
            NodeKind::Arrays { elements, rest } => self.render_arrays(elements, rest)?,
            NodeKind::Objects {
                property_signatures,
                index_signatures,
            } => self.render_objects(property_signatures, index_signatures)?,
            NodeKind::Union { types, mode } => {
                let members = self.render_indexed("anyOf", types)?;
                match mode {
                    UnionMode::AnyOf => format!("{}.Union([{}])", ns, members.join(", ")),
                    UnionMode::OneOf => {
                        format!("{}.Union([{}], {{ mode: \"oneOf\" }})", ns, members.join(", "))
                    }
                }
            }
            NodeKind::Suspend { thunk } => {
                self.lazy += 1;
                let inner = self.render_at("suspend", thunk);
                self.lazy -= 1;
                format!("{}.suspend(() => {})", ns, inner?)
            }
            NodeKind::Reference { target } => {
                let binding = self
                    .bindings
                    .get(target)
                    .cloned()
                    .unwrap_or_else(|| sanitize_binding(target));
                if self.lazy > 0 || self.declared.contains(target) {
                    binding
                } else {
                    // Forward or self reference: the binding is not initialised yet.
                    format!("{}.suspend(() => {})", ns, binding)
                }
            }
            NodeKind::Declaration {
                type_parameters, ..
            } => {
                let params = self.render_indexed("typeParameters", type_parameters)?;
                match &node.annotations.constructor {
                    Some(constructor) if params.is_empty() => format!("{}.{}", ns, constructor),
                    Some(constructor) => {
                        format!("{}.{}({})", ns, constructor, params.join(", "))
                    }
                    None => {
                        let location = format_path(&self.path);
                        warn!(path = %location, "Declaration without a constructor rendered as Any");
                        self.lossy.push(location);
                        format!("{}.Any", ns)
                    }
                }
            }
        };
        Ok(out)
    }

    // =========================================================================
    // Children
    // =========================================================================

    fn render_at(&mut self, segment: &str, node: &Node) -> Result<String> {
        self.path.push(segment.to_string());
        let out = self.render(node);
        self.path.pop();
        out
    }

    fn render_indexed(&mut self, segment: &str, nodes: &[Node]) -> Result<Vec<String>> {
        self.path.push(segment.to_string());
        let out = nodes
            .iter()
            .enumerate()
            .map(|(index, node)| self.render_at(&index.to_string(), node))
            .collect::<Result<Vec<_>>>();
        self.path.pop();
        out
    }

    fn render_template(&mut self, parts: &[TemplatePart<Node>]) -> Result<Vec<String>> {
        self.path.push("parts".to_string());
        let out = parts
            .iter()
            .enumerate()
            .map(|(index, part)| match part {
                TemplatePart::Text { text } => Ok(quote(text)),
                TemplatePart::Schema { schema } => self.render_at(&index.to_string(), schema),
            })
            .collect::<Result<Vec<_>>>();
        self.path.pop();
        out
    }

    fn render_arrays(&mut self, elements: &[Element<Node>], rest: &[Node]) -> Result<String> {
        let ns = self.ns();
        self.path.push("elements".to_string());
        let items = elements
            .iter()
            .enumerate()
            .map(|(index, element)| {
                let ty = self.render_at(&index.to_string(), &element.ty)?;
                Ok(if element.is_optional {
                    format!("{}.optionalElement({})", ns, ty)
                } else {
                    ty
                })
            })
            .collect::<Result<Vec<_>>>();
        self.path.pop();
        let items = items?;
        let rest_items = self.render_indexed("rest", rest)?;

        let out = match (items.is_empty(), rest_items.as_slice()) {
            (true, [only]) => format!("{}.Array({})", ns, only),
            (_, []) => format!("{}.Tuple([{}])", ns, items.join(", ")),
            _ => format!(
                "{}.TupleWithRest({}.Tuple([{}]), [{}])",
                ns,
                ns,
                items.join(", "),
                rest_items.join(", ")
            ),
        };
        Ok(out)
    }

    fn render_objects(
        &mut self,
        properties: &[PropertySignature<Node>],
        signatures: &[IndexSignature<Node>],
    ) -> Result<String> {
        let ns = self.ns();
        let fields = properties
            .iter()
            .map(|ps| {
                let key = self.render_key(&ps.name)?;
                let mut value = self.render_at(&key_segment(&ps.name), &ps.ty)?;
                if ps.is_mutable {
                    value = format!("{}.mutableKey({})", ns, value);
                }
                if ps.is_optional {
                    value = format!("{}.optionalKey({})", ns, value);
                }
                if !ps.annotations.is_empty() {
                    value.push_str(&format!(".annotateKey({})", annotations_literal(&ps.annotations)));
                }
                Ok(format!("{}: {}", key, value))
            })
            .collect::<Result<Vec<_>>>()?;

        let records = signatures
            .iter()
            .map(|is| {
                let key = self.render_at("[key]", &is.parameter)?;
                let mut value = self.render_at("[value]", &is.ty)?;
                if is.is_mutable {
                    value = format!("{}.mutableKey({})", ns, value);
                }
                Ok(format!("{}.Record({}, {})", ns, key, value))
            })
            .collect::<Result<Vec<_>>>()?;

        let structure = format!("{}.Struct({})", ns, braced(&fields));
        let out = match records.as_slice() {
            [] => structure,
            [only] if fields.is_empty() => only.clone(),
            _ => format!("{}.StructWithRest({}, [{}])", ns, structure, records.join(", ")),
        };
        Ok(out)
    }

    fn render_key(&self, key: &PropertyKey) -> Result<String> {
        match key {
            PropertyKey::String(s) => Ok(quote(s)),
            PropertyKey::Number(n) => Ok(quote(&format_number(*n))),
            PropertyKey::Symbol { symbol } => Ok(format!("[{}]", self.render_symbol(symbol)?)),
        }
    }

    fn render_symbol(&self, symbol: &SymbolKey) -> Result<String> {
        match &symbol.key {
            Some(key) => Ok(format!("Symbol.for({})", quote(key))),
            None => Err(InterchangeError::UnrepresentableSymbol {
                path: self.path.clone(),
                symbol: symbol.display(),
            }),
        }
    }

    // =========================================================================
    // Checks
    // =========================================================================

    fn render_check(&self, check: &Check) -> String {
        match check {
            Check::Filter(filter) => self.render_filter(filter),
            Check::FilterGroup(group) => {
                let members: Vec<String> =
                    group.checks.iter().map(|c| self.render_check(c)).collect();
                let mut args = vec![format!("[{}]", members.join(", "))];
                if !group.annotations.is_empty() {
                    args.push(annotations_literal(&group.annotations));
                }
                format!("{}.makeFilterGroup({})", self.ns(), args.join(", "))
            }
        }
    }

    fn render_filter(&self, filter: &Filter) -> String {
        let (callee, mut args) = match &filter.kind {
            FilterKind::Custom { name, params } => {
                let mut args = vec![quote(name)];
                if !params.is_null() {
                    args.push(params.to_string());
                }
                ("makeFilter", args)
            }
            kind => (kind.name(), filter_args(kind)),
        };
        if !filter.annotations.is_empty() {
            args.push(annotations_literal(&filter.annotations));
        }
        format!("{}.{}({})", self.ns(), callee, args.join(", "))
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn filter_args(kind: &FilterKind) -> Vec<String> {
    match kind {
        FilterKind::Pattern(pattern) => vec![format!("new RegExp({})", quote(pattern))],
        FilterKind::StartsWith(s) | FilterKind::EndsWith(s) | FilterKind::Includes(s) => {
            vec![quote(s)]
        }
        FilterKind::GreaterThanBigInt(digits)
        | FilterKind::GreaterThanOrEqualToBigInt(digits)
        | FilterKind::LessThanBigInt(digits)
        | FilterKind::LessThanOrEqualToBigInt(digits) => vec![format!("{}n", digits)],
        other => other.display_params(),
    }
}

fn render_literal(literal: &LiteralValue) -> String {
    match literal {
        LiteralValue::Null => "null".to_string(),
        LiteralValue::Boolean(b) => b.to_string(),
        LiteralValue::Number(n) => format_number(*n),
        LiteralValue::String(s) => quote(s),
        LiteralValue::BigInt { digits } => format!("{}n", digits),
    }
}

/// Object literal holding every set annotation, e.g. `{ title: "Age" }`.
fn annotations_literal(annotations: &Annotations) -> String {
    let entries: Vec<String> = annotations
        .to_json_map()
        .iter()
        .map(|(key, value)| format!("{}: {}", object_key(key), render_value(value)))
        .collect();
    braced(&entries)
}

fn render_value(value: &Value) -> String {
    value.to_string()
}

fn braced(entries: &[String]) -> String {
    if entries.is_empty() {
        "{}".to_string()
    } else {
        format!("{{ {} }}", entries.join(", "))
    }
}

/// Bare key when it is a plain identifier, quoted otherwise.
fn object_key(key: &str) -> String {
    let plain = key
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if plain {
        key.to_string()
    } else {
        quote(key)
    }
}

fn key_segment(key: &PropertyKey) -> String {
    match key {
        PropertyKey::Symbol { symbol } => symbol.display(),
        other => other.as_json_key().unwrap_or_default(),
    }
}

fn quote(s: &str) -> String {
    format!("\"{}\"", escape_string(s))
}

/// Escape a string for a double-quoted literal.
fn escape_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

fn format_path(path: &[String]) -> String {
    if path.is_empty() {
        "/".to_string()
    } else {
        path.iter().map(|segment| format!("/{}", segment)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schema_ast::filters;

    fn emit(node: &Node) -> Result<String> {
        let options = RenderOptions::default();
        let bindings = IndexMap::new();
        Emitter::new(&options, &bindings).emit(node, Vec::new())
    }

    #[test]
    fn test_literals() {
        let cases = [
            (LiteralValue::Number(1.0), "Schema.Literal(1)"),
            (LiteralValue::Boolean(true), "Schema.Literal(true)"),
            (LiteralValue::big_int("1"), "Schema.Literal(1n)"),
            (LiteralValue::String("a\"b".into()), "Schema.Literal(\"a\\\"b\")"),
            (LiteralValue::Null, "Schema.Literal(null)"),
        ];
        for (literal, expected) in cases {
            let node = Node::new(NodeKind::Literal { literal });
            assert_eq!(emit(&node).unwrap(), expected);
        }
    }

    #[test]
    fn test_checks_and_annotations() {
        let node = Node::new(NodeKind::String)
            .with_checks(vec![filters::min_length(1), filters::pattern("^a")])
            .with_annotations(Annotations::new().with_title("Name"));
        assert_eq!(
            emit(&node).unwrap(),
            "Schema.String.annotate({ title: \"Name\" }).check(Schema.isMinLength(1)).check(Schema.isPattern(new RegExp(\"^a\")))"
        );
    }

    #[test]
    fn test_struct_modifiers() {
        let node = Node::new(NodeKind::Objects {
            property_signatures: vec![
                PropertySignature::new("a", Node::new(NodeKind::Number)).optional(),
                PropertySignature::new(
                    PropertyKey::symbol(SymbolKey::registered("k")),
                    Node::new(NodeKind::String),
                )
                .mutable(),
            ],
            index_signatures: Vec::new(),
        });
        assert_eq!(
            emit(&node).unwrap(),
            "Schema.Struct({ \"a\": Schema.optionalKey(Schema.Number), [Symbol.for(\"k\")]: Schema.mutableKey(Schema.String) })"
        );
    }

    #[test]
    fn test_anonymous_symbol_is_unrepresentable() {
        let node = Node::new(NodeKind::Arrays {
            elements: vec![Element::required(Node::new(NodeKind::UniqueSymbol {
                symbol: SymbolKey::anonymous("local"),
            }))],
            rest: Vec::new(),
        });
        match emit(&node).unwrap_err() {
            InterchangeError::UnrepresentableSymbol { path, symbol } => {
                assert_eq!(path, vec!["elements".to_string(), "0".to_string()]);
                assert_eq!(symbol, "Symbol(local)");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_forward_reference_is_suspended() {
        let options = RenderOptions::default();
        let bindings = IndexMap::from([("A-1".to_string(), "A_1".to_string())]);
        let mut emitter = Emitter::new(&options, &bindings);
        let node = Node::reference("A-1");
        assert_eq!(
            emitter.emit(&node, Vec::new()).unwrap(),
            "Schema.suspend(() => A_1)"
        );
        emitter.declare("A-1");
        assert_eq!(emitter.emit(&node, Vec::new()).unwrap(), "A_1");
    }

    #[test]
    fn test_declaration_without_constructor_is_lossy() {
        let options = RenderOptions::default();
        let bindings = IndexMap::new();
        let mut emitter = Emitter::new(&options, &bindings);
        let node = Node::new(NodeKind::Declaration {
            type_parameters: Vec::new(),
            encoded: None,
        });
        let out = emitter.emit(&node, vec!["definitions".into(), "Date".into()]).unwrap();
        assert_eq!(out, "Schema.Any");
        assert_eq!(emitter.into_lossy(), vec!["/definitions/Date".to_string()]);
    }
}
