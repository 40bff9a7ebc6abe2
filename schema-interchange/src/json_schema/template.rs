//! Template literal patterns.
//!
//! A template literal becomes an anchored regular expression:
//!
//! | Part | Pattern |
//! |---|---|
//! | text / literal | escaped text |
//! | `String` | `[\s\S]*` |
//! | `Number` | [`NUMBER_PATTERN`] |
//! | union | `(?:a\|b)` |
//!
//! [`parse_pattern`] reverses exactly this grammar and rejects anything
//! else.

use schema_ast::{format_number, LiteralValue, Node, NodeKind, TemplatePart, UnionMode};
use tracing::debug;

/// Pattern matching any string.
pub const STRING_PATTERN: &str = r"[\s\S]*";

/// Pattern matching a decimal number literal.
pub const NUMBER_PATTERN: &str = r"[+-]?\d*\.?\d+(?:[Ee][+-]?\d+)?";

/// Anchored pattern for a template literal.
pub fn template_pattern(parts: &[TemplatePart<Node>]) -> String {
    let body: String = parts
        .iter()
        .map(|part| match part {
            TemplatePart::Text { text } => regex::escape(text),
            TemplatePart::Schema { schema } => part_pattern(schema),
        })
        .collect();
    format!("^{}$", body)
}

/// Unanchored pattern for one embedded schema.
pub fn part_pattern(node: &Node) -> String {
    match &node.kind {
        NodeKind::String => STRING_PATTERN.to_string(),
        NodeKind::Number => NUMBER_PATTERN.to_string(),
        NodeKind::Literal { literal } => regex::escape(&literal_text(literal)),
        NodeKind::Union { types, .. } => {
            let alternatives: Vec<String> = types.iter().map(part_pattern).collect();
            format!("(?:{})", alternatives.join("|"))
        }
        NodeKind::Suspend { thunk } => part_pattern(thunk),
        other => {
            debug!(kind = ?other, "Template part has no pattern; matching any string");
            STRING_PATTERN.to_string()
        }
    }
}

/// String form of a literal inside a template.
pub fn literal_text(literal: &LiteralValue) -> String {
    match literal {
        LiteralValue::Null => "null".to_string(),
        LiteralValue::Boolean(b) => b.to_string(),
        LiteralValue::Number(n) => format_number(*n),
        LiteralValue::String(s) => s.clone(),
        LiteralValue::BigInt { digits } => digits.clone(),
    }
}

/// Parse an anchored pattern produced by [`template_pattern`].
pub fn parse_pattern(pattern: &str) -> Option<Vec<TemplatePart<Node>>> {
    let body = pattern.strip_prefix('^')?.strip_suffix('$')?;
    let mut parser = Parser { input: body, pos: 0 };
    let parts = parser.sequence(false)?;
    if parser.pos != body.len() {
        return None;
    }
    Some(merge_text(parts))
}

// =============================================================================
// Parser
// =============================================================================

enum Token {
    Text(String),
    Schema(Node),
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn rest(&self) -> &str {
        &self.input[self.pos..]
    }

    /// Parse tokens until the end, or until `|`/`)` inside a group.
    fn sequence(&mut self, in_group: bool) -> Option<Vec<Token>> {
        let mut tokens = Vec::new();
        while let Some(c) = self.rest().chars().next() {
            if in_group && (c == '|' || c == ')') {
                break;
            }
            if self.rest().starts_with(STRING_PATTERN) {
                self.pos += STRING_PATTERN.len();
                tokens.push(Token::Schema(Node::new(NodeKind::String)));
            } else if self.rest().starts_with(NUMBER_PATTERN) {
                self.pos += NUMBER_PATTERN.len();
                tokens.push(Token::Schema(Node::new(NodeKind::Number)));
            } else if self.rest().starts_with("(?:") {
                self.pos += 3;
                tokens.push(Token::Schema(self.group()?));
            } else if c == '\\' {
                let escaped = self.rest()[1..].chars().next()?;
                self.pos += 1 + escaped.len_utf8();
                tokens.push(Token::Text(escaped.to_string()));
            } else if is_meta(c) {
                return None;
            } else {
                self.pos += c.len_utf8();
                tokens.push(Token::Text(c.to_string()));
            }
        }
        Some(tokens)
    }

    /// Parse the alternatives of a `(?:...)` group; the opener is consumed.
    fn group(&mut self) -> Option<Node> {
        let mut types = Vec::new();
        loop {
            let tokens = merge_text(self.sequence(true)?);
            types.push(single_part(tokens)?);
            match self.rest().chars().next()? {
                '|' => self.pos += 1,
                ')' => {
                    self.pos += 1;
                    break;
                }
                _ => return None,
            }
        }
        Some(Node::new(NodeKind::Union {
            types,
            mode: UnionMode::AnyOf,
        }))
    }
}

fn is_meta(c: char) -> bool {
    matches!(
        c,
        '.' | '+' | '*' | '?' | '(' | ')' | '|' | '[' | ']' | '{' | '}' | '^' | '$'
    )
}

/// An alternative must be one literal text or one schema.
fn single_part(parts: Vec<TemplatePart<Node>>) -> Option<Node> {
    let mut parts = parts.into_iter();
    let part = match parts.next() {
        Some(part) => part,
        None => TemplatePart::text(""),
    };
    if parts.next().is_some() {
        return None;
    }
    Some(match part {
        TemplatePart::Text { text } => Node::new(NodeKind::Literal {
            literal: LiteralValue::String(text),
        }),
        TemplatePart::Schema { schema } => schema,
    })
}

fn merge_text(tokens: Vec<Token>) -> Vec<TemplatePart<Node>> {
    let mut parts: Vec<TemplatePart<Node>> = Vec::new();
    for token in tokens {
        match token {
            Token::Text(text) => match parts.last_mut() {
                Some(TemplatePart::Text { text: previous }) => previous.push_str(&text),
                _ => parts.push(TemplatePart::text(text)),
            },
            Token::Schema(schema) => parts.push(TemplatePart::schema(schema)),
        }
    }
    parts
}
