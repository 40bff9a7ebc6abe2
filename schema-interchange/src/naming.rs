//! Name allocation and binding sanitisation.
//!
//! [`NameAllocator`] hands out collision-free names from a base: the first
//! request keeps the base, later ones get `-1`, `-2`, ... (or any other
//! separator). Names already taken, whatever their origin, are skipped.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

static BINDING: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$"));

/// Words that can't be used as bindings in the rendered source.
const RESERVED: &[&str] = &[
    "await", "break", "case", "catch", "class", "const", "continue", "debugger", "default",
    "delete", "do", "else", "enum", "export", "extends", "false", "finally", "for", "function",
    "if", "import", "in", "instanceof", "let", "new", "null", "return", "static", "super",
    "switch", "this", "throw", "true", "try", "typeof", "undefined", "var", "void", "while",
    "with", "yield",
];

/// Check whether `name` can be declared as a binding.
pub fn is_valid_binding(name: &str) -> bool {
    match &*BINDING {
        Ok(re) => re.is_match(name) && !RESERVED.contains(&name),
        Err(_) => false,
    }
}

/// Turn an arbitrary identifier into a valid binding name.
///
/// Invalid characters become `_`, a leading digit gets a `_` prefix and
/// reserved words get a `_` suffix.
pub fn sanitize_binding(identifier: &str) -> String {
    if is_valid_binding(identifier) {
        return identifier.to_string();
    }
    let mut name: String = identifier
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '$' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    if RESERVED.contains(&name.as_str()) {
        name.push('_');
    }
    name
}

/// Collision-free name allocator.
#[derive(Debug, Clone)]
pub struct NameAllocator {
    separator: &'static str,
    counters: HashMap<String, usize>,
    taken: HashSet<String>,
}

impl NameAllocator {
    /// Allocator producing `base`, `base-1`, `base-2`, ...
    pub fn new() -> Self {
        Self::with_separator("-")
    }

    /// Allocator producing `base`, `base{sep}1`, `base{sep}2`, ...
    pub fn with_separator(separator: &'static str) -> Self {
        Self {
            separator,
            counters: HashMap::new(),
            taken: HashSet::new(),
        }
    }

    /// Mark a name as used without allocating it.
    pub fn reserve(&mut self, name: impl Into<String>) {
        self.taken.insert(name.into());
    }

    /// Check whether a name is already used.
    pub fn is_taken(&self, name: &str) -> bool {
        self.taken.contains(name)
    }

    /// Allocate the next free name for `base`.
    pub fn allocate(&mut self, base: &str) -> String {
        let counter = self.counters.entry(base.to_string()).or_insert(0);
        loop {
            let candidate = if *counter == 0 {
                base.to_string()
            } else {
                format!("{}{}{}", base, self.separator, counter)
            };
            *counter += 1;
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}

impl Default for NameAllocator {
    fn default() -> Self {
        Self::new()
    }
}
