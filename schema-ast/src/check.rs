//! Check (filter) definitions.
//!
//! Checks are validation constraints attached to a node in declaration
//! order. The engine never evaluates them; it only carries them between
//! representations, so every filter is a plain descriptor: a typed
//! [`FilterKind`] plus its own [`Annotations`].

use serde::{Deserialize, Serialize};

use crate::annotations::Annotations;
use crate::literal::{finite, format_number};

/// A constraint attached to a schema node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_tag")]
pub enum Check {
    /// A single filter
    Filter(Filter),

    /// An ordered group of checks applied together
    FilterGroup(FilterGroup),
}

impl Check {
    /// Flatten groups into their filters, preserving declaration order.
    pub fn filters(&self) -> Vec<&Filter> {
        match self {
            Check::Filter(filter) => vec![filter],
            Check::FilterGroup(group) => group.checks.iter().flat_map(Check::filters).collect(),
        }
    }

    /// The check's own annotations.
    pub fn annotations(&self) -> &Annotations {
        match self {
            Check::Filter(filter) => &filter.annotations,
            Check::FilterGroup(group) => &group.annotations,
        }
    }
}

impl From<Filter> for Check {
    fn from(filter: Filter) -> Self {
        Check::Filter(filter)
    }
}

impl From<FilterKind> for Check {
    fn from(kind: FilterKind) -> Self {
        Check::Filter(Filter::new(kind))
    }
}

impl From<FilterGroup> for Check {
    fn from(group: FilterGroup) -> Self {
        Check::FilterGroup(group)
    }
}

/// A single filter descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    /// What the filter constrains, with its parameters
    pub kind: FilterKind,

    /// Filter annotations (title, description, ...)
    #[serde(default, skip_serializing_if = "Annotations::is_empty")]
    pub annotations: Annotations,
}

impl Filter {
    /// Create a filter without annotations.
    pub fn new(kind: FilterKind) -> Self {
        Self {
            kind,
            annotations: Annotations::default(),
        }
    }

    /// Attach annotations.
    pub fn with_annotations(mut self, annotations: Annotations) -> Self {
        self.annotations = annotations;
        self
    }

    /// Explicit title, or the kind's default title.
    pub fn title(&self) -> String {
        self.annotations
            .title
            .clone()
            .unwrap_or_else(|| self.kind.default_title())
    }
}

/// An ordered group of checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterGroup {
    /// Member checks in declaration order
    pub checks: Vec<Check>,

    /// Group annotations
    #[serde(default, skip_serializing_if = "Annotations::is_empty")]
    pub annotations: Annotations,
}

impl FilterGroup {
    /// Create a group from checks.
    pub fn new(checks: impl IntoIterator<Item = Check>) -> Self {
        Self {
            checks: checks.into_iter().collect(),
            annotations: Annotations::default(),
        }
    }

    /// Attach annotations.
    pub fn with_annotations(mut self, annotations: Annotations) -> Self {
        self.annotations = annotations;
        self
    }
}

/// Filter kinds with their parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "params", rename_all = "camelCase")]
pub enum FilterKind {
    // ==========================================================================
    // String filters
    // ==========================================================================
    /// Minimum string length
    MinLength(usize),

    /// Maximum string length
    MaxLength(usize),

    /// Exact string length
    Length(usize),

    /// Regular expression the string must match
    Pattern(String),

    /// Required prefix
    StartsWith(String),

    /// Required suffix
    EndsWith(String),

    /// Required substring
    Includes(String),

    /// No leading or trailing whitespace
    Trimmed,

    /// All lowercase
    Lowercased,

    /// All uppercase
    Uppercased,

    // ==========================================================================
    // Number filters
    // ==========================================================================
    /// Strictly greater than
    GreaterThan(#[serde(serialize_with = "finite")] f64),

    /// Greater than or equal to
    GreaterThanOrEqualTo(#[serde(serialize_with = "finite")] f64),

    /// Strictly less than
    LessThan(#[serde(serialize_with = "finite")] f64),

    /// Less than or equal to
    LessThanOrEqualTo(#[serde(serialize_with = "finite")] f64),

    /// Inclusive range
    Between {
        #[serde(serialize_with = "finite")]
        minimum: f64,
        #[serde(serialize_with = "finite")]
        maximum: f64,
    },

    /// Multiple of the divisor
    MultipleOf(#[serde(serialize_with = "finite")] f64),

    /// Integral value
    Int,

    /// Neither infinite nor NaN
    Finite,

    // ==========================================================================
    // BigInt filters (bounds as decimal strings)
    // ==========================================================================
    /// Strictly greater than
    GreaterThanBigInt(String),

    /// Greater than or equal to
    GreaterThanOrEqualToBigInt(String),

    /// Strictly less than
    LessThanBigInt(String),

    /// Less than or equal to
    LessThanOrEqualToBigInt(String),

    // ==========================================================================
    // Array filters
    // ==========================================================================
    /// Minimum number of items
    MinItems(usize),

    /// Maximum number of items
    MaxItems(usize),

    /// Exact number of items
    ItemsLength(usize),

    /// No duplicate items
    UniqueItems,

    // ==========================================================================
    // Object filters
    // ==========================================================================
    /// Minimum number of keys
    MinProperties(usize),

    /// Maximum number of keys
    MaxProperties(usize),

    // ==========================================================================
    // Opaque
    // ==========================================================================
    /// A filter only its author understands
    Custom {
        name: String,
        #[serde(default)]
        params: serde_json::Value,
    },
}

impl FilterKind {
    /// Canonical constructor name (e.g. `isMinLength`).
    pub fn name(&self) -> &str {
        match self {
            FilterKind::MinLength(_) => "isMinLength",
            FilterKind::MaxLength(_) => "isMaxLength",
            FilterKind::Length(_) => "isLength",
            FilterKind::Pattern(_) => "isPattern",
            FilterKind::StartsWith(_) => "isStartsWith",
            FilterKind::EndsWith(_) => "isEndsWith",
            FilterKind::Includes(_) => "isIncludes",
            FilterKind::Trimmed => "isTrimmed",
            FilterKind::Lowercased => "isLowercased",
            FilterKind::Uppercased => "isUppercased",
            FilterKind::GreaterThan(_) => "isGreaterThan",
            FilterKind::GreaterThanOrEqualTo(_) => "isGreaterThanOrEqualTo",
            FilterKind::LessThan(_) => "isLessThan",
            FilterKind::LessThanOrEqualTo(_) => "isLessThanOrEqualTo",
            FilterKind::Between { .. } => "isBetween",
            FilterKind::MultipleOf(_) => "isMultipleOf",
            FilterKind::Int => "isInt",
            FilterKind::Finite => "isFinite",
            FilterKind::GreaterThanBigInt(_) => "isGreaterThanBigInt",
            FilterKind::GreaterThanOrEqualToBigInt(_) => "isGreaterThanOrEqualToBigInt",
            FilterKind::LessThanBigInt(_) => "isLessThanBigInt",
            FilterKind::LessThanOrEqualToBigInt(_) => "isLessThanOrEqualToBigInt",
            FilterKind::MinItems(_) => "isMinItems",
            FilterKind::MaxItems(_) => "isMaxItems",
            FilterKind::ItemsLength(_) => "isItemsLength",
            FilterKind::UniqueItems => "isUnique",
            FilterKind::MinProperties(_) => "isMinProperties",
            FilterKind::MaxProperties(_) => "isMaxProperties",
            FilterKind::Custom { name, .. } => name,
        }
    }

    /// Parameters rendered for display, in argument order.
    pub fn display_params(&self) -> Vec<String> {
        match self {
            FilterKind::MinLength(n)
            | FilterKind::MaxLength(n)
            | FilterKind::Length(n)
            | FilterKind::MinItems(n)
            | FilterKind::MaxItems(n)
            | FilterKind::ItemsLength(n)
            | FilterKind::MinProperties(n)
            | FilterKind::MaxProperties(n) => vec![n.to_string()],
            FilterKind::Pattern(s)
            | FilterKind::StartsWith(s)
            | FilterKind::EndsWith(s)
            | FilterKind::Includes(s)
            | FilterKind::GreaterThanBigInt(s)
            | FilterKind::GreaterThanOrEqualToBigInt(s)
            | FilterKind::LessThanBigInt(s)
            | FilterKind::LessThanOrEqualToBigInt(s) => vec![s.clone()],
            FilterKind::GreaterThan(n)
            | FilterKind::GreaterThanOrEqualTo(n)
            | FilterKind::LessThan(n)
            | FilterKind::LessThanOrEqualTo(n)
            | FilterKind::MultipleOf(n) => vec![format_number(*n)],
            FilterKind::Between { minimum, maximum } => {
                vec![format_number(*minimum), format_number(*maximum)]
            }
            FilterKind::Trimmed
            | FilterKind::Lowercased
            | FilterKind::Uppercased
            | FilterKind::Int
            | FilterKind::Finite
            | FilterKind::UniqueItems => Vec::new(),
            FilterKind::Custom { params, .. } => {
                if params.is_null() {
                    Vec::new()
                } else {
                    vec![params.to_string()]
                }
            }
        }
    }

    /// Title used when the filter carries none, e.g. `isMinLength(1)`.
    pub fn default_title(&self) -> String {
        let params = self.display_params();
        if params.is_empty() {
            self.name().to_string()
        } else {
            format!("{}({})", self.name(), params.join(", "))
        }
    }
}

/// Shorthand constructors mirroring the filter names.
pub mod filters {
    use super::{Check, FilterKind};

    /// `isMinLength(n)`
    pub fn min_length(n: usize) -> Check {
        FilterKind::MinLength(n).into()
    }

    /// `isMaxLength(n)`
    pub fn max_length(n: usize) -> Check {
        FilterKind::MaxLength(n).into()
    }

    /// `isLength(n)`
    pub fn length(n: usize) -> Check {
        FilterKind::Length(n).into()
    }

    /// `isPattern(regex)`
    pub fn pattern(regex: impl Into<String>) -> Check {
        FilterKind::Pattern(regex.into()).into()
    }

    /// `isGreaterThan(n)`
    pub fn greater_than(n: f64) -> Check {
        FilterKind::GreaterThan(n).into()
    }

    /// `isGreaterThanOrEqualTo(n)`
    pub fn greater_than_or_equal_to(n: f64) -> Check {
        FilterKind::GreaterThanOrEqualTo(n).into()
    }

    /// `isLessThan(n)`
    pub fn less_than(n: f64) -> Check {
        FilterKind::LessThan(n).into()
    }

    /// `isLessThanOrEqualTo(n)`
    pub fn less_than_or_equal_to(n: f64) -> Check {
        FilterKind::LessThanOrEqualTo(n).into()
    }

    /// `isBetween(minimum, maximum)`
    pub fn between(minimum: f64, maximum: f64) -> Check {
        FilterKind::Between { minimum, maximum }.into()
    }

    /// `isMultipleOf(n)`
    pub fn multiple_of(n: f64) -> Check {
        FilterKind::MultipleOf(n).into()
    }

    /// `isInt`
    pub fn int() -> Check {
        FilterKind::Int.into()
    }

    /// `isMinItems(n)`
    pub fn min_items(n: usize) -> Check {
        FilterKind::MinItems(n).into()
    }

    /// `isMaxItems(n)`
    pub fn max_items(n: usize) -> Check {
        FilterKind::MaxItems(n).into()
    }

    /// `isUnique`
    pub fn unique_items() -> Check {
        FilterKind::UniqueItems.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_titles() {
        assert_eq!(FilterKind::MinLength(1).default_title(), "isMinLength(1)");
        assert_eq!(FilterKind::Int.default_title(), "isInt");
        assert_eq!(
            FilterKind::Between {
                minimum: 0.0,
                maximum: 2.5
            }
            .default_title(),
            "isBetween(0, 2.5)"
        );
    }

    #[test]
    fn test_explicit_title_wins() {
        let filter = Filter::new(FilterKind::MaxLength(3))
            .with_annotations(Annotations::new().with_title("short"));
        assert_eq!(filter.title(), "short");
    }

    #[test]
    fn test_group_flattening_keeps_order() {
        let group = Check::FilterGroup(FilterGroup::new(vec![
            filters::min_length(1),
            Check::FilterGroup(FilterGroup::new(vec![filters::max_length(4)])),
            filters::pattern("^a"),
        ]));
        let kinds: Vec<_> = group.filters().iter().map(|f| f.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                FilterKind::MinLength(1),
                FilterKind::MaxLength(4),
                FilterKind::Pattern("^a".into())
            ]
        );
    }

    #[test]
    fn test_filter_serialization_shape() {
        let value = serde_json::to_value(filters::min_length(2)).unwrap();
        assert_eq!(
            value,
            json!({"_tag": "Filter", "kind": {"name": "minLength", "params": 2}})
        );
        let back: Check = serde_json::from_value(value).unwrap();
        assert_eq!(back, filters::min_length(2));
    }

    #[test]
    fn test_non_finite_bounds_do_not_serialise() {
        assert!(serde_json::to_value(filters::greater_than(f64::NAN)).is_err());
        assert!(serde_json::to_value(filters::between(0.0, f64::INFINITY)).is_err());
        assert!(serde_json::to_value(filters::multiple_of(2.0)).is_ok());
    }
}
