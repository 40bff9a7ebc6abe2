//! Configuration for JSON Schema generation and source rendering.
//!
//! Both config structs have defaults that work out of the box, builder-style
//! `with_*` setters, and a `validate()` that every entry point runs before
//! doing any work.
//!
//! # Example
//! ```rust
//! use schema_interchange::{ExportStyle, JsonSchemaConfig, JsonSchemaTarget, RenderOptions};
//!
//! let json = JsonSchemaConfig::new().with_target(JsonSchemaTarget::Draft07);
//! assert!(json.validate().is_ok());
//!
//! let render = RenderOptions::new()
//!     .with_namespace("S")
//!     .with_export_style(ExportStyle::Export);
//! assert!(render.validate().is_ok());
//! ```

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::naming::is_valid_binding;
use crate::render::Reviver;

/// Configuration validation errors.
///
/// Returned by `validate()` when a configuration value is outside its
/// allowed range.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigValidationError {
    /// namespace must not be empty
    EmptyNamespace,
    /// namespace must be a valid binding name
    InvalidNamespace(String),
    /// root binding must be a valid binding name
    InvalidRootBinding(String),
    /// root identifier must not be empty
    EmptyRootIdentifier,
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyNamespace => write!(f, "namespace must not be empty"),
            Self::InvalidNamespace(name) => {
                write!(f, "namespace '{}' is not a valid binding name", name)
            }
            Self::InvalidRootBinding(name) => {
                write!(f, "root binding '{}' is not a valid binding name", name)
            }
            Self::EmptyRootIdentifier => write!(f, "root identifier must not be empty"),
        }
    }
}

impl std::error::Error for ConfigValidationError {}

// =============================================================================
// JSON Schema
// =============================================================================

/// JSON Schema dialect to produce and accept.
///
/// The target decides the `$schema` URI, where definitions live and how
/// tuples are spelled:
///
/// | Target | Definitions | Tuples |
/// |---|---|---|
/// | `Draft07` | `#/definitions/` | `items: [...]` + `additionalItems` |
/// | `Draft2020_12` | `#/$defs/` | `prefixItems` + `items` |
/// | `OpenApi31` | `#/components/schemas/` | `prefixItems` + `items` |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum JsonSchemaTarget {
    /// JSON Schema draft-07
    Draft07,
    /// JSON Schema 2020-12
    #[default]
    #[serde(rename = "draft-2020-12")]
    Draft2020_12,
    /// OpenAPI 3.1 component schemas
    #[serde(rename = "openapi-3.1")]
    OpenApi31,
}

impl JsonSchemaTarget {
    /// The `$schema` URI of the dialect.
    pub fn schema_uri(&self) -> &'static str {
        match self {
            Self::Draft07 => "http://json-schema.org/draft-07/schema#",
            Self::Draft2020_12 | Self::OpenApi31 => "https://json-schema.org/draft/2020-12/schema",
        }
    }

    /// Prefix of `$ref` values pointing into the definitions table.
    pub fn ref_prefix(&self) -> &'static str {
        match self {
            Self::Draft07 => "#/definitions/",
            Self::Draft2020_12 => "#/$defs/",
            Self::OpenApi31 => "#/components/schemas/",
        }
    }

    /// Path of the definitions table inside a standalone document.
    pub fn definitions_path(&self) -> &'static [&'static str] {
        match self {
            Self::Draft07 => &["definitions"],
            Self::Draft2020_12 => &["$defs"],
            Self::OpenApi31 => &["components", "schemas"],
        }
    }

    /// Whether tuples use `prefixItems` (2020-12) rather than array-valued
    /// `items` (draft-07).
    pub fn uses_prefix_items(&self) -> bool {
        !matches!(self, Self::Draft07)
    }

    /// Infer the target from a `$schema` URI.
    pub fn from_schema_uri(uri: &str) -> Option<Self> {
        if uri.contains("draft-07") {
            Some(Self::Draft07)
        } else if uri.contains("2020-12") {
            Some(Self::Draft2020_12)
        } else {
            None
        }
    }
}

/// JSON Schema generation configuration.
///
/// # Fields
///
/// * `target` - Dialect to produce. Default: `Draft2020_12`.
///
/// * `root_identifier` - Base name under which non-reference roots are
///   hoisted by multi-document generation. Default: `"root"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonSchemaConfig {
    /// Dialect to produce (default: 2020-12)
    pub target: JsonSchemaTarget,
    /// Base identifier for hoisted roots (default: "root")
    pub root_identifier: String,
}

impl Default for JsonSchemaConfig {
    fn default() -> Self {
        Self {
            target: JsonSchemaTarget::default(),
            root_identifier: "root".to_string(),
        }
    }
}

impl JsonSchemaConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.root_identifier.is_empty() {
            return Err(ConfigValidationError::EmptyRootIdentifier);
        }
        Ok(())
    }

    /// Set the dialect.
    #[must_use = "This method returns a new JsonSchemaConfig and does not modify self"]
    pub fn with_target(mut self, target: JsonSchemaTarget) -> Self {
        self.target = target;
        self
    }

    /// Set the base identifier for hoisted roots.
    #[must_use = "This method returns a new JsonSchemaConfig and does not modify self"]
    pub fn with_root_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.root_identifier = identifier.into();
        self
    }
}

// =============================================================================
// Rendering
// =============================================================================

/// How bindings are declared in rendered source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExportStyle {
    /// `const X = ...;`
    #[default]
    Const,
    /// `export const X = ...;`
    Export,
}

impl ExportStyle {
    /// Declaration keyword(s) for a binding.
    pub fn keyword(&self) -> &'static str {
        match self {
            ExportStyle::Const => "const",
            ExportStyle::Export => "export const",
        }
    }
}

/// Line ending style for rendered source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LineEnding {
    /// Unix-style line endings (LF)
    #[default]
    Lf,

    /// Windows-style line endings (CRLF)
    CrLf,
}

impl LineEnding {
    /// Get the line ending string.
    pub fn as_str(&self) -> &str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

/// Source rendering options.
///
/// # Fields
///
/// * `namespace` - Object the builder calls hang off. Default: `"Schema"`.
///
/// * `root_binding` - Binding of the document root. Default: `"schema"`.
///
/// * `export_style` - `const` or `export const`. Default: `Const`.
///
/// * `line_ending` - Default: LF.
///
/// * `reviver` - Optional per-node override of the built-in rendering.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Builder namespace (default: "Schema")
    pub namespace: String,
    /// Root binding name (default: "schema")
    pub root_binding: String,
    /// Declaration style (default: Const)
    pub export_style: ExportStyle,
    /// Line ending (default: LF)
    pub line_ending: LineEnding,
    /// Render override hook
    #[serde(skip)]
    pub reviver: Option<Arc<dyn Reviver>>,
}

impl fmt::Debug for RenderOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderOptions")
            .field("namespace", &self.namespace)
            .field("root_binding", &self.root_binding)
            .field("export_style", &self.export_style)
            .field("line_ending", &self.line_ending)
            .field("reviver", &self.reviver.as_ref().map(|_| ".."))
            .finish()
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            namespace: "Schema".to_string(),
            root_binding: "schema".to_string(),
            export_style: ExportStyle::default(),
            line_ending: LineEnding::default(),
            reviver: None,
        }
    }
}

impl RenderOptions {
    /// Create new options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the options.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.namespace.is_empty() {
            return Err(ConfigValidationError::EmptyNamespace);
        }
        if !is_valid_binding(&self.namespace) {
            return Err(ConfigValidationError::InvalidNamespace(
                self.namespace.clone(),
            ));
        }
        if !is_valid_binding(&self.root_binding) {
            return Err(ConfigValidationError::InvalidRootBinding(
                self.root_binding.clone(),
            ));
        }
        Ok(())
    }

    /// Set the builder namespace.
    #[must_use = "This method returns a new RenderOptions and does not modify self"]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Set the root binding name.
    #[must_use = "This method returns a new RenderOptions and does not modify self"]
    pub fn with_root_binding(mut self, binding: impl Into<String>) -> Self {
        self.root_binding = binding.into();
        self
    }

    /// Set the declaration style.
    #[must_use = "This method returns a new RenderOptions and does not modify self"]
    pub fn with_export_style(mut self, style: ExportStyle) -> Self {
        self.export_style = style;
        self
    }

    /// Set the line ending style.
    #[must_use = "This method returns a new RenderOptions and does not modify self"]
    pub fn with_line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }

    /// Install a render override hook.
    #[must_use = "This method returns a new RenderOptions and does not modify self"]
    pub fn with_reviver(mut self, reviver: impl Reviver + 'static) -> Self {
        self.reviver = Some(Arc::new(reviver));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_schema_defaults() {
        let config = JsonSchemaConfig::default();
        assert_eq!(config.target, JsonSchemaTarget::Draft2020_12);
        assert_eq!(config.root_identifier, "root");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_root_identifier_rejected() {
        let config = JsonSchemaConfig::new().with_root_identifier("");
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::EmptyRootIdentifier)
        );
    }

    #[test]
    fn test_target_prefixes() {
        assert_eq!(JsonSchemaTarget::Draft07.ref_prefix(), "#/definitions/");
        assert_eq!(JsonSchemaTarget::Draft2020_12.ref_prefix(), "#/$defs/");
        assert_eq!(
            JsonSchemaTarget::OpenApi31.ref_prefix(),
            "#/components/schemas/"
        );
        assert!(!JsonSchemaTarget::Draft07.uses_prefix_items());
    }

    #[test]
    fn test_target_from_uri() {
        assert_eq!(
            JsonSchemaTarget::from_schema_uri(JsonSchemaTarget::Draft07.schema_uri()),
            Some(JsonSchemaTarget::Draft07)
        );
        assert_eq!(JsonSchemaTarget::from_schema_uri("urn:other"), None);
    }

    #[test]
    fn test_render_options_validation() {
        assert!(RenderOptions::default().validate().is_ok());
        assert_eq!(
            RenderOptions::new().with_namespace("").validate(),
            Err(ConfigValidationError::EmptyNamespace)
        );
        assert_eq!(
            RenderOptions::new().with_root_binding("1abc").validate(),
            Err(ConfigValidationError::InvalidRootBinding("1abc".into()))
        );
    }

    #[test]
    fn test_render_options_serde_skips_reviver() {
        let options = RenderOptions::new().with_namespace("S");
        let value = serde_json::to_value(&options).unwrap();
        assert_eq!(value["namespace"], "S");
        assert!(value.get("reviver").is_none());
        let back: RenderOptions = serde_json::from_value(value).unwrap();
        assert_eq!(back.namespace, "S");
        assert!(back.reviver.is_none());
    }
}
