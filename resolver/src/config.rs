//! Resolver options and `scopecheck.toml` parsing.

use crate::shadowing::DeclarationOrder;
use fxhash::FxHashSet;
use serde::Deserialize;

/// Identifiers of the Go universe block
pub const GO_PREDECLARED: &[&str] = &[
    // types
    "any", "bool", "byte", "comparable", "complex64", "complex128", "error", "float32", "float64", "int", "int8",
    "int16", "int32", "int64", "rune", "string", "uint", "uint8", "uint16", "uint32", "uint64", "uintptr",
    // constants and zero value
    "true", "false", "iota", "nil",
    // builtin functions
    "append", "cap", "clear", "close", "complex", "copy", "delete", "imag", "len", "make", "max", "min", "new",
    "panic", "print", "println", "real", "recover",
];

/// Options for one resolution run. Deserialized from the `[resolve]`
/// section of `scopecheck.toml`; every field has a default.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ResolveOptions {
    /// Visibility policy inside function bodies
    pub declaration_order: DeclarationOrder,
    /// Names that resolve without a declaration
    pub predeclared: Vec<String>,
    /// Names known to be declared in other compilation units
    pub external_names: Vec<String>,
    /// Emit E2001 for identifiers that bind to nothing
    pub report_unresolved: bool,
    /// Recursion bound when following declarations to find a selector base's type
    pub max_shape_depth: usize,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            declaration_order: DeclarationOrder::Sequential,
            predeclared: GO_PREDECLARED.iter().map(|s| s.to_string()).collect(),
            external_names: Vec::new(),
            report_unresolved: true,
            max_shape_depth: 32,
        }
    }
}

impl ResolveOptions {
    pub fn hoisted() -> Self {
        Self {
            declaration_order: DeclarationOrder::Hoisted,
            ..Self::default()
        }
    }

    pub fn with_external_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.external_names.extend(names.into_iter().map(Into::into));
        self
    }

    pub(crate) fn predeclared_set(&self) -> FxHashSet<&str> {
        self.predeclared.iter().map(String::as_str).collect()
    }

    pub(crate) fn external_set(&self) -> FxHashSet<&str> {
        self.external_names.iter().map(String::as_str).collect()
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    resolve: Option<ResolveOptions>,
}

/// Parse a `scopecheck.toml` string. A missing `[resolve]` section yields
/// the defaults.
pub fn parse_config(content: &str) -> Result<ResolveOptions, String> {
    let raw: RawConfig =
        toml::from_str(content).map_err(|e| format!("Failed to parse scopecheck.toml: {}", e))?;

    let options = raw.resolve.unwrap_or_default();
    if options.max_shape_depth == 0 {
        return Err("Invalid scopecheck.toml: max-shape-depth must be at least 1".to_string());
    }
    Ok(options)
}
