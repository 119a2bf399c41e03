//! Semantic token classification for editor highlighting

use crate::declarations::DeclKind;
use crate::ids::DeclId;
use crate::resolution::{Binding, MemberBinding, Resolution};
use fxhash::FxHashMap;
use serde::Serialize;
use source_map::{SourceFile, SourcePosition};
use std::fmt;
use syntax::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenClass {
    Function,
    Type,
    Field,
    Package,
    Parameter,
    Variable,
    /// Local or parameter that is assigned or redeclared after its declaration
    ModifiedVariable,
}

impl TokenClass {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenClass::Function => "function",
            TokenClass::Type => "type",
            TokenClass::Field => "field",
            TokenClass::Package => "package",
            TokenClass::Parameter => "parameter",
            TokenClass::Variable => "variable",
            TokenClass::ModifiedVariable => "modified-variable",
        }
    }
}

impl fmt::Display for TokenClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SemanticToken {
    pub name: String,
    pub span: Span,
    /// Line/column of the token start when a source file was supplied
    pub position: Option<SourcePosition>,
    pub class: TokenClass,
}

/// Inclusive 1-based line range, e.g. the lines visible in an editor viewport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

impl LineRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// One line of slack on each side
    fn covers(&self, line: usize) -> bool {
        line + 1 >= self.start && line <= self.end + 1
    }
}

/// Classify every declaration site and resolved identifier of `resolution`.
///
/// With a source file and a non-empty set of visible ranges, only tokens on
/// (or adjacent to) a visible line are kept. References override a
/// declaration token at the same span. Output is sorted by start offset.
pub fn semantic_tokens(
    resolution: &Resolution,
    visible: Option<(&SourceFile, &[LineRange])>,
) -> Vec<SemanticToken> {
    let mut by_span: FxHashMap<Span, (String, TokenClass)> = FxHashMap::default();

    for decl in resolution.declarations() {
        let class = decl_class(resolution, decl.id, decl.kind);
        by_span.insert(decl.span, (decl.name.clone(), class));
    }

    for reference in resolution.references() {
        let Binding::Declared(id) = reference.binding else {
            continue;
        };
        let Some(decl) = resolution.declaration(id) else {
            continue;
        };
        let class = decl_class(resolution, id, decl.kind);
        by_span.insert(reference.span, (reference.name.clone(), class));
    }

    for member in resolution.members() {
        let class = match member.binding {
            MemberBinding::Method { .. } => TokenClass::Function,
            MemberBinding::Field { .. } | MemberBinding::Missing { .. } | MemberBinding::Unknown => TokenClass::Field,
            MemberBinding::PackageMember { .. } | MemberBinding::Skipped => continue,
        };
        by_span.insert(member.span, (member.name.clone(), class));
    }

    let mut tokens: Vec<SemanticToken> = by_span
        .into_iter()
        .filter_map(|(span, (name, class))| {
            let position = match visible {
                Some((file, ranges)) => {
                    let position = file.offset_to_position(span.start);
                    if !ranges.is_empty() && !ranges.iter().any(|r| r.covers(position.line)) {
                        return None;
                    }
                    Some(position)
                }
                None => None,
            };
            Some(SemanticToken {
                name,
                span,
                position,
                class,
            })
        })
        .collect();

    tokens.sort_by_key(|t| (t.span.start, t.span.end));
    log::debug!("classified {} semantic tokens", tokens.len());
    tokens
}

fn decl_class(resolution: &Resolution, id: DeclId, kind: DeclKind) -> TokenClass {
    if kind.is_trackable() && resolution.is_modified(id) {
        return TokenClass::ModifiedVariable;
    }
    match kind {
        DeclKind::Package => TokenClass::Package,
        DeclKind::Function | DeclKind::Method => TokenClass::Function,
        DeclKind::Struct | DeclKind::TypeName => TokenClass::Type,
        DeclKind::Parameter => TokenClass::Parameter,
        DeclKind::Field => TokenClass::Field,
        DeclKind::Global | DeclKind::Constant | DeclKind::Local => TokenClass::Variable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_range_slack() {
        let range = LineRange::new(5, 7);
        assert!(range.covers(4));
        assert!(range.covers(8));
        assert!(!range.covers(3));
        assert!(!range.covers(9));
    }

    #[test]
    fn test_class_names() {
        assert_eq!(TokenClass::ModifiedVariable.to_string(), "modified-variable");
        assert_eq!(TokenClass::Package.as_str(), "package");
    }
}
