//! Name-resolution diagnostic builders
//!
//! Codes live in the symbol-resolution range (E2000-E2999).

use crate::{Diagnostic, DiagnosticBuilder, SourceSpan};

pub const UNRESOLVED_REFERENCE: &str = "E2001";
pub const SELECTOR_ON_UNRESOLVED_BASE: &str = "E2002";
pub const UNKNOWN_MEMBER: &str = "E2003";

/// Provides the diagnostics emitted while binding identifiers
pub struct ResolveDiagnostics;

impl ResolveDiagnostics {
    /// Identifier found in no enclosing scope
    pub fn unresolved_reference(
        span: SourceSpan,
        name: &str,
        namespace: &str,
        candidates: &[&str],
    ) -> Diagnostic {
        let mut builder = DiagnosticBuilder::warning(
            format!("cannot find {} `{}` in this scope", namespace, name),
            span.clone(),
        )
        .code(UNRESOLVED_REFERENCE)
        .label(span.clone(), "not found in this scope");

        if let Some(similar) = closest_name(name, candidates) {
            builder = builder.suggestion(format!("a binding named `{}` is visible here", similar), span, similar);
        }

        builder
            .note("the name may be declared in another compilation unit")
            .build()
    }

    /// Follow-on for `x.y` when `x` itself did not resolve
    pub fn selector_on_unresolved_base(span: SourceSpan, base: &str, member: &str) -> Diagnostic {
        DiagnosticBuilder::hint(
            format!("skipped member `{}` of unresolved `{}`", member, base),
            span,
        )
        .code(SELECTOR_ON_UNRESOLVED_BASE)
        .suppressed()
        .build()
    }

    /// `x.y` where `x` has a known struct type without a member `y`
    pub fn unknown_member(
        span: SourceSpan,
        member: &str,
        owner: &str,
        owner_span: Option<SourceSpan>,
        candidates: &[&str],
    ) -> Diagnostic {
        let mut builder = DiagnosticBuilder::warning(
            format!("no field or method `{}` on type `{}`", member, owner),
            span.clone(),
        )
        .code(UNKNOWN_MEMBER)
        .label(span.clone(), "unknown member");

        if let Some(owner_span) = owner_span {
            builder = builder.secondary_label(owner_span, format!("`{}` declared here", owner));
        }
        if let Some(similar) = closest_name(member, candidates) {
            builder = builder.suggestion(format!("did you mean `{}`?", similar), span, similar);
        }
        builder.build()
    }
}

/// Pick the candidate with the smallest edit distance, if it is close enough
pub fn closest_name<'a>(name: &str, candidates: &[&'a str]) -> Option<&'a str> {
    let limit = (name.chars().count() / 3).max(1);
    candidates
        .iter()
        .filter(|candidate| **candidate != name)
        .map(|candidate| (edit_distance(name, candidate), *candidate))
        .filter(|(distance, _)| *distance <= limit)
        .min()
        .map(|(_, candidate)| candidate)
}

fn edit_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();

    for (i, ca) in a.chars().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if ca == *cb {
                diagonal
            } else {
                1 + diagonal.min(above).min(row[j])
            };
            diagonal = above;
        }
    }

    row[b.len()]
}
