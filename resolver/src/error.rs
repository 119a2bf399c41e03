use std::fmt;
use syntax::Span;

/// Structural failures that abort resolution of one compilation unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The tree violates a shape the resolver depends on (e.g. a declaration
    /// without a name)
    MalformedAst { span: Span, reason: String },
    /// A scope was popped (or declared into) with no scope on the stack
    ScopeUnderflow,
}

impl ResolveError {
    pub fn malformed(span: Span, reason: impl Into<String>) -> Self {
        ResolveError::MalformedAst {
            span,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::MalformedAst { span, reason } => {
                write!(f, "Malformed syntax tree at {}: {}", span, reason)
            }
            ResolveError::ScopeUnderflow => {
                write!(f, "Scope stack underflow")
            }
        }
    }
}

impl std::error::Error for ResolveError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ResolveError::malformed(Span::new(4, 9), "declaration has no name");
        assert_eq!(err.to_string(), "Malformed syntax tree at 4..9: declaration has no name");
        assert_eq!(ResolveError::ScopeUnderflow.to_string(), "Scope stack underflow");
    }
}
