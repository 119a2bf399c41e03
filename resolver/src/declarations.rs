//! Declaration records
//!
//! A `Declaration` is created once by the collector and never changes
//! afterwards. Same-name declarations are linked backwards: `redeclares`
//! points at an earlier declaration in the same scope, `shadows` at whatever
//! declaration of the name was visible where this one was introduced.

use crate::ids::{DeclId, ScopeId};
use serde::Serialize;
use std::fmt;
use syntax::{Expr, Span, TypeExpr};

/// The kind of declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeclKind {
    /// Imported package name
    Package,
    /// Package-level function
    Function,
    /// Function with a receiver; attached to its receiver type, never bound in a scope
    Method,
    /// Named struct type
    Struct,
    /// Named non-struct type
    TypeName,
    /// Package-level variable
    Global,
    /// Constant at any level
    Constant,
    /// Function parameter, receiver or named result
    Parameter,
    /// Function-local variable
    Local,
    /// Struct field; lives only in its struct's field map
    Field,
}

impl DeclKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DeclKind::Package => "package",
            DeclKind::Function => "function",
            DeclKind::Method => "method",
            DeclKind::Struct => "struct",
            DeclKind::TypeName => "type",
            DeclKind::Global => "global",
            DeclKind::Constant => "constant",
            DeclKind::Parameter => "parameter",
            DeclKind::Local => "local",
            DeclKind::Field => "field",
        }
    }

    pub fn is_type(self) -> bool {
        matches!(self, DeclKind::Struct | DeclKind::TypeName)
    }

    pub fn is_callable(self) -> bool {
        matches!(self, DeclKind::Function | DeclKind::Method)
    }

    /// Kinds that are bound in a scope's name table
    pub fn is_scoped(self) -> bool {
        !matches!(self, DeclKind::Method | DeclKind::Field)
    }

    /// Kinds whose assignments and redeclarations are tracked
    pub fn is_trackable(self) -> bool {
        matches!(self, DeclKind::Local | DeclKind::Parameter)
    }
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the collector knows about a declaration's value, kept for member
/// resolution on selector bases
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TypeAnnotation {
    /// Explicit type: parameters, fields, `var x T`, or a named type's underlying type
    Declared(TypeExpr),
    /// Single initializer: `x := expr`
    Inferred(Expr),
    /// One slot of a multi-value initializer: `a, b := f()`
    Tuple(Expr, usize),
    /// Key variable of `for k := range source`
    RangeKey(Expr),
    /// Value variable of `for _, v := range source`
    RangeValue(Expr),
    /// Declared results of a function or method
    Signature(Vec<TypeExpr>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Declaration {
    pub id: DeclId,
    pub name: String,
    pub kind: DeclKind,
    /// Scope the declaration was introduced in
    pub scope: ScopeId,
    /// Span of the declared identifier
    pub span: Span,
    /// First offset at which the name refers to this declaration
    pub visible_from: usize,
    /// Declaration visible under this name where this one was introduced
    pub shadows: Option<DeclId>,
    /// Earlier declaration of the same name in the same scope
    pub redeclares: Option<DeclId>,
    #[serde(skip)]
    pub annotation: Option<TypeAnnotation>,
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} `{}` at {}", self.kind, self.name, self.span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_properties() {
        assert!(DeclKind::Struct.is_type());
        assert!(!DeclKind::Local.is_type());
        assert!(DeclKind::Method.is_callable());
        assert!(!DeclKind::Field.is_scoped());
        assert!(DeclKind::Parameter.is_trackable());
        assert!(!DeclKind::Global.is_trackable());
        assert_eq!(DeclKind::TypeName.to_string(), "type");
    }
}
