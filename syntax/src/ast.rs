//! Go-family AST with span tracking
//!
//! Covers the declarations, statements and expressions that introduce or
//! consume names: imports, functions and methods, package and local
//! variables, struct types, short variable declarations, range loops and
//! selector expressions. Literal values and operators are kept only as far
//! as they matter for walking the tree.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Source location information
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    /// Byte offset of the start (inclusive)
    pub start: usize,
    /// Byte offset of the end (exclusive)
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn merge(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }

    pub fn encloses(&self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// An identifier occurrence
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }

    /// The blank identifier `_` never binds and is never looked up
    pub fn is_blank(&self) -> bool {
        self.name == "_"
    }
}

/// A complete source file (one compilation unit)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoFile {
    pub package: Ident,
    pub imports: Vec<Import>,
    pub decls: Vec<Decl>,
    pub span: Span,
}

impl GoFile {
    /// Names this unit declares at package level, visible to sibling units
    pub fn top_level_names(&self) -> impl Iterator<Item = &str> {
        self.decls.iter().flat_map(|decl| -> Vec<&str> {
            match decl {
                Decl::Func(func) if func.receiver.is_none() => vec![func.name.name.as_str()],
                Decl::Func(_) => vec![],
                Decl::Value(value) => value
                    .names
                    .iter()
                    .filter(|n| !n.is_blank())
                    .map(|n| n.name.as_str())
                    .collect(),
                Decl::Type(ty) => vec![ty.name.name.as_str()],
            }
        })
    }
}

/// Import declaration: `import "fmt"` or `import f "fmt"`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Import {
    pub path: String,
    pub alias: Option<Ident>,
    pub span: Span,
}

impl Import {
    /// Name the import binds in the file: the alias, else the last path segment
    pub fn binding_name(&self) -> &str {
        match &self.alias {
            Some(alias) => &alias.name,
            None => self.path.rsplit('/').next().unwrap_or(&self.path),
        }
    }

    /// `import . "pkg"` merges the package's names into the file scope
    pub fn is_dot(&self) -> bool {
        self.alias.as_ref().is_some_and(|a| a.name == ".")
    }

    /// Span of the binding name: the alias if present, else the import path
    pub fn name_span(&self) -> Span {
        self.alias.as_ref().map_or(self.span, |a| a.span)
    }
}

/// Top-level (and local) declarations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Decl {
    /// `func f(x int) {}` or `func (p *T) m() {}`
    Func(FuncDecl),
    /// `var a, b = 1, 2` or `const c = 3`
    Value(ValueDecl),
    /// `type T struct { ... }`
    Type(TypeDecl),
}

impl Decl {
    pub fn span(&self) -> Span {
        match self {
            Decl::Func(func) => func.span,
            Decl::Value(value) => value.span,
            Decl::Type(ty) => ty.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuncDecl {
    pub name: Ident,
    pub receiver: Option<Param>,
    pub params: Vec<Param>,
    pub results: Vec<Param>,
    /// `None` for external (assembly-backed) functions
    pub body: Option<Block>,
    pub span: Span,
}

/// Parameter, receiver or named result; `name` is `None` for `func(int)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: Option<Ident>,
    pub ty: TypeExpr,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueKind {
    Var,
    Const,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueDecl {
    pub kind: ValueKind,
    pub names: Vec<Ident>,
    pub ty: Option<TypeExpr>,
    pub values: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: Ident,
    pub ty: TypeExpr,
    pub span: Span,
}

/// Type expressions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeExpr {
    /// `Person`, `int`
    Named(Ident),
    /// `fmt.Stringer`
    Qualified { package: Ident, name: Ident },
    /// `*Person`
    Pointer(Box<TypeExpr>),
    /// `[]Person`
    Slice(Box<TypeExpr>),
    /// `map[string]Person`
    Map { key: Box<TypeExpr>, value: Box<TypeExpr> },
    /// `struct { y int }`
    Struct(StructType),
    /// `func(int) string`
    Func { params: Vec<Param>, results: Vec<Param> },
}

impl TypeExpr {
    /// Named type under any number of pointers: `*Person` -> `Person`
    pub fn base_name(&self) -> Option<&Ident> {
        match self {
            TypeExpr::Named(ident) => Some(ident),
            TypeExpr::Qualified { name, .. } => Some(name),
            TypeExpr::Pointer(inner) => inner.base_name(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructType {
    pub fields: Vec<FieldDecl>,
    pub span: Span,
}

/// `name, other T`; an empty `names` list is an embedded field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub names: Vec<Ident>,
    pub ty: TypeExpr,
    pub span: Span,
}

impl FieldDecl {
    pub fn is_embedded(&self) -> bool {
        self.names.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

/// Statements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    /// `{ ... }`
    Block(Block),
    /// `a, x := 1, 2`
    ShortVarDecl(ShortVarDecl),
    /// `var y int` / `const k = 1` inside a function
    Value(ValueDecl),
    /// `type local struct { ... }` inside a function
    Type(TypeDecl),
    /// `x = 1`, `a, b = b, a`, `x += 2`
    Assign { lhs: Vec<Expr>, rhs: Vec<Expr>, span: Span },
    /// `x++` / `x--`
    IncDec { target: Expr, increment: bool, span: Span },
    /// Expression statement, typically a call
    Expr(Expr),
    /// `return a, b`
    Return { values: Vec<Expr>, span: Span },
    If(IfStmt),
    For(ForStmt),
    Range(RangeStmt),
    Switch(SwitchStmt),
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Block(block) => block.span,
            Stmt::ShortVarDecl(decl) => decl.span,
            Stmt::Value(value) => value.span,
            Stmt::Type(ty) => ty.span,
            Stmt::Assign { span, .. }
            | Stmt::IncDec { span, .. }
            | Stmt::Return { span, .. } => *span,
            Stmt::Expr(expr) => expr.span(),
            Stmt::If(stmt) => stmt.span,
            Stmt::For(stmt) => stmt.span,
            Stmt::Range(stmt) => stmt.span,
            Stmt::Switch(stmt) => stmt.span,
        }
    }
}

/// Targets are expressions so that malformed input such as `a.b := 1` can be
/// represented and rejected by the resolver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortVarDecl {
    pub targets: Vec<Expr>,
    pub values: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfStmt {
    pub init: Option<Box<Stmt>>,
    pub cond: Expr,
    pub then: Block,
    /// Either another `If` or a `Block`
    pub els: Option<Box<Stmt>>,
    pub span: Span,
}

/// `for init; cond; post { body }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForStmt {
    pub init: Option<Box<Stmt>>,
    pub cond: Option<Expr>,
    pub post: Option<Box<Stmt>>,
    pub body: Block,
    pub span: Span,
}

/// `for k, v := range source { body }`; with `define == false` the key and
/// value are assignment targets instead of new bindings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeStmt {
    pub key: Option<Expr>,
    pub value: Option<Expr>,
    pub define: bool,
    pub source: Expr,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchStmt {
    pub init: Option<Box<Stmt>>,
    pub tag: Option<Expr>,
    pub cases: Vec<CaseClause>,
    pub span: Span,
}

/// `case a, b: body`; an empty `exprs` list is the `default` clause
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseClause {
    pub exprs: Vec<Expr>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// Expressions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Ident(Ident),
    /// `base.field`
    Selector(SelectorExpr),
    /// `f(args)`; also conversions such as `Person(x)`
    Call { func: Box<Expr>, args: Vec<Expr>, span: Span },
    BasicLit { kind: LitKind, value: String, span: Span },
    /// `Person{name: n}` / `[]int{1, 2}`; `ty` is `None` for elided inner literals
    Composite { ty: Option<TypeExpr>, elements: Vec<Element>, span: Span },
    /// `func(x int) int { ... }`
    FuncLit { params: Vec<Param>, results: Vec<Param>, body: Block, span: Span },
    Unary { op: UnaryOp, operand: Box<Expr>, span: Span },
    Binary { op: BinaryOp, lhs: Box<Expr>, rhs: Box<Expr>, span: Span },
    /// `xs[i]` / `m[k]`
    Index { base: Box<Expr>, index: Box<Expr>, span: Span },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Ident(ident) => ident.span,
            Expr::Selector(selector) => selector.span,
            Expr::Call { span, .. }
            | Expr::BasicLit { span, .. }
            | Expr::Composite { span, .. }
            | Expr::FuncLit { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Index { span, .. } => *span,
        }
    }

    pub fn as_ident(&self) -> Option<&Ident> {
        match self {
            Expr::Ident(ident) => Some(ident),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectorExpr {
    pub base: Box<Expr>,
    pub field: Ident,
    pub span: Span,
}

/// Composite literal element, `key: value` or just `value`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub key: Option<Expr>,
    pub value: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LitKind {
    Int,
    Float,
    String,
    Char,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    /// `-x`
    Neg,
    /// `!x`
    Not,
    /// `&x`
    Addr,
    /// `*x`
    Deref,
    /// `<-ch`
    Recv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_binding_name() {
        let plain = Import {
            path: "net/http".to_string(),
            alias: None,
            span: Span::new(7, 17),
        };
        assert_eq!(plain.binding_name(), "http");
        assert_eq!(plain.name_span(), Span::new(7, 17));

        let aliased = Import {
            path: "fmt".to_string(),
            alias: Some(Ident::new("f", Span::new(7, 8))),
            span: Span::new(7, 14),
        };
        assert_eq!(aliased.binding_name(), "f");
        assert!(!aliased.is_dot());
    }

    #[test]
    fn test_base_name_strips_pointers() {
        let ty = TypeExpr::Pointer(Box::new(TypeExpr::Named(Ident::new("Person", Span::new(1, 7)))));
        assert_eq!(ty.base_name().map(|i| i.name.as_str()), Some("Person"));

        let slice = TypeExpr::Slice(Box::new(TypeExpr::Named(Ident::new("Person", Span::new(3, 9)))));
        assert!(slice.base_name().is_none());
    }

    #[test]
    fn test_span_containment() {
        let outer = Span::new(10, 40);
        assert!(outer.contains(10));
        assert!(!outer.contains(40));
        assert!(outer.encloses(Span::new(12, 20)));
        assert_eq!(Span::new(5, 8).merge(Span::new(2, 6)), Span::new(2, 8));
    }

    #[test]
    fn test_ast_deserializes_from_json() {
        let json = r#"{"Selector":{"base":{"Ident":{"name":"fmt","span":{"start":0,"end":3}}},
            "field":{"name":"name","span":{"start":4,"end":8}},"span":{"start":0,"end":8}}}"#;
        let expr: Expr = serde_json::from_str(json).unwrap();

        match expr {
            Expr::Selector(selector) => {
                assert_eq!(selector.base.as_ident().map(|i| i.name.as_str()), Some("fmt"));
                assert_eq!(selector.field.name, "name");
            }
            other => panic!("expected selector, got {:?}", other),
        }
    }
}
