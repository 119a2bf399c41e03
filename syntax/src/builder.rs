//! Programmatic AST construction
//!
//! `AstBuilder` hands out spans from a running text buffer: every token is
//! appended to the buffer and gets the span it was written at, so nodes built
//! in source order carry monotonically increasing offsets. Block-like nodes
//! take closures so that their spans enclose whatever is built inside them.
//!
//! Arguments are evaluated before the node that owns them, which means
//! wrapper tokens (`(`, `++`, `&`) land after their operands in the buffer.
//! Offsets stay ordered and nested, which is all scope analysis relies on.

use crate::ast::*;
use std::cell::RefCell;

#[derive(Debug, Default)]
pub struct AstBuilder {
    text: RefCell<String>,
}

impl AstBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offset the next token will be written at
    pub fn offset(&self) -> usize {
        self.text.borrow().len()
    }

    /// Text written so far; spans handed out index into it
    pub fn source(&self) -> String {
        self.text.borrow().clone()
    }

    fn token(&self, text: &str) -> Span {
        let mut buf = self.text.borrow_mut();
        let start = buf.len();
        buf.push_str(text);
        buf.push(' ');
        Span::new(start, start + text.len())
    }

    fn end_line(&self) {
        let mut buf = self.text.borrow_mut();
        if buf.ends_with(' ') {
            buf.pop();
            buf.push('\n');
        }
    }

    fn spread(spans: impl IntoIterator<Item = Span>, fallback: impl FnOnce() -> Span) -> Span {
        spans
            .into_iter()
            .reduce(Span::merge)
            .unwrap_or_else(fallback)
    }

    // ---- expressions ----

    pub fn ident(&self, name: &str) -> Ident {
        Ident::new(name, self.token(name))
    }

    pub fn name(&self, name: &str) -> Expr {
        Expr::Ident(self.ident(name))
    }

    pub fn int(&self, value: i64) -> Expr {
        let text = value.to_string();
        Expr::BasicLit {
            kind: LitKind::Int,
            span: self.token(&text),
            value: text,
        }
    }

    pub fn string(&self, value: &str) -> Expr {
        let span = self.token(&format!("{:?}", value));
        Expr::BasicLit {
            kind: LitKind::String,
            value: value.to_string(),
            span,
        }
    }

    pub fn selector(&self, base: Expr, field: &str) -> Expr {
        self.token(".");
        let field = self.ident(field);
        let span = base.span().merge(field.span);
        Expr::Selector(SelectorExpr {
            base: Box::new(base),
            field,
            span,
        })
    }

    pub fn call(&self, func: Expr, args: Vec<Expr>) -> Expr {
        let close = self.token("()");
        Expr::Call {
            span: func.span().merge(close),
            func: Box::new(func),
            args,
        }
    }

    pub fn index(&self, base: Expr, index: Expr) -> Expr {
        let close = self.token("[]");
        Expr::Index {
            span: base.span().merge(close),
            base: Box::new(base),
            index: Box::new(index),
        }
    }

    pub fn unary(&self, op: UnaryOp, operand: Expr) -> Expr {
        let text = match op {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
            UnaryOp::Addr => "&",
            UnaryOp::Deref => "*",
            UnaryOp::Recv => "<-",
        };
        let op_span = self.token(text);
        Expr::Unary {
            op,
            span: operand.span().merge(op_span),
            operand: Box::new(operand),
        }
    }

    pub fn addr(&self, operand: Expr) -> Expr {
        self.unary(UnaryOp::Addr, operand)
    }

    pub fn deref(&self, operand: Expr) -> Expr {
        self.unary(UnaryOp::Deref, operand)
    }

    pub fn binary(&self, op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Binary {
            op,
            span: lhs.span().merge(rhs.span()),
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn composite(&self, ty: Option<TypeExpr>, elements: Vec<Element>) -> Expr {
        let close = self.token("{}");
        let start = ty
            .as_ref()
            .map(type_span)
            .or_else(|| elements.first().map(element_span))
            .unwrap_or(close);
        Expr::Composite {
            ty,
            elements,
            span: start.merge(close),
        }
    }

    pub fn element(&self, key: Option<Expr>, value: Expr) -> Element {
        Element { key, value }
    }

    pub fn func_lit(&self, build: impl FnOnce(&Self) -> (Vec<Param>, Vec<Param>, Block)) -> Expr {
        let keyword = self.token("func");
        let (params, results, body) = build(self);
        Expr::FuncLit {
            span: keyword.merge(body.span),
            params,
            results,
            body,
        }
    }

    // ---- types ----

    pub fn ty(&self, name: &str) -> TypeExpr {
        TypeExpr::Named(self.ident(name))
    }

    pub fn qualified(&self, package: &str, name: &str) -> TypeExpr {
        let package = self.ident(package);
        self.token(".");
        TypeExpr::Qualified {
            package,
            name: self.ident(name),
        }
    }

    pub fn pointer(&self, inner: TypeExpr) -> TypeExpr {
        self.token("*");
        TypeExpr::Pointer(Box::new(inner))
    }

    pub fn slice(&self, inner: TypeExpr) -> TypeExpr {
        self.token("[]");
        TypeExpr::Slice(Box::new(inner))
    }

    pub fn map(&self, key: TypeExpr, value: TypeExpr) -> TypeExpr {
        self.token("map");
        TypeExpr::Map {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    pub fn func_type(&self, params: Vec<Param>, results: Vec<Param>) -> TypeExpr {
        self.token("func");
        TypeExpr::Func { params, results }
    }

    pub fn struct_type(&self, build: impl FnOnce(&Self) -> Vec<FieldDecl>) -> TypeExpr {
        let open = self.token("struct {");
        self.end_line();
        let fields = build(self);
        let close = self.token("}");
        TypeExpr::Struct(StructType {
            fields,
            span: open.merge(close),
        })
    }

    pub fn field(&self, name: Ident, ty: TypeExpr) -> FieldDecl {
        self.fields(vec![name], ty)
    }

    pub fn fields(&self, names: Vec<Ident>, ty: TypeExpr) -> FieldDecl {
        let span = Self::spread(names.iter().map(|n| n.span), || type_span(&ty));
        self.end_line();
        FieldDecl {
            span: span.merge(type_span(&ty)),
            names,
            ty,
        }
    }

    pub fn embedded(&self, ty: TypeExpr) -> FieldDecl {
        self.end_line();
        FieldDecl {
            names: Vec::new(),
            span: type_span(&ty),
            ty,
        }
    }

    pub fn param(&self, name: Ident, ty: TypeExpr) -> Param {
        Param {
            span: name.span.merge(type_span(&ty)),
            name: Some(name),
            ty,
        }
    }

    pub fn unnamed(&self, ty: TypeExpr) -> Param {
        Param {
            name: None,
            span: type_span(&ty),
            ty,
        }
    }

    // ---- statements ----

    pub fn block(&self, build: impl FnOnce(&Self) -> Vec<Stmt>) -> Block {
        let open = self.token("{");
        self.end_line();
        let stmts = build(self);
        let close = self.token("}");
        self.end_line();
        Block {
            stmts,
            span: open.merge(close),
        }
    }

    pub fn nested(&self, build: impl FnOnce(&Self) -> Vec<Stmt>) -> Stmt {
        Stmt::Block(self.block(build))
    }

    pub fn short_var(&self, targets: Vec<Expr>, values: Vec<Expr>) -> Stmt {
        let op = self.token(":=");
        let span = Self::spread(
            targets.iter().chain(values.iter()).map(Expr::span),
            || op,
        )
        .merge(op);
        self.end_line();
        Stmt::ShortVarDecl(ShortVarDecl {
            targets,
            values,
            span,
        })
    }

    /// `a, b := ...` with plain identifier targets
    pub fn define(&self, names: &[&str], values: impl FnOnce(&Self) -> Vec<Expr>) -> Stmt {
        let targets = names.iter().map(|n| self.name(n)).collect();
        let values = values(self);
        self.short_var(targets, values)
    }

    pub fn value_spec(
        &self,
        kind: ValueKind,
        names: Vec<Ident>,
        ty: Option<TypeExpr>,
        values: Vec<Expr>,
    ) -> ValueDecl {
        let end = self.token(";");
        let span = Self::spread(names.iter().map(|n| n.span), || end).merge(end);
        self.end_line();
        ValueDecl {
            kind,
            names,
            ty,
            values,
            span,
        }
    }

    pub fn local_var(&self, names: Vec<Ident>, ty: Option<TypeExpr>, values: Vec<Expr>) -> Stmt {
        Stmt::Value(self.value_spec(ValueKind::Var, names, ty, values))
    }

    pub fn local_const(&self, names: Vec<Ident>, ty: Option<TypeExpr>, values: Vec<Expr>) -> Stmt {
        Stmt::Value(self.value_spec(ValueKind::Const, names, ty, values))
    }

    pub fn local_type(&self, name: &str, build: impl FnOnce(&Self) -> TypeExpr) -> Stmt {
        Stmt::Type(self.type_spec(name, build))
    }

    pub fn assign(&self, lhs: Vec<Expr>, rhs: Vec<Expr>) -> Stmt {
        let op = self.token("=");
        let span = Self::spread(lhs.iter().chain(rhs.iter()).map(Expr::span), || op).merge(op);
        self.end_line();
        Stmt::Assign { lhs, rhs, span }
    }

    pub fn inc(&self, target: Expr) -> Stmt {
        self.inc_dec(target, true)
    }

    pub fn dec(&self, target: Expr) -> Stmt {
        self.inc_dec(target, false)
    }

    fn inc_dec(&self, target: Expr, increment: bool) -> Stmt {
        let op = self.token(if increment { "++" } else { "--" });
        self.end_line();
        Stmt::IncDec {
            span: target.span().merge(op),
            target,
            increment,
        }
    }

    pub fn expr_stmt(&self, expr: Expr) -> Stmt {
        self.end_line();
        Stmt::Expr(expr)
    }

    pub fn ret(&self, values: Vec<Expr>) -> Stmt {
        let keyword = self.token("return");
        self.end_line();
        Stmt::Return {
            span: Self::spread(values.iter().map(Expr::span), || keyword).merge(keyword),
            values,
        }
    }

    pub fn if_stmt(&self, init: Option<Stmt>, cond: Expr, then: Block, els: Option<Stmt>) -> Stmt {
        let start = init.as_ref().map_or(cond.span(), Stmt::span);
        let end = els.as_ref().map_or(then.span, Stmt::span);
        Stmt::If(IfStmt {
            init: init.map(Box::new),
            cond,
            then,
            els: els.map(Box::new),
            span: start.merge(end),
        })
    }

    pub fn for_loop(
        &self,
        init: Option<Stmt>,
        cond: Option<Expr>,
        post: Option<Stmt>,
        body: Block,
    ) -> Stmt {
        let start = init
            .as_ref()
            .map(Stmt::span)
            .or_else(|| cond.as_ref().map(Expr::span))
            .or_else(|| post.as_ref().map(Stmt::span))
            .unwrap_or(body.span);
        Stmt::For(ForStmt {
            span: start.merge(body.span),
            init: init.map(Box::new),
            cond,
            post: post.map(Box::new),
            body,
        })
    }

    pub fn for_range(
        &self,
        key: Option<Expr>,
        value: Option<Expr>,
        define: bool,
        source: Expr,
        body: Block,
    ) -> Stmt {
        let start = key
            .as_ref()
            .or(value.as_ref())
            .map_or(source.span(), Expr::span);
        Stmt::Range(RangeStmt {
            span: start.merge(body.span),
            key,
            value,
            define,
            source,
            body,
        })
    }

    pub fn switch(&self, init: Option<Stmt>, tag: Option<Expr>, cases: Vec<CaseClause>) -> Stmt {
        let close = self.token("}");
        self.end_line();
        let start = init
            .as_ref()
            .map(Stmt::span)
            .or_else(|| tag.as_ref().map(Expr::span))
            .or_else(|| cases.first().map(|c| c.span))
            .unwrap_or(close);
        Stmt::Switch(SwitchStmt {
            init: init.map(Box::new),
            tag,
            cases,
            span: start.merge(close),
        })
    }

    pub fn case(&self, exprs: Vec<Expr>, build: impl FnOnce(&Self) -> Vec<Stmt>) -> CaseClause {
        let colon = self.token(if exprs.is_empty() { "default:" } else { ":" });
        self.end_line();
        let body = build(self);
        let start = exprs.first().map_or(colon, Expr::span);
        let end = body.last().map_or(colon, Stmt::span);
        CaseClause {
            exprs,
            body,
            span: start.merge(end),
        }
    }

    // ---- declarations ----

    pub fn func(&self, name: &str, build: impl FnOnce(&Self) -> (Vec<Param>, Block)) -> Decl {
        self.func_returning(name, |b| {
            let (params, body) = build(b);
            (params, Vec::new(), body)
        })
    }

    pub fn func_returning(
        &self,
        name: &str,
        build: impl FnOnce(&Self) -> (Vec<Param>, Vec<Param>, Block),
    ) -> Decl {
        let keyword = self.token("func");
        let name = self.ident(name);
        let (params, results, body) = build(self);
        Decl::Func(FuncDecl {
            name,
            receiver: None,
            params,
            results,
            span: keyword.merge(body.span),
            body: Some(body),
        })
    }

    /// `func (receiver *Type) name(params) results { body }`
    pub fn method(
        &self,
        receiver: &str,
        receiver_ty: &str,
        pointer: bool,
        name: &str,
        build: impl FnOnce(&Self) -> (Vec<Param>, Vec<Param>, Block),
    ) -> Decl {
        let keyword = self.token("func");
        let recv_name = self.ident(receiver);
        let mut recv_ty = self.ty(receiver_ty);
        if pointer {
            recv_ty = TypeExpr::Pointer(Box::new(recv_ty));
        }
        let receiver = self.param(recv_name, recv_ty);
        let name = self.ident(name);
        let (params, results, body) = build(self);
        Decl::Func(FuncDecl {
            name,
            receiver: Some(receiver),
            params,
            results,
            span: keyword.merge(body.span),
            body: Some(body),
        })
    }

    pub fn global_var(&self, names: Vec<Ident>, ty: Option<TypeExpr>, values: Vec<Expr>) -> Decl {
        Decl::Value(self.value_spec(ValueKind::Var, names, ty, values))
    }

    pub fn global_const(&self, names: Vec<Ident>, ty: Option<TypeExpr>, values: Vec<Expr>) -> Decl {
        Decl::Value(self.value_spec(ValueKind::Const, names, ty, values))
    }

    pub fn type_spec(&self, name: &str, build: impl FnOnce(&Self) -> TypeExpr) -> TypeDecl {
        let keyword = self.token("type");
        let name = self.ident(name);
        let ty = build(self);
        let span = keyword.merge(type_span(&ty)).merge(name.span);
        self.end_line();
        TypeDecl { name, ty, span }
    }

    pub fn type_decl(&self, name: &str, build: impl FnOnce(&Self) -> TypeExpr) -> Decl {
        Decl::Type(self.type_spec(name, build))
    }

    pub fn import(&self, path: &str) -> Import {
        let span = self.token(&format!("{:?}", path));
        self.end_line();
        Import {
            path: path.to_string(),
            alias: None,
            span,
        }
    }

    pub fn import_as(&self, alias: &str, path: &str) -> Import {
        let alias = self.ident(alias);
        let path_span = self.token(&format!("{:?}", path));
        self.end_line();
        Import {
            path: path.to_string(),
            span: alias.span.merge(path_span),
            alias: Some(alias),
        }
    }

    /// `package name` clause; call first when building a file
    pub fn package(&self, name: &str) -> Ident {
        self.token("package");
        let ident = self.ident(name);
        self.end_line();
        ident
    }

    pub fn file(&self, package: Ident, imports: Vec<Import>, decls: Vec<Decl>) -> GoFile {
        let start = package.span.start.saturating_sub("package ".len());
        GoFile {
            package,
            imports,
            decls,
            span: Span::new(start, self.offset()),
        }
    }
}

/// Best-effort span of a type expression
pub fn type_span(ty: &TypeExpr) -> Span {
    match ty {
        TypeExpr::Named(ident) => ident.span,
        TypeExpr::Qualified { package, name } => package.span.merge(name.span),
        TypeExpr::Pointer(inner) | TypeExpr::Slice(inner) => type_span(inner),
        TypeExpr::Map { key, value } => type_span(key).merge(type_span(value)),
        TypeExpr::Struct(st) => st.span,
        TypeExpr::Func { params, results } => params
            .iter()
            .chain(results.iter())
            .map(|p| p.span)
            .reduce(Span::merge)
            .unwrap_or_default(),
    }
}

fn element_span(element: &Element) -> Span {
    match &element.key {
        Some(key) => key.span().merge(element.value.span()),
        None => element.value.span(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spans_follow_build_order() {
        let b = AstBuilder::new();
        let first = b.ident("a");
        let second = b.ident("x");
        assert!(first.span.end <= second.span.start);
        assert_eq!(&b.source()[second.span.start..second.span.end], "x");
    }

    #[test]
    fn test_block_encloses_statements() {
        let b = AstBuilder::new();
        let block = b.block(|b| {
            vec![
                b.define(&["x"], |b| vec![b.int(1)]),
                b.inc(b.name("x")),
            ]
        });

        for stmt in &block.stmts {
            assert!(block.span.encloses(stmt.span()));
        }
        assert!(block.stmts[0].span().end <= block.stmts[1].span().start);
    }

    #[test]
    fn test_source_text_has_lines() {
        let b = AstBuilder::new();
        let package = b.package("main");
        let import = b.import("fmt");
        let file = b.file(package, vec![import], vec![]);

        let source = b.source();
        assert_eq!(source.lines().count(), 2);
        assert_eq!(&source[file.package.span.start..file.package.span.end], "main");
        assert_eq!(file.span.start, 0);
    }

    #[test]
    fn test_method_receiver_is_pointer() {
        let b = AstBuilder::new();
        let decl = b.method("self", "Person", true, "GetName", |b| {
            let results = vec![b.unnamed(b.ty("string"))];
            let body = b.block(|b| vec![b.ret(vec![b.selector(b.name("self"), "name")])]);
            (vec![], results, body)
        });

        match decl {
            Decl::Func(func) => {
                let receiver = func.receiver.expect("receiver");
                assert!(matches!(receiver.ty, TypeExpr::Pointer(_)));
                assert_eq!(receiver.ty.base_name().map(|i| i.name.as_str()), Some("Person"));
                assert!(func.span.encloses(func.name.span));
            }
            other => panic!("expected func, got {:?}", other),
        }
    }
}
