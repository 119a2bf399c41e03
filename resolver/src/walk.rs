//! Reference resolver
//!
//! Walks a unit in program order with an explicit scope stack. Entering a
//! function or block pushes a scope and runs the collector over it before any
//! reference inside is resolved; leaving pops it. Bare identifiers bind
//! through the shadowing classifier at their own offset. Selectors resolve
//! their base first and only then look the member name up in the base's
//! field map, so a local named like an import turns `x.y` into field access.

use crate::collector::DeclarationCollector;
use crate::config::ResolveOptions;
use crate::declarations::DeclKind;
use crate::error::ResolveError;
use crate::ids::{DeclId, RefId, StructTypeId};
use crate::members::TypeMembers;
use crate::resolution::{Binding, MemberBinding, MemberUse, RefKind, Reference, Resolution};
use crate::shadowing::ShadowingClassifier;
use crate::shapes::{MemberLookup, Shape, ShapeEvaluator};
use crate::symbol_table::{ScopeKind, SymbolTable};
use diagnostics::resolve::ResolveDiagnostics;
use diagnostics::{DiagnosticSink, Diagnostics};
use fxhash::FxHashSet;
use source_map::{FileId, SourceFile, SourceSpan};
use syntax::{
    Block, Decl, Element, Expr, FuncDecl, GoFile, Ident, Param, SelectorExpr, Span, Stmt, TypeExpr,
};

pub(crate) struct Resolver<'a> {
    options: &'a ResolveOptions,
    predeclared: FxHashSet<&'a str>,
    external: FxHashSet<&'a str>,
    file_id: FileId,
    source: Option<&'a SourceFile>,
    table: SymbolTable,
    members: TypeMembers,
    references: Vec<Reference>,
    member_uses: Vec<MemberUse>,
    modified: FxHashSet<DeclId>,
    diagnostics: Diagnostics,
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(options: &'a ResolveOptions, file_id: FileId, source: Option<&'a SourceFile>) -> Self {
        Self {
            options,
            predeclared: options.predeclared_set(),
            external: options.external_set(),
            file_id,
            source,
            table: SymbolTable::new(options.declaration_order),
            members: TypeMembers::new(),
            references: Vec::new(),
            member_uses: Vec::new(),
            modified: FxHashSet::default(),
            diagnostics: Diagnostics::new(),
        }
    }

    pub(crate) fn run(mut self, file: &GoFile) -> Result<Resolution, ResolveError> {
        log::info!(
            "resolving package `{}` in {} ({} declarations)",
            file.package.name,
            self.file_id,
            file.decls.len()
        );

        self.table.push_scope(ScopeKind::Package, file.span);
        self.collector().collect_package(file)?;
        for decl in &file.decls {
            self.walk_decl(decl)?;
        }
        self.table.pop_scope()?;
        self.mark_redeclarations();

        log::info!(
            "resolved {} references and {} member uses in {} ({} unresolved)",
            self.references.len(),
            self.member_uses.len(),
            self.file_id,
            self.references
                .iter()
                .filter(|r| r.binding == Binding::Unresolved)
                .count()
        );

        Ok(Resolution {
            file_id: self.file_id,
            package: file.package.name.clone(),
            table: self.table,
            members: self.members,
            references: self.references,
            member_uses: self.member_uses,
            modified: self.modified,
            diagnostics: self.diagnostics,
        })
    }

    fn collector(&mut self) -> DeclarationCollector<'_> {
        DeclarationCollector::new(&mut self.table, &mut self.members)
    }

    fn shapes(&self) -> ShapeEvaluator<'_> {
        ShapeEvaluator::new(&self.table, &self.members, self.options.max_shape_depth)
    }

    /// Redeclaring a local in its own scope counts as modifying both bindings
    fn mark_redeclarations(&mut self) {
        for decl in self.table.declarations() {
            let Some(previous) = decl.redeclares else {
                continue;
            };
            let package_level = self
                .table
                .scope(decl.scope)
                .is_some_and(|s| s.kind.is_package());
            if decl.kind.is_trackable() && !package_level {
                self.modified.insert(decl.id);
                self.modified.insert(previous);
            }
        }
    }

    // ---- declarations ----

    fn walk_decl(&mut self, decl: &Decl) -> Result<(), ResolveError> {
        match decl {
            Decl::Func(func) => self.walk_func(func),
            Decl::Value(value) => {
                if let Some(ty) = &value.ty {
                    self.resolve_type(ty)?;
                }
                self.resolve_exprs(&value.values)
            }
            Decl::Type(ty) => self.resolve_type(&ty.ty),
        }
    }

    fn walk_func(&mut self, func: &FuncDecl) -> Result<(), ResolveError> {
        self.resolve_signature_types(func.receiver.as_ref(), &func.params, &func.results)?;

        self.table.push_scope(ScopeKind::Function, func.span);
        let body_start = func.body.as_ref().map_or(func.span.end, |body| body.span.start);
        self.collector()
            .collect_signature(func.receiver.as_ref(), &func.params, &func.results, body_start)?;
        if let Some(body) = &func.body {
            self.collector().collect_statements(&body.stmts)?;
            self.walk_stmts(&body.stmts)?;
        }
        self.table.pop_scope()?;
        Ok(())
    }

    fn resolve_signature_types(
        &mut self,
        receiver: Option<&Param>,
        params: &[Param],
        results: &[Param],
    ) -> Result<(), ResolveError> {
        for param in receiver.into_iter().chain(params).chain(results) {
            self.resolve_type(&param.ty)?;
        }
        Ok(())
    }

    // ---- statements ----

    fn walk_stmts(&mut self, stmts: &[Stmt]) -> Result<(), ResolveError> {
        for stmt in stmts {
            self.walk_stmt(stmt)?;
        }
        Ok(())
    }

    fn walk_block(&mut self, block: &Block, kind: ScopeKind) -> Result<(), ResolveError> {
        self.table.push_scope(kind, block.span);
        self.collector().collect_statements(&block.stmts)?;
        self.walk_stmts(&block.stmts)?;
        self.table.pop_scope()?;
        Ok(())
    }

    /// Statement in a scope opened by an `if`/`for`/`switch` header
    fn walk_header_stmt(&mut self, stmt: &Stmt) -> Result<(), ResolveError> {
        self.collector().collect_statement(stmt)?;
        self.walk_stmt(stmt)
    }

    fn walk_stmt(&mut self, stmt: &Stmt) -> Result<(), ResolveError> {
        match stmt {
            Stmt::Block(block) => self.walk_block(block, ScopeKind::Block),
            // targets were declared by the collector
            Stmt::ShortVarDecl(decl) => self.resolve_exprs(&decl.values),
            Stmt::Value(value) => {
                if let Some(ty) = &value.ty {
                    self.resolve_type(ty)?;
                }
                self.resolve_exprs(&value.values)
            }
            Stmt::Type(ty) => self.resolve_type(&ty.ty),
            Stmt::Assign { lhs, rhs, .. } => {
                for target in lhs {
                    self.resolve_target(target)?;
                }
                self.resolve_exprs(rhs)
            }
            Stmt::IncDec { target, .. } => self.resolve_target(target),
            Stmt::Expr(expr) => self.resolve_expr(expr),
            Stmt::Return { values, .. } => self.resolve_exprs(values),
            Stmt::If(stmt) => {
                self.table.push_scope(ScopeKind::If, stmt.span);
                if let Some(init) = &stmt.init {
                    self.walk_header_stmt(init)?;
                }
                self.resolve_expr(&stmt.cond)?;
                self.walk_block(&stmt.then, ScopeKind::Block)?;
                if let Some(els) = &stmt.els {
                    self.walk_stmt(els)?;
                }
                self.table.pop_scope()?;
                Ok(())
            }
            Stmt::For(stmt) => {
                self.table.push_scope(ScopeKind::Loop, stmt.span);
                if let Some(init) = &stmt.init {
                    self.walk_header_stmt(init)?;
                }
                if let Some(cond) = &stmt.cond {
                    self.resolve_expr(cond)?;
                }
                if let Some(post) = &stmt.post {
                    self.walk_stmt(post)?;
                }
                self.walk_block(&stmt.body, ScopeKind::Block)?;
                self.table.pop_scope()?;
                Ok(())
            }
            Stmt::Range(stmt) => {
                // the range source is evaluated outside the loop scope
                self.resolve_expr(&stmt.source)?;
                self.table.push_scope(ScopeKind::Loop, stmt.span);
                if stmt.define {
                    self.collector().collect_range(stmt)?;
                } else {
                    for target in stmt.key.iter().chain(stmt.value.iter()) {
                        self.resolve_target(target)?;
                    }
                }
                self.walk_block(&stmt.body, ScopeKind::Block)?;
                self.table.pop_scope()?;
                Ok(())
            }
            Stmt::Switch(stmt) => {
                self.table.push_scope(ScopeKind::Switch, stmt.span);
                if let Some(init) = &stmt.init {
                    self.walk_header_stmt(init)?;
                }
                if let Some(tag) = &stmt.tag {
                    self.resolve_expr(tag)?;
                }
                for clause in &stmt.cases {
                    self.resolve_exprs(&clause.exprs)?;
                    self.table.push_scope(ScopeKind::Case, clause.span);
                    self.collector().collect_statements(&clause.body)?;
                    self.walk_stmts(&clause.body)?;
                    self.table.pop_scope()?;
                }
                self.table.pop_scope()?;
                Ok(())
            }
        }
    }

    /// Left-hand side of an assignment or inc/dec statement
    fn resolve_target(&mut self, target: &Expr) -> Result<(), ResolveError> {
        match target {
            Expr::Ident(ident) if ident.is_blank() => Ok(()),
            Expr::Ident(ident) => self.resolve_ident(ident, RefKind::Write).map(|_| ()),
            other => self.resolve_expr(other),
        }
    }

    // ---- expressions ----

    fn resolve_exprs(&mut self, exprs: &[Expr]) -> Result<(), ResolveError> {
        for expr in exprs {
            self.resolve_expr(expr)?;
        }
        Ok(())
    }

    fn resolve_expr(&mut self, expr: &Expr) -> Result<(), ResolveError> {
        match expr {
            Expr::Ident(ident) if ident.is_blank() => Ok(()),
            Expr::Ident(ident) => self.resolve_ident(ident, RefKind::Read).map(|_| ()),
            Expr::Selector(selector) => self.resolve_selector(selector),
            Expr::Call { func, args, .. } => {
                self.resolve_expr(func)?;
                self.resolve_exprs(args)
            }
            Expr::BasicLit { .. } => Ok(()),
            Expr::Composite { ty, elements, span } => self.resolve_composite(ty.as_ref(), elements, *span, None),
            Expr::FuncLit {
                params,
                results,
                body,
                span,
            } => {
                self.resolve_signature_types(None, params, results)?;
                self.table.push_scope(ScopeKind::Function, *span);
                self.collector()
                    .collect_signature(None, params, results, body.span.start)?;
                self.collector().collect_statements(&body.stmts)?;
                self.walk_stmts(&body.stmts)?;
                self.table.pop_scope()?;
                Ok(())
            }
            Expr::Unary { operand, .. } => self.resolve_expr(operand),
            Expr::Binary { lhs, rhs, .. } => {
                self.resolve_expr(lhs)?;
                self.resolve_expr(rhs)
            }
            Expr::Index { base, index, .. } => {
                self.resolve_expr(base)?;
                self.resolve_expr(index)
            }
        }
    }

    fn resolve_ident(&mut self, ident: &Ident, kind: RefKind) -> Result<Binding, ResolveError> {
        let scope = self.table.current_scope()?;
        let found = ShadowingClassifier::new(&self.table).visible_from_scope(scope, &ident.name, ident.span.start);

        let binding = match found {
            Some(decl) => Binding::Declared(decl),
            None if self.predeclared.contains(ident.name.as_str()) => Binding::Predeclared,
            None if self.external.contains(ident.name.as_str()) => Binding::External,
            None => {
                if self.options.report_unresolved {
                    let candidates = self.table.names_in_chain(scope);
                    let namespace = if kind == RefKind::Type { "type" } else { "value" };
                    let diagnostic = ResolveDiagnostics::unresolved_reference(
                        self.source_span(ident.span),
                        &ident.name,
                        namespace,
                        &candidates,
                    );
                    self.diagnostics.report(diagnostic);
                }
                Binding::Unresolved
            }
        };

        if let (RefKind::Write, Binding::Declared(decl)) = (kind, binding) {
            if self.table.declaration(decl).is_some_and(|d| d.kind.is_trackable()) {
                self.modified.insert(decl);
            }
        }

        log::trace!("`{}` at {} -> {:?}", ident.name, ident.span, binding);
        self.references.push(Reference {
            id: RefId::for_len(self.references.len()),
            name: ident.name.clone(),
            span: ident.span,
            scope,
            kind,
            binding,
        });
        Ok(binding)
    }

    fn resolve_selector(&mut self, selector: &SelectorExpr) -> Result<(), ResolveError> {
        let binding = match selector.base.as_ref() {
            Expr::Ident(base) if !base.is_blank() => match self.resolve_ident(base, RefKind::Read)? {
                Binding::Declared(decl) if self.kind_of(decl) == Some(DeclKind::Package) => {
                    MemberBinding::PackageMember { package: decl }
                }
                Binding::Declared(decl) => {
                    let shape = self.shapes().shape_of_decl(decl);
                    self.member_binding(&shape, &selector.field)
                }
                Binding::Predeclared | Binding::External => MemberBinding::Unknown,
                Binding::Unresolved => {
                    let diagnostic = ResolveDiagnostics::selector_on_unresolved_base(
                        self.source_span(selector.span),
                        &base.name,
                        &selector.field.name,
                    );
                    self.diagnostics.report(diagnostic);
                    MemberBinding::Skipped
                }
            },
            base => {
                self.resolve_expr(base)?;
                let scope = self.table.current_scope()?;
                let shape = self.shapes().shape_of_expr(base, scope);
                self.member_binding(&shape, &selector.field)
            }
        };

        self.record_member(&selector.field, selector.base.span(), binding, false)
    }

    /// Look `member` up on `shape`, reporting members missing from a known struct
    fn member_binding(&mut self, shape: &Shape, member: &Ident) -> MemberBinding {
        let lookup = self.shapes().lookup_member(shape, &member.name);
        match lookup {
            MemberLookup::Field { owner, decl } => MemberBinding::Field { owner, decl },
            MemberLookup::Method { decl } => MemberBinding::Method { decl },
            MemberLookup::Missing { owner } => {
                self.report_missing_member(owner, member);
                MemberBinding::Missing { owner }
            }
            MemberLookup::Unknown => MemberBinding::Unknown,
        }
    }

    fn report_missing_member(&mut self, owner: StructTypeId, member: &Ident) {
        let owner_name = self.shapes().owner_name(owner);
        let owner_span = self.members.get(owner).map(|info| {
            let span = info
                .named
                .and_then(|named| self.table.declaration(named))
                .map_or(info.span, |decl| decl.span);
            self.source_span(span)
        });
        let candidates = self.members.member_names(owner);
        let diagnostic = ResolveDiagnostics::unknown_member(
            self.source_span(member.span),
            &member.name,
            &owner_name,
            owner_span,
            &candidates,
        );
        self.diagnostics.report(diagnostic);
    }

    fn record_member(
        &mut self,
        member: &Ident,
        base_span: Span,
        binding: MemberBinding,
        composite_key: bool,
    ) -> Result<(), ResolveError> {
        log::trace!("member `{}` at {} -> {:?}", member.name, member.span, binding);
        self.member_uses.push(MemberUse {
            name: member.name.clone(),
            span: member.span,
            base_span,
            scope: self.table.current_scope()?,
            binding,
            composite_key,
        });
        Ok(())
    }

    /// Composite literal. Identifier keys of struct literals are field names;
    /// keys of slice and map literals are ordinary expressions. Elided inner
    /// literals (`[]Person{{name: "a"}}`) inherit the element shape.
    fn resolve_composite(
        &mut self,
        ty: Option<&TypeExpr>,
        elements: &[Element],
        span: Span,
        inherited: Option<Shape>,
    ) -> Result<(), ResolveError> {
        let shape = match ty {
            Some(ty) => {
                self.resolve_type(ty)?;
                let scope = self.table.current_scope()?;
                self.shapes().shape_of_type(ty, scope, span.start)
            }
            None => inherited.unwrap_or(Shape::Opaque),
        };
        let shape = self.shapes().underlying_shape(shape.strip_pointers());
        let (key_shape, value_shape) = match &shape {
            Shape::Slice(elem) => (None, Some(elem.as_ref().clone())),
            Shape::Map(key, value) => (Some(key.as_ref().clone()), Some(value.as_ref().clone())),
            _ => (None, None),
        };
        let keyed_by_field = !matches!(shape, Shape::Slice(_) | Shape::Map(..));

        for element in elements {
            let mut field_shape = None;
            match &element.key {
                Some(Expr::Ident(key)) if keyed_by_field => {
                    let binding = self.member_binding(&shape, key);
                    if let Some(decl) = binding.decl() {
                        field_shape = Some(self.shapes().shape_of_decl(decl));
                    }
                    self.record_member(key, span, binding, true)?;
                }
                Some(Expr::Composite { ty, elements, span }) => {
                    self.resolve_composite(ty.as_ref(), elements, *span, key_shape.clone())?;
                }
                Some(key) => self.resolve_expr(key)?,
                None => {}
            }

            match &element.value {
                Expr::Composite { ty, elements, span } => {
                    let inherited = field_shape.or_else(|| value_shape.clone());
                    self.resolve_composite(ty.as_ref(), elements, *span, inherited)?;
                }
                value => self.resolve_expr(value)?,
            }
        }
        Ok(())
    }

    // ---- types ----

    fn resolve_type(&mut self, ty: &TypeExpr) -> Result<(), ResolveError> {
        match ty {
            TypeExpr::Named(ident) => self.resolve_ident(ident, RefKind::Type).map(|_| ()),
            TypeExpr::Qualified { package, name } => {
                let binding = match self.resolve_ident(package, RefKind::Type)? {
                    Binding::Declared(decl) if self.kind_of(decl) == Some(DeclKind::Package) => {
                        MemberBinding::PackageMember { package: decl }
                    }
                    Binding::Unresolved => {
                        let diagnostic = ResolveDiagnostics::selector_on_unresolved_base(
                            self.source_span(package.span.merge(name.span)),
                            &package.name,
                            &name.name,
                        );
                        self.diagnostics.report(diagnostic);
                        MemberBinding::Skipped
                    }
                    _ => MemberBinding::Unknown,
                };
                self.record_member(name, package.span, binding, false)
            }
            TypeExpr::Pointer(inner) | TypeExpr::Slice(inner) => self.resolve_type(inner),
            TypeExpr::Map { key, value } => {
                self.resolve_type(key)?;
                self.resolve_type(value)
            }
            TypeExpr::Struct(st) => {
                self.collector().register_struct(st, None)?;
                for field in &st.fields {
                    self.resolve_type(&field.ty)?;
                }
                Ok(())
            }
            TypeExpr::Func { params, results } => self.resolve_signature_types(None, params, results),
        }
    }

    // ---- helpers ----

    fn kind_of(&self, decl: DeclId) -> Option<DeclKind> {
        self.table.declaration(decl).map(|d| d.kind)
    }

    fn source_span(&self, span: Span) -> SourceSpan {
        match self.source {
            Some(file) => SourceSpan::new(
                file.offset_to_position(span.start),
                file.offset_to_position(span.end),
                self.file_id,
            ),
            None => SourceSpan::from_offsets(self.file_id, span.start, span.end),
        }
    }
}
