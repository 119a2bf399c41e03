//! Declaration collector
//!
//! Registers every name a scope introduces directly, in source order, before
//! the walk resolves any reference in that scope. Nested scopes are left for
//! the walk to collect when it enters them. Redeclaring a name is never an
//! error here; the symbol table records the shadow chain instead.

use crate::declarations::{DeclKind, TypeAnnotation};
use crate::error::ResolveError;
use crate::ids::{DeclId, StructTypeId};
use crate::members::TypeMembers;
use crate::symbol_table::SymbolTable;
use syntax::{
    Decl, Expr, FuncDecl, GoFile, Ident, Import, Param, RangeStmt, Stmt, StructType, TypeExpr, ValueDecl,
    ValueKind,
};

pub struct DeclarationCollector<'a> {
    table: &'a mut SymbolTable,
    members: &'a mut TypeMembers,
}

impl<'a> DeclarationCollector<'a> {
    pub fn new(table: &'a mut SymbolTable, members: &'a mut TypeMembers) -> Self {
        Self { table, members }
    }

    /// Collect imports and top-level declarations into the current (package)
    /// scope, then attach methods to their receiver types.
    pub fn collect_package(&mut self, file: &GoFile) -> Result<(), ResolveError> {
        let before = self.table.declarations().len();
        let mut methods = Vec::new();

        for import in &file.imports {
            self.collect_import(import)?;
        }

        for decl in &file.decls {
            match decl {
                Decl::Func(func) if func.receiver.is_some() => {
                    methods.push(self.collect_method(func)?);
                }
                Decl::Func(func) => {
                    let name = checked_name(&func.name)?;
                    if !name.is_blank() {
                        self.table.declare(
                            &name.name,
                            DeclKind::Function,
                            name.span,
                            func.span.start,
                            Some(signature(func.results.as_slice())),
                        )?;
                    }
                }
                Decl::Value(value) => self.collect_value(value, DeclKind::Global)?,
                Decl::Type(ty) => {
                    self.collect_type(&ty.name, &ty.ty)?;
                }
            }
        }

        let scope = self.table.current_scope()?;
        for (receiver, name, method) in methods {
            match self.table.lookup_in(scope, &receiver) {
                Some(owner) if self.table.declaration(owner).is_some_and(|d| d.kind.is_type()) => {
                    self.members.add_method(owner, &name, method);
                }
                _ => log::debug!("receiver type `{}` of method `{}` is not declared in this unit", receiver, name),
            }
        }

        log::debug!(
            "collected {} package-level declarations",
            self.table.declarations().len() - before
        );
        Ok(())
    }

    fn collect_import(&mut self, import: &Import) -> Result<(), ResolveError> {
        if import.path.is_empty() {
            return Err(ResolveError::malformed(import.span, "import has no path"));
        }
        if import.is_dot() {
            log::debug!("dot import of `{}` binds no name", import.path);
            return Ok(());
        }

        let name = import.binding_name();
        if name == "_" || name.is_empty() {
            return Ok(());
        }
        self.table
            .declare(name, DeclKind::Package, import.name_span(), 0, None)?;
        Ok(())
    }

    fn collect_method(&mut self, func: &FuncDecl) -> Result<(String, String, DeclId), ResolveError> {
        let name = checked_name(&func.name)?;
        let receiver = func
            .receiver
            .as_ref()
            .and_then(|r| r.ty.base_name())
            .ok_or_else(|| ResolveError::malformed(func.span, "method receiver must name a type"))?;

        let decl = self.table.record_detached(
            &name.name,
            DeclKind::Method,
            name.span,
            Some(signature(&func.results)),
        )?;
        Ok((receiver.name.clone(), name.name.clone(), decl))
    }

    fn collect_value(&mut self, value: &ValueDecl, var_kind: DeclKind) -> Result<(), ResolveError> {
        if value.names.is_empty() {
            return Err(ResolveError::malformed(value.span, "value declaration declares no names"));
        }
        if let Some(ty) = &value.ty {
            self.register_type(ty, None)?;
        }

        let kind = match value.kind {
            ValueKind::Var => var_kind,
            ValueKind::Const => DeclKind::Constant,
        };
        for (index, name) in value.names.iter().enumerate() {
            let name = checked_name(name)?;
            if name.is_blank() {
                continue;
            }
            let annotation = value_annotation(value.ty.as_ref(), &value.values, index, value.names.len());
            self.table
                .declare(&name.name, kind, name.span, value.span.end, annotation)?;
        }
        Ok(())
    }

    /// Named type declaration; visible from its own name so that recursive
    /// types (`type node struct { next *node }`) resolve
    fn collect_type(&mut self, name: &Ident, ty: &TypeExpr) -> Result<DeclId, ResolveError> {
        let name = checked_name(name)?;
        let kind = match ty {
            TypeExpr::Struct(_) => DeclKind::Struct,
            _ => DeclKind::TypeName,
        };
        let decl = self.table.declare(
            &name.name,
            kind,
            name.span,
            name.span.start,
            Some(TypeAnnotation::Declared(ty.clone())),
        )?;
        self.register_type(ty, Some(decl))?;
        Ok(decl)
    }

    /// Declare receiver, parameters and named results in the current
    /// (function) scope. They are visible from `visible_from`, the start of
    /// the body, so the signature's own types never see them.
    pub fn collect_signature(
        &mut self,
        receiver: Option<&Param>,
        params: &[Param],
        results: &[Param],
        visible_from: usize,
    ) -> Result<Vec<DeclId>, ResolveError> {
        let mut declared = Vec::new();
        for param in receiver.into_iter().chain(params).chain(results) {
            self.register_type(&param.ty, None)?;
            let Some(name) = &param.name else {
                continue;
            };
            let name = checked_name(name)?;
            if name.is_blank() {
                continue;
            }
            declared.push(self.table.declare(
                &name.name,
                DeclKind::Parameter,
                name.span,
                visible_from,
                Some(TypeAnnotation::Declared(param.ty.clone())),
            )?);
        }
        Ok(declared)
    }

    pub fn collect_statements(&mut self, stmts: &[Stmt]) -> Result<(), ResolveError> {
        let before = self.table.declarations().len();
        for stmt in stmts {
            self.collect_statement(stmt)?;
        }
        log::debug!(
            "collected {} declarations in {}",
            self.table.declarations().len() - before,
            self.table.current_scope()?
        );
        Ok(())
    }

    /// Declarations a single statement introduces into the current scope.
    /// Statements that open their own scope contribute nothing here.
    pub fn collect_statement(&mut self, stmt: &Stmt) -> Result<(), ResolveError> {
        match stmt {
            Stmt::ShortVarDecl(decl) => {
                if decl.targets.is_empty() {
                    return Err(ResolveError::malformed(decl.span, "short variable declaration has no targets"));
                }
                for (index, target) in decl.targets.iter().enumerate() {
                    let name = target_ident(target)?;
                    if name.is_blank() {
                        continue;
                    }
                    let annotation = value_annotation(None, &decl.values, index, decl.targets.len());
                    self.table
                        .declare(&name.name, DeclKind::Local, name.span, decl.span.end, annotation)?;
                }
                Ok(())
            }
            Stmt::Value(value) => self.collect_value(value, DeclKind::Local),
            Stmt::Type(ty) => self.collect_type(&ty.name, &ty.ty).map(|_| ()),
            _ => Ok(()),
        }
    }

    /// Range variables of `for k, v := range source`, visible in the body only
    pub fn collect_range(&mut self, range: &RangeStmt) -> Result<(), ResolveError> {
        if !range.define {
            return Ok(());
        }

        let slots = [
            (range.key.as_ref(), TypeAnnotation::RangeKey(range.source.clone())),
            (range.value.as_ref(), TypeAnnotation::RangeValue(range.source.clone())),
        ];
        for (target, annotation) in slots {
            let Some(target) = target else {
                continue;
            };
            let name = target_ident(target)?;
            if name.is_blank() {
                continue;
            }
            self.table.declare(
                &name.name,
                DeclKind::Local,
                name.span,
                range.body.span.start,
                Some(annotation),
            )?;
        }
        Ok(())
    }

    /// Give every struct literal inside `ty` its own field map
    pub fn register_type(&mut self, ty: &TypeExpr, named: Option<DeclId>) -> Result<(), ResolveError> {
        match ty {
            TypeExpr::Named(_) | TypeExpr::Qualified { .. } => Ok(()),
            TypeExpr::Pointer(inner) | TypeExpr::Slice(inner) => self.register_type(inner, None),
            TypeExpr::Map { key, value } => {
                self.register_type(key, None)?;
                self.register_type(value, None)
            }
            TypeExpr::Struct(st) => self.register_struct(st, named).map(|_| ()),
            TypeExpr::Func { params, results } => {
                for param in params.iter().chain(results) {
                    self.register_type(&param.ty, None)?;
                }
                Ok(())
            }
        }
    }

    pub fn register_struct(&mut self, st: &StructType, named: Option<DeclId>) -> Result<StructTypeId, ResolveError> {
        let scope = self.table.current_scope()?;
        let (id, created) = self.members.register_struct(st.span, scope, named);
        if !created {
            return Ok(id);
        }

        for field in &st.fields {
            let annotation = Some(TypeAnnotation::Declared(field.ty.clone()));
            if field.is_embedded() {
                let base = field
                    .ty
                    .base_name()
                    .ok_or_else(|| ResolveError::malformed(field.span, "embedded field must name a type"))?;
                let decl = self
                    .table
                    .record_detached(&base.name, DeclKind::Field, base.span, annotation)?;
                self.members.add_field(id, &base.name, decl, true);
            } else {
                for name in &field.names {
                    let name = checked_name(name)?;
                    if name.is_blank() {
                        continue;
                    }
                    let decl = self
                        .table
                        .record_detached(&name.name, DeclKind::Field, name.span, annotation.clone())?;
                    self.members.add_field(id, &name.name, decl, false);
                }
            }
            self.register_type(&field.ty, None)?;
        }
        Ok(id)
    }
}

fn checked_name(name: &Ident) -> Result<&Ident, ResolveError> {
    if name.name.is_empty() {
        Err(ResolveError::malformed(name.span, "declaration is missing a name"))
    } else {
        Ok(name)
    }
}

fn target_ident(target: &Expr) -> Result<&Ident, ResolveError> {
    match target {
        Expr::Ident(ident) => checked_name(ident),
        other => Err(ResolveError::malformed(
            other.span(),
            "declaration target must be an identifier",
        )),
    }
}

fn signature(results: &[Param]) -> TypeAnnotation {
    TypeAnnotation::Signature(results.iter().map(|p| p.ty.clone()).collect())
}

fn value_annotation(ty: Option<&TypeExpr>, values: &[Expr], index: usize, count: usize) -> Option<TypeAnnotation> {
    if let Some(ty) = ty {
        Some(TypeAnnotation::Declared(ty.clone()))
    } else if values.len() == count {
        values.get(index).cloned().map(TypeAnnotation::Inferred)
    } else if values.len() == 1 {
        Some(TypeAnnotation::Tuple(values[0].clone(), index))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shadowing::DeclarationOrder;
    use crate::symbol_table::ScopeKind;
    use syntax::{AstBuilder, Span};

    fn setup() -> (SymbolTable, TypeMembers) {
        let mut table = SymbolTable::new(DeclarationOrder::Sequential);
        table.push_scope(ScopeKind::Package, Span::new(0, 10_000));
        (table, TypeMembers::new())
    }

    #[test]
    fn test_package_collection_with_methods() {
        let b = AstBuilder::new();
        let package = b.package("main");
        let imports = vec![b.import("fmt"), b.import_as("_", "embed")];
        let decls = vec![
            b.type_decl("Person", |b| {
                b.struct_type(|b| {
                    vec![
                        b.field(b.ident("name"), b.ty("string")),
                        b.field(b.ident("mom"), b.pointer(b.ty("Person"))),
                    ]
                })
            }),
            b.method("self", "Person", true, "GetName", |b| {
                (vec![], vec![b.unnamed(b.ty("string"))], b.block(|_| vec![]))
            }),
            b.global_var(vec![b.ident("p")], None, vec![b.call(b.name("NewPerson"), vec![])]),
        ];
        let file = b.file(package, imports, decls);

        let (mut table, mut members) = setup();
        DeclarationCollector::new(&mut table, &mut members)
            .collect_package(&file)
            .unwrap();

        let person = table.lookup("Person").unwrap();
        assert_eq!(table.declaration(person).unwrap().kind, DeclKind::Struct);
        assert!(table.lookup("fmt").is_some());
        assert!(table.lookup("_").is_none());
        assert!(table.lookup("GetName").is_none());

        let st = members.struct_of(person).unwrap();
        assert!(members.field(st, "mom").is_some());
        assert!(members.method(person, "GetName").is_some());
        assert_eq!(table.declaration(table.lookup("p").unwrap()).unwrap().kind, DeclKind::Global);
    }

    #[test]
    fn test_short_var_targets_and_blank() {
        let b = AstBuilder::new();
        let stmt = b.define(&["a", "_", "x"], |b| vec![b.call(b.name("f"), vec![])]);

        let (mut table, mut members) = setup();
        table.push_scope(ScopeKind::Function, Span::new(0, 5_000));
        DeclarationCollector::new(&mut table, &mut members)
            .collect_statement(&stmt)
            .unwrap();

        let x = table.declaration(table.lookup("x").unwrap()).unwrap();
        assert_eq!(x.visible_from, stmt.span().end);
        assert!(matches!(x.annotation, Some(TypeAnnotation::Tuple(_, 2))));
        assert!(table.lookup("_").is_none());
    }

    #[test]
    fn test_selector_target_is_malformed() {
        let b = AstBuilder::new();
        let stmt = b.short_var(vec![b.selector(b.name("a"), "b")], vec![b.int(1)]);

        let (mut table, mut members) = setup();
        let err = DeclarationCollector::new(&mut table, &mut members)
            .collect_statement(&stmt)
            .unwrap_err();
        assert!(matches!(err, ResolveError::MalformedAst { .. }));
    }

    #[test]
    fn test_missing_name_is_malformed() {
        let b = AstBuilder::new();
        let decl = b.global_var(vec![Ident::new("", Span::new(3, 3))], Some(b.ty("int")), vec![]);
        let file = b.file(b.package("main"), vec![], vec![decl]);

        let (mut table, mut members) = setup();
        let err = DeclarationCollector::new(&mut table, &mut members)
            .collect_package(&file)
            .unwrap_err();
        assert_eq!(err, ResolveError::malformed(Span::new(3, 3), "declaration is missing a name"));
    }

    #[test]
    fn test_anonymous_struct_fields_stay_out_of_scope() {
        let b = AstBuilder::new();
        let stmt = b.local_var(
            vec![b.ident("container")],
            Some(b.struct_type(|b| vec![b.field(b.ident("y"), b.ty("int"))])),
            vec![],
        );

        let (mut table, mut members) = setup();
        DeclarationCollector::new(&mut table, &mut members)
            .collect_statement(&stmt)
            .unwrap();

        assert!(table.lookup("container").is_some());
        assert!(table.lookup("y").is_none());
        assert_eq!(members.structs().len(), 1);
        assert!(members.field(members.structs()[0].id, "y").is_some());
    }
}
