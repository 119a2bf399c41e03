//! Value shapes for selector bases
//!
//! A shape is the structural information needed to look up `.member` on an
//! expression: which struct (or named type) a value has, through pointers,
//! slices, maps, calls and declared results. This is deliberately not type
//! inference; anything the declarations do not spell out is `Opaque`.

use crate::declarations::{DeclKind, TypeAnnotation};
use crate::ids::{DeclId, ScopeId, StructTypeId};
use crate::members::TypeMembers;
use crate::shadowing::ShadowingClassifier;
use crate::symbol_table::SymbolTable;
use serde::Serialize;
use syntax::{Expr, TypeExpr, UnaryOp};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Shape {
    /// Value of an anonymous (or named) struct literal type
    Struct(StructTypeId),
    /// Value of a named type
    Named(DeclId),
    /// The expression denotes a type, as in a conversion `T(x)`
    TypeName(DeclId),
    Pointer(Box<Shape>),
    Slice(Box<Shape>),
    Map(Box<Shape>, Box<Shape>),
    /// Callable value; the shapes of its results
    Func(Vec<Shape>),
    /// Imported package
    Package(DeclId),
    Opaque,
}

impl Shape {
    /// Strip pointers, as member selection does
    pub fn strip_pointers(&self) -> &Shape {
        match self {
            Shape::Pointer(inner) => inner.strip_pointers(),
            other => other,
        }
    }
}

/// Outcome of looking up a member name on a shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberLookup {
    Field { owner: StructTypeId, decl: DeclId },
    Method { decl: DeclId },
    /// The struct is fully known and has no such member
    Missing { owner: StructTypeId },
    Unknown,
}

pub struct ShapeEvaluator<'a> {
    table: &'a SymbolTable,
    members: &'a TypeMembers,
    max_depth: usize,
}

impl<'a> ShapeEvaluator<'a> {
    pub fn new(table: &'a SymbolTable, members: &'a TypeMembers, max_depth: usize) -> Self {
        Self {
            table,
            members,
            max_depth,
        }
    }

    fn lookup(&self, scope: ScopeId, name: &str, offset: usize) -> Option<DeclId> {
        ShadowingClassifier::new(self.table).visible_from_scope(scope, name, offset)
    }

    pub fn shape_of_type(&self, ty: &TypeExpr, scope: ScopeId, offset: usize) -> Shape {
        self.type_shape(ty, scope, offset, 0)
    }

    /// Shape of `expr` evaluated in `scope`; identifiers bind at their own offsets
    pub fn shape_of_expr(&self, expr: &Expr, scope: ScopeId) -> Shape {
        self.expr_shape(expr, scope, 0)
    }

    pub fn shape_of_decl(&self, decl: DeclId) -> Shape {
        self.decl_shape(decl, 0)
    }

    pub fn lookup_member(&self, shape: &Shape, name: &str) -> MemberLookup {
        self.member(shape, name, 0)
    }

    /// Structure behind a named type: `Struct` for struct types, otherwise
    /// whatever the type is defined as (`type People []Person` is a slice)
    pub fn underlying_shape(&self, shape: &Shape) -> Shape {
        let mut current = shape.clone();
        for depth in 0..self.max_depth {
            let Shape::Named(decl) = current else {
                return current;
            };
            if let Some(owner) = self.members.struct_of(decl) {
                return Shape::Struct(owner);
            }
            current = self.underlying(decl, depth + 1);
        }
        Shape::Opaque
    }

    fn type_shape(&self, ty: &TypeExpr, scope: ScopeId, offset: usize, depth: usize) -> Shape {
        if depth > self.max_depth {
            return Shape::Opaque;
        }
        let inner = |ty: &TypeExpr| Box::new(self.type_shape(ty, scope, offset, depth + 1));

        match ty {
            TypeExpr::Named(ident) => match self.lookup(scope, &ident.name, offset) {
                Some(decl) if self.kind_of(decl).is_some_and(DeclKind::is_type) => Shape::Named(decl),
                _ => Shape::Opaque,
            },
            TypeExpr::Qualified { .. } => Shape::Opaque,
            TypeExpr::Pointer(ty) => Shape::Pointer(inner(ty)),
            TypeExpr::Slice(ty) => Shape::Slice(inner(ty)),
            TypeExpr::Map { key, value } => Shape::Map(inner(key), inner(value)),
            TypeExpr::Struct(st) => self
                .members
                .struct_at(st.span)
                .map_or(Shape::Opaque, Shape::Struct),
            TypeExpr::Func { results, .. } => Shape::Func(
                results
                    .iter()
                    .map(|p| self.type_shape(&p.ty, scope, offset, depth + 1))
                    .collect(),
            ),
        }
    }

    fn expr_shape(&self, expr: &Expr, scope: ScopeId, depth: usize) -> Shape {
        if depth > self.max_depth {
            return Shape::Opaque;
        }

        match expr {
            Expr::Ident(ident) if ident.is_blank() => Shape::Opaque,
            Expr::Ident(ident) => self
                .lookup(scope, &ident.name, ident.span.start)
                .map_or(Shape::Opaque, |decl| self.decl_shape(decl, depth + 1)),
            Expr::Selector(selector) => {
                let base = self.expr_shape(&selector.base, scope, depth + 1);
                match self.member(&base, &selector.field.name, depth + 1) {
                    MemberLookup::Field { decl, .. } | MemberLookup::Method { decl } => {
                        self.decl_shape(decl, depth + 1)
                    }
                    _ => Shape::Opaque,
                }
            }
            Expr::Call { func, args, .. } => self.call_result(func, args, 0, scope, depth + 1),
            Expr::Composite { ty: Some(ty), span, .. } => self.type_shape(ty, scope, span.start, depth + 1),
            Expr::Composite { ty: None, .. } => Shape::Opaque,
            Expr::FuncLit { results, span, .. } => Shape::Func(
                results
                    .iter()
                    .map(|p| self.type_shape(&p.ty, scope, span.start, depth + 1))
                    .collect(),
            ),
            Expr::Unary { op: UnaryOp::Addr, operand, .. } => {
                Shape::Pointer(Box::new(self.expr_shape(operand, scope, depth + 1)))
            }
            Expr::Unary { op: UnaryOp::Deref, operand, .. } => match self.expr_shape(operand, scope, depth + 1) {
                Shape::Pointer(inner) => *inner,
                _ => Shape::Opaque,
            },
            Expr::Index { base, .. } => match self.expr_shape(base, scope, depth + 1) {
                Shape::Slice(elem) => *elem,
                Shape::Map(_, value) => *value,
                _ => Shape::Opaque,
            },
            Expr::Unary { .. } | Expr::Binary { .. } | Expr::BasicLit { .. } => Shape::Opaque,
        }
    }

    /// Shape of result `index` of calling `func`
    fn call_result(&self, func: &Expr, args: &[Expr], index: usize, scope: ScopeId, depth: usize) -> Shape {
        // builtin `new(T)` yields *T
        if let Expr::Ident(ident) = func {
            if ident.name == "new" && self.lookup(scope, "new", ident.span.start).is_none() {
                return match args.first().map(|arg| self.expr_shape(arg, scope, depth + 1)) {
                    Some(Shape::TypeName(decl)) if index == 0 => Shape::Pointer(Box::new(Shape::Named(decl))),
                    _ => Shape::Opaque,
                };
            }
        }

        match self.expr_shape(func, scope, depth + 1) {
            Shape::Func(mut results) if index < results.len() => results.swap_remove(index),
            Shape::TypeName(decl) if index == 0 => Shape::Named(decl),
            _ => Shape::Opaque,
        }
    }

    fn decl_shape(&self, id: DeclId, depth: usize) -> Shape {
        if depth > self.max_depth {
            return Shape::Opaque;
        }
        let Some(decl) = self.table.declaration(id) else {
            return Shape::Opaque;
        };

        match decl.kind {
            DeclKind::Package => return Shape::Package(id),
            DeclKind::Struct | DeclKind::TypeName => return Shape::TypeName(id),
            _ => {}
        }

        let (scope, offset) = (decl.scope, decl.span.start);
        match &decl.annotation {
            Some(TypeAnnotation::Signature(results)) => Shape::Func(
                results
                    .iter()
                    .map(|ty| self.type_shape(ty, scope, offset, depth + 1))
                    .collect(),
            ),
            Some(TypeAnnotation::Declared(ty)) => self.type_shape(ty, scope, offset, depth + 1),
            Some(TypeAnnotation::Inferred(expr)) => self.expr_shape(expr, scope, depth + 1),
            Some(TypeAnnotation::Tuple(expr, index)) => match expr {
                Expr::Call { func, args, .. } => self.call_result(func, args, *index, scope, depth + 1),
                // comma-ok forms: only the first slot carries the value
                _ if *index == 0 => self.expr_shape(expr, scope, depth + 1),
                _ => Shape::Opaque,
            },
            Some(TypeAnnotation::RangeKey(source)) => match self.expr_shape(source, scope, depth + 1) {
                Shape::Map(key, _) => *key,
                _ => Shape::Opaque,
            },
            Some(TypeAnnotation::RangeValue(source)) => match self.expr_shape(source, scope, depth + 1) {
                Shape::Slice(elem) => *elem,
                Shape::Map(_, value) => *value,
                _ => Shape::Opaque,
            },
            None => Shape::Opaque,
        }
    }

    fn member(&self, shape: &Shape, name: &str, depth: usize) -> MemberLookup {
        if depth > self.max_depth {
            return MemberLookup::Unknown;
        }

        match shape.strip_pointers() {
            Shape::Struct(owner) => self.struct_member(*owner, name, depth),
            Shape::Named(decl) => {
                if let Some(method) = self.members.method(*decl, name) {
                    return MemberLookup::Method { decl: method };
                }
                if let Some(owner) = self.members.struct_of(*decl) {
                    return self.struct_member(owner, name, depth);
                }
                // defined type over another named type keeps the fields only
                let underlying = self.underlying(*decl, depth + 1);
                match self.member(&underlying, name, depth + 1) {
                    MemberLookup::Method { .. } => MemberLookup::Unknown,
                    other => other,
                }
            }
            Shape::TypeName(decl) => self
                .members
                .method(*decl, name)
                .map_or(MemberLookup::Unknown, |decl| MemberLookup::Method { decl }),
            _ => MemberLookup::Unknown,
        }
    }

    fn struct_member(&self, owner: StructTypeId, name: &str, depth: usize) -> MemberLookup {
        let Some(info) = self.members.get(owner) else {
            return MemberLookup::Unknown;
        };
        if let Some(decl) = info.fields.get(name) {
            return MemberLookup::Field { owner, decl: *decl };
        }
        if let Some(method) = info.named.and_then(|named| self.members.method(named, name)) {
            return MemberLookup::Method { decl: method };
        }

        let mut opaque_embedding = false;
        for embedded in &info.embedded {
            let shape = self.decl_shape(*embedded, depth + 1);
            match self.member(&shape, name, depth + 1) {
                found @ (MemberLookup::Field { .. } | MemberLookup::Method { .. }) => return found,
                MemberLookup::Unknown => opaque_embedding = true,
                MemberLookup::Missing { .. } => {}
            }
        }

        if opaque_embedding {
            MemberLookup::Unknown
        } else {
            MemberLookup::Missing { owner }
        }
    }

    fn underlying(&self, decl: DeclId, depth: usize) -> Shape {
        match self.table.declaration(decl).map(|d| (&d.annotation, d.scope, d.span.start)) {
            Some((Some(TypeAnnotation::Declared(ty)), scope, offset)) => self.type_shape(ty, scope, offset, depth),
            _ => Shape::Opaque,
        }
    }

    fn kind_of(&self, decl: DeclId) -> Option<DeclKind> {
        self.table.declaration(decl).map(|d| d.kind)
    }

    /// Display name of a struct for diagnostics
    pub fn owner_name(&self, owner: StructTypeId) -> String {
        self.members
            .get(owner)
            .and_then(|info| info.named)
            .and_then(|named| self.table.declaration(named))
            .map_or_else(|| "struct{...}".to_string(), |decl| decl.name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::DeclarationCollector;
    use crate::shadowing::DeclarationOrder;
    use crate::symbol_table::ScopeKind;
    use syntax::{AstBuilder, GoFile};

    fn person_file(b: &AstBuilder) -> GoFile {
        let package = b.package("main");
        let decls = vec![
            b.type_decl("Person", |b| {
                b.struct_type(|b| {
                    vec![
                        b.field(b.ident("name"), b.ty("string")),
                        b.field(b.ident("mom"), b.pointer(b.ty("Person"))),
                    ]
                })
            }),
            b.type_decl("Employee", |b| {
                b.struct_type(|b| vec![b.embedded(b.ty("Person")), b.field(b.ident("salary"), b.ty("int"))])
            }),
            b.method("self", "Person", true, "GetMom", |b| {
                let results = vec![b.unnamed(b.pointer(b.ty("Person")))];
                (vec![], results, b.block(|_| vec![]))
            }),
            b.func_returning("NewPerson", |b| {
                let results = vec![b.unnamed(b.pointer(b.ty("Person")))];
                (vec![], results, b.block(|_| vec![]))
            }),
            b.global_var(vec![b.ident("p")], None, vec![b.call(b.name("NewPerson"), vec![])]),
            b.global_var(vec![b.ident("people")], Some(b.slice(b.ty("Person"))), vec![]),
            b.global_var(vec![b.ident("e")], Some(b.ty("Employee")), vec![]),
        ];
        b.file(package, vec![], decls)
    }

    fn collect(file: &GoFile) -> (SymbolTable, TypeMembers) {
        let mut table = SymbolTable::new(DeclarationOrder::Sequential);
        let mut members = TypeMembers::new();
        table.push_scope(ScopeKind::Package, file.span);
        DeclarationCollector::new(&mut table, &mut members)
            .collect_package(file)
            .unwrap();
        (table, members)
    }

    #[test]
    fn test_call_result_shape() {
        let b = AstBuilder::new();
        let file = person_file(&b);
        let (table, members) = collect(&file);
        let eval = ShapeEvaluator::new(&table, &members, 16);

        let person = table.lookup("Person").unwrap();
        let p = table.lookup("p").unwrap();
        assert_eq!(eval.shape_of_decl(p), Shape::Pointer(Box::new(Shape::Named(person))));
        assert!(matches!(eval.lookup_member(&eval.shape_of_decl(p), "name"), MemberLookup::Field { .. }));
        assert!(matches!(eval.lookup_member(&eval.shape_of_decl(p), "GetMom"), MemberLookup::Method { .. }));
        assert!(matches!(eval.lookup_member(&eval.shape_of_decl(p), "age"), MemberLookup::Missing { .. }));
    }

    #[test]
    fn test_selector_chain_and_index() {
        let b = AstBuilder::new();
        let file = person_file(&b);
        let chain = b.selector(b.call(b.selector(b.name("p"), "GetMom"), vec![]), "mom");
        let indexed = b.index(b.name("people"), b.int(0));
        let (table, members) = collect(&file);
        let eval = ShapeEvaluator::new(&table, &members, 16);
        let root = ScopeId::from_raw(0);

        let person = table.lookup("Person").unwrap();
        assert_eq!(eval.shape_of_expr(&chain, root), Shape::Pointer(Box::new(Shape::Named(person))));
        assert_eq!(eval.shape_of_expr(&indexed, root), Shape::Named(person));
    }

    #[test]
    fn test_promoted_field_through_embedding() {
        let b = AstBuilder::new();
        let file = person_file(&b);
        let (table, members) = collect(&file);
        let eval = ShapeEvaluator::new(&table, &members, 16);

        let e = eval.shape_of_decl(table.lookup("e").unwrap());
        match eval.lookup_member(&e, "name") {
            MemberLookup::Field { decl, .. } => {
                assert_eq!(table.declaration(decl).unwrap().name, "name");
            }
            other => panic!("expected promoted field, got {:?}", other),
        }
        assert!(matches!(eval.lookup_member(&e, "GetMom"), MemberLookup::Method { .. }));
        assert!(matches!(eval.lookup_member(&e, "Person"), MemberLookup::Field { .. }));
    }

    #[test]
    fn test_underlying_shape_of_defined_slice() {
        let b = AstBuilder::new();
        let package = b.package("main");
        let decls = vec![
            b.type_decl("Person", |b| b.struct_type(|b| vec![b.field(b.ident("name"), b.ty("string"))])),
            b.type_decl("People", |b| b.slice(b.ty("Person"))),
        ];
        let file = b.file(package, vec![], decls);
        let (table, members) = collect(&file);
        let eval = ShapeEvaluator::new(&table, &members, 16);

        let person = table.lookup("Person").unwrap();
        let people = table.lookup("People").unwrap();
        assert_eq!(
            eval.underlying_shape(&Shape::Named(people)),
            Shape::Slice(Box::new(Shape::Named(person)))
        );
        assert!(matches!(eval.underlying_shape(&Shape::Named(person)), Shape::Struct(_)));
    }

    #[test]
    fn test_depth_bound_stops_cycles() {
        let b = AstBuilder::new();
        let package = b.package("main");
        let decls = vec![
            b.global_var(vec![b.ident("a")], None, vec![b.name("c")]),
            b.global_var(vec![b.ident("c")], None, vec![b.name("a")]),
        ];
        let file = b.file(package, vec![], decls);
        let (table, members) = collect(&file);
        let eval = ShapeEvaluator::new(&table, &members, 8);

        assert_eq!(eval.shape_of_decl(table.lookup("a").unwrap()), Shape::Opaque);
    }
}
