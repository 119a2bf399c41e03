//! Scope tree and symbol table
//!
//! The table owns every scope and declaration of one compilation unit. Scopes
//! are pushed and popped as the walk enters and leaves syntax nodes, but they
//! are never removed: a popped scope only becomes inactive, so declarations
//! stay reachable from references that already bound to them and from
//! position queries after the walk.

use crate::declarations::{DeclKind, Declaration, TypeAnnotation};
use crate::error::ResolveError;
use crate::ids::{DeclId, ScopeId};
use crate::shadowing::{DeclarationOrder, ShadowingClassifier};
use indexmap::IndexMap;
use serde::Serialize;
use smallvec::SmallVec;
use std::fmt;
use syntax::Span;

/// The kind of scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScopeKind {
    /// File-level scope holding imports and top-level declarations
    Package,
    /// Parameters and the outermost statements of a function body
    Function,
    /// Braced block
    Block,
    /// Implicit scope of a `for` header
    Loop,
    /// Implicit scope of an `if` header
    If,
    /// Implicit scope of a `switch` header
    Switch,
    /// Body of one `case` clause
    Case,
}

impl ScopeKind {
    /// Names declared here are visible in the whole scope, regardless of
    /// declaration order
    pub fn allows_forward_references(self) -> bool {
        matches!(self, ScopeKind::Package)
    }

    /// Check if this scope kind can hold package-level declarations
    pub fn is_package(self) -> bool {
        matches!(self, ScopeKind::Package)
    }
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScopeKind::Package => "package",
            ScopeKind::Function => "function",
            ScopeKind::Block => "block",
            ScopeKind::Loop => "loop",
            ScopeKind::If => "if",
            ScopeKind::Switch => "switch",
            ScopeKind::Case => "case",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Scope {
    pub id: ScopeId,
    pub kind: ScopeKind,
    /// Enclosing scope (None for the package scope)
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
    /// Depth in the scope tree (0 for the package scope)
    pub depth: u32,
    pub span: Span,
    /// Latest declaration of each name bound in this scope
    pub bindings: IndexMap<String, DeclId>,
    /// Every declaration introduced here, bound or detached, in order
    pub declarations: Vec<DeclId>,
    /// Whether this scope is still on the stack
    pub is_active: bool,
}

impl Scope {
    fn new(id: ScopeId, kind: ScopeKind, parent: Option<ScopeId>, depth: u32, span: Span) -> Self {
        Self {
            id,
            kind,
            parent,
            children: Vec::new(),
            depth,
            span,
            bindings: IndexMap::new(),
            declarations: Vec::new(),
            is_active: true,
        }
    }

    /// Latest binding of a name in this scope only
    pub fn get_binding(&self, name: &str) -> Option<DeclId> {
        self.bindings.get(name).copied()
    }

    pub fn has_binding(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} scope {} at {}", self.kind, self.id, self.span)
    }
}

/// Scope stack plus the declarations of one compilation unit
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    declarations: Vec<Declaration>,
    stack: SmallVec<[ScopeId; 8]>,
    order: DeclarationOrder,
}

impl SymbolTable {
    pub fn new(order: DeclarationOrder) -> Self {
        Self {
            order,
            ..Self::default()
        }
    }

    pub fn order(&self) -> DeclarationOrder {
        self.order
    }

    /// Open a scope nested in the current one
    pub fn push_scope(&mut self, kind: ScopeKind, span: Span) -> ScopeId {
        let id = ScopeId::for_len(self.scopes.len());
        let parent = self.stack.last().copied();
        let depth = parent.map_or(0, |p| self.scopes[p.index()].depth + 1);

        if let Some(parent) = parent {
            self.scopes[parent.index()].children.push(id);
        }
        self.scopes.push(Scope::new(id, kind, parent, depth, span));
        self.stack.push(id);

        log::debug!("push {} scope {} at {} (depth {})", kind, id, span, depth);
        id
    }

    /// Close the current scope. Its declarations stay in the table but are no
    /// longer found by `lookup`.
    pub fn pop_scope(&mut self) -> Result<ScopeId, ResolveError> {
        let id = self.stack.pop().ok_or(ResolveError::ScopeUnderflow)?;
        let scope = &mut self.scopes[id.index()];
        scope.is_active = false;

        log::debug!(
            "pop {} scope {} ({} bindings)",
            scope.kind,
            id,
            scope.bindings.len()
        );
        Ok(id)
    }

    pub fn current_scope(&self) -> Result<ScopeId, ResolveError> {
        self.stack.last().copied().ok_or(ResolveError::ScopeUnderflow)
    }

    /// Number of open scopes
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Bind `name` in the current scope.
    ///
    /// `shadows` is set to the declaration of the same name visible at `span`
    /// before this one: an earlier declaration in the same scope, or one from
    /// an enclosing scope. Names introduced alongside it in the same
    /// statement are unaffected.
    pub fn declare(
        &mut self,
        name: &str,
        kind: DeclKind,
        span: Span,
        visible_from: usize,
        annotation: Option<TypeAnnotation>,
    ) -> Result<DeclId, ResolveError> {
        let scope = self.current_scope()?;
        let redeclares = self.scopes[scope.index()].get_binding(name);
        let shadows = redeclares.or_else(|| {
            self.scopes[scope.index()]
                .parent
                .and_then(|parent| ShadowingClassifier::new(self).visible_from_scope(parent, name, span.start))
        });

        let id = self.push_declaration(name, kind, scope, span, visible_from, annotation);
        let decl = &mut self.declarations[id.index()];
        decl.shadows = shadows;
        decl.redeclares = redeclares;
        self.scopes[scope.index()].bindings.insert(name.to_string(), id);

        log::trace!("declare {} `{}` in {} (shadows {:?})", kind, name, scope, shadows);
        Ok(id)
    }

    /// Record a declaration owned by the current scope without binding its
    /// name there. Used for struct fields and methods, which are only reached
    /// through selectors.
    pub fn record_detached(
        &mut self,
        name: &str,
        kind: DeclKind,
        span: Span,
        annotation: Option<TypeAnnotation>,
    ) -> Result<DeclId, ResolveError> {
        let scope = self.current_scope()?;
        Ok(self.push_declaration(name, kind, scope, span, span.start, annotation))
    }

    fn push_declaration(
        &mut self,
        name: &str,
        kind: DeclKind,
        scope: ScopeId,
        span: Span,
        visible_from: usize,
        annotation: Option<TypeAnnotation>,
    ) -> DeclId {
        let id = DeclId::for_len(self.declarations.len());
        self.declarations.push(Declaration {
            id,
            name: name.to_string(),
            kind,
            scope,
            span,
            visible_from,
            shadows: None,
            redeclares: None,
            annotation,
        });
        self.scopes[scope.index()].declarations.push(id);
        id
    }

    /// Search the open scopes top-down for the latest binding of `name`,
    /// ignoring source positions
    pub fn lookup(&self, name: &str) -> Option<DeclId> {
        self.stack
            .iter()
            .rev()
            .find_map(|scope| self.scopes[scope.index()].get_binding(name))
    }

    /// Latest binding of `name` directly in `scope`
    pub fn lookup_in(&self, scope: ScopeId, name: &str) -> Option<DeclId> {
        self.scope(scope).and_then(|s| s.get_binding(name))
    }

    pub fn scope(&self, id: ScopeId) -> Option<&Scope> {
        self.scopes.get(id.index())
    }

    pub fn scopes(&self) -> &[Scope] {
        &self.scopes
    }

    pub fn root(&self) -> Option<&Scope> {
        self.scopes.first()
    }

    pub fn declaration(&self, id: DeclId) -> Option<&Declaration> {
        self.declarations.get(id.index())
    }

    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    /// Ancestors of `scope`, innermost first, including `scope` itself
    pub fn scope_chain(&self, scope: ScopeId) -> SmallVec<[ScopeId; 8]> {
        let mut chain = SmallVec::new();
        let mut current = Some(scope);
        while let Some(id) = current {
            chain.push(id);
            current = self.scope(id).and_then(|s| s.parent);
        }
        chain
    }

    /// Every name bound in `scope` or its ancestors
    pub fn names_in_chain(&self, scope: ScopeId) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .scope_chain(scope)
            .iter()
            .filter_map(|id| self.scope(*id))
            .flat_map(|s| s.bindings.keys().map(String::as_str))
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with_package() -> SymbolTable {
        let mut table = SymbolTable::new(DeclarationOrder::Sequential);
        table.push_scope(ScopeKind::Package, Span::new(0, 1000));
        table
    }

    #[test]
    fn test_scope_kind_properties() {
        assert!(ScopeKind::Package.allows_forward_references());
        assert!(!ScopeKind::Block.allows_forward_references());
        assert_eq!(ScopeKind::Case.to_string(), "case");
    }

    #[test]
    fn test_push_pop_tracks_tree() {
        let mut table = table_with_package();
        let func = table.push_scope(ScopeKind::Function, Span::new(10, 100));
        let block = table.push_scope(ScopeKind::Block, Span::new(20, 50));

        assert_eq!(table.scope(block).unwrap().parent, Some(func));
        assert_eq!(table.scope(block).unwrap().depth, 2);
        assert_eq!(table.scope(func).unwrap().children, vec![block]);

        assert_eq!(table.pop_scope(), Ok(block));
        assert!(!table.scope(block).unwrap().is_active);
        assert_eq!(table.current_scope(), Ok(func));
    }

    #[test]
    fn test_pop_empty_stack_is_underflow() {
        let mut table = table_with_package();
        assert!(table.pop_scope().is_ok());
        assert_eq!(table.pop_scope(), Err(ResolveError::ScopeUnderflow));
        assert!(matches!(
            table.declare("x", DeclKind::Local, Span::new(0, 1), 1, None),
            Err(ResolveError::ScopeUnderflow)
        ));
    }

    #[test]
    fn test_lookup_prefers_innermost() {
        let mut table = table_with_package();
        let outer = table.declare("x", DeclKind::Global, Span::new(5, 6), 0, None).unwrap();
        table.push_scope(ScopeKind::Function, Span::new(10, 100));
        let inner = table.declare("x", DeclKind::Local, Span::new(20, 21), 25, None).unwrap();

        assert_eq!(table.lookup("x"), Some(inner));
        assert_eq!(table.declaration(inner).unwrap().shadows, Some(outer));
        assert_eq!(table.declaration(inner).unwrap().redeclares, None);

        table.pop_scope().unwrap();
        assert_eq!(table.lookup("x"), Some(outer));
    }

    #[test]
    fn test_same_scope_redeclaration_links_back() {
        let mut table = table_with_package();
        table.push_scope(ScopeKind::Function, Span::new(10, 100));
        let a = table.declare("a", DeclKind::Local, Span::new(12, 13), 20, None).unwrap();
        let x1 = table.declare("x", DeclKind::Local, Span::new(15, 16), 20, None).unwrap();
        let b = table.declare("b", DeclKind::Local, Span::new(22, 23), 30, None).unwrap();
        let x2 = table.declare("x", DeclKind::Local, Span::new(25, 26), 30, None).unwrap();

        assert_eq!(table.declaration(x2).unwrap().shadows, Some(x1));
        assert_eq!(table.declaration(x2).unwrap().redeclares, Some(x1));
        assert_eq!(table.declaration(a).unwrap().shadows, None);
        assert_eq!(table.declaration(b).unwrap().shadows, None);
        assert_eq!(table.lookup("x"), Some(x2));
    }

    #[test]
    fn test_detached_declarations_are_not_bound() {
        let mut table = table_with_package();
        let field = table
            .record_detached("name", DeclKind::Field, Span::new(30, 34), None)
            .unwrap();

        assert_eq!(table.lookup("name"), None);
        assert_eq!(table.root().unwrap().declarations, vec![field]);
    }
}
