//! Per-type member maps
//!
//! Field and method names are never entered into a scope. Each struct type
//! literal gets its own field map, and methods hang off the declaration of
//! their receiver type; selectors consult these maps only after the base
//! expression has been resolved.

use crate::ids::{DeclId, ScopeId, StructTypeId};
use fxhash::FxHashMap;
use indexmap::IndexMap;
use serde::Serialize;
use syntax::Span;

#[derive(Debug, Clone, Serialize)]
pub struct StructInfo {
    pub id: StructTypeId,
    /// Span of the `struct { ... }` literal
    pub span: Span,
    /// Scope the literal appears in
    pub scope: ScopeId,
    /// Named type declaring this struct, if any
    pub named: Option<DeclId>,
    pub fields: IndexMap<String, DeclId>,
    /// Embedded field declarations, whose members are promoted
    pub embedded: Vec<DeclId>,
}

#[derive(Debug, Clone, Default)]
pub struct TypeMembers {
    structs: Vec<StructInfo>,
    by_span: FxHashMap<Span, StructTypeId>,
    by_decl: FxHashMap<DeclId, StructTypeId>,
    methods: FxHashMap<DeclId, IndexMap<String, DeclId>>,
}

impl TypeMembers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a struct literal. Registering the same literal twice returns
    /// the existing id.
    pub fn register_struct(&mut self, span: Span, scope: ScopeId, named: Option<DeclId>) -> (StructTypeId, bool) {
        if let Some(id) = self.by_span.get(&span) {
            return (*id, false);
        }

        let id = StructTypeId::for_len(self.structs.len());
        self.structs.push(StructInfo {
            id,
            span,
            scope,
            named,
            fields: IndexMap::new(),
            embedded: Vec::new(),
        });
        self.by_span.insert(span, id);
        if let Some(decl) = named {
            self.by_decl.insert(decl, id);
        }
        (id, true)
    }

    pub fn add_field(&mut self, owner: StructTypeId, name: &str, decl: DeclId, embedded: bool) {
        if let Some(info) = self.structs.get_mut(owner.index()) {
            // a later duplicate field name does not replace the first
            info.fields.entry(name.to_string()).or_insert(decl);
            if embedded {
                info.embedded.push(decl);
            }
        }
    }

    pub fn add_method(&mut self, receiver: DeclId, name: &str, decl: DeclId) {
        self.methods
            .entry(receiver)
            .or_default()
            .entry(name.to_string())
            .or_insert(decl);
    }

    pub fn get(&self, id: StructTypeId) -> Option<&StructInfo> {
        self.structs.get(id.index())
    }

    pub fn structs(&self) -> &[StructInfo] {
        &self.structs
    }

    pub fn struct_at(&self, span: Span) -> Option<StructTypeId> {
        self.by_span.get(&span).copied()
    }

    /// Struct underlying a named type declaration
    pub fn struct_of(&self, decl: DeclId) -> Option<StructTypeId> {
        self.by_decl.get(&decl).copied()
    }

    pub fn field(&self, owner: StructTypeId, name: &str) -> Option<DeclId> {
        self.get(owner).and_then(|info| info.fields.get(name).copied())
    }

    pub fn method(&self, receiver: DeclId, name: &str) -> Option<DeclId> {
        self.methods.get(&receiver).and_then(|m| m.get(name).copied())
    }

    pub fn methods_of(&self, receiver: DeclId) -> impl Iterator<Item = (&str, DeclId)> {
        self.methods
            .get(&receiver)
            .into_iter()
            .flat_map(|m| m.iter().map(|(name, id)| (name.as_str(), *id)))
    }

    /// Every member name of a struct and its named type, for suggestions
    pub fn member_names(&self, owner: StructTypeId) -> Vec<&str> {
        let Some(info) = self.get(owner) else {
            return Vec::new();
        };
        let mut names: Vec<&str> = info.fields.keys().map(String::as_str).collect();
        if let Some(named) = info.named {
            names.extend(self.methods_of(named).map(|(name, _)| name));
        }
        names
    }
}
