//! Shadowing classifier
//!
//! Answers "which declaration does `name` mean at this offset?" over a scope
//! tree, honouring the declaration-order policy. The package scope is always
//! order independent; other scopes follow the configured policy.

use crate::declarations::{DeclKind, Declaration};
use crate::ids::{DeclId, ScopeId};
use crate::symbol_table::SymbolTable;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a declaration is visible before the statement that introduces it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeclarationOrder {
    /// A name is visible from the end of its declaring statement onwards
    #[default]
    Sequential,
    /// A name is visible throughout its scope
    Hoisted,
}

impl fmt::Display for DeclarationOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclarationOrder::Sequential => write!(f, "sequential"),
            DeclarationOrder::Hoisted => write!(f, "hoisted"),
        }
    }
}

/// How two declarations of the same name relate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShadowRelation {
    Same,
    /// The second redeclares the first in the same scope
    Redeclares,
    /// The first is on the second's shadow chain
    Shadows,
    /// The second is on the first's shadow chain
    ShadowedBy,
    Unrelated,
}

pub struct ShadowingClassifier<'t> {
    table: &'t SymbolTable,
}

impl<'t> ShadowingClassifier<'t> {
    pub fn new(table: &'t SymbolTable) -> Self {
        Self { table }
    }

    fn is_visible(&self, decl: &Declaration, offset: usize) -> bool {
        // parameters belong to the body even when the body hoists
        if decl.kind == DeclKind::Parameter {
            return decl.visible_from <= offset;
        }
        let hoisted = self
            .table
            .scope(decl.scope)
            .is_some_and(|s| s.kind.allows_forward_references());
        hoisted || self.table.order() == DeclarationOrder::Hoisted || decl.visible_from <= offset
    }

    /// Declaration of `name` bound directly in `scope` and visible at `offset`
    pub fn visible_in_scope(&self, scope: ScopeId, name: &str, offset: usize) -> Option<DeclId> {
        let mut current = self.table.lookup_in(scope, name);
        while let Some(id) = current {
            let decl = self.table.declaration(id)?;
            if self.is_visible(decl, offset) {
                return Some(id);
            }
            current = decl.redeclares;
        }
        None
    }

    /// Walk outward from `scope` and return the first declaration of `name`
    /// visible at `offset`
    pub fn visible_from_scope(&self, scope: ScopeId, name: &str, offset: usize) -> Option<DeclId> {
        self.table
            .scope_chain(scope)
            .into_iter()
            .find_map(|id| self.visible_in_scope(id, name, offset))
    }

    /// Innermost scope whose span contains `offset`
    pub fn innermost_scope_at(&self, offset: usize) -> Option<ScopeId> {
        let root = self.table.root()?;
        if !root.span.contains(offset) && root.span.end != offset {
            return None;
        }

        let mut current = root;
        'descend: loop {
            for child in &current.children {
                if let Some(scope) = self.table.scope(*child) {
                    if scope.span.contains(offset) {
                        current = scope;
                        continue 'descend;
                    }
                }
            }
            return Some(current.id);
        }
    }

    /// Declaration `name` refers to at `offset`, the position query exposed
    /// to tooling
    pub fn visible_at(&self, name: &str, offset: usize) -> Option<DeclId> {
        let scope = self.innermost_scope_at(offset)?;
        self.visible_from_scope(scope, name, offset)
    }

    /// Which of two declarations is the one visible at `offset`, if either
    pub fn winner(&self, a: DeclId, b: DeclId, offset: usize) -> Option<DeclId> {
        let name = &self.table.declaration(a)?.name;
        if self.table.declaration(b)?.name != *name {
            return None;
        }
        self.visible_at(name, offset).filter(|id| *id == a || *id == b)
    }

    pub fn relation(&self, a: DeclId, b: DeclId) -> ShadowRelation {
        if a == b {
            return ShadowRelation::Same;
        }
        if self.table.declaration(b).and_then(|d| d.redeclares) == Some(a) {
            return ShadowRelation::Redeclares;
        }
        if self.chain_contains(b, a) {
            ShadowRelation::Shadows
        } else if self.chain_contains(a, b) {
            ShadowRelation::ShadowedBy
        } else {
            ShadowRelation::Unrelated
        }
    }

    /// Declarations hidden by `id`, nearest first
    pub fn shadow_chain(&self, id: DeclId) -> Vec<DeclId> {
        let mut chain = Vec::new();
        let mut current = self.table.declaration(id).and_then(|d| d.shadows);
        while let Some(next) = current {
            chain.push(next);
            current = self.table.declaration(next).and_then(|d| d.shadows);
        }
        chain
    }

    fn chain_contains(&self, from: DeclId, target: DeclId) -> bool {
        self.shadow_chain(from).contains(&target)
    }
}
