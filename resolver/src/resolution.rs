//! Resolution results for one compilation unit
//!
//! `Resolution` keeps the whole scope tree alive after the walk so tooling can
//! ask position questions ("what does `x` mean at offset 42?") and follow
//! shadow chains without re-resolving.

use crate::declarations::{DeclKind, Declaration};
use crate::ids::{DeclId, RefId, ScopeId, StructTypeId};
use crate::members::TypeMembers;
use crate::shadowing::ShadowingClassifier;
use crate::symbol_table::{Scope, SymbolTable};
use diagnostics::Diagnostics;
use fxhash::FxHashSet;
use serde::Serialize;
use source_map::FileId;
use syntax::Span;

/// What an identifier reference bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Binding {
    Declared(DeclId),
    /// Universe-block name such as `int` or `println`
    Predeclared,
    /// Name declared in another compilation unit of the same package
    External,
    /// Bound to nothing; reported as E2001
    Unresolved,
}

impl Binding {
    pub fn decl(self) -> Option<DeclId> {
        match self {
            Binding::Declared(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_resolved(self) -> bool {
        !matches!(self, Binding::Unresolved)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RefKind {
    Read,
    /// Bare identifier on the left of an assignment or `++`/`--`
    Write,
    /// Use in type position
    Type,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reference {
    pub id: RefId,
    pub name: String,
    pub span: Span,
    /// Scope the reference was resolved from
    pub scope: ScopeId,
    pub kind: RefKind,
    pub binding: Binding,
}

/// What the member name of `base.member` bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MemberBinding {
    Field { owner: StructTypeId, decl: DeclId },
    Method { decl: DeclId },
    /// Member of an imported package; never looked up
    PackageMember { package: DeclId },
    /// The base is a known struct without this member (E2003)
    Missing { owner: StructTypeId },
    /// The base's structure is not known to this unit
    Unknown,
    /// The base did not resolve (E2002)
    Skipped,
}

impl MemberBinding {
    pub fn decl(self) -> Option<DeclId> {
        match self {
            MemberBinding::Field { decl, .. } | MemberBinding::Method { decl } => Some(decl),
            _ => None,
        }
    }
}

/// Member name occurrence: a selector's `.field` or a struct literal key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberUse {
    pub name: String,
    pub span: Span,
    /// Span of the selector base, or of the composite literal for keys
    pub base_span: Span,
    pub scope: ScopeId,
    pub binding: MemberBinding,
    /// Key of a keyed struct literal (`Person{name: n}`)
    pub composite_key: bool,
}

#[derive(Debug, Clone)]
pub struct Resolution {
    pub(crate) file_id: FileId,
    pub(crate) package: String,
    pub(crate) table: SymbolTable,
    pub(crate) members: TypeMembers,
    pub(crate) references: Vec<Reference>,
    pub(crate) member_uses: Vec<MemberUse>,
    pub(crate) modified: FxHashSet<DeclId>,
    pub(crate) diagnostics: Diagnostics,
}

impl Resolution {
    pub fn file_id(&self) -> FileId {
        self.file_id
    }

    pub fn package_name(&self) -> &str {
        &self.package
    }

    pub fn references(&self) -> &[Reference] {
        &self.references
    }

    /// Reference whose identifier covers `offset`
    pub fn reference_at(&self, offset: usize) -> Option<&Reference> {
        self.references.iter().find(|r| r.span.contains(offset))
    }

    /// Every reference bound to `decl`
    pub fn references_to(&self, decl: DeclId) -> impl Iterator<Item = &Reference> {
        self.references
            .iter()
            .filter(move |r| r.binding == Binding::Declared(decl))
    }

    pub fn members(&self) -> &[MemberUse] {
        &self.member_uses
    }

    pub fn member_at(&self, offset: usize) -> Option<&MemberUse> {
        self.member_uses.iter().find(|m| m.span.contains(offset))
    }

    pub fn declaration(&self, id: DeclId) -> Option<&Declaration> {
        self.table.declaration(id)
    }

    pub fn declarations(&self) -> &[Declaration] {
        self.table.declarations()
    }

    /// Declaration whose identifier covers `offset`
    pub fn declaration_at(&self, offset: usize) -> Option<&Declaration> {
        self.declarations().iter().find(|d| d.span.contains(offset))
    }

    /// Declarations of `name`, in declaration order
    pub fn declarations_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Declaration> + 'a {
        self.declarations().iter().filter(move |d| d.name == name)
    }

    /// Declarations hidden by `id`, nearest first
    pub fn shadow_chain(&self, id: DeclId) -> Vec<DeclId> {
        ShadowingClassifier::new(&self.table).shadow_chain(id)
    }

    /// Declaration `name` refers to at `offset`
    pub fn visible_at(&self, name: &str, offset: usize) -> Option<DeclId> {
        ShadowingClassifier::new(&self.table).visible_at(name, offset)
    }

    pub fn classifier(&self) -> ShadowingClassifier<'_> {
        ShadowingClassifier::new(&self.table)
    }

    pub fn scope(&self, id: ScopeId) -> Option<&Scope> {
        self.table.scope(id)
    }

    pub fn scopes(&self) -> &[Scope] {
        self.table.scopes()
    }

    pub fn symbol_table(&self) -> &SymbolTable {
        &self.table
    }

    pub fn type_members(&self) -> &TypeMembers {
        &self.members
    }

    /// Assigned, incremented or redeclared in its own scope
    pub fn is_modified(&self, id: DeclId) -> bool {
        self.modified.contains(&id)
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn unresolved(&self) -> impl Iterator<Item = &Reference> {
        self.references
            .iter()
            .filter(|r| r.binding == Binding::Unresolved)
    }

    pub fn report(&self) -> ResolutionReport {
        let mut modified: Vec<DeclId> = self.modified.iter().copied().collect();
        modified.sort_unstable();

        ResolutionReport {
            package: self.package.clone(),
            declarations: self
                .declarations()
                .iter()
                .map(|d| DeclarationSummary {
                    id: d.id,
                    name: d.name.clone(),
                    kind: d.kind,
                    scope: d.scope,
                    span: d.span,
                    shadows: d.shadows,
                    modified: self.is_modified(d.id),
                })
                .collect(),
            references: self.references.clone(),
            members: self.member_uses.clone(),
            modified,
            diagnostics: self
                .diagnostics
                .iter()
                .map(|d| DiagnosticSummary {
                    code: d.code.clone(),
                    message: d.message.clone(),
                    offset: d.span.start.byte_offset,
                    suppressed: d.suppressed,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeclarationSummary {
    pub id: DeclId,
    pub name: String,
    pub kind: DeclKind,
    pub scope: ScopeId,
    pub span: Span,
    pub shadows: Option<DeclId>,
    pub modified: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticSummary {
    pub code: Option<String>,
    pub message: String,
    pub offset: usize,
    pub suppressed: bool,
}

/// Serializable snapshot of a `Resolution`; two resolutions of the same tree
/// produce equal reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionReport {
    pub package: String,
    pub declarations: Vec<DeclarationSummary>,
    pub references: Vec<Reference>,
    pub members: Vec<MemberUse>,
    pub modified: Vec<DeclId>,
    pub diagnostics: Vec<DiagnosticSummary>,
}
