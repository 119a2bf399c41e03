//! Lexical scope resolution for Go-family syntax trees
//!
//! Given the syntax tree of one compilation unit, the resolver builds the
//! scope tree, records every declaration with the position it becomes visible
//! from, and binds each identifier occurrence to the declaration it denotes.
//! Member names of selectors are bound separately through per-struct field
//! maps, so `fmt.name` on a parameter called `fmt` is a field access while
//! `fmt.Println` on the import is a package member.
//!
//! ```ignore
//! let options = ResolveOptions::default();
//! let resolution = resolver::resolve_file(&file, &options)?;
//! for reference in resolution.references() {
//!     println!("{} -> {:?}", reference.name, reference.binding);
//! }
//! ```

pub mod collector;
pub mod config;
pub mod declarations;
pub mod error;
pub mod ids;
pub mod logging;
pub mod members;
pub mod resolution;
pub mod shadowing;
pub mod shapes;
pub mod symbol_table;
pub mod tokens;
mod walk;

pub use collector::DeclarationCollector;
pub use config::{parse_config, ResolveOptions, GO_PREDECLARED};
pub use declarations::{DeclKind, Declaration, TypeAnnotation};
pub use error::ResolveError;
pub use ids::{DeclId, RefId, ScopeId, StructTypeId};
pub use members::{StructInfo, TypeMembers};
pub use resolution::{
    Binding, DeclarationSummary, DiagnosticSummary, MemberBinding, MemberUse, RefKind, Reference, Resolution,
    ResolutionReport,
};
pub use shadowing::{DeclarationOrder, ShadowRelation, ShadowingClassifier};
pub use shapes::{MemberLookup, Shape, ShapeEvaluator};
pub use symbol_table::{Scope, ScopeKind, SymbolTable};
pub use tokens::{semantic_tokens, LineRange, SemanticToken, TokenClass};

use rayon::prelude::*;
use source_map::{FileId, SourceFile};
use syntax::GoFile;

/// Resolve a single compilation unit. Diagnostic spans carry byte offsets only.
pub fn resolve_file(file: &GoFile, options: &ResolveOptions) -> Result<Resolution, ResolveError> {
    resolve_source(file, options, FileId::default(), None)
}

/// Resolve a compilation unit whose source text is available, so diagnostics
/// carry line and column positions.
pub fn resolve_source(
    file: &GoFile,
    options: &ResolveOptions,
    file_id: FileId,
    source: Option<&SourceFile>,
) -> Result<Resolution, ResolveError> {
    walk::Resolver::new(options, file_id, source).run(file)
}

/// Resolve every unit of a package in parallel.
///
/// Top-level names declared in sibling units bind as `Binding::External`
/// instead of being reported as unresolved. Results are in input order;
/// unit `i` gets `FileId::new(i)`.
pub fn resolve_package(files: &[GoFile], options: &ResolveOptions) -> Vec<Result<Resolution, ResolveError>> {
    let top_level: Vec<Vec<String>> = files
        .iter()
        .map(|file| file.top_level_names().into_iter().map(str::to_string).collect())
        .collect();

    files
        .par_iter()
        .enumerate()
        .map(|(index, file)| {
            let siblings = top_level
                .iter()
                .enumerate()
                .filter(|(other, _)| *other != index)
                .flat_map(|(_, names)| names.iter().cloned());
            let unit_options = options.clone().with_external_names(siblings);
            resolve_source(file, &unit_options, FileId::new(index), None)
                .inspect_err(|e| log::error!("unit {} of package `{}` aborted: {}", index, file.package.name, e))
        })
        .collect()
}
