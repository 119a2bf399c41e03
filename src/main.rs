//! scopecheck - lexical scope resolution for Go-family syntax trees
//!
//! # Usage
//!
//! ```bash
//! # Resolve every identifier of a JSON-serialized AST
//! scopecheck resolve main.ast.json --source main.go
//!
//! # What does `x` mean at byte offset 412?
//! scopecheck query main.ast.json x 412
//!
//! # Semantic tokens for lines 10-40
//! scopecheck tokens main.ast.json --source main.go --lines 10-40
//!
//! # Resolve all units of a package together
//! scopecheck package a.ast.json b.ast.json --format json
//! ```

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use diagnostics::ErrorFormatter;
use log::LevelFilter;
use resolver::{
    Binding, DeclId, DeclarationOrder, LineRange, MemberBinding, Resolution, ResolveOptions, SemanticToken,
};
use source_map::{FileId, SourceFile, SourceMap};
use std::fs;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process;
use syntax::GoFile;

#[derive(Parser)]
#[command(name = "scopecheck")]
#[command(version = "0.1.0")]
#[command(about = "Bind every identifier of a Go-family syntax tree to its declaration", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a scopecheck.toml with a [resolve] section
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "text", global = true)]
    format: OutputFormat,

    /// Let names be used anywhere in their scope, not only after their declaration
    #[arg(long, global = true)]
    hoisted: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve one compilation unit
    Resolve {
        /// JSON-serialized AST
        ast: PathBuf,

        /// Source text the AST was parsed from, for line/column output
        #[arg(long)]
        source: Option<PathBuf>,

        /// Also print diagnostics that are hidden by default (E2002)
        #[arg(long)]
        show_suppressed: bool,
    },

    /// Show the declaration a name refers to at a byte offset
    Query {
        /// JSON-serialized AST
        ast: PathBuf,

        /// Identifier to look up
        name: String,

        /// Byte offset into the source
        offset: usize,

        /// Source text the AST was parsed from, for line/column output
        #[arg(long)]
        source: Option<PathBuf>,
    },

    /// Classify identifiers for highlighting
    Tokens {
        /// JSON-serialized AST
        ast: PathBuf,

        /// Source text the AST was parsed from
        #[arg(long)]
        source: Option<PathBuf>,

        /// Only emit tokens near these 1-based line ranges (e.g. 10-40); needs --source
        #[arg(long, value_parser = parse_line_range)]
        lines: Vec<LineRange>,
    },

    /// Resolve several units of one package; top-level names are shared
    Package {
        /// JSON-serialized ASTs, one per compilation unit
        #[arg(required = true)]
        asts: Vec<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

fn main() {
    let cli = Cli::parse();

    match cli.verbose {
        0 => resolver::logging::init_from_env(),
        1 => resolver::logging::init_with_level(LevelFilter::Info),
        2 => resolver::logging::init_with_level(LevelFilter::Debug),
        _ => resolver::logging::init_with_level(LevelFilter::Trace),
    }

    let result = load_options(cli.config.as_deref(), cli.hoisted).and_then(|options| match cli.command {
        Commands::Resolve {
            ast,
            source,
            show_suppressed,
        } => resolve_command(&ast, source.as_deref(), show_suppressed, &options, cli.format),
        Commands::Query {
            ast,
            name,
            offset,
            source,
        } => query_command(&ast, &name, offset, source.as_deref(), &options, cli.format),
        Commands::Tokens { ast, source, lines } => {
            tokens_command(&ast, source.as_deref(), &lines, &options, cli.format)
        }
        Commands::Package { asts } => package_command(&asts, &options, cli.format),
    });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn parse_line_range(text: &str) -> Result<LineRange, String> {
    let (start, end) = text.split_once('-').unwrap_or((text, text));
    let start: usize = start
        .trim()
        .parse()
        .map_err(|_| format!("Invalid line range '{}'", text))?;
    let end: usize = end
        .trim()
        .parse()
        .map_err(|_| format!("Invalid line range '{}'", text))?;
    if start == 0 || end < start {
        return Err(format!("Invalid line range '{}': lines are 1-based and start <= end", text));
    }
    Ok(LineRange::new(start, end))
}

fn load_options(config: Option<&Path>, hoisted: bool) -> Result<ResolveOptions, String> {
    let mut options = match config {
        Some(path) => {
            let content = fs::read_to_string(path)
                .map_err(|e| format!("Failed to read config {}: {}", path.display(), e))?;
            resolver::parse_config(&content)?
        }
        None => ResolveOptions::default(),
    };
    if hoisted {
        options.declaration_order = DeclarationOrder::Hoisted;
    }
    Ok(options)
}

fn load_ast(path: &Path) -> Result<GoFile, String> {
    let content =
        fs::read_to_string(path).map_err(|e| format!("Failed to read AST {}: {}", path.display(), e))?;
    serde_json::from_str(&content).map_err(|e| format!("Failed to parse AST {}: {}", path.display(), e))
}

/// A unit with its optional source text registered in a source map
struct Unit {
    file: GoFile,
    map: SourceMap,
    file_id: FileId,
}

impl Unit {
    fn load(ast: &Path, source: Option<&Path>) -> Result<Self, String> {
        let file = load_ast(ast)?;
        let mut map = SourceMap::new();
        let file_id = match source {
            Some(path) => {
                let content = fs::read_to_string(path)
                    .map_err(|e| format!("Failed to read source {}: {}", path.display(), e))?;
                map.add_file(path.display().to_string(), content)
            }
            None => FileId::default(),
        };
        Ok(Self { file, map, file_id })
    }

    fn source(&self) -> Option<&SourceFile> {
        self.map.get_file(self.file_id)
    }

    fn resolve(&self, options: &ResolveOptions) -> Result<Resolution, String> {
        resolver::resolve_source(&self.file, options, self.file_id, self.source()).map_err(|e| e.to_string())
    }

    fn location(&self, offset: usize) -> String {
        match self.source() {
            Some(file) => {
                let (line, column) = file.offset_to_line_col(offset);
                format!("{}:{}", line, column)
            }
            None => format!("@{}", offset),
        }
    }
}

fn resolve_command(
    ast: &Path,
    source: Option<&Path>,
    show_suppressed: bool,
    options: &ResolveOptions,
    format: OutputFormat,
) -> Result<(), String> {
    let unit = Unit::load(ast, source)?;
    let resolution = unit.resolve(options)?;

    if format == OutputFormat::Json {
        return print_json(&resolution.report());
    }

    println!(
        "package {} ({} declarations, {} references, {} member uses)",
        resolution.package_name(),
        resolution.declarations().len(),
        resolution.references().len(),
        resolution.members().len()
    );

    println!("\ndeclarations:");
    for decl in resolution.declarations() {
        let mut line = format!(
            "  {:<6} {:<10} {:<16} {}",
            decl.id.to_string(),
            decl.kind.as_str(),
            decl.name,
            unit.location(decl.span.start)
        );
        if let Some(hidden) = decl.shadows {
            line.push_str(&format!("  shadows {}", describe_decl(&unit, &resolution, hidden)));
        }
        if resolution.is_modified(decl.id) {
            line.push_str("  (modified)");
        }
        println!("{}", line);
    }

    println!("\nreferences:");
    for reference in resolution.references() {
        let target = match reference.binding {
            Binding::Declared(id) => describe_decl(&unit, &resolution, id),
            Binding::Predeclared => "predeclared".to_string(),
            Binding::External => "external".to_string(),
            Binding::Unresolved => "unresolved".to_string(),
        };
        println!(
            "  {:<16} {:<10} -> {}",
            reference.name,
            unit.location(reference.span.start),
            target
        );
    }

    println!("\nmembers:");
    for member in resolution.members() {
        let target = match member.binding {
            MemberBinding::Field { decl, .. } => format!("field {}", describe_decl(&unit, &resolution, decl)),
            MemberBinding::Method { decl } => format!("method {}", describe_decl(&unit, &resolution, decl)),
            MemberBinding::PackageMember { package } => {
                format!("member of {}", describe_decl(&unit, &resolution, package))
            }
            MemberBinding::Missing { .. } => "missing".to_string(),
            MemberBinding::Unknown => "unknown".to_string(),
            MemberBinding::Skipped => "skipped".to_string(),
        };
        println!(
            "  {:<16} {:<10} -> {}",
            member.name,
            unit.location(member.span.start),
            target
        );
    }

    print_diagnostics(&unit, &resolution, show_suppressed);
    Ok(())
}

fn query_command(
    ast: &Path,
    name: &str,
    offset: usize,
    source: Option<&Path>,
    options: &ResolveOptions,
    format: OutputFormat,
) -> Result<(), String> {
    let unit = Unit::load(ast, source)?;
    let resolution = unit.resolve(options)?;

    let found = resolution.visible_at(name, offset);
    let chain = found.map(|id| resolution.shadow_chain(id)).unwrap_or_default();
    let declared_here = resolution.declaration_at(offset);

    if format == OutputFormat::Json {
        let visible: Vec<_> = found
            .into_iter()
            .chain(chain)
            .filter_map(|id| resolution.declaration(id))
            .collect();
        return print_json(&serde_json::json!({
            "visible": visible,
            "declared_here": declared_here,
        }));
    }

    match found {
        Some(id) => {
            println!("`{}` at {} -> {}", name, unit.location(offset), describe_decl(&unit, &resolution, id));
            for hidden in chain {
                println!("  shadows {}", describe_decl(&unit, &resolution, hidden));
            }
        }
        None => println!("`{}` at {} is not declared in this unit", name, unit.location(offset)),
    }
    if let Some(decl) = declared_here {
        println!("declared here: {}", describe_decl(&unit, &resolution, decl.id));
    }
    Ok(())
}

fn tokens_command(
    ast: &Path,
    source: Option<&Path>,
    lines: &[LineRange],
    options: &ResolveOptions,
    format: OutputFormat,
) -> Result<(), String> {
    let unit = Unit::load(ast, source)?;
    if !lines.is_empty() && unit.source().is_none() {
        return Err("--lines requires --source".to_string());
    }
    let resolution = unit.resolve(options)?;
    let tokens: Vec<SemanticToken> =
        resolver::semantic_tokens(&resolution, unit.source().map(|file| (file, lines)));

    if format == OutputFormat::Json {
        return print_json(&tokens);
    }
    for token in &tokens {
        println!("{:<10} {:<18} {}", unit.location(token.span.start), token.class.as_str(), token.name);
    }
    Ok(())
}

fn package_command(asts: &[PathBuf], options: &ResolveOptions, format: OutputFormat) -> Result<(), String> {
    let files = asts.iter().map(|path| load_ast(path)).collect::<Result<Vec<_>, _>>()?;
    let results = resolver::resolve_package(&files, options);

    let mut failed = 0;
    let mut reports = Vec::new();
    for (path, result) in asts.iter().zip(&results) {
        match result {
            Ok(resolution) => {
                let report = resolution.report();
                if format == OutputFormat::Text {
                    println!(
                        "{}: {} declarations, {} references, {} unresolved, {} diagnostics",
                        path.display(),
                        report.declarations.len(),
                        report.references.len(),
                        resolution.unresolved().count(),
                        resolution.diagnostics().reportable().count()
                    );
                }
                reports.push(report);
            }
            Err(e) => {
                failed += 1;
                eprintln!("{}: {}", path.display(), e);
            }
        }
    }

    if format == OutputFormat::Json {
        print_json(&reports)?;
    }
    if failed > 0 {
        return Err(format!("{} of {} units could not be resolved", failed, asts.len()));
    }
    Ok(())
}

fn describe_decl(unit: &Unit, resolution: &Resolution, id: DeclId) -> String {
    match resolution.declaration(id) {
        Some(decl) => format!("{} {} ({})", decl.kind, decl.name, unit.location(decl.span.start)),
        None => id.to_string(),
    }
}

fn print_diagnostics(unit: &Unit, resolution: &Resolution, show_suppressed: bool) {
    let diagnostics = resolution.diagnostics();
    if diagnostics.is_empty() || (!show_suppressed && diagnostics.reportable().next().is_none()) {
        return;
    }
    let formatter = if io::stdout().is_terminal() {
        ErrorFormatter::with_colors()
    } else {
        ErrorFormatter::new()
    };
    println!();
    println!(
        "{}",
        formatter
            .show_suppressed(show_suppressed)
            .format_diagnostics(diagnostics, &unit.map)
    );
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value).map_err(|e| format!("Failed to serialize output: {}", e))?;
    println!("{}", json);
    Ok(())
}
