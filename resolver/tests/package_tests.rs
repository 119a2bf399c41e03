mod common;

use common::*;
use resolver::{Binding, ResolveError, ResolveOptions};
use source_map::FileId;
use syntax::{AstBuilder, GoFile, Import, Span};

fn helper_unit(b: &AstBuilder) -> GoFile {
    let package = b.package("main");
    let decls = vec![
        b.func("helper", |b| (vec![], b.block(|_| vec![]))),
        b.global_var(vec![b.ident("counter")], Some(b.ty("int")), vec![]),
    ];
    b.file(package, vec![], decls)
}

fn main_unit(b: &AstBuilder) -> GoFile {
    let package = b.package("main");
    let decls = vec![b.func("main", |b| {
        let body = b.block(|b| {
            vec![
                b.expr_stmt(b.call(b.name("helper"), vec![])),
                b.inc(b.name("counter")),
            ]
        });
        (vec![], body)
    })];
    b.file(package, vec![], decls)
}

#[test]
fn test_sibling_units_bind_as_external() {
    let (hb, mb) = (AstBuilder::new(), AstBuilder::new());
    let files = vec![helper_unit(&hb), main_unit(&mb)];

    resolver::logging::init_test();
    let results = resolver::resolve_package(&files, &ResolveOptions::default());
    assert_eq!(results.len(), 2);

    let main = results[1].as_ref().unwrap();
    assert_eq!(main.file_id(), FileId::new(1));
    assert_eq!(refs(main, "helper")[0].binding, Binding::External);
    assert_eq!(refs(main, "counter")[0].binding, Binding::External);
    assert_eq!(main.diagnostics().reportable().count(), 0);

    let helper = results[0].as_ref().unwrap();
    assert_eq!(helper.file_id(), FileId::new(0));
    assert_eq!(helper.package_name(), "main");
}

#[test]
fn test_single_unit_reports_sibling_names() {
    let b = AstBuilder::new();
    let file = main_unit(&b);
    let res = resolve(&file);

    assert_eq!(refs(&res, "helper")[0].binding, Binding::Unresolved);
    assert_eq!(res.diagnostics().reportable().count(), 2);
}

#[test]
fn test_malformed_unit_does_not_affect_siblings() {
    let b = AstBuilder::new();
    let package = b.package("main");
    let decls = vec![b.func("broken", |b| {
        // `f() := 1`
        let body = b.block(|b| vec![b.short_var(vec![b.call(b.name("f"), vec![])], vec![b.int(1)])]);
        (vec![], body)
    })];
    let broken = b.file(package, vec![], decls);

    let hb = AstBuilder::new();
    let files = vec![broken, helper_unit(&hb)];
    let results = resolver::resolve_package(&files, &ResolveOptions::default());

    match &results[0] {
        Err(ResolveError::MalformedAst { reason, .. }) => {
            assert!(reason.contains("identifier"), "unexpected reason: {}", reason);
        }
        other => panic!("expected malformed AST error, got {:?}", other.as_ref().map(|r| r.package_name())),
    }
    assert!(results[1].is_ok());
}

#[test]
fn test_import_without_path_is_malformed() {
    let b = AstBuilder::new();
    let package = b.package("main");
    let mut file = b.file(package, vec![], vec![]);
    file.imports.push(Import {
        path: String::new(),
        alias: None,
        span: Span::new(0, 0),
    });

    let err = resolver::resolve_file(&file, &ResolveOptions::default()).unwrap_err();
    assert!(matches!(err, ResolveError::MalformedAst { .. }));
    assert!(err.to_string().starts_with("Malformed syntax tree"));
}

#[test]
fn test_aliased_and_blank_imports() {
    let b = AstBuilder::new();
    let package = b.package("main");
    let imports = vec![b.import_as("str", "strings"), b.import_as("_", "net/http/pprof"), b.import("net/http")];
    let file_decls = vec![b.func("main", |b| {
        let body = b.block(|b| {
            vec![
                b.expr_stmt(b.call(b.selector(b.name("str"), "ToUpper"), vec![b.string("x")])),
                b.expr_stmt(b.call(b.selector(b.name("http"), "ListenAndServe"), vec![])),
            ]
        });
        (vec![], body)
    })];
    let file = b.file(package, imports, file_decls);
    let res = resolve(&file);

    let str_pkg = decl(&res, "str");
    let http = decl(&res, "http");
    assert!(decls(&res, "_").is_empty());
    assert!(decls(&res, "pprof").is_empty());
    assert_eq!(
        member_uses(&res, "ToUpper")[0].binding,
        resolver::MemberBinding::PackageMember { package: str_pkg }
    );
    assert_eq!(
        member_uses(&res, "ListenAndServe")[0].binding,
        resolver::MemberBinding::PackageMember { package: http }
    );
}

#[test]
fn test_json_round_trip_resolves_identically() {
    let b = AstBuilder::new();
    let file = small_go(&b);
    let json = serde_json::to_string(&file).unwrap();
    let parsed: GoFile = serde_json::from_str(&json).unwrap();

    assert_eq!(resolve(&file).report(), resolve(&parsed).report());
}
