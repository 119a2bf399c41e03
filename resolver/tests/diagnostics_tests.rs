mod common;

use common::*;
use diagnostics::resolve::{SELECTOR_ON_UNRESOLVED_BASE, UNKNOWN_MEMBER, UNRESOLVED_REFERENCE};
use diagnostics::{DiagnosticSeverity, ErrorFormatter};
use resolver::{Binding, MemberBinding, ResolveOptions};
use source_map::{FileId, SourceFile, SourceMap};
use syntax::{AstBuilder, GoFile};

/// ```go
/// type Person struct { name string }
///
/// func h(person Person) {
///     println(missing)
///     println(ghost.field)
///     println(person.nme)
///     println(Person{age: 1})
/// }
/// ```
fn faulty_file(b: &AstBuilder) -> GoFile {
    let package = b.package("main");
    let decls = vec![
        b.type_decl("Person", |b| b.struct_type(|b| vec![b.field(b.ident("name"), b.ty("string"))])),
        b.func("h", |b| {
            let params = vec![b.param(b.ident("person"), b.ty("Person"))];
            let body = b.block(|b| {
                vec![
                    b.expr_stmt(b.call(b.name("println"), vec![b.name("missing")])),
                    b.expr_stmt(b.call(b.name("println"), vec![b.selector(b.name("ghost"), "field")])),
                    b.expr_stmt(b.call(b.name("println"), vec![b.selector(b.name("person"), "nme")])),
                    b.expr_stmt(b.call(
                        b.name("println"),
                        vec![b.composite(Some(b.ty("Person")), vec![b.element(Some(b.name("age")), b.int(1))])],
                    )),
                ]
            });
            (params, body)
        }),
    ];
    b.file(package, vec![], decls)
}

#[test]
fn test_unresolved_reference_is_reported_not_fatal() {
    let b = AstBuilder::new();
    let file = faulty_file(&b);
    let res = resolve(&file);

    let unresolved: Vec<_> = res.unresolved().map(|r| r.name.as_str()).collect();
    assert_eq!(unresolved, vec!["missing", "ghost"]);

    let e2001: Vec<_> = res.diagnostics().with_code(UNRESOLVED_REFERENCE).collect();
    assert_eq!(e2001.len(), 2);
    assert!(e2001[0].message.contains("`missing`"));
    assert_eq!(e2001[0].severity, DiagnosticSeverity::Warning);
    assert!(!e2001[0].suppressed);

    // later statements are still resolved
    assert_eq!(refs(&res, "person")[0].binding, Binding::Declared(decl(&res, "person")));
}

#[test]
fn test_selector_on_unresolved_base_is_suppressed() {
    let b = AstBuilder::new();
    let file = faulty_file(&b);
    let res = resolve(&file);

    assert_eq!(member_uses(&res, "field")[0].binding, MemberBinding::Skipped);

    let e2002: Vec<_> = res.diagnostics().with_code(SELECTOR_ON_UNRESOLVED_BASE).collect();
    assert_eq!(e2002.len(), 1);
    assert!(e2002[0].suppressed);
    assert!(res.diagnostics().reportable().all(|d| d.code.as_deref() != Some(SELECTOR_ON_UNRESOLVED_BASE)));
    assert_eq!(res.diagnostics().suppressed().count(), 1);
}

#[test]
fn test_unknown_member_on_known_struct() {
    let b = AstBuilder::new();
    let file = faulty_file(&b);
    let res = resolve(&file);

    assert!(matches!(member_uses(&res, "nme")[0].binding, MemberBinding::Missing { .. }));
    assert!(matches!(member_uses(&res, "age")[0].binding, MemberBinding::Missing { .. }));

    let e2003: Vec<_> = res.diagnostics().with_code(UNKNOWN_MEMBER).collect();
    assert_eq!(e2003.len(), 2);
    assert!(e2003[0].message.contains("`nme`"));
    assert!(e2003[0].message.contains("`Person`"));
    assert_eq!(e2003[0].suggestions.len(), 1);
    assert_eq!(e2003[0].suggestions[0].replacement, "name");
    assert!(e2003[0].labels.len() >= 2);
}

#[test]
fn test_report_unresolved_can_be_disabled() {
    let b = AstBuilder::new();
    let file = faulty_file(&b);
    let options = ResolveOptions {
        report_unresolved: false,
        ..ResolveOptions::default()
    };
    let res = resolve_with(&file, &options);

    assert_eq!(res.unresolved().count(), 2);
    assert_eq!(res.diagnostics().with_code(UNRESOLVED_REFERENCE).count(), 0);
}

#[test]
fn test_external_names_are_not_reported() {
    let b = AstBuilder::new();
    let file = faulty_file(&b);
    let options = ResolveOptions::default().with_external_names(["missing"]);
    let res = resolve_with(&file, &options);

    assert_eq!(refs(&res, "missing")[0].binding, Binding::External);
    assert_eq!(res.diagnostics().with_code(UNRESOLVED_REFERENCE).count(), 1);
}

#[test]
fn test_diagnostics_carry_line_numbers_with_source() {
    let b = AstBuilder::new();
    let file = faulty_file(&b);
    let mut map = SourceMap::new();
    let file_id = map.add_file("faulty.go", b.source());
    let source = SourceFile::new("faulty.go", b.source());

    resolver::logging::init_test();
    let res = resolver::resolve_source(&file, &ResolveOptions::default(), file_id, Some(&source)).unwrap();
    assert_eq!(res.file_id(), file_id);

    let missing = res.diagnostics().with_code(UNRESOLVED_REFERENCE).next().unwrap();
    let missing_ref = &refs(&res, "missing")[0];
    let (line, _) = source.offset_to_line_col(missing_ref.span.start);
    assert_eq!(missing.span.start.line, line);
    assert!(missing.span.start.is_mapped());

    let rendered = ErrorFormatter::new().format_diagnostics(res.diagnostics(), &map);
    assert!(rendered.contains("E2001"));
    assert!(rendered.contains("faulty.go"));
    assert!(!rendered.contains("E2002"));
}

#[test]
fn test_offsets_only_without_source() {
    let b = AstBuilder::new();
    let file = faulty_file(&b);
    let res = resolve(&file);

    let missing = res.diagnostics().with_code(UNRESOLVED_REFERENCE).next().unwrap();
    assert_eq!(missing.span.file_id, FileId::default());
    assert!(!missing.span.start.is_mapped());
    assert_eq!(missing.span.start.byte_offset, refs(&res, "missing")[0].span.start);
}
