#![allow(dead_code)]

use resolver::{DeclId, Declaration, MemberUse, Reference, Resolution, ResolveOptions};
use syntax::{AstBuilder, GoFile};

pub fn resolve(file: &GoFile) -> Resolution {
    resolve_with(file, &ResolveOptions::default())
}

pub fn resolve_with(file: &GoFile, options: &ResolveOptions) -> Resolution {
    resolver::logging::init_test();
    resolver::resolve_file(file, options).expect("resolution should succeed")
}

pub fn decls<'a>(resolution: &'a Resolution, name: &'a str) -> Vec<&'a Declaration> {
    resolution.declarations_named(name).collect()
}

pub fn decl(resolution: &Resolution, name: &str) -> DeclId {
    let found = decls(resolution, name);
    assert_eq!(found.len(), 1, "expected exactly one declaration of `{}`", name);
    found[0].id
}

pub fn refs<'a>(resolution: &'a Resolution, name: &str) -> Vec<&'a Reference> {
    resolution
        .references()
        .iter()
        .filter(|r| r.name == name)
        .collect()
}

pub fn member_uses<'a>(resolution: &'a Resolution, name: &str) -> Vec<&'a MemberUse> {
    resolution.members().iter().filter(|m| m.name == name).collect()
}

/// ```go
/// package example
///
/// import "fmt"
///
/// type Person struct {
///     name string
///     mom  *Person
/// }
///
/// func NewPerson(name string, mom *Person) Person {
///     return Person{name: name, mom: mom}
/// }
///
/// func (self *Person) GetName() string { return self.name }
/// func (self *Person) GetMom() *Person { return self.mom }
///
/// var p = NewPerson("foo", nil)
/// var _ = fmt.Println(p)
///
/// func f(fmt Person) string {
///     return fmt.name
/// }
///
/// func f(x int) {
///     x++
///     var y int
///     y++
///     var container struct {
///         y int
///     }
///     container.y++
/// }
///
/// func shadow() {
///     a, x := 1, 2
///     b, x := 2, 3
///     println(a, b, x)
/// }
/// ```
pub fn small_go(b: &AstBuilder) -> GoFile {
    let package = b.package("example");
    let imports = vec![b.import("fmt")];
    let mut decls = Vec::new();

    decls.push(b.type_decl("Person", |b| {
        b.struct_type(|b| {
            vec![
                b.field(b.ident("name"), b.ty("string")),
                b.field(b.ident("mom"), b.pointer(b.ty("Person"))),
            ]
        })
    }));

    decls.push(b.func_returning("NewPerson", |b| {
        let params = vec![
            b.param(b.ident("name"), b.ty("string")),
            b.param(b.ident("mom"), b.pointer(b.ty("Person"))),
        ];
        let results = vec![b.unnamed(b.ty("Person"))];
        let body = b.block(|b| {
            vec![b.ret(vec![b.composite(
                Some(b.ty("Person")),
                vec![
                    b.element(Some(b.name("name")), b.name("name")),
                    b.element(Some(b.name("mom")), b.name("mom")),
                ],
            )])]
        });
        (params, results, body)
    }));

    decls.push(b.method("self", "Person", true, "GetName", |b| {
        let results = vec![b.unnamed(b.ty("string"))];
        let body = b.block(|b| vec![b.ret(vec![b.selector(b.name("self"), "name")])]);
        (vec![], results, body)
    }));

    decls.push(b.method("self", "Person", true, "GetMom", |b| {
        let results = vec![b.unnamed(b.pointer(b.ty("Person")))];
        let body = b.block(|b| vec![b.ret(vec![b.selector(b.name("self"), "mom")])]);
        (vec![], results, body)
    }));

    decls.push(b.global_var(
        vec![b.ident("p")],
        None,
        vec![b.call(b.name("NewPerson"), vec![b.string("foo"), b.name("nil")])],
    ));
    decls.push(b.global_var(
        vec![b.ident("_")],
        None,
        vec![b.call(b.selector(b.name("fmt"), "Println"), vec![b.name("p")])],
    ));

    decls.push(b.func_returning("f", |b| {
        let params = vec![b.param(b.ident("fmt"), b.ty("Person"))];
        let results = vec![b.unnamed(b.ty("string"))];
        let body = b.block(|b| vec![b.ret(vec![b.selector(b.name("fmt"), "name")])]);
        (params, results, body)
    }));

    decls.push(b.func("f", |b| {
        let params = vec![b.param(b.ident("x"), b.ty("int"))];
        let body = b.block(|b| {
            vec![
                b.inc(b.name("x")),
                b.local_var(vec![b.ident("y")], Some(b.ty("int")), vec![]),
                b.inc(b.name("y")),
                b.local_var(
                    vec![b.ident("container")],
                    Some(b.struct_type(|b| vec![b.field(b.ident("y"), b.ty("int"))])),
                    vec![],
                ),
                b.inc(b.selector(b.name("container"), "y")),
            ]
        });
        (params, body)
    }));

    decls.push(b.func("shadow", |b| {
        let body = b.block(|b| {
            vec![
                b.define(&["a", "x"], |b| vec![b.int(1), b.int(2)]),
                b.define(&["b", "x"], |b| vec![b.int(2), b.int(3)]),
                b.expr_stmt(b.call(b.name("println"), vec![b.name("a"), b.name("b"), b.name("x")])),
            ]
        });
        (vec![], body)
    }));

    b.file(package, imports, decls)
}
