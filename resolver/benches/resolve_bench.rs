//! Benchmarks for scope resolution on synthetic compilation units

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use resolver::{resolve_file, resolve_package, semantic_tokens, ResolveOptions};
use syntax::{AstBuilder, BinaryOp, GoFile, Stmt};

/// `count` functions, each declaring locals and calling its predecessor
fn generate_many_functions(count: usize) -> GoFile {
    let b = AstBuilder::new();
    let package = b.package("bench");
    let mut decls = vec![b.type_decl("Point", |b| {
        b.struct_type(|b| vec![b.fields(vec![b.ident("x"), b.ident("y")], b.ty("int"))])
    })];

    for i in 0..count {
        decls.push(b.func(&format!("fn{}", i), |b| {
            let params = vec![b.param(b.ident("p"), b.pointer(b.ty("Point")))];
            let body = b.block(|b| {
                let mut stmts = vec![
                    b.define(&["a", "total"], |b| vec![b.selector(b.name("p"), "x"), b.int(0)]),
                    b.assign(
                        vec![b.name("total")],
                        vec![b.binary(BinaryOp::Add, b.name("a"), b.selector(b.name("p"), "y"))],
                    ),
                ];
                if i > 0 {
                    stmts.push(b.expr_stmt(b.call(b.name(&format!("fn{}", i - 1)), vec![b.name("p")])));
                }
                stmts.push(b.inc(b.selector(b.name("p"), "x")));
                stmts
            });
            (params, body)
        }));
    }

    b.file(package, vec![b.import("fmt")], decls)
}

/// One function with `depth` nested blocks, each redeclaring `v`
fn generate_deep_nesting(depth: usize) -> GoFile {
    fn nest(b: &AstBuilder, remaining: usize) -> Vec<Stmt> {
        let mut stmts = vec![
            b.define(&["v"], |b| vec![b.binary(BinaryOp::Add, b.name("v"), b.int(1))]),
            b.expr_stmt(b.call(b.name("println"), vec![b.name("v")])),
        ];
        if remaining > 0 {
            stmts.push(b.nested(|b| nest(b, remaining - 1)));
        }
        stmts
    }

    let b = AstBuilder::new();
    let package = b.package("bench");
    let decls = vec![
        b.global_var(vec![b.ident("v")], None, vec![b.int(0)]),
        b.func("deep", |b| (vec![], b.block(|b| nest(b, depth)))),
    ];
    b.file(package, vec![], decls)
}

/// `count` redeclarations of the same name in one scope
fn generate_shadow_chain(count: usize) -> GoFile {
    let b = AstBuilder::new();
    let package = b.package("bench");
    let decls = vec![b.func("chain", |b| {
        let body = b.block(|b| {
            (0..count)
                .map(|i| {
                    let fresh = format!("t{}", i);
                    b.define(&[fresh.as_str(), "x"], |b| vec![b.int(i as i64), b.name("x")])
                })
                .collect()
        });
        (vec![b.param(b.ident("x"), b.ty("int"))], body)
    })];
    b.file(package, vec![], decls)
}

fn benchmark_many_functions(c: &mut Criterion) {
    let mut group = c.benchmark_group("many_functions");
    let options = ResolveOptions::default();

    for count in [10, 100, 1000].iter() {
        let file = generate_many_functions(*count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &file, |b, file| {
            b.iter(|| black_box(resolve_file(black_box(file), &options)));
        });
    }

    group.finish();
}

fn benchmark_deep_nesting(c: &mut Criterion) {
    let mut group = c.benchmark_group("deep_nesting");
    let options = ResolveOptions::default();

    for depth in [8, 32, 128].iter() {
        let file = generate_deep_nesting(*depth);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &file, |b, file| {
            b.iter(|| black_box(resolve_file(black_box(file), &options)));
        });
    }

    group.finish();
}

fn benchmark_shadow_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("shadow_chain");
    let options = ResolveOptions::default();

    for count in [10, 100, 500].iter() {
        let file = generate_shadow_chain(*count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &file, |b, file| {
            b.iter(|| black_box(resolve_file(black_box(file), &options)));
        });
    }

    group.finish();
}

fn benchmark_package_and_tokens(c: &mut Criterion) {
    let options = ResolveOptions::default();
    let files: Vec<GoFile> = (0..8).map(|_| generate_many_functions(200)).collect();

    c.bench_function("resolve_package_8x200", |b| {
        b.iter(|| black_box(resolve_package(black_box(&files), &options)));
    });

    if let Ok(resolution) = resolve_file(&files[0], &options) {
        c.bench_function("semantic_tokens_200", |b| {
            b.iter(|| black_box(semantic_tokens(black_box(&resolution), None)));
        });
    }
}

criterion_group!(
    benches,
    benchmark_many_functions,
    benchmark_deep_nesting,
    benchmark_shadow_chain,
    benchmark_package_and_tokens
);
criterion_main!(benches);
