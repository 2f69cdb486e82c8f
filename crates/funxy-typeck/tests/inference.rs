//! End-to-end inference over single-module programs: polymorphic calls,
//! higher-kinded unification through `fmap`, operator dispatch, records,
//! optionals and the pending-stub recursion scheme.

mod common;

use common::*;
use funxy_ast::expr::{Expr, Lit};
use funxy_ast::item::{
    CtorDecl, Decl, FunDecl, FunSig, ImportDecl, InstanceDecl, Program, TypeDecl, TypeDeclBody,
};
use funxy_ast::types::TypeExpr;
use funxy_common::DiagnosticKind;
use funxy_typeck::{analyze_program, Ty};

fn float(value: f64) -> Expr {
    Expr::Lit {
        lit: Lit::Float(value),
        span: sp(),
    }
}

fn nil() -> Expr {
    Expr::Lit {
        lit: Lit::Nil,
        span: sp(),
    }
}

fn check(program: Program) -> funxy_typeck::AnalysisResult {
    analyze_program("main.fx", program)
}

fn symbol_ty(result: &funxy_typeck::AnalysisResult, name: &str) -> Ty {
    result
        .entry_module()
        .expect("entry module")
        .table
        .find(name)
        .unwrap_or_else(|| panic!("no symbol `{name}`"))
        .ty
        .clone()
}

// ── S1: polymorphic identity ───────────────────────────────────────────

#[test]
fn polymorphic_identity_instantiates_per_call() {
    let result = check(program(vec![
        fun(
            "id",
            &["T"],
            vec![param("x", Some(named("T")))],
            Some(named("T")),
            ident("x"),
        ),
        constant("a", call(ident("id"), vec![int(42)])),
        constant("b", call(ident("id"), vec![string("hi")])),
    ]));
    assert!(!result.has_errors(), "{:?}", result.diagnostics);
    assert_eq!(symbol_ty(&result, "a"), Ty::int());
    // String is List<Char> underneath; the nominal name is preserved.
    assert_eq!(symbol_ty(&result, "b"), Ty::string());
}

// ── S2: higher-kinded unification through fmap ─────────────────────────

#[test]
fn fmap_over_option_binds_the_constructor() {
    let result = check(program(vec![constant(
        "m",
        call(
            ident("fmap"),
            vec![
                fn_lit(&["x"], infix("+", ident("x"), int(1))),
                call(ident("Some"), vec![int(3)]),
            ],
        ),
    )]));
    assert!(!result.has_errors(), "{:?}", result.diagnostics);
    assert_eq!(symbol_ty(&result, "m"), Ty::option(Ty::int()));
}

#[test]
fn fmap_over_result_binds_a_partial_application() {
    let result = check(program(vec![constant(
        "r",
        call(
            ident("fmap"),
            vec![
                fn_lit(&["x"], infix("+", ident("x"), int(1))),
                call(ident("Ok"), vec![int(3)]),
            ],
        ),
    )]));
    assert!(!result.has_errors(), "{:?}", result.diagnostics);
    // The error side stays free: Result<e, Int>.
    match symbol_ty(&result, "r") {
        Ty::App(head, args) => {
            assert_eq!(*head, Ty::con("Result"));
            assert_eq!(args.len(), 2);
            assert!(matches!(args[0], Ty::Var(_)), "error side should be free");
            assert_eq!(args[1], Ty::int());
        }
        other => panic!("expected a Result application, got {other}"),
    }
}

// ── S6: operator dispatch ──────────────────────────────────────────────

#[test]
fn numeric_operators_cover_ints() {
    let result = check(program(vec![constant(
        "s",
        infix("+", int(1), int(2)),
    )]));
    assert!(!result.has_errors(), "{:?}", result.diagnostics);
    assert_eq!(symbol_ty(&result, "s"), Ty::int());
}

fn vec2_decl() -> Decl {
    Decl::Type(TypeDecl {
        name: "Vec2".to_string(),
        params: Vec::new(),
        body: TypeDeclBody::Adt(vec![CtorDecl {
            name: "MkVec2".to_string(),
            fields: vec![named("Float"), named("Float")],
            span: sp(),
        }]),
        span: sp(),
    })
}

fn vec2_value(name: &str) -> Decl {
    constant(
        name,
        call(ident("MkVec2"), vec![float(1.0), float(2.0)]),
    )
}

#[test]
fn user_instance_makes_plus_typecheck() {
    let plus_impl = FunDecl {
        sig: FunSig {
            name: "+".to_string(),
            type_params: Vec::new(),
            constraints: Vec::new(),
            params: vec![param("a", None), param("b", None)],
            variadic: false,
            ret: None,
            span: sp(),
        },
        body: body_of(ident("a")),
        span: sp(),
    };
    let result = check(program(vec![
        vec2_decl(),
        Decl::Instance(InstanceDecl {
            trait_name: "Numeric".to_string(),
            target: named("Vec2"),
            type_params: Vec::new(),
            methods: vec![plus_impl],
            span: sp(),
        }),
        vec2_value("v1"),
        vec2_value("v2"),
        constant("sum", infix("+", ident("v1"), ident("v2"))),
    ]));
    assert!(!result.has_errors(), "{:?}", result.diagnostics);
    assert_eq!(symbol_ty(&result, "sum"), Ty::con("Vec2"));
}

#[test]
fn missing_instance_is_reported_for_user_types() {
    let result = check(program(vec![
        vec2_decl(),
        vec2_value("v1"),
        vec2_value("v2"),
        constant("sum", infix("+", ident("v1"), ident("v2"))),
    ]));
    assert!(result.diagnostics.iter().any(|d| matches!(
        &d.kind,
        DiagnosticKind::MissingInstance { trait_name, .. } if trait_name == "Numeric"
    )));
}

// ── Operators beyond arithmetic ────────────────────────────────────────

#[test]
fn comparison_returns_bool_and_pipe_threads_values() {
    let result = check(program(vec![
        constant("c", infix("<", int(1), int(2))),
        constant("p", infix("|>", int(1), fn_lit(&["x"], ident("x")))),
    ]));
    assert!(!result.has_errors(), "{:?}", result.diagnostics);
    assert_eq!(symbol_ty(&result, "c"), Ty::bool());
    assert_eq!(symbol_ty(&result, "p"), Ty::int());
}

#[test]
fn coalescing_strips_nil_from_optionals() {
    let optional_int = TypeExpr::Optional {
        inner: Box::new(named("Int")),
        span: sp(),
    };
    let annotated_nil = Expr::Annotated {
        expr: Box::new(nil()),
        ty: optional_int,
        span: sp(),
    };
    let result = check(program(vec![constant(
        "n",
        infix("??", annotated_nil, int(0)),
    )]));
    assert!(!result.has_errors(), "{:?}", result.diagnostics);
    assert_eq!(symbol_ty(&result, "n"), Ty::int());
}

#[test]
fn concat_works_on_strings_through_the_alias() {
    let result = check(program(vec![constant(
        "s",
        infix("++", string("ab"), string("cd")),
    )]));
    assert!(!result.has_errors(), "{:?}", result.diagnostics);
    assert_eq!(symbol_ty(&result, "s"), Ty::string());
}

// ── Records ────────────────────────────────────────────────────────────

#[test]
fn record_literals_and_member_access() {
    let record = Expr::Record {
        fields: vec![("x".to_string(), int(1)), ("y".to_string(), int(2))],
        spread: None,
        span: sp(),
    };
    let access = Expr::Member {
        target: Box::new(ident("p")),
        name: "x".to_string(),
        optional: false,
        span: sp(),
    };
    let result = check(program(vec![
        constant("p", record),
        constant("px", access),
    ]));
    assert!(!result.has_errors(), "{:?}", result.diagnostics);
    assert_eq!(symbol_ty(&result, "px"), Ty::int());
}

#[test]
fn missing_record_field_is_an_error() {
    let record = Expr::Record {
        fields: vec![("x".to_string(), int(1))],
        spread: None,
        span: sp(),
    };
    let access = Expr::Member {
        target: Box::new(ident("p")),
        name: "z".to_string(),
        optional: false,
        span: sp(),
    };
    let result = check(program(vec![
        constant("p", record),
        constant("pz", access),
    ]));
    assert!(result.has_errors());
}

// ── Annotations and constants ──────────────────────────────────────────

#[test]
fn annotation_mismatch_is_reported() {
    let bad = Expr::Annotated {
        expr: Box::new(int(1)),
        ty: named("Bool"),
        span: sp(),
    };
    let result = check(program(vec![constant("x", bad)]));
    assert!(result.diagnostics.iter().any(|d| matches!(
        &d.kind,
        DiagnosticKind::UnificationFailure { expected, actual, .. }
            if expected == "Bool" && actual == "Int"
    )));
}

#[test]
fn constants_refuse_reassignment() {
    let reassign = Expr::Assign {
        target: Box::new(ident("x")),
        value: Box::new(int(2)),
        span: sp(),
    };
    let result = check(program(vec![
        constant("x", int(1)),
        Decl::Expr(reassign),
    ]));
    assert!(result.diagnostics.iter().any(|d| matches!(
        &d.kind,
        DiagnosticKind::ConstantReassignment { name } if name == "x"
    )));
}

#[test]
fn undefined_symbols_are_reported() {
    let result = check(program(vec![constant("x", ident("nowhere"))]));
    assert!(result.diagnostics.iter().any(|d| matches!(
        &d.kind,
        DiagnosticKind::UndefinedSymbol { name, .. } if name == "nowhere"
    )));
}

#[test]
fn duplicate_top_level_definitions_are_reported() {
    let result = check(program(vec![
        constant("x", int(1)),
        constant("x", int(2)),
    ]));
    assert!(result.diagnostics.iter().any(|d| matches!(
        &d.kind,
        DiagnosticKind::DuplicateDefinition { name } if name == "x"
    )));
}

// ── Pending stubs: intra-module mutual recursion ───────────────────────

#[test]
fn mutually_recursive_functions_typecheck_with_annotations() {
    let even = fun(
        "even",
        &[],
        vec![param("n", Some(named("Int")))],
        Some(named("Bool")),
        call(ident("odd"), vec![ident("n")]),
    );
    let odd = fun(
        "odd",
        &[],
        vec![param("n", Some(named("Int")))],
        Some(named("Bool")),
        call(ident("even"), vec![ident("n")]),
    );
    let result = check(program(vec![even, odd]));
    assert!(!result.has_errors(), "{:?}", result.diagnostics);
    assert_eq!(
        symbol_ty(&result, "even"),
        Ty::func(vec![Ty::int()], Ty::bool())
    );
}

// ── Virtual packages from a program ────────────────────────────────────

#[test]
fn wildcard_import_of_a_virtual_package() {
    let import = ImportDecl {
        path: "lib/list".to_string(),
        alias: None,
        symbols: Vec::new(),
        exclude: Vec::new(),
        wildcard: true,
        span: sp(),
    };
    let list_lit = Expr::List {
        elems: vec![int(1), int(2)],
        span: sp(),
    };
    let mut prog = program(vec![constant(
        "n",
        call(ident("len"), vec![list_lit]),
    )]);
    prog.imports.push(import);
    let result = check(prog);
    assert!(!result.has_errors(), "{:?}", result.diagnostics);
    assert_eq!(symbol_ty(&result, "n"), Ty::int());
}

#[test]
fn qualified_access_through_the_import_alias() {
    let import = ImportDecl {
        path: "lib/math".to_string(),
        alias: None,
        symbols: Vec::new(),
        exclude: Vec::new(),
        wildcard: false,
        span: sp(),
    };
    let access = Expr::Member {
        target: Box::new(ident("math")),
        name: "pi".to_string(),
        optional: false,
        span: sp(),
    };
    let mut prog = program(vec![constant("tau", access)]);
    prog.imports.push(import);
    let result = check(prog);
    assert!(!result.has_errors(), "{:?}", result.diagnostics);
    assert_eq!(symbol_ty(&result, "tau"), Ty::float());
}
