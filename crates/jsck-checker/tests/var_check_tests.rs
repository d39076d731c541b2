//! Declaration validator: undeclared references, duplicates, `arguments`
//! shadowing, extern references and the sanity-check mode.

use jsck_binder::Program;
use jsck_checker::{VarCheckError, run_passes};
use jsck_common::{AnalysisOptions, CheckLevel, DiagnosticKind};

/// Helper to analyze externs + one source unit and get the diagnostic codes
fn check_with(externs: &str, source: &str, options: &AnalysisOptions) -> Vec<u32> {
    let mut program = Program::new();
    if !externs.is_empty() {
        program.add_extern("externs", externs).expect("externs parse");
    }
    program.add_source("input0", source).expect("source parse");
    let result = run_passes(&mut program, options).expect("no fatal error");
    result.codes()
}

fn check(source: &str) -> Vec<u32> {
    check_with("", source, &AnalysisOptions::default())
}

fn code(kind: DiagnosticKind) -> u32 {
    kind.code()
}

#[test]
fn test_declared_names_are_clean() {
    let cases = [
        "var x; x;",
        "x; var x;",
        "function f() { return g(); } function g() { return 1; }",
        "function f(a) { return a + arguments.length; }",
        "var a = {b: 5}; a.b;",
        "try {} catch (e) { e; }",
        "for (var i = 0; i < 3; i++) { i; }",
        "for (let k in {}) { k; }",
        "var o = {}; for (var p in o) {}",
        "label: for (;;) { break label; }",
        "var f = function g() { return g; };",
        "class C { m() { return this; } static s() { return C; } }",
        "var x = 1; switch (x) { case 1: let y = x; break; default: y; }",
    ];
    for source in cases {
        let codes = check(source);
        assert!(codes.is_empty(), "expected no diagnostics for {source:?}, got {codes:?}");
    }
}

#[test]
fn test_undefined_var() {
    assert_eq!(check("x;"), vec![code(DiagnosticKind::UndefinedVar)]);
    assert_eq!(check("x = 1;"), vec![code(DiagnosticKind::UndefinedVar)]);
    assert_eq!(
        check("function f() { return y; }"),
        vec![code(DiagnosticKind::UndefinedVar)]
    );
    assert_eq!(check("{ let z; } z;"), vec![code(DiagnosticKind::UndefinedVar)]);
    assert_eq!(
        check("function f() { var a; } a;"),
        vec![code(DiagnosticKind::UndefinedVar)]
    );
}

#[test]
fn test_with_statement_does_not_declare() {
    assert_eq!(
        check("var a = {b: 5}; with (a) { b; }"),
        vec![code(DiagnosticKind::UndefinedVar)]
    );
}

#[test]
fn test_undefined_var_position_and_message() {
    let mut program = Program::new();
    program.add_source("input0", "var a;\n  missing;").unwrap();
    let result = run_passes(&mut program, &AnalysisOptions::default()).unwrap();
    let diagnostic = &result.diagnostics[0];
    assert_eq!(diagnostic.kind, DiagnosticKind::UndefinedVar);
    assert_eq!((diagnostic.position.line, diagnostic.position.column), (2, 3));
    assert_eq!(diagnostic.message, "variable missing is undeclared");
    assert_eq!(diagnostic.file, "input0");
}

#[test]
fn test_references_across_source_units() {
    let mut program = Program::new();
    program.add_source("a.js", "var shared = 1;").unwrap();
    program.add_source("b.js", "shared;").unwrap();
    let result = run_passes(&mut program, &AnalysisOptions::default()).unwrap();
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
}

#[test]
fn test_duplicates_through_pipeline() {
    assert_eq!(check("var x; var x;"), vec![code(DiagnosticKind::VarMultiplyDeclared)]);
    assert_eq!(check("let x; var x;"), vec![code(DiagnosticKind::LetConstMultiplyDeclared)]);
    assert_eq!(check("var x; let x;"), vec![code(DiagnosticKind::LetConstMultiplyDeclared)]);
    assert_eq!(
        check("var x; /** @suppress {duplicate} */ var x;"),
        Vec::<u32>::new()
    );
    assert_eq!(
        check("var x; /** @suppress {duplicate} */ let x;"),
        vec![code(DiagnosticKind::LetConstMultiplyDeclared)]
    );
}

#[test]
fn test_var_blocked_by_let_still_hoists() {
    let let_const = vec![code(DiagnosticKind::LetConstMultiplyDeclared)];
    assert_eq!(check("{ let x; var x; } x;"), let_const);
    assert_eq!(
        check("function f() { { let x; { var x; } } return x; }"),
        let_const
    );
    assert_eq!(check("var x; { const x = 1; var x; } x;"), let_const);
}

#[test]
fn test_duplicate_across_units_names_first_unit() {
    let mut program = Program::new();
    program.add_source("first.js", "var dup;").unwrap();
    program.add_source("second.js", "var dup;").unwrap();
    let result = run_passes(&mut program, &AnalysisOptions::default()).unwrap();
    assert_eq!(result.codes(), vec![code(DiagnosticKind::VarMultiplyDeclared)]);
    assert_eq!(result.diagnostics[0].file, "second.js");
    assert!(result.diagnostics[0].message.contains("first.js"));
}

#[test]
fn test_arguments_rules() {
    assert!(check("var arguments = 3;").is_empty());
    assert!(check("function f() { var arguments = 3; return arguments; }").is_empty());
    assert_eq!(
        check("var f = function arguments() {};"),
        vec![code(DiagnosticKind::VarArgumentsShadowed)]
    );
    assert_eq!(
        check("var f = function (arguments) {};"),
        vec![code(DiagnosticKind::VarArgumentsShadowed)]
    );
    assert_eq!(
        check("function f() { try {} catch (arguments) {} }"),
        vec![code(DiagnosticKind::VarArgumentsShadowed)]
    );
}

#[test]
fn test_severity_overrides() {
    let options = AnalysisOptions {
        diagnostic_levels: jsck_common::DiagnosticLevels::new()
            .with(DiagnosticKind::UndefinedVar, CheckLevel::Warning),
        ..AnalysisOptions::default()
    };
    let mut program = Program::new();
    program.add_source("input0", "x;").unwrap();
    let result = run_passes(&mut program, &options).unwrap();
    assert_eq!(result.error_count, 0);
    assert_eq!(result.warning_count, 1);

    let silenced = AnalysisOptions {
        diagnostic_levels: jsck_common::DiagnosticLevels::new()
            .with(DiagnosticKind::VarMultiplyDeclared, CheckLevel::Off),
        ..AnalysisOptions::default()
    };
    assert!(check_with("", "var x; var x;", &silenced).is_empty());
}

#[test]
fn test_extern_references() {
    let options = AnalysisOptions {
        extern_validation_severity: CheckLevel::Error,
        ..AnalysisOptions::default()
    };
    assert_eq!(
        check_with("asdf.foo;", "", &options),
        vec![code(DiagnosticKind::UndefinedExternVar)]
    );
    assert_eq!(
        check_with("asdf;", "var asdf;", &AnalysisOptions::default()),
        vec![code(DiagnosticKind::NameReferenceInExterns)]
    );
    assert!(check_with("var ns; ns.foo;", "", &options).is_empty());
    assert!(check_with("function ext(a) { return a; }", "ext(1);", &options).is_empty());
}

#[test]
fn test_extern_validation_is_off_by_default() {
    assert!(check_with("asdf.foo;", "", &AnalysisOptions::default()).is_empty());
}

#[test]
fn test_source_may_use_externs() {
    assert!(check_with("var window; function alert(msg) {}", "alert(window);", &AnalysisOptions::default()).is_empty());
}

#[test]
fn test_sanity_mode_unresolved_is_fatal() {
    let options = AnalysisOptions {
        sanity_check_mode: true,
        ..AnalysisOptions::default()
    };
    let mut program = Program::new();
    program.add_source("input0", "var a;\nx;").unwrap();
    let err = run_passes(&mut program, &options).unwrap_err();
    let VarCheckError::UnexpectedVariable { name, position, .. } = &err;
    assert_eq!(name, "x");
    assert_eq!(position.line, 2);
    assert!(err.to_string().starts_with("Unexpected variable x"), "{err}");
}

#[test]
fn test_sanity_mode_allows_declared_names() {
    let options = AnalysisOptions {
        sanity_check_mode: true,
        ..AnalysisOptions::default()
    };
    assert!(check_with("var e;", "var a = e; a;", &options).is_empty());
}
