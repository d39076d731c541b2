//! Scope construction over parsed JavaScript: hoisting, shadowing and the
//! duplicate-declaration diagnostics of the collection phase.

use jsck_binder::{BinderState, DeclarationKind, Program, ProgramBinding, ScopeKind};
use jsck_common::{AnalysisOptions, DiagnosticKind};

/// Helper to parse one source unit (plus optional externs) and bind it
fn bind_with_externs(externs: &str, source: &str) -> (Program, ProgramBinding) {
    let mut program = Program::new();
    if !externs.is_empty() {
        program.add_extern("externs", externs).expect("externs parse");
    }
    program.add_source("input0", source).expect("source parse");
    let options = AnalysisOptions::default();
    let binding = BinderState::bind_program(&program, &options);
    (program, binding)
}

fn bind(source: &str) -> (Program, ProgramBinding) {
    bind_with_externs("", source)
}

fn codes(binding: &ProgramBinding) -> Vec<u32> {
    binding.diagnostics.iter().map(|d| d.code).collect()
}

fn assert_codes(source: &str, expected: &[DiagnosticKind]) {
    let (_, binding) = bind(source);
    let expected: Vec<u32> = expected.iter().map(|k| k.code()).collect();
    assert_eq!(
        codes(&binding),
        expected,
        "source: {source}\ndiagnostics: {:#?}",
        binding.diagnostics.as_slice()
    );
}

#[test]
fn test_var_declared_twice_in_function() {
    assert_codes(
        "function f() { var x; var x; }",
        &[DiagnosticKind::VarMultiplyDeclared],
    );
    assert_codes(
        "function f() { var x; if (1) { var x; } }",
        &[DiagnosticKind::VarMultiplyDeclared],
    );
}

#[test]
fn test_var_in_separate_functions_is_fine() {
    assert_codes("function f() { var x; } function g() { var x; }", &[]);
    assert_codes("var x; function f() { var x; }", &[]);
}

#[test]
fn test_duplicate_var_message_names_first_unit() {
    let (_, binding) = bind("var a; var a;");
    let diagnostic = &binding.diagnostics.as_slice()[0];
    assert!(
        diagnostic.message.contains("first declared in input0"),
        "{}",
        diagnostic.message
    );
}

#[test]
fn test_let_var_mix_is_block_scoped_error_in_either_order() {
    assert_codes("let x; var x;", &[DiagnosticKind::LetConstMultiplyDeclared]);
    assert_codes("var x; let x;", &[DiagnosticKind::LetConstMultiplyDeclared]);
    assert_codes("{ let x; var x; }", &[DiagnosticKind::LetConstMultiplyDeclared]);
    assert_codes("{ var x; let x; }", &[DiagnosticKind::LetConstMultiplyDeclared]);
    assert_codes(
        "function f() { const x = 1; { var x; } }",
        &[DiagnosticKind::LetConstMultiplyDeclared],
    );
}

#[test]
fn test_suppress_marker_does_not_waive_block_scoped_conflict() {
    assert_codes(
        "let x; /** @suppress {duplicate} */ var x;",
        &[DiagnosticKind::LetConstMultiplyDeclared],
    );
    assert_codes("var x; /** @suppress {duplicate} */ var x;", &[]);
}

#[test]
fn test_class_is_block_scoped() {
    assert_codes("var x; class x {}", &[DiagnosticKind::LetConstMultiplyDeclared]);
    assert_codes("class x {} class x {}", &[DiagnosticKind::LetConstMultiplyDeclared]);
}

#[test]
fn test_let_shadowing_outer_var_is_fine() {
    assert_codes("var x; { let x; }", &[]);
    assert_codes("let x; function f() { let x; }", &[]);
}

#[test]
fn test_parameters() {
    assert_codes("function f(a) { var a; }", &[]);
    assert_codes("function f(a) { function a() {} }", &[]);
    assert_codes("function f(a, a) {}", &[DiagnosticKind::VarMultiplyDeclared]);
    assert_codes("function f(a) { let a; }", &[DiagnosticKind::LetConstMultiplyDeclared]);
}

#[test]
fn test_catch_parameters() {
    assert_codes("var y; try { y = 1 } catch (x) {} try { y = 1 } catch (x) {}", &[]);
    assert_codes(
        "try { var x = 1; x *= 2; } catch (x) {}",
        &[DiagnosticKind::VarMultiplyDeclared],
    );
    assert_codes(
        "try {} catch (x) {} var x;",
        &[DiagnosticKind::VarMultiplyDeclared],
    );
}

#[test]
fn test_arguments_shadowing() {
    assert_codes("var arguments = 3;", &[]);
    assert_codes("function f() { var arguments; }", &[]);
    assert_codes(
        "var f = function arguments() {};",
        &[DiagnosticKind::VarArgumentsShadowed],
    );
    assert_codes(
        "var f = function (arguments) {};",
        &[DiagnosticKind::VarArgumentsShadowed],
    );
    assert_codes(
        "function f() { try {} catch (arguments) {} }",
        &[DiagnosticKind::VarArgumentsShadowed],
    );
    assert_codes(
        "function f() { function arguments() {} }",
        &[DiagnosticKind::VarArgumentsShadowed],
    );
}

#[test]
fn test_define_annotation_does_not_suppress() {
    assert_codes(
        "/** @define {boolean} */ var DEF = false; var DEF = true;",
        &[DiagnosticKind::VarMultiplyDeclared],
    );
}

#[test]
fn test_source_global_colliding_with_extern() {
    let (_, binding) = bind_with_externs("var x;", "var x;");
    assert_eq!(codes(&binding), vec![DiagnosticKind::VarMultiplyDeclared.code()]);

    let (_, binding) = bind_with_externs("var x;", "/** @suppress {duplicate} */ var x;");
    assert!(binding.diagnostics.is_empty());

    let (_, binding) = bind_with_externs("var x;", "let x;");
    assert_eq!(codes(&binding), vec![DiagnosticKind::LetConstMultiplyDeclared.code()]);
}

#[test]
fn test_scope_shapes() {
    let (_, binding) = bind("function f(a) { { let b; } try {} catch (e) {} } var g = function h() {};");
    let scopes = &binding.scopes;

    let b = scopes.declarations().find(|d| d.name == "b").unwrap();
    assert_eq!(scopes.scope(b.scope).kind, ScopeKind::Block);

    let e = scopes.declarations().find(|d| d.name == "e").unwrap();
    assert_eq!(e.kind, DeclarationKind::CatchParameter);
    assert_eq!(scopes.scope(e.scope).kind, ScopeKind::Catch);

    let h = scopes.declarations().find(|d| d.name == "h").unwrap();
    assert_eq!(h.kind, DeclarationKind::FunctionName);
    assert!(scopes.resolve(scopes.global_scope(), "h").is_none());

    let f = scopes.declarations().find(|d| d.name == "f").unwrap();
    assert_eq!(f.scope, scopes.global_scope());
}

#[test]
fn test_extern_function_locals_are_extern() {
    let (_, binding) = bind_with_externs("function ext(a) { var local; }", "");
    let local = binding
        .scopes
        .declarations()
        .find(|d| d.name == "local")
        .unwrap();
    assert!(local.is_extern);
    assert!(binding.scopes.is_extern_scope(local.scope));
}
