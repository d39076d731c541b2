//! Mutability inference over source bindings.

use jsck_binder::{NodeRef, Program};
use jsck_checker::{AnalysisResult, run_passes};
use jsck_common::AnalysisOptions;
use jsck_parser::{NodeData, NodeFlags, NodeIndex};

fn analyze(source: &str) -> (Program, AnalysisResult) {
    let mut program = Program::new();
    program.add_source("input0", source).expect("source parse");
    let result = run_passes(&mut program, &AnalysisOptions::default()).expect("no fatal error");
    (program, result)
}

/// Helper returning the immutable binding names in declaration order
fn immutable(source: &str) -> Vec<String> {
    let (_, result) = analyze(source);
    result
        .immutability
        .names()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Identifier nodes of `input0` spelled `name`, with their flag state
fn identifier_flags(program: &Program, name: &str) -> Vec<bool> {
    let unit_id = program.unit_by_name("input0").expect("input0");
    let arena = program.arena(unit_id);
    (0..arena.len() as u32)
        .map(NodeIndex)
        .filter(|&index| matches!(arena.data(index), Some(NodeData::Identifier { text }) if text == name))
        .map(|index| program.has_flag(NodeRef::new(unit_id, index), NodeFlags::IMMUTABLE_BINDING))
        .collect()
}

#[test]
fn test_single_initialized_var() {
    assert_eq!(immutable("var x = 3, y;"), vec!["x"]);
    assert_eq!(immutable("var x = 3; x;"), vec!["x"]);
    assert_eq!(immutable("let x = 3; function f() { return x; }"), vec!["x"]);
}

#[test]
fn test_mutation_disqualifies() {
    assert!(immutable("let x = 3; x++;").is_empty());
    assert!(immutable("var x = 3; x = 4;").is_empty());
    assert!(immutable("var x = 3; x += 1;").is_empty());
    assert!(immutable("var x = 3; --x;").is_empty());
}

#[test]
fn test_mutation_in_uncalled_function_disqualifies() {
    assert!(immutable("var x = 1; function f() { x = 2; }").is_empty());
    assert!(immutable("let x = 1; var g = function () { x++; };").contains(&"g".to_string()));
}

#[test]
fn test_redeclaration_disqualifies() {
    assert!(immutable("var x = 1; var x = 2;").is_empty());
}

#[test]
fn test_forward_reference_disqualifies() {
    assert!(immutable("x; var x = 1;").is_empty());
    // Program order, not execution order: a closure textually before the
    // declaration counts as a forward reference.
    assert!(immutable("function f() { return x; } var x = 1;").is_empty());
    assert_eq!(immutable("var x = 1; function f() { return x; }"), vec!["x"]);
}

#[test]
fn test_loop_heads() {
    assert_eq!(immutable("var o = {}; for (var k in o) { k; }"), vec!["o"]);
    assert!(immutable("for (let k of []) {}").is_empty());
}

#[test]
fn test_const_and_annotations() {
    assert_eq!(immutable("const x = 1;"), vec!["x"]);
    assert_eq!(immutable("/** @const */ var x;"), vec!["x"]);
    assert_eq!(immutable("/** @const */ let x; let y;"), vec!["x"]);
    assert_eq!(immutable("/** @const */ var x = 1; x = 2;"), vec!["x"]);
    assert_eq!(immutable("/** @define {boolean} */ var DEBUG = true;"), vec!["DEBUG"]);
}

#[test]
fn test_const_keyword_is_not_trusted() {
    let (_, result) = analyze("const x = 1; x = 2; function f() { x++; }");
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    assert!(result.immutability.names().is_empty());

    assert!(immutable("function f() { return k; } const k = 1;").is_empty());
    assert!(immutable("for (const k of []) {}").is_empty());
    assert_eq!(immutable("const a = 1, b = a;"), vec!["a", "b"]);
}

#[test]
fn test_shadowed_bindings_are_independent() {
    assert_eq!(immutable("let x = 3; function f() { let x = 4; }"), vec!["x", "x"]);
    assert_eq!(immutable("let x = 3; function f() { let x = 4; x++; }"), vec!["x"]);

    let (_, result) = analyze("let x = 3; function f() { let x = 4; x++; }");
    assert_eq!(result.immutability.bindings[0].position.column, 5);
}

#[test]
fn test_non_variable_bindings_are_skipped() {
    assert!(immutable("var arguments = 3;").is_empty());
    assert!(immutable("function f(a) { return a; }").is_empty());
    assert!(immutable("class C {}").is_empty());
    assert!(immutable("try {} catch (e) {}").is_empty());
}

#[test]
fn test_extern_bindings_are_skipped() {
    let mut program = Program::new();
    program.add_extern("externs", "var ambient = 1;").unwrap();
    program.add_source("input0", "var local = ambient;").unwrap();
    let result = run_passes(&mut program, &AnalysisOptions::default()).unwrap();
    assert_eq!(result.immutability.names(), vec!["local"]);
}

#[test]
fn test_flags_on_declarations_and_references() {
    let (program, result) = analyze("var x = 1; var y = 2; y = 3; x; x + y;");
    assert_eq!(result.immutability.names(), vec!["x"]);

    let binding = &result.immutability.bindings[0];
    let declaration = binding.declaration.expect("declaration node");
    assert!(program.has_flag(declaration, NodeFlags::IMMUTABLE_BINDING));
    assert_eq!(binding.file, "input0");

    // Binding name identifiers are not references; only uses are flagged.
    assert_eq!(identifier_flags(&program, "x"), vec![false, true, true]);
    assert!(identifier_flags(&program, "y").iter().all(|flag| !flag));
}
