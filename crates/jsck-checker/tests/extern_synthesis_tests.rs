//! Ambient-declaration synthesis for undeclared names.

use jsck_binder::{BinderState, Program, SYNTHETIC_EXTERNS_NAME};
use jsck_checker::{AnalysisResult, VarCheck, run_passes};
use jsck_common::{AnalysisOptions, CheckLevel, DiagnosticKind};
use jsck_parser::{NodeData, NodeFlags};

fn tolerant() -> AnalysisOptions {
    AnalysisOptions {
        tolerates_undeclared_vars: true,
        ..AnalysisOptions::default()
    }
}

/// Helper to run the pipeline over externs + one source unit
fn run(externs: &str, source: &str, options: &AnalysisOptions) -> (Program, AnalysisResult) {
    let mut program = Program::new();
    if !externs.is_empty() {
        program.add_extern("externs", externs).expect("externs parse");
    }
    program.add_source("input0", source).expect("source parse");
    let result = run_passes(&mut program, options).expect("no fatal error");
    (program, result)
}

/// Names declared by the synthetic externs unit, in order
fn synthetic_names(program: &Program) -> Vec<String> {
    let Some(unit) = program.synthetic_externs() else {
        return Vec::new();
    };
    let unit = program.unit(unit);
    let mut names = Vec::new();
    for &statement in unit.statements() {
        let Some(NodeData::VariableStatement { declarations, .. }) = unit.arena.data(statement) else {
            continue;
        };
        for &declaration in declarations {
            if let Some(NodeData::VariableDeclaration { name, .. }) = unit.arena.data(declaration) {
                names.push(unit.arena.identifier_text(*name).unwrap_or_default().to_string());
            }
        }
    }
    names
}

#[test]
fn test_undeclared_name_is_synthesized() {
    let (program, result) = run("", "x; y = 1; x;", &tolerant());
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    assert_eq!(result.synthesized_externs, vec!["x", "y"]);
    assert_eq!(synthetic_names(&program), vec!["x", "y"]);

    let unit = program.unit(program.synthetic_externs().unwrap());
    assert_eq!(unit.name, SYNTHETIC_EXTERNS_NAME);
    assert!(unit.is_extern);
    let first = unit.statements()[0];
    assert!(unit.arena.has_flag(first, NodeFlags::SYNTHESIZED));
}

#[test]
fn test_synthesis_closure() {
    let (mut program, first) = run("", "function f() { return undeclared; }", &tolerant());
    assert_eq!(first.synthesized_externs, vec!["undeclared"]);

    // A fresh strict pass over the synthesized program finds nothing.
    let second = run_passes(&mut program, &AnalysisOptions::default()).unwrap();
    assert!(second.diagnostics.is_empty(), "{:?}", second.diagnostics);
    assert!(second.synthesized_externs.is_empty());
}

#[test]
fn test_sanity_rerun_after_synthesis_is_clean() {
    let (program, _) = run("", "a.b.c; a = 2;", &tolerant());
    let sanity = AnalysisOptions::default().for_sanity_check();
    let mut binding = BinderState::bind_program(&program, &sanity);
    let checked = VarCheck::new(&program, &sanity).check(&mut binding).unwrap();
    assert!(checked.diagnostics.is_empty());
    assert!(binding.diagnostics.is_empty());
}

#[test]
fn test_declared_names_are_not_synthesized() {
    let (program, result) = run("var ambient;", "var local; function f(p) { return p + local + ambient; }", &tolerant());
    assert!(result.synthesized_externs.is_empty());
    assert!(program.synthetic_externs().is_none());
}

#[test]
fn test_var_blocked_by_block_scoped_is_not_synthesized() {
    for source in ["{ let x; var x; } x;", "function f() { { const y = 1; var y; } return y; }"] {
        let (program, result) = run("", source, &tolerant());
        assert!(result.synthesized_externs.is_empty(), "{source:?}: {:?}", result.synthesized_externs);
        assert!(program.synthetic_externs().is_none());
        assert_eq!(
            result.codes(),
            vec![DiagnosticKind::LetConstMultiplyDeclared.code()],
            "{source:?}"
        );
    }
}

#[test]
fn test_no_synthesis_without_tolerance() {
    let (program, result) = run("", "x;", &AnalysisOptions::default());
    assert_eq!(result.codes(), vec![DiagnosticKind::UndefinedVar.code()]);
    assert!(program.synthetic_externs().is_none());
}

#[test]
fn test_sanity_mode_disables_synthesis() {
    let options = AnalysisOptions {
        tolerates_undeclared_vars: true,
        sanity_check_mode: true,
        ..AnalysisOptions::default()
    };
    let mut program = Program::new();
    program.add_source("input0", "x;").unwrap();
    assert!(run_passes(&mut program, &options).is_err());
    assert!(program.synthetic_externs().is_none());
}

#[test]
fn test_extern_reference_to_source_var_is_synthesized_and_suppressed() {
    let (program, result) = run("x.foo;", "var x;", &AnalysisOptions::default());
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    assert_eq!(synthetic_names(&program), vec!["x"]);

    let unit = program.unit(program.unit_by_name("input0").unwrap());
    let statement = unit.statements()[0];
    let Some(NodeData::VariableStatement { declarations, .. }) = unit.arena.data(statement) else {
        panic!("expected a variable statement");
    };
    assert!(unit.arena.has_flag(declarations[0], NodeFlags::SUPPRESS_DUPLICATE));
}

#[test]
fn test_extern_reference_to_source_function_is_synthesized() {
    let (program, result) = run("x.foo;", "function x() {}", &AnalysisOptions::default());
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    assert_eq!(synthetic_names(&program), vec!["x"]);
}

#[test]
fn test_extern_reference_to_source_let_conflicts() {
    let options = AnalysisOptions {
        extern_validation_severity: CheckLevel::Warning,
        ..AnalysisOptions::default()
    };
    let (program, result) = run("asdf.foo;", "let asdf;", &options);
    let kinds: Vec<DiagnosticKind> = result.diagnostics.iter().map(|d| d.kind).collect();
    assert_eq!(
        kinds,
        vec![DiagnosticKind::UndefinedExternVar, DiagnosticKind::LetConstMultiplyDeclared]
    );
    assert_eq!(result.diagnostics[1].file, "input0");
    assert_eq!(synthetic_names(&program), vec!["asdf"]);
}

#[test]
fn test_plain_extern_reference_is_reported_and_synthesized() {
    let (program, result) = run("x;", "var x;", &AnalysisOptions::default());
    assert_eq!(result.codes(), vec![DiagnosticKind::NameReferenceInExterns.code()]);
    assert_eq!(synthetic_names(&program), vec!["x"]);
}
