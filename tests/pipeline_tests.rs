//! End-to-end tests: options files, program assembly and `analyze`.

use jsck::{
    AnalysisOptions, CheckLevel, DiagnosticKind, NodeFlags, ProgramBuilder, SYNTHETIC_EXTERNS_NAME,
    analyze, analyze_to_json, load_options, parse_options,
};
use jsck::tracing_config::init_tracing;
use std::path::{Path, PathBuf};

fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("failed to write test file");
    path
}

#[test]
fn test_clean_program_with_modules() {
    init_tracing();
    let options = AnalysisOptions::default();
    let mut builder = ProgramBuilder::new(&options);
    builder.module("base", &[]);
    builder.module("app", &["base"]);
    builder.add_extern("externs.js", "var console;").unwrap();
    builder
        .add_source("base.js", "var VERSION = 3; function log(msg) { console.log(msg); }", Some("base"))
        .unwrap();
    builder
        .add_source("app.js", "let count = 0; count++; log(VERSION + count);", Some("app"))
        .unwrap();
    let mut program = builder.finish();

    let result = analyze(&mut program, &options).unwrap();
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    assert_eq!(result.immutability.names(), vec!["VERSION"]);
    assert!(result.synthesized_externs.is_empty());
}

#[test]
fn test_diagnostics_in_reporting_order() {
    let options = AnalysisOptions::default();
    let mut builder = ProgramBuilder::new(&options);
    builder.module("m1", &[]);
    builder.module("m2", &[]);
    builder.add_source("a.js", "var a = 1; var a = 2;", Some("m1")).unwrap();
    builder.add_source("b.js", "a; missing;", Some("m2")).unwrap();
    let mut program = builder.finish();

    let result = analyze(&mut program, &options).unwrap();
    let kinds: Vec<DiagnosticKind> = result.diagnostics.iter().map(|d| d.kind).collect();
    assert_eq!(
        kinds,
        vec![
            DiagnosticKind::VarMultiplyDeclared,
            DiagnosticKind::MissingModuleDep,
            DiagnosticKind::UndefinedVar,
        ]
    );
    assert_eq!(result.error_count, 2);
    assert_eq!(result.warning_count, 1);
    assert_eq!(
        result.diagnostics[2].format(),
        "b.js(1,4): error JSCK8001: variable missing is undeclared"
    );
}

#[test]
fn test_tolerant_run_then_strict_run() {
    init_tracing();
    let mut options = parse_options(r#"{"toleratesUndeclaredVars": "true"}"#).unwrap();
    let mut builder = ProgramBuilder::new(&options);
    builder.add_source("input.js", "goog.provide('x'); var x = goog;", None).unwrap();
    let mut program = builder.finish();

    let result = analyze(&mut program, &options).unwrap();
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    assert_eq!(result.synthesized_externs, vec!["goog"]);

    let synthetic = program.synthetic_externs().unwrap();
    assert_eq!(program.unit(synthetic).name, SYNTHETIC_EXTERNS_NAME);

    options.tolerates_undeclared_vars = false;
    let rerun = analyze(&mut program, &options).unwrap();
    assert!(rerun.diagnostics.is_empty(), "{:?}", rerun.diagnostics);
}

#[test]
fn test_annotations_visible_on_units() {
    let options = AnalysisOptions::default();
    let mut builder = ProgramBuilder::new(&options);
    builder.add_extern("externs.js", "x.foo;").unwrap();
    let unit = builder.add_source("input.js", "var x; var y = 1;", None).unwrap();
    let mut program = builder.finish();

    let result = analyze(&mut program, &options).unwrap();
    assert_eq!(result.synthesized_externs, vec!["x"]);

    let y = result.immutability.bindings[0].declaration.unwrap();
    assert_eq!(y.unit, unit);
    assert!(program.has_flag(y, NodeFlags::IMMUTABLE_BINDING));
    assert!(program.synthetic_externs().is_some());
}

#[test]
fn test_json_output() {
    let options = AnalysisOptions::default();
    let mut builder = ProgramBuilder::new(&options);
    builder.add_source("input.js", "const k = 1; q;", None).unwrap();
    let mut program = builder.finish();

    let json = analyze_to_json(&mut program, &options).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["errorCount"], 1);
    assert_eq!(value["diagnostics"][0]["code"], 8001);
    assert_eq!(value["immutability"]["bindings"][0]["name"], "k");
    assert!(value["synthesizedExterns"].as_array().unwrap().is_empty());
}

#[test]
fn test_sanity_mode_error_converts_to_anyhow() {
    let options = AnalysisOptions {
        sanity_check_mode: true,
        ..AnalysisOptions::default()
    };
    let mut builder = ProgramBuilder::new(&options);
    builder.add_source("input.js", "\n\nfoo();", None).unwrap();
    let mut program = builder.finish();

    let err = analyze_to_json(&mut program, &options).unwrap_err();
    assert_eq!(err.to_string(), "Unexpected variable foo at input.js(3,1)");
}

#[test]
fn test_load_options_from_file_with_extends() {
    let dir = tempfile::tempdir().unwrap();
    write_file(
        dir.path(),
        "base.json",
        r#"{
            // shared settings
            "externValidationSeverity": "warning",
            "diagnosticLevels": { "missingModuleDep": "off" },
        }"#,
    );
    let child = write_file(
        dir.path(),
        "jsck.json",
        r#"{ "extends": "./base", "diagnosticLevels": { "JSCK8003": "warning" } }"#,
    );

    let options = load_options(&child).unwrap();
    assert_eq!(options.extern_validation_severity, CheckLevel::Warning);
    assert_eq!(
        options.diagnostic_levels.resolve(DiagnosticKind::MissingModuleDep),
        CheckLevel::Off
    );
    assert_eq!(
        options.diagnostic_levels.resolve(DiagnosticKind::VarMultiplyDeclared),
        CheckLevel::Warning
    );

    let mut builder = ProgramBuilder::new(&options);
    builder.add_extern("externs.js", "undeclaredRoot.member;").unwrap();
    builder.add_source("input.js", "var d; var d;", None).unwrap();
    let mut program = builder.finish();
    let result = analyze(&mut program, &options).unwrap();
    assert_eq!(result.error_count, 0);
    assert_eq!(result.warning_count, 2);
}

#[test]
fn test_load_options_errors_name_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.json");
    let err = load_options(&missing).unwrap_err();
    assert!(format!("{err:#}").contains("absent.json"), "{err:#}");

    let broken = write_file(dir.path(), "broken.json", "{ not json");
    let err = load_options(&broken).unwrap_err();
    assert!(format!("{err:#}").contains("failed to parse options file"), "{err:#}");

    let a = write_file(dir.path(), "a.json", r#"{"extends": "./b"}"#);
    write_file(dir.path(), "b.json", r#"{"extends": "./a"}"#);
    let err = load_options(&a).unwrap_err();
    assert!(format!("{err:#}").contains("cycle"), "{err:#}");
}

#[test]
fn test_units_from_files() {
    let dir = tempfile::tempdir().unwrap();
    let externs = write_file(dir.path(), "externs.js", "function require(name) {}");
    let source = write_file(dir.path(), "main.js", "var fs = require('fs'); fs.read();");

    let options = AnalysisOptions::default();
    let mut builder = ProgramBuilder::new(&options);
    builder.add_extern_file(&externs).unwrap();
    builder.add_source_file(&source, None).unwrap();
    let mut program = builder.finish();
    let result = analyze(&mut program, &options).unwrap();
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    assert_eq!(result.immutability.names(), vec!["fs"]);

    let err = builder_missing_file(dir.path());
    assert!(format!("{err:#}").contains("failed to read"), "{err:#}");
}

fn builder_missing_file(dir: &Path) -> anyhow::Error {
    let mut builder = ProgramBuilder::new(&AnalysisOptions::default());
    builder.add_source_file(&dir.join("nope.js"), None).unwrap_err()
}
