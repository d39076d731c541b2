//! Declaration validation and mutability inference for JavaScript
//! compilation units.
//!
//! The workspace is split the usual way:
//! - `jsck-common` - spans, diagnostics and analysis options
//! - `jsck-scanner` / `jsck-parser` - the JavaScript front end
//! - `jsck-binder` - units, module graph, scope model and collection phase
//! - `jsck-checker` - reference checks, extern synthesis, inference
//!
//! This crate adds the driver (`analyze`, `ProgramBuilder`), JSON options
//! loading (`config`) and tracing setup (`tracing_config`).

// Options file loading
pub mod config;
pub use config::{OptionsFile, load_options, parse_options};

// Program assembly from named sources and files
pub mod driver;
pub use driver::ProgramBuilder;

// Tracing configuration (JSCK_LOG / JSCK_LOG_FORMAT)
pub mod tracing_config;

pub use jsck_binder::{
    CompilationUnit, ModuleGraph, ModuleId, NodeRef, Program, SYNTHETIC_EXTERNS_NAME, UnitId,
};
pub use jsck_checker::{
    AnalysisResult, ImmutabilityReport, ImmutableBinding, VarCheckError, run_passes,
};
pub use jsck_common::{
    AnalysisOptions, CheckLevel, Diagnostic, DiagnosticKind, DiagnosticLevels, LanguageLevel,
    Position, Span,
};
pub use jsck_parser::NodeFlags;

/// Run the validator, extern synthesis and mutability inference over
/// `program`. Units are annotated in place; a fresh call over the same
/// program sees the synthesized externs of the previous one.
pub fn analyze(
    program: &mut Program,
    options: &AnalysisOptions,
) -> Result<AnalysisResult, VarCheckError> {
    run_passes(program, options)
}

/// `analyze` with the result rendered as pretty JSON.
pub fn analyze_to_json(program: &mut Program, options: &AnalysisOptions) -> anyhow::Result<String> {
    let result = analyze(program, options)?;
    Ok(serde_json::to_string_pretty(&result)?)
}
