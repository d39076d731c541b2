//! Pass ordering for one analysis run.
//!
//! 1. Collection (`BinderState`) over every unit.
//! 2. Reference phase (`VarCheck`), including module and extern checks.
//! 3. Extern synthesis for queued names, outside sanity-check mode.
//! 4. Self-check: after an error-free pass that left every name resolved,
//!    rerun collection and the reference phase in sanity-check mode on a
//!    fresh scope tree.
//! 5. Mutability inference over the first pass's binding.

use crate::extern_synthesis::ExternSynthesizer;
use crate::infer_consts::{ImmutabilityReport, InferConsts};
use crate::var_check::{VarCheck, VarCheckError};
use jsck_binder::{BinderState, Program};
use jsck_common::{AnalysisOptions, Diagnostic, DiagnosticBag};
use rustc_hash::FxHashSet;
use serde::Serialize;
use tracing::{debug, info};

/// Output of `run_passes`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// All diagnostics, in reporting order
    pub diagnostics: Vec<Diagnostic>,
    /// Names added to the synthetic externs unit
    pub synthesized_externs: Vec<String>,
    pub immutability: ImmutabilityReport,
    pub error_count: usize,
    pub warning_count: usize,
}

impl AnalysisResult {
    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn codes(&self) -> Vec<u32> {
        self.diagnostics.iter().map(|d| d.code).collect()
    }
}

/// Run every pass over `program`, annotating its units in place.
#[tracing::instrument(level = "info", skip_all, fields(units = program.len()))]
pub fn run_passes(
    program: &mut Program,
    options: &AnalysisOptions,
) -> Result<AnalysisResult, VarCheckError> {
    let mut binding = BinderState::bind_program(program, options);
    let mut diagnostics = std::mem::take(&mut binding.diagnostics);

    let checked = VarCheck::new(program, options).check(&mut binding)?;
    diagnostics.extend(checked.diagnostics);

    let mut synthesized_externs = Vec::new();
    if !options.sanity_check_mode && !checked.synthesis_queue.is_empty() {
        let synthesis =
            ExternSynthesizer::new(options).run(program, &mut binding, &checked.synthesis_queue);
        diagnostics.extend(synthesis.diagnostics);
        synthesized_externs = synthesis.synthesized;
    }

    // The sanity rerun treats any unresolved name as fatal.
    if options.self_check
        && !options.sanity_check_mode
        && !diagnostics.has_errors()
        && binding.unresolved().next().is_none()
    {
        self_check(program, options, &mut diagnostics)?;
    }

    let immutability = InferConsts::new().run(program, &binding);

    info!(
        errors = diagnostics.error_count(),
        warnings = diagnostics.warning_count(),
        synthesized = synthesized_externs.len(),
        immutable = immutability.len(),
        "analysis finished"
    );
    Ok(AnalysisResult {
        error_count: diagnostics.error_count(),
        warning_count: diagnostics.warning_count(),
        diagnostics: diagnostics.into_vec(),
        synthesized_externs,
        immutability,
    })
}

/// Rerun the validator in sanity-check mode and append what it finds that
/// the first pass did not already report.
fn self_check(
    program: &Program,
    options: &AnalysisOptions,
    diagnostics: &mut DiagnosticBag,
) -> Result<(), VarCheckError> {
    let sanity = options.for_sanity_check();
    let mut binding = BinderState::bind_program(program, &sanity);
    let checked = VarCheck::new(program, &sanity).check(&mut binding)?;

    let seen: FxHashSet<(u32, String, u32)> = diagnostics
        .iter()
        .map(|d| (d.code, d.file.clone(), d.span.start))
        .collect();
    let mut added = 0usize;
    let rerun = binding.diagnostics.into_vec().into_iter().chain(checked.diagnostics.into_vec());
    for diagnostic in rerun {
        if !seen.contains(&(diagnostic.code, diagnostic.file.clone(), diagnostic.span.start)) {
            diagnostics.add(diagnostic);
            added += 1;
        }
    }
    debug!(added, "self-check finished");
    Ok(())
}
