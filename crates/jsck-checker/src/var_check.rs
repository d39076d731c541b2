//! Reference phase of the declaration validator.
//!
//! Runs after `BinderState` has collected every unit. Each recorded
//! reference is resolved against the `ScopeTree`, then:
//! - an unresolved source reference is `UndefinedVar`, or queued for extern
//!   synthesis when undeclared names are tolerated;
//! - a source reference resolved into another unit goes through the
//!   `ModuleDependencyChecker`;
//! - an extern reference not resolved to an extern declaration goes through
//!   `classify_extern_reference` and is queued for synthesis.
//!
//! In sanity-check mode only resolution is checked, and an unresolved name
//! is a fatal `VarCheckError`.

use crate::extern_check::classify_extern_reference;
use crate::module_deps::ModuleDependencyChecker;
use indexmap::IndexSet;
use jsck_binder::{Program, ProgramBinding, Reference};
use jsck_common::{AnalysisOptions, DiagnosticBag, DiagnosticKind, Position};
use rustc_hash::FxBuildHasher;
use std::fmt;
use tracing::debug;

/// Names waiting for an ambient declaration, in first-seen order.
pub type SynthesisQueue = IndexSet<String, FxBuildHasher>;

/// Fatal condition of the reference phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VarCheckError {
    /// A name resolved nowhere while in sanity-check mode. Some earlier
    /// transformation introduced an undeclared reference.
    UnexpectedVariable {
        name: String,
        file: String,
        position: Position,
    },
}

impl fmt::Display for VarCheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarCheckError::UnexpectedVariable {
                name,
                file,
                position,
            } => write!(
                f,
                "Unexpected variable {name} at {file}({},{})",
                position.line, position.column
            ),
        }
    }
}

impl std::error::Error for VarCheckError {}

/// What the reference phase hands to the rest of the pipeline.
#[derive(Debug, Default)]
pub struct VarCheckOutput {
    pub diagnostics: DiagnosticBag,
    pub synthesis_queue: SynthesisQueue,
}

pub struct VarCheck<'a> {
    program: &'a Program,
    options: &'a AnalysisOptions,
    module_checker: ModuleDependencyChecker<'a>,
    output: VarCheckOutput,
}

impl<'a> VarCheck<'a> {
    pub fn new(program: &'a Program, options: &'a AnalysisOptions) -> Self {
        VarCheck {
            program,
            options,
            module_checker: ModuleDependencyChecker::new(program.module_graph()),
            output: VarCheckOutput::default(),
        }
    }

    /// Resolve every reference of `binding` and report.
    #[tracing::instrument(level = "debug", skip_all, fields(references = binding.references.len()))]
    pub fn check(mut self, binding: &mut ProgramBinding) -> Result<VarCheckOutput, VarCheckError> {
        let scopes = &binding.scopes;
        for reference in &mut binding.references {
            reference.resolved = scopes.resolve(reference.scope, &reference.name);
        }

        for reference in &binding.references {
            if self.program.unit(reference.unit()).is_extern {
                self.check_extern_reference(binding, reference)?;
            } else {
                self.check_source_reference(binding, reference)?;
            }
        }

        debug!(
            diagnostics = self.output.diagnostics.len(),
            queued = self.output.synthesis_queue.len(),
            "reference phase finished"
        );
        Ok(self.output)
    }

    fn check_source_reference(
        &mut self,
        binding: &ProgramBinding,
        reference: &Reference,
    ) -> Result<(), VarCheckError> {
        let Some(resolved) = reference.resolved else {
            return self.report_unresolved(reference);
        };
        if self.options.sanity_check_mode {
            return Ok(());
        }

        let declaration = binding.scopes.declaration(resolved);
        if declaration.is_extern || declaration.unit == reference.unit() {
            return Ok(());
        }
        let (Some(referencing), Some(declaring)) = (
            self.program.module_of_unit(reference.unit()),
            self.program.module_of_unit(declaration.unit),
        ) else {
            return Ok(());
        };

        let in_function = binding.scopes.is_in_function(reference.scope);
        let verdict = self
            .module_checker
            .classify(referencing, declaring, in_function);
        if let Some(kind) = verdict.diagnostic_kind() {
            let graph = self.program.module_graph();
            self.report(
                kind,
                reference,
                &[
                    graph.module_name(referencing),
                    graph.module_name(declaring),
                    reference.name.as_str(),
                ],
            );
        }
        Ok(())
    }

    fn report_unresolved(&mut self, reference: &Reference) -> Result<(), VarCheckError> {
        if self.options.sanity_check_mode {
            let unit = self.program.unit(reference.unit());
            let span = self.program.span_of(reference.node);
            return Err(VarCheckError::UnexpectedVariable {
                name: reference.name.clone(),
                file: unit.name.clone(),
                position: unit.line_map().position_of(span.start),
            });
        }
        if self.options.tolerates_undeclared_vars {
            debug!(name = %reference.name, "queueing undeclared name for synthesis");
            self.output.synthesis_queue.insert(reference.name.clone());
        } else {
            self.report(DiagnosticKind::UndefinedVar, reference, &[reference.name.as_str()]);
        }
        Ok(())
    }

    fn check_extern_reference(
        &mut self,
        binding: &ProgramBinding,
        reference: &Reference,
    ) -> Result<(), VarCheckError> {
        if self.options.sanity_check_mode {
            return match reference.resolved {
                Some(_) => Ok(()),
                None => self.report_unresolved(reference),
            };
        }
        let resolved = reference
            .resolved
            .map(|id| binding.scopes.declaration(id));
        if let Some(kind) = classify_extern_reference(reference, resolved) {
            self.report(kind, reference, &[reference.name.as_str()]);
            self.output.synthesis_queue.insert(reference.name.clone());
        }
        Ok(())
    }

    fn report(&mut self, kind: DiagnosticKind, reference: &Reference, args: &[&str]) {
        let level = self.options.level_for(kind);
        if level.is_on() {
            self.output
                .diagnostics
                .add(self.program.diagnostic_at(kind, level, reference.node, args));
        }
    }
}
