//! Ambient-declaration synthesis.
//!
//! Turns the names queued by the reference phase into `var name;`
//! statements of the synthetic externs unit and binds them in the extern
//! scope. A source global `var`/function of the same name keeps its own
//! binding and gains the suppress-duplicate marker; a block-scoped one
//! cannot be merged with an ambient `var` and is reported.

use crate::var_check::SynthesisQueue;
use jsck_binder::{DeclarationSite, Program, ProgramBinding, SYNTHETIC_EXTERNS_NAME};
use jsck_common::{AnalysisOptions, DiagnosticBag, DiagnosticKind};
use jsck_parser::NodeFlags;
use tracing::debug;

/// Result of one synthesis run.
#[derive(Debug, Default)]
pub struct SynthesisOutput {
    /// Names that received an ambient declaration, in queue order
    pub synthesized: Vec<String>,
    pub diagnostics: DiagnosticBag,
}

pub struct ExternSynthesizer<'a> {
    options: &'a AnalysisOptions,
}

impl<'a> ExternSynthesizer<'a> {
    pub fn new(options: &'a AnalysisOptions) -> Self {
        ExternSynthesizer { options }
    }

    /// Synthesize every queued name, then re-resolve the references that
    /// were left unresolved.
    #[tracing::instrument(level = "debug", skip_all, fields(queued = queue.len()))]
    pub fn run(
        &self,
        program: &mut Program,
        binding: &mut ProgramBinding,
        queue: &SynthesisQueue,
    ) -> SynthesisOutput {
        let mut output = SynthesisOutput::default();
        if self.options.sanity_check_mode {
            return output;
        }

        for name in queue {
            let extern_scope = binding.scopes.extern_scope();
            if binding.scopes.lookup_local(extern_scope, name).is_some() {
                continue;
            }

            if let Some(existing) = binding.scopes.lookup_local(binding.scopes.global_scope(), name) {
                let declaration = binding.scopes.declaration(existing);
                if declaration.kind.is_block_scoped() {
                    let level = self.options.level_for(DiagnosticKind::LetConstMultiplyDeclared);
                    if let (true, Some(site)) = (level.is_on(), declaration.first_site()) {
                        output.diagnostics.add(program.diagnostic_at(
                            DiagnosticKind::LetConstMultiplyDeclared,
                            level,
                            site.name_node,
                            &[name.as_str(), SYNTHETIC_EXTERNS_NAME],
                        ));
                    }
                } else {
                    let sites: Vec<_> = declaration.sites.iter().map(|s| s.node).collect();
                    for node in sites {
                        program.set_flag(node, NodeFlags::SUPPRESS_DUPLICATE);
                    }
                    binding.scopes.declaration_mut(existing).suppress_duplicate = true;
                }
            }

            let (declaration, ident) = program.append_synthetic_var(name);
            let site = DeclarationSite {
                node: declaration,
                name_node: ident,
                order: u32::MAX,
                has_initializer: false,
                in_loop_head: false,
            };
            binding.scopes.declare_ambient(name, declaration.unit, site);
            debug!(name = %name, "synthesized ambient declaration");
            output.synthesized.push(name.clone());
        }

        let scopes = &binding.scopes;
        for reference in binding.references.iter_mut().filter(|r| r.resolved.is_none()) {
            reference.resolved = scopes.resolve(reference.scope, &reference.name);
        }

        output
    }
}
