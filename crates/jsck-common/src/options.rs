//! Options recognised by the analysis passes.

use crate::diagnostics::{CheckLevel, DiagnosticKind};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Accepted input language level.
///
/// Gates the block-scoped declaration kinds (`let`, `const`, `class`) and
/// `for-of`, which need `Es2015`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageLevel {
    Es3,
    Es5,
    #[default]
    #[serde(alias = "es6")]
    Es2015,
}

impl LanguageLevel {
    pub fn allows_block_scoped(self) -> bool {
        self >= LanguageLevel::Es2015
    }

    pub fn parse(value: &str) -> Option<LanguageLevel> {
        match value.trim().to_ascii_lowercase().as_str() {
            "es3" => Some(LanguageLevel::Es3),
            "es5" => Some(LanguageLevel::Es5),
            "es6" | "es2015" => Some(LanguageLevel::Es2015),
            _ => None,
        }
    }
}

/// Per-kind severity overrides on top of each kind's default level.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiagnosticLevels {
    overrides: FxHashMap<DiagnosticKind, CheckLevel>,
}

impl DiagnosticLevels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, kind: DiagnosticKind, level: CheckLevel) {
        self.overrides.insert(kind, level);
    }

    #[must_use]
    pub fn with(mut self, kind: DiagnosticKind, level: CheckLevel) -> Self {
        self.set(kind, level);
        self
    }

    /// Effective level: the override if present, else the kind's default.
    pub fn resolve(&self, kind: DiagnosticKind) -> CheckLevel {
        self.overrides
            .get(&kind)
            .copied()
            .unwrap_or_else(|| kind.default_level())
    }
}

/// Configuration of one analysis run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnalysisOptions {
    pub accepted_language_level: LanguageLevel,
    /// Level of `StrictModuleDepError`.
    pub stricter_module_dep_severity: CheckLevel,
    /// Level of `UndefinedExternVarError`.
    pub extern_validation_severity: CheckLevel,
    /// Synthesize extern declarations for undeclared names instead of
    /// reporting them.
    pub tolerates_undeclared_vars: bool,
    /// Non-strict consistency mode: no synthesis, no module or extern checks,
    /// and an unresolved name is a fatal error.
    pub sanity_check_mode: bool,
    /// Rerun the validator in sanity-check mode after an error-free pass.
    pub self_check: bool,
    pub diagnostic_levels: DiagnosticLevels,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        AnalysisOptions {
            accepted_language_level: LanguageLevel::default(),
            stricter_module_dep_severity: DiagnosticKind::StrictModuleDep.default_level(),
            extern_validation_severity: DiagnosticKind::UndefinedExternVar.default_level(),
            tolerates_undeclared_vars: false,
            sanity_check_mode: false,
            self_check: true,
            diagnostic_levels: DiagnosticLevels::default(),
        }
    }
}

impl AnalysisOptions {
    /// Effective level for a diagnostic kind. The two named severities take
    /// precedence over `diagnostic_levels` for their kinds.
    pub fn level_for(&self, kind: DiagnosticKind) -> CheckLevel {
        match kind {
            DiagnosticKind::StrictModuleDep => self.stricter_module_dep_severity,
            DiagnosticKind::UndefinedExternVar => self.extern_validation_severity,
            _ => self.diagnostic_levels.resolve(kind),
        }
    }

    /// The same options in sanity-check mode, as used by the self-check pass.
    #[must_use]
    pub fn for_sanity_check(&self) -> Self {
        AnalysisOptions {
            sanity_check_mode: true,
            tolerates_undeclared_vars: false,
            self_check: false,
            ..self.clone()
        }
    }
}
