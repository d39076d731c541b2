//! Module Dependency Checker
//!
//! Classifies a reference from one module to a declaration in another.
//!
//! The checker does no call-graph analysis. A reference from inside a
//! function body that is not dependency-sound might still be fine if the
//! function only runs after the declaring module loads, so it is reported
//! with the separate `StrictModuleDep` kind (off by default) instead of the
//! missing/violated kinds.

use jsck_binder::{DependencyClosure, ModuleGraph, ModuleId};
use jsck_common::DiagnosticKind;
use tracing::{debug, warn};

/// Outcome of checking one cross-module reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleDepVerdict {
    /// Same module, or the declaring module is a transitive dependency
    Sound,
    /// Unrelated modules
    Missing,
    /// The referencing module is processed before the declaring one
    Violated,
    /// Not sound, but reached from a function body
    Strict,
}

impl ModuleDepVerdict {
    pub fn diagnostic_kind(self) -> Option<DiagnosticKind> {
        match self {
            ModuleDepVerdict::Sound => None,
            ModuleDepVerdict::Missing => Some(DiagnosticKind::MissingModuleDep),
            ModuleDepVerdict::Violated => Some(DiagnosticKind::ViolatedModuleDep),
            ModuleDepVerdict::Strict => Some(DiagnosticKind::StrictModuleDep),
        }
    }
}

pub struct ModuleDependencyChecker<'a> {
    graph: &'a ModuleGraph,
    closure: DependencyClosure,
    order: Vec<usize>,
}

impl<'a> ModuleDependencyChecker<'a> {
    pub fn new(graph: &'a ModuleGraph) -> Self {
        if let Err(err) = graph.topological_sort() {
            warn!(%err, "module graph is not a DAG");
        } else if !graph.is_order_consistent() {
            warn!("declared module order does not follow the dependency edges");
        }
        let mut order = vec![usize::MAX; graph.len()];
        for (index, id) in graph.declared_order().iter().enumerate() {
            order[id.0 as usize] = index;
        }
        ModuleDependencyChecker {
            graph,
            closure: graph.dependency_closure(),
            order,
        }
    }

    fn order_of(&self, module: ModuleId) -> usize {
        self.order.get(module.0 as usize).copied().unwrap_or(usize::MAX)
    }

    /// Classify a reference from `referencing` to a declaration in
    /// `declaring`.
    pub fn classify(
        &self,
        referencing: ModuleId,
        declaring: ModuleId,
        in_function: bool,
    ) -> ModuleDepVerdict {
        let verdict = if referencing == declaring
            || self.closure.depends_on(referencing, declaring)
        {
            ModuleDepVerdict::Sound
        } else if in_function {
            ModuleDepVerdict::Strict
        } else if self.closure.depends_on(declaring, referencing)
            || self.order_of(referencing) < self.order_of(declaring)
        {
            ModuleDepVerdict::Violated
        } else {
            ModuleDepVerdict::Missing
        };
        debug!(
            from = self.graph.module_name(referencing),
            to = self.graph.module_name(declaring),
            ?verdict,
            "cross-module reference"
        );
        verdict
    }
}
