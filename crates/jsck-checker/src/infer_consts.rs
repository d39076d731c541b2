//! Mutability inference.
//!
//! Flags `var`/`let`/`const` bindings of source units that are assigned
//! exactly once and never mutated afterwards. Mutation sites are counted
//! over every reference resolved to the binding, which covers its whole
//! visibility region including nested closures. Reachability is not
//! considered: a mutation inside a function that is never called still
//! disqualifies the binding.
//!
//! A binding is immutable when it carries `@const` / `@define`, or when
//! all of these hold (the `const` keyword gets no exemption):
//! - it has a single declaration site with an initializer,
//! - that site is not a `for-in`/`for-of` head,
//! - no reference to it is a mutation,
//! - no reference precedes the declaration in program order.

use fixedbitset::FixedBitSet;
use jsck_binder::{ARGUMENTS, Declaration, NodeRef, Program, ProgramBinding};
use jsck_common::{Position, Span};
use jsck_parser::NodeFlags;
use serde::Serialize;
use tracing::debug;

/// A binding found immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImmutableBinding {
    pub name: String,
    pub file: String,
    pub span: Span,
    pub position: Position,
    #[serde(skip)]
    pub declaration: Option<NodeRef>,
}

/// Immutable bindings of one run, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImmutabilityReport {
    pub bindings: Vec<ImmutableBinding>,
}

impl ImmutabilityReport {
    pub fn contains(&self, name: &str) -> bool {
        self.bindings.iter().any(|b| b.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.bindings.iter().map(|b| b.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct InferConsts;

impl InferConsts {
    pub fn new() -> Self {
        InferConsts
    }

    /// Decide immutability for every variable binding and annotate the
    /// declarations and references of immutable ones.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn run(&self, program: &mut Program, binding: &ProgramBinding) -> ImmutabilityReport {
        let count = binding.scopes.declarations().count();
        let mut mutated = FixedBitSet::with_capacity(count);
        let mut first_reference = vec![u32::MAX; count];

        for reference in &binding.references {
            let Some(id) = reference.resolved else {
                continue;
            };
            if reference.is_mutation {
                mutated.insert(id.index());
            }
            let first = &mut first_reference[id.index()];
            *first = (*first).min(reference.order);
        }

        let mut report = ImmutabilityReport::default();
        let mut immutable = FixedBitSet::with_capacity(count);
        for declaration in binding.scopes.declarations() {
            if !Self::is_candidate(program, declaration) {
                continue;
            }
            let index = declaration.id.index();
            if Self::is_immutable(declaration, mutated.contains(index), first_reference[index]) {
                immutable.insert(index);
            }
        }

        for declaration in binding
            .scopes
            .declarations()
            .filter(|d| immutable.contains(d.id.index()))
        {
            debug!(name = %declaration.name, "immutable binding");
            for site in &declaration.sites {
                program.set_flag(site.node, NodeFlags::IMMUTABLE_BINDING);
            }
            if let Some(site) = declaration.first_site() {
                let unit = program.unit(site.name_node.unit);
                let span = unit.arena.span_of(site.name_node.node);
                report.bindings.push(ImmutableBinding {
                    name: declaration.name.clone(),
                    file: unit.name.clone(),
                    span,
                    position: unit.line_map().position_of(span.start),
                    declaration: Some(site.node),
                });
            }
        }

        for reference in &binding.references {
            if reference
                .resolved
                .is_some_and(|id| immutable.contains(id.index()))
            {
                program.set_flag(reference.node, NodeFlags::IMMUTABLE_BINDING);
            }
        }

        report
    }

    fn is_candidate(program: &Program, declaration: &Declaration) -> bool {
        declaration.kind.is_variable()
            && !declaration.is_extern
            && declaration.name != ARGUMENTS
            && !program.unit(declaration.unit).is_extern
    }

    fn is_immutable(declaration: &Declaration, mutated: bool, first_reference: u32) -> bool {
        if declaration.const_annotated {
            return true;
        }
        match declaration.sites.as_slice() {
            [site] => {
                site.has_initializer
                    && !site.in_loop_head
                    && !mutated
                    && site.order < first_reference
            }
            _ => false,
        }
    }
}
