//! Collection phase of the declaration validator.
//!
//! `BinderState` walks every unit in program order, builds the `ScopeTree`,
//! reports duplicate declarations, and records every variable reference with
//! the scope it occurs in. References are resolved later, once all units
//! have been collected.

use crate::program::{NodeRef, Program, UnitId};
use crate::scopes::{
    ConflictKind, DeclarationId, DeclarationKind, DeclarationSite, DuplicateDeclaration,
    NewDeclaration, ScopeId, ScopeTree,
};
use jsck_common::{AnalysisOptions, DiagnosticBag, DiagnosticKind};
use jsck_parser::{
    ClassData, FunctionData, NodeArena, NodeData, NodeFlags, NodeIndex, VariableKind, children_of,
};
use jsck_scanner::SyntaxKind;
use tracing::debug;

/// An identifier read or written as a variable.
#[derive(Debug, Clone)]
pub struct Reference {
    pub name: String,
    /// The `Identifier` node
    pub node: NodeRef,
    /// Scope the reference occurs in
    pub scope: ScopeId,
    /// Root of a member access (`x` in `x.foo`)
    pub is_member_root: bool,
    /// Target of an assignment, `++`/`--`, or a `for-in`/`for-of` head
    pub is_mutation: bool,
    /// Position in program order
    pub order: u32,
    /// Filled by the reference phase
    pub resolved: Option<DeclarationId>,
}

impl Reference {
    pub fn unit(&self) -> UnitId {
        self.node.unit
    }
}

/// Everything the collection phase produces for one run.
#[derive(Debug, Default)]
pub struct ProgramBinding {
    pub scopes: ScopeTree,
    pub references: Vec<Reference>,
    pub diagnostics: DiagnosticBag,
}

impl ProgramBinding {
    /// References the reference phase could not resolve.
    pub fn unresolved(&self) -> impl Iterator<Item = &Reference> {
        self.references.iter().filter(|r| r.resolved.is_none())
    }

    /// Resolved references to a declaration, in program order.
    pub fn references_to(&self, declaration: DeclarationId) -> impl Iterator<Item = &Reference> {
        self.references
            .iter()
            .filter(move |r| r.resolved == Some(declaration))
    }
}

pub struct BinderState<'a> {
    program: &'a Program,
    options: &'a AnalysisOptions,
    scopes: ScopeTree,
    references: Vec<Reference>,
    diagnostics: DiagnosticBag,
    unit: UnitId,
    current_scope: ScopeId,
    next_order: u32,
}

impl<'a> BinderState<'a> {
    pub fn new(program: &'a Program, options: &'a AnalysisOptions) -> Self {
        let scopes = ScopeTree::new();
        let current_scope = scopes.global_scope();
        BinderState {
            program,
            options,
            scopes,
            references: Vec::new(),
            diagnostics: DiagnosticBag::new(),
            unit: UnitId(0),
            current_scope,
            next_order: 0,
        }
    }

    /// Collect declarations and references of every unit.
    #[tracing::instrument(level = "debug", skip_all, fields(units = program.len()))]
    pub fn bind_program(program: &'a Program, options: &'a AnalysisOptions) -> ProgramBinding {
        let mut binder = BinderState::new(program, options);
        for unit in program.ordered_units() {
            binder.bind_unit(unit);
        }
        debug!(
            scopes = binder.scopes.scope_count(),
            references = binder.references.len(),
            "collection finished"
        );
        ProgramBinding {
            scopes: binder.scopes,
            references: binder.references,
            diagnostics: binder.diagnostics,
        }
    }

    fn bind_unit(&mut self, unit: UnitId) {
        let program = self.program;
        let compilation_unit = program.unit(unit);
        self.unit = unit;
        self.current_scope = if compilation_unit.is_extern {
            self.scopes.extern_scope()
        } else {
            self.scopes.global_scope()
        };
        let arena = &compilation_unit.arena;
        for &statement in compilation_unit.statements() {
            self.bind_node(arena, statement);
        }
    }

    fn node_ref(&self, node: NodeIndex) -> NodeRef {
        NodeRef::new(self.unit, node)
    }

    fn take_order(&mut self) -> u32 {
        let order = self.next_order;
        self.next_order += 1;
        order
    }

    fn with_scope(&mut self, scope: ScopeId, f: impl FnOnce(&mut Self)) {
        let saved = self.current_scope;
        self.current_scope = scope;
        f(self);
        self.current_scope = saved;
    }

    // =========================================================================
    // Walk
    // =========================================================================

    fn bind_node(&mut self, arena: &'a NodeArena, idx: NodeIndex) {
        let Some(node) = arena.get(idx) else {
            return;
        };
        match &node.data {
            NodeData::VariableStatement { kind, declarations } => {
                for &declaration in declarations {
                    self.bind_variable_declaration(arena, *kind, declaration, false);
                }
            }
            NodeData::FunctionDeclaration(function) => {
                self.declare_name(arena, function.name, idx, DeclarationKind::Function, false, false);
                self.bind_function(arena, idx, function, false);
            }
            NodeData::FunctionExpression(function) => {
                self.bind_function(arena, idx, function, true);
            }
            NodeData::ClassDeclaration(class) => {
                self.declare_name(arena, class.name, idx, DeclarationKind::Class, false, false);
                self.bind_class(arena, class);
            }
            NodeData::ClassExpression(class) => {
                if class.name.is_some() {
                    let scope = self.scopes.enter_block(self.current_scope, self.node_ref(idx));
                    self.with_scope(scope, |binder| {
                        binder.declare_name(arena, class.name, idx, DeclarationKind::Class, false, false);
                        binder.bind_class(arena, class);
                    });
                } else {
                    self.bind_class(arena, class);
                }
            }
            NodeData::Block { statements } => {
                let scope = self.scopes.enter_block(self.current_scope, self.node_ref(idx));
                self.with_scope(scope, |binder| {
                    for &statement in statements {
                        binder.bind_node(arena, statement);
                    }
                });
            }
            NodeData::ForStatement { .. } => {
                let scope = self.scopes.enter_block(self.current_scope, self.node_ref(idx));
                self.with_scope(scope, |binder| binder.bind_children(arena, idx));
            }
            NodeData::ForInOfStatement {
                initializer,
                expression,
                body,
                ..
            } => {
                let scope = self.scopes.enter_block(self.current_scope, self.node_ref(idx));
                self.with_scope(scope, |binder| {
                    match arena.data(*initializer) {
                        Some(NodeData::VariableStatement { kind, declarations }) => {
                            for &declaration in declarations {
                                binder.bind_variable_declaration(arena, *kind, declaration, true);
                            }
                        }
                        _ => binder.bind_assignment_target(arena, *initializer),
                    }
                    binder.bind_node(arena, *expression);
                    binder.bind_node(arena, *body);
                });
            }
            NodeData::CatchClause { variable, block } => {
                let scope = self.scopes.enter_catch(self.current_scope, self.node_ref(idx));
                self.with_scope(scope, |binder| {
                    binder.declare_name(
                        arena,
                        *variable,
                        *variable,
                        DeclarationKind::CatchParameter,
                        false,
                        false,
                    );
                    binder.bind_node(arena, *block);
                });
            }
            NodeData::SwitchStatement { expression, clauses } => {
                self.bind_node(arena, *expression);
                let scope = self.scopes.enter_block(self.current_scope, self.node_ref(idx));
                self.with_scope(scope, |binder| {
                    for &clause in clauses {
                        binder.bind_node(arena, clause);
                    }
                });
            }
            NodeData::Identifier { text } => {
                self.record_reference(idx, text, false, false);
            }
            NodeData::PropertyAccess { expression, .. } => {
                if let Some(NodeData::Identifier { text }) = arena.data(*expression) {
                    self.record_reference(*expression, text, true, false);
                } else {
                    self.bind_node(arena, *expression);
                }
            }
            NodeData::PropertyAssignment { initializer, .. } => {
                self.bind_node(arena, *initializer);
            }
            NodeData::MethodDefinition { function, .. } => {
                self.bind_node(arena, *function);
            }
            NodeData::Assignment { target, value, .. } => {
                self.bind_assignment_target(arena, *target);
                self.bind_node(arena, *value);
            }
            NodeData::PrefixUnary { operator, operand }
            | NodeData::PostfixUnary { operator, operand }
                if matches!(operator, SyntaxKind::PlusPlusToken | SyntaxKind::MinusMinusToken) =>
            {
                self.bind_assignment_target(arena, *operand);
            }
            NodeData::LabeledStatement { statement, .. } => {
                self.bind_node(arena, *statement);
            }
            NodeData::BreakStatement { .. }
            | NodeData::ContinueStatement { .. }
            | NodeData::LabelIdentifier { .. }
            | NodeData::PropertyName { .. } => {}
            _ => self.bind_children(arena, idx),
        }
    }

    fn bind_children(&mut self, arena: &'a NodeArena, idx: NodeIndex) {
        for child in children_of(arena, idx) {
            self.bind_node(arena, child);
        }
    }

    /// Bind the target of `=`, a compound assignment, `++`/`--` or a loop
    /// head. A bare name becomes a mutating reference.
    fn bind_assignment_target(&mut self, arena: &'a NodeArena, target: NodeIndex) {
        match arena.data(target) {
            Some(NodeData::Identifier { text }) => self.record_reference(target, text, false, true),
            Some(NodeData::Parenthesized { expression }) => {
                self.bind_assignment_target(arena, *expression);
            }
            _ => self.bind_node(arena, target),
        }
    }

    fn record_reference(&mut self, node: NodeIndex, name: &str, is_member_root: bool, is_mutation: bool) {
        let order = self.take_order();
        self.references.push(Reference {
            name: name.to_string(),
            node: self.node_ref(node),
            scope: self.current_scope,
            is_member_root,
            is_mutation,
            order,
            resolved: None,
        });
    }

    fn bind_variable_declaration(
        &mut self,
        arena: &'a NodeArena,
        kind: VariableKind,
        declaration: NodeIndex,
        in_loop_head: bool,
    ) {
        let Some(NodeData::VariableDeclaration { name, initializer }) = arena.data(declaration) else {
            return;
        };
        let declaration_kind = match kind {
            VariableKind::Var => DeclarationKind::Var,
            VariableKind::Let => DeclarationKind::Let,
            VariableKind::Const => DeclarationKind::Const,
        };
        self.declare_name(
            arena,
            *name,
            declaration,
            declaration_kind,
            initializer.is_some(),
            in_loop_head,
        );
        self.bind_node(arena, *initializer);
    }

    /// Bind a function's own scope: expression name, parameters and body.
    fn bind_function(
        &mut self,
        arena: &'a NodeArena,
        idx: NodeIndex,
        function: &'a FunctionData,
        is_expression: bool,
    ) {
        let scope = self.scopes.enter_function(self.current_scope, self.node_ref(idx));
        self.with_scope(scope, |binder| {
            if is_expression && function.name.is_some() {
                binder.declare_name(arena, function.name, idx, DeclarationKind::FunctionName, false, false);
            }
            for &parameter in &function.parameters {
                if let Some(NodeData::Parameter { name }) = arena.data(parameter) {
                    binder.declare_name(arena, *name, parameter, DeclarationKind::Parameter, false, false);
                }
            }
            // Body statements live directly in the function scope.
            if let Some(NodeData::Block { statements }) = arena.data(function.body) {
                for &statement in statements {
                    binder.bind_node(arena, statement);
                }
            }
        });
    }

    fn bind_class(&mut self, arena: &'a NodeArena, class: &'a ClassData) {
        self.bind_node(arena, class.heritage);
        for &member in &class.members {
            self.bind_node(arena, member);
        }
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    fn declare_name(
        &mut self,
        arena: &NodeArena,
        name_node: NodeIndex,
        declaring_node: NodeIndex,
        kind: DeclarationKind,
        has_initializer: bool,
        in_loop_head: bool,
    ) {
        let Some(name) = arena.identifier_text(name_node) else {
            return;
        };
        let flags = arena.flags(declaring_node);
        let site = DeclarationSite {
            node: self.node_ref(declaring_node),
            name_node: self.node_ref(name_node),
            order: self.take_order(),
            has_initializer,
            in_loop_head,
        };
        let new = NewDeclaration {
            name,
            kind,
            unit: self.unit,
            site,
            suppress_duplicate: flags.contains(NodeFlags::SUPPRESS_DUPLICATE),
            const_annotated: flags.contains(NodeFlags::JSDOC_CONST),
        };
        if let Err(duplicate) = self.scopes.declare(self.current_scope, new) {
            self.report_duplicate(&duplicate, site.name_node);
        }
    }

    fn report_duplicate(&mut self, duplicate: &DuplicateDeclaration, at: NodeRef) {
        let program = self.program;
        let unit = program.unit(at.unit);
        // Hoisted redeclarations among extern units are how externs merge.
        if unit.is_extern && duplicate.kind == ConflictKind::Hoisted {
            return;
        }
        let existing = self.scopes.declaration(duplicate.existing);
        let first_unit = program.unit(existing.unit).name.as_str();
        let (kind, args): (DiagnosticKind, [&str; 2]) = match duplicate.kind {
            ConflictKind::Hoisted => (DiagnosticKind::VarMultiplyDeclared, [duplicate.name.as_str(), first_unit]),
            ConflictKind::BlockScoped => {
                (DiagnosticKind::LetConstMultiplyDeclared, [duplicate.name.as_str(), first_unit])
            }
            ConflictKind::ArgumentsShadowed => {
                (DiagnosticKind::VarArgumentsShadowed, [duplicate.name.as_str(), first_unit])
            }
        };
        let level = self.options.level_for(kind);
        if level.is_on() {
            self.diagnostics
                .add(program.diagnostic_at(kind, level, at, &args));
        }
    }
}
