//! Scope Model
//!
//! A tree of lexical scopes with binding tables, built fresh for every run.
//! The root is the `Extern` scope holding ambient declarations; the shared
//! source `Global` scope is its only direct child with source content.
//! Extern function bodies hang directly off the `Extern` scope, so extern
//! references never see source declarations.
//!
//! Hoisted kinds (`var`, function declarations) are recorded in the nearest
//! function-or-global scope; every other kind in the scope it is declared in.
//! `declare` never reports: it returns a `DuplicateDeclaration` and the
//! caller picks the diagnostic.

use crate::program::{NodeRef, UnitId};
use indexmap::IndexMap;
use jsck_common::limits::MAX_SCOPE_WALK_ITERATIONS;
use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet};
use smallvec::SmallVec;
use tracing::debug;

/// Name of the implicit binding of every function scope.
pub const ARGUMENTS: &str = "arguments";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub u32);

impl ScopeId {
    pub const NONE: ScopeId = ScopeId(u32::MAX);

    pub fn is_none(self) -> bool {
        self == ScopeId::NONE
    }

    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclarationId(pub u32);

impl DeclarationId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    /// Ambient declarations from extern units
    Extern,
    /// Top level of all source units
    Global,
    Function,
    Block,
    Catch,
}

impl ScopeKind {
    /// Scopes that receive hoisted declarations.
    pub fn is_hoist_target(self) -> bool {
        matches!(self, ScopeKind::Extern | ScopeKind::Global | ScopeKind::Function)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclarationKind {
    Var,
    Function,
    Let,
    Const,
    Class,
    Parameter,
    CatchParameter,
    /// Name of a function expression, visible only inside it
    FunctionName,
    /// The implicit `arguments` binding
    Arguments,
}

impl DeclarationKind {
    pub fn is_hoisted(self) -> bool {
        matches!(self, DeclarationKind::Var | DeclarationKind::Function)
    }

    pub fn is_block_scoped(self) -> bool {
        matches!(
            self,
            DeclarationKind::Let | DeclarationKind::Const | DeclarationKind::Class
        )
    }

    /// Bindings a later declaration of the same name replaces silently.
    fn is_overridable(self) -> bool {
        matches!(self, DeclarationKind::FunctionName | DeclarationKind::Arguments)
    }

    /// Variable kinds tracked by mutability inference.
    pub fn is_variable(self) -> bool {
        matches!(
            self,
            DeclarationKind::Var | DeclarationKind::Let | DeclarationKind::Const
        )
    }
}

/// One syntactic occurrence of a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeclarationSite {
    /// The declaring node (`VariableDeclaration`, `FunctionDeclaration`, ...)
    pub node: NodeRef,
    /// The binding `Identifier`
    pub name_node: NodeRef,
    /// Position of the binding identifier in program order
    pub order: u32,
    pub has_initializer: bool,
    /// Declared in a `for-in` / `for-of` head
    pub in_loop_head: bool,
}

#[derive(Debug, Clone)]
pub struct Declaration {
    pub id: DeclarationId,
    pub name: String,
    pub kind: DeclarationKind,
    pub scope: ScopeId,
    pub unit: UnitId,
    pub is_extern: bool,
    /// Do not report this declaration as a hoisted redeclaration
    pub suppress_duplicate: bool,
    /// `@const` / `@define` annotation
    pub const_annotated: bool,
    /// Every site merged into this binding; the first one defines it.
    pub sites: SmallVec<[DeclarationSite; 1]>,
}

impl Declaration {
    /// The defining site. Implicit `arguments` bindings point at their function.
    pub fn first_site(&self) -> Option<&DeclarationSite> {
        self.sites.first()
    }
}

#[derive(Debug, Clone)]
pub struct Scope {
    pub id: ScopeId,
    pub kind: ScopeKind,
    pub parent: ScopeId,
    /// The node that opened the scope; `None` for the shared root scopes
    pub node: Option<NodeRef>,
    pub children: Vec<ScopeId>,
    table: IndexMap<String, DeclarationId, FxBuildHasher>,
    /// Names of hoisted declarations that passed through this block
    hoisted_through: FxHashSet<String>,
    /// Catch parameters nested in this function-or-global scope
    catch_names: FxHashMap<String, DeclarationId>,
}

impl Scope {
    fn new(id: ScopeId, kind: ScopeKind, parent: ScopeId, node: Option<NodeRef>) -> Self {
        Scope {
            id,
            kind,
            parent,
            node,
            children: Vec::new(),
            table: IndexMap::default(),
            hoisted_through: FxHashSet::default(),
            catch_names: FxHashMap::default(),
        }
    }

    pub fn get(&self, name: &str) -> Option<DeclarationId> {
        self.table.get(name).copied()
    }

    /// Declarations bound in this scope, in declaration order.
    pub fn bindings(&self) -> impl Iterator<Item = (&str, DeclarationId)> {
        self.table.iter().map(|(name, &id)| (name.as_str(), id))
    }
}

/// Why a declaration collided with an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    /// Two hoisted-kind declarations, neither suppressed
    Hoisted,
    /// Any collision involving `let`, `const` or `class`
    BlockScoped,
    /// A declaration that hides the implicit `arguments` binding
    ArgumentsShadowed,
}

/// Conflict descriptor returned by `ScopeTree::declare`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateDeclaration {
    pub name: String,
    pub kind: ConflictKind,
    /// The earlier declaration
    pub existing: DeclarationId,
    /// The binding the new site ended up in
    pub declaration: DeclarationId,
}

/// Input of one `declare` call.
#[derive(Debug, Clone, Copy)]
pub struct NewDeclaration<'a> {
    pub name: &'a str,
    pub kind: DeclarationKind,
    pub unit: UnitId,
    pub site: DeclarationSite,
    pub suppress_duplicate: bool,
    pub const_annotated: bool,
}

/// The scope tree of one run.
#[derive(Debug, Clone)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
    declarations: Vec<Declaration>,
    extern_scope: ScopeId,
    global_scope: ScopeId,
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeTree {
    pub fn new() -> Self {
        let mut tree = ScopeTree {
            scopes: Vec::new(),
            declarations: Vec::new(),
            extern_scope: ScopeId::NONE,
            global_scope: ScopeId::NONE,
        };
        tree.extern_scope = tree.push_scope(ScopeKind::Extern, ScopeId::NONE, None);
        tree.global_scope = tree.push_scope(ScopeKind::Global, tree.extern_scope, None);
        tree
    }

    fn push_scope(&mut self, kind: ScopeKind, parent: ScopeId, node: Option<NodeRef>) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope::new(id, kind, parent, node));
        if let Some(parent) = self.scopes.get_mut(parent.index()) {
            parent.children.push(id);
        }
        id
    }

    pub fn extern_scope(&self) -> ScopeId {
        self.extern_scope
    }

    pub fn global_scope(&self) -> ScopeId {
        self.global_scope
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    pub fn declaration(&self, id: DeclarationId) -> &Declaration {
        &self.declarations[id.index()]
    }

    pub fn declaration_mut(&mut self, id: DeclarationId) -> &mut Declaration {
        &mut self.declarations[id.index()]
    }

    pub fn declarations(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations.iter()
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    /// Open a function scope. `arguments` is bound implicitly in it.
    pub fn enter_function(&mut self, parent: ScopeId, function: NodeRef) -> ScopeId {
        let scope = self.push_scope(ScopeKind::Function, parent, Some(function));
        let site = DeclarationSite {
            node: function,
            name_node: function,
            order: u32::MAX,
            has_initializer: false,
            in_loop_head: false,
        };
        let id = self.push_declaration(ARGUMENTS, DeclarationKind::Arguments, scope, function.unit, site);
        self.scopes[scope.index()].table.insert(ARGUMENTS.to_string(), id);
        scope
    }

    pub fn enter_block(&mut self, parent: ScopeId, node: NodeRef) -> ScopeId {
        self.push_scope(ScopeKind::Block, parent, Some(node))
    }

    pub fn enter_catch(&mut self, parent: ScopeId, node: NodeRef) -> ScopeId {
        self.push_scope(ScopeKind::Catch, parent, Some(node))
    }

    /// Nearest enclosing function, global or extern scope.
    pub fn hoist_scope(&self, scope: ScopeId) -> ScopeId {
        let mut current = scope;
        for _ in 0..MAX_SCOPE_WALK_ITERATIONS {
            let Some(s) = self.scopes.get(current.index()) else {
                break;
            };
            if s.kind.is_hoist_target() {
                return current;
            }
            current = s.parent;
        }
        self.global_scope
    }

    /// Whether `scope` belongs to extern code: its chain reaches the extern
    /// scope without passing the source global scope.
    pub fn is_extern_scope(&self, scope: ScopeId) -> bool {
        let mut current = scope;
        for _ in 0..MAX_SCOPE_WALK_ITERATIONS {
            let Some(s) = self.scopes.get(current.index()) else {
                return false;
            };
            match s.kind {
                ScopeKind::Global => return false,
                ScopeKind::Extern => return true,
                _ => current = s.parent,
            }
        }
        false
    }

    /// Whether `scope` lies inside a function body.
    pub fn is_in_function(&self, scope: ScopeId) -> bool {
        self.scopes
            .get(self.hoist_scope(scope).index())
            .is_some_and(|s| s.kind == ScopeKind::Function)
    }

    fn push_declaration(
        &mut self,
        name: &str,
        kind: DeclarationKind,
        scope: ScopeId,
        unit: UnitId,
        site: DeclarationSite,
    ) -> DeclarationId {
        let id = DeclarationId(self.declarations.len() as u32);
        let is_extern = self.is_extern_scope(scope);
        let mut sites = SmallVec::new();
        sites.push(site);
        self.declarations.push(Declaration {
            id,
            name: name.to_string(),
            kind,
            scope,
            unit,
            is_extern,
            suppress_duplicate: false,
            const_annotated: false,
            sites,
        });
        id
    }

    fn create(&mut self, target: ScopeId, new: &NewDeclaration<'_>) -> DeclarationId {
        let id = self.push_declaration(new.name, new.kind, target, new.unit, new.site);
        let declaration = &mut self.declarations[id.index()];
        declaration.suppress_duplicate = new.suppress_duplicate;
        declaration.const_annotated = new.const_annotated;
        id
    }

    fn bind(&mut self, target: ScopeId, name: &str, id: DeclarationId) {
        self.scopes[target.index()].table.insert(name.to_string(), id);
    }

    /// Add a site to an existing binding.
    fn merge(&mut self, existing: DeclarationId, new: &NewDeclaration<'_>) {
        let declaration = &mut self.declarations[existing.index()];
        declaration.sites.push(new.site);
        declaration.suppress_duplicate |= new.suppress_duplicate;
        declaration.const_annotated |= new.const_annotated;
    }

    fn conflict(
        &self,
        name: &str,
        kind: ConflictKind,
        existing: DeclarationId,
        declaration: DeclarationId,
    ) -> DuplicateDeclaration {
        debug!(name, ?kind, "declaration conflict");
        DuplicateDeclaration {
            name: name.to_string(),
            kind,
            existing,
            declaration,
        }
    }

    /// Register a declaration made in `scope`.
    ///
    /// On a conflict the new site is merged into the existing binding (so
    /// later references keep resolving to the first declaration) and the
    /// conflict is returned. `arguments` shadowing binds the new declaration.
    pub fn declare(
        &mut self,
        scope: ScopeId,
        new: NewDeclaration<'_>,
    ) -> Result<DeclarationId, DuplicateDeclaration> {
        let name = new.name;
        let kind = new.kind;
        let target = if kind.is_hoisted() {
            self.hoist_scope(scope)
        } else {
            scope
        };
        debug!(name, ?kind, scope = target.0, "declare");

        if name == ARGUMENTS && kind != DeclarationKind::Var && self.is_in_function(scope) {
            let existing = self.scopes[target.index()].get(name);
            let id = self.create(target, &new);
            self.bind(target, name, id);
            let existing = existing.unwrap_or(id);
            return Err(self.conflict(name, ConflictKind::ArgumentsShadowed, existing, id));
        }

        if kind.is_hoisted() {
            if let Err(conflict) = self.check_hoisting_path(scope, target, name) {
                // The `var` still lives in its hoisting target.
                let declaration = match self.scopes[target.index()].get(name) {
                    Some(existing) if !self.declarations[existing.index()].kind.is_overridable() => {
                        self.merge(existing, &new);
                        existing
                    }
                    _ => {
                        let id = self.create(target, &new);
                        self.bind(target, name, id);
                        id
                    }
                };
                return Err(DuplicateDeclaration {
                    declaration,
                    ..conflict
                });
            }
        }

        if let Some(existing) = self.scopes[target.index()].get(name) {
            return self.declare_over(target, existing, new);
        }

        // A hoisted declaration meeting a catch parameter of the same
        // function-or-global scope.
        if kind.is_hoisted() {
            if let Some(&catch) = self.scopes[target.index()].catch_names.get(name) {
                let id = self.create(target, &new);
                self.bind(target, name, id);
                if new.suppress_duplicate || self.declarations[catch.index()].suppress_duplicate {
                    return Ok(id);
                }
                return Err(self.conflict(name, ConflictKind::Hoisted, catch, id));
            }
        }

        // A block-scoped declaration in a block a `var` of that name was
        // hoisted out of.
        if kind.is_block_scoped() && self.scopes[target.index()].hoisted_through.contains(name) {
            let hoisted = self.hoist_scope(target);
            let id = self.create(target, &new);
            self.bind(target, name, id);
            let existing = self.scopes[hoisted.index()].get(name).unwrap_or(id);
            return Err(self.conflict(name, ConflictKind::BlockScoped, existing, id));
        }

        if kind == DeclarationKind::CatchParameter {
            let hoisted = self.hoist_scope(target);
            let id = self.create(target, &new);
            self.bind(target, name, id);
            self.scopes[hoisted.index()]
                .catch_names
                .entry(name.to_string())
                .or_insert(id);
            if let Some(existing) = self.scopes[hoisted.index()].get(name) {
                let other = &self.declarations[existing.index()];
                if other.kind.is_hoisted() && !other.suppress_duplicate && !new.suppress_duplicate {
                    return Err(self.conflict(name, ConflictKind::Hoisted, existing, id));
                }
            }
            return Ok(id);
        }

        // Source globals share one effective scope with the externs, but keep
        // a binding of their own.
        if target == self.global_scope {
            if let Some(existing) = self.scopes[self.extern_scope.index()].get(name) {
                let id = self.create(target, &new);
                self.bind(target, name, id);
                let other = &self.declarations[existing.index()];
                if kind.is_block_scoped() || other.kind.is_block_scoped() {
                    return Err(self.conflict(name, ConflictKind::BlockScoped, existing, id));
                }
                if !new.suppress_duplicate && !other.suppress_duplicate {
                    return Err(self.conflict(name, ConflictKind::Hoisted, existing, id));
                }
                return Ok(id);
            }
        }

        let id = self.create(target, &new);
        self.bind(target, name, id);
        Ok(id)
    }

    /// Walk from `scope` up to the hoisting target, recording the name in
    /// every block it passes and failing on a block-scoped binding there.
    fn check_hoisting_path(
        &mut self,
        scope: ScopeId,
        target: ScopeId,
        name: &str,
    ) -> Result<(), DuplicateDeclaration> {
        let mut current = scope;
        let mut blocked = None;
        for _ in 0..MAX_SCOPE_WALK_ITERATIONS {
            if current == target || current.is_none() {
                break;
            }
            let s = &mut self.scopes[current.index()];
            s.hoisted_through.insert(name.to_string());
            if blocked.is_none() {
                if let Some(existing) = s.get(name) {
                    if self.declarations[existing.index()].kind.is_block_scoped() {
                        blocked = Some(existing);
                    }
                }
            }
            current = self.scopes[current.index()].parent;
        }
        match blocked {
            Some(existing) => Err(self.conflict(name, ConflictKind::BlockScoped, existing, existing)),
            None => Ok(()),
        }
    }

    /// Redeclaration of a name already bound in `target`.
    fn declare_over(
        &mut self,
        target: ScopeId,
        existing: DeclarationId,
        new: NewDeclaration<'_>,
    ) -> Result<DeclarationId, DuplicateDeclaration> {
        let name = new.name;
        let other = self.declarations[existing.index()].clone();

        if other.kind.is_overridable() {
            // The replaced binding stays in `declarations`, unreferenced.
            let id = self.create(target, &new);
            self.bind(target, name, id);
            return Ok(id);
        }

        if new.kind.is_block_scoped() || other.kind.is_block_scoped() {
            self.merge(existing, &new);
            return Err(self.conflict(name, ConflictKind::BlockScoped, existing, existing));
        }

        match (other.kind, new.kind) {
            // `var` or function re-using a parameter name is legal
            (DeclarationKind::Parameter, DeclarationKind::Var | DeclarationKind::Function) => {
                self.merge(existing, &new);
                Ok(existing)
            }
            _ => {
                let suppressed = other.suppress_duplicate || new.suppress_duplicate;
                self.merge(existing, &new);
                if suppressed {
                    Ok(existing)
                } else {
                    Err(self.conflict(name, ConflictKind::Hoisted, existing, existing))
                }
            }
        }
    }

    /// Bind an ambient declaration in the extern scope without conflict
    /// checks. Used for synthesized externs.
    pub fn declare_ambient(&mut self, name: &str, unit: UnitId, site: DeclarationSite) -> DeclarationId {
        let scope = self.extern_scope;
        let id = self.push_declaration(name, DeclarationKind::Var, scope, unit, site);
        self.bind(scope, name, id);
        id
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Binding of `name` in `scope` itself.
    pub fn lookup_local(&self, scope: ScopeId, name: &str) -> Option<DeclarationId> {
        self.scopes.get(scope.index())?.get(name)
    }

    /// First declaration of `name` on the parent chain of `scope`, ending
    /// with the extern scope.
    pub fn resolve(&self, scope: ScopeId, name: &str) -> Option<DeclarationId> {
        self.walk(scope, name, true)
    }

    /// Whether `name` resolves from `scope`. Without `include_ambient` the
    /// extern scope is not consulted.
    pub fn is_declared(&self, scope: ScopeId, name: &str, include_ambient: bool) -> bool {
        self.walk(scope, name, include_ambient).is_some()
    }

    fn walk(&self, scope: ScopeId, name: &str, include_ambient: bool) -> Option<DeclarationId> {
        let mut current = scope;
        for _ in 0..MAX_SCOPE_WALK_ITERATIONS {
            let s = self.scopes.get(current.index())?;
            if s.kind == ScopeKind::Extern && !include_ambient {
                return None;
            }
            if let Some(id) = s.get(name) {
                return Some(id);
            }
            current = s.parent;
        }
        None
    }

    /// Scopes nested in `scope`, including itself, in creation order.
    pub fn visibility_region(&self, scope: ScopeId) -> Vec<ScopeId> {
        let mut region = vec![scope];
        let mut index = 0;
        while let Some(&current) = region.get(index) {
            region.extend(self.scope(current).children.iter().copied());
            index += 1;
        }
        region
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsck_parser::NodeIndex;

    fn site(order: u32) -> DeclarationSite {
        let node = NodeRef::new(UnitId(0), NodeIndex(order));
        DeclarationSite {
            node,
            name_node: node,
            order,
            has_initializer: false,
            in_loop_head: false,
        }
    }

    fn new(name: &str, kind: DeclarationKind, order: u32) -> NewDeclaration<'_> {
        NewDeclaration {
            name,
            kind,
            unit: UnitId(0),
            site: site(order),
            suppress_duplicate: false,
            const_annotated: false,
        }
    }

    #[test]
    fn test_var_hoists_to_function_scope() {
        let mut tree = ScopeTree::new();
        let global = tree.global_scope();
        let f = tree.enter_function(global, NodeRef::new(UnitId(0), NodeIndex(100)));
        let block = tree.enter_block(f, NodeRef::new(UnitId(0), NodeIndex(101)));

        let x = tree.declare(block, new("x", DeclarationKind::Var, 1)).unwrap();
        assert_eq!(tree.lookup_local(f, "x"), Some(x));
        assert_eq!(tree.lookup_local(block, "x"), None);
        assert_eq!(tree.resolve(block, "x"), Some(x));
        assert_eq!(tree.resolve(global, "x"), None);
    }

    #[test]
    fn test_duplicate_var_is_hoisted_conflict() {
        let mut tree = ScopeTree::new();
        let global = tree.global_scope();
        let first = tree.declare(global, new("x", DeclarationKind::Var, 1)).unwrap();
        let err = tree.declare(global, new("x", DeclarationKind::Var, 2)).unwrap_err();
        assert_eq!(err.kind, ConflictKind::Hoisted);
        assert_eq!(err.existing, first);
        assert_eq!(tree.declaration(first).sites.len(), 2);
    }

    #[test]
    fn test_suppress_waives_hoisted_but_not_block_scoped() {
        let mut tree = ScopeTree::new();
        let global = tree.global_scope();
        tree.declare(global, new("x", DeclarationKind::Var, 1)).unwrap();
        let mut suppressed = new("x", DeclarationKind::Var, 2);
        suppressed.suppress_duplicate = true;
        assert!(tree.declare(global, suppressed).is_ok());

        let mut suppressed_let = new("x", DeclarationKind::Let, 3);
        suppressed_let.suppress_duplicate = true;
        let err = tree.declare(global, suppressed_let).unwrap_err();
        assert_eq!(err.kind, ConflictKind::BlockScoped);
    }

    #[test]
    fn test_let_in_inner_block_does_not_conflict() {
        let mut tree = ScopeTree::new();
        let global = tree.global_scope();
        let outer = tree.declare(global, new("x", DeclarationKind::Var, 1)).unwrap();
        let block = tree.enter_block(global, NodeRef::new(UnitId(0), NodeIndex(50)));
        let inner = tree.declare(block, new("x", DeclarationKind::Let, 2)).unwrap();
        assert_ne!(outer, inner);
        assert_eq!(tree.resolve(block, "x"), Some(inner));
    }

    #[test]
    fn test_var_hoisted_through_block_with_let() {
        let mut tree = ScopeTree::new();
        let global = tree.global_scope();
        let block = tree.enter_block(global, NodeRef::new(UnitId(0), NodeIndex(50)));
        tree.declare(block, new("x", DeclarationKind::Let, 1)).unwrap();
        let err = tree.declare(block, new("x", DeclarationKind::Var, 2)).unwrap_err();
        assert_eq!(err.kind, ConflictKind::BlockScoped);
        assert_ne!(err.declaration, err.existing);
        assert_eq!(tree.lookup_local(global, "x"), Some(err.declaration));
        assert_eq!(tree.declaration(err.declaration).kind, DeclarationKind::Var);

        let block2 = tree.enter_block(global, NodeRef::new(UnitId(0), NodeIndex(51)));
        tree.declare(block2, new("y", DeclarationKind::Var, 3)).unwrap();
        let err = tree.declare(block2, new("y", DeclarationKind::Const, 4)).unwrap_err();
        assert_eq!(err.kind, ConflictKind::BlockScoped);
    }

    #[test]
    fn test_parameter_rules() {
        let mut tree = ScopeTree::new();
        let global = tree.global_scope();
        let f = tree.enter_function(global, NodeRef::new(UnitId(0), NodeIndex(100)));
        let p = tree.declare(f, new("a", DeclarationKind::Parameter, 1)).unwrap();
        assert_eq!(tree.declare(f, new("a", DeclarationKind::Var, 2)), Ok(p));
        let err = tree.declare(f, new("a", DeclarationKind::Let, 3)).unwrap_err();
        assert_eq!(err.kind, ConflictKind::BlockScoped);
        let err = tree.declare(f, new("a", DeclarationKind::Parameter, 4)).unwrap_err();
        assert_eq!(err.kind, ConflictKind::Hoisted);
    }

    #[test]
    fn test_arguments_shadowing() {
        let mut tree = ScopeTree::new();
        let global = tree.global_scope();
        let f = tree.enter_function(global, NodeRef::new(UnitId(0), NodeIndex(100)));
        assert!(tree.resolve(f, ARGUMENTS).is_some());
        assert!(tree.resolve(global, ARGUMENTS).is_none());

        let var = tree.declare(f, new(ARGUMENTS, DeclarationKind::Var, 1)).unwrap();
        assert_eq!(tree.declaration(var).kind, DeclarationKind::Var);

        let g = tree.enter_function(global, NodeRef::new(UnitId(0), NodeIndex(101)));
        let err = tree.declare(g, new(ARGUMENTS, DeclarationKind::Parameter, 2)).unwrap_err();
        assert_eq!(err.kind, ConflictKind::ArgumentsShadowed);
        assert_eq!(tree.resolve(g, ARGUMENTS), Some(err.declaration));

        // At the top level there is nothing to shadow.
        assert!(tree.declare(global, new(ARGUMENTS, DeclarationKind::Function, 3)).is_ok());
    }

    #[test]
    fn test_catch_parameter_against_var() {
        let mut tree = ScopeTree::new();
        let global = tree.global_scope();
        let catch1 = tree.enter_catch(global, NodeRef::new(UnitId(0), NodeIndex(50)));
        tree.declare(catch1, new("e", DeclarationKind::CatchParameter, 1)).unwrap();
        let catch2 = tree.enter_catch(global, NodeRef::new(UnitId(0), NodeIndex(51)));
        assert!(tree.declare(catch2, new("e", DeclarationKind::CatchParameter, 2)).is_ok());

        let err = tree.declare(global, new("e", DeclarationKind::Var, 3)).unwrap_err();
        assert_eq!(err.kind, ConflictKind::Hoisted);

        tree.declare(global, new("x", DeclarationKind::Var, 4)).unwrap();
        let catch3 = tree.enter_catch(global, NodeRef::new(UnitId(0), NodeIndex(52)));
        let err = tree.declare(catch3, new("x", DeclarationKind::CatchParameter, 5)).unwrap_err();
        assert_eq!(err.kind, ConflictKind::Hoisted);
    }

    #[test]
    fn test_global_collides_with_extern() {
        let mut tree = ScopeTree::new();
        let externs = tree.extern_scope();
        let global = tree.global_scope();
        let ambient = tree.declare(externs, new("x", DeclarationKind::Var, 1)).unwrap();
        let err = tree.declare(global, new("x", DeclarationKind::Var, 2)).unwrap_err();
        assert_eq!(err.kind, ConflictKind::Hoisted);
        assert_ne!(err.declaration, ambient);
        assert!(tree.declaration(ambient).is_extern);
        assert!(!tree.declaration(err.declaration).is_extern);
    }

    #[test]
    fn test_is_declared_ambient_switch() {
        let mut tree = ScopeTree::new();
        let externs = tree.extern_scope();
        let global = tree.global_scope();
        tree.declare(externs, new("window", DeclarationKind::Var, 1)).unwrap();
        assert!(tree.is_declared(global, "window", true));
        assert!(!tree.is_declared(global, "window", false));
    }

    #[test]
    fn test_visibility_region() {
        let mut tree = ScopeTree::new();
        let global = tree.global_scope();
        let f = tree.enter_function(global, NodeRef::new(UnitId(0), NodeIndex(100)));
        let b = tree.enter_block(f, NodeRef::new(UnitId(0), NodeIndex(101)));
        let g = tree.enter_function(global, NodeRef::new(UnitId(0), NodeIndex(102)));
        let region = tree.visibility_region(f);
        assert_eq!(region, vec![f, b]);
        assert!(!region.contains(&g));
    }
}
