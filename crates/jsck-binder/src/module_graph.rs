//! Module Dependency Graph
//!
//! Named modules group compilation units and declare "depends-on" edges
//! between each other. The graph answers the questions the module
//! dependency checker asks about a cross-unit reference:
//! - Is the declaring module a transitive dependency of the referencing one?
//! - Does the declaring module (transitively) depend on the referencing one?
//!
//! Modules are numbered densely in declaration order, which is also the
//! declared processing order unless overridden.

use crate::program::UnitId;
use fixedbitset::FixedBitSet;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;

/// Unique identifier for a module in the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(pub u32);

impl ModuleId {
    pub const NONE: ModuleId = ModuleId(u32::MAX);

    pub fn is_none(&self) -> bool {
        self.0 == u32::MAX
    }

    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Information about a module in the dependency graph
#[derive(Debug, Clone)]
pub struct ModuleInfo {
    pub id: ModuleId,
    pub name: String,
    /// Compilation units belonging to this module, in program order
    pub units: Vec<UnitId>,
    /// Modules this module directly depends on
    pub dependencies: FxHashSet<ModuleId>,
    /// Modules that directly depend on this module
    pub dependents: FxHashSet<ModuleId>,
}

impl ModuleInfo {
    pub fn new(id: ModuleId, name: String) -> Self {
        Self {
            id,
            name,
            units: Vec::new(),
            dependencies: FxHashSet::default(),
            dependents: FxHashSet::default(),
        }
    }
}

/// A declared dependency edge: `from` depends on `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependencyEdge {
    pub from: ModuleId,
    pub to: ModuleId,
}

/// Circular dependency information
#[derive(Debug, Clone)]
pub struct CircularDependency {
    /// Modules forming the cycle
    pub cycle: Vec<ModuleId>,
    /// Module names for display
    pub names: Vec<String>,
}

/// Module dependency graph
#[derive(Debug, Clone, Default)]
pub struct ModuleGraph {
    /// All modules, indexed by `ModuleId`
    modules: Vec<ModuleInfo>,
    name_to_id: FxHashMap<String, ModuleId>,
    unit_to_module: FxHashMap<UnitId, ModuleId>,
    edges: Vec<DependencyEdge>,
    /// Declared processing order; module creation order unless overridden
    declared_order: Vec<ModuleId>,
    circular_dependencies: Vec<CircularDependency>,
}

impl ModuleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or get a module by name
    pub fn add_module(&mut self, name: &str) -> ModuleId {
        if let Some(&id) = self.name_to_id.get(name) {
            return id;
        }
        let id = ModuleId(self.modules.len() as u32);
        self.modules.push(ModuleInfo::new(id, name.to_string()));
        self.name_to_id.insert(name.to_string(), id);
        self.declared_order.push(id);
        id
    }

    /// Star shape: the first module is the hub, every other module depends
    /// on it and nothing else.
    pub fn star(names: &[&str]) -> (ModuleGraph, Vec<ModuleId>) {
        let mut graph = ModuleGraph::new();
        let ids: Vec<ModuleId> = names.iter().map(|name| graph.add_module(name)).collect();
        if let Some((&hub, spokes)) = ids.split_first() {
            for &spoke in spokes {
                graph.add_dependency(spoke, hub);
            }
        }
        (graph, ids)
    }

    /// Chain shape: every module depends on the one before it.
    pub fn chain(names: &[&str]) -> (ModuleGraph, Vec<ModuleId>) {
        let mut graph = ModuleGraph::new();
        let ids: Vec<ModuleId> = names.iter().map(|name| graph.add_module(name)).collect();
        for pair in ids.windows(2) {
            graph.add_dependency(pair[1], pair[0]);
        }
        (graph, ids)
    }

    pub fn get_module(&self, id: ModuleId) -> Option<&ModuleInfo> {
        self.modules.get(id.index())
    }

    pub fn get_module_id(&self, name: &str) -> Option<ModuleId> {
        self.name_to_id.get(name).copied()
    }

    pub fn module_name(&self, id: ModuleId) -> &str {
        self.get_module(id).map_or("<none>", |m| m.name.as_str())
    }

    /// Record that `unit` belongs to `module`. A unit belongs to at most
    /// one module; a later assignment moves it.
    pub fn assign_unit(&mut self, unit: UnitId, module: ModuleId) {
        if let Some(previous) = self.unit_to_module.insert(unit, module) {
            if let Some(info) = self.modules.get_mut(previous.index()) {
                info.units.retain(|&u| u != unit);
            }
        }
        if let Some(info) = self.modules.get_mut(module.index()) {
            info.units.push(unit);
        }
    }

    pub fn module_of_unit(&self, unit: UnitId) -> Option<ModuleId> {
        self.unit_to_module.get(&unit).copied()
    }

    /// Declare that `from` depends on `to`.
    pub fn add_dependency(&mut self, from: ModuleId, to: ModuleId) {
        let (Some(_), Some(_)) = (self.modules.get(from.index()), self.modules.get(to.index()))
        else {
            return;
        };
        if !self.modules[from.index()].dependencies.insert(to) {
            return;
        }
        self.modules[to.index()].dependents.insert(from);
        self.edges.push(DependencyEdge { from, to });
    }

    // =========================================================================
    // Declared order
    // =========================================================================

    pub fn declared_order(&self) -> &[ModuleId] {
        &self.declared_order
    }

    /// Override the processing order. Modules missing from `order` keep
    /// their relative creation order after the listed ones.
    pub fn set_declared_order(&mut self, order: &[ModuleId]) {
        let mut seen = FixedBitSet::with_capacity(self.modules.len());
        let mut declared = Vec::with_capacity(self.modules.len());
        for &id in order {
            if id.index() < self.modules.len() && !seen.put(id.index()) {
                declared.push(id);
            }
        }
        for module in &self.modules {
            if !seen.contains(module.id.index()) {
                declared.push(module.id);
            }
        }
        self.declared_order = declared;
    }

    /// Position of a module in the declared order.
    pub fn order_index(&self, id: ModuleId) -> Option<usize> {
        self.declared_order.iter().position(|&m| m == id)
    }

    /// Whether every module comes after all of its dependencies in the
    /// declared order.
    pub fn is_order_consistent(&self) -> bool {
        let mut position = vec![usize::MAX; self.modules.len()];
        for (index, id) in self.declared_order.iter().enumerate() {
            position[id.index()] = index;
        }
        self.edges
            .iter()
            .all(|edge| position[edge.to.index()] < position[edge.from.index()])
    }

    // =========================================================================
    // Reachability
    // =========================================================================

    /// Get all dependencies of a module (transitive)
    pub fn get_dependencies(&self, id: ModuleId) -> FxHashSet<ModuleId> {
        self.reachable(id, |module| &module.dependencies)
    }

    /// Get all modules that depend on a given module (transitive)
    pub fn get_dependents(&self, id: ModuleId) -> FxHashSet<ModuleId> {
        self.reachable(id, |module| &module.dependents)
    }

    fn reachable<F>(&self, id: ModuleId, next: F) -> FxHashSet<ModuleId>
    where
        F: Fn(&ModuleInfo) -> &FxHashSet<ModuleId>,
    {
        let mut result = FxHashSet::default();
        let mut queue = VecDeque::new();

        if let Some(module) = self.get_module(id) {
            queue.extend(next(module).iter().copied());
        }

        while let Some(current) = queue.pop_front() {
            if result.insert(current) {
                if let Some(module) = self.get_module(current) {
                    for &dep in next(module) {
                        if !result.contains(&dep) {
                            queue.push_back(dep);
                        }
                    }
                }
            }
        }

        result
    }

    /// Check if a module depends on another (directly or transitively)
    pub fn depends_on(&self, from: ModuleId, to: ModuleId) -> bool {
        self.get_dependencies(from).contains(&to)
    }

    /// Precompute transitive dependencies of every module, for repeated
    /// `depends_on` queries during a pass.
    pub fn dependency_closure(&self) -> DependencyClosure {
        let count = self.modules.len();
        let mut rows = Vec::with_capacity(count);
        for module in &self.modules {
            let mut row = FixedBitSet::with_capacity(count);
            for dep in self.get_dependencies(module.id) {
                row.insert(dep.index());
            }
            rows.push(row);
        }
        DependencyClosure { rows }
    }

    // =========================================================================
    // Cycles and ordering
    // =========================================================================

    /// Detect circular dependencies using Tarjan's algorithm
    pub fn detect_circular_dependencies(&mut self) -> &[CircularDependency] {
        self.circular_dependencies.clear();

        let mut tarjan = Tarjan {
            index_counter: 0,
            stack: Vec::new(),
            on_stack: FixedBitSet::with_capacity(self.modules.len()),
            indices: vec![None; self.modules.len()],
            lowlinks: vec![0; self.modules.len()],
            components: Vec::new(),
        };

        for module in &self.modules {
            if tarjan.indices[module.id.index()].is_none() {
                tarjan.strongconnect(self, module.id);
            }
        }

        for scc in tarjan.components {
            let is_cycle = scc.len() > 1
                || scc
                    .first()
                    .and_then(|&id| self.get_module(id))
                    .is_some_and(|m| m.dependencies.contains(&m.id));
            if is_cycle {
                let names = scc
                    .iter()
                    .map(|&id| self.module_name(id).to_string())
                    .collect();
                self.circular_dependencies
                    .push(CircularDependency { cycle: scc, names });
            }
        }

        &self.circular_dependencies
    }

    /// Modules in dependency order: dependencies come before dependents.
    /// Ties follow the declared order.
    pub fn topological_sort(&self) -> Result<Vec<ModuleId>, CircularDependencyError> {
        let mut result = Vec::with_capacity(self.modules.len());
        let mut visited = FixedBitSet::with_capacity(self.modules.len());
        let mut temp_visited = FixedBitSet::with_capacity(self.modules.len());
        let mut cycle_path = Vec::new();

        for &id in &self.declared_order {
            if !visited.contains(id.index())
                && !self.visit_topological(
                    id,
                    &mut visited,
                    &mut temp_visited,
                    &mut result,
                    &mut cycle_path,
                )
            {
                cycle_path.reverse();
                let names = cycle_path
                    .iter()
                    .map(|&id| self.module_name(id).to_string())
                    .collect();
                return Err(CircularDependencyError {
                    cycle: cycle_path,
                    names,
                });
            }
        }

        Ok(result)
    }

    fn visit_topological(
        &self,
        id: ModuleId,
        visited: &mut FixedBitSet,
        temp_visited: &mut FixedBitSet,
        result: &mut Vec<ModuleId>,
        cycle_path: &mut Vec<ModuleId>,
    ) -> bool {
        if temp_visited.contains(id.index()) {
            cycle_path.push(id);
            return false;
        }
        if visited.contains(id.index()) {
            return true;
        }

        temp_visited.insert(id.index());

        if let Some(module) = self.get_module(id) {
            let mut deps: Vec<ModuleId> = module.dependencies.iter().copied().collect();
            deps.sort_unstable();
            for dep in deps {
                if !self.visit_topological(dep, visited, temp_visited, result, cycle_path) {
                    cycle_path.push(id);
                    return false;
                }
            }
        }

        temp_visited.set(id.index(), false);
        visited.insert(id.index());
        result.push(id);
        true
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn edges(&self) -> &[DependencyEdge] {
        &self.edges
    }

}

struct Tarjan {
    index_counter: u32,
    stack: Vec<ModuleId>,
    on_stack: FixedBitSet,
    indices: Vec<Option<u32>>,
    lowlinks: Vec<u32>,
    components: Vec<Vec<ModuleId>>,
}

impl Tarjan {
    fn strongconnect(&mut self, graph: &ModuleGraph, v: ModuleId) {
        let vi = v.index();
        self.indices[vi] = Some(self.index_counter);
        self.lowlinks[vi] = self.index_counter;
        self.index_counter += 1;

        self.stack.push(v);
        self.on_stack.insert(vi);

        let mut deps: Vec<ModuleId> = graph
            .get_module(v)
            .map(|m| m.dependencies.iter().copied().collect())
            .unwrap_or_default();
        deps.sort_unstable();

        for w in deps {
            let wi = w.index();
            match self.indices[wi] {
                None => {
                    self.strongconnect(graph, w);
                    self.lowlinks[vi] = self.lowlinks[vi].min(self.lowlinks[wi]);
                }
                Some(w_index) if self.on_stack.contains(wi) => {
                    self.lowlinks[vi] = self.lowlinks[vi].min(w_index);
                }
                Some(_) => {}
            }
        }

        // Root of SCC
        if Some(self.lowlinks[vi]) == self.indices[vi] {
            let mut scc = Vec::new();
            while let Some(w) = self.stack.pop() {
                self.on_stack.set(w.index(), false);
                scc.push(w);
                if w == v {
                    break;
                }
            }
            self.components.push(scc);
        }
    }
}

/// Transitive dependency sets of every module, as bit rows.
#[derive(Debug, Clone)]
pub struct DependencyClosure {
    rows: Vec<FixedBitSet>,
}

impl DependencyClosure {
    /// Whether `from` transitively depends on `to`.
    pub fn depends_on(&self, from: ModuleId, to: ModuleId) -> bool {
        self.rows
            .get(from.index())
            .is_some_and(|row| row.contains(to.index()))
    }
}

/// Error returned when topological sort fails due to circular dependency
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircularDependencyError {
    pub cycle: Vec<ModuleId>,
    pub names: Vec<String>,
}

impl std::fmt::Display for CircularDependencyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Circular module dependency detected: {}",
            self.names.join(" -> ")
        )
    }
}

impl std::error::Error for CircularDependencyError {}
