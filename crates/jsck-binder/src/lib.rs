//! Compilation units, module graph and scope model for the jsck checker.
//!
//! This crate provides:
//! - `Program` / `CompilationUnit` - parsed units addressed by `UnitId`
//! - `ModuleGraph` - named modules, dependency edges, declared order
//! - `ScopeTree` - the lexical scope model with `declare` / `resolve`
//! - `BinderState` - the collection phase producing a `ProgramBinding`

pub mod module_graph;
pub use module_graph::{
    CircularDependency, CircularDependencyError, DependencyClosure, ModuleGraph,
    ModuleId, ModuleInfo,
};

pub mod program;
pub use program::{CompilationUnit, NodeRef, Program, SYNTHETIC_EXTERNS_NAME, UnitId};

pub mod scopes;
pub use scopes::{
    ARGUMENTS, ConflictKind, Declaration, DeclarationId, DeclarationKind, DeclarationSite,
    DuplicateDeclaration, NewDeclaration, Scope, ScopeId, ScopeKind, ScopeTree,
};

pub mod state;
pub use state::{BinderState, ProgramBinding, Reference};
