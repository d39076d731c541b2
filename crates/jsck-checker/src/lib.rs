//! Checking passes of the jsck declaration checker.
//!
//! This crate provides:
//! - `VarCheck` - the reference phase of the declaration validator
//! - `ModuleDependencyChecker` - cross-module reference classification
//! - `classify_extern_reference` - the extern reference rule
//! - `ExternSynthesizer` - ambient declarations for undeclared names
//! - `InferConsts` - mutability inference
//! - `run_passes` - the pass pipeline

pub mod extern_check;
pub use extern_check::classify_extern_reference;

pub mod extern_synthesis;
pub use extern_synthesis::{ExternSynthesizer, SynthesisOutput};

pub mod infer_consts;
pub use infer_consts::{ImmutabilityReport, ImmutableBinding, InferConsts};

pub mod module_deps;
pub use module_deps::{ModuleDepVerdict, ModuleDependencyChecker};

pub mod pipeline;
pub use pipeline::{AnalysisResult, run_passes};

pub mod var_check;
pub use var_check::{SynthesisQueue, VarCheck, VarCheckError, VarCheckOutput};
