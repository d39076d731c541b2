//! Common types and utilities for the jsck declaration checker.
//!
//! This crate provides foundational types used across all jsck crates:
//! - Source spans (`Span`) and line/column mapping (`LineMap`, `Position`)
//! - Diagnostics (`DiagnosticKind`, `CheckLevel`, `Diagnostic`, `DiagnosticBag`)
//! - Analysis options (`AnalysisOptions`, `LanguageLevel`, `DiagnosticLevels`)
//! - Centralized limits

// Span - Source location tracking (byte offsets)
pub mod span;
pub use span::Span;

// Position types for line/column source locations
pub mod position;
pub use position::{LineMap, Position};

// Diagnostic kinds, levels and the collecting bag
pub mod diagnostics;
pub use diagnostics::{CheckLevel, Diagnostic, DiagnosticBag, DiagnosticKind};

// Options recognised by the analysis passes
pub mod options;
pub use options::{AnalysisOptions, DiagnosticLevels, LanguageLevel};

// Centralized limits and thresholds
pub mod limits;
