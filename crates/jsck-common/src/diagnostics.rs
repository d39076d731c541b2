//! Diagnostic Infrastructure
//!
//! Diagnostics produced by the declaration validator and the module
//! dependency checker. Every diagnostic has a fixed `DiagnosticKind`, and each
//! kind maps to a configurable `CheckLevel`. A diagnostic whose effective level
//! is `Off` is never created.
//!
//! # Components
//!
//! - `DiagnosticKind` - the fixed taxonomy, with codes and message templates
//! - `CheckLevel` - Off, Warning or Error
//! - `Diagnostic` - a single positioned message
//! - `DiagnosticBag` - the append-only sink for a run

use crate::position::Position;
use crate::span::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Check Level
// =============================================================================

/// The severity a diagnostic kind is reported at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckLevel {
    /// Not reported
    Off,
    /// Reported, does not fail the build
    Warning,
    /// Reported, fails the build
    Error,
}

impl CheckLevel {
    pub fn name(&self) -> &'static str {
        match self {
            CheckLevel::Off => "off",
            CheckLevel::Warning => "warning",
            CheckLevel::Error => "error",
        }
    }

    pub fn is_on(&self) -> bool {
        !matches!(self, CheckLevel::Off)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, CheckLevel::Error)
    }
}

impl fmt::Display for CheckLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Diagnostic Kind
// =============================================================================

/// The fixed set of diagnostics emitted by the passes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DiagnosticKind {
    /// A reference resolves nowhere.
    UndefinedVar,
    /// An extern reference whose root is not declared in the externs.
    UndefinedExternVar,
    /// Hoisted-kind redeclaration without a suppress marker.
    VarMultiplyDeclared,
    /// Any redeclaration involving a block-scoped kind.
    LetConstMultiplyDeclared,
    /// `arguments` shadowed by a function, parameter or catch name.
    VarArgumentsShadowed,
    /// Cross-module reference with no dependency relationship.
    MissingModuleDep,
    /// Cross-module reference against the declared dependency direction.
    ViolatedModuleDep,
    /// Unsound cross-module reference from inside a function body.
    StrictModuleDep,
    /// A plain name reference inside an extern unit.
    NameReferenceInExterns,
}

impl DiagnosticKind {
    pub const ALL: [DiagnosticKind; 9] = [
        DiagnosticKind::UndefinedVar,
        DiagnosticKind::UndefinedExternVar,
        DiagnosticKind::VarMultiplyDeclared,
        DiagnosticKind::LetConstMultiplyDeclared,
        DiagnosticKind::VarArgumentsShadowed,
        DiagnosticKind::MissingModuleDep,
        DiagnosticKind::ViolatedModuleDep,
        DiagnosticKind::StrictModuleDep,
        DiagnosticKind::NameReferenceInExterns,
    ];

    /// Stable numeric code, printed as `JSCK<code>`.
    pub const fn code(self) -> u32 {
        match self {
            DiagnosticKind::UndefinedVar => 8001,
            DiagnosticKind::UndefinedExternVar => 8002,
            DiagnosticKind::VarMultiplyDeclared => 8003,
            DiagnosticKind::LetConstMultiplyDeclared => 8004,
            DiagnosticKind::VarArgumentsShadowed => 8005,
            DiagnosticKind::MissingModuleDep => 8006,
            DiagnosticKind::ViolatedModuleDep => 8007,
            DiagnosticKind::StrictModuleDep => 8008,
            DiagnosticKind::NameReferenceInExterns => 8009,
        }
    }

    pub fn from_code(code: u32) -> Option<DiagnosticKind> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }

    pub const fn default_level(self) -> CheckLevel {
        match self {
            DiagnosticKind::UndefinedExternVar | DiagnosticKind::StrictModuleDep => CheckLevel::Off,
            DiagnosticKind::MissingModuleDep => CheckLevel::Warning,
            _ => CheckLevel::Error,
        }
    }

    /// Message template with `{0}`, `{1}`, ... placeholders.
    pub const fn message_template(self) -> &'static str {
        match self {
            DiagnosticKind::UndefinedVar => "variable {0} is undeclared",
            DiagnosticKind::UndefinedExternVar => {
                "name {0} is referenced in the externs but is not declared there"
            }
            DiagnosticKind::VarMultiplyDeclared => {
                "variable {0} is declared more than once; first declared in {1}"
            }
            DiagnosticKind::LetConstMultiplyDeclared => {
                "duplicate let / const / class declaration of {0} in the same scope"
            }
            DiagnosticKind::VarArgumentsShadowed => {
                "declaring {0} shadows the implicit arguments object"
            }
            DiagnosticKind::MissingModuleDep => {
                "module {0} references {2} from module {1} but does not depend on it"
            }
            DiagnosticKind::ViolatedModuleDep => {
                "module {0} references {2} from module {1}, which loads after {0}"
            }
            DiagnosticKind::StrictModuleDep => {
                "function in module {0} references {2} from module {1} without a module dependency"
            }
            DiagnosticKind::NameReferenceInExterns => {
                "reference to {0} in externs has no effect; declare it with var instead"
            }
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JSCK{}", self.code())
    }
}

/// Format a diagnostic message by replacing {0}, {1}, etc. with arguments.
#[must_use]
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{i}}}"), arg);
    }
    result
}

// =============================================================================
// Diagnostic
// =============================================================================

/// A positioned diagnostic. Never mutated after creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub level: CheckLevel,
    pub code: u32,
    /// Name of the compilation unit the diagnostic points into
    pub file: String,
    pub span: Span,
    /// 1-based line/column of `span.start`
    pub position: Position,
    pub message: String,
}

impl Diagnostic {
    /// Create a diagnostic, filling the message template with `args`.
    pub fn new(
        kind: DiagnosticKind,
        level: CheckLevel,
        file: impl Into<String>,
        span: Span,
        position: Position,
        args: &[&str],
    ) -> Self {
        Diagnostic {
            kind,
            level,
            code: kind.code(),
            file: file.into(),
            span,
            position,
            message: format_message(kind.message_template(), args),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level.is_error()
    }

    /// Format as `file(line,col): level JSCK8001: message`.
    pub fn format(&self) -> String {
        format!(
            "{}({},{}): {} {}: {}",
            self.file, self.position.line, self.position.column, self.level, self.kind, self.message
        )
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

// =============================================================================
// DiagnosticBag
// =============================================================================

/// Append-only collection of the diagnostics of one run.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticBag {
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
    warning_count: usize,
}

impl DiagnosticBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic. `Off` diagnostics are dropped.
    pub fn add(&mut self, diagnostic: Diagnostic) {
        match diagnostic.level {
            CheckLevel::Off => return,
            CheckLevel::Error => self.error_count += 1,
            CheckLevel::Warning => self.warning_count += 1,
        }
        self.diagnostics.push(diagnostic);
    }

    pub fn extend(&mut self, other: DiagnosticBag) {
        for diagnostic in other.diagnostics {
            self.add(diagnostic);
        }
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn warning_count(&self) -> usize {
        self.warning_count
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Number of diagnostics of a given kind.
    pub fn count_of(&self, kind: DiagnosticKind) -> usize {
        self.diagnostics.iter().filter(|d| d.kind == kind).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// Serialize all diagnostics as a JSON array.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.diagnostics)
    }
}
