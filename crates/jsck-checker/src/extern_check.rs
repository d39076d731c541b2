//! Reference check for extern units.
//!
//! Extern code may only use names the externs themselves declare. A
//! member-access root that is not declared there (`ns.foo` without
//! `var ns`) is `UndefinedExternVar`; any other plain name reference is
//! `NameReferenceInExterns`. Either way the name is queued for synthesis so
//! that it becomes a proper ambient declaration.

use jsck_binder::{Declaration, Reference};
use jsck_common::DiagnosticKind;

/// Diagnostic for a reference in an extern unit, if any.
pub fn classify_extern_reference(
    reference: &Reference,
    resolved: Option<&Declaration>,
) -> Option<DiagnosticKind> {
    if resolved.is_some_and(|declaration| declaration.is_extern) {
        return None;
    }
    if reference.is_member_root {
        Some(DiagnosticKind::UndefinedExternVar)
    } else {
        Some(DiagnosticKind::NameReferenceInExterns)
    }
}
