//! JSON options files.
//!
//! An options file mirrors `AnalysisOptions` in camelCase. Comments and
//! trailing commas are accepted, boolean switches may be written as strings,
//! and `extends` names a base file whose settings the child overrides.
//!
//! ```json
//! {
//!   "extends": "./base.json",
//!   "acceptedLanguageLevel": "es5",
//!   "toleratesUndeclaredVars": "true",
//!   "diagnosticLevels": { "missingModuleDep": "error", "JSCK8003": "warning" }
//! }
//! ```

use anyhow::{Context, Result, anyhow, bail};
use jsck_common::{AnalysisOptions, CheckLevel, DiagnosticKind, DiagnosticLevels, LanguageLevel};
use serde::{Deserialize, Deserializer};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

/// Custom deserializer for boolean options that accepts both bool and string values.
fn deserialize_bool_or_string<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrString {
        Bool(bool),
        String(String),
    }

    match Option::<BoolOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(BoolOrString::Bool(b)) => Ok(Some(b)),
        Some(BoolOrString::String(s)) => match s.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Some(true)),
            "false" | "0" | "no" | "off" => Ok(Some(false)),
            _ => Err(Error::custom(format!(
                "invalid boolean value: '{s}'. Expected true, false, 'true', or 'false'"
            ))),
        },
    }
}

/// Raw options file contents. Every field is optional; unset fields keep
/// the `AnalysisOptions` default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionsFile {
    #[serde(default)]
    pub extends: Option<String>,
    #[serde(default)]
    pub accepted_language_level: Option<String>,
    #[serde(default)]
    pub stricter_module_dep_severity: Option<String>,
    #[serde(default)]
    pub extern_validation_severity: Option<String>,
    #[serde(default, deserialize_with = "deserialize_bool_or_string")]
    pub tolerates_undeclared_vars: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_bool_or_string")]
    pub sanity_check_mode: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_bool_or_string")]
    pub self_check: Option<bool>,
    /// Diagnostic kind (name, `JSCK<code>` or bare code) to level
    #[serde(default)]
    pub diagnostic_levels: Option<BTreeMap<String, String>>,
}

impl OptionsFile {
    /// Turn the file into `AnalysisOptions`, validating every value.
    pub fn resolve(&self) -> Result<AnalysisOptions> {
        let mut options = AnalysisOptions::default();

        if let Some(level) = self.accepted_language_level.as_deref() {
            options.accepted_language_level = LanguageLevel::parse(level)
                .ok_or_else(|| anyhow!("unsupported acceptedLanguageLevel '{level}'"))?;
        }
        if let Some(level) = self.stricter_module_dep_severity.as_deref() {
            options.stricter_module_dep_severity = parse_check_level(level)
                .context("invalid stricterModuleDepSeverity")?;
        }
        if let Some(level) = self.extern_validation_severity.as_deref() {
            options.extern_validation_severity =
                parse_check_level(level).context("invalid externValidationSeverity")?;
        }
        if let Some(value) = self.tolerates_undeclared_vars {
            options.tolerates_undeclared_vars = value;
        }
        if let Some(value) = self.sanity_check_mode {
            options.sanity_check_mode = value;
        }
        if let Some(value) = self.self_check {
            options.self_check = value;
        }

        if let Some(levels) = &self.diagnostic_levels {
            let mut resolved = DiagnosticLevels::new();
            for (kind, level) in levels {
                let kind = parse_diagnostic_kind(kind)?;
                let level = parse_check_level(level)
                    .with_context(|| format!("invalid level for diagnosticLevels.{kind:?}"))?;
                resolved.set(kind, level);
            }
            options.diagnostic_levels = resolved;
        }

        Ok(options)
    }
}

/// Parse options file text into resolved options. `extends` is not followed.
pub fn parse_options(source: &str) -> Result<AnalysisOptions> {
    parse_options_file(source)?.resolve()
}

/// Load an options file, following `extends` chains.
pub fn load_options(path: &Path) -> Result<AnalysisOptions> {
    let mut visited = HashSet::new();
    let file = load_options_inner(path, &mut visited)?;
    file.resolve()
        .with_context(|| format!("invalid options in {}", path.display()))
}

fn parse_options_file(source: &str) -> Result<OptionsFile> {
    let stripped = strip_jsonc(source);
    let normalized = remove_trailing_commas(&stripped);
    serde_json::from_str(&normalized).context("failed to parse options JSON")
}

fn load_options_inner(path: &Path, visited: &mut HashSet<PathBuf>) -> Result<OptionsFile> {
    let canonical = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    if !visited.insert(canonical.clone()) {
        bail!("options extends cycle detected at {}", canonical.display());
    }

    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read options file: {}", path.display()))?;
    let mut file = parse_options_file(&source)
        .with_context(|| format!("failed to parse options file: {}", path.display()))?;

    if let Some(extends) = file.extends.take() {
        let base_path = resolve_extends_path(path, &extends)?;
        let base = load_options_inner(&base_path, visited)?;
        file = merge_files(base, file);
    }

    visited.remove(&canonical);
    Ok(file)
}

fn resolve_extends_path(current_path: &Path, extends: &str) -> Result<PathBuf> {
    let base_dir = current_path
        .parent()
        .ok_or_else(|| anyhow!("options file has no parent directory"))?;
    let mut candidate = PathBuf::from(extends);
    if candidate.extension().is_none() {
        candidate.set_extension("json");
    }
    if candidate.is_absolute() {
        Ok(candidate)
    } else {
        Ok(base_dir.join(candidate))
    }
}

/// Child settings win; per-kind levels are merged key by key.
fn merge_files(base: OptionsFile, child: OptionsFile) -> OptionsFile {
    let diagnostic_levels = match (base.diagnostic_levels, child.diagnostic_levels) {
        (Some(mut base_levels), Some(child_levels)) => {
            base_levels.extend(child_levels);
            Some(base_levels)
        }
        (base_levels, child_levels) => child_levels.or(base_levels),
    };
    OptionsFile {
        extends: None,
        accepted_language_level: child.accepted_language_level.or(base.accepted_language_level),
        stricter_module_dep_severity: child
            .stricter_module_dep_severity
            .or(base.stricter_module_dep_severity),
        extern_validation_severity: child
            .extern_validation_severity
            .or(base.extern_validation_severity),
        tolerates_undeclared_vars: child.tolerates_undeclared_vars.or(base.tolerates_undeclared_vars),
        sanity_check_mode: child.sanity_check_mode.or(base.sanity_check_mode),
        self_check: child.self_check.or(base.self_check),
        diagnostic_levels,
    }
}

fn parse_check_level(value: &str) -> Result<CheckLevel> {
    let level = match normalize_option(value).as_str() {
        "off" | "none" => CheckLevel::Off,
        "warning" | "warn" => CheckLevel::Warning,
        "error" => CheckLevel::Error,
        _ => bail!("unsupported check level '{value}'"),
    };
    Ok(level)
}

/// Accepts `missingModuleDep`, `missing-module-dep`, `JSCK8006` or `8006`.
fn parse_diagnostic_kind(value: &str) -> Result<DiagnosticKind> {
    let normalized = normalize_option(value);
    let numeric = normalized.strip_prefix("jsck").unwrap_or(&normalized);
    if let Ok(code) = numeric.parse::<u32>() {
        return DiagnosticKind::from_code(code)
            .ok_or_else(|| anyhow!("unknown diagnostic code '{value}'"));
    }
    let kind = match normalized.as_str() {
        "undefinedvar" => DiagnosticKind::UndefinedVar,
        "undefinedexternvar" => DiagnosticKind::UndefinedExternVar,
        "varmultiplydeclared" => DiagnosticKind::VarMultiplyDeclared,
        "letconstmultiplydeclared" => DiagnosticKind::LetConstMultiplyDeclared,
        "varargumentsshadowed" => DiagnosticKind::VarArgumentsShadowed,
        "missingmoduledep" => DiagnosticKind::MissingModuleDep,
        "violatedmoduledep" => DiagnosticKind::ViolatedModuleDep,
        "strictmoduledep" => DiagnosticKind::StrictModuleDep,
        "namereferenceinexterns" => DiagnosticKind::NameReferenceInExterns,
        _ => bail!("unknown diagnostic kind '{value}'"),
    };
    Ok(kind)
}

fn normalize_option(value: &str) -> String {
    let mut normalized = String::with_capacity(value.len());
    for ch in value.chars() {
        if ch == '-' || ch == '_' || ch.is_whitespace() {
            continue;
        }
        normalized.push(ch.to_ascii_lowercase());
    }
    normalized
}

fn strip_jsonc(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;
    let mut escape = false;
    let mut in_line_comment = false;
    let mut in_block_comment = false;

    while let Some(ch) = chars.next() {
        if in_line_comment {
            if ch == '\n' {
                in_line_comment = false;
                out.push(ch);
            }
            continue;
        }
        if in_block_comment {
            if ch == '*' && chars.peek() == Some(&'/') {
                chars.next();
                in_block_comment = false;
            } else if ch == '\n' {
                out.push(ch);
            }
            continue;
        }
        if in_string {
            out.push(ch);
            if escape {
                escape = false;
            } else if ch == '\\' {
                escape = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match (ch, chars.peek()) {
            ('"', _) => {
                in_string = true;
                out.push(ch);
            }
            ('/', Some('/')) => {
                chars.next();
                in_line_comment = true;
            }
            ('/', Some('*')) => {
                chars.next();
                in_block_comment = true;
            }
            _ => out.push(ch),
        }
    }
    out
}

fn remove_trailing_commas(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;
    let mut escape = false;

    while let Some(ch) = chars.next() {
        if in_string {
            out.push(ch);
            if escape {
                escape = false;
            } else if ch == '\\' {
                escape = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        if ch == '"' {
            in_string = true;
        } else if ch == ',' {
            let mut lookahead = chars.clone();
            while lookahead.peek().is_some_and(|next| next.is_whitespace()) {
                lookahead.next();
            }
            if matches!(lookahead.peek(), Some('}' | ']')) {
                continue;
            }
        }
        out.push(ch);
    }
    out
}
