//! Program assembly.
//!
//! `ProgramBuilder` parses named extern and source units into a `Program`,
//! registering modules and dependency edges on the way. Parse failures
//! become `anyhow` errors naming the unit and the first few syntax errors.

use anyhow::{Context, Result, anyhow};
use jsck_binder::{ModuleGraph, ModuleId, Program, UnitId};
use jsck_common::{AnalysisOptions, LanguageLevel, LineMap};
use jsck_parser::ParseDiagnostic;
use std::path::Path;
use tracing::{debug, info};

/// Syntax errors listed in a parse failure before the rest are counted.
const MAX_REPORTED_PARSE_ERRORS: usize = 5;

pub struct ProgramBuilder {
    program: Program,
    level: LanguageLevel,
}

impl ProgramBuilder {
    pub fn new(options: &AnalysisOptions) -> Self {
        ProgramBuilder {
            program: Program::new(),
            level: options.accepted_language_level,
        }
    }

    /// Declare module `name` depending on `dependencies`, creating any module
    /// not seen before. Declaration order is the processing order.
    pub fn module(&mut self, name: &str, dependencies: &[&str]) -> ModuleId {
        let graph = self.program.module_graph_mut();
        let id = graph.add_module(name);
        for dependency in dependencies {
            let target = graph.add_module(dependency);
            graph.add_dependency(id, target);
        }
        id
    }

    pub fn module_graph(&self) -> &ModuleGraph {
        self.program.module_graph()
    }

    pub fn add_extern(&mut self, name: &str, text: &str) -> Result<UnitId> {
        self.parse(name, text, true, None)
    }

    /// Add a source unit, optionally assigned to the module called `module`.
    pub fn add_source(&mut self, name: &str, text: &str, module: Option<&str>) -> Result<UnitId> {
        let module = match module {
            Some(module) => Some(
                self.program
                    .module_graph()
                    .get_module_id(module)
                    .ok_or_else(|| anyhow!("unit {name} names unknown module {module}"))?,
            ),
            None => None,
        };
        self.parse(name, text, false, module)
    }

    /// Read and add an extern file. The unit is named after the path.
    pub fn add_extern_file(&mut self, path: &Path) -> Result<UnitId> {
        let text = read_unit(path)?;
        self.add_extern(&path.display().to_string(), &text)
    }

    pub fn add_source_file(&mut self, path: &Path, module: Option<&str>) -> Result<UnitId> {
        let text = read_unit(path)?;
        self.add_source(&path.display().to_string(), &text, module)
    }

    pub fn finish(self) -> Program {
        info!(
            units = self.program.len(),
            modules = self.program.module_graph().len(),
            "program assembled"
        );
        self.program
    }

    fn parse(
        &mut self,
        name: &str,
        text: &str,
        is_extern: bool,
        module: Option<ModuleId>,
    ) -> Result<UnitId> {
        if self.program.unit_by_name(name).is_some() {
            return Err(anyhow!("duplicate unit name {name}"));
        }
        let id = self
            .program
            .parse_unit(name, text, is_extern, module, self.level)
            .map_err(|errors| parse_failure(name, text, &errors))?;
        debug!(name, is_extern, "unit parsed");
        Ok(id)
    }
}

fn read_unit(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn parse_failure(name: &str, text: &str, errors: &[ParseDiagnostic]) -> anyhow::Error {
    let line_map = LineMap::build(text);
    let mut message = format!("failed to parse {name}");
    for error in errors.iter().take(MAX_REPORTED_PARSE_ERRORS) {
        let position = line_map.position_of(error.start);
        message.push_str(&format!(
            "\n  {name}({},{}): {}",
            position.line, position.column, error.message
        ));
    }
    if errors.len() > MAX_REPORTED_PARSE_ERRORS {
        message.push_str(&format!(
            "\n  ... and {} more",
            errors.len() - MAX_REPORTED_PARSE_ERRORS
        ));
    }
    anyhow!(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modules_and_units() {
        let mut builder = ProgramBuilder::new(&AnalysisOptions::default());
        let base = builder.module("base", &[]);
        let app = builder.module("app", &["base"]);
        builder.add_source("base.js", "var x = 1;", Some("base")).unwrap();
        let unit = builder.add_source("app.js", "x;", Some("app")).unwrap();
        assert!(builder.module_graph().depends_on(app, base));

        let program = builder.finish();
        assert_eq!(program.module_of_unit(unit), Some(app));
    }

    #[test]
    fn test_unknown_module_is_an_error() {
        let mut builder = ProgramBuilder::new(&AnalysisOptions::default());
        let err = builder.add_source("a.js", "", Some("nowhere")).unwrap_err();
        assert!(err.to_string().contains("unknown module nowhere"), "{err}");
    }

    #[test]
    fn test_parse_failure_names_unit_and_position() {
        let mut builder = ProgramBuilder::new(&AnalysisOptions::default());
        let err = builder.add_source("bad.js", "var a;\nvar = ;", None).unwrap_err();
        let text = err.to_string();
        assert!(text.starts_with("failed to parse bad.js"), "{text}");
        assert!(text.contains("bad.js(2,"), "{text}");
    }

    #[test]
    fn test_language_level_gates_let() {
        let options = AnalysisOptions {
            accepted_language_level: LanguageLevel::Es5,
            ..AnalysisOptions::default()
        };
        let mut builder = ProgramBuilder::new(&options);
        assert!(builder.add_source("a.js", "let x = 1;", None).is_err());
        assert!(builder.add_source("b.js", "var x = 1;", None).is_ok());
    }

    #[test]
    fn test_duplicate_unit_name() {
        let mut builder = ProgramBuilder::new(&AnalysisOptions::default());
        builder.add_extern("a.js", "").unwrap();
        assert!(builder.add_source("a.js", "", None).is_err());
    }
}
