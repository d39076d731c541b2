//! Compilation units and the program that owns them.
//!
//! A `Program` holds every parsed unit (externs and sources) together with
//! the module graph that groups source units into modules. Units keep their
//! own `NodeArena`; nodes are addressed across units with `NodeRef`.

use crate::module_graph::{ModuleGraph, ModuleId};
use jsck_common::{CheckLevel, Diagnostic, DiagnosticKind, LanguageLevel, LineMap, Span};
use jsck_parser::{NodeArena, NodeData, NodeFlags, NodeIndex, ParseDiagnostic, ParserState, VariableKind};
use std::sync::Arc;
use tracing::debug;

/// Name of the unit that receives synthesized ambient declarations.
pub const SYNTHETIC_EXTERNS_NAME: &str = "[synthetic:externs]";

/// Unique identifier for a compilation unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(pub u32);

impl UnitId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A node in a specific compilation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef {
    pub unit: UnitId,
    pub node: NodeIndex,
}

impl NodeRef {
    pub fn new(unit: UnitId, node: NodeIndex) -> Self {
        NodeRef { unit, node }
    }
}

#[derive(Debug)]
pub struct CompilationUnit {
    pub id: UnitId,
    pub name: String,
    pub arena: NodeArena,
    /// The `SourceFile` node
    pub root: NodeIndex,
    pub is_extern: bool,
    /// Created by the pipeline to hold synthesized declarations
    pub is_synthetic: bool,
    source: Arc<str>,
    line_map: LineMap,
}

impl CompilationUnit {
    pub fn source_text(&self) -> &str {
        &self.source
    }

    pub fn line_map(&self) -> &LineMap {
        &self.line_map
    }

    /// Top-level statements, in source order.
    pub fn statements(&self) -> &[NodeIndex] {
        match self.arena.data(self.root) {
            Some(NodeData::SourceFile { statements }) => statements,
            _ => &[],
        }
    }
}

/// All compilation units of one run plus their module graph.
#[derive(Debug, Default)]
pub struct Program {
    units: Vec<CompilationUnit>,
    module_graph: ModuleGraph,
    synthetic_externs: Option<UnitId>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_module_graph(module_graph: ModuleGraph) -> Self {
        Program {
            module_graph,
            ..Program::default()
        }
    }

    /// Parse `source` and add it as a unit. Source units may be assigned to a
    /// module; extern units never belong to one.
    pub fn parse_unit(
        &mut self,
        name: &str,
        source: &str,
        is_extern: bool,
        module: Option<ModuleId>,
        level: LanguageLevel,
    ) -> Result<UnitId, Vec<ParseDiagnostic>> {
        let source: Arc<str> = Arc::from(source);
        let mut parser =
            ParserState::new(name, Arc::clone(&source)).with_language_level(level);
        let root = parser.parse_source_file();
        if !parser.get_diagnostics().is_empty() {
            return Err(parser.get_diagnostics().to_vec());
        }
        let arena = parser.into_arena();
        let id = self.push_unit(name, source, arena, root, is_extern, false);
        if let (Some(module), false) = (module, is_extern) {
            self.module_graph.assign_unit(id, module);
        }
        Ok(id)
    }

    /// Parse an extern unit.
    pub fn add_extern(&mut self, name: &str, source: &str) -> Result<UnitId, Vec<ParseDiagnostic>> {
        self.parse_unit(name, source, true, None, LanguageLevel::default())
    }

    /// Parse a source unit outside any module.
    pub fn add_source(&mut self, name: &str, source: &str) -> Result<UnitId, Vec<ParseDiagnostic>> {
        self.parse_unit(name, source, false, None, LanguageLevel::default())
    }

    fn push_unit(
        &mut self,
        name: &str,
        source: Arc<str>,
        arena: NodeArena,
        root: NodeIndex,
        is_extern: bool,
        is_synthetic: bool,
    ) -> UnitId {
        let id = UnitId(self.units.len() as u32);
        let line_map = LineMap::build(&source);
        self.units.push(CompilationUnit {
            id,
            name: name.to_string(),
            arena,
            root,
            is_extern,
            is_synthetic,
            source,
            line_map,
        });
        debug!(unit = name, is_extern, "added compilation unit");
        id
    }

    pub fn unit(&self, id: UnitId) -> &CompilationUnit {
        &self.units[id.index()]
    }

    pub fn unit_mut(&mut self, id: UnitId) -> &mut CompilationUnit {
        &mut self.units[id.index()]
    }

    pub fn units(&self) -> impl Iterator<Item = &CompilationUnit> {
        self.units.iter()
    }

    pub fn unit_by_name(&self, name: &str) -> Option<UnitId> {
        self.units.iter().find(|u| u.name == name).map(|u| u.id)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Program order: extern units first, then source units, each in the
    /// order they were added.
    pub fn ordered_units(&self) -> Vec<UnitId> {
        let externs = self.units.iter().filter(|u| u.is_extern).map(|u| u.id);
        let sources = self.units.iter().filter(|u| !u.is_extern).map(|u| u.id);
        externs.chain(sources).collect()
    }

    pub fn module_graph(&self) -> &ModuleGraph {
        &self.module_graph
    }

    pub fn module_graph_mut(&mut self) -> &mut ModuleGraph {
        &mut self.module_graph
    }

    pub fn module_of_unit(&self, unit: UnitId) -> Option<ModuleId> {
        self.module_graph.module_of_unit(unit)
    }

    // =========================================================================
    // Node access
    // =========================================================================

    pub fn arena(&self, unit: UnitId) -> &NodeArena {
        &self.unit(unit).arena
    }

    pub fn span_of(&self, node: NodeRef) -> Span {
        self.arena(node.unit).span_of(node.node)
    }

    pub fn has_flag(&self, node: NodeRef, flag: NodeFlags) -> bool {
        self.arena(node.unit).has_flag(node.node, flag)
    }

    pub fn set_flag(&mut self, node: NodeRef, flag: NodeFlags) {
        self.unit_mut(node.unit).arena.set_flag(node.node, flag);
    }

    /// Build a diagnostic pointing at `node`.
    pub fn diagnostic_at(
        &self,
        kind: DiagnosticKind,
        level: CheckLevel,
        node: NodeRef,
        args: &[&str],
    ) -> Diagnostic {
        let unit = self.unit(node.unit);
        let span = unit.arena.span_of(node.node);
        let position = unit.line_map.position_of(span.start);
        Diagnostic::new(kind, level, unit.name.as_str(), span, position, args)
    }

    // =========================================================================
    // Synthetic externs
    // =========================================================================

    pub fn synthetic_externs(&self) -> Option<UnitId> {
        self.synthetic_externs
    }

    /// The synthetic externs unit, created empty on first use.
    pub fn ensure_synthetic_externs(&mut self) -> UnitId {
        if let Some(id) = self.synthetic_externs {
            return id;
        }
        let mut arena = NodeArena::new();
        let root = arena.add(Span::at(0), NodeData::SourceFile { statements: Vec::new() });
        let id = self.push_unit(SYNTHETIC_EXTERNS_NAME, Arc::from(""), arena, root, true, true);
        self.synthetic_externs = Some(id);
        id
    }

    /// Append `var name;` to the synthetic externs unit. Returns the new
    /// `VariableDeclaration` and its name `Identifier`.
    pub fn append_synthetic_var(&mut self, name: &str) -> (NodeRef, NodeRef) {
        let unit_id = self.ensure_synthetic_externs();
        let unit = self.unit_mut(unit_id);
        let arena = &mut unit.arena;
        let span = Span::at(0);

        let ident = arena.add_with_flags(
            span,
            NodeFlags::SYNTHESIZED,
            NodeData::Identifier { text: name.to_string() },
        );
        let declaration = arena.add_with_flags(
            span,
            NodeFlags::SYNTHESIZED,
            NodeData::VariableDeclaration {
                name: ident,
                initializer: NodeIndex::NONE,
            },
        );
        let statement = arena.add_with_flags(
            span,
            NodeFlags::SYNTHESIZED,
            NodeData::VariableStatement {
                kind: VariableKind::Var,
                declarations: vec![declaration],
            },
        );
        if let Some(node) = arena.get_mut(ident) {
            node.parent = declaration;
        }
        if let Some(node) = arena.get_mut(declaration) {
            node.parent = statement;
        }
        arena.append_statements(unit.root, &[statement]);
        debug!(name, "appended synthesized extern declaration");

        (NodeRef::new(unit_id, declaration), NodeRef::new(unit_id, ident))
    }
}
