//! JavaScript parser and AST types for the jsck declaration checker.
//!
//! This crate provides:
//! - `NodeArena` / `NodeIndex` / `Node` - arena-allocated syntax tree
//! - `ParserState` - recursive-descent parser for the accepted subset
//! - `JsDocTags` - the JSDoc tags the analysis passes care about
//! - `for_each_child` - generic child traversal in source order

pub mod parser;

pub use parser::base::{NodeIndex, NodeList};
pub use parser::jsdoc::JsDocTags;
pub use parser::node::{
    ClassData, ForInOfKind, FunctionData, Node, NodeArena, NodeData, NodeFlags, VariableKind,
};
pub use parser::state::{ParseDiagnostic, ParserState};
pub use parser::visit::{children_of, for_each_child};
