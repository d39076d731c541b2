pub mod base;
pub mod jsdoc;
pub mod node;
pub mod state;
mod state_expressions;
mod state_statements;
pub mod visit;
