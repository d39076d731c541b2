//! Centralized limits and thresholds.
//!
//! These guard the recursive and iterative walks of the front end and the
//! scope model against pathological inputs.

/// Maximum nesting depth the parser will descend into before reporting
/// an error instead of overflowing the stack.
pub const MAX_PARSE_DEPTH: u32 = 1_000;

/// Upper bound on parent-chain steps during scope resolution.
///
/// Scope chains are acyclic by construction; hitting this limit means the
/// scope tree was corrupted.
pub const MAX_SCOPE_WALK_ITERATIONS: usize = 10_000;

/// Average source bytes per AST node, used to pre-size node arenas.
pub const SOURCE_BYTES_PER_NODE_HINT: usize = 8;
