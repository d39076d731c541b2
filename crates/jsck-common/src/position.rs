//! Line/column positions for diagnostics.
//!
//! The AST stores byte offsets; diagnostics carry 1-based line and column
//! numbers so they can be printed without the source text at hand.

use serde::{Deserialize, Serialize};

/// A 1-based line/column position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Position { line, column }
    }
}

/// Line map for offset -> position conversion.
/// Stores the starting offset of each line.
#[derive(Debug, Clone, Default)]
pub struct LineMap {
    /// Starting offset of each line (line_starts[0] is always 0)
    line_starts: Vec<u32>,
}

impl LineMap {
    /// Build a line map from source text.
    pub fn build(source: &str) -> Self {
        let mut line_starts = vec![0u32];
        let bytes = source.as_bytes();

        for (i, &b) in bytes.iter().enumerate() {
            match b {
                b'\n' => line_starts.push((i + 1) as u32),
                // A lone \r ends a line; in \r\n the \n does.
                b'\r' if bytes.get(i + 1) != Some(&b'\n') => line_starts.push((i + 1) as u32),
                _ => {}
            }
        }

        LineMap { line_starts }
    }

    /// Convert a byte offset to a 1-based position. Columns count bytes.
    pub fn position_of(&self, offset: u32) -> Position {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(insert_point) => insert_point.saturating_sub(1),
        };
        let line_start = self.line_starts.get(line).copied().unwrap_or(0);
        Position {
            line: line as u32 + 1,
            column: offset.saturating_sub(line_start) + 1,
        }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_map_positions() {
        let map = LineMap::build("var x;\nx = 1;\r\ny;");
        assert_eq!(map.line_count(), 3);
        assert_eq!(map.position_of(0), Position::new(1, 1));
        assert_eq!(map.position_of(4), Position::new(1, 5));
        assert_eq!(map.position_of(7), Position::new(2, 1));
        assert_eq!(map.position_of(15), Position::new(3, 1));
    }

    #[test]
    fn test_line_map_lone_carriage_return() {
        let map = LineMap::build("a\rb");
        assert_eq!(map.position_of(2), Position::new(2, 1));
    }
}
