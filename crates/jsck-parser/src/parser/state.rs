//! Parser state and token helpers.
//!
//! `ParserState` is a single-pass recursive-descent parser over the
//! `ScannerState` token stream. Statement parsing lives in
//! `state_statements.rs`, expression parsing in `state_expressions.rs`.

use super::base::NodeIndex;
use super::jsdoc::JsDocTags;
use super::node::{NodeArena, NodeData, NodeFlags};
use jsck_common::limits::MAX_PARSE_DEPTH;
use jsck_common::{LanguageLevel, Span};
use jsck_scanner::{ScannerState, SyntaxKind};
use std::sync::Arc;

/// A syntax error. Parsing continues after reporting it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseDiagnostic {
    pub start: u32,
    pub length: u32,
    pub message: String,
}

pub struct ParserState {
    pub(crate) scanner: ScannerState,
    pub(crate) arena: NodeArena,
    pub(crate) file_name: String,
    pub(crate) language_level: LanguageLevel,
    pub(crate) current_token: SyntaxKind,
    pub(crate) parse_diagnostics: Vec<ParseDiagnostic>,
    pub(crate) recursion_depth: u32,
    /// Inside the head of a `for` statement, where `in` is not an operator.
    pub(crate) disallow_in: bool,
    /// End of the last consumed token.
    pub(crate) previous_token_end: u32,
}

impl ParserState {
    pub fn new(file_name: impl Into<String>, source_text: impl Into<Arc<str>>) -> ParserState {
        let source_text = source_text.into();
        ParserState {
            arena: NodeArena::for_source_len(source_text.len()),
            scanner: ScannerState::new(source_text),
            file_name: file_name.into(),
            language_level: LanguageLevel::default(),
            current_token: SyntaxKind::Unknown,
            parse_diagnostics: Vec::new(),
            recursion_depth: 0,
            disallow_in: false,
            previous_token_end: 0,
        }
    }

    #[must_use]
    pub fn with_language_level(mut self, level: LanguageLevel) -> ParserState {
        self.language_level = level;
        self
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn get_arena(&self) -> &NodeArena {
        &self.arena
    }

    pub fn into_arena(self) -> NodeArena {
        self.arena
    }

    pub fn get_diagnostics(&self) -> &[ParseDiagnostic] {
        &self.parse_diagnostics
    }

    pub fn source_text(&self) -> &str {
        self.scanner.source_text()
    }

    /// Parse the whole input and return the `SourceFile` node.
    #[tracing::instrument(level = "debug", skip(self), fields(file = %self.file_name))]
    pub fn parse_source_file(&mut self) -> NodeIndex {
        self.next_token();
        let statements = self.parse_statement_list(SyntaxKind::EndOfFileToken);

        for diag in self.scanner.get_scanner_diagnostics() {
            self.parse_diagnostics.push(ParseDiagnostic {
                start: diag.pos as u32,
                length: diag.length as u32,
                message: diag.message.to_string(),
            });
        }
        self.parse_diagnostics.sort_by_key(|d| d.start);

        let end = self.scanner.source_text().len() as u32;
        let root = self
            .arena
            .add(Span::new(0, end), NodeData::SourceFile { statements });
        self.arena.link_parents(root);
        tracing::debug!(
            nodes = self.arena.len(),
            errors = self.parse_diagnostics.len(),
            "parsed source file"
        );
        root
    }

    // =========================================================================
    // Token helpers
    // =========================================================================

    #[inline]
    pub(crate) fn token(&self) -> SyntaxKind {
        self.current_token
    }

    pub(crate) fn token_pos(&self) -> u32 {
        self.scanner.get_token_start()
    }

    pub(crate) fn token_value(&self) -> &str {
        self.scanner.get_token_value_ref()
    }

    pub(crate) fn next_token(&mut self) -> SyntaxKind {
        self.previous_token_end = self.scanner.get_token_end();
        self.current_token = self.scanner.scan();
        self.current_token
    }

    pub(crate) fn is_token(&self, kind: SyntaxKind) -> bool {
        self.current_token == kind
    }

    /// Consume the token if it matches.
    pub(crate) fn parse_optional(&mut self, kind: SyntaxKind) -> bool {
        if self.is_token(kind) {
            self.next_token();
            true
        } else {
            false
        }
    }

    /// Consume the expected token, reporting an error if it is missing.
    pub(crate) fn parse_expected(&mut self, kind: SyntaxKind) -> bool {
        if self.parse_optional(kind) {
            true
        } else {
            self.error_at_current_token(&format!("'{}' expected", kind.text()));
            false
        }
    }

    /// `of` is contextual, not a keyword.
    pub(crate) fn is_contextual(&self, word: &str) -> bool {
        self.is_token(SyntaxKind::Identifier) && self.token_value() == word
    }

    /// Statement terminator with automatic semicolon insertion.
    pub(crate) fn parse_semicolon(&mut self) {
        if self.parse_optional(SyntaxKind::SemicolonToken) {
            return;
        }
        if self.can_insert_semicolon() {
            return;
        }
        self.error_at_current_token("';' expected");
    }

    pub(crate) fn can_insert_semicolon(&self) -> bool {
        matches!(
            self.token(),
            SyntaxKind::CloseBraceToken | SyntaxKind::EndOfFileToken
        ) || self.scanner.has_preceding_line_break()
    }

    pub(crate) fn is_identifier_or_keyword(&self) -> bool {
        self.is_token(SyntaxKind::Identifier) || self.token().is_keyword()
    }

    /// Tags of the JSDoc comment attached to the current token.
    pub(crate) fn current_jsdoc_flags(&self) -> NodeFlags {
        let Some(span) = self.scanner.get_token_jsdoc() else {
            return NodeFlags::empty();
        };
        let text = self
            .scanner
            .source_text()
            .get(span.start as usize..span.end as usize)
            .unwrap_or_default();
        JsDocTags::parse(text).to_flags()
    }

    pub(crate) fn node_end(&self) -> u32 {
        self.previous_token_end
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    pub(crate) fn error_at_current_token(&mut self, message: &str) {
        let start = self.scanner.get_token_start();
        let end = self.scanner.get_token_end();
        self.parse_error_at(start, end.saturating_sub(start), message);
    }

    pub(crate) fn parse_error_at(&mut self, start: u32, length: u32, message: &str) {
        // One error per position is enough.
        if self
            .parse_diagnostics
            .last()
            .is_some_and(|last| last.start == start)
        {
            return;
        }
        self.parse_diagnostics.push(ParseDiagnostic {
            start,
            length,
            message: message.to_string(),
        });
    }

    /// Report a construct that needs a newer language level.
    pub(crate) fn check_language_level(&mut self, start: u32, what: &str) {
        if !self.language_level.allows_block_scoped() {
            let end = self.scanner.get_token_end();
            self.parse_error_at(
                start,
                end.saturating_sub(start),
                &format!("{what} is only available in ES2015 or later"),
            );
        }
    }

    // =========================================================================
    // Recursion guard
    // =========================================================================

    pub(crate) fn enter_recursion(&mut self) -> bool {
        if self.recursion_depth >= MAX_PARSE_DEPTH {
            self.error_at_current_token("maximum nesting depth exceeded");
            return false;
        }
        self.recursion_depth += 1;
        true
    }

    pub(crate) fn exit_recursion(&mut self) {
        self.recursion_depth = self.recursion_depth.saturating_sub(1);
    }

    /// Error-recovery node spanning the current token.
    pub(crate) fn missing_node(&mut self) -> NodeIndex {
        let pos = self.token_pos();
        self.arena.add(Span::at(pos), NodeData::Missing)
    }
}
