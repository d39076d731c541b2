//! Scanner state machine.
//!
//! Produces one token per `scan()` call. Trivia (whitespace, line breaks and
//! comments) is skipped; whether a line break preceded the token is kept for
//! automatic semicolon insertion, and the last `/** ... */` block comment
//! before the token is kept for JSDoc tag reading.

use crate::SyntaxKind;
use jsck_common::Span;
use memchr::memmem;
use std::sync::Arc;

/// A lexical error. Scanning continues after reporting it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScannerDiagnostic {
    pub pos: usize,
    pub length: usize,
    pub message: &'static str,
}

/// Saved scanner position for look-ahead.
#[derive(Clone, Debug)]
pub struct ScannerSnapshot {
    pos: usize,
    token: SyntaxKind,
    token_start: usize,
    token_value: String,
    preceding_line_break: bool,
    token_jsdoc: Option<Span>,
    diagnostics_len: usize,
}

pub struct ScannerState {
    text: Arc<str>,
    pos: usize,
    token: SyntaxKind,
    token_start: usize,
    token_value: String,
    preceding_line_break: bool,
    token_jsdoc: Option<Span>,
    diagnostics: Vec<ScannerDiagnostic>,
}

impl ScannerState {
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        ScannerState {
            text: text.into(),
            pos: 0,
            token: SyntaxKind::Unknown,
            token_start: 0,
            token_value: String::new(),
            preceding_line_break: false,
            token_jsdoc: None,
            diagnostics: Vec::new(),
        }
    }

    pub fn source_text(&self) -> &str {
        &self.text
    }

    pub fn source_text_arc(&self) -> Arc<str> {
        Arc::clone(&self.text)
    }

    pub fn get_token(&self) -> SyntaxKind {
        self.token
    }

    pub fn get_token_start(&self) -> u32 {
        self.token_start as u32
    }

    pub fn get_token_end(&self) -> u32 {
        self.pos as u32
    }

    /// Identifier name, or the cooked value of a string/numeric literal.
    pub fn get_token_value_ref(&self) -> &str {
        &self.token_value
    }

    pub fn has_preceding_line_break(&self) -> bool {
        self.preceding_line_break
    }

    /// Span of the closest `/** ... */` comment in the trivia before the
    /// current token.
    pub fn get_token_jsdoc(&self) -> Option<Span> {
        self.token_jsdoc
    }

    pub fn get_scanner_diagnostics(&self) -> &[ScannerDiagnostic] {
        &self.diagnostics
    }

    pub fn save_state(&self) -> ScannerSnapshot {
        ScannerSnapshot {
            pos: self.pos,
            token: self.token,
            token_start: self.token_start,
            token_value: self.token_value.clone(),
            preceding_line_break: self.preceding_line_break,
            token_jsdoc: self.token_jsdoc,
            diagnostics_len: self.diagnostics.len(),
        }
    }

    pub fn restore_state(&mut self, snapshot: ScannerSnapshot) {
        self.pos = snapshot.pos;
        self.token = snapshot.token;
        self.token_start = snapshot.token_start;
        self.token_value = snapshot.token_value;
        self.preceding_line_break = snapshot.preceding_line_break;
        self.token_jsdoc = snapshot.token_jsdoc;
        self.diagnostics.truncate(snapshot.diagnostics_len);
    }

    fn error(&mut self, pos: usize, length: usize, message: &'static str) {
        self.diagnostics.push(ScannerDiagnostic {
            pos,
            length,
            message,
        });
    }

    #[inline]
    fn byte_at(&self, pos: usize) -> Option<u8> {
        self.text.as_bytes().get(pos).copied()
    }

    /// Advance to the next token and return its kind.
    pub fn scan(&mut self) -> SyntaxKind {
        self.preceding_line_break = false;
        self.token_jsdoc = None;
        self.token_value.clear();
        self.skip_trivia();

        self.token_start = self.pos;
        let Some(ch) = self.byte_at(self.pos) else {
            self.token = SyntaxKind::EndOfFileToken;
            return self.token;
        };

        self.token = match ch {
            b'0'..=b'9' => self.scan_number(),
            b'.' if matches!(self.byte_at(self.pos + 1), Some(b'0'..=b'9')) => self.scan_number(),
            b'"' | b'\'' => self.scan_string(ch),
            c if is_identifier_start(c) => self.scan_identifier(),
            _ => self.scan_punctuation(ch),
        };
        self.token
    }

    fn skip_trivia(&mut self) {
        let text = Arc::clone(&self.text);
        let bytes = text.as_bytes();
        while self.pos < bytes.len() {
            match bytes[self.pos] {
                b'\n' | b'\r' => {
                    self.preceding_line_break = true;
                    self.pos += 1;
                }
                b' ' | b'\t' | 0x0B | 0x0C => self.pos += 1,
                b'/' if bytes.get(self.pos + 1) == Some(&b'/') => {
                    match memchr::memchr(b'\n', &bytes[self.pos..]) {
                        Some(offset) => self.pos += offset,
                        None => self.pos = bytes.len(),
                    }
                }
                b'/' if bytes.get(self.pos + 1) == Some(&b'*') => {
                    let start = self.pos;
                    let body = &bytes[start + 2..];
                    match memmem::find(body, b"*/") {
                        Some(offset) => {
                            let end = start + 2 + offset + 2;
                            if memchr::memchr2(b'\n', b'\r', &bytes[start..end]).is_some() {
                                self.preceding_line_break = true;
                            }
                            // `/**/` is an empty ordinary comment.
                            if bytes.get(start + 2) == Some(&b'*') && end - start > 4 {
                                self.token_jsdoc = Some(Span::new(start as u32, end as u32));
                            }
                            self.pos = end;
                        }
                        None => {
                            self.error(start, bytes.len() - start, "unterminated comment");
                            self.pos = bytes.len();
                        }
                    }
                }
                0xC2 if bytes.get(self.pos + 1) == Some(&0xA0) => self.pos += 2,
                0xEF if bytes[self.pos..].starts_with(&[0xEF, 0xBB, 0xBF]) => self.pos += 3,
                _ => break,
            }
        }
    }

    fn scan_identifier(&mut self) -> SyntaxKind {
        let start = self.pos;
        while let Some(c) = self.byte_at(self.pos) {
            if is_identifier_part(c) {
                self.pos += 1;
            } else {
                break;
            }
        }
        let text = &self.text[start..self.pos];
        self.token_value.push_str(text);
        SyntaxKind::keyword(text).unwrap_or(SyntaxKind::Identifier)
    }

    fn scan_number(&mut self) -> SyntaxKind {
        let start = self.pos;
        let bytes = self.text.as_bytes();
        if bytes[start] == b'0' && matches!(bytes.get(start + 1), Some(b'x' | b'X')) {
            self.pos += 2;
            while matches!(self.byte_at(self.pos), Some(c) if c.is_ascii_hexdigit()) {
                self.pos += 1;
            }
            if self.pos == start + 2 {
                self.error(start, 2, "hexadecimal digit expected");
            }
        } else {
            while matches!(self.byte_at(self.pos), Some(b'0'..=b'9')) {
                self.pos += 1;
            }
            if self.byte_at(self.pos) == Some(b'.') {
                self.pos += 1;
                while matches!(self.byte_at(self.pos), Some(b'0'..=b'9')) {
                    self.pos += 1;
                }
            }
            if matches!(self.byte_at(self.pos), Some(b'e' | b'E')) {
                let exponent_start = self.pos;
                self.pos += 1;
                if matches!(self.byte_at(self.pos), Some(b'+' | b'-')) {
                    self.pos += 1;
                }
                let digits_start = self.pos;
                while matches!(self.byte_at(self.pos), Some(b'0'..=b'9')) {
                    self.pos += 1;
                }
                if self.pos == digits_start {
                    self.error(exponent_start, self.pos - exponent_start, "digit expected");
                }
            }
        }
        if matches!(self.byte_at(self.pos), Some(c) if is_identifier_start(c)) {
            self.error(self.pos, 1, "identifier cannot immediately follow a numeric literal");
        }
        let text = &self.text[start..self.pos];
        self.token_value.push_str(text);
        SyntaxKind::NumericLiteral
    }

    fn scan_string(&mut self, quote: u8) -> SyntaxKind {
        let start = self.pos;
        self.pos += 1;
        let mut value = String::new();
        loop {
            let Some(c) = self.byte_at(self.pos) else {
                self.error(start, self.pos - start, "unterminated string literal");
                break;
            };
            if c == quote {
                self.pos += 1;
                break;
            }
            match c {
                b'\n' | b'\r' => {
                    self.error(start, self.pos - start, "unterminated string literal");
                    break;
                }
                b'\\' => {
                    self.pos += 1;
                    self.scan_escape(&mut value);
                }
                _ => {
                    let rest = &self.text[self.pos..];
                    let Some(ch) = rest.chars().next() else {
                        break;
                    };
                    value.push(ch);
                    self.pos += ch.len_utf8();
                }
            }
        }
        self.token_value = value;
        SyntaxKind::StringLiteral
    }

    fn scan_escape(&mut self, value: &mut String) {
        let Some(c) = self.byte_at(self.pos) else {
            return;
        };
        self.pos += 1;
        match c {
            b'n' => value.push('\n'),
            b't' => value.push('\t'),
            b'r' => value.push('\r'),
            b'b' => value.push('\u{8}'),
            b'f' => value.push('\u{c}'),
            b'v' => value.push('\u{b}'),
            b'0' => value.push('\0'),
            b'x' => self.scan_hex_escape(2, value),
            b'u' => self.scan_hex_escape(4, value),
            // Line continuation
            b'\r' => {
                if self.byte_at(self.pos) == Some(b'\n') {
                    self.pos += 1;
                }
            }
            b'\n' => {}
            _ => {
                // Re-read the escaped character as UTF-8.
                let start = self.pos - 1;
                if let Some(ch) = self.text[start..].chars().next() {
                    value.push(ch);
                    self.pos = start + ch.len_utf8();
                }
            }
        }
    }

    fn scan_hex_escape(&mut self, digits: usize, value: &mut String) {
        let start = self.pos;
        let end = start + digits;
        let code = self
            .text
            .get(start..end)
            .filter(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()))
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .and_then(char::from_u32);
        match code {
            Some(ch) => {
                value.push(ch);
                self.pos = end;
            }
            None => self.error(start.saturating_sub(2), digits + 2, "invalid escape sequence"),
        }
    }

    fn scan_punctuation(&mut self, ch: u8) -> SyntaxKind {
        use SyntaxKind::*;

        let next = self.byte_at(self.pos + 1);
        let third = self.byte_at(self.pos + 2);
        let fourth = self.byte_at(self.pos + 3);
        let (kind, len) = match ch {
            b'{' => (OpenBraceToken, 1),
            b'}' => (CloseBraceToken, 1),
            b'(' => (OpenParenToken, 1),
            b')' => (CloseParenToken, 1),
            b'[' => (OpenBracketToken, 1),
            b']' => (CloseBracketToken, 1),
            b'.' => (DotToken, 1),
            b';' => (SemicolonToken, 1),
            b',' => (CommaToken, 1),
            b'?' => (QuestionToken, 1),
            b':' => (ColonToken, 1),
            b'~' => (TildeToken, 1),
            b'<' => match (next, third) {
                (Some(b'<'), Some(b'=')) => (LessThanLessThanEqualsToken, 3),
                (Some(b'<'), _) => (LessThanLessThanToken, 2),
                (Some(b'='), _) => (LessThanEqualsToken, 2),
                _ => (LessThanToken, 1),
            },
            b'>' => match (next, third, fourth) {
                (Some(b'>'), Some(b'>'), Some(b'=')) => {
                    (GreaterThanGreaterThanGreaterThanEqualsToken, 4)
                }
                (Some(b'>'), Some(b'>'), _) => (GreaterThanGreaterThanGreaterThanToken, 3),
                (Some(b'>'), Some(b'='), _) => (GreaterThanGreaterThanEqualsToken, 3),
                (Some(b'>'), _, _) => (GreaterThanGreaterThanToken, 2),
                (Some(b'='), _, _) => (GreaterThanEqualsToken, 2),
                _ => (GreaterThanToken, 1),
            },
            b'=' => match (next, third) {
                (Some(b'='), Some(b'=')) => (EqualsEqualsEqualsToken, 3),
                (Some(b'='), _) => (EqualsEqualsToken, 2),
                _ => (EqualsToken, 1),
            },
            b'!' => match (next, third) {
                (Some(b'='), Some(b'=')) => (ExclamationEqualsEqualsToken, 3),
                (Some(b'='), _) => (ExclamationEqualsToken, 2),
                _ => (ExclamationToken, 1),
            },
            b'+' => match next {
                Some(b'+') => (PlusPlusToken, 2),
                Some(b'=') => (PlusEqualsToken, 2),
                _ => (PlusToken, 1),
            },
            b'-' => match next {
                Some(b'-') => (MinusMinusToken, 2),
                Some(b'=') => (MinusEqualsToken, 2),
                _ => (MinusToken, 1),
            },
            b'*' => match next {
                Some(b'=') => (AsteriskEqualsToken, 2),
                _ => (AsteriskToken, 1),
            },
            b'/' => match next {
                Some(b'=') => (SlashEqualsToken, 2),
                _ => (SlashToken, 1),
            },
            b'%' => match next {
                Some(b'=') => (PercentEqualsToken, 2),
                _ => (PercentToken, 1),
            },
            b'&' => match next {
                Some(b'&') => (AmpersandAmpersandToken, 2),
                Some(b'=') => (AmpersandEqualsToken, 2),
                _ => (AmpersandToken, 1),
            },
            b'|' => match next {
                Some(b'|') => (BarBarToken, 2),
                Some(b'=') => (BarEqualsToken, 2),
                _ => (BarToken, 1),
            },
            b'^' => match next {
                Some(b'=') => (CaretEqualsToken, 2),
                _ => (CaretToken, 1),
            },
            _ => {
                let width = self.text[self.pos..]
                    .chars()
                    .next()
                    .map_or(1, char::len_utf8);
                self.error(self.pos, width, "invalid character");
                (Unknown, width)
            }
        };
        self.pos += len;
        kind
    }
}

#[inline]
fn is_identifier_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_' || c == b'$'
}

#[inline]
fn is_identifier_part(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_' || c == b'$'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str) -> Vec<SyntaxKind> {
        let mut scanner = ScannerState::new(source);
        let mut kinds = Vec::new();
        loop {
            let kind = scanner.scan();
            if kind == SyntaxKind::EndOfFileToken {
                break;
            }
            kinds.push(kind);
        }
        kinds
    }

    #[test]
    fn test_scan_declaration() {
        assert_eq!(
            tokens("let x = 3, y;"),
            vec![
                SyntaxKind::LetKeyword,
                SyntaxKind::Identifier,
                SyntaxKind::EqualsToken,
                SyntaxKind::NumericLiteral,
                SyntaxKind::CommaToken,
                SyntaxKind::Identifier,
                SyntaxKind::SemicolonToken,
            ]
        );
    }

    #[test]
    fn test_longest_operator_match() {
        assert_eq!(
            tokens("a >>>= b >>> c >= d"),
            vec![
                SyntaxKind::Identifier,
                SyntaxKind::GreaterThanGreaterThanGreaterThanEqualsToken,
                SyntaxKind::Identifier,
                SyntaxKind::GreaterThanGreaterThanGreaterThanToken,
                SyntaxKind::Identifier,
                SyntaxKind::GreaterThanEqualsToken,
                SyntaxKind::Identifier,
            ]
        );
        assert_eq!(
            tokens("x++ - --y"),
            vec![
                SyntaxKind::Identifier,
                SyntaxKind::PlusPlusToken,
                SyntaxKind::MinusToken,
                SyntaxKind::MinusMinusToken,
                SyntaxKind::Identifier,
            ]
        );
    }

    #[test]
    fn test_line_break_tracking() {
        let mut scanner = ScannerState::new("a\n// c\nb /* x */ c");
        scanner.scan();
        assert!(!scanner.has_preceding_line_break());
        scanner.scan();
        assert!(scanner.has_preceding_line_break());
        assert_eq!(scanner.get_token_value_ref(), "b");
        scanner.scan();
        assert!(!scanner.has_preceding_line_break());
    }

    #[test]
    fn test_jsdoc_is_attached_to_next_token_only() {
        let source = "/** @const */ var x; var y;";
        let mut scanner = ScannerState::new(source);
        assert_eq!(scanner.scan(), SyntaxKind::VarKeyword);
        let span = scanner.get_token_jsdoc().expect("jsdoc before var");
        assert_eq!(&source[span.start as usize..span.end as usize], "/** @const */");
        scanner.scan();
        assert!(scanner.get_token_jsdoc().is_none());
        scanner.scan();
        assert_eq!(scanner.scan(), SyntaxKind::VarKeyword);
        assert!(scanner.get_token_jsdoc().is_none());
    }

    #[test]
    fn test_plain_block_comment_is_not_jsdoc() {
        let mut scanner = ScannerState::new("/* @const */ var x; /**/ y");
        scanner.scan();
        assert!(scanner.get_token_jsdoc().is_none());
        scanner.scan();
        scanner.scan();
        scanner.scan();
        assert!(scanner.get_token_jsdoc().is_none());
    }

    #[test]
    fn test_string_escapes() {
        let mut scanner = ScannerState::new(r#"'a\'b' "\x41B\n""#);
        assert_eq!(scanner.scan(), SyntaxKind::StringLiteral);
        assert_eq!(scanner.get_token_value_ref(), "a'b");
        assert_eq!(scanner.scan(), SyntaxKind::StringLiteral);
        assert_eq!(scanner.get_token_value_ref(), "AB\n");
    }

    #[test]
    fn test_numbers() {
        let mut scanner = ScannerState::new("0x1F 3.25e-2 .5");
        for expected in ["0x1F", "3.25e-2", ".5"] {
            assert_eq!(scanner.scan(), SyntaxKind::NumericLiteral);
            assert_eq!(scanner.get_token_value_ref(), expected);
        }
        assert!(scanner.get_scanner_diagnostics().is_empty());
    }

    #[test]
    fn test_save_and_restore() {
        let mut scanner = ScannerState::new("a b c");
        scanner.scan();
        let snapshot = scanner.save_state();
        scanner.scan();
        scanner.scan();
        assert_eq!(scanner.get_token_value_ref(), "c");
        scanner.restore_state(snapshot);
        assert_eq!(scanner.get_token_value_ref(), "a");
        scanner.scan();
        assert_eq!(scanner.get_token_value_ref(), "b");
    }

    #[test]
    fn test_unterminated_string_reports() {
        let mut scanner = ScannerState::new("'abc\nx");
        scanner.scan();
        assert_eq!(scanner.get_scanner_diagnostics().len(), 1);
        assert_eq!(scanner.scan(), SyntaxKind::Identifier);
    }

    #[test]
    fn test_keywords() {
        assert_eq!(tokens("arguments"), vec![SyntaxKind::Identifier]);
        assert_eq!(tokens("instanceof"), vec![SyntaxKind::InstanceOfKeyword]);
        assert!(SyntaxKind::WithKeyword.is_keyword());
        assert!(!SyntaxKind::EqualsToken.is_keyword());
        assert!(SyntaxKind::CaretEqualsToken.is_compound_assignment());
    }
}
