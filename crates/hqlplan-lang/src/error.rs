//! Error types for lexing query text.

use crate::span::{offset_to_line_col, Span};
use thiserror::Error;

/// Kind of lexing failure, for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexErrorKind {
    /// A `'` opened a string literal that never closes.
    UnterminatedString,
    /// A bare `?` placeholder without an ordinal label.
    LegacyPositionalParameter,
    /// An ordinal label of `?0` or one too large for `u32`.
    InvalidOrdinal,
}

/// Error raised while tokenizing query text.
#[derive(Debug, Clone, Error)]
pub struct LexError {
    /// What went wrong.
    pub kind: LexErrorKind,
    /// Source span where the error occurred.
    pub span: Span,
    /// Optional hint for fixing the error.
    pub hint: Option<String>,
}

impl std::fmt::Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            LexErrorKind::UnterminatedString => {
                write!(f, "unterminated string literal at offset {}", self.span.start)
            }
            LexErrorKind::LegacyPositionalParameter => write!(
                f,
                "legacy-style positional parameter `?` at offset {}",
                self.span.start
            ),
            LexErrorKind::InvalidOrdinal => write!(
                f,
                "invalid ordinal parameter label at offset {}: labels run from 1 to {}",
                self.span.start,
                u32::MAX
            ),
        }
    }
}

impl LexError {
    /// Create a new lex error.
    pub fn new(kind: LexErrorKind, span: Span) -> Self {
        let hint = match kind {
            LexErrorKind::LegacyPositionalParameter => {
                Some("use labelled ordinal parameters such as `?1`".to_string())
            }
            _ => None,
        };
        Self { kind, span, hint }
    }

    /// Format the error with source context.
    pub fn format_with_source(&self, source: &str) -> String {
        let (line, col) = offset_to_line_col(source, self.span.start);
        let mut result = format!("error: {}\n", self);
        result.push_str(&format!("  --> line {}:{}\n", line, col));

        if let Some(source_line) = source.lines().nth(line - 1) {
            result.push_str(&format!("   |\n{:3}| {}\n   |", line, source_line));
            for _ in 0..col {
                result.push(' ');
            }
            result.push('^');
            result.push('\n');
        }

        if let Some(hint) = &self.hint {
            result.push_str(&format!("   = hint: {}\n", hint));
        }

        result
    }
}
