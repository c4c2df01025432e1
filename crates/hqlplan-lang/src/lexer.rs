//! Lexer for HQL query text using logos.
//!
//! Unlike a parser-oriented lexer, whitespace is kept as a token: the query
//! splitter rebuilds concrete queries token by token and must reproduce the
//! original text exactly around the names it rewrites.

use crate::error::{LexError, LexErrorKind};
use crate::span::Span;
use logos::Logos;

/// Token types for HQL query text.
#[derive(Logos, Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A run of whitespace.
    #[regex(r"[ \t\r\n\f]+")]
    Whitespace,

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,

    /// Single-quoted string literal; `''` escapes a quote.
    #[regex(r"'([^']|'')*'")]
    StringLiteral,

    /// Named parameter, without the leading `:`.
    #[regex(r":[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice()[1..].to_string())]
    NamedParam(String),

    /// Labelled ordinal parameter, `?1`, `?2`...
    #[regex(r"\?[0-9]+", |lex| lex.slice()[1..].parse::<u32>().ok())]
    OrdinalParam(u32),

    /// Unlabelled `?` placeholder.
    #[token("?")]
    LegacyParam,

    /// Anything else: keywords, identifiers, paths, operators, numbers.
    #[regex(r"[^ \t\r\n\f(),:?']+", |lex| lex.slice().to_string())]
    Word(String),
}

impl Token {
    /// Check if this token is whitespace.
    pub fn is_whitespace(&self) -> bool {
        matches!(self, Token::Whitespace)
    }

    /// The word text, if this is a word token.
    pub fn word(&self) -> Option<&str> {
        match self {
            Token::Word(w) => Some(w),
            _ => None,
        }
    }

    /// Check if this is a word equal to `keyword`, ignoring ASCII case.
    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.word().is_some_and(|w| w.eq_ignore_ascii_case(keyword))
    }
}

/// A token with its span in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

impl SpannedToken {
    /// The exact source text this token was lexed from.
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        &source[self.span.range()]
    }
}

/// Lexer that produces spanned tokens.
pub struct Lexer<'source> {
    inner: logos::Lexer<'source, Token>,
}

impl<'source> Lexer<'source> {
    /// Create a new lexer for the given source.
    pub fn new(source: &'source str) -> Self {
        Self {
            inner: Token::lexer(source),
        }
    }

    /// Get the next token, or the first lexing error.
    pub fn next_token(&mut self) -> Option<Result<SpannedToken, LexError>> {
        let token = self.inner.next()?;
        let span: Span = self.inner.span().into();
        Some(match token {
            Ok(token) => Ok(SpannedToken { token, span }),
            // An ordinal label too large for u32.
            Err(()) if self.inner.slice().starts_with('?') => {
                Err(LexError::new(LexErrorKind::InvalidOrdinal, span))
            }
            // Every other character except an unmatched quote starts some token.
            Err(()) => Err(LexError::new(
                LexErrorKind::UnterminatedString,
                Span::new(span.start, self.inner.source().len()),
            )),
        })
    }

    /// Get the source string.
    pub fn source(&self) -> &'source str {
        self.inner.source()
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<SpannedToken, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

/// Tokenize a source string into a vector of spanned tokens.
pub fn tokenize(source: &str) -> Result<Vec<SpannedToken>, LexError> {
    Lexer::new(source).collect()
}
