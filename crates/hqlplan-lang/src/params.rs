//! Recognition of query parameters and their source locations.

use std::collections::BTreeMap;

use crate::error::{LexError, LexErrorKind};
use crate::lexer::{Lexer, Token};

/// Parameters found in a query string.
///
/// Source locations are byte offsets of the `:` or `?` that introduces each
/// occurrence. Occurrences inside string literals are not parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecognizedParameters {
    named: BTreeMap<String, Vec<usize>>,
    ordinal: BTreeMap<u32, Vec<usize>>,
}

impl RecognizedParameters {
    /// Named parameters with their source locations.
    pub fn named(&self) -> &BTreeMap<String, Vec<usize>> {
        &self.named
    }

    /// Ordinal parameters (by 1-based label) with their source locations.
    pub fn ordinal(&self) -> &BTreeMap<u32, Vec<usize>> {
        &self.ordinal
    }

    /// Check if no parameters were found.
    pub fn is_empty(&self) -> bool {
        self.named.is_empty() && self.ordinal.is_empty()
    }
}

/// Scan `query` for named (`:name`) and ordinal (`?N`) parameters.
pub fn recognize_parameters(query: &str) -> Result<RecognizedParameters, LexError> {
    let mut recognized = RecognizedParameters::default();

    for token in Lexer::new(query) {
        let token = token?;
        match token.token {
            Token::NamedParam(name) => {
                recognized
                    .named
                    .entry(name)
                    .or_default()
                    .push(token.span.start);
            }
            Token::OrdinalParam(0) => {
                return Err(LexError::new(LexErrorKind::InvalidOrdinal, token.span));
            }
            Token::OrdinalParam(label) => {
                recognized
                    .ordinal
                    .entry(label)
                    .or_default()
                    .push(token.span.start);
            }
            Token::LegacyParam => {
                return Err(LexError::new(
                    LexErrorKind::LegacyPositionalParameter,
                    token.span,
                ));
            }
            _ => {}
        }
    }

    Ok(recognized)
}
