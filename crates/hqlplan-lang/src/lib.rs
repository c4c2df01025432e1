//! HQL lexing for hqlplan.
//!
//! This crate tokenizes HQL query text without discarding anything, so that
//! callers can rewrite individual names and reassemble the query verbatim,
//! and recognizes named (`:name`) and ordinal (`?1`) parameters.
//!
//! # Usage
//!
//! ```rust
//! use hqlplan_lang::{recognize_parameters, tokenize};
//!
//! let tokens = tokenize("from Animal a where a.name = :name").unwrap();
//! assert_eq!(tokens.len(), 13);
//!
//! let params = recognize_parameters("from Animal a where a.name = :name").unwrap();
//! assert!(params.named().contains_key("name"));
//! ```

pub mod error;
pub mod lexer;
pub mod params;
pub mod span;

pub use error::{LexError, LexErrorKind};
pub use lexer::{tokenize, Lexer, SpannedToken, Token};
pub use params::{recognize_parameters, RecognizedParameters};
pub use span::Span;
