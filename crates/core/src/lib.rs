//! sift-core: validating recognizer for content-moderation filter
//! expressions.
//!
//! A filter author writes a boolean/arithmetic/string expression referencing
//! platform-supplied variables and functions; before the expression is saved
//! or executed it must be syntactically valid and must reference only
//! identifiers the current site configuration (the [`Dialect`]) actually
//! recognizes. This crate tokenizes the raw text, walks a fifteen-level
//! operator-precedence grammar with speculative sub-parses, cross-checks
//! identifiers against the dialect, and reports a single [`ParseError`]
//! carrying any secondary diagnostics collected along the way. No syntax
//! tree is built and no filter is executed.
//!
//! # Public API
//!
//! - [`analyze()`] -- tokenize and validate a filter in one call
//! - [`tokenize()`] -- produce the EndOfStream-terminated token sequence
//! - [`Parser`] -- the recognizer, reusable across calls and callers
//! - [`Dialect`] -- site configuration of known identifiers
//! - [`ParseError`], [`Severity`] -- the diagnostic model
//! - [`Token`], [`TokenKind`] -- lexemes with normalized text and spans

pub mod dialect;
pub mod error;
pub mod lexer;
pub mod parser;

pub use dialect::Dialect;
pub use error::{ParseError, Severity};
pub use lexer::{tokenize, Token, TokenKind};
pub use parser::{Parser, DEFAULT_MAX_DEPTH};

/// Validate a filter expression against a dialect.
///
/// Success means the filter parsed and every referenced identifier is
/// acceptable. The error case carries the primary diagnostic with any
/// advisory findings from the same parse attached as
/// [`ParseError::warnings`]; callers distinguish hard failures from
/// advisory ones via [`ParseError::severity`].
pub fn analyze(filter_text: &str, dialect: &Dialect) -> Result<(), ParseError> {
    let tokens = lexer::tokenize(filter_text)?;
    parser::Parser::new(dialect).parse(&tokens)
}
