//! Recursive-descent recognizer for the filter grammar.
//!
//! The grammar is a strict precedence ladder; each level delegates to the
//! next when its own construct does not match. The parser recognizes and
//! validates — it builds no syntax tree. Assignment detection is a
//! speculative parse: the cursor position is snapshotted, the assignment
//! shape is tried, and on mismatch the cursor rolls back and the identifier
//! is reparsed as a plain expression. Diagnostics recorded during a rolled
//! back attempt are deliberately retained.

use std::collections::BTreeSet;

use crate::dialect::Dialect;
use crate::error::{ParseError, Severity};
use crate::lexer::{is_keyword, Token, TokenKind};

mod expressions;

/// Default cap on nesting depth. Filter text comes from untrusted authors,
/// so recursion is bounded instead of tracking the call stack.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Validating parser for a fixed dialect.
///
/// The parser itself holds only the dialect and the depth limit; every
/// [`Parser::parse`] call builds its own working state, so a single value is
/// safely reentrant from multiple callers.
#[derive(Debug, Clone, Copy)]
pub struct Parser<'d> {
    dialect: &'d Dialect,
    max_depth: usize,
}

impl<'d> Parser<'d> {
    pub fn new(dialect: &'d Dialect) -> Self {
        Parser {
            dialect,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Replace the nesting depth limit. Exceeding the limit fails the parse
    /// with a "too deeply nested" error.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Recognize a token sequence produced by [`crate::lexer::tokenize`].
    ///
    /// Success means the filter is valid under this dialect. On failure the
    /// error is the primary diagnostic, with any other diagnostics recorded
    /// during the same parse attached as its `warnings`.
    pub fn parse(&self, tokens: &[Token]) -> Result<(), ParseError> {
        if tokens.is_empty() {
            return Ok(());
        }
        ParseContext::new(tokens, self.dialect, self.max_depth).run()
    }
}

/// Mutable state for one parse: cursor, declared locals, recorded
/// diagnostics and the nesting depth counter. Built fresh per parse and
/// discarded on return.
struct ParseContext<'a> {
    tokens: &'a [Token],
    pos: usize,
    dialect: &'a Dialect,
    locals: BTreeSet<String>,
    diagnostics: Vec<ParseError>,
    depth: usize,
    max_depth: usize,
}

impl<'a> ParseContext<'a> {
    fn new(tokens: &'a [Token], dialect: &'a Dialect, max_depth: usize) -> Self {
        ParseContext {
            tokens,
            pos: 0,
            dialect,
            locals: BTreeSet::new(),
            diagnostics: Vec::new(),
            depth: 0,
            max_depth,
        }
    }

    /// Level 0: the whole filter is a single statement list followed by the
    /// end of the stream. Afterwards the last recorded diagnostic, if any,
    /// becomes the primary error and the rest ride along as warnings.
    fn run(mut self) -> Result<(), ParseError> {
        self.level_statements()?;
        if !self.check(TokenKind::EndOfStream) {
            return Err(self.unexpected_token());
        }
        match self.diagnostics.pop() {
            None => Ok(()),
            Some(mut primary) => {
                primary.warnings = std::mem::take(&mut self.diagnostics);
                Err(primary)
            }
        }
    }

    // -- Cursor primitives ----------------------------------------

    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_next(&self) -> &Token {
        &self.tokens[(self.pos + 1).min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
    }

    /// The save point for speculative parses is the integer cursor position
    /// only; tokens are immutable and randomly addressable.
    fn snapshot(&self) -> usize {
        self.pos
    }

    fn restore(&mut self, snapshot: usize) {
        self.pos = snapshot;
    }

    // -- Token predicates -----------------------------------------

    fn check(&self, kind: TokenKind) -> bool {
        self.current().is(kind)
    }

    fn check_text(&self, kind: TokenKind, text: &str) -> bool {
        self.current().is_text(kind, text)
    }

    fn check_operator(&self, op: &str) -> bool {
        self.check_text(TokenKind::Operator, op)
    }

    fn check_operator_in(&self, ops: &[&str]) -> bool {
        self.check(TokenKind::Operator) && ops.contains(&self.current().text.as_str())
    }

    fn check_keyword(&self, word: &str) -> bool {
        self.check_text(TokenKind::Keyword, word)
    }

    fn check_keyword_in(&self, words: &[&str]) -> bool {
        self.check(TokenKind::Keyword) && words.contains(&self.current().text.as_str())
    }

    // -- Diagnostics ------------------------------------------------

    fn exception(&self, token: &Token, message: &str, severity: Option<Severity>) -> ParseError {
        let mut text = format!("{} {:?}", message, token.kind);
        if !token.text.is_empty() {
            text.push_str(&format!(" \"{}\"", token.text));
        }
        ParseError::new(text, token.start, Some(token.end)).with_severity(severity)
    }

    /// Record a non-fatal diagnostic and keep parsing.
    fn report(&mut self, token: &Token, message: &str, severity: Option<Severity>) {
        let error = self.exception(token, message, severity);
        self.diagnostics.push(error);
    }

    /// Fatal error at `token`. Fatal errors bypass the diagnostics list and
    /// carry whatever was recorded so far as their warnings.
    fn fatal_at(&mut self, token: &Token, message: &str) -> ParseError {
        let mut error = self.exception(token, message, None);
        error.warnings = std::mem::take(&mut self.diagnostics);
        error
    }

    fn fatal(&mut self, message: &str) -> ParseError {
        let token = self.current().clone();
        self.fatal_at(&token, message)
    }

    fn unexpected_token(&mut self) -> ParseError {
        self.fatal("unexpected")
    }

    fn expected_not_found(&mut self, expected: &str) -> ParseError {
        let message = format!("expected '{}' instead of", expected);
        self.fatal(&message)
    }

    // -- Semantic checks --------------------------------------------

    /// Assignment targets may not shadow dialect names or keywords.
    fn flag_assign_to_internal(&mut self, token: &Token) -> bool {
        if self.dialect.lists(&token.text) || is_keyword(&token.text) {
            self.report(token, "assign to internal", None);
            return true;
        }
        false
    }

    /// Indexed assignment requires an already-declared local.
    fn flag_undefined_local(&mut self, token: &Token) -> bool {
        if !self.locals.contains(&token.text) {
            self.report(token, "undefined local", Some(Severity::Warning));
            return true;
        }
        false
    }

    // -- Nesting guard ----------------------------------------------

    fn enter_nested(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(self.fatal("too deeply nested"));
        }
        Ok(())
    }

    fn leave_nested(&mut self) {
        self.depth -= 1;
    }

    // -- Level 1: statement list --------------------------------

    /// One or more statements separated by `;`. Empty statements are
    /// allowed; the list stops, without consuming, on the end of the stream
    /// or a closing parenthesis.
    ///
    /// Like every level, returns the statement's token when the parsed text
    /// degenerates to a single string literal — the function-call level uses
    /// this to spot `set('name', ...)` declarations.
    fn level_statements(&mut self) -> Result<Option<Token>, ParseError> {
        self.enter_nested()?;
        let result = self.statements_inner();
        self.leave_nested();
        result
    }

    fn statements_inner(&mut self) -> Result<Option<Token>, ParseError> {
        let mut statement = None;
        loop {
            if self.check(TokenKind::EndOfStream) || self.check_text(TokenKind::Parenthesis, ")") {
                break;
            }
            if self.check(TokenKind::StatementSeparator) {
                self.advance();
                continue;
            }
            statement = self.level_assignment()?;
            if !self.check(TokenKind::StatementSeparator) {
                break;
            }
            self.advance();
        }
        Ok(statement)
    }

    // -- Level 2: assignment ------------------------------------

    /// Speculative assignment parse: `ident := <2>` or
    /// `ident [ <1 or empty> ] := <2>`. When neither form matches, the
    /// cursor rolls back and the identifier is treated as a plain
    /// expression. Simple assignment declares its target; indexed
    /// assignment requires the target to exist already.
    fn level_assignment(&mut self) -> Result<Option<Token>, ParseError> {
        self.enter_nested()?;
        let result = self.assignment_inner();
        self.leave_nested();
        result
    }

    fn assignment_inner(&mut self) -> Result<Option<Token>, ParseError> {
        if self.check(TokenKind::Identifier) {
            let snapshot = self.snapshot();
            let target = self.current().clone();
            self.advance();

            if self.check_operator(":=") {
                if !self.flag_assign_to_internal(&target) {
                    self.locals.insert(target.text.clone());
                }
                self.advance();
                self.level_assignment()?;
                return Ok(None);
            }

            if self.check_text(TokenKind::SquareBracket, "[") {
                self.advance();
                // An empty index is tolerated: `a[] := 1` appends.
                if !self.check_text(TokenKind::SquareBracket, "]") {
                    self.level_statements()?;
                    if !self.check_text(TokenKind::SquareBracket, "]") {
                        return Err(self.expected_not_found("]"));
                    }
                }
                self.advance();
                if self.check_operator(":=") {
                    if !self.flag_assign_to_internal(&target) {
                        self.flag_undefined_local(&target);
                    }
                    self.advance();
                    self.level_assignment()?;
                    return Ok(None);
                }
            }

            // No assignment found: roll back and reparse as an expression.
            self.restore(snapshot);
        }
        self.level_conditions()
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
