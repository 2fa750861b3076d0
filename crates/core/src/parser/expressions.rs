//! The expression half of the precedence ladder, levels 3 through 13.

use super::ParseContext;
use crate::error::{ParseError, Severity};
use crate::lexer::{is_keyword, Token, TokenKind, RELATION_KEYWORDS, VALUE_KEYWORDS};

/// Logical connectives, the lowest-binding operator tier.
const LOGICAL_OPS: [&str; 3] = ["&", "|", "^"];
/// Comparison classes. A chain may use at most one operator of each class.
const EQUALITY_OPS: [&str; 5] = ["==", "===", "!=", "!==", "="];
const ORDER_OPS: [&str; 4] = ["<", ">", "<=", ">="];
/// All arithmetic shares a single precedence tier.
const ARITHMETIC_OPS: [&str; 6] = ["+", "-", "*", "/", "%", "**"];
const UNARY_OPS: [&str; 2] = ["+", "-"];

impl<'a> ParseContext<'a> {
    // -- Level 3: conditions ------------------------------------

    /// Either the full `if <4> then <3> [else <3>] end` form or a bare
    /// level-4 expression optionally followed by `? <3> : <3>`. The two
    /// forms are mutually exclusive per call.
    pub(super) fn level_conditions(&mut self) -> Result<Option<Token>, ParseError> {
        self.enter_nested()?;
        let result = self.conditions_inner();
        self.leave_nested();
        result
    }

    fn conditions_inner(&mut self) -> Result<Option<Token>, ParseError> {
        if self.check_keyword("if") {
            self.advance();
            self.level_logical()?;
            if !self.check_keyword("then") {
                return Err(self.expected_not_found("then"));
            }
            self.advance();
            self.level_conditions()?;
            if self.check_keyword("else") {
                self.advance();
                self.level_conditions()?;
            }
            if !self.check_keyword("end") {
                return Err(self.expected_not_found("end"));
            }
            self.advance();
            return Ok(None);
        }

        let condition = self.level_logical()?;
        if self.check_operator("?") {
            self.advance();
            self.level_conditions()?;
            if !self.check_operator(":") {
                return Err(self.expected_not_found(":"));
            }
            self.advance();
            self.level_conditions()?;
            return Ok(None);
        }
        Ok(condition)
    }

    // -- Levels 4-6: binary operator chains ---------------------

    fn level_logical(&mut self) -> Result<Option<Token>, ParseError> {
        let mut operand = self.level_comparison()?;
        while self.check_operator_in(&LOGICAL_OPS) {
            operand = None;
            self.advance();
            self.level_comparison()?;
        }
        Ok(operand)
    }

    /// At most one equality-class and one order-class operator may appear
    /// in a single chain, in either order: `a < b == c` is legal,
    /// `a < b < c` is rejected at the second `<`.
    fn level_comparison(&mut self) -> Result<Option<Token>, ParseError> {
        let mut operand = self.level_arithmetic()?;
        let mut equality_allowed = true;
        let mut order_allowed = true;
        loop {
            if equality_allowed && self.check_operator_in(&EQUALITY_OPS) {
                equality_allowed = false;
            } else if order_allowed && self.check_operator_in(&ORDER_OPS) {
                order_allowed = false;
            } else {
                break;
            }
            operand = None;
            self.advance();
            self.level_arithmetic()?;
        }
        Ok(operand)
    }

    fn level_arithmetic(&mut self) -> Result<Option<Token>, ParseError> {
        let mut operand = self.level_negation()?;
        while self.check_operator_in(&ARITHMETIC_OPS) {
            operand = None;
            self.advance();
            self.level_negation()?;
        }
        Ok(operand)
    }

    // -- Level 7: boolean negation ------------------------------

    fn level_negation(&mut self) -> Result<Option<Token>, ParseError> {
        if self.check_operator("!") {
            self.advance();
            self.level_relation()?;
            return Ok(None);
        }
        self.level_relation()
    }

    // -- Level 8: keyword relations -----------------------------

    fn level_relation(&mut self) -> Result<Option<Token>, ParseError> {
        let operand = self.level_unary()?;
        if self.check_keyword_in(&RELATION_KEYWORDS) {
            self.advance();
            self.level_unary()?;
            return Ok(None);
        }
        Ok(operand)
    }

    // -- Level 9: unary arithmetic ------------------------------

    fn level_unary(&mut self) -> Result<Option<Token>, ParseError> {
        if self.check_operator_in(&UNARY_OPS) {
            self.advance();
            self.level_indexing()?;
            return Ok(None);
        }
        self.level_indexing()
    }

    // -- Level 10: postfix indexing -----------------------------

    fn level_indexing(&mut self) -> Result<Option<Token>, ParseError> {
        let mut operand = self.level_parenthesized()?;
        while self.check_text(TokenKind::SquareBracket, "[") {
            operand = None;
            self.advance();
            if !self.check_text(TokenKind::SquareBracket, "]") {
                self.level_statements()?;
                if !self.check_text(TokenKind::SquareBracket, "]") {
                    return Err(self.expected_not_found("]"));
                }
            }
            self.advance();
        }
        Ok(operand)
    }

    // -- Level 11: parentheses ----------------------------------

    fn level_parenthesized(&mut self) -> Result<Option<Token>, ParseError> {
        if self.check_text(TokenKind::Parenthesis, "(") {
            // Empty parentheses are never allowed, unlike empty statements.
            if self.peek_next().is_text(TokenKind::Parenthesis, ")") {
                self.advance();
                return Err(self.unexpected_token());
            }
            self.advance();
            let result = self.level_statements()?;
            if !self.check_text(TokenKind::Parenthesis, ")") {
                return Err(self.expected_not_found(")"));
            }
            self.advance();
            return Ok(result);
        }
        self.level_call()
    }

    // -- Level 12: function calls -------------------------------

    fn level_call(&mut self) -> Result<Option<Token>, ParseError> {
        if self.check(TokenKind::Identifier)
            && self.peek_next().is_text(TokenKind::Parenthesis, "(")
        {
            let callee = self.current().clone();
            if self.dialect.knows_function(&callee.text) == Some(false) {
                self.report(&callee, "unrecognized function", None);
            }
            self.advance();
            if self.peek_next().is_text(TokenKind::Parenthesis, ")") {
                self.advance();
            } else {
                // `set`/`set_var` declare a variable through their first
                // argument when that argument is a bare string literal.
                let mut set_flag = callee.text == "set" || callee.text == "set_var";
                loop {
                    self.advance();
                    let argument = self.level_statements()?;
                    if set_flag {
                        set_flag = false;
                        if let Some(argument) = argument {
                            if argument.is(TokenKind::StringLiteral) {
                                let mut declared = argument;
                                declared.kind = TokenKind::Identifier;
                                declared.text = declared.text.to_lowercase();
                                if !self.flag_assign_to_internal(&declared) {
                                    self.locals.insert(declared.text);
                                }
                            }
                        }
                    }
                    if !self.check(TokenKind::Comma) {
                        break;
                    }
                }
                if !self.check_text(TokenKind::Parenthesis, ")") {
                    return Err(self.expected_not_found(")"));
                }
            }
            self.advance();
            return Ok(None);
        }
        self.level_atom()
    }

    // -- Level 13: atoms ----------------------------------------

    fn level_atom(&mut self) -> Result<Option<Token>, ParseError> {
        let token = self.current().clone();
        match token.kind {
            TokenKind::Identifier => {
                let name = token.text.as_str();
                if self.dialect.is_disabled(name) {
                    self.report(&token, "use of disabled", None);
                } else if self.dialect.is_deprecated(name) {
                    self.report(&token, "use of deprecated", Some(Severity::Warning));
                } else if self.dialect.knows_function(name) == Some(true) || is_keyword(name) {
                    self.report(&token, "incorrect use of internal", None);
                } else if self.dialect.knows_variable(name) == Some(false)
                    && !self.locals.contains(name)
                {
                    // Neither a known global nor a declared local: abort.
                    return Err(self.fatal_at(&token, "undefined"));
                }
            }
            TokenKind::StringLiteral | TokenKind::FloatLiteral | TokenKind::IntLiteral => {}
            TokenKind::Keyword => {
                if !VALUE_KEYWORDS.contains(&token.text.as_str()) {
                    return Err(self.fatal_at(&token, "unrecognized"));
                }
            }
            TokenKind::SquareBracket if token.text == "[" => {
                // Array literal; `[]` and a trailing comma are both fine.
                loop {
                    self.advance();
                    if self.check_text(TokenKind::SquareBracket, "]") {
                        break;
                    }
                    self.level_assignment()?;
                    if self.check_text(TokenKind::SquareBracket, "]") {
                        break;
                    }
                    if !self.check(TokenKind::Comma) {
                        return Err(self.fatal("expected ',' or ']' instead of"));
                    }
                }
            }
            _ => return Err(self.unexpected_token()),
        }
        self.advance();
        Ok(if token.kind == TokenKind::StringLiteral {
            Some(token)
        } else {
            None
        })
    }
}
