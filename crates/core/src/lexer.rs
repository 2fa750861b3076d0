//! Tokenizer for filter expressions.
//!
//! Converts the string representation of a filter into an ordered,
//! EndOfStream-terminated sequence of tokens. Comments and whitespace are
//! skipped entirely and never appear as tokens. Token text is normalized:
//! numeric literals carry the canonical decimal form of their value, string
//! literals their decoded content, identifiers their lower-cased spelling.

use serde::Serialize;

use crate::error::ParseError;

/// Distinct categories of tokens that can appear in filter text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TokenKind {
    /// A special token designating the end of the input stream.
    EndOfStream,
    /// A variable or function name.
    Identifier,
    /// A reserved word like `in` or `rlike`.
    Keyword,
    /// String literal enclosed in quotes or apostrophes.
    StringLiteral,
    /// Whole number literal; decimal, hexadecimal, octal or binary.
    IntLiteral,
    /// Literal for a number with a fractional part.
    FloatLiteral,
    /// One of the operators like `+` or `>=`.
    Operator,
    /// Left or right parenthesis: `(` or `)`.
    Parenthesis,
    /// Left or right bracket: `[` or `]`.
    SquareBracket,
    /// A comma `,`.
    Comma,
    /// A semicolon `;`.
    StatementSeparator,
}

/// One lexeme with its normalized text and source span.
///
/// Spans are half-open byte offsets into the original input. They cover the
/// lexeme as written, so a string token's span includes the quotes even
/// though its text holds only the decoded content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub start: usize,
    pub end: usize,
}

impl Token {
    fn new(kind: TokenKind, text: impl Into<String>, start: usize, end: usize) -> Self {
        Token {
            kind,
            text: text.into(),
            start,
            end,
        }
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    pub fn is_text(&self, kind: TokenKind, text: &str) -> bool {
        self.kind == kind && self.text == text
    }
}

/// Relation keywords usable as binary operators between two operands.
pub const RELATION_KEYWORDS: [&str; 7] = [
    "in", "like", "contains", "matches", "rlike", "irlike", "regex",
];
/// Keywords denoting literal values.
pub const VALUE_KEYWORDS: [&str; 3] = ["true", "false", "null"];
/// Keywords forming the if-then-else-end construct.
pub const CONDITION_KEYWORDS: [&str; 4] = ["if", "then", "else", "end"];

/// Whether `word` is reserved, checked against the exact spelling. Keyword
/// recognition is case-sensitive even though identifiers are case-folded;
/// `IF` lexes as the identifier `if`, not as a keyword.
pub fn is_keyword(word: &str) -> bool {
    RELATION_KEYWORDS.contains(&word)
        || VALUE_KEYWORDS.contains(&word)
        || CONDITION_KEYWORDS.contains(&word)
}

/// Operator lexemes, longest first so that the longest match at a position
/// always wins (`!==` before `!=` before `!`).
const OPERATORS: [&str; 22] = [
    "!==", "===", "!=", "==", "<=", ">=", ":=", "**", "=", "<", ">", "*", "/", "+", "-", "%", "&",
    "|", "^", "?", ":", "!",
];

fn is_space(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | 0x0B | 0x0C | b'\r')
}

fn is_word(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

fn followed_by_word(bytes: &[u8], index: usize) -> bool {
    index < bytes.len() && is_word(bytes[index])
}

/// Convert filter text into a token sequence ending with EndOfStream.
///
/// Never partial: either the whole input tokenizes or a lexical error is
/// returned. Lexical errors are always fatal and carry no secondary
/// diagnostics.
pub fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut offset = 0;
    loop {
        let token = next_token(input, offset)?;
        offset = token.end;
        let done = token.is(TokenKind::EndOfStream);
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

fn next_token(input: &str, start: usize) -> Result<Token, ParseError> {
    let bytes = input.as_bytes();
    let len = bytes.len();
    let mut offset = start;

    // Skip comments first, each optionally preceded by whitespace. They are
    // not tokens at all.
    loop {
        let mut probe = offset;
        while probe < len && is_space(bytes[probe]) {
            probe += 1;
        }
        if input[probe..].starts_with("/*") {
            match input[probe + 2..].find("*/") {
                Some(rel) => offset = probe + 2 + rel + 2,
                None => return Err(ParseError::lexical("Unclosed comment", probe, Some(len))),
            }
        } else {
            offset = probe;
            break;
        }
    }

    if offset >= len {
        return Ok(Token::new(TokenKind::EndOfStream, "", offset, offset));
    }

    // Punctuation
    let first = bytes[offset];
    let punctuation = match first {
        b'(' | b')' => Some(TokenKind::Parenthesis),
        b'[' | b']' => Some(TokenKind::SquareBracket),
        b',' => Some(TokenKind::Comma),
        b';' => Some(TokenKind::StatementSeparator),
        _ => None,
    };
    if let Some(kind) = punctuation {
        return Ok(Token::new(
            kind,
            &input[offset..offset + 1],
            offset,
            offset + 1,
        ));
    }

    // String literals
    if first == b'"' || first == b'\'' {
        return read_string_literal(input, offset);
    }

    // Operators
    for op in OPERATORS {
        if input[offset..].starts_with(op) {
            return Ok(Token::new(
                TokenKind::Operator,
                op,
                offset,
                offset + op.len(),
            ));
        }
    }

    // Numbers. A failed numeric parse falls through to identifier matching,
    // so `a` is never read as `0x0a` and wrong-base digits become words.
    if let Some(token) = match_number(input, offset) {
        return Ok(token);
    }

    // Identifiers and keywords. Identifiers may start with a digit at the
    // lexical level; numbers were tried first.
    let mut end = offset;
    while end < len && is_word(bytes[end]) {
        end += 1;
    }
    if end > offset {
        let word = &input[offset..end];
        if is_keyword(word) {
            return Ok(Token::new(TokenKind::Keyword, word, offset, end));
        }
        return Ok(Token::new(
            TokenKind::Identifier,
            word.to_ascii_lowercase(),
            offset,
            end,
        ));
    }

    let unexpected = input[offset..].chars().next().unwrap_or('\u{FFFD}');
    Err(ParseError::lexical(
        format!("Unexpected character '{}'", unexpected),
        offset,
        None,
    ))
}

fn match_number(input: &str, offset: usize) -> Option<Token> {
    let bytes = input.as_bytes();
    let len = bytes.len();

    // 0x / 0b / 0o integer literals. The digit run is scanned with the hex
    // class for every base; `from_str_radix` decides actual validity.
    if bytes[offset] == b'0' && offset + 1 < len {
        let base = match bytes[offset + 1] {
            b'x' => Some(16),
            b'b' => Some(2),
            b'o' => Some(8),
            _ => None,
        };
        if let Some(base) = base {
            let digits = offset + 2;
            let mut end = digits;
            while end < len && bytes[end].is_ascii_hexdigit() {
                end += 1;
            }
            if end > digits && !followed_by_word(bytes, end) {
                let value = i64::from_str_radix(&input[digits..end], base).ok()?;
                return Some(Token::new(
                    TokenKind::IntLiteral,
                    value.to_string(),
                    offset,
                    end,
                ));
            }
        }
    }

    // Decimal literals: `123`, `123.45`, `.45` — never followed by another
    // word character. When a word character does follow, the match backtracks
    // to the bare integer part if there is one, so `123.45abc` lexes as the
    // integer 123 stopping before the dot.
    let mut end = offset;
    while end < len && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let int_end = end;
    let mut fraction = false;
    if end < len && bytes[end] == b'.' {
        if int_end > offset {
            fraction = true;
            end += 1;
            while end < len && bytes[end].is_ascii_digit() {
                end += 1;
            }
        } else if end + 1 < len && bytes[end + 1].is_ascii_digit() {
            fraction = true;
            end += 1;
            while end < len && bytes[end].is_ascii_digit() {
                end += 1;
            }
        }
    }
    if int_end == offset && !fraction {
        return None;
    }
    if followed_by_word(bytes, end) {
        if fraction && int_end > offset {
            end = int_end;
            fraction = false;
        } else {
            return None;
        }
    }

    let text = &input[offset..end];
    if fraction {
        let value: f64 = text.parse().ok()?;
        if !value.is_finite() {
            return None;
        }
        return Some(Token::new(
            TokenKind::FloatLiteral,
            value.to_string(),
            offset,
            end,
        ));
    }
    let value: i64 = text.parse().ok()?;
    Some(Token::new(
        TokenKind::IntLiteral,
        value.to_string(),
        offset,
        end,
    ))
}

fn hex_value(byte: u8) -> u8 {
    match byte {
        b'0'..=b'9' => byte - b'0',
        b'a'..=b'f' => byte - b'a' + 10,
        _ => byte - b'A' + 10,
    }
}

/// Read a string literal starting at the opening quote.
///
/// Unrecognized escapes are kept verbatim, they are not errors.
fn read_string_literal(input: &str, start: usize) -> Result<Token, ParseError> {
    let bytes = input.as_bytes();
    let len = bytes.len();
    let quote = bytes[start];
    let mut content = String::new();
    let mut offset = start + 1;

    while offset < len {
        let byte = bytes[offset];
        if byte == quote {
            return Ok(Token::new(
                TokenKind::StringLiteral,
                content,
                start,
                offset + 1,
            ));
        }
        if byte == b'\\' {
            if offset + 1 >= len {
                // Unmatched escape at the end of the input
                break;
            }
            let next = bytes[offset + 1];
            let mut consumed = 2;
            match next {
                b'\\' => content.push('\\'),
                b'n' => content.push('\n'),
                b'r' => content.push('\r'),
                b't' => content.push('\t'),
                _ if next == quote => content.push(char::from(quote)),
                b'x' => {
                    // The full `\xAB` sequence must fit in the input
                    if offset + 3 < len
                        && bytes[offset + 2].is_ascii_hexdigit()
                        && bytes[offset + 3].is_ascii_hexdigit()
                    {
                        let value = hex_value(bytes[offset + 2]) << 4 | hex_value(bytes[offset + 3]);
                        content.push(char::from(value));
                        consumed = 4;
                    } else {
                        content.push_str("\\x");
                    }
                }
                _ => {
                    content.push('\\');
                    if let Some(escaped) = input[offset + 1..].chars().next() {
                        content.push(escaped);
                        consumed = 1 + escaped.len_utf8();
                    }
                }
            }
            offset += consumed;
        } else {
            // Copy the whole run up to the next escape or closing quote
            let mut chunk_end = offset;
            while chunk_end < len && bytes[chunk_end] != b'\\' && bytes[chunk_end] != quote {
                chunk_end += 1;
            }
            content.push_str(&input[offset..chunk_end]);
            offset = chunk_end;
        }
    }

    Err(ParseError::lexical(
        "Unclosed string literal",
        start,
        Some(len),
    ))
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn single(src: &str) -> Token {
        let tokens = tokenize(src).expect("tokenize should succeed");
        assert_eq!(tokens.len(), 2, "expected one token plus EndOfStream");
        tokens.into_iter().next().expect("first token")
    }

    #[test]
    fn empty_input_is_a_lone_end_of_stream() {
        let tokens = tokenize("").expect("tokenize should succeed");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::EndOfStream);
        assert_eq!((tokens[0].start, tokens[0].end), (0, 0));
    }

    #[test]
    fn punctuation_kinds_and_spans() {
        let tokens = tokenize("(a, b);").expect("tokenize should succeed");
        let expected = [
            (TokenKind::Parenthesis, "(", 0, 1),
            (TokenKind::Identifier, "a", 1, 2),
            (TokenKind::Comma, ",", 2, 3),
            (TokenKind::Identifier, "b", 4, 5),
            (TokenKind::Parenthesis, ")", 5, 6),
            (TokenKind::StatementSeparator, ";", 6, 7),
            (TokenKind::EndOfStream, "", 7, 7),
        ];
        assert_eq!(tokens.len(), expected.len());
        for (token, (kind, text, start, end)) in tokens.iter().zip(expected) {
            assert_eq!(token.kind, kind);
            assert_eq!(token.text, text);
            assert_eq!((token.start, token.end), (start, end));
        }
    }

    #[test]
    fn numeric_literals_are_normalized() {
        let token = single("0x1A");
        assert_eq!(token.kind, TokenKind::IntLiteral);
        assert_eq!(token.text, "26");
        assert_eq!((token.start, token.end), (0, 4));

        assert_eq!(single("0b101").text, "5");
        assert_eq!(single("0o17").text, "15");
        assert_eq!(single("007").text, "7");

        let token = single("3.0");
        assert_eq!(token.kind, TokenKind::FloatLiteral);
        assert_eq!(token.text, "3");

        let token = single(".5");
        assert_eq!(token.kind, TokenKind::FloatLiteral);
        assert_eq!(token.text, "0.5");

        let token = single("123.");
        assert_eq!(token.kind, TokenKind::FloatLiteral);
        assert_eq!(token.text, "123");
    }

    #[test]
    fn wrong_base_digits_fall_back_to_identifiers() {
        let token = single("0b12");
        assert_eq!(token.kind, TokenKind::Identifier);
        assert_eq!(token.text, "0b12");

        let token = single("0x");
        assert_eq!(token.kind, TokenKind::Identifier);
        assert_eq!(token.text, "0x");
    }

    #[test]
    fn number_followed_by_word_characters_is_an_identifier() {
        let token = single("123abc");
        assert_eq!(token.kind, TokenKind::Identifier);
        assert_eq!(token.text, "123abc");
    }

    #[test]
    fn fractional_match_backtracks_to_the_integer_part() {
        // `123.45abc` lexes as the integer 123; the dot then has nowhere to
        // go and the input is rejected as a whole.
        let error = tokenize("123.45abc").expect_err("dot should be rejected");
        assert!(error.message.contains("Unexpected character"));
        assert_eq!(error.from, 3);
    }

    #[test]
    fn keywords_are_case_sensitive_identifiers_fold() {
        assert_eq!(single("if").kind, TokenKind::Keyword);
        assert_eq!(single("rlike").kind, TokenKind::Keyword);

        let token = single("IF");
        assert_eq!(token.kind, TokenKind::Identifier);
        assert_eq!(token.text, "if");

        let token = single("PageTitle");
        assert_eq!(token.kind, TokenKind::Identifier);
        assert_eq!(token.text, "pagetitle");
    }

    #[test]
    fn operators_prefer_the_longest_match() {
        let tokens = tokenize("a!==b").expect("tokenize should succeed");
        assert_eq!(tokens[1].kind, TokenKind::Operator);
        assert_eq!(tokens[1].text, "!==");

        let tokens = tokenize("x:=2**3").expect("tokenize should succeed");
        assert_eq!(tokens[1].text, ":=");
        assert_eq!(tokens[3].text, "**");

        let tokens = tokenize("!x").expect("tokenize should succeed");
        assert_eq!(tokens[0].text, "!");
    }

    #[test]
    fn string_escapes_decode() {
        let token = single(r"'a\nb'");
        assert_eq!(token.kind, TokenKind::StringLiteral);
        assert_eq!(token.text, "a\nb");
        assert_eq!((token.start, token.end), (0, 6));

        assert_eq!(single(r"'\x41'").text, "A");
        assert_eq!(single(r"'\xZZ'").text, "\\xZZ");
        assert_eq!(single(r"'\q'").text, "\\q");
        assert_eq!(single(r"'it\'s'").text, "it's");
    }

    #[test]
    fn unclosed_string_spans_to_end_of_input() {
        let error = tokenize("'abc").expect_err("string is unclosed");
        assert_eq!(error.message, "Unclosed string literal");
        assert_eq!(error.from, 0);
        assert_eq!(error.to, Some(4));

        // A trailing escape cannot close the literal either.
        let error = tokenize(r"'abc\").expect_err("string is unclosed");
        assert_eq!(error.message, "Unclosed string literal");
    }

    #[test]
    fn comments_are_skipped_and_unclosed_comments_fail() {
        let tokens = tokenize("/* a */ /* b */ 1").expect("tokenize should succeed");
        assert_eq!(tokens[0].kind, TokenKind::IntLiteral);
        assert_eq!(tokens[0].start, 16);

        let error = tokenize("1 + /* x").expect_err("comment is unclosed");
        assert_eq!(error.message, "Unclosed comment");
        assert_eq!(error.from, 4);
        assert_eq!(error.to, Some(8));
    }

    #[test]
    fn unexpected_characters_fail_with_their_offset() {
        let error = tokenize("1 @ 2").expect_err("at-sign is not lexable");
        assert!(error.message.contains("Unexpected character"));
        assert_eq!(error.from, 2);
        assert_eq!(error.to, None);
    }

    #[test]
    fn spans_are_strictly_increasing() {
        let src = "x := /* gap */ 'value' ; 2";
        let tokens = tokenize(src).expect("tokenize should succeed");
        let mut previous_end = 0;
        for token in &tokens {
            assert!(token.start >= previous_end);
            assert!(token.end >= token.start);
            previous_end = token.end;
        }
        assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::EndOfStream));
    }
}
