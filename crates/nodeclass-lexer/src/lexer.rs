//! Query lexer: converts an expression string to a token stream.
//!
//! Expressions are single-line; newlines count as whitespace. Errors are
//! collected (up to [`nodeclass_types::MAX_ERRORS`]) rather than stopping at
//! the first one, so a bad filter reports everything wrong with it at once.

use nodeclass_types::{ErrorCode, ExprError, ExprErrors, Span};

use crate::token::{Token, TokenKind};

/// The query lexer.
pub struct Lexer<'src> {
    /// The full expression text.
    source: &'src str,
    /// The expression as characters; `pos` indexes this.
    chars: Vec<char>,
    /// Current character offset (0-based). Column is `pos + 1`.
    pos: usize,
    errors: ExprErrors,
}

/// Result of lexing: tokens + any errors collected.
pub struct LexResult {
    /// The token stream (always ends with [`TokenKind::Eof`]).
    pub tokens: Vec<Token>,
    pub errors: ExprErrors,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            pos: 0,
            errors: ExprErrors::empty(),
        }
    }

    /// Lex the entire expression into a token stream.
    pub fn lex(mut self) -> LexResult {
        let mut tokens = Vec::new();
        loop {
            if self.errors.is_full() {
                break;
            }
            let token = self.scan_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        if tokens.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            tokens.push(Token::new(TokenKind::Eof, self.current_span()));
        }

        LexResult {
            tokens,
            errors: self.errors,
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Character-level helpers
    // ─────────────────────────────────────────────────────────────

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        Some(ch)
    }

    fn col(&self) -> u32 {
        self.pos as u32 + 1
    }

    fn current_span(&self) -> Span {
        Span::point(self.col())
    }

    /// Span from `start_col` through the last consumed character.
    fn span_from(&self, start_col: u32) -> Span {
        Span::new(start_col, (self.col() - 1).max(start_col))
    }

    fn emit_error(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        let err = ExprError::new(code, message, span, self.source);
        self.errors.push_error(err);
    }

    fn emit_error_with_suggestion(
        &mut self,
        code: ErrorCode,
        message: impl Into<String>,
        span: Span,
        suggestion: impl Into<String>,
    ) {
        let err = ExprError::new(code, message, span, self.source).with_suggestion(suggestion);
        self.errors.push_error(err);
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    fn single(&mut self, kind: TokenKind, start_col: u32) -> Token {
        Token::new(kind, self.span_from(start_col))
    }

    /// Consume `next` if present and return `two`, else return `one`.
    fn one_or_two(&mut self, next: char, two: TokenKind, one: TokenKind, start_col: u32) -> Token {
        if self.peek() == Some(next) {
            self.advance();
            self.single(two, start_col)
        } else {
            self.single(one, start_col)
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Scanning
    // ─────────────────────────────────────────────────────────────

    /// Next token, skipping past characters that only produce errors.
    ///
    /// Once the error list is full the rest of the input is abandoned and
    /// `Eof` is returned.
    fn scan_token(&mut self) -> Token {
        loop {
            if let Some(token) = self.scan_one() {
                return token;
            }
            if self.errors.is_full() {
                return Token::new(TokenKind::Eof, self.current_span());
            }
        }
    }

    /// One token, or `None` after reporting a character that starts none.
    fn scan_one(&mut self) -> Option<Token> {
        self.skip_whitespace();

        let start_col = self.col();
        let Some(ch) = self.advance() else {
            return Some(Token::new(TokenKind::Eof, self.current_span()));
        };

        let token = match ch {
            '\'' | '"' => self.scan_string(ch, start_col),
            '0'..='9' => self.scan_number(start_col),
            c if c.is_ascii_alphabetic() || c == '_' => self.scan_identifier(start_col),

            '+' => self.single(TokenKind::Plus, start_col),
            '-' => self.single(TokenKind::Minus, start_col),
            '*' => self.single(TokenKind::Star, start_col),
            '/' => self.single(TokenKind::Slash, start_col),
            '%' => self.single(TokenKind::Percent, start_col),
            '.' => self.single(TokenKind::Dot, start_col),
            ',' => self.single(TokenKind::Comma, start_col),
            '(' => self.single(TokenKind::LParen, start_col),
            ')' => self.single(TokenKind::RParen, start_col),
            '[' => self.single(TokenKind::LBracket, start_col),
            ']' => self.single(TokenKind::RBracket, start_col),

            '<' => self.one_or_two('=', TokenKind::LessEq, TokenKind::Less, start_col),
            '>' => self.one_or_two('=', TokenKind::GreaterEq, TokenKind::Greater, start_col),
            '!' => self.one_or_two('=', TokenKind::BangEq, TokenKind::Bang, start_col),

            '=' => {
                if self.peek() == Some('=') {
                    self.advance();
                    self.single(TokenKind::EqEq, start_col)
                } else {
                    let span = self.span_from(start_col);
                    self.emit_error_with_suggestion(
                        ErrorCode::UNEXPECTED_CHARACTER,
                        "assignment is not supported",
                        span,
                        "use '==' for comparison",
                    );
                    return None;
                }
            }

            '&' | '|' => {
                if self.peek() == Some(ch) {
                    self.advance();
                    let kind = if ch == '&' {
                        TokenKind::AmpAmp
                    } else {
                        TokenKind::PipePipe
                    };
                    self.single(kind, start_col)
                } else {
                    let span = self.span_from(start_col);
                    let word = if ch == '&' { "and" } else { "or" };
                    self.emit_error_with_suggestion(
                        ErrorCode::UNEXPECTED_CHARACTER,
                        format!("unexpected character '{ch}'"),
                        span,
                        format!("use '{word}' or '{ch}{ch}'"),
                    );
                    return None;
                }
            }

            _ => {
                let span = self.span_from(start_col);
                self.emit_error(
                    ErrorCode::UNEXPECTED_CHARACTER,
                    format!("unexpected character '{ch}'"),
                    span,
                );
                return None;
            }
        };
        Some(token)
    }

    fn scan_number(&mut self, start_col: u32) -> Token {
        let start = self.pos - 1;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }

        let mut is_float = false;
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            self.advance();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        let span = self.span_from(start_col);
        let text: String = self.chars[start..self.pos].iter().collect();
        let kind = if is_float {
            match text.parse::<f64>() {
                Ok(v) => TokenKind::FloatLit(v),
                Err(_) => {
                    self.emit_error(ErrorCode::INVALID_NUMBER, format!("invalid number '{text}'"), span);
                    TokenKind::FloatLit(0.0)
                }
            }
        } else {
            match text.parse::<i64>() {
                Ok(v) => TokenKind::IntLit(v),
                Err(_) => {
                    self.emit_error(
                        ErrorCode::INVALID_NUMBER,
                        format!("integer literal '{text}' is out of range"),
                        span,
                    );
                    TokenKind::IntLit(0)
                }
            }
        };
        Token::new(kind, span)
    }

    fn scan_identifier(&mut self, start_col: u32) -> Token {
        let start = self.pos - 1;
        while self.peek().is_some_and(|c| c.is_ascii_alphanumeric() || c == '_') {
            self.advance();
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        let kind = TokenKind::from_keyword(&text).unwrap_or(TokenKind::Identifier(text));
        Token::new(kind, self.span_from(start_col))
    }

    /// Scan a string literal after its opening quote.
    fn scan_string(&mut self, quote: char, start_col: u32) -> Token {
        let mut buf = String::new();
        loop {
            match self.peek() {
                None => {
                    let span = self.span_from(start_col);
                    self.emit_error_with_suggestion(
                        ErrorCode::UNTERMINATED_STRING,
                        "unterminated string literal",
                        span,
                        format!("close the string with {quote}"),
                    );
                    return Token::new(TokenKind::StringLit(buf), span);
                }
                Some(c) if c == quote => {
                    self.advance();
                    return Token::new(TokenKind::StringLit(buf), self.span_from(start_col));
                }
                Some('\\') => {
                    if let Some(escaped) = self.scan_escape_sequence() {
                        buf.push(escaped);
                    }
                }
                Some(c) => {
                    self.advance();
                    buf.push(c);
                }
            }
        }
    }

    /// Scan an escape sequence starting at the `\`.
    fn scan_escape_sequence(&mut self) -> Option<char> {
        let start_col = self.col();
        self.advance();
        match self.advance() {
            Some('\\') => Some('\\'),
            Some('\'') => Some('\''),
            Some('"') => Some('"'),
            Some('n') => Some('\n'),
            Some('t') => Some('\t'),
            Some(ch) => {
                let span = self.span_from(start_col);
                self.emit_error(
                    ErrorCode::INVALID_ESCAPE,
                    format!("invalid escape sequence '\\{ch}'"),
                    span,
                );
                Some(ch)
            }
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .lex()
            .tokens
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn empty_input_is_just_eof() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
        assert_eq!(kinds("   "), vec![TokenKind::Eof]);
    }

    #[test]
    fn spans_are_one_based_columns() {
        let result = Lexer::new("node.ip").lex();
        assert_eq!(result.tokens[0].span, Span::new(1, 4));
        assert_eq!(result.tokens[1].span, Span::new(5, 5));
        assert_eq!(result.tokens[2].span, Span::new(6, 7));
    }
}
