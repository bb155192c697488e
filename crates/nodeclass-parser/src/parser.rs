//! Token cursor and diagnostics shared by the expression grammar.

use nodeclass_lexer::token::{Token, TokenKind};
use nodeclass_types::ast::Expr;
use nodeclass_types::{ErrorCode, ExprError, ExprErrors, Span};

/// Maximum depth of an expression tree: parentheses, prefix operators,
/// binary operators and postfix accesses each add one level.
pub const MAX_EXPR_DEPTH: u32 = 32;

/// The query parser.
///
/// Consumes a token stream produced by the lexer and builds an [`Expr`].
pub struct Parser<'src> {
    tokens: Vec<Token>,
    pos: usize,
    source: &'src str,
    errors: ExprErrors,
    pub(crate) depth: u32,
}

/// Result of parsing.
pub struct ParseResult {
    pub expr: Option<Expr>,
    pub errors: ExprErrors,
}

impl<'src> Parser<'src> {
    pub fn new(tokens: Vec<Token>, source: &'src str) -> Self {
        Self {
            tokens,
            pos: 0,
            source,
            errors: ExprErrors::empty(),
            depth: 0,
        }
    }

    // ── Cursor ──

    /// Token under the cursor; the trailing `Eof` once input runs out.
    fn token(&self) -> Option<&Token> {
        self.tokens.get(self.pos).or_else(|| self.tokens.last())
    }

    pub(crate) fn kind(&self) -> &TokenKind {
        self.token().map_or(&TokenKind::Eof, |t| &t.kind)
    }

    /// Kind of the token `n` places past the cursor.
    pub(crate) fn nth(&self, n: usize) -> &TokenKind {
        self.tokens.get(self.pos + n).map_or(&TokenKind::Eof, |t| &t.kind)
    }

    pub(crate) fn here(&self) -> Span {
        self.token().map_or(Span::point(1), |t| t.span)
    }

    pub(crate) fn source_text(&self) -> &'src str {
        self.source
    }

    /// Step past the current token, returning its span.
    pub(crate) fn bump(&mut self) -> Span {
        let span = self.here();
        self.pos = (self.pos + 1).min(self.tokens.len());
        span
    }

    pub(crate) fn at(&self, kind: &TokenKind) -> bool {
        self.kind() == kind
    }

    pub(crate) fn at_eof(&self) -> bool {
        self.at(&TokenKind::Eof)
    }

    /// Consume `kind` if it is next.
    pub(crate) fn accept(&mut self, kind: &TokenKind) -> bool {
        let hit = self.at(kind);
        if hit {
            self.bump();
        }
        hit
    }

    /// Consume `kind` or record an unexpected-token error.
    pub(crate) fn require(&mut self, kind: &TokenKind) -> Option<Span> {
        if self.at(kind) {
            return Some(self.bump());
        }
        let found = self.kind().to_string();
        self.report_here(
            ErrorCode::UNEXPECTED_TOKEN,
            format!("expected '{kind}' but found '{found}'"),
        );
        None
    }

    // ── Diagnostics ──

    pub(crate) fn report(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        self.errors
            .push_error(ExprError::new(code, message, span, self.source));
    }

    pub(crate) fn report_here(&mut self, code: ErrorCode, message: impl Into<String>) {
        let span = self.here();
        self.report(code, message, span);
    }

    pub(crate) fn report_hint(
        &mut self,
        code: ErrorCode,
        message: impl Into<String>,
        span: Span,
        hint: impl Into<String>,
    ) {
        self.errors
            .push_error(ExprError::new(code, message, span, self.source).with_suggestion(hint));
    }

    /// Parse the whole token stream as one expression.
    pub fn parse(mut self) -> ParseResult {
        let expr = if self.at_eof() {
            self.report_here(ErrorCode::EMPTY_EXPRESSION, "empty expression");
            None
        } else {
            let expr = self.parse_expression();
            if expr.is_some() && !self.at_eof() {
                let found = self.kind().to_string();
                self.report_here(
                    ErrorCode::TRAILING_INPUT,
                    format!("unexpected '{found}' after expression"),
                );
            }
            expr
        };
        ParseResult {
            expr,
            errors: self.errors,
        }
    }
}
