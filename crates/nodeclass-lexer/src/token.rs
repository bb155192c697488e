//! Token types for the query lexer.
//!
//! Defines [`TokenKind`] covering every lexeme of the expression language
//! and [`Token`], which pairs a kind with a source [`Span`].

use nodeclass_types::Span;
use std::fmt;

/// Reserved words. Python-style spellings are accepted alongside the
/// lowercase ones so that filters written for the classic tool still parse.
pub const ALL_KEYWORDS: &[&str] = &[
    "true", "True", "false", "False", "null", "None", "not", "and", "or", "in",
];

/// A single token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Every token kind in the query language.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // ── Literals ──
    IntLit(i64),
    FloatLit(f64),
    StringLit(String),
    True,
    False,
    Null,

    Identifier(String),

    // ── Word operators ──
    Not,
    And,
    Or,
    In,

    // ── Symbolic operators ──
    EqEq,
    BangEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    Bang,
    AmpAmp,
    PipePipe,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,

    // ── Punctuation ──
    Dot,
    Comma,
    LParen,
    RParen,
    LBracket,
    RBracket,

    Eof,
}

impl TokenKind {
    /// Map a reserved word to its token kind.
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "true" | "True" => Some(Self::True),
            "false" | "False" => Some(Self::False),
            "null" | "None" => Some(Self::Null),
            "not" => Some(Self::Not),
            "and" => Some(Self::And),
            "or" => Some(Self::Or),
            "in" => Some(Self::In),
            _ => None,
        }
    }

    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            Self::True | Self::False | Self::Null | Self::Not | Self::And | Self::Or | Self::In
        )
    }
}

impl TokenKind {
    /// Fixed spelling of operator, punctuation and keyword tokens.
    pub fn text(&self) -> Option<&'static str> {
        use TokenKind::*;
        let text = match self {
            IntLit(_) | FloatLit(_) | StringLit(_) | Identifier(_) | Eof => return None,
            True => "true",
            False => "false",
            Null => "null",
            Not => "not",
            And => "and",
            Or => "or",
            In => "in",
            EqEq => "==",
            BangEq => "!=",
            Less => "<",
            LessEq => "<=",
            Greater => ">",
            GreaterEq => ">=",
            Bang => "!",
            AmpAmp => "&&",
            PipePipe => "||",
            Plus => "+",
            Minus => "-",
            Star => "*",
            Slash => "/",
            Percent => "%",
            Dot => ".",
            Comma => ",",
            LParen => "(",
            RParen => ")",
            LBracket => "[",
            RBracket => "]",
        };
        Some(text)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(text) = self.text() {
            return f.write_str(text);
        }
        match self {
            Self::IntLit(n) => write!(f, "{n}"),
            Self::FloatLit(x) => write!(f, "{x}"),
            Self::StringLit(s) => write!(f, "{s:?}"),
            Self::Identifier(name) => f.write_str(name),
            _ => f.write_str("end of expression"),
        }
    }
}
