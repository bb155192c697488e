//! AST node types for the query expression language.
//!
//! The language is closed: the only free name is `node`, the only call is
//! `len(...)`, and methods come from the fixed [`Method`] set. Every node
//! carries a [`Span`] for error reporting.

use crate::Span;
use std::fmt;

/// The single name bound while evaluating an expression.
pub const NODE_BINDING: &str = "node";

/// A spanned identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

/// An expression with its location.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    // ── Literals ──
    IntLit(i64),
    FloatLit(f64),
    StringLit(String),
    BoolLit(bool),
    NullLit,
    ListLit(Vec<Expr>),

    /// The `node` binding.
    Node,

    /// `object.name`
    Attribute {
        object: Box<Expr>,
        name: Ident,
    },
    /// `object[index]`
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    /// `object.method(args)`
    MethodCall {
        object: Box<Expr>,
        method: Method,
        args: Vec<Expr>,
    },
    /// `len(arg)`
    Len(Box<Expr>),

    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    Paren(Box<Expr>),
}

/// The fixed set of methods callable on values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Keys,
    Values,
    StartsWith,
    EndsWith,
    Lower,
    Upper,
}

impl Method {
    /// Look up a method by its source name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "get" => Some(Self::Get),
            "keys" => Some(Self::Keys),
            "values" => Some(Self::Values),
            "startswith" => Some(Self::StartsWith),
            "endswith" => Some(Self::EndsWith),
            "lower" => Some(Self::Lower),
            "upper" => Some(Self::Upper),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Keys => "keys",
            Self::Values => "values",
            Self::StartsWith => "startswith",
            Self::EndsWith => "endswith",
            Self::Lower => "lower",
            Self::Upper => "upper",
        }
    }

    /// Inclusive range of accepted argument counts.
    pub fn arity(self) -> (usize, usize) {
        match self {
            Self::Get => (1, 2),
            Self::StartsWith | Self::EndsWith => (1, 1),
            Self::Keys | Self::Values | Self::Lower | Self::Upper => (0, 0),
        }
    }

    /// Names of every method, for diagnostics.
    pub fn all_names() -> &'static [&'static str] {
        &["get", "keys", "values", "startswith", "endswith", "lower", "upper"]
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    // Logical
    Or,
    And,
    // Comparison
    Eq,
    NotEq,
    Less,
    Greater,
    LessEq,
    GreaterEq,
    In,
    NotIn,
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinOp::Or => "or",
            BinOp::And => "and",
            BinOp::Eq => "==",
            BinOp::NotEq => "!=",
            BinOp::Less => "<",
            BinOp::Greater => ">",
            BinOp::LessEq => "<=",
            BinOp::GreaterEq => ">=",
            BinOp::In => "in",
            BinOp::NotIn => "not in",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
        };
        f.write_str(s)
    }
}
