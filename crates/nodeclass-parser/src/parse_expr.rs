//! Expression grammar.
//!
//! Binding strength, loosest first:
//!
//! | level | operators                                   |
//! |-------|---------------------------------------------|
//! | or    | `or` `\|\|`                                 |
//! | and   | `and` `&&`                                  |
//! | not   | prefix `not` `!`                            |
//! | cmp   | `==` `!=` `<` `>` `<=` `>=` `in` `not in`   |
//! | sum   | `+` `-`                                     |
//! | prod  | `*` `/` `%`                                 |
//! | neg   | prefix `-`                                  |
//! | post  | `.name`, `.method(..)`, `[index]`           |
//!
//! Comparisons are non-associative.

use nodeclass_lexer::token::TokenKind;
use nodeclass_types::ast::*;
use nodeclass_types::{ErrorCode, Span};

use crate::parser::{Parser, MAX_EXPR_DEPTH};

type Rule<'src> = fn(&mut Parser<'src>) -> Option<Expr>;

fn or_op(kind: &TokenKind) -> Option<BinOp> {
    matches!(kind, TokenKind::Or | TokenKind::PipePipe).then_some(BinOp::Or)
}

fn and_op(kind: &TokenKind) -> Option<BinOp> {
    matches!(kind, TokenKind::And | TokenKind::AmpAmp).then_some(BinOp::And)
}

fn sum_op(kind: &TokenKind) -> Option<BinOp> {
    match kind {
        TokenKind::Plus => Some(BinOp::Add),
        TokenKind::Minus => Some(BinOp::Sub),
        _ => None,
    }
}

fn product_op(kind: &TokenKind) -> Option<BinOp> {
    match kind {
        TokenKind::Star => Some(BinOp::Mul),
        TokenKind::Slash => Some(BinOp::Div),
        TokenKind::Percent => Some(BinOp::Mod),
        _ => None,
    }
}

fn binary(left: Expr, op: BinOp, right: Expr) -> Expr {
    let span = left.span.merge(right.span);
    let kind = ExprKind::Binary {
        left: Box::new(left),
        op,
        right: Box::new(right),
    };
    Expr::new(kind, span)
}

fn unary(op: UnaryOp, start: Span, operand: Expr) -> Expr {
    let span = start.merge(operand.span);
    let kind = ExprKind::Unary {
        op,
        operand: Box::new(operand),
    };
    Expr::new(kind, span)
}

impl<'src> Parser<'src> {
    /// Entry point for a full expression.
    pub(crate) fn parse_expression(&mut self) -> Option<Expr> {
        self.nested(|p| {
            p.descend()?;
            p.disjunction()
        })
    }

    /// Run `rule`, then restore the nesting depth it started at.
    fn nested(&mut self, rule: impl FnOnce(&mut Self) -> Option<Expr>) -> Option<Expr> {
        let depth = self.depth;
        let expr = rule(self);
        self.depth = depth;
        expr
    }

    /// Count one more level of tree depth, failing with E300 past the limit.
    ///
    /// Every prefix operator, binary link and postfix link deepens the tree
    /// by one, so all of them pass through here.
    fn descend(&mut self) -> Option<()> {
        if self.depth >= MAX_EXPR_DEPTH {
            self.report_here(
                ErrorCode::NESTING_LIMIT_EXCEEDED,
                format!("expressions may nest at most {MAX_EXPR_DEPTH} levels deep"),
            );
            return None;
        }
        self.depth += 1;
        Some(())
    }

    /// One left-associative level: `next { op next }`.
    fn chain(&mut self, next: Rule<'src>, op_of: fn(&TokenKind) -> Option<BinOp>) -> Option<Expr> {
        self.nested(|p| {
            let mut expr = next(p)?;
            while let Some(op) = op_of(p.kind()) {
                p.descend()?;
                p.bump();
                let rhs = next(p)?;
                expr = binary(expr, op, rhs);
            }
            Some(expr)
        })
    }

    /// `{ op } operand`, folded right to left.
    fn prefixed(&mut self, op: UnaryOp, is_op: fn(&TokenKind) -> bool, operand: Rule<'src>) -> Option<Expr> {
        self.nested(|p| {
            let mut starts = Vec::new();
            while is_op(p.kind()) {
                p.descend()?;
                starts.push(p.bump());
            }
            let mut expr = operand(p)?;
            while let Some(start) = starts.pop() {
                expr = unary(op, start, expr);
            }
            Some(expr)
        })
    }

    fn disjunction(&mut self) -> Option<Expr> {
        self.chain(Self::conjunction, or_op)
    }

    fn conjunction(&mut self) -> Option<Expr> {
        self.chain(Self::negation, and_op)
    }

    fn negation(&mut self) -> Option<Expr> {
        self.prefixed(
            UnaryOp::Not,
            |kind| matches!(kind, TokenKind::Not | TokenKind::Bang),
            Self::comparison,
        )
    }

    fn comparison(&mut self) -> Option<Expr> {
        let lhs = self.sum()?;
        let Some(op) = self.comparison_ahead() else {
            return Some(lhs);
        };
        self.bump();
        if op == BinOp::NotIn {
            self.bump();
        }
        let rhs = self.sum()?;
        if self.comparison_ahead().is_some() {
            let span = self.here();
            self.report_hint(
                ErrorCode::CHAINED_COMPARISON,
                "comparison operators cannot be chained",
                span,
                "join the comparisons with 'and', as in: a < b and b < c",
            );
            return None;
        }
        Some(binary(lhs, op, rhs))
    }

    /// The comparison operator starting at the cursor, if any.
    fn comparison_ahead(&self) -> Option<BinOp> {
        let op = match self.kind() {
            TokenKind::EqEq => BinOp::Eq,
            TokenKind::BangEq => BinOp::NotEq,
            TokenKind::Less => BinOp::Less,
            TokenKind::LessEq => BinOp::LessEq,
            TokenKind::Greater => BinOp::Greater,
            TokenKind::GreaterEq => BinOp::GreaterEq,
            TokenKind::In => BinOp::In,
            TokenKind::Not if matches!(self.nth(1), TokenKind::In) => BinOp::NotIn,
            _ => return None,
        };
        Some(op)
    }

    fn sum(&mut self) -> Option<Expr> {
        self.chain(Self::product, sum_op)
    }

    fn product(&mut self) -> Option<Expr> {
        self.chain(Self::negative, product_op)
    }

    fn negative(&mut self) -> Option<Expr> {
        self.prefixed(
            UnaryOp::Neg,
            |kind| matches!(kind, TokenKind::Minus),
            Self::postfix,
        )
    }

    fn postfix(&mut self) -> Option<Expr> {
        self.nested(Self::postfix_links)
    }

    fn postfix_links(&mut self) -> Option<Expr> {
        let mut expr = self.primary()?;
        loop {
            if matches!(self.kind(), TokenKind::Dot | TokenKind::LBracket) {
                self.descend()?;
            }
            if self.accept(&TokenKind::Dot) {
                let name = self.member_name()?;
                expr = if self.at(&TokenKind::LParen) {
                    self.method_call(expr, name)?
                } else {
                    let span = expr.span.merge(name.span);
                    let object = Box::new(expr);
                    Expr::new(ExprKind::Attribute { object, name }, span)
                };
            } else if self.accept(&TokenKind::LBracket) {
                let index = Box::new(self.parse_expression()?);
                let close = self.require(&TokenKind::RBracket)?;
                let span = expr.span.merge(close);
                let object = Box::new(expr);
                expr = Expr::new(ExprKind::Index { object, index }, span);
            } else {
                return Some(expr);
            }
        }
    }

    /// Name after `.`; keywords are accepted so `node.in` still reads a key.
    fn member_name(&mut self) -> Option<Ident> {
        let text = match self.kind() {
            TokenKind::Identifier(name) => Some(name.clone()),
            kind if kind.is_keyword() => None,
            other => {
                let found = other.to_string();
                self.report_here(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected a key name after '.', found '{found}'"),
                );
                return None;
            }
        };
        let span = self.bump();
        let name = text.unwrap_or_else(|| span.slice(self.source_text()).to_string());
        Some(Ident::new(name, span))
    }

    /// `.name(args)` with the cursor on `(`.
    fn method_call(&mut self, object: Expr, name: Ident) -> Option<Expr> {
        let Some(method) = Method::from_name(&name.name) else {
            self.report_hint(
                ErrorCode::UNKNOWN_METHOD,
                format!("'{}' is not a method", name.name),
                name.span,
                format!("methods are: {}", Method::all_names().join(", ")),
            );
            return None;
        };
        let (args, close) = self.delimited(&TokenKind::LParen, &TokenKind::RParen)?;
        let span = object.span.merge(close);

        let (min, max) = method.arity();
        if !(min..=max).contains(&args.len()) {
            let wanted = match min == max {
                true => min.to_string(),
                false => format!("{min} to {max}"),
            };
            self.report(
                ErrorCode::WRONG_ARG_COUNT,
                format!("{method}() expects {wanted} argument(s) but got {}", args.len()),
                span,
            );
            return None;
        }

        let object = Box::new(object);
        Some(Expr::new(ExprKind::MethodCall { object, method, args }, span))
    }

    /// `open [expr {, expr} [,]] close`, returning the items and the span of `close`.
    fn delimited(&mut self, open: &TokenKind, close: &TokenKind) -> Option<(Vec<Expr>, Span)> {
        self.require(open)?;
        let mut items = Vec::new();
        while !self.at(close) {
            items.push(self.parse_expression()?);
            if !self.accept(&TokenKind::Comma) {
                break;
            }
        }
        let end = self.require(close)?;
        Some((items, end))
    }

    // ── Atoms ──

    fn primary(&mut self) -> Option<Expr> {
        let start = self.here();
        let literal = match self.kind() {
            TokenKind::IntLit(n) => ExprKind::IntLit(*n),
            TokenKind::FloatLit(x) => ExprKind::FloatLit(*x),
            TokenKind::StringLit(s) => ExprKind::StringLit(s.clone()),
            TokenKind::True => ExprKind::BoolLit(true),
            TokenKind::False => ExprKind::BoolLit(false),
            TokenKind::Null => ExprKind::NullLit,
            TokenKind::Identifier(name) => {
                let name = name.clone();
                return self.name(name, start);
            }
            TokenKind::LBracket => {
                let (items, close) = self.delimited(&TokenKind::LBracket, &TokenKind::RBracket)?;
                return Some(Expr::new(ExprKind::ListLit(items), start.merge(close)));
            }
            TokenKind::LParen => {
                self.bump();
                let inner = self.parse_expression()?;
                let close = self.require(&TokenKind::RParen)?;
                return Some(Expr::new(ExprKind::Paren(Box::new(inner)), start.merge(close)));
            }
            other => {
                let found = other.to_string();
                self.report_here(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected a value, found '{found}'"),
                );
                return None;
            }
        };
        self.bump();
        Some(Expr::new(literal, start))
    }

    /// `node` and `len(..)` are the only names in scope.
    fn name(&mut self, name: String, start: Span) -> Option<Expr> {
        let called = matches!(self.nth(1), TokenKind::LParen);
        match (name.as_str(), called) {
            (NODE_BINDING, false) => {
                self.bump();
                Some(Expr::new(ExprKind::Node, start))
            }
            ("len", true) => {
                self.bump();
                let (mut args, close) = self.delimited(&TokenKind::LParen, &TokenKind::RParen)?;
                let span = start.merge(close);
                if args.len() != 1 {
                    self.report(
                        ErrorCode::WRONG_ARG_COUNT,
                        format!("len() expects 1 argument but got {}", args.len()),
                        span,
                    );
                    return None;
                }
                let arg = Box::new(args.remove(0));
                Some(Expr::new(ExprKind::Len(arg), span))
            }
            (_, true) => {
                self.report_hint(
                    ErrorCode::UNKNOWN_FUNCTION,
                    format!("'{name}' is not a function"),
                    start,
                    "len(...) is the only function",
                );
                None
            }
            (_, false) => {
                self.report_hint(
                    ErrorCode::UNDEFINED_NAME,
                    format!("'{name}' is not defined"),
                    start,
                    format!("'{NODE_BINDING}' is the only name in scope"),
                );
                None
            }
        }
    }
}
