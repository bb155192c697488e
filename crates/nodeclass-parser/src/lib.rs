//! nodeclass query parser: converts a token stream into an expression AST.

mod parse_expr;
mod parser;

pub use parser::{ParseResult, Parser, MAX_EXPR_DEPTH};

use nodeclass_lexer::Lexer;
use nodeclass_types::ast::Expr;
use nodeclass_types::ExprErrors;

/// Lex and parse `source` in one step.
///
/// Lexer and parser errors are reported together; any error fails the parse.
pub fn parse_expression(source: &str) -> Result<Expr, ExprErrors> {
    let lexed = Lexer::new(source).lex();
    let mut errors = lexed.errors;
    let parsed = Parser::new(lexed.tokens, source).parse();
    errors.extend(parsed.errors);
    match parsed.expr {
        Some(expr) if !errors.has_errors() => Ok(expr),
        _ => Err(errors),
    }
}
