//! Core expression evaluator.

use crate::env::Environment;
use crate::error::{EvalError, EvalResult};
use nodeclass_types::ast::*;
use serde_json::{Map, Number, Value};
use std::borrow::Cow;
use std::cmp::Ordering;

/// Evaluate `expr` with `node` bound to `parameters`.
pub fn evaluate(expr: &Expr, parameters: &Value) -> EvalResult<Value> {
    Evaluator::new(Environment::for_node(parameters)).eval_expr(expr)
}

/// Truthiness: `null`, `false`, zero, and empty strings, sequences and
/// mappings are falsy; everything else is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Short kind name for diagnostics.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}

/// Numeric view of a value used by arithmetic and ordering.
#[derive(Debug, Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn of(value: &Value) -> Option<Self> {
        let Value::Number(n) = value else {
            return None;
        };
        n.as_i64()
            .map(Num::Int)
            .or_else(|| n.as_f64().map(Num::Float))
    }

    fn as_f64(self) -> f64 {
        match self {
            Num::Int(i) => i as f64,
            Num::Float(f) => f,
        }
    }
}

fn float_value(f: f64) -> EvalResult<Value> {
    Number::from_f64(f)
        .map(Value::Number)
        .ok_or_else(|| EvalError::Arithmetic(format!("result {f} is not a finite number")))
}

/// The tree-walking evaluator.
pub struct Evaluator<'a> {
    pub env: Environment<'a>,
}

impl<'a> Evaluator<'a> {
    pub fn new(env: Environment<'a>) -> Self {
        Self { env }
    }

    /// Evaluate an expression to a value.
    pub fn eval_expr(&mut self, expr: &Expr) -> EvalResult<Value> {
        self.eval(expr).map(Cow::into_owned)
    }

    /// Access paths stay borrowed from the bound node; only values built by
    /// the expression itself are owned.
    fn eval(&mut self, expr: &Expr) -> EvalResult<Cow<'a, Value>> {
        let value = match &expr.kind {
            ExprKind::IntLit(n) => Value::from(*n),
            ExprKind::FloatLit(f) => float_value(*f)?,
            ExprKind::StringLit(s) => Value::String(s.clone()),
            ExprKind::BoolLit(b) => Value::Bool(*b),
            ExprKind::NullLit => Value::Null,
            ExprKind::ListLit(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval_expr(item)?);
                }
                Value::Array(values)
            }

            ExprKind::Node => {
                return self
                    .env
                    .get(NODE_BINDING)
                    .map(Cow::Borrowed)
                    .ok_or_else(|| EvalError::UndefinedName(NODE_BINDING.to_string()))
            }
            ExprKind::Attribute { object, name } => {
                return match self.eval(object)? {
                    Cow::Borrowed(obj) => attribute(obj, &name.name).map(Cow::Borrowed),
                    Cow::Owned(obj) => attribute(&obj, &name.name).map(|v| Cow::Owned(v.clone())),
                };
            }
            ExprKind::Index { object, index } => {
                let obj = self.eval(object)?;
                let idx = self.eval(index)?;
                return match obj {
                    Cow::Borrowed(obj) => element(obj, &idx).map(Cow::Borrowed),
                    Cow::Owned(obj) => element(&obj, &idx).map(|v| Cow::Owned(v.clone())),
                };
            }
            ExprKind::MethodCall {
                object,
                method,
                args,
            } => {
                let obj = self.eval(object)?;
                let mut arg_vals = Vec::with_capacity(args.len());
                for arg in args {
                    arg_vals.push(self.eval_expr(arg)?);
                }
                eval_method(&obj, *method, arg_vals)?
            }
            ExprKind::Len(arg) => {
                let value = self.eval(arg)?;
                let len = match &*value {
                    Value::String(s) => s.chars().count(),
                    Value::Array(a) => a.len(),
                    Value::Object(o) => o.len(),
                    other => {
                        return Err(EvalError::TypeMismatch(format!(
                            "len() of {}",
                            type_name(other)
                        )))
                    }
                };
                Value::from(len)
            }

            ExprKind::Unary { op, operand } => self.eval_unary(*op, operand)?,
            ExprKind::Binary { left, op, right } => return self.eval_binary(left, *op, right),
            ExprKind::Paren(inner) => return self.eval(inner),
        };
        Ok(Cow::Owned(value))
    }

    // ── Operators ────────────────────────────────────────────────────────

    fn eval_unary(&mut self, op: UnaryOp, operand: &Expr) -> EvalResult<Value> {
        let val = self.eval(operand)?;
        match op {
            UnaryOp::Not => Ok(Value::Bool(!is_truthy(&val))),
            UnaryOp::Neg => match Num::of(&val) {
                Some(Num::Int(i)) => i
                    .checked_neg()
                    .map(Value::from)
                    .ok_or_else(|| EvalError::Arithmetic("integer overflow".into())),
                Some(Num::Float(f)) => float_value(-f),
                None => Err(EvalError::TypeMismatch(format!(
                    "cannot negate {}",
                    type_name(&val)
                ))),
            },
        }
    }

    fn eval_binary(&mut self, left: &Expr, op: BinOp, right: &Expr) -> EvalResult<Cow<'a, Value>> {
        // `and` / `or` short-circuit and yield the deciding operand
        if op == BinOp::And {
            let lv = self.eval(left)?;
            return if is_truthy(&lv) { self.eval(right) } else { Ok(lv) };
        }
        if op == BinOp::Or {
            let lv = self.eval(left)?;
            return if is_truthy(&lv) { Ok(lv) } else { self.eval(right) };
        }

        let lv = self.eval(left)?;
        let rv = self.eval(right)?;
        let value = match op {
            BinOp::Eq => Value::Bool(structural_eq(&lv, &rv)),
            BinOp::NotEq => Value::Bool(!structural_eq(&lv, &rv)),
            BinOp::Less | BinOp::Greater | BinOp::LessEq | BinOp::GreaterEq => {
                let ord = compare(&lv, &rv, op)?;
                Value::Bool(match op {
                    BinOp::Less => ord == Ordering::Less,
                    BinOp::Greater => ord == Ordering::Greater,
                    BinOp::LessEq => ord != Ordering::Greater,
                    _ => ord != Ordering::Less,
                })
            }
            BinOp::In => Value::Bool(contains(&rv, &lv)?),
            BinOp::NotIn => Value::Bool(!contains(&rv, &lv)?),
            BinOp::Add => eval_add(&lv, &rv)?,
            BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod => eval_arith(&lv, op, &rv)?,
            BinOp::And | BinOp::Or => unreachable!("short-circuited above"),
        };
        Ok(Cow::Owned(value))
    }
}

fn attribute<'v>(obj: &'v Value, name: &str) -> EvalResult<&'v Value> {
    match obj {
        Value::Object(map) => map.get(name).ok_or_else(|| EvalError::MissingKey {
            key: name.to_string(),
        }),
        other => Err(EvalError::TypeMismatch(format!(
            "cannot access attribute '{name}' on {}",
            type_name(other)
        ))),
    }
}

fn element<'v>(obj: &'v Value, index: &Value) -> EvalResult<&'v Value> {
    match (obj, index) {
        (Value::Object(map), Value::String(key)) => map
            .get(key.as_str())
            .ok_or_else(|| EvalError::MissingKey { key: key.clone() }),
        (Value::Array(items), idx) => {
            let Some(i) = idx.as_i64() else {
                return Err(EvalError::TypeMismatch(format!(
                    "sequence index must be int, got {}",
                    type_name(idx)
                )));
            };
            let len = items.len();
            resolve_index(i, len)
                .and_then(|pos| items.get(pos))
                .ok_or(EvalError::IndexOutOfRange { index: i, len })
        }
        (other, idx) => Err(EvalError::TypeMismatch(format!(
            "cannot index {} with {}",
            type_name(other),
            type_name(idx)
        ))),
    }
}

fn eval_method(obj: &Value, method: Method, mut args: Vec<Value>) -> EvalResult<Value> {
    let mismatch = |obj: &Value| {
        EvalError::TypeMismatch(format!("'{method}' is not defined on {}", type_name(obj)))
    };
    match method {
        Method::Get => {
            let default = match args.len() {
                2 => args.pop().unwrap_or(Value::Null),
                _ => Value::Null,
            };
            let key = args.pop().unwrap_or(Value::Null);
            match (obj, &key) {
                (Value::Object(map), Value::String(k)) => {
                    Ok(map.get(k.as_str()).cloned().unwrap_or(default))
                }
                (Value::Array(items), k) if k.is_i64() => Ok(k
                    .as_i64()
                    .and_then(|i| resolve_index(i, items.len()))
                    .and_then(|pos| items.get(pos).cloned())
                    .unwrap_or(default)),
                (Value::Object(_), _) | (Value::Array(_), _) => Err(EvalError::TypeMismatch(
                    format!("get() key of type {}", type_name(&key)),
                )),
                _ => Err(mismatch(obj)),
            }
        }
        Method::Keys => match obj {
            Value::Object(map) => Ok(Value::Array(map.keys().cloned().map(Value::String).collect())),
            other => Err(mismatch(other)),
        },
        Method::Values => match obj {
            Value::Object(map) => Ok(Value::Array(map.values().cloned().collect())),
            other => Err(mismatch(other)),
        },
        Method::StartsWith | Method::EndsWith => {
            let (Value::String(s), Some(Value::String(affix))) = (obj, args.first()) else {
                return Err(mismatch(obj));
            };
            let hit = if method == Method::StartsWith {
                s.starts_with(affix.as_str())
            } else {
                s.ends_with(affix.as_str())
            };
            Ok(Value::Bool(hit))
        }
        Method::Lower => match obj {
            Value::String(s) => Ok(Value::String(s.to_lowercase())),
            other => Err(mismatch(other)),
        },
        Method::Upper => match obj {
            Value::String(s) => Ok(Value::String(s.to_uppercase())),
            other => Err(mismatch(other)),
        },
    }
}

fn eval_add(lv: &Value, rv: &Value) -> EvalResult<Value> {
    match (lv, rv) {
        (Value::String(a), Value::String(b)) => Ok(Value::String(format!("{a}{b}"))),
        (Value::Array(a), Value::Array(b)) => Ok(Value::Array(a.iter().chain(b).cloned().collect())),
        _ => eval_arith(lv, BinOp::Add, rv),
    }
}

/// Python-style index: negative values count from the end.
fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let pos = if index < 0 { index + len } else { index };
    (0..len).contains(&pos).then_some(pos as usize)
}

fn eval_arith(lv: &Value, op: BinOp, rv: &Value) -> EvalResult<Value> {
    let (Some(a), Some(b)) = (Num::of(lv), Num::of(rv)) else {
        return Err(EvalError::TypeMismatch(format!(
            "unsupported operands for '{op}': {} and {}",
            type_name(lv),
            type_name(rv)
        )));
    };
    let overflow = || EvalError::Arithmetic("integer overflow".into());
    match (a, b, op) {
        (_, b, BinOp::Div | BinOp::Mod) if b.as_f64() == 0.0 => {
            Err(EvalError::Arithmetic("division by zero".into()))
        }
        (Num::Int(x), Num::Int(y), BinOp::Add) => x.checked_add(y).map(Value::from).ok_or_else(overflow),
        (Num::Int(x), Num::Int(y), BinOp::Sub) => x.checked_sub(y).map(Value::from).ok_or_else(overflow),
        (Num::Int(x), Num::Int(y), BinOp::Mul) => x.checked_mul(y).map(Value::from).ok_or_else(overflow),
        // result takes the sign of the divisor
        (Num::Int(x), Num::Int(y), BinOp::Mod) => {
            let r = x.checked_rem(y).ok_or_else(overflow)?;
            let r = if r != 0 && (r < 0) != (y < 0) { r + y } else { r };
            Ok(Value::from(r))
        }
        (a, b, op) => {
            let (x, y) = (a.as_f64(), b.as_f64());
            let result = match op {
                BinOp::Add => x + y,
                BinOp::Sub => x - y,
                BinOp::Mul => x * y,
                BinOp::Div => x / y,
                _ => {
                    let r = x % y;
                    if r != 0.0 && (r < 0.0) != (y < 0.0) {
                        r + y
                    } else {
                        r
                    }
                }
            };
            float_value(result)
        }
    }
}

/// Equality where `1 == 1.0` and mappings compare by content.
fn structural_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => match (Num::of(a), Num::of(b)) {
            (Some(Num::Int(x)), Some(Num::Int(y))) => x == y,
            (Some(x), Some(y)) => x.as_f64() == y.as_f64(),
            _ => a == b,
        },
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| structural_eq(a, b))
        }
        (Value::Object(x), Value::Object(y)) => object_eq(x, y),
        _ => a == b,
    }
}

fn object_eq(x: &Map<String, Value>, y: &Map<String, Value>) -> bool {
    x.len() == y.len()
        && x
            .iter()
            .all(|(k, v)| y.get(k).is_some_and(|w| structural_eq(v, w)))
}

fn compare(lv: &Value, rv: &Value, op: BinOp) -> EvalResult<Ordering> {
    match (lv, rv) {
        (Value::String(a), Value::String(b)) => Ok(a.cmp(b)),
        _ => match (Num::of(lv), Num::of(rv)) {
            (Some(Num::Int(a)), Some(Num::Int(b))) => Ok(a.cmp(&b)),
            (Some(a), Some(b)) => a.as_f64().partial_cmp(&b.as_f64()).ok_or_else(|| {
                EvalError::Arithmetic("comparison with a non-finite number".into())
            }),
            _ => Err(EvalError::TypeMismatch(format!(
                "cannot compare {} {op} {}",
                type_name(lv),
                type_name(rv)
            ))),
        },
    }
}

/// Membership test for `needle in haystack`.
fn contains(haystack: &Value, needle: &Value) -> EvalResult<bool> {
    match (haystack, needle) {
        (Value::Array(items), _) => Ok(items.iter().any(|item| structural_eq(item, needle))),
        (Value::Object(map), Value::String(key)) => Ok(map.contains_key(key.as_str())),
        (Value::String(s), Value::String(sub)) => Ok(s.contains(sub.as_str())),
        _ => Err(EvalError::TypeMismatch(format!(
            "'in' needs a sequence, mapping or string on the right, got {} in {}",
            type_name(needle),
            type_name(haystack)
        ))),
    }
}
