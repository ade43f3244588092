// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Tree-walking evaluator.
//!
//! Evaluates [`Expr`] trees against [`Value`]s. Parameters are looked up by
//! identity in an explicit environment, innermost binding first.

use super::Closure;
use crate::error::{Error, Result};
use crate::expr::{BinaryExpr, BinaryOp, Expr, LambdaExpr, Parameter, UnaryOp};
use crate::types::Value;
use std::cmp::Ordering;
use std::sync::Arc;

/// Parameter bindings, innermost last.
pub type Env = Vec<(Parameter, Value)>;

/// Evaluates expression trees.
#[derive(Debug, Clone)]
pub struct Interpreter {
    max_depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_MAX_DEPTH)
    }
}

impl Interpreter {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Evaluate `expr` with the given bindings.
    pub fn evaluate(&self, expr: &Expr, env: &mut Env) -> Result<Value> {
        self.eval(expr, env, 0)
    }

    /// Apply `lambda` to `args`.
    pub fn apply(&self, lambda: &LambdaExpr, args: &[Value], env: &mut Env) -> Result<Value> {
        self.apply_at(lambda, args, env, 0)
    }

    fn apply_at(&self, lambda: &LambdaExpr, args: &[Value], env: &mut Env, depth: usize) -> Result<Value> {
        if args.len() != lambda.parameters.len() {
            return Err(Error::Evaluation(format!(
                "lambda takes {} arguments, got {}",
                lambda.parameters.len(),
                args.len()
            )));
        }
        let mark = env.len();
        env.extend(
            lambda
                .parameters
                .iter()
                .cloned()
                .zip(args.iter().cloned()),
        );
        let result = self.eval(&lambda.body, env, depth + 1);
        env.truncate(mark);
        result
    }

    fn eval(&self, expr: &Expr, env: &mut Env, depth: usize) -> Result<Value> {
        if depth > self.max_depth {
            return Err(Error::DepthExceeded(self.max_depth));
        }
        let next = depth + 1;

        match expr {
            Expr::Lambda(lambda) => Ok(Value::Function(Closure {
                lambda: Arc::new(lambda.clone()),
                env: env.clone(),
                interpreter: self.clone(),
            })),

            Expr::Parameter(p) => env
                .iter()
                .rev()
                .find(|(bound, _)| bound.same_as(p))
                .map(|(_, v)| v.clone())
                .ok_or_else(|| Error::Evaluation(format!("unbound parameter {}", p.name()))),

            Expr::Constant(c) => Ok(c.value.clone()),

            Expr::Member(m) => {
                let target = self.eval(&m.target, env, next)?;
                m.member.get(&target)
            }

            Expr::Call(c) => {
                let target = match &c.target {
                    Some(t) => Some(self.eval(t, env, next)?),
                    None => None,
                };
                let args = self.eval_all(&c.arguments, env, next)?;
                c.method.invoke(target.as_ref(), &args)
            }

            Expr::New(n) => {
                let args = self.eval_all(&n.arguments, env, next)?;
                n.constructor.invoke(&args)
            }

            Expr::NewArray(a) => Ok(Value::Array(self.eval_all(&a.elements, env, next)?)),

            Expr::Unary(u) => {
                let operand = self.eval(&u.operand, env, next)?;
                unary(u.op, operand)
            }

            Expr::Binary(b) => self.eval_binary(b, env, next),
        }
    }

    fn eval_all(&self, exprs: &[Expr], env: &mut Env, depth: usize) -> Result<Vec<Value>> {
        exprs.iter().map(|e| self.eval(e, env, depth)).collect()
    }

    fn eval_bool(&self, expr: &Expr, env: &mut Env, depth: usize) -> Result<bool> {
        match self.eval(expr, env, depth)? {
            Value::Bool(b) => Ok(b),
            other => Err(Error::TypeMismatch(format!(
                "expected bool, got {}",
                other.kind_name()
            ))),
        }
    }

    fn eval_binary(&self, b: &BinaryExpr, env: &mut Env, depth: usize) -> Result<Value> {
        match b.op {
            BinaryOp::AndAlso if b.method.is_none() => {
                if !self.eval_bool(&b.left, env, depth)? {
                    return Ok(Value::Bool(false)); // Short-circuit
                }
                self.eval_bool(&b.right, env, depth).map(Value::Bool)
            }
            BinaryOp::OrElse if b.method.is_none() => {
                if self.eval_bool(&b.left, env, depth)? {
                    return Ok(Value::Bool(true)); // Short-circuit
                }
                self.eval_bool(&b.right, env, depth).map(Value::Bool)
            }
            BinaryOp::Coalesce => {
                let left = self.eval(&b.left, env, depth)?;
                if left.is_null() {
                    return self.eval(&b.right, env, depth);
                }
                match b.conversion.as_deref() {
                    Some(Expr::Lambda(conv)) => self.apply_at(conv, &[left], env, depth),
                    Some(_) => Err(Error::TypeMismatch(
                        "coalesce conversion is not a lambda".to_string(),
                    )),
                    None => Ok(left),
                }
            }
            op => {
                let left = self.eval(&b.left, env, depth)?;
                let right = self.eval(&b.right, env, depth)?;
                match &b.method {
                    Some(method) => method.invoke(None, &[left, right]),
                    None => binary(op, &left, &right),
                }
            }
        }
    }
}

// ============================================================================
// Operator semantics
// ============================================================================

fn unary(op: UnaryOp, operand: Value) -> Result<Value> {
    match (op, operand) {
        (_, Value::Null) => Ok(Value::Null),
        (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnaryOp::Not, Value::I32(v)) => Ok(Value::I32(!v)),
        (UnaryOp::Not, Value::I64(v)) => Ok(Value::I64(!v)),
        (UnaryOp::Negate, Value::I32(v)) => v.checked_neg().map(Value::I32).ok_or_else(overflow),
        (UnaryOp::Negate, Value::I64(v)) => v.checked_neg().map(Value::I64).ok_or_else(overflow),
        (UnaryOp::Negate, Value::F64(v)) => Ok(Value::F64(-v)),
        (op, other) => Err(Error::TypeMismatch(format!(
            "{:?} applied to {}",
            op,
            other.kind_name()
        ))),
    }
}

fn overflow() -> Error {
    Error::Evaluation("arithmetic overflow".to_string())
}

/// Built-in semantics of a strict (non short-circuit) binary operator.
pub(crate) fn binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value> {
    match op {
        BinaryOp::Equal => Ok(Value::Bool(left.loosely_equals(right))),
        BinaryOp::NotEqual => Ok(Value::Bool(!left.loosely_equals(right))),
        BinaryOp::LessThan
        | BinaryOp::LessThanOrEqual
        | BinaryOp::GreaterThan
        | BinaryOp::GreaterThanOrEqual => compare(op, left, right),
        BinaryOp::AndAlso | BinaryOp::OrElse | BinaryOp::And | BinaryOp::Or | BinaryOp::ExclusiveOr => {
            logical(op, left, right)
        }
        BinaryOp::ArrayIndex => index(left, right),
        BinaryOp::Coalesce => Ok(if left.is_null() { right.clone() } else { left.clone() }),
        BinaryOp::Add | BinaryOp::Subtract | BinaryOp::Multiply | BinaryOp::Divide | BinaryOp::Modulo => {
            arithmetic(op, left, right)
        }
    }
}

fn compare(op: BinaryOp, left: &Value, right: &Value) -> Result<Value> {
    // Lifted comparison: null on either side never orders.
    if left.is_null() || right.is_null() {
        return Ok(Value::Bool(false));
    }
    let ordering = left.partial_compare(right).ok_or_else(|| {
        Error::TypeMismatch(format!(
            "cannot compare {} with {}",
            left.kind_name(),
            right.kind_name()
        ))
    })?;
    Ok(Value::Bool(match op {
        BinaryOp::LessThan => ordering == Ordering::Less,
        BinaryOp::LessThanOrEqual => ordering != Ordering::Greater,
        BinaryOp::GreaterThan => ordering == Ordering::Greater,
        _ => ordering != Ordering::Less,
    }))
}

fn logical(op: BinaryOp, left: &Value, right: &Value) -> Result<Value> {
    match (left, right) {
        (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(match op {
            BinaryOp::And | BinaryOp::AndAlso => *a && *b,
            BinaryOp::Or | BinaryOp::OrElse => *a || *b,
            _ => a ^ b,
        })),
        (Value::I32(a), Value::I32(b)) => Ok(Value::I32(match op {
            BinaryOp::And => a & b,
            BinaryOp::Or => a | b,
            BinaryOp::ExclusiveOr => a ^ b,
            _ => return Err(mismatch(op, left, right)),
        })),
        _ => match (left.as_i64(), right.as_i64()) {
            (Some(a), Some(b)) => Ok(Value::I64(match op {
                BinaryOp::And => a & b,
                BinaryOp::Or => a | b,
                BinaryOp::ExclusiveOr => a ^ b,
                _ => return Err(mismatch(op, left, right)),
            })),
            _ => Err(mismatch(op, left, right)),
        },
    }
}

fn index(array: &Value, position: &Value) -> Result<Value> {
    let items = match array {
        Value::Array(items) => items,
        Value::Null => return Err(Error::Evaluation("indexing a null array".to_string())),
        other => {
            return Err(Error::TypeMismatch(format!(
                "cannot index {}",
                other.kind_name()
            )))
        }
    };
    let i = position
        .as_i64()
        .ok_or_else(|| Error::TypeMismatch("array index must be an integer".to_string()))?;
    usize::try_from(i)
        .ok()
        .and_then(|i| items.get(i))
        .cloned()
        .ok_or_else(|| Error::Evaluation(format!("index {} out of range", i)))
}

fn arithmetic(op: BinaryOp, left: &Value, right: &Value) -> Result<Value> {
    if left.is_null() || right.is_null() {
        return Ok(Value::Null);
    }
    match (left, right) {
        (Value::String(a), Value::String(b)) if op == BinaryOp::Add => {
            Ok(Value::String(format!("{}{}", a, b)))
        }
        (Value::I32(a), Value::I32(b)) => int_op(op, i64::from(*a), i64::from(*b))
            .and_then(|v| i32::try_from(v).map_err(|_| overflow()))
            .map(Value::I32),
        (Value::F64(_), _) | (_, Value::F64(_)) => match (left.as_f64(), right.as_f64()) {
            (Some(a), Some(b)) => Ok(Value::F64(match op {
                BinaryOp::Add => a + b,
                BinaryOp::Subtract => a - b,
                BinaryOp::Multiply => a * b,
                BinaryOp::Divide => a / b,
                _ => a % b,
            })),
            _ => Err(mismatch(op, left, right)),
        },
        _ => match (left.as_i64(), right.as_i64()) {
            (Some(a), Some(b)) => int_op(op, a, b).map(Value::I64),
            _ => Err(mismatch(op, left, right)),
        },
    }
}

fn int_op(op: BinaryOp, a: i64, b: i64) -> Result<i64> {
    let result = match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Subtract => a.checked_sub(b),
        BinaryOp::Multiply => a.checked_mul(b),
        BinaryOp::Divide | BinaryOp::Modulo if b == 0 => {
            return Err(Error::Evaluation("division by zero".to_string()))
        }
        BinaryOp::Divide => a.checked_div(b),
        _ => a.checked_rem(b),
    };
    result.ok_or_else(overflow)
}

fn mismatch(op: BinaryOp, left: &Value, right: &Value) -> Error {
    Error::TypeMismatch(format!(
        "{:?} not defined for {} and {}",
        op,
        left.kind_name(),
        right.kind_name()
    ))
}
