// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Reconstruction of callables from expression trees.
//!
//! ```text
//! Decoded (ExpressionNode) --unpack--> Bound (Expr) --reconstruct--> Executable (Predicate)
//! ```
//!
//! All keys and symbols are resolved during unpack; [`reconstruct`] only
//! validates the shape, so a [`Predicate`] never fails on resolution.

mod interpreter;

pub use interpreter::{Env, Interpreter};

use crate::error::{Error, Result};
use crate::expr::{Expr, LambdaExpr};
use crate::types::{TypeInfo, Value};
use std::sync::Arc;

/// A lambda ready to be invoked.
#[derive(Debug, Clone)]
pub struct CompiledLambda {
    lambda: LambdaExpr,
    interpreter: Interpreter,
}

impl CompiledLambda {
    pub fn parameter_types(&self) -> Vec<Arc<TypeInfo>> {
        self.lambda
            .parameters
            .iter()
            .map(|p| Arc::clone(p.ty()))
            .collect()
    }

    pub fn return_type(&self) -> Arc<TypeInfo> {
        self.lambda.return_type()
    }

    pub fn lambda(&self) -> &LambdaExpr {
        &self.lambda
    }

    /// Call with positional arguments.
    pub fn invoke(&self, args: &[Value]) -> Result<Value> {
        let mut env = Env::new();
        self.interpreter.apply(&self.lambda, args, &mut env)
    }
}

/// A lambda evaluated as a value, together with the bindings it captured.
///
/// Nested lambdas (the predicate of `Enumerable.Any`, for instance) evaluate
/// to closures, so their bodies can still see the enclosing parameters.
#[derive(Clone)]
pub struct Closure {
    lambda: Arc<LambdaExpr>,
    env: Env,
    interpreter: Interpreter,
}

impl Closure {
    pub fn arity(&self) -> usize {
        self.lambda.parameters.len()
    }

    /// Call with positional arguments, on top of the captured bindings.
    pub fn call(&self, args: &[Value]) -> Result<Value> {
        let mut env = self.env.clone();
        self.interpreter.apply(&self.lambda, args, &mut env)
    }
}

impl std::fmt::Debug for Closure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Closure")
            .field("arity", &self.arity())
            .field("captured", &self.env.len())
            .finish_non_exhaustive()
    }
}

/// Closures are equal only to themselves.
impl PartialEq for Closure {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.lambda, &other.lambda)
    }
}

/// A single-argument boolean lambda.
#[derive(Debug, Clone)]
pub struct Predicate {
    inner: CompiledLambda,
}

impl Predicate {
    /// Type of the argument.
    pub fn input_type(&self) -> Arc<TypeInfo> {
        Arc::clone(self.inner.lambda.parameters[0].ty())
    }

    pub fn as_lambda(&self) -> &CompiledLambda {
        &self.inner
    }

    /// Evaluate the predicate on `input`.
    pub fn call(&self, input: &Value) -> Result<bool> {
        match self.inner.invoke(std::slice::from_ref(input))? {
            Value::Bool(b) => Ok(b),
            other => Err(Error::TypeMismatch(format!(
                "predicate returned {}",
                other.kind_name()
            ))),
        }
    }
}

/// Wrap any lambda expression.
pub fn compile(expr: Expr) -> Result<CompiledLambda> {
    compile_with(expr, Interpreter::default())
}

pub fn compile_with(expr: Expr, interpreter: Interpreter) -> Result<CompiledLambda> {
    match expr {
        Expr::Lambda(lambda) => Ok(CompiledLambda {
            lambda,
            interpreter,
        }),
        other => Err(Error::TypeMismatch(format!(
            "expected a lambda, got {:?} node",
            other.node_type()
        ))),
    }
}

/// Turn a bound tree into a callable predicate.
///
/// The tree must be a lambda with exactly one parameter and a boolean body.
pub fn reconstruct(expr: Expr) -> Result<Predicate> {
    reconstruct_with(expr, Interpreter::default())
}

pub fn reconstruct_with(expr: Expr, interpreter: Interpreter) -> Result<Predicate> {
    let inner = compile_with(expr, interpreter)?;
    if inner.lambda.parameters.len() != 1 {
        return Err(Error::TypeMismatch(format!(
            "predicate takes one argument, lambda declares {}",
            inner.lambda.parameters.len()
        )));
    }
    let returns = inner.return_type();
    if !returns.is_bool() {
        return Err(Error::TypeMismatch(format!(
            "predicate must return {}, lambda returns {}",
            crate::types::names::BOOLEAN,
            returns.canonical_name()
        )));
    }
    log::debug!(
        "[eval] predicate over {} ready",
        inner.lambda.parameters[0].ty().canonical_name()
    );
    Ok(Predicate { inner })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::ExprBuilder;
    use crate::types::{Catalog, PrimitiveKind, StructBuilder};

    fn setup() -> (ExprBuilder, Arc<TypeInfo>) {
        let mut catalog = Catalog::with_builtins();
        let item = catalog.register_struct(
            StructBuilder::new("sample.Item")
                .field("Id", PrimitiveKind::I32)
                .field("Name", PrimitiveKind::String),
        );
        (ExprBuilder::new(Arc::new(catalog)), item)
    }

    fn item(id: i32, name: &str) -> Value {
        Value::structure([("Id", Value::I32(id)), ("Name", Value::from(name))])
    }

    #[test]
    fn test_predicate_short_circuits() {
        let (b, ty) = setup();
        let x = b.parameter("x", ty);
        // x.Id == 1 || x.Name.Length > 100 with a null Name never reads Length
        let left = b.equal(b.field(b.param(&x), "Id").unwrap(), b.int(1)).unwrap();
        let length = b
            .member(b.field(b.param(&x), "Name").unwrap(), "Length")
            .unwrap();
        let right = b.greater_than(length, b.int(100)).unwrap();
        let predicate = reconstruct(b.lambda(b.or_else(left, right).unwrap(), vec![x]).unwrap()).unwrap();

        let null_name = Value::structure([("Id", Value::I32(1)), ("Name", Value::Null)]);
        assert!(predicate.call(&null_name).unwrap());
        assert!(predicate.call(&Value::structure([("Id", Value::I32(2)), ("Name", Value::Null)])).is_err());
    }

    #[test]
    fn test_not_and_negate_evaluate() {
        let (b, ty) = setup();
        let x = b.parameter("x", ty);
        let id = b.field(b.param(&x), "Id").unwrap();
        let body = b
            .not(b.equal(b.negate(id).unwrap(), b.int(-1)).unwrap())
            .unwrap();
        let predicate = reconstruct(b.lambda(body, vec![x]).unwrap()).unwrap();
        assert!(!predicate.call(&item(1, "a")).unwrap());
        assert!(predicate.call(&item(2, "a")).unwrap());
    }

    #[test]
    fn test_reconstruct_rejects_non_predicates() {
        let (b, ty) = setup();
        let x = b.parameter("x", ty);
        let name = b.field(b.param(&x), "Name").unwrap();
        assert!(reconstruct(b.lambda(name, vec![x.clone()]).unwrap()).is_err());
        assert!(reconstruct(b.boolean(true)).is_err());

        let y = b.parameter("y", b.primitive(PrimitiveKind::I32));
        let two = b.lambda(b.boolean(true), vec![x, y]).unwrap();
        assert!(reconstruct(two.clone()).is_err());
        assert_eq!(
            compile(two)
                .unwrap()
                .invoke(&[Value::Null, Value::I32(1)])
                .unwrap(),
            Value::Bool(true)
        );
    }

    #[test]
    fn test_coalesce_with_conversion() {
        let (b, ty) = setup();
        let x = b.parameter("x", ty);
        let s = b.parameter("s", b.primitive(PrimitiveKind::String));
        let conversion = b
            .lambda(b.call(b.param(&s), "ToUpper", vec![]).unwrap(), vec![s])
            .unwrap();
        let value = b
            .coalesce(b.field(b.param(&x), "Name").unwrap(), b.string("NONE"), Some(conversion))
            .unwrap();
        let body = b.equal(value, b.string("BBB")).unwrap();
        let predicate = reconstruct(b.lambda(body, vec![x]).unwrap()).unwrap();

        assert!(predicate.call(&item(1, "bbb")).unwrap());
        let none = Value::structure([("Id", Value::I32(1)), ("Name", Value::Null)]);
        assert!(!predicate.call(&none).unwrap());
    }
}
