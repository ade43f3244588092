// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Combinator API for building expression trees.
//!
//! Every method checks types as it goes, so a tree that builds is a tree the
//! interpreter can run.
//!
//! # Example
//!
//! ```rust
//! use hdds_expr::{Catalog, ExprBuilder, StructBuilder};
//! use hdds_expr::types::PrimitiveKind;
//! use std::sync::Arc;
//!
//! let mut catalog = Catalog::with_builtins();
//! let item = catalog.register_struct(
//!     StructBuilder::new("sample.SampleItem")
//!         .field("Id", PrimitiveKind::I32)
//!         .field("Name", PrimitiveKind::String),
//! );
//! let b = ExprBuilder::new(Arc::new(catalog));
//!
//! // x => x.Name == "bbb" || x.Name == "aaa"
//! let x = b.parameter("x", item);
//! let left = b.equal(b.field(b.param(&x), "Name")?, b.string("bbb"))?;
//! let right = b.equal(b.field(b.param(&x), "Name")?, b.string("aaa"))?;
//! let predicate = b.lambda(b.or_else(left, right)?, vec![x])?;
//! # Ok::<(), hdds_expr::Error>(())
//! ```

use crate::error::{Error, Result};
use crate::expr::{
    BinaryExpr, BinaryOp, CallExpr, ConstantExpr, Expr, LambdaExpr, MemberExpr, NewArrayExpr,
    NewExpr, Parameter, UnaryExpr, UnaryOp,
};
use crate::registry::TypeRegistry;
use crate::types::{
    names, ConstructorInfo, MemberKind, MethodInfo, PrimitiveKind, TypeCatalog, TypeInfo,
    TypeKind, Value,
};
use std::sync::Arc;

/// Builds [`Expr`] trees against a catalog.
#[derive(Clone)]
pub struct ExprBuilder {
    catalog: Arc<dyn TypeCatalog>,
}

impl ExprBuilder {
    pub fn new(catalog: Arc<dyn TypeCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Arc<dyn TypeCatalog> {
        &self.catalog
    }

    // ========================================================================
    // Types
    // ========================================================================

    /// Resolve a canonical type name, including generic and array forms.
    pub fn type_named(&self, name: &str) -> Result<Arc<TypeInfo>> {
        TypeRegistry::new(Arc::clone(&self.catalog))
            .resolve_name(name)?
            .ok_or_else(|| Error::SymbolNotFound(format!("type {}", name)))
    }

    pub fn primitive(&self, kind: PrimitiveKind) -> Arc<TypeInfo> {
        TypeInfo::primitive(kind)
    }

    pub fn array_type(&self, element: Arc<TypeInfo>) -> Arc<TypeInfo> {
        TypeInfo::array_of(element)
    }

    /// Close a registered generic definition.
    pub fn generic_type(&self, definition: &str, args: Vec<Arc<TypeInfo>>) -> Result<Arc<TypeInfo>> {
        self.catalog
            .find_type(definition)
            .ok_or_else(|| Error::SymbolNotFound(format!("type {}", definition)))?
            .instantiate(args)
    }

    pub fn list_type(&self, element: Arc<TypeInfo>) -> Result<Arc<TypeInfo>> {
        self.generic_type(names::LIST, vec![element])
    }

    pub fn dictionary_type(&self, key: Arc<TypeInfo>, value: Arc<TypeInfo>) -> Result<Arc<TypeInfo>> {
        self.generic_type(names::DICTIONARY, vec![key, value])
    }

    // ========================================================================
    // Leaves
    // ========================================================================

    pub fn parameter(&self, name: impl Into<String>, ty: Arc<TypeInfo>) -> Parameter {
        Parameter::new(name, ty)
    }

    /// Reference a parameter inside a body.
    pub fn param(&self, parameter: &Parameter) -> Expr {
        Expr::Parameter(parameter.clone())
    }

    /// Constant of an explicit type.
    pub fn constant(&self, value: impl Into<Value>, ty: Arc<TypeInfo>) -> Expr {
        Expr::Constant(ConstantExpr {
            value: value.into(),
            ty,
        })
    }

    pub fn null(&self, ty: Arc<TypeInfo>) -> Expr {
        self.constant(Value::Null, ty)
    }

    pub fn string(&self, s: impl Into<String>) -> Expr {
        self.constant(Value::String(s.into()), TypeInfo::primitive(PrimitiveKind::String))
    }

    pub fn int(&self, v: i32) -> Expr {
        self.constant(v, TypeInfo::primitive(PrimitiveKind::I32))
    }

    pub fn long(&self, v: i64) -> Expr {
        self.constant(v, TypeInfo::primitive(PrimitiveKind::I64))
    }

    pub fn double(&self, v: f64) -> Expr {
        self.constant(v, TypeInfo::primitive(PrimitiveKind::F64))
    }

    pub fn boolean(&self, v: bool) -> Expr {
        self.constant(v, TypeInfo::primitive(PrimitiveKind::Bool))
    }

    /// Captured `string[]` value.
    pub fn string_array<S: AsRef<str>>(&self, items: &[S]) -> Expr {
        self.constant(
            Value::Array(items.iter().map(|s| Value::from(s.as_ref())).collect()),
            TypeInfo::array_of(TypeInfo::primitive(PrimitiveKind::String)),
        )
    }

    // ========================================================================
    // Members and calls
    // ========================================================================

    /// Field or property of `target`.
    pub fn member(&self, target: Expr, name: &str) -> Result<Expr> {
        let ty = target.result_type();
        let member = self.catalog.member(&ty, name).ok_or_else(|| {
            Error::SymbolNotFound(format!("{}.{}", ty.canonical_name(), name))
        })?;
        Ok(Expr::Member(MemberExpr {
            target: Box::new(target),
            member,
        }))
    }

    /// Field of `target`; properties are rejected.
    pub fn field(&self, target: Expr, name: &str) -> Result<Expr> {
        let expr = self.member(target, name)?;
        match &expr {
            Expr::Member(m) if matches!(m.member.kind(), MemberKind::Field(_)) => Ok(expr),
            _ => Err(Error::SymbolNotFound(format!("field {}", name))),
        }
    }

    /// Instance method call on `target`.
    pub fn call(&self, target: Expr, name: &str, args: Vec<Expr>) -> Result<Expr> {
        let ty = target.result_type();
        let candidates = self
            .catalog
            .methods(ty.name(), name)
            .into_iter()
            .filter(|m| !m.is_static() && !m.is_generic())
            .map(|m| Arc::new(m.close_over(&ty)))
            .collect();
        let method = select_overload(candidates, &args, || {
            format!("{}.{}", ty.canonical_name(), name)
        })?;
        Ok(Expr::Call(CallExpr {
            target: Some(Box::new(target)),
            method,
            arguments: args,
        }))
    }

    /// Non-generic static method call.
    pub fn call_static(&self, type_name: &str, name: &str, args: Vec<Expr>) -> Result<Expr> {
        let candidates = self
            .catalog
            .methods(type_name, name)
            .into_iter()
            .filter(|m| m.is_static() && !m.is_generic())
            .collect();
        let method = select_overload(candidates, &args, || format!("{}.{}", type_name, name))?;
        Ok(Expr::Call(CallExpr {
            target: None,
            method,
            arguments: args,
        }))
    }

    /// Generic static method call closed over `type_args`.
    pub fn call_generic(
        &self,
        type_name: &str,
        name: &str,
        type_args: Vec<Arc<TypeInfo>>,
        args: Vec<Expr>,
    ) -> Result<Expr> {
        let candidates = self
            .catalog
            .methods(type_name, name)
            .into_iter()
            .filter(|m| {
                m.is_static() && m.is_generic_definition() && m.generic_arity() == type_args.len()
            })
            .map(|m| m.make_generic(type_args.clone()))
            .collect::<Result<Vec<_>>>()?;
        let method = select_overload(candidates, &args, || {
            format!("{}.{}`{}", type_name, name, type_args.len())
        })?;
        Ok(Expr::Call(CallExpr {
            target: None,
            method,
            arguments: args,
        }))
    }

    /// `Enumerable.Contains<T>(source, item)` with `T` taken from `item`.
    pub fn contains(&self, source: Expr, item: Expr) -> Result<Expr> {
        let t = item.result_type();
        self.call_generic(names::ENUMERABLE, "Contains", vec![t], vec![source, item])
    }

    /// Indexer read, `target[key]`.
    pub fn index(&self, target: Expr, key: Expr) -> Result<Expr> {
        if matches!(target.result_type().kind(), TypeKind::Array) {
            return self.binary(BinaryOp::ArrayIndex, target, key);
        }
        self.call(target, "get_Item", vec![key])
    }

    /// Constructor call.
    pub fn new_object(&self, ty: &Arc<TypeInfo>, args: Vec<Expr>) -> Result<Expr> {
        let ctor: Arc<ConstructorInfo> = self
            .catalog
            .constructors(ty.name())
            .into_iter()
            .find(|c| arguments_fit(c.parameters(), &args))
            .ok_or_else(|| {
                Error::SymbolNotFound(format!("{}::new/{}", ty.canonical_name(), args.len()))
            })?;
        Ok(Expr::New(NewExpr {
            constructor: ctor,
            arguments: args,
        }))
    }

    /// Array initializer `new T[] { ... }`.
    pub fn new_array(&self, element: Arc<TypeInfo>, elements: Vec<Expr>) -> Result<Expr> {
        for e in &elements {
            let actual = e.result_type();
            if !element.is_assignable_from(&actual) {
                return Err(Error::TypeMismatch(format!(
                    "{} element in {}[] initializer",
                    actual.canonical_name(),
                    element.canonical_name()
                )));
            }
        }
        Ok(Expr::NewArray(NewArrayExpr {
            ty: TypeInfo::array_of(element),
            elements,
        }))
    }

    // ========================================================================
    // Operators
    // ========================================================================

    /// Binary operator with built-in semantics.
    pub fn binary(&self, op: BinaryOp, left: Expr, right: Expr) -> Result<Expr> {
        let ty = binary_result_type(op, &left.result_type(), &right.result_type())?;
        Ok(Expr::Binary(BinaryExpr {
            op,
            left: Box::new(left),
            right: Box::new(right),
            ty,
            method: None,
            conversion: None,
        }))
    }

    /// Binary operator implemented by a static method `(left, right) -> result`.
    pub fn binary_with_method(
        &self,
        op: BinaryOp,
        left: Expr,
        right: Expr,
        method: Arc<MethodInfo>,
    ) -> Result<Expr> {
        if !method.is_static() || method.parameters().len() != 2 {
            return Err(Error::TypeMismatch(format!(
                "operator method {} must be static with two parameters",
                method.signature()
            )));
        }
        if !arguments_fit(method.parameters(), &[left.clone(), right.clone()]) {
            return Err(Error::TypeMismatch(format!(
                "operands do not fit {}",
                method.signature()
            )));
        }
        Ok(Expr::Binary(BinaryExpr {
            op,
            left: Box::new(left),
            right: Box::new(right),
            ty: Arc::clone(method.return_type()),
            method: Some(method),
            conversion: None,
        }))
    }

    pub fn equal(&self, left: Expr, right: Expr) -> Result<Expr> {
        self.binary(BinaryOp::Equal, left, right)
    }

    pub fn not_equal(&self, left: Expr, right: Expr) -> Result<Expr> {
        self.binary(BinaryOp::NotEqual, left, right)
    }

    pub fn less_than(&self, left: Expr, right: Expr) -> Result<Expr> {
        self.binary(BinaryOp::LessThan, left, right)
    }

    pub fn greater_than(&self, left: Expr, right: Expr) -> Result<Expr> {
        self.binary(BinaryOp::GreaterThan, left, right)
    }

    pub fn and_also(&self, left: Expr, right: Expr) -> Result<Expr> {
        self.binary(BinaryOp::AndAlso, left, right)
    }

    pub fn or_else(&self, left: Expr, right: Expr) -> Result<Expr> {
        self.binary(BinaryOp::OrElse, left, right)
    }

    pub fn add(&self, left: Expr, right: Expr) -> Result<Expr> {
        self.binary(BinaryOp::Add, left, right)
    }

    /// `left ?? right`, optionally mapping a non-null `left` through `conversion`.
    pub fn coalesce(&self, left: Expr, right: Expr, conversion: Option<Expr>) -> Result<Expr> {
        let ty = match &conversion {
            None => binary_result_type(BinaryOp::Coalesce, &left.result_type(), &right.result_type())?,
            Some(Expr::Lambda(l)) if l.parameters.len() == 1 => {
                let out = l.return_type();
                if !out.is_assignable_from(&right.result_type()) {
                    return Err(Error::TypeMismatch(format!(
                        "coalesce fallback {} does not fit {}",
                        right.result_type().canonical_name(),
                        out.canonical_name()
                    )));
                }
                out
            }
            Some(_) => {
                return Err(Error::TypeMismatch(
                    "coalesce conversion must be a one-parameter lambda".into(),
                ))
            }
        };
        Ok(Expr::Binary(BinaryExpr {
            op: BinaryOp::Coalesce,
            left: Box::new(left),
            right: Box::new(right),
            ty,
            method: None,
            conversion: conversion.map(Box::new),
        }))
    }

    pub fn not(&self, operand: Expr) -> Result<Expr> {
        self.unary(UnaryOp::Not, operand)
    }

    pub fn negate(&self, operand: Expr) -> Result<Expr> {
        self.unary(UnaryOp::Negate, operand)
    }

    fn unary(&self, op: UnaryOp, operand: Expr) -> Result<Expr> {
        let ty = operand.result_type();
        let ok = match op {
            UnaryOp::Not => {
                ty.is_bool() || matches!(ty.primitive_kind(), Some(PrimitiveKind::I32 | PrimitiveKind::I64))
            }
            UnaryOp::Negate => ty.primitive_kind().map_or(false, |k| k.is_numeric()),
        };
        if !ok {
            return Err(Error::TypeMismatch(format!(
                "{:?} applied to {}",
                op,
                ty.canonical_name()
            )));
        }
        Ok(Expr::Unary(UnaryExpr {
            op,
            operand: Box::new(operand),
            ty,
        }))
    }

    // ========================================================================
    // Lambdas
    // ========================================================================

    /// Lambda over `parameters`; its type is `Func` of the parameter types and
    /// the body type.
    pub fn lambda(&self, body: Expr, parameters: Vec<Parameter>) -> Result<Expr> {
        let func = names::func(parameters.len()).ok_or_else(|| {
            Error::UnsupportedExpressionShape(format!(
                "lambda with {} parameters",
                parameters.len()
            ))
        })?;
        let mut args: Vec<Arc<TypeInfo>> = parameters.iter().map(|p| Arc::clone(p.ty())).collect();
        args.push(body.result_type());
        let ty = self.generic_type(func, args)?;
        Ok(Expr::Lambda(LambdaExpr {
            ty,
            body: Box::new(body),
            parameters,
            name: None,
            tail_call: false,
        }))
    }
}

fn arguments_fit(parameters: &[Arc<TypeInfo>], args: &[Expr]) -> bool {
    parameters.len() == args.len()
        && parameters
            .iter()
            .zip(args)
            .all(|(p, a)| p.is_assignable_from(&a.result_type()))
}

fn select_overload(
    candidates: Vec<Arc<MethodInfo>>,
    args: &[Expr],
    describe: impl FnOnce() -> String,
) -> Result<Arc<MethodInfo>> {
    candidates
        .into_iter()
        .find(|m| arguments_fit(m.parameters(), args))
        .ok_or_else(|| {
            let types: Vec<String> = args.iter().map(|a| a.result_type().canonical_name()).collect();
            Error::SymbolNotFound(format!("{}({})", describe(), types.join(",")))
        })
}

fn promoted(left: PrimitiveKind, right: PrimitiveKind) -> Option<PrimitiveKind> {
    let (l, r) = (left.numeric_rank()?, right.numeric_rank()?);
    Some(if l >= r { left } else { right })
}

fn binary_result_type(op: BinaryOp, left: &Arc<TypeInfo>, right: &Arc<TypeInfo>) -> Result<Arc<TypeInfo>> {
    let bool_ty = || TypeInfo::primitive(PrimitiveKind::Bool);
    let (lk, rk) = (left.primitive_kind(), right.primitive_kind());
    let mismatch = || {
        Error::TypeMismatch(format!(
            "{:?} not defined for {} and {}",
            op,
            left.canonical_name(),
            right.canonical_name()
        ))
    };

    match op {
        BinaryOp::AndAlso | BinaryOp::OrElse => {
            if left.is_bool() && right.is_bool() {
                Ok(bool_ty())
            } else {
                Err(mismatch())
            }
        }
        BinaryOp::Equal | BinaryOp::NotEqual => {
            let numeric = matches!((lk, rk), (Some(a), Some(b)) if a.is_numeric() && b.is_numeric());
            if numeric || left.is_assignable_from(right) || right.is_assignable_from(left) {
                Ok(bool_ty())
            } else {
                Err(mismatch())
            }
        }
        BinaryOp::LessThan
        | BinaryOp::LessThanOrEqual
        | BinaryOp::GreaterThan
        | BinaryOp::GreaterThanOrEqual => match (lk, rk) {
            (Some(a), Some(b)) if promoted(a, b).is_some() => Ok(bool_ty()),
            (Some(PrimitiveKind::String), Some(PrimitiveKind::String))
            | (Some(PrimitiveKind::Char), Some(PrimitiveKind::Char)) => Ok(bool_ty()),
            _ => Err(mismatch()),
        },
        BinaryOp::And | BinaryOp::Or | BinaryOp::ExclusiveOr => match (lk, rk) {
            (Some(PrimitiveKind::Bool), Some(PrimitiveKind::Bool)) => Ok(bool_ty()),
            (Some(a @ (PrimitiveKind::I32 | PrimitiveKind::I64)), Some(b @ (PrimitiveKind::I32 | PrimitiveKind::I64))) => {
                promoted(a, b).map(TypeInfo::primitive).ok_or_else(mismatch)
            }
            _ => Err(mismatch()),
        },
        BinaryOp::Add if lk == Some(PrimitiveKind::String) && rk == Some(PrimitiveKind::String) => {
            Ok(Arc::clone(left))
        }
        BinaryOp::Add
        | BinaryOp::Subtract
        | BinaryOp::Multiply
        | BinaryOp::Divide
        | BinaryOp::Modulo => match (lk, rk) {
            (Some(a), Some(b)) => promoted(a, b).map(TypeInfo::primitive).ok_or_else(mismatch),
            _ => Err(mismatch()),
        },
        BinaryOp::ArrayIndex => match (left.kind(), rk) {
            (TypeKind::Array, Some(PrimitiveKind::I32 | PrimitiveKind::I64)) => {
                left.element_type().cloned().ok_or_else(mismatch)
            }
            _ => Err(mismatch()),
        },
        BinaryOp::Coalesce => {
            if left.is_assignable_from(right) {
                Ok(Arc::clone(left))
            } else {
                Err(mismatch())
            }
        }
    }
}
