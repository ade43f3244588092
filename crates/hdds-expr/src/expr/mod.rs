// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Live expression trees.
//!
//! [`Expr`] is the in-memory form callers build with [`ExprBuilder`] and the
//! interpreter evaluates. [`ExpressionNode`] is its serializable twin; the
//! two convert with [`ExpressionNode::pack`] and [`ExpressionNode::unpack`].

mod builder;
mod node;
mod session;

pub use builder::ExprBuilder;
pub use node::{ExpressionNode, NodePayload};
pub use session::UnpackSession;

use crate::error::Error;
use crate::types::{ConstructorInfo, MemberInfo, MethodInfo, TypeInfo, Value};
use std::fmt;
use std::sync::Arc;

// ============================================================================
// Parameters
// ============================================================================

#[derive(Debug)]
struct ParameterData {
    name: String,
    ty: Arc<TypeInfo>,
    by_ref: bool,
}

/// A lambda parameter.
///
/// Clones share identity; two parameters are the same variable only when
/// [`Parameter::same_as`] holds, regardless of name and type.
#[derive(Clone)]
pub struct Parameter(Arc<ParameterData>);

impl Parameter {
    pub fn new(name: impl Into<String>, ty: Arc<TypeInfo>) -> Self {
        Self::with_by_ref(name, ty, false)
    }

    pub fn with_by_ref(name: impl Into<String>, ty: Arc<TypeInfo>, by_ref: bool) -> Self {
        Self(Arc::new(ParameterData {
            name: name.into(),
            ty,
            by_ref,
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn ty(&self) -> &Arc<TypeInfo> {
        &self.0.ty
    }

    pub fn is_by_ref(&self) -> bool {
        self.0.by_ref
    }

    /// Identity comparison.
    pub fn same_as(&self, other: &Parameter) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Parameter({}: {})", self.0.name, self.0.ty.canonical_name())
    }
}

// ============================================================================
// Node types and operators
// ============================================================================

/// Compact discriminator carried in every node header.
///
/// Binary nodes use the discriminator of their operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum NodeType {
    Add = 0,
    Subtract = 1,
    Multiply = 2,
    Divide = 3,
    Modulo = 4,
    And = 5,
    Or = 6,
    ExclusiveOr = 7,
    AndAlso = 8,
    OrElse = 9,
    Equal = 10,
    NotEqual = 11,
    LessThan = 12,
    LessThanOrEqual = 13,
    GreaterThan = 14,
    GreaterThanOrEqual = 15,
    ArrayIndex = 16,
    Coalesce = 17,

    Lambda = 20,
    Parameter = 21,
    Constant = 22,
    MemberAccess = 23,
    Call = 24,
    New = 25,
    NewArrayInit = 26,

    Not = 30,
    Negate = 31,
}

const NODE_TYPES: [NodeType; 27] = [
    NodeType::Add,
    NodeType::Subtract,
    NodeType::Multiply,
    NodeType::Divide,
    NodeType::Modulo,
    NodeType::And,
    NodeType::Or,
    NodeType::ExclusiveOr,
    NodeType::AndAlso,
    NodeType::OrElse,
    NodeType::Equal,
    NodeType::NotEqual,
    NodeType::LessThan,
    NodeType::LessThanOrEqual,
    NodeType::GreaterThan,
    NodeType::GreaterThanOrEqual,
    NodeType::ArrayIndex,
    NodeType::Coalesce,
    NodeType::Lambda,
    NodeType::Parameter,
    NodeType::Constant,
    NodeType::MemberAccess,
    NodeType::Call,
    NodeType::New,
    NodeType::NewArrayInit,
    NodeType::Not,
    NodeType::Negate,
];

impl From<NodeType> for u8 {
    fn from(t: NodeType) -> u8 {
        t as u8
    }
}

impl TryFrom<u8> for NodeType {
    type Error = Error;

    fn try_from(v: u8) -> Result<Self, Error> {
        NODE_TYPES
            .iter()
            .copied()
            .find(|t| *t as u8 == v)
            .ok_or_else(|| Error::Codec(format!("unknown node type {}", v)))
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    And,
    Or,
    ExclusiveOr,
    AndAlso,
    OrElse,
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    ArrayIndex,
    Coalesce,
}

impl BinaryOp {
    pub fn node_type(self) -> NodeType {
        match self {
            Self::Add => NodeType::Add,
            Self::Subtract => NodeType::Subtract,
            Self::Multiply => NodeType::Multiply,
            Self::Divide => NodeType::Divide,
            Self::Modulo => NodeType::Modulo,
            Self::And => NodeType::And,
            Self::Or => NodeType::Or,
            Self::ExclusiveOr => NodeType::ExclusiveOr,
            Self::AndAlso => NodeType::AndAlso,
            Self::OrElse => NodeType::OrElse,
            Self::Equal => NodeType::Equal,
            Self::NotEqual => NodeType::NotEqual,
            Self::LessThan => NodeType::LessThan,
            Self::LessThanOrEqual => NodeType::LessThanOrEqual,
            Self::GreaterThan => NodeType::GreaterThan,
            Self::GreaterThanOrEqual => NodeType::GreaterThanOrEqual,
            Self::ArrayIndex => NodeType::ArrayIndex,
            Self::Coalesce => NodeType::Coalesce,
        }
    }

    /// Operator of a binary node type, `None` for other node types.
    pub fn from_node_type(t: NodeType) -> Option<Self> {
        Some(match t {
            NodeType::Add => Self::Add,
            NodeType::Subtract => Self::Subtract,
            NodeType::Multiply => Self::Multiply,
            NodeType::Divide => Self::Divide,
            NodeType::Modulo => Self::Modulo,
            NodeType::And => Self::And,
            NodeType::Or => Self::Or,
            NodeType::ExclusiveOr => Self::ExclusiveOr,
            NodeType::AndAlso => Self::AndAlso,
            NodeType::OrElse => Self::OrElse,
            NodeType::Equal => Self::Equal,
            NodeType::NotEqual => Self::NotEqual,
            NodeType::LessThan => Self::LessThan,
            NodeType::LessThanOrEqual => Self::LessThanOrEqual,
            NodeType::GreaterThan => Self::GreaterThan,
            NodeType::GreaterThanOrEqual => Self::GreaterThanOrEqual,
            NodeType::ArrayIndex => Self::ArrayIndex,
            NodeType::Coalesce => Self::Coalesce,
            _ => return None,
        })
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Equal
                | Self::NotEqual
                | Self::LessThan
                | Self::LessThanOrEqual
                | Self::GreaterThan
                | Self::GreaterThanOrEqual
        )
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            Self::Add | Self::Subtract | Self::Multiply | Self::Divide | Self::Modulo
        )
    }
}

/// Unary operators. These are evaluated but never serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Not,
    Negate,
}

impl UnaryOp {
    pub fn node_type(self) -> NodeType {
        match self {
            Self::Not => NodeType::Not,
            Self::Negate => NodeType::Negate,
        }
    }
}

// ============================================================================
// Expression tree
// ============================================================================

/// A live expression.
#[derive(Debug, Clone)]
pub enum Expr {
    Lambda(LambdaExpr),
    Parameter(Parameter),
    Binary(BinaryExpr),
    Member(MemberExpr),
    Constant(ConstantExpr),
    Call(CallExpr),
    New(NewExpr),
    NewArray(NewArrayExpr),
    Unary(UnaryExpr),
}

#[derive(Debug, Clone)]
pub struct LambdaExpr {
    /// `Func` type of the lambda.
    pub ty: Arc<TypeInfo>,
    pub body: Box<Expr>,
    pub parameters: Vec<Parameter>,
    pub name: Option<String>,
    pub tail_call: bool,
}

impl LambdaExpr {
    /// Type of the body.
    pub fn return_type(&self) -> Arc<TypeInfo> {
        self.body.result_type()
    }
}

#[derive(Debug, Clone)]
pub struct BinaryExpr {
    pub op: BinaryOp,
    pub left: Box<Expr>,
    pub right: Box<Expr>,
    pub ty: Arc<TypeInfo>,
    /// User-defined operator implementation, called with `(left, right)`.
    pub method: Option<Arc<MethodInfo>>,
    /// Conversion applied to a non-null left operand of `Coalesce`.
    pub conversion: Option<Box<Expr>>,
}

#[derive(Debug, Clone)]
pub struct MemberExpr {
    pub target: Box<Expr>,
    pub member: MemberInfo,
}

#[derive(Debug, Clone)]
pub struct ConstantExpr {
    pub value: Value,
    pub ty: Arc<TypeInfo>,
}

#[derive(Debug, Clone)]
pub struct CallExpr {
    /// `None` for static methods.
    pub target: Option<Box<Expr>>,
    pub method: Arc<MethodInfo>,
    pub arguments: Vec<Expr>,
}

#[derive(Debug, Clone)]
pub struct NewExpr {
    pub constructor: Arc<ConstructorInfo>,
    pub arguments: Vec<Expr>,
}

#[derive(Debug, Clone)]
pub struct NewArrayExpr {
    /// Array type (not the element type).
    pub ty: Arc<TypeInfo>,
    pub elements: Vec<Expr>,
}

#[derive(Debug, Clone)]
pub struct UnaryExpr {
    pub op: UnaryOp,
    pub operand: Box<Expr>,
    pub ty: Arc<TypeInfo>,
}

impl Expr {
    /// Static type of the expression's value.
    pub fn result_type(&self) -> Arc<TypeInfo> {
        match self {
            Expr::Lambda(l) => Arc::clone(&l.ty),
            Expr::Parameter(p) => Arc::clone(p.ty()),
            Expr::Binary(b) => Arc::clone(&b.ty),
            Expr::Member(m) => Arc::clone(m.member.member_type()),
            Expr::Constant(c) => Arc::clone(&c.ty),
            Expr::Call(c) => Arc::clone(c.method.return_type()),
            Expr::New(n) => Arc::clone(n.constructor.declaring_type()),
            Expr::NewArray(a) => Arc::clone(&a.ty),
            Expr::Unary(u) => Arc::clone(&u.ty),
        }
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            Expr::Lambda(_) => NodeType::Lambda,
            Expr::Parameter(_) => NodeType::Parameter,
            Expr::Binary(b) => b.op.node_type(),
            Expr::Member(_) => NodeType::MemberAccess,
            Expr::Constant(_) => NodeType::Constant,
            Expr::Call(_) => NodeType::Call,
            Expr::New(_) => NodeType::New,
            Expr::NewArray(_) => NodeType::NewArrayInit,
            Expr::Unary(u) => u.op.node_type(),
        }
    }

    pub fn as_lambda(&self) -> Option<&LambdaExpr> {
        match self {
            Expr::Lambda(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_parameter(&self) -> Option<&Parameter> {
        match self {
            Expr::Parameter(p) => Some(p),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PrimitiveKind;

    #[test]
    fn test_parameter_identity() {
        let ty = TypeInfo::primitive(PrimitiveKind::String);
        let a = Parameter::new("x", Arc::clone(&ty));
        let b = Parameter::new("x", ty);
        assert!(a.same_as(&a.clone()));
        assert!(!a.same_as(&b));
    }

    #[test]
    fn test_node_type_wire_value() {
        assert_eq!(serde_json::to_string(&NodeType::OrElse).unwrap(), "9");
        let t: NodeType = serde_json::from_str("26").unwrap();
        assert_eq!(t, NodeType::NewArrayInit);
        assert!(serde_json::from_str::<NodeType>("99").is_err());
    }

    #[test]
    fn test_binary_op_node_type_mapping() {
        for t in NODE_TYPES {
            if let Some(op) = BinaryOp::from_node_type(t) {
                assert_eq!(op.node_type(), t);
            }
        }
        assert_eq!(BinaryOp::from_node_type(NodeType::Call), None);
    }
}
