// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Serializable expression nodes.
//!
//! Wire shape of one node:
//!
//! ```text
//! { "n": <node type>, "t": "<result type key>", ["cr": true,] "$": "<tag>", ...payload }
//! ```
//!
//! | Tag | Node        | Payload                                          |
//! |-----|-------------|--------------------------------------------------|
//! | `L` | Lambda      | `b` body, `p` parameters, `nm` name, `tc` tail    |
//! | `P` | Parameter   | `nm` name, `br` by-ref                           |
//! | `B` | Binary      | `l`, `r`, `c` conversion, `m` operator method    |
//! | `M` | Member      | `e` target, `m` member                           |
//! | `C` | Constant    | `v` literal                                      |
//! | `X` | Call        | `e` target, `m` method, `a` arguments            |
//! | `N` | New         | `m` constructor, `a` arguments                   |
//! | `A` | NewArray    | `et` element type, `a` elements                  |

use crate::codec::literal;
use crate::error::{Error, Result};
use crate::expr::{
    BinaryExpr, BinaryOp, CallExpr, ConstantExpr, Expr, LambdaExpr, MemberExpr, NewArrayExpr,
    NewExpr, NodeType, UnpackSession,
};
use crate::registry::{ConstructorRef, MemberRef, MethodRef, TypeKey, TypeRegistry};
use crate::types::{TypeInfo, TypeKind};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

fn is_false(b: &bool) -> bool {
    !*b
}

/// One node of the serialized tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpressionNode {
    #[serde(rename = "n")]
    pub node_type: NodeType,
    #[serde(rename = "t")]
    pub result_type: TypeKey,
    #[serde(rename = "cr", default, skip_serializing_if = "is_false")]
    pub can_reduce: bool,
    #[serde(flatten)]
    pub payload: NodePayload,
}

/// Kind-specific part of a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "$")]
pub enum NodePayload {
    #[serde(rename = "L")]
    Lambda {
        #[serde(rename = "b")]
        body: Box<ExpressionNode>,
        #[serde(rename = "p", default)]
        parameters: Vec<ExpressionNode>,
        #[serde(rename = "nm", default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(rename = "tc", default, skip_serializing_if = "is_false")]
        tail_call: bool,
    },
    #[serde(rename = "P")]
    Parameter {
        #[serde(rename = "nm")]
        name: String,
        #[serde(rename = "br", default, skip_serializing_if = "is_false")]
        by_ref: bool,
    },
    #[serde(rename = "B")]
    Binary {
        #[serde(rename = "l")]
        left: Box<ExpressionNode>,
        #[serde(rename = "r")]
        right: Box<ExpressionNode>,
        #[serde(rename = "c", default, skip_serializing_if = "Option::is_none")]
        conversion: Option<Box<ExpressionNode>>,
        #[serde(rename = "m", default, skip_serializing_if = "Option::is_none")]
        method: Option<MethodRef>,
    },
    #[serde(rename = "M")]
    Member {
        #[serde(rename = "e")]
        target: Box<ExpressionNode>,
        #[serde(rename = "m")]
        member: MemberRef,
    },
    #[serde(rename = "C")]
    Constant {
        #[serde(rename = "v")]
        value: serde_json::Value,
    },
    #[serde(rename = "X")]
    Call {
        #[serde(rename = "e", default, skip_serializing_if = "Option::is_none")]
        target: Option<Box<ExpressionNode>>,
        #[serde(rename = "m")]
        method: MethodRef,
        #[serde(rename = "a", default)]
        arguments: Vec<ExpressionNode>,
    },
    #[serde(rename = "N")]
    New {
        #[serde(rename = "m")]
        constructor: ConstructorRef,
        #[serde(rename = "a", default)]
        arguments: Vec<ExpressionNode>,
    },
    #[serde(rename = "A")]
    NewArray {
        #[serde(rename = "et")]
        element_type: TypeKey,
        #[serde(rename = "a", default)]
        elements: Vec<ExpressionNode>,
    },
}

impl NodePayload {
    fn accepts(&self, node_type: NodeType) -> bool {
        match self {
            Self::Lambda { .. } => node_type == NodeType::Lambda,
            Self::Parameter { .. } => node_type == NodeType::Parameter,
            Self::Binary { .. } => BinaryOp::from_node_type(node_type).is_some(),
            Self::Member { .. } => node_type == NodeType::MemberAccess,
            Self::Constant { .. } => node_type == NodeType::Constant,
            Self::Call { .. } => node_type == NodeType::Call,
            Self::New { .. } => node_type == NodeType::New,
            Self::NewArray { .. } => node_type == NodeType::NewArrayInit,
        }
    }
}

// ============================================================================
// Pack
// ============================================================================

impl ExpressionNode {
    /// Convert a live expression, registering every type it touches.
    pub fn pack(expr: &Expr, registry: &TypeRegistry) -> Result<Self> {
        Self::pack_bounded(expr, registry, crate::config::DEFAULT_MAX_DEPTH)
    }

    /// [`ExpressionNode::pack`] with an explicit nesting limit.
    pub fn pack_bounded(expr: &Expr, registry: &TypeRegistry, max_depth: usize) -> Result<Self> {
        Packer {
            registry,
            max_depth,
        }
        .pack(expr, 0)
    }
}

struct Packer<'a> {
    registry: &'a TypeRegistry,
    max_depth: usize,
}

impl Packer<'_> {
    fn pack_all(&self, exprs: &[Expr], depth: usize) -> Result<Vec<ExpressionNode>> {
        exprs.iter().map(|e| self.pack(e, depth)).collect()
    }

    fn pack_boxed(&self, expr: &Expr, depth: usize) -> Result<Box<ExpressionNode>> {
        self.pack(expr, depth).map(Box::new)
    }

    fn pack(&self, expr: &Expr, depth: usize) -> Result<ExpressionNode> {
        if depth > self.max_depth {
            return Err(Error::DepthExceeded(self.max_depth));
        }
        let next = depth + 1;
        let registry = self.registry;

        let (result_type, payload) = match expr {
            Expr::Lambda(lambda) => (
                registry.pack(&lambda.ty, false)?,
                NodePayload::Lambda {
                    body: self.pack_boxed(&lambda.body, next)?,
                    parameters: lambda
                        .parameters
                        .iter()
                        .map(|p| self.pack(&Expr::Parameter(p.clone()), next))
                        .collect::<Result<_>>()?,
                    name: lambda.name.clone(),
                    tail_call: lambda.tail_call,
                },
            ),
            Expr::Parameter(p) => (
                registry.pack(p.ty(), false)?,
                NodePayload::Parameter {
                    name: p.name().to_string(),
                    by_ref: p.is_by_ref(),
                },
            ),
            Expr::Binary(b) => (
                registry.pack(&b.ty, false)?,
                NodePayload::Binary {
                    left: self.pack_boxed(&b.left, next)?,
                    right: self.pack_boxed(&b.right, next)?,
                    conversion: b
                        .conversion
                        .as_deref()
                        .map(|c| self.pack_boxed(c, next))
                        .transpose()?,
                    method: b
                        .method
                        .as_deref()
                        .map(|m| MethodRef::pack(m, registry))
                        .transpose()?,
                },
            ),
            Expr::Member(m) => {
                let member = MemberRef::pack(&m.member, registry)?;
                (
                    registry.pack(m.member.member_type(), false)?,
                    NodePayload::Member {
                        target: self.pack_boxed(&m.target, next)?,
                        member,
                    },
                )
            }
            Expr::Constant(c) => {
                if !literal::fits_depth(&c.value, self.max_depth.saturating_sub(depth)) {
                    return Err(Error::DepthExceeded(self.max_depth));
                }
                (
                    registry.pack(&c.ty, true)?,
                    NodePayload::Constant {
                        value: literal::to_json(&c.value)?,
                    },
                )
            }
            Expr::Call(c) => (
                registry.pack(c.method.return_type(), false)?,
                NodePayload::Call {
                    target: c
                        .target
                        .as_deref()
                        .map(|t| self.pack_boxed(t, next))
                        .transpose()?,
                    method: MethodRef::pack(&c.method, registry)?,
                    arguments: self.pack_all(&c.arguments, next)?,
                },
            ),
            Expr::New(n) => (
                registry.pack(n.constructor.declaring_type(), false)?,
                NodePayload::New {
                    constructor: ConstructorRef::pack(&n.constructor, registry)?,
                    arguments: self.pack_all(&n.arguments, next)?,
                },
            ),
            Expr::NewArray(a) => {
                let element = a.ty.element_type().ok_or_else(|| {
                    Error::UnsupportedExpressionShape(format!(
                        "array initializer of non-array type {}",
                        a.ty.canonical_name()
                    ))
                })?;
                (
                    registry.pack(&a.ty, false)?,
                    NodePayload::NewArray {
                        element_type: registry.pack(element, false)?,
                        elements: self.pack_all(&a.elements, next)?,
                    },
                )
            }
            Expr::Unary(u) => {
                return Err(Error::UnsupportedExpressionShape(format!(
                    "{:?} has no wire mapping",
                    u.op
                )))
            }
        };

        log::trace!("[node] packed {:?} at depth {}", expr.node_type(), depth);
        Ok(ExpressionNode {
            node_type: expr.node_type(),
            result_type,
            can_reduce: false,
            payload,
        })
    }
}

// ============================================================================
// Unpack
// ============================================================================

impl ExpressionNode {
    /// Rebuild the live expression, resolving every key and symbol.
    pub fn unpack(&self, session: &UnpackSession) -> Result<Expr> {
        self.unpack_at(session, 0)
    }

    fn unpack_at(&self, session: &UnpackSession, depth: usize) -> Result<Expr> {
        session.check_depth(depth)?;
        if !self.payload.accepts(self.node_type) {
            return Err(Error::Codec(format!(
                "node type {:?} does not match its payload",
                self.node_type
            )));
        }

        let next = depth + 1;
        let registry = session.registry();
        let ty = registry.resolve(&self.result_type)?;
        let unpack_all = |nodes: &[ExpressionNode]| -> Result<Vec<Expr>> {
            nodes.iter().map(|n| n.unpack_at(session, next)).collect()
        };

        let expr = match &self.payload {
            NodePayload::Lambda {
                body,
                parameters,
                name,
                tail_call,
            } => {
                let parameters = parameters
                    .iter()
                    .map(|p| match p.unpack_at(session, next)? {
                        Expr::Parameter(p) => Ok(p),
                        other => Err(Error::TypeMismatch(format!(
                            "lambda parameter list holds a {:?} node",
                            other.node_type()
                        ))),
                    })
                    .collect::<Result<Vec<_>>>()?;
                Expr::Lambda(LambdaExpr {
                    ty,
                    body: Box::new(body.unpack_at(session, next)?),
                    parameters,
                    name: name.clone(),
                    tail_call: *tail_call,
                })
            }
            NodePayload::Parameter { name, by_ref } => {
                Expr::Parameter(session.parameter(&ty, name, *by_ref))
            }
            NodePayload::Binary {
                left,
                right,
                conversion,
                method,
            } => {
                let op = BinaryOp::from_node_type(self.node_type).ok_or_else(|| {
                    Error::Codec(format!("{:?} is not a binary operator", self.node_type))
                })?;
                let conversion = match conversion {
                    Some(c) => match c.unpack_at(session, next)? {
                        lambda @ Expr::Lambda(_) => Some(Box::new(lambda)),
                        other => {
                            return Err(Error::TypeMismatch(format!(
                                "coalesce conversion is a {:?} node, expected a lambda",
                                other.node_type()
                            )))
                        }
                    },
                    None => None,
                };
                Expr::Binary(BinaryExpr {
                    op,
                    left: Box::new(left.unpack_at(session, next)?),
                    right: Box::new(right.unpack_at(session, next)?),
                    ty,
                    method: method.as_ref().map(|m| m.resolve(registry)).transpose()?,
                    conversion,
                })
            }
            NodePayload::Member { target, member } => Expr::Member(MemberExpr {
                target: Box::new(target.unpack_at(session, next)?),
                member: member.resolve(registry)?,
            }),
            NodePayload::Constant { value } => Expr::Constant(ConstantExpr {
                value: literal::from_json(value, &ty)?,
                ty,
            }),
            NodePayload::Call {
                target,
                method,
                arguments,
            } => Expr::Call(CallExpr {
                target: target
                    .as_ref()
                    .map(|t| t.unpack_at(session, next).map(Box::new))
                    .transpose()?,
                method: method.resolve(registry)?,
                arguments: unpack_all(arguments)?,
            }),
            NodePayload::New {
                constructor,
                arguments,
            } => Expr::New(NewExpr {
                constructor: constructor.resolve(registry)?,
                arguments: unpack_all(arguments)?,
            }),
            NodePayload::NewArray {
                element_type,
                elements,
            } => {
                let element = registry.resolve(element_type)?;
                Expr::NewArray(NewArrayExpr {
                    ty: array_type(ty, element)?,
                    elements: unpack_all(elements)?,
                })
            }
        };

        log::trace!("[node] unpacked {:?} at depth {}", self.node_type, depth);
        Ok(expr)
    }
}

fn array_type(declared: Arc<TypeInfo>, element: Arc<TypeInfo>) -> Result<Arc<TypeInfo>> {
    match declared.kind() {
        TypeKind::Array => Ok(declared),
        _ => Err(Error::TypeMismatch(format!(
            "array initializer of {} declared as {}",
            element.canonical_name(),
            declared.canonical_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{ExprBuilder, UnaryExpr, UnaryOp};
    use crate::types::{Catalog, PrimitiveKind, StructBuilder, TypeCatalog, Value};

    fn catalog() -> (Arc<dyn TypeCatalog>, Arc<TypeInfo>) {
        let mut catalog = Catalog::with_builtins();
        let item = catalog.register_struct(
            StructBuilder::new("sample.Item")
                .field("Id", PrimitiveKind::I32)
                .field("Name", PrimitiveKind::String),
        );
        (Arc::new(catalog), item)
    }

    fn name_equals(b: &ExprBuilder, item: &Arc<TypeInfo>, s: &str) -> Expr {
        let x = b.parameter("x", Arc::clone(item));
        let body = b
            .equal(b.field(b.param(&x), "Name").unwrap(), b.string(s))
            .unwrap();
        b.lambda(body, vec![x]).unwrap()
    }

    #[test]
    fn test_pack_wire_shape() {
        let (catalog, item) = catalog();
        let b = ExprBuilder::new(Arc::clone(&catalog));
        let registry = TypeRegistry::new(catalog);
        let node = ExpressionNode::pack(&name_equals(&b, &item, "bbb"), &registry).unwrap();

        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["n"], 20);
        assert_eq!(json["$"], "L");
        assert_eq!(json["b"]["$"], "B");
        assert_eq!(json["b"]["n"], 10);
        assert_eq!(json["b"]["l"]["$"], "M");
        assert_eq!(json["b"]["l"]["m"]["n"], "Name");
        assert_eq!(json["b"]["r"]["v"], "bbb");
        assert_eq!(json["p"][0]["nm"], "x");
        assert!(json.get("cr").is_none());

        let back: ExpressionNode = serde_json::from_value(json).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn test_unpack_shares_parameter_identity() {
        let (catalog, item) = catalog();
        let b = ExprBuilder::new(Arc::clone(&catalog));
        let registry = TypeRegistry::new(Arc::clone(&catalog));
        let node = ExpressionNode::pack(&name_equals(&b, &item, "bbb"), &registry).unwrap();

        let session = UnpackSession::new(
            TypeRegistry::with_descriptors(catalog, registry.descriptors()).unwrap(),
        );
        let expr = node.unpack(&session).unwrap();
        let lambda = expr.as_lambda().unwrap();
        let declared = &lambda.parameters[0];
        let used = match lambda.body.as_ref() {
            Expr::Binary(bin) => match bin.left.as_ref() {
                Expr::Member(m) => m.target.as_parameter().unwrap().clone(),
                other => panic!("unexpected {:?}", other),
            },
            other => panic!("unexpected {:?}", other),
        };
        assert!(declared.same_as(&used));
    }

    #[test]
    fn test_unary_has_no_wire_mapping() {
        let (catalog, _) = catalog();
        let registry = TypeRegistry::new(catalog);
        let expr = Expr::Unary(UnaryExpr {
            op: UnaryOp::Not,
            operand: Box::new(Expr::Constant(ConstantExpr {
                value: true.into(),
                ty: TypeInfo::primitive(PrimitiveKind::Bool),
            })),
            ty: TypeInfo::primitive(PrimitiveKind::Bool),
        });
        assert!(matches!(
            ExpressionNode::pack(&expr, &registry),
            Err(Error::UnsupportedExpressionShape(_))
        ));
    }

    #[test]
    fn test_mismatched_node_type_rejected() {
        let (catalog, item) = catalog();
        let b = ExprBuilder::new(Arc::clone(&catalog));
        let registry = TypeRegistry::new(Arc::clone(&catalog));
        let mut node = ExpressionNode::pack(&name_equals(&b, &item, "bbb"), &registry).unwrap();
        node.node_type = NodeType::Call;

        let session = UnpackSession::new(
            TypeRegistry::with_descriptors(catalog, registry.descriptors()).unwrap(),
        );
        assert!(matches!(node.unpack(&session), Err(Error::Codec(_))));
    }

    #[test]
    fn test_constant_nesting_counts_toward_depth() {
        let (catalog, _) = catalog();
        let registry = TypeRegistry::new(catalog);
        let mut nested = Value::I32(1);
        for _ in 0..8 {
            nested = Value::Array(vec![nested]);
        }
        let expr = Expr::Constant(ConstantExpr {
            value: nested,
            ty: TypeInfo::object(),
        });
        assert!(matches!(
            ExpressionNode::pack_bounded(&expr, &registry, 4),
            Err(Error::DepthExceeded(4))
        ));
        assert!(ExpressionNode::pack_bounded(&expr, &registry, 8).is_ok());
    }

    #[test]
    fn test_depth_limit_on_pack() {
        let (catalog, item) = catalog();
        let b = ExprBuilder::new(Arc::clone(&catalog));
        let registry = TypeRegistry::new(catalog);
        let lambda = name_equals(&b, &item, "bbb");
        assert!(matches!(
            ExpressionNode::pack_bounded(&lambda, &registry, 1),
            Err(Error::DepthExceeded(1))
        ));
        assert!(ExpressionNode::pack_bounded(&lambda, &registry, 3).is_ok());
    }
}
