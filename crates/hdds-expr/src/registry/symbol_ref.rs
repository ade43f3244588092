// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Serializable references to methods, constructors and members.
//!
//! Resolution looks the symbol up in the receiver's catalog by declaring type
//! and name, then keeps the single overload whose parameter list has the same
//! length and shape (see [`shape_matches`]). Zero or several survivors are a
//! [`Error::SymbolNotFound`].

use crate::error::{Error, Result};
use crate::registry::descriptor::TypeKey;
use crate::registry::type_registry::TypeRegistry;
use crate::types::{shape_matches, ConstructorInfo, MemberInfo, MethodInfo, TypeInfo};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

fn pack_all(registry: &TypeRegistry, types: &[Arc<TypeInfo>]) -> Result<Vec<TypeKey>> {
    types.iter().map(|t| registry.pack(t, false)).collect()
}

fn resolve_all(registry: &TypeRegistry, keys: &[TypeKey]) -> Result<Vec<Arc<TypeInfo>>> {
    keys.iter().map(|k| registry.resolve(k)).collect()
}

fn parameters_match(expected: &[Arc<TypeInfo>], actual: &[Arc<TypeInfo>]) -> bool {
    expected.len() == actual.len()
        && expected
            .iter()
            .zip(actual)
            .all(|(e, a)| shape_matches(e, a))
}

fn single<T>(mut candidates: Vec<T>, describe: impl FnOnce() -> String) -> Result<T> {
    match candidates.len() {
        1 => Ok(candidates.remove(0)),
        0 => Err(Error::SymbolNotFound(describe())),
        n => Err(Error::SymbolNotFound(format!(
            "{} ({} overloads match)",
            describe(),
            n
        ))),
    }
}

fn describe_call(declaring: &TypeInfo, name: &str, params: &[Arc<TypeInfo>]) -> String {
    let params: Vec<String> = params.iter().map(|p| p.canonical_name()).collect();
    format!("{}.{}({})", declaring.canonical_name(), name, params.join(","))
}

// ---------------------------------------------------------------------------
// Methods
// ---------------------------------------------------------------------------

/// Reference to a (possibly generic) method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodRef {
    #[serde(rename = "d")]
    pub declaring_type: TypeKey,
    #[serde(rename = "n")]
    pub name: String,
    #[serde(rename = "p", default, skip_serializing_if = "Vec::is_empty")]
    pub parameter_types: Vec<TypeKey>,
    #[serde(rename = "g", default, skip_serializing_if = "Option::is_none")]
    pub generic_arity: Option<usize>,
    #[serde(rename = "a", default, skip_serializing_if = "Vec::is_empty")]
    pub generic_args: Vec<TypeKey>,
}

impl MethodRef {
    /// Describe a closed method.
    pub fn pack(method: &MethodInfo, registry: &TypeRegistry) -> Result<Self> {
        if method.is_generic_definition() {
            return Err(Error::UnsupportedExpressionShape(format!(
                "open generic method {}",
                method.signature()
            )));
        }
        Ok(Self {
            declaring_type: registry.pack(method.declaring_type(), false)?,
            name: method.name().to_string(),
            parameter_types: pack_all(registry, method.parameters())?,
            generic_arity: method.is_generic().then(|| method.generic_arity()),
            generic_args: pack_all(registry, method.generic_args())?,
        })
    }

    /// Find the matching overload and close it over the captured generic arguments.
    pub fn resolve(&self, registry: &TypeRegistry) -> Result<Arc<MethodInfo>> {
        let declaring = registry.resolve(&self.declaring_type)?;
        let params = resolve_all(registry, &self.parameter_types)?;
        let arity = self.generic_arity.unwrap_or(0);

        let candidates: Vec<Arc<MethodInfo>> = registry
            .catalog()
            .methods(declaring.name(), &self.name)
            .into_iter()
            .filter(|m| m.generic_arity() == arity && parameters_match(m.parameters(), &params))
            .collect();
        let definition = single(candidates, || describe_call(&declaring, &self.name, &params))?;

        let method = definition.close_over(&declaring);
        if arity == 0 {
            return Ok(Arc::new(method));
        }
        let args = resolve_all(registry, &self.generic_args)?;
        let closed = method.make_generic(args)?;
        log::trace!("[symbols] resolved {}", closed.signature());
        Ok(closed)
    }
}

// ---------------------------------------------------------------------------
// Constructors
// ---------------------------------------------------------------------------

/// Reference to a constructor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructorRef {
    #[serde(rename = "d")]
    pub declaring_type: TypeKey,
    #[serde(rename = "p", default, skip_serializing_if = "Vec::is_empty")]
    pub parameter_types: Vec<TypeKey>,
}

impl ConstructorRef {
    pub fn pack(ctor: &ConstructorInfo, registry: &TypeRegistry) -> Result<Self> {
        Ok(Self {
            declaring_type: registry.pack(ctor.declaring_type(), false)?,
            parameter_types: pack_all(registry, ctor.parameters())?,
        })
    }

    pub fn resolve(&self, registry: &TypeRegistry) -> Result<Arc<ConstructorInfo>> {
        let declaring = registry.resolve(&self.declaring_type)?;
        let params = resolve_all(registry, &self.parameter_types)?;

        let candidates: Vec<Arc<ConstructorInfo>> = registry
            .catalog()
            .constructors(declaring.name())
            .into_iter()
            .filter(|c| parameters_match(c.parameters(), &params))
            .collect();
        single(candidates, || describe_call(&declaring, "new", &params))
    }
}

// ---------------------------------------------------------------------------
// Members
// ---------------------------------------------------------------------------

/// Reference to a public field or property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRef {
    #[serde(rename = "d")]
    pub declaring_type: TypeKey,
    #[serde(rename = "n")]
    pub name: String,
}

impl MemberRef {
    /// Describe a member; private fields are refused.
    pub fn pack(member: &MemberInfo, registry: &TypeRegistry) -> Result<Self> {
        if !member.is_public() {
            return Err(Error::PrivateAccessDenied {
                type_name: member.declaring_type().canonical_name(),
                member: member.name().to_string(),
            });
        }
        Ok(Self {
            declaring_type: registry.pack(member.declaring_type(), false)?,
            name: member.name().to_string(),
        })
    }

    pub fn resolve(&self, registry: &TypeRegistry) -> Result<MemberInfo> {
        let declaring = registry.resolve(&self.declaring_type)?;
        registry
            .catalog()
            .member(&declaring, &self.name)
            .ok_or_else(|| {
                Error::SymbolNotFound(format!("{}.{}", declaring.canonical_name(), self.name))
            })
    }
}
