// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Live method, constructor and member handles.

use crate::error::{Error, Result};
use crate::types::{FieldInfo, TypeInfo, Value, Visibility};
use std::fmt;
use std::sync::Arc;

/// Native body of a method: `(target, arguments) -> result`.
pub type NativeMethod = Arc<dyn Fn(Option<&Value>, &[Value]) -> Result<Value> + Send + Sync>;

/// Native body of a constructor.
pub type NativeConstructor = Arc<dyn Fn(&[Value]) -> Result<Value> + Send + Sync>;

/// Native property getter.
pub type NativeGetter = Arc<dyn Fn(&Value) -> Result<Value> + Send + Sync>;

/// A callable method handle.
///
/// A method with `generic_arity > 0` and no generic arguments is a generic
/// definition; [`MethodInfo::make_generic`] closes it.
#[derive(Clone)]
pub struct MethodInfo {
    declaring_type: Arc<TypeInfo>,
    name: String,
    parameters: Vec<Arc<TypeInfo>>,
    return_type: Arc<TypeInfo>,
    is_static: bool,
    generic_arity: usize,
    generic_args: Vec<Arc<TypeInfo>>,
    body: NativeMethod,
}

impl fmt::Debug for MethodInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodInfo")
            .field("signature", &self.signature())
            .field("is_static", &self.is_static)
            .finish_non_exhaustive()
    }
}

impl MethodInfo {
    /// Create an instance method.
    pub fn new(
        declaring_type: Arc<TypeInfo>,
        name: impl Into<String>,
        parameters: Vec<Arc<TypeInfo>>,
        return_type: Arc<TypeInfo>,
        body: NativeMethod,
    ) -> Self {
        Self {
            declaring_type,
            name: name.into(),
            parameters,
            return_type,
            is_static: false,
            generic_arity: 0,
            generic_args: Vec::new(),
            body,
        }
    }

    /// Create a static method.
    pub fn new_static(
        declaring_type: Arc<TypeInfo>,
        name: impl Into<String>,
        parameters: Vec<Arc<TypeInfo>>,
        return_type: Arc<TypeInfo>,
        body: NativeMethod,
    ) -> Self {
        Self {
            is_static: true,
            ..Self::new(declaring_type, name, parameters, return_type, body)
        }
    }

    /// Declare the method generic over `arity` method parameters (`!!0`..).
    #[must_use]
    pub fn with_generic_arity(mut self, arity: usize) -> Self {
        self.generic_arity = arity;
        self
    }

    pub fn declaring_type(&self) -> &Arc<TypeInfo> {
        &self.declaring_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[Arc<TypeInfo>] {
        &self.parameters
    }

    pub fn return_type(&self) -> &Arc<TypeInfo> {
        &self.return_type
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub fn generic_arity(&self) -> usize {
        self.generic_arity
    }

    pub fn generic_args(&self) -> &[Arc<TypeInfo>] {
        &self.generic_args
    }

    /// Check if the method is generic (open or closed).
    pub fn is_generic(&self) -> bool {
        self.generic_arity > 0
    }

    /// Check if the method is an open generic definition.
    pub fn is_generic_definition(&self) -> bool {
        self.generic_arity > 0 && self.generic_args.is_empty()
    }

    /// Human-readable signature, e.g. `sys.String.StartsWith(sys.String)`.
    pub fn signature(&self) -> String {
        let params: Vec<String> = self.parameters.iter().map(|p| p.canonical_name()).collect();
        let generics = if self.generic_args.is_empty() {
            String::new()
        } else {
            let args: Vec<String> = self.generic_args.iter().map(|a| a.canonical_name()).collect();
            format!("<{}>", args.join(","))
        };
        format!(
            "{}.{}{}({})",
            self.declaring_type.canonical_name(),
            self.name,
            generics,
            params.join(",")
        )
    }

    /// Close a generic method definition over `args`.
    pub fn make_generic(&self, args: Vec<Arc<TypeInfo>>) -> Result<Arc<MethodInfo>> {
        if !self.is_generic_definition() {
            return Err(Error::TypeMismatch(format!(
                "{} is not a generic method definition",
                self.signature()
            )));
        }
        if args.len() != self.generic_arity {
            return Err(Error::TypeMismatch(format!(
                "{} expects {} type arguments, got {}",
                self.signature(),
                self.generic_arity,
                args.len()
            )));
        }
        let type_args = self.declaring_type.generic_args().to_vec();
        Ok(Arc::new(Self {
            parameters: self
                .parameters
                .iter()
                .map(|p| p.substitute(&type_args, &args))
                .collect(),
            return_type: self.return_type.substitute(&type_args, &args),
            generic_args: args,
            ..self.clone()
        }))
    }

    /// Rebind the method onto a closed instantiation of its declaring type.
    pub fn close_over(&self, declaring_type: &Arc<TypeInfo>) -> MethodInfo {
        let type_args = declaring_type.generic_args();
        Self {
            declaring_type: Arc::clone(declaring_type),
            parameters: self
                .parameters
                .iter()
                .map(|p| p.substitute(type_args, &self.generic_args))
                .collect(),
            return_type: self.return_type.substitute(type_args, &self.generic_args),
            ..self.clone()
        }
    }

    /// Invoke the native body.
    pub fn invoke(&self, target: Option<&Value>, args: &[Value]) -> Result<Value> {
        if args.len() != self.parameters.len() {
            return Err(Error::Evaluation(format!(
                "{} takes {} arguments, got {}",
                self.signature(),
                self.parameters.len(),
                args.len()
            )));
        }
        if !self.is_static && target.map_or(true, Value::is_null) {
            return Err(Error::Evaluation(format!(
                "null target calling {}",
                self.signature()
            )));
        }
        (self.body)(target, args)
    }
}

/// A constructor handle.
#[derive(Clone)]
pub struct ConstructorInfo {
    declaring_type: Arc<TypeInfo>,
    parameters: Vec<Arc<TypeInfo>>,
    body: NativeConstructor,
}

impl fmt::Debug for ConstructorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorInfo")
            .field("signature", &self.signature())
            .finish_non_exhaustive()
    }
}

impl ConstructorInfo {
    pub fn new(
        declaring_type: Arc<TypeInfo>,
        parameters: Vec<Arc<TypeInfo>>,
        body: NativeConstructor,
    ) -> Self {
        Self {
            declaring_type,
            parameters,
            body,
        }
    }

    pub fn declaring_type(&self) -> &Arc<TypeInfo> {
        &self.declaring_type
    }

    pub fn parameters(&self) -> &[Arc<TypeInfo>] {
        &self.parameters
    }

    pub fn signature(&self) -> String {
        let params: Vec<String> = self.parameters.iter().map(|p| p.canonical_name()).collect();
        format!(
            "{}::new({})",
            self.declaring_type.canonical_name(),
            params.join(",")
        )
    }

    pub fn invoke(&self, args: &[Value]) -> Result<Value> {
        if args.len() != self.parameters.len() {
            return Err(Error::Evaluation(format!(
                "{} takes {} arguments, got {}",
                self.signature(),
                self.parameters.len(),
                args.len()
            )));
        }
        (self.body)(args)
    }
}

/// How a member stores its value.
#[derive(Clone)]
pub enum MemberKind {
    /// Instance field read from the struct value.
    Field(Visibility),
    /// Computed property.
    Property(NativeGetter),
}

impl fmt::Debug for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(v) => write!(f, "Field({:?})", v),
            Self::Property(_) => write!(f, "Property"),
        }
    }
}

/// A field or property handle.
#[derive(Debug, Clone)]
pub struct MemberInfo {
    declaring_type: Arc<TypeInfo>,
    name: String,
    member_type: Arc<TypeInfo>,
    kind: MemberKind,
}

impl MemberInfo {
    /// Member handle for a struct field.
    pub fn field(declaring_type: Arc<TypeInfo>, field: &FieldInfo) -> Self {
        Self {
            declaring_type,
            name: field.name.clone(),
            member_type: Arc::clone(&field.ty),
            kind: MemberKind::Field(field.visibility),
        }
    }

    /// Member handle for a computed property.
    pub fn property(
        declaring_type: Arc<TypeInfo>,
        name: impl Into<String>,
        member_type: Arc<TypeInfo>,
        getter: NativeGetter,
    ) -> Self {
        Self {
            declaring_type,
            name: name.into(),
            member_type,
            kind: MemberKind::Property(getter),
        }
    }

    pub fn declaring_type(&self) -> &Arc<TypeInfo> {
        &self.declaring_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn member_type(&self) -> &Arc<TypeInfo> {
        &self.member_type
    }

    pub fn kind(&self) -> &MemberKind {
        &self.kind
    }

    /// Private fields are the only non-public members.
    pub fn is_public(&self) -> bool {
        !matches!(self.kind, MemberKind::Field(Visibility::Private))
    }

    /// Rebind onto a closed instantiation of the declaring type.
    pub fn close_over(&self, declaring_type: &Arc<TypeInfo>) -> MemberInfo {
        Self {
            declaring_type: Arc::clone(declaring_type),
            member_type: self
                .member_type
                .substitute(declaring_type.generic_args(), &[]),
            ..self.clone()
        }
    }

    /// Read the member from `target`.
    pub fn get(&self, target: &Value) -> Result<Value> {
        if target.is_null() {
            return Err(Error::Evaluation(format!(
                "null reference reading {}.{}",
                self.declaring_type.canonical_name(),
                self.name
            )));
        }
        match &self.kind {
            MemberKind::Field(_) => match target {
                Value::Struct(fields) => Ok(fields.get(&self.name).cloned().unwrap_or(Value::Null)),
                other => Err(Error::TypeMismatch(format!(
                    "field {} read from {} value",
                    self.name,
                    other.kind_name()
                ))),
            },
            MemberKind::Property(getter) => getter(target),
        }
    }
}
