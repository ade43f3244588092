// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Runtime type handles.

use crate::error::{Error, Result};
use crate::types::names;
use std::sync::Arc;

/// Primitive type kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Bool,
    I32,
    I64,
    F64,
    Char,
    String,
    Void,
}

impl PrimitiveKind {
    /// Canonical name of the primitive type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool => names::BOOLEAN,
            Self::I32 => names::INT32,
            Self::I64 => names::INT64,
            Self::F64 => names::DOUBLE,
            Self::Char => names::CHAR,
            Self::String => names::STRING,
            Self::Void => names::VOID,
        }
    }

    /// True for the integer and floating point kinds.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::I32 | Self::I64 | Self::F64)
    }

    /// Promotion rank used for mixed arithmetic (i32 < i64 < f64).
    pub(crate) fn numeric_rank(&self) -> Option<u8> {
        match self {
            Self::I32 => Some(0),
            Self::I64 => Some(1),
            Self::F64 => Some(2),
            _ => None,
        }
    }
}

/// Which declaration a generic parameter belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenericOwner {
    /// Parameter of a generic type (`!0`).
    Type,
    /// Parameter of a generic method (`!!0`).
    Method,
}

/// Type kind enumeration.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    /// Primitive value type.
    Primitive(PrimitiveKind),
    /// Top type, accepts any value.
    Object,
    /// Record with named fields.
    Struct,
    /// Fixed array; element type is the single generic argument.
    Array,
    /// Enumerable sequence (`Sequence`1`, `List`1`).
    Sequence,
    /// Keyed lookup (`Dictionary`2`).
    Map,
    /// Callable signature (`Func`N`); the last generic argument is the return type.
    Function,
    /// Holder of static methods only.
    Static,
    /// Unbound generic parameter.
    GenericParameter { owner: GenericOwner, position: usize },
}

/// Field access level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    Public,
    Private,
}

/// Instance field of a struct type.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldInfo {
    /// Field name.
    pub name: String,
    /// Field type.
    pub ty: Arc<TypeInfo>,
    /// Access level.
    pub visibility: Visibility,
}

impl FieldInfo {
    /// Create a public field.
    pub fn new(name: impl Into<String>, ty: Arc<TypeInfo>) -> Self {
        Self {
            name: name.into(),
            ty,
            visibility: Visibility::Public,
        }
    }

    /// Create a private field.
    pub fn private(name: impl Into<String>, ty: Arc<TypeInfo>) -> Self {
        Self {
            name: name.into(),
            ty,
            visibility: Visibility::Private,
        }
    }

    /// Check if the field is public.
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }
}

/// A runtime type handle.
///
/// Generic definitions carry their own parameters as generic arguments
/// (`Dictionary`2` has `[!0, !1]`); instantiations carry the closed arguments.
/// Two handles denote the same type when their canonical names are equal.
#[derive(Debug, Clone)]
pub struct TypeInfo {
    name: String,
    kind: TypeKind,
    generic_args: Vec<Arc<TypeInfo>>,
    fields: Vec<FieldInfo>,
    synthesized: bool,
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.canonical_name() == other.canonical_name()
    }
}

impl TypeInfo {
    /// Create a primitive type handle.
    pub fn primitive(kind: PrimitiveKind) -> Arc<Self> {
        Arc::new(Self::plain(kind.type_name(), TypeKind::Primitive(kind)))
    }

    /// The top `Object` type.
    pub fn object() -> Arc<Self> {
        Arc::new(Self::plain(names::OBJECT, TypeKind::Object))
    }

    /// Create a named struct type.
    pub fn structure(name: impl Into<String>, fields: Vec<FieldInfo>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            kind: TypeKind::Struct,
            generic_args: Vec::new(),
            fields,
            synthesized: false,
        })
    }

    /// Create a struct type from a captured field table.
    pub fn synthesized(name: impl Into<String>, fields: Vec<FieldInfo>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            kind: TypeKind::Struct,
            generic_args: Vec::new(),
            fields,
            synthesized: true,
        })
    }

    /// Create a type holding only static methods.
    pub fn static_holder(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self::plain(name, TypeKind::Static))
    }

    /// Array of `element`.
    pub fn array_of(element: Arc<TypeInfo>) -> Arc<Self> {
        Arc::new(Self {
            name: names::ARRAY.to_string(),
            kind: TypeKind::Array,
            generic_args: vec![element],
            fields: Vec::new(),
            synthesized: false,
        })
    }

    /// Generic definition named `name` (which must end in `` `N ``) with `arity` parameters.
    pub fn generic_definition(name: impl Into<String>, kind: TypeKind, arity: usize) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            kind,
            generic_args: (0..arity)
                .map(|i| Self::generic_parameter(GenericOwner::Type, i))
                .collect(),
            fields: Vec::new(),
            synthesized: false,
        })
    }

    /// Unbound generic parameter.
    pub fn generic_parameter(owner: GenericOwner, position: usize) -> Arc<Self> {
        let name = match owner {
            GenericOwner::Type => format!("!{}", position),
            GenericOwner::Method => format!("!!{}", position),
        };
        Arc::new(Self::plain(
            name,
            TypeKind::GenericParameter { owner, position },
        ))
    }

    fn plain(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            generic_args: Vec::new(),
            fields: Vec::new(),
            synthesized: false,
        }
    }

    /// Base name (generic definitions keep their `` `N `` suffix).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type kind.
    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    /// Generic arguments (parameters for a definition).
    pub fn generic_args(&self) -> &[Arc<TypeInfo>] {
        &self.generic_args
    }

    /// Instance fields.
    pub fn fields(&self) -> &[FieldInfo] {
        &self.fields
    }

    /// Get field by name.
    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Whether this type was built from a captured field table.
    pub fn is_synthesized(&self) -> bool {
        self.synthesized
    }

    /// Primitive kind, if any.
    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        match self.kind {
            TypeKind::Primitive(p) => Some(p),
            _ => None,
        }
    }

    /// Check if this is the boolean type.
    pub fn is_bool(&self) -> bool {
        self.primitive_kind() == Some(PrimitiveKind::Bool)
    }

    /// Check if this is a struct type.
    pub fn is_struct(&self) -> bool {
        matches!(self.kind, TypeKind::Struct)
    }

    /// Check if this is an unbound generic parameter.
    pub fn is_generic_parameter(&self) -> bool {
        matches!(self.kind, TypeKind::GenericParameter { .. })
    }

    /// True when every generic argument is one of the type's own parameters.
    pub fn is_generic_definition(&self) -> bool {
        !self.generic_args.is_empty()
            && self.kind != TypeKind::Array
            && self.generic_args.iter().all(|a| {
                matches!(
                    a.kind,
                    TypeKind::GenericParameter {
                        owner: GenericOwner::Type,
                        ..
                    }
                )
            })
    }

    /// Element type of arrays and sequences.
    pub fn element_type(&self) -> Option<&Arc<TypeInfo>> {
        match self.kind {
            TypeKind::Array | TypeKind::Sequence => self.generic_args.first(),
            _ => None,
        }
    }

    /// Fully-qualified name usable for lookup.
    ///
    /// ```text
    /// sys.String
    /// sys.String[]
    /// sys.collections.Dictionary`2[[sys.String],[sys.Int32]]
    /// ```
    pub fn canonical_name(&self) -> String {
        match self.kind {
            TypeKind::Array => match self.generic_args.first() {
                Some(element) => format!("{}[]", element.canonical_name()),
                None => format!("{}[]", names::OBJECT),
            },
            _ if self.generic_args.is_empty() || self.is_generic_definition() => {
                self.name.clone()
            }
            _ => {
                let args: Vec<String> = self
                    .generic_args
                    .iter()
                    .map(|a| format!("[{}]", a.canonical_name()))
                    .collect();
                format!("{}[{}]", self.name, args.join(","))
            }
        }
    }

    /// Close a generic definition over `args`.
    pub fn instantiate(self: &Arc<Self>, args: Vec<Arc<TypeInfo>>) -> Result<Arc<TypeInfo>> {
        if !self.is_generic_definition() {
            return Err(Error::TypeMismatch(format!(
                "{} is not a generic type definition",
                self.canonical_name()
            )));
        }
        if args.len() != self.generic_args.len() {
            return Err(Error::TypeMismatch(format!(
                "{} expects {} type arguments, got {}",
                self.name,
                self.generic_args.len(),
                args.len()
            )));
        }
        Ok(self.substitute(&args, &[]))
    }

    /// Replace generic parameters by the given type and method arguments.
    ///
    /// Parameters without a matching argument are left in place.
    pub fn substitute(
        self: &Arc<Self>,
        type_args: &[Arc<TypeInfo>],
        method_args: &[Arc<TypeInfo>],
    ) -> Arc<TypeInfo> {
        match self.kind {
            TypeKind::GenericParameter {
                owner: GenericOwner::Type,
                position,
            } => type_args
                .get(position)
                .cloned()
                .unwrap_or_else(|| Arc::clone(self)),
            TypeKind::GenericParameter {
                owner: GenericOwner::Method,
                position,
            } => method_args
                .get(position)
                .cloned()
                .unwrap_or_else(|| Arc::clone(self)),
            _ if self.generic_args.is_empty() => Arc::clone(self),
            _ => Arc::new(Self {
                generic_args: self
                    .generic_args
                    .iter()
                    .map(|a| a.substitute(type_args, method_args))
                    .collect(),
                fields: self
                    .fields
                    .iter()
                    .map(|f| FieldInfo {
                        name: f.name.clone(),
                        ty: f.ty.substitute(type_args, method_args),
                        visibility: f.visibility,
                    })
                    .collect(),
                ..(**self).clone()
            }),
        }
    }

    /// Whether a value of type `source` can be passed where `self` is expected.
    pub fn is_assignable_from(&self, source: &TypeInfo) -> bool {
        if self.is_generic_parameter() || source.is_generic_parameter() {
            return true;
        }
        match (&self.kind, &source.kind) {
            (TypeKind::Object, _) => true,
            (TypeKind::Sequence, TypeKind::Array | TypeKind::Sequence)
                if self.name == names::SEQUENCE =>
            {
                match (self.element_type(), source.element_type()) {
                    (Some(expected), Some(actual)) => expected.is_assignable_from(actual),
                    _ => false,
                }
            }
            _ => self.canonical_name() == source.canonical_name(),
        }
    }
}

/// Structural signature match used during symbol resolution.
///
/// Generic parameters on either side match anything; otherwise base names and
/// generic arity must agree. Generic argument identity is deliberately ignored.
pub fn shape_matches(expected: &TypeInfo, actual: &TypeInfo) -> bool {
    if expected.is_generic_parameter() || actual.is_generic_parameter() {
        return true;
    }
    match (&expected.kind, &actual.kind) {
        (TypeKind::Array, TypeKind::Array) => {
            match (expected.generic_args.first(), actual.generic_args.first()) {
                (Some(e), Some(a)) => shape_matches(e, a),
                _ => false,
            }
        }
        _ => {
            expected.name == actual.name
                && expected.generic_args.len() == actual.generic_args.len()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn string() -> Arc<TypeInfo> {
        TypeInfo::primitive(PrimitiveKind::String)
    }

    #[test]
    fn test_canonical_names() {
        assert_eq!(string().canonical_name(), "sys.String");
        assert_eq!(
            TypeInfo::array_of(string()).canonical_name(),
            "sys.String[]"
        );

        let dict = TypeInfo::generic_definition(names::DICTIONARY, TypeKind::Map, 2);
        assert_eq!(dict.canonical_name(), "sys.collections.Dictionary`2");

        let closed = dict
            .instantiate(vec![string(), TypeInfo::primitive(PrimitiveKind::I32)])
            .unwrap();
        assert_eq!(
            closed.canonical_name(),
            "sys.collections.Dictionary`2[[sys.String],[sys.Int32]]"
        );
        assert!(!closed.is_generic_definition());
    }

    #[test]
    fn test_instantiate_arity_mismatch() {
        let list = TypeInfo::generic_definition(names::LIST, TypeKind::Sequence, 1);
        assert!(list.instantiate(vec![string(), string()]).is_err());
        assert!(string().instantiate(vec![]).is_err());
    }

    #[test]
    fn test_substitute_method_parameter() {
        let seq = TypeInfo::generic_definition(names::SEQUENCE, TypeKind::Sequence, 1);
        let open = seq.substitute(
            &[TypeInfo::generic_parameter(GenericOwner::Method, 0)],
            &[],
        );
        assert_eq!(open.canonical_name(), "sys.collections.Sequence`1[[!!0]]");

        let closed = open.substitute(&[], &[string()]);
        assert_eq!(
            closed.canonical_name(),
            "sys.collections.Sequence`1[[sys.String]]"
        );
    }

    #[test]
    fn test_shape_matches_ignores_generic_arguments() {
        let seq = TypeInfo::generic_definition(names::SEQUENCE, TypeKind::Sequence, 1);
        let of_string = seq.instantiate(vec![string()]).unwrap();
        let of_int = seq
            .instantiate(vec![TypeInfo::primitive(PrimitiveKind::I32)])
            .unwrap();
        assert!(shape_matches(&of_string, &of_int));
        assert!(shape_matches(
            &TypeInfo::generic_parameter(GenericOwner::Method, 0),
            &string()
        ));
        assert!(!shape_matches(&string(), &TypeInfo::primitive(PrimitiveKind::I32)));
    }

    #[test]
    fn test_sequence_accepts_array() {
        let seq = TypeInfo::generic_definition(names::SEQUENCE, TypeKind::Sequence, 1)
            .instantiate(vec![string()])
            .unwrap();
        assert!(seq.is_assignable_from(&TypeInfo::array_of(string())));
        assert!(!seq.is_assignable_from(&TypeInfo::array_of(TypeInfo::primitive(
            PrimitiveKind::Bool
        ))));
        assert!(TypeInfo::object().is_assignable_from(&string()));
    }
}
