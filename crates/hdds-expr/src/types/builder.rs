// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fluent builder API for struct types.

use crate::error::{Error, Result};
use crate::types::{
    ConstructorInfo, FieldInfo, MethodInfo, NativeMethod, PrimitiveKind, TypeInfo, Value,
};
use std::collections::HashMap;
use std::sync::Arc;

struct PendingMethod {
    name: String,
    parameters: Vec<Arc<TypeInfo>>,
    return_type: Arc<TypeInfo>,
    body: NativeMethod,
}

/// Builder for struct types registered through [`Catalog::register_struct`].
///
/// [`Catalog::register_struct`]: crate::types::Catalog::register_struct
///
/// # Example
///
/// ```rust
/// use hdds_expr::{Catalog, StructBuilder};
/// use hdds_expr::types::PrimitiveKind;
///
/// let mut catalog = Catalog::with_builtins();
/// let item = catalog.register_struct(
///     StructBuilder::new("sample.SampleItem")
///         .field("Id", PrimitiveKind::I32)
///         .field("Name", PrimitiveKind::String)
///         .constructor(&["Id", "Name"]),
/// );
/// assert_eq!(item.fields().len(), 2);
/// ```
pub struct StructBuilder {
    name: String,
    fields: Vec<FieldInfo>,
    constructors: Vec<Vec<String>>,
    methods: Vec<PendingMethod>,
}

impl StructBuilder {
    /// Create a new builder for a struct type.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            constructors: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Add a public primitive field.
    pub fn field(self, name: impl Into<String>, kind: PrimitiveKind) -> Self {
        self.field_with_type(name, TypeInfo::primitive(kind))
    }

    /// Add a public field with an arbitrary type.
    pub fn field_with_type(mut self, name: impl Into<String>, ty: Arc<TypeInfo>) -> Self {
        self.fields.push(FieldInfo::new(name, ty));
        self
    }

    /// Add a private primitive field.
    pub fn private_field(self, name: impl Into<String>, kind: PrimitiveKind) -> Self {
        self.private_field_with_type(name, TypeInfo::primitive(kind))
    }

    /// Add a private field with an arbitrary type.
    pub fn private_field_with_type(mut self, name: impl Into<String>, ty: Arc<TypeInfo>) -> Self {
        self.fields.push(FieldInfo::private(name, ty));
        self
    }

    /// Add a positional constructor assigning the named fields in order.
    /// Fields not listed start as `Null`.
    pub fn constructor(mut self, field_names: &[&str]) -> Self {
        self.constructors
            .push(field_names.iter().map(|s| (*s).to_string()).collect());
        self
    }

    /// Add an instance method.
    pub fn method(
        mut self,
        name: impl Into<String>,
        parameters: Vec<Arc<TypeInfo>>,
        return_type: Arc<TypeInfo>,
        body: NativeMethod,
    ) -> Self {
        self.methods.push(PendingMethod {
            name: name.into(),
            parameters,
            return_type,
            body,
        });
        self
    }

    /// Build the type and its symbols.
    pub(crate) fn build(self) -> (Arc<TypeInfo>, Vec<ConstructorInfo>, Vec<MethodInfo>) {
        let ty = TypeInfo::structure(self.name, self.fields);

        let ctors = self
            .constructors
            .into_iter()
            .map(|names| positional_constructor(&ty, names))
            .collect();

        let methods = self
            .methods
            .into_iter()
            .map(|m| MethodInfo::new(Arc::clone(&ty), m.name, m.parameters, m.return_type, m.body))
            .collect();

        (ty, ctors, methods)
    }
}

fn positional_constructor(ty: &Arc<TypeInfo>, names: Vec<String>) -> ConstructorInfo {
    let parameters = names
        .iter()
        .map(|n| {
            ty.field(n)
                .map(|f| Arc::clone(&f.ty))
                .unwrap_or_else(TypeInfo::object)
        })
        .collect();
    let all_fields: Vec<String> = ty.fields().iter().map(|f| f.name.clone()).collect();
    let type_name = ty.name().to_string();

    ConstructorInfo::new(
        Arc::clone(ty),
        parameters,
        Arc::new(move |args: &[Value]| -> Result<Value> {
            let mut fields: HashMap<String, Value> = all_fields
                .iter()
                .map(|f| (f.clone(), Value::Null))
                .collect();
            for (name, value) in names.iter().zip(args) {
                if !fields.contains_key(name) {
                    return Err(Error::SymbolNotFound(format!("{}.{}", type_name, name)));
                }
                fields.insert(name.clone(), value.clone());
            }
            Ok(Value::Struct(fields))
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructor_assigns_positional_fields() {
        let (ty, ctors, _) = StructBuilder::new("sample.Item")
            .field("Id", PrimitiveKind::I32)
            .field("Name", PrimitiveKind::String)
            .field("Note", PrimitiveKind::String)
            .constructor(&["Id", "Name"])
            .build();
        assert_eq!(ty.fields().len(), 3);
        assert_eq!(ctors.len(), 1);
        assert_eq!(ctors[0].parameters().len(), 2);

        let value = ctors[0]
            .invoke(&[Value::I32(7), Value::from("bbb")])
            .unwrap();
        assert_eq!(value.get_field("Id"), Some(&Value::I32(7)));
        assert_eq!(value.get_field("Note"), Some(&Value::Null));
    }

    #[test]
    fn test_method_declared_on_struct() {
        let (ty, _, methods) = StructBuilder::new("sample.Item")
            .field("Name", PrimitiveKind::String)
            .method(
                "HasName",
                vec![],
                TypeInfo::primitive(PrimitiveKind::Bool),
                Arc::new(|target, _| {
                    Ok(Value::Bool(
                        target.and_then(|t| t.get_field("Name")).map_or(false, |v| !v.is_null()),
                    ))
                }),
            )
            .build();
        assert_eq!(methods.len(), 1);
        assert_eq!(methods[0].declaring_type().name(), ty.name());
        let item = Value::structure([("Name", Value::from("x"))]);
        assert_eq!(methods[0].invoke(Some(&item), &[]).unwrap(), Value::Bool(true));
    }
}
