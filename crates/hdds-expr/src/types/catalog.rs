// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The type universe visible to one process.
//!
//! ## Type Resolution
//!
//! A [`TypeCatalog`] answers "does this process know a type called X, and what
//! methods, constructors and properties does it have?". Senders use it to build
//! expressions; receivers use it to resolve the names and signatures found in a
//! packet. Generic instantiations are not registered individually: only their
//! definitions (`Dictionary`2`) are, and callers close them as needed.

use crate::types::builder::StructBuilder;
use crate::types::{builtins, ConstructorInfo, MemberInfo, MethodInfo, TypeInfo};
use std::collections::HashMap;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// TypeCatalog trait + HashMap implementation
// ---------------------------------------------------------------------------

/// Lookup interface over the types a process can name.
pub trait TypeCatalog: Send + Sync {
    /// Look up a non-generic type or a generic definition by base name.
    fn find_type(&self, name: &str) -> Option<Arc<TypeInfo>>;

    /// All overloads of `name` declared on the type with base name `type_name`.
    fn methods(&self, type_name: &str, name: &str) -> Vec<Arc<MethodInfo>>;

    /// All constructors of the type with base name `type_name`.
    fn constructors(&self, type_name: &str) -> Vec<Arc<ConstructorInfo>>;

    /// Computed property `name` on the type with base name `type_name`.
    fn property(&self, type_name: &str, name: &str) -> Option<MemberInfo>;

    /// Resolve a member on `ty`: instance fields first, then properties.
    fn member(&self, ty: &Arc<TypeInfo>, name: &str) -> Option<MemberInfo> {
        if let Some(field) = ty.field(name) {
            return Some(MemberInfo::field(Arc::clone(ty), field));
        }
        self.property(ty.name(), name).map(|p| p.close_over(ty))
    }
}

/// Simple [`HashMap`]-backed [`TypeCatalog`].
#[derive(Debug, Default)]
pub struct Catalog {
    types: HashMap<String, Arc<TypeInfo>>,
    methods: HashMap<(String, String), Vec<Arc<MethodInfo>>>,
    constructors: HashMap<String, Vec<Arc<ConstructorInfo>>>,
    properties: HashMap<(String, String), MemberInfo>,
}

impl Catalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog pre-populated with the built-in library.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut catalog = Self::new();
        builtins::install(&mut catalog);
        catalog
    }

    /// Register a type under its base name, replacing any previous entry.
    pub fn register_type(&mut self, ty: Arc<TypeInfo>) -> Arc<TypeInfo> {
        self.types.insert(ty.name().to_string(), Arc::clone(&ty));
        ty
    }

    /// Register a method on its declaring type.
    pub fn register_method(&mut self, method: MethodInfo) -> Arc<MethodInfo> {
        let method = Arc::new(method);
        self.methods
            .entry((
                method.declaring_type().name().to_string(),
                method.name().to_string(),
            ))
            .or_default()
            .push(Arc::clone(&method));
        method
    }

    /// Register a constructor on its declaring type.
    pub fn register_constructor(&mut self, ctor: ConstructorInfo) -> Arc<ConstructorInfo> {
        let ctor = Arc::new(ctor);
        self.constructors
            .entry(ctor.declaring_type().name().to_string())
            .or_default()
            .push(Arc::clone(&ctor));
        ctor
    }

    /// Register a computed property on its declaring type.
    pub fn register_property(&mut self, property: MemberInfo) {
        self.properties.insert(
            (
                property.declaring_type().name().to_string(),
                property.name().to_string(),
            ),
            property,
        );
    }

    /// Register a struct type together with its constructors and methods.
    pub fn register_struct(&mut self, builder: StructBuilder) -> Arc<TypeInfo> {
        let (ty, ctors, methods) = builder.build();
        self.register_type(Arc::clone(&ty));
        for ctor in ctors {
            self.register_constructor(ctor);
        }
        for method in methods {
            self.register_method(method);
        }
        log::debug!("[catalog] registered struct {}", ty.name());
        ty
    }

    /// Number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if no types are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl TypeCatalog for Catalog {
    fn find_type(&self, name: &str) -> Option<Arc<TypeInfo>> {
        self.types.get(name).cloned()
    }

    fn methods(&self, type_name: &str, name: &str) -> Vec<Arc<MethodInfo>> {
        self.methods
            .get(&(type_name.to_string(), name.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    fn constructors(&self, type_name: &str) -> Vec<Arc<ConstructorInfo>> {
        self.constructors.get(type_name).cloned().unwrap_or_default()
    }

    fn property(&self, type_name: &str, name: &str) -> Option<MemberInfo> {
        self.properties
            .get(&(type_name.to_string(), name.to_string()))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{names, PrimitiveKind};

    #[test]
    fn test_builtins_registered() {
        let catalog = Catalog::with_builtins();
        assert!(catalog.find_type(names::STRING).is_some());
        assert!(catalog.find_type(names::DICTIONARY).is_some());
        assert_eq!(catalog.methods(names::ENUMERABLE, "Contains").len(), 1);
        assert!(catalog.property(names::STRING, "Length").is_some());
        assert!(catalog.find_type("sample.Unknown").is_none());
    }

    #[test]
    fn test_member_prefers_fields() {
        let mut catalog = Catalog::with_builtins();
        let ty = catalog.register_struct(
            StructBuilder::new("sample.Item")
                .field("Id", PrimitiveKind::I32)
                .private_field("secret", PrimitiveKind::String),
        );
        let id = catalog.member(&ty, "Id").unwrap();
        assert!(id.is_public());
        let secret = catalog.member(&ty, "secret").unwrap();
        assert!(!secret.is_public());
        assert!(catalog.member(&ty, "Nope").is_none());
    }

    #[test]
    fn test_property_closes_over_generic_type() {
        let catalog = Catalog::with_builtins();
        let dict = catalog
            .find_type(names::DICTIONARY)
            .unwrap()
            .instantiate(vec![
                crate::types::TypeInfo::primitive(PrimitiveKind::String),
                crate::types::TypeInfo::primitive(PrimitiveKind::I64),
            ])
            .unwrap();
        let count = catalog.member(&dict, "Count").unwrap();
        assert_eq!(count.member_type().canonical_name(), names::INT32);
        assert_eq!(count.declaring_type().canonical_name(), dict.canonical_name());
    }
}
