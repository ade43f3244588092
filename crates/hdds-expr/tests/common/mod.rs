// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Shared fixtures for integration tests.

#![allow(dead_code)]

use hdds_expr::types::{PrimitiveKind, TypeInfo, Value};
use hdds_expr::{Catalog, StructBuilder, TypeCatalog};
use std::sync::Arc;

pub const SAMPLE_ITEM: &str = "sample.SampleItem";
pub const CLOSURE: &str = "sample.Closure";
pub const READING: &str = "sample.Reading";
pub const INNER: &str = "sample.Inner";
pub const OUTER: &str = "sample.Outer";
pub const MARKER: &str = "sample.Marker";

/// Catalog with the built-ins plus the `sample.*` structs.
pub fn sample_catalog() -> Arc<dyn TypeCatalog> {
    let mut catalog = Catalog::with_builtins();
    catalog.register_struct(
        StructBuilder::new(SAMPLE_ITEM)
            .field("Id", PrimitiveKind::I32)
            .field("Name", PrimitiveKind::String)
            .private_field("secret", PrimitiveKind::String)
            .constructor(&["Id", "Name"]),
    );
    catalog.register_struct(StructBuilder::new(CLOSURE).field("Name", PrimitiveKind::String));
    catalog.register_struct(StructBuilder::new(READING).field("Score", PrimitiveKind::F64));
    let inner = catalog.register_struct(StructBuilder::new(INNER).field("Name", PrimitiveKind::String));
    catalog.register_struct(
        StructBuilder::new(OUTER).field_with_type("Items", TypeInfo::array_of(inner)),
    );
    catalog.register_struct(StructBuilder::new(MARKER));
    Arc::new(catalog)
}

pub fn sample_item_type(catalog: &Arc<dyn TypeCatalog>) -> Arc<TypeInfo> {
    catalog
        .find_type(SAMPLE_ITEM)
        .expect("sample catalog registers SampleItem")
}

pub fn item(id: i32, name: &str) -> Value {
    Value::structure([
        ("Id", Value::I32(id)),
        ("Name", Value::from(name)),
        ("secret", Value::from("hidden")),
    ])
}

pub fn reading(score: f64) -> Value {
    Value::structure([("Score", Value::F64(score))])
}
