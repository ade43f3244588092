// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Host type universe.
//!
//! Types, values and callable symbols that expressions are built from and
//! evaluated against. Nothing here is reflective: every type a process can
//! name is registered in a [`Catalog`], either by hand through
//! [`StructBuilder`] or by [`Catalog::with_builtins`].
//!
//! # Architecture
//!
//! ```text
//! +-------------------+      +------------------+
//! |     Catalog       |----->|    TypeInfo      |  name, kind, generic args, fields
//! | (TypeCatalog impl)|      +------------------+
//! |                   |----->|   MethodInfo     |  native bodies
//! |                   |----->| ConstructorInfo  |
//! |                   |----->|   MemberInfo     |  fields + computed properties
//! +-------------------+      +------------------+
//!                                     |
//!                                     v
//!                            +------------------+
//!                            |      Value       |  dynamic runtime values
//!                            +------------------+
//! ```

mod builder;
pub(crate) mod builtins;
mod catalog;
mod symbols;
mod type_info;
mod value;

pub use builder::StructBuilder;
pub use catalog::{Catalog, TypeCatalog};
pub use symbols::{
    ConstructorInfo, MemberInfo, MemberKind, MethodInfo, NativeConstructor, NativeGetter,
    NativeMethod,
};
pub use type_info::{
    shape_matches, FieldInfo, GenericOwner, PrimitiveKind, TypeInfo, TypeKind, Visibility,
};
pub use value::Value;

/// Canonical names of the built-in types.
pub mod names {
    pub const BOOLEAN: &str = "sys.Boolean";
    pub const INT32: &str = "sys.Int32";
    pub const INT64: &str = "sys.Int64";
    pub const DOUBLE: &str = "sys.Double";
    pub const CHAR: &str = "sys.Char";
    pub const STRING: &str = "sys.String";
    pub const VOID: &str = "sys.Void";
    pub const OBJECT: &str = "sys.Object";
    /// Base name shared by every array type; the element is the generic argument.
    pub const ARRAY: &str = "sys.Array";

    pub const SEQUENCE: &str = "sys.collections.Sequence`1";
    pub const LIST: &str = "sys.collections.List`1";
    pub const DICTIONARY: &str = "sys.collections.Dictionary`2";

    /// Static holder of the sequence query operators.
    pub const ENUMERABLE: &str = "sys.linq.Enumerable";

    pub const FUNC1: &str = "sys.Func`1";
    pub const FUNC2: &str = "sys.Func`2";
    pub const FUNC3: &str = "sys.Func`3";

    /// `Func` definition for a lambda with `arity` parameters.
    pub fn func(arity: usize) -> Option<&'static str> {
        match arity {
            0 => Some(FUNC1),
            1 => Some(FUNC2),
            2 => Some(FUNC3),
            _ => None,
        }
    }
}
