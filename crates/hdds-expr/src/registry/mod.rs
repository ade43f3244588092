// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type table and symbol resolution.
//!
//! Converts runtime type and symbol identity into compact keys and back.
//! See [`TypeRegistry`] for the per-call table and [`MethodRef`],
//! [`ConstructorRef`], [`MemberRef`] for the symbol descriptors.

mod descriptor;
mod generic_name;
mod symbol_ref;
mod type_registry;

pub use descriptor::{FieldData, TypeDescriptor, TypeKey, TYPE_KEY_SIGIL};
pub use generic_name::{parse_type_name, ParsedTypeName};
pub use symbol_ref::{ConstructorRef, MemberRef, MethodRef};
pub use type_registry::TypeRegistry;
