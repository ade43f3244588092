// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type table entries carried in a packet.

use serde::{Deserialize, Serialize};
use std::fmt;

fn is_false(b: &bool) -> bool {
    !*b
}

/// Sigil prefixed to every dynamically registered type key.
pub const TYPE_KEY_SIGIL: char = '#';

/// Opaque per-packet type identifier (`#` followed by hex digits).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeKey(String);

impl TypeKey {
    /// Key from a random value, zero padded to `width` hex digits.
    pub(crate) fn from_random(value: u32, width: usize) -> Self {
        Self(format!("{}{:0width$X}", TYPE_KEY_SIGIL, value, width = width))
    }

    /// Wrap an existing key string.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the key carries the registered-type sigil.
    pub fn is_registered(&self) -> bool {
        self.0.starts_with(TYPE_KEY_SIGIL)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One captured field of a structural type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldData {
    #[serde(rename = "n")]
    pub name: String,
    #[serde(rename = "t")]
    pub type_key: TypeKey,
}

/// A type table entry.
///
/// `structural` marks a captured field table, which may legitimately be
/// empty. On the wire both are omitted when unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    #[serde(rename = "k")]
    pub key: TypeKey,
    #[serde(rename = "n")]
    pub canonical_name: String,
    #[serde(rename = "s", default, skip_serializing_if = "is_false")]
    pub structural: bool,
    #[serde(rename = "f", default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldData>,
}

impl TypeDescriptor {
    pub fn new(key: TypeKey, canonical_name: impl Into<String>) -> Self {
        Self {
            key,
            canonical_name: canonical_name.into(),
            structural: false,
            fields: Vec::new(),
        }
    }

    /// True when a field table was captured for this type.
    pub fn is_structural(&self) -> bool {
        self.structural
    }
}
