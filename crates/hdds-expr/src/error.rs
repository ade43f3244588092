// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error type shared by packing, unpacking, encoding and evaluation.

/// Errors returned by hdds-expr operations.
///
/// Every variant aborts the current `pack`/`unpack` call. Nothing is retried
/// internally and no partial packet is ever produced.
///
/// # Example
///
/// ```rust
/// use hdds_expr::{Catalog, Error, ExprBuilder, ExpressionSerializer, StructBuilder};
/// use hdds_expr::types::PrimitiveKind;
/// use std::sync::Arc;
///
/// let mut catalog = Catalog::with_builtins();
/// let item = catalog.register_struct(
///     StructBuilder::new("sample.Item").private_field("secret", PrimitiveKind::String),
/// );
/// let catalog = Arc::new(catalog);
/// let b = ExprBuilder::new(catalog.clone());
/// let x = b.parameter("x", item);
/// let body = b.equal(b.field(b.param(&x), "secret").unwrap(), b.string("s")).unwrap();
/// let lambda = b.lambda(body, vec![x]).unwrap();
///
/// match ExpressionSerializer::new(catalog).serialize(&lambda) {
///     Err(Error::PrivateAccessDenied { member, .. }) => assert_eq!(member, "secret"),
///     other => panic!("unexpected: {:?}", other.map(|_| ())),
/// }
/// ```
#[derive(Debug)]
pub enum Error {
    // ========================================================================
    // Pack errors
    // ========================================================================
    /// The live expression has no wire mapping.
    UnsupportedExpressionShape(String),
    /// Attempted to serialize a reference to non-public storage.
    PrivateAccessDenied {
        /// Declaring type canonical name.
        type_name: String,
        /// Member name.
        member: String,
    },
    /// Random key generation kept colliding with existing keys.
    KeyCollision(u32),

    // ========================================================================
    // Resolution errors
    // ========================================================================
    /// A type, method, constructor or member could not be resolved.
    SymbolNotFound(String),
    /// A canonical type name did not parse as a generic signature.
    MalformedGenericSignature(String),
    /// A packet referenced a type key missing from its type table.
    UnknownTypeKey(String),

    // ========================================================================
    // Data / evaluation errors
    // ========================================================================
    /// Operand or value does not have the expected type.
    TypeMismatch(String),
    /// Runtime failure while evaluating a reconstructed tree.
    Evaluation(String),
    /// Expression tree nesting exceeds the configured limit.
    DepthExceeded(usize),

    // ========================================================================
    // Codec / configuration errors
    // ========================================================================
    /// Packet document could not be encoded or decoded.
    Codec(String),
    /// Invalid configuration value.
    Config(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::UnsupportedExpressionShape(shape) => {
                write!(f, "Unsupported expression shape: {}", shape)
            }
            Error::PrivateAccessDenied { type_name, member } => write!(
                f,
                "Member access to non-public field is not allowed: {}.{}",
                type_name, member
            ),
            Error::KeyCollision(attempts) => {
                write!(f, "Type key collision after {} attempts", attempts)
            }
            Error::SymbolNotFound(symbol) => write!(f, "Symbol not found: {}", symbol),
            Error::MalformedGenericSignature(name) => {
                write!(f, "Malformed generic type name: {}", name)
            }
            Error::UnknownTypeKey(key) => write!(f, "Type key not present in table: {}", key),
            Error::TypeMismatch(msg) => write!(f, "Type mismatch: {}", msg),
            Error::Evaluation(msg) => write!(f, "Evaluation failed: {}", msg),
            Error::DepthExceeded(limit) => {
                write!(f, "Expression tree deeper than {} levels", limit)
            }
            Error::Codec(msg) => write!(f, "Codec error: {}", msg),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Codec(e.to_string())
    }
}

impl From<base64::DecodeError> for Error {
    fn from(e: base64::DecodeError) -> Self {
        Error::Codec(format!("base64: {}", e))
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(e: std::string::FromUtf8Error) -> Self {
        Error::Codec(format!("utf-8: {}", e))
    }
}

#[cfg(feature = "config-loaders")]
impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Error::Config(e.to_string())
    }
}

/// Convenient alias for results using the crate `Error` type.
pub type Result<T> = core::result::Result<T, Error>;
