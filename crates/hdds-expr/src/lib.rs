// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # hdds-expr - Portable predicate expressions
//!
//! Serializes typed predicate expression trees (`x => x.Name == "bbb"`) into a
//! self-contained packet, and rebuilds an executable predicate on the other
//! side of a transport, as long as the receiver knows the same types by name.
//!
//! ## Quick Start
//!
//! ```rust
//! use hdds_expr::types::{PrimitiveKind, Value};
//! use hdds_expr::{Catalog, ExprBuilder, ExpressionSerializer, StructBuilder};
//! use std::sync::Arc;
//!
//! let mut catalog = Catalog::with_builtins();
//! let item = catalog.register_struct(
//!     StructBuilder::new("sample.Item")
//!         .field("Id", PrimitiveKind::I32)
//!         .field("Name", PrimitiveKind::String),
//! );
//! let catalog = Arc::new(catalog);
//!
//! // x => x.Name == "bbb"
//! let b = ExprBuilder::new(catalog.clone());
//! let x = b.parameter("x", item);
//! let body = b.equal(b.field(b.param(&x), "Name")?, b.string("bbb"))?;
//! let lambda = b.lambda(body, vec![x])?;
//!
//! let serializer = ExpressionSerializer::new(catalog);
//! let bytes = serializer.serialize(&lambda)?.to_bytes()?;
//!
//! let packet = hdds_expr::Packet::from_bytes(&bytes)?;
//! let predicate = serializer.deserialize(&packet)?;
//! let sample = Value::structure([("Id", Value::I32(1)), ("Name", Value::from("bbb"))]);
//! assert!(predicate.call(&sample)?);
//! # Ok::<(), hdds_expr::Error>(())
//! ```
//!
//! ## Pipeline
//!
//! ```text
//!  sender                                         receiver
//!  ------                                         --------
//!  Expr --pack--> ExpressionNode --encode-->  Packet  --decode--> ExpressionNode
//!         |                                     |                      |
//!    TypeRegistry (keys)   ---- type table ---->  TypeRegistry   --unpack--> Expr
//!                                                                      |
//!                                                            reconstruct --> Predicate
//! ```
//!
//! ## Modules Overview
//!
//! - [`types`] - Runtime type model, values and the symbol catalog
//! - [`registry`] - Type keys, descriptors and symbol references
//! - [`expr`] - Expression trees, builder and wire nodes
//! - [`codec`] - Packet encoding
//! - [`eval`] - Predicate reconstruction and evaluation
//! - [`config`] - Wire configuration

/// Wire configuration (payload encoding, depth limit).
pub mod config;
/// Error type shared by every stage.
pub mod error;
/// Runtime type model and symbol catalog.
pub mod types;
/// Type registry and serializable symbol references.
pub mod registry;
/// Expression trees and their serializable node form.
pub mod expr;
/// Packet encoding of node trees.
pub mod codec;
/// Reconstruction of executable predicates.
pub mod eval;

use std::sync::Arc;

pub use codec::{ExpressionCodec, Packet};
pub use config::{PayloadEncoding, WireConfig};
pub use error::{Error, Result};
pub use eval::{compile, reconstruct, Closure, CompiledLambda, Predicate};
pub use expr::{Expr, ExprBuilder, ExpressionNode, Parameter, UnpackSession};
pub use registry::{TypeDescriptor, TypeKey, TypeRegistry};
pub use types::{Catalog, StructBuilder, TypeCatalog, Value};

/// Serializes expressions against a catalog, and rebuilds them on the way back.
///
/// Each `serialize` call uses a fresh [`TypeRegistry`], so packets never share
/// keys. Each `deserialize` call uses a fresh [`UnpackSession`].
#[derive(Clone)]
pub struct ExpressionSerializer {
    catalog: Arc<dyn TypeCatalog>,
    codec: ExpressionCodec,
}

impl ExpressionSerializer {
    /// Serializer with the default [`WireConfig`].
    #[must_use]
    pub fn new(catalog: Arc<dyn TypeCatalog>) -> Self {
        Self::with_config(catalog, WireConfig::default())
    }

    #[must_use]
    pub fn with_config(catalog: Arc<dyn TypeCatalog>, config: WireConfig) -> Self {
        Self {
            catalog,
            codec: ExpressionCodec::new(config),
        }
    }

    pub fn catalog(&self) -> &Arc<dyn TypeCatalog> {
        &self.catalog
    }

    pub fn config(&self) -> &WireConfig {
        self.codec.config()
    }

    /// Pack and encode `expr`.
    pub fn serialize(&self, expr: &Expr) -> Result<Packet> {
        let registry = TypeRegistry::new(Arc::clone(&self.catalog));
        self.codec.encode(expr, &registry)
    }

    /// Decode and unpack into a bound tree, without shape checks.
    pub fn deserialize_expr(&self, packet: &Packet) -> Result<Expr> {
        let (node, registry) = self.codec.decode(packet, Arc::clone(&self.catalog))?;
        let session = UnpackSession::with_max_depth(registry, self.codec.config().max_depth);
        let expr = node.unpack(&session)?;
        log::debug!(
            "[serializer] unpacked {:?} tree ({} parameters)",
            expr.node_type(),
            session.parameter_count()
        );
        Ok(expr)
    }

    /// Decode, unpack and reconstruct a single-argument boolean predicate.
    pub fn deserialize(&self, packet: &Packet) -> Result<Predicate> {
        let expr = self.deserialize_expr(packet)?;
        let interpreter = eval::Interpreter::new(self.codec.config().max_depth);
        eval::reconstruct_with(expr, interpreter)
    }
}

impl std::fmt::Debug for ExpressionSerializer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpressionSerializer")
            .field("config", self.codec.config())
            .finish_non_exhaustive()
    }
}

/// Serialize `expr` against the built-in catalog.
pub fn pack(expr: &Expr) -> Result<Packet> {
    ExpressionSerializer::new(Arc::new(Catalog::with_builtins())).serialize(expr)
}

/// Rebuild a predicate against the built-in catalog.
///
/// Struct types unknown to the built-ins are synthesized from the packet's
/// structural descriptors.
pub fn unpack(packet: &Packet) -> Result<Predicate> {
    ExpressionSerializer::new(Arc::new(Catalog::with_builtins())).deserialize(packet)
}
