// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Packet wire codec.
//!
//! A [`Packet`] carries the type table next to the encoded node tree so the
//! receiver can load every descriptor before resolving any symbol:
//!
//! ```text
//! {
//!   "types": [ { "k": "#1A2B3C4D", "n": "sample.Item", "f": [ { "n": "Id", "t": "#..." } ] } ],
//!   "enc":   "base64",
//!   "data":  "<node tree JSON, base64 wrapped when enc is base64>"
//! }
//! ```

pub mod literal;

use crate::config::{PayloadEncoding, WireConfig};
use crate::error::{Error, Result};
use crate::expr::{Expr, ExpressionNode};
use crate::registry::{TypeDescriptor, TypeRegistry};
use crate::types::TypeCatalog;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Self-contained serialized predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Packet {
    /// Type table, in registration order.
    pub types: Vec<TypeDescriptor>,
    /// How `payload` wraps the node tree.
    #[serde(rename = "enc")]
    pub encoding: PayloadEncoding,
    /// Encoded node tree.
    #[serde(rename = "data")]
    pub payload: String,
}

impl Packet {
    /// Packet document as JSON text.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Packet document as UTF-8 bytes for a transport.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// The node tree JSON, unwrapped from its payload encoding.
    pub fn tree_json(&self) -> Result<String> {
        match self.encoding {
            PayloadEncoding::Json => Ok(self.payload.clone()),
            PayloadEncoding::Base64 => Ok(String::from_utf8(STANDARD.decode(&self.payload)?)?),
        }
    }
}

/// Encodes node trees into packets and back.
#[derive(Debug, Clone, Default)]
pub struct ExpressionCodec {
    config: WireConfig,
}

impl ExpressionCodec {
    pub fn new(config: WireConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WireConfig {
        &self.config
    }

    /// Pack `expr` into `registry` and encode the result.
    pub fn encode(&self, expr: &Expr, registry: &TypeRegistry) -> Result<Packet> {
        let node = ExpressionNode::pack_bounded(expr, registry, self.config.max_depth)?;
        self.encode_node(&node, registry)
    }

    /// Encode an already packed tree together with the registry's table.
    pub fn encode_node(&self, node: &ExpressionNode, registry: &TypeRegistry) -> Result<Packet> {
        let tree = serde_json::to_string(node)?;
        let payload = match self.config.payload_encoding {
            PayloadEncoding::Json => tree,
            PayloadEncoding::Base64 => STANDARD.encode(tree.as_bytes()),
        };
        let types = registry.descriptors();
        log::debug!(
            "[codec] encoded packet: {} types, {} payload bytes ({:?})",
            types.len(),
            payload.len(),
            self.config.payload_encoding
        );
        Ok(Packet {
            types,
            encoding: self.config.payload_encoding,
            payload,
        })
    }

    /// Decode a packet into its node tree and a registry loaded with its table.
    ///
    /// The packet's own `enc` tag selects the payload decoding.
    pub fn decode(
        &self,
        packet: &Packet,
        catalog: Arc<dyn TypeCatalog>,
    ) -> Result<(ExpressionNode, TypeRegistry)> {
        let registry = TypeRegistry::with_descriptors(catalog, packet.types.clone())?;
        let tree = packet.tree_json()?;
        let node: ExpressionNode = serde_json::from_str(&tree)
            .map_err(|e| Error::Codec(format!("node tree: {}", e)))?;
        log::debug!(
            "[codec] decoded packet: {} types, {} tree bytes",
            packet.types.len(),
            tree.len()
        );
        Ok((node, registry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::ExprBuilder;
    use crate::types::Catalog;

    fn sample_packet(encoding: PayloadEncoding) -> Packet {
        let catalog: Arc<dyn TypeCatalog> = Arc::new(Catalog::with_builtins());
        let b = ExprBuilder::new(Arc::clone(&catalog));
        let s = b.parameter("s", b.primitive(crate::types::PrimitiveKind::String));
        let body = b.equal(b.param(&s), b.string("bbb")).unwrap();
        let lambda = b.lambda(body, vec![s]).unwrap();

        let codec = ExpressionCodec::new(WireConfig::default().with_payload_encoding(encoding));
        codec.encode(&lambda, &TypeRegistry::new(catalog)).unwrap()
    }

    #[test]
    fn test_json_payload_is_readable() {
        let packet = sample_packet(PayloadEncoding::Json);
        assert!(packet.payload.starts_with('{'));
        assert!(packet.payload.contains("\"bbb\""));
        assert_eq!(packet.tree_json().unwrap(), packet.payload);
    }

    #[test]
    fn test_base64_payload_decodes_to_same_tree() {
        let packet = sample_packet(PayloadEncoding::Base64);
        assert!(!packet.payload.contains('{'));

        let codec = ExpressionCodec::default();
        let (node, registry) = codec
            .decode(&packet, Arc::new(Catalog::with_builtins()))
            .unwrap();
        assert_eq!(registry.len(), packet.types.len());
        assert_eq!(node.node_type, crate::expr::NodeType::Lambda);
    }

    #[test]
    fn test_packet_document_round_trip() {
        let packet = sample_packet(PayloadEncoding::Base64);
        let text = packet.to_json().unwrap();
        assert!(text.contains("\"enc\":\"base64\""));
        assert_eq!(Packet::from_json(&text).unwrap(), packet);
        assert_eq!(Packet::from_bytes(&packet.to_bytes().unwrap()).unwrap(), packet);
    }

    #[test]
    fn test_corrupt_payload_is_codec_error() {
        let mut packet = sample_packet(PayloadEncoding::Base64);
        packet.payload = "!!not base64!!".to_string();
        let codec = ExpressionCodec::default();
        assert!(matches!(
            codec.decode(&packet, Arc::new(Catalog::with_builtins())),
            Err(Error::Codec(_))
        ));

        packet.encoding = PayloadEncoding::Json;
        packet.payload = "{\"n\":20}".to_string();
        assert!(matches!(
            codec.decode(&packet, Arc::new(Catalog::with_builtins())),
            Err(Error::Codec(_))
        ));
    }
}
