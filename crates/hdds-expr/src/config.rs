// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wire configuration and codec constants.
//!
//! # Architecture
//!
//! - **Level 1 (Static)**: Compile-time constants (key width, retry bound, depth limit)
//! - **Level 2 (Dynamic)**: [`WireConfig`] for per-serializer settings, loadable from
//!   environment variables or a YAML document
//!
//! # Example
//!
//! ```ignore
//! use hdds_expr::config::{PayloadEncoding, WireConfig};
//!
//! let config = WireConfig::default()
//!     .with_payload_encoding(PayloadEncoding::Json)
//!     .with_max_depth(64);
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Number of hexadecimal digits in a generated type key.
pub const TYPE_KEY_HEX_WIDTH: usize = 8;

/// Maximum random draws before key generation gives up with `KeyCollision`.
pub const MAX_KEY_ATTEMPTS: u32 = 64;

/// Default maximum nesting depth of an expression tree.
///
/// Each level costs up to two JSON nesting levels; serde_json stops at 128.
pub const DEFAULT_MAX_DEPTH: usize = 48;

/// Environment variable selecting the payload encoding (`json` or `base64`).
pub const ENV_PAYLOAD_ENCODING: &str = "HDDS_EXPR_PAYLOAD";

/// Environment variable overriding the maximum tree depth.
pub const ENV_MAX_DEPTH: &str = "HDDS_EXPR_MAX_DEPTH";

/// How the node tree is embedded in a packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadEncoding {
    /// Payload is the JSON text of the node tree.
    Json,
    /// Payload is the base64 (standard alphabet) of the JSON text.
    #[default]
    Base64,
}

impl PayloadEncoding {
    /// Parse a user-supplied encoding name.
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "base64" | "b64" => Ok(Self::Base64),
            other => Err(Error::Config(format!("unknown payload encoding '{}'", other))),
        }
    }
}

/// Per-serializer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WireConfig {
    /// Encoding used when producing packets. Decoding honours the packet's own tag.
    pub payload_encoding: PayloadEncoding,
    /// Maximum expression nesting accepted by pack and unpack.
    pub max_depth: usize,
}

impl Default for WireConfig {
    fn default() -> Self {
        Self {
            payload_encoding: PayloadEncoding::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl WireConfig {
    /// Set the payload encoding.
    #[must_use]
    pub fn with_payload_encoding(mut self, encoding: PayloadEncoding) -> Self {
        self.payload_encoding = encoding;
        self
    }

    /// Set the maximum tree depth.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Build a configuration from defaults overridden by environment variables.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(encoding) = std::env::var(ENV_PAYLOAD_ENCODING) {
            config.payload_encoding = PayloadEncoding::parse(&encoding)?;
        }
        if let Ok(depth) = std::env::var(ENV_MAX_DEPTH) {
            config.max_depth = depth
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("{} must be an integer", ENV_MAX_DEPTH)))?;
        }
        config.validate()?;
        log::debug!("[config] wire config from env: {:?}", config);
        Ok(config)
    }

    /// Parse a YAML document such as `payload_encoding: json\nmax_depth: 32`.
    #[cfg(feature = "config-loaders")]
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(Error::Config("max_depth must be at least 1".to_string()));
        }
        Ok(())
    }
}
