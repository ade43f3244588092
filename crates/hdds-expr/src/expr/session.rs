// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Reconstruction session.

use crate::config::DEFAULT_MAX_DEPTH;
use crate::error::{Error, Result};
use crate::expr::Parameter;
use crate::registry::TypeRegistry;
use crate::types::TypeInfo;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// State shared by every node of one unpack call.
///
/// Parameter nodes with the same `(type, name)` unpack to one [`Parameter`],
/// so the lambda's declared parameters and their uses in the body bind to the
/// same variable.
pub struct UnpackSession {
    registry: TypeRegistry,
    parameters: Mutex<HashMap<(String, String), Parameter>>,
    max_depth: usize,
}

impl UnpackSession {
    pub fn new(registry: TypeRegistry) -> Self {
        Self::with_max_depth(registry, DEFAULT_MAX_DEPTH)
    }

    pub fn with_max_depth(registry: TypeRegistry, max_depth: usize) -> Self {
        Self {
            registry,
            parameters: Mutex::new(HashMap::new()),
            max_depth,
        }
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// The session's variable for `(ty, name)`, created on first use.
    pub fn parameter(&self, ty: &Arc<TypeInfo>, name: &str, by_ref: bool) -> Parameter {
        let mut parameters = self.parameters.lock();
        parameters
            .entry((ty.canonical_name(), name.to_string()))
            .or_insert_with(|| {
                log::trace!("[session] new parameter {}: {}", name, ty.canonical_name());
                Parameter::with_by_ref(name, Arc::clone(ty), by_ref)
            })
            .clone()
    }

    /// Number of distinct parameters created so far.
    pub fn parameter_count(&self) -> usize {
        self.parameters.lock().len()
    }

    pub(crate) fn check_depth(&self, depth: usize) -> Result<()> {
        if depth > self.max_depth {
            return Err(Error::DepthExceeded(self.max_depth));
        }
        Ok(())
    }
}
