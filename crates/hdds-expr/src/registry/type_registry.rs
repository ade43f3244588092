// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-call type table.
//!
//! A [`TypeRegistry`] lives for exactly one pack or one unpack. On the sending
//! side [`TypeRegistry::pack`] assigns keys and records descriptors; on the
//! receiving side [`TypeRegistry::load`] installs the packet's table and
//! [`TypeRegistry::resolve`] turns keys back into [`TypeInfo`] handles,
//! synthesizing struct types from captured field tables when the catalog has
//! no type of that name.

use crate::config::{MAX_KEY_ATTEMPTS, TYPE_KEY_HEX_WIDTH};
use crate::error::{Error, Result};
use crate::registry::descriptor::{FieldData, TypeDescriptor, TypeKey};
use crate::registry::generic_name::{parse_type_name, ParsedTypeName};
use crate::types::{FieldInfo, TypeCatalog, TypeInfo};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[derive(Default)]
struct Tables {
    /// Descriptors in insertion order.
    descriptors: Vec<TypeDescriptor>,
    by_key: HashMap<TypeKey, usize>,
    /// Reverse index, canonical name -> key.
    by_name: HashMap<String, TypeKey>,
    /// Keys whose field table has been captured.
    captured: HashSet<TypeKey>,
    resolved: HashMap<TypeKey, Arc<TypeInfo>>,
    /// Keys currently being resolved (cycle guard).
    resolving: HashSet<TypeKey>,
}

/// Type table scoped to one pack or unpack call.
pub struct TypeRegistry {
    catalog: Arc<dyn TypeCatalog>,
    inner: Mutex<Tables>,
}

impl TypeRegistry {
    /// Create an empty registry over `catalog`.
    pub fn new(catalog: Arc<dyn TypeCatalog>) -> Self {
        Self {
            catalog,
            inner: Mutex::new(Tables::default()),
        }
    }

    /// Create a registry pre-loaded with a packet's type table.
    pub fn with_descriptors(
        catalog: Arc<dyn TypeCatalog>,
        descriptors: Vec<TypeDescriptor>,
    ) -> Result<Self> {
        let registry = Self::new(catalog);
        registry.load(descriptors)?;
        Ok(registry)
    }

    pub fn catalog(&self) -> &Arc<dyn TypeCatalog> {
        &self.catalog
    }

    /// Key for `ty`, registering it on first use.
    ///
    /// With `structural` set, the field layout of a struct type is captured so
    /// the receiver can synthesize it. Repeated calls return the same key.
    pub fn pack(&self, ty: &Arc<TypeInfo>, structural: bool) -> Result<TypeKey> {
        let mut tables = self.inner.lock();
        Self::pack_locked(&mut tables, ty, structural)
    }

    fn pack_locked(tables: &mut Tables, ty: &Arc<TypeInfo>, structural: bool) -> Result<TypeKey> {
        let name = ty.canonical_name();

        let key = match tables.by_name.get(&name) {
            Some(key) => key.clone(),
            None => {
                let key = Self::generate_key(tables)?;
                let index = tables.descriptors.len();
                tables.by_key.insert(key.clone(), index);
                tables
                    .descriptors
                    .push(TypeDescriptor::new(key.clone(), name.clone()));
                tables.by_name.insert(name.clone(), key.clone());
                tables.resolved.insert(key.clone(), Arc::clone(ty));
                log::debug!("[registry] packed {} as {}", name, key);
                key
            }
        };

        // Element and argument types travel with their container so a
        // structural element can be synthesized on the other side.
        for arg in ty.generic_args() {
            if arg.is_struct() || !arg.generic_args().is_empty() {
                Self::pack_locked(tables, arg, structural)?;
            }
        }

        if structural && ty.is_struct() && tables.captured.insert(key.clone()) {
            let mut fields = Vec::with_capacity(ty.fields().len());
            for field in ty.fields() {
                // Structs nested anywhere in a field type are captured too.
                let type_key = Self::pack_locked(tables, &field.ty, true)?;
                fields.push(FieldData {
                    name: field.name.clone(),
                    type_key,
                });
            }
            if let Some(&index) = tables.by_key.get(&key) {
                let desc = &mut tables.descriptors[index];
                desc.structural = true;
                desc.fields = fields;
            }
            log::trace!("[registry] captured field table of {}", name);
        }

        Ok(key)
    }

    fn generate_key(tables: &Tables) -> Result<TypeKey> {
        for _ in 0..MAX_KEY_ATTEMPTS {
            let key = TypeKey::from_random(fastrand::u32(..), TYPE_KEY_HEX_WIDTH);
            if !tables.by_key.contains_key(&key) {
                return Ok(key);
            }
            log::trace!("[registry] key {} already taken, retrying", key);
        }
        Err(Error::KeyCollision(MAX_KEY_ATTEMPTS))
    }

    /// Install descriptors from a packet.
    ///
    /// Every field type key must itself be present in the table.
    pub fn load(&self, descriptors: Vec<TypeDescriptor>) -> Result<()> {
        let mut tables = self.inner.lock();

        for desc in descriptors {
            if tables.by_key.contains_key(&desc.key) {
                return Err(Error::Codec(format!("duplicate type key {}", desc.key)));
            }
            let index = tables.descriptors.len();
            tables.by_key.insert(desc.key.clone(), index);
            tables
                .by_name
                .entry(desc.canonical_name.clone())
                .or_insert_with(|| desc.key.clone());
            tables.descriptors.push(desc);
        }

        for desc in &tables.descriptors {
            for field in &desc.fields {
                if !tables.by_key.contains_key(&field.type_key) {
                    return Err(Error::UnknownTypeKey(field.type_key.to_string()));
                }
            }
        }

        log::debug!("[registry] loaded {} type descriptors", tables.descriptors.len());
        Ok(())
    }

    /// Resolve a key to a live type handle.
    pub fn resolve(&self, key: &TypeKey) -> Result<Arc<TypeInfo>> {
        let mut tables = self.inner.lock();
        self.resolve_locked(&mut tables, key)
    }

    /// Resolve a canonical name against the catalog and this registry's table.
    ///
    /// Returns `Ok(None)` when neither the name nor its generic definition is
    /// known; nested arguments that fail to resolve are errors.
    pub fn resolve_name(&self, name: &str) -> Result<Option<Arc<TypeInfo>>> {
        let mut tables = self.inner.lock();
        self.resolve_name_locked(&mut tables, name)
    }

    fn resolve_locked(&self, tables: &mut Tables, key: &TypeKey) -> Result<Arc<TypeInfo>> {
        if let Some(ty) = tables.resolved.get(key) {
            return Ok(Arc::clone(ty));
        }
        let desc = tables
            .by_key
            .get(key)
            .and_then(|&i| tables.descriptors.get(i))
            .cloned()
            .ok_or_else(|| Error::UnknownTypeKey(key.to_string()))?;

        if !tables.resolving.insert(key.clone()) {
            return Err(Error::SymbolNotFound(format!(
                "type {} refers to itself",
                desc.canonical_name
            )));
        }
        let result = self.resolve_descriptor(tables, &desc);
        tables.resolving.remove(key);

        let ty = result?;
        tables.resolved.insert(key.clone(), Arc::clone(&ty));
        Ok(ty)
    }

    fn resolve_descriptor(&self, tables: &mut Tables, desc: &TypeDescriptor) -> Result<Arc<TypeInfo>> {
        match self.resolve_name_locked(tables, &desc.canonical_name) {
            Ok(Some(ty)) => return Ok(ty),
            Ok(None) => {}
            Err(e @ Error::MalformedGenericSignature(_)) => return Err(e),
            Err(e) if !desc.is_structural() => return Err(e),
            Err(e) => {
                log::debug!("[registry] {} not resolvable by name: {}", desc.canonical_name, e);
            }
        }

        if !desc.is_structural() {
            return Err(Error::SymbolNotFound(format!("type {}", desc.canonical_name)));
        }

        let mut fields = Vec::with_capacity(desc.fields.len());
        for field in &desc.fields {
            let ty = self.resolve_locked(tables, &field.type_key)?;
            fields.push(FieldInfo::new(field.name.clone(), ty));
        }
        log::warn!(
            "[registry] synthesizing {} from {} captured fields",
            desc.canonical_name,
            fields.len()
        );
        Ok(TypeInfo::synthesized(desc.canonical_name.clone(), fields))
    }

    fn resolve_name_locked(&self, tables: &mut Tables, name: &str) -> Result<Option<Arc<TypeInfo>>> {
        if let Some(ty) = self.catalog.find_type(name) {
            return Ok(Some(ty));
        }
        match parse_type_name(name)? {
            ParsedTypeName::Plain(_) => Ok(None),
            ParsedTypeName::Array(element) => {
                let element = self.resolve_nested(tables, element)?;
                Ok(Some(TypeInfo::array_of(element)))
            }
            ParsedTypeName::Generic { base, args, .. } => {
                let Some(definition) = self.catalog.find_type(base) else {
                    return Ok(None);
                };
                let args = args
                    .into_iter()
                    .map(|arg| self.resolve_nested(tables, arg))
                    .collect::<Result<Vec<_>>>()?;
                definition.instantiate(args).map(Some)
            }
        }
    }

    /// Nested names prefer this table's own entries so captured struct types
    /// can be synthesized inside containers.
    fn resolve_nested(&self, tables: &mut Tables, name: &str) -> Result<Arc<TypeInfo>> {
        if let Some(key) = tables.by_name.get(name).cloned() {
            return self.resolve_locked(tables, &key);
        }
        self.resolve_name_locked(tables, name)?
            .ok_or_else(|| Error::SymbolNotFound(format!("type {}", name)))
    }

    /// Snapshot of the table in insertion order.
    pub fn descriptors(&self) -> Vec<TypeDescriptor> {
        self.inner.lock().descriptors.clone()
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.inner.lock().descriptors.len()
    }

    /// Returns `true` if no types are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.len())
            .finish_non_exhaustive()
    }
}
