//! Catalog of entity types and their import names.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use super::TypeDef;
use crate::error::CatalogError;

/// Serialized form of a catalog.
///
/// Types are registered in document order, so supertypes must be listed
/// before the types that extend them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogDocument {
    /// Catalog version; plan caches are flushed when it changes.
    #[serde(default)]
    pub version: u64,
    /// Type definitions.
    pub types: Vec<TypeDef>,
}

/// Builder registering types in dependency order.
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    types: Vec<TypeDef>,
    index: HashMap<String, usize>,
    explicit_imports: HashMap<String, String>,
    auto_imports: HashMap<String, Vec<String>>,
    version: u64,
}

impl CatalogBuilder {
    /// Set the catalog version.
    pub fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    /// Register a type. Its supertypes must already be registered.
    pub fn with_type(mut self, def: TypeDef) -> Result<Self, CatalogError> {
        self.register(def)?;
        Ok(self)
    }

    /// Register a type in place.
    pub fn register(&mut self, def: TypeDef) -> Result<(), CatalogError> {
        if self.index.contains_key(&def.name) {
            return Err(CatalogError::DuplicateType(def.name));
        }

        for supertype in &def.supertypes {
            if !self.index.contains_key(supertype) {
                return Err(CatalogError::UnknownSupertype {
                    type_name: def.name.clone(),
                    supertype: supertype.clone(),
                });
            }
        }

        if let Some(mapping) = &def.entity {
            if let Some(superclass) = &mapping.mapped_superclass {
                let valid = self
                    .index
                    .get(superclass)
                    .is_some_and(|&i| self.types[i].is_entity())
                    && def
                        .supertypes
                        .iter()
                        .any(|s| assignable(&self.types, &self.index, superclass, s));
                if !valid {
                    return Err(CatalogError::InvalidMappedSuperclass {
                        entity: def.name.clone(),
                        superclass: superclass.clone(),
                    });
                }
            }

            for alias in std::iter::once(&def.name).chain(mapping.imports.iter()) {
                if let Some(existing) = self.explicit_imports.get(alias) {
                    return Err(CatalogError::DuplicateImport {
                        alias: alias.clone(),
                        existing: existing.clone(),
                    });
                }
            }
            for alias in std::iter::once(&def.name).chain(mapping.imports.iter()) {
                self.explicit_imports
                    .insert(alias.clone(), def.name.clone());
            }

            let short = def.short_name();
            if short != def.name {
                self.auto_imports
                    .entry(short.to_string())
                    .or_default()
                    .push(def.name.clone());
            }
        }

        self.index.insert(def.name.clone(), self.types.len());
        self.types.push(def);
        Ok(())
    }

    /// Finish building.
    pub fn build(self) -> EntityCatalog {
        tracing::debug!(
            types = self.types.len(),
            version = self.version,
            "entity catalog built"
        );
        EntityCatalog {
            types: self.types,
            index: self.index,
            explicit_imports: self.explicit_imports,
            auto_imports: self.auto_imports,
            implementors: DashMap::new(),
            version: self.version,
        }
    }
}

/// Registry of entity types, consulted when expanding polymorphic queries.
#[derive(Debug)]
pub struct EntityCatalog {
    types: Vec<TypeDef>,
    index: HashMap<String, usize>,
    explicit_imports: HashMap<String, String>,
    auto_imports: HashMap<String, Vec<String>>,
    implementors: DashMap<String, Arc<[String]>>,
    version: u64,
}

impl EntityCatalog {
    /// Start building a catalog.
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    /// Build a catalog from a JSON [`CatalogDocument`].
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let document: CatalogDocument = serde_json::from_str(json)?;
        Self::from_document(document)
    }

    /// Build a catalog from a parsed document.
    pub fn from_document(document: CatalogDocument) -> Result<Self, CatalogError> {
        let mut builder = Self::builder().with_version(document.version);
        for def in document.types {
            builder.register(def)?;
        }
        Ok(builder.build())
    }

    /// Catalog version.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Look up a type by fully-qualified name.
    pub fn get(&self, name: &str) -> Option<&TypeDef> {
        self.index.get(name).map(|&i| &self.types[i])
    }

    /// All types in registration order.
    pub fn types(&self) -> impl Iterator<Item = &TypeDef> {
        self.types.iter()
    }

    /// Check if `name` is a mapped entity.
    pub fn is_entity(&self, name: &str) -> bool {
        self.get(name).is_some_and(TypeDef::is_entity)
    }

    /// Resolve an import name (entity short name, alias or qualified name).
    ///
    /// Returns `Ok(None)` for names the catalog does not know, and an error
    /// when an unqualified name is shared by several entities.
    pub fn resolve_import(&self, name: &str) -> Result<Option<&str>, CatalogError> {
        if let Some(entity) = self.explicit_imports.get(name) {
            return Ok(Some(entity));
        }

        if let Some(candidates) = self.auto_imports.get(name) {
            return match candidates.as_slice() {
                [single] => Ok(Some(single)),
                _ => Err(CatalogError::AmbiguousImport {
                    name: name.to_string(),
                    candidates: candidates.clone(),
                }),
            };
        }

        Ok(self.get(name).map(|def| def.name.as_str()))
    }

    /// Check if `subtype` is `supertype` or (transitively) extends it.
    pub fn is_assignable(&self, supertype: &str, subtype: &str) -> bool {
        assignable(&self.types, &self.index, supertype, subtype)
    }

    /// Tables read by an entity; empty for unmapped types.
    pub fn query_spaces(&self, entity: &str) -> &[String] {
        self.get(entity)
            .and_then(|def| def.entity.as_ref())
            .map(|mapping| mapping.query_spaces.as_slice())
            .unwrap_or(&[])
    }

    /// Entities a query against `type_name` must be expanded into.
    ///
    /// An entity using explicit polymorphism answers only for its own name.
    /// Otherwise every implicitly polymorphic entity assignable to the type is
    /// included, except those whose mapped superclass is itself assignable:
    /// the superclass query already returns them.
    pub fn implementors(&self, type_name: &str) -> Arc<[String]> {
        if let Some(cached) = self.implementors.get(type_name) {
            return cached.clone();
        }

        let computed: Arc<[String]> = self.compute_implementors(type_name).into();
        self.implementors
            .insert(type_name.to_string(), computed.clone());
        computed
    }

    fn compute_implementors(&self, type_name: &str) -> Vec<String> {
        let mut results = Vec::new();

        for def in &self.types {
            let Some(mapping) = &def.entity else {
                continue;
            };
            let is_mapped_type = def.name == type_name;

            if mapping.explicit_polymorphism {
                if is_mapped_type {
                    return vec![def.name.clone()];
                }
                continue;
            }

            if is_mapped_type {
                results.push(def.name.clone());
            } else if self.is_assignable(type_name, &def.name) {
                let covered_by_superclass = mapping
                    .mapped_superclass
                    .as_deref()
                    .is_some_and(|superclass| self.is_assignable(type_name, superclass));
                if !covered_by_superclass {
                    results.push(def.name.clone());
                }
            }
        }

        results
    }
}

fn assignable(
    types: &[TypeDef],
    index: &HashMap<String, usize>,
    supertype: &str,
    subtype: &str,
) -> bool {
    if supertype == subtype {
        return true;
    }
    match index.get(subtype) {
        Some(&i) => types[i]
            .supertypes
            .iter()
            .any(|parent| assignable(types, index, supertype, parent)),
        None => false,
    }
}
