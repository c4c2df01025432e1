//! Collaborators needed to build query plans.

use std::sync::Arc;

use super::translator::QueryTranslatorFactory;
use crate::catalog::EntityCatalog;
use crate::config::PlanConfig;

/// The catalog, translator factory and configuration a plan is built with.
#[derive(Clone)]
pub struct PlanContext {
    catalog: Arc<EntityCatalog>,
    translator_factory: Arc<dyn QueryTranslatorFactory>,
    config: PlanConfig,
}

impl PlanContext {
    /// Create a context with default configuration.
    pub fn new(
        catalog: Arc<EntityCatalog>,
        translator_factory: Arc<dyn QueryTranslatorFactory>,
    ) -> Self {
        Self {
            catalog,
            translator_factory,
            config: PlanConfig::default(),
        }
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: PlanConfig) -> Self {
        self.config = config;
        self
    }

    /// The entity catalog.
    pub fn catalog(&self) -> &EntityCatalog {
        &self.catalog
    }

    /// The translator factory.
    pub fn translator_factory(&self) -> &dyn QueryTranslatorFactory {
        self.translator_factory.as_ref()
    }

    /// The planning configuration.
    pub fn config(&self) -> &PlanConfig {
        &self.config
    }
}

impl std::fmt::Debug for PlanContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanContext")
            .field("catalog_version", &self.catalog.version())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
