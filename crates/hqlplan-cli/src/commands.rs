//! Subcommand execution.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use hqlplan_core::{
    concrete_queries, CatalogError, EnabledFilter, EntityCatalog, Error, PlanConfig,
    PlanContext, QueryError, QueryPlanCache,
};
use thiserror::Error;
use tracing::debug;

use crate::explain::{DescribingFactory, Explanation};
use crate::formatter::Formatter;

/// Command errors.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The catalog file could not be read.
    #[error("cannot read catalog {}: {source}", .path.display())]
    ReadCatalog {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The catalog file is not a valid catalog.
    #[error("invalid catalog {}: {source}", .path.display())]
    InvalidCatalog {
        path: PathBuf,
        #[source]
        source: CatalogError,
    },

    /// The query could not be tokenized; the message points into the query.
    #[error("{0}")]
    Syntax(String),

    /// Plan construction failed.
    #[error(transparent)]
    Plan(Error),
}

impl CommandError {
    fn from_plan(error: Error, query: &str) -> Self {
        match error {
            Error::Query(QueryError::Lex(e)) => CommandError::Syntax(e.format_with_source(query)),
            other => CommandError::Plan(other),
        }
    }
}

/// Options of `explain`.
#[derive(Debug, Clone, Default)]
pub struct ExplainOptions {
    pub shallow: bool,
    pub filters: Vec<String>,
    pub collection_role: Option<String>,
}

/// Load an entity catalog from a JSON file.
pub fn load_catalog(path: &Path) -> Result<EntityCatalog, CommandError> {
    let json = std::fs::read_to_string(path).map_err(|source| CommandError::ReadCatalog {
        path: path.to_path_buf(),
        source,
    })?;
    let catalog =
        EntityCatalog::from_json(&json).map_err(|source| CommandError::InvalidCatalog {
            path: path.to_path_buf(),
            source,
        })?;
    debug!(path = %path.display(), version = catalog.version(), "loaded catalog");
    Ok(catalog)
}

/// Split a query into its concrete queries.
pub fn split(
    query: &str,
    catalog: &EntityCatalog,
    formatter: &dyn Formatter,
) -> Result<String, CommandError> {
    let concrete = concrete_queries(query, catalog).map_err(|e| CommandError::from_plan(e, query))?;
    Ok(formatter.format_split(query, &concrete))
}

/// Build a plan for a query and describe it.
pub fn explain(
    query: &str,
    catalog: EntityCatalog,
    config: PlanConfig,
    options: &ExplainOptions,
    formatter: &dyn Formatter,
) -> Result<String, CommandError> {
    let cache = QueryPlanCache::from_config(&config);
    let ctx = PlanContext::new(Arc::new(catalog), Arc::new(DescribingFactory)).with_config(config);
    let filters: Vec<EnabledFilter> = options.filters.iter().map(EnabledFilter::new).collect();

    let plan = match &options.collection_role {
        Some(role) => cache.filter_plan(query, role, options.shallow, &filters, &ctx),
        None => cache.plan(query, options.shallow, &filters, &ctx),
    }
    .map_err(|e| CommandError::from_plan(e, query))?;

    Ok(formatter.format_explanation(&Explanation::from_plan(&plan)))
}
