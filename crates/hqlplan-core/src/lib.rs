//! hqlplan core - polymorphic query splitting, query plans and result
//! coordination.
//!
//! An HQL query naming an interface or a mapped superclass is expanded into
//! one concrete query per implementing entity. Each concrete query is handed
//! to a [`QueryTranslator`] supplied by the embedding application, and the
//! resulting [`QueryPlan`] runs them all, merging results, applying
//! pagination in memory and summing update counts where needed.

pub mod catalog;
pub mod config;
pub mod error;
pub mod query;
pub mod value;

pub use catalog::{CatalogBuilder, CatalogDocument, EntityCatalog, EntityMapping, TypeDef};
pub use config::{PlanConfig, QuerySubstitutions, DEFAULT_PLAN_CACHE_MAX_SIZE};
pub use error::{CatalogError, Error, QueryError, Result};
pub use query::{
    concrete_queries, guess_result_size, EnabledFilter, ParameterMetadata, PlanContext,
    QueryParameters, QueryPlan, QueryPlanCache, QueryTranslator, QueryTranslatorFactory,
    ReturnMetadata, RowSelection, ScrollableResults, Session,
};
pub use value::{EntityInstance, ResultRow, RowIdentity, Value, ValueType};

/// Re-export the query language front end.
pub use hqlplan_lang as lang;
