//! Query plans and their execution.
//!
//! A [`QueryPlan`] holds one compiled translator per concrete query of a
//! possibly polymorphic HQL query, and coordinates their execution so that
//! callers see a single result.

mod cache;
mod context;
mod coordinator;
mod identity;
mod metadata;
mod parameters;
mod plan;
mod scroll;
mod selection;
mod session;
mod splitter;
mod translator;

#[cfg(test)]
mod testing;

pub use cache::{CacheStats, CachedPlan, PlanCacheKey, QueryPlanCache};
pub use context::PlanContext;
pub use coordinator::{guess_result_size, DEFAULT_RESULT_SIZE_GUESS};
pub use identity::IdentitySet;
pub use metadata::{
    NamedParameterDescriptor, OrdinalParameterDescriptor, ParameterMetadata, ReturnMetadata,
};
pub use parameters::{EnabledFilter, QueryParameters, TypedValue};
pub use plan::QueryPlan;
pub use scroll::{ScrollableResults, VecScrollableResults};
pub use selection::RowSelection;
pub use session::Session;
pub use splitter::concrete_queries;
pub use translator::{
    ParameterInfo, ParameterTranslations, QueryTranslator, QueryTranslatorFactory, RowIterator,
};
