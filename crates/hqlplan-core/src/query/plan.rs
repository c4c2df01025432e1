//! Query plans.
//!
//! A plan is built once per distinct (query, shallow flag, enabled filters)
//! combination: the query is split into concrete queries, one translator is
//! created and compiled per concrete query, and the parameter and return
//! metadata are derived from the first translator. The plan is immutable
//! afterwards and is shared between executions and threads.

use std::collections::BTreeSet;

use tracing::debug;

use super::context::PlanContext;
use super::metadata::{ParameterMetadata, ReturnMetadata};
use super::parameters::EnabledFilter;
use super::splitter::concrete_queries;
use super::translator::QueryTranslator;
use crate::error::Result;

/// Execution plan for an HQL query or collection filter.
#[derive(Debug)]
pub struct QueryPlan {
    source_query: String,
    collection_role: Option<String>,
    pub(super) translators: Vec<Box<dyn QueryTranslator>>,
    parameter_metadata: ParameterMetadata,
    return_metadata: Option<ReturnMetadata>,
    query_spaces: BTreeSet<String>,
    enabled_filter_names: BTreeSet<String>,
    shallow: bool,
}

impl QueryPlan {
    /// Build the plan for an HQL query.
    pub fn new(
        hql: &str,
        shallow: bool,
        enabled_filters: &[EnabledFilter],
        ctx: &PlanContext,
    ) -> Result<Self> {
        Self::build(hql, None, shallow, enabled_filters, ctx)
    }

    /// Build the plan for a filter over the elements of a collection.
    pub fn for_collection_filter(
        hql: &str,
        collection_role: &str,
        shallow: bool,
        enabled_filters: &[EnabledFilter],
        ctx: &PlanContext,
    ) -> Result<Self> {
        Self::build(hql, Some(collection_role), shallow, enabled_filters, ctx)
    }

    fn build(
        hql: &str,
        collection_role: Option<&str>,
        shallow: bool,
        enabled_filters: &[EnabledFilter],
        ctx: &PlanContext,
    ) -> Result<Self> {
        let concrete = concrete_queries(hql, ctx.catalog())?;
        let factory = ctx.translator_factory();
        let substitutions = &ctx.config().query_substitutions;

        let mut translators = Vec::with_capacity(concrete.len());
        let mut query_spaces = BTreeSet::new();

        for query in &concrete {
            let translator = match collection_role {
                None => {
                    let mut translator =
                        factory.create_query_translator(hql, query, enabled_filters, ctx.catalog())?;
                    translator.compile(substitutions, shallow)?;
                    translator
                }
                Some(role) => {
                    let mut translator = factory.create_filter_translator(
                        hql,
                        query,
                        enabled_filters,
                        ctx.catalog(),
                    )?;
                    translator.compile_filter(role, substitutions, shallow)?;
                    translator
                }
            };
            query_spaces.extend(translator.query_spaces().iter().cloned());
            translators.push(translator);
        }

        let (parameter_metadata, return_metadata) = match translators.first() {
            None => (ParameterMetadata::empty(), None),
            Some(first) => {
                let parameters = ParameterMetadata::from_translations(first.parameter_translations());
                let returns = if first.is_manipulation_statement() {
                    None
                } else {
                    // Split queries may disagree on types; only the arity is shared.
                    let types = if translators.len() > 1 {
                        vec![None; first.return_types().len()]
                    } else {
                        first.return_types().iter().cloned().map(Some).collect()
                    };
                    Some(ReturnMetadata::new(
                        first.return_aliases().map(<[String]>::to_vec),
                        types,
                    ))
                };
                (parameters, returns)
            }
        };

        let enabled_filter_names = enabled_filters.iter().map(|f| f.name.clone()).collect();

        debug!(
            query = %hql,
            translators = translators.len(),
            collection_role = ?collection_role,
            shallow,
            "created query plan"
        );

        Ok(Self {
            source_query: hql.to_string(),
            collection_role: collection_role.map(str::to_string),
            translators,
            parameter_metadata,
            return_metadata,
            query_spaces,
            enabled_filter_names,
            shallow,
        })
    }

    /// The query text this plan was built from.
    pub fn source_query(&self) -> &str {
        &self.source_query
    }

    /// Collection role, for collection filter plans.
    pub fn collection_role(&self) -> Option<&str> {
        self.collection_role.as_deref()
    }

    /// Union of the tables touched by all translators.
    pub fn query_spaces(&self) -> &BTreeSet<String> {
        &self.query_spaces
    }

    /// Parameter metadata.
    pub fn parameter_metadata(&self) -> &ParameterMetadata {
        &self.parameter_metadata
    }

    /// Return metadata; absent for manipulation statements and empty plans.
    pub fn return_metadata(&self) -> Option<&ReturnMetadata> {
        self.return_metadata.as_ref()
    }

    /// Names of the filters enabled when the plan was built.
    pub fn enabled_filter_names(&self) -> &BTreeSet<String> {
        &self.enabled_filter_names
    }

    /// Check if the plan was built for shallow execution.
    pub fn is_shallow(&self) -> bool {
        self.shallow
    }

    /// The translators, one per concrete query.
    pub fn translators(&self) -> &[Box<dyn QueryTranslator>] {
        &self.translators
    }

    /// All SQL generated by all translators. Rebuilt on every call.
    pub fn sql_strings(&self) -> Vec<String> {
        self.translators
            .iter()
            .flat_map(|t| t.sql_strings())
            .collect()
    }

    /// Holder type of a `select new ...` clause.
    pub fn dynamic_instantiation_result_type(&self) -> Option<&str> {
        self.translators
            .first()
            .and_then(|t| t.dynamic_instantiation_result_type())
    }

    /// Check if this is a select query. A plan without translators counts as
    /// a select returning nothing.
    pub fn is_select(&self) -> bool {
        !self
            .translators
            .first()
            .is_some_and(|t| t.is_manipulation_statement())
    }

    /// Check if this is an update statement.
    pub fn is_update(&self) -> bool {
        self.translators
            .first()
            .is_some_and(|t| t.is_update_statement())
    }
}
