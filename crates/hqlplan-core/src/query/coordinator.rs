//! Execution of a plan across its translators.
//!
//! A split query runs every translator in turn and merges their results.
//! When pagination is requested the database can no longer apply it, since
//! each translator only sees part of the result, so limits are stripped from
//! the per-translator parameters and applied here on the merged rows.

use tracing::{trace, warn};

use super::identity::IdentitySet;
use super::parameters::QueryParameters;
use super::plan::QueryPlan;
use super::scroll::ScrollableResults;
use super::selection::RowSelection;
use super::session::Session;
use super::translator::RowIterator;
use crate::error::{QueryError, Result};
use crate::value::ResultRow;

/// Capacity used when the row selection gives no hint.
pub const DEFAULT_RESULT_SIZE_GUESS: usize = 7;

/// Upper bound on a capacity derived from `max_rows`.
const MAX_REASONABLE_RESULT_SIZE: u32 = 100;

/// Estimate the number of rows a query returns, for pre-sizing result buffers.
pub fn guess_result_size(selection: Option<&RowSelection>) -> usize {
    if let Some(selection) = selection {
        let fetch_size = selection.fetch_size.filter(|&f| f > 0);
        if let Some(max_rows) = selection.max_rows.filter(|&m| m > 0) {
            let cap = fetch_size.unwrap_or(MAX_REASONABLE_RESULT_SIZE);
            return cap.min(max_rows) as usize;
        }
        if let Some(fetch_size) = fetch_size {
            return fetch_size as usize;
        }
    }
    DEFAULT_RESULT_SIZE_GUESS
}

impl QueryPlan {
    /// Run the query and collect all rows.
    pub fn perform_list(
        &self,
        params: &QueryParameters,
        session: &dyn Session,
    ) -> Result<Vec<ResultRow>> {
        trace!(
            query = %self.source_query(),
            session = session.session_id(),
            "find: {}",
            self.source_query()
        );
        params.trace_parameters();

        if let [translator] = self.translators.as_slice() {
            return translator.list(session, params);
        }

        let selection = params.row_selection();
        let limited = selection.is_some_and(RowSelection::defines_limits);
        let mut results = Vec::with_capacity(guess_result_size(selection));

        match selection.filter(|_| limited) {
            Some(selection) => {
                warn!(
                    query = %self.source_query(),
                    "first_row/max_rows specified with a polymorphic query; applying in memory"
                );
                let first_row = selection.first_row.unwrap_or(0) as usize;
                let max_rows = selection.max_rows.map(|m| m as usize);
                if max_rows == Some(0) {
                    return Ok(results);
                }
                let unlimited = params.create_copy_using(selection.without_limits());
                let mut distinct = IdentitySet::with_capacity(results.capacity());
                let mut included = 0usize;

                'translators: for translator in &self.translators {
                    for row in translator.list(session, &unlimited)? {
                        if !distinct.insert(&row) {
                            continue;
                        }
                        included += 1;
                        if included <= first_row {
                            continue;
                        }
                        results.push(row);
                        if max_rows.is_some_and(|max| results.len() >= max) {
                            break 'translators;
                        }
                    }
                }
            }
            None => {
                for translator in &self.translators {
                    results.extend(translator.list(session, params)?);
                }
            }
        }

        Ok(results)
    }

    /// Run the query, returning rows lazily.
    ///
    /// For a split query every translator is started before the first row is
    /// returned; their iterators are then drained in translator order.
    pub fn perform_iterate<'s>(
        &'s self,
        params: &QueryParameters,
        session: &'s dyn Session,
    ) -> Result<RowIterator<'s>> {
        trace!(
            query = %self.source_query(),
            session = session.session_id(),
            "iterate: {}",
            self.source_query()
        );
        params.trace_parameters();

        match self.translators.as_slice() {
            [] => Ok(Box::new(std::iter::empty())),
            [translator] => translator.iterate(session, params),
            translators => {
                let iterators = translators
                    .iter()
                    .map(|t| t.iterate(session, params))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Box::new(iterators.into_iter().flatten()))
            }
        }
    }

    /// Open a scrollable cursor over the results.
    pub fn perform_scroll(
        &self,
        params: &QueryParameters,
        session: &dyn Session,
    ) -> Result<Box<dyn ScrollableResults>> {
        trace!(
            query = %self.source_query(),
            session = session.session_id(),
            "scroll: {}",
            self.source_query()
        );
        params.trace_parameters();

        let [translator] = self.translators.as_slice() else {
            return Err(QueryError::PolymorphicScroll.into());
        };
        let limited = params
            .row_selection()
            .is_some_and(RowSelection::defines_limits);
        if limited && translator.contains_collection_fetches() {
            return Err(QueryError::ScrollWithCollectionFetchLimits.into());
        }
        translator.scroll(session, params)
    }

    /// Run a bulk manipulation statement; returns the affected row count
    /// summed over all translators.
    pub fn perform_execute_update(
        &self,
        params: &QueryParameters,
        session: &dyn Session,
    ) -> Result<u64> {
        trace!(
            query = %self.source_query(),
            session = session.session_id(),
            "execute_update: {}",
            self.source_query()
        );
        params.trace_parameters();

        if self.translators.len() > 1 {
            warn!(
                query = %self.source_query(),
                translators = self.translators.len(),
                "manipulation query resulted in multiple statements"
            );
        }

        let mut affected = 0;
        for translator in &self.translators {
            affected += translator.execute_update(session, params)?;
        }
        Ok(affected)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::error::Error;
    use crate::query::context::PlanContext;
    use crate::query::testing::{zoo_context, CallLog, NoSession, StubFactory, StubTranslator};
    use crate::value::{EntityInstance, Value};

    fn entity(name: &str, id: i64) -> ResultRow {
        ResultRow::Entity(Arc::new(EntityInstance::new(name, id)))
    }

    fn ids(rows: &[ResultRow]) -> Vec<(String, i64)> {
        rows.iter()
            .map(|r| {
                let e = r.as_entity().unwrap();
                (e.entity_name.clone(), e.id.as_i64().unwrap())
            })
            .collect()
    }

    /// `zoo.Named` splits into an animal and a person query; animals come
    /// first. `shared` is returned by both.
    fn named_context(
        animals: Vec<ResultRow>,
        people: Vec<ResultRow>,
        log: Arc<CallLog>,
    ) -> PlanContext {
        zoo_context(StubFactory::new(move |query| {
            let rows = if query.contains("zoo.Animal") {
                animals.clone()
            } else {
                people.clone()
            };
            StubTranslator::select(query)
                .with_rows(rows)
                .with_log(log.clone())
        }))
    }

    fn named_plan(ctx: &PlanContext) -> QueryPlan {
        QueryPlan::new("from zoo.Named n", false, &[], ctx).unwrap()
    }

    #[test]
    fn test_guess_result_size() {
        assert_eq!(guess_result_size(None), 7);
        assert_eq!(guess_result_size(Some(&RowSelection::new())), 7);
        assert_eq!(
            guess_result_size(Some(&RowSelection::new().with_max_rows(10))),
            10
        );
        assert_eq!(
            guess_result_size(Some(&RowSelection::new().with_max_rows(500))),
            100
        );
        assert_eq!(
            guess_result_size(Some(
                &RowSelection::new().with_max_rows(500).with_fetch_size(50)
            )),
            50
        );
        assert_eq!(
            guess_result_size(Some(&RowSelection::new().with_fetch_size(25))),
            25
        );
        assert_eq!(
            guess_result_size(Some(
                &RowSelection::new().with_max_rows(500).with_fetch_size(0)
            )),
            100
        );
        assert_eq!(
            guess_result_size(Some(&RowSelection::new().with_max_rows(0))),
            7
        );
    }

    #[test]
    fn test_single_translator_passes_parameters_through() {
        let log = Arc::new(CallLog::default());
        let rows = vec![entity("zoo.Dog", 1), entity("zoo.Dog", 2)];
        let ctx = zoo_context(StubFactory::new({
            let log = log.clone();
            move |query| {
                StubTranslator::select(query)
                    .with_rows(rows.clone())
                    .with_log(log.clone())
            }
        }));
        let plan = QueryPlan::new("from Dog", false, &[], &ctx).unwrap();
        let selection = RowSelection::new().with_first_row(1).with_max_rows(1);
        let params = QueryParameters::new().with_row_selection(selection);

        let result = plan.perform_list(&params, &NoSession).unwrap();

        // The translator applies limits itself on the fast path.
        assert_eq!(result.len(), 2);
        assert_eq!(*log.selections.lock(), vec![Some(selection)]);
    }

    #[test]
    fn test_split_without_limits_concatenates_in_order() {
        let log = Arc::new(CallLog::default());
        let shared = entity("zoo.Dog", 9);
        let ctx = named_context(
            vec![entity("zoo.Dog", 1), shared.clone()],
            vec![entity("zoo.Person", 1), shared],
            log.clone(),
        );
        let result = named_plan(&ctx)
            .perform_list(&QueryParameters::new(), &NoSession)
            .unwrap();

        // No deduplication without limits.
        assert_eq!(
            ids(&result),
            vec![
                ("zoo.Dog".to_string(), 1),
                ("zoo.Dog".to_string(), 9),
                ("zoo.Person".to_string(), 1),
                ("zoo.Dog".to_string(), 9),
            ]
        );
        assert_eq!(log.list_count(), 2);
    }

    #[test]
    fn test_split_with_limits_deduplicates_and_windows() {
        let log = Arc::new(CallLog::default());
        let shared = entity("zoo.Dog", 9);
        let ctx = named_context(
            vec![entity("zoo.Dog", 1), shared.clone(), entity("zoo.Dog", 2)],
            vec![shared, entity("zoo.Person", 1), entity("zoo.Person", 2)],
            log.clone(),
        );
        let selection = RowSelection::new()
            .with_first_row(2)
            .with_max_rows(2)
            .with_fetch_size(10)
            .with_timeout(Duration::from_secs(3));
        let params = QueryParameters::new().with_row_selection(selection);

        let result = named_plan(&ctx).perform_list(&params, &NoSession).unwrap();

        // Distinct order: Dog1, Dog9, Dog2, Person1, Person2.
        assert_eq!(
            ids(&result),
            vec![("zoo.Dog".to_string(), 2), ("zoo.Person".to_string(), 1)]
        );
        let seen = log.selections.lock();
        assert_eq!(seen.len(), 2);
        for s in seen.iter() {
            assert_eq!(*s, Some(selection.without_limits()));
        }
    }

    #[test]
    fn test_split_with_limits_stops_early() {
        let log = Arc::new(CallLog::default());
        let ctx = named_context(
            vec![entity("zoo.Dog", 1), entity("zoo.Dog", 2)],
            vec![entity("zoo.Person", 1)],
            log.clone(),
        );
        let params =
            QueryParameters::new().with_row_selection(RowSelection::new().with_max_rows(2));

        let result = named_plan(&ctx).perform_list(&params, &NoSession).unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(log.list_count(), 1);
    }

    #[test]
    fn test_split_with_first_row_only() {
        let log = Arc::new(CallLog::default());
        let ctx = named_context(
            vec![entity("zoo.Dog", 1), entity("zoo.Dog", 2)],
            vec![entity("zoo.Person", 1)],
            log,
        );
        let params =
            QueryParameters::new().with_row_selection(RowSelection::new().with_first_row(1));

        let result = named_plan(&ctx).perform_list(&params, &NoSession).unwrap();

        assert_eq!(
            ids(&result),
            vec![("zoo.Dog".to_string(), 2), ("zoo.Person".to_string(), 1)]
        );
    }

    #[test]
    fn test_split_with_zero_max_rows_is_empty() {
        let log = Arc::new(CallLog::default());
        let ctx = named_context(vec![entity("zoo.Dog", 1)], vec![], log.clone());
        let params =
            QueryParameters::new().with_row_selection(RowSelection::new().with_max_rows(0));

        let result = named_plan(&ctx).perform_list(&params, &NoSession).unwrap();

        assert!(result.is_empty());
        assert_eq!(log.list_count(), 0);
    }

    #[test]
    fn test_scalars_are_never_deduplicated() {
        let log = Arc::new(CallLog::default());
        let scalar = ResultRow::Scalar(Value::from("rex"));
        let ctx = named_context(vec![scalar.clone()], vec![scalar], log);
        let params =
            QueryParameters::new().with_row_selection(RowSelection::new().with_max_rows(10));

        let result = named_plan(&ctx).perform_list(&params, &NoSession).unwrap();

        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_empty_plan_lists_nothing() {
        let ctx = zoo_context(StubFactory::new(StubTranslator::select));
        let plan = QueryPlan::new("from zoo.Unmapped u", false, &[], &ctx).unwrap();

        assert!(plan
            .perform_list(&QueryParameters::new(), &NoSession)
            .unwrap()
            .is_empty());
        assert_eq!(
            plan.perform_iterate(&QueryParameters::new(), &NoSession)
                .unwrap()
                .count(),
            0
        );
        assert_eq!(
            plan.perform_execute_update(&QueryParameters::new(), &NoSession)
                .unwrap(),
            0
        );
    }

    #[test]
    fn test_translator_error_aborts_list() {
        let ctx = zoo_context(StubFactory::new(|query| {
            let translator = StubTranslator::select(query).with_rows(vec![entity("zoo.Dog", 1)]);
            if query.contains("zoo.Person") {
                translator.failing_list()
            } else {
                translator
            }
        }));
        let err = named_plan(&ctx)
            .perform_list(&QueryParameters::new(), &NoSession)
            .unwrap_err();
        assert!(matches!(err, Error::Execution(_)));
    }

    #[test]
    fn test_iterate_chains_translators() {
        let log = Arc::new(CallLog::default());
        let ctx = named_context(
            vec![entity("zoo.Dog", 1)],
            vec![entity("zoo.Person", 1), entity("zoo.Person", 2)],
            log,
        );
        let plan = named_plan(&ctx);
        let rows = plan
            .perform_iterate(&QueryParameters::new(), &NoSession)
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(
            ids(&rows),
            vec![
                ("zoo.Dog".to_string(), 1),
                ("zoo.Person".to_string(), 1),
                ("zoo.Person".to_string(), 2),
            ]
        );
    }

    #[test]
    fn test_scroll_single_translator() {
        let ctx = zoo_context(StubFactory::new(|query| {
            StubTranslator::select(query).with_rows(vec![entity("zoo.Dog", 1)])
        }));
        let plan = QueryPlan::new("from Dog", false, &[], &ctx).unwrap();
        let mut cursor = plan
            .perform_scroll(&QueryParameters::new(), &NoSession)
            .unwrap();
        assert!(cursor.next().unwrap());
        assert!(cursor.get().is_some());
        assert!(!cursor.next().unwrap());
    }

    #[test]
    fn test_scroll_rejects_split_and_empty_plans() {
        let log = Arc::new(CallLog::default());
        let ctx = named_context(vec![], vec![], log);
        let err = named_plan(&ctx)
            .perform_scroll(&QueryParameters::new(), &NoSession)
            .unwrap_err();
        assert!(matches!(err, Error::Query(QueryError::PolymorphicScroll)));

        let empty = QueryPlan::new("from zoo.Unmapped u", false, &[], &ctx).unwrap();
        let err = empty
            .perform_scroll(&QueryParameters::new(), &NoSession)
            .unwrap_err();
        assert!(matches!(err, Error::Query(QueryError::PolymorphicScroll)));
    }

    #[test]
    fn test_scroll_rejects_limited_collection_fetch() {
        let ctx = zoo_context(StubFactory::new(|query| {
            StubTranslator::select(query).with_collection_fetches()
        }));
        let plan = QueryPlan::new("from Person p join fetch p.pets", false, &[], &ctx).unwrap();

        assert!(plan
            .perform_scroll(&QueryParameters::new(), &NoSession)
            .is_ok());

        let params =
            QueryParameters::new().with_row_selection(RowSelection::new().with_max_rows(5));
        let err = plan.perform_scroll(&params, &NoSession).unwrap_err();
        assert!(matches!(
            err,
            Error::Query(QueryError::ScrollWithCollectionFetchLimits)
        ));
    }

    #[test]
    fn test_execute_update_sums_affected_rows() {
        let ctx = zoo_context(StubFactory::new(|query| {
            let affected = if query.contains("zoo.Animal") { 3 } else { 4 };
            StubTranslator::update(query, affected)
        }));
        let plan = QueryPlan::new("delete from zoo.Named", false, &[], &ctx).unwrap();
        assert_eq!(plan.translators().len(), 2);
        assert_eq!(
            plan.perform_execute_update(&QueryParameters::new(), &NoSession)
                .unwrap(),
            7
        );
    }
}
