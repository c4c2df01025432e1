//! Translator stubs shared by the unit tests of this module.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use hqlplan_lang::recognize_parameters;
use parking_lot::Mutex;

use super::context::PlanContext;
use super::parameters::{EnabledFilter, QueryParameters};
use super::scroll::{ScrollableResults, VecScrollableResults};
use super::selection::RowSelection;
use super::session::Session;
use super::translator::{ParameterTranslations, QueryTranslator, QueryTranslatorFactory, RowIterator};
use crate::catalog::{EntityCatalog, TypeDef};
use crate::config::QuerySubstitutions;
use crate::error::{Error, QueryError, Result};
use crate::value::{ResultRow, ValueType};

pub(crate) struct NoSession;

impl Session for NoSession {
    fn session_id(&self) -> u64 {
        0
    }
}

/// Records how translators were executed.
#[derive(Debug, Default)]
pub(crate) struct CallLog {
    pub lists: AtomicUsize,
    pub selections: Mutex<Vec<Option<RowSelection>>>,
}

impl CallLog {
    pub fn list_count(&self) -> usize {
        self.lists.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Default)]
pub(crate) struct StubTranslator {
    identifier: String,
    query: String,
    sql: Option<String>,
    rows: Vec<ResultRow>,
    spaces: BTreeSet<String>,
    parameters: ParameterTranslations,
    aliases: Option<Vec<String>>,
    types: Vec<ValueType>,
    manipulation: bool,
    affected: u64,
    collection_fetches: bool,
    fail_compile: bool,
    fail_list: bool,
    log: Arc<CallLog>,
}

impl StubTranslator {
    pub fn select(query: &str) -> Self {
        Self {
            query: query.to_string(),
            ..Self::default()
        }
    }

    pub fn update(query: &str, affected: u64) -> Self {
        Self {
            query: query.to_string(),
            manipulation: true,
            affected,
            ..Self::default()
        }
    }

    pub fn with_rows(mut self, rows: Vec<ResultRow>) -> Self {
        self.rows = rows;
        self
    }

    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = Some(aliases.iter().map(|a| a.to_string()).collect());
        self
    }

    pub fn with_types(mut self, types: Vec<ValueType>) -> Self {
        self.types = types;
        self
    }

    pub fn with_collection_fetches(mut self) -> Self {
        self.collection_fetches = true;
        self
    }

    pub fn with_log(mut self, log: Arc<CallLog>) -> Self {
        self.log = log;
        self
    }

    pub fn failing_compile(mut self) -> Self {
        self.fail_compile = true;
        self
    }

    pub fn failing_list(mut self) -> Self {
        self.fail_list = true;
        self
    }

    fn compile_sql(&mut self, prefix: String, substitutions: &QuerySubstitutions) -> Result<()> {
        if self.fail_compile {
            return Err(Error::Translation(format!("cannot compile {}", self.query)));
        }
        let rewritten = substitutions.apply(&self.query).map_err(QueryError::from)?;
        self.sql = Some(format!("{}sql: {}", prefix, rewritten));
        Ok(())
    }
}

impl QueryTranslator for StubTranslator {
    fn compile(&mut self, substitutions: &QuerySubstitutions, shallow: bool) -> Result<()> {
        let prefix = if shallow { "shallow " } else { "" };
        self.compile_sql(prefix.to_string(), substitutions)
    }

    fn compile_filter(
        &mut self,
        collection_role: &str,
        substitutions: &QuerySubstitutions,
        _shallow: bool,
    ) -> Result<()> {
        self.compile_sql(format!("filter({}) ", collection_role), substitutions)
    }

    fn query_identifier(&self) -> &str {
        &self.identifier
    }

    fn query_string(&self) -> &str {
        &self.query
    }

    fn sql_strings(&self) -> Vec<String> {
        self.sql.iter().cloned().collect()
    }

    fn query_spaces(&self) -> &BTreeSet<String> {
        &self.spaces
    }

    fn parameter_translations(&self) -> &ParameterTranslations {
        &self.parameters
    }

    fn return_aliases(&self) -> Option<&[String]> {
        self.aliases.as_deref()
    }

    fn return_types(&self) -> &[ValueType] {
        &self.types
    }

    fn is_manipulation_statement(&self) -> bool {
        self.manipulation
    }

    fn is_update_statement(&self) -> bool {
        self.manipulation
    }

    fn contains_collection_fetches(&self) -> bool {
        self.collection_fetches
    }

    fn list(&self, _session: &dyn Session, params: &QueryParameters) -> Result<Vec<ResultRow>> {
        self.log.lists.fetch_add(1, Ordering::SeqCst);
        self.log
            .selections
            .lock()
            .push(params.row_selection().copied());
        if self.fail_list {
            return Err(Error::Execution(format!("cannot list {}", self.query)));
        }
        Ok(self.rows.clone())
    }

    fn iterate<'s>(
        &'s self,
        _session: &'s dyn Session,
        _params: &QueryParameters,
    ) -> Result<RowIterator<'s>> {
        Ok(Box::new(self.rows.iter().cloned().map(Ok)))
    }

    fn scroll(
        &self,
        _session: &dyn Session,
        _params: &QueryParameters,
    ) -> Result<Box<dyn ScrollableResults>> {
        Ok(Box::new(VecScrollableResults::new(self.rows.clone())))
    }

    fn execute_update(&self, _session: &dyn Session, _params: &QueryParameters) -> Result<u64> {
        Ok(self.affected)
    }
}

type BuildFn = dyn Fn(&str) -> StubTranslator + Send + Sync;

/// Builds a stub per concrete query; query spaces are taken from the
/// entities named in the query.
pub(crate) struct StubFactory {
    build: Box<BuildFn>,
}

impl StubFactory {
    pub fn new(build: impl Fn(&str) -> StubTranslator + Send + Sync + 'static) -> Self {
        Self {
            build: Box::new(build),
        }
    }

    fn create(
        &self,
        query_identifier: &str,
        query_string: &str,
        catalog: &EntityCatalog,
    ) -> Result<Box<dyn QueryTranslator>> {
        let mut translator = (self.build)(query_string);
        translator.identifier = query_identifier.to_string();
        translator.query = query_string.to_string();
        translator.spaces = catalog
            .types()
            .filter(|t| t.is_entity())
            .filter(|t| query_string.split_whitespace().any(|w| w == t.name))
            .flat_map(|t| catalog.query_spaces(&t.name).iter().cloned())
            .collect();
        let recognized = recognize_parameters(query_string).map_err(QueryError::from)?;
        translator.parameters = ParameterTranslations::from_recognized(&recognized);
        Ok(Box::new(translator))
    }
}

impl QueryTranslatorFactory for StubFactory {
    fn create_query_translator(
        &self,
        query_identifier: &str,
        query_string: &str,
        _enabled_filters: &[EnabledFilter],
        catalog: &EntityCatalog,
    ) -> Result<Box<dyn QueryTranslator>> {
        self.create(query_identifier, query_string, catalog)
    }

    fn create_filter_translator(
        &self,
        query_identifier: &str,
        query_string: &str,
        _enabled_filters: &[EnabledFilter],
        catalog: &EntityCatalog,
    ) -> Result<Box<dyn QueryTranslator>> {
        self.create(query_identifier, query_string, catalog)
    }
}

/// `zoo.Named` is implemented by `zoo.Animal` (with subclasses `zoo.Dog`
/// and `zoo.Cat`) and by `zoo.Person`; nothing implements `zoo.Unmapped`.
pub(crate) fn zoo_catalog() -> EntityCatalog {
    EntityCatalog::builder()
        .with_type(TypeDef::interface("zoo.Named"))
        .and_then(|b| b.with_type(TypeDef::interface("zoo.Unmapped")))
        .and_then(|b| b.with_type(TypeDef::entity("zoo.Animal", "animal").extends("zoo.Named")))
        .and_then(|b| b.with_type(TypeDef::entity("zoo.Dog", "animal").inherits("zoo.Animal")))
        .and_then(|b| b.with_type(TypeDef::entity("zoo.Cat", "animal").inherits("zoo.Animal")))
        .and_then(|b| b.with_type(TypeDef::entity("zoo.Person", "person").extends("zoo.Named")))
        .unwrap()
        .build()
}

pub(crate) fn zoo_context(factory: StubFactory) -> PlanContext {
    PlanContext::new(Arc::new(zoo_catalog()), Arc::new(factory))
}
