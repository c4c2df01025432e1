//! Plan explanation.
//!
//! Plans are built with a translator that only describes its concrete query:
//! it reports the tables and parameters the query references and the
//! substituted query text in place of SQL, and refuses to execute.

use std::collections::BTreeSet;

use hqlplan_lang::{recognize_parameters, tokenize, SpannedToken, Token};
use hqlplan_core::query::{
    ParameterTranslations, QueryTranslator, QueryTranslatorFactory, RowIterator,
    ScrollableResults,
};
use hqlplan_core::{
    EnabledFilter, EntityCatalog, Error, QueryError, QueryParameters, QueryPlan,
    QuerySubstitutions, ResultRow, Result, Session, ValueType,
};
use serde::Serialize;

/// Tokens after which an entity name may appear.
const ENTITY_POSITIONS: &[&str] = &["from", "join", "update", "into", ","];

#[derive(Debug)]
struct DescribingTranslator {
    identifier: String,
    query: String,
    sql: Option<String>,
    spaces: BTreeSet<String>,
    parameters: ParameterTranslations,
    aliases: Option<Vec<String>>,
    manipulation: bool,
    update: bool,
    collection_fetches: bool,
}

impl DescribingTranslator {
    fn new(identifier: &str, query: &str, catalog: &EntityCatalog) -> Result<Self> {
        let tokens = tokenize(query).map_err(QueryError::from)?;
        let significant: Vec<&SpannedToken> =
            tokens.iter().filter(|t| !t.token.is_whitespace()).collect();

        let spaces = significant
            .windows(2)
            .filter(|w| {
                ENTITY_POSITIONS
                    .iter()
                    .any(|k| w[0].text(query).eq_ignore_ascii_case(k))
            })
            .map(|w| w[1].text(query))
            .filter(|name| catalog.is_entity(name))
            .flat_map(|name| catalog.query_spaces(name).iter().cloned())
            .collect();

        let first = significant.first().map(|t| &t.token);
        let update = first.is_some_and(|t| t.is_keyword("update"));
        let manipulation = update
            || first.is_some_and(|t| t.is_keyword("delete") || t.is_keyword("insert"));
        let collection_fetches = significant
            .windows(2)
            .any(|w| w[0].token.is_keyword("join") && w[1].token.is_keyword("fetch"));

        let recognized = recognize_parameters(query).map_err(QueryError::from)?;

        Ok(Self {
            identifier: identifier.to_string(),
            query: query.to_string(),
            sql: None,
            spaces,
            parameters: ParameterTranslations::from_recognized(&recognized),
            aliases: (!manipulation).then(|| select_aliases(query, &significant)),
            manipulation,
            update,
            collection_fetches,
        })
    }

    fn unsupported(&self) -> Error {
        Error::Execution(format!(
            "query '{}' was built for explanation and cannot be executed",
            self.query
        ))
    }
}

/// Aliases of the select clause items: the name after `as`, or the item's
/// position. A query without a select clause returns its root entity.
fn select_aliases(query: &str, tokens: &[&SpannedToken]) -> Vec<String> {
    if !tokens.first().is_some_and(|t| t.token.is_keyword("select")) {
        return vec!["0".to_string()];
    }

    let mut aliases = Vec::new();
    let mut depth = 0usize;
    let mut current: Option<String> = None;
    let mut after_as = false;

    for token in &tokens[1..] {
        match &token.token {
            Token::LParen => depth += 1,
            Token::RParen => depth = depth.saturating_sub(1),
            Token::Comma if depth == 0 => {
                aliases.push(current.take().unwrap_or_else(|| aliases.len().to_string()));
                after_as = false;
                continue;
            }
            t if depth == 0 && t.is_keyword("from") => break,
            t if depth == 0 && t.is_keyword("as") => {
                after_as = true;
                continue;
            }
            _ => {}
        }
        if after_as {
            current = Some(token.text(query).to_string());
            after_as = false;
        }
    }
    aliases.push(current.unwrap_or_else(|| aliases.len().to_string()));
    aliases
}

impl QueryTranslator for DescribingTranslator {
    fn compile(&mut self, substitutions: &QuerySubstitutions, _shallow: bool) -> Result<()> {
        self.sql = Some(substitutions.apply(&self.query).map_err(QueryError::from)?);
        Ok(())
    }

    fn compile_filter(
        &mut self,
        _collection_role: &str,
        substitutions: &QuerySubstitutions,
        shallow: bool,
    ) -> Result<()> {
        self.compile(substitutions, shallow)
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
        &[]
    }

    fn is_manipulation_statement(&self) -> bool {
        self.manipulation
    }

    fn is_update_statement(&self) -> bool {
        self.update
    }

    fn contains_collection_fetches(&self) -> bool {
        self.collection_fetches
    }

    fn list(&self, _session: &dyn Session, _params: &QueryParameters) -> Result<Vec<ResultRow>> {
        Err(self.unsupported())
    }

    fn iterate<'s>(
        &'s self,
        _session: &'s dyn Session,
        _params: &QueryParameters,
    ) -> Result<RowIterator<'s>> {
        Err(self.unsupported())
    }

    fn scroll(
        &self,
        _session: &dyn Session,
        _params: &QueryParameters,
    ) -> Result<Box<dyn ScrollableResults>> {
        Err(self.unsupported())
    }

    fn execute_update(&self, _session: &dyn Session, _params: &QueryParameters) -> Result<u64> {
        Err(self.unsupported())
    }
}

/// Factory for [`DescribingTranslator`]s.
#[derive(Debug, Default)]
pub struct DescribingFactory;

impl QueryTranslatorFactory for DescribingFactory {
    fn create_query_translator(
        &self,
        query_identifier: &str,
        query_string: &str,
        _enabled_filters: &[EnabledFilter],
        catalog: &EntityCatalog,
    ) -> Result<Box<dyn QueryTranslator>> {
        Ok(Box::new(DescribingTranslator::new(
            query_identifier,
            query_string,
            catalog,
        )?))
    }

    fn create_filter_translator(
        &self,
        query_identifier: &str,
        query_string: &str,
        enabled_filters: &[EnabledFilter],
        catalog: &EntityCatalog,
    ) -> Result<Box<dyn QueryTranslator>> {
        self.create_query_translator(query_identifier, query_string, enabled_filters, catalog)
    }
}

/// One parameter of an explained plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterEntry {
    pub name: String,
    pub expected_type: Option<String>,
    pub locations: Vec<usize>,
}

/// Serializable summary of a query plan.
#[derive(Debug, Clone, Serialize)]
pub struct Explanation {
    pub query: String,
    pub collection_role: Option<String>,
    pub shallow: bool,
    pub kind: &'static str,
    pub concrete_queries: Vec<String>,
    pub sql: Vec<String>,
    pub query_spaces: Vec<String>,
    pub enabled_filters: Vec<String>,
    pub parameters: Vec<ParameterEntry>,
    pub return_aliases: Option<Vec<String>>,
}

impl Explanation {
    /// Summarize a built plan.
    pub fn from_plan(plan: &QueryPlan) -> Self {
        let metadata = plan.parameter_metadata();
        let ordinal = metadata
            .ordinal_descriptors()
            .values()
            .map(|d| ParameterEntry {
                name: format!("?{}", d.label()),
                expected_type: d.expected_type().map(ToString::to_string),
                locations: d.source_locations().to_vec(),
            });
        let named = metadata
            .named_descriptors()
            .values()
            .map(|d| ParameterEntry {
                name: format!(":{}", d.name()),
                expected_type: d.expected_type().map(ToString::to_string),
                locations: d.source_locations().to_vec(),
            });

        let kind = if plan.is_select() {
            "select"
        } else if plan.is_update() {
            "update"
        } else {
            "manipulation"
        };

        Self {
            query: plan.source_query().to_string(),
            collection_role: plan.collection_role().map(str::to_string),
            shallow: plan.is_shallow(),
            kind,
            concrete_queries: plan
                .translators()
                .iter()
                .map(|t| t.query_string().to_string())
                .collect(),
            sql: plan.sql_strings(),
            query_spaces: plan.query_spaces().iter().cloned().collect(),
            enabled_filters: plan.enabled_filter_names().iter().cloned().collect(),
            parameters: ordinal.chain(named).collect(),
            return_aliases: plan
                .return_metadata()
                .and_then(|r| r.aliases())
                .map(<[String]>::to_vec),
        }
    }
}
