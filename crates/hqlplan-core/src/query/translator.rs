//! Translator and translator factory traits.
//!
//! A translator owns one concrete query: it compiles it to SQL once, during
//! plan construction, and then executes it against a session any number of
//! times.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use hqlplan_lang::RecognizedParameters;

use super::parameters::{EnabledFilter, QueryParameters};
use super::scroll::ScrollableResults;
use super::session::Session;
use crate::catalog::EntityCatalog;
use crate::config::QuerySubstitutions;
use crate::error::{Error, Result};
use crate::value::{ResultRow, ValueType};

/// Iterator over lazily fetched result rows.
pub type RowIterator<'a> = Box<dyn Iterator<Item = Result<ResultRow>> + 'a>;

/// What a translator learned about one parameter while compiling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterInfo {
    /// Type inferred from the parameter's usage, if any.
    pub expected_type: Option<ValueType>,
    /// Byte offsets of every occurrence in the query text.
    pub source_locations: Vec<usize>,
}

/// Parameters of a compiled query, as reported by its translator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterTranslations {
    positional: BTreeMap<u32, ParameterInfo>,
    named: BTreeMap<String, ParameterInfo>,
}

impl ParameterTranslations {
    /// Create translations with no parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Untyped translations for the parameters found in the query text.
    pub fn from_recognized(recognized: &RecognizedParameters) -> Self {
        let positional = recognized
            .ordinal()
            .iter()
            .map(|(&label, locations)| {
                (
                    label,
                    ParameterInfo {
                        expected_type: None,
                        source_locations: locations.clone(),
                    },
                )
            })
            .collect();
        let named = recognized
            .named()
            .iter()
            .map(|(name, locations)| {
                (
                    name.clone(),
                    ParameterInfo {
                        expected_type: None,
                        source_locations: locations.clone(),
                    },
                )
            })
            .collect();
        Self { positional, named }
    }

    /// Record the expected type of a named parameter. Names that do not
    /// occur in the query are ignored.
    pub fn with_named_type(mut self, name: &str, expected_type: ValueType) -> Self {
        if let Some(info) = self.named.get_mut(name) {
            info.expected_type = Some(expected_type);
        }
        self
    }

    /// Record the expected type of an ordinal parameter. Labels that do not
    /// occur in the query are ignored.
    pub fn with_positional_type(mut self, label: u32, expected_type: ValueType) -> Self {
        if let Some(info) = self.positional.get_mut(&label) {
            info.expected_type = Some(expected_type);
        }
        self
    }

    /// Ordinal parameters by 1-based label.
    pub fn positional(&self) -> &BTreeMap<u32, ParameterInfo> {
        &self.positional
    }

    /// Named parameters.
    pub fn named(&self) -> &BTreeMap<String, ParameterInfo> {
        &self.named
    }
}

/// Compiles one concrete query and executes it.
pub trait QueryTranslator: Send + Sync + fmt::Debug {
    /// Compile the query to SQL.
    fn compile(&mut self, substitutions: &QuerySubstitutions, shallow: bool) -> Result<()>;

    /// Compile the query as a filter over the elements of a collection.
    fn compile_filter(
        &mut self,
        collection_role: &str,
        substitutions: &QuerySubstitutions,
        shallow: bool,
    ) -> Result<()> {
        let _ = (substitutions, shallow);
        Err(Error::Translation(format!(
            "translator for [{}] cannot compile a filter for collection {}",
            self.query_string(),
            collection_role
        )))
    }

    /// The source query this translator was split from.
    fn query_identifier(&self) -> &str;

    /// The concrete query this translator compiles.
    fn query_string(&self) -> &str;

    /// Generated SQL statements.
    fn sql_strings(&self) -> Vec<String>;

    /// Tables touched by the compiled query.
    fn query_spaces(&self) -> &BTreeSet<String>;

    /// Parameters of the compiled query.
    fn parameter_translations(&self) -> &ParameterTranslations;

    /// Aliases of the select clause, when it declares any.
    fn return_aliases(&self) -> Option<&[String]>;

    /// Types of the select clause items.
    fn return_types(&self) -> &[ValueType];

    /// Check if this is an insert, update or delete statement.
    fn is_manipulation_statement(&self) -> bool;

    /// Check if this is an update statement.
    fn is_update_statement(&self) -> bool {
        false
    }

    /// Check if the query fetch-joins collections.
    fn contains_collection_fetches(&self) -> bool {
        false
    }

    /// Holder type of a `select new ...` clause.
    fn dynamic_instantiation_result_type(&self) -> Option<&str> {
        None
    }

    /// Execute and return all rows.
    fn list(&self, session: &dyn Session, params: &QueryParameters) -> Result<Vec<ResultRow>>;

    /// Execute and return rows lazily.
    fn iterate<'s>(
        &'s self,
        session: &'s dyn Session,
        params: &QueryParameters,
    ) -> Result<RowIterator<'s>>;

    /// Execute and return a scrollable cursor.
    fn scroll(
        &self,
        session: &dyn Session,
        params: &QueryParameters,
    ) -> Result<Box<dyn ScrollableResults>>;

    /// Execute a manipulation statement and return the affected row count.
    fn execute_update(&self, session: &dyn Session, params: &QueryParameters) -> Result<u64>;
}

/// Creates translators for the concrete queries of a plan.
pub trait QueryTranslatorFactory: Send + Sync {
    /// Create a translator for a concrete query.
    fn create_query_translator(
        &self,
        query_identifier: &str,
        query_string: &str,
        enabled_filters: &[EnabledFilter],
        catalog: &EntityCatalog,
    ) -> Result<Box<dyn QueryTranslator>>;

    /// Create a translator for a collection filter query.
    fn create_filter_translator(
        &self,
        query_identifier: &str,
        query_string: &str,
        enabled_filters: &[EnabledFilter],
        catalog: &EntityCatalog,
    ) -> Result<Box<dyn QueryTranslator>>;
}
