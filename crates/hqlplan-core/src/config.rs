//! Query planning configuration.

use std::collections::BTreeMap;

use hqlplan_lang::{tokenize, LexError, Token};

/// Default maximum number of cached query plans.
pub const DEFAULT_PLAN_CACHE_MAX_SIZE: usize = 2048;

/// Characters separating entries of a substitution string.
const SUBSTITUTION_DELIMITERS: &[char] = &[' ', ',', '=', ';', ':', '\n', '\t', '\r', '\x0c'];

/// Token substitutions applied by translators while compiling a query,
/// e.g. `true` to `1` for databases without a boolean type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuerySubstitutions {
    entries: BTreeMap<String, String>,
}

impl QuerySubstitutions {
    /// Create an empty substitution set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a string such as `"true 1, false 0"` or `"yes=1;no=0"`.
    ///
    /// Entries are taken pairwise; a trailing key without a value maps to the
    /// empty string.
    pub fn parse(text: &str) -> Self {
        let mut entries = BTreeMap::new();
        let mut parts = text
            .split(SUBSTITUTION_DELIMITERS)
            .filter(|part| !part.is_empty());

        while let Some(key) = parts.next() {
            let value = parts.next().unwrap_or("");
            entries.insert(key.to_string(), value.to_string());
        }

        Self { entries }
    }

    /// Add a substitution.
    pub fn with(mut self, token: impl Into<String>, replacement: impl Into<String>) -> Self {
        self.entries.insert(token.into(), replacement.into());
        self
    }

    /// Look up the replacement for a token.
    pub fn get(&self, token: &str) -> Option<&str> {
        self.entries.get(token).map(String::as_str)
    }

    /// Iterate over `(token, replacement)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Check if there are no substitutions.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rewrite every word of `query` that has a substitution.
    ///
    /// String literals and parameters are left untouched.
    pub fn apply(&self, query: &str) -> Result<String, LexError> {
        if self.is_empty() {
            return Ok(query.to_string());
        }

        let mut result = String::with_capacity(query.len());
        for token in tokenize(query)? {
            match &token.token {
                Token::Word(word) => result.push_str(self.get(word).unwrap_or(word)),
                _ => result.push_str(token.text(query)),
            }
        }
        Ok(result)
    }
}

/// Configuration for query planning.
#[derive(Debug, Clone)]
pub struct PlanConfig {
    /// Maximum number of plans kept by the plan cache.
    pub plan_cache_max_size: usize,

    /// Substitutions handed to translators at compile time.
    pub query_substitutions: QuerySubstitutions,
}

impl PlanConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self {
            plan_cache_max_size: DEFAULT_PLAN_CACHE_MAX_SIZE,
            query_substitutions: QuerySubstitutions::new(),
        }
    }

    /// Set the plan cache size.
    pub fn with_plan_cache_max_size(mut self, size: usize) -> Self {
        self.plan_cache_max_size = size.max(1);
        self
    }

    /// Set the query substitutions.
    pub fn with_query_substitutions(mut self, substitutions: QuerySubstitutions) -> Self {
        self.query_substitutions = substitutions;
        self
    }
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self::new()
    }
}
