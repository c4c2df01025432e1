//! Core error types.

use hqlplan_lang::LexError;
use thiserror::Error;

/// Errors raised while planning or executing a query.
#[derive(Debug, Error)]
pub enum Error {
    /// The query text is malformed or used incorrectly.
    #[error("query error: {0}")]
    Query(#[from] QueryError),

    /// The entity catalog rejected a definition or lookup.
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// A translator failed to compile its concrete query.
    #[error("translation error: {0}")]
    Translation(String),

    /// A translator failed while executing against the session.
    #[error("execution error: {0}")]
    Execution(String),
}

/// Query-level errors.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The query text could not be tokenized.
    #[error(transparent)]
    Lex(#[from] LexError),

    /// Scrolling requires a single concrete query.
    #[error("implicit polymorphism not supported for scroll() queries")]
    PolymorphicScroll,

    /// Limits cannot be applied to a scrolled query that fetches collections.
    #[error("first_row/max_rows not supported in conjunction with scroll() of a query containing collection fetches")]
    ScrollWithCollectionFetchLimits,

    /// Named parameter lookup failed.
    #[error("could not locate named parameter [{0}]")]
    NamedParameterNotFound(String),

    /// Ordinal parameter lookup failed.
    #[error("could not locate ordinal parameter [{0}]")]
    OrdinalParameterNotFound(u32),

    /// Operation on a closed scrollable result set.
    #[error("scrollable results are closed")]
    ResultsClosed,
}

/// Entity catalog errors.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A type with this name is already registered.
    #[error("duplicate type definition: {0}")]
    DuplicateType(String),

    /// A supertype was referenced before being registered.
    #[error("type {type_name} references unknown supertype {supertype}")]
    UnknownSupertype { type_name: String, supertype: String },

    /// The mapped superclass of an entity is not a registered entity it extends.
    #[error("entity {entity} declares invalid mapped superclass {superclass}")]
    InvalidMappedSuperclass { entity: String, superclass: String },

    /// An explicit import alias is claimed by two entities.
    #[error("import alias {alias} is already used by {existing}")]
    DuplicateImport { alias: String, existing: String },

    /// An import name resolves to more than one entity.
    #[error("import name {name} is ambiguous: {candidates:?}")]
    AmbiguousImport {
        name: String,
        candidates: Vec<String>,
    },

    /// A catalog document could not be parsed.
    #[error("invalid catalog document: {0}")]
    Document(#[from] serde_json::Error),
}

/// Result alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
