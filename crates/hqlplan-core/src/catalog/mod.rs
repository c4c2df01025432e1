//! Entity catalog.
//!
//! The catalog records the type hierarchy of mapped entities (and the
//! unmapped interfaces and superclasses they implement) so that queries
//! against a supertype can be expanded into one query per concrete
//! implementor.

mod catalog;
mod types;

pub use catalog::{CatalogBuilder, CatalogDocument, EntityCatalog};
pub use types::{EntityMapping, TypeDef};
