//! Parameter and return metadata exposed by a query plan.

use std::collections::BTreeMap;

use super::translator::ParameterTranslations;
use crate::error::{QueryError, Result};
use crate::value::ValueType;

/// Descriptor of an ordinal (`?N`) parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrdinalParameterDescriptor {
    label: u32,
    position: usize,
    expected_type: Option<ValueType>,
    source_locations: Vec<usize>,
}

impl OrdinalParameterDescriptor {
    /// The 1-based label as written in the query.
    pub fn label(&self) -> u32 {
        self.label
    }

    /// Zero-based binding position.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Expected type, if the translator inferred one.
    pub fn expected_type(&self) -> Option<&ValueType> {
        self.expected_type.as_ref()
    }

    /// Byte offsets of every occurrence.
    pub fn source_locations(&self) -> &[usize] {
        &self.source_locations
    }
}

/// Descriptor of a named (`:name`) parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedParameterDescriptor {
    name: String,
    expected_type: Option<ValueType>,
    source_locations: Vec<usize>,
}

impl NamedParameterDescriptor {
    /// Parameter name, without the leading `:`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Expected type, if the translator inferred one.
    pub fn expected_type(&self) -> Option<&ValueType> {
        self.expected_type.as_ref()
    }

    /// Byte offsets of every occurrence.
    pub fn source_locations(&self) -> &[usize] {
        &self.source_locations
    }
}

/// Immutable parameter metadata of a query plan.
///
/// Both maps are always present; a query without parameters of one kind has
/// an empty map for it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterMetadata {
    ordinal: BTreeMap<u32, OrdinalParameterDescriptor>,
    named: BTreeMap<String, NamedParameterDescriptor>,
}

impl ParameterMetadata {
    /// Metadata with no parameters.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build metadata from a translator's parameter translations.
    ///
    /// All translators of a plan are compiled from the same source query, so
    /// the first translator's view is representative.
    pub fn from_translations(translations: &ParameterTranslations) -> Self {
        let ordinal = translations
            .positional()
            .iter()
            .map(|(&label, info)| {
                (
                    label,
                    OrdinalParameterDescriptor {
                        label,
                        position: label.saturating_sub(1) as usize,
                        expected_type: info.expected_type.clone(),
                        source_locations: info.source_locations.clone(),
                    },
                )
            })
            .collect();

        let named = translations
            .named()
            .iter()
            .map(|(name, info)| {
                (
                    name.clone(),
                    NamedParameterDescriptor {
                        name: name.clone(),
                        expected_type: info.expected_type.clone(),
                        source_locations: info.source_locations.clone(),
                    },
                )
            })
            .collect();

        Self { ordinal, named }
    }

    /// Ordinal descriptors by label.
    pub fn ordinal_descriptors(&self) -> &BTreeMap<u32, OrdinalParameterDescriptor> {
        &self.ordinal
    }

    /// Named descriptors by name.
    pub fn named_descriptors(&self) -> &BTreeMap<String, NamedParameterDescriptor> {
        &self.named
    }

    /// Number of distinct ordinal parameters.
    pub fn ordinal_parameter_count(&self) -> usize {
        self.ordinal.len()
    }

    /// Names of all named parameters, sorted.
    pub fn named_parameter_names(&self) -> impl Iterator<Item = &str> {
        self.named.keys().map(String::as_str)
    }

    /// Check if the query has named parameters.
    pub fn has_named_parameters(&self) -> bool {
        !self.named.is_empty()
    }

    /// Check if the query has ordinal parameters.
    pub fn has_ordinal_parameters(&self) -> bool {
        !self.ordinal.is_empty()
    }

    /// Look up an ordinal parameter.
    pub fn ordinal_descriptor(&self, label: u32) -> Result<&OrdinalParameterDescriptor> {
        self.ordinal
            .get(&label)
            .ok_or_else(|| QueryError::OrdinalParameterNotFound(label).into())
    }

    /// Look up a named parameter.
    pub fn named_descriptor(&self, name: &str) -> Result<&NamedParameterDescriptor> {
        self.named
            .get(name)
            .ok_or_else(|| QueryError::NamedParameterNotFound(name.to_string()).into())
    }

    /// Expected type of an ordinal parameter.
    pub fn ordinal_expected_type(&self, label: u32) -> Result<Option<&ValueType>> {
        Ok(self.ordinal_descriptor(label)?.expected_type())
    }

    /// Expected type of a named parameter.
    pub fn named_expected_type(&self, name: &str) -> Result<Option<&ValueType>> {
        Ok(self.named_descriptor(name)?.expected_type())
    }

    /// Source locations of a named parameter.
    pub fn named_source_locations(&self, name: &str) -> Result<&[usize]> {
        Ok(self.named_descriptor(name)?.source_locations())
    }
}

/// Aliases and types of a select query's results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnMetadata {
    aliases: Option<Vec<String>>,
    types: Vec<Option<ValueType>>,
}

impl ReturnMetadata {
    /// Create return metadata.
    pub fn new(aliases: Option<Vec<String>>, types: Vec<Option<ValueType>>) -> Self {
        Self { aliases, types }
    }

    /// Select clause aliases, if declared.
    pub fn aliases(&self) -> Option<&[String]> {
        self.aliases.as_deref()
    }

    /// Return types; `None` where the type differs between split queries.
    pub fn types(&self) -> &[Option<ValueType>] {
        &self.types
    }
}
