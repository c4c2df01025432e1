//! Parameter values and session filters bound for one execution.

use std::collections::BTreeMap;

use tracing::trace;

use super::selection::RowSelection;
use crate::value::{Value, ValueType};

/// A bound parameter value with an optional explicit type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedValue {
    pub value: Value,
    pub value_type: Option<ValueType>,
}

impl TypedValue {
    /// Bind a value, typed from the value itself.
    pub fn new(value: impl Into<Value>) -> Self {
        let value = value.into();
        let value_type = value.value_type();
        Self { value, value_type }
    }
}

/// Everything bound to one execution of a query plan.
#[derive(Debug, Clone, Default)]
pub struct QueryParameters {
    positional: BTreeMap<u32, TypedValue>,
    named: BTreeMap<String, TypedValue>,
    row_selection: Option<RowSelection>,
    read_only: bool,
}

impl QueryParameters {
    /// Create empty parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind an ordinal parameter by its 1-based label.
    pub fn with_positional(mut self, label: u32, value: impl Into<Value>) -> Self {
        self.positional.insert(label, TypedValue::new(value));
        self
    }

    /// Bind a named parameter.
    pub fn with_named(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.named.insert(name.into(), TypedValue::new(value));
        self
    }

    /// Set the row selection.
    pub fn with_row_selection(mut self, selection: RowSelection) -> Self {
        self.row_selection = Some(selection);
        self
    }

    /// Mark loaded entities read-only.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Ordinal parameter values.
    pub fn positional(&self) -> &BTreeMap<u32, TypedValue> {
        &self.positional
    }

    /// Named parameter values.
    pub fn named(&self) -> &BTreeMap<String, TypedValue> {
        &self.named
    }

    /// The row selection, if any.
    pub fn row_selection(&self) -> Option<&RowSelection> {
        self.row_selection.as_ref()
    }

    /// Check if loaded entities should be read-only.
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// A copy of these parameters using a different row selection.
    pub fn create_copy_using(&self, selection: RowSelection) -> Self {
        Self {
            positional: self.positional.clone(),
            named: self.named.clone(),
            row_selection: Some(selection),
            read_only: self.read_only,
        }
    }

    /// Log every bound value at trace level.
    pub fn trace_parameters(&self) {
        for (label, bound) in &self.positional {
            trace!(label, value = %bound.value, "ordinal parameter");
        }
        for (name, bound) in &self.named {
            trace!(name = %name, value = %bound.value, "named parameter");
        }
    }
}

/// A session filter enabled for a query.
///
/// Query plans only record the filter names; parameter values are bound at
/// execution time by the translator.
#[derive(Debug, Clone, PartialEq)]
pub struct EnabledFilter {
    pub name: String,
    pub parameters: BTreeMap<String, Value>,
}

impl EnabledFilter {
    /// Enable a filter without parameters.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: BTreeMap::new(),
        }
    }

    /// Set a filter parameter.
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }
}
