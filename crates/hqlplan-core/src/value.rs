//! Runtime values, value types and result rows.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A runtime value bound as a parameter or returned in a result row.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// 32-bit signed integer.
    Int32(i32),
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit floating point.
    Float64(f64),
    /// UTF-8 string.
    String(String),
    /// Binary data.
    Bytes(Vec<u8>),
    /// Timestamp as microseconds since Unix epoch.
    Timestamp(i64),
    /// Reference to a managed entity instance.
    Entity(Arc<EntityInstance>),
}

impl Value {
    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The type of this value, if it has one.
    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(ValueType::Bool),
            Value::Int32(_) => Some(ValueType::Int32),
            Value::Int64(_) => Some(ValueType::Int64),
            Value::Float64(_) => Some(ValueType::Float64),
            Value::String(_) => Some(ValueType::String),
            Value::Bytes(_) => Some(ValueType::Bytes),
            Value::Timestamp(_) => Some(ValueType::Timestamp),
            Value::Entity(e) => Some(ValueType::Entity(e.entity_name.clone())),
        }
    }

    /// Try to get as i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(i) => Some(*i),
            Value::Int32(i) => Some(*i as i64),
            _ => None,
        }
    }

    /// Try to get as string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int32(i) => write!(f, "{}", i),
            Value::Int64(i) => write!(f, "{}", i),
            Value::Float64(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "'{}'", s),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Value::Timestamp(t) => write!(f, "@{}", t),
            Value::Entity(e) => write!(f, "{}#{}", e.entity_name, e.id),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

/// Type descriptor for parameters and query returns.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueType {
    Bool,
    Int32,
    Int64,
    Float64,
    String,
    Bytes,
    Timestamp,
    /// A managed entity of the named type.
    Entity(String),
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Bool => write!(f, "bool"),
            ValueType::Int32 => write!(f, "int32"),
            ValueType::Int64 => write!(f, "int64"),
            ValueType::Float64 => write!(f, "float64"),
            ValueType::String => write!(f, "string"),
            ValueType::Bytes => write!(f, "bytes"),
            ValueType::Timestamp => write!(f, "timestamp"),
            ValueType::Entity(name) => write!(f, "entity({})", name),
        }
    }
}

/// An entity instance as loaded into a session.
///
/// Instances are shared as `Arc<EntityInstance>` from the session's identity
/// map, so two result rows referring to the same persistent object point at
/// the same allocation.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityInstance {
    /// Entity name.
    pub entity_name: String,
    /// Identifier value.
    pub id: Value,
    /// Loaded field values.
    pub fields: BTreeMap<String, Value>,
}

impl EntityInstance {
    /// Create an instance with no loaded fields.
    pub fn new(entity_name: impl Into<String>, id: impl Into<Value>) -> Self {
        Self {
            entity_name: entity_name.into(),
            id: id.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Set a field value.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }
}

/// Identity of a result row: the address of its shared allocation.
///
/// Only meaningful while the rows are alive and were produced within one
/// session, whose identity map guarantees one allocation per persistent
/// object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowIdentity(usize);

/// One row of a query result.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultRow {
    /// A single managed entity.
    Entity(Arc<EntityInstance>),
    /// A projection of several values.
    Tuple(Arc<[Value]>),
    /// A single scalar value.
    Scalar(Value),
}

impl ResultRow {
    /// The identity of this row, if it has one.
    ///
    /// Scalars are plain values and never share identity.
    pub fn identity(&self) -> Option<RowIdentity> {
        match self {
            ResultRow::Entity(e) => Some(RowIdentity(Arc::as_ptr(e) as *const () as usize)),
            ResultRow::Tuple(t) => Some(RowIdentity(Arc::as_ptr(t) as *const () as usize)),
            ResultRow::Scalar(_) => None,
        }
    }

    /// The entity, if this row is an entity.
    pub fn as_entity(&self) -> Option<&EntityInstance> {
        match self {
            ResultRow::Entity(e) => Some(e),
            _ => None,
        }
    }
}

impl From<Arc<EntityInstance>> for ResultRow {
    fn from(entity: Arc<EntityInstance>) -> Self {
        ResultRow::Entity(entity)
    }
}

impl From<Value> for ResultRow {
    fn from(value: Value) -> Self {
        ResultRow::Scalar(value)
    }
}
