//! typed tuple model shared by every operator
//!
//! a [`Tuple`] is an ordered list of [`Value`]s that conforms to exactly one
//! [`TupleDesc`]. descriptors are carried by operators, not by tuples.

use crate::error::{ExecError, ExecResult};
use crate::storage::RecordId;
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Integer,
    Varchar,
    Boolean,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Integer => write!(f, "INTEGER"),
            ColumnType::Varchar => write!(f, "VARCHAR"),
            ColumnType::Boolean => write!(f, "BOOLEAN"),
        }
    }
}

/// represents a single value in the database
///
/// `Null` belongs to every column type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Integer(i64),
    Varchar(String),
    Boolean(bool),
    Null,
}

impl Value {
    /// the column type of this value, `None` for NULL
    pub fn column_type(&self) -> Option<ColumnType> {
        match self {
            Value::Integer(_) => Some(ColumnType::Integer),
            Value::Varchar(_) => Some(ColumnType::Varchar),
            Value::Boolean(_) => Some(ColumnType::Boolean),
            Value::Null => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// whether this value may be stored in a column of type `column_type`
    pub fn conforms_to(&self, column_type: ColumnType) -> bool {
        self.column_type().is_none_or(|t| t == column_type)
    }

    pub fn as_integer(&self) -> ExecResult<i64> {
        match self {
            Value::Integer(i) => Ok(*i),
            other => Err(ExecError::type_mismatch("INTEGER", other.type_name())),
        }
    }

    /// compare two values of the same type
    ///
    /// returns `Ok(None)` when either side is NULL and a type mismatch error
    /// when the two sides hold different types.
    pub fn compare(&self, other: &Value) -> ExecResult<Option<Ordering>> {
        match (self, other) {
            (Value::Null, _) | (_, Value::Null) => Ok(None),
            (Value::Integer(l), Value::Integer(r)) => Ok(Some(l.cmp(r))),
            (Value::Varchar(l), Value::Varchar(r)) => Ok(Some(l.cmp(r))),
            (Value::Boolean(l), Value::Boolean(r)) => Ok(Some(l.cmp(r))),
            (l, r) => Err(ExecError::type_mismatch(l.type_name(), r.type_name())),
        }
    }

    /// total order used for sorting: NULL first, then natural order per type
    ///
    /// callers validate that both sides share a column type; mixed types fall
    /// back to ordering by type so the sort stays total.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Less,
            (_, Value::Null) => Ordering::Greater,
            (Value::Integer(l), Value::Integer(r)) => l.cmp(r),
            (Value::Varchar(l), Value::Varchar(r)) => l.cmp(r),
            (Value::Boolean(l), Value::Boolean(r)) => l.cmp(r),
            (l, r) => l.type_rank().cmp(&r.type_rank()),
        }
    }

    fn type_rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Boolean(_) => 1,
            Value::Integer(_) => 2,
            Value::Varchar(_) => 3,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "INTEGER",
            Value::Varchar(_) => "VARCHAR",
            Value::Boolean(_) => "BOOLEAN",
            Value::Null => "NULL",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{}", i),
            Value::Varchar(s) => write!(f, "{}", s),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Null => write!(f, "NULL"),
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Varchar(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Varchar(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

/// name and type of one field in a descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldType {
    pub name: String,
    pub type_: ColumnType,
}

impl FieldType {
    pub fn new(name: impl Into<String>, type_: ColumnType) -> Self {
        Self {
            name: name.into(),
            type_,
        }
    }
}

/// ordered list of fields describing the shape of a tuple
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TupleDesc {
    pub fields: Vec<FieldType>,
}

impl TupleDesc {
    pub fn new(fields: Vec<FieldType>) -> Self {
        Self { fields }
    }

    /// concatenate two descriptors, `self`'s fields first
    pub fn merge(&self, other: &TupleDesc) -> TupleDesc {
        let mut fields = Vec::with_capacity(self.fields.len() + other.fields.len());
        fields.extend(self.fields.iter().cloned());
        fields.extend(other.fields.iter().cloned());
        TupleDesc { fields }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// index of the first field called `name`
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn field(&self, name: &str) -> ExecResult<(usize, &FieldType)> {
        self.index_of(name)
            .map(|i| (i, &self.fields[i]))
            .ok_or_else(|| ExecError::ColumnNotFound(name.to_string()))
    }

    /// check that `values` has this descriptor's arity and field types
    pub fn validate(&self, values: &[Value]) -> Result<(), String> {
        if values.len() != self.fields.len() {
            return Err(format!(
                "expected {} fields, found {}",
                self.fields.len(),
                values.len()
            ));
        }
        for (field, value) in self.fields.iter().zip(values) {
            if !value.conforms_to(field.type_) {
                return Err(format!(
                    "field \"{}\" expects {}, found {}",
                    field.name,
                    field.type_,
                    value.type_name()
                ));
            }
        }
        Ok(())
    }
}

/// one row of values, plus the storage id of the row it was read from
#[derive(Debug, Clone, PartialEq)]
pub struct Tuple {
    pub values: Vec<Value>,
    pub rid: Option<RecordId>,
}

impl Tuple {
    /// a computed tuple without a storage location
    pub fn new(values: Vec<Value>) -> Self {
        Self { values, rid: None }
    }

    pub fn with_rid(values: Vec<Value>, rid: RecordId) -> Self {
        Self {
            values,
            rid: Some(rid),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn get(&self, index: usize) -> ExecResult<&Value> {
        self.values
            .get(index)
            .ok_or(ExecError::ColumnIndexOutOfBounds {
                index,
                len: self.values.len(),
            })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// concatenate two tuples, `self`'s values first
    pub fn join(&self, other: &Tuple) -> Tuple {
        let mut values = Vec::with_capacity(self.values.len() + other.values.len());
        values.extend(self.values.iter().cloned());
        values.extend(other.values.iter().cloned());
        Tuple::new(values)
    }

    /// the value-equality key of this tuple (ignores the record id)
    pub fn key(&self) -> GroupKey {
        GroupKey(self.values.clone())
    }
}

/// composite key compared and hashed by value
///
/// used for group-by buckets and distinct projection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey(pub Vec<Value>);
