//! storage collaborator consumed by scans and mutation operators
//!
//! the executor only relies on [`TableStore`]: a mutable collection of
//! tuples addressed by a transaction token. [`MemTable`] is the in-memory
//! implementation used by the demo, the benchmarks and the tests.

mod csv_loader;
mod memory;

pub use csv_loader::{infer_descriptor, load_csv, parse_field};
pub use memory::MemTable;

use crate::error::StorageError;
use crate::tuple::{Tuple, TupleDesc};
use std::fmt;

/// opaque transaction token threaded through an operator tree
///
/// operators never interpret it; they only forward it to storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(u64);

impl TransactionId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// location of a tuple inside a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// a durable mutable collection of tuples
pub trait TableStore: Send + Sync {
    /// shape of every tuple stored in the table
    fn descriptor(&self) -> TupleDesc;

    /// add one tuple
    fn insert_tuple(&self, tuple: &Tuple, tid: TransactionId) -> Result<(), StorageError>;

    /// remove one tuple, identified by its record id when it carries one
    fn delete_tuple(&self, tuple: &Tuple, tid: TransactionId) -> Result<(), StorageError>;

    /// snapshot of the live tuples, each tagged with its record id
    fn scan(&self, tid: TransactionId) -> Result<Vec<Tuple>, StorageError>;
}
