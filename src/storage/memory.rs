use super::{RecordId, TableStore, TransactionId};
use crate::error::StorageError;
use crate::tuple::{Tuple, TupleDesc, Value};
use parking_lot::RwLock;
use tracing::trace;

/// in-memory table
///
/// tuples live in a slot vector; deleting a tuple empties its slot so record
/// ids stay stable for the lifetime of the table.
#[derive(Debug)]
pub struct MemTable {
    name: String,
    desc: TupleDesc,
    slots: RwLock<Vec<Option<Vec<Value>>>>,
}

impl MemTable {
    pub fn new(name: impl Into<String>, desc: TupleDesc) -> Self {
        Self {
            name: name.into(),
            desc,
            slots: RwLock::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// number of live tuples
    pub fn len(&self) -> usize {
        self.slots.read().iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TableStore for MemTable {
    fn descriptor(&self) -> TupleDesc {
        self.desc.clone()
    }

    fn insert_tuple(&self, tuple: &Tuple, tid: TransactionId) -> Result<(), StorageError> {
        self.desc
            .validate(&tuple.values)
            .map_err(StorageError::DescriptorMismatch)?;

        let mut slots = self.slots.write();
        let rid = RecordId(slots.len() as u64);
        slots.push(Some(tuple.values.clone()));
        trace!(table = %self.name, %tid, %rid, "inserted tuple");
        Ok(())
    }

    fn delete_tuple(&self, tuple: &Tuple, tid: TransactionId) -> Result<(), StorageError> {
        let mut slots = self.slots.write();

        let slot = match tuple.rid {
            Some(rid) => slots
                .get_mut(rid.0 as usize)
                .filter(|slot| slot.is_some())
                .ok_or_else(|| {
                    StorageError::RecordNotFound(format!("{} in table {}", rid, self.name))
                })?,
            // computed tuples carry no id: remove the first live row with equal values
            None => slots
                .iter_mut()
                .find(|slot| matches!(slot, Some(values) if *values == tuple.values))
                .ok_or_else(|| {
                    StorageError::RecordNotFound(format!(
                        "no tuple with values {:?} in table {}",
                        tuple.values, self.name
                    ))
                })?,
        };
        *slot = None;
        trace!(table = %self.name, %tid, "deleted tuple");
        Ok(())
    }

    fn scan(&self, tid: TransactionId) -> Result<Vec<Tuple>, StorageError> {
        let slots = self.slots.read();
        let tuples: Vec<Tuple> = slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| {
                slot.as_ref()
                    .map(|values| Tuple::with_rid(values.clone(), RecordId(i as u64)))
            })
            .collect();
        trace!(table = %self.name, %tid, rows = tuples.len(), "scanned table");
        Ok(tuples)
    }
}
