use super::{BoxedIterator, Operator, TupleIterator};
use crate::error::ExecResult;
use crate::storage::{TableStore, TransactionId};
use crate::tuple::{Tuple, TupleDesc};
use std::sync::Arc;

/// leaf operator reading every live tuple of a table
///
/// the table is snapshotted when the iterator is opened; tuples carry their
/// record ids so a delete above the scan can address them.
pub struct TableScan {
    table: Arc<dyn TableStore>,
}

impl TableScan {
    pub fn new(table: Arc<dyn TableStore>) -> Self {
        Self { table }
    }
}

impl Operator for TableScan {
    fn descriptor(&self) -> TupleDesc {
        self.table.descriptor()
    }

    fn open(&self, tid: TransactionId) -> ExecResult<BoxedIterator<'_>> {
        let tuples = self.table.scan(tid)?;
        Ok(Box::new(BufferIterator {
            buffer: tuples.into_iter(),
        }))
    }
}

/// leaf operator yielding a fixed list of tuples
///
/// every `iterator` call starts again from the first tuple.
pub struct Values {
    desc: TupleDesc,
    tuples: Vec<Tuple>,
}

impl Values {
    pub fn new(desc: TupleDesc, tuples: Vec<Tuple>) -> Self {
        Self { desc, tuples }
    }
}

impl Operator for Values {
    fn descriptor(&self) -> TupleDesc {
        self.desc.clone()
    }

    fn open(&self, _tid: TransactionId) -> ExecResult<BoxedIterator<'_>> {
        Ok(Box::new(BufferIterator {
            buffer: self.tuples.clone().into_iter(),
        }))
    }
}

/// hands out an owned buffer one tuple at a time
pub(super) struct BufferIterator {
    pub(super) buffer: std::vec::IntoIter<Tuple>,
}

impl TupleIterator for BufferIterator {
    fn next(&mut self) -> ExecResult<Option<Tuple>> {
        Ok(self.buffer.next())
    }
}
