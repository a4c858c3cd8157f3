use super::{BoxedIterator, BoxedOperator, Operator, TupleIterator};
use crate::error::ExecResult;
use crate::storage::{TableStore, TransactionId};
use crate::tuple::{ColumnType, FieldType, Tuple, TupleDesc, Value};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Insert,
    Delete,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MutationKind::Insert => write!(f, "insert"),
            MutationKind::Delete => write!(f, "delete"),
        }
    }
}

/// applies every child tuple to a table and reports how many were affected
///
/// the output is a single `count` row. a storage failure stops the drain;
/// tuples already applied stay applied.
pub struct MutationOp {
    kind: MutationKind,
    store: Arc<dyn TableStore>,
    child: BoxedOperator,
}

impl MutationOp {
    pub fn insert(store: Arc<dyn TableStore>, child: BoxedOperator) -> Self {
        Self {
            kind: MutationKind::Insert,
            store,
            child,
        }
    }

    pub fn delete(store: Arc<dyn TableStore>, child: BoxedOperator) -> Self {
        Self {
            kind: MutationKind::Delete,
            store,
            child,
        }
    }

    fn apply_all(&self, child: &mut dyn TupleIterator, tid: TransactionId) -> ExecResult<i64> {
        let mut count = 0i64;
        while let Some(tuple) = child.next()? {
            match self.kind {
                MutationKind::Insert => self.store.insert_tuple(&tuple, tid)?,
                MutationKind::Delete => self.store.delete_tuple(&tuple, tid)?,
            }
            count += 1;
        }

        debug!(kind = %self.kind, count, %tid, "mutation applied");
        Ok(count)
    }
}

impl Operator for MutationOp {
    fn descriptor(&self) -> TupleDesc {
        TupleDesc::new(vec![FieldType::new("count", ColumnType::Integer)])
    }

    fn open(&self, tid: TransactionId) -> ExecResult<BoxedIterator<'_>> {
        let child = self.child.iterator(tid)?;
        Ok(Box::new(MutationIterator {
            op: self,
            tid,
            child: Some(child),
        }))
    }
}

struct MutationIterator<'a> {
    op: &'a MutationOp,
    tid: TransactionId,
    // taken by the one pull that does the work
    child: Option<BoxedIterator<'a>>,
}

impl TupleIterator for MutationIterator<'_> {
    fn next(&mut self) -> ExecResult<Option<Tuple>> {
        let Some(mut child) = self.child.take() else {
            return Ok(None);
        };
        let count = self.op.apply_all(child.as_mut(), self.tid)?;
        Ok(Some(Tuple::new(vec![Value::Integer(count)])))
    }
}
