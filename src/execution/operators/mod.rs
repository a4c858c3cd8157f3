mod aggregate;
mod filter;
mod join;
mod limit;
mod mutation;
mod order_by;
mod projection;
mod scan;

pub use aggregate::Aggregator;
pub use filter::Filter;
pub use join::{EqualityJoin, JoinStrategy};
pub use limit::Limit;
pub use mutation::{MutationKind, MutationOp};
pub use order_by::OrderBy;
pub use projection::Projection;
pub use scan::{TableScan, Values};

use crate::error::ExecResult;
use crate::storage::TransactionId;
use crate::tuple::{Tuple, TupleDesc};

/// pull side of an operator (volcano iterator model)
///
/// each call returns the next tuple, `Ok(None)` once the stream is
/// exhausted, or the first error raised below it.
pub trait TupleIterator {
    #[allow(clippy::should_implement_trait)]
    fn next(&mut self) -> ExecResult<Option<Tuple>>;
}

pub type BoxedIterator<'a> = Box<dyn TupleIterator + 'a>;

/// a node of an operator tree
pub trait Operator {
    /// shape of the tuples this operator produces
    fn descriptor(&self) -> TupleDesc;

    /// open the children and build this operator's pull state
    ///
    /// implementations open every child before returning so that errors
    /// surface before any row is pulled.
    fn open(&self, tid: TransactionId) -> ExecResult<BoxedIterator<'_>>;

    /// open the operator for one run under transaction `tid`
    ///
    /// the returned iterator is fused: once it reports exhaustion it keeps
    /// doing so.
    fn iterator(&self, tid: TransactionId) -> ExecResult<BoxedIterator<'_>> {
        Ok(Box::new(Fused::new(self.open(tid)?)))
    }
}

pub type BoxedOperator = Box<dyn Operator>;

/// makes end of stream permanent for the wrapped iterator
struct Fused<'a> {
    inner: BoxedIterator<'a>,
    done: bool,
}

impl<'a> Fused<'a> {
    fn new(inner: BoxedIterator<'a>) -> Self {
        Self { inner, done: false }
    }
}

impl TupleIterator for Fused<'_> {
    fn next(&mut self) -> ExecResult<Option<Tuple>> {
        if self.done {
            return Ok(None);
        }
        let next = self.inner.next()?;
        if next.is_none() {
            self.done = true;
        }
        Ok(next)
    }
}

/// pull every remaining tuple from `iter`
pub fn drain(iter: &mut dyn TupleIterator) -> ExecResult<Vec<Tuple>> {
    let mut tuples = Vec::new();
    while let Some(tuple) = iter.next()? {
        tuples.push(tuple);
    }
    Ok(tuples)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::tuple::{ColumnType, FieldType, Value};

    pub const TID: TransactionId = TransactionId::new(1);

    pub fn int_field(name: &str) -> FieldType {
        FieldType::new(name, ColumnType::Integer)
    }

    pub fn str_field(name: &str) -> FieldType {
        FieldType::new(name, ColumnType::Varchar)
    }

    pub fn values(desc: Vec<FieldType>, rows: Vec<Vec<Value>>) -> BoxedOperator {
        Box::new(Values::new(
            TupleDesc::new(desc),
            rows.into_iter().map(Tuple::new).collect(),
        ))
    }

    pub fn ints(name: &str, rows: &[i64]) -> BoxedOperator {
        values(
            vec![int_field(name)],
            rows.iter().map(|i| vec![Value::Integer(*i)]).collect(),
        )
    }

    pub fn run(op: &dyn Operator) -> Vec<Vec<Value>> {
        let mut iter = op.iterator(TID).unwrap();
        drain(iter.as_mut())
            .unwrap()
            .into_iter()
            .map(|t| t.values)
            .collect()
    }
}
