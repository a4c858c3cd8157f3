use super::scan::BufferIterator;
use super::{BoxedIterator, BoxedOperator, Operator, TupleIterator};
use crate::error::{ExecError, ExecResult};
use crate::expr::Expr;
use crate::storage::TransactionId;
use crate::tuple::{Tuple, TupleDesc, Value};
use std::cmp::Ordering;
use tracing::debug;

/// blocking sort over one or more key expressions
///
/// NULL sorts first in ascending order and last in descending order. rows
/// that compare equal on every key keep their input order.
pub struct OrderBy {
    keys: Vec<Expr>,
    ascending: Vec<bool>,
    child: BoxedOperator,
}

impl OrderBy {
    pub fn new(keys: Vec<Expr>, ascending: Vec<bool>, child: BoxedOperator) -> ExecResult<Self> {
        if keys.len() != ascending.len() {
            return Err(ExecError::LengthMismatch {
                what: "order by directions",
                expected: keys.len(),
                found: ascending.len(),
            });
        }

        Ok(Self {
            keys,
            ascending,
            child,
        })
    }

    /// evaluate every key of `tuple`, checking values against the key types
    fn sort_key(&self, tuple: &Tuple) -> ExecResult<Vec<Value>> {
        self.keys
            .iter()
            .map(|key| {
                let value = key.eval(tuple)?;
                let type_ = key.output_type().type_;
                if !value.conforms_to(type_) {
                    return Err(ExecError::type_mismatch(type_, value.type_name()));
                }
                Ok(value)
            })
            .collect()
    }

    fn compare(&self, a: &[Value], b: &[Value]) -> Ordering {
        for ((l, r), asc) in a.iter().zip(b).zip(&self.ascending) {
            let ord = l.sort_cmp(r);
            if ord != Ordering::Equal {
                return if *asc { ord } else { ord.reverse() };
            }
        }
        Ordering::Equal
    }

    /// drain the child and sort everything it produced
    fn materialize(&self, child: &mut dyn TupleIterator) -> ExecResult<Vec<Tuple>> {
        let mut rows = Vec::new();
        while let Some(tuple) = child.next()? {
            let key = self.sort_key(&tuple)?;
            rows.push((key, tuple));
        }

        // sort_by is stable
        rows.sort_by(|(a, _), (b, _)| self.compare(a, b));
        debug!(rows = rows.len(), keys = self.keys.len(), "order by materialized");

        Ok(rows.into_iter().map(|(_, tuple)| tuple).collect())
    }
}

impl Operator for OrderBy {
    fn descriptor(&self) -> TupleDesc {
        self.child.descriptor()
    }

    fn open(&self, tid: TransactionId) -> ExecResult<BoxedIterator<'_>> {
        let child = self.child.iterator(tid)?;
        Ok(Box::new(OrderByIterator {
            order_by: self,
            state: SortState::Pending(child),
        }))
    }
}

enum SortState<'a> {
    /// child not consumed yet
    Pending(BoxedIterator<'a>),
    Sorted(BufferIterator),
    /// materialization failed; the half-drained child is dropped
    Failed,
}

struct OrderByIterator<'a> {
    order_by: &'a OrderBy,
    state: SortState<'a>,
}

impl TupleIterator for OrderByIterator<'_> {
    fn next(&mut self) -> ExecResult<Option<Tuple>> {
        if let SortState::Pending(_) = self.state {
            // a failed drain must not be retried against what is left
            if let SortState::Pending(mut child) =
                std::mem::replace(&mut self.state, SortState::Failed)
            {
                let sorted = self.order_by.materialize(child.as_mut())?;
                self.state = SortState::Sorted(BufferIterator {
                    buffer: sorted.into_iter(),
                });
            }
        }

        match &mut self.state {
            SortState::Sorted(buffer) => buffer.next(),
            SortState::Failed => Ok(None),
            SortState::Pending(_) => Err(ExecError::Internal(
                "order by buffer missing after materialization".to_string(),
            )),
        }
    }
}
