use super::{BoxedIterator, BoxedOperator, Operator, TupleIterator};
use crate::error::{ExecError, ExecResult};
use crate::expr::Expr;
use crate::storage::TransactionId;
use crate::tuple::{FieldType, GroupKey, Tuple, TupleDesc};
use std::collections::HashSet;

/// physical operator for projecting columns
/// evaluates one expression per output field, optionally dropping duplicates
pub struct Projection {
    expressions: Vec<Expr>,
    output_names: Vec<String>,
    distinct: bool,
    child: BoxedOperator,
}

impl Projection {
    /// `output_names` must name every expression
    pub fn new(
        expressions: Vec<Expr>,
        output_names: Vec<String>,
        distinct: bool,
        child: BoxedOperator,
    ) -> ExecResult<Self> {
        if expressions.len() != output_names.len() {
            return Err(ExecError::LengthMismatch {
                what: "projection output names",
                expected: expressions.len(),
                found: output_names.len(),
            });
        }

        Ok(Self {
            expressions,
            output_names,
            distinct,
            child,
        })
    }

    fn project(&self, tuple: &Tuple) -> ExecResult<Tuple> {
        let values = self
            .expressions
            .iter()
            .map(|expr| expr.eval(tuple))
            .collect::<ExecResult<Vec<_>>>()?;
        Ok(Tuple::new(values))
    }
}

impl Operator for Projection {
    fn descriptor(&self) -> TupleDesc {
        let fields = self
            .expressions
            .iter()
            .zip(&self.output_names)
            .map(|(expr, name)| FieldType::new(name.clone(), expr.output_type().type_))
            .collect();
        TupleDesc::new(fields)
    }

    fn open(&self, tid: TransactionId) -> ExecResult<BoxedIterator<'_>> {
        let child = self.child.iterator(tid)?;
        Ok(Box::new(ProjectionIterator {
            projection: self,
            child,
            seen: HashSet::new(),
        }))
    }
}

struct ProjectionIterator<'a> {
    projection: &'a Projection,
    child: BoxedIterator<'a>,
    // projected rows already emitted (distinct only)
    seen: HashSet<GroupKey>,
}

impl TupleIterator for ProjectionIterator<'_> {
    fn next(&mut self) -> ExecResult<Option<Tuple>> {
        while let Some(tuple) = self.child.next()? {
            let projected = self.projection.project(&tuple)?;
            if self.projection.distinct && !self.seen.insert(projected.key()) {
                continue;
            }
            return Ok(Some(projected));
        }
        Ok(None)
    }
}
