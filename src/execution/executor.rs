use super::operators::{BoxedOperator, Operator, drain};
use crate::error::ExecResult;
use crate::storage::TransactionId;
use crate::tuple::{Tuple, TupleDesc};
use std::time::Instant;
use tracing::{debug, info};

/// drives an operator tree from its root and collects the results
pub struct PipelineExecutor {
    root: BoxedOperator,
}

impl PipelineExecutor {
    pub fn new(root: BoxedOperator) -> Self {
        Self { root }
    }

    /// shape of the rows `execute` returns
    pub fn descriptor(&self) -> TupleDesc {
        self.root.descriptor()
    }

    /// open the tree under `tid` and pull until it is exhausted
    ///
    /// the first error anywhere in the tree aborts the run.
    pub fn execute(&self, tid: TransactionId) -> ExecResult<Vec<Tuple>> {
        let start = Instant::now();
        debug!(%tid, fields = self.root.descriptor().len(), "opening operator tree");

        let mut iter = self.root.iterator(tid)?;
        let rows = drain(iter.as_mut())?;

        info!(
            %tid,
            rows = rows.len(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "query finished"
        );
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExecError;
    use crate::execution::operators::{Limit, test_support::*};
    use crate::expr::Expr;
    use crate::tuple::Value;

    #[test]
    fn test_execute_collects_rows() {
        let executor = PipelineExecutor::new(ints("x", &[4, 5, 6]));
        let rows = executor.execute(TID).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].values, vec![Value::Integer(6)]);
        assert_eq!(executor.descriptor().fields[0].name, "x");
    }

    #[test]
    fn test_execute_is_repeatable() {
        let executor = PipelineExecutor::new(ints("x", &[1, 2]));
        assert_eq!(executor.execute(TID).unwrap().len(), 2);
        assert_eq!(executor.execute(TID).unwrap().len(), 2);
    }

    #[test]
    fn test_execute_reports_open_errors() {
        let root = Box::new(Limit::new(Expr::integer(-5), ints("x", &[1])));
        let executor = PipelineExecutor::new(root);
        assert!(matches!(
            executor.execute(TID),
            Err(ExecError::InvalidLimit(_))
        ));
    }
}
