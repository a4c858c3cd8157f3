use super::{BoxedIterator, BoxedOperator, Operator, TupleIterator};
use crate::error::{ExecError, ExecResult};
use crate::expr::Expr;
use crate::storage::TransactionId;
use crate::tuple::{Tuple, TupleDesc, Value};

/// physical operator for LIMIT
/// returns at most N rows from its child, N being a constant expression
pub struct Limit {
    limit: Expr,
    child: BoxedOperator,
}

impl Limit {
    pub fn new(limit: Expr, child: BoxedOperator) -> Self {
        Self { limit, child }
    }

    /// evaluate the limit expression without an input row
    fn evaluate_limit(&self) -> ExecResult<usize> {
        match self.limit.eval_constant()? {
            Value::Integer(n) if n < 0 => Err(ExecError::InvalidLimit(format!(
                "limit must not be negative, got {}",
                n
            ))),
            Value::Integer(n) => usize::try_from(n)
                .map_err(|_| ExecError::InvalidLimit(format!("limit {} is too large", n))),
            other => Err(ExecError::type_mismatch("INTEGER", other.type_name())),
        }
    }
}

impl Operator for Limit {
    fn descriptor(&self) -> TupleDesc {
        self.child.descriptor()
    }

    fn open(&self, tid: TransactionId) -> ExecResult<BoxedIterator<'_>> {
        // the limit is known before the child is touched
        let limit = self.evaluate_limit()?;
        let child = self.child.iterator(tid)?;
        Ok(Box::new(LimitIterator {
            child,
            limit,
            rows_emitted: 0,
        }))
    }
}

struct LimitIterator<'a> {
    child: BoxedIterator<'a>,
    limit: usize,
    rows_emitted: usize,
}

impl TupleIterator for LimitIterator<'_> {
    fn next(&mut self) -> ExecResult<Option<Tuple>> {
        // once the quota is used up the child is never pulled again
        if self.rows_emitted >= self.limit {
            return Ok(None);
        }
        let tuple = self.child.next()?;
        if tuple.is_some() {
            self.rows_emitted += 1;
        }
        Ok(tuple)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    #[test]
    fn test_limit_only() {
        let limit = Limit::new(Expr::integer(3), ints("x", &[1, 2, 3, 4, 5]));
        assert_eq!(run(&limit).len(), 3);
    }

    #[test]
    fn test_limit_zero() {
        let limit = Limit::new(Expr::integer(0), ints("x", &[1, 2]));
        assert!(run(&limit).is_empty());
    }

    #[test]
    fn test_limit_larger_than_child() {
        let limit = Limit::new(Expr::integer(10), ints("x", &[1, 2, 3]));
        let mut iter = limit.iterator(TID).unwrap();
        for _ in 0..3 {
            assert!(iter.next().unwrap().is_some());
        }
        assert!(iter.next().unwrap().is_none());
        assert!(iter.next().unwrap().is_none());
    }

    #[test]
    fn test_limit_negative() {
        let limit = Limit::new(Expr::integer(-1), ints("x", &[1]));
        assert!(matches!(
            limit.iterator(TID).err(),
            Some(ExecError::InvalidLimit(_))
        ));
    }

    #[test]
    fn test_limit_not_integer() {
        let limit = Limit::new(Expr::string("ten"), ints("x", &[1]));
        assert!(matches!(
            limit.iterator(TID).err(),
            Some(ExecError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_limit_rejects_field_reference() {
        let child = ints("x", &[1]);
        let field = Expr::field(&child.descriptor(), "x").unwrap();
        let limit = Limit::new(field, child);
        assert!(limit.iterator(TID).is_err());
    }
}
