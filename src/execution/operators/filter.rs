use super::{BoxedIterator, BoxedOperator, Operator, TupleIterator};
use crate::error::{ExecError, ExecResult};
use crate::expr::{CompareOp, Expr};
use crate::storage::TransactionId;
use crate::tuple::{Tuple, TupleDesc};

/// physical operator for filtering rows based on a predicate
/// evaluates `left <op> right` on each row and only outputs matching rows
pub struct Filter {
    left: Expr,
    op: CompareOp,
    right: Expr,
    child: BoxedOperator,
}

impl Filter {
    /// both sides of the comparison must have the same static type
    pub fn new(left: Expr, op: CompareOp, right: Expr, child: BoxedOperator) -> ExecResult<Self> {
        let left_type = left.output_type().type_;
        let right_type = right.output_type().type_;
        if left_type != right_type {
            return Err(ExecError::type_mismatch(left_type, right_type));
        }

        Ok(Self {
            left,
            op,
            right,
            child,
        })
    }

    /// evaluate the predicate on a specific row
    fn matches(&self, tuple: &Tuple) -> ExecResult<bool> {
        let left = self.left.eval(tuple)?;
        let right = self.right.eval(tuple)?;
        self.op.evaluate(&left, &right)
    }
}

impl Operator for Filter {
    fn descriptor(&self) -> TupleDesc {
        self.child.descriptor()
    }

    fn open(&self, tid: TransactionId) -> ExecResult<BoxedIterator<'_>> {
        let child = self.child.iterator(tid)?;
        Ok(Box::new(FilterIterator { filter: self, child }))
    }
}

struct FilterIterator<'a> {
    filter: &'a Filter,
    child: BoxedIterator<'a>,
}

impl TupleIterator for FilterIterator<'_> {
    fn next(&mut self) -> ExecResult<Option<Tuple>> {
        // rejected rows are dropped, not buffered
        while let Some(tuple) = self.child.next()? {
            if self.filter.matches(&tuple)? {
                return Ok(Some(tuple));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::tuple::Value;

    fn people() -> BoxedOperator {
        values(
            vec![str_field("name"), int_field("age")],
            vec![
                vec![Value::from("alice"), Value::Integer(30)],
                vec![Value::from("bob"), Value::Integer(25)],
                vec![Value::from("carol"), Value::Null],
                vec![Value::from("dave"), Value::Integer(35)],
            ],
        )
    }

    #[test]
    fn test_filter_greater_than() {
        let child = people();
        let age = Expr::field(&child.descriptor(), "age").unwrap();
        let filter = Filter::new(age, CompareOp::GreaterThan, Expr::integer(25), child).unwrap();

        assert_eq!(
            run(&filter),
            vec![
                vec![Value::from("alice"), Value::Integer(30)],
                vec![Value::from("dave"), Value::Integer(35)],
            ]
        );
    }

    #[test]
    fn test_filter_string_equality() {
        let child = people();
        let name = Expr::field(&child.descriptor(), "name").unwrap();
        let filter = Filter::new(name, CompareOp::Equal, Expr::string("bob"), child).unwrap();

        assert_eq!(run(&filter), vec![vec![Value::from("bob"), Value::Integer(25)]]);
    }

    #[test]
    fn test_filter_descriptor_is_child_descriptor() {
        let child = people();
        let desc = child.descriptor();
        let age = Expr::field(&desc, "age").unwrap();
        let filter = Filter::new(age, CompareOp::LessThan, Expr::integer(0), child).unwrap();

        assert_eq!(filter.descriptor(), desc);
        assert!(run(&filter).is_empty());
    }

    #[test]
    fn test_filter_rejects_mismatched_types() {
        let child = people();
        let name = Expr::field(&child.descriptor(), "name").unwrap();
        let err = Filter::new(name, CompareOp::Equal, Expr::integer(1), child)
            .err()
            .unwrap();
        assert!(matches!(err, ExecError::TypeMismatch { .. }));
    }

    #[test]
    fn test_filter_propagates_evaluation_error() {
        let child = people();
        // field index past the end of the tuple
        let bogus = Expr::column(5, &int_field("ghost"));
        let filter = Filter::new(bogus, CompareOp::Equal, Expr::integer(1), child).unwrap();

        let mut iter = filter.iterator(TID).unwrap();
        assert!(matches!(
            iter.next(),
            Err(ExecError::ColumnIndexOutOfBounds { index: 5, .. })
        ));
    }
}
