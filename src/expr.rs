//! expressions evaluated against a tuple
//!
//! every expression knows its static output type before evaluation, which is
//! how operators build their output descriptors.

use crate::error::{ExecError, ExecResult};
use crate::tuple::{ColumnType, FieldType, Tuple, TupleDesc, Value};
use std::cmp::Ordering;
use std::fmt;

/// relational operator used by filters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

impl CompareOp {
    /// apply the operator; a NULL operand never satisfies it
    pub fn evaluate(self, left: &Value, right: &Value) -> ExecResult<bool> {
        let Some(ordering) = left.compare(right)? else {
            return Ok(false);
        };
        Ok(match self {
            CompareOp::Equal => ordering == Ordering::Equal,
            CompareOp::NotEqual => ordering != Ordering::Equal,
            CompareOp::LessThan => ordering == Ordering::Less,
            CompareOp::LessThanOrEqual => ordering != Ordering::Greater,
            CompareOp::GreaterThan => ordering == Ordering::Greater,
            CompareOp::GreaterThanOrEqual => ordering != Ordering::Less,
        })
    }

    fn symbol(self) -> &'static str {
        match self {
            CompareOp::Equal => "=",
            CompareOp::NotEqual => "!=",
            CompareOp::LessThan => "<",
            CompareOp::LessThanOrEqual => "<=",
            CompareOp::GreaterThan => ">",
            CompareOp::GreaterThanOrEqual => ">=",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// integer arithmetic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl ArithOp {
    fn apply(self, l: i64, r: i64) -> ExecResult<i64> {
        let result = match self {
            ArithOp::Add => l.checked_add(r),
            ArithOp::Subtract => l.checked_sub(r),
            ArithOp::Multiply => l.checked_mul(r),
            ArithOp::Divide => {
                if r == 0 {
                    return Err(ExecError::DivisionByZero);
                }
                l.checked_div(r)
            }
        };
        result.ok_or(ExecError::IntegerOverflow)
    }

    fn symbol(self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Subtract => "-",
            ArithOp::Multiply => "*",
            ArithOp::Divide => "/",
        }
    }
}

/// bound expression with its output type attached
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// reference to a field of the input tuple by position
    Field {
        name: String,
        index: usize,
        type_: ColumnType,
    },

    /// constant value, independent of the input tuple
    Constant { value: Value, type_: ColumnType },

    /// integer arithmetic over two sub-expressions
    Arithmetic {
        op: ArithOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

impl Expr {
    /// bind a field reference by name against `desc`
    pub fn field(desc: &TupleDesc, name: &str) -> ExecResult<Self> {
        let (index, field) = desc.field(name)?;
        Ok(Expr::Field {
            name: field.name.clone(),
            index,
            type_: field.type_,
        })
    }

    /// field reference by position
    pub fn column(index: usize, field: &FieldType) -> Self {
        Expr::Field {
            name: field.name.clone(),
            index,
            type_: field.type_,
        }
    }

    pub fn integer(value: i64) -> Self {
        Expr::Constant {
            value: Value::Integer(value),
            type_: ColumnType::Integer,
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expr::Constant {
            value: Value::Varchar(value.into()),
            type_: ColumnType::Varchar,
        }
    }

    pub fn boolean(value: bool) -> Self {
        Expr::Constant {
            value: Value::Boolean(value),
            type_: ColumnType::Boolean,
        }
    }

    /// build an arithmetic expression; both operands must be integers
    pub fn arithmetic(op: ArithOp, left: Expr, right: Expr) -> ExecResult<Self> {
        for side in [&left, &right] {
            let type_ = side.output_type().type_;
            if type_ != ColumnType::Integer {
                return Err(ExecError::type_mismatch(ColumnType::Integer, type_));
            }
        }
        Ok(Expr::Arithmetic {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    /// evaluate the expression against one tuple
    pub fn eval(&self, tuple: &Tuple) -> ExecResult<Value> {
        match self {
            Expr::Field { index, .. } => tuple.get(*index).cloned(),
            Expr::Constant { value, .. } => Ok(value.clone()),
            Expr::Arithmetic { op, left, right } => {
                let l = left.eval(tuple)?;
                let r = right.eval(tuple)?;
                if l.is_null() || r.is_null() {
                    return Ok(Value::Null);
                }
                Ok(Value::Integer(op.apply(l.as_integer()?, r.as_integer()?)?))
            }
        }
    }

    /// evaluate without an input row; field references fail
    pub fn eval_constant(&self) -> ExecResult<Value> {
        self.eval(&Tuple::empty())
    }

    /// static name and type of the value this expression produces
    pub fn output_type(&self) -> FieldType {
        match self {
            Expr::Field { name, type_, .. } => FieldType::new(name.clone(), *type_),
            Expr::Constant { type_, .. } => FieldType::new(self.to_string(), *type_),
            Expr::Arithmetic { .. } => FieldType::new(self.to_string(), ColumnType::Integer),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Field { name, .. } => write!(f, "{}", name),
            Expr::Constant {
                value: Value::Varchar(s),
                ..
            } => write!(f, "'{}'", s),
            Expr::Constant { value, .. } => write!(f, "{}", value),
            Expr::Arithmetic { op, left, right } => {
                write!(f, "({} {} {})", left, op.symbol(), right)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people() -> TupleDesc {
        TupleDesc::new(vec![
            FieldType::new("name", ColumnType::Varchar),
            FieldType::new("age", ColumnType::Integer),
        ])
    }

    #[test]
    fn test_field_binding_and_eval() {
        let expr = Expr::field(&people(), "age").unwrap();
        let tuple = Tuple::new(vec![Value::from("alice"), Value::Integer(30)]);
        assert_eq!(expr.eval(&tuple).unwrap(), Value::Integer(30));
        assert_eq!(expr.output_type(), FieldType::new("age", ColumnType::Integer));
    }

    #[test]
    fn test_unknown_field() {
        let err = Expr::field(&people(), "salary").unwrap_err();
        assert_eq!(err, ExecError::ColumnNotFound("salary".into()));
    }

    #[test]
    fn test_arithmetic() {
        let age = Expr::field(&people(), "age").unwrap();
        let expr = Expr::arithmetic(ArithOp::Multiply, age, Expr::integer(2)).unwrap();
        let tuple = Tuple::new(vec![Value::from("bob"), Value::Integer(21)]);
        assert_eq!(expr.eval(&tuple).unwrap(), Value::Integer(42));
        assert_eq!(expr.to_string(), "(age * 2)");
    }

    #[test]
    fn test_arithmetic_rejects_strings() {
        let name = Expr::field(&people(), "name").unwrap();
        let err = Expr::arithmetic(ArithOp::Add, name, Expr::integer(1)).unwrap_err();
        assert!(matches!(err, ExecError::TypeMismatch { .. }));
    }

    #[test]
    fn test_division_by_zero() {
        let expr = Expr::arithmetic(ArithOp::Divide, Expr::integer(1), Expr::integer(0)).unwrap();
        assert_eq!(expr.eval_constant().unwrap_err(), ExecError::DivisionByZero);
    }

    #[test]
    fn test_eval_constant_rejects_field() {
        let expr = Expr::field(&people(), "age").unwrap();
        assert!(matches!(
            expr.eval_constant(),
            Err(ExecError::ColumnIndexOutOfBounds { index: 1, len: 0 })
        ));
    }

    #[test]
    fn test_compare_ops() {
        let three = Value::Integer(3);
        let five = Value::Integer(5);
        assert!(CompareOp::LessThan.evaluate(&three, &five).unwrap());
        assert!(CompareOp::LessThanOrEqual.evaluate(&three, &three).unwrap());
        assert!(!CompareOp::GreaterThan.evaluate(&three, &five).unwrap());
        assert!(CompareOp::NotEqual.evaluate(&three, &five).unwrap());
        assert!(!CompareOp::Equal.evaluate(&Value::Null, &Value::Null).unwrap());
        assert!(CompareOp::Equal.evaluate(&three, &Value::from("3")).is_err());
    }
}
