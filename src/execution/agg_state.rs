//! accumulator states for the aggregation operator
//!
//! an [`AggState`] built by the caller is a template: the aggregator copies it
//! once per group and only ever folds tuples into the copies.

use crate::error::{ExecError, ExecResult};
use crate::expr::Expr;
use crate::tuple::{ColumnType, FieldType, Tuple, TupleDesc, Value};
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggKind {
    Count,
    Sum,
    Avg,
    Max,
    Min,
}

impl fmt::Display for AggKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggKind::Count => write!(f, "COUNT"),
            AggKind::Sum => write!(f, "SUM"),
            AggKind::Avg => write!(f, "AVG"),
            AggKind::Max => write!(f, "MAX"),
            AggKind::Min => write!(f, "MIN"),
        }
    }
}

/// running state of one aggregate function
#[derive(Debug, Clone, PartialEq)]
enum Accumulator {
    Count(i64),
    Sum(i64),
    Avg { sum: i64, count: i64 },
    // `None` until the first non-null value
    Max(Option<Value>),
    Min(Option<Value>),
}

impl Accumulator {
    fn initial(kind: AggKind) -> Self {
        match kind {
            AggKind::Count => Accumulator::Count(0),
            AggKind::Sum => Accumulator::Sum(0),
            AggKind::Avg => Accumulator::Avg { sum: 0, count: 0 },
            AggKind::Max => Accumulator::Max(None),
            AggKind::Min => Accumulator::Min(None),
        }
    }

    fn fold(&mut self, value: Value) -> ExecResult<()> {
        match self {
            Accumulator::Count(n) => *n += 1,
            Accumulator::Sum(total) => {
                if !value.is_null() {
                    *total = total
                        .checked_add(value.as_integer()?)
                        .ok_or(ExecError::IntegerOverflow)?;
                }
            }
            Accumulator::Avg { sum, count } => {
                if !value.is_null() {
                    *sum = sum
                        .checked_add(value.as_integer()?)
                        .ok_or(ExecError::IntegerOverflow)?;
                    *count += 1;
                }
            }
            Accumulator::Max(best) => keep_extreme(best, value, Ordering::Greater)?,
            Accumulator::Min(best) => keep_extreme(best, value, Ordering::Less)?,
        }
        Ok(())
    }

    fn result(&self) -> Value {
        match self {
            Accumulator::Count(n) | Accumulator::Sum(n) => Value::Integer(*n),
            Accumulator::Avg { count: 0, .. } => Value::Null,
            // integer division truncates toward zero
            Accumulator::Avg { sum, count } => Value::Integer(sum / count),
            Accumulator::Max(best) | Accumulator::Min(best) => {
                best.clone().unwrap_or(Value::Null)
            }
        }
    }
}

/// replace `best` with `value` when `value` compares as `wanted` against it
fn keep_extreme(best: &mut Option<Value>, value: Value, wanted: Ordering) -> ExecResult<()> {
    if value.is_null() {
        return Ok(());
    }
    let replace = match best {
        None => true,
        Some(current) => value.compare(current)? == Some(wanted),
    };
    if replace {
        *best = Some(value);
    }
    Ok(())
}

/// one aggregate function applied to one expression, with its output name
#[derive(Debug, Clone, PartialEq)]
pub struct AggState {
    kind: AggKind,
    alias: String,
    expr: Expr,
    acc: Accumulator,
}

impl AggState {
    /// SUM and AVG accept only INTEGER expressions
    pub fn new(kind: AggKind, alias: impl Into<String>, expr: Expr) -> ExecResult<Self> {
        if matches!(kind, AggKind::Sum | AggKind::Avg) {
            let type_ = expr.output_type().type_;
            if type_ != ColumnType::Integer {
                return Err(ExecError::UnsupportedType {
                    context: match kind {
                        AggKind::Sum => "SUM",
                        _ => "AVG",
                    },
                    type_,
                });
            }
        }

        Ok(Self {
            kind,
            alias: alias.into(),
            expr,
            acc: Accumulator::initial(kind),
        })
    }

    pub fn count(alias: impl Into<String>, expr: Expr) -> Self {
        Self {
            kind: AggKind::Count,
            alias: alias.into(),
            expr,
            acc: Accumulator::Count(0),
        }
    }

    pub fn sum(alias: impl Into<String>, expr: Expr) -> ExecResult<Self> {
        Self::new(AggKind::Sum, alias, expr)
    }

    pub fn avg(alias: impl Into<String>, expr: Expr) -> ExecResult<Self> {
        Self::new(AggKind::Avg, alias, expr)
    }

    pub fn max(alias: impl Into<String>, expr: Expr) -> ExecResult<Self> {
        Self::new(AggKind::Max, alias, expr)
    }

    pub fn min(alias: impl Into<String>, expr: Expr) -> ExecResult<Self> {
        Self::new(AggKind::Min, alias, expr)
    }

    pub fn kind(&self) -> AggKind {
        self.kind
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// a fresh state with the same function, alias and expression
    pub fn copy(&self) -> Self {
        Self {
            kind: self.kind,
            alias: self.alias.clone(),
            expr: self.expr.clone(),
            acc: Accumulator::initial(self.kind),
        }
    }

    /// fold one input tuple into the running state
    pub fn add_tuple(&mut self, tuple: &Tuple) -> ExecResult<()> {
        let value = self.expr.eval(tuple)?;
        self.acc.fold(value)
    }

    /// the current result as a one-field tuple
    pub fn finalize(&self) -> Tuple {
        Tuple::new(vec![self.acc.result()])
    }

    pub fn descriptor(&self) -> TupleDesc {
        let type_ = match self.kind {
            AggKind::Count | AggKind::Sum | AggKind::Avg => ColumnType::Integer,
            AggKind::Max | AggKind::Min => self.expr.output_type().type_,
        };
        TupleDesc::new(vec![FieldType::new(self.alias.clone(), type_)])
    }
}

impl fmt::Display for AggState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}) AS {}", self.kind, self.expr, self.alias)
    }
}
