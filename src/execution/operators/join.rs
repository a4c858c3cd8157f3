use super::{BoxedIterator, BoxedOperator, Operator, TupleIterator};
use crate::error::{ExecError, ExecResult};
use crate::expr::Expr;
use crate::storage::TransactionId;
use crate::tuple::{Tuple, TupleDesc, Value};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinStrategy {
    /// build a multimap over the right side, probe it per left tuple
    Hash,
    /// rescan the right side for every left tuple
    NestedLoop,
}

impl fmt::Display for JoinStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinStrategy::Hash => write!(f, "hash"),
            JoinStrategy::NestedLoop => write!(f, "nested loop"),
        }
    }
}

/// inner join on `left_key = right_key`
///
/// the hash strategy is used while the right side fits in `max_buffer_size`
/// tuples, otherwise the join falls back to a nested loop. both emit pairs
/// left-major with right tuples in their input order. NULL keys never match.
pub struct EqualityJoin {
    left: BoxedOperator,
    left_key: Expr,
    right: BoxedOperator,
    right_key: Expr,
    max_buffer_size: usize,
    forced: Option<JoinStrategy>,
}

impl EqualityJoin {
    pub fn new(
        left: BoxedOperator,
        left_key: Expr,
        right: BoxedOperator,
        right_key: Expr,
        max_buffer_size: usize,
    ) -> ExecResult<Self> {
        let left_type = left_key.output_type().type_;
        let right_type = right_key.output_type().type_;
        if left_type != right_type {
            return Err(ExecError::type_mismatch(left_type, right_type));
        }

        Ok(Self {
            left,
            left_key,
            right,
            right_key,
            max_buffer_size,
            forced: None,
        })
    }

    /// always use `strategy`, ignoring the buffer limit
    pub fn with_strategy(mut self, strategy: JoinStrategy) -> Self {
        self.forced = Some(strategy);
        self
    }

    /// evaluate the left key; NULL keys join nothing
    fn probe_key(&self, left: &Tuple) -> ExecResult<Option<Value>> {
        let key = self.left_key.eval(left)?;
        Ok((!key.is_null()).then_some(key))
    }

    /// drain the right side into a key -> tuples multimap
    ///
    /// returns `None` once more than `max_buffer_size` tuples were seen,
    /// unless the hash strategy was forced.
    fn build(
        &self,
        right: &mut dyn TupleIterator,
    ) -> ExecResult<Option<HashMap<Value, Vec<Tuple>>>> {
        let limit = match self.forced {
            Some(JoinStrategy::Hash) => usize::MAX,
            _ => self.max_buffer_size,
        };

        let mut table: HashMap<Value, Vec<Tuple>> = HashMap::new();
        let mut buffered = 0usize;
        while let Some(tuple) = right.next()? {
            buffered += 1;
            if buffered > limit {
                debug!(
                    max_buffer_size = self.max_buffer_size,
                    "join build side too large, falling back to nested loop"
                );
                return Ok(None);
            }
            let key = self.right_key.eval(&tuple)?;
            if key.is_null() {
                continue;
            }
            table.entry(key).or_default().push(tuple);
        }

        debug!(buffered, keys = table.len(), "join hash table built");
        Ok(Some(table))
    }
}

impl Operator for EqualityJoin {
    fn descriptor(&self) -> TupleDesc {
        self.left.descriptor().merge(&self.right.descriptor())
    }

    fn open(&self, tid: TransactionId) -> ExecResult<BoxedIterator<'_>> {
        let left = self.left.iterator(tid)?;
        let right = self.right.iterator(tid)?;
        Ok(Box::new(JoinIterator {
            join: self,
            tid,
            left,
            state: JoinState::Unstarted(right),
        }))
    }
}

enum JoinState<'a> {
    /// right side opened but not yet consumed
    Unstarted(BoxedIterator<'a>),
    Hash {
        table: HashMap<Value, Vec<Tuple>>,
        pending: std::vec::IntoIter<Tuple>,
    },
    NestedLoop {
        // current left tuple, its key and the rescan of the right side
        current: Option<(Tuple, Value, BoxedIterator<'a>)>,
    },
}

struct JoinIterator<'a> {
    join: &'a EqualityJoin,
    tid: TransactionId,
    left: BoxedIterator<'a>,
    state: JoinState<'a>,
}

impl<'a> JoinIterator<'a> {
    fn choose_strategy(&self, mut right: BoxedIterator<'a>) -> ExecResult<JoinState<'a>> {
        if self.join.forced == Some(JoinStrategy::NestedLoop) {
            debug!(strategy = %JoinStrategy::NestedLoop, "join strategy forced");
            return Ok(JoinState::NestedLoop { current: None });
        }

        Ok(match self.join.build(right.as_mut())? {
            Some(table) => JoinState::Hash {
                table,
                pending: Vec::new().into_iter(),
            },
            None => JoinState::NestedLoop { current: None },
        })
    }
}

impl<'a> TupleIterator for JoinIterator<'a> {
    fn next(&mut self) -> ExecResult<Option<Tuple>> {
        if let JoinState::Unstarted(_) = self.state {
            let placeholder = JoinState::NestedLoop { current: None };
            if let JoinState::Unstarted(right) = std::mem::replace(&mut self.state, placeholder) {
                self.state = self.choose_strategy(right)?;
            }
        }

        let join = self.join;
        match &mut self.state {
            JoinState::Hash { table, pending } => loop {
                if let Some(tuple) = pending.next() {
                    return Ok(Some(tuple));
                }
                let Some(left) = self.left.next()? else {
                    return Ok(None);
                };
                let Some(key) = join.probe_key(&left)? else {
                    continue;
                };
                if let Some(matches) = table.get(&key) {
                    *pending = matches
                        .iter()
                        .map(|right| left.join(right))
                        .collect::<Vec<_>>()
                        .into_iter();
                }
            },
            JoinState::NestedLoop { current } => loop {
                if let Some((left, key, right)) = current {
                    while let Some(candidate) = right.next()? {
                        if join.right_key.eval(&candidate)? == *key {
                            return Ok(Some(left.join(&candidate)));
                        }
                    }
                    *current = None;
                }

                let Some(left) = self.left.next()? else {
                    return Ok(None);
                };
                let Some(key) = join.probe_key(&left)? else {
                    continue;
                };
                let right = join.right.iterator(self.tid)?;
                *current = Some((left, key, right));
            },
            JoinState::Unstarted(_) => Err(ExecError::Internal(
                "join pulled before its strategy was chosen".to_string(),
            )),
        }
    }
}
