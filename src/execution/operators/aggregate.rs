use super::scan::BufferIterator;
use super::{BoxedIterator, BoxedOperator, Operator, TupleIterator};
use crate::error::{ExecError, ExecResult};
use crate::execution::agg_state::AggState;
use crate::expr::Expr;
use crate::storage::TransactionId;
use crate::tuple::{FieldType, GroupKey, Tuple, TupleDesc};
use std::collections::HashMap;
use tracing::debug;

/// physical operator for grouped and ungrouped aggregation
///
/// consumes all input rows on the first pull. without group-by expressions a
/// single row is produced, even for empty input; otherwise one row per group
/// in the order groups were first seen.
pub struct Aggregator {
    group_by: Vec<Expr>,
    templates: Vec<AggState>,
    child: BoxedOperator,
}

impl Aggregator {
    /// ungrouped aggregation (e.g., SELECT COUNT(x), SUM(y) FROM t)
    pub fn new(templates: Vec<AggState>, child: BoxedOperator) -> ExecResult<Self> {
        Self::grouped(templates, Vec::new(), child)
    }

    pub fn grouped(
        templates: Vec<AggState>,
        group_by: Vec<Expr>,
        child: BoxedOperator,
    ) -> ExecResult<Self> {
        if group_by.is_empty() && templates.is_empty() {
            return Err(ExecError::InvalidPlan(
                "aggregation needs a group by or at least one aggregate".to_string(),
            ));
        }

        Ok(Self {
            group_by,
            templates,
            child,
        })
    }

    fn fresh_states(&self) -> Vec<AggState> {
        self.templates.iter().map(AggState::copy).collect()
    }

    fn group_key(&self, tuple: &Tuple) -> ExecResult<GroupKey> {
        let values = self
            .group_by
            .iter()
            .map(|expr| expr.eval(tuple))
            .collect::<ExecResult<Vec<_>>>()?;
        Ok(GroupKey(values))
    }

    /// key values followed by every finalized aggregate
    fn emit(key: GroupKey, states: &[AggState]) -> Tuple {
        let mut values = key.0;
        for state in states {
            values.extend(state.finalize().values);
        }
        Tuple::new(values)
    }

    fn aggregate_all(&self, child: &mut dyn TupleIterator) -> ExecResult<Vec<Tuple>> {
        let mut states = self.fresh_states();
        let mut rows = 0usize;
        while let Some(tuple) = child.next()? {
            for state in states.iter_mut() {
                state.add_tuple(&tuple)?;
            }
            rows += 1;
        }

        debug!(rows, "ungrouped aggregation finished");
        Ok(vec![Self::emit(GroupKey(Vec::new()), &states)])
    }

    fn aggregate_groups(&self, child: &mut dyn TupleIterator) -> ExecResult<Vec<Tuple>> {
        let mut slots: HashMap<GroupKey, usize> = HashMap::new();
        // first-seen order
        let mut groups: Vec<(GroupKey, Vec<AggState>)> = Vec::new();

        while let Some(tuple) = child.next()? {
            let key = self.group_key(&tuple)?;
            let slot = match slots.get(&key) {
                Some(&slot) => slot,
                None => {
                    slots.insert(key.clone(), groups.len());
                    groups.push((key, self.fresh_states()));
                    groups.len() - 1
                }
            };

            let (_, states) = groups.get_mut(slot).ok_or_else(|| {
                ExecError::Internal(format!("aggregation group slot {} missing", slot))
            })?;
            for state in states.iter_mut() {
                state.add_tuple(&tuple)?;
            }
        }

        debug!(groups = groups.len(), "grouped aggregation finished");
        Ok(groups
            .into_iter()
            .map(|(key, states)| Self::emit(key, &states))
            .collect())
    }
}

impl Operator for Aggregator {
    fn descriptor(&self) -> TupleDesc {
        let mut fields: Vec<FieldType> = self
            .group_by
            .iter()
            .enumerate()
            .map(|(i, expr)| FieldType::new(format!("groupby_{}", i), expr.output_type().type_))
            .collect();
        for template in &self.templates {
            fields.extend(template.descriptor().fields);
        }
        TupleDesc::new(fields)
    }

    fn open(&self, tid: TransactionId) -> ExecResult<BoxedIterator<'_>> {
        let child = self.child.iterator(tid)?;
        Ok(Box::new(AggregateIterator {
            aggregator: self,
            child: Some(child),
            output: BufferIterator {
                buffer: Vec::new().into_iter(),
            },
        }))
    }
}

struct AggregateIterator<'a> {
    aggregator: &'a Aggregator,
    // taken on the first pull
    child: Option<BoxedIterator<'a>>,
    output: BufferIterator,
}

impl TupleIterator for AggregateIterator<'_> {
    fn next(&mut self) -> ExecResult<Option<Tuple>> {
        if let Some(mut child) = self.child.take() {
            let results = if self.aggregator.group_by.is_empty() {
                self.aggregator.aggregate_all(child.as_mut())?
            } else {
                self.aggregator.aggregate_groups(child.as_mut())?
            };
            self.output.buffer = results.into_iter();
        }
        self.output.next()
    }
}
