pub mod agg_state;
pub mod executor;
pub mod operators;
pub mod query;

pub use agg_state::{AggKind, AggState};
pub use executor::PipelineExecutor;
pub use operators::{
    Aggregator, BoxedIterator, BoxedOperator, EqualityJoin, Filter, JoinStrategy, Limit,
    MutationKind, MutationOp, Operator, OrderBy, Projection, TableScan, TupleIterator, Values,
    drain,
};
pub use query::compute_field_sum;
