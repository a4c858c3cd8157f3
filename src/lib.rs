pub mod config;
pub mod error;
pub mod execution;
pub mod expr;
pub mod storage;
pub mod tuple;

pub use config::{CsvOptions, ExecutionConfig};
pub use error::{ExecError, ExecResult, StorageError};
pub use execution::{
    AggKind, AggState, Aggregator, EqualityJoin, Filter, Limit, MutationOp, Operator, OrderBy,
    PipelineExecutor, Projection, TableScan, TupleIterator, Values, compute_field_sum,
};
pub use expr::{ArithOp, CompareOp, Expr};
pub use storage::{MemTable, RecordId, TableStore, TransactionId};
pub use tuple::{ColumnType, FieldType, GroupKey, Tuple, TupleDesc, Value};
