use quarry::execution::BoxedOperator;
use quarry::{
    ColumnType, CompareOp, ExecError, Expr, FieldType, Filter, MemTable, MutationOp, Operator,
    PipelineExecutor, StorageError, TableScan, TableStore, TransactionId, Tuple, TupleDesc, Value,
    Values,
};
use std::sync::Arc;

const TID: TransactionId = TransactionId::new(5);

fn desc() -> TupleDesc {
    TupleDesc::new(vec![
        FieldType::new("id", ColumnType::Integer),
        FieldType::new("name", ColumnType::Varchar),
    ])
}

fn rows(ids: &[i64]) -> BoxedOperator {
    let tuples = ids
        .iter()
        .map(|id| Tuple::new(vec![Value::Integer(*id), Value::from(format!("n{}", id))]))
        .collect();
    Box::new(Values::new(desc(), tuples))
}

fn count(op: MutationOp) -> Result<Vec<Tuple>, ExecError> {
    PipelineExecutor::new(Box::new(op)).execute(TID)
}

#[test]
fn test_insert_then_scan() {
    let table = Arc::new(MemTable::new("t", desc()));
    let result = count(MutationOp::insert(table.clone(), rows(&[1, 2, 3]))).unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(result[0].values, vec![Value::Integer(3)]);
    assert_eq!(table.len(), 3);
}

#[test]
fn test_delete_rows_selected_by_scan() {
    let table = Arc::new(MemTable::new("t", desc()));
    count(MutationOp::insert(table.clone(), rows(&[1, 2, 3, 4]))).unwrap();

    let scan = Box::new(TableScan::new(table.clone()));
    let id = Expr::field(&scan.descriptor(), "id").unwrap();
    let large = Filter::new(id, CompareOp::GreaterThan, Expr::integer(2), scan).unwrap();
    let result = count(MutationOp::delete(table.clone(), Box::new(large))).unwrap();

    assert_eq!(result[0].values, vec![Value::Integer(2)]);
    let left: Vec<Value> = table
        .scan(TID)
        .unwrap()
        .into_iter()
        .map(|t| t.values[0].clone())
        .collect();
    assert_eq!(left, vec![Value::Integer(1), Value::Integer(2)]);
}

#[test]
fn test_insert_rejects_wrong_shape() {
    let table = Arc::new(MemTable::new(
        "narrow",
        TupleDesc::new(vec![FieldType::new("id", ColumnType::Integer)]),
    ));
    let err = count(MutationOp::insert(table.clone(), rows(&[1]))).unwrap_err();

    assert!(matches!(
        err,
        ExecError::Storage(StorageError::DescriptorMismatch(_))
    ));
    assert!(table.is_empty());
}

#[test]
fn test_delete_missing_row_stops_early() {
    let table = Arc::new(MemTable::new("t", desc()));
    count(MutationOp::insert(table.clone(), rows(&[1, 2]))).unwrap();

    // 9 is not in the table; 2 comes after it and must survive
    let err = count(MutationOp::delete(table.clone(), rows(&[1, 9, 2]))).unwrap_err();
    assert!(matches!(
        err,
        ExecError::Storage(StorageError::RecordNotFound(_))
    ));
    assert_eq!(table.len(), 1);
}

#[test]
fn test_mutation_descriptor() {
    let table = Arc::new(MemTable::new("t", desc()));
    let op = MutationOp::insert(table, rows(&[]));
    assert_eq!(
        op.descriptor(),
        TupleDesc::new(vec![FieldType::new("count", ColumnType::Integer)])
    );
}
