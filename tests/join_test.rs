use quarry::execution::{BoxedOperator, JoinStrategy};
use quarry::{
    ColumnType, EqualityJoin, Expr, FieldType, MemTable, Operator, PipelineExecutor, TableScan,
    TableStore, TransactionId, Tuple, TupleDesc, Value,
};
use std::sync::Arc;

const TID: TransactionId = TransactionId::new(11);

fn table(name: &str, rows: &[(i64, &str)]) -> Arc<MemTable> {
    let table = Arc::new(MemTable::new(
        name,
        TupleDesc::new(vec![
            FieldType::new("id", ColumnType::Integer),
            FieldType::new(format!("{}_tag", name), ColumnType::Varchar),
        ]),
    ));
    for (id, tag) in rows {
        table
            .insert_tuple(&Tuple::new(vec![Value::Integer(*id), Value::from(*tag)]), TID)
            .unwrap();
    }
    table
}

fn join(left: &Arc<MemTable>, right: &Arc<MemTable>, buffer: usize) -> EqualityJoin {
    let left: BoxedOperator = Box::new(TableScan::new(left.clone()));
    let right: BoxedOperator = Box::new(TableScan::new(right.clone()));
    let left_key = Expr::field(&left.descriptor(), "id").unwrap();
    let right_key = Expr::field(&right.descriptor(), "id").unwrap();
    EqualityJoin::new(left, left_key, right, right_key, buffer).unwrap()
}

fn run(join: EqualityJoin) -> Vec<Vec<Value>> {
    PipelineExecutor::new(Box::new(join))
        .execute(TID)
        .unwrap()
        .into_iter()
        .map(|t| t.values)
        .collect()
}

#[test]
fn test_join_matches_exactly() {
    let left = table("l", &[(1, "x"), (2, "y")]);
    let right = table("r", &[(1, "p"), (1, "q"), (3, "r")]);

    let expected = vec![
        vec![Value::Integer(1), Value::from("x"), Value::Integer(1), Value::from("p")],
        vec![Value::Integer(1), Value::from("x"), Value::Integer(1), Value::from("q")],
    ];
    assert_eq!(run(join(&left, &right, 100)), expected);
    assert_eq!(run(join(&left, &right, 1)), expected);
}

#[test]
fn test_strategies_agree_on_larger_input() {
    let left_rows: Vec<(i64, String)> = (0..60).map(|i| (i % 7, format!("l{}", i))).collect();
    let right_rows: Vec<(i64, String)> = (0..40).map(|i| (i % 5, format!("r{}", i))).collect();
    let left_refs: Vec<(i64, &str)> = left_rows.iter().map(|(i, s)| (*i, s.as_str())).collect();
    let right_refs: Vec<(i64, &str)> = right_rows.iter().map(|(i, s)| (*i, s.as_str())).collect();
    let left = table("l", &left_refs);
    let right = table("r", &right_refs);

    let hash = run(join(&left, &right, 1_000));
    let fallback = run(join(&left, &right, 10));
    let forced = run(join(&left, &right, 1_000).with_strategy(JoinStrategy::NestedLoop));

    // ids 0..5 appear on both sides
    let expected_pairs: usize = (0..5)
        .map(|k| {
            let l = (0..60).filter(|i| i % 7 == k).count();
            let r = (0..40).filter(|i| i % 5 == k).count();
            l * r
        })
        .sum();
    assert_eq!(hash.len(), expected_pairs);
    assert_eq!(hash, fallback);
    assert_eq!(hash, forced);
}

#[test]
fn test_join_with_empty_side() {
    let left = table("l", &[(1, "x")]);
    let right = table("r", &[]);
    assert!(run(join(&left, &right, 10)).is_empty());
    assert!(run(join(&right, &left, 10)).is_empty());
}
