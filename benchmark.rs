use quarry::execution::{BoxedOperator, JoinStrategy};
use quarry::{
    AggState, Aggregator, ColumnType, CompareOp, EqualityJoin, ExecResult, ExecutionConfig, Expr,
    FieldType, Filter, MemTable, Operator, OrderBy, PipelineExecutor, TableScan, TableStore, TransactionId,
    Tuple, TupleDesc, Value,
};
use std::sync::Arc;
use std::time::Instant;

const TID: TransactionId = TransactionId::new(1);
const ORDERS: i64 = 200_000;
const CUSTOMERS: i64 = 2_000;
const CITIES: [&str; 5] = ["paris", "rome", "oslo", "lima", "kyiv"];

fn main() {
    println!("========================================");
    println!("Quarry Benchmark");
    println!("========================================");
    println!();

    let config = match ExecutionConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    println!("join buffer size: {}", config.join_buffer_size);
    println!();

    let (orders, customers) = match build_tables() {
        Ok(tables) => tables,
        Err(e) => {
            eprintln!("failed to build tables: {}", e);
            std::process::exit(1);
        }
    };

    let benchmarks: [(&str, fn(&Tables) -> ExecResult<usize>); 4] = [
        ("Benchmark 1: hash join orders x customers", |t| {
            join(t, Some(JoinStrategy::Hash))
        }),
        ("Benchmark 2: nested loop join orders x customers (first 2000 orders)", |t| {
            join_sample(t, JoinStrategy::NestedLoop)
        }),
        ("Benchmark 3: grouped SUM/AVG of amount by city", grouped),
        ("Benchmark 4: ORDER BY amount DESC", sort),
    ];

    let tables = Tables {
        orders,
        customers,
        join_buffer_size: config.join_buffer_size,
    };
    for (name, run) in benchmarks {
        println!("{}", name);
        let start = Instant::now();
        match run(&tables) {
            Ok(rows) => println!("Completed: {}ms ({} rows)", start.elapsed().as_millis(), rows),
            Err(e) => println!("Failed: {}", e),
        }
        println!("========================================");
        println!();
    }
}

struct Tables {
    orders: Arc<MemTable>,
    customers: Arc<MemTable>,
    join_buffer_size: usize,
}

fn build_tables() -> ExecResult<(Arc<MemTable>, Arc<MemTable>)> {
    let orders = Arc::new(MemTable::new(
        "orders",
        TupleDesc::new(vec![
            FieldType::new("order_id", ColumnType::Integer),
            FieldType::new("customer_id", ColumnType::Integer),
            FieldType::new("amount", ColumnType::Integer),
        ]),
    ));
    let customers = Arc::new(MemTable::new(
        "customers",
        TupleDesc::new(vec![
            FieldType::new("customer_id", ColumnType::Integer),
            FieldType::new("city", ColumnType::Varchar),
        ]),
    ));

    // deterministic pseudo-random amounts
    let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
    for order_id in 0..ORDERS {
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        let amount = (seed % 10_000) as i64;
        orders.insert_tuple(
            &Tuple::new(vec![
                Value::Integer(order_id),
                Value::Integer(order_id % CUSTOMERS),
                Value::Integer(amount),
            ]),
            TID,
        )?;
    }
    for customer_id in 0..CUSTOMERS {
        let city = CITIES[(customer_id as usize) % CITIES.len()];
        customers.insert_tuple(
            &Tuple::new(vec![Value::Integer(customer_id), Value::from(city)]),
            TID,
        )?;
    }

    Ok((orders, customers))
}

fn scan(table: &Arc<MemTable>) -> BoxedOperator {
    Box::new(TableScan::new(table.clone()))
}

fn join_over(left: BoxedOperator, t: &Tables, strategy: Option<JoinStrategy>) -> ExecResult<usize> {
    let key = |desc: &TupleDesc| Expr::field(desc, "customer_id");
    let left_key = key(&left.descriptor())?;
    let right = scan(&t.customers);
    let right_key = key(&right.descriptor())?;

    let mut join = EqualityJoin::new(left, left_key, right, right_key, t.join_buffer_size)?;
    if let Some(strategy) = strategy {
        join = join.with_strategy(strategy);
    }
    Ok(PipelineExecutor::new(Box::new(join)).execute(TID)?.len())
}

fn join(t: &Tables, strategy: Option<JoinStrategy>) -> ExecResult<usize> {
    join_over(scan(&t.orders), t, strategy)
}

fn join_sample(t: &Tables, strategy: JoinStrategy) -> ExecResult<usize> {
    let orders = scan(&t.orders);
    let order_id = Expr::field(&orders.descriptor(), "order_id")?;
    let sample = Filter::new(order_id, CompareOp::LessThan, Expr::integer(2_000), orders)?;
    join_over(Box::new(sample), t, Some(strategy))
}

fn grouped(t: &Tables) -> ExecResult<usize> {
    let joined = {
        let left = scan(&t.orders);
        let right = scan(&t.customers);
        let left_key = Expr::field(&left.descriptor(), "customer_id")?;
        let right_key = Expr::field(&right.descriptor(), "customer_id")?;
        EqualityJoin::new(left, left_key, right, right_key, t.join_buffer_size)?
    };
    let desc = joined.descriptor();
    let city = Expr::field(&desc, "city")?;
    let amount = Expr::field(&desc, "amount")?;

    let aggregate = Aggregator::grouped(
        vec![
            AggState::sum("total", amount.clone())?,
            AggState::avg("mean", amount)?,
        ],
        vec![city],
        Box::new(joined),
    )?;
    Ok(PipelineExecutor::new(Box::new(aggregate)).execute(TID)?.len())
}

fn sort(t: &Tables) -> ExecResult<usize> {
    let orders = scan(&t.orders);
    let amount = Expr::field(&orders.descriptor(), "amount")?;
    let order = OrderBy::new(vec![amount], vec![false], orders)?;
    Ok(PipelineExecutor::new(Box::new(order)).execute(TID)?.len())
}
