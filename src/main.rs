use colored::*;
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL};
use quarry::execution::BoxedOperator;
use quarry::storage::{infer_descriptor, load_csv};
use quarry::{
    AggState, Aggregator, ExecResult, ExecutionConfig, Expr, FieldType, Limit, MemTable, OrderBy,
    PipelineExecutor, StorageError, TableScan, TransactionId, Tuple, TupleDesc, Value,
    compute_field_sum,
};
use std::env;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

const TID: TransactionId = TransactionId::new(1);

struct Args {
    path: PathBuf,
    sum_field: Option<String>,
    group_field: Option<String>,
}

fn main() {
    let mut argv = env::args().skip(1);
    let Some(path) = argv.next() else {
        eprintln!("{}", "usage: quarry <file.csv> [sum_field] [group_field]".red().bold());
        std::process::exit(2);
    };
    let args = Args {
        path: PathBuf::from(path),
        sum_field: argv.next(),
        group_field: argv.next(),
    };

    let total_start = Instant::now();
    if let Err(e) = run(&args) {
        eprintln!("{}", format!("Query failed: {}", e).red().bold());
        std::process::exit(1);
    }

    println!();
    println!(
        "{} {}",
        "Total execution time:".bright_magenta().bold(),
        format_duration(total_start.elapsed()).bright_magenta()
    );
}

fn run(args: &Args) -> ExecResult<()> {
    let config = ExecutionConfig::from_env()?;

    println!("{}", "=== LOADING ===".bright_cyan().bold());

    let load_start = Instant::now();
    let desc = infer_descriptor(&args.path, &config.csv)?;
    let table = Arc::new(MemTable::new(file_label(&args.path), desc.clone()));
    let file = File::open(&args.path).map_err(StorageError::from)?;
    let rows = load_csv(&*table, BufReader::new(file), &config.csv, TID)?;

    println!(
        "{} {}",
        format!("Loaded {} rows", rows).green().bold(),
        format!("({})", format_duration(load_start.elapsed())).bright_black()
    );
    println!("Schema columns ({}):", desc.len());
    for (i, field) in desc.fields.iter().enumerate() {
        println!("  [{}] {} ({})", i, field.name, field.type_);
    }

    println!();
    println!("{}", "=== PREVIEW ===".bright_cyan().bold());

    let preview = Limit::new(
        Expr::integer(config.preview_rows as i64),
        Box::new(TableScan::new(table.clone())),
    );
    let executor = PipelineExecutor::new(Box::new(preview));
    let tuples = executor.execute(TID)?;
    print_results(&executor.descriptor(), &tuples);

    let Some(sum_field) = &args.sum_field else {
        return Ok(());
    };

    println!();
    println!("{}", "=== AGGREGATE ===".bright_cyan().bold());

    match &args.group_field {
        None => {
            let start = Instant::now();
            let total = compute_field_sum(&args.path, &desc, sum_field, &config.csv)?;
            println!(
                "{} {}",
                format!("SUM({}) = {}", sum_field, total).green().bold(),
                format!("({})", format_duration(start.elapsed())).bright_black()
            );
        }
        Some(group_field) => {
            let start = Instant::now();
            let root = grouped_summary(table, &desc, group_field, sum_field)?;
            let executor = PipelineExecutor::new(root);
            let tuples = executor.execute(TID)?;
            println!(
                "{} {}",
                format!("Grouped by {}", group_field).green().bold(),
                format!("({})", format_duration(start.elapsed())).bright_black()
            );
            print_results(&executor.descriptor(), &tuples);
        }
    }

    Ok(())
}

/// SELECT group, COUNT(*), SUM(field), AVG(field), MIN(field), MAX(field)
/// GROUP BY group ORDER BY group
fn grouped_summary(
    table: Arc<MemTable>,
    desc: &TupleDesc,
    group_field: &str,
    sum_field: &str,
) -> ExecResult<BoxedOperator> {
    let group = Expr::field(desc, group_field)?;
    let key_field = FieldType::new("groupby_0", group.output_type().type_);
    let value = Expr::field(desc, sum_field)?;
    let templates = vec![
        AggState::count("count", value.clone()),
        AggState::sum(format!("sum_{}", sum_field), value.clone())?,
        AggState::avg(format!("avg_{}", sum_field), value.clone())?,
        AggState::min(format!("min_{}", sum_field), value.clone())?,
        AggState::max(format!("max_{}", sum_field), value)?,
    ];
    let aggregate = Aggregator::grouped(templates, vec![group], Box::new(TableScan::new(table)))?;

    let key = Expr::column(0, &key_field);
    let sorted = OrderBy::new(vec![key], vec![true], Box::new(aggregate))?;
    Ok(Box::new(sorted))
}

fn print_results(desc: &TupleDesc, tuples: &[Tuple]) {
    if tuples.is_empty() {
        println!("{}", "No results".yellow());
        return;
    }

    println!("Total rows: {}", tuples.len().to_string().bright_yellow());

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(desc.fields.iter().map(|f| f.name.clone()));
    for tuple in tuples {
        table.add_row(tuple.values.iter().map(format_value));
    }
    println!("{}", table);
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Varchar(s) => format!("'{}'", s),
        other => other.to_string(),
    }
}

fn format_duration(duration: std::time::Duration) -> String {
    let micros = duration.as_micros();
    if micros < 1000 {
        format!("{}µs", micros)
    } else if micros < 1_000_000 {
        format!("{:.2}ms", micros as f64 / 1000.0)
    } else {
        format!("{:.2}s", micros as f64 / 1_000_000.0)
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
