//! canned queries built from the operators

use super::agg_state::AggState;
use super::executor::PipelineExecutor;
use super::operators::{Aggregator, TableScan};
use crate::config::CsvOptions;
use crate::error::{ExecError, ExecResult, StorageError};
use crate::expr::Expr;
use crate::storage::{MemTable, TransactionId, load_csv};
use crate::tuple::{ColumnType, TupleDesc, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

const LOAD_TID: TransactionId = TransactionId::new(0);

/// load the csv file at `path` into a fresh table and sum one integer field
///
/// the file must have a header row; `desc` gives the column types.
pub fn compute_field_sum(
    path: &Path,
    desc: &TupleDesc,
    field: &str,
    options: &CsvOptions,
) -> ExecResult<i64> {
    // reject bad fields before touching the file
    let (_, field_type) = desc.field(field)?;
    if field_type.type_ != ColumnType::Integer {
        return Err(ExecError::UnsupportedType {
            context: "field sum",
            type_: field_type.type_,
        });
    }

    let options = CsvOptions {
        has_header: true,
        ..options.clone()
    };
    let table = Arc::new(MemTable::new(table_name(path), desc.clone()));
    let file = File::open(path).map_err(StorageError::from)?;
    let loaded = load_csv(&*table, BufReader::new(file), &options, LOAD_TID)?;

    let sum = AggState::sum(field, Expr::field(desc, field)?)?;
    let root = Aggregator::new(vec![sum], Box::new(TableScan::new(table)))?;
    let rows = PipelineExecutor::new(Box::new(root)).execute(LOAD_TID)?;

    let total = match rows.first().and_then(|row| row.values.first()) {
        Some(Value::Integer(total)) => *total,
        other => {
            return Err(ExecError::Internal(format!(
                "sum produced {:?} instead of one integer",
                other
            )));
        }
    };

    info!(path = %path.display(), field, rows = loaded, total, "field sum computed");
    Ok(total)
}

fn table_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "csv".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuple::FieldType;

    #[test]
    fn test_table_name_from_path() {
        assert_eq!(table_name(Path::new("/tmp/orders.csv")), "orders");
        assert_eq!(table_name(Path::new("/")), "csv");
    }

    #[test]
    fn test_rejects_varchar_field_before_reading() {
        let desc = TupleDesc::new(vec![FieldType::new("name", ColumnType::Varchar)]);
        let err = compute_field_sum(
            Path::new("/definitely/not/here.csv"),
            &desc,
            "name",
            &CsvOptions::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ExecError::UnsupportedType {
                context: "field sum",
                type_: ColumnType::Varchar,
            }
        );
    }

    #[test]
    fn test_missing_file() {
        let desc = TupleDesc::new(vec![FieldType::new("n", ColumnType::Integer)]);
        let err = compute_field_sum(
            Path::new("/definitely/not/here.csv"),
            &desc,
            "n",
            &CsvOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ExecError::Storage(_)));
    }
}
