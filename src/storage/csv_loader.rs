//! csv ingestion into a [`TableStore`]

use super::{TableStore, TransactionId};
use crate::config::CsvOptions;
use crate::error::StorageError;
use crate::tuple::{ColumnType, FieldType, Tuple, TupleDesc, Value};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::io::Read;
use std::path::Path;
use tracing::debug;

fn reader_builder(options: &CsvOptions) -> ReaderBuilder {
    let mut builder = ReaderBuilder::new();
    builder
        .has_headers(options.has_header)
        .delimiter(options.delimiter)
        .trim(Trim::All);
    builder
}

fn is_null_literal(field: &str) -> bool {
    field.is_empty() || field.eq_ignore_ascii_case("null")
}

/// parse one csv field as a value of `column_type`
///
/// empty fields and the literal `null` become [`Value::Null`].
pub fn parse_field(field: &str, column_type: ColumnType) -> Result<Value, String> {
    let trimmed = field.trim();
    if is_null_literal(trimmed) {
        return Ok(Value::Null);
    }

    match column_type {
        ColumnType::Integer => trimmed
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|e| format!("invalid integer {:?}: {}", trimmed, e)),
        ColumnType::Boolean => {
            if trimmed.eq_ignore_ascii_case("true") {
                Ok(Value::Boolean(true))
            } else if trimmed.eq_ignore_ascii_case("false") {
                Ok(Value::Boolean(false))
            } else {
                Err(format!("invalid boolean {:?}", trimmed))
            }
        }
        ColumnType::Varchar => Ok(Value::Varchar(trimmed.to_string())),
    }
}

/// read every csv record from `reader` and insert it into `table`
///
/// fields are parsed according to the table's descriptor. returns the number
/// of inserted tuples; the first malformed record aborts the load.
pub fn load_csv<R: Read>(
    table: &dyn TableStore,
    reader: R,
    options: &CsvOptions,
    tid: TransactionId,
) -> Result<usize, StorageError> {
    let desc = table.descriptor();
    let mut csv_reader = reader_builder(options).from_reader(reader);
    let mut count = 0;

    for result in csv_reader.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        if record.len() != desc.len() {
            return Err(StorageError::Csv {
                line,
                message: format!("expected {} fields, found {}", desc.len(), record.len()),
            });
        }

        let mut values = Vec::with_capacity(desc.len());
        for (field, column) in record.iter().zip(&desc.fields) {
            let value = parse_field(field, column.type_).map_err(|message| StorageError::Csv {
                line,
                message: format!("column \"{}\": {}", column.name, message),
            })?;
            values.push(value);
        }

        table.insert_tuple(&Tuple::new(values), tid)?;
        count += 1;
    }

    debug!(rows = count, "loaded csv");
    Ok(count)
}

/// derive a descriptor for a csv file from its header and a sample of rows
///
/// without a header, columns are named `column0`, `column1`, ...
pub fn infer_descriptor(path: &Path, options: &CsvOptions) -> Result<TupleDesc, StorageError> {
    let mut csv_reader = reader_builder(options).from_path(path)?;

    let header: Option<StringRecord> = if options.has_header {
        Some(csv_reader.headers()?.clone())
    } else {
        None
    };

    let samples = csv_reader
        .records()
        .take(options.sample_rows)
        .collect::<Result<Vec<_>, _>>()?;

    let names: Vec<String> = match header {
        Some(header) => header.iter().map(|s| s.to_string()).collect(),
        None => {
            let width = samples.first().map(|r| r.len()).unwrap_or(0);
            (0..width).map(|i| format!("column{}", i)).collect()
        }
    };

    if names.is_empty() || names.iter().all(|n| n.is_empty()) {
        return Err(StorageError::Csv {
            line: 1,
            message: "csv file has no columns".to_string(),
        });
    }

    let fields = names
        .into_iter()
        .enumerate()
        .map(|(index, name)| FieldType::new(name, infer_column_type(&samples, index)))
        .collect();

    Ok(TupleDesc::new(fields))
}

/// try INTEGER, then BOOLEAN, falling back to VARCHAR
fn infer_column_type(samples: &[StringRecord], index: usize) -> ColumnType {
    let values: Vec<&str> = samples
        .iter()
        .filter_map(|record| record.get(index))
        .filter(|v| !is_null_literal(v))
        .collect();

    // an all-null sample carries no type information
    if values.is_empty() {
        return ColumnType::Varchar;
    }
    if values.iter().all(|v| v.parse::<i64>().is_ok()) {
        return ColumnType::Integer;
    }
    if values
        .iter()
        .all(|v| v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("false"))
    {
        return ColumnType::Boolean;
    }
    ColumnType::Varchar
}
