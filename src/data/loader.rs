use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{
    Array, AsArray, BooleanArray, Date32Array, Float32Array, Float64Array, Int32Array,
    Int64Array,
};
use arrow::datatypes::DataType;
use arrow::util::display::array_value_to_string;
use log::{debug, error, info, warn};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::dates::parse_day_first;
use super::model::{is_na_text, Table, Value};
use crate::error::{LoadError, ShapeError};

/// Date column parsed by the typed load.
pub const RELEASED_DATE: &str = "released_date";

// ---------------------------------------------------------------------------
// Load options
// ---------------------------------------------------------------------------

/// How cells are turned into [`Value`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Infer integer / float / bool columns and map empty cells to null.
    /// When false every CSV cell stays text.
    pub typed: bool,
    /// Columns parsed day-first into dates; failures become `NaT`.
    pub date_columns: Vec<String>,
}

impl LoadOptions {
    pub fn raw() -> Self {
        LoadOptions {
            typed: false,
            date_columns: Vec::new(),
        }
    }

    pub fn typed() -> Self {
        LoadOptions {
            typed: true,
            date_columns: vec![RELEASED_DATE.to_string()],
        }
    }
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions::typed()
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a device table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row followed by one device per line
/// * `.json`    – `[{ "brand": "...", "price": 499, ... }, ...]`
/// * `.parquet` – one column per field
pub fn load_file(path: &Path, options: &LoadOptions) -> Result<Table, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "csv" | "txt" => load_csv(path, options),
        "json" => load_json(path, options),
        "parquet" | "pq" => load_parquet(path, options),
        other => Err(LoadError::UnsupportedExtension(other.to_string())),
    }?;

    info!(
        "loaded {} records with {} columns from {}",
        table.len(),
        table.columns().len(),
        path.display()
    );
    Ok(table)
}

/// Raw load: every cell kept as text. Failures are logged and give an empty
/// table.
pub fn load_records(path: &Path) -> Table {
    load_or_empty(path, &LoadOptions::raw())
}

/// Typed load with day-first `released_date` parsing. Failures are logged and
/// give an empty table.
pub fn load_typed(path: &Path) -> Table {
    load_or_empty(path, &LoadOptions::typed())
}

fn load_or_empty(path: &Path, options: &LoadOptions) -> Table {
    match load_file(path, options) {
        Ok(table) => table,
        Err(err @ LoadError::NotFound(_)) => {
            error!("{err}");
            Table::empty()
        }
        Err(err) => {
            error!("An unexpected error occurred: {err}");
            Table::empty()
        }
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path, options: &LoadOptions) -> Result<Table, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_csv(file, options)
}

/// Parse CSV text from any reader. The header row names the columns.
pub fn read_csv<R: std::io::Read>(input: R, options: &LoadOptions) -> Result<Table, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut padded = 0usize;
    for (row_no, result) in reader.records().enumerate() {
        let record = result?;
        if record.len() > headers.len() {
            return Err(ShapeError::RowLength {
                row: row_no,
                expected: headers.len(),
                found: record.len(),
            }
            .into());
        }
        let mut row: Vec<String> = record.iter().map(str::to_string).collect();
        if row.len() < headers.len() {
            padded += 1;
            row.resize(headers.len(), String::new());
        }
        rows.push(row);
    }
    if padded > 0 {
        warn!("{padded} short CSV rows padded with empty cells");
    }
    debug!("read {} CSV rows", rows.len());

    if !options.typed {
        let values = rows
            .into_iter()
            .map(|row| row.into_iter().map(Value::Text).collect())
            .collect();
        return with_dates(Table::from_rows(headers, values)?, options);
    }

    check_date_columns(&headers, options)?;
    let columns = (0..headers.len())
        .map(|col| {
            let cells: Vec<&str> = rows.iter().map(|row| row[col].as_str()).collect();
            if options.date_columns.contains(&headers[col]) {
                cells.into_iter().map(date_cell).collect()
            } else {
                infer_column(&cells)
            }
        })
        .collect::<Vec<Vec<Value>>>();

    Ok(Table::from_rows(headers, transpose(columns, rows.len()))?)
}

/// Choose one type for the whole column: integer if every non-empty cell is
/// an integer, then float, then bool, else text. Empty and NA cells become
/// null.
fn infer_column(cells: &[&str]) -> Vec<Value> {
    let present = || cells.iter().filter(|c| !is_na_text(c));

    let convert: fn(&str) -> Value = if present().all(|c| c.parse::<i64>().is_ok()) {
        |c| c.parse().map(Value::Integer).unwrap_or(Value::Null)
    } else if present().all(|c| c.parse::<f64>().is_ok()) {
        |c| c.parse().map(Value::Float).unwrap_or(Value::Null)
    } else if present().all(|c| parse_bool(c).is_some()) {
        |c| parse_bool(c).map(Value::Bool).unwrap_or(Value::Null)
    } else {
        |c| Value::Text(c.to_string())
    };

    cells
        .iter()
        .map(|c| if is_na_text(c) { Value::Null } else { convert(c) })
        .collect()
}

fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

fn date_cell(s: &str) -> Value {
    parse_day_first(s).map(Value::Date).unwrap_or(Value::NaT)
}

fn transpose(columns: Vec<Vec<Value>>, n_rows: usize) -> Vec<Vec<Value>> {
    let mut rows: Vec<Vec<Value>> = (0..n_rows)
        .map(|_| Vec::with_capacity(columns.len()))
        .collect();
    for column in columns {
        for (row, value) in rows.iter_mut().zip(column) {
            row.push(value);
        }
    }
    rows
}

fn check_date_columns(headers: &[String], options: &LoadOptions) -> Result<(), LoadError> {
    match options
        .date_columns
        .iter()
        .find(|col| !headers.contains(col))
    {
        Some(missing) => Err(LoadError::MissingDateColumn(missing.clone())),
        None => Ok(()),
    }
}

/// Re-parse designated date columns of an already-built table.
fn with_dates(table: Table, options: &LoadOptions) -> Result<Table, LoadError> {
    check_date_columns(table.columns(), options)?;
    let mut table = table;
    for col in &options.date_columns {
        let values = table
            .iter()
            .map(|rec| match rec.get(col) {
                Some(Value::Text(s)) => date_cell(s),
                Some(Value::Null) | None => Value::NaT,
                Some(other) => other.clone(),
            })
            .collect();
        table = table.with_column(col, values)?;
    }
    Ok(table)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "oem_id": "A-1", "brand": "Acme", "price": 499.0, "released_date": "01-02-21" },
///   ...
/// ]
/// ```
///
/// Every object must carry the same keys as the first one.
fn load_json(path: &Path, options: &LoadOptions) -> Result<Table, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_json(&text, options)
}

pub fn read_json(text: &str, options: &LoadOptions) -> Result<Table, LoadError> {
    let root: JsonValue = serde_json::from_str(text)?;
    let records = root.as_array().ok_or(ShapeError::NotAnObject(0))?;

    let mut headers: Vec<String> = Vec::new();
    let mut rows = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let obj = rec.as_object().ok_or(ShapeError::NotAnObject(i))?;
        if i == 0 {
            headers = obj.keys().cloned().collect();
        } else if obj.len() != headers.len() || headers.iter().any(|h| !obj.contains_key(h)) {
            return Err(ShapeError::NonUniform { index: i }.into());
        }

        let row = headers
            .iter()
            .map(|h| json_to_value(&obj[h.as_str()], options))
            .collect();
        rows.push(row);
    }

    with_dates(Table::from_rows(headers, rows)?, options)
}

fn json_to_value(val: &JsonValue, options: &LoadOptions) -> Value {
    match val {
        JsonValue::String(s) if !options.typed => Value::Text(s.clone()),
        JsonValue::String(s) if s.is_empty() => Value::Null,
        JsonValue::String(s) => Value::Text(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                Value::Text(n.to_string())
            }
        }
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Null => Value::Null,
        other => Value::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one column per device field.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path, options: &LoadOptions) -> Result<Table, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build()?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result?;
        for row in 0..batch.num_rows() {
            let values = batch
                .columns()
                .iter()
                .map(|col| extract_value(col, row))
                .collect::<Vec<_>>();
            rows.push(values);
        }
    }

    with_dates(Table::from_rows(headers, rows)?, options)
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_value(col: &Arc<dyn Array>, row: usize) -> Value {
    if col.is_null(row) {
        return Value::Null;
    }
    match col.data_type() {
        DataType::Utf8 => Value::Text(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => Value::Text(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => col
            .as_any()
            .downcast_ref::<Int32Array>()
            .map_or(Value::Null, |a| Value::Integer(a.value(row) as i64)),
        DataType::Int64 => col
            .as_any()
            .downcast_ref::<Int64Array>()
            .map_or(Value::Null, |a| Value::Integer(a.value(row))),
        DataType::Float32 => col
            .as_any()
            .downcast_ref::<Float32Array>()
            .map_or(Value::Null, |a| Value::Float(a.value(row) as f64)),
        DataType::Float64 => col
            .as_any()
            .downcast_ref::<Float64Array>()
            .map_or(Value::Null, |a| Value::Float(a.value(row))),
        DataType::Boolean => col
            .as_any()
            .downcast_ref::<BooleanArray>()
            .map_or(Value::Null, |a| Value::Bool(a.value(row))),
        DataType::Date32 => col
            .as_any()
            .downcast_ref::<Date32Array>()
            .and_then(|a| a.value_as_date(row))
            .map_or(Value::NaT, Value::Date),
        _ => array_value_to_string(col, row)
            .map(Value::Text)
            .unwrap_or(Value::Null),
    }
}
