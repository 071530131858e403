use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::error::{AnalysisError, ShapeError};

/// Text cells read as "no data", following the usual CSV NA markers.
pub const NA_TOKENS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Whether a text cell is empty or one of the [`NA_TOKENS`].
pub fn is_na_text(s: &str) -> bool {
    s.is_empty() || NA_TOKENS.contains(&s)
}

// ---------------------------------------------------------------------------
// Value – a single cell
// ---------------------------------------------------------------------------

/// A dynamically-typed cell mirroring the dtypes a typed load can infer.
/// A raw load only ever produces `Text`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
    /// A date cell that could not be parsed ("not a time").
    NaT,
    /// An empty cell in a typed load, or a derived value that is undefined.
    Null,
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{s}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::NaT => write!(f, "NaT"),
            Value::Null => write!(f, "NaN"),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Text(s) => serializer.serialize_str(s),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Float(v) => serializer.serialize_f64(*v),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Date(d) => serializer.collect_str(&d.format("%Y-%m-%d")),
            Value::NaT | Value::Null => serializer.serialize_none(),
        }
    }
}

impl Value {
    /// Numeric view of the cell. Text is parsed, so raw loads work too.
    /// `None` for null, date, non-numeric and non-finite cells.
    pub fn as_f64(&self) -> Option<f64> {
        let v = match self {
            Value::Float(v) => *v,
            Value::Integer(i) => *i as f64,
            Value::Text(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        v.is_finite().then_some(v)
    }

    /// Integer view of the cell. Floats are accepted only when integral.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            Value::Text(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
    }

    /// Whether the cell carries no data: null, NaT, a NaN float, or text
    /// that is empty or an NA marker.
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Null | Value::NaT => true,
            Value::Float(v) => v.is_nan(),
            Value::Text(s) => is_na_text(s.trim()),
            _ => false,
        }
    }

    /// Compare against a text key the way a string lookup would.
    pub fn matches(&self, key: &str) -> bool {
        match self {
            Value::Text(s) => s == key,
            Value::Null | Value::NaT => false,
            other => other.to_string() == key,
        }
    }
}

// ---------------------------------------------------------------------------
// Schema – ordered column names shared by every record of a table
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq)]
pub struct Schema {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl Schema {
    pub fn new(names: Vec<String>) -> Self {
        // First occurrence wins on duplicate header names.
        let mut index = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            index.entry(name.clone()).or_insert(i);
        }
        Schema { names, index }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub(crate) fn len(&self) -> usize {
        self.names.len()
    }
}

// ---------------------------------------------------------------------------
// Record – one row of the table
// ---------------------------------------------------------------------------

/// One device entry. Field access is by name through the shared schema.
#[derive(Debug, Clone)]
pub struct Record {
    schema: Arc<Schema>,
    values: Vec<Value>,
}

impl Record {
    pub fn columns(&self) -> &[String] {
        self.schema.names()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Lenient access: `None` when the field is not part of the schema.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.schema.position(field).map(|i| &self.values[i])
    }

    /// Strict access: a missing field is an error. `row` is only used for
    /// the error message.
    pub fn field(&self, field: &str, row: usize) -> Result<&Value, AnalysisError> {
        self.get(field).ok_or_else(|| AnalysisError::MissingField {
            field: field.to_string(),
            row,
        })
    }

    /// Iterate `(field, value)` pairs in header order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.schema
            .names()
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    /// Whether two records were built against the same field set.
    pub fn same_schema(&self, other: &Record) -> bool {
        Arc::ptr_eq(&self.schema, &other.schema) || self.schema.names == other.schema.names
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Table – the complete loaded dataset
// ---------------------------------------------------------------------------

/// Ordered records sharing one schema. Operations that add columns return a
/// new table and leave `self` untouched.
#[derive(Debug, Clone)]
pub struct Table {
    schema: Arc<Schema>,
    records: Vec<Record>,
}

impl Default for Table {
    fn default() -> Self {
        Table::empty()
    }
}

impl Table {
    /// A table with no columns and no rows.
    pub fn empty() -> Self {
        Table {
            schema: Arc::new(Schema::new(Vec::new())),
            records: Vec::new(),
        }
    }

    /// Build a table, checking every row against the header length.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self, ShapeError> {
        let schema = Arc::new(Schema::new(columns));
        let mut records = Vec::with_capacity(rows.len());
        for (row, values) in rows.into_iter().enumerate() {
            if values.len() != schema.len() {
                return Err(ShapeError::RowLength {
                    row,
                    expected: schema.len(),
                    found: values.len(),
                });
            }
            records.push(Record {
                schema: Arc::clone(&schema),
                values,
            });
        }
        Ok(Table { schema, records })
    }

    pub fn columns(&self) -> &[String] {
        self.schema.names()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.schema.position(name).is_some()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Return a copy of the table with `name` set to `values`. An existing
    /// column of that name is overwritten in the copy; otherwise the column
    /// is appended.
    pub fn with_column(&self, name: &str, values: Vec<Value>) -> Result<Table, ShapeError> {
        if values.len() != self.records.len() {
            return Err(ShapeError::RowLength {
                row: self.records.len().min(values.len()),
                expected: self.records.len(),
                found: values.len(),
            });
        }

        let existing = self.schema.position(name);
        let mut columns = self.schema.names().to_vec();
        if existing.is_none() {
            columns.push(name.to_string());
        }

        let rows = self
            .records
            .iter()
            .zip(values)
            .map(|(rec, value)| {
                let mut row = rec.values.clone();
                match existing {
                    Some(i) => row[i] = value,
                    None => row.push(value),
                }
                row
            })
            .collect();

        Table::from_rows(columns, rows)
    }

    /// Records whose `field` matches `key`, in table order.
    pub fn matching<'a>(&'a self, field: &'a str, key: &'a str) -> impl Iterator<Item = &'a Record> + 'a {
        self.records
            .iter()
            .filter(move |r| r.get(field).is_some_and(|v| v.matches(key)))
    }

    /// Fail with `MissingColumn` unless every named column exists.
    pub fn require(&self, columns: &[&str]) -> Result<(), AnalysisError> {
        match columns.iter().find(|c| !self.has_column(c)) {
            Some(missing) => Err(AnalysisError::MissingColumn(missing.to_string())),
            None => Ok(()),
        }
    }
}

impl<'a> IntoIterator for &'a Table {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
