use log::debug;
use serde::Serialize;

use super::model::{Record, Table, Value};
use crate::error::{AnalysisError, AnalysisResult, ShapeError};

// ---------------------------------------------------------------------------
// Projections returned by the lookups
// ---------------------------------------------------------------------------

/// Commercial summary of a device, found by `oem_id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceSummary {
    pub model_name: Option<Value>,
    pub manufacturer: Option<Value>,
    pub weight: Option<Value>,
    pub price: Option<Value>,
    pub price_unit: Option<Value>,
}

/// Identity and market data of a device, found by `codename`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodenameMatch {
    pub brand: Option<Value>,
    /// Taken from the `model` field.
    pub model_name: Option<Value>,
    pub ram_capacity: Option<Value>,
    pub market_regions: Option<Value>,
    pub info_added_date: Option<Value>,
}

/// Dates and form factor of a device, found by `ram_capacity`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RamMatch {
    pub oem_id: Value,
    pub released_date: Value,
    pub announced_date: Value,
    pub dimensions: Value,
    pub device_category: Value,
}

/// Display data of a device whose refresh rate passed a threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshRateMatch {
    pub oem_id: Value,
    pub display_refresh_rate: i64,
    pub display_type: Value,
    pub market_regions: Value,
}

// Lenient projection: a field outside the schema projects as `None`.
fn pick(record: &Record, field: &str) -> Option<Value> {
    record.get(field).cloned()
}

// Strict projection: a field outside the schema is a lookup error.
fn take(record: &Record, field: &str, row: usize) -> AnalysisResult<Value> {
    record.field(field, row).cloned()
}

// ---------------------------------------------------------------------------
// Lookups
// ---------------------------------------------------------------------------

/// Every device whose `oem_id` equals `oem_id`, in table order.
pub fn by_oem_id(table: &Table, oem_id: &str) -> Vec<DeviceSummary> {
    table
        .matching("oem_id", oem_id)
        .map(|rec| DeviceSummary {
            model_name: pick(rec, "model_name"),
            manufacturer: pick(rec, "manufacturer"),
            weight: pick(rec, "weight"),
            price: pick(rec, "price"),
            price_unit: pick(rec, "price_unit"),
        })
        .collect()
}

/// Every device whose `codename` equals `codename`.
///
/// Accepts any slice of records (a whole table or an earlier result) but
/// refuses input whose records do not share one schema.
pub fn by_codename(records: &[Record], codename: &str) -> Result<Vec<CodenameMatch>, ShapeError> {
    if let Some(first) = records.first() {
        if let Some(index) = records.iter().position(|r| !r.same_schema(first)) {
            return Err(ShapeError::NonUniform { index });
        }
    }

    Ok(records
        .iter()
        .filter(|rec| rec.get("codename").is_some_and(|v| v.matches(codename)))
        .map(|rec| CodenameMatch {
            brand: pick(rec, "brand"),
            model_name: pick(rec, "model"),
            ram_capacity: pick(rec, "ram_capacity"),
            market_regions: pick(rec, "market_regions"),
            info_added_date: pick(rec, "info_added_date"),
        })
        .collect())
}

/// Every device with the given `ram_capacity`. Every record must carry the
/// compared and projected fields.
pub fn by_ram_capacity(table: &Table, ram_capacity: &str) -> AnalysisResult<Vec<RamMatch>> {
    let mut out = Vec::new();
    for (row, rec) in table.iter().enumerate() {
        if !rec.field("ram_capacity", row)?.matches(ram_capacity) {
            continue;
        }
        out.push(RamMatch {
            oem_id: take(rec, "oem_id", row)?,
            released_date: take(rec, "released_date", row)?,
            announced_date: take(rec, "announced_date", row)?,
            dimensions: take(rec, "dimensions", row)?,
            device_category: take(rec, "device_category", row)?,
        });
    }
    Ok(out)
}

/// Every device whose `display_refresh_rate` is strictly above `threshold`.
///
/// The rate is coerced to an integer on every record; the first record that
/// does not hold an integer aborts the whole lookup.
pub fn by_refresh_rate_above(table: &Table, threshold: i64) -> AnalysisResult<Vec<RefreshRateMatch>> {
    const FIELD: &str = "display_refresh_rate";

    let mut out = Vec::new();
    for (row, rec) in table.iter().enumerate() {
        let raw = rec.field(FIELD, row)?;
        let rate = raw.as_i64().ok_or_else(|| AnalysisError::NotNumeric {
            field: FIELD.to_string(),
            row,
            value: raw.to_string(),
        })?;
        if rate <= threshold {
            continue;
        }
        out.push(RefreshRateMatch {
            oem_id: take(rec, "oem_id", row)?,
            display_refresh_rate: rate,
            display_type: take(rec, "display_type", row)?,
            market_regions: take(rec, "market_regions", row)?,
        });
    }
    debug!("{} devices refresh faster than {threshold} Hz", out.len());
    Ok(out)
}
