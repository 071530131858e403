//! Row-wise derived columns. Each function returns a new [`Table`]; the
//! input is never modified, so several analyses can share one loaded table.

use chrono::NaiveDate;
use log::{debug, warn};

use super::dates::parse_day_first;
use super::model::{Record, Table, Value};
use crate::error::{AnalysisError, AnalysisResult};

pub const PIXEL_DENSITY: &str = "pixel_density";
pub const PRICE_GBP: &str = "price_gbp";

/// Fixed conversion into a reference currency.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrencyRate {
    pub reference: String,
    pub rate: f64,
}

impl Default for CurrencyRate {
    fn default() -> Self {
        CurrencyRate {
            reference: "GBP".to_string(),
            rate: 0.85,
        }
    }
}

impl CurrencyRate {
    /// Prices already in the reference currency pass through unchanged.
    pub fn convert(&self, price: f64, currency: Option<&str>) -> f64 {
        if currency == Some(self.reference.as_str()) {
            price
        } else {
            price * self.rate
        }
    }
}

/// Numeric cell of `field`. Missing cells and non-finite numbers give `None`;
/// anything else that is not a number is an error.
pub(crate) fn numeric(rec: &Record, field: &str, row: usize) -> AnalysisResult<Option<f64>> {
    let value = rec.field(field, row)?;
    if value.is_missing() {
        return Ok(None);
    }
    match value {
        Value::Float(_) => Ok(value.as_f64()),
        Value::Text(s) if s.trim().parse::<f64>().is_ok() => Ok(value.as_f64()),
        _ => value
            .as_f64()
            .map(Some)
            .ok_or_else(|| AnalysisError::NotNumeric {
                field: field.to_string(),
                row,
                value: value.to_string(),
            }),
    }
}

/// Release date read day-first. Typed cells are used as is; `NaT`, null and
/// unparseable text give `None`.
pub(crate) fn day_first_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::Date(d) => Some(*d),
        Value::Text(s) => parse_day_first(s),
        _ => None,
    }
}

/// Attach `pixel_density = sqrt(x_resolution² + y_resolution²) / display_diagonal`.
///
/// Rows with a missing resolution or a diagonal that is missing, zero or
/// negative get a null density and never win a ranking.
pub fn with_pixel_density(table: &Table) -> AnalysisResult<Table> {
    table.require(&["x_resolution", "y_resolution", "display_diagonal"])?;

    let mut excluded = 0usize;
    let mut densities = Vec::with_capacity(table.len());
    for (row, rec) in table.iter().enumerate() {
        let x = numeric(rec, "x_resolution", row)?;
        let y = numeric(rec, "y_resolution", row)?;
        let diagonal = numeric(rec, "display_diagonal", row)?;

        let density = match (x, y, diagonal) {
            (Some(x), Some(y), Some(d)) if d > 0.0 => Value::Float((x * x + y * y).sqrt() / d),
            _ => {
                excluded += 1;
                Value::Null
            }
        };
        densities.push(density);
    }

    if excluded > 0 {
        warn!("{excluded} devices have no usable display size; pixel density left empty");
    }
    Ok(table.with_column(PIXEL_DENSITY, densities)?)
}

/// The device with the highest pixel density, including the derived
/// `pixel_density` column. Equal densities keep table order.
pub fn densest_display(table: &Table) -> AnalysisResult<Option<Record>> {
    let ranked = with_pixel_density(table)?;

    let mut best: Option<(f64, &Record)> = None;
    for rec in ranked.iter() {
        let Some(density) = rec.get(PIXEL_DENSITY).and_then(Value::as_f64) else {
            continue;
        };
        if best.map_or(true, |(top, _)| density > top) {
            best = Some((density, rec));
        }
    }

    if let Some((density, _)) = best {
        debug!("highest pixel density: {density:.2} ppi");
    }
    Ok(best.map(|(_, rec)| rec.clone()))
}

/// Attach `price_gbp`: `price` converted with `rate` according to
/// `price_currency`. Rows without a price get null.
pub fn with_reference_price(table: &Table, rate: &CurrencyRate) -> AnalysisResult<Table> {
    table.require(&["price", "price_currency"])?;

    let mut converted = Vec::with_capacity(table.len());
    for (row, rec) in table.iter().enumerate() {
        let currency = rec
            .get("price_currency")
            .filter(|v| !v.is_missing())
            .map(Value::to_string);
        let value = match numeric(rec, "price", row)? {
            Some(price) => Value::Float(rate.convert(price, currency.as_deref())),
            None => Value::Null,
        };
        converted.push(value);
    }
    Ok(table.with_column(PRICE_GBP, converted)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    fn screens(rows: &[(&str, &str, &str, &str)]) -> Table {
        Table::from_rows(
            vec![
                "oem_id".into(),
                "x_resolution".into(),
                "y_resolution".into(),
                "display_diagonal".into(),
            ],
            rows.iter()
                .map(|(id, x, y, d)| vec![text(id), text(x), text(y), text(d)])
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn densest_display_picks_highest_density() {
        let table = screens(&[("A", "1080", "2400", "6.5"), ("B", "1440", "3200", "6.7")]);
        let top = densest_display(&table).unwrap().unwrap();

        assert_eq!(top.get("oem_id"), Some(&text("B")));
        let density = top.get(PIXEL_DENSITY).and_then(Value::as_f64).unwrap();
        let expected = (1440f64.powi(2) + 3200f64.powi(2)).sqrt() / 6.7;
        assert!((density - expected).abs() < 1e-9);
        assert!(!table.has_column(PIXEL_DENSITY));
    }

    #[test]
    fn zero_diagonal_is_excluded() {
        let table = screens(&[("A", "1080", "2400", "0"), ("B", "720", "1280", "6.1")]);
        let derived = with_pixel_density(&table).unwrap();
        assert_eq!(derived.records()[0].get(PIXEL_DENSITY), Some(&Value::Null));

        let top = densest_display(&table).unwrap().unwrap();
        assert_eq!(top.get("oem_id"), Some(&text("B")));
    }

    #[test]
    fn nan_resolution_never_wins() {
        let table = screens(&[("A", "NaN", "2400", "6.5"), ("B", "1440", "3200", "6.7")]);
        let derived = with_pixel_density(&table).unwrap();
        assert_eq!(derived.records()[0].get(PIXEL_DENSITY), Some(&Value::Null));

        let top = densest_display(&table).unwrap().unwrap();
        assert_eq!(top.get("oem_id"), Some(&text("B")));
    }

    #[test]
    fn non_finite_density_cell_is_skipped_in_ranking() {
        let table = Table::from_rows(
            vec!["oem_id".into(), PIXEL_DENSITY.into()],
            vec![
                vec![text("A"), Value::Float(f64::NAN)],
                vec![text("B"), Value::Float(400.0)],
            ],
        )
        .unwrap();
        let rec = &table.records()[0];
        assert_eq!(numeric(rec, PIXEL_DENSITY, 0).unwrap(), None);
        assert_eq!(numeric(&table.records()[1], PIXEL_DENSITY, 1).unwrap(), Some(400.0));
        assert_eq!(numeric(&table.records()[1], "oem_id", 1).unwrap_err(), AnalysisError::NotNumeric {
            field: "oem_id".into(),
            row: 1,
            value: "B".into(),
        });
    }

    #[test]
    fn no_usable_rows_gives_none() {
        let table = screens(&[("A", "1080", "2400", "0")]);
        assert!(densest_display(&table).unwrap().is_none());
        assert!(densest_display(&screens(&[])).unwrap().is_none());
    }

    #[test]
    fn missing_resolution_column_is_reported() {
        let table = Table::from_rows(vec!["oem_id".into()], vec![]).unwrap();
        assert_eq!(
            with_pixel_density(&table).unwrap_err(),
            AnalysisError::MissingColumn("x_resolution".into())
        );
    }

    #[test]
    fn reference_price_converts_foreign_currencies_only() {
        let table = Table::from_rows(
            vec!["price".into(), "price_currency".into()],
            vec![
                vec![Value::Integer(100), text("USD")],
                vec![Value::Integer(100), text("GBP")],
                vec![Value::Null, text("EUR")],
            ],
        )
        .unwrap();
        let priced = with_reference_price(&table, &CurrencyRate::default()).unwrap();
        let gbp: Vec<Value> = priced
            .iter()
            .map(|r| r.get(PRICE_GBP).cloned().unwrap())
            .collect();
        assert_eq!(gbp, [Value::Float(85.0), Value::Float(100.0), Value::Null]);
        assert!(!table.has_column(PRICE_GBP));
    }
}
