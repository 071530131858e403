use std::collections::{BTreeMap, HashMap};
use std::ops::RangeInclusive;

use chrono::Datelike;
use log::{debug, error};
use serde::Serialize;

use super::dates::{parse_strict, STRICT_DATE_LABEL};
use super::derive::{day_first_date, numeric, with_reference_price, CurrencyRate, PRICE_GBP};
use super::loader::RELEASED_DATE;
use super::model::{Record, Table, Value};
use crate::error::{AnalysisError, AnalysisResult};

pub const TOP_N: usize = 5;
pub const REGION_DELIMITER: &str = ", ";

/// `(value, occurrences)` ordered by count, most frequent first.
pub type Frequencies = Vec<(String, usize)>;

/// Number of devices released in one calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearCount {
    pub year: i32,
    pub count: usize,
}

/// Monthly mean reference-currency price for one release year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceTrend {
    pub year: i32,
    pub monthly_mean: BTreeMap<u32, f64>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Text key of a grouping cell; missing cells form no group.
fn group_key(value: Option<&Value>) -> Option<String> {
    value.filter(|v| !v.is_missing()).map(Value::to_string)
}

/// Count values in encounter order, then sort by count descending. The sort
/// is stable, so ties keep the order in which values were first seen.
fn count_in_order<I: IntoIterator<Item = String>>(values: I) -> Frequencies {
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut counts: Frequencies = Vec::new();
    for value in values {
        match slots.get(&value) {
            Some(&i) => counts[i].1 += 1,
            None => {
                slots.insert(value.clone(), counts.len());
                counts.push((value, 1));
            }
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

#[derive(Default)]
struct Mean {
    sum: f64,
    n: usize,
}

impl Mean {
    fn push(&mut self, v: f64) {
        self.sum += v;
        self.n += 1;
    }

    fn value(&self) -> f64 {
        self.sum / self.n as f64
    }
}

fn finish(groups: BTreeMap<String, Mean>) -> BTreeMap<String, f64> {
    groups
        .into_iter()
        .filter(|(_, m)| m.n > 0)
        .map(|(k, m)| (k, m.value()))
        .collect()
}

// ---------------------------------------------------------------------------
// Frequencies
// ---------------------------------------------------------------------------

/// Frequency of every distinct value of `field`, most frequent first.
pub fn value_counts(table: &Table, field: &str) -> AnalysisResult<Frequencies> {
    table.require(&[field])?;
    Ok(count_in_order(
        table.iter().filter_map(|rec| group_key(rec.get(field))),
    ))
}

/// Among the records whose `group_field` equals `group_value`, split
/// `multi_field` on `delimiter` and return the `n` most frequent parts.
pub fn top_values_in_group(
    table: &Table,
    group_field: &str,
    group_value: &str,
    multi_field: &str,
    delimiter: &str,
    n: usize,
) -> AnalysisResult<Frequencies> {
    table.require(&[group_field, multi_field])?;

    let parts = table
        .matching(group_field, group_value)
        .filter_map(|rec| group_key(rec.get(multi_field)))
        .flat_map(|cell| {
            cell.split(delimiter)
                .map(str::to_string)
                .collect::<Vec<_>>()
        });

    let mut top = count_in_order(parts);
    top.truncate(n);
    Ok(top)
}

/// The five markets a brand is sold in most often.
pub fn top_regions_for_brand(table: &Table, brand: &str) -> AnalysisResult<Frequencies> {
    top_values_in_group(table, "brand", brand, "market_regions", REGION_DELIMITER, TOP_N)
}

// ---------------------------------------------------------------------------
// Means
// ---------------------------------------------------------------------------

/// Mean of `value_field` per `key_field`, over the records whose
/// `filter_field` equals `filter_value`. Keys without a single numeric value
/// are left out.
pub fn mean_by_group_within(
    table: &Table,
    filter_field: &str,
    filter_value: &str,
    key_field: &str,
    value_field: &str,
) -> AnalysisResult<BTreeMap<String, f64>> {
    table.require(&[filter_field, key_field, value_field])?;

    let mut groups: BTreeMap<String, Mean> = BTreeMap::new();
    for (row, rec) in table.iter().enumerate() {
        if !rec.get(filter_field).is_some_and(|v| v.matches(filter_value)) {
            continue;
        }
        accumulate(&mut groups, rec, row, key_field, value_field)?;
    }
    Ok(finish(groups))
}

/// Mean of `value_field` per `key_field` over the whole table.
pub fn mean_by_group(
    table: &Table,
    key_field: &str,
    value_field: &str,
) -> AnalysisResult<BTreeMap<String, f64>> {
    table.require(&[key_field, value_field])?;

    let mut groups: BTreeMap<String, Mean> = BTreeMap::new();
    for (row, rec) in table.iter().enumerate() {
        accumulate(&mut groups, rec, row, key_field, value_field)?;
    }
    Ok(finish(groups))
}

fn accumulate(
    groups: &mut BTreeMap<String, Mean>,
    rec: &Record,
    row: usize,
    key_field: &str,
    value_field: &str,
) -> AnalysisResult<()> {
    let Some(key) = group_key(rec.get(key_field)) else {
        return Ok(());
    };
    if let Some(v) = numeric(rec, value_field, row)? {
        groups.entry(key).or_default().push(v);
    }
    Ok(())
}

/// Average price of a brand's devices in each currency it is sold in.
pub fn average_price_by_currency(table: &Table, brand: &str) -> AnalysisResult<BTreeMap<String, f64>> {
    mean_by_group_within(table, "brand", brand, "price_currency", "price")
}

/// Average device weight per brand.
pub fn average_weight_per_brand(table: &Table) -> AnalysisResult<BTreeMap<String, f64>> {
    mean_by_group(table, "brand", "weight")
}

// ---------------------------------------------------------------------------
// Date buckets
// ---------------------------------------------------------------------------

/// Devices released per year, ascending by year.
///
/// `released_date` text must follow `DD-MM-YY`. Cells in another layout are
/// skipped; when no cell at all can be read the column is considered to be in
/// the wrong format and the whole aggregation fails. Cells already holding a
/// date count toward their year.
pub fn releases_per_year(table: &Table) -> AnalysisResult<Vec<YearCount>> {
    table.require(&[RELEASED_DATE])?;

    let mut years: BTreeMap<i32, usize> = BTreeMap::new();
    let mut present = 0usize;
    for rec in table.iter() {
        let Some(value) = rec.get(RELEASED_DATE).filter(|v| !v.is_missing()) else {
            continue;
        };
        present += 1;
        let year = match value {
            Value::Date(d) => Some(d.year()),
            Value::Text(s) => parse_strict(s).map(|d| d.year()),
            _ => None,
        };
        if let Some(year) = year {
            *years.entry(year).or_default() += 1;
        }
    }

    let parsed: usize = years.values().sum();
    if present > 0 && parsed == 0 {
        let err = AnalysisError::DateFormat {
            column: RELEASED_DATE.to_string(),
            format: STRICT_DATE_LABEL.to_string(),
        };
        error!("{err}");
        return Err(err);
    }
    if parsed < present {
        debug!("{} release dates skipped, not in {STRICT_DATE_LABEL}", present - parsed);
    }

    Ok(years
        .into_iter()
        .map(|(year, count)| YearCount { year, count })
        .collect())
}

/// Mean `price_gbp` per release month for devices released in `year`.
/// The table must already carry `price_gbp`.
pub fn monthly_average_price(table: &Table, year: i32) -> AnalysisResult<BTreeMap<u32, f64>> {
    table.require(&[RELEASED_DATE, PRICE_GBP])?;

    let mut months: BTreeMap<u32, Mean> = BTreeMap::new();
    for (row, rec) in table.iter().enumerate() {
        let Some(date) = rec.get(RELEASED_DATE).and_then(day_first_date) else {
            continue;
        };
        if date.year() != year {
            continue;
        }
        if let Some(price) = numeric(rec, PRICE_GBP, row)? {
            months.entry(date.month()).or_default().push(price);
        }
    }

    Ok(months
        .into_iter()
        .map(|(month, m)| (month, m.value()))
        .collect())
}

/// Normalise prices into the reference currency and compute the monthly
/// mean for each year in `years`. Years without releases are still listed,
/// with an empty series.
pub fn price_trends(
    table: &Table,
    rate: &CurrencyRate,
    years: RangeInclusive<i32>,
) -> AnalysisResult<Vec<PriceTrend>> {
    let priced = with_reference_price(table, rate)?;
    years
        .map(|year| {
            Ok(PriceTrend {
                year,
                monthly_mean: monthly_average_price(&priced, year)?,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Weight vs. price
// ---------------------------------------------------------------------------

/// `(weight, price)` points for every device that has both.
pub fn weight_price_pairs(table: &Table) -> AnalysisResult<Vec<(f64, f64)>> {
    table.require(&["weight", "price"])?;

    let mut points = Vec::with_capacity(table.len());
    for (row, rec) in table.iter().enumerate() {
        if let (Some(w), Some(p)) = (numeric(rec, "weight", row)?, numeric(rec, "price", row)?) {
            points.push((w, p));
        }
    }
    Ok(points)
}

/// Pearson correlation coefficient of the points. `None` with fewer than two
/// points or when either axis is constant.
pub fn pearson_correlation(points: &[(f64, f64)]) -> Option<f64> {
    if points.len() < 2 {
        return None;
    }
    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for &(x, y) in points {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    fn table(columns: &[&str], rows: &[&[&str]]) -> Table {
        Table::from_rows(
            columns.iter().map(|c| c.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| text(c)).collect())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn top_regions_counts_split_values() {
        let t = table(
            &["brand", "market_regions"],
            &[
                &["X", "EU, US"],
                &["X", "US"],
                &["Y", "US, LATAM"],
                &["X", "EU, APAC"],
            ],
        );
        let top = top_regions_for_brand(&t, "X").unwrap();
        let counts: HashMap<_, _> = top.iter().cloned().collect();

        assert_eq!(top.len(), 3);
        assert_eq!(counts["US"], 2);
        assert_eq!(counts["EU"], 2);
        assert_eq!(counts["APAC"], 1);
        assert_eq!(top[2], ("APAC".to_string(), 1));
        // first encountered wins the tie
        assert_eq!(top[0].0, "EU");
    }

    #[test]
    fn top_regions_keeps_five() {
        let t = table(
            &["brand", "market_regions"],
            &[&["X", "A, B, C, D, E, F"], &["X", "F"]],
        );
        let top = top_regions_for_brand(&t, "X").unwrap();
        assert_eq!(top.len(), 5);
        assert_eq!(top[0], ("F".to_string(), 2));
        assert!(top_regions_for_brand(&t, "nobody").unwrap().is_empty());
    }

    #[test]
    fn mean_price_by_currency_omits_absent_currencies() {
        let t = table(
            &["brand", "price", "price_currency"],
            &[
                &["Y", "100", "USD"],
                &["Y", "200", "USD"],
                &["Y", "50", "EUR"],
                &["Z", "999", "GBP"],
            ],
        );
        let means = average_price_by_currency(&t, "Y").unwrap();
        assert_eq!(means.len(), 2);
        assert_eq!(means["USD"], 150.0);
        assert_eq!(means["EUR"], 50.0);
        assert!(!means.contains_key("GBP"));
    }

    #[test]
    fn mean_skips_na_prices() {
        let t = table(
            &["brand", "price", "price_currency"],
            &[&["Y", "100", "USD"], &["Y", "NaN", "USD"], &["Y", "N/A", "EUR"]],
        );
        let means = average_price_by_currency(&t, "Y").unwrap();
        assert_eq!(means.len(), 1);
        assert_eq!(means["USD"], 100.0);

        let w = table(&["weight", "price"], &[&["150", "NaN"], &["180", "300"]]);
        assert_eq!(weight_price_pairs(&w).unwrap(), [(180.0, 300.0)]);
    }

    #[test]
    fn mean_rejects_non_numeric_values() {
        let t = table(
            &["brand", "price", "price_currency"],
            &[&["Y", "cheap", "USD"]],
        );
        assert!(matches!(
            average_price_by_currency(&t, "Y"),
            Err(AnalysisError::NotNumeric { row: 0, .. })
        ));
    }

    #[test]
    fn weight_per_brand_skips_missing() {
        let t = table(
            &["brand", "weight"],
            &[&["A", "100"], &["A", "200"], &["B", ""], &["C", "180"]],
        );
        let means = average_weight_per_brand(&t).unwrap();
        assert_eq!(means["A"], 150.0);
        assert_eq!(means["C"], 180.0);
        assert!(!means.contains_key("B"));
    }

    #[test]
    fn releases_per_year_buckets_strict_dates() {
        let t = table(&["released_date"], &[&["01-01-20"], &["15-06-21"], &["20-06-21"]]);
        assert_eq!(
            releases_per_year(&t).unwrap(),
            [
                YearCount { year: 2020, count: 1 },
                YearCount { year: 2021, count: 2 }
            ]
        );
    }

    #[test]
    fn releases_per_year_skips_stray_rows() {
        let t = table(&["released_date"], &[&["01-01-20"], &["2021-06-15"], &[""]]);
        assert_eq!(
            releases_per_year(&t).unwrap(),
            [YearCount { year: 2020, count: 1 }]
        );
    }

    #[test]
    fn releases_per_year_rejects_wrong_column_format() {
        let t = table(&["released_date"], &[&["2020-01-01"], &["2021-06-15"]]);
        assert_eq!(
            releases_per_year(&t).unwrap_err(),
            AnalysisError::DateFormat {
                column: "released_date".into(),
                format: "DD-MM-YY".into()
            }
        );
        assert!(releases_per_year(&table(&["released_date"], &[])).unwrap().is_empty());
    }

    #[test]
    fn price_trends_average_per_month() {
        let t = table(
            &["price", "price_currency", "released_date"],
            &[
                &["100", "GBP", "10-03-2021"],
                &["300", "GBP", "25-03-2021"],
                &["100", "USD", "01-07-2021"],
                &["500", "GBP", "01-07-2022"],
                &["700", "GBP", "unknown"],
            ],
        );
        let trends = price_trends(&t, &CurrencyRate::default(), 2020..=2022).unwrap();
        assert_eq!(trends.len(), 3);
        assert!(trends[0].monthly_mean.is_empty());
        assert_eq!(trends[1].year, 2021);
        assert_eq!(trends[1].monthly_mean[&3], 200.0);
        assert_eq!(trends[1].monthly_mean[&7], 85.0);
        assert_eq!(trends[2].monthly_mean.len(), 1);
    }

    #[test]
    fn value_counts_orders_by_frequency() {
        let t = table(
            &["usb_connector"],
            &[&["USB-C"], &["micro-USB"], &["USB-C"], &[""]],
        );
        assert_eq!(
            value_counts(&t, "usb_connector").unwrap(),
            [("USB-C".to_string(), 2), ("micro-USB".to_string(), 1)]
        );
        assert_eq!(
            value_counts(&t, "ram_type").unwrap_err(),
            AnalysisError::MissingColumn("ram_type".into())
        );
    }

    #[test]
    fn weight_price_correlation() {
        let t = table(
            &["weight", "price"],
            &[&["100", "200"], &["150", "300"], &["", "50"], &["200", "400"]],
        );
        let points = weight_price_pairs(&t).unwrap();
        assert_eq!(points.len(), 3);
        let r = pearson_correlation(&points).unwrap();
        assert!((r - 1.0).abs() < 1e-12);

        assert_eq!(pearson_correlation(&points[..1]), None);
        assert_eq!(pearson_correlation(&[(1.0, 2.0), (1.0, 3.0)]), None);
        assert_eq!(
            weight_price_pairs(&table(&["weight"], &[])).unwrap_err(),
            AnalysisError::MissingColumn("price".into())
        );
    }
}
