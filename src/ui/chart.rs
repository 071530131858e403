use std::collections::BTreeMap;

use serde::Serialize;

use crate::data::aggregate::{value_counts, Frequencies, PriceTrend};
use crate::data::model::Table;
use crate::error::AnalysisResult;

// ---------------------------------------------------------------------------
// Chart specifications handed to an external renderer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Pie,
    Bar,
    Line,
    Scatter,
}

/// The data behind a chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChartData {
    /// One value per category label (pie and bar charts).
    Categories { labels: Vec<String>, values: Vec<f64> },
    /// Two parallel numeric sequences.
    Points { x: Vec<f64>, y: Vec<f64> },
}

/// Everything a renderer needs to draw one labelled chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub data: ChartData,
}

impl ChartSpec {
    fn new(kind: ChartKind, title: impl Into<String>, data: ChartData) -> Self {
        ChartSpec {
            kind,
            title: title.into(),
            x_label: None,
            y_label: None,
            data,
        }
    }

    fn labels(mut self, x: &str, y: &str) -> Self {
        self.x_label = Some(x.to_string());
        self.y_label = Some(y.to_string());
        self
    }
}

fn categories(freq: Frequencies) -> ChartData {
    let (labels, values) = freq.into_iter().map(|(k, n)| (k, n as f64)).unzip();
    ChartData::Categories { labels, values }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// Share of each `ram_type`.
pub fn ram_type_pie(table: &Table) -> AnalysisResult<ChartSpec> {
    Ok(ChartSpec::new(
        ChartKind::Pie,
        "Proportion of RAM Types for Devices in the Current Market",
        categories(value_counts(table, "ram_type")?),
    ))
}

/// Device count per `usb_connector`, most common first.
pub fn usb_connector_bar(table: &Table) -> AnalysisResult<ChartSpec> {
    Ok(ChartSpec::new(
        ChartKind::Bar,
        "Number of Devices for Each USB Connector Type",
        categories(value_counts(table, "usb_connector")?),
    )
    .labels("USB Connector Type", "Number of Devices"))
}

/// One line chart per year: month on x, mean price on y.
pub fn price_trend_lines(trends: &[PriceTrend], currency: &str) -> Vec<ChartSpec> {
    trends
        .iter()
        .map(|trend| {
            let (x, y) = trend
                .monthly_mean
                .iter()
                .map(|(&month, &mean)| (month as f64, mean))
                .unzip();
            ChartSpec::new(
                ChartKind::Line,
                format!("Monthly Average Price Trends ({currency}) - {}", trend.year),
                ChartData::Points { x, y },
            )
            .labels("Month", &format!("Average Price ({currency})"))
        })
        .collect()
}

pub fn weight_price_scatter(points: &[(f64, f64)]) -> ChartSpec {
    let (x, y) = points.iter().copied().unzip();
    ChartSpec::new(
        ChartKind::Scatter,
        "Scatter Plot: Device Weight vs. Price",
        ChartData::Points { x, y },
    )
    .labels("Device Weight (grams)", "Device Price")
}

pub fn average_weight_bar(means: &BTreeMap<String, f64>) -> ChartSpec {
    let (labels, values) = means.iter().map(|(k, &v)| (k.clone(), v)).unzip();
    ChartSpec::new(
        ChartKind::Bar,
        "Average Weight of Devices per Brand",
        ChartData::Categories { labels, values },
    )
    .labels("Brand", "Average Weight (grams)")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Value;

    #[test]
    fn usb_bar_carries_counts() {
        let table = Table::from_rows(
            vec!["usb_connector".into()],
            ["USB-C", "USB-C", "Lightning"]
                .iter()
                .map(|c| vec![Value::Text(c.to_string())])
                .collect(),
        )
        .unwrap();

        let spec = usb_connector_bar(&table).unwrap();
        assert_eq!(spec.kind, ChartKind::Bar);
        assert_eq!(
            spec.data,
            ChartData::Categories {
                labels: vec!["USB-C".into(), "Lightning".into()],
                values: vec![2.0, 1.0],
            }
        );
        assert!(ram_type_pie(&table).is_err());
    }

    #[test]
    fn trend_lines_one_per_year() {
        let trends = vec![
            PriceTrend {
                year: 2020,
                monthly_mean: BTreeMap::from([(1, 100.0), (5, 120.0)]),
            },
            PriceTrend {
                year: 2021,
                monthly_mean: BTreeMap::new(),
            },
        ];
        let specs = price_trend_lines(&trends, "GBP");
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].title, "Monthly Average Price Trends (GBP) - 2020");
        assert_eq!(
            specs[0].data,
            ChartData::Points {
                x: vec![1.0, 5.0],
                y: vec![100.0, 120.0]
            }
        );
    }

    #[test]
    fn spec_serialises_for_renderer() {
        let spec = weight_price_scatter(&[(150.0, 300.0)]);
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["kind"], "scatter");
        assert_eq!(json["data"]["type"], "points");
        assert_eq!(json["data"]["x"][0], 150.0);
        assert_eq!(json["x_label"], "Device Weight (grams)");
    }
}
