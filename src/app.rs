use anyhow::{Context, Result};
use log::{info, warn};
use serde::Serialize;

use crate::cli::{Args, ChartChoice, Command};
use crate::config::AnalysisConfig;
use crate::data::aggregate::{
    average_price_by_currency, average_weight_per_brand, pearson_correlation, price_trends,
    releases_per_year, top_values_in_group, weight_price_pairs,
};
use crate::data::derive::densest_display;
use crate::data::loader::{load_records, load_typed};
use crate::data::lookup::{by_codename, by_oem_id, by_ram_capacity, by_refresh_rate_above};
use crate::data::model::Table;
use crate::ui::chart::{
    average_weight_bar, price_trend_lines, ram_type_pie, usb_connector_bar, weight_price_scatter,
};
use crate::ui::{render_table, TableRow};

// ---------------------------------------------------------------------------
// Command runner
// ---------------------------------------------------------------------------

/// Load the table, run one command and return what should be printed.
pub fn run(args: &Args) -> Result<String> {
    let config = match &args.config {
        Some(path) => AnalysisConfig::from_file(path)?,
        None => AnalysisConfig::default(),
    };

    // Lookups and the strict year buckets work on the text as written in the
    // file; everything else wants typed columns.
    let raw = matches!(
        args.command,
        Command::Show { .. }
            | Command::Oem { .. }
            | Command::Codename { .. }
            | Command::Ram { .. }
            | Command::Refresh { .. }
            | Command::PerYear
    );
    let table = if raw {
        load_records(&args.data)
    } else {
        load_typed(&args.data)
    };
    if table.is_empty() {
        warn!("no records loaded from {}", args.data.display());
    }

    execute(&args.command, &table, &config, args.json)
}

/// Run one command against an already loaded table.
pub fn execute(command: &Command, table: &Table, config: &AnalysisConfig, json: bool) -> Result<String> {
    info!("running {command:?} over {} records", table.len());

    match command {
        Command::Show { limit } => {
            let head = &table.records()[..table.len().min(*limit)];
            emit(head, json)
        }
        Command::Oem { oem_id } => emit(&by_oem_id(table, oem_id), json),
        Command::Codename { codename } => emit(&by_codename(table.records(), codename)?, json),
        Command::Ram { capacity } => emit(&by_ram_capacity(table, capacity)?, json),
        Command::Refresh { above } => emit(&by_refresh_rate_above(table, *above)?, json),
        Command::TopRegions { brand } => {
            let top = top_values_in_group(
                table,
                "brand",
                brand,
                "market_regions",
                &config.region_delimiter,
                config.top_n,
            )?;
            emit(&top, json)
        }
        Command::AvgPrice { brand } => {
            let means: Vec<(String, f64)> =
                average_price_by_currency(table, brand)?.into_iter().collect();
            emit(&means, json)
        }
        Command::Densest => {
            let top: Vec<_> = densest_display(table)?.into_iter().collect();
            emit(&top, json)
        }
        Command::PerYear => emit(&releases_per_year(table)?, json),
        Command::Weights => {
            let means: Vec<(String, f64)> = average_weight_per_brand(table)?.into_iter().collect();
            emit(&means, json)
        }
        Command::Trends => {
            let (from, to) = config.trend_years;
            let trends = price_trends(table, &config.currency_rate(), from..=to)?;
            if json {
                return to_json(&trends);
            }
            let rows: Vec<(String, f64)> = trends
                .iter()
                .flat_map(|t| {
                    t.monthly_mean
                        .iter()
                        .map(move |(month, mean)| (format!("{}-{month:02}", t.year), *mean))
                })
                .collect();
            emit(&rows, false)
        }
        Command::Correlation => {
            let points = weight_price_pairs(table)?;
            let r = pearson_correlation(&points);
            let rows = vec![
                ("devices".to_string(), points.len().to_string()),
                (
                    "pearson_r".to_string(),
                    r.map_or_else(|| "undefined".to_string(), |r| format!("{r:.4}")),
                ),
            ];
            emit(&rows, json)
        }
        Command::Chart { kind } => chart(*kind, table, config),
    }
}

fn chart(kind: ChartChoice, table: &Table, config: &AnalysisConfig) -> Result<String> {
    match kind {
        ChartChoice::RamType => to_json(&ram_type_pie(table)?),
        ChartChoice::UsbConnector => to_json(&usb_connector_bar(table)?),
        ChartChoice::PriceTrends => {
            let (from, to) = config.trend_years;
            let trends = price_trends(table, &config.currency_rate(), from..=to)?;
            to_json(&price_trend_lines(&trends, &config.reference_currency))
        }
        ChartChoice::WeightPrice => to_json(&weight_price_scatter(&weight_price_pairs(table)?)),
        ChartChoice::AverageWeight => to_json(&average_weight_bar(&average_weight_per_brand(table)?)),
    }
}

fn emit<R: TableRow + Serialize>(rows: &[R], json: bool) -> Result<String> {
    if json {
        to_json(&rows)
    } else {
        Ok(render_table(rows))
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut text = serde_json::to_string_pretty(value).context("serialising result")?;
    text.push('\n');
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Value;

    fn devices() -> Table {
        let columns = ["oem_id", "brand", "weight", "price", "price_currency", "released_date"];
        let rows = [
            ["A-1", "Acme", "180", "500", "GBP", "01-03-21"],
            ["A-2", "Acme", "200", "600", "USD", "15-06-22"],
            ["B-1", "Bolt", "150", "300", "GBP", "20-06-22"],
        ];
        Table::from_rows(
            columns.iter().map(|c| c.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| Value::Text(c.to_string())).collect())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn per_year_renders_table() {
        let out = execute(&Command::PerYear, &devices(), &AnalysisConfig::default(), false).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "Year | Number of Devices");
        assert_eq!(lines[2], "2021 | 1                ");
        assert_eq!(lines[3], "2022 | 2                ");
    }

    #[test]
    fn weights_as_json() {
        let out = execute(&Command::Weights, &devices(), &AnalysisConfig::default(), true).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed[0][0], "Acme");
        assert_eq!(parsed[0][1], 190.0);
    }

    #[test]
    fn empty_lookup_prints_notice() {
        let out = execute(
            &Command::Oem {
                oem_id: "nope".into(),
            },
            &devices(),
            &AnalysisConfig::default(),
            false,
        )
        .unwrap();
        assert_eq!(out, "No data to display.\n");
    }

    #[test]
    fn analysis_errors_surface() {
        let err = execute(&Command::Densest, &devices(), &AnalysisConfig::default(), false)
            .unwrap_err();
        assert!(err.to_string().contains("x_resolution"));
    }
}
