use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Device table: .csv, .json or .parquet
    #[arg(long, short, default_value = "devices.csv")]
    pub data: PathBuf,

    /// JSON file overriding the analysis defaults
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print results as JSON instead of a text table
    #[arg(long)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Print the first records of the table
    Show {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Devices with the given OEM identifier
    Oem { oem_id: String },
    /// Devices with the given codename
    Codename { codename: String },
    /// Devices with the given RAM capacity
    Ram { capacity: String },
    /// Devices whose display refreshes faster than a threshold
    Refresh {
        #[arg(long, default_value_t = 90)]
        above: i64,
    },
    /// Most common market regions of a brand
    TopRegions { brand: String },
    /// Average price of a brand per currency
    AvgPrice { brand: String },
    /// Device with the highest pixel density
    Densest,
    /// Number of devices released per year
    PerYear,
    /// Average weight per brand
    Weights,
    /// Monthly average reference-currency price per year
    Trends,
    /// Correlation between weight and price
    Correlation,
    /// Emit a chart specification as JSON
    Chart {
        #[arg(value_enum)]
        kind: ChartChoice,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartChoice {
    RamType,
    UsbConnector,
    PriceTrends,
    WeightPrice,
    AverageWeight,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_subcommand_and_globals() {
        let args = Args::try_parse_from([
            "device-stats",
            "--data",
            "phones.csv",
            "--json",
            "refresh",
            "--above",
            "120",
        ])
        .unwrap();
        assert_eq!(args.data, PathBuf::from("phones.csv"));
        assert!(args.json);
        assert_eq!(args.command, Command::Refresh { above: 120 });
    }

    #[test]
    fn chart_kind_is_kebab_case() {
        let args = Args::try_parse_from(["device-stats", "chart", "usb-connector"]).unwrap();
        assert_eq!(
            args.command,
            Command::Chart {
                kind: ChartChoice::UsbConnector
            }
        );
        assert_eq!(args.data, PathBuf::from("devices.csv"));
    }
}
