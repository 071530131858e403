use crate::data::aggregate::YearCount;
use crate::data::lookup::{CodenameMatch, DeviceSummary, RamMatch, RefreshRateMatch};
use crate::data::model::{Record, Value};

pub const NO_DATA: &str = "No data to display.";

// ---------------------------------------------------------------------------
// Rows the table renderer understands
// ---------------------------------------------------------------------------

/// Anything that can be printed as one line of an aligned table.
pub trait TableRow {
    fn headers(&self) -> Vec<String>;
    fn cells(&self) -> Vec<String>;
}

fn cell(value: &Option<Value>) -> String {
    value.as_ref().map_or_else(|| "None".to_string(), Value::to_string)
}

fn headers(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

impl TableRow for Record {
    fn headers(&self) -> Vec<String> {
        self.columns().to_vec()
    }

    fn cells(&self) -> Vec<String> {
        self.values().iter().map(Value::to_string).collect()
    }
}

impl TableRow for DeviceSummary {
    fn headers(&self) -> Vec<String> {
        headers(&["model_name", "manufacturer", "weight", "price", "price_unit"])
    }

    fn cells(&self) -> Vec<String> {
        [
            &self.model_name,
            &self.manufacturer,
            &self.weight,
            &self.price,
            &self.price_unit,
        ]
        .into_iter()
        .map(cell)
        .collect()
    }
}

impl TableRow for CodenameMatch {
    fn headers(&self) -> Vec<String> {
        headers(&["brand", "model_name", "ram_capacity", "market_regions", "info_added_date"])
    }

    fn cells(&self) -> Vec<String> {
        [
            &self.brand,
            &self.model_name,
            &self.ram_capacity,
            &self.market_regions,
            &self.info_added_date,
        ]
        .into_iter()
        .map(cell)
        .collect()
    }
}

impl TableRow for RamMatch {
    fn headers(&self) -> Vec<String> {
        headers(&["oem_id", "released_date", "announced_date", "dimensions", "device_category"])
    }

    fn cells(&self) -> Vec<String> {
        [
            &self.oem_id,
            &self.released_date,
            &self.announced_date,
            &self.dimensions,
            &self.device_category,
        ]
        .into_iter()
        .map(Value::to_string)
        .collect()
    }
}

impl TableRow for RefreshRateMatch {
    fn headers(&self) -> Vec<String> {
        headers(&["oem_id", "display_refresh_rate", "display_type", "market_regions"])
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.oem_id.to_string(),
            self.display_refresh_rate.to_string(),
            self.display_type.to_string(),
            self.market_regions.to_string(),
        ]
    }
}

impl TableRow for YearCount {
    fn headers(&self) -> Vec<String> {
        headers(&["Year", "Number of Devices"])
    }

    fn cells(&self) -> Vec<String> {
        vec![self.year.to_string(), self.count.to_string()]
    }
}

/// `(key, value)` pairs from aggregate results, e.g. region counts.
impl<V: ToString> TableRow for (String, V) {
    fn headers(&self) -> Vec<String> {
        headers(&["key", "value"])
    }

    fn cells(&self) -> Vec<String> {
        vec![self.0.clone(), self.1.to_string()]
    }
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Render rows as a left-aligned text table.
///
/// The header comes from the first row. Every column is as wide as its
/// header or its longest cell, whichever is longer:
///
/// ```text
/// brand | weight
/// ------+-------
/// Acme  | 180
/// ```
pub fn render_table<R: TableRow>(rows: &[R]) -> String {
    let Some(first) = rows.first() else {
        return format!("{NO_DATA}\n");
    };

    let headers = first.headers();
    let cells: Vec<Vec<String>> = rows.iter().map(TableRow::cells).collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            cells
                .iter()
                .filter_map(|row| row.get(i))
                .map(|c| c.chars().count())
                .fold(h.chars().count(), usize::max)
        })
        .collect();

    let line = |row: &[String]| -> String {
        row.iter()
            .zip(&widths)
            .map(|(c, &w)| format!("{c:<w$}"))
            .collect::<Vec<_>>()
            .join(" | ")
    };

    let mut out = String::new();
    out.push_str(&line(&headers));
    out.push('\n');
    out.push_str(
        &widths
            .iter()
            .map(|&w| "-".repeat(w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    out.push('\n');
    for row in &cells {
        out.push_str(&line(row));
        out.push('\n');
    }
    out.push('\n');
    out
}
