use std::fs::File;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use serde::Serialize;

const BRANDS: &[(&str, &str, &str)] = &[
    ("Acme", "Acme Corp", "USD"),
    ("Bolt", "Bolt Mobile Ltd", "EUR"),
    ("Crest", "Crest Devices plc", "GBP"),
    ("Dyna", "Dyna Electronics", "USD"),
];
const REGIONS: &[&str] = &["EU", "US", "APAC", "LATAM", "MEA", "UK"];
const RAM_TYPES: &[&str] = &["LPDDR4X", "LPDDR5", "LPDDR5X"];
const USB: &[&str] = &["USB-C", "USB-C 3.2", "micro-USB", "Lightning"];
const PANELS: &[(&str, i64)] = &[("LCD", 60), ("OLED", 90), ("AMOLED", 120), ("LTPO OLED", 144)];
const RESOLUTIONS: &[(i64, i64)] = &[(720, 1600), (1080, 2400), (1440, 3200)];

/// One generated row; field order is the CSV column order.
#[derive(Debug, Serialize)]
struct Device {
    oem_id: String,
    codename: String,
    brand: String,
    model: String,
    model_name: String,
    manufacturer: String,
    weight: i64,
    price: f64,
    price_currency: String,
    price_unit: String,
    ram_capacity: i64,
    ram_type: String,
    market_regions: String,
    info_added_date: String,
    released_date: String,
    announced_date: String,
    dimensions: String,
    device_category: String,
    display_refresh_rate: i64,
    display_type: String,
    x_resolution: i64,
    y_resolution: i64,
    display_diagonal: f64,
    usb_connector: String,
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.below(items.len())]
    }

    fn between(&mut self, lo: i64, hi: i64) -> i64 {
        lo + self.below((hi - lo + 1) as usize) as i64
    }
}

fn generate(rng: &mut SimpleRng, n: usize) -> Vec<Device> {
    (0..n)
        .map(|i| {
            let &(brand, manufacturer, currency) = rng.pick(BRANDS);
            let &(panel, refresh) = rng.pick(PANELS);
            let &(x, y) = rng.pick(RESOLUTIONS);

            let n_regions = rng.between(1, 3) as usize;
            let mut regions: Vec<&str> = Vec::with_capacity(n_regions);
            while regions.len() < n_regions {
                let r = *rng.pick(REGIONS);
                if !regions.contains(&r) {
                    regions.push(r);
                }
            }

            let year = rng.between(20, 23);
            let month = rng.between(1, 12);
            let day = rng.between(1, 28);
            let diagonal = 5.5 + rng.between(0, 14) as f64 / 10.0;
            let weight = rng.between(140, 240);

            Device {
                oem_id: format!("{}-{:04}", &brand[..1], i),
                codename: format!("{}{}", brand.to_ascii_lowercase(), i % 7),
                brand: brand.to_string(),
                model: format!("{brand} {}", 10 + i % 5),
                model_name: format!("{brand} {} {panel}", 10 + i % 5),
                manufacturer: manufacturer.to_string(),
                weight,
                price: (199 + rng.between(0, 1000)) as f64 - 0.01,
                price_currency: currency.to_string(),
                price_unit: currency.to_string(),
                ram_capacity: *rng.pick(&[4, 6, 8, 12, 16]),
                ram_type: rng.pick(RAM_TYPES).to_string(),
                market_regions: regions.join(", "),
                info_added_date: format!("{:02}-{:02}-{year}", (day + 2).min(28), month),
                released_date: format!("{day:02}-{month:02}-{year}"),
                announced_date: format!("{:02}-{:02}-{year}", day, (month - 1).max(1)),
                dimensions: format!("{}x{}x{}", 145 + i % 20, 68 + i % 8, 7 + i % 3),
                device_category: if diagonal > 6.6 { "phablet" } else { "smartphone" }.to_string(),
                display_refresh_rate: refresh,
                display_type: panel.to_string(),
                x_resolution: x,
                y_resolution: y,
                display_diagonal: diagonal,
                usb_connector: rng.pick(USB).to_string(),
            }
        })
        .collect()
}

fn write_csv(devices: &[Device], path: &str) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    for device in devices {
        writer.serialize(device)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(devices: &[Device], path: &str) -> Result<()> {
    fn text<F: Fn(&Device) -> &str>(devices: &[Device], f: F) -> ArrayRef {
        Arc::new(StringArray::from(devices.iter().map(f).collect::<Vec<_>>()))
    }
    fn int<F: Fn(&Device) -> i64>(devices: &[Device], f: F) -> ArrayRef {
        Arc::new(Int64Array::from(devices.iter().map(f).collect::<Vec<_>>()))
    }
    fn float<F: Fn(&Device) -> f64>(devices: &[Device], f: F) -> ArrayRef {
        Arc::new(Float64Array::from(devices.iter().map(f).collect::<Vec<_>>()))
    }

    let columns: Vec<(&str, ArrayRef)> = vec![
        ("oem_id", text(devices, |d| d.oem_id.as_str())),
        ("codename", text(devices, |d| d.codename.as_str())),
        ("brand", text(devices, |d| d.brand.as_str())),
        ("model", text(devices, |d| d.model.as_str())),
        ("model_name", text(devices, |d| d.model_name.as_str())),
        ("manufacturer", text(devices, |d| d.manufacturer.as_str())),
        ("weight", int(devices, |d| d.weight)),
        ("price", float(devices, |d| d.price)),
        ("price_currency", text(devices, |d| d.price_currency.as_str())),
        ("price_unit", text(devices, |d| d.price_unit.as_str())),
        ("ram_capacity", int(devices, |d| d.ram_capacity)),
        ("ram_type", text(devices, |d| d.ram_type.as_str())),
        ("market_regions", text(devices, |d| d.market_regions.as_str())),
        ("info_added_date", text(devices, |d| d.info_added_date.as_str())),
        ("released_date", text(devices, |d| d.released_date.as_str())),
        ("announced_date", text(devices, |d| d.announced_date.as_str())),
        ("dimensions", text(devices, |d| d.dimensions.as_str())),
        ("device_category", text(devices, |d| d.device_category.as_str())),
        ("display_refresh_rate", int(devices, |d| d.display_refresh_rate)),
        ("display_type", text(devices, |d| d.display_type.as_str())),
        ("x_resolution", int(devices, |d| d.x_resolution)),
        ("y_resolution", int(devices, |d| d.y_resolution)),
        ("display_diagonal", float(devices, |d| d.display_diagonal)),
        ("usb_connector", text(devices, |d| d.usb_connector.as_str())),
    ];

    let schema = Arc::new(Schema::new(
        columns
            .iter()
            .map(|(name, array)| Field::new(*name, array.data_type().clone(), false))
            .collect::<Vec<_>>(),
    ));

    let batch = RecordBatch::try_new(
        schema.clone(),
        columns.into_iter().map(|(_, array)| array).collect(),
    )
    .context("building record batch")?;

    let file = File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let mut rng = SimpleRng::new(42);
    let devices = generate(&mut rng, 200);

    write_csv(&devices, "devices.csv")?;
    write_parquet(&devices, "devices.parquet")?;

    println!(
        "Wrote {} devices to devices.csv and devices.parquet",
        devices.len()
    );
    Ok(())
}
