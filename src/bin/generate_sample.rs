use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Duration, NaiveDate};
use parquet::arrow::ArrowWriter;

const ROWS: usize = 500;

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
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// One generated order.
struct Order {
    ordered_at: String,
    region: &'static str,
    product: &'static str,
    units: i64,
    /// Missing for a few orders so the charts show the gaps.
    revenue: Option<f64>,
}

fn generate(rng: &mut SimpleRng) -> Result<Vec<Order>> {
    let regions = ["North", "South", "East", "West", "Central"];
    let products = [
        ("Widget", 12.5),
        ("Gadget", 30.0),
        ("Doohickey", 4.75),
        ("Gizmo", 55.0),
        ("Thingamajig", 8.0),
    ];
    let start = NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(8, 0, 0))
        .context("invalid start date")?;

    let orders = (0..ROWS)
        .map(|i| {
            let day = rng.below(90) as i64;
            let minute = rng.below(10 * 60) as i64;
            let ordered_at = start + Duration::days(day) + Duration::minutes(minute);
            let (product, price) = products[rng.below(products.len())];
            let units = 1 + rng.below(20) as i64;
            let revenue = (i % 37 != 0)
                .then(|| (units as f64 * price * rng.gauss(1.0, 0.05) * 100.0).round() / 100.0);
            Order {
                ordered_at: ordered_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                region: regions[rng.below(regions.len())],
                product,
                units,
                revenue,
            }
        })
        .collect();
    Ok(orders)
}

fn write_csv(path: &str, orders: &[Order]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    writer.write_record(["ordered_at", "region", "product", "units", "revenue"])?;
    for order in orders {
        let units = order.units.to_string();
        let revenue = order.revenue.map(|r| r.to_string()).unwrap_or_default();
        writer.write_record([
            order.ordered_at.as_str(),
            order.region,
            order.product,
            units.as_str(),
            revenue.as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &str, orders: &[Order]) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("ordered_at", DataType::Utf8, false),
        Field::new("region", DataType::Utf8, false),
        Field::new("product", DataType::Utf8, false),
        Field::new("units", DataType::Int64, false),
        Field::new("revenue", DataType::Float64, true),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from_iter_values(
                orders.iter().map(|o| o.ordered_at.as_str()),
            )),
            Arc::new(StringArray::from_iter_values(orders.iter().map(|o| o.region))),
            Arc::new(StringArray::from_iter_values(orders.iter().map(|o| o.product))),
            Arc::new(Int64Array::from_iter_values(orders.iter().map(|o| o.units))),
            Arc::new(Float64Array::from(
                orders.iter().map(|o| o.revenue).collect::<Vec<_>>(),
            )),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let orders = generate(&mut rng)?;

    write_csv("sample_sales.csv", &orders)?;
    write_parquet("sample_sales.parquet", &orders)?;

    println!(
        "Wrote {} orders to sample_sales.csv and sample_sales.parquet",
        orders.len()
    );
    Ok(())
}
