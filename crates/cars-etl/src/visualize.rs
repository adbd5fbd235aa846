//! Visualization seam
//!
//! Chart rendering is an external collaborator: it consumes the final
//! enriched batch and feeds nothing back into the pipeline. The
//! orchestrator calls [`Visualizer::render`] after a successful load
//! and logs (never propagates) any failure — a bad chart can not
//! invalidate a committed batch.

use crate::model::{EnrichedListing, MileageCategory};
use cars_common::{EtlError, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Post-load consumer of the enriched batch
pub trait Visualizer {
    fn render(&self, rows: &[EnrichedListing]) -> Result<()>;
}

/// Visualizer that does nothing
pub struct NoopVisualizer;

impl Visualizer for NoopVisualizer {
    fn render(&self, _rows: &[EnrichedListing]) -> Result<()> {
        Ok(())
    }
}

/// Number of buckets in the price histogram report
const PRICE_HISTOGRAM_BUCKETS: usize = 30;

/// Writes the chart datasets as plain CSV aggregates into a reports
/// directory: price distribution, count by fuel type, price by
/// mileage category, and age-vs-price pairs. Rendering the aggregates
/// into images stays outside the pipeline.
pub struct SummaryReportVisualizer {
    out_dir: PathBuf,
}

impl SummaryReportVisualizer {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        SummaryReportVisualizer {
            out_dir: out_dir.into(),
        }
    }

    fn write_report<F>(&self, name: &str, header: &[&str], write_rows: F) -> Result<()>
    where
        F: FnOnce(&mut csv::Writer<std::fs::File>) -> Result<()>,
    {
        let path = self.out_dir.join(name);
        let mut writer = csv::Writer::from_path(&path)
            .map_err(|e| EtlError::Csv(format!("{}: {}", path.display(), e)))?;
        writer
            .write_record(header)
            .map_err(|e| EtlError::Csv(e.to_string()))?;
        write_rows(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    fn price_distribution(&self, rows: &[EnrichedListing]) -> Result<()> {
        let prices: Vec<f64> = rows.iter().map(|r| r.price_inr).collect();
        let min = prices.iter().copied().fold(f64::INFINITY, f64::min);
        let max = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let width = ((max - min) / PRICE_HISTOGRAM_BUCKETS as f64).max(1.0);

        let mut buckets = vec![0usize; PRICE_HISTOGRAM_BUCKETS];
        for price in &prices {
            let index = (((price - min) / width) as usize).min(PRICE_HISTOGRAM_BUCKETS - 1);
            buckets[index] += 1;
        }

        self.write_report("price_distribution.csv", &["bucket_start", "bucket_end", "count"], |w| {
            for (i, count) in buckets.iter().enumerate() {
                let start = min + width * i as f64;
                w.write_record([
                    start.to_string(),
                    (start + width).to_string(),
                    count.to_string(),
                ])
                .map_err(|e| EtlError::Csv(e.to_string()))?;
            }
            Ok(())
        })
    }

    fn fuel_type_distribution(&self, rows: &[EnrichedListing]) -> Result<()> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for row in rows {
            *counts.entry(row.listing.fuel_type.as_str()).or_default() += 1;
        }

        self.write_report("fuel_type_distribution.csv", &["fuel_type", "count"], |w| {
            for (fuel, count) in counts {
                w.write_record([fuel, &count.to_string()])
                    .map_err(|e| EtlError::Csv(e.to_string()))?;
            }
            Ok(())
        })
    }

    fn price_by_mileage(&self, rows: &[EnrichedListing]) -> Result<()> {
        let categories = [MileageCategory::Low, MileageCategory::Medium, MileageCategory::High];

        self.write_report(
            "price_by_mileage.csv",
            &["mileage_category", "count", "min_price_inr", "mean_price_inr", "max_price_inr"],
            |w| {
                for category in categories {
                    let prices: Vec<f64> = rows
                        .iter()
                        .filter(|r| r.mileage_category == category)
                        .map(|r| r.price_inr)
                        .collect();
                    if prices.is_empty() {
                        continue;
                    }
                    let min = prices.iter().copied().fold(f64::INFINITY, f64::min);
                    let max = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                    let mean = prices.iter().sum::<f64>() / prices.len() as f64;
                    w.write_record([
                        category.as_str().to_string(),
                        prices.len().to_string(),
                        min.to_string(),
                        mean.to_string(),
                        max.to_string(),
                    ])
                    .map_err(|e| EtlError::Csv(e.to_string()))?;
                }
                Ok(())
            },
        )
    }

    fn age_vs_price(&self, rows: &[EnrichedListing]) -> Result<()> {
        self.write_report("age_vs_price.csv", &["car_age", "price_inr", "fuel_type"], |w| {
            for row in rows {
                w.write_record([
                    row.car_age.to_string(),
                    row.price_inr.to_string(),
                    row.listing.fuel_type.clone(),
                ])
                .map_err(|e| EtlError::Csv(e.to_string()))?;
            }
            Ok(())
        })
    }
}

impl Visualizer for SummaryReportVisualizer {
    fn render(&self, rows: &[EnrichedListing]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        std::fs::create_dir_all(&self.out_dir)?;

        self.price_distribution(rows)?;
        self.fuel_type_distribution(rows)?;
        self.price_by_mileage(rows)?;
        self.age_vs_price(rows)?;

        debug!(dir = %self.out_dir.display(), "Wrote summary reports");
        Ok(())
    }
}

impl SummaryReportVisualizer {
    /// Directory the reports are written into
    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }
}
