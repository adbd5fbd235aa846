//! Transformer
//!
//! Pure function of a raw batch, an exchange rate, and the current
//! year. No I/O and no ledger access, so the whole step is trivially
//! testable with an injected clock.
//!
//! Steps, in order: positional column mapping onto the canonical
//! schema, cleaning (null-bearing rows and exact duplicates dropped,
//! survivor order preserved), then the four derived fields. Rows with
//! zero mileage are excluded when deriving `Price_per_km` rather than
//! carrying a sentinel or failing the batch; the count is reported in
//! [`TransformStats`].

use crate::model::{EnrichedListing, Listing, MileageCategory, RawBatch, RawRow, CANONICAL_COLUMNS};
use cars_common::{EtlError, Result};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Row accounting for one transform pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformStats {
    /// Rows in the incoming batch
    pub input_rows: usize,

    /// Rows dropped for a null or unparseable field
    pub dropped_invalid: usize,

    /// Rows dropped as exact duplicates of an earlier row
    pub dropped_duplicate: usize,

    /// Rows dropped because mileage was zero (Price_per_km undefined)
    pub dropped_zero_mileage: usize,
}

/// A transformed batch plus its row accounting
#[derive(Debug, Clone)]
pub struct EnrichedBatch {
    pub rows: Vec<EnrichedListing>,
    pub stats: TransformStats,
}

/// Clean a raw batch and derive the enrichment columns.
///
/// `current_year` is the wall-clock year at transform time, passed in
/// by the caller so tests can pin it.
pub fn transform(batch: &RawBatch, rate: f64, current_year: i64) -> Result<EnrichedBatch> {
    let mut stats = TransformStats {
        input_rows: batch.rows.len(),
        ..TransformStats::default()
    };

    let mut seen: HashSet<RawRow> = HashSet::new();
    let mut rows: Vec<EnrichedListing> = Vec::new();

    for (index, raw) in batch.rows.iter().enumerate() {
        if raw.len() != CANONICAL_COLUMNS.len() {
            return Err(EtlError::Schema {
                file: format!("batch row {}", index),
                expected: CANONICAL_COLUMNS.len(),
                actual: raw.len(),
            });
        }

        let Some(listing) = parse_listing(raw) else {
            stats.dropped_invalid += 1;
            continue;
        };

        if !seen.insert(raw.clone()) {
            stats.dropped_duplicate += 1;
            continue;
        }

        if listing.mileage == 0.0 {
            warn!(
                manufacturer = %listing.manufacturer,
                model = %listing.model,
                "Zero mileage, Price_per_km undefined; excluding row"
            );
            stats.dropped_zero_mileage += 1;
            continue;
        }

        rows.push(enrich(listing, rate, current_year));
    }

    debug!(
        input = stats.input_rows,
        output = rows.len(),
        dropped_invalid = stats.dropped_invalid,
        dropped_duplicate = stats.dropped_duplicate,
        dropped_zero_mileage = stats.dropped_zero_mileage,
        "Transformed batch"
    );

    Ok(EnrichedBatch { rows, stats })
}

/// Map a positional raw row onto the canonical listing shape.
///
/// Returns None for any null (empty) or unparseable field; such rows
/// are dropped during cleaning.
fn parse_listing(raw: &RawRow) -> Option<Listing> {
    let text = |i: usize| -> Option<String> {
        let value = raw[i].trim();
        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    };
    let number = |i: usize| -> Option<f64> { text(i)?.parse().ok() };
    let integer = |i: usize| -> Option<i64> { text(i)?.parse().ok() };

    Some(Listing {
        manufacturer: text(0)?,
        model: text(1)?,
        engine_size: number(2)?,
        fuel_type: text(3)?,
        year_of_manufacture: integer(4)?,
        mileage: number(5)?,
        price: number(6)?,
    })
}

fn enrich(listing: Listing, rate: f64, current_year: i64) -> EnrichedListing {
    let car_age = current_year - listing.year_of_manufacture;
    let price_inr = listing.price * rate;
    let mileage_category = MileageCategory::from_mileage(listing.mileage);
    let price_per_km = listing.price / listing.mileage;

    EnrichedListing {
        listing,
        car_age,
        price_inr,
        mileage_category,
        price_per_km,
    }
}
