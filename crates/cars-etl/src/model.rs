//! Data model for car-listing batches

use serde::{Deserialize, Serialize};

/// Canonical column names, in positional order, expected from every
/// input file after header stripping.
pub const CANONICAL_COLUMNS: [&str; 7] = [
    "Manufacturer",
    "Model",
    "Engine_size",
    "Fuel_type",
    "Year_of_manufacture",
    "Mileage",
    "Price",
];

/// Derived column names appended by the transformer.
pub const DERIVED_COLUMNS: [&str; 4] =
    ["Car_Age", "Price_INR", "Mileage_Category", "Price_per_km"];

/// Full enriched column set: the seven canonical columns followed by
/// the four derived ones.
pub fn enriched_columns() -> Vec<&'static str> {
    CANONICAL_COLUMNS
        .iter()
        .chain(DERIVED_COLUMNS.iter())
        .copied()
        .collect()
}

/// One raw input row: the field values of a single CSV record, in file
/// order, before any validation or parsing.
pub type RawRow = Vec<String>;

/// An ordered batch of raw rows together with the source files it was
/// built from. Batch identity is the set of source file names.
#[derive(Debug, Clone)]
pub struct RawBatch {
    /// Rows in stable order: files lexicographic, rows in file order
    pub rows: Vec<RawRow>,

    /// File names (relative to the data directory) this batch came from
    pub source_files: Vec<String>,
}

impl RawBatch {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

/// One validated car listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub manufacturer: String,
    pub model: String,
    pub engine_size: f64,
    pub fuel_type: String,
    pub year_of_manufacture: i64,
    pub mileage: f64,
    pub price: f64,
}

/// Mileage band for a listing, assigned from half-open intervals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MileageCategory {
    Low,
    Medium,
    High,
}

impl MileageCategory {
    /// Categorize a mileage value.
    ///
    /// `< 50000` is Low, `[50000, 100000)` is Medium, `>= 100000` is
    /// High. Boundary values belong to the interval they open.
    pub fn from_mileage(mileage: f64) -> Self {
        if mileage < 50_000.0 {
            MileageCategory::Low
        } else if mileage < 100_000.0 {
            MileageCategory::Medium
        } else {
            MileageCategory::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MileageCategory::Low => "Low",
            MileageCategory::Medium => "Medium",
            MileageCategory::High => "High",
        }
    }
}

impl std::fmt::Display for MileageCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A listing plus the four derived fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedListing {
    #[serde(flatten)]
    pub listing: Listing,
    pub car_age: i64,
    pub price_inr: f64,
    pub mileage_category: MileageCategory,
    pub price_per_km: f64,
}
