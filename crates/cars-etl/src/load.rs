//! Loader
//!
//! Appends an enriched batch to the relational sink (SQLite table) and
//! the flat-file sink (CSV), then commits the batch's source files to
//! the ledger — strictly in that order. The ledger commit is the only
//! durability marker: a failure in either sink leaves the files
//! uncommitted and the next run re-extracts them. The relational sink
//! is therefore appended a second time on such a retry; dedup is
//! file-grained in the ledger, never row-grained here.

use crate::config::EtlConfig;
use crate::ledger::ProcessedLedger;
use crate::model::{enriched_columns, EnrichedListing};
use cars_common::{EtlError, Result};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::fs::OpenOptions;
use std::path::PathBuf;
use tracing::{debug, info};

/// Dual-sink appender
pub struct Loader {
    pool: SqlitePool,
    table_name: String,
    output_csv: PathBuf,
}

impl Loader {
    /// Connect to the relational sink and ensure the target table
    /// exists.
    pub async fn connect(config: &EtlConfig) -> Result<Self> {
        validate_identifier(&config.table_name)?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(&config.database_url())
            .await
            .map_err(|e| EtlError::Database(format!("Failed to connect: {}", e)))?;

        let loader = Loader {
            pool,
            table_name: config.table_name.clone(),
            output_csv: config.output_csv.clone(),
        };
        loader.ensure_table().await?;
        Ok(loader)
    }

    async fn ensure_table(&self) -> Result<()> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                manufacturer TEXT NOT NULL,
                model TEXT NOT NULL,
                engine_size REAL NOT NULL,
                fuel_type TEXT NOT NULL,
                year_of_manufacture INTEGER NOT NULL,
                mileage REAL NOT NULL,
                price REAL NOT NULL,
                car_age INTEGER NOT NULL,
                price_inr REAL NOT NULL,
                mileage_category TEXT NOT NULL,
                price_per_km REAL NOT NULL
            )",
            self.table_name
        );

        sqlx::query(&sql)
            .execute(&self.pool)
            .await
            .map_err(|e| EtlError::Database(format!("Failed to create table: {}", e)))?;
        Ok(())
    }

    /// Append a batch to both sinks, then commit its source files.
    ///
    /// The three writes are one logical unit: a relational failure
    /// prevents the flat-file write and the commit; a flat-file
    /// failure prevents the commit. A batch cleaned down to zero rows
    /// still commits its files, otherwise they would be re-extracted
    /// forever.
    pub async fn load(
        &self,
        rows: &[EnrichedListing],
        source_files: &[String],
        ledger: &mut ProcessedLedger,
    ) -> Result<()> {
        if !rows.is_empty() {
            self.append_relational(rows).await?;
            self.append_csv(rows)?;
        }

        ledger.commit(source_files)?;

        info!(
            rows = rows.len(),
            files = source_files.len(),
            table = %self.table_name,
            csv = %self.output_csv.display(),
            "Loaded batch"
        );
        Ok(())
    }

    /// Rows currently in the relational sink
    pub async fn row_count(&self) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.table_name);
        sqlx::query_scalar::<_, i64>(&sql)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| EtlError::Database(format!("Failed to count rows: {}", e)))
    }

    async fn append_relational(&self, rows: &[EnrichedListing]) -> Result<()> {
        let sql = format!(
            "INSERT INTO {} VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            self.table_name
        );

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| EtlError::Database(format!("Failed to begin transaction: {}", e)))?;

        for row in rows {
            sqlx::query(&sql)
                .bind(&row.listing.manufacturer)
                .bind(&row.listing.model)
                .bind(row.listing.engine_size)
                .bind(&row.listing.fuel_type)
                .bind(row.listing.year_of_manufacture)
                .bind(row.listing.mileage)
                .bind(row.listing.price)
                .bind(row.car_age)
                .bind(row.price_inr)
                .bind(row.mileage_category.as_str())
                .bind(row.price_per_km)
                .execute(&mut *tx)
                .await
                .map_err(|e| EtlError::Database(format!("Failed to insert row: {}", e)))?;
        }

        tx.commit()
            .await
            .map_err(|e| EtlError::Database(format!("Failed to commit transaction: {}", e)))?;

        debug!(rows = rows.len(), table = %self.table_name, "Appended to relational sink");
        Ok(())
    }

    fn append_csv(&self, rows: &[EnrichedListing]) -> Result<()> {
        let write_header = !self.output_csv.exists();

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.output_csv)?;

        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);

        if write_header {
            writer
                .write_record(enriched_columns())
                .map_err(|e| EtlError::Csv(format!("Failed to write header: {}", e)))?;
        }

        for row in rows {
            writer
                .write_record([
                    row.listing.manufacturer.as_str(),
                    row.listing.model.as_str(),
                    &row.listing.engine_size.to_string(),
                    row.listing.fuel_type.as_str(),
                    &row.listing.year_of_manufacture.to_string(),
                    &row.listing.mileage.to_string(),
                    &row.listing.price.to_string(),
                    &row.car_age.to_string(),
                    &row.price_inr.to_string(),
                    row.mileage_category.as_str(),
                    &row.price_per_km.to_string(),
                ])
                .map_err(|e| EtlError::Csv(format!("Failed to write row: {}", e)))?;
        }

        let file = writer
            .into_inner()
            .map_err(|e| EtlError::Csv(format!("Failed to flush: {}", e)))?;
        file.sync_all()?;

        debug!(rows = rows.len(), path = %self.output_csv.display(), "Appended to flat-file sink");
        Ok(())
    }
}

/// Reject table names that cannot be safely interpolated into SQL
/// (identifiers cannot be bound as parameters).
fn validate_identifier(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid {
        Ok(())
    } else {
        Err(EtlError::Config(format!("Invalid table name: {:?}", name)))
    }
}
