//! End-to-end tests for the ETL pipeline
//!
//! These tests validate the full workflow against real temp-dir sinks
//! and a mocked rate endpoint:
//! - dual-sink append + ledger commit
//! - idempotence (second run is a no-op)
//! - fallback rate on endpoint failure
//! - flat-file-sink failure, retryability, and the documented
//!   relational duplication on re-run

use cars_etl::config::{EtlConfig, RateConfig};
use cars_etl::pipeline::{Pipeline, RunOutcome};
use cars_etl::rates::RateSource;
use cars_etl::visualize::{NoopVisualizer, SummaryReportVisualizer};
use serde_json::json;
use sqlx::sqlite::SqlitePoolOptions;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const YEAR: i64 = 2026;

const HEADER: &str = "Maker,Model,Engine,Fuel,Year,Km,Usd\n";

/// Three clean rows
const FILE_A: &str = "Ford,Focus,1.6,Petrol,2018,30000,9000\n\
                      VW,Golf,2.0,Diesel,2015,80000,7000\n\
                      BMW,320i,2.0,Petrol,2020,120000,15000\n";

/// Two clean rows
const FILE_B: &str = "Audi,A4,1.8,Diesel,2016,60000,12000\n\
                      Kia,Rio,1.2,Petrol,2021,20000,8000\n";

fn test_config(dir: &TempDir, rate_endpoint: String) -> EtlConfig {
    std::fs::create_dir_all(dir.path().join("data")).unwrap();
    EtlConfig {
        data_dir: dir.path().join("data"),
        ledger_path: dir.path().join("processed_files.log"),
        database_path: dir.path().join("cars_etl.db"),
        output_csv: dir.path().join("cars_transformed.csv"),
        plots_dir: dir.path().join("plots"),
        rates: RateConfig {
            endpoint: rate_endpoint,
            ..RateConfig::default()
        },
        ..EtlConfig::default()
    }
}

fn write_input(config: &EtlConfig, name: &str, body: &str) {
    std::fs::write(config.data_dir.join(name), format!("{}{}", HEADER, body)).unwrap();
}

async fn mock_rate_server(rate: f64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/latest"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"base": "USD", "rates": {"INR": rate}})),
        )
        .mount(&server)
        .await;
    server
}

async fn db_prices_inr(config: &EtlConfig) -> Vec<f64> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&config.database_url())
        .await
        .unwrap();
    sqlx::query_scalar::<_, f64>("SELECT price_inr FROM cars_analysis ORDER BY rowid")
        .fetch_all(&pool)
        .await
        .unwrap()
}

async fn db_row_count(config: &EtlConfig) -> i64 {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&config.database_url())
        .await
        .unwrap();
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM cars_analysis")
        .fetch_one(&pool)
        .await
        .unwrap()
}

fn ledger_lines(config: &EtlConfig) -> Vec<String> {
    if !config.ledger_path.exists() {
        return Vec::new();
    }
    std::fs::read_to_string(&config.ledger_path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

// ============================================================================
// Happy Path
// ============================================================================

#[tokio::test]
async fn test_end_to_end_two_files() {
    let server = mock_rate_server(85.0).await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir, format!("{}/latest", server.uri()));
    write_input(&config, "2024_march.csv", FILE_A);
    write_input(&config, "2024_april.csv", FILE_B);

    let pipeline = Pipeline::new(config.clone()).unwrap();
    let visualizer = SummaryReportVisualizer::new(&config.plots_dir);
    let outcome = pipeline.run_with_year(&visualizer, YEAR).await.unwrap();

    let RunOutcome::Completed(summary) = outcome else {
        panic!("expected a completed run");
    };
    assert_eq!(summary.extracted_rows, 5);
    assert_eq!(summary.loaded_rows, 5);
    assert_eq!(summary.rate, 85.0);
    assert_eq!(summary.rate_source, RateSource::Live);
    assert_eq!(summary.source_files, vec!["2024_april.csv", "2024_march.csv"]);

    // Every row converted at the live rate
    for row in &summary.rows {
        assert_eq!(row.price_inr, row.listing.price * 85.0);
    }

    // Relational sink: 5 rows
    assert_eq!(db_row_count(&config).await, 5);

    // Flat-file sink: header + 5 data rows
    let csv = std::fs::read_to_string(&config.output_csv).unwrap();
    assert_eq!(csv.lines().count(), 6);
    assert!(csv.starts_with("Manufacturer,Model,"));

    // Ledger: exactly the two files
    assert_eq!(ledger_lines(&config), vec!["2024_april.csv", "2024_march.csv"]);

    // Visualization reports written
    assert!(config.plots_dir.join("fuel_type_distribution.csv").exists());
    assert!(config.plots_dir.join("price_distribution.csv").exists());
}

#[tokio::test]
async fn test_second_run_is_skipped() {
    let server = mock_rate_server(85.0).await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir, format!("{}/latest", server.uri()));
    write_input(&config, "jan.csv", FILE_A);

    let pipeline = Pipeline::new(config.clone()).unwrap();
    let first = pipeline.run_with_year(&NoopVisualizer, YEAR).await.unwrap();
    assert!(matches!(first, RunOutcome::Completed(_)));

    let csv_before = std::fs::read_to_string(&config.output_csv).unwrap();
    let ledger_before = ledger_lines(&config);

    // No new files: the run short-circuits and mutates nothing
    let second = pipeline.run_with_year(&NoopVisualizer, YEAR).await.unwrap();
    assert!(matches!(second, RunOutcome::Skipped));

    assert_eq!(db_row_count(&config).await, 3);
    assert_eq!(std::fs::read_to_string(&config.output_csv).unwrap(), csv_before);
    assert_eq!(ledger_lines(&config), ledger_before);
}

#[tokio::test]
async fn test_incremental_run_picks_up_only_new_files() {
    let server = mock_rate_server(85.0).await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir, format!("{}/latest", server.uri()));
    write_input(&config, "jan.csv", FILE_A);

    let pipeline = Pipeline::new(config.clone()).unwrap();
    pipeline.run_with_year(&NoopVisualizer, YEAR).await.unwrap();

    write_input(&config, "feb.csv", FILE_B);
    let outcome = pipeline.run_with_year(&NoopVisualizer, YEAR).await.unwrap();

    let RunOutcome::Completed(summary) = outcome else {
        panic!("expected a completed run");
    };
    assert_eq!(summary.source_files, vec!["feb.csv"]);
    assert_eq!(summary.loaded_rows, 2);
    assert_eq!(db_row_count(&config).await, 5);
    assert_eq!(ledger_lines(&config), vec!["jan.csv", "feb.csv"]);
}

// ============================================================================
// Fallback Rate
// ============================================================================

#[tokio::test]
async fn test_endpoint_failure_uses_fallback_and_commits() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/latest"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&dir, format!("{}/latest", server.uri()));
    write_input(&config, "jan.csv", FILE_A);

    let pipeline = Pipeline::new(config.clone()).unwrap();
    let outcome = pipeline.run_with_year(&NoopVisualizer, YEAR).await.unwrap();

    let RunOutcome::Completed(summary) = outcome else {
        panic!("expected a completed run");
    };
    assert_eq!(summary.rate, 83.0);
    assert_eq!(summary.rate_source, RateSource::Fallback);

    // Price_INR = Price * 83 exactly, and the run still committed
    let prices = db_prices_inr(&config).await;
    assert_eq!(prices, vec![9000.0 * 83.0, 7000.0 * 83.0, 15000.0 * 83.0]);
    assert_eq!(ledger_lines(&config), vec!["jan.csv"]);
}

// ============================================================================
// Cleaning
// ============================================================================

#[tokio::test]
async fn test_cleaning_is_reflected_in_sinks() {
    let server = mock_rate_server(85.0).await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir, format!("{}/latest", server.uri()));

    // 4 rows: one null mileage, one exact duplicate pair
    write_input(
        &config,
        "jan.csv",
        "Ford,Focus,1.6,Petrol,2018,30000,9000\n\
         VW,Golf,2.0,Diesel,2015,,7000\n\
         BMW,320i,2.0,Petrol,2020,120000,15000\n\
         BMW,320i,2.0,Petrol,2020,120000,15000\n",
    );

    let pipeline = Pipeline::new(config.clone()).unwrap();
    let outcome = pipeline.run_with_year(&NoopVisualizer, YEAR).await.unwrap();

    let RunOutcome::Completed(summary) = outcome else {
        panic!("expected a completed run");
    };
    assert_eq!(summary.extracted_rows, 4);
    assert_eq!(summary.loaded_rows, 2);
    assert_eq!(summary.stats.dropped_invalid, 1);
    assert_eq!(summary.stats.dropped_duplicate, 1);
    assert_eq!(db_row_count(&config).await, 2);
}

// ============================================================================
// Failure Semantics
// ============================================================================

#[tokio::test]
async fn test_schema_mismatch_aborts_without_any_write() {
    let server = mock_rate_server(85.0).await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir, format!("{}/latest", server.uri()));
    write_input(&config, "good.csv", FILE_A);
    std::fs::write(config.data_dir.join("bad.csv"), "Maker,Model\nVW,Golf\n").unwrap();

    let pipeline = Pipeline::new(config.clone()).unwrap();
    let result = pipeline.run_with_year(&NoopVisualizer, YEAR).await;

    assert!(result.is_err());
    assert!(!config.database_path.exists());
    assert!(!config.output_csv.exists());
    assert!(ledger_lines(&config).is_empty());
}

#[tokio::test]
async fn test_flat_file_failure_is_retryable_with_documented_duplication() {
    let server = mock_rate_server(85.0).await;
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&dir, format!("{}/latest", server.uri()));
    write_input(&config, "jan.csv", FILE_A);

    // A directory at the CSV path makes the flat-file append fail
    // after the relational write has already committed
    config.output_csv = dir.path().join("blocked");
    std::fs::create_dir(&config.output_csv).unwrap();

    let pipeline = Pipeline::new(config.clone()).unwrap();
    let result = pipeline.run_with_year(&NoopVisualizer, YEAR).await;
    assert!(result.is_err());

    // Relational sink has the batch, ledger does not, flat file empty
    assert_eq!(db_row_count(&config).await, 3);
    assert!(ledger_lines(&config).is_empty());

    // Next run with a working flat-file path re-processes the same
    // files; the relational sink now shows them twice
    config.output_csv = dir.path().join("cars_transformed.csv");
    let pipeline = Pipeline::new(config.clone()).unwrap();
    let outcome = pipeline.run_with_year(&NoopVisualizer, YEAR).await.unwrap();
    assert!(matches!(outcome, RunOutcome::Completed(_)));

    assert_eq!(db_row_count(&config).await, 6);
    assert_eq!(ledger_lines(&config), vec!["jan.csv"]);
    let csv = std::fs::read_to_string(&config.output_csv).unwrap();
    assert_eq!(csv.lines().count(), 4); // header + 3 rows, once
}

#[tokio::test]
async fn test_empty_data_dir_is_skipped() {
    let server = mock_rate_server(85.0).await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir, format!("{}/latest", server.uri()));

    let pipeline = Pipeline::new(config.clone()).unwrap();
    let outcome = pipeline.run_with_year(&NoopVisualizer, YEAR).await.unwrap();

    assert!(matches!(outcome, RunOutcome::Skipped));
    assert!(!config.database_path.exists());
    assert!(!config.output_csv.exists());
}
