use std::fs::File;
use std::path::PathBuf;

use serde::Deserialize;
use tracing::{info, warn};

use swing_scanner::analysis::{Analyzer, AnalyzerConfig};
use swing_scanner::api::{interval_to_ms, BinanceKlinesClient};
use swing_scanner::logging::{init_dual_logging, LoggingConfig, LogRotation};
use swing_scanner::series::CandleSeries;
use swing_scanner::storage::CandleStore;

/// Application configuration from config.toml
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct ApplicationConfig {
    pub symbol: String,
    pub interval: String,
    pub cache_path: String,
    pub report_path: String,
    /// Where fetching starts when no cache exists (RFC3339, e.g. "2021-01-01T00:00:00Z")
    pub start_date: String,
    /// Disable to analyze the cached series offline
    pub fetch_enabled: bool,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            symbol: "BTCUSDT".to_string(),
            interval: "1m".to_string(),
            cache_path: "data/BTCUSDT_1m.csv".to_string(),
            report_path: "data/BTCUSDT_1m_analysis.json".to_string(),
            start_date: "2021-01-01T00:00:00Z".to_string(),
            fetch_enabled: true,
        }
    }
}

/// Logging configuration from config.toml
#[derive(Debug, Clone, Default, Deserialize)]
struct LoggingTomlConfig {
    pub log_dir: Option<String>,
    pub level_filter: Option<String>,
    pub rotation: Option<String>, // "daily" or "hourly"
    pub console_timestamps: Option<bool>,
    pub file_json_format: Option<bool>,
}

/// Full TOML configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct TomlConfig {
    pub application: ApplicationConfig,
    pub analysis: AnalyzerConfig,
    pub logging: LoggingTomlConfig,
}

impl TomlConfig {
    fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    fn logging_config(&self) -> LoggingConfig {
        let defaults = LoggingConfig::default();
        LoggingConfig {
            log_dir: self.logging.log_dir.clone().unwrap_or(defaults.log_dir),
            level_filter: self
                .logging
                .level_filter
                .clone()
                .unwrap_or(defaults.level_filter),
            rotation: match self.logging.rotation.as_deref() {
                Some("hourly") => LogRotation::Hourly,
                _ => LogRotation::Daily,
            },
            console_timestamps: self
                .logging
                .console_timestamps
                .unwrap_or(defaults.console_timestamps),
            file_json_format: self
                .logging
                .file_json_format
                .unwrap_or(defaults.file_json_format),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = match TomlConfig::from_file("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("⚠️ Could not read config.toml ({}), using defaults", e);
            TomlConfig::default()
        }
    };

    let _guard = init_dual_logging(config.logging_config())?;

    info!(
        "🚀 swing_scanner starting for {} {}",
        config.application.symbol, config.application.interval
    );

    let candles = load_series(&config.application).await?;
    if candles.is_empty() {
        warn!("No candles available, nothing to analyze");
        return Ok(());
    }
    let series = CandleSeries::from_candles(candles);

    let analyzer = Analyzer::new(config.analysis.clone());
    let report = analyzer.run(&series)?;

    let report_path = PathBuf::from(&config.application.report_path);
    if let Some(parent) = report_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    serde_json::to_writer_pretty(File::create(&report_path)?, &report)?;

    info!(
        "💾 Report written to {}: {} swing points, {} boundaries, {} markers",
        report_path.display(),
        report.swings.len(),
        report.segmentation.boundaries.len(),
        report.markers.len()
    );

    Ok(())
}

/// Load the cached series and, when enabled, extend it with fresh candles
/// from one interval past the newest cached open time up to now
async fn load_series(
    config: &ApplicationConfig,
) -> Result<Vec<swing_scanner::series::Candle>, Box<dyn std::error::Error + Send + Sync>> {
    let store = CandleStore::new(&config.cache_path);
    let mut candles = if store.exists() {
        store.load()?
    } else {
        info!("No cache found at {}, starting fresh", config.cache_path);
        Vec::new()
    };

    if !config.fetch_enabled {
        info!("Fetching disabled, analyzing cached series only");
        return Ok(candles);
    }

    let step_ms = interval_to_ms(&config.interval)?;
    let start_time = match candles.last() {
        Some(last) => last.open_time + step_ms,
        None => chrono::DateTime::parse_from_rfc3339(&config.start_date)?.timestamp_millis(),
    };
    let end_time = chrono::Utc::now().timestamp_millis();

    if start_time >= end_time {
        info!("Cache is already up to date");
        return Ok(candles);
    }

    let mut client = BinanceKlinesClient::binance_spot()?;
    let fresh = client
        .fetch_range(&config.symbol, &config.interval, start_time, end_time)
        .await?;

    if !fresh.is_empty() {
        candles.extend(fresh);
        store.save(&candles)?;
    }

    Ok(candles)
}
