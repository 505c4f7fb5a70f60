use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::series::TimestampMS;

/// API request configuration for a klines fetch
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub symbol: String,
    pub interval: String,
    pub start_time: Option<TimestampMS>,
    pub end_time: Option<TimestampMS>,
    pub limit: Option<u32>,
}

impl ApiRequest {
    pub fn new_klines(symbol: String, interval: String) -> Self {
        Self {
            symbol,
            interval,
            start_time: None,
            end_time: None,
            limit: None,
        }
    }

    pub fn with_time_range(mut self, start_time: TimestampMS, end_time: TimestampMS) -> Self {
        self.start_time = Some(start_time);
        self.end_time = Some(end_time);
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// API response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
    pub timestamp: TimestampMS,
    pub rate_limit_info: Option<RateLimitInfo>,
}

/// Rate limiting information from API headers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitInfo {
    pub requests_used: u32,
    pub requests_limit: u32,
    pub retry_after: Option<u32>,
}

/// API error types
#[derive(Error, Debug, Clone)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Invalid interval: {0}")]
    InvalidInterval(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl ApiError {
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ApiError::Network(_) | ApiError::Http(_) | ApiError::RateLimit(_)
        )
    }
}

/// Convert a Binance interval string to its duration in milliseconds
pub fn interval_to_ms(interval: &str) -> Result<i64, ApiError> {
    match interval {
        "1m" => Ok(60_000),
        "3m" => Ok(180_000),
        "5m" => Ok(300_000),
        "15m" => Ok(900_000),
        "30m" => Ok(1_800_000),
        "1h" => Ok(3_600_000),
        "2h" => Ok(7_200_000),
        "4h" => Ok(14_400_000),
        "6h" => Ok(21_600_000),
        "8h" => Ok(28_800_000),
        "12h" => Ok(43_200_000),
        "1d" => Ok(86_400_000),
        "3d" => Ok(259_200_000),
        "1w" => Ok(604_800_000),
        // Calendar months vary in length; the pagination cursor only needs a
        // lower bound on the true step, so use the shortest month
        "1M" => Ok(2_419_200_000),
        other => Err(ApiError::InvalidInterval(other.to_string())),
    }
}
