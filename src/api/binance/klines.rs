use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::api::types::{interval_to_ms, ApiError, ApiRequest, ApiResponse, RateLimitInfo};
use crate::series::{Candle, TimestampMS};

/// Maximum klines Binance returns per request
const MAX_KLINES_PER_REQUEST: u32 = 1000;

/// Retries per page before a recoverable error is surfaced
const MAX_FETCH_RETRIES: u32 = 3;

/// Binance spot API client for klines data
pub struct BinanceKlinesClient {
    client: reqwest::Client,
    base_url: String,
    last_request_time: Option<Instant>,
    min_request_interval: Duration,
}

impl BinanceKlinesClient {
    /// Create a new Binance klines client
    pub fn new(base_url: String) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ApiError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            last_request_time: None,
            min_request_interval: Duration::from_millis(200),
        })
    }

    pub fn binance_spot() -> Result<Self, ApiError> {
        Self::new("https://api.binance.com".to_string())
    }

    /// Fetch one page of klines data from the Binance API
    pub async fn fetch_klines(
        &mut self,
        request: &ApiRequest,
    ) -> Result<ApiResponse<Vec<Candle>>, ApiError> {
        // Rate limiting: ensure minimum interval between requests
        if let Some(last_request) = self.last_request_time {
            let elapsed = last_request.elapsed();
            if elapsed < self.min_request_interval {
                let delay = self.min_request_interval - elapsed;
                debug!("Rate limiting: waiting {:?} before next request", delay);
                sleep(delay).await;
            }
        }

        let url = self.build_klines_url(request);
        debug!("Fetching klines from: {}", url);

        self.last_request_time = Some(Instant::now());

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ApiError::Network(format!("Request failed: {}", e)))?;

        if response.status().as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);

            return Err(ApiError::RateLimit(format!(
                "Rate limit exceeded, retry after {} seconds",
                retry_after
            )));
        }

        if !response.status().is_success() {
            return Err(ApiError::Http(format!(
                "HTTP {}: {}",
                response.status(),
                response.status().canonical_reason().unwrap_or("Unknown")
            )));
        }

        let rate_limit_info = self.parse_rate_limit_headers(&response);

        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Parse(format!("Failed to read response body: {}", e)))?;

        let raw_klines: Vec<serde_json::Value> = serde_json::from_str(&body)
            .map_err(|e| ApiError::Parse(format!("Failed to parse JSON: {}", e)))?;

        let candles = self.parse_klines_response(raw_klines)?;

        info!(
            "✅ Fetched {} klines for {} {}",
            candles.len(),
            request.symbol,
            request.interval
        );

        Ok(ApiResponse {
            data: candles,
            timestamp: chrono::Utc::now().timestamp_millis(),
            rate_limit_info,
        })
    }

    /// Fetch all klines between `start_time` and `end_time`, paginating in
    /// 1000-candle pages and advancing past the last returned open time.
    /// Recoverable errors (network, HTTP, rate limit) are retried per page
    /// with linear backoff before being surfaced.
    pub async fn fetch_range(
        &mut self,
        symbol: &str,
        interval: &str,
        start_time: TimestampMS,
        end_time: TimestampMS,
    ) -> Result<Vec<Candle>, ApiError> {
        let step_ms = interval_to_ms(interval)?;
        let mut all_candles = Vec::new();
        let mut cursor = start_time;

        while cursor < end_time {
            let request = ApiRequest::new_klines(symbol.to_string(), interval.to_string())
                .with_time_range(cursor, end_time)
                .with_limit(MAX_KLINES_PER_REQUEST);

            let mut attempt = 0u32;
            let page = loop {
                match self.fetch_klines(&request).await {
                    Ok(page) => break page,
                    Err(e) if e.is_recoverable() && attempt < MAX_FETCH_RETRIES => {
                        attempt += 1;
                        let delay = Duration::from_millis(500 * u64::from(attempt));
                        warn!(
                            "⚠️ Fetch attempt {} for {} {} failed ({}), retrying in {:?}",
                            attempt, symbol, interval, e, delay
                        );
                        sleep(delay).await;
                    }
                    Err(e) => return Err(e),
                }
            };
            if page.data.is_empty() {
                break;
            }

            cursor = page.data.last().map(|c| c.open_time).unwrap_or(cursor) + step_ms;
            all_candles.extend(page.data);
        }

        info!(
            "✅ Range fetch complete: {} candles for {} {} ({} -> {})",
            all_candles.len(),
            symbol,
            interval,
            start_time,
            end_time
        );
        Ok(all_candles)
    }

    /// Build the complete URL for a klines request
    fn build_klines_url(&self, request: &ApiRequest) -> String {
        let mut url = format!(
            "{}/api/v3/klines?symbol={}&interval={}",
            self.base_url, request.symbol, request.interval
        );

        if let Some(start_time) = request.start_time {
            url.push_str(&format!("&startTime={}", start_time));
        }

        if let Some(end_time) = request.end_time {
            url.push_str(&format!("&endTime={}", end_time));
        }

        if let Some(limit) = request.limit {
            let limit = std::cmp::min(limit, MAX_KLINES_PER_REQUEST);
            url.push_str(&format!("&limit={}", limit));
        }

        url
    }

    /// Parse a Binance klines response into our internal candle format
    fn parse_klines_response(
        &self,
        raw_klines: Vec<serde_json::Value>,
    ) -> Result<Vec<Candle>, ApiError> {
        let mut candles = Vec::with_capacity(raw_klines.len());

        for kline_array in raw_klines {
            let array = kline_array
                .as_array()
                .ok_or_else(|| ApiError::Parse("Expected kline to be an array".to_string()))?;

            if array.len() < 7 {
                return Err(ApiError::Parse(format!(
                    "Expected at least 7 elements in kline array, got {}",
                    array.len()
                )));
            }

            candles.push(Candle {
                open_time: self.parse_timestamp(&array[0])?,
                open: self.parse_f64(&array[1])?,
                high: self.parse_f64(&array[2])?,
                low: self.parse_f64(&array[3])?,
                close: self.parse_f64(&array[4])?,
                volume: self.parse_f64(&array[5])?,
                close_time: self.parse_timestamp(&array[6])?,
            });
        }

        Ok(candles)
    }

    /// Parse timestamp from JSON value
    fn parse_timestamp(&self, value: &serde_json::Value) -> Result<TimestampMS, ApiError> {
        value.as_i64().ok_or_else(|| {
            ApiError::Parse(format!("Expected timestamp to be i64, got: {:?}", value))
        })
    }

    /// Parse f64 from JSON value (Binance returns prices as strings)
    fn parse_f64(&self, value: &serde_json::Value) -> Result<f64, ApiError> {
        match value {
            serde_json::Value::String(s) => s
                .parse::<f64>()
                .map_err(|_| ApiError::Parse(format!("Failed to parse '{}' as f64", s))),
            serde_json::Value::Number(n) => n
                .as_f64()
                .ok_or_else(|| ApiError::Parse(format!("Failed to convert number to f64: {:?}", n))),
            _ => Err(ApiError::Parse(format!(
                "Expected string or number, got: {:?}",
                value
            ))),
        }
    }

    /// Parse rate limit information from response headers
    fn parse_rate_limit_headers(&self, response: &reqwest::Response) -> Option<RateLimitInfo> {
        let headers = response.headers();

        let requests_used = headers
            .get("x-mbx-used-weight-1m")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.parse::<u32>().ok());

        let retry_after = headers
            .get("retry-after")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.parse::<u32>().ok());

        if requests_used.is_some() || retry_after.is_some() {
            Some(RateLimitInfo {
                requests_used: requests_used.unwrap_or(0),
                requests_limit: 1200,
                retry_after,
            })
        } else {
            None
        }
    }

}
