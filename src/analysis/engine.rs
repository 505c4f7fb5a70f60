use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analysis::errors::AnalysisError;
use crate::analysis::extremum::ExtremumLocator;
use crate::analysis::segment::TrendSegmenter;
use crate::analysis::smoothing::SmoothingPipeline;
use crate::analysis::structs::AnalysisReport;
use crate::analysis::swing::SwingDetector;
use crate::series::CandleSeries;

/// Tunable parameters for a full analysis run.
///
/// Window lengths are candle counts; the engine operates on index offsets and
/// assumes a fixed sampling interval. Defaults follow the reference
/// parameterization for 1-minute BTCUSDT data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Swing window length: future candles scanned before an extreme is
    /// confirmed or abandoned
    pub look_ahead: usize,
    /// Reversal confirmation threshold, in percent
    pub swing_percent: f64,
    /// Primary smoothing window length
    pub period: usize,
    /// Secondary smoothing window length
    pub smooth_period: usize,
    /// Derivative-near-zero threshold marking inflection candidates
    pub inflection_tol: f64,
    /// Minimum cumulative-derivative magnitude for a real trend leg
    pub noise_threshold: f64,
    /// Extremum search window extension, in candles
    pub padding: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            look_ahead: 7500,
            swing_percent: 1.0,
            period: 120,
            smooth_period: 60,
            inflection_tol: 0.01,
            noise_threshold: 20.0,
            padding: 90,
        }
    }
}

impl AnalyzerConfig {
    /// Fail fast on non-positive parameters or a window that cannot fit the
    /// series, before any scan begins
    pub fn validate(&self, series_len: usize) -> Result<(), AnalysisError> {
        if self.look_ahead == 0 {
            return Err(AnalysisError::invalid("look_ahead", "must be positive"));
        }
        if self.swing_percent <= 0.0 {
            return Err(AnalysisError::invalid(
                "swing_percent",
                "must be positive; zero would confirm every bar immediately",
            ));
        }
        if self.period == 0 {
            return Err(AnalysisError::invalid("period", "must be positive"));
        }
        if self.smooth_period == 0 {
            return Err(AnalysisError::invalid("smooth_period", "must be positive"));
        }
        if self.inflection_tol <= 0.0 {
            return Err(AnalysisError::invalid("inflection_tol", "must be positive"));
        }
        if self.noise_threshold <= 0.0 {
            return Err(AnalysisError::invalid("noise_threshold", "must be positive"));
        }
        if self.look_ahead >= series_len {
            return Err(AnalysisError::invalid(
                "look_ahead",
                format!(
                    "window of {} does not fit a series of {} candles",
                    self.look_ahead, series_len
                ),
            ));
        }
        let required = self.period + self.smooth_period;
        if series_len < required {
            return Err(AnalysisError::InsufficientData {
                required,
                actual: series_len,
            });
        }
        Ok(())
    }

    /// Candles that must trail the newest one before any value could be
    /// finalized: the larger of the swing window and the smoothing phase lag
    pub fn min_lag(&self) -> usize {
        self.look_ahead.max(self.period / 2 + self.smooth_period / 2)
    }
}

/// Thin orchestrator wiring the two pipelines over a loaded series.
///
/// The raw swing pipeline and the smoothed trend pipeline are independent
/// algorithms over the same input: one direct/threshold-based, one
/// smoothing/derivative-based.
#[derive(Debug, Clone)]
pub struct Analyzer {
    config: AnalyzerConfig,
}

impl Analyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn run(&self, series: &CandleSeries) -> Result<AnalysisReport, AnalysisError> {
        self.config.validate(series.len())?;

        info!(
            "🔍 Analyzing {} candles (look_ahead={}, swing={}%, period={}/{})",
            series.len(),
            self.config.look_ahead,
            self.config.swing_percent,
            self.config.period,
            self.config.smooth_period
        );

        let swings =
            SwingDetector::new(self.config.look_ahead, self.config.swing_percent).detect(series);

        let smoothing =
            SmoothingPipeline::new(self.config.period, self.config.smooth_period).smooth(series);
        let segmentation = TrendSegmenter::new(self.config.inflection_tol, self.config.noise_threshold)
            .segment(&smoothing.derivative);
        let markers =
            ExtremumLocator::new(self.config.padding).locate(series, &segmentation.boundaries);

        info!(
            "✅ Analysis complete: {} swing points, {} region boundaries, {} markers",
            swings.len(),
            segmentation.boundaries.len(),
            markers.len()
        );

        Ok(AnalysisReport {
            swings,
            smoothing,
            segmentation,
            markers,
        })
    }
}
