pub mod analysis;
pub mod api;
pub mod logging;
pub mod series;
pub mod storage;

// Re-export the types most callers need
pub use analysis::{Analyzer, AnalyzerConfig, AnalysisError, AnalysisReport};
pub use series::{Candle, CandleSeries, TimestampMS};
