pub mod engine;
pub mod errors;
pub mod extremum;
pub mod segment;
pub mod smoothing;
pub mod structs;
pub mod swing;

// Re-export commonly used types for convenience
pub use engine::{Analyzer, AnalyzerConfig};
pub use errors::AnalysisError;
pub use extremum::ExtremumLocator;
pub use segment::TrendSegmenter;
pub use smoothing::SmoothingPipeline;
pub use structs::{
    AnalysisReport, ExtremumMarker, IndicatorSeries, MarkerKind, MarkerSet, RegionBoundary,
    Segmentation, SmoothedSeries, SwingKind, SwingPoint, SwingPoints,
};
pub use swing::SwingDetector;
