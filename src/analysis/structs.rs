use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::series::TimestampMS;

/// Indicator values aligned to the candle index domain. `None` marks the
/// warm-up/cool-down positions where a rolling computation is undefined;
/// undefined inputs propagate as undefined outputs, never as a coerced zero.
pub type IndicatorSeries = Vec<Option<f64>>;

/// Kind of a confirmed swing point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwingKind {
    High,
    Low,
}

/// A confirmed local price extreme, validated by a subsequent reversal of at
/// least the configured threshold percentage. Created once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwingPoint {
    pub index: usize,
    pub timestamp: TimestampMS,
    pub price: f64,
    pub kind: SwingKind,
}

/// Ordered swing detector output. Kinds strictly alternate High, Low, High...
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SwingPoints {
    pub points: Vec<SwingPoint>,
}

impl SwingPoints {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Sparse index -> price mapping of the confirmed highs
    pub fn highs(&self) -> BTreeMap<usize, f64> {
        self.points
            .iter()
            .filter(|p| p.kind == SwingKind::High)
            .map(|p| (p.index, p.price))
            .collect()
    }

    /// Sparse index -> price mapping of the confirmed lows
    pub fn lows(&self) -> BTreeMap<usize, f64> {
        self.points
            .iter()
            .filter(|p| p.kind == SwingKind::Low)
            .map(|p| (p.index, p.price))
            .collect()
    }
}

/// Output of the smoothing pipeline, all aligned to the input index domain
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SmoothedSeries {
    /// Centered rolling mean of the close prices
    pub sma: IndicatorSeries,
    /// Second centered rolling mean applied on top of `sma`
    pub smoothed_sma: IndicatorSeries,
    /// First difference of `smoothed_sma`
    pub derivative: IndicatorSeries,
}

/// A trend-region boundary: the index where the region sign transitions from
/// one non-zero value to a different value. `ended_sign` is the sign of the
/// region that just closed, `sign` the one that opens here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionBoundary {
    pub index: usize,
    pub ended_sign: i8,
    pub sign: i8,
}

/// Trend segmentation output: per-index cumulative derivative and sign label,
/// plus the ordered region boundaries
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Segmentation {
    /// Per-group resetting running sum of the derivative, noise groups zeroed
    pub cumulative_derivative: IndicatorSeries,
    /// sign(cumulative_derivative): -1, 0 or +1 where defined
    pub region_sign: Vec<Option<i8>>,
    pub boundaries: Vec<RegionBoundary>,
}

/// Kind of a located extremum marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkerKind {
    High,
    Low,
}

/// The dominant High or Low located within a padded window around a
/// trend-region boundary. Immutable once computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtremumMarker {
    pub index: usize,
    pub price: f64,
    pub kind: MarkerKind,
}

/// Extremum locator output, one marker per closed trend region
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkerSet {
    pub markers: Vec<ExtremumMarker>,
}

impl MarkerSet {
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn highs(&self) -> BTreeMap<usize, f64> {
        self.markers
            .iter()
            .filter(|m| m.kind == MarkerKind::High)
            .map(|m| (m.index, m.price))
            .collect()
    }

    pub fn lows(&self) -> BTreeMap<usize, f64> {
        self.markers
            .iter()
            .filter(|m| m.kind == MarkerKind::Low)
            .map(|m| (m.index, m.price))
            .collect()
    }
}

/// Full analysis output: the raw swing pipeline and the smoothed trend
/// pipeline over the same input series. Serializes with JSON `null` as the
/// explicit "no value" sentinel for undefined indicator entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub swings: SwingPoints,
    pub smoothing: SmoothedSeries,
    pub segmentation: Segmentation,
    pub markers: MarkerSet,
}
