use tracing::debug;

use crate::analysis::structs::{ExtremumMarker, MarkerKind, MarkerSet, RegionBoundary};
use crate::series::CandleSeries;

/// Locates the dominant extreme of each closed trend region.
///
/// For every boundary, the region that just ended determines what to look
/// for: an ended up-region means a high occurred nearby, an ended down-region
/// a low. The search window spans from the previous boundary to the current
/// one, extended by `padding` candles on both sides and clamped to series
/// bounds; padding compensates for the smoothing pipeline's phase lag
/// relative to raw price. Windows of consecutive regions may overlap and are
/// searched independently.
#[derive(Debug, Clone)]
pub struct ExtremumLocator {
    padding: usize,
}

impl ExtremumLocator {
    pub fn new(padding: usize) -> Self {
        Self { padding }
    }

    pub fn locate(&self, series: &CandleSeries, boundaries: &[RegionBoundary]) -> MarkerSet {
        let n = series.len();
        let mut set = MarkerSet::default();
        if n == 0 {
            return set;
        }

        let candles = series.candles();
        let mut previous_boundary = 0usize;
        for boundary in boundaries {
            let start = previous_boundary.saturating_sub(self.padding);
            let end = (boundary.index + self.padding).min(n - 1);

            if boundary.ended_sign > 0 {
                let (index, price) = argmax_high(candles, start, end);
                set.markers.push(ExtremumMarker {
                    index,
                    price,
                    kind: MarkerKind::High,
                });
            } else if boundary.ended_sign < 0 {
                let (index, price) = argmin_low(candles, start, end);
                set.markers.push(ExtremumMarker {
                    index,
                    price,
                    kind: MarkerKind::Low,
                });
            }

            previous_boundary = boundary.index;
        }

        debug!(
            "Located {} extremum markers from {} boundaries (padding={})",
            set.len(),
            boundaries.len(),
            self.padding
        );
        set
    }
}

fn argmax_high(candles: &[crate::series::Candle], start: usize, end: usize) -> (usize, f64) {
    let mut best_index = start;
    let mut best = candles[start].high;
    for (i, candle) in candles.iter().enumerate().take(end + 1).skip(start + 1) {
        if candle.high > best {
            best = candle.high;
            best_index = i;
        }
    }
    (best_index, best)
}

fn argmin_low(candles: &[crate::series::Candle], start: usize, end: usize) -> (usize, f64) {
    let mut best_index = start;
    let mut best = candles[start].low;
    for (i, candle) in candles.iter().enumerate().take(end + 1).skip(start + 1) {
        if candle.low < best {
            best = candle.low;
            best_index = i;
        }
    }
    (best_index, best)
}
