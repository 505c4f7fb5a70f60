use tracing::debug;

use crate::analysis::structs::{SwingKind, SwingPoint, SwingPoints};
use crate::series::{Candle, CandleSeries};

/// Which extreme the scan is currently extending
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SeekMode {
    SeekingHigh,
    SeekingLow,
}

impl SeekMode {
    fn flip(self) -> Self {
        match self {
            SeekMode::SeekingHigh => SeekMode::SeekingLow,
            SeekMode::SeekingLow => SeekMode::SeekingHigh,
        }
    }

    fn kind(self) -> SwingKind {
        match self {
            SeekMode::SeekingHigh => SwingKind::High,
            SeekMode::SeekingLow => SwingKind::Low,
        }
    }
}

/// Alternating-mode forward scan over raw High/Low values.
///
/// Starting in `SeekingHigh`, the detector extends a running extreme through a
/// look-ahead window and confirms it early when price reverses by at least
/// `swing_percent` from the extreme. Confirmation is tested only at the
/// instant a new extreme is set, not on every subsequent bar; a reversal
/// arriving later in the window still lets the extreme stand when the window
/// closes. This greedy-extension behavior is intentional.
#[derive(Debug, Clone)]
pub struct SwingDetector {
    look_ahead: usize,
    swing_percent: f64,
}

impl SwingDetector {
    pub fn new(look_ahead: usize, swing_percent: f64) -> Self {
        Self {
            look_ahead,
            swing_percent,
        }
    }

    /// Scan the series and return the confirmed swing points in order.
    ///
    /// Degenerate windows (`look_ahead >= len`) produce empty output; the
    /// orchestrator rejects them as configuration errors before getting here.
    /// Indices inside the final look-ahead window are never evaluated: a full
    /// window of history is required to confirm any point near the end.
    pub fn detect(&self, series: &CandleSeries) -> SwingPoints {
        let n = series.len();
        let mut out = SwingPoints::default();
        if self.look_ahead == 0 || self.look_ahead >= n {
            return out;
        }

        let candles = series.candles();
        let mut mode = SeekMode::SeekingHigh;
        let mut cursor = 0usize;

        while cursor < n - self.look_ahead {
            match self.scan_leg(candles, cursor, mode) {
                Some((index, price)) => {
                    out.points.push(SwingPoint {
                        index,
                        timestamp: candles[index].open_time,
                        price,
                        kind: mode.kind(),
                    });
                    mode = mode.flip();
                    cursor = index + 1;
                }
                // No new extreme in the whole window: skip past it
                None => cursor += self.look_ahead + 1,
            }
        }

        debug!(
            "Swing scan finished: {} points over {} candles (look_ahead={}, swing={}%)",
            out.len(),
            n,
            self.look_ahead,
            self.swing_percent
        );
        out
    }

    /// Extend-while-improving scan of one look-ahead window.
    ///
    /// Tracks the running extreme from `start`, updating it whenever a bar
    /// improves on it, and stops early once the same bar also shows a reversal
    /// of at least `swing_percent` from the updated extreme. Returns the
    /// extreme only if it advanced past the window start.
    fn scan_leg(&self, candles: &[Candle], start: usize, mode: SeekMode) -> Option<(usize, f64)> {
        let mut best = match mode {
            SeekMode::SeekingHigh => candles[start].high,
            SeekMode::SeekingLow => candles[start].low,
        };
        let mut best_index = start;
        // Clamp the scan to the last valid index
        let end = (start + self.look_ahead).min(candles.len() - 1);

        for (i, candle) in candles.iter().enumerate().take(end + 1).skip(start + 1) {
            match mode {
                SeekMode::SeekingHigh => {
                    if candle.high > best {
                        best = candle.high;
                        best_index = i;
                        if candle.low <= best * (1.0 - self.swing_percent / 100.0) {
                            debug!("Swing high confirmed at index {} ({:.2})", i, best);
                            break;
                        }
                    }
                }
                SeekMode::SeekingLow => {
                    if candle.low < best {
                        best = candle.low;
                        best_index = i;
                        if candle.high >= best * (1.0 + self.swing_percent / 100.0) {
                            debug!("Swing low confirmed at index {} ({:.2})", i, best);
                            break;
                        }
                    }
                }
            }
        }

        (best_index != start).then_some((best_index, best))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(open_time: i64, high: f64, low: f64) -> Candle {
        let mid = (high + low) / 2.0;
        Candle::new_from_values(open_time, open_time + 59999, mid, high, low, mid, 1000.0)
    }

    fn series_from_high_low(pairs: &[(f64, f64)]) -> CandleSeries {
        let candles = pairs
            .iter()
            .enumerate()
            .map(|(i, &(h, l))| candle(i as i64 * 60000, h, l))
            .collect();
        CandleSeries::from_candles(candles)
    }

    #[test]
    fn test_v_shape_emits_single_high() {
        // Highs rise 100 -> 110 over five candles, then a 5.45% retrace to
        // low 104 on candle 5; nothing afterwards improves on either extreme.
        let mut pairs = vec![
            (100.0, 99.6),
            (102.5, 102.0),
            (105.0, 104.5),
            (107.5, 107.0),
            (110.0, 109.5),
            (106.0, 104.0),
        ];
        pairs.extend(std::iter::repeat((106.0, 104.5)).take(14));
        let series = series_from_high_low(&pairs);

        let swings = SwingDetector::new(10, 1.0).detect(&series);

        assert_eq!(swings.len(), 1);
        let point = &swings.points[0];
        assert_eq!(point.kind, SwingKind::High);
        assert_eq!(point.index, 4);
        assert_eq!(point.price, 110.0);
        assert_eq!(point.timestamp, 4 * 60000);
    }

    #[test]
    fn test_kinds_strictly_alternate() {
        // Zigzag with >1% legs so every extreme confirms
        let mut pairs = Vec::new();
        for cycle in 0..5 {
            let base = 100.0 + cycle as f64;
            pairs.push((base, base - 0.5));
            pairs.push((base + 4.0, base + 3.0));
            pairs.push((base + 1.0, base - 2.0));
        }
        pairs.extend(std::iter::repeat((100.0, 99.5)).take(5));
        let series = series_from_high_low(&pairs);

        let swings = SwingDetector::new(4, 1.0).detect(&series);

        assert!(swings.len() >= 2);
        for pair in swings.points.windows(2) {
            assert_ne!(pair[0].kind, pair[1].kind, "adjacent kinds must differ");
        }
        assert_eq!(swings.points[0].kind, SwingKind::High);
        // Indices strictly increase (monotonic cursor)
        for pair in swings.points.windows(2) {
            assert!(pair[0].index < pair[1].index);
        }
    }

    #[test]
    fn test_confirmation_stops_extension_early() {
        // Candle 1 sets a new high and simultaneously retraces >1%, so the
        // scan breaks there; the larger high at candle 3 must be ignored.
        let pairs = vec![
            (100.0, 99.5),
            (112.0, 110.0), // 110.0 <= 112 * 0.99 = 110.88 -> confirmed
            (111.0, 110.5),
            (120.0, 118.0),
            (119.0, 118.5),
            (119.0, 118.5),
            (119.0, 118.5),
            (119.0, 118.5),
        ];
        let series = series_from_high_low(&pairs);

        let swings = SwingDetector::new(4, 1.0).detect(&series);

        let high = &swings.points[0];
        assert_eq!(high.kind, SwingKind::High);
        assert_eq!(high.index, 1);
        assert_eq!(high.price, 112.0);
    }

    #[test]
    fn test_confirmation_invariant_holds() {
        let mut pairs = Vec::new();
        for cycle in 0..4 {
            let base = 100.0 + cycle as f64 * 0.3;
            pairs.push((base, base - 0.2));
            pairs.push((base + 5.0, base + 4.0));
            pairs.push((base + 2.0, base - 1.0));
        }
        pairs.extend(std::iter::repeat((100.0, 99.8)).take(6));
        let series = series_from_high_low(&pairs);
        let look_ahead = 5;
        let swing_percent = 1.0;

        let swings = SwingDetector::new(look_ahead, swing_percent).detect(&series);
        assert!(!swings.is_empty());

        let candles = series.candles();
        let last = swings.points.last().unwrap();
        for point in &swings.points {
            let window_end = (point.index + look_ahead).min(candles.len() - 1);
            let confirmed = (point.index + 1..=window_end).any(|j| match point.kind {
                SwingKind::High => {
                    candles[j].low <= point.price * (1.0 - swing_percent / 100.0)
                }
                SwingKind::Low => {
                    candles[j].high >= point.price * (1.0 + swing_percent / 100.0)
                }
            });
            assert!(
                confirmed || point.index == last.index,
                "unconfirmed non-terminal swing at index {}",
                point.index
            );
        }
    }

    #[test]
    fn test_window_without_new_extreme_is_skipped() {
        // Candle 0 holds the highest high, so the first window finds nothing
        // and the cursor jumps past it entirely.
        let mut pairs = vec![(110.0, 108.0)];
        pairs.extend(std::iter::repeat((105.0, 104.0)).take(9));
        let series = series_from_high_low(&pairs);

        let swings = SwingDetector::new(3, 1.0).detect(&series);
        assert!(swings.is_empty());
    }

    #[test]
    fn test_look_ahead_exceeding_length_returns_empty() {
        let pairs = vec![(100.0, 99.0), (105.0, 103.0), (101.0, 98.0)];
        let series = series_from_high_low(&pairs);

        assert!(SwingDetector::new(3, 1.0).detect(&series).is_empty());
        assert!(SwingDetector::new(10, 1.0).detect(&series).is_empty());
    }

    #[test]
    fn test_detection_is_deterministic() {
        let mut pairs = Vec::new();
        for i in 0..60 {
            let phase = (i as f64 * 0.35).sin();
            pairs.push((100.0 + phase * 5.0 + 0.4, 100.0 + phase * 5.0 - 0.4));
        }
        let series = series_from_high_low(&pairs);
        let detector = SwingDetector::new(8, 1.0);

        let first = detector.detect(&series);
        let second = detector.detect(&series);
        assert_eq!(first, second);
    }
}
