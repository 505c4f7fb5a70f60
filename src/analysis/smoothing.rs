use crate::analysis::structs::{IndicatorSeries, SmoothedSeries};
use crate::series::CandleSeries;

/// Double centered moving average over close prices, plus its first
/// difference.
///
/// Each pass is a trailing rolling mean reindexed backward by half its window
/// so the value aligns with the window midpoint rather than its trailing
/// edge. The shift trades real-time usability for phase accuracy; callers
/// needing causality must omit it.
#[derive(Debug, Clone)]
pub struct SmoothingPipeline {
    period: usize,
    smooth_period: usize,
}

impl SmoothingPipeline {
    pub fn new(period: usize, smooth_period: usize) -> Self {
        Self {
            period,
            smooth_period,
        }
    }

    pub fn smooth(&self, series: &CandleSeries) -> SmoothedSeries {
        let closes: IndicatorSeries = series.close_prices().into_iter().map(Some).collect();
        let sma = centered_mean(&closes, self.period);
        let smoothed_sma = centered_mean(&sma, self.smooth_period);
        let derivative = first_difference(&smoothed_sma);
        SmoothedSeries {
            sma,
            smoothed_sma,
            derivative,
        }
    }
}

/// Trailing rolling mean shifted backward by `floor(window / 2)` positions.
///
/// Two explicit array-to-array passes with a running window sum, O(N) total.
/// A window containing any undefined input yields an undefined output.
pub fn centered_mean(values: &[Option<f64>], window: usize) -> IndicatorSeries {
    let n = values.len();
    if window == 0 || window > n {
        return vec![None; n];
    }

    let mut trailing: IndicatorSeries = vec![None; n];
    let mut sum = 0.0;
    let mut undefined = 0usize;
    for i in 0..n {
        match values[i] {
            Some(v) => sum += v,
            None => undefined += 1,
        }
        if i >= window {
            match values[i - window] {
                Some(v) => sum -= v,
                None => undefined -= 1,
            }
        }
        if i + 1 >= window && undefined == 0 {
            trailing[i] = Some(sum / window as f64);
        }
    }

    let shift = window / 2;
    let mut centered = vec![None; n];
    for i in 0..n - shift {
        centered[i] = trailing[i + shift];
    }
    centered
}

/// First difference; undefined wherever either term is undefined
pub fn first_difference(values: &[Option<f64>]) -> IndicatorSeries {
    let mut out = vec![None; values.len()];
    for i in 1..values.len() {
        if let (Some(prev), Some(curr)) = (values[i - 1], values[i]) {
            out[i] = Some(curr - prev);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::Candle;

    fn series_from_closes(closes: &[f64]) -> CandleSeries {
        let candles = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                Candle::new_from_values(
                    i as i64 * 60000,
                    i as i64 * 60000 + 59999,
                    c,
                    c + 0.5,
                    c - 0.5,
                    c,
                    1000.0,
                )
            })
            .collect();
        CandleSeries::from_candles(candles)
    }

    #[test]
    fn test_centered_mean_alignment() {
        let values: Vec<Option<f64>> = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]
            .into_iter()
            .map(Some)
            .collect();
        let out = centered_mean(&values, 3);

        // Trailing mean of [1,2,3] is 2.0 at index 2, shifted back by 1
        assert_eq!(out[0], None);
        assert_eq!(out[1], Some(2.0));
        assert_eq!(out[2], Some(3.0));
        assert_eq!(out[3], Some(4.0));
        assert_eq!(out[4], Some(5.0));
        assert_eq!(out[5], None);
    }

    #[test]
    fn test_centered_mean_propagates_undefined_inputs() {
        let values = vec![None, Some(2.0), Some(4.0), Some(6.0), Some(8.0)];
        let out = centered_mean(&values, 2);

        // Any window touching the leading None stays undefined
        assert_eq!(out[0], None);
        assert_eq!(out[1], Some(3.0));
        assert_eq!(out[2], Some(5.0));
        assert_eq!(out[3], Some(7.0));
        assert_eq!(out[4], None);
    }

    #[test]
    fn test_centered_mean_window_larger_than_input() {
        let values = vec![Some(1.0), Some(2.0)];
        assert_eq!(centered_mean(&values, 5), vec![None, None]);
    }

    #[test]
    fn test_first_difference() {
        let values = vec![None, Some(10.0), Some(12.5), None, Some(20.0)];
        let out = first_difference(&values);
        assert_eq!(out, vec![None, None, Some(2.5), None, None]);
    }

    #[test]
    fn test_linear_closes_yield_constant_derivative() {
        // Close = 100, 101, ..., 119 with period=4, smooth_period=2: the
        // derivative must be exactly the input slope wherever defined.
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let series = series_from_closes(&closes);

        let out = SmoothingPipeline::new(4, 2).smooth(&series);

        let defined: Vec<(usize, f64)> = out
            .derivative
            .iter()
            .enumerate()
            .filter_map(|(i, d)| d.map(|v| (i, v)))
            .collect();
        assert!(!defined.is_empty());
        for (i, d) in &defined {
            assert!((d - 1.0).abs() < 1e-9, "derivative at {} was {}", i, d);
        }

        // A slope of 1.0 never drops below a sub-unit inflection tolerance,
        // so segmentation sees one unbroken up-region: no boundaries, all
        // defined signs positive, and a running sum that never resets
        let seg = crate::analysis::segment::TrendSegmenter::new(0.5, 0.1).segment(&out.derivative);
        assert!(seg.boundaries.is_empty());
        for (i, _) in &defined {
            assert_eq!(seg.region_sign[*i], Some(1));
        }
        let sums: Vec<f64> = seg.cumulative_derivative.iter().flatten().copied().collect();
        assert!(sums.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_smoothing_output_lengths_match_input() {
        let closes: Vec<f64> = (0..50).map(|i| 100.0 + (i as f64 * 0.3).sin()).collect();
        let series = series_from_closes(&closes);

        let out = SmoothingPipeline::new(10, 4).smooth(&series);
        assert_eq!(out.sma.len(), 50);
        assert_eq!(out.smoothed_sma.len(), 50);
        assert_eq!(out.derivative.len(), 50);

        // Warm-up region of the first pass: trailing undefined until the
        // first full window, minus the backward shift
        assert_eq!(out.sma[0], None);
        assert!(out.sma[10].is_some());
    }
}
