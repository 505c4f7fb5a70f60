use tracing::debug;

use crate::analysis::structs::{IndicatorSeries, RegionBoundary, Segmentation};

/// Sign-based trend segmentation of a smoothed derivative series.
///
/// Indices where the slope magnitude falls below `inflection_tol` are
/// inflection candidates; they partition the series into contiguous groups.
/// Within each group the derivative is accumulated into a resetting running
/// sum, groups whose sum never leaves the noise band are zeroed, and the
/// sign of the surviving sums labels each index Up (+1), Down (-1) or
/// Neutral (0).
#[derive(Debug, Clone)]
pub struct TrendSegmenter {
    inflection_tol: f64,
    noise_threshold: f64,
}

impl TrendSegmenter {
    pub fn new(inflection_tol: f64, noise_threshold: f64) -> Self {
        Self {
            inflection_tol,
            noise_threshold,
        }
    }

    pub fn segment(&self, derivative: &[Option<f64>]) -> Segmentation {
        let crossing = self.crossing_mask(derivative);
        let cumulative_derivative = self.cumulative_derivative(derivative, &crossing);
        let region_sign = sign_series(&cumulative_derivative);
        let boundaries = detect_boundaries(&region_sign);
        debug!(
            "Segmentation complete: {} boundaries over {} indices",
            boundaries.len(),
            derivative.len()
        );
        Segmentation {
            cumulative_derivative,
            region_sign,
            boundaries,
        }
    }

    /// True where the slope is flat enough to be an inflection candidate.
    /// Undefined derivative entries are never candidates.
    fn crossing_mask(&self, derivative: &[Option<f64>]) -> Vec<bool> {
        derivative
            .iter()
            .map(|d| matches!(d, Some(v) if v.abs() < self.inflection_tol))
            .collect()
    }

    /// Running sum of the derivative, resetting at (and including) every
    /// crossing index. A group whose sum stays strictly inside the open
    /// interval (-noise_threshold, +noise_threshold) is judged noise and its
    /// defined entries are replaced by zeros.
    fn cumulative_derivative(
        &self,
        derivative: &[Option<f64>],
        crossing: &[bool],
    ) -> IndicatorSeries {
        let n = derivative.len();
        let mut out: IndicatorSeries = vec![None; n];

        let mut group_start = 0usize;
        let mut sum = 0.0;
        let mut group_max = f64::NEG_INFINITY;
        let mut group_min = f64::INFINITY;

        let mut close_group = |out: &mut IndicatorSeries, start: usize, end: usize, max: f64, min: f64| {
            if max < self.noise_threshold && min > -self.noise_threshold {
                for slot in out[start..end].iter_mut() {
                    if slot.is_some() {
                        *slot = Some(0.0);
                    }
                }
            }
        };

        for i in 0..n {
            if crossing[i] && i > group_start {
                close_group(&mut out, group_start, i, group_max, group_min);
                group_start = i;
                sum = 0.0;
                group_max = f64::NEG_INFINITY;
                group_min = f64::INFINITY;
            }
            if let Some(d) = derivative[i] {
                sum += d;
                group_max = group_max.max(sum);
                group_min = group_min.min(sum);
                out[i] = Some(sum);
            }
        }
        close_group(&mut out, group_start, n, group_max, group_min);

        out
    }
}

/// Sign label per index; undefined inputs stay undefined rather than
/// becoming a false flat region
pub fn sign_series(cumulative: &[Option<f64>]) -> Vec<Option<i8>> {
    cumulative
        .iter()
        .map(|c| {
            c.map(|v| {
                if v > 0.0 {
                    1
                } else if v < 0.0 {
                    -1
                } else {
                    0
                }
            })
        })
        .collect()
}

/// Record a boundary wherever a defined non-zero sign is followed by a
/// different defined sign. The first confirmed sign opens the first region
/// without emitting a boundary.
pub fn detect_boundaries(region_sign: &[Option<i8>]) -> Vec<RegionBoundary> {
    let mut boundaries = Vec::new();
    let mut prev: Option<i8> = None;
    for (index, sign) in region_sign.iter().enumerate() {
        let Some(sign) = *sign else { continue };
        if let Some(ended_sign) = prev {
            if ended_sign != 0 && sign != ended_sign {
                boundaries.push(RegionBoundary {
                    index,
                    ended_sign,
                    sign,
                });
            }
        }
        prev = Some(sign);
    }
    boundaries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segmenter() -> TrendSegmenter {
        TrendSegmenter::new(0.01, 20.0)
    }

    #[test]
    fn test_flat_derivative_is_all_crossing() {
        let derivative: Vec<Option<f64>> = vec![Some(0.001); 5];
        let seg = segmenter().segment(&derivative);

        // Every index starts a new single-element group; each group sums to
        // ~0.001, far inside the noise band, so everything is zeroed
        assert!(seg
            .cumulative_derivative
            .iter()
            .all(|c| *c == Some(0.0)));
        assert!(seg.region_sign.iter().all(|s| *s == Some(0)));
        assert!(seg.boundaries.is_empty());
    }

    #[test]
    fn test_noise_group_is_zeroed() {
        // One group peaking at 15 with threshold 20: rejected as noise
        let derivative: Vec<Option<f64>> = vec![Some(5.0), Some(5.0), Some(5.0), Some(-2.0)];
        let seg = segmenter().segment(&derivative);

        assert_eq!(
            seg.cumulative_derivative,
            vec![Some(0.0), Some(0.0), Some(0.0), Some(0.0)]
        );
        assert!(seg.region_sign.iter().all(|s| *s == Some(0)));
    }

    #[test]
    fn test_strong_group_is_kept() {
        let derivative: Vec<Option<f64>> = vec![Some(10.0), Some(10.0), Some(5.0)];
        let seg = segmenter().segment(&derivative);

        assert_eq!(
            seg.cumulative_derivative,
            vec![Some(10.0), Some(20.0), Some(25.0)]
        );
        assert_eq!(seg.region_sign, vec![Some(1), Some(1), Some(1)]);
    }

    #[test]
    fn test_noise_rejection_is_idempotent() {
        let derivative: Vec<Option<f64>> = vec![Some(5.0), Some(5.0), Some(5.0)];
        let first = segmenter().segment(&derivative);
        assert!(first
            .cumulative_derivative
            .iter()
            .all(|c| *c == Some(0.0)));

        // Re-running the stage on the already-zeroed values changes nothing
        let zeroed: Vec<Option<f64>> = first.cumulative_derivative.clone();
        let second = segmenter().segment(&zeroed);
        assert_eq!(second.cumulative_derivative, first.cumulative_derivative);
    }

    #[test]
    fn test_undefined_derivative_propagates() {
        let derivative: Vec<Option<f64>> = vec![None, None, Some(30.0), Some(10.0), None];
        let seg = segmenter().segment(&derivative);

        assert_eq!(seg.cumulative_derivative[0], None);
        assert_eq!(seg.cumulative_derivative[1], None);
        assert_eq!(seg.cumulative_derivative[2], Some(30.0));
        assert_eq!(seg.cumulative_derivative[3], Some(40.0));
        assert_eq!(seg.cumulative_derivative[4], None);
        assert_eq!(seg.region_sign[0], None);
        assert_eq!(seg.region_sign[4], None);
    }

    #[test]
    fn test_boundary_on_sign_flip() {
        // Up leg, a flat crossing, then a down leg; both legs clear the
        // noise threshold
        let derivative: Vec<Option<f64>> = vec![
            Some(15.0),
            Some(15.0),
            Some(0.001),
            Some(-15.0),
            Some(-15.0),
        ];
        let seg = segmenter().segment(&derivative);

        assert_eq!(seg.region_sign[0], Some(1));
        assert_eq!(seg.region_sign[1], Some(1));
        assert_eq!(seg.region_sign[3], Some(-1));
        assert_eq!(seg.boundaries.len(), 1);
        let boundary = seg.boundaries[0];
        assert_eq!(boundary.ended_sign, 1);
        assert_eq!(boundary.sign, -1);
    }

    #[test]
    fn test_region_sign_piecewise_constant_between_boundaries() {
        let derivative: Vec<Option<f64>> = vec![
            Some(12.0),
            Some(12.0),
            Some(0.001),
            Some(-11.0),
            Some(-11.0),
            Some(0.001),
            Some(13.0),
            Some(13.0),
        ];
        let seg = segmenter().segment(&derivative);
        assert_eq!(seg.boundaries.len(), 2);

        // Sign only changes at recorded boundary indices
        let boundary_indices: Vec<usize> = seg.boundaries.iter().map(|b| b.index).collect();
        let mut prev: Option<i8> = None;
        for (i, sign) in seg.region_sign.iter().enumerate() {
            let Some(sign) = *sign else { continue };
            if let Some(p) = prev {
                if p != 0 && sign != p {
                    assert!(boundary_indices.contains(&i), "unrecorded change at {}", i);
                }
            }
            prev = Some(sign);
        }
    }

    #[test]
    fn test_first_confirmed_sign_emits_no_boundary() {
        let derivative: Vec<Option<f64>> = vec![None, Some(25.0), Some(5.0)];
        let seg = segmenter().segment(&derivative);
        assert_eq!(seg.region_sign[1], Some(1));
        assert!(seg.boundaries.is_empty());
    }
}
