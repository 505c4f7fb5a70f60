use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

pub type TimestampMS = i64;

/// One sampling interval's OHLCV summary, as delivered by the data-fetch
/// collaborator. Numeric fields are already floating point and timestamps
/// are absolute epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: TimestampMS,
    pub close_time: TimestampMS,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    #[allow(clippy::too_many_arguments)]
    pub fn new_from_values(
        open_time: TimestampMS,
        close_time: TimestampMS,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            open_time,
            close_time,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

/// Immutable, positionally indexed container of candles.
///
/// The series assumes a contiguous, strictly time-ordered input with a fixed
/// sampling interval; all window-based computations downstream operate on
/// index offsets, not wall-clock offsets. Nothing downstream mutates the
/// series: derived values live in parallel indexed arrays.
#[derive(Debug, Clone, Default)]
pub struct CandleSeries {
    candles: Vec<Candle>,
    /// open_time -> positional index, for resolving timestamps back to indices
    time_index: FxHashMap<TimestampMS, usize>,
}

impl CandleSeries {
    pub fn from_candles(candles: Vec<Candle>) -> Self {
        let time_index = candles
            .iter()
            .enumerate()
            .map(|(i, c)| (c.open_time, i))
            .collect();
        Self {
            candles,
            time_index,
        }
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Candle> {
        self.candles.get(index)
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    /// Resolve a candle open time back to its positional index
    pub fn index_of(&self, open_time: TimestampMS) -> Option<usize> {
        self.time_index.get(&open_time).copied()
    }

    pub fn first_open_time(&self) -> Option<TimestampMS> {
        self.candles.first().map(|c| c.open_time)
    }

    pub fn last_open_time(&self) -> Option<TimestampMS> {
        self.candles.last().map(|c| c.open_time)
    }

    /// Extract the close price array for the smoothing pipeline
    pub fn close_prices(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }
}
