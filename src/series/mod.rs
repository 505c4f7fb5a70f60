pub mod structs;

pub use structs::{Candle, CandleSeries, TimestampMS};
