pub mod ma;
pub mod rsi;

use error_stack::Report;

use crate::error::IndicatorError;
use crate::model::Bar;

/// A technical analysis indicator that derives a column from a slice of bars.
///
/// Bars must be in ascending chronological order (oldest first).
pub trait Indicator: Send {
    /// Unique name of this indicator (e.g., "rsi", "sma").
    #[allow(dead_code)]
    fn name(&self) -> &str;

    /// Number of leading bars for which no value is defined.
    fn warmup(&self) -> usize;

    /// Calculate the indicator column from bars.
    ///
    /// The output has exactly one entry per input bar, aligned by index.
    /// The first `warmup()` entries are `None`; a lookback window larger
    /// than the input leaves the whole column `None`.
    fn column(&self, bars: &[Bar]) -> Result<Vec<Option<f64>>, Report<IndicatorError>>;
}

/// Extract close prices from a slice of bars.
pub fn close_prices(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}
