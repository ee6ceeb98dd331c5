use std::fmt;

use chrono::{DateTime, Utc};
use error_stack::Report;
use serde::{Deserialize, Serialize};

use crate::error::SeriesError;

/// Lookback window supported by the application.
///
/// String representations match the request format (e.g. `"1mo"`, `"1y"`)
/// and are passed through to the market-data provider unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LookbackRange {
    Day1,
    Day5,
    Month1,
    Month3,
    Month6,
    Year1,
    Year2,
    Year5,
    Ytd,
    Max,
}

impl LookbackRange {
    /// Parse a request-format string into a `LookbackRange`.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "1d" => Some(Self::Day1),
            "5d" => Some(Self::Day5),
            "1mo" => Some(Self::Month1),
            "3mo" => Some(Self::Month3),
            "6mo" => Some(Self::Month6),
            "1y" => Some(Self::Year1),
            "2y" => Some(Self::Year2),
            "5y" => Some(Self::Year5),
            "ytd" => Some(Self::Ytd),
            "max" => Some(Self::Max),
            _ => None,
        }
    }

    /// Return the request-format string representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Day1 => "1d",
            Self::Day5 => "5d",
            Self::Month1 => "1mo",
            Self::Month3 => "3mo",
            Self::Month6 => "6mo",
            Self::Year1 => "1y",
            Self::Year2 => "2y",
            Self::Year5 => "5y",
            Self::Ytd => "ytd",
            Self::Max => "max",
        }
    }
}

impl Default for LookbackRange {
    fn default() -> Self {
        Self::Month1
    }
}

impl fmt::Display for LookbackRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Bar sampling granularity supported by the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    Min1,
    Min5,
    Min15,
    Min30,
    Hour1,
    Day1,
    Week1,
    Month1,
}

impl Interval {
    /// Parse a request-format string into an `Interval`.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "1m" => Some(Self::Min1),
            "5m" => Some(Self::Min5),
            "15m" => Some(Self::Min15),
            "30m" => Some(Self::Min30),
            "1h" => Some(Self::Hour1),
            "1d" => Some(Self::Day1),
            "1wk" => Some(Self::Week1),
            "1mo" => Some(Self::Month1),
            _ => None,
        }
    }

    /// Return the request-format string representation.
    ///
    /// This is also the interval string the provider's chart endpoint expects.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Min1 => "1m",
            Self::Min5 => "5m",
            Self::Min15 => "15m",
            Self::Min30 => "30m",
            Self::Hour1 => "1h",
            Self::Day1 => "1d",
            Self::Week1 => "1wk",
            Self::Month1 => "1mo",
        }
    }
}

impl Default for Interval {
    fn default() -> Self {
        Self::Day1
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One OHLCV trading interval.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// An ordered, validated OHLCV time series for one symbol.
///
/// Construction enforces the series invariants: at least one bar, strictly
/// ascending timestamps, no duplicates. Bars are not modifiable afterwards.
#[derive(Debug, Clone)]
pub struct Series {
    symbol: String,
    range: LookbackRange,
    interval: Interval,
    bars: Vec<Bar>,
}

impl Series {
    pub fn new(
        symbol: impl Into<String>,
        range: LookbackRange,
        interval: Interval,
        bars: Vec<Bar>,
    ) -> Result<Self, Report<SeriesError>> {
        if bars.is_empty() {
            return Err(Report::new(SeriesError::Empty));
        }
        for pair in bars.windows(2) {
            if pair[1].timestamp == pair[0].timestamp {
                return Err(Report::new(SeriesError::DuplicateTimestamp));
            }
            if pair[1].timestamp < pair[0].timestamp {
                return Err(Report::new(SeriesError::OutOfOrder));
            }
        }
        Ok(Self {
            symbol: symbol.into(),
            range,
            interval,
            bars,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn range(&self) -> LookbackRange {
        self.range
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

/// A `Series` with indicator columns aligned 1:1 with its bars.
///
/// Each column has exactly `series.len()` entries; leading entries inside an
/// indicator's warm-up window are `None`.
#[derive(Debug, Clone)]
pub struct EnrichedSeries {
    pub series: Series,
    pub sma: Vec<Option<f64>>,
    pub ema: Vec<Option<f64>>,
    pub rsi: Vec<Option<f64>>,
}
