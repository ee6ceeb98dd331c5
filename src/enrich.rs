use error_stack::{Report, ResultExt};

use crate::error::IndicatorError;
use crate::indicator::Indicator;
use crate::indicator::ma::{Ema, Sma};
use crate::indicator::rsi::Rsi;
use crate::model::{EnrichedSeries, Series};

pub const SMA_PERIOD: usize = 10;
pub const EMA_PERIOD: usize = 20;
pub const RSI_PERIOD: usize = 14;

/// Append the SMA(10), EMA(20) and RSI(14) columns to a fetched series.
///
/// Pure transformation: the input series is embedded unmodified and every
/// column has exactly one entry per bar. Bars inside an indicator's warm-up
/// window carry `None` rather than a value.
pub fn enrich(series: Series) -> Result<EnrichedSeries, Report<IndicatorError>> {
    let sma = Sma::new(SMA_PERIOD)
        .change_context(IndicatorError::Computation)?
        .column(series.bars())
        .change_context(IndicatorError::Computation)?;
    let ema = Ema::new(EMA_PERIOD)
        .change_context(IndicatorError::Computation)?
        .column(series.bars())
        .change_context(IndicatorError::Computation)?;
    let rsi = Rsi::new(RSI_PERIOD)
        .change_context(IndicatorError::Computation)?
        .column(series.bars())
        .change_context(IndicatorError::Computation)?;

    Ok(EnrichedSeries {
        series,
        sma,
        ema,
        rsi,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Bar, Interval, LookbackRange};
    use chrono::{TimeZone, Utc};

    fn series_from_closes(closes: &[f64]) -> Series {
        let bars: Vec<Bar> = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar {
                timestamp: Utc
                    .timestamp_opt(1_700_000_000 + i as i64 * 86_400, 0)
                    .unwrap(),
                open: c,
                high: c + 1.0,
                low: c - 1.0,
                close: c,
                volume: 1000.0,
            })
            .collect();
        Series::new("TEST", LookbackRange::Month1, Interval::Day1, bars).unwrap()
    }

    #[test]
    fn enrichment_preserves_bar_count() {
        let series = series_from_closes(&[100.0; 30]);
        let enriched = enrich(series).unwrap();
        assert_eq!(enriched.series.len(), 30);
        assert_eq!(enriched.sma.len(), 30);
        assert_eq!(enriched.ema.len(), 30);
        assert_eq!(enriched.rsi.len(), 30);
    }

    #[test]
    fn warmup_windows_are_undefined_then_defined() {
        let series = series_from_closes(&[100.0; 40]);
        let enriched = enrich(series).unwrap();

        // SMA(10): first 9 undefined, defined from bar 10
        assert!(enriched.sma[..9].iter().all(Option::is_none));
        assert!(enriched.sma[9..].iter().all(Option::is_some));
        // EMA(20): first 19 undefined, defined from bar 20
        assert!(enriched.ema[..19].iter().all(Option::is_none));
        assert!(enriched.ema[19..].iter().all(Option::is_some));
        // RSI(14): first 13 undefined, defined from bar 14
        assert!(enriched.rsi[..13].iter().all(Option::is_none));
        assert!(enriched.rsi[13..].iter().all(Option::is_some));
    }

    #[test]
    fn short_series_is_not_an_error() {
        // A single bar is valid; all indicator columns stay undefined
        let series = series_from_closes(&[100.0]);
        let enriched = enrich(series).unwrap();
        assert_eq!(enriched.sma, vec![None]);
        assert_eq!(enriched.ema, vec![None]);
        assert_eq!(enriched.rsi, vec![None]);
    }

    #[test]
    fn input_bars_survive_unmodified() {
        let closes = [10.0, 11.0, 12.0, 13.0, 14.0];
        let series = series_from_closes(&closes);
        let original = series.bars().to_vec();
        let enriched = enrich(series).unwrap();
        assert_eq!(enriched.series.bars(), original.as_slice());
    }
}
