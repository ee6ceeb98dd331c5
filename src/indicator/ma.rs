use error_stack::{Report, bail};

use crate::error::IndicatorError;
use crate::indicator::{Indicator, close_prices};
use crate::model::Bar;

/// Simple Moving Average.
pub struct Sma {
    period: usize,
}

impl Sma {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        if period == 0 {
            bail!(IndicatorError::InvalidParameter {
                name: "period must be > 0".into(),
            });
        }
        Ok(Self { period })
    }

    /// Calculate the aligned SMA column from a price slice (internal helper).
    pub fn column_prices(&self, prices: &[f64]) -> Vec<Option<f64>> {
        let mut out = vec![None; prices.len()];
        if prices.len() < self.period {
            return out;
        }
        for (i, window) in prices.windows(self.period).enumerate() {
            out[i + self.period - 1] = Some(window.iter().sum::<f64>() / self.period as f64);
        }
        out
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        "sma"
    }

    fn warmup(&self) -> usize {
        self.period - 1
    }

    fn column(&self, bars: &[Bar]) -> Result<Vec<Option<f64>>, Report<IndicatorError>> {
        Ok(self.column_prices(&close_prices(bars)))
    }
}

/// Exponential Moving Average.
pub struct Ema {
    period: usize,
}

impl Ema {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        if period == 0 {
            bail!(IndicatorError::InvalidParameter {
                name: "period must be > 0".into(),
            });
        }
        Ok(Self { period })
    }

    /// Calculate the aligned EMA column from a price slice (internal helper).
    pub fn column_prices(&self, prices: &[f64]) -> Vec<Option<f64>> {
        let mut out = vec![None; prices.len()];
        if prices.len() < self.period {
            return out;
        }

        let k = 2.0 / (self.period as f64 + 1.0);
        // Seed with SMA of first `period` values
        let mut ema = prices[..self.period].iter().sum::<f64>() / self.period as f64;
        out[self.period - 1] = Some(ema);

        for (i, &price) in prices.iter().enumerate().skip(self.period) {
            ema = price * k + ema * (1.0 - k);
            out[i] = Some(ema);
        }

        out
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        "ema"
    }

    fn warmup(&self) -> usize {
        self.period - 1
    }

    fn column(&self, bars: &[Bar]) -> Result<Vec<Option<f64>>, Report<IndicatorError>> {
        Ok(self.column_prices(&close_prices(bars)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar {
                timestamp: Utc.timestamp_opt(1_700_000_000 + i as i64 * 60, 0).unwrap(),
                open: c,
                high: c,
                low: c,
                close: c,
                volume: 1.0,
            })
            .collect()
    }

    #[test]
    fn sma_period_zero_invalid() {
        assert!(Sma::new(0).is_err());
    }

    #[test]
    fn sma_short_input_is_all_none() {
        let sma = Sma::new(5).unwrap();
        let column = sma.column(&bars_from_closes(&[1.0; 4])).unwrap();
        assert_eq!(column.len(), 4);
        assert!(column.iter().all(Option::is_none));
    }

    #[test]
    fn sma_column_aligned_with_input() {
        let sma = Sma::new(3).unwrap();
        let column = sma.column(&bars_from_closes(&[10.0; 5])).unwrap();
        assert_eq!(column.len(), 5);
        assert!(column[0].is_none());
        assert!(column[1].is_none());
        for v in &column[2..] {
            assert!((v.unwrap() - 10.0).abs() < 1e-9);
        }
    }

    #[test]
    fn sma_known_values() {
        let sma = Sma::new(3).unwrap();
        let column = sma.column(&bars_from_closes(&[1.0, 2.0, 3.0, 4.0])).unwrap();
        // (1+2+3)/3 = 2.0 at index 2, (2+3+4)/3 = 3.0 at index 3
        assert!((column[2].unwrap() - 2.0).abs() < 1e-9);
        assert!((column[3].unwrap() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn ema_period_zero_invalid() {
        assert!(Ema::new(0).is_err());
    }

    #[test]
    fn ema_short_input_is_all_none() {
        let ema = Ema::new(5).unwrap();
        let column = ema.column(&bars_from_closes(&[1.0; 4])).unwrap();
        assert!(column.iter().all(Option::is_none));
    }

    #[test]
    fn ema_flat_prices() {
        let ema = Ema::new(3).unwrap();
        let column = ema.column(&bars_from_closes(&[10.0; 6])).unwrap();
        assert!(column[0].is_none());
        assert!(column[1].is_none());
        for v in &column[2..] {
            assert!((v.unwrap() - 10.0).abs() < 1e-9);
        }
    }

    #[test]
    fn ema_seed_equals_sma() {
        // First defined EMA value equals SMA of the first `period` prices
        let ema = Ema::new(3).unwrap();
        let column = ema.column(&bars_from_closes(&[1.0, 2.0, 3.0, 4.0])).unwrap();
        // seed = (1+2+3)/3 = 2.0 at index 2
        assert!((column[2].unwrap() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn ema_warmup_matches_leading_nones() {
        let ema = Ema::new(4).unwrap();
        let column = ema.column(&bars_from_closes(&[1.0; 10])).unwrap();
        let leading = column.iter().take_while(|v| v.is_none()).count();
        assert_eq!(leading, ema.warmup());
    }
}
