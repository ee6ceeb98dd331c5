use error_stack::{Report, bail};

use crate::error::IndicatorError;
use crate::indicator::{Indicator, close_prices};
use crate::model::Bar;

/// RSI (Relative Strength Index) using Wilder's smoothing method.
///
/// The first defined value appears at index `period - 1`, seeded from the
/// `period - 1` price deltas within the first `period` bars; later values
/// use Wilder smoothing.
pub struct Rsi {
    period: usize,
}

impl Rsi {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        if period < 2 {
            bail!(IndicatorError::InvalidParameter {
                name: "period must be > 1".into(),
            });
        }
        Ok(Self { period })
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        "rsi"
    }

    fn warmup(&self) -> usize {
        self.period - 1
    }

    fn column(&self, bars: &[Bar]) -> Result<Vec<Option<f64>>, Report<IndicatorError>> {
        let prices = close_prices(bars);
        let mut out = vec![None; prices.len()];
        if prices.len() < self.period {
            return Ok(out);
        }

        let deltas: Vec<f64> = prices.windows(2).map(|w| w[1] - w[0]).collect();
        let seed_len = self.period - 1;

        // Seed using simple average of the deltas inside the warm-up window
        let mut avg_gain: f64 = deltas[..seed_len]
            .iter()
            .map(|&d| d.max(0.0))
            .sum::<f64>()
            / seed_len as f64;
        let mut avg_loss: f64 = deltas[..seed_len]
            .iter()
            .map(|&d| (-d).max(0.0))
            .sum::<f64>()
            / seed_len as f64;

        out[self.period - 1] = Some(rsi_value(avg_gain, avg_loss));

        // Wilder smoothing for subsequent values
        for (i, &delta) in deltas.iter().enumerate().skip(seed_len) {
            let gain = delta.max(0.0);
            let loss = (-delta).max(0.0);
            avg_gain = (avg_gain * (self.period - 1) as f64 + gain) / self.period as f64;
            avg_loss = (avg_loss * (self.period - 1) as f64 + loss) / self.period as f64;
            out[i + 1] = Some(rsi_value(avg_gain, avg_loss));
        }

        Ok(out)
    }
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}
