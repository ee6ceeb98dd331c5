pub mod yahoo;

use error_stack::Report;
use futures::future::BoxFuture;

use crate::error::FetchError;
use crate::model::{Interval, LookbackRange, Series};

/// Abstraction over a market-data provider.
///
/// Uses `BoxFuture` (from `futures` crate) instead of `async fn` in trait
/// to keep the trait object-safe (`dyn MarketData`).
pub trait MarketData: Send + Sync {
    /// Fetch an ordered OHLCV series for one symbol.
    ///
    /// Single attempt: no retry, no backoff, no caching. An empty result is
    /// `FetchError::NoData`, a transport or provider failure is
    /// `FetchError::Upstream`.
    fn fetch_bars(
        &self,
        symbol: &str,
        range: LookbackRange,
        interval: Interval,
    ) -> BoxFuture<'_, Result<Series, Report<FetchError>>>;
}
