use derive_more::{Display, Error};

#[derive(Debug, Display, Error)]
pub enum ConfigError {
    #[display("failed to read config file")]
    ReadFile,
    #[display("failed to parse config: {reason}")]
    Parse { reason: String },
    #[display("invalid config: {field}")]
    Validation { field: String },
}

#[derive(Debug, Display, Error)]
pub enum SeriesError {
    #[display("series contains no bars")]
    Empty,
    #[display("series bars are not in ascending timestamp order")]
    OutOfOrder,
    #[display("duplicate timestamp in series")]
    DuplicateTimestamp,
}

#[derive(Debug, Display, Error)]
pub enum FetchError {
    #[display("no data available for {symbol}")]
    NoData { symbol: String },
    #[display("market data request for {symbol} failed")]
    Upstream { symbol: String },
    #[display("failed to parse market data response for {symbol}")]
    ResponseParse { symbol: String },
}

#[derive(Debug, Display, Error)]
pub enum IndicatorError {
    #[display("invalid parameter: {name}")]
    InvalidParameter { name: String },
    #[display("indicator computation failed")]
    Computation,
}

#[derive(Debug, Display, Error)]
pub enum RenderError {
    #[display("symbol {symbol:?} yields an empty artifact name")]
    InvalidSymbol { symbol: String },
    #[display("failed to encode chart data")]
    Encode,
    #[display("failed to write chart artifact")]
    Write,
}
