//! Price data: provider trait, Yahoo adapter, cleaning

pub mod clean;
pub mod provider;
pub mod yahoo;

pub use clean::{clean_bars, CleanedBars};
pub use provider::{lookback_window, DataError, DataProvider, DataSource, FetchResult};
pub use yahoo::YahooProvider;
