//! Price-provider boundary: the provider trait, Yahoo Finance, and CSV import.

pub mod csv_import;
pub mod provider;
pub mod yahoo;

pub use csv_import::CsvProvider;
pub use provider::{pick_price, DataError, DataProvider, DataSource, FetchResult};
pub use yahoo::YahooProvider;
