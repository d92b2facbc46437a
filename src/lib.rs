pub mod api;
pub mod config;
pub mod error;
pub mod export;
pub mod models;
pub mod service;
pub mod source;

pub use config::AppConfig;
pub use error::{ConfigError, DistributionError, FetchError};
pub use service::{Distributor, DistributorOptions};
pub use source::{RecordSource, StaticRecords, VoucherApiClient};
