use crate::models::{Destination, MonthKey};
use thiserror::Error;

/// Startup configuration errors. Always fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required configuration value `{0}`")]
    Missing(&'static str),

    #[error("invalid configuration value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

/// Errors raised while pulling vouchers from the listing service.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("listing service answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode listing page: {0}")]
    Decode(String),

    #[error("giving up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: Box<FetchError> },

    #[error("pagination did not terminate: fetched {fetched} of {total} vouchers in {pages} pages")]
    PaginationDidNotTerminate {
        fetched: usize,
        total: usize,
        pages: usize,
    },
}

impl FetchError {
    /// Transport failures, 5xx and 429 are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Transport(_) => true,
            FetchError::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

/// Failure of a single (facility, destination) pass. Never aborts the run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DistributionError {
    #[error(
        "allocation unsatisfiable for facility {facility_id}, {destination}, month {month}: \
         {remaining} voucher(s) still unplaced after {passes} correction passes"
    )]
    AllocationUnsatisfiable {
        facility_id: i64,
        destination: Destination,
        month: MonthKey,
        remaining: i64,
        passes: usize,
    },

    #[error(
        "quota of {requested} for facility {facility_id}, {destination} \
         exceeds the {available} vouchers available"
    )]
    QuotaExceedsPool {
        facility_id: i64,
        destination: Destination,
        requested: u32,
        available: u32,
    },

    #[error(
        "quota of {requested} for facility {facility_id}, {destination} \
         is not a multiple of {unit}"
    )]
    QuotaNotPaired {
        facility_id: i64,
        destination: Destination,
        requested: u32,
        unit: u32,
    },

    #[error("month {month} planned for facility {facility_id}, {destination} has no arrivals")]
    MonthOutsideCalendar {
        facility_id: i64,
        destination: Destination,
        month: MonthKey,
    },
}
