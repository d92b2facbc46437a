pub mod catalog;
pub mod daily;
pub mod distributor;
pub mod emitter;
pub mod monthly;
pub mod worker;

pub use catalog::{ArrivalCalendar, FacilityPool, RecordCatalog};
pub use daily::DailyApportioner;
pub use distributor::{Distributor, DistributorOptions};
pub use emitter::{AssignmentEmitter, Emission};
pub use monthly::MonthlyApportioner;
pub use worker::{LatestOutcome, QuotaPublisher, QuotaQueue, QuotaWorker};

use crate::error::DistributionError;
use crate::models::{Destination, MonthKey};

/// Apportionment failure, before facility and destination are known
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApportionError {
    ExceedsPool { requested: u32, available: u32 },
    NotPaired { requested: u32, unit: u32 },
    Unsatisfiable { month: MonthKey, remaining: i64, passes: usize },
    MonthOutsideCalendar { month: MonthKey },
}

impl ApportionError {
    pub fn in_pass(self, facility_id: i64, destination: Destination) -> DistributionError {
        match self {
            ApportionError::ExceedsPool {
                requested,
                available,
            } => DistributionError::QuotaExceedsPool {
                facility_id,
                destination,
                requested,
                available,
            },
            ApportionError::NotPaired { requested, unit } => DistributionError::QuotaNotPaired {
                facility_id,
                destination,
                requested,
                unit,
            },
            ApportionError::Unsatisfiable {
                month,
                remaining,
                passes,
            } => DistributionError::AllocationUnsatisfiable {
                facility_id,
                destination,
                month,
                remaining,
                passes,
            },
            ApportionError::MonthOutsideCalendar { month } => {
                DistributionError::MonthOutsideCalendar {
                    facility_id,
                    destination,
                    month,
                }
            }
        }
    }
}
