pub mod plan;
pub mod quota;
pub mod result;
pub mod voucher;

pub use plan::{ControlTable, DayBucket, MonthBucket, MonthKey, MonthSection};
pub use quota::{
    AllocationStrategy, ArrivalPeriod, Destination, FacilityQuota, Parity, QuotaConfiguration,
    QuotaValidationError, UnknownDestination,
};
pub use result::{DistributionOutcome, FacilityReport, FacilityStatus, PassReport};
pub use voucher::VoucherRecord;
