use super::{ControlTable, Destination, VoucherRecord};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacilityStatus {
    Distributed,
    NoQuotaConfigured,
}

/// Result of one (facility, destination) pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassReport {
    pub destination: Destination,
    pub requested: u32,
    pub emitted: u32,
    /// Requested share of the facility's vouchers, percent
    pub share_percent: f64,
    pub control: Option<ControlTable>,
    pub failure: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityReport {
    pub facility_id: i64,
    pub total_vouchers: u32,
    pub status: FacilityStatus,
    /// Quotas add up to more vouchers than the facility has
    pub over_subscribed: bool,
    pub passes: Vec<PassReport>,
}

impl FacilityReport {
    pub fn emitted(&self) -> u32 {
        self.passes.iter().map(|p| p.emitted).sum()
    }
}

/// Everything a run hands to the output consumer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistributionOutcome {
    pub distributed: Vec<VoucherRecord>,
    pub leftover: Vec<VoucherRecord>,
    pub facilities: Vec<FacilityReport>,
}

impl DistributionOutcome {
    pub fn control_tables(&self) -> impl Iterator<Item = &ControlTable> {
        self.facilities
            .iter()
            .flat_map(|f| f.passes.iter())
            .filter_map(|p| p.control.as_ref())
    }

    pub fn failures(&self) -> impl Iterator<Item = (i64, &PassReport)> {
        self.facilities.iter().flat_map(|f| {
            f.passes
                .iter()
                .filter(|p| p.failure.is_some())
                .map(move |p| (f.facility_id, p))
        })
    }

    pub fn distributed_to(&self, destination: Destination) -> impl Iterator<Item = &VoucherRecord> {
        self.distributed
            .iter()
            .filter(move |v| v.status == Some(destination))
    }
}
