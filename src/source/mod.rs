pub mod client;

pub use client::{VoucherApiClient, VoucherPage};

use crate::error::FetchError;
use crate::models::{ArrivalPeriod, QuotaConfiguration, VoucherRecord};
use async_trait::async_trait;

/// Filter for one voucher snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoucherQuery {
    pub facility_ids: Vec<i64>,
    pub period: Option<ArrivalPeriod>,
}

impl VoucherQuery {
    pub fn for_quotas(quotas: &QuotaConfiguration) -> Self {
        Self {
            facility_ids: quotas.facility_ids(),
            period: quotas.period,
        }
    }
}

/// Where a run's vouchers come from.
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn fetch(&self, query: &VoucherQuery) -> Result<Vec<VoucherRecord>, FetchError>;
}

/// Pre-loaded batch, e.g. an uploaded listing document
#[derive(Debug, Clone, Default)]
pub struct StaticRecords {
    vouchers: Vec<VoucherRecord>,
}

impl StaticRecords {
    pub fn new(vouchers: Vec<VoucherRecord>) -> Self {
        Self { vouchers }
    }
}

#[async_trait]
impl RecordSource for StaticRecords {
    async fn fetch(&self, query: &VoucherQuery) -> Result<Vec<VoucherRecord>, FetchError> {
        Ok(self
            .vouchers
            .iter()
            .filter(|v| {
                query.facility_ids.is_empty() || query.facility_ids.contains(&v.facility_id)
            })
            .filter(|v| {
                query
                    .period
                    .map_or(true, |p| p.from <= v.date_begin && v.date_begin <= p.to)
            })
            .cloned()
            .collect())
    }
}
