use super::catalog::{ArrivalCalendar, FacilityPool, RecordCatalog};
use super::daily::{DailyApportioner, DEFAULT_MAX_CORRECTION_PASSES};
use super::emitter::{AssignmentEmitter, Emission};
use super::monthly::MonthlyApportioner;
use crate::error::DistributionError;
use crate::models::{
    AllocationStrategy, ControlTable, Destination, DistributionOutcome, FacilityQuota,
    FacilityReport, FacilityStatus, Parity, PassReport, QuotaConfiguration, VoucherRecord,
};
use rayon::prelude::*;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy)]
pub struct DistributorOptions {
    /// Cap on day-level correction sweeps per pass
    pub max_correction_passes: usize,
}

impl Default for DistributorOptions {
    fn default() -> Self {
        Self {
            max_correction_passes: DEFAULT_MAX_CORRECTION_PASSES,
        }
    }
}

/// Distribution service: runs every facility's destination passes over a voucher snapshot.
///
/// Each run owns its snapshot; nothing carries over between runs.
#[derive(Debug, Clone, Default)]
pub struct Distributor {
    options: DistributorOptions,
}

/// Output of one facility
struct FacilityRun {
    distributed: Vec<VoucherRecord>,
    leftover: Vec<VoucherRecord>,
    report: FacilityReport,
}

impl Distributor {
    pub fn new(options: DistributorOptions) -> Self {
        Self { options }
    }

    /// Distribute `vouchers` according to `quotas`.
    ///
    /// Facilities run in parallel; passes within a facility run in order, each on the
    /// vouchers the previous passes left behind.
    pub fn run(
        &self,
        vouchers: Vec<VoucherRecord>,
        quotas: &QuotaConfiguration,
    ) -> DistributionOutcome {
        let catalog = RecordCatalog::new(vouchers);
        info!(
            vouchers = catalog.voucher_count(),
            facilities = catalog.facilities().len(),
            configured = quotas.facilities.len(),
            "starting distribution"
        );

        let runs: Vec<FacilityRun> = catalog
            .into_facilities()
            .into_par_iter()
            .map(|pool| self.distribute_facility(pool, quotas))
            .collect();

        let mut outcome = DistributionOutcome::default();
        for run in runs {
            outcome.distributed.extend(run.distributed);
            outcome.leftover.extend(run.leftover);
            outcome.facilities.push(run.report);
        }

        info!(
            distributed = outcome.distributed.len(),
            leftover = outcome.leftover.len(),
            failed_passes = outcome.failures().count(),
            "distribution finished"
        );
        outcome
    }

    fn distribute_facility(&self, pool: FacilityPool, quotas: &QuotaConfiguration) -> FacilityRun {
        let facility_id = pool.facility_id;
        let total_vouchers = pool.vouchers.len() as u32;

        let Some(quota) = quotas.facility(facility_id) else {
            warn!(facility_id, total_vouchers, "no quota configured, facility skipped");
            return FacilityRun {
                distributed: Vec::new(),
                leftover: pool.vouchers,
                report: FacilityReport {
                    facility_id,
                    total_vouchers,
                    status: FacilityStatus::NoQuotaConfigured,
                    over_subscribed: false,
                    passes: Vec::new(),
                },
            };
        };

        let over_subscribed = quota.total() > u64::from(total_vouchers);
        if over_subscribed {
            warn!(
                facility_id,
                total_vouchers,
                requested = quota.total(),
                "quotas exceed the facility's vouchers"
            );
        }

        let mut remaining = pool.vouchers;
        let mut distributed = Vec::new();
        let mut passes = Vec::new();
        for (destination, target) in quota.passes() {
            let (report, emission) = self.run_pass(
                quota,
                destination,
                target,
                total_vouchers,
                remaining,
                quotas.strategy,
            );
            distributed.extend(emission.assigned);
            remaining = emission.remaining;
            passes.push(report);
        }

        let report = FacilityReport {
            facility_id,
            total_vouchers,
            status: FacilityStatus::Distributed,
            over_subscribed,
            passes,
        };
        info!(
            facility_id,
            total_vouchers,
            emitted = report.emitted(),
            leftover = remaining.len(),
            "facility distributed"
        );

        FacilityRun {
            distributed,
            leftover: remaining,
            report,
        }
    }

    fn run_pass(
        &self,
        quota: &FacilityQuota,
        destination: Destination,
        target: u32,
        total_vouchers: u32,
        pool: Vec<VoucherRecord>,
        strategy: AllocationStrategy,
    ) -> (PassReport, Emission) {
        let facility_id = quota.facility_id;
        let mut report = PassReport {
            destination,
            requested: target,
            emitted: 0,
            share_percent: quota.share_percent(destination, total_vouchers as usize),
            control: None,
            failure: None,
        };

        if target == 0 {
            return (report, Emission::untouched(pool));
        }

        let emission = match strategy {
            AllocationStrategy::Proportional { parity } => {
                match self.plan(facility_id, destination, target, parity, &pool) {
                    Ok(table) => {
                        let days: Vec<_> = table.days().cloned().collect();
                        report.control = Some(table);
                        AssignmentEmitter::by_day(pool, &days, destination)
                    }
                    Err(e) => {
                        warn!(error = %e, "distribution pass failed");
                        report.failure = Some(e.to_string());
                        Emission::untouched(pool)
                    }
                }
            }
            AllocationStrategy::Pairs => AssignmentEmitter::by_pairs(pool, target, destination),
        };

        report.emitted = emission.emitted();
        debug!(
            facility_id,
            %destination,
            requested = target,
            emitted = report.emitted,
            "pass complete"
        );
        (report, emission)
    }

    /// Month and day targets of one pass over the vouchers still in the pool.
    fn plan(
        &self,
        facility_id: i64,
        destination: Destination,
        target: u32,
        parity: Parity,
        pool: &[VoucherRecord],
    ) -> Result<ControlTable, DistributionError> {
        let calendar = ArrivalCalendar::from_records(pool);
        let months = MonthlyApportioner::new(parity)
            .apportion(&calendar, target)
            .map_err(|e| e.in_pass(facility_id, destination))?;
        let days = DailyApportioner::new(parity, self.options.max_correction_passes)
            .apportion(&calendar, &months)
            .map_err(|e| e.in_pass(facility_id, destination))?;
        Ok(ControlTable::new(facility_id, destination, months, days))
    }
}
