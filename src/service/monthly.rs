use super::catalog::ArrivalCalendar;
use super::ApportionError;
use crate::models::{MonthBucket, Parity};

/// Splits a destination quota across the pool's arrival months,
/// proportionally to the number of vouchers arriving in each month.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonthlyApportioner {
    parity: Parity,
}

impl MonthlyApportioner {
    pub fn new(parity: Parity) -> Self {
        Self { parity }
    }

    /// Month targets summing exactly to `target`.
    ///
    /// Under `Parity::Even` the split is done in pairs, so every month target is even
    /// and never exceeds what the month's days can supply in pairs.
    pub fn apportion(
        &self,
        calendar: &ArrivalCalendar,
        target: u32,
    ) -> Result<Vec<MonthBucket>, ApportionError> {
        let unit = self.parity.unit();
        if target % unit != 0 {
            return Err(ApportionError::NotPaired {
                requested: target,
                unit,
            });
        }

        // capacity in units, per month
        let capacities: Vec<u32> = calendar
            .months()
            .map(|(_, month)| month.days.values().map(|&c| c / unit).sum())
            .collect();
        let available: u32 = capacities.iter().sum();
        let units = target / unit;
        if units > available {
            return Err(ApportionError::ExceedsPool {
                requested: target,
                available: available * unit,
            });
        }

        let total = calendar.total();
        let mut buckets: Vec<MonthBucket> = calendar
            .months()
            .zip(&capacities)
            .map(|((&key, month), &capacity)| {
                let naive = if total == 0 {
                    0
                } else {
                    round_half_away(units, month.record_count, total)
                };
                MonthBucket {
                    month: key,
                    record_count: month.record_count,
                    share_percent: ratio(month.record_count, total) * 100.0,
                    fractional_target: f64::from(target) * ratio(month.record_count, total),
                    naive_target: naive * unit,
                    // in units until the residual is placed
                    rounded_target: naive.min(capacity),
                }
            })
            .collect();

        let assigned: i64 = buckets.iter().map(|b| i64::from(b.rounded_target)).sum();
        let mut residual = i64::from(units) - assigned;
        if residual != 0 {
            tracing::debug!(residual, "placing month rounding residual");
        }

        // residual goes to the last month; whatever it cannot hold spills backwards
        for (bucket, &capacity) in buckets.iter_mut().zip(&capacities).rev() {
            if residual == 0 {
                break;
            }
            let current = i64::from(bucket.rounded_target);
            let adjust = residual.clamp(-current, i64::from(capacity) - current);
            bucket.rounded_target = (current + adjust) as u32;
            residual -= adjust;
        }
        debug_assert_eq!(residual, 0);

        for bucket in &mut buckets {
            bucket.rounded_target *= unit;
        }
        Ok(buckets)
    }
}

/// `round(value * part / whole)`, halves away from zero, in exact integer arithmetic.
fn round_half_away(value: u32, part: u32, whole: u32) -> u32 {
    let numerator = 2 * u64::from(value) * u64::from(part) + u64::from(whole);
    (numerator / (2 * u64::from(whole))) as u32
}

fn ratio(part: u32, whole: u32) -> f64 {
    if whole == 0 {
        0.0
    } else {
        f64::from(part) / f64::from(whole)
    }
}
