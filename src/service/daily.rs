use super::catalog::ArrivalCalendar;
use super::ApportionError;
use crate::models::{DayBucket, MonthBucket, MonthKey, Parity};
use std::ops::Range;

pub const DEFAULT_MAX_CORRECTION_PASSES: usize = 1000;

/// Splits each month target across the month's arrival days.
///
/// Day targets start from the floored proportional share (rounded up to even under
/// `Parity::Even`) and are then corrected, sweeping days from the latest arrival
/// backwards, until every month sums exactly to its target.
#[derive(Debug, Clone, Copy)]
pub struct DailyApportioner {
    parity: Parity,
    max_passes: usize,
}

impl Default for DailyApportioner {
    fn default() -> Self {
        Self::new(Parity::Any, DEFAULT_MAX_CORRECTION_PASSES)
    }
}

/// Days of one month inside the flat, chronological day list
struct MonthSpan {
    month: MonthKey,
    target: u32,
    days: Range<usize>,
}

impl DailyApportioner {
    pub fn new(parity: Parity, max_passes: usize) -> Self {
        Self { parity, max_passes }
    }

    /// Day buckets of every month in chronological order.
    ///
    /// `months` must come from the same calendar, in the same order.
    pub fn apportion(
        &self,
        calendar: &ArrivalCalendar,
        months: &[MonthBucket],
    ) -> Result<Vec<DayBucket>, ApportionError> {
        let mut days: Vec<DayBucket> = Vec::new();
        let mut spans: Vec<MonthSpan> = Vec::with_capacity(months.len());

        for bucket in months {
            let Some(month) = calendar.month(&bucket.month) else {
                return Err(ApportionError::MonthOutsideCalendar {
                    month: bucket.month,
                });
            };
            let start = days.len();
            for (&date, &count) in &month.days {
                let day = self.initial_day(date, count, month.record_count, bucket.rounded_target);
                days.push(day);
            }
            spans.push(MonthSpan {
                month: bucket.month,
                target: bucket.rounded_target,
                days: start..days.len(),
            });
        }

        let mut passes = 0;
        loop {
            let unsettled: Vec<(&MonthSpan, i64)> = spans
                .iter()
                .map(|span| (span, overload(span, &days)))
                .filter(|&(_, overload)| overload != 0)
                .collect();

            let Some(&(first, remaining)) = unsettled.first() else {
                return Ok(days);
            };
            if passes == self.max_passes {
                return Err(ApportionError::Unsatisfiable {
                    month: first.month,
                    remaining,
                    passes,
                });
            }
            passes += 1;

            for (span, overload) in unsettled {
                self.correct_month(&mut days[span.days.clone()], overload);
            }
            for day in &mut days {
                day.corrected_target = day.corrected_target.min(self.capacity(day));
            }
        }
    }

    fn initial_day(
        &self,
        date: chrono::NaiveDate,
        count: u32,
        month_count: u32,
        month_target: u32,
    ) -> DayBucket {
        let (fraction, floor) = if month_count == 0 {
            (0.0, 0)
        } else {
            let floor = u64::from(month_target) * u64::from(count) / u64::from(month_count);
            (f64::from(count) / f64::from(month_count), floor as u32)
        };
        let parity_target = self.parity.round_up(floor);
        DayBucket {
            date,
            record_count: count,
            fraction_of_month: fraction,
            raw_target: f64::from(month_target) * fraction,
            floor_target: floor,
            parity_target,
            corrected_target: parity_target.min(self.parity.capacity(count)),
        }
    }

    fn capacity(&self, day: &DayBucket) -> u32 {
        self.parity.capacity(day.record_count)
    }

    /// One sweep over a month's days, latest arrival first.
    fn correct_month(&self, days: &mut [DayBucket], overload: i64) {
        let unit = i64::from(self.parity.unit());
        let arrivals = days.len() as i64;
        if arrivals == 0 {
            return;
        }

        let step = if overload > 0 {
            (overload + arrivals - 1) / arrivals
        } else {
            overload.div_euclid(arrivals)
        };
        // keep steps on the parity grid
        let step = step.signum() * ((step.abs() + unit - 1) / unit * unit);

        let mut budget = overload.abs();
        for day in days.iter_mut().rev() {
            if budget <= 0 {
                break;
            }
            let delta = step.signum() * step.abs().min(budget);
            let proposed = i64::from(day.corrected_target) + delta;
            if proposed < 0 || proposed > i64::from(self.capacity(day)) {
                continue;
            }
            day.corrected_target = proposed as u32;
            budget -= delta.abs();
        }
    }
}

fn overload(span: &MonthSpan, days: &[DayBucket]) -> i64 {
    let assigned: i64 = days[span.days.clone()]
        .iter()
        .map(|d| i64::from(d.corrected_target))
        .sum();
    i64::from(span.target) - assigned
}
