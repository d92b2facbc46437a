use crate::models::{Destination, DayBucket, VoucherRecord};
use chrono::NaiveDate;
use indexmap::IndexMap;

/// Vouchers claimed by one pass and the pool left for the next pass
#[derive(Debug, Clone, Default)]
pub struct Emission {
    pub assigned: Vec<VoucherRecord>,
    pub remaining: Vec<VoucherRecord>,
}

impl Emission {
    pub fn untouched(pool: Vec<VoucherRecord>) -> Self {
        Self {
            assigned: Vec::new(),
            remaining: pool,
        }
    }

    pub fn emitted(&self) -> u32 {
        self.assigned.len() as u32
    }
}

/// Stamps vouchers of a sorted facility pool with a destination.
pub struct AssignmentEmitter;

impl AssignmentEmitter {
    /// Walk the pool in `(date_begin, number)` order, claiming vouchers while their
    /// arrival day still has quota left.
    pub fn by_day(
        pool: Vec<VoucherRecord>,
        days: &[DayBucket],
        destination: Destination,
    ) -> Emission {
        let mut quota: IndexMap<NaiveDate, u32> =
            days.iter().map(|d| (d.date, d.corrected_target)).collect();

        let mut emission = Emission::default();
        for mut voucher in pool {
            match quota.get_mut(&voucher.date_begin) {
                Some(left) if *left > 0 => {
                    *left -= 1;
                    voucher.assign(destination);
                    emission.assigned.push(voucher);
                }
                _ => emission.remaining.push(voucher),
            }
        }
        emission
    }

    /// Legacy pair scan: take two adjacent vouchers when they share the arrival date
    /// and arrival number, otherwise slide forward by one. Runs while at least a pair
    /// of quota is left; quota the pool cannot cover is abandoned.
    pub fn by_pairs(pool: Vec<VoucherRecord>, quota: u32, destination: Destination) -> Emission {
        let mut claimed = vec![false; pool.len()];
        let mut left = quota;
        let mut cursor = 0;

        while left >= 2 {
            if cursor + 1 >= pool.len() {
                tracing::warn!(
                    %destination,
                    abandoned = left,
                    "pair scan ran out of vouchers"
                );
                break;
            }
            let (first, second) = (&pool[cursor], &pool[cursor + 1]);
            if first.date_begin == second.date_begin
                && first.arrival_number == second.arrival_number
            {
                claimed[cursor] = true;
                claimed[cursor + 1] = true;
                left -= 2;
                cursor += 2;
            } else {
                cursor += 1;
            }
        }
        if left == 1 {
            tracing::warn!(%destination, "odd quota unit abandoned by pair scan");
        }

        let mut emission = Emission::default();
        for (mut voucher, claimed) in pool.into_iter().zip(claimed) {
            if claimed {
                voucher.assign(destination);
                emission.assigned.push(voucher);
            } else {
                emission.remaining.push(voucher);
            }
        }
        emission
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voucher(id: i64, date: &str, arrival_number: i64) -> VoucherRecord {
        let date: NaiveDate = date.parse().unwrap();
        VoucherRecord {
            id,
            facility_id: 4,
            number: id,
            date_begin: date,
            date_end: date,
            duration: 14,
            arrival_number,
            organization_id: None,
            status: None,
        }
    }

    fn day(date: &str, record_count: u32, target: u32) -> DayBucket {
        DayBucket {
            date: date.parse().unwrap(),
            record_count,
            fraction_of_month: 0.0,
            raw_target: 0.0,
            floor_target: target,
            parity_target: target,
            corrected_target: target,
        }
    }

    fn ids(vouchers: &[VoucherRecord]) -> Vec<i64> {
        vouchers.iter().map(|v| v.id).collect()
    }

    #[test]
    fn claims_first_vouchers_of_each_day() {
        let pool = vec![
            voucher(1, "2021-06-01", 1),
            voucher(2, "2021-06-01", 1),
            voucher(3, "2021-06-01", 1),
            voucher(4, "2021-06-02", 2),
            voucher(5, "2021-06-02", 2),
        ];
        let days = [day("2021-06-01", 3, 2), day("2021-06-02", 2, 1)];
        let emission = AssignmentEmitter::by_day(pool, &days, Destination::ToFacility);

        assert_eq!(ids(&emission.assigned), vec![1, 2, 4]);
        assert_eq!(ids(&emission.remaining), vec![3, 5]);
        assert!(emission
            .assigned
            .iter()
            .all(|v| v.organization_id == Some(4) && v.status == Some(Destination::ToFacility)));
        assert!(emission.remaining.iter().all(|v| !v.is_assigned()));
    }

    #[test]
    fn days_without_plan_are_left_alone() {
        let pool = vec![voucher(1, "2021-06-01", 1), voucher(2, "2021-06-03", 1)];
        let days = [day("2021-06-01", 1, 1)];
        let emission = AssignmentEmitter::by_day(pool, &days, Destination::ToReserve);
        assert_eq!(ids(&emission.assigned), vec![1]);
        assert_eq!(emission.assigned[0].organization_id, None);
        assert_eq!(ids(&emission.remaining), vec![2]);
    }

    #[test]
    fn pair_scan_takes_matching_neighbours() {
        let pool = vec![
            voucher(1, "2021-06-01", 1),
            voucher(2, "2021-06-01", 2),
            voucher(3, "2021-06-01", 2),
            voucher(4, "2021-06-02", 3),
            voucher(5, "2021-06-02", 3),
            voucher(6, "2021-06-02", 3),
        ];
        let emission = AssignmentEmitter::by_pairs(pool, 4, Destination::ToMedicalUnit(8));
        assert_eq!(ids(&emission.assigned), vec![2, 3, 4, 5]);
        assert_eq!(ids(&emission.remaining), vec![1, 6]);
        assert!(emission.assigned.iter().all(|v| v.organization_id == Some(8)));
    }

    #[test]
    fn pair_scan_abandons_what_the_pool_cannot_cover() {
        let pool = vec![
            voucher(1, "2021-06-01", 1),
            voucher(2, "2021-06-01", 1),
            voucher(3, "2021-06-02", 1),
        ];
        let emission = AssignmentEmitter::by_pairs(pool, 6, Destination::ToExchange);
        assert_eq!(emission.emitted(), 2);
        assert_eq!(ids(&emission.remaining), vec![3]);

        let pool = vec![voucher(1, "2021-06-01", 1), voucher(2, "2021-06-01", 1)];
        let emission = AssignmentEmitter::by_pairs(pool, 1, Destination::ToExchange);
        assert_eq!(emission.emitted(), 0);
    }
}
