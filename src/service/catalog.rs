use crate::models::{MonthKey, VoucherRecord};
use chrono::NaiveDate;
use indexmap::IndexMap;
use std::cmp::Reverse;
use std::collections::BTreeMap;

/// Vouchers of one facility, sorted by `(date_begin, number)`
#[derive(Debug, Clone)]
pub struct FacilityPool {
    pub facility_id: i64,
    pub vouchers: Vec<VoucherRecord>,
}

/// Snapshot of the vouchers of one run, grouped by facility.
///
/// Facilities are ordered by descending voucher count, ties by ascending id.
#[derive(Debug, Clone, Default)]
pub struct RecordCatalog {
    facilities: Vec<FacilityPool>,
}

impl RecordCatalog {
    pub fn new(vouchers: Vec<VoucherRecord>) -> Self {
        let mut by_facility: BTreeMap<i64, Vec<VoucherRecord>> = BTreeMap::new();
        for voucher in vouchers {
            by_facility.entry(voucher.facility_id).or_default().push(voucher);
        }

        let mut facilities: Vec<FacilityPool> = by_facility
            .into_iter()
            .map(|(facility_id, mut vouchers)| {
                vouchers.sort_by_key(VoucherRecord::sort_key);
                FacilityPool {
                    facility_id,
                    vouchers,
                }
            })
            .collect();
        // stable sort keeps ascending ids within equal counts
        facilities.sort_by_key(|f| Reverse(f.vouchers.len()));

        Self { facilities }
    }

    pub fn facilities(&self) -> &[FacilityPool] {
        &self.facilities
    }

    pub fn into_facilities(self) -> Vec<FacilityPool> {
        self.facilities
    }

    pub fn voucher_count(&self) -> usize {
        self.facilities.iter().map(|f| f.vouchers.len()).sum()
    }
}

/// Arrival days of one month
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArrivalMonth {
    pub record_count: u32,
    pub days: IndexMap<NaiveDate, u32>,
}

/// Voucher counts of a pool by arrival month and day, chronologically ordered
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArrivalCalendar {
    total: u32,
    months: IndexMap<MonthKey, ArrivalMonth>,
}

impl ArrivalCalendar {
    pub fn from_records(vouchers: &[VoucherRecord]) -> Self {
        let mut months: IndexMap<MonthKey, ArrivalMonth> = IndexMap::new();
        for voucher in vouchers {
            let month = months.entry(MonthKey::of(voucher.date_begin)).or_default();
            month.record_count += 1;
            *month.days.entry(voucher.date_begin).or_insert(0) += 1;
        }

        months.sort_keys();
        for month in months.values_mut() {
            month.days.sort_keys();
        }

        Self {
            total: vouchers.len() as u32,
            months,
        }
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn months(&self) -> impl Iterator<Item = (&MonthKey, &ArrivalMonth)> {
        self.months.iter()
    }

    pub fn month(&self, key: &MonthKey) -> Option<&ArrivalMonth> {
        self.months.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voucher(id: i64, facility_id: i64, number: i64, date: &str) -> VoucherRecord {
        let date: NaiveDate = date.parse().unwrap();
        VoucherRecord {
            id,
            facility_id,
            number,
            date_begin: date,
            date_end: date + chrono::Days::new(21),
            duration: 21,
            arrival_number: 1,
            organization_id: None,
            status: None,
        }
    }

    #[test]
    fn orders_facilities_by_size_then_id() {
        let catalog = RecordCatalog::new(vec![
            voucher(1, 5, 1, "2021-06-01"),
            voucher(2, 3, 1, "2021-06-01"),
            voucher(3, 9, 1, "2021-06-01"),
            voucher(4, 9, 2, "2021-06-01"),
        ]);
        let order: Vec<i64> = catalog.facilities().iter().map(|f| f.facility_id).collect();
        assert_eq!(order, vec![9, 3, 5]);
        assert_eq!(catalog.voucher_count(), 4);
    }

    #[test]
    fn sorts_vouchers_by_date_then_number() {
        let catalog = RecordCatalog::new(vec![
            voucher(1, 1, 30, "2021-07-01"),
            voucher(2, 1, 20, "2021-06-01"),
            voucher(3, 1, 10, "2021-06-01"),
        ]);
        let ids: Vec<i64> = catalog.facilities()[0].vouchers.iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn calendar_groups_by_month_and_day_chronologically() {
        let vouchers = vec![
            voucher(1, 1, 1, "2021-07-10"),
            voucher(2, 1, 2, "2021-06-20"),
            voucher(3, 1, 3, "2021-06-01"),
            voucher(4, 1, 4, "2021-06-20"),
        ];
        let calendar = ArrivalCalendar::from_records(&vouchers);
        assert_eq!(calendar.total(), 4);

        let months: Vec<String> = calendar.months().map(|(k, _)| k.to_string()).collect();
        assert_eq!(months, vec!["2021-06", "2021-07"]);

        let june = calendar.month(&"2021-06".parse().unwrap()).unwrap();
        assert_eq!(june.record_count, 3);
        let days: Vec<(String, u32)> = june.days.iter().map(|(d, &c)| (d.to_string(), c)).collect();
        assert_eq!(
            days,
            vec![("2021-06-01".to_string(), 1), ("2021-06-20".to_string(), 2)]
        );
    }

    #[test]
    fn empty_calendar() {
        let calendar = ArrivalCalendar::from_records(&[]);
        assert!(calendar.is_empty());
        assert_eq!(calendar.months().count(), 0);
    }
}
