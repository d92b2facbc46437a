#![allow(dead_code)]

use chrono::NaiveDate;
use voucher_distributor::models::VoucherRecord;

pub fn voucher(
    id: i64,
    facility_id: i64,
    number: i64,
    date: NaiveDate,
    arrival_number: i64,
) -> VoucherRecord {
    VoucherRecord {
        id,
        facility_id,
        number,
        date_begin: date,
        date_end: date + chrono::Days::new(21),
        duration: 21,
        arrival_number,
        organization_id: None,
        status: None,
    }
}

pub fn date(text: &str) -> NaiveDate {
    text.parse().unwrap()
}

/// Vouchers of one facility: `count` per arrival date, numbered in input order,
/// one arrival group per date.
pub fn facility_pool(
    facility_id: i64,
    first_id: i64,
    days: &[(&str, usize)],
) -> Vec<VoucherRecord> {
    let mut vouchers = Vec::new();
    let mut id = first_id;
    for (arrival, &(day, count)) in days.iter().enumerate() {
        for _ in 0..count {
            vouchers.push(voucher(id, facility_id, 10_000 + id, date(day), arrival as i64 + 1));
            id += 1;
        }
    }
    vouchers
}
