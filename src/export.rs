//! CSV renderings handed to the report consumer.

use crate::models::{ControlTable, VoucherRecord};
use csv::Writer;
use std::io::Write;

const RECORD_HEADER: [&str; 10] = [
    "id",
    "facility_id",
    "organization_id",
    "number",
    "date_begin",
    "date_end",
    "duration",
    "arrival_number",
    "status_code",
    "status",
];

const CONTROL_HEADER: [&str; 13] = [
    "facility_id",
    "destination",
    "arrival_day",
    "vouchers",
    "share_percent",
    "fractional_target",
    "rounded_target",
    "raw_target",
    "floor_target",
    "parity_target",
    "corrected_target",
    "correction_delta",
    "error",
];

fn option_to_csv<T: ToString>(val: Option<T>) -> String {
    val.map(|v| v.to_string()).unwrap_or_default()
}

/// Labeled (or leftover) vouchers, one row each.
pub fn write_records_csv<W: Write>(
    vouchers: &[VoucherRecord],
    output: W,
) -> Result<(), csv::Error> {
    let mut writer = Writer::from_writer(output);
    writer.write_record(RECORD_HEADER)?;

    for voucher in vouchers {
        writer.write_record(&[
            voucher.id.to_string(),
            voucher.facility_id.to_string(),
            option_to_csv(voucher.organization_id),
            voucher.number.to_string(),
            voucher.date_begin.to_string(),
            voucher.date_end.to_string(),
            voucher.duration.to_string(),
            voucher.arrival_number.to_string(),
            option_to_csv(voucher.status.map(|s| s.status_code())),
            voucher.status.map(|s| s.label()).unwrap_or_default().to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Control tables: per month a header row, its day rows and a total row.
pub fn write_control_csv<W: Write>(tables: &[&ControlTable], output: W) -> Result<(), csv::Error> {
    let mut writer = Writer::from_writer(output);
    writer.write_record(CONTROL_HEADER)?;

    for table in tables {
        let facility = table.facility_id.to_string();
        let destination = table.destination.to_string();

        for section in &table.months {
            let month = &section.bucket;
            writer.write_record(&[
                facility.clone(),
                destination.clone(),
                month.month.name(),
                month.record_count.to_string(),
                format!("{:.0}", month.share_percent),
                format!("{:.2}", month.fractional_target),
                month.rounded_target.to_string(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
            ])?;

            for day in &section.days {
                writer.write_record(&[
                    facility.clone(),
                    destination.clone(),
                    day.date.to_string(),
                    day.record_count.to_string(),
                    format!("{:.2}", day.fraction_of_month * 100.0),
                    String::new(),
                    String::new(),
                    format!("{:.2}", day.raw_target),
                    day.floor_target.to_string(),
                    day.parity_target.to_string(),
                    day.corrected_target.to_string(),
                    day.correction_delta().to_string(),
                    if day.is_flagged() { "ERROR" } else { "" }.to_string(),
                ])?;
            }

            writer.write_record(&[
                facility.clone(),
                destination.clone(),
                format!("TOTAL {}", month.month.name()),
                month.record_count.to_string(),
                String::new(),
                format!("{:.2}", month.fractional_target),
                month.rounded_target.to_string(),
                format!("{:.2}", section.raw_total()),
                section.floor_total().to_string(),
                section.parity_total().to_string(),
                section.corrected_total().to_string(),
                String::new(),
                String::new(),
            ])?;
        }
    }

    writer.flush()?;
    Ok(())
}
