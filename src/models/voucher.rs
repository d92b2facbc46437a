use super::Destination;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Voucher as listed by the voucher service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoucherRecord {
    pub id: i64,
    #[serde(alias = "sanatorium_id")]
    pub facility_id: i64,
    pub number: i64,
    pub date_begin: NaiveDate,
    pub date_end: NaiveDate,
    #[serde(default)]
    pub duration: u32,
    /// Groups vouchers issued for the same physical arrival
    pub arrival_number: i64,
    #[serde(default)]
    pub organization_id: Option<i64>,
    /// The listing service's own workflow status is not ours; vouchers enter unassigned.
    #[serde(default, skip_deserializing)]
    pub status: Option<Destination>,
}

impl VoucherRecord {
    /// Order in which a facility's vouchers are walked: arrival date, then voucher number.
    /// The id breaks ties so the walk is total.
    pub fn sort_key(&self) -> (NaiveDate, i64, i64) {
        (self.date_begin, self.number, self.id)
    }

    pub fn is_assigned(&self) -> bool {
        self.status.is_some()
    }

    /// Stamp the voucher with its destination. A voucher is assigned at most once.
    pub fn assign(&mut self, destination: Destination) {
        debug_assert!(!self.is_assigned(), "voucher {} assigned twice", self.id);
        self.organization_id = destination.organization_id(self.facility_id);
        self.status = Some(destination);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_listing_row_with_legacy_keys() {
        let row = r#"{
            "id": 11,
            "sanatorium_id": 3,
            "number": 1002,
            "date_begin": "2021-06-01",
            "date_end": "2021-06-21",
            "duration": 21,
            "arrival_number": 4,
            "organization_id": null,
            "status": {"code": 2}
        }"#;
        let voucher: VoucherRecord = serde_json::from_str(row).unwrap();
        assert_eq!(voucher.facility_id, 3);
        assert_eq!(voucher.status, None);
        assert_eq!(voucher.organization_id, None);
        assert_eq!(voucher.date_begin, NaiveDate::from_ymd_opt(2021, 6, 1).unwrap());
    }

    #[test]
    fn assign_sets_organization_per_destination() {
        let row = r#"{"id": 1, "facility_id": 9, "number": 1, "date_begin": "2021-01-01",
                      "date_end": "2021-01-10", "arrival_number": 1}"#;
        let base: VoucherRecord = serde_json::from_str(row).unwrap();

        let mut v = base.clone();
        v.assign(Destination::ToFacility);
        assert_eq!(v.organization_id, Some(9));

        let mut v = base.clone();
        v.assign(Destination::ToMedicalUnit(42));
        assert_eq!(v.organization_id, Some(42));
        assert_eq!(v.status, Some(Destination::ToMedicalUnit(42)));

        let mut v = base;
        v.assign(Destination::ToReserve);
        assert_eq!(v.organization_id, None);
        assert!(v.is_assigned());
    }
}
