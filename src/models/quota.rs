use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const MEDICAL_UNIT_PREFIX: &str = "to_medical_unit:";

/// Destination category a voucher can be distributed to.
///
/// The derived ordering is the fixed pass priority: facility, reserve, exchange,
/// then medical units by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Destination {
    ToFacility,
    ToReserve,
    ToExchange,
    ToMedicalUnit(i64),
}

impl Destination {
    /// Legacy status code stored with distributed vouchers
    pub fn status_code(&self) -> u8 {
        match self {
            Destination::ToFacility => 1,
            Destination::ToReserve => 2,
            Destination::ToExchange => 3,
            Destination::ToMedicalUnit(_) => 4,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Destination::ToFacility => "to facility",
            Destination::ToReserve => "to reserve",
            Destination::ToExchange => "to exchange",
            Destination::ToMedicalUnit(_) => "to medical unit",
        }
    }

    /// Organization a voucher sent here belongs to.
    /// Reserve and exchange vouchers have no owner yet.
    pub fn organization_id(&self, facility_id: i64) -> Option<i64> {
        match self {
            Destination::ToFacility => Some(facility_id),
            Destination::ToMedicalUnit(unit_id) => Some(*unit_id),
            Destination::ToReserve | Destination::ToExchange => None,
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::ToFacility => f.write_str("to_facility"),
            Destination::ToReserve => f.write_str("to_reserve"),
            Destination::ToExchange => f.write_str("to_exchange"),
            Destination::ToMedicalUnit(id) => write!(f, "{MEDICAL_UNIT_PREFIX}{id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown destination key `{0}`")]
pub struct UnknownDestination(pub String);

impl FromStr for Destination {
    type Err = UnknownDestination;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        match key {
            "to_facility" => Ok(Destination::ToFacility),
            "to_reserve" => Ok(Destination::ToReserve),
            "to_exchange" => Ok(Destination::ToExchange),
            _ => key
                .strip_prefix(MEDICAL_UNIT_PREFIX)
                .and_then(|id| id.parse().ok())
                .map(Destination::ToMedicalUnit)
                .ok_or_else(|| UnknownDestination(key.to_string())),
        }
    }
}

impl TryFrom<String> for Destination {
    type Error = UnknownDestination;

    fn try_from(key: String) -> Result<Self, Self::Error> {
        key.parse()
    }
}

impl From<Destination> for String {
    fn from(destination: Destination) -> Self {
        destination.to_string()
    }
}

/// Whether day allocations must come in linked pairs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parity {
    #[default]
    Any,
    Even,
}

impl Parity {
    /// Smallest amount a day allocation may move by.
    pub fn unit(self) -> u32 {
        match self {
            Parity::Any => 1,
            Parity::Even => 2,
        }
    }

    /// Round `value` up to the next allowed allocation.
    pub fn round_up(self, value: u32) -> u32 {
        let unit = self.unit();
        value.div_ceil(unit) * unit
    }

    /// Largest allowed allocation not above `count`.
    pub fn capacity(self, count: u32) -> u32 {
        count - count % self.unit()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AllocationStrategy {
    /// Month → day proportional apportionment, then day-quota emission
    Proportional {
        #[serde(default)]
        parity: Parity,
    },
    /// Legacy fixed-step scan accepting vouchers two at a time from the same arrival
    Pairs,
}

impl Default for AllocationStrategy {
    fn default() -> Self {
        AllocationStrategy::Proportional {
            parity: Parity::Any,
        }
    }
}

/// Arrival date window used to filter the voucher listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrivalPeriod {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// Distribution quotas of one facility
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacilityQuota {
    #[serde(alias = "sanatorium_id")]
    pub facility_id: i64,
    pub quotas: IndexMap<Destination, u32>,
    /// Run passes in the listed order instead of the fixed priority order
    #[serde(default)]
    pub keep_order: bool,
}

impl FacilityQuota {
    pub fn new(facility_id: i64) -> Self {
        Self {
            facility_id,
            quotas: IndexMap::new(),
            keep_order: false,
        }
    }

    pub fn with(mut self, destination: Destination, target: u32) -> Self {
        self.quotas.insert(destination, target);
        self
    }

    pub fn target(&self, destination: Destination) -> u32 {
        self.quotas.get(&destination).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.quotas.values().map(|&t| u64::from(t)).sum()
    }

    /// Destination passes in execution order.
    pub fn passes(&self) -> Vec<(Destination, u32)> {
        let mut passes: Vec<_> = self.quotas.iter().map(|(&d, &t)| (d, t)).collect();
        if !self.keep_order {
            passes.sort_by_key(|&(d, _)| d);
        }
        passes
    }

    /// Largest quota `destination` could take given the other destinations' quotas.
    pub fn max_for(&self, destination: Destination, total_vouchers: usize) -> u64 {
        let others = self.total() - u64::from(self.target(destination));
        (total_vouchers as u64).saturating_sub(others)
    }

    /// Share of the facility's vouchers requested by `destination`, in percent (2 decimals).
    pub fn share_percent(&self, destination: Destination, total_vouchers: usize) -> f64 {
        if total_vouchers == 0 {
            return 0.0;
        }
        let percent = f64::from(self.target(destination)) / total_vouchers as f64 * 100.0;
        (percent * 100.0).round() / 100.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuotaValidationError {
    #[error("facility {0} is configured more than once")]
    DuplicateFacility(i64),
}

/// One full quota configuration. Every message replaces the previous one wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaConfiguration {
    #[serde(default)]
    pub strategy: AllocationStrategy,
    #[serde(default)]
    pub period: Option<ArrivalPeriod>,
    pub facilities: Vec<FacilityQuota>,
}

impl QuotaConfiguration {
    pub fn new(facilities: Vec<FacilityQuota>) -> Self {
        Self {
            facilities,
            ..Self::default()
        }
    }

    pub fn with_strategy(mut self, strategy: AllocationStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn facility(&self, facility_id: i64) -> Option<&FacilityQuota> {
        self.facilities.iter().find(|f| f.facility_id == facility_id)
    }

    pub fn facility_ids(&self) -> Vec<i64> {
        self.facilities.iter().map(|f| f.facility_id).collect()
    }

    pub fn validate(&self) -> Result<(), QuotaValidationError> {
        let mut seen = HashSet::new();
        for facility in &self.facilities {
            if !seen.insert(facility.facility_id) {
                return Err(QuotaValidationError::DuplicateFacility(facility.facility_id));
            }
        }
        Ok(())
    }
}
