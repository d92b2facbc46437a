use super::Destination;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Calendar month of an arrival, ordered chronologically
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// English month name, e.g. "June"
    pub fn name(&self) -> String {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .map(|d| d.format("%B").to_string())
            .unwrap_or_else(|| self.to_string())
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let date = NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d")
            .map_err(|e| format!("invalid month `{s}`: {e}"))?;
        Ok(Self::of(date))
    }
}

impl TryFrom<String> for MonthKey {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<MonthKey> for String {
    fn from(key: MonthKey) -> Self {
        key.to_string()
    }
}

/// Month-level split of one destination's quota
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthBucket {
    pub month: MonthKey,
    pub record_count: u32,
    /// Share of the facility's vouchers arriving this month, percent
    pub share_percent: f64,
    pub fractional_target: f64,
    /// Proportional share rounded half away from zero, before the month's capacity
    /// and the residual correction are applied
    pub naive_target: u32,
    pub rounded_target: u32,
}

/// Day-level split of one month's target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub record_count: u32,
    pub fraction_of_month: f64,
    pub raw_target: f64,
    pub floor_target: u32,
    pub parity_target: u32,
    pub corrected_target: u32,
}

impl DayBucket {
    pub fn month(&self) -> MonthKey {
        MonthKey::of(self.date)
    }

    /// How far the convergence loop moved the day away from its rounded target.
    pub fn correction_delta(&self) -> i64 {
        i64::from(self.corrected_target) - i64::from(self.parity_target)
    }

    pub fn is_flagged(&self) -> bool {
        self.correction_delta().abs() > 1
    }
}

/// Month block of the control table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthSection {
    pub bucket: MonthBucket,
    pub days: Vec<DayBucket>,
}

impl MonthSection {
    pub fn corrected_total(&self) -> u32 {
        self.days.iter().map(|d| d.corrected_target).sum()
    }

    pub fn parity_total(&self) -> u32 {
        self.days.iter().map(|d| d.parity_target).sum()
    }

    pub fn floor_total(&self) -> u32 {
        self.days.iter().map(|d| d.floor_target).sum()
    }

    pub fn raw_total(&self) -> f64 {
        self.days.iter().map(|d| d.raw_target).sum()
    }
}

/// Diagnostic apportionment table of one (facility, destination) pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlTable {
    pub facility_id: i64,
    pub destination: Destination,
    pub months: Vec<MonthSection>,
}

impl ControlTable {
    /// Group chronologically ordered days under their months.
    pub fn new(
        facility_id: i64,
        destination: Destination,
        months: Vec<MonthBucket>,
        days: Vec<DayBucket>,
    ) -> Self {
        let mut sections: Vec<MonthSection> = months
            .into_iter()
            .map(|bucket| MonthSection {
                bucket,
                days: Vec::new(),
            })
            .collect();
        for day in days {
            if let Some(section) = sections.iter_mut().find(|s| s.bucket.month == day.month()) {
                section.days.push(day);
            }
        }
        Self {
            facility_id,
            destination,
            months: sections,
        }
    }

    pub fn days(&self) -> impl Iterator<Item = &DayBucket> {
        self.months.iter().flat_map(|m| m.days.iter())
    }

    pub fn corrected_total(&self) -> u32 {
        self.months.iter().map(MonthSection::corrected_total).sum()
    }

    pub fn flagged_days(&self) -> Vec<&DayBucket> {
        self.days().filter(|d| d.is_flagged()).collect()
    }
}
