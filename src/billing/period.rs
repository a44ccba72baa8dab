use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// key: billing-period -> calendar month identifier
///
/// The unit over which one debt is generated per student. Rendered in the
/// fixed, sortable `YYYY-MM` form everywhere it leaves the process.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct BillingPeriod {
    year: i32,
    month: u32,
}

impl BillingPeriod {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) {
            Some(Self { year, month })
        } else {
            None
        }
    }

    pub fn from_date(at: DateTime<Utc>) -> Self {
        Self {
            year: at.year(),
            month: at.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }
}

impl fmt::Display for BillingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[derive(Debug, Error)]
#[error("invalid billing period '{0}', expected YYYY-MM")]
pub struct ParseBillingPeriodError(String);

impl FromStr for BillingPeriod {
    type Err = ParseBillingPeriodError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseBillingPeriodError(value.to_string());
        let (year, month) = value.split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        BillingPeriod::new(year, month).ok_or_else(invalid)
    }
}

impl TryFrom<String> for BillingPeriod {
    type Error = ParseBillingPeriodError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BillingPeriod> for String {
    fn from(period: BillingPeriod) -> Self {
        period.to_string()
    }
}

/// key: billing-clock -> injectable period resolution
///
/// Wall-clock access sits behind this trait so a generation run can be pinned
/// to an explicit instant in tests and backfills.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn current_period(&self) -> BillingPeriod {
        BillingPeriod::from_date(self.now())
    }
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A pinned instant. Every tick resolves to the same period.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
