use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::PortalError;

/// A pay period. `month` is 1-indexed.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize, ToSchema)]
pub struct PayslipPeriod {
    pub year: i32,
    pub month: u32,
}

impl PayslipPeriod {
    pub fn new(year: i32, month: u32) -> Result<Self, PortalError> {
        if !(1..=12).contains(&month) {
            return Err(PortalError::validation(format!(
                "Month must be between 1 and 12, got {month}"
            )));
        }
        if !(1900..=9999).contains(&year) {
            return Err(PortalError::validation(format!("Invalid year {year}")));
        }
        Ok(Self { year, month })
    }

    /// Parses a month picker value such as `2024-03`.
    pub fn from_month_picker(value: &str) -> Result<Self, PortalError> {
        let invalid = || PortalError::validation(format!("Invalid month {value:?}, expected YYYY-MM"));
        let (year, month) = value.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month)
    }

    pub fn current() -> Self {
        let now = Utc::now();
        Self {
            year: now.year(),
            month: now.month(),
        }
    }
}

impl std::fmt::Display for PayslipPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Payslip {
    pub employee_id: u64,
    pub year: i32,
    pub month: u32,
    pub base_salary: f64,
    pub allowances: f64,
    pub bonus: f64,
    pub deductions: f64,
    pub tax: f64,
    pub net_salary: f64,
    pub generated_at: Option<DateTime<Utc>>,
    /// link to the rendered document, when the backend produced one
    pub artifact_url: Option<String>,
}

impl Payslip {
    pub fn period(&self) -> PayslipPeriod {
        PayslipPeriod {
            year: self.year,
            month: self.month,
        }
    }
}

/// One read of a generated payslip. `payslip` is only meaningful when `ready`.
#[derive(Debug, Clone, PartialEq)]
pub struct PayslipFetch {
    pub ready: bool,
    pub payslip: Option<Payslip>,
}
