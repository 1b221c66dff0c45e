//! Employee domain types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Employment relationship with the agency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub enum EmploymentType {
    /// Internal staff (recruiters, account managers). Only they approve.
    Internal = 1,
    /// Consultants placed at clients.
    Consultant = 2,
}

impl EmploymentType {
    /// Returns the numeric id stored in `employees.employment_type_id`.
    #[must_use]
    pub const fn id(self) -> i16 {
        self as i16
    }

    /// Resolves a stored employment type id.
    #[must_use]
    pub const fn from_id(id: i16) -> Option<Self> {
        match id {
            1 => Some(Self::Internal),
            2 => Some(Self::Consultant),
            _ => None,
        }
    }

    /// Returns the display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Internal => "Internal",
            Self::Consultant => "Consultant",
        }
    }
}

impl TryFrom<i16> for EmploymentType {
    type Error = String;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        Self::from_id(value).ok_or_else(|| format!("unknown employment type {value}"))
    }
}

impl From<EmploymentType> for i16 {
    fn from(value: EmploymentType) -> Self {
        value.id()
    }
}

/// Whether the employee currently works for the agency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmployeeStatus {
    /// Currently employed.
    Active,
    /// Offboarded.
    Inactive,
}

impl EmployeeStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            _ => None,
        }
    }
}

impl fmt::Display for EmployeeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The fields of an employee record that lifecycle rules look at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeSnapshot {
    /// Employee ID.
    pub id: Uuid,
    /// Employment relationship.
    pub employment_type: EmploymentType,
    /// Current status.
    pub status: EmployeeStatus,
    /// Whether this employee owns the tenant account.
    pub is_tenant_owner: bool,
    /// Date of the current employment's start.
    pub joining_date: NaiveDate,
    /// Last relieving date, if ever offboarded.
    pub relieving_date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_employment_type_ids() {
        assert_eq!(EmploymentType::Internal.id(), 1);
        assert_eq!(EmploymentType::from_id(2), Some(EmploymentType::Consultant));
        assert_eq!(EmploymentType::from_id(9), None);
        assert!(serde_json::from_str::<EmploymentType>("7").is_err());
    }

    #[test]
    fn test_status_round_trip() {
        assert_eq!(EmployeeStatus::parse("ACTIVE"), Some(EmployeeStatus::Active));
        assert_eq!(EmployeeStatus::parse("gone"), None);
        assert_eq!(EmployeeStatus::Inactive.to_string(), "inactive");
    }
}
