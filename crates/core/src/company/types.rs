//! Company domain types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role a company plays for the agency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanyType {
    /// Company the consultant works for.
    Client,
    /// Subcontracting vendor.
    Vendor,
    /// Final client behind a vendor chain.
    EndClient,
}

impl CompanyType {
    /// Returns the string stored in `companies.company_type`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Vendor => "vendor",
            Self::EndClient => "end_client",
        }
    }

    /// Parses a stored company type.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "client" => Some(Self::Client),
            "vendor" => Some(Self::Vendor),
            "end_client" => Some(Self::EndClient),
            _ => None,
        }
    }

    /// Prefix of the human-readable reference id.
    #[must_use]
    pub const fn reference_prefix(self) -> &'static str {
        match self {
            Self::Client => "CLI",
            Self::Vendor => "VEN",
            Self::EndClient => "ECL",
        }
    }
}

impl fmt::Display for CompanyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How often a client's timesheets are submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimesheetCycle {
    /// Every week.
    Weekly,
    /// Every two weeks.
    BiWeekly,
    /// Twice a month.
    SemiMonthly,
    /// Once a month.
    Monthly,
}

impl TimesheetCycle {
    /// Returns the string stored in `companies.timesheet_cycle`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::BiWeekly => "bi_weekly",
            Self::SemiMonthly => "semi_monthly",
            Self::Monthly => "monthly",
        }
    }

    /// Parses a stored cycle.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "weekly" => Some(Self::Weekly),
            "bi_weekly" => Some(Self::BiWeekly),
            "semi_monthly" => Some(Self::SemiMonthly),
            "monthly" => Some(Self::Monthly),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_company_type_serde_matches_storage() {
        let json = serde_json::to_string(&CompanyType::EndClient).unwrap();
        assert_eq!(json, "\"end_client\"");
        assert_eq!(CompanyType::parse("end_client"), Some(CompanyType::EndClient));
        assert_eq!(CompanyType::Vendor.reference_prefix(), "VEN");
    }

    #[test]
    fn test_cycle_parse() {
        assert_eq!(TimesheetCycle::parse("bi_weekly"), Some(TimesheetCycle::BiWeekly));
        assert_eq!(
            serde_json::from_str::<TimesheetCycle>("\"semi_monthly\"").unwrap(),
            TimesheetCycle::SemiMonthly
        );
        assert_eq!(TimesheetCycle::parse("daily"), None);
    }
}
