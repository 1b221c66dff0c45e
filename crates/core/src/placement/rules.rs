//! Placement create/update rules.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::company::{CompanyType, ensure_type};
use crate::employee::EmployeeStatus;
use crate::placement::error::PlacementError;

/// Checks that the end date, if any, is not before the start date.
///
/// # Errors
///
/// Returns `EndBeforeStart`.
pub fn validate_dates(start: NaiveDate, end: Option<NaiveDate>) -> Result<(), PlacementError> {
    match end {
        Some(end) if end < start => Err(PlacementError::EndBeforeStart { start, end }),
        _ => Ok(()),
    }
}

/// Checks that the placed employee is active.
///
/// # Errors
///
/// Returns `EmployeeInactive`.
pub fn ensure_employee_active(id: Uuid, status: EmployeeStatus) -> Result<(), PlacementError> {
    if status == EmployeeStatus::Active {
        Ok(())
    } else {
        Err(PlacementError::EmployeeInactive(id))
    }
}

/// Companies referenced by a placement, with their stored types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementParties {
    /// Client id and type.
    pub client: (Uuid, CompanyType),
    /// Vendor id and type.
    pub vendor: Option<(Uuid, CompanyType)>,
    /// End-client id and type.
    pub end_client: Option<(Uuid, CompanyType)>,
}

/// Checks each referenced company plays the role it is referenced as.
///
/// # Errors
///
/// Returns the first `WrongType` company error.
pub fn validate_parties(parties: &PlacementParties) -> Result<(), crate::CoreError> {
    let (client, client_type) = parties.client;
    ensure_type(client, client_type, CompanyType::Client)?;
    if let Some((vendor, vendor_type)) = parties.vendor {
        ensure_type(vendor, vendor_type, CompanyType::Vendor)?;
    }
    if let Some((end_client, end_client_type)) = parties.end_client {
        ensure_type(end_client, end_client_type, CompanyType::EndClient)?;
    }
    Ok(())
}
