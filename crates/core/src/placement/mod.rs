//! Placements of employees at clients, their timesheet approval source
//! and billing rate history.

pub mod billing;
pub mod config;
pub mod error;
pub mod rules;

#[cfg(test)]
mod billing_props;

pub use billing::{
    BillingPeriod, BillingRates, PeriodClosure, PlacementSpan, plan_new_billing, rate_on,
    validate_rates,
};
pub use config::{AvailableSettings, TimesheetApprovalSource, resolve_timesheet_config};
pub use error::{BillingError, PlacementError};
pub use rules::{PlacementParties, ensure_employee_active, validate_dates, validate_parties};
