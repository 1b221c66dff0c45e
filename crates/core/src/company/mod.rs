//! Clients, vendors and end-clients.

pub mod error;
pub mod rules;
pub mod types;

pub use error::CompanyError;
pub use rules::{ensure_client_config, ensure_deletable, ensure_type, validate_timesheet_config};
pub use types::{CompanyType, TimesheetCycle};
