//! Employee lifecycle: onboarding, offboarding, rejoin and documents.

pub mod document;
pub mod error;
pub mod lifecycle;
pub mod types;

pub use document::{DocumentDates, DocumentType, is_expired, validate_document};
pub use error::EmployeeError;
pub use lifecycle::{approver_release, ensure_can_deactivate, validate_offboarding, validate_rejoin};
pub use types::{EmployeeSnapshot, EmployeeStatus, EmploymentType};
