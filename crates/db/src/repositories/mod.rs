//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod approval;
pub mod company;
pub mod employee;
pub mod error;
pub mod placement;
pub mod reference;
pub mod session;

pub use approval::{ApprovalConfigView, ApprovalRepository, ApproverView, LevelView};
pub use company::{
    CompanyDetail, CompanyFilter, CompanyRepository, CreateCompanyInput, TimesheetConfigInput,
    UpdateCompanyInput,
};
pub use employee::{
    CreateDocumentInput, CreateEmployeeInput, EmployeeFilter, EmployeeRepository, OffboardInput,
    OffboardOutcome, UpdateDocumentInput, UpdateEmployeeInput,
};
pub use error::RepoError;
pub use placement::{
    CreateBillingInput, CreatePlacementInput, PlacementDetail, PlacementFilter,
    PlacementRepository, PlacementTimesheetConfigInput, UpdatePlacementInput,
};
pub use session::SessionRepository;
