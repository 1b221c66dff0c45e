//! `SeaORM` entity definitions.

pub mod approval_levels;
pub mod approval_settings;
pub mod approval_users;
pub mod companies;
pub mod employee_documents;
pub mod employees;
pub mod placement_billings;
pub mod placements;
pub mod sessions;
pub mod tenants;
