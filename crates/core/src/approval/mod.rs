//! Approval chains for timesheets and invoices.
//!
//! # Modules
//!
//! - `types` - Approval modules, config types, submitted levels
//! - `error` - Approval configuration errors
//! - `rank` - Rank ordering rules (ranks must be exactly 1..N)
//! - `config` - Planning of level/approver inserts, re-ranks and deletions
//! - `guard` - Sole-approver protection for employee deactivation

pub mod config;
pub mod error;
pub mod guard;
pub mod rank;
pub mod types;

#[cfg(test)]
mod approval_props;

pub use config::{
    ApprovalPlan, ExistingApprover, ExistingLevel, NewLevel, plan_create, plan_update,
    submitted_approver_ids,
};
pub use error::ApprovalError;
pub use guard::{
    ApproverMembership, GuardDecision, OwnerReferences, SOLE_APPROVER_MESSAGE, SoleApproverGuard,
};
pub use rank::{check_rank_order, is_rank_order_valid, validate_levels};
pub use types::{
    ApprovalConfigInput, ApprovalConfigType, ApprovalLevelInput, ApprovalModule, RankInput,
};
