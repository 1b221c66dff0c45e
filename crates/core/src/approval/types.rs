//! Approval configuration domain types.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::approval::error::ApprovalError;

/// Which business document an approval setting governs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalModule {
    /// Timesheet approvals.
    Timesheet = 1,
    /// Invoice approvals.
    Invoice = 2,
}

impl ApprovalModule {
    /// Returns the numeric id stored in `approval_settings.approval_module`.
    #[must_use]
    pub const fn id(self) -> i16 {
        self as i16
    }

    /// Resolves a stored module id.
    #[must_use]
    pub const fn from_id(id: i16) -> Option<Self> {
        match id {
            1 => Some(Self::Timesheet),
            2 => Some(Self::Invoice),
            _ => None,
        }
    }

    /// Returns the string representation of the module.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Timesheet => "timesheet",
            Self::Invoice => "invoice",
        }
    }

    /// Parses a module from a path segment.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "timesheet" | "1" => Some(Self::Timesheet),
            "invoice" | "2" => Some(Self::Invoice),
            _ => None,
        }
    }
}

impl fmt::Display for ApprovalModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a placement takes its timesheet approval chain from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub enum ApprovalConfigType {
    /// Use the tenant-global timesheet configuration.
    TenantDefault = 1,
    /// Reuse the client's timesheet configuration.
    InheritClient = 2,
    /// The placement carries its own approval levels.
    Custom = 3,
}

impl ApprovalConfigType {
    /// Returns the numeric id stored in the database.
    #[must_use]
    pub const fn id(self) -> i16 {
        self as i16
    }

    /// Returns true when the placement owns its approval levels.
    #[must_use]
    pub const fn is_custom(self) -> bool {
        matches!(self, Self::Custom)
    }
}

impl TryFrom<i16> for ApprovalConfigType {
    type Error = String;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::TenantDefault),
            2 => Ok(Self::InheritClient),
            3 => Ok(Self::Custom),
            other => Err(format!("unknown approval config type {other}")),
        }
    }
}

impl From<ApprovalConfigType> for i16 {
    fn from(value: ApprovalConfigType) -> Self {
        value.id()
    }
}

/// A rank as submitted by clients: either a JSON number or a numeric string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RankInput {
    /// `"rank": 2`
    Number(i64),
    /// `"rank": "2"`
    Text(String),
}

impl RankInput {
    /// Parses the rank into a positive integer.
    pub fn parse(&self) -> Result<u32, ApprovalError> {
        let value = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| ApprovalError::InvalidRank(s.clone()))?,
        };

        u32::try_from(value)
            .ok()
            .filter(|rank| *rank > 0)
            .ok_or_else(|| ApprovalError::InvalidRank(value.to_string()))
    }
}

impl From<u32> for RankInput {
    fn from(rank: u32) -> Self {
        Self::Number(i64::from(rank))
    }
}

/// One approval level as submitted in a configuration payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalLevelInput {
    /// Existing level being edited, absent for new levels.
    #[serde(default)]
    pub id: Option<Uuid>,
    /// 1-based position in the approval chain.
    pub rank: RankInput,
    /// Employees approving at this rank.
    #[serde(default)]
    pub approver_ids: Vec<Uuid>,
}

impl ApprovalLevelInput {
    /// Creates a new level input (used by tests and seeders).
    #[must_use]
    pub fn new(rank: u32, approver_ids: Vec<Uuid>) -> Self {
        Self {
            id: None,
            rank: RankInput::from(rank),
            approver_ids,
        }
    }
}

/// Payload to store or update an approval configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalConfigInput {
    /// Approval levels.
    #[serde(default)]
    pub approvals: Vec<ApprovalLevelInput>,
    /// Approver assignments to remove.
    #[serde(default)]
    pub delete_user_ids: Vec<Uuid>,
    /// Levels to remove.
    #[serde(default)]
    pub delete_approval_level_ids: Vec<Uuid>,
}
