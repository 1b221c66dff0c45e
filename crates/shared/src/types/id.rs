//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing an `EmployeeId` where a `CompanyId` is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates a new random ID using UUID v7 (time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

typed_id!(TenantId, "Unique identifier for a tenant (staffing agency).");
typed_id!(EmployeeId, "Unique identifier for an employee.");
typed_id!(CompanyId, "Unique identifier for a client, vendor, or end-client company.");
typed_id!(PlacementId, "Unique identifier for a placement.");
typed_id!(ApprovalSettingId, "Unique identifier for an approval setting.");
typed_id!(ApprovalLevelId, "Unique identifier for an approval level.");
typed_id!(ApprovalUserId, "Unique identifier for an approver assignment.");
typed_id!(DocumentId, "Unique identifier for an employee document.");
typed_id!(BillingId, "Unique identifier for a placement billing rate.");
