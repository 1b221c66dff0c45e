//! Authentication claims carried by bearer tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims for access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (employee ID of the signed-in user).
    pub sub: Uuid,
    /// Tenant ID (current context).
    pub org: Uuid,
    /// User's role in the tenant.
    pub role: String,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for an employee.
    #[must_use]
    pub fn new(employee_id: Uuid, tenant_id: Uuid, role: &str, expires_at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            sub: employee_id,
            org: tenant_id,
            role: role.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the employee ID of the caller.
    #[must_use]
    pub const fn employee_id(&self) -> Uuid {
        self.sub
    }

    /// Returns the tenant ID the caller is acting in.
    #[must_use]
    pub const fn tenant_id(&self) -> Uuid {
        self.org
    }
}
