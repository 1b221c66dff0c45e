//! Refresh-token sessions of employees.

use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, Set,
};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::entities::sessions;

/// Revokes every active session of an employee.
///
/// Used inside the offboarding transaction.
pub(crate) async fn revoke_employee_sessions<C: ConnectionTrait>(
    conn: &C,
    employee_id: Uuid,
) -> Result<u64, DbErr> {
    let now = Utc::now();

    let result = sessions::Entity::update_many()
        .col_expr(sessions::Column::RevokedAt, Expr::value(now))
        .col_expr(sessions::Column::UpdatedAt, Expr::value(now))
        .filter(sessions::Column::EmployeeId.eq(employee_id))
        .filter(sessions::Column::RevokedAt.is_null())
        .exec(conn)
        .await?;

    Ok(result.rows_affected)
}

/// Session repository.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    db: DatabaseConnection,
}

impl SessionRepository {
    /// Creates a new session repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Hashes a refresh token for storage.
    #[must_use]
    pub fn hash_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Creates a new session.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(
        &self,
        employee_id: Uuid,
        tenant_id: Uuid,
        refresh_token: &str,
        expires_at: DateTime<Utc>,
        user_agent: Option<&str>,
    ) -> Result<sessions::Model, DbErr> {
        let now = Utc::now().into();

        sessions::ActiveModel {
            id: Set(Uuid::now_v7()),
            employee_id: Set(employee_id),
            tenant_id: Set(tenant_id),
            refresh_token_hash: Set(Self::hash_token(refresh_token)),
            user_agent: Set(user_agent.map(String::from)),
            ip_address: Set(None),
            expires_at: Set(expires_at.into()),
            revoked_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
    }

    /// Deletes expired sessions.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub async fn cleanup_expired(&self) -> Result<u64, DbErr> {
        let result = sessions::Entity::delete_many()
            .filter(sessions::Column::ExpiresAt.lt(Utc::now()))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_token_is_stable_hex() {
        let hash = SessionRepository::hash_token("refresh-token");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, SessionRepository::hash_token("refresh-token"));
        assert_ne!(hash, SessionRepository::hash_token("other-token"));
    }
}
