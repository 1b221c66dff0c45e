//! Signing and verification of bearer tokens.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;
use uuid::Uuid;

use crate::auth::Claims;
use crate::config::JwtSettings;

/// Lifetime class of an issued token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Short-lived token sent as `Authorization: Bearer`.
    Access,
    /// Long-lived token backing a stored session.
    Refresh,
}

/// Errors raised while issuing or verifying tokens.
#[derive(Debug, Error)]
pub enum JwtError {
    /// Signing failed or the expiry overflowed.
    #[error("failed to sign token: {0}")]
    Signing(String),

    /// Token has expired.
    #[error("token has expired")]
    Expired,

    /// Bad signature, malformed token or unexpected claims.
    #[error("invalid token: {0}")]
    Invalid(String),
}

/// Issues and verifies HS256 tokens for employees.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

fn ttl_from_secs(secs: u64) -> Duration {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::MAX)
}

impl JwtService {
    /// Builds the service from the `[jwt]` configuration section.
    #[must_use]
    pub fn new(settings: &JwtSettings) -> Self {
        let secret = settings.secret.as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            access_ttl: ttl_from_secs(settings.access_token_expiry_secs),
            refresh_ttl: ttl_from_secs(settings.refresh_token_expiry_secs),
        }
    }

    /// Expiry of a token of `kind` issued now.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::Signing` when the lifetime overflows the clock.
    pub fn expires_at(&self, kind: TokenKind) -> Result<DateTime<Utc>, JwtError> {
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        Utc::now()
            .checked_add_signed(ttl)
            .ok_or_else(|| JwtError::Signing("token lifetime out of range".to_string()))
    }

    /// Issues a token for an employee acting in a tenant.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::Signing` if encoding fails.
    pub fn issue(
        &self,
        kind: TokenKind,
        employee_id: Uuid,
        tenant_id: Uuid,
        role: &str,
    ) -> Result<String, JwtError> {
        let claims = Claims::new(employee_id, tenant_id, role, self.expires_at(kind)?);
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| JwtError::Signing(e.to_string()))
    }

    /// Verifies the signature and expiry of a token and returns its claims.
    ///
    /// # Errors
    ///
    /// `JwtError::Expired` past `exp`, otherwise `JwtError::Invalid`.
    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::Invalid(e.to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(secret: &str) -> JwtSettings {
        JwtSettings {
            secret: secret.to_string(),
            access_token_expiry_secs: 900,
            refresh_token_expiry_secs: 604_800,
        }
    }

    #[test]
    fn test_issued_token_verifies_to_same_employee() {
        let service = JwtService::new(&settings("test-secret"));
        let employee_id = Uuid::new_v4();
        let tenant_id = Uuid::new_v4();

        let token = service
            .issue(TokenKind::Access, employee_id, tenant_id, "admin")
            .unwrap();
        let claims = service.verify(&token).unwrap();

        assert_eq!(claims.employee_id(), employee_id);
        assert_eq!(claims.tenant_id(), tenant_id);
        assert_eq!(claims.role, "admin");
    }

    #[test]
    fn test_refresh_outlives_access() {
        let service = JwtService::new(&settings("test-secret"));
        let access = service.expires_at(TokenKind::Access).unwrap();
        let refresh = service.expires_at(TokenKind::Refresh).unwrap();
        assert!(refresh - access > Duration::days(6));
    }

    #[test]
    fn test_foreign_signature_is_invalid() {
        let service = JwtService::new(&settings("test-secret"));
        let token = JwtService::new(&settings("another-secret"))
            .issue(TokenKind::Access, Uuid::new_v4(), Uuid::new_v4(), "admin")
            .unwrap();
        assert!(matches!(service.verify(&token), Err(JwtError::Invalid(_))));
        assert!(matches!(service.verify("not.a.token"), Err(JwtError::Invalid(_))));
    }

    #[test]
    fn test_expired_token() {
        let mut service = JwtService::new(&settings("test-secret"));
        service.access_ttl = Duration::minutes(-10);

        let token = service
            .issue(TokenKind::Access, Uuid::new_v4(), Uuid::new_v4(), "admin")
            .unwrap();
        assert!(matches!(service.verify(&token), Err(JwtError::Expired)));
    }

    #[test]
    fn test_oversized_lifetime_is_clamped() {
        assert_eq!(ttl_from_secs(u64::MAX), Duration::MAX);
        let service = JwtService::new(&JwtSettings {
            access_token_expiry_secs: u64::MAX,
            ..settings("test-secret")
        });
        assert!(service.expires_at(TokenKind::Access).is_err());
    }
}
