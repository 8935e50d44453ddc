/// User Directory Interface
///
/// The session manager consumes user storage through this trait so the
/// token lifecycle never depends on a persistence engine. Directory
/// calls are the only operations that may block or suspend; everything
/// else in the token core is pure and CPU-bound.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::error::AppError;

mod memory;
mod postgres;

pub use memory::InMemoryDirectory;
pub use postgres::PgDirectory;

/// A user record as seen by the session manager
#[derive(Debug, Clone)]
pub struct DirectoryUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    /// The single active refresh-token pairing, if any
    pub pairing: Option<SessionPairing>,
}

/// The stored association between a user and their current refresh
/// token
///
/// Exactly one pairing is active per user: created on login,
/// overwritten on every successful refresh, never deleted except by
/// overwrite. Overwriting is what invalidates the previous refresh
/// token (single-use rotation).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPairing {
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl SessionPairing {
    /// Create a pairing expiring `ttl_days` from now
    pub fn new(refresh_token: String, ttl_days: i64) -> Self {
        Self {
            refresh_token,
            expires_at: Utc::now() + Duration::days(ttl_days),
        }
    }

    /// A pairing is usable only while `now < expires_at`
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }

    pub fn matches(&self, presented_token: &str) -> bool {
        self.refresh_token == presented_token
    }
}

/// Input for user creation
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Storage operations the session manager depends on
///
/// Implementations must make `update_pairing` atomic with respect to
/// other writes on the same user record; two concurrent refreshes may
/// race (last write wins) but a pairing write must never be torn.
#[async_trait]
pub trait UserDirectory {
    async fn find_by_username(&self, username: &str)
        -> Result<Option<DirectoryUser>, AppError>;

    /// Look up the user named by an access token's subject claim
    async fn find_by_subject(&self, subject: &str) -> Result<Option<DirectoryUser>, AppError>;

    async fn check_password(
        &self,
        user: &DirectoryUser,
        password: &str,
    ) -> Result<bool, AppError>;

    async fn roles(&self, user: &DirectoryUser) -> Result<Vec<String>, AppError>;

    async fn update_pairing(
        &self,
        user: &DirectoryUser,
        pairing: SessionPairing,
    ) -> Result<(), AppError>;

    async fn create_user(&self, new_user: NewUser) -> Result<DirectoryUser, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pairing_expiry_boundary() {
        let live = SessionPairing::new("token".to_string(), 7);
        assert!(!live.is_expired());

        let expired = SessionPairing {
            refresh_token: "token".to_string(),
            expires_at: Utc::now() - Duration::seconds(1),
        };
        assert!(expired.is_expired());
    }

    #[test]
    fn test_zero_ttl_pairing_is_expired() {
        // The TTL config quirk: a missing refresh TTL defaults to zero
        // days, which yields a pairing that is already unusable.
        let pairing = SessionPairing::new("token".to_string(), 0);
        assert!(pairing.is_expired());
    }

    #[test]
    fn test_pairing_match() {
        let pairing = SessionPairing::new("expected".to_string(), 7);
        assert!(pairing.matches("expected"));
        assert!(!pairing.matches("other"));
    }
}
