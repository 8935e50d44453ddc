/// JWT Claims structure
///
/// The claim set embedded in every access token: identity (subject
/// name, unique token id, role entries) plus the standard JWT claims
/// (RFC 7519). Constructed fresh per issuance and never mutated.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::configuration::JwtSettings;

/// Claims carried by access tokens
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,
    /// Unique token id, fresh per issuance
    pub jti: String,
    /// Role names assigned to the subject at issuance time
    pub roles: Vec<String>,
    /// Issuer
    pub iss: String,
    /// Audience
    pub aud: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Create a fresh claim set for a login
    ///
    /// # Arguments
    /// * `username` - Subject name
    /// * `roles` - Current role names from the user directory
    /// * `config` - JWT configuration (issuer, audience, access TTL)
    pub fn new(username: &str, roles: Vec<String>, config: &JwtSettings) -> Self {
        let now = chrono::Utc::now();
        Self {
            sub: username.to_string(),
            jti: Uuid::new_v4().to_string(),
            roles,
            iss: config.issuer.clone(),
            aud: config.audience.clone(),
            iat: now.timestamp(),
            exp: (now + chrono::Duration::minutes(config.access_token_expiry_minutes))
                .timestamp(),
        }
    }

    /// Reissue this claim set for a refreshed token
    ///
    /// Keeps subject and roles byte-identical to the presented token;
    /// only the token id and the timestamps change.
    pub fn reissued(&self, config: &JwtSettings) -> Self {
        Self::new(&self.sub, self.roles.clone(), config)
    }

    /// Check if the token's lifetime has elapsed
    pub fn is_expired(&self) -> bool {
        self.exp < chrono::Utc::now().timestamp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_test_config() -> JwtSettings {
        JwtSettings {
            secret: "test-secret-key-at-least-32-characters-long".to_string(),
            issuer: "test".to_string(),
            audience: "test-clients".to_string(),
            access_token_expiry_minutes: 15,
            refresh_token_expiry_days: 7,
        }
    }

    #[test]
    fn test_claims_creation() {
        let config = get_test_config();
        let claims = Claims::new("alice", vec!["admin".to_string()], &config);

        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.roles, vec!["admin".to_string()]);
        assert_eq!(claims.iss, "test");
        assert_eq!(claims.aud, "test-clients");
        assert_eq!(claims.exp - claims.iat, 15 * 60);
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_reissued_claims_keep_identity() {
        let config = get_test_config();
        let claims = Claims::new("alice", vec!["admin".to_string(), "user".to_string()], &config);
        let reissued = claims.reissued(&config);

        assert_eq!(reissued.sub, claims.sub);
        assert_eq!(reissued.roles, claims.roles);
        assert_eq!(reissued.iss, claims.iss);
        assert_eq!(reissued.aud, claims.aud);
        // Only the token id must change.
        assert_ne!(reissued.jti, claims.jti);
    }

    #[test]
    fn test_zero_ttl_claims_expire_immediately() {
        let mut config = get_test_config();
        config.access_token_expiry_minutes = 0;
        let claims = Claims::new("alice", vec![], &config);

        assert_eq!(claims.exp, claims.iat);
    }

    #[test]
    fn test_expired_claims_detected() {
        let mut config = get_test_config();
        config.access_token_expiry_minutes = -5;
        let claims = Claims::new("alice", vec![], &config);

        assert!(claims.is_expired());
    }
}
