/// JWT Signing and Verification
///
/// Issues HS256-signed access tokens and provides the two verification
/// paths: strict (signature, expiry, issuer, audience) for bearer
/// authentication, and signature-only for the refresh flow. The two
/// trust levels are separate functions so they can never be confused
/// at a call site.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::auth::claims::Claims;
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError};

/// Sign a claim set into an access token
///
/// # Arguments
/// * `claims` - Claim set to embed (expiry already set at construction)
/// * `config` - JWT configuration settings
///
/// # Errors
/// Returns error if encoding fails. An empty secret is rejected at
/// startup by `JwtSettings::validate`, not here.
pub fn generate_access_token(claims: &Claims, config: &JwtSettings) -> Result<String, AppError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
}

/// Validate an access token strictly and extract its claims
///
/// Checks signature, expiry, issuer and audience. This is the bearer
/// authentication path; the refresh flow must use
/// `decode_expired_token` instead.
///
/// # Errors
/// `AuthError::TokenExpired` when the lifetime has elapsed,
/// `AuthError::InvalidToken` for any other failure
pub fn validate_access_token(token: &str, config: &JwtSettings) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&config.issuer]);
    validation.set_audience(&[&config.audience]);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::warn!("JWT validation error: {}", e);
        match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                AppError::Auth(AuthError::TokenExpired)
            }
            _ => AppError::Auth(AuthError::InvalidToken),
        }
    })
}

/// Recover the claims of a possibly expired access token
///
/// Verifies the signature (constant-time comparison inside
/// jsonwebtoken) but deliberately skips expiry, issuer and audience:
/// this path exists solely so a same-issuer token can be refreshed
/// after its lifetime has elapsed, a narrowing of trust rather than a
/// workaround.
///
/// # Errors
/// `AuthError::InvalidToken` when the signature does not match or the
/// token is structurally malformed
pub fn decode_expired_token(token: &str, config: &JwtSettings) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.validate_aud = false;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::warn!("Expired-token decode error: {}", e);
        AppError::Auth(AuthError::InvalidToken)
    })
}
