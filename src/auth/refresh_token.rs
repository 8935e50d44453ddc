/// Refresh Token Generation
///
/// Refresh tokens are opaque bearer secrets: 64 bytes from the OS
/// CSPRNG, base64-encoded, carrying no embedded structure. They are
/// never parsed, only compared against the pairing stored on the user
/// record. No uniqueness check is performed; collision probability is
/// cryptographically negligible.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::AppError;

const REFRESH_TOKEN_BYTES: usize = 64;

/// Generate a new refresh token
///
/// # Errors
/// `AppError::RandomnessUnavailable` if the OS randomness source
/// fails. This is fatal and never retried.
pub fn generate_refresh_token() -> Result<String, AppError> {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| AppError::RandomnessUnavailable(e.to_string()))?;

    Ok(BASE64.encode(bytes))
}
