/// Authentication module
///
/// Token signing and verification, refresh-token generation, password
/// hashing, and the session manager tying them together.

mod claims;
mod jwt;
mod password;
mod refresh_token;
mod session;

pub use claims::Claims;
pub use jwt::decode_expired_token;
pub use jwt::generate_access_token;
pub use jwt::validate_access_token;
pub use password::hash_password;
pub use password::verify_password;
pub use refresh_token::generate_refresh_token;
pub use session::SessionManager;
pub use session::TokenPair;
