/// Session Manager
///
/// Orchestrates the token lifecycle over a user directory: login
/// (credential check, claim assembly, signing, refresh-token pairing)
/// and refresh (expired-token recovery, pairing validation, rotation).
/// Registration comes along because the directory owns user creation.
///
/// Every failure is terminal for the request; nothing here retries.
/// Refresh failures are merged into one `InvalidToken` kind at the
/// boundary while the real cause goes to the log.

use serde::Serialize;

use crate::auth::claims::Claims;
use crate::auth::jwt::{decode_expired_token, generate_access_token};
use crate::auth::password::hash_password;
use crate::auth::refresh_token::generate_refresh_token;
use crate::configuration::JwtSettings;
use crate::directory::{DirectoryUser, NewUser, SessionPairing, UserDirectory};
use crate::error::{AppError, AuthError};

/// The pair of tokens returned by login, refresh and register
#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

pub struct SessionManager<D> {
    directory: D,
    jwt: JwtSettings,
}

impl<D: UserDirectory> SessionManager<D> {
    /// The settings must already have passed `JwtSettings::validate`;
    /// an empty secret is a startup failure, never a per-request one.
    pub fn new(directory: D, jwt: JwtSettings) -> Self {
        Self { directory, jwt }
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    /// Authenticate a user and issue a fresh token pair
    ///
    /// # Errors
    /// `AuthError::InvalidCredentials` for an unknown username or a
    /// wrong password; the two cases are indistinguishable to the
    /// caller so usernames cannot be enumerated.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair, AppError> {
        let user = self
            .directory
            .find_by_username(username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !self.directory.check_password(&user, password).await? {
            tracing::warn!(username = %username, "Login failed: wrong password");
            return Err(AuthError::InvalidCredentials.into());
        }

        let roles = self.directory.roles(&user).await?;
        let claims = Claims::new(&user.username, roles, &self.jwt);

        let tokens = self.issue_pair(&user, &claims).await?;

        tracing::info!(username = %user.username, "User logged in");
        Ok(tokens)
    }

    /// Exchange an expired access token plus the current refresh token
    /// for a new pair
    ///
    /// The presented access token only needs a valid signature; its
    /// expiry is deliberately ignored so clients can refresh after the
    /// access TTL elapses. Persisting the new pairing overwrites the
    /// old one, so the presented refresh token becomes unusable the
    /// moment this succeeds.
    ///
    /// # Errors
    /// `AuthError::InvalidToken` for every failure mode: bad
    /// signature, malformed token, unknown subject, refresh-token
    /// mismatch, refresh-token expiry.
    pub async fn refresh(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<TokenPair, AppError> {
        let claims = decode_expired_token(access_token, &self.jwt)?;

        if claims.sub.is_empty() {
            tracing::warn!("Refresh rejected: token carries no subject");
            return Err(AuthError::InvalidToken.into());
        }

        let user = match self.directory.find_by_subject(&claims.sub).await? {
            Some(user) => user,
            None => {
                tracing::warn!(subject = %claims.sub, "Refresh rejected: unknown subject");
                return Err(AuthError::InvalidToken.into());
            }
        };

        match &user.pairing {
            None => {
                tracing::warn!(username = %user.username, "Refresh rejected: no active pairing");
                return Err(AuthError::InvalidToken.into());
            }
            Some(pairing) if !pairing.matches(refresh_token) => {
                tracing::warn!(username = %user.username, "Refresh rejected: token mismatch");
                return Err(AuthError::InvalidToken.into());
            }
            Some(pairing) if pairing.is_expired() => {
                tracing::warn!(username = %user.username, "Refresh rejected: pairing expired");
                return Err(AuthError::InvalidToken.into());
            }
            Some(_) => {}
        }

        // Same subject and roles, new token id and timestamps.
        let reissued = claims.reissued(&self.jwt);
        let tokens = self.issue_pair(&user, &reissued).await?;

        tracing::info!(username = %user.username, "Tokens rotated");
        Ok(tokens)
    }

    /// Create a user and issue their first token pair
    ///
    /// # Errors
    /// `AuthError::UserAlreadyExists` when the username is taken;
    /// `AuthError::UserCreationFailed` (opaque) when the directory
    /// rejects the creation for any other reason.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<TokenPair, AppError> {
        if self.directory.find_by_username(username).await?.is_some() {
            return Err(AuthError::UserAlreadyExists.into());
        }

        let password_hash = hash_password(password)?;
        let user = self
            .directory
            .create_user(NewUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
            })
            .await?;

        let roles = self.directory.roles(&user).await?;
        let claims = Claims::new(&user.username, roles, &self.jwt);
        let tokens = self.issue_pair(&user, &claims).await?;

        tracing::info!(username = %user.username, "User registered");
        Ok(tokens)
    }

    /// Sign the claims, mint a refresh token, persist the pairing
    async fn issue_pair(
        &self,
        user: &DirectoryUser,
        claims: &Claims,
    ) -> Result<TokenPair, AppError> {
        let access_token = generate_access_token(claims, &self.jwt)?;
        let refresh_token = generate_refresh_token()?;

        let pairing =
            SessionPairing::new(refresh_token.clone(), self.jwt.refresh_token_expiry_days);
        self.directory.update_pairing(user, pairing).await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }
}
