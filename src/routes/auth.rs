/// Authentication Routes
///
/// HTTP surface over the session manager: registration, login, token
/// refresh, and current-user lookup.

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::auth::{Claims, SessionManager};
use crate::directory::{PgDirectory, UserDirectory};
use crate::error::{AppError, AuthError};
use crate::validators::{is_valid_email, is_valid_username};

/// User registration request
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// User login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Token refresh request: the expired access token plus the refresh
/// token currently paired to the user
#[derive(Deserialize)]
pub struct RefreshRequest {
    pub access_token: String,
    pub refresh_token: String,
}

/// POST /auth/register
///
/// Register a new user and return their first token pair.
///
/// # Errors
/// - 400: invalid username/email/password, or username taken
/// - 500: opaque creation failure
pub async fn register(
    form: web::Json<RegisterRequest>,
    sessions: web::Data<SessionManager<PgDirectory>>,
) -> Result<HttpResponse, AppError> {
    let username = is_valid_username(&form.username)?;
    let email = is_valid_email(&form.email)?;

    let tokens = sessions.register(&username, &email, &form.password).await?;

    Ok(HttpResponse::Created().json(tokens))
}

/// POST /auth/login
///
/// Authenticate with username and password.
///
/// # Security Notes
/// - "User not found" and "wrong password" both answer 401 with the
///   same body, preventing username enumeration
///
/// # Errors
/// - 401: invalid credentials
pub async fn login(
    form: web::Json<LoginRequest>,
    sessions: web::Data<SessionManager<PgDirectory>>,
) -> Result<HttpResponse, AppError> {
    let tokens = sessions.login(&form.username, &form.password).await?;

    Ok(HttpResponse::Ok().json(tokens))
}

/// POST /auth/refresh
///
/// Exchange an (expired) access token and the current refresh token
/// for a new pair. Single-use rotation: the presented refresh token is
/// invalidated by the overwrite when this succeeds.
///
/// # Errors
/// - 400: any token failure, merged into one response
pub async fn refresh(
    form: web::Json<RefreshRequest>,
    sessions: web::Data<SessionManager<PgDirectory>>,
) -> Result<HttpResponse, AppError> {
    let tokens = sessions
        .refresh(&form.access_token, &form.refresh_token)
        .await?;

    Ok(HttpResponse::Ok().json(tokens))
}

/// GET /auth/me
///
/// Current authenticated user; claims are injected by the bearer
/// middleware, which uses strict validation.
///
/// # Errors
/// - 401: missing or invalid token (handled by middleware)
pub async fn get_current_user(
    claims: web::ReqData<Claims>,
    directory: web::Data<PgDirectory>,
) -> Result<HttpResponse, AppError> {
    let user = directory
        .find_by_subject(&claims.sub)
        .await?
        .ok_or(AuthError::InvalidToken)?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "username": user.username,
        "email": user.email,
        "roles": claims.roles.clone(),
    })))
}
