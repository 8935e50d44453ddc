/// Postgres User Directory
///
/// The production directory implementation. The refresh-token pairing
/// lives in two columns on the users row (single active pairing per
/// user, no session table); `update_pairing` is one UPDATE, so the
/// write is atomic with respect to other writes on the same record.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::verify_password;
use crate::error::{AppError, AuthError, DatabaseError};

use super::{DirectoryUser, NewUser, SessionPairing, UserDirectory};

type UserRow = (
    Uuid,
    String,
    String,
    String,
    Option<String>,
    Option<DateTime<Utc>>,
);

#[derive(Clone)]
pub struct PgDirectory {
    pool: PgPool,
}

impl PgDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_user(&self, username: &str) -> Result<Option<DirectoryUser>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, email, password_hash, refresh_token, refresh_token_expires_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(
            |(id, username, email, password_hash, refresh_token, expires_at)| {
                let pairing = match (refresh_token, expires_at) {
                    (Some(refresh_token), Some(expires_at)) => Some(SessionPairing {
                        refresh_token,
                        expires_at,
                    }),
                    _ => None,
                };
                DirectoryUser {
                    id,
                    username,
                    email,
                    password_hash,
                    pairing,
                }
            },
        ))
    }
}

#[async_trait]
impl UserDirectory for PgDirectory {
    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<DirectoryUser>, AppError> {
        self.fetch_user(username).await
    }

    async fn find_by_subject(&self, subject: &str) -> Result<Option<DirectoryUser>, AppError> {
        // The subject claim carries the username.
        self.fetch_user(subject).await
    }

    async fn check_password(
        &self,
        user: &DirectoryUser,
        password: &str,
    ) -> Result<bool, AppError> {
        verify_password(password, &user.password_hash)
    }

    async fn roles(&self, user: &DirectoryUser) -> Result<Vec<String>, AppError> {
        let roles = sqlx::query_scalar::<_, Vec<String>>(
            "SELECT roles FROM users WHERE id = $1",
        )
        .bind(user.id)
        .fetch_one(&self.pool)
        .await?;

        Ok(roles)
    }

    async fn update_pairing(
        &self,
        user: &DirectoryUser,
        pairing: SessionPairing,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET refresh_token = $1, refresh_token_expires_at = $2, updated_at = $3
            WHERE id = $4
            "#,
        )
        .bind(&pairing.refresh_token)
        .bind(pairing.expires_at)
        .bind(Utc::now())
        .bind(user.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::Database(DatabaseError::NotFound(format!(
                "User {} no longer exists",
                user.id
            ))));
        }

        Ok(())
    }

    async fn create_user(&self, new_user: NewUser) -> Result<DirectoryUser, AppError> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash, roles, created_at, updated_at)
            VALUES ($1, $2, $3, $4, '{}', $5, $6)
            "#,
        )
        .bind(id)
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(Utc::now())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::warn!(username = %new_user.username, error = %e, "User creation failed");
            AppError::Auth(AuthError::UserCreationFailed)
        })?;

        Ok(DirectoryUser {
            id,
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
            pairing: None,
        })
    }
}
