/// In-Memory User Directory
///
/// Backs the session manager with a mutex-guarded map. Used by tests
/// and local runs without Postgres. The mutex serializes every
/// read-modify-write on a pairing, which satisfies the atomicity the
/// trait requires; it is never held across an await point.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::auth::verify_password;
use crate::error::{AppError, AuthError};

use super::{DirectoryUser, NewUser, SessionPairing, UserDirectory};

#[derive(Debug, Clone)]
struct StoredUser {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    roles: Vec<String>,
    pairing: Option<SessionPairing>,
}

impl StoredUser {
    fn snapshot(&self) -> DirectoryUser {
        DirectoryUser {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            password_hash: self.password_hash.clone(),
            pairing: self.pairing.clone(),
        }
    }
}

#[derive(Default)]
pub struct InMemoryDirectory {
    users: Mutex<HashMap<String, StoredUser>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user with an already-hashed password and fixed roles
    pub fn insert_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        roles: Vec<String>,
    ) -> Uuid {
        let id = Uuid::new_v4();
        let mut users = self.users.lock().unwrap();
        users.insert(
            username.to_string(),
            StoredUser {
                id,
                username: username.to_string(),
                email: email.to_string(),
                password_hash: password_hash.to_string(),
                roles,
                pairing: None,
            },
        );
        id
    }
}

#[async_trait]
impl UserDirectory for InMemoryDirectory {
    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<DirectoryUser>, AppError> {
        let users = self.users.lock().unwrap();
        Ok(users.get(username).map(StoredUser::snapshot))
    }

    async fn find_by_subject(&self, subject: &str) -> Result<Option<DirectoryUser>, AppError> {
        // The subject claim carries the username.
        self.find_by_username(subject).await
    }

    async fn check_password(
        &self,
        user: &DirectoryUser,
        password: &str,
    ) -> Result<bool, AppError> {
        verify_password(password, &user.password_hash)
    }

    async fn roles(&self, user: &DirectoryUser) -> Result<Vec<String>, AppError> {
        let users = self.users.lock().unwrap();
        users
            .get(&user.username)
            .map(|stored| stored.roles.clone())
            .ok_or_else(|| AppError::Auth(AuthError::InvalidCredentials))
    }

    async fn update_pairing(
        &self,
        user: &DirectoryUser,
        pairing: SessionPairing,
    ) -> Result<(), AppError> {
        let mut users = self.users.lock().unwrap();
        match users.get_mut(&user.username) {
            Some(stored) => {
                stored.pairing = Some(pairing);
                Ok(())
            }
            None => Err(AppError::Internal(format!(
                "Cannot persist pairing for unknown user {}",
                user.username
            ))),
        }
    }

    async fn create_user(&self, new_user: NewUser) -> Result<DirectoryUser, AppError> {
        let mut users = self.users.lock().unwrap();
        if users.contains_key(&new_user.username) {
            return Err(AppError::Auth(AuthError::UserAlreadyExists));
        }

        let stored = StoredUser {
            id: Uuid::new_v4(),
            username: new_user.username.clone(),
            email: new_user.email,
            password_hash: new_user.password_hash,
            roles: Vec::new(),
            pairing: None,
        };
        let snapshot = stored.snapshot();
        users.insert(new_user.username, stored);
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_find_by_username_and_subject_agree() {
        let directory = InMemoryDirectory::new();
        directory.insert_user("alice", "alice@example.com", "hash", vec![]);

        let by_name = directory.find_by_username("alice").await.unwrap().unwrap();
        let by_subject = directory.find_by_subject("alice").await.unwrap().unwrap();

        assert_eq!(by_name.id, by_subject.id);
        assert!(directory.find_by_username("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_pairing_overwrites_previous() {
        let directory = InMemoryDirectory::new();
        directory.insert_user("alice", "alice@example.com", "hash", vec![]);
        let user = directory.find_by_username("alice").await.unwrap().unwrap();

        let first = SessionPairing::new("first-token".to_string(), 7);
        directory.update_pairing(&user, first).await.unwrap();

        let second = SessionPairing::new("second-token".to_string(), 7);
        directory.update_pairing(&user, second.clone()).await.unwrap();

        let reloaded = directory.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(reloaded.pairing, Some(second));
    }

    #[tokio::test]
    async fn test_create_user_rejects_duplicates() {
        let directory = InMemoryDirectory::new();
        directory.insert_user("alice", "alice@example.com", "hash", vec![]);

        let result = directory
            .create_user(NewUser {
                username: "alice".to_string(),
                email: "other@example.com".to_string(),
                password_hash: "hash".to_string(),
            })
            .await;

        match result {
            Err(AppError::Auth(AuthError::UserAlreadyExists)) => (),
            other => panic!("Expected UserAlreadyExists, got {:?}", other.err()),
        }
    }
}
