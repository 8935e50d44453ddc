//! End-to-end token lifecycle over the in-memory directory: login,
//! refresh after access-token expiry, and single-use rotation.

use jwt_auth_server::auth::{validate_access_token, SessionManager};
use jwt_auth_server::configuration::JwtSettings;
use jwt_auth_server::directory::{InMemoryDirectory, UserDirectory};
use jwt_auth_server::error::{AppError, AuthError};

fn test_jwt_settings(access_minutes: i64) -> JwtSettings {
    JwtSettings {
        secret: "integration-test-secret-at-least-32-chars".to_string(),
        issuer: "lifecycle-tests".to_string(),
        audience: "lifecycle-clients".to_string(),
        access_token_expiry_minutes: access_minutes,
        refresh_token_expiry_days: 7,
    }
}

fn spawn_sessions(config: JwtSettings) -> SessionManager<InMemoryDirectory> {
    let directory = InMemoryDirectory::new();
    let hash = bcrypt::hash("correct", 4).expect("Failed to hash password");
    directory.insert_user("alice", "alice@example.com", &hash, vec!["admin".to_string()]);
    SessionManager::new(directory, config)
}

#[tokio::test]
async fn full_rotation_scenario() {
    // A negative access TTL stands in for advancing the clock past
    // token expiry: every access token is already expired on arrival.
    let config = test_jwt_settings(-5);
    let sessions = spawn_sessions(config.clone());

    // login(alice, correct) -> T1
    let t1 = sessions
        .login("alice", "correct")
        .await
        .expect("Login should succeed");

    // The access token has expired; strict validation rejects it but
    // refresh must still work.
    assert!(validate_access_token(&t1.access_token, &config).is_err());

    // refresh(A1, R1) -> T2, with both tokens replaced
    let t2 = sessions
        .refresh(&t1.access_token, &t1.refresh_token)
        .await
        .expect("First refresh should succeed");
    assert_ne!(t2.access_token, t1.access_token);
    assert_ne!(t2.refresh_token, t1.refresh_token);

    // refresh(A1, R1) again -> the rotated-out pair is dead
    match sessions.refresh(&t1.access_token, &t1.refresh_token).await {
        Err(AppError::Auth(AuthError::InvalidToken)) => (),
        other => panic!("Replayed refresh should fail, got {:?}", other.err()),
    }

    // refresh(A2, R2) -> the current pair still works
    let t3 = sessions
        .refresh(&t2.access_token, &t2.refresh_token)
        .await
        .expect("Refresh with the current pair should succeed");
    assert_ne!(t3.refresh_token, t2.refresh_token);
}

#[tokio::test]
async fn login_issues_valid_tokens_and_pairing() {
    let config = test_jwt_settings(15);
    let directory = InMemoryDirectory::new();
    let hash = bcrypt::hash("correct", 4).expect("Failed to hash password");
    directory.insert_user("alice", "alice@example.com", &hash, vec!["admin".to_string()]);
    let sessions = SessionManager::new(directory, config.clone());

    let tokens = sessions
        .login("alice", "correct")
        .await
        .expect("Login should succeed");

    let claims =
        validate_access_token(&tokens.access_token, &config).expect("Token should be valid");
    assert_eq!(claims.sub, "alice");
    assert_eq!(claims.roles, vec!["admin".to_string()]);

    // Pairing persisted on the user record, not yet expired.
    let directory = InMemoryDirectory::new();
    let hash = bcrypt::hash("correct", 4).unwrap();
    directory.insert_user("bob", "bob@example.com", &hash, vec![]);
    let sessions = SessionManager::new(directory, config);
    let tokens = sessions.login("bob", "correct").await.unwrap();

    let stored = sessions_directory_user(&sessions, "bob").await;
    let pairing = stored.pairing.expect("Pairing should be persisted");
    assert_eq!(pairing.refresh_token, tokens.refresh_token);
    assert!(!pairing.is_expired());
}

#[tokio::test]
async fn mismatched_refresh_token_is_rejected() {
    let config = test_jwt_settings(-5);
    let sessions = spawn_sessions(config);

    let tokens = sessions.login("alice", "correct").await.unwrap();

    match sessions
        .refresh(&tokens.access_token, "not-the-paired-token")
        .await
    {
        Err(AppError::Auth(AuthError::InvalidToken)) => (),
        other => panic!("Mismatched refresh should fail, got {:?}", other.err()),
    }

    // The failed attempt must not have disturbed the stored pairing.
    let retry = sessions
        .refresh(&tokens.access_token, &tokens.refresh_token)
        .await;
    assert!(retry.is_ok());
}

async fn sessions_directory_user(
    sessions: &SessionManager<InMemoryDirectory>,
    username: &str,
) -> jwt_auth_server::directory::DirectoryUser {
    sessions
        .directory()
        .find_by_username(username)
        .await
        .expect("Directory lookup failed")
        .expect("User should exist")
}
