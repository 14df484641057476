use lazy_static::lazy_static;
use regex::Regex;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::{
    auth::{
        dto::{LoginRequest, RegisterRequest},
        password::{hash_password, verify_against_dummy, verify_password},
        repo_types::User,
    },
    error::{AppError, AppResult},
};

pub const MIN_PASSWORD_LEN: usize = 6;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Trims the username, normalises the email, and checks field shapes.
pub fn validate_registration(req: &mut RegisterRequest) -> AppResult<()> {
    req.username = req.username.trim().to_string();
    req.email = req.email.trim().to_lowercase();

    if req.username.is_empty() || req.email.is_empty() || req.password.is_empty() {
        return Err(AppError::Validation("All fields required.".into()));
    }
    if !is_valid_email(&req.email) {
        return Err(AppError::Validation("Invalid email.".into()));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation("Password must be 6+ chars.".into()));
    }
    Ok(())
}

/// validate → uniqueness lookup → hash → insert.
///
/// The lookup gives the common case a clean answer; the UNIQUE constraints on
/// `users` catch registrations that race past it.
pub async fn register(db: &SqlitePool, mut req: RegisterRequest) -> AppResult<User> {
    validate_registration(&mut req)?;

    if User::find_by_username_or_email(db, &req.username, &req.email)
        .await?
        .is_some()
    {
        warn!(username = %req.username, "username or email already registered");
        return Err(AppError::DuplicateIdentity);
    }

    let hash = hash_password(&req.password)?;

    let user = User::create(db, &req.username, &req.email, &hash)
        .await
        .map_err(|e| {
            if AppError::is_unique_violation(&e) {
                warn!(username = %req.username, "lost registration race");
                AppError::DuplicateIdentity
            } else {
                AppError::PersistenceFailed(e)
            }
        })?;

    info!(user_id = user.id, username = %user.username, "user registered");
    Ok(user)
}

/// Unknown usernames and wrong passwords are indistinguishable to the caller,
/// in both the error and the argon2 work done.
pub async fn authenticate(db: &SqlitePool, req: &LoginRequest) -> AppResult<User> {
    let username = req.username.trim();
    if username.is_empty() || req.password.is_empty() {
        return Err(AppError::Validation(
            "Username and password required.".into(),
        ));
    }

    let Some(user) = User::find_by_username(db, username).await? else {
        verify_against_dummy(&req.password);
        warn!(%username, "login unknown username");
        return Err(AppError::InvalidCredentials);
    };

    if !verify_password(&req.password, &user.password_hash)? {
        warn!(user_id = user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    info!(user_id = user.id, username = %user.username, "user logged in");
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_in_memory;

    fn req(username: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    #[test]
    fn email_shape() {
        assert!(is_valid_email("player@virtue.ville"));
        assert!(!is_valid_email("player@virtue"));
        assert!(!is_valid_email("play er@virtue.ville"));
        assert!(!is_valid_email("@virtue.ville"));
    }

    #[test]
    fn validation_messages() {
        let err = validate_registration(&mut req("", "a@b.c", "secret")).unwrap_err();
        assert_eq!(err.public_message(), "All fields required.");

        let err = validate_registration(&mut req("ana", "not-an-email", "secret")).unwrap_err();
        assert_eq!(err.public_message(), "Invalid email.");

        let err = validate_registration(&mut req("ana", "a@b.c", "12345")).unwrap_err();
        assert_eq!(err.public_message(), "Password must be 6+ chars.");
    }

    #[test]
    fn validation_normalises_fields() {
        let mut r = req("  ana ", " Ana@Example.COM ", "secret");
        validate_registration(&mut r).unwrap();
        assert_eq!(r.username, "ana");
        assert_eq!(r.email, "ana@example.com");
    }

    #[tokio::test]
    async fn register_then_authenticate() {
        let db = connect_in_memory().await.unwrap();
        let user = register(&db, req("ana", "ana@example.com", "secret"))
            .await
            .unwrap();

        let login = LoginRequest {
            username: "ana".into(),
            password: "secret".into(),
        };
        let authed = authenticate(&db, &login).await.unwrap();
        assert_eq!(authed.id, user.id);
        assert_ne!(authed.password_hash, "secret");
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let db = connect_in_memory().await.unwrap();
        register(&db, req("ana", "shared@example.com", "secret"))
            .await
            .unwrap();

        let err = register(&db, req("bob", "SHARED@example.com", "secret"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateIdentity));
        assert_eq!(User::count(&db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected() {
        let db = connect_in_memory().await.unwrap();
        register(&db, req("ana", "one@example.com", "secret"))
            .await
            .unwrap();
        let err = register(&db, req("ana", "two@example.com", "secret"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateIdentity));
    }

    #[tokio::test]
    async fn insert_race_maps_to_duplicate_identity() {
        let db = connect_in_memory().await.unwrap();
        User::create(&db, "ana", "ana@example.com", "x").await.unwrap();
        let err = User::create(&db, "ana2", "ana@example.com", "x")
            .await
            .unwrap_err();
        assert!(AppError::is_unique_violation(&err));
    }

    #[tokio::test]
    async fn bad_password_and_unknown_user_look_the_same() {
        let db = connect_in_memory().await.unwrap();
        register(&db, req("ana", "ana@example.com", "secret"))
            .await
            .unwrap();

        let wrong = authenticate(
            &db,
            &LoginRequest {
                username: "ana".into(),
                password: "nope!!".into(),
            },
        )
        .await
        .unwrap_err();
        let unknown = authenticate(
            &db,
            &LoginRequest {
                username: "ghost".into(),
                password: "secret".into(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(wrong.public_message(), unknown.public_message());
        assert!(matches!(wrong, AppError::InvalidCredentials));
        assert!(matches!(unknown, AppError::InvalidCredentials));
    }

    #[tokio::test]
    async fn unknown_user_pays_for_a_hash_check() {
        let db = connect_in_memory().await.unwrap();
        register(&db, req("ana", "ana@example.com", "secret"))
            .await
            .unwrap();
        let login = |username: &str| LoginRequest {
            username: username.into(),
            password: "wrong-one".into(),
        };
        // warm the stand-in hash so only verification is timed
        let _ = authenticate(&db, &login("ghost")).await;

        let started = std::time::Instant::now();
        let _ = authenticate(&db, &login("ana")).await;
        let known = started.elapsed();

        let started = std::time::Instant::now();
        let _ = authenticate(&db, &login("ghost")).await;
        let unknown = started.elapsed();

        assert!(unknown * 4 >= known, "unknown {unknown:?} vs known {known:?}");
    }
}
