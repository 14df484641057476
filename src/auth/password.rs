use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use tracing::error;

lazy_static! {
    /// Stand-in hash verified when the username is unknown, so that login
    /// costs the same whether or not the account exists.
    static ref DUMMY_HASH: String = hash_password("virtueville-no-such-player").unwrap_or_default();
}

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!(error = %e, "password hashing failed");
            anyhow::anyhow!("password hashing failed: {e}")
        })
}

/// False on mismatch; an error only when `hash` is not a PHC string.
pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "stored password hash unreadable");
        anyhow::anyhow!("stored password hash unreadable: {e}")
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// Burns one verification against `DUMMY_HASH`. Always fails.
pub fn verify_against_dummy(plain: &str) {
    let _ = verify_password(plain, &DUMMY_HASH);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_password_gets_distinct_salts() {
        let a = hash_password("kindness1").unwrap();
        let b = hash_password("kindness1").unwrap();
        assert!(a.starts_with("$argon2id$"));
        assert_ne!(a, b);
        assert!(verify_password("kindness1", &a).unwrap());
        assert!(verify_password("kindness1", &b).unwrap());
    }

    #[test]
    fn near_misses_are_rejected() {
        let hash = hash_password("courage!").unwrap();
        for guess in ["Courage!", "courage", "courage! ", ""] {
            assert!(!verify_password(guess, &hash).unwrap(), "{guess:?}");
        }
    }

    #[test]
    fn non_ascii_passwords_round_trip() {
        let hash = hash_password("empatía-勇気").unwrap();
        assert!(verify_password("empatía-勇気", &hash).unwrap());
        assert!(!verify_password("empatia-勇気", &hash).unwrap());
    }

    #[test]
    fn plaintext_in_hash_column_is_an_error() {
        assert!(verify_password("secret1", "secret1").is_err());
    }

    #[test]
    fn dummy_hash_is_real_and_matches_nothing_useful() {
        assert!(DUMMY_HASH.starts_with("$argon2"));
        assert!(!verify_password("secret1", &DUMMY_HASH).unwrap());
        verify_against_dummy("secret1");
    }
}
