use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::{config::SessionConfig, state::AppState};

/// Payload of the signed session cookie. The session itself lives in the
/// database; the cookie only proves which row it refers to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sid: Uuid,   // session row id
    pub sub: i64,    // user id
    pub iat: usize,  // issued at (unix timestamp)
    pub exp: usize,  // expires at (unix timestamp)
    pub iss: String, // issuer
    pub aud: String, // audience
}

/// Signing and verification keys for session cookies.
#[derive(Clone)]
pub struct SessionKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub ttl_secs: i64,
    pub cookie_secure: bool,
}

impl FromRef<AppState> for SessionKeys {
    fn from_ref(state: &AppState) -> Self {
        SessionKeys::from_config(&state.config.session)
    }
}

impl SessionKeys {
    pub fn from_config(cfg: &SessionConfig) -> Self {
        let SessionConfig {
            secret,
            issuer,
            audience,
            ttl_secs,
            cookie_secure,
        } = cfg.clone();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            audience,
            ttl_secs,
            cookie_secure,
        }
    }

    pub fn sign(&self, sid: Uuid, user_id: i64, issued_at: i64, expires_at: i64) -> anyhow::Result<String> {
        let claims = SessionClaims {
            sid,
            sub: user_id,
            iat: issued_at as usize,
            exp: expires_at as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id, %sid, "session cookie signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<SessionClaims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<SessionClaims>(token, &self.decoding, &validation)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn keys(secret: &str, issuer: &str, audience: &str) -> SessionKeys {
        SessionKeys::from_config(&SessionConfig {
            secret: secret.into(),
            issuer: issuer.into(),
            audience: audience.into(),
            ttl_secs: 60,
            cookie_secure: false,
        })
    }

    fn now() -> i64 {
        OffsetDateTime::now_utc().unix_timestamp()
    }

    #[test]
    fn sign_and_verify() {
        let keys = keys("dev-secret", "iss", "aud");
        let sid = Uuid::new_v4();
        let token = keys.sign(sid, 7, now(), now() + 60).expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.sid, sid);
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.iss, "iss");
        assert_eq!(claims.aud, "aud");
    }

    #[test]
    fn verify_rejects_other_secret() {
        let token = keys("one", "iss", "aud")
            .sign(Uuid::new_v4(), 1, now(), now() + 60)
            .unwrap();
        assert!(keys("two", "iss", "aud").verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_wrong_issuer_or_audience() {
        let token = keys("same", "good-iss", "good-aud")
            .sign(Uuid::new_v4(), 1, now(), now() + 60)
            .unwrap();
        assert!(keys("same", "bad-iss", "good-aud").verify(&token).is_err());
        assert!(keys("same", "good-iss", "bad-aud").verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_expired_token() {
        let keys = keys("s", "iss", "aud");
        // well past the default validation leeway
        let token = keys
            .sign(Uuid::new_v4(), 1, now() - 3_600, now() - 1_800)
            .unwrap();
        assert!(keys.verify(&token).is_err());
    }
}
