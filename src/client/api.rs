//! The seam between the accumulator and the trait service.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client, StatusCode, Url};
use serde_json::json;

use crate::{
    session::handlers::SessionInfo,
    traits::{dto::TraitsResponse, TraitVector},
};

#[async_trait]
pub trait TraitApi: Send + Sync {
    /// Stores the complete vector, replacing whatever the server had.
    async fn save_traits(&self, traits: &TraitVector) -> Result<()>;
    async fn get_traits(&self) -> Result<TraitVector>;
}

/// HTTP client for the trait service. Keeps the session cookie in its own
/// cookie store, like the browser would.
#[derive(Clone)]
pub struct HttpTraitApi {
    client: Client,
    base_url: Url,
}

impl HttpTraitApi {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .cookie_store(true)
            .redirect(Policy::none())
            .build()
            .context("failed to build HTTP client")?;
        let base_url = Url::parse(base_url).context("invalid base url")?;
        Ok(Self { client, base_url })
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("invalid path {path}"))
    }

    /// `POST /login`
    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        let resp = self
            .client
            .post(self.url("/login")?)
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .context("POST /login failed")?;
        self.follow_auth_redirect(resp)
    }

    /// `POST /register`
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<()> {
        let resp = self
            .client
            .post(self.url("/register")?)
            .form(&[("username", username), ("email", email), ("password", password)])
            .send()
            .await
            .context("POST /register failed")?;
        self.follow_auth_redirect(resp)
    }

    /// The form endpoints answer with a redirect; an `error` query parameter
    /// on it carries the failure message.
    fn follow_auth_redirect(&self, resp: reqwest::Response) -> Result<()> {
        if !resp.status().is_redirection() {
            return Err(anyhow!("unexpected status {}", resp.status()));
        }
        let location = resp
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| anyhow!("redirect without location"))?;
        let target = self.url(location)?;
        if let Some((_, msg)) = target.query_pairs().find(|(k, _)| k == "error") {
            return Err(anyhow!("{msg}"));
        }
        Ok(())
    }

    /// `GET /api/user`. Consumes the welcome flag server-side.
    pub async fn session_info(&self) -> Result<SessionInfo> {
        let resp = self
            .client
            .get(self.url("/api/user")?)
            .send()
            .await
            .context("GET /api/user failed")?;
        if !resp.status().is_success() {
            return Err(anyhow!("GET /api/user → {}", resp.status()));
        }
        resp.json().await.context("deserialising session info")
    }

    /// `POST /api/logout`
    pub async fn logout(&self) -> Result<()> {
        let resp = self
            .client
            .post(self.url("/api/logout")?)
            .send()
            .await
            .context("POST /api/logout failed")?;
        if !resp.status().is_success() {
            return Err(anyhow!("POST /api/logout → {}", resp.status()));
        }
        Ok(())
    }
}

#[async_trait]
impl TraitApi for HttpTraitApi {
    /// `POST /api/traits/save`
    async fn save_traits(&self, traits: &TraitVector) -> Result<()> {
        let resp = self
            .client
            .post(self.url("/api/traits/save")?)
            .json(&json!({ "traits": traits }))
            .send()
            .await
            .context("POST /api/traits/save failed")?;
        match resp.status() {
            s if s.is_success() => Ok(()),
            StatusCode::UNAUTHORIZED => Err(anyhow!("not logged in")),
            s => Err(anyhow!("POST /api/traits/save → {s}")),
        }
    }

    /// `GET /api/traits/get`
    async fn get_traits(&self) -> Result<TraitVector> {
        let resp = self
            .client
            .get(self.url("/api/traits/get")?)
            .send()
            .await
            .context("GET /api/traits/get failed")?;
        if !resp.status().is_success() {
            return Err(anyhow!("GET /api/traits/get → {}", resp.status()));
        }
        let body: TraitsResponse = resp.json().await.context("deserialising traits")?;
        Ok(body.traits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{app::build_app, state::AppState, traits::TraitDelta};

    /// Real server on an ephemeral port, driven through the HTTP client.
    async fn spawn_server() -> String {
        let state = AppState::fake().await.unwrap();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, build_app(state)).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn register_save_and_read_back() {
        let base = spawn_server().await;
        let api = HttpTraitApi::new(&base).unwrap();

        api.register("ana", "ana@example.com", "secret1").await.unwrap();
        let info = api.session_info().await.unwrap();
        assert_eq!(info.user.username, "ana");
        assert!(info.show_welcome);
        assert!(!api.session_info().await.unwrap().show_welcome);

        assert_eq!(api.get_traits().await.unwrap(), TraitVector::ZERO);
        let v = TraitVector::from(TraitDelta {
            empathy: Some(3),
            dishonesty: Some(1),
            ..Default::default()
        });
        api.save_traits(&v).await.unwrap();
        assert_eq!(api.get_traits().await.unwrap(), v);

        api.logout().await.unwrap();
        assert!(api.get_traits().await.is_err());
    }

    #[tokio::test]
    async fn login_error_message_is_surfaced() {
        let base = spawn_server().await;
        let api = HttpTraitApi::new(&base).unwrap();
        let err = api.login("ghost", "secret1").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid username or password.");
    }
}
