use anyhow::{Context, Result};
use serde::Deserialize;

use crate::models::{
    LoginRequest, LoginResponse, MessageResponse, QueryResponse, SignupRequest, UserProfile,
};

/// Outcome of a login attempt the server answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    LoggedIn(UserProfile),
    Rejected(String),
}

/// Typed client for the chat backend's JSON endpoints.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Returns the server's message whether or not the signup was accepted.
    pub async fn signup(&self, req: &SignupRequest) -> Result<(bool, String)> {
        let resp = self
            .http
            .post(self.url("signup"))
            .json(req)
            .send()
            .await
            .context("Failed to reach signup endpoint")?;

        let ok = resp.status().is_success();
        let body: MessageResponse = resp
            .json()
            .await
            .context("Failed to parse signup response")?;
        Ok((ok, body.message))
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome> {
        let req = LoginRequest {
            email: Some(email.to_string()),
            password: Some(password.to_string()),
        };
        let resp = self
            .http
            .post(self.url("login"))
            .json(&req)
            .send()
            .await
            .context("Failed to reach login endpoint")?;

        if resp.status().is_success() {
            let body: LoginResponse = resp
                .json()
                .await
                .context("Failed to parse login response")?;
            Ok(LoginOutcome::LoggedIn(body.user))
        } else {
            let body: Rejection = resp.json().await.unwrap_or_default();
            Ok(LoginOutcome::Rejected(body.message.unwrap_or_default()))
        }
    }

    pub async fn query(&self, query: &str) -> Result<QueryResponse> {
        let resp = self
            .http
            .post(self.url("search"))
            .json(&serde_json::json!({ "query": query }))
            .send()
            .await
            .context("Failed to reach search endpoint")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Search endpoint returned {status}: {body}");
        }

        resp.json()
            .await
            .context("Failed to parse search response")
    }
}

#[derive(Default, Deserialize)]
struct Rejection {
    message: Option<String>,
}
