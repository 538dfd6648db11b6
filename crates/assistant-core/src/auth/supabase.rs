//! Email/password auth against a Supabase (GoTrue) REST endpoint.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use log::{debug, info};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};

use super::{AuthProvider, AuthUser, SignUpResult};
use crate::error::AuthError;

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct UserBody {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Deserialize)]
struct SessionBody {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    user: Option<UserBody>,
    // Sign-up without a session returns the user fields at the top level.
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    msg: Option<String>,
    error_description: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

impl ErrorBody {
    fn reason(self) -> Option<String> {
        [self.msg, self.error_description, self.message, self.error]
            .into_iter()
            .flatten()
            .find(|r| !r.trim().is_empty())
    }
}

#[derive(Clone)]
pub struct SupabaseAuth {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseAuth {
    pub fn new(base_url: &str, anon_key: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build auth HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        })
    }

    async fn post_credentials(
        &self,
        path: &str,
        email: &str,
        password: &str,
    ) -> Result<SessionBody, AuthError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {} (email={})", url, email);

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            .json(&Credentials { email, password })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| AuthError::AuthFailure(format!("unexpected auth response: {}", e)))
    }
}

async fn rejection(response: Response) -> AuthError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let reason = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(ErrorBody::reason)
        .unwrap_or_else(|| format!("authentication failed ({})", status));
    AuthError::AuthFailure(reason)
}

fn into_user(user: UserBody, fallback_email: &str) -> AuthUser {
    AuthUser {
        id: user.id,
        email: user.email.unwrap_or_else(|| fallback_email.to_string()),
    }
}

#[async_trait]
impl AuthProvider for SupabaseAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let body = self
            .post_credentials("/auth/v1/token?grant_type=password", email, password)
            .await?;

        let user = body
            .user
            .ok_or_else(|| AuthError::AuthFailure("Login failed. Check credentials.".to_string()))?;
        info!("signed in (user_id={})", user.id);
        Ok(into_user(user, email))
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpResult, AuthError> {
        let body = self.post_credentials("/auth/v1/signup", email, password).await?;

        let session_issued = body.access_token.is_some();
        let user = match (body.user, body.id) {
            (Some(user), _) => user,
            (None, Some(id)) => UserBody { id, email: body.email },
            (None, None) => {
                return Err(AuthError::AuthFailure(
                    "Signup failed. Email may already be registered.".to_string(),
                ))
            }
        };
        info!("signed up (user_id={}, session_issued={})", user.id, session_issued);

        Ok(SignUpResult {
            user: into_user(user, email),
            session_issued,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_reason_precedence() {
        let body: ErrorBody = serde_json::from_str(
            r#"{"error": "invalid_grant", "error_description": "Invalid login credentials"}"#,
        )
        .unwrap();
        assert_eq!(body.reason().as_deref(), Some("Invalid login credentials"));
    }

    #[test]
    fn test_error_reason_blank_is_none() {
        let body: ErrorBody = serde_json::from_str(r#"{"msg": "  "}"#).unwrap();
        assert_eq!(body.reason(), None);
    }

    #[test]
    fn test_error_reason_skips_blank_fields() {
        let body: ErrorBody = serde_json::from_str(
            r#"{"msg": " ", "error_description": "Invalid login credentials"}"#,
        )
        .unwrap();
        assert_eq!(body.reason().as_deref(), Some("Invalid login credentials"));
    }

    #[test]
    fn test_signup_body_without_session() {
        let body: SessionBody =
            serde_json::from_str(r#"{"id": "u1", "email": "a@b.c", "confirmation_sent_at": "now"}"#).unwrap();
        assert!(body.access_token.is_none());
        assert!(body.user.is_none());
        assert_eq!(body.id.as_deref(), Some("u1"));
    }
}
