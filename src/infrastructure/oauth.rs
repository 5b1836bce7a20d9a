//! Google OAuth 2.0 authorization-code client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;
use url::Url;

use crate::error::AppError;

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// Identity returned by the provider after a successful code exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthIdentity {
    pub email: String,
    pub subject: String,
}

/// External identity provider used by the sign-in flow.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Consent page URL carrying the anti-forgery `state`.
    fn authorize_url(&self, state: &str) -> String;

    /// Exchanges an authorization code for the user's verified identity.
    async fn exchange_code(&self, code: &str) -> Result<OAuthIdentity, AppError>;
}

#[derive(Debug, Clone)]
pub struct GoogleOAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
}

pub struct GoogleOAuth {
    client: Client,
    config: GoogleOAuthConfig,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct UserInfo {
    sub: String,
    email: Option<String>,
    #[serde(default)]
    email_verified: bool,
}

impl GoogleOAuth {
    pub fn new(config: GoogleOAuthConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| {
                AppError::internal(
                    "Failed to build HTTP client",
                    json!({ "reason": e.to_string() }),
                )
            })?;

        Ok(Self { client, config })
    }
}

fn provider_error(step: &str, error: impl std::fmt::Display) -> AppError {
    warn!(step, error = %error, "Google OAuth request failed");
    AppError::unauthorized("OAuth sign-in failed", json!({ "step": step }))
}

#[async_trait]
impl IdentityProvider for GoogleOAuth {
    fn authorize_url(&self, state: &str) -> String {
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("redirect_uri", self.config.redirect_url.as_str()),
            ("response_type", "code"),
            ("scope", "openid email profile"),
            ("state", state),
            ("prompt", "select_account"),
        ];

        match Url::parse_with_params(AUTHORIZE_URL, &params) {
            Ok(url) => url.into(),
            Err(_) => AUTHORIZE_URL.to_string(),
        }
    }

    async fn exchange_code(&self, code: &str) -> Result<OAuthIdentity, AppError> {
        let form = [
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.config.redirect_url.as_str()),
            ("grant_type", "authorization_code"),
        ];

        let token: TokenResponse = self
            .client
            .post(TOKEN_URL)
            .form(&form)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| provider_error("token", e))?
            .json()
            .await
            .map_err(|e| provider_error("token", e))?;

        let info: UserInfo = self
            .client
            .get(USERINFO_URL)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| provider_error("userinfo", e))?
            .json()
            .await
            .map_err(|e| provider_error("userinfo", e))?;

        match info.email {
            Some(email) if info.email_verified => Ok(OAuthIdentity {
                email: email.to_lowercase(),
                subject: info.sub,
            }),
            _ => Err(AppError::unauthorized(
                "Google account has no verified email",
                json!({}),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorize_url_carries_state_and_redirect() {
        let google = GoogleOAuth::new(GoogleOAuthConfig {
            client_id: "client-123".to_string(),
            client_secret: "secret".to_string(),
            redirect_url: "http://localhost:3000/api/auth/google/callback".to_string(),
        })
        .unwrap();

        let url = Url::parse(&google.authorize_url("abc")).unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        assert_eq!(url.host_str(), Some("accounts.google.com"));
        assert!(pairs.contains(&("state".to_string(), "abc".to_string())));
        assert!(pairs.contains(&("client_id".to_string(), "client-123".to_string())));
        assert!(pairs.contains(&(
            "redirect_uri".to_string(),
            "http://localhost:3000/api/auth/google/callback".to_string()
        )));
    }
}
