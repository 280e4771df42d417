//! OAuth 2.0 access tokens for the service account (JWT-bearer grant).

use crate::config::ServiceAccount;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;

const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Errors raised while obtaining an access token.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Service-account private key could not be parsed or used for signing.
    #[error("Invalid service account key: {0}")]
    InvalidKey(#[from] jsonwebtoken::errors::Error),
    /// HTTP layer failed before receiving a response.
    #[error("Token request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Token endpoint responded with a non-success status.
    #[error("Token endpoint error ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the token endpoint.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    ASSERTION_LIFETIME_SECS
}

struct CachedToken {
    value: String,
    expires_at: i64,
}

/// Exchanges signed service-account assertions for bearer tokens and caches the result.
pub struct AccessTokenProvider {
    http: Client,
    client_email: String,
    token_uri: String,
    signing_key: EncodingKey,
    cached: Mutex<Option<CachedToken>>,
}

impl AccessTokenProvider {
    /// Build a provider for the given service account.
    pub fn new(account: &ServiceAccount) -> Result<Self, TokenError> {
        let signing_key = EncodingKey::from_rsa_pem(account.private_key.as_bytes())?;
        let http = Client::builder().user_agent("planwright/oauth").build()?;
        Ok(Self {
            http,
            client_email: account.client_email.clone(),
            token_uri: account.token_uri.clone(),
            signing_key,
            cached: Mutex::new(None),
        })
    }

    /// Return a valid access token, exchanging a fresh assertion when the cached one expires.
    pub async fn access_token(&self) -> Result<String, TokenError> {
        let mut cached = self.cached.lock().await;
        let now = unix_now();
        if let Some(token) = cached.as_ref()
            && token.expires_at - EXPIRY_MARGIN_SECS > now
        {
            return Ok(token.value.clone());
        }

        let assertion = self.sign_assertion(now)?;
        let response = self
            .http
            .post(&self.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = TokenError::UnexpectedStatus { status, body };
            tracing::error!(error = %error, "Access token exchange failed");
            return Err(error);
        }

        let payload: TokenResponse = response.json().await?;
        tracing::debug!(expires_in = payload.expires_in, "Obtained access token");
        *cached = Some(CachedToken {
            value: payload.access_token.clone(),
            expires_at: now + payload.expires_in,
        });
        Ok(payload.access_token)
    }

    fn sign_assertion(&self, now: i64) -> Result<String, TokenError> {
        let claims = AssertionClaims {
            iss: &self.client_email,
            scope: DATASTORE_SCOPE,
            aud: &self.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };
        Ok(encode(
            &Header::new(Algorithm::RS256),
            &claims,
            &self.signing_key,
        )?)
    }
}

pub(crate) fn unix_now() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}
