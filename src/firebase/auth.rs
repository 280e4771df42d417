//! Firebase ID-token verification.
//!
//! Tokens are RS256 JWTs signed by Google's `securetoken` service account. The signing keys are
//! fetched as a JWK set and kept for an hour. An unknown `kid` triggers a refresh only when the
//! cached set is at least a minute old, so unrecognised tokens cannot drive key fetches.

use crate::firebase::token::unix_now;
use async_trait::async_trait;
use jsonwebtoken::jwk::{Jwk, JwkSet};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::RwLock;

const KEY_CACHE_TTL_SECS: i64 = 3600;
const MIN_REFRESH_INTERVAL_SECS: i64 = 60;

/// Errors raised while verifying a caller's identity token.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No token was supplied.
    #[error("Missing identity token")]
    MissingToken,
    /// Token failed signature, audience, issuer, or expiry checks.
    #[error("Invalid identity token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
    /// Token header does not name a signing key.
    #[error("Invalid identity token: missing key id")]
    MissingKeyId,
    /// Token names a key absent from the published key set.
    #[error("Invalid identity token: unknown key id {0}")]
    UnknownKey(String),
    /// Token carries no subject.
    #[error("Invalid identity token: empty subject")]
    EmptySubject,
    /// HTTP layer failed while fetching signing keys.
    #[error("Signing key request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Key endpoint responded with a non-success status.
    #[error("Signing key endpoint error ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the key endpoint.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
}

/// Identity established from a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedUser {
    /// Stable user identifier (`sub` claim).
    pub uid: String,
}

/// Verifies caller identity tokens.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verify `token` and return the user it belongs to.
    async fn verify(&self, token: &str) -> Result<VerifiedUser, AuthError>;
}

#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    sub: String,
}

struct CachedKeys {
    keys: JwkSet,
    fetched_at: i64,
}

/// Verifies Firebase ID tokens against Google's published signing keys.
pub struct FirebaseTokenVerifier {
    http: Client,
    jwks_url: String,
    project_id: String,
    keys: RwLock<Option<CachedKeys>>,
}

impl FirebaseTokenVerifier {
    /// Build a verifier for tokens issued to `project_id`.
    pub fn new(jwks_url: &str, project_id: &str) -> Result<Self, AuthError> {
        let http = Client::builder().user_agent("planwright/auth").build()?;
        tracing::debug!(project = project_id, "Initialized identity verifier");
        Ok(Self {
            http,
            jwks_url: jwks_url.to_string(),
            project_id: project_id.to_string(),
            keys: RwLock::new(None),
        })
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[self.project_id.as_str()]);
        validation.set_issuer(&[format!("https://securetoken.google.com/{}", self.project_id)]);
        validation.set_required_spec_claims(&["exp", "aud", "iss", "sub"]);
        validation
    }

    async fn signing_key(&self, kid: &str) -> Result<Jwk, AuthError> {
        match lookup(self.keys.read().await.as_ref(), kid, unix_now()) {
            KeyLookup::Found(jwk) => return Ok(jwk),
            KeyLookup::Unknown => return Err(AuthError::UnknownKey(kid.to_string())),
            KeyLookup::Refresh => {}
        }

        // The write guard is held across the fetch; concurrent callers wait and re-check.
        let mut guard = self.keys.write().await;
        match lookup(guard.as_ref(), kid, unix_now()) {
            KeyLookup::Found(jwk) => return Ok(jwk),
            KeyLookup::Unknown => return Err(AuthError::UnknownKey(kid.to_string())),
            KeyLookup::Refresh => {}
        }

        let keys = self.fetch_keys().await?;
        let jwk = keys.find(kid).cloned();
        *guard = Some(CachedKeys {
            keys,
            fetched_at: unix_now(),
        });
        jwk.ok_or_else(|| AuthError::UnknownKey(kid.to_string()))
    }

    async fn fetch_keys(&self) -> Result<JwkSet, AuthError> {
        let response = self.http.get(&self.jwks_url).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = AuthError::UnexpectedStatus { status, body };
            tracing::error!(error = %error, "Failed to fetch signing keys");
            return Err(error);
        }
        let keys: JwkSet = response.json().await?;
        tracing::debug!(keys = keys.keys.len(), "Refreshed identity signing keys");
        Ok(keys)
    }
}

enum KeyLookup {
    Found(Jwk),
    Unknown,
    Refresh,
}

fn lookup(cached: Option<&CachedKeys>, kid: &str, now: i64) -> KeyLookup {
    let Some(cached) = cached else {
        return KeyLookup::Refresh;
    };
    let age = now - cached.fetched_at;
    if age >= KEY_CACHE_TTL_SECS {
        return KeyLookup::Refresh;
    }
    match cached.keys.find(kid) {
        Some(jwk) => KeyLookup::Found(jwk.clone()),
        None if age < MIN_REFRESH_INTERVAL_SECS => KeyLookup::Unknown,
        None => KeyLookup::Refresh,
    }
}

#[async_trait]
impl IdentityVerifier for FirebaseTokenVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedUser, AuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        let header = decode_header(token)?;
        let kid = header.kid.ok_or(AuthError::MissingKeyId)?;
        let jwk = self.signing_key(&kid).await?;
        let key = DecodingKey::from_jwk(&jwk)?;
        let claims = decode::<IdTokenClaims>(token, &key, &self.validation())?.claims;

        if claims.sub.trim().is_empty() {
            return Err(AuthError::EmptySubject);
        }
        Ok(VerifiedUser { uid: claims.sub })
    }
}
