//! Bearer token authentication against Firebase Auth.

use std::collections::HashMap;
use std::future::Future;
use std::time::{Duration, Instant};

use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use lambda_http::Request;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::http::bearer_token;
use crate::{Error, Result};

const FIREBASE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";
const KEY_TTL: Duration = Duration::from_secs(3600);
/// Unknown key ids do not trigger another fetch within this window.
const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(300);

/// JWT claims from a Firebase ID token.
#[derive(Debug, Serialize, Deserialize)]
pub struct FirebaseClaims {
    /// Subject (Firebase uid)
    pub sub: String,
    /// Email
    pub email: Option<String>,
    /// Audience (project id)
    pub aud: String,
    /// Issuer
    pub iss: String,
    /// Issued at
    pub iat: i64,
    /// Expiration
    pub exp: i64,
}

/// Decoded user information from a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// Firebase uid; owns everything under `users/{uid}`
    pub uid: String,
    pub email: Option<String>,
}

impl TryFrom<FirebaseClaims> for AuthenticatedUser {
    type Error = Error;

    fn try_from(claims: FirebaseClaims) -> Result<Self> {
        if claims.sub.trim().is_empty() {
            return Err(Error::Unauthorized("Token has an empty subject".to_string()));
        }

        Ok(Self {
            uid: claims.sub,
            email: claims.email,
        })
    }
}

/// Verifies bearer tokens with an identity provider.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> impl Future<Output = Result<AuthenticatedUser>> + Send;
}

struct CachedKeys {
    set: JwkSet,
    fetched_at: Instant,
}

/// Verifies Firebase ID tokens against Google's published signing keys.
pub struct FirebaseVerifier {
    http: reqwest::Client,
    project_id: String,
    jwks_url: String,
    keys: RwLock<Option<CachedKeys>>,
}

impl FirebaseVerifier {
    pub fn new(http: reqwest::Client, project_id: impl Into<String>) -> Self {
        Self::with_jwks_url(http, project_id, FIREBASE_JWKS_URL)
    }

    /// Point the verifier at a different key endpoint (for testing with wiremock).
    pub fn with_jwks_url(
        http: reqwest::Client,
        project_id: impl Into<String>,
        jwks_url: impl Into<String>,
    ) -> Self {
        Self {
            http,
            project_id: project_id.into(),
            jwks_url: jwks_url.into(),
            keys: RwLock::new(None),
        }
    }

    async fn fetch_keys(&self) -> Result<JwkSet> {
        let response = self.http.get(&self.jwks_url).send().await?;
        if !response.status().is_success() {
            return Err(Error::upstream(
                "Firebase Auth",
                format!("key endpoint returned {}", response.status()),
            ));
        }

        let set: JwkSet = response.json().await?;
        info!(keys = set.keys.len(), "Refreshed Firebase signing keys");
        Ok(set)
    }

    /// Decoding key for `kid`, refreshing the cached key set once when stale or unknown.
    async fn decoding_key(&self, kid: &str) -> Result<DecodingKey> {
        {
            let cache = self.keys.read().await;
            if let Some(cached) = cache.as_ref() {
                let age = cached.fetched_at.elapsed();
                if age < KEY_TTL {
                    if let Some(jwk) = cached.set.find(kid) {
                        return DecodingKey::from_jwk(jwk)
                            .map_err(|e| Error::Unauthorized(format!("Unusable signing key: {}", e)));
                    }
                    if age < MIN_REFRESH_INTERVAL {
                        debug!(kid, "Unknown signing key, keys refreshed recently");
                        return Err(unknown_key());
                    }
                }
            }
        }

        debug!(kid, "Signing key not cached");
        let set = self.fetch_keys().await?;
        let key = set
            .find(kid)
            .map(DecodingKey::from_jwk)
            .transpose()
            .map_err(|e| Error::Unauthorized(format!("Unusable signing key: {}", e)))?;

        {
            let mut cache = self.keys.write().await;
            *cache = Some(CachedKeys {
                set,
                fetched_at: Instant::now(),
            });
        }

        key.ok_or_else(unknown_key)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.project_id]);
        validation.set_issuer(&[format!("https://securetoken.google.com/{}", self.project_id)]);
        validation.set_required_spec_claims(&["exp", "sub", "aud", "iss"]);
        validation
    }
}

impl TokenVerifier for FirebaseVerifier {
    async fn verify(&self, token: &str) -> Result<AuthenticatedUser> {
        let header = decode_header(token)
            .map_err(|e| Error::Unauthorized(format!("Failed to decode token: {}", e)))?;

        if header.alg != Algorithm::RS256 {
            return Err(Error::Unauthorized(format!(
                "Unexpected token algorithm {:?}",
                header.alg
            )));
        }

        let kid = header
            .kid
            .ok_or_else(|| Error::Unauthorized("Token has no key id".to_string()))?;

        let key = self.decoding_key(&kid).await?;
        let token_data = decode::<FirebaseClaims>(token, &key, &self.validation())
            .map_err(|e| Error::Unauthorized(format!("Invalid token: {}", e)))?;

        AuthenticatedUser::try_from(token_data.claims)
    }
}

fn unknown_key() -> Error {
    Error::Unauthorized("Token signed with an unknown key".to_string())
}

/// Fixed token → user table, for local runs and handler tests.
#[derive(Debug, Default, Clone)]
pub struct StaticTokenVerifier {
    users: HashMap<String, AuthenticatedUser>,
}

impl StaticTokenVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, token: impl Into<String>, uid: impl Into<String>) -> Self {
        self.users.insert(
            token.into(),
            AuthenticatedUser {
                uid: uid.into(),
                email: None,
            },
        );
        self
    }
}

impl TokenVerifier for StaticTokenVerifier {
    async fn verify(&self, token: &str) -> Result<AuthenticatedUser> {
        self.users
            .get(token)
            .cloned()
            .ok_or_else(|| Error::Unauthorized("Invalid token".to_string()))
    }
}

/// Extract the bearer token from the request and verify it.
pub async fn authenticate<V: TokenVerifier>(event: &Request, verifier: &V) -> Result<AuthenticatedUser> {
    let token = bearer_token(event)?;
    verifier.verify(token).await
}
