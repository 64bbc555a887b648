//! Request handlers for the Vyndow API Lambdas.
//!
//! Each binary under `src/bin` serves one route family and delegates to the
//! matching module here. Handlers check, in order: route and method (404/405),
//! bearer token (401), request validation and phase gates (400), vendor
//! credentials, then call upstream.

pub mod geo;
pub mod seo;
pub mod social;
pub mod websites;

use anyhow::Context;
use shared::{Config, FirebaseVerifier, FirestoreStore};

/// Everything a handler needs, built once per Lambda instance.
pub struct AppContext<S, V> {
    pub config: Config,
    pub store: S,
    pub verifier: V,
    /// Client for upstream vendor APIs
    pub http: reqwest::Client,
}

impl<S, V> AppContext<S, V> {
    pub fn new(config: Config, store: S, verifier: V, http: reqwest::Client) -> Self {
        Self {
            config,
            store,
            verifier,
            http,
        }
    }
}

impl AppContext<FirestoreStore, FirebaseVerifier> {
    /// Production wiring: Firestore for storage, Firebase for ID tokens.
    pub fn from_env() -> anyhow::Result<Self> {
        let config = Config::from_env().context("Failed to load configuration")?;
        let http = config.upstream_client()?;
        let store = FirestoreStore::from_config(http.clone(), &config)
            .context("Failed to set up Firestore")?;
        let verifier = FirebaseVerifier::new(http.clone(), config.firebase_project_id.clone());

        Ok(Self::new(config, store, verifier, http))
    }
}

/// Install the JSON log subscriber, filtered by `RUST_LOG`.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .json()
        .init();
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;

    use lambda_http::{http, Body, Request, RequestExt, Response};
    use serde_json::Value;
    use shared::{Config, MemoryStore, StaticTokenVerifier};

    use super::AppContext;

    pub const TOKEN: &str = "token-u1";

    pub fn context(config: Config) -> AppContext<MemoryStore, StaticTokenVerifier> {
        AppContext::new(
            config,
            MemoryStore::new(),
            StaticTokenVerifier::new().with_user(TOKEN, "u1"),
            reqwest::Client::new(),
        )
    }

    pub fn request(method: &str, uri: &str, body: Option<Value>) -> Request {
        http::Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", format!("Bearer {}", TOKEN))
            .body(body.map(|b| Body::from(b.to_string())).unwrap_or(Body::Empty))
            .unwrap()
    }

    pub fn anonymous(method: &str, uri: &str) -> Request {
        http::Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::Empty)
            .unwrap()
    }

    /// Attach query string parameters the way API Gateway delivers them.
    pub fn with_query(event: Request, params: &[(&str, &str)]) -> Request {
        let params: HashMap<String, String> = params
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        event.with_query_string_parameters(params)
    }

    /// Status and parsed envelope of a handler result, rendered the way the
    /// Lambda would return it.
    pub fn render(result: shared::Result<Response<Body>>) -> (u16, Value) {
        let response = shared::http::respond(result).unwrap();
        let status = response.status().as_u16();
        let body: Value = serde_json::from_slice(response.body().as_ref()).unwrap();
        (status, body)
    }
}
