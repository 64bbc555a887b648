//! Configuration management for Lambda functions.

use std::env;
use std::time::Duration;

use crate::{Error, Result};

const DEFAULT_DATAFORSEO_BASE_URL: &str = "https://api.dataforseo.com";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Firebase project that issues ID tokens and owns the Firestore database
    pub firebase_project_id: String,
    /// Service account JSON used to mint Firestore access tokens
    pub firebase_service_account: Option<String>,
    /// `host:port` of a local Firestore emulator
    pub firestore_emulator_host: Option<String>,
    pub dataforseo_login: Option<String>,
    pub dataforseo_password: Option<String>,
    pub dataforseo_base_url: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,
    /// Timeout applied to every upstream HTTP call
    pub upstream_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let firebase_project_id = env::var("FIREBASE_PROJECT_ID")
            .map_err(|_| Error::Config("FIREBASE_PROJECT_ID not set".to_string()))?;

        let upstream_timeout_secs = match non_empty("UPSTREAM_TIMEOUT_SECS") {
            Some(raw) => raw.parse().map_err(|e| {
                Error::Config(format!("UPSTREAM_TIMEOUT_SECS is not a number: {}", e))
            })?,
            None => DEFAULT_UPSTREAM_TIMEOUT_SECS,
        };

        Ok(Self {
            firebase_project_id,
            firebase_service_account: non_empty("FIREBASE_SERVICE_ACCOUNT"),
            firestore_emulator_host: non_empty("FIRESTORE_EMULATOR_HOST"),
            dataforseo_login: non_empty("DATAFORSEO_LOGIN"),
            dataforseo_password: non_empty("DATAFORSEO_PASSWORD"),
            dataforseo_base_url: non_empty("DATAFORSEO_BASE_URL")
                .unwrap_or_else(|| DEFAULT_DATAFORSEO_BASE_URL.to_string()),
            openai_api_key: non_empty("OPENAI_API_KEY"),
            openai_model: non_empty("OPENAI_MODEL")
                .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            openai_base_url: non_empty("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            upstream_timeout_secs,
        })
    }

    /// Configuration with only the project id set, used by tests and local tooling.
    pub fn for_project(project_id: impl Into<String>) -> Self {
        Self {
            firebase_project_id: project_id.into(),
            firebase_service_account: None,
            firestore_emulator_host: None,
            dataforseo_login: None,
            dataforseo_password: None,
            dataforseo_base_url: DEFAULT_DATAFORSEO_BASE_URL.to_string(),
            openai_api_key: None,
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            upstream_timeout_secs: DEFAULT_UPSTREAM_TIMEOUT_SECS,
        }
    }

    /// DataForSEO login and password, or a targeted error naming what is missing.
    pub fn dataforseo_credentials(&self) -> Result<(&str, &str)> {
        match (&self.dataforseo_login, &self.dataforseo_password) {
            (Some(login), Some(password)) => Ok((login, password)),
            _ => Err(Error::MissingCredentials(
                "DATAFORSEO_LOGIN / DATAFORSEO_PASSWORD",
            )),
        }
    }

    pub fn openai_api_key(&self) -> Result<&str> {
        self.openai_api_key
            .as_deref()
            .ok_or(Error::MissingCredentials("OPENAI_API_KEY"))
    }

    /// HTTP client shared by every upstream call of one Lambda instance.
    pub fn upstream_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(self.upstream_timeout_secs))
            .user_agent(concat!("vyndow/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))
    }
}

fn non_empty(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
