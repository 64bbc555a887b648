//! DataForSEO REST client.
//!
//! DataForSEO wraps every payload in an envelope with a numeric status code
//! (`20000` means success) at both the request and the task level.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::AUTHORIZATION;
use reqwest::Response;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{Config, Error, Result};

const STATUS_OK: u32 = 20000;
const SERVICE: &str = "DataForSEO";

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status_code: u32,
    #[serde(default)]
    status_message: String,
    #[serde(default = "Vec::new")]
    tasks: Vec<Task<T>>,
}

#[derive(Debug, Deserialize)]
struct Task<T> {
    status_code: u32,
    #[serde(default)]
    status_message: String,
    result: Option<Vec<T>>,
}

/// A Google Ads location as DataForSEO reports it.
#[derive(Debug, Clone, Deserialize)]
pub struct Location {
    pub location_code: u32,
    pub location_name: String,
    pub location_code_parent: Option<u32>,
    pub country_iso_code: Option<String>,
    pub location_type: Option<String>,
}

/// One row of a keyword ideas result.
#[derive(Debug, Clone, Deserialize)]
pub struct KeywordIdea {
    pub keyword: String,
    pub search_volume: Option<u64>,
    pub competition: Option<String>,
    pub cpc: Option<f64>,
}

#[derive(Debug, Serialize)]
struct KeywordsTask<'a> {
    keywords: [&'a str; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    location_code: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    language_code: Option<&'a str>,
}

/// `Basic base64(login:password)`.
pub fn basic_auth_header(login: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", login, password)))
}

/// Client for the DataForSEO keyword APIs.
pub struct DataForSeoClient {
    http: reqwest::Client,
    base_url: String,
    authorization: String,
}

impl DataForSeoClient {
    pub fn new(http: reqwest::Client, base_url: &str, login: &str, password: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            authorization: basic_auth_header(login, password),
        }
    }

    /// Build from configuration; fails with a targeted error when credentials are absent.
    pub fn from_config(http: reqwest::Client, config: &Config) -> Result<Self> {
        let (login, password) = config.dataforseo_credentials()?;
        Ok(Self::new(http, &config.dataforseo_base_url, login, password))
    }

    /// All Google Ads locations.
    pub async fn locations(&self) -> Result<Vec<Location>> {
        let response = self
            .http
            .get(format!("{}/v3/keywords_data/google_ads/locations", self.base_url))
            .header(AUTHORIZATION, &self.authorization)
            .send()
            .await?;

        let locations = task_result(response).await?;
        info!(count = locations.len(), "Fetched DataForSEO locations");
        Ok(locations)
    }

    /// Keyword ideas related to `keyword`.
    pub async fn keywords_for_keyword(
        &self,
        keyword: &str,
        location_code: Option<u32>,
        language_code: Option<&str>,
    ) -> Result<Vec<KeywordIdea>> {
        let body = [KeywordsTask {
            keywords: [keyword],
            location_code,
            language_code,
        }];

        let response = self
            .http
            .post(format!(
                "{}/v3/keywords_data/google_ads/keywords_for_keywords/live",
                self.base_url
            ))
            .header(AUTHORIZATION, &self.authorization)
            .json(&body)
            .send()
            .await?;

        let ideas = task_result(response).await?;
        info!(count = ideas.len(), "Fetched DataForSEO keyword ideas");
        Ok(ideas)
    }
}

/// Unwrap the first task's result, surfacing vendor status messages as errors.
async fn task_result<T: DeserializeOwned>(response: Response) -> Result<Vec<T>> {
    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        return Err(Error::upstream(SERVICE, format!("HTTP {}: {}", status, error_text)));
    }

    let envelope: Envelope<T> = response.json().await?;
    if envelope.status_code != STATUS_OK {
        return Err(Error::upstream(SERVICE, envelope.status_message));
    }

    let task = envelope
        .tasks
        .into_iter()
        .next()
        .ok_or_else(|| Error::upstream(SERVICE, "response contained no tasks"))?;

    if task.status_code != STATUS_OK {
        return Err(Error::upstream(SERVICE, task.status_message));
    }

    Ok(task.result.unwrap_or_default())
}
