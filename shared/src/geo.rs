//! GEO audit runs.
//!
//! A run is a batch of page URLs queued for auditing. Creating a run writes
//! the run document and one page document per URL; the audit itself happens
//! elsewhere and updates the statuses.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::store::{get_as, paths, DocumentStore};
use crate::{Error, Result};

pub const MAX_URLS_PER_RUN: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

/// Run document at `.../geoRuns/{runId}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoRun {
    pub status: RunStatus,
    pub page_count: usize,
    /// `YYYY-MM` of creation, used for monthly quotas
    pub month: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoPage {
    pub url: String,
    pub status: RunStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub id: String,
    #[serde(flatten)]
    pub run: GeoRun,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSummary {
    pub id: String,
    #[serde(flatten)]
    pub page: GeoPage,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunDetail {
    pub id: String,
    #[serde(flatten)]
    pub run: GeoRun,
    pub pages: Vec<PageSummary>,
}

#[derive(Debug, Deserialize)]
pub struct CreateRunRequest {
    #[serde(default)]
    pub urls: Vec<String>,
}

/// Trim, drop blanks and duplicates (first occurrence wins), and require
/// between 1 and [`MAX_URLS_PER_RUN`] absolute http(s) URLs.
pub fn normalize_urls(raw: &[String]) -> Result<Vec<String>> {
    let mut seen = HashSet::new();
    let mut urls = Vec::new();

    for candidate in raw.iter().map(|u| u.trim()).filter(|u| !u.is_empty()) {
        let url = Url::parse(candidate)
            .map_err(|_| Error::Validation(format!("Invalid URL: {}", candidate)))?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(Error::Validation(format!("URL must be http or https: {}", candidate)));
        }
        let url = url.to_string();
        if seen.insert(url.clone()) {
            urls.push(url);
        }
    }

    if urls.is_empty() {
        return Err(Error::Validation("At least one URL is required".to_string()));
    }
    if urls.len() > MAX_URLS_PER_RUN {
        return Err(Error::Validation(format!(
            "At most {} URLs per run, got {}",
            MAX_URLS_PER_RUN,
            urls.len()
        )));
    }
    Ok(urls)
}

pub async fn create_run<S: DocumentStore>(
    store: &S,
    uid: &str,
    website_id: &str,
    request: CreateRunRequest,
    now: DateTime<Utc>,
) -> Result<RunDetail> {
    let urls = normalize_urls(&request.urls)?;

    let run_id = Uuid::new_v4().to_string();
    let run = GeoRun {
        status: RunStatus::Queued,
        page_count: urls.len(),
        month: now.format("%Y-%m").to_string(),
        created_at: now,
    };
    store
        .set(&paths::geo_run(uid, website_id, &run_id)?, &serde_json::to_value(&run)?)
        .await?;

    let pages_path = paths::geo_pages(uid, website_id, &run_id)?;
    let mut pages = Vec::with_capacity(urls.len());
    for (index, url) in urls.into_iter().enumerate() {
        let page = PageSummary {
            id: format!("{:03}", index + 1),
            page: GeoPage {
                url,
                status: RunStatus::Queued,
            },
        };
        store
            .set(&pages_path.child(&page.id)?, &serde_json::to_value(&page.page)?)
            .await?;
        pages.push(page);
    }

    info!(uid, website_id, run_id = %run_id, pages = run.page_count, "Queued GEO run");
    Ok(RunDetail {
        id: run_id,
        run,
        pages,
    })
}

/// Runs for a website, newest first.
pub async fn list_runs<S: DocumentStore>(store: &S, uid: &str, website_id: &str) -> Result<Vec<RunSummary>> {
    let mut runs = store
        .list(&paths::geo_runs(uid, website_id)?)
        .await?
        .into_iter()
        .map(|doc| -> Result<RunSummary> {
            Ok(RunSummary {
                id: doc.id,
                run: serde_json::from_value(doc.data)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    runs.sort_by(|a, b| b.run.created_at.cmp(&a.run.created_at));
    Ok(runs)
}

pub async fn get_run<S: DocumentStore>(store: &S, uid: &str, website_id: &str, run_id: &str) -> Result<RunDetail> {
    let run: GeoRun = get_as(store, &paths::geo_run(uid, website_id, run_id)?)
        .await?
        .ok_or_else(|| Error::NotFound(format!("GEO run {}", run_id)))?;

    let mut pages = store
        .list(&paths::geo_pages(uid, website_id, run_id)?)
        .await?
        .into_iter()
        .map(|doc| -> Result<PageSummary> {
            Ok(PageSummary {
                id: doc.id,
                page: serde_json::from_value(doc.data)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    pages.sort_by(|a, b| a.id.cmp(&b.id));

    Ok(RunDetail {
        id: run_id.to_string(),
        run,
        pages,
    })
}
