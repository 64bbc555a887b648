//! Websites: the tenant unit every other resource hangs off.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::store::{get_as, paths, DocumentStore};
use crate::{Error, Result};

/// Website document at `users/{uid}/websites/{websiteId}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Website {
    pub name: String,
    pub domain: String,
    pub created_at: DateTime<Utc>,
}

/// Website with its document id, as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebsiteSummary {
    pub id: String,
    #[serde(flatten)]
    pub website: Website,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateWebsiteRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(length(min = 3, max = 253))]
    pub domain: String,
}

/// Reduce user input like `https://www.Acme.com/about` to `acme.com`.
pub fn normalize_domain(raw: &str) -> Result<String> {
    let lower = raw.trim().to_ascii_lowercase();
    let without_scheme = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))
        .unwrap_or(&lower);
    let host = without_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default()
        .trim_end_matches('.');
    let host = host.strip_prefix("www.").unwrap_or(host);

    let valid = host.contains('.')
        && !host.starts_with('.')
        && !host.contains("..")
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.');

    if !valid {
        return Err(Error::Validation(format!("Invalid domain: {}", raw.trim())));
    }
    Ok(host.to_string())
}

pub async fn create_website<S: DocumentStore>(
    store: &S,
    uid: &str,
    request: CreateWebsiteRequest,
    now: DateTime<Utc>,
) -> Result<WebsiteSummary> {
    let request = CreateWebsiteRequest {
        name: request.name.trim().to_string(),
        domain: request.domain.trim().to_string(),
    };
    request.validate()?;

    let website = Website {
        name: request.name,
        domain: normalize_domain(&request.domain)?,
        created_at: now,
    };

    let id = Uuid::new_v4().to_string();
    store
        .set(&paths::website(uid, &id)?, &serde_json::to_value(&website)?)
        .await?;

    info!(uid, website_id = %id, domain = %website.domain, "Created website");
    Ok(WebsiteSummary { id, website })
}

/// The user's websites, oldest first.
pub async fn list_websites<S: DocumentStore>(store: &S, uid: &str) -> Result<Vec<WebsiteSummary>> {
    let mut websites = store
        .list(&paths::websites(uid)?)
        .await?
        .into_iter()
        .map(|doc| -> Result<WebsiteSummary> {
            Ok(WebsiteSummary {
                id: doc.id,
                website: serde_json::from_value(doc.data)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    websites.sort_by(|a, b| a.website.created_at.cmp(&b.website.created_at));
    Ok(websites)
}

/// Load a website the user owns, or 404.
///
/// Every website-scoped operation calls this first.
pub async fn require_website<S: DocumentStore>(store: &S, uid: &str, website_id: &str) -> Result<Website> {
    get_as(store, &paths::website(uid, website_id)?)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Website {}", website_id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_normalize_domain() {
        assert_eq!(normalize_domain("https://www.Acme.com/about").unwrap(), "acme.com");
        assert_eq!(normalize_domain(" shop.acme.co.uk. ").unwrap(), "shop.acme.co.uk");
        assert_eq!(normalize_domain("http://acme.io?ref=1").unwrap(), "acme.io");

        for bad in ["localhost", "acme..com", "acme com.io", ".acme.com"] {
            assert!(normalize_domain(bad).is_err(), "{}", bad);
        }
    }

    #[tokio::test]
    async fn test_create_then_list_sorted() {
        let store = MemoryStore::new();
        let later = create_website(
            &store,
            "u1",
            CreateWebsiteRequest { name: "Later".into(), domain: "later.com".into() },
            at(12),
        )
        .await
        .unwrap();
        let earlier = create_website(
            &store,
            "u1",
            CreateWebsiteRequest { name: " Earlier ".into(), domain: "www.earlier.com".into() },
            at(8),
        )
        .await
        .unwrap();

        let websites = list_websites(&store, "u1").await.unwrap();
        assert_eq!(websites, vec![earlier.clone(), later]);
        assert_eq!(earlier.website.name, "Earlier");
        assert_eq!(earlier.website.domain, "earlier.com");

        assert!(list_websites(&store, "u2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_rejects_blank_name() {
        let store = MemoryStore::new();
        let err = create_website(
            &store,
            "u1",
            CreateWebsiteRequest { name: "   ".into(), domain: "acme.com".into() },
            at(1),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_require_website_is_scoped_to_owner() {
        let store = MemoryStore::new();
        let created = create_website(
            &store,
            "u1",
            CreateWebsiteRequest { name: "Acme".into(), domain: "acme.com".into() },
            at(1),
        )
        .await
        .unwrap();

        assert!(require_website(&store, "u1", &created.id).await.is_ok());
        let err = require_website(&store, "u2", &created.id).await.unwrap_err();
        assert_eq!(err.status_code(), 404);
    }
}
