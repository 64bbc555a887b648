//! Keyword and location lookups for the SEO module.
//!
//! Thin shaping layer over [`DataForSeoClient`]: validate the query, call the
//! vendor, then filter and trim the result for the UI.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::dataforseo::{DataForSeoClient, KeywordIdea, Location};
use crate::Result;

/// Shortest accepted search query, in characters.
pub const MIN_QUERY_CHARS: usize = 2;
/// Most location matches returned.
pub const MAX_LOCATION_RESULTS: usize = 12;
/// Most keyword ideas returned.
pub const MAX_KEYWORD_RESULTS: usize = 50;

#[derive(Debug, Deserialize, Validate)]
pub struct LocationQuery {
    #[validate(length(min = 2, message = "Query must be at least 2 characters"))]
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationMatch {
    pub code: u32,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub country_iso: Option<String>,
}

impl From<Location> for LocationMatch {
    fn from(location: Location) -> Self {
        Self {
            code: location.location_code,
            name: location.location_name,
            kind: location.location_type,
            country_iso: location.country_iso_code,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct KeywordRequest {
    #[validate(length(min = 2, max = 80, message = "Keyword must be 2 to 80 characters"))]
    pub keyword: String,
    pub location_code: Option<u32>,
    #[validate(length(min = 2, max = 5))]
    pub language_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordRow {
    pub keyword: String,
    pub search_volume: Option<u64>,
    pub competition: Option<String>,
    pub cpc: Option<f64>,
}

impl From<KeywordIdea> for KeywordRow {
    fn from(idea: KeywordIdea) -> Self {
        Self {
            keyword: idea.keyword,
            search_volume: idea.search_volume,
            competition: idea.competition,
            cpc: idea.cpc,
        }
    }
}

/// Trim `raw` and reject it when shorter than [`MIN_QUERY_CHARS`].
pub fn validate_query(raw: Option<&str>) -> Result<String> {
    let query = LocationQuery {
        query: raw.unwrap_or_default().trim().to_string(),
    };
    query.validate()?;
    Ok(query.query)
}

/// Case-insensitive substring match on the location name, capped at
/// [`MAX_LOCATION_RESULTS`] in upstream order.
pub fn filter_locations(locations: Vec<Location>, query: &str) -> Vec<LocationMatch> {
    let needle = query.to_lowercase();
    locations
        .into_iter()
        .filter(|l| l.location_name.to_lowercase().contains(&needle))
        .take(MAX_LOCATION_RESULTS)
        .map(LocationMatch::from)
        .collect()
}

/// Highest search volume first; ideas without volume last. Capped at
/// [`MAX_KEYWORD_RESULTS`].
pub fn rank_keywords(ideas: Vec<KeywordIdea>) -> Vec<KeywordRow> {
    let mut rows: Vec<KeywordRow> = ideas.into_iter().map(KeywordRow::from).collect();
    rows.sort_by(|a, b| b.search_volume.cmp(&a.search_volume));
    rows.truncate(MAX_KEYWORD_RESULTS);
    rows
}

pub async fn search_locations(client: &DataForSeoClient, raw_query: Option<&str>) -> Result<Vec<LocationMatch>> {
    let query = validate_query(raw_query)?;
    let locations = client.locations().await?;
    Ok(filter_locations(locations, &query))
}

pub async fn keyword_ideas(client: &DataForSeoClient, request: KeywordRequest) -> Result<Vec<KeywordRow>> {
    let request = KeywordRequest {
        keyword: request.keyword.trim().to_string(),
        location_code: request.location_code,
        language_code: request
            .language_code
            .map(|c| c.trim().to_ascii_lowercase())
            .filter(|c| !c.is_empty()),
    };
    request.validate()?;

    let ideas = client
        .keywords_for_keyword(&request.keyword, request.location_code, request.language_code.as_deref())
        .await?;
    Ok(rank_keywords(ideas))
}
