//! SEO lookup API, proxying DataForSEO.
//!
//! Endpoints:
//! - GET /seo/locations?q={query} - Locations whose name contains the query
//! - POST /seo/locations - Same, with `{"query": "..."}` as the body
//! - POST /seo/keywords - Keyword ideas for a seed keyword

use lambda_http::http::Method;
use lambda_http::{Body, Request, Response};
use serde::Deserialize;
use tracing::info;

use shared::http::{ok, parse_json_body, query_param, require_method, route_segments};
use shared::seo::{self, KeywordRequest};
use shared::{authenticate, DataForSeoClient, DocumentStore, Error, Result, TokenVerifier};

use crate::AppContext;

#[derive(Debug, Deserialize)]
struct LocationsBody {
    query: Option<String>,
}

pub async fn handle<S: DocumentStore, V: TokenVerifier>(
    ctx: &AppContext<S, V>,
    event: Request,
) -> Result<Response<Body>> {
    info!(method = %event.method(), path = %event.uri().path(), "Received request");

    match route_segments(&event).as_slice() {
        ["seo", "locations"] => {
            require_method(&event, &[Method::GET, Method::POST])?;
            authenticate(&event, &ctx.verifier).await?;

            let raw_query = if *event.method() == Method::POST {
                parse_json_body::<LocationsBody>(event.body())?.query
            } else {
                query_param(&event, "q")
            };
            let query = seo::validate_query(raw_query.as_deref())?;

            let client = DataForSeoClient::from_config(ctx.http.clone(), &ctx.config)?;
            ok(200, seo::search_locations(&client, Some(&query)).await?)
        }
        ["seo", "keywords"] => {
            require_method(&event, &[Method::POST])?;
            authenticate(&event, &ctx.verifier).await?;

            let request: KeywordRequest = parse_json_body(event.body())?;

            let client = DataForSeoClient::from_config(ctx.http.clone(), &ctx.config)?;
            ok(200, seo::keyword_ideas(&client, request).await?)
        }
        _ => Err(Error::NotFound(format!("Route {}", event.uri().path()))),
    }
}
