//! Websites API.
//!
//! Endpoints:
//! - GET /websites - List the caller's websites
//! - POST /websites - Create a website
//! - GET /websites/{id} - Get one website

use chrono::Utc;
use lambda_http::http::Method;
use lambda_http::{Body, Request, Response};
use tracing::info;

use shared::http::{ok, parse_json_body, require_method, route_segments};
use shared::websites::{create_website, list_websites, require_website, CreateWebsiteRequest, WebsiteSummary};
use shared::{authenticate, DocumentStore, Error, Result, TokenVerifier};

use crate::AppContext;

pub async fn handle<S: DocumentStore, V: TokenVerifier>(
    ctx: &AppContext<S, V>,
    event: Request,
) -> Result<Response<Body>> {
    info!(method = %event.method(), path = %event.uri().path(), "Received request");

    match route_segments(&event).as_slice() {
        ["websites"] => {
            require_method(&event, &[Method::GET, Method::POST])?;
            let user = authenticate(&event, &ctx.verifier).await?;

            if *event.method() == Method::POST {
                let request: CreateWebsiteRequest = parse_json_body(event.body())?;
                ok(200, create_website(&ctx.store, &user.uid, request, Utc::now()).await?)
            } else {
                ok(200, list_websites(&ctx.store, &user.uid).await?)
            }
        }
        ["websites", website_id] => {
            require_method(&event, &[Method::GET])?;
            let user = authenticate(&event, &ctx.verifier).await?;

            let website = require_website(&ctx.store, &user.uid, website_id).await?;
            ok(
                200,
                WebsiteSummary {
                    id: website_id.to_string(),
                    website,
                },
            )
        }
        _ => Err(Error::NotFound(format!("Route {}", event.uri().path()))),
    }
}
