//! GEO audit runs API.
//!
//! Endpoints:
//! - POST /websites/{id}/geo/runs - Queue a run for a list of URLs
//! - GET /websites/{id}/geo/runs - List runs, newest first
//! - GET /websites/{id}/geo/runs/{runId} - Run with its pages

use chrono::Utc;
use lambda_http::http::Method;
use lambda_http::{Body, Request, Response};
use tracing::info;

use shared::geo::{self, CreateRunRequest};
use shared::http::{ok, parse_json_body, require_method, route_segments};
use shared::websites::require_website;
use shared::{authenticate, DocumentStore, Error, Result, TokenVerifier};

use crate::AppContext;

pub async fn handle<S: DocumentStore, V: TokenVerifier>(
    ctx: &AppContext<S, V>,
    event: Request,
) -> Result<Response<Body>> {
    info!(method = %event.method(), path = %event.uri().path(), "Received request");

    match route_segments(&event).as_slice() {
        ["websites", website_id, "geo", "runs"] => {
            require_method(&event, &[Method::GET, Method::POST])?;
            let user = authenticate(&event, &ctx.verifier).await?;
            require_website(&ctx.store, &user.uid, website_id).await?;

            if *event.method() == Method::POST {
                let request: CreateRunRequest = parse_json_body(event.body())?;
                ok(200, geo::create_run(&ctx.store, &user.uid, website_id, request, Utc::now()).await?)
            } else {
                ok(200, geo::list_runs(&ctx.store, &user.uid, website_id).await?)
            }
        }
        ["websites", website_id, "geo", "runs", run_id] => {
            require_method(&event, &[Method::GET])?;
            let user = authenticate(&event, &ctx.verifier).await?;
            require_website(&ctx.store, &user.uid, website_id).await?;

            ok(200, geo::get_run(&ctx.store, &user.uid, website_id, run_id).await?)
        }
        _ => Err(Error::NotFound(format!("Route {}", event.uri().path()))),
    }
}
