//! Social media workflow API.
//!
//! Endpoints:
//! - GET /websites/{id}/social - Current state of all phases
//! - POST /websites/{id}/social/phase1 - Save brand identity
//! - POST /websites/{id}/social/phase2 - Save themes
//! - GET /websites/{id}/social/phase3/calendar - Stored calendar or a generated draft
//! - PUT /websites/{id}/social/phase3/calendar - Overwrite the calendar
//! - POST /websites/{id}/social/phase3/complete - Mark the calendar done
//! - POST /websites/{id}/social/phase4/generate - Generate post text

use chrono::Utc;
use lambda_http::http::Method;
use lambda_http::{Body, Request, Response};
use serde::Deserialize;
use tracing::info;

use shared::http::{ok, parse_json_body, require_method, route_segments};
use shared::social::{self, BrandIdentity, SaveCalendarRequest, ThemeInput};
use shared::websites::require_website;
use shared::{authenticate, DocumentStore, Error, OpenAiClient, Result, TokenVerifier};

use crate::AppContext;

#[derive(Debug, Deserialize)]
struct ThemesRequest {
    #[serde(default)]
    themes: Vec<ThemeInput>,
}

pub async fn handle<S: DocumentStore, V: TokenVerifier>(
    ctx: &AppContext<S, V>,
    event: Request,
) -> Result<Response<Body>> {
    info!(method = %event.method(), path = %event.uri().path(), "Received request");

    let segments = route_segments(&event);
    let (website_id, rest) = match segments.as_slice() {
        ["websites", website_id, "social", rest @ ..] => (*website_id, rest),
        _ => return Err(Error::NotFound(format!("Route {}", event.uri().path()))),
    };

    let allowed: &[Method] = match rest {
        [] => &[Method::GET],
        ["phase1"] | ["phase2"] | ["phase3", "complete"] | ["phase4", "generate"] => &[Method::POST],
        ["phase3", "calendar"] => &[Method::GET, Method::PUT],
        _ => return Err(Error::NotFound(format!("Route {}", event.uri().path()))),
    };
    require_method(&event, allowed)?;

    let user = authenticate(&event, &ctx.verifier).await?;
    let uid = user.uid.as_str();
    require_website(&ctx.store, uid, website_id).await?;
    let now = Utc::now();

    match (event.method(), rest) {
        (&Method::GET, []) => ok(200, social::load_state(&ctx.store, uid, website_id).await?),
        (_, ["phase1"]) => {
            let identity: BrandIdentity = parse_json_body(event.body())?;
            ok(200, social::save_brand_identity(&ctx.store, uid, website_id, identity, now).await?)
        }
        (_, ["phase2"]) => {
            let request: ThemesRequest = parse_json_body(event.body())?;
            ok(200, social::save_themes(&ctx.store, uid, website_id, request.themes, now).await?)
        }
        (&Method::GET, ["phase3", "calendar"]) => {
            ok(200, social::calendar_draft(&ctx.store, uid, website_id, now.date_naive()).await?)
        }
        (_, ["phase3", "calendar"]) => {
            let request: SaveCalendarRequest = parse_json_body(event.body())?;
            ok(200, social::save_calendar(&ctx.store, uid, website_id, request, now).await?)
        }
        (_, ["phase3", "complete"]) => ok(200, social::complete_calendar(&ctx.store, uid, website_id, now).await?),
        (_, ["phase4", "generate"]) => {
            // Gates before credentials.
            let state = social::load_state(&ctx.store, uid, website_id).await?;
            state.completed_phase3()?;

            let openai = OpenAiClient::from_config(ctx.http.clone(), &ctx.config)?;
            ok(200, social::generate_posts(&ctx.store, &openai, uid, website_id, now).await?)
        }
        _ => Err(Error::NotFound(format!("Route {}", event.uri().path()))),
    }
}
