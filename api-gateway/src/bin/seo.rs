//! SEO Lambda - Keyword and location lookups via DataForSEO.

use std::sync::Arc;

use api_gateway::{init_tracing, seo, AppContext};
use lambda_http::{run, service_fn, Error};
use shared::http::respond;

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let ctx = Arc::new(AppContext::from_env()?);

    run(service_fn(move |event| {
        let ctx = Arc::clone(&ctx);
        async move { respond(seo::handle(ctx.as_ref(), event).await) }
    }))
    .await
}
