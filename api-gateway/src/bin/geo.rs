//! GEO Lambda - Queue and inspect GEO audit runs.

use std::sync::Arc;

use api_gateway::{init_tracing, geo, AppContext};
use lambda_http::{run, service_fn, Error};
use shared::http::respond;

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let ctx = Arc::new(AppContext::from_env()?);

    run(service_fn(move |event| {
        let ctx = Arc::clone(&ctx);
        async move { respond(geo::handle(ctx.as_ref(), event).await) }
    }))
    .await
}
