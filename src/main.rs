//! SellerHub - seller backend for a multi-vendor marketplace.

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sellerhub::api;
use sellerhub::state::AppState;
use sellerhub::store::Db;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db = Db::connect(&std::env::var("DATABASE_URL")?, 10).await?;
    sqlx::migrate!("./migrations").run(db.pool()).await?;

    let app = api::router(AppState::new(db));
    let port = std::env::var("PORT").unwrap_or_else(|_| "8084".to_string());
    tracing::info!("sellerhub listening on 0.0.0.0:{}", port);
    axum::serve(
        tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?,
        app,
    )
    .await?;
    Ok(())
}
