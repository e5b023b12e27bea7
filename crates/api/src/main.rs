use std::sync::Arc;

use anyhow::Context;

use catalog_api::app::{self, services::AppServices};
use catalog_infra::CatalogConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CatalogConfig::load().context("loading configuration")?;

    catalog_observability::init_with_format(config.log.format);

    let services = AppServices::from_config(&config.database)
        .await
        .context("wiring product store")?;
    let app = app::router(Arc::new(services));

    let (host, port) = config.bind_address();
    let listener = tokio::net::TcpListener::bind((host, port))
        .await
        .with_context(|| format!("failed to bind {host}:{port}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
