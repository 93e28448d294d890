use anyhow::Context;

use tokengate_api::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;
    tokengate_observability::tracing::init(&config.log);
    tracing::debug!(?config, "configuration loaded");

    let services =
        tokengate_api::app::build_services(&config).context("failed to wire services")?;
    let app = tokengate_api::app::build_app(services);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
