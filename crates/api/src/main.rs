use std::sync::Arc;

use anyhow::Context;

use barista_api::AppConfig;
use barista_auth::{PermissionGate, TokenVerifier};
use barista_infra::{DrinkStore, InMemoryDrinkStore, PgDrinkStore, reset_and_seed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    barista_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;

    let store: Arc<dyn DrinkStore> = match &config.database_url {
        Some(url) => Arc::new(
            PgDrinkStore::connect(url)
                .await
                .context("failed to connect to the drinks database")?,
        ),
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory drink store");
            Arc::new(InMemoryDrinkStore::new())
        }
    };

    if config.reset_catalog {
        reset_and_seed(store.as_ref())
            .await
            .context("failed to reset the drink catalog")?;
    }

    let verifier = Arc::new(TokenVerifier::from_config(&config.auth));
    let gate = Arc::new(PermissionGate::new(verifier));
    let app = barista_api::build_app(gate, store);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        issuer = %config.auth.issuer,
        "listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
