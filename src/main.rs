use anyhow::{Context, Result};
use photo_search::{
    config::AppConfig,
    routes::routes::build_router,
    services::sigv4::{Credentials, SigV4Signer},
    state::AppState,
};
use std::io::ErrorKind;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config ---
    let cfg = AppConfig::from_env_and_args()?;

    tracing::info!("Starting photo-search with config: {:?}", cfg);

    // --- Collaborator clients, built once and shared ---
    let credentials = Credentials::from_env().context("loading request signing credentials")?;
    let signer = SigV4Signer::new(credentials, cfg.region.clone());
    let http = reqwest::Client::builder()
        .build()
        .context("building HTTP client")?;

    let state = AppState::from_config(&cfg, http, signer);

    // --- Build router ---
    let app = build_router(state);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
