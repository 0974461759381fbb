//! incident-intel -- analytic core for cluster incident investigation.
//!
//! Given one incident and the incident history, the engine produces an
//! insight feed, ranked related incidents, a fix success prediction, and a
//! root cause analysis report. All analytic routines are pure; file and
//! network access live in [`store`], [`api`] and the binary.

pub mod api;
pub mod config;
pub mod engine;
pub mod incident;
pub mod insights;
pub mod predict;
pub mod report;
pub mod similarity;
pub mod store;

use anyhow::{Context, Result};

pub use engine::Engine;
pub use incident::Incident;

/// Serve the HTTP API over the incidents in `config.store.path`.
pub async fn serve(config: &config::Config) -> Result<()> {
    // 1. Load incidents
    let path = &config.store.path;
    tracing::info!(path = %path.display(), "Loading incidents");
    let incidents = store::load_incidents(path)?;

    // 2. Build state
    let engine = Engine::from_config(config);
    let state = api::state::AppState::new(incidents, engine);

    // 3. Start API server
    let addr: std::net::SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("invalid bind address: {}", config.server.bind))?;
    let app = api::router(state);

    tracing::info!(%addr, "incident-intel listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
