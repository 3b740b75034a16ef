use anyhow::Context;
use clap::Parser;

use docforms_core::logging::setup_logging;
use docforms_core::SETTINGS;
use itemlist::config::{load_settings, Cli};
use itemlist::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(&cli)?;
    setup_logging(&settings);
    SETTINGS.configure(settings.clone());

    let addr = settings.listen_addr.clone();
    let app = router(AppState::memory(settings));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;
    tracing::info!("Serving the item list at http://{addr}/");
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
