mod api;
mod config;
mod seed;
mod sim;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;
use tracing_subscriber::EnvFilter;

use lbk_core::catalog::JsonCatalogStore;
use lbk_core::circulation::Circulation;
use lbk_core::context::KioskContext;
use lbk_core::reader::IdleReader;
use lbk_core::runtime::{KioskRuntime, ScanObserver};
use lbk_core::session::CaptureNotice;

use crate::api::router::{create_router, AppState};
use crate::config::ConsoleConfig;
use crate::sim::SimReader;

/// Renders scan-session progress into the log, standing in for the kiosk's
/// local display.
struct LogObserver;

#[async_trait]
impl ScanObserver for LogObserver {
    async fn scan_armed(&self, remaining_secs: u64) {
        info!(remaining_secs, "scanning for card");
    }

    async fn card_captured(&self, notice: &CaptureNotice) {
        info!(uid = %notice.uid, mode = %notice.mode, "card detected");
    }

    async fn scan_timed_out(&self) {
        info!("no card detected");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    dotenvy::dotenv().ok();
    let config = ConsoleConfig::load()?;

    info!(data_dir = %config.data_dir.display(), "Initializing LBK Console...");

    // Catalog
    tokio::fs::create_dir_all(&config.data_dir).await?;
    let store = Arc::new(JsonCatalogStore::new(&config.data_dir));
    seed::seed_catalog(&store).await?;
    let circulation = Arc::new(Circulation::new(store));

    // Kiosk runtime
    let ctx = KioskContext::new();
    let sim = config.simulator.then(|| Arc::new(SimReader::new()));
    match &sim {
        Some(reader) => {
            info!("card reader: simulator");
            tokio::spawn(KioskRuntime::new(ctx.clone(), reader.clone(), LogObserver).run());
        }
        None => {
            tokio::spawn(KioskRuntime::new(ctx.clone(), Arc::new(IdleReader), LogObserver).run());
        }
    }

    // Router
    let state = AppState {
        ctx,
        circulation,
        sim,
    };
    let app = create_router(state);

    info!("Starting LBK Console on http://{}", config.listen_addr);
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
