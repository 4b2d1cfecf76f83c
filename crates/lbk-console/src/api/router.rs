use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use lbk_core::catalog::JsonCatalogStore;
use lbk_core::circulation::Circulation;
use lbk_core::context::KioskContext;

use crate::api::{catalog, debug, scan};
use crate::sim::SimReader;

#[derive(Clone)]
pub struct AppState {
    pub ctx: Arc<KioskContext>,
    pub circulation: Arc<Circulation<JsonCatalogStore>>,
    /// Present only when running against the simulator.
    pub sim: Option<Arc<SimReader>>,
}

pub fn create_router(state: AppState) -> Router {
    let mut api_router = Router::new()
        .route("/scan", get(scan::get_scan))
        .route("/clear-card", get(scan::clear_card))
        .route("/mode", get(scan::set_mode))
        .route("/users", get(catalog::list_users).post(catalog::replace_users))
        .route("/books", get(catalog::list_books).post(catalog::replace_books))
        .route("/check-borrowed", get(catalog::check_borrowed))
        .route("/borrow", post(catalog::borrow_book))
        .route("/return", post(catalog::return_book))
        .route("/register", post(catalog::register));

    if state.sim.is_some() {
        api_router = api_router
            .route("/debug/motion", post(debug::trigger_motion))
            .route("/debug/card", post(debug::inject_card));
    }

    Router::new()
        .nest("/api", api_router.with_state(state))
        .route("/health", get(|| async { "OK" }))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
