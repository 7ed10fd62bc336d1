//! HTTP route handlers for the Receetly server.
//!
//! # Route Structure
//!
//! ```text
//! # Agent API
//! POST /api/agent/upload?terminalPublicId=..&filename=..  - Upload a receipt PDF
//!
//! # Waiting room API
//! GET  /api/receipts/latest?terminalPublicId=..           - Claim the latest receipt
//! GET  /api/debug/terminals[?publicId=..]                 - Terminal listing
//!
//! # Waiting room page
//! GET  /w                      - Waiting room without a terminal (error state)
//! GET  /w/{terminalPublicId}   - Waiting room for a terminal
//!
//! # Admin (basic auth)
//! GET  /admin                  - Lists and create forms
//! POST /admin/merchants        - Create merchant
//! POST /admin/shops            - Create shop
//! POST /admin/terminals        - Create terminal
//! ```

pub mod admin;
pub mod agent;
pub mod debug;
pub mod receipts;
pub mod waiting_room;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post},
};

use crate::middleware::require_admin;
use crate::state::AppState;

/// Create the JSON API router.
pub fn api_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/agent/upload",
            post(agent::upload).layer(DefaultBodyLimit::max(state.config().upload_max_bytes)),
        )
        .route("/receipts/latest", get(receipts::latest))
        .route("/debug/terminals", get(debug::terminals))
}

/// Create the admin router. Every route sits behind the basic auth challenge.
pub fn admin_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(admin::index))
        .route("/merchants", post(admin::create_merchant))
        .route("/shops", post(admin::create_shop))
        .route("/terminals", post(admin::create_terminal))
        .route_layer(from_fn_with_state(state.clone(), require_admin))
}

/// Create all routes for the server.
pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/w", get(waiting_room::missing_terminal))
        .route("/w/", get(waiting_room::missing_terminal))
        .route("/w/{terminal_public_id}", get(waiting_room::show))
        .nest("/api", api_routes(state))
        .nest("/admin", admin_routes(state))
}
