pub mod error;
pub mod health;
pub mod share;
pub mod status_ws;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the full API router.
///
/// Every route is public: possession of a session id is the only
/// credential a browser ever presents.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/healthcheck", get(health::healthcheck))
        // Initiator
        .route("/v1/share/initiate", post(share::initiate))
        .route("/v1/share/update-torrent", post(share::update_torrent))
        // Receiver
        .route("/v1/share/session/:session_id", get(share::get_session))
        // Both peers
        .route("/v1/share/update-status", post(share::update_status))
        .route("/v1/share/status/:session_id", get(status_ws::status_ws))
}
