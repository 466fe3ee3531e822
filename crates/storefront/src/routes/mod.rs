//! Route definitions.

pub mod correios;

use axum::{Router, routing::get};

use crate::state::AppState;

/// All storefront API routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/api/correios", get(correios::rate_lookup))
}
