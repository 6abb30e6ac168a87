//! JSON-over-HTTP surface.
//!
//! ```text
//! POST /book-room            {room_id, tid, datum} → 200 | 409 | 422
//! GET  /available-rooms-week                       → 200 | 404
//! GET  /health                                     → 200
//! ```

pub mod dto;
pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::booking::RoomBooking;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub booking: Arc<RoomBooking>,
}

impl AppState {
    pub fn new(booking: RoomBooking) -> Self {
        Self {
            booking: Arc::new(booking),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/book-room", post(handlers::book_room))
        .route("/available-rooms-week", get(handlers::available_rooms_week))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
