use std::time::Instant;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use super::AppState;
use super::dto::{BookingRequest, BookingResponse, HealthResponse};
use super::error::rejected_body;
use crate::booking::BookingError;
use crate::model::WeeklyAvailability;
use crate::observability::{BOOKING_CONFLICTS_TOTAL, REQUEST_DURATION_SECONDS, REQUESTS_TOTAL};

fn record(endpoint: &'static str, started: Instant, status: StatusCode) {
    metrics::counter!(REQUESTS_TOTAL, "endpoint" => endpoint, "status" => status.as_u16().to_string())
        .increment(1);
    metrics::histogram!(REQUEST_DURATION_SECONDS, "endpoint" => endpoint)
        .record(started.elapsed().as_secs_f64());
}

fn status_of<T>(result: &Result<T, BookingError>) -> StatusCode {
    result.as_ref().map_or_else(BookingError::status, |_| StatusCode::OK)
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
    })
}

/// POST /book-room
pub async fn book_room(
    State(state): State<AppState>,
    payload: Result<Json<BookingRequest>, JsonRejection>,
) -> Response {
    let started = Instant::now();
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            let response = rejected_body(rejection);
            record("book_room", started, response.status());
            return response;
        }
    };

    let result = state
        .booking
        .book(request.room_id.get(), &request.tid, &request.datum)
        .await;
    record("book_room", started, status_of(&result));
    match result {
        Ok(confirmation) => Json(BookingResponse {
            message: confirmation.message(),
        })
        .into_response(),
        Err(e) => {
            if let BookingError::Conflict { .. } = e {
                metrics::counter!(BOOKING_CONFLICTS_TOTAL).increment(1);
            }
            e.into_response()
        }
    }
}

/// GET /available-rooms-week
pub async fn available_rooms_week(
    State(state): State<AppState>,
) -> Result<Json<WeeklyAvailability>, BookingError> {
    let started = Instant::now();
    let result = state.booking.available_this_week().await;
    record("available_rooms_week", started, status_of(&result));
    result.map(Json)
}
