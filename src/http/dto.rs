use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

/// Body of `POST /book-room`. Room numbers start at 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRequest {
    pub room_id: NonZeroU32,
    /// `HH:MM`
    pub tid: String,
    /// `YYYY-MM-DD`
    pub datum: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingResponse {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}
