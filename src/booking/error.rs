use chrono::{NaiveDate, NaiveTime};

use crate::model::{format_date, format_time};
use crate::store::StoreError;
use crate::validate::ValidationError;

fn conflict_message(room: &str, date: &NaiveDate, time: &NaiveTime) -> String {
    format!(
        "Rummet {room} är redan bokat för {} den {}. Välj en annan tid.",
        format_time(*time),
        format_date(*date)
    )
}

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{}", conflict_message(.room, .date, .time))]
    Conflict {
        room: String,
        date: NaiveDate,
        time: NaiveTime,
    },
    #[error("Inga lediga rum finns för de kommande fem vardagarna.")]
    NotFound,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl BookingError {
    pub fn code(&self) -> &'static str {
        match self {
            BookingError::Validation(e) => e.code(),
            BookingError::Conflict { .. } => "conflict",
            BookingError::NotFound => "not_found",
            BookingError::Store(_) => "internal",
        }
    }
}
