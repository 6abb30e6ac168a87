mod allocate;
mod error;
mod report;

pub use error::BookingError;

use std::sync::Arc;

use crate::calendar::Clock;
use crate::store::AvailabilityStore;

/// Booking logic over an [`AvailabilityStore`]: validates requests, claims
/// slots, and reports free slots for the coming business week.
#[derive(Clone)]
pub struct RoomBooking {
    store: Arc<dyn AvailabilityStore>,
    clock: Arc<dyn Clock>,
}

impl RoomBooking {
    pub fn new(store: Arc<dyn AvailabilityStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }
}
