use chrono::NaiveDate;
use tracing::{debug, info};

use crate::model::{Confirmation, SlotKey, room_label};
use crate::validate::validate_request;

use super::{BookingError, RoomBooking};

impl RoomBooking {
    /// Book `room_id` at `tid` on `datum`, judged against the clock's today.
    pub async fn book(
        &self,
        room_id: u32,
        tid: &str,
        datum: &str,
    ) -> Result<Confirmation, BookingError> {
        self.book_as_of(room_id, tid, datum, self.clock.today()).await
    }

    /// Validate, look the slot up, then claim it with a conditional update.
    /// A slot that is missing, already booked, or lost to a concurrent
    /// booker is a conflict. Nothing is retried.
    pub async fn book_as_of(
        &self,
        room_id: u32,
        tid: &str,
        datum: &str,
        today: NaiveDate,
    ) -> Result<Confirmation, BookingError> {
        let (time, date) = validate_request(tid, datum, today).inspect_err(|e| {
            debug!(room_id, tid, datum, code = e.code(), "booking rejected");
        })?;

        let key = SlotKey::new(room_label(room_id), date, time);
        let conflict = |key: SlotKey| BookingError::Conflict {
            room: key.room,
            date: key.date,
            time: key.time,
        };

        match self.store.lookup(&key).await? {
            Some(true) => {}
            Some(false) => {
                debug!(room = %key.room, %date, %time, "slot already booked");
                return Err(conflict(key));
            }
            None => {
                debug!(room = %key.room, %date, %time, "slot does not exist");
                return Err(conflict(key));
            }
        }

        if !self.store.book_if_available(&key).await? {
            debug!(room = %key.room, %date, %time, "lost race for slot");
            metrics::counter!(crate::observability::BOOKING_RACES_LOST_TOTAL).increment(1);
            return Err(conflict(key));
        }

        info!(room = %key.room, %date, %time, "slot booked");
        Ok(Confirmation {
            room: key.room,
            date,
            time,
        })
    }
}
