use chrono::NaiveDate;

use crate::calendar::next_business_days;
use crate::limits::REPORT_BUSINESS_DAYS;
use crate::model::{RoomTimes, WeeklyAvailability, format_date, format_time};

use super::{BookingError, RoomBooking};

impl RoomBooking {
    pub async fn available_this_week(&self) -> Result<WeeklyAvailability, BookingError> {
        self.list_week(self.clock.today()).await
    }

    /// Free times per room for each of the next five business days starting
    /// at `today`, rooms and times in store order. Every one of the five dates is a key, even when it has no
    /// free slot; if none of them has any, the whole report is `NotFound`.
    pub async fn list_week(&self, today: NaiveDate) -> Result<WeeklyAvailability, BookingError> {
        let mut week = WeeklyAvailability::new();
        let mut any_free = false;

        for date in next_business_days(today, REPORT_BUSINESS_DAYS) {
            let mut rooms = RoomTimes::new();
            for slot in self.store.free_slots_on(date).await? {
                rooms.push(slot.room, format_time(slot.time));
                any_free = true;
            }
            week.insert(format_date(date), rooms);
        }

        if !any_free {
            tracing::debug!(%today, "no free slots in the coming business week");
            return Err(BookingError::NotFound);
        }
        Ok(week)
    }
}
