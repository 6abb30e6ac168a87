use chrono::NaiveDate;

use crate::model::*;

use super::SlotStore;

impl SlotStore {
    pub async fn slot_state(&self, key: &SlotKey) -> Option<bool> {
        let day = self.get_day(&key.date)?;
        let guard = day.read().await;
        guard.row(&key.room, key.time).map(|row| row.available)
    }

    pub async fn free_slots(&self, date: NaiveDate) -> Vec<FreeSlot> {
        let Some(day) = self.get_day(&date) else {
            return Vec::new();
        };
        let guard = day.read().await;
        guard
            .free_rows()
            .map(|row| FreeSlot {
                room: row.room.clone(),
                time: row.time,
            })
            .collect()
    }

    /// Total rows, free and booked.
    pub async fn slot_count(&self) -> usize {
        let days: Vec<_> = self.days.iter().map(|e| e.value().clone()).collect();
        let mut total = 0;
        for day in days {
            total += day.read().await.rows.len();
        }
        total
    }
}
