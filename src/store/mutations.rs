use std::collections::{BTreeMap, HashSet};

use chrono::{NaiveDate, NaiveTime};
use tokio::sync::oneshot;

use crate::model::*;
use crate::observability::SLOTS_SEEDED_TOTAL;
use crate::wal::WalCounters;

use super::{SharedDayState, SlotStore, StoreError, WalRequest};

impl SlotStore {
    /// Compare-and-swap `available: true → false`. The day's write lock is
    /// held across the check, the WAL commit and the flip.
    pub async fn book_slot(&self, key: &SlotKey) -> Result<bool, StoreError> {
        let Some(day) = self.get_day(&key.date) else {
            return Ok(false);
        };
        let _gate = self.gate.read().await;
        let mut guard = day.write().await;
        match guard.row(&key.room, key.time) {
            Some(row) if row.available => {}
            _ => return Ok(false),
        }
        self.persist_and_apply(&mut guard, vec![Event::SlotBooked { key: key.clone() }])
            .await?;
        Ok(true)
    }

    /// Insert free slots for every key not already in the table. Existing
    /// rows keep their state. Each day's new rows go to the WAL as a single
    /// commit. Returns how many rows were added.
    pub async fn seed<I>(&self, keys: I) -> Result<usize, StoreError>
    where
        I: IntoIterator<Item = SlotKey>,
    {
        let mut by_day: BTreeMap<NaiveDate, Vec<SlotKey>> = BTreeMap::new();
        for key in keys {
            by_day.entry(key.date).or_default().push(key);
        }

        let _gate = self.gate.read().await;
        let mut added = 0;
        for (date, keys) in by_day {
            let day = self.get_or_create_day(date);
            let mut guard = day.write().await;
            let mut fresh = HashSet::new();
            let events: Vec<Event> = keys
                .into_iter()
                .filter(|key| {
                    !guard.contains(&key.room, key.time) && fresh.insert((key.room.clone(), key.time))
                })
                .map(|key| Event::SlotSeeded {
                    key,
                    available: true,
                })
                .collect();
            added += events.len();
            self.persist_and_apply(&mut guard, events).await?;
        }
        metrics::counter!(SLOTS_SEEDED_TOTAL).increment(added as u64);
        Ok(added)
    }

    /// Rewrite the WAL as one `SlotSeeded` per row carrying its current flag.
    pub async fn compact_wal(&self) -> Result<(), StoreError> {
        let _gate = self.gate.write().await;

        let mut days: Vec<(NaiveDate, SharedDayState)> = self
            .days
            .iter()
            .map(|e| (*e.key(), e.value().clone()))
            .collect();
        days.sort_by_key(|(date, _)| *date);

        let mut events = Vec::new();
        for (date, day) in days {
            let guard = day.read().await;
            events.extend(guard.rows.iter().map(|row| Event::SlotSeeded {
                key: SlotKey::new(row.room.clone(), date, row.time),
                available: row.available,
            }));
        }
        let count = events.len();

        let (tx, rx) = oneshot::channel();
        self.send_to_log(WalRequest::Rewrite(events, tx), rx)
            .await?
            .map_err(|e| StoreError::Wal(e.to_string()))?;
        tracing::info!("WAL compacted to {count} events");
        Ok(())
    }

    /// WAL writer counters since the last compaction.
    pub async fn wal_counters(&self) -> Result<WalCounters, StoreError> {
        let (tx, rx) = oneshot::channel();
        self.send_to_log(WalRequest::Counters(tx), rx).await
    }

    /// Events written to the WAL since it was last compacted.
    pub async fn wal_appends_since_compact(&self) -> u64 {
        self.wal_counters().await.map_or(0, |c| c.events)
    }
}

/// Every (room, time) combination on every date.
pub fn slot_grid(rooms: &[String], dates: &[NaiveDate], times: &[NaiveTime]) -> Vec<SlotKey> {
    let mut keys = Vec::with_capacity(rooms.len() * dates.len() * times.len());
    for &date in dates {
        for room in rooms {
            for &time in times {
                keys.push(SlotKey::new(room.clone(), date, time));
            }
        }
    }
    keys
}
