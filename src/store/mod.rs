mod error;
mod mutations;
mod queries;

pub use error::StoreError;
pub use mutations::slot_grid;

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use tokio::sync::{RwLock, mpsc, oneshot};

use crate::limits::WAL_CHANNEL_CAPACITY;
use crate::model::*;
use crate::observability::{WAL_FLUSH_BATCH_SIZE, WAL_FLUSH_DURATION_SECONDS};
use crate::wal::{Replay, Tail, Wal, WalCounters};

pub type SharedDayState = Arc<RwLock<DayState>>;

/// The slot table as seen by the booking logic.
///
/// `book_if_available` is the only mutation and must be atomic per key: of
/// any number of concurrent calls for one free slot, exactly one returns
/// `true`.
#[async_trait]
pub trait AvailabilityStore: Send + Sync {
    /// `None` if the slot was never seeded, else its availability flag.
    async fn lookup(&self, key: &SlotKey) -> Result<Option<bool>, StoreError>;

    /// Flip the slot from free to booked. `false` if it is missing or already
    /// booked at the moment of the update.
    async fn book_if_available(&self, key: &SlotKey) -> Result<bool, StoreError>;

    /// Free slots on `date` in the table's natural (insertion) order.
    async fn free_slots_on(&self, date: NaiveDate) -> Result<Vec<FreeSlot>, StoreError>;
}

// ── Log writer task ──────────────────────────────────────

type Ack = oneshot::Sender<io::Result<()>>;

pub(super) enum WalRequest {
    /// Make these events durable, in order, as one unit.
    Commit(Vec<Event>, Ack),
    /// Replace the log with a snapshot.
    Rewrite(Vec<Event>, Ack),
    /// Writer counters since the last rewrite.
    Counters(oneshot::Sender<WalCounters>),
}

/// Owns the log. Commits that queue up while one is being written share a
/// single fsync; every caller hears back once its events are on disk.
async fn run_log_writer(mut wal: Wal, mut rx: mpsc::Receiver<WalRequest>) {
    let mut group: Vec<(Vec<Event>, Ack)> = Vec::new();
    while let Some(first) = rx.recv().await {
        let mut next = Some(first);
        while let Some(request) = next.take() {
            match request {
                WalRequest::Commit(events, ack) => {
                    group.push((events, ack));
                    next = rx.try_recv().ok();
                }
                WalRequest::Rewrite(events, ack) => {
                    sync_group(&mut wal, &mut group);
                    let _ = ack.send(wal.rewrite(&events));
                }
                WalRequest::Counters(reply) => {
                    sync_group(&mut wal, &mut group);
                    let _ = reply.send(wal.counters());
                }
            }
        }
        sync_group(&mut wal, &mut group);
    }
}

fn sync_group(wal: &mut Wal, group: &mut Vec<(Vec<Event>, Ack)>) {
    if group.is_empty() {
        return;
    }
    let events: usize = group.iter().map(|(events, _)| events.len()).sum();
    metrics::histogram!(WAL_FLUSH_BATCH_SIZE).record(events as f64);

    let started = Instant::now();
    let written = group
        .iter()
        .flat_map(|(events, _)| events)
        .try_for_each(|event| wal.buffer(event));
    // Sync even after a failed write so nothing half-buffered rides along
    // with the next group.
    let synced = wal.sync();
    let result = written.and(synced);
    metrics::histogram!(WAL_FLUSH_DURATION_SECONDS).record(started.elapsed().as_secs_f64());

    if let Err(e) = &result {
        tracing::error!(events, callers = group.len(), "WAL sync failed: {e}");
    }
    for (_, ack) in group.drain(..) {
        let _ = ack.send(match &result {
            Ok(()) => Ok(()),
            Err(e) => Err(io::Error::new(e.kind(), e.to_string())),
        });
    }
}

/// Apply an event to a day. The caller holds the day's write lock.
fn apply_to_day(day: &mut DayState, event: &Event) {
    match event {
        Event::SlotSeeded { key, available } => {
            day.insert_row(SlotRow {
                room: key.room.clone(),
                time: key.time,
                available: *available,
            });
        }
        Event::SlotBooked { key } => {
            if let Some(row) = day.row_mut(&key.room, key.time) {
                row.available = false;
            }
        }
    }
}

/// In-memory slot table, one lock per calendar day, made durable by a WAL.
pub struct SlotStore {
    days: DashMap<NaiveDate, SharedDayState>,
    wal_tx: mpsc::Sender<WalRequest>,
    /// Mutations hold this shared; compaction holds it exclusively so its
    /// snapshot cannot miss an event that is already queued for the WAL.
    gate: RwLock<()>,
}

impl SlotStore {
    /// Replay the WAL at `wal_path` and start its writer task. Must be called
    /// inside a tokio runtime.
    pub fn open(wal_path: PathBuf) -> io::Result<Self> {
        let Replay { events, tail } = Wal::replay(&wal_path)?;
        if tail != Tail::Clean {
            tracing::warn!(path = %wal_path.display(), ?tail, "WAL tail dropped on replay");
        }
        let wal = Wal::open(&wal_path)?;
        let (wal_tx, wal_rx) = mpsc::channel(WAL_CHANNEL_CAPACITY);
        tokio::spawn(run_log_writer(wal, wal_rx));

        let mut days: HashMap<NaiveDate, DayState> = HashMap::new();
        for event in &events {
            let date = event.key().date;
            apply_to_day(days.entry(date).or_insert_with(DayState::default), event);
        }
        tracing::info!(
            "slot store opened: {} events replayed over {} days",
            events.len(),
            days.len()
        );

        Ok(Self {
            days: days
                .into_iter()
                .map(|(date, day)| (date, Arc::new(RwLock::new(day))))
                .collect(),
            wal_tx,
            gate: RwLock::new(()),
        })
    }

    pub(super) async fn send_to_log<T>(
        &self,
        request: WalRequest,
        reply: oneshot::Receiver<T>,
    ) -> Result<T, StoreError> {
        self.wal_tx
            .send(request)
            .await
            .map_err(|_| StoreError::Wal("WAL writer shut down".into()))?;
        reply
            .await
            .map_err(|_| StoreError::Wal("WAL writer dropped response".into()))
    }

    /// Log `events` as one commit, then apply them. A failed commit leaves
    /// the day untouched.
    pub(super) async fn persist_and_apply(
        &self,
        day: &mut DayState,
        events: Vec<Event>,
    ) -> Result<(), StoreError> {
        if events.is_empty() {
            return Ok(());
        }
        let (tx, rx) = oneshot::channel();
        self.send_to_log(WalRequest::Commit(events.clone(), tx), rx)
            .await?
            .map_err(|e| StoreError::Wal(e.to_string()))?;
        for event in &events {
            apply_to_day(day, event);
        }
        Ok(())
    }

    pub fn get_day(&self, date: &NaiveDate) -> Option<SharedDayState> {
        self.days.get(date).map(|e| e.value().clone())
    }

    fn get_or_create_day(&self, date: NaiveDate) -> SharedDayState {
        self.days
            .entry(date)
            .or_insert_with(SharedDayState::default)
            .value()
            .clone()
    }
}

#[async_trait]
impl AvailabilityStore for SlotStore {
    async fn lookup(&self, key: &SlotKey) -> Result<Option<bool>, StoreError> {
        Ok(self.slot_state(key).await)
    }

    async fn book_if_available(&self, key: &SlotKey) -> Result<bool, StoreError> {
        self.book_slot(key).await
    }

    async fn free_slots_on(&self, date: NaiveDate) -> Result<Vec<FreeSlot>, StoreError> {
        Ok(self.free_slots(date).await)
    }
}
