use std::collections::{BTreeMap, HashMap};
use std::ops::Index;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize, Serializer};

/// Wire format for dates: `YYYY-MM-DD`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Wire format for times: `HH:MM`, 24h.
pub const TIME_FORMAT: &str = "%H:%M";

/// Canonical room label for a room number, e.g. `Room 3`.
pub fn room_label(room_id: u32) -> String {
    format!("Room {room_id}")
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

/// Unique key of a slot. There is no surrogate id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotKey {
    pub room: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl SlotKey {
    pub fn new(room: impl Into<String>, date: NaiveDate, time: NaiveTime) -> Self {
        Self {
            room: room.into(),
            date,
            time,
        }
    }
}

/// A free (room, time) pair on some day, as listed by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreeSlot {
    pub room: String,
    pub time: NaiveTime,
}

/// Proof of a successful booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub room: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl Confirmation {
    pub fn message(&self) -> String {
        format!(
            "Rummet {} är nu bokat för {} den {}.",
            self.room,
            format_time(self.time),
            format_date(self.date)
        )
    }
}

/// Free times per room for a single day. Rooms keep the order in which they
/// were first seen and serialize as a JSON object in that order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomTimes(Vec<(String, Vec<String>)>);

impl RoomTimes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `time` to `room`, opening a new entry the first time the room
    /// appears.
    pub fn push(&mut self, room: String, time: String) {
        match self.0.iter_mut().rev().find(|(r, _)| *r == room) {
            Some((_, times)) => times.push(time),
            None => self.0.push((room, vec![time])),
        }
    }

    pub fn get(&self, room: &str) -> Option<&Vec<String>> {
        self.0.iter().find(|(r, _)| r == room).map(|(_, times)| times)
    }

    pub fn rooms(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(r, _)| r.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Index<&str> for RoomTimes {
    type Output = Vec<String>;

    fn index(&self, room: &str) -> &Vec<String> {
        match self.get(room) {
            Some(times) => times,
            None => panic!("no free times listed for {room}"),
        }
    }
}

impl Serialize for RoomTimes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(room, times)| (room, times)))
    }
}

/// ISO date → room label → free times. Date keys sort chronologically.
pub type WeeklyAvailability = BTreeMap<String, RoomTimes>;

/// WAL record. Replaying all events in order rebuilds the slot table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    SlotSeeded { key: SlotKey, available: bool },
    SlotBooked { key: SlotKey },
}

impl Event {
    pub fn key(&self) -> &SlotKey {
        match self {
            Event::SlotSeeded { key, .. } | Event::SlotBooked { key } => key,
        }
    }
}

/// One row of the slot table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotRow {
    pub room: String,
    pub time: NaiveTime,
    pub available: bool,
}

/// All slots of one calendar day, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct DayState {
    pub rows: Vec<SlotRow>,
    index: HashMap<(String, NaiveTime), usize>,
}

impl DayState {
    /// Append a row unless the (room, time) pair already exists.
    /// Returns false when the row was already present.
    pub fn insert_row(&mut self, row: SlotRow) -> bool {
        let k = (row.room.clone(), row.time);
        if self.index.contains_key(&k) {
            return false;
        }
        self.index.insert(k, self.rows.len());
        self.rows.push(row);
        true
    }

    pub fn row(&self, room: &str, time: NaiveTime) -> Option<&SlotRow> {
        self.index
            .get(&(room.to_string(), time))
            .map(|&pos| &self.rows[pos])
    }

    pub fn row_mut(&mut self, room: &str, time: NaiveTime) -> Option<&mut SlotRow> {
        match self.index.get(&(room.to_string(), time)) {
            Some(&pos) => Some(&mut self.rows[pos]),
            None => None,
        }
    }

    pub fn contains(&self, room: &str, time: NaiveTime) -> bool {
        self.row(room, time).is_some()
    }

    /// Free rows in insertion order.
    pub fn free_rows(&self) -> impl Iterator<Item = &SlotRow> {
        self.rows.iter().filter(|r| r.available)
    }
}
