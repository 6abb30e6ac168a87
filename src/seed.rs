use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveTime};
use tokio::time::{Instant, interval_at};

use crate::calendar::{Clock, next_business_days};
use crate::limits::REPORT_BUSINESS_DAYS;
use crate::model::room_label;
use crate::store::{SlotStore, StoreError, slot_grid};

/// Make sure every (room, time) exists as a slot on each of the coming
/// business days. Rows that already exist, booked or not, are left alone.
pub async fn seed_upcoming(
    store: &SlotStore,
    rooms: &[u32],
    times: &[NaiveTime],
    today: NaiveDate,
) -> Result<usize, StoreError> {
    if rooms.is_empty() || times.is_empty() {
        return Ok(0);
    }
    let labels: Vec<String> = rooms.iter().copied().map(room_label).collect();
    let dates = next_business_days(today, REPORT_BUSINESS_DAYS);
    let added = store.seed(slot_grid(&labels, &dates, times)).await?;
    if added > 0 {
        tracing::info!(
            "seeded {added} slots for {} rooms from {} to {}",
            labels.len(),
            dates.first().copied().unwrap_or(today),
            dates.last().copied().unwrap_or(today),
        );
    }
    Ok(added)
}

/// Re-run `seed_upcoming` every `every`, starting one period from now, so
/// new business days appear as the calendar moves on.
pub async fn run_seeder(
    store: Arc<SlotStore>,
    rooms: Vec<u32>,
    times: Vec<NaiveTime>,
    clock: Arc<dyn Clock>,
    every: Duration,
) {
    let mut interval = interval_at(Instant::now() + every, every);
    loop {
        interval.tick().await;
        if let Err(e) = seed_upcoming(&store, &rooms, &times, clock.today()).await {
            tracing::error!("reseeding failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::model::SlotKey;
    use crate::store::AvailabilityStore;

    /// A clock the test can move forward.
    struct StepClock(Mutex<NaiveDate>);

    impl Clock for StepClock {
        fn today(&self) -> NaiveDate {
            *self.0.lock().unwrap()
        }
    }

    fn test_wal_path(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join("roombook_test_seed");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let _ = std::fs::remove_file(&path);
        path
    }

    fn t(h: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn seeds_business_days_only() {
        let store = SlotStore::open(test_wal_path("business_days.wal")).unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 1, 3).unwrap(); // Friday

        let added = seed_upcoming(&store, &[1, 2], &[t(9), t(10)], today).await.unwrap();
        assert_eq!(added, 2 * 2 * 5);

        let saturday = NaiveDate::from_ymd_opt(2025, 1, 4).unwrap();
        assert!(store.free_slots_on(saturday).await.unwrap().is_empty());
        let thursday = NaiveDate::from_ymd_opt(2025, 1, 9).unwrap();
        assert_eq!(store.free_slots_on(thursday).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn reseeding_adds_nothing() {
        let store = SlotStore::open(test_wal_path("reseed.wal")).unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        seed_upcoming(&store, &[1], &[t(9)], today).await.unwrap();

        let key = SlotKey::new("Room 1", today, t(9));
        assert!(store.book_if_available(&key).await.unwrap());

        assert_eq!(seed_upcoming(&store, &[1], &[t(9)], today).await.unwrap(), 0);
        assert_eq!(store.lookup(&key).await.unwrap(), Some(false));
    }

    #[tokio::test]
    async fn nothing_to_seed() {
        let store = SlotStore::open(test_wal_path("empty_plan.wal")).unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        assert_eq!(seed_upcoming(&store, &[], &[t(9)], today).await.unwrap(), 0);
        assert_eq!(store.slot_count().await, 0);
    }

    #[tokio::test]
    async fn seeder_follows_the_calendar() {
        let store = Arc::new(SlotStore::open(test_wal_path("rolling.wal")).unwrap());
        let friday = NaiveDate::from_ymd_opt(2025, 1, 3).unwrap();
        let clock = Arc::new(StepClock(Mutex::new(friday)));
        seed_upcoming(&store, &[1], &[t(9)], friday).await.unwrap();

        let next_friday = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        let week_after = NaiveDate::from_ymd_opt(2025, 1, 16).unwrap();
        assert!(store.free_slots_on(week_after).await.unwrap().is_empty());

        *clock.0.lock().unwrap() = next_friday;
        let seeder = tokio::spawn(run_seeder(
            store.clone(),
            vec![1],
            vec![t(9)],
            clock.clone(),
            Duration::from_millis(10),
        ));
        let mut seeded = false;
        for _ in 0..100 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            if !store.free_slots_on(week_after).await.unwrap().is_empty() {
                seeded = true;
                break;
            }
        }
        seeder.abort();

        assert!(seeded, "seeder never reached {week_after}");
        // Friday 3rd through Thursday 16th: ten business days, one slot each.
        assert_eq!(store.slot_count().await, 10);
    }
}
