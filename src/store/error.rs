/// Infrastructure failures of the slot store. Business outcomes (free,
/// booked, missing) are return values, never errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("WAL error: {0}")]
    Wal(String),
}
