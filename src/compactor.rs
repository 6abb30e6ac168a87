use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use crate::store::SlotStore;

/// Compact the WAL whenever `threshold` appends have piled up since the
/// last compaction. Checks every `every`.
pub async fn run_compactor(store: Arc<SlotStore>, threshold: u64, every: Duration) {
    let mut interval = tokio::time::interval(every);
    loop {
        interval.tick().await;
        if compact_if_needed(&store, threshold).await {
            info!("WAL compaction finished");
        }
    }
}

/// One compactor pass. True if a compaction ran and succeeded.
pub async fn compact_if_needed(store: &SlotStore, threshold: u64) -> bool {
    let appends = store.wal_appends_since_compact().await;
    if appends < threshold {
        return false;
    }
    info!("compacting WAL after {appends} appends");
    match store.compact_wal().await {
        Ok(()) => true,
        Err(e) => {
            error!("WAL compaction failed: {e}");
            false
        }
    }
}
