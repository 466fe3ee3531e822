//! Debounced cart persistence.
//!
//! Rapid cart mutations collapse into a single storage write: each
//! mutation replaces the pending payload and restarts a timer, and only
//! the payload alive when the timer fires is written. [`DebouncedWriter::flush`]
//! writes any pending payload immediately for deterministic teardown.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

use super::storage::CartStorage;
use super::CartItem;

/// Delay between the last cart mutation and the storage write.
pub const DEBOUNCE_DELAY: Duration = Duration::from_millis(500);

/// Debounced writer: timer plus pending-payload slot, owned by the cart
/// service.
pub struct DebouncedWriter {
    storage: Arc<dyn CartStorage>,
    delay: Duration,
    pending: Arc<Mutex<Option<Vec<CartItem>>>>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl DebouncedWriter {
    /// Create a writer over the given storage.
    #[must_use]
    pub fn new(storage: Arc<dyn CartStorage>, delay: Duration) -> Self {
        Self {
            storage,
            delay,
            pending: Arc::new(Mutex::new(None)),
            timer: Mutex::new(None),
        }
    }

    /// Replace the pending payload and restart the debounce timer.
    pub fn schedule(&self, items: Vec<CartItem>) {
        *self.pending.lock().expect("cart writer mutex poisoned") = Some(items);

        let mut timer = self.timer.lock().expect("cart writer mutex poisoned");
        if let Some(handle) = timer.take() {
            handle.abort();
        }

        let storage = Arc::clone(&self.storage);
        let pending = Arc::clone(&self.pending);
        let delay = self.delay;

        *timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let items = pending.lock().expect("cart writer mutex poisoned").take();
            if let Some(items) = items {
                write_with_retry(storage.as_ref(), &items);
            }
        }));
    }

    /// Cancel the timer and write any pending payload immediately.
    pub async fn flush(&self) {
        let handle = self
            .timer
            .lock()
            .expect("cart writer mutex poisoned")
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }

        let items = self
            .pending
            .lock()
            .expect("cart writer mutex poisoned")
            .take();
        if let Some(items) = items {
            write_with_retry(self.storage.as_ref(), &items);
        }
    }
}

/// Write the item list; on failure, reset storage and retry once, then
/// give up with a logged error only. Persistence failures are never
/// surfaced to the shopper.
fn write_with_retry(storage: &dyn CartStorage, items: &[CartItem]) {
    let payload = match serde_json::to_string(items) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::error!("failed to serialize cart: {e}");
            return;
        }
    };

    if let Err(first) = storage.save(&payload) {
        tracing::warn!("cart save failed, resetting storage and retrying: {first}");
        if let Err(e) = storage.reset() {
            tracing::error!("cart storage reset failed: {e}");
        }
        if let Err(second) = storage.save(&payload) {
            tracing::error!("cart save failed after reset, giving up: {second}");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::super::storage::MemoryCartStorage;
    use super::*;
    use movase_core::BookId;

    fn item(id: i64, quantity: u32) -> CartItem {
        CartItem {
            id: BookId::new(id),
            title: format!("Book {id}"),
            author: "Author".to_string(),
            price: "10.00".parse().unwrap(),
            image_url: format!("/covers/{id}.jpg"),
            quantity,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_fires_after_delay() {
        let storage = Arc::new(MemoryCartStorage::new());
        let writer = DebouncedWriter::new(storage.clone(), DEBOUNCE_DELAY);

        writer.schedule(vec![item(1, 1)]);
        assert!(storage.blob().is_none());

        tokio::time::sleep(Duration::from_millis(600)).await;
        // Let the spawned timer task run.
        tokio::task::yield_now().await;

        let blob = storage.blob().unwrap();
        let items: Vec<CartItem> = serde_json::from_str(&blob).unwrap();
        assert_eq!(items.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_schedules_collapse_to_last_payload() {
        let storage = Arc::new(MemoryCartStorage::new());
        let writer = DebouncedWriter::new(storage.clone(), DEBOUNCE_DELAY);

        writer.schedule(vec![item(1, 1)]);
        tokio::time::sleep(Duration::from_millis(100)).await;
        writer.schedule(vec![item(1, 2)]);
        tokio::time::sleep(Duration::from_millis(600)).await;
        tokio::task::yield_now().await;

        let blob = storage.blob().unwrap();
        let items: Vec<CartItem> = serde_json::from_str(&blob).unwrap();
        assert_eq!(items[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_flush_writes_pending_immediately() {
        let storage = Arc::new(MemoryCartStorage::new());
        let writer = DebouncedWriter::new(storage.clone(), DEBOUNCE_DELAY);

        writer.schedule(vec![item(1, 3)]);
        writer.flush().await;

        let blob = storage.blob().unwrap();
        let items: Vec<CartItem> = serde_json::from_str(&blob).unwrap();
        assert_eq!(items[0].quantity, 3);
    }

    #[tokio::test]
    async fn test_flush_without_pending_is_noop() {
        let storage = Arc::new(MemoryCartStorage::new());
        let writer = DebouncedWriter::new(storage.clone(), DEBOUNCE_DELAY);

        writer.flush().await;
        assert!(storage.blob().is_none());
    }

    #[tokio::test]
    async fn test_save_failure_resets_and_retries_once() {
        let storage = Arc::new(MemoryCartStorage::with_blob("[old]"));
        storage.fail_next_saves(1);

        let writer = DebouncedWriter::new(storage.clone(), DEBOUNCE_DELAY);
        writer.schedule(vec![item(1, 1)]);
        writer.flush().await;

        // First save failed, storage was reset, the retry landed.
        assert!(storage.blob().unwrap().contains("\"quantity\":1"));
    }

    #[tokio::test]
    async fn test_persistent_save_failure_gives_up_silently() {
        let storage = Arc::new(MemoryCartStorage::new());
        storage.set_fail_saves(true);

        let writer = DebouncedWriter::new(storage.clone(), DEBOUNCE_DELAY);
        writer.schedule(vec![item(1, 1)]);
        // Must not panic or surface an error.
        writer.flush().await;

        assert!(storage.blob().is_none());
    }
}
