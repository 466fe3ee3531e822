//! Durable cart storage.
//!
//! The cart persists as a single keyed blob: a JSON array of line items.
//! Absence of the blob is a valid empty-cart state. The blob is validated
//! structurally on load; any invalid item invalidates the entire load.

use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use rust_decimal::Decimal;
use thiserror::Error;

use super::CartItem;

/// Errors that can occur reading or writing cart storage.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The item list could not be serialized.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Injected failure (test implementations only).
    #[error("storage unavailable")]
    Unavailable,
}

/// Durable storage for the cart blob.
///
/// A single global resource per session; writes are serialized by the
/// debounced writer that owns it.
pub trait CartStorage: Send + Sync {
    /// Read the stored blob. `None` means no cart has been stored yet.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the blob exists but cannot be read.
    fn load(&self) -> Result<Option<String>, StorageError>;

    /// Replace the stored blob.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the blob cannot be written.
    fn save(&self, payload: &str) -> Result<(), StorageError>;

    /// Remove the stored blob, returning storage to the empty-cart state.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the blob cannot be removed.
    fn reset(&self) -> Result<(), StorageError>;
}

/// Decode and structurally validate a stored cart blob.
///
/// Returns `None` when the payload is not a JSON array of well-typed items
/// or when any item violates the invariants (`quantity > 0`, `price >= 0`).
/// A single bad item invalidates the whole load.
#[must_use]
pub fn decode_items(payload: &str) -> Option<Vec<CartItem>> {
    let items: Vec<CartItem> = serde_json::from_str(payload).ok()?;

    let valid = items
        .iter()
        .all(|item| item.quantity > 0 && item.price >= Decimal::ZERO);

    valid.then_some(items)
}

// =============================================================================
// FileCartStorage
// =============================================================================

/// Cart storage backed by a single JSON file.
#[derive(Debug)]
pub struct FileCartStorage {
    path: PathBuf,
}

impl FileCartStorage {
    /// Create a storage handle for the given file path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CartStorage for FileCartStorage {
    fn load(&self) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(&self.path) {
            Ok(payload) => Ok(Some(payload)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, payload: &str) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, payload)?;
        Ok(())
    }

    fn reset(&self) -> Result<(), StorageError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// =============================================================================
// MemoryCartStorage
// =============================================================================

/// In-memory cart storage for tests, with save-failure injection.
#[derive(Debug, Default)]
pub struct MemoryCartStorage {
    blob: Mutex<Option<String>>,
    /// Remaining save calls that fail; `u32::MAX` means fail forever.
    fail_saves: AtomicU32,
}

impl MemoryCartStorage {
    /// Create empty in-memory storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create storage pre-seeded with a blob.
    #[must_use]
    pub fn with_blob(payload: &str) -> Self {
        Self {
            blob: Mutex::new(Some(payload.to_owned())),
            fail_saves: AtomicU32::new(0),
        }
    }

    /// Configure whether save calls fail from now on.
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves
            .store(if fail { u32::MAX } else { 0 }, Ordering::SeqCst);
    }

    /// Fail exactly the next `count` save calls, then recover.
    pub fn fail_next_saves(&self, count: u32) {
        self.fail_saves.store(count, Ordering::SeqCst);
    }

    /// The currently stored blob, if any.
    #[must_use]
    pub fn blob(&self) -> Option<String> {
        self.blob.lock().expect("cart storage mutex poisoned").clone()
    }
}

impl CartStorage for MemoryCartStorage {
    fn load(&self) -> Result<Option<String>, StorageError> {
        Ok(self.blob())
    }

    fn save(&self, payload: &str) -> Result<(), StorageError> {
        let remaining = self.fail_saves.load(Ordering::SeqCst);
        if remaining > 0 {
            if remaining != u32::MAX {
                self.fail_saves.store(remaining - 1, Ordering::SeqCst);
            }
            return Err(StorageError::Unavailable);
        }
        *self.blob.lock().expect("cart storage mutex poisoned") = Some(payload.to_owned());
        Ok(())
    }

    fn reset(&self) -> Result<(), StorageError> {
        *self.blob.lock().expect("cart storage mutex poisoned") = None;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use movase_core::BookId;

    fn item(id: i64, price: &str, quantity: u32) -> CartItem {
        CartItem {
            id: BookId::new(id),
            title: format!("Book {id}"),
            author: "Author".to_string(),
            price: price.parse().unwrap(),
            image_url: format!("/covers/{id}.jpg"),
            quantity,
        }
    }

    #[test]
    fn test_decode_valid_payload() {
        let items = vec![item(1, "35.00", 2), item(2, "19.90", 1)];
        let payload = serde_json::to_string(&items).unwrap();

        let decoded = decode_items(&payload).unwrap();
        assert_eq!(decoded, items);
    }

    #[test]
    fn test_decode_rejects_non_array() {
        assert!(decode_items("{\"not\":\"an array\"}").is_none());
        assert!(decode_items("not json at all").is_none());
    }

    #[test]
    fn test_decode_rejects_zero_quantity() {
        let payload = r#"[{"id":1,"title":"T","author":"A","price":"10.00","image_url":"/x.jpg","quantity":0}]"#;
        assert!(decode_items(payload).is_none());
    }

    #[test]
    fn test_decode_rejects_negative_price() {
        let payload = r#"[{"id":1,"title":"T","author":"A","price":"-1.00","image_url":"/x.jpg","quantity":1}]"#;
        assert!(decode_items(payload).is_none());
    }

    #[test]
    fn test_one_bad_item_invalidates_whole_load() {
        let payload = r#"[
            {"id":1,"title":"T","author":"A","price":"10.00","image_url":"/x.jpg","quantity":1},
            {"id":2,"title":"U","author":"B","price":"5.00","image_url":"/y.jpg","quantity":0}
        ]"#;
        assert!(decode_items(payload).is_none());
    }

    #[test]
    fn test_decode_rejects_missing_fields() {
        let payload = r#"[{"id":1,"quantity":1}]"#;
        assert!(decode_items(payload).is_none());
    }

    #[test]
    fn test_memory_storage_roundtrip() {
        let storage = MemoryCartStorage::new();
        assert!(storage.load().unwrap().is_none());

        storage.save("[]").unwrap();
        assert_eq!(storage.load().unwrap().as_deref(), Some("[]"));

        storage.reset().unwrap();
        assert!(storage.load().unwrap().is_none());
    }

    #[test]
    fn test_memory_storage_fail_saves() {
        let storage = MemoryCartStorage::new();
        storage.set_fail_saves(true);
        assert!(storage.save("[]").is_err());
    }
}
