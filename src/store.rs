//! Cart snapshot persistence.
//!
//! The cart lives under a single key in a local key-value store as a JSON
//! array of line items. The engine takes the store as an injected dependency
//! so tests can swap in an in-memory or failing implementation and assert on
//! degraded-mode behavior directly.

use std::cell::RefCell;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::model::LineItem;

/// Errors reading or writing the persisted cart snapshot.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read cart snapshot: {0}")]
    Read(#[source] io::Error),

    #[error("failed to write cart snapshot: {0}")]
    Write(#[source] io::Error),

    #[error("malformed cart snapshot: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Storage seam for the cart snapshot.
///
/// `load` distinguishes "nothing persisted yet" (`Ok(None)`) from a snapshot
/// that exists but cannot be read or parsed (`Err`). The engine treats both
/// as an empty cart; only the latter is logged.
pub trait CartStore {
    fn load(&self) -> Result<Option<Vec<LineItem>>, StoreError>;
    fn save(&self, items: &[LineItem]) -> Result<(), StoreError>;
}

/// Snapshot store backed by one JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CartStore for JsonFileStore {
    fn load(&self) -> Result<Option<Vec<LineItem>>, StoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Read(e)),
        };
        let items = serde_json::from_str(&raw)?;
        Ok(Some(items))
    }

    fn save(&self, items: &[LineItem]) -> Result<(), StoreError> {
        let raw = serde_json::to_string(items)?;
        std::fs::write(&self.path, raw).map_err(StoreError::Write)
    }
}

/// In-memory store holding the serialized snapshot, so saves exercise the
/// same JSON codec as the file store. Intended for tests and demos.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: RefCell<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the slot with raw text, valid or not.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            slot: RefCell::new(Some(raw.into())),
        }
    }

    /// The serialized snapshot currently held, if any.
    pub fn raw(&self) -> Option<String> {
        self.slot.borrow().clone()
    }
}

impl CartStore for MemoryStore {
    fn load(&self) -> Result<Option<Vec<LineItem>>, StoreError> {
        match &*self.slot.borrow() {
            Some(raw) => Ok(Some(serde_json::from_str(raw)?)),
            None => Ok(None),
        }
    }

    fn save(&self, items: &[LineItem]) -> Result<(), StoreError> {
        let raw = serde_json::to_string(items)?;
        *self.slot.borrow_mut() = Some(raw);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Metal;
    use tempfile::TempDir;

    fn item(metal: Metal, weight_grams: u32, quantity: u32) -> LineItem {
        LineItem {
            metal,
            weight_grams,
            quantity,
            price_per_gram_at_add_time: 73.9466136125355,
        }
    }

    #[test]
    fn file_store_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("cart.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn file_store_round_trips_cart() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("cart.json"));

        let items = vec![item(Metal::Gold, 10, 2), item(Metal::Silver, 5, 1)];
        store.save(&items).unwrap();

        assert_eq!(store.load().unwrap().unwrap(), items);
    }

    #[test]
    fn file_store_round_trips_empty_cart() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("cart.json"));

        store.save(&[]).unwrap();
        assert_eq!(store.load().unwrap().unwrap(), Vec::<LineItem>::new());
    }

    #[test]
    fn file_store_malformed_snapshot_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cart.json");
        std::fs::write(&path, "not json at all").unwrap();

        let store = JsonFileStore::new(path);
        assert!(matches!(store.load(), Err(StoreError::Malformed(_))));
    }

    #[test]
    fn file_store_write_failure_is_error() {
        let dir = TempDir::new().unwrap();
        // Directory path as the snapshot path makes the write fail.
        let store = JsonFileStore::new(dir.path());
        assert!(matches!(store.save(&[]), Err(StoreError::Write(_))));
    }

    #[test]
    fn memory_store_starts_empty() {
        let store = MemoryStore::new();
        assert!(store.load().unwrap().is_none());
        assert!(store.raw().is_none());
    }

    #[test]
    fn memory_store_round_trips_cart() {
        let store = MemoryStore::new();
        let items = vec![item(Metal::Platinum, 100, 3)];
        store.save(&items).unwrap();
        assert_eq!(store.load().unwrap().unwrap(), items);
    }

    #[test]
    fn memory_store_seeded_garbage_is_error() {
        let store = MemoryStore::with_raw("{broken");
        assert!(matches!(store.load(), Err(StoreError::Malformed(_))));
    }

    #[test]
    fn snapshot_uses_camel_case_field_names() {
        let store = MemoryStore::new();
        store.save(&[item(Metal::Gold, 10, 1)]).unwrap();

        let raw = store.raw().unwrap();
        assert!(raw.contains("\"metal\":\"gold\""));
        assert!(raw.contains("\"weightGrams\":10"));
        assert!(raw.contains("\"pricePerGramAtAddTime\""));
    }
}
