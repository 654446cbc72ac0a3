//! Ledger persistence
//!
//! The whole `LedgerState` is written as one JSON document on every mutation.
//! Loading overlays the stored document on the default state key by key, so
//! fields added in newer versions fall back to their defaults and keys the
//! current version no longer knows are dropped.

use crate::ledger::error::{LedgerError, LedgerResult};
use crate::ledger::types::LedgerState;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Storage port for the persisted ledger document
pub trait LedgerStore: Send + Sync {
    /// Load the raw stored document, `None` if nothing was saved yet
    fn load(&self) -> LedgerResult<Option<Value>>;

    /// Replace the stored document with `state`
    fn save(&self, state: &LedgerState) -> LedgerResult<()>;
}

/// Stores the ledger as a single pretty-printed JSON file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl LedgerStore for JsonFileStore {
    fn load(&self) -> LedgerResult<Option<Value>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path)?;
        let value: Value = serde_json::from_str(&content)?;
        Ok(Some(value))
    }

    fn save(&self, state: &LedgerState) -> LedgerResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        // Write-then-rename so readers never observe a half-written document
        let content = serde_json::to_string_pretty(state)?;
        let temp = self.temp_path();
        std::fs::write(&temp, content)?;
        std::fs::rename(&temp, &self.path)?;
        Ok(())
    }
}

/// In-memory store, shared between clones
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    document: Arc<Mutex<Option<Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a raw document
    pub fn with_document(document: Value) -> Self {
        Self {
            document: Arc::new(Mutex::new(Some(document))),
        }
    }

    /// Last document written (or seeded)
    pub fn document(&self) -> Option<Value> {
        self.document
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl LedgerStore for MemoryStore {
    fn load(&self) -> LedgerResult<Option<Value>> {
        Ok(self.document())
    }

    fn save(&self, state: &LedgerState) -> LedgerResult<()> {
        let value = serde_json::to_value(state)?;
        *self.document.lock().unwrap_or_else(|e| e.into_inner()) = Some(value);
        Ok(())
    }
}

/// Overlay a stored document on `defaults`, key by key
///
/// Any key present in `stored` wins; any key missing keeps its default.
/// A document that is not a JSON object, or whose merged form no longer
/// deserializes, is rejected so the caller can fall back to defaults.
pub fn merge_with_defaults(defaults: &LedgerState, stored: Value) -> LedgerResult<LedgerState> {
    let Value::Object(stored) = stored else {
        return Err(LedgerError::Serialization(
            "ledger document is not a JSON object".to_string(),
        ));
    };

    let mut merged = serde_json::to_value(defaults)?;
    if let Value::Object(ref mut fields) = merged {
        for (key, value) in stored {
            fields.insert(key, value);
        }
    }

    Ok(serde_json::from_value(merged)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::types::Goal;
    use chrono::NaiveDate;
    use serde_json::json;
    use tempfile::tempdir;

    fn defaults() -> LedgerState {
        LedgerState::with_defaults(NaiveDate::from_ymd_opt(2026, 3, 2).unwrap())
    }

    #[test]
    fn test_file_store_missing_file() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("user_data.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested").join("user_data.json"));

        let mut state = defaults();
        state.name = "Ada".to_string();
        state.today.protein = 42;
        store.save(&state).unwrap();

        let loaded = store.load().unwrap().unwrap();
        let merged = merge_with_defaults(&defaults(), loaded).unwrap();
        assert_eq!(merged, state);
        assert!(!store.temp_path().exists());
    }

    #[test]
    fn test_file_store_malformed_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("user_data.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = JsonFileStore::new(path);
        assert!(matches!(store.load(), Err(LedgerError::Serialization(_))));
    }

    #[test]
    fn test_merge_fills_missing_fields() {
        // A document written before recovery mode existed
        let stored = json!({
            "name": "Sam",
            "location": "Lisbon",
            "consumed": 1200,
            "current_date": "2026-03-01",
            "goal": "\u{1F525} Lose Fat"
        });

        let state = merge_with_defaults(&defaults(), stored).unwrap();
        assert_eq!(state.name, "Sam");
        assert_eq!(state.today.consumed, 1200);
        assert_eq!(state.goal, Goal::LoseFat);
        assert!(!state.recovery_mode);
        assert_eq!(state.active_strain, "");
        assert_eq!(state.target, 2200);
        assert_eq!(
            state.current_date,
            Some(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap())
        );
    }

    #[test]
    fn test_merge_drops_unknown_fields() {
        let stored = json!({
            "name": "Sam",
            "favourite_colour": "teal",
            "legacy_streak": 12
        });

        let state = merge_with_defaults(&defaults(), stored).unwrap();
        assert_eq!(state.name, "Sam");

        let saved = serde_json::to_value(&state).unwrap();
        assert!(saved.get("favourite_colour").is_none());
        assert!(saved.get("legacy_streak").is_none());
    }

    #[test]
    fn test_merge_rejects_non_object() {
        assert!(merge_with_defaults(&defaults(), json!([1, 2, 3])).is_err());
        assert!(merge_with_defaults(&defaults(), json!({"consumed": "lots"})).is_err());
    }

    #[test]
    fn test_memory_store_shares_document() {
        let store = MemoryStore::new();
        let handle = store.clone();
        store.save(&defaults()).unwrap();
        assert_eq!(handle.document().unwrap()["target"], 2200);
    }
}
