//! Persistence for the room list.
//!
//! The whole list lives in one storage slot and is rewritten on every change.
//! Loading never fails: a missing or unreadable slot starts empty, and
//! individual rooms that no longer parse are skipped with a warning.

use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use parking_lot::Mutex;
use tokio::{sync::watch, task::JoinHandle};

use crate::models::Room;

// Versioned slot name; bump when the persisted shape changes
pub const STORAGE_KEY: &str = "Z_STATION_MANAGER_DATA_V4";
pub const DEFAULT_DATA_FILE: &str = "data/station_manager_data_v4.json";

/// Where the board loads from at boot and saves to after each mutation.
///
/// `save` is fire-and-forget: implementations log failures instead of
/// returning them, so the in-memory board is never affected by storage.
pub trait Persistence: Send + Sync {
    fn load(&self) -> Vec<Room>;
    fn save(&self, rooms: &[Room]);
}

/// Parse a serialized slot.
///
/// Anything that is not a JSON array yields an empty list. Inside an array,
/// each room is read on its own and unreadable entries are skipped, so one
/// bad record never costs the rest of the board.
pub fn parse_rooms(text: &str) -> Vec<Room> {
    let entries: Vec<serde_json::Value> = match serde_json::from_str(text) {
        Ok(serde_json::Value::Array(entries)) => entries,
        Ok(_) => {
            tracing::warn!("stored rooms are not an array, starting empty");
            return Vec::new();
        }
        Err(e) => {
            tracing::warn!("stored rooms are not valid JSON, starting empty: {}", e);
            return Vec::new();
        }
    };

    entries
        .into_iter()
        .enumerate()
        .filter_map(|(idx, entry)| match serde_json::from_value::<Room>(entry) {
            Ok(room) => Some(room),
            Err(e) => {
                tracing::warn!("skipping stored room at index {}: {}", idx, e);
                None
            }
        })
        .collect()
}

// -----------------------------
// JSON file slot
// -----------------------------

#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the full list through a temp file so a crash never leaves a half-written slot.
    pub fn write(&self, rooms: &[Room]) -> io::Result<()> {
        let tmp_path = self.path.with_extension("json.tmp");
        let text = serde_json::to_string_pretty(rooms)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        fs::write(&tmp_path, text)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl Persistence for JsonFileStorage {
    fn load(&self) -> Vec<Room> {
        match fs::read_to_string(&self.path) {
            Ok(text) => parse_rooms(&text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!("no saved rooms at {}, starting empty", self.path.display());
                Vec::new()
            }
            Err(e) => {
                tracing::warn!("failed to read {}: {}", self.path.display(), e);
                Vec::new()
            }
        }
    }

    fn save(&self, rooms: &[Room]) {
        if let Err(e) = self.write(rooms) {
            tracing::error!("failed to save rooms to {}: {}", self.path.display(), e);
        }
    }
}

// -----------------------------
// Background writer
// -----------------------------

/// Hands snapshots to a tokio task that writes them to a [`JsonFileStorage`].
///
/// Only the newest snapshot is kept, so a burst of mutations coalesces into
/// fewer writes. Dropping the saver lets the writer flush the last snapshot
/// and exit; await the returned handle to wait for that.
pub struct BackgroundSaver {
    storage: Arc<JsonFileStorage>,
    tx: watch::Sender<Option<Vec<Room>>>,
}

impl BackgroundSaver {
    pub fn spawn(storage: JsonFileStorage) -> (Self, JoinHandle<()>) {
        let storage = Arc::new(storage);
        let (tx, mut rx) = watch::channel::<Option<Vec<Room>>>(None);
        let writer = Arc::clone(&storage);

        let handle = tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let snapshot = rx.borrow_and_update().clone();
                let Some(rooms) = snapshot else {
                    continue;
                };
                let storage = Arc::clone(&writer);
                match tokio::task::spawn_blocking(move || storage.write(&rooms)).await {
                    Ok(Ok(())) => tracing::debug!("rooms saved to {}", writer.path().display()),
                    Ok(Err(e)) => {
                        tracing::error!("failed to save rooms to {}: {}", writer.path().display(), e)
                    }
                    Err(e) => tracing::error!("save task panicked: {}", e),
                }
            }
            tracing::debug!("background saver stopped");
        });

        (Self { storage, tx }, handle)
    }
}

impl Persistence for BackgroundSaver {
    fn load(&self) -> Vec<Room> {
        self.storage.load()
    }

    fn save(&self, rooms: &[Room]) {
        self.tx.send_replace(Some(rooms.to_vec()));
    }
}

// -----------------------------
// In-process slot
// -----------------------------

/// A storage slot held in memory. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slot: Arc<Mutex<Option<String>>>,
    saves: Arc<AtomicUsize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from raw slot contents, valid or not.
    pub fn with_contents(text: impl Into<String>) -> Self {
        let storage = Self::default();
        *storage.slot.lock() = Some(text.into());
        storage
    }

    pub fn contents(&self) -> Option<String> {
        self.slot.lock().clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl Persistence for MemoryStorage {
    fn load(&self) -> Vec<Room> {
        self.slot.lock().as_deref().map(parse_rooms).unwrap_or_default()
    }

    fn save(&self, rooms: &[Room]) {
        match serde_json::to_string(rooms) {
            Ok(text) => {
                *self.slot.lock() = Some(text);
                self.saves.fetch_add(1, Ordering::SeqCst);
            }
            Err(e) => tracing::error!("failed to serialize rooms: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn non_array_slot_loads_empty() {
        assert!(parse_rooms(r#""not an array""#).is_empty());
        assert!(parse_rooms("not an array").is_empty());
        assert!(parse_rooms(r#"{"rooms": []}"#).is_empty());
    }

    #[test]
    fn malformed_room_entries_are_skipped() {
        assert!(parse_rooms(r#"[{"roomNumber": 5}]"#).is_empty());
    }

    #[test]
    fn one_bad_room_does_not_cost_the_others() {
        let slot = r#"[
            {"id": "a", "roomNumber": "101", "lastUpdated": "2024-05-01T08:00:00Z"},
            {"id": "b", "roomNumber": "102", "monitoring": "Q4", "lastUpdated": "2024-05-01T08:00:00Z"},
            {"id": "c", "roomNumber": "103"},
            {"id": "d", "roomNumber": "104", "lastUpdated": "yesterday"},
            {"id": "e", "roomNumber": "105", "lastUpdated": "2024-05-01T09:00:00Z"}
        ]"#;
        let numbers: Vec<String> = parse_rooms(slot).into_iter().map(|r| r.room_number).collect();
        assert_eq!(numbers, vec!["101", "105"]);
    }

    #[test]
    fn next_save_keeps_rooms_that_loaded() {
        let storage = MemoryStorage::with_contents(
            r#"[
                {"id": "a", "roomNumber": "101", "lastUpdated": "2024-05-01T08:00:00Z"},
                {"id": "b", "roomNumber": "102", "monitoring": "Q4", "lastUpdated": "2024-05-01T08:00:00Z"}
            ]"#,
        );
        let mut board = crate::board::RoomBoard::load(Box::new(storage.clone()));
        assert_eq!(board.rooms().len(), 1);

        board.create_room("205").unwrap();
        let numbers: Vec<String> = storage.load().into_iter().map(|r| r.room_number).collect();
        assert_eq!(numbers, vec!["101", "205"]);
    }

    #[test]
    fn memory_slot_round_trips_rooms() {
        let storage = MemoryStorage::new();
        assert!(storage.load().is_empty());

        storage.save(&[Room::new("101", Utc::now())]);
        let loaded = storage.load();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].room_number, "101");
        assert_eq!(storage.save_count(), 1);
    }

    #[test]
    fn memory_clones_share_the_slot() {
        let storage = MemoryStorage::new();
        let view = storage.clone();
        storage.save(&[Room::new("7", Utc::now())]);
        assert!(view.contents().is_some());
        assert_eq!(view.save_count(), 1);
    }
}
