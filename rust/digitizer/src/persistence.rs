// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Local snapshot of drawn rooms.
//!
//! The snapshot is a JSON array of `{points: [{x, y}], roomType}` stored
//! under one key. Only rooms are kept; tags are rebuilt from the rooms on
//! restore and apartments have to be grouped again.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::{Point2D, Room, RoomType};

/// Key the room snapshot is stored under
pub const SNAPSHOT_KEY: &str = "savedPolylines";

/// One persisted room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomRecord {
    pub points: Vec<Point2D>,
    #[serde(rename = "roomType")]
    pub room_type: RoomType,
}

impl From<&Room> for RoomRecord {
    fn from(room: &Room) -> Self {
        Self {
            points: room.points.clone(),
            room_type: room.room_type.clone(),
        }
    }
}

impl RoomRecord {
    /// Whether the ring can become a room: closed, with at least 3 vertices
    pub fn is_valid_ring(&self) -> bool {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => self.points.len() >= 4 && first.same_as(last),
            _ => false,
        }
    }
}

/// Serialize rooms into snapshot JSON
pub fn encode_snapshot(rooms: &[Room]) -> Result<String> {
    let records: Vec<RoomRecord> = rooms.iter().map(RoomRecord::from).collect();
    Ok(serde_json::to_string(&records)?)
}

/// Parse snapshot JSON, dropping records that are not closed rings
pub fn decode_snapshot(json: &str) -> Result<Vec<RoomRecord>> {
    let records: Vec<RoomRecord> = serde_json::from_str(json)?;
    let total = records.len();
    let valid: Vec<RoomRecord> = records.into_iter().filter(RoomRecord::is_valid_ring).collect();
    if valid.len() != total {
        tracing::warn!(
            skipped = total - valid.len(),
            kept = valid.len(),
            "Snapshot contained rings that are not closed"
        );
    }
    Ok(valid)
}

/// String key/value storage for snapshots
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// In-process store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: FxHashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Content-addressed disk store (a `cacache` directory)
///
/// The same layout the server keeps its snapshots in, so a store directory
/// can be shared between the CLI and the server.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) a store directory
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match cacache::read_sync(&self.dir, key) {
            Ok(data) => String::from_utf8(data)
                .map(Some)
                .map_err(|e| Error::Serialization(e.to_string())),
            Err(cacache::Error::EntryNotFound(_, _)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        cacache::write_sync(&self.dir, key, value.as_bytes())?;
        tracing::debug!(key, dir = %self.dir.display(), size = value.len(), "Wrote snapshot");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RoomId;

    fn triangle(room_type: RoomType) -> Room {
        Room {
            id: RoomId(7),
            points: vec![
                Point2D::new(0.1, 0.2),
                Point2D::new(123.456789012345, 0.2),
                Point2D::new(1.0 / 3.0, 98.7654321),
                Point2D::new(0.1, 0.2),
            ],
            room_type,
        }
    }

    #[test]
    fn snapshot_uses_camel_case_room_type() {
        let json = encode_snapshot(&[triangle(RoomType::Kitchen)]).unwrap();
        assert!(json.contains("\"roomType\":\"kitchen\""));
        assert!(json.contains("\"points\":[{\"x\":0.1,\"y\":0.2}"));
    }

    #[test]
    fn snapshot_round_trips_exactly() {
        let rooms = vec![
            triangle(RoomType::Bathroom),
            triangle(RoomType::Other("Loggia".into())),
        ];
        let decoded = decode_snapshot(&encode_snapshot(&rooms).unwrap()).unwrap();
        assert_eq!(decoded.len(), 2);
        for (record, room) in decoded.iter().zip(&rooms) {
            assert_eq!(record.points, room.points);
            assert_eq!(record.room_type, room.room_type);
        }
    }

    #[test]
    fn open_rings_are_dropped_on_decode() {
        let json = r#"[
            {"points":[{"x":0,"y":0},{"x":1,"y":0}],"roomType":"core"},
            {"points":[{"x":0,"y":0},{"x":1,"y":0},{"x":1,"y":1},{"x":0,"y":0}],"roomType":"core"}
        ]"#;
        let records = decode_snapshot(json).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].room_type, RoomType::Core);
    }

    #[test]
    fn malformed_json_is_a_serialization_error() {
        assert!(matches!(
            decode_snapshot("{not json"),
            Err(crate::Error::Serialization(_))
        ));
    }

    #[test]
    fn memory_store_get_and_set() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get(SNAPSHOT_KEY).unwrap(), None);
        store.set(SNAPSHOT_KEY, "[]").unwrap();
        assert_eq!(store.get(SNAPSHOT_KEY).unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::open(dir.path()).unwrap();
        assert_eq!(store.get("savedPolylines:abc").unwrap(), None);
        store.set("savedPolylines:abc", "[1]").unwrap();

        let reopened = FileStore::open(dir.path()).unwrap();
        assert_eq!(reopened.get("savedPolylines:abc").unwrap().as_deref(), Some("[1]"));
    }

    #[test]
    fn file_store_keys_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::open(dir.path()).unwrap();
        store.set("a:b", "colon").unwrap();
        store.set("a_b", "underscore").unwrap();
        assert_eq!(store.get("a:b").unwrap().as_deref(), Some("colon"));
        assert_eq!(store.get("a_b").unwrap().as_deref(), Some("underscore"));

        store.set("a:b", "replaced").unwrap();
        assert_eq!(store.get("a:b").unwrap().as_deref(), Some("replaced"));
    }
}
