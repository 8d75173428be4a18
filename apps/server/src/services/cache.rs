// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Disk-based snapshot store using cacache.

use crate::error::ApiError;
use floorplan_digitizer::SNAPSHOT_KEY;
use std::path::PathBuf;
use uuid::Uuid;

/// Room snapshots keyed by session.
#[derive(Debug, Clone)]
pub struct SnapshotCache {
    cache_dir: PathBuf,
}

impl SnapshotCache {
    /// Create a new store in the specified directory.
    pub async fn new(cache_dir: &str) -> Self {
        let path = PathBuf::from(cache_dir);

        if let Err(e) = tokio::fs::create_dir_all(&path).await {
            tracing::warn!(
                error = %e,
                path = %path.display(),
                "Failed to create cache directory"
            );
        }

        Self { cache_dir: path }
    }

    /// Storage key of a session's snapshot.
    pub fn key_for(session: &Uuid) -> String {
        format!("{}:{}", SNAPSHOT_KEY, session)
    }

    /// Get the snapshot JSON stored under a key.
    pub async fn get(&self, key: &str) -> Result<Option<String>, ApiError> {
        match cacache::read(&self.cache_dir, key).await {
            Ok(data) => String::from_utf8(data)
                .map(Some)
                .map_err(|e| ApiError::Cache(e.to_string())),
            Err(cacache::Error::EntryNotFound(_, _)) => Ok(None),
            Err(e) => Err(ApiError::Cache(e.to_string())),
        }
    }

    /// Store snapshot JSON under a key, replacing any previous one.
    pub async fn set(&self, key: &str, json: &str) -> Result<(), ApiError> {
        cacache::write(&self.cache_dir, key, json.as_bytes()).await?;
        tracing::debug!(key = %key, size = json.len(), "Stored snapshot");
        Ok(())
    }

    /// Remove a stored snapshot.
    pub async fn remove(&self, key: &str) -> Result<(), ApiError> {
        cacache::remove(&self.cache_dir, key).await?;
        Ok(())
    }
}
