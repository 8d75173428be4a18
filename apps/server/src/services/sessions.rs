// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Registry of live digitizing sessions.
//!
//! Each session sits behind its own mutex, so requests against one session
//! are applied strictly one after another while other sessions proceed.
//! Sessions idle for longer than the TTL are evicted, and creating a session
//! at capacity drops the least recently used one.

use crate::error::ApiError;
use floorplan_digitizer::{DigitizerConfig, FloorplanSession};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

/// Shared handle to one session.
pub type SessionHandle = Arc<Mutex<FloorplanSession>>;

#[derive(Debug)]
struct SessionEntry {
    handle: SessionHandle,
    last_seen: Instant,
}

/// All sessions of this server process.
#[derive(Debug, Clone)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<FxHashMap<Uuid, SessionEntry>>>,
    config: Arc<DigitizerConfig>,
    ttl: Duration,
    max_sessions: usize,
}

impl SessionRegistry {
    pub fn new(config: DigitizerConfig, ttl: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(FxHashMap::default())),
            config: Arc::new(config),
            ttl,
            max_sessions: max_sessions.max(1),
        }
    }

    /// Start a new session with the server's digitizer settings.
    pub async fn create(&self) -> Uuid {
        let id = Uuid::new_v4();
        let session = FloorplanSession::new((*self.config).clone());
        let mut sessions = self.sessions.write().await;

        while sessions.len() >= self.max_sessions {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, entry)| entry.last_seen)
                .map(|(id, _)| *id);
            let Some(oldest) = oldest else { break };
            sessions.remove(&oldest);
            tracing::info!(session = %oldest, "Evicted least recently used session");
        }

        sessions.insert(
            id,
            SessionEntry {
                handle: Arc::new(Mutex::new(session)),
                last_seen: Instant::now(),
            },
        );
        tracing::info!(session = %id, "Created session");
        id
    }

    /// Look up a session by id and mark it as used.
    pub async fn get(&self, id: &Uuid) -> Result<SessionHandle, ApiError> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions
            .get_mut(id)
            .ok_or_else(|| ApiError::SessionNotFound(id.to_string()))?;
        entry.last_seen = Instant::now();
        Ok(entry.handle.clone())
    }

    /// End a session; returns whether it existed.
    pub async fn remove(&self, id: &Uuid) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            tracing::info!(session = %id, "Closed session");
        }
        removed
    }

    /// Drop every session not used within the TTL; returns how many went.
    pub async fn evict_idle(&self) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| now.duration_since(entry.last_seen) < self.ttl);
        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::info!(evicted, remaining = sessions.len(), "Evicted idle sessions");
        }
        evicted
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
