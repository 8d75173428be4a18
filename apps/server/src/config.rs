// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Server configuration loaded from environment variables.

use floorplan_digitizer::DigitizerConfig;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port to listen on.
    pub port: u16,
    /// Directory for snapshot storage.
    pub cache_dir: String,
    /// Maximum background upload size in MB.
    pub max_upload_mb: usize,
    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Seconds a session may sit unused before it is evicted.
    pub session_ttl_secs: u64,
    /// Most sessions kept at once; the least recently used goes first.
    pub max_sessions: usize,
    /// Allowed CORS origins (comma-separated, or "*" for all).
    pub cors_origins: Vec<String>,
    /// Settings every new session starts with.
    pub digitizer: DigitizerConfig,
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_flag(name: &str) -> bool {
    matches!(
        std::env::var(name).as_deref().map(str::trim),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = DigitizerConfig::default();
        let mut digitizer = DigitizerConfig {
            snap_radius: env_or("SNAP_RADIUS", defaults.snap_radius),
            default_story_height: env_or("DEFAULT_STORY_HEIGHT", defaults.default_story_height),
            ..defaults
        };
        if !(digitizer.snap_radius.is_finite() && digitizer.snap_radius > 0.0) {
            digitizer.snap_radius = DigitizerConfig::default().snap_radius;
        }
        if !(digitizer.default_story_height.is_finite() && digitizer.default_story_height > 0.0) {
            digitizer.default_story_height = DigitizerConfig::default().default_story_height;
        }
        digitizer.features.apartment_grouping = !env_flag("DISABLE_APARTMENTS");
        digitizer.features.grid_overlay = !env_flag("DISABLE_GRID");
        digitizer.features.image_preprocessing = !env_flag("DISABLE_PREPROCESSING");

        Self {
            port: env_or("PORT", 8080),
            cache_dir: std::env::var("CACHE_DIR").unwrap_or_else(|_| {
                std::env::current_dir()
                    .ok()
                    .and_then(|dir| dir.join(".cache").to_str().map(|s| s.to_string()))
                    .unwrap_or_else(|| "./.cache".into())
            }),
            max_upload_mb: env_or("MAX_UPLOAD_MB", 50),
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", 60),
            session_ttl_secs: env_or("SESSION_TTL_SECS", 3600),
            max_sessions: env_or("MAX_SESSIONS", 64),
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| {
                    // Default: the digitizer page served by common dev servers
                    "http://localhost:3000,http://localhost:5173,http://127.0.0.1:3000,http://127.0.0.1:5173".into()
                })
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            digitizer,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
