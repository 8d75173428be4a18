// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for digitizing operations.
//!
//! None of these leave the session in a partially mutated state: an
//! operation that returns an error has not changed rooms, tags or
//! apartments.

use crate::editor::PromptTicket;
use crate::types::RoomId;

/// Result type alias for digitizer operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while digitizing a floor plan.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Operator-entered distance is not a positive number.
    #[error("invalid distance {0:?}: expected a positive number")]
    InvalidDistance(String),

    /// Grid unit size outside the accepted range.
    #[error("grid unit size {0} is outside {}..={} pixels", crate::transform::MIN_GRID_UNIT, crate::transform::MAX_GRID_UNIT)]
    GridSizeOutOfRange(u32),

    /// Zoom request that cannot be clamped (NaN or infinite).
    #[error("invalid zoom value {0}")]
    InvalidZoom(f64),

    /// No background page has been loaded yet.
    #[error("no background page loaded")]
    NoBackground,

    /// A drawing click arrived while drawing mode is not armed.
    #[error("drawing mode is not active")]
    DrawingNotArmed,

    /// Drawing mode was armed twice.
    #[error("drawing mode is already active")]
    AlreadyDrawing,

    /// The view is locked while drawing mode is active.
    #[error("view is locked while drawing mode is active")]
    DrawingActive,

    /// Drawing input is suppressed until an operator prompt is answered.
    #[error("waiting for the answer to prompt {0}")]
    PromptPending(PromptTicket),

    /// An answer arrived for a prompt that is not outstanding.
    #[error("prompt {0} is not outstanding")]
    UnknownPrompt(PromptTicket),

    /// The operation requires rooms but none exist.
    #[error("no rooms available")]
    NoRooms,

    /// No room with this id exists.
    #[error("unknown room {0}")]
    UnknownRoom(RoomId),

    /// Grouping was requested with no tags selected.
    #[error("no rooms selected to define an apartment")]
    NothingSelected,

    /// Tag selection happens outside apartment selection mode.
    #[error("apartment selection mode is not active")]
    NotSelectingApartment,

    /// Export requires a calibrated scale factor.
    #[error("scale factor is not set; draw and calibrate the first segment before exporting")]
    ScaleNotSet,

    /// An optional pipeline stage is switched off in the configuration.
    #[error("{0} is disabled")]
    FeatureDisabled(&'static str),

    /// No snapshot is stored under the key.
    #[error("no saved rooms under key {0:?}")]
    SnapshotNotFound(String),

    /// Pixel buffer does not match the declared dimensions.
    #[error("pixel buffer of {actual} bytes does not match {width}x{height} RGBA")]
    InvalidImage { width: u32, height: u32, actual: usize },

    /// The uploaded page could not be decoded.
    #[error("failed to decode background image: {0}")]
    ImageDecode(String),

    /// Snapshot store failure.
    #[error("snapshot store error: {0}")]
    Store(String),

    /// Snapshot store I/O failure.
    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::ImageDecode(err.to_string())
    }
}

impl From<cacache::Error> for Error {
    fn from(err: cacache::Error) -> Self {
        Error::Store(err.to_string())
    }
}
