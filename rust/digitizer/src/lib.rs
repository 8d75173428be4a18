// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Interactive floor plan digitizing
//!
//! This crate turns operator clicks over a rendered floor plan page into:
//! 1. Closed room polygons, snapped onto each other's vertices and walls
//! 2. Real-world lengths and areas from a calibrated scale factor
//! 3. Apartment outlines from groups of adjacent rooms (shared walls removed)
//! 4. A bill-of-materials JSON with one wall panel per room segment
//!
//! # Usage
//!
//! ```rust,ignore
//! use floorplan_digitizer::{ClickOutcome, FloorplanSession, Point2D, SourceImage};
//!
//! let mut session = FloorplanSession::default();
//! let page = SourceImage::from_rgba(w, h, rgba)?;
//! session.load_background(Some("level_1.pdf".into()), page);
//! session.arm_drawing()?;
//!
//! if let ClickOutcome::Prompt(prompt) = session.click(Point2D::new(120.0, 80.0), false)? {
//!     // ask the operator, then answer by ticket
//! }
//!
//! let bom = session.export_bom()?.to_pretty_json()?;
//! ```

pub mod config;
pub mod editor;
pub mod error;
pub mod export;
pub mod grouping;
pub mod metrics;
pub mod persistence;
pub mod preprocess;
pub mod session;
pub mod snap;
pub mod transform;
pub mod types;

// Re-export commonly used types and functions
pub use config::{DigitizerConfig, Features};
pub use editor::{
    CalibrationOutcome, ClickOutcome, EditorState, PolylineEditor, Preview, PromptKind,
    PromptRequest, PromptTicket,
};
pub use error::{Error, Result};
pub use export::{bom_file_name, BomDocument};
pub use grouping::group_rooms;
pub use metrics::{polygon_area, real_area, real_length, ScaleFactor};
pub use persistence::{FileStore, KeyValueStore, MemoryStore, SNAPSHOT_KEY};
pub use preprocess::{PreprocessStage, SourceImage};
pub use session::{
    ApartmentSummary, BackgroundInfo, ClosureOutcome, FloorplanSession, InteractionMode,
    RoomSummary, SessionState, StoryHeight,
};
pub use snap::is_closing;
pub use transform::{to_drawing_space, to_screen_space, ViewState};
pub use types::{
    Apartment, ApartmentBoundary, ApartmentId, BoundaryStatus, Point2D, Room, RoomId, RoomTag,
    RoomType,
};
