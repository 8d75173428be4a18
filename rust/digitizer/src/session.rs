// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Digitizing session: the one owner of all drawing state.
//!
//! Rooms, tags, apartments, the scale factor, the view and the open
//! polyline live in a [`FloorplanSession`]. Every operation takes the
//! session by reference and either succeeds completely or returns an error
//! with the session untouched. Accessors hand out owned copies.

use serde::{Deserialize, Serialize};

use crate::config::DigitizerConfig;
use crate::editor::{
    CalibrationOutcome, ClickOutcome, EditContext, EditorState, PolylineEditor, Preview,
    PromptRequest, PromptTicket,
};
use crate::error::{Error, Result};
use crate::export::{self, BomDocument, PanelSpec};
use crate::grouping;
use crate::metrics::{self, ScaleFactor};
use crate::persistence::{self, KeyValueStore, SNAPSHOT_KEY};
use crate::preprocess::{self, SourceImage};
use crate::transform::{self, GridLine, ViewState};
use crate::types::{
    Apartment, ApartmentId, BoundaryStatus, Point2D, Room, RoomId, RoomTag, RoomType,
};

/// What pointer input currently does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionMode {
    /// Pan and zoom the page
    #[default]
    Navigate,
    /// Clicks add polyline points; the view is locked
    Drawing,
    /// Clicks toggle room tags
    ApartmentSelection,
}

/// Loaded page description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundInfo {
    pub name: Option<String>,
    pub width: u32,
    pub height: u32,
    pub preprocessed: bool,
}

#[derive(Debug, Clone)]
struct Background {
    name: Option<String>,
    image: SourceImage,
    preprocessed: bool,
}

impl Background {
    fn info(&self) -> BackgroundInfo {
        BackgroundInfo {
            name: self.name.clone(),
            width: self.image.width(),
            height: self.image.height(),
            preprocessed: self.preprocessed,
        }
    }
}

/// Story height after interpreting operator input
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StoryHeight {
    pub value: f64,
    /// The input was rejected and the default applied
    pub defaulted: bool,
}

/// Result of answering a closure prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ClosureOutcome {
    Kept { room: RoomId },
    Discarded,
}

/// Sidebar entry of one room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSummary {
    pub id: RoomId,
    pub room_type: RoomType,
    pub apartment: Option<ApartmentId>,
    pub segment_lengths: Vec<f64>,
    pub perimeter: f64,
    pub area: f64,
}

/// Sidebar entry of one apartment outline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApartmentSummary {
    pub id: ApartmentId,
    pub label: String,
    pub room_types: String,
    pub members: Vec<RoomId>,
    pub status: BoundaryStatus,
    pub segment_lengths: Vec<f64>,
    pub area: f64,
}

/// Everything a front end needs to redraw
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub mode: InteractionMode,
    pub editor: EditorState,
    pub open_polyline: Vec<Point2D>,
    pub pending_prompt: Option<PromptRequest>,
    pub room_type: RoomType,
    pub scale: Option<ScaleFactor>,
    pub story_height: f64,
    pub view: ViewState,
    pub background: Option<BackgroundInfo>,
    pub rooms: Vec<Room>,
    pub tags: Vec<RoomTag>,
    pub apartments: Vec<Apartment>,
    pub room_summaries: Vec<RoomSummary>,
    pub apartment_summaries: Vec<ApartmentSummary>,
}

fn edit_context<'a>(
    rooms: &'a [Room],
    view: &ViewState,
    config: &DigitizerConfig,
    needs_calibration: bool,
) -> EditContext<'a> {
    EditContext {
        rooms,
        vertex_tolerance: view.screen_tolerance(config.snap_radius),
        segment_tolerance: view.screen_tolerance(config.segment_snap_radius),
        needs_calibration,
    }
}

/// A floor plan being digitized
#[derive(Debug, Clone)]
pub struct FloorplanSession {
    config: DigitizerConfig,
    background: Option<Background>,
    story_height: f64,
    view: ViewState,
    mode: InteractionMode,
    room_type: RoomType,
    editor: PolylineEditor,
    rooms: Vec<Room>,
    tags: Vec<RoomTag>,
    apartments: Vec<Apartment>,
    scale: Option<ScaleFactor>,
    next_room_id: u64,
    next_apartment: u32,
}

impl Default for FloorplanSession {
    fn default() -> Self {
        Self::new(DigitizerConfig::default())
    }
}

impl FloorplanSession {
    pub fn new(config: DigitizerConfig) -> Self {
        Self {
            story_height: config.default_story_height,
            view: ViewState::new(config.default_grid_unit_size),
            config,
            background: None,
            mode: InteractionMode::Navigate,
            room_type: RoomType::default(),
            editor: PolylineEditor::new(),
            rooms: Vec::new(),
            tags: Vec::new(),
            apartments: Vec::new(),
            scale: None,
            next_room_id: 1,
            next_apartment: 1,
        }
    }

    // ----- accessors -----

    pub fn config(&self) -> &DigitizerConfig {
        &self.config
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn editor_state(&self) -> EditorState {
        self.editor.state()
    }

    pub fn open_polyline(&self) -> Vec<Point2D> {
        self.editor.points().to_vec()
    }

    pub fn pending_prompt(&self) -> Option<PromptRequest> {
        self.editor.pending_prompt()
    }

    pub fn room_type(&self) -> RoomType {
        self.room_type.clone()
    }

    pub fn scale(&self) -> Option<ScaleFactor> {
        self.scale
    }

    pub fn story_height(&self) -> f64 {
        self.story_height
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn background(&self) -> Option<BackgroundInfo> {
        self.background.as_ref().map(Background::info)
    }

    /// Pixels of the (possibly preprocessed) page
    pub fn background_image(&self) -> Option<&SourceImage> {
        self.background.as_ref().map(|b| &b.image)
    }

    pub fn rooms(&self) -> Vec<Room> {
        self.rooms.clone()
    }

    pub fn tags(&self) -> Vec<RoomTag> {
        self.tags.clone()
    }

    pub fn apartments(&self) -> Vec<Apartment> {
        self.apartments.clone()
    }

    pub fn state(&self) -> SessionState {
        SessionState {
            mode: self.mode,
            editor: self.editor.state(),
            open_polyline: self.open_polyline(),
            pending_prompt: self.pending_prompt(),
            room_type: self.room_type(),
            scale: self.scale,
            story_height: self.story_height,
            view: self.view,
            background: self.background(),
            rooms: self.rooms(),
            tags: self.tags(),
            apartments: self.apartments(),
            room_summaries: self.room_summaries(),
            apartment_summaries: self.apartment_summaries(),
        }
    }

    fn apartment_of(&self, room: RoomId) -> Option<ApartmentId> {
        self.tags
            .iter()
            .find(|t| t.room == room)
            .and_then(|t| t.apartment)
    }

    // ----- document lifecycle -----

    /// Use a rendered page as the background; the view returns to its origin
    ///
    /// Replaces the page outright: an open polyline and any outstanding
    /// prompt are dropped.
    pub fn load_background(&mut self, name: Option<String>, image: SourceImage) -> BackgroundInfo {
        let preprocessed = self.config.features.image_preprocessing && !self.config.preprocessing.is_empty();
        let image = if preprocessed {
            preprocess::preprocess(&image, &self.config.preprocessing)
        } else {
            image
        };

        self.editor.reset();
        self.mode = InteractionMode::Navigate;
        self.view.reset();
        let background = Background {
            name,
            image,
            preprocessed,
        };
        let info = background.info();
        self.background = Some(background);

        tracing::info!(
            name = info.name.as_deref().unwrap_or("-"),
            width = info.width,
            height = info.height,
            preprocessed,
            "Loaded background page"
        );
        info
    }

    /// Interpret operator input as the story height; invalid input applies the default
    pub fn set_story_height(&mut self, input: &str) -> StoryHeight {
        match metrics::parse_positive(input) {
            Some(value) => {
                self.story_height = value;
                StoryHeight {
                    value,
                    defaulted: false,
                }
            }
            None => {
                self.story_height = self.config.default_story_height;
                tracing::warn!(input, fallback = self.story_height, "Invalid story height, using default");
                StoryHeight {
                    value: self.story_height,
                    defaulted: true,
                }
            }
        }
    }

    /// Back to the freshly created state
    ///
    /// Outstanding prompts are dropped. Room ids and prompt tickets keep
    /// counting up, so answers issued before the reset stay stale.
    pub fn clear_document(&mut self) {
        let next_room_id = self.next_room_id;
        let mut editor = std::mem::take(&mut self.editor);
        editor.reset();
        *self = Self::new(self.config.clone());
        self.next_room_id = next_room_id;
        self.editor = editor;
        tracing::info!("Cleared document");
    }

    // ----- drawing -----

    pub fn arm_drawing(&mut self) -> Result<()> {
        if self.background.is_none() {
            return Err(Error::NoBackground);
        }
        if self.mode == InteractionMode::Drawing {
            return Err(Error::AlreadyDrawing);
        }
        self.mode = InteractionMode::Drawing;
        tracing::debug!("Drawing mode armed");
        Ok(())
    }

    /// Leave drawing mode, dropping any open polyline; returns the points dropped
    ///
    /// Refused while a prompt waits for its answer.
    pub fn stop_drawing(&mut self) -> Result<usize> {
        self.ensure_no_prompt()?;
        let dropped = self.editor.points().len();
        self.editor.reset();
        if self.mode == InteractionMode::Drawing {
            self.mode = InteractionMode::Navigate;
        }
        Ok(dropped)
    }

    fn ensure_no_prompt(&self) -> Result<()> {
        match self.editor.pending_prompt() {
            Some(pending) => Err(Error::PromptPending(pending.ticket)),
            None => Ok(()),
        }
    }

    /// Room type given to the next finalized room
    pub fn set_room_type(&mut self, room_type: RoomType) {
        self.room_type = room_type;
    }

    fn ensure_drawing(&self) -> Result<()> {
        if self.background.is_none() {
            return Err(Error::NoBackground);
        }
        if self.mode != InteractionMode::Drawing {
            return Err(Error::DrawingNotArmed);
        }
        Ok(())
    }

    /// Place a point at a screen position; `constrain` is the axis-lock modifier
    pub fn click(&mut self, screen: Point2D, constrain: bool) -> Result<ClickOutcome> {
        self.ensure_drawing()?;
        let point = transform::to_drawing_space(screen, &self.view);
        let ctx = edit_context(&self.rooms, &self.view, &self.config, self.scale.is_none());
        self.editor.place(point, constrain, &ctx)
    }

    /// Snap highlight and rubber band for a pointer at a screen position
    pub fn preview(&self, screen: Point2D, constrain: bool) -> Result<Preview> {
        self.ensure_drawing()?;
        let point = transform::to_drawing_space(screen, &self.view);
        let ctx = edit_context(&self.rooms, &self.view, &self.config, self.scale.is_none());
        Ok(self.editor.preview(point, constrain, &ctx))
    }

    pub fn resolve_calibration(&mut self, ticket: PromptTicket, input: &str) -> Result<CalibrationOutcome> {
        let outcome = self.editor.resolve_calibration(ticket, input)?;
        if let CalibrationOutcome::Calibrated { scale } = &outcome {
            self.scale = Some(*scale);
        }
        Ok(outcome)
    }

    pub fn resolve_closure(&mut self, ticket: PromptTicket, keep: bool) -> Result<ClosureOutcome> {
        match self.editor.resolve_closure(ticket, keep)? {
            Some(ring) => {
                let room_type = self.room_type.clone();
                let id = self.insert_room(ring, room_type);
                tracing::info!(room = %id, room_type = %self.room_type, "Room finalized");
                Ok(ClosureOutcome::Kept { room: id })
            }
            None => {
                tracing::debug!(%ticket, "Closed polyline discarded");
                Ok(ClosureOutcome::Discarded)
            }
        }
    }

    /// Append a closed ring as a room and give it a tag at its centroid
    fn insert_room(&mut self, points: Vec<Point2D>, room_type: RoomType) -> RoomId {
        let id = RoomId(self.next_room_id);
        self.next_room_id += 1;
        self.tags.push(RoomTag {
            room: id,
            position: metrics::centroid(&points),
            room_type: room_type.clone(),
            selected: false,
            apartment: None,
        });
        self.rooms.push(Room {
            id,
            points,
            room_type,
        });
        id
    }

    /// Set the scale directly, e.g. from a known drawing scale
    ///
    /// Refused while a prompt is outstanding, since a calibration answer
    /// would replace it.
    pub fn set_scale(&mut self, scale: ScaleFactor) -> Result<()> {
        self.ensure_no_prompt()?;
        self.scale = Some(scale);
        tracing::info!(scale = scale.value(), "Scale factor set");
        Ok(())
    }

    /// Replace the scale with one measured between two drawing-space points
    ///
    /// Rooms are stored in drawing space, so every length and area is
    /// re-measured with the new factor.
    pub fn recalibrate(&mut self, a: Point2D, b: Point2D, real_length: f64) -> Result<ScaleFactor> {
        self.ensure_no_prompt()?;
        let scale = ScaleFactor::from_calibration(metrics::pixel_distance(&a, &b), real_length)?;
        let previous = self.scale.replace(scale);
        tracing::info!(
            scale = scale.value(),
            previous = ?previous.map(|s| s.value()),
            rooms = self.rooms.len(),
            "Scale factor recalibrated"
        );
        Ok(scale)
    }

    /// Drop the unclosed polyline
    pub fn abandon_polyline(&mut self) -> Result<usize> {
        let dropped = self.editor.abandon()?;
        if dropped > 0 {
            tracing::debug!(points = dropped, "Abandoned open polyline");
        }
        Ok(dropped)
    }

    // ----- view -----

    fn ensure_view_unlocked(&self) -> Result<()> {
        if self.mode == InteractionMode::Drawing {
            return Err(Error::DrawingActive);
        }
        Ok(())
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) -> Result<(f64, f64)> {
        self.ensure_view_unlocked()?;
        self.view.pan_by(dx, dy);
        Ok(self.view.pan())
    }

    pub fn zoom_wheel(&mut self, delta_y: f64) -> Result<f64> {
        self.ensure_view_unlocked()?;
        Ok(self.view.zoom_wheel(delta_y, self.config.zoom_step))
    }

    pub fn set_zoom(&mut self, zoom: f64) -> Result<f64> {
        self.ensure_view_unlocked()?;
        self.view.set_zoom(zoom)
    }

    fn ensure_grid(&self) -> Result<()> {
        if !self.config.features.grid_overlay {
            return Err(Error::FeatureDisabled("grid overlay"));
        }
        Ok(())
    }

    pub fn set_grid_unit_size(&mut self, size: u32) -> Result<()> {
        self.ensure_grid()?;
        self.view.set_grid_unit_size(size)
    }

    /// Grid overlay for a `width` x `height` pixel canvas
    pub fn grid_lines(&self, width: u32, height: u32) -> Result<Vec<GridLine>> {
        self.ensure_grid()?;
        Ok(transform::grid_lines(width, height, self.view.grid_unit_size()))
    }

    // ----- rooms -----

    /// Remove the newest room with its tag and apartment membership
    pub fn remove_last_room(&mut self) -> Result<RoomId> {
        let room = self.rooms.pop().ok_or(Error::NoRooms)?;
        self.tags.retain(|t| t.room != room.id);
        self.detach_from_apartments(&[room.id]);
        tracing::info!(room = %room.id, remaining = self.rooms.len(), "Removed last room");
        Ok(room.id)
    }

    /// Remove every room, tag, apartment and the open polyline
    ///
    /// An outstanding prompt is dropped along with the polyline.
    pub fn clear_rooms(&mut self) {
        self.rooms.clear();
        self.tags.clear();
        self.apartments.clear();
        self.next_apartment = 1;
        self.editor.reset();
        if self.mode == InteractionMode::ApartmentSelection {
            self.mode = InteractionMode::Navigate;
        }
        tracing::info!("Cleared all rooms");
    }

    pub fn room_summaries(&self) -> Vec<RoomSummary> {
        self.rooms
            .iter()
            .map(|room| {
                let m = metrics::measure(&room.points, self.scale);
                RoomSummary {
                    id: room.id,
                    room_type: room.room_type.clone(),
                    apartment: self.apartment_of(room.id),
                    perimeter: m.perimeter(),
                    segment_lengths: m.segment_lengths,
                    area: m.area,
                }
            })
            .collect()
    }

    pub fn apartment_summaries(&self) -> Vec<ApartmentSummary> {
        self.apartments
            .iter()
            .map(|apartment| {
                let m = metrics::measure(apartment.boundary.outline(), self.scale);
                ApartmentSummary {
                    id: apartment.id,
                    label: apartment.id.to_string(),
                    room_types: apartment.room_type_summary(),
                    members: apartment.members.clone(),
                    status: apartment.boundary.status,
                    segment_lengths: m.segment_lengths,
                    area: m.area,
                }
            })
            .collect()
    }

    // ----- apartments -----

    fn ensure_grouping(&self) -> Result<()> {
        if !self.config.features.apartment_grouping {
            return Err(Error::FeatureDisabled("apartment grouping"));
        }
        Ok(())
    }

    /// Switch clicks to tag selection; any open polyline is dropped
    ///
    /// Refused while a prompt waits for its answer.
    pub fn begin_apartment_selection(&mut self) -> Result<()> {
        self.ensure_grouping()?;
        self.ensure_no_prompt()?;
        if self.rooms.is_empty() {
            return Err(Error::NoRooms);
        }
        self.editor.reset();
        self.mode = InteractionMode::ApartmentSelection;
        Ok(())
    }

    /// Toggle the tag nearest to a screen position, if one is within reach
    pub fn toggle_tag_at(&mut self, screen: Point2D) -> Result<Option<RoomTag>> {
        self.ensure_grouping()?;
        if self.mode != InteractionMode::ApartmentSelection {
            return Err(Error::NotSelectingApartment);
        }
        let point = transform::to_drawing_space(screen, &self.view);
        let radius = self.config.tag_hit_radius;

        let nearest = self
            .tags
            .iter_mut()
            .map(|tag| (point.distance_to(&tag.position), tag))
            .filter(|(d, _)| *d < radius)
            .min_by(|(a, _), (b, _)| a.total_cmp(b));

        Ok(nearest.map(|(_, tag)| {
            tag.selected = !tag.selected;
            tag.clone()
        }))
    }

    /// Select or deselect a room's tag by id
    pub fn select_room(&mut self, room: RoomId, selected: bool) -> Result<RoomTag> {
        self.ensure_grouping()?;
        if self.mode != InteractionMode::ApartmentSelection {
            return Err(Error::NotSelectingApartment);
        }
        let tag = self
            .tags
            .iter_mut()
            .find(|t| t.room == room)
            .ok_or(Error::UnknownRoom(room))?;
        tag.selected = selected;
        Ok(tag.clone())
    }

    /// Group the selected rooms into a new apartment
    pub fn group_selected(&mut self) -> Result<Apartment> {
        self.ensure_grouping()?;
        let members: Vec<RoomId> = self
            .tags
            .iter()
            .filter(|t| t.selected)
            .map(|t| t.room)
            .collect();
        if members.is_empty() {
            return Err(Error::NothingSelected);
        }

        self.detach_from_apartments(&members);

        let id = ApartmentId(self.next_apartment);
        self.next_apartment += 1;
        let apartment = self.build_apartment(id, members);

        for tag in self.tags.iter_mut().filter(|t| t.selected) {
            tag.selected = false;
            tag.apartment = Some(id);
        }

        log_boundary(&apartment);
        self.apartments.push(apartment.clone());
        Ok(apartment)
    }

    fn build_apartment(&self, id: ApartmentId, members: Vec<RoomId>) -> Apartment {
        let grouping = grouping::group_rooms(
            members
                .iter()
                .filter_map(|m| self.rooms.iter().find(|r| r.id == *m)),
        );
        Apartment {
            id,
            members,
            boundary: grouping.boundary,
            room_types: grouping.room_types,
        }
    }

    /// Take rooms out of their apartments, re-tracing or dropping what remains
    fn detach_from_apartments(&mut self, rooms: &[RoomId]) {
        let mut affected = Vec::new();
        for apartment in &mut self.apartments {
            let before = apartment.members.len();
            apartment.members.retain(|m| !rooms.contains(m));
            if apartment.members.len() != before {
                affected.push(apartment.id);
            }
        }
        if affected.is_empty() {
            return;
        }

        for tag in self.tags.iter_mut().filter(|t| rooms.contains(&t.room)) {
            tag.apartment = None;
        }

        self.apartments.retain(|a| {
            if a.members.is_empty() {
                tracing::info!(apartment = %a.id, "Dropped apartment without rooms");
                false
            } else {
                true
            }
        });

        for id in affected {
            if let Some(index) = self.apartments.iter().position(|a| a.id == id) {
                let members = self.apartments[index].members.clone();
                let rebuilt = self.build_apartment(id, members);
                log_boundary(&rebuilt);
                self.apartments[index] = rebuilt;
            }
        }
    }

    // ----- export and snapshots -----

    /// Panels and rooms document for the current drawing
    pub fn export_bom(&self) -> Result<BomDocument> {
        let panel = PanelSpec {
            story_height: self.story_height,
            thickness: self.config.wall_thickness,
            panel_type: self.config.panel_type.clone(),
        };
        export::build_bom(&self.rooms, self.scale, &panel, |id| self.apartment_of(id))
    }

    /// Export file name derived from the background page name
    pub fn bom_file_name(&self) -> String {
        export::bom_file_name(self.background.as_ref().and_then(|b| b.name.as_deref()))
    }

    pub fn snapshot_json(&self) -> Result<String> {
        if self.rooms.is_empty() {
            return Err(Error::NoRooms);
        }
        persistence::encode_snapshot(&self.rooms)
    }

    /// Store the rooms under [`SNAPSHOT_KEY`]; returns the number saved
    pub fn save_snapshot(&self, store: &mut impl KeyValueStore) -> Result<usize> {
        let json = self.snapshot_json()?;
        store.set(SNAPSHOT_KEY, &json)?;
        tracing::info!(rooms = self.rooms.len(), "Saved room snapshot");
        Ok(self.rooms.len())
    }

    /// Replace all rooms with those in a snapshot; returns the number restored
    ///
    /// Rooms receive fresh ids and tags. Apartments are not part of a
    /// snapshot and are cleared.
    pub fn restore_snapshot_json(&mut self, json: &str) -> Result<usize> {
        let records = persistence::decode_snapshot(json)?;
        self.clear_rooms();
        for record in records {
            self.insert_room(record.points, record.room_type);
        }
        tracing::info!(rooms = self.rooms.len(), "Restored room snapshot");
        Ok(self.rooms.len())
    }

    pub fn restore_snapshot(&mut self, store: &impl KeyValueStore) -> Result<usize> {
        let json = store
            .get(SNAPSHOT_KEY)?
            .ok_or_else(|| Error::SnapshotNotFound(SNAPSHOT_KEY.to_string()))?;
        self.restore_snapshot_json(&json)
    }
}

fn log_boundary(apartment: &Apartment) {
    match apartment.boundary.status {
        BoundaryStatus::Closed => tracing::info!(
            apartment = %apartment.id,
            rooms = apartment.members.len(),
            vertices = apartment.boundary.vertices().len(),
            room_types = %apartment.room_type_summary(),
            "Grouped apartment"
        ),
        status => tracing::warn!(
            apartment = %apartment.id,
            rooms = apartment.members.len(),
            rings = apartment.boundary.rings.len(),
            ?status,
            "Apartment boundary is not a single closed loop"
        ),
    }
}
