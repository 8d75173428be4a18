// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bill-of-materials export: one wall panel per room segment.
//!
//! Document shape:
//!
//! ```text
//! { "panels": { "attributes": {}, "items": { "0": {..}, .. }, "max_key": N },
//!   "rooms":  { "0": { room_type, apartment, coordinates: [{x, y, z}] }, .. } }
//! ```
//!
//! Coordinates are real-world units rounded to two decimals, on `z = 0`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{Error, Result};
use crate::metrics::ScaleFactor;
use crate::types::{ApartmentId, Point2D, Room, RoomId};

/// Apartment label for rooms outside any apartment
pub const NO_APARTMENT: &str = "N/A";

/// File name used when the source document name is unknown
pub const DEFAULT_BOM_FILE: &str = "floorplan_bom.json";

/// Fixed attributes of every exported panel
#[derive(Debug, Clone, PartialEq)]
pub struct PanelSpec {
    pub story_height: f64,
    pub thickness: f64,
    pub panel_type: String,
}

/// One wall segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Panel {
    pub panel_type: String,
    pub start_point: [f64; 3],
    pub end_point: [f64; 3],
    pub height: f64,
    pub thickness: f64,
    pub room: String,
    pub apartment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelCollection {
    pub attributes: serde_json::Map<String, serde_json::Value>,
    pub items: BTreeMap<u32, Panel>,
    /// Number of items; keys run `0..max_key`
    pub max_key: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomEntry {
    pub room_type: String,
    pub apartment: String,
    pub coordinates: Vec<Coordinate>,
}

/// The exported document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomDocument {
    pub panels: PanelCollection,
    pub rooms: BTreeMap<u32, RoomEntry>,
}

impl BomDocument {
    /// JSON with a four-space indent
    pub fn to_pretty_json(&self) -> Result<String> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.serialize(&mut serializer)?;
        String::from_utf8(out).map_err(|e| Error::Serialization(e.to_string()))
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn real_xy(point: &Point2D, scale: ScaleFactor) -> (f64, f64) {
    let p = point.scaled(scale.value());
    (round2(p.x), round2(p.y))
}

fn apartment_label(apartment: Option<ApartmentId>) -> String {
    apartment.map_or_else(|| NO_APARTMENT.to_string(), |id| id.to_string())
}

/// Build the export document for all rooms, in drawing order
///
/// `apartment_of` resolves each room's apartment by id.
pub fn build_bom(
    rooms: &[Room],
    scale: Option<ScaleFactor>,
    panel: &PanelSpec,
    apartment_of: impl Fn(RoomId) -> Option<ApartmentId>,
) -> Result<BomDocument> {
    if rooms.is_empty() {
        return Err(Error::NoRooms);
    }
    let scale = scale.ok_or(Error::ScaleNotSet)?;

    let mut items = BTreeMap::new();
    let mut entries = BTreeMap::new();
    let mut key: u32 = 0;

    for (index, room) in rooms.iter().enumerate() {
        let apartment = apartment_label(apartment_of(room.id));
        let room_type = room.room_type.to_string();

        let coordinates = room
            .points
            .iter()
            .map(|p| {
                let (x, y) = real_xy(p, scale);
                Coordinate { x, y, z: 0.0 }
            })
            .collect();
        entries.insert(
            index as u32,
            RoomEntry {
                room_type: room_type.clone(),
                apartment: apartment.clone(),
                coordinates,
            },
        );

        for (start, end) in room.segments() {
            let (sx, sy) = real_xy(&start, scale);
            let (ex, ey) = real_xy(&end, scale);
            items.insert(
                key,
                Panel {
                    panel_type: panel.panel_type.clone(),
                    start_point: [sx, sy, 0.0],
                    end_point: [ex, ey, 0.0],
                    height: panel.story_height,
                    thickness: panel.thickness,
                    room: room_type.clone(),
                    apartment: apartment.clone(),
                },
            );
            key += 1;
        }
    }

    tracing::info!(rooms = rooms.len(), panels = key, "Built BOM export");

    Ok(BomDocument {
        panels: PanelCollection {
            attributes: serde_json::Map::new(),
            items,
            max_key: key,
        },
        rooms: entries,
    })
}

/// `<source name without extension>_bom.json`
pub fn bom_file_name(source: Option<&str>) -> String {
    source
        .and_then(|name| Path::new(name).file_stem())
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .map_or_else(|| DEFAULT_BOM_FILE.to_string(), |stem| format!("{}_bom.json", stem))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RoomType;

    fn panel_spec() -> PanelSpec {
        PanelSpec {
            story_height: 3.0,
            thickness: 0.2,
            panel_type: "WAL_21_CNI_REN".to_string(),
        }
    }

    fn ring(id: u64, coords: &[(f64, f64)], room_type: RoomType) -> Room {
        Room {
            id: RoomId(id),
            points: coords.iter().map(|&(x, y)| Point2D::new(x, y)).collect(),
            room_type,
        }
    }

    fn sample_rooms() -> Vec<Room> {
        vec![
            ring(
                1,
                &[(0.0, 0.0), (100.0, 0.0), (100.0, 100.0), (0.0, 100.0), (0.0, 0.0)],
                RoomType::LivingRoom,
            ),
            ring(
                2,
                &[(100.0, 0.0), (150.0, 0.0), (150.0, 33.4), (100.0, 0.0)],
                RoomType::Bathroom,
            ),
        ]
    }

    #[test]
    fn export_requires_rooms_and_scale() {
        assert!(matches!(
            build_bom(&[], ScaleFactor::new(1.0).ok(), &panel_spec(), |_| None),
            Err(Error::NoRooms)
        ));
        assert!(matches!(
            build_bom(&sample_rooms(), None, &panel_spec(), |_| None),
            Err(Error::ScaleNotSet)
        ));
    }

    #[test]
    fn max_key_counts_every_segment() {
        let rooms = sample_rooms();
        let doc = build_bom(&rooms, ScaleFactor::new(0.05).ok(), &panel_spec(), |_| None).unwrap();
        let expected: usize = rooms.iter().map(|r| r.points.len() - 1).sum();
        assert_eq!(doc.panels.max_key as usize, expected);
        assert_eq!(doc.panels.items.len(), expected);
        assert_eq!(doc.panels.items.keys().copied().collect::<Vec<_>>(), (0..7).collect::<Vec<_>>());
        assert_eq!(doc.rooms.len(), 2);
    }

    #[test]
    fn panels_are_scaled_rounded_and_labelled() {
        let rooms = sample_rooms();
        let doc = build_bom(&rooms, ScaleFactor::new(0.05).ok(), &panel_spec(), |id| {
            (id == RoomId(2)).then_some(ApartmentId(1))
        })
        .unwrap();

        let first = &doc.panels.items[&0];
        assert_eq!(first.start_point, [0.0, 0.0, 0.0]);
        assert_eq!(first.end_point, [5.0, 0.0, 0.0]);
        assert_eq!(first.room, "living_room");
        assert_eq!(first.apartment, "N/A");
        assert_eq!(first.height, 3.0);
        assert_eq!(first.thickness, 0.2);

        let bath = &doc.panels.items[&5];
        assert_eq!(bath.apartment, "Apartment 1");
        assert_eq!(bath.end_point, [7.5, 1.67, 0.0]);
        assert_eq!(doc.rooms[&1].coordinates[2], Coordinate { x: 7.5, y: 1.67, z: 0.0 });
    }

    #[test]
    fn pretty_json_uses_four_spaces_and_string_keys() {
        let doc = build_bom(&sample_rooms(), ScaleFactor::new(1.0).ok(), &panel_spec(), |_| None).unwrap();
        let json = doc.to_pretty_json().unwrap();
        assert!(json.starts_with("{\n    \"panels\": {\n        \"attributes\": {},"));
        assert!(json.contains("\"max_key\": 7"));
        assert!(json.contains("\"0\": {"));

        let back: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back["rooms"]["1"]["room_type"], "bathroom");
        assert_eq!(back["panels"]["items"]["6"]["panel_type"], "WAL_21_CNI_REN");
    }

    #[test]
    fn file_name_strips_extension() {
        assert_eq!(bom_file_name(Some("level_2.pdf")), "level_2_bom.json");
        assert_eq!(bom_file_name(Some("plans/site.v2.pdf")), "site.v2_bom.json");
        assert_eq!(bom_file_name(Some("")), DEFAULT_BOM_FILE);
        assert_eq!(bom_file_name(None), DEFAULT_BOM_FILE);
    }
}
