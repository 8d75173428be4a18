// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tool constants and optional pipeline stages.

use serde::{Deserialize, Serialize};

use crate::preprocess::PreprocessStage;

/// Optional stages of the digitizing pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Features {
    /// Tag selection and apartment grouping
    pub apartment_grouping: bool,
    /// Screen grid overlay
    pub grid_overlay: bool,
    /// Brightness/contrast treatment of the rendered page
    pub image_preprocessing: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            apartment_grouping: true,
            grid_overlay: true,
            image_preprocessing: true,
        }
    }
}

/// Configuration of a digitizing session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DigitizerConfig {
    /// Vertex snap and closure tolerance, in screen pixels
    pub snap_radius: f64,
    /// Segment snap tolerance, in screen pixels
    pub segment_snap_radius: f64,
    /// Tag hit-test radius, in drawing units
    pub tag_hit_radius: f64,
    /// Zoom change per wheel notch
    pub zoom_step: f64,
    /// Initial grid spacing in screen pixels
    pub default_grid_unit_size: u32,
    /// Story height used when the operator gives none or an invalid one
    pub default_story_height: f64,
    /// Exported wall thickness, in real-world units
    pub wall_thickness: f64,
    /// Exported panel type code
    pub panel_type: String,
    pub features: Features,
    /// Stages applied to each loaded page when preprocessing is on
    pub preprocessing: Vec<PreprocessStage>,
}

impl Default for DigitizerConfig {
    fn default() -> Self {
        Self {
            snap_radius: 10.0,
            segment_snap_radius: 5.0,
            tag_hit_radius: 10.0,
            zoom_step: 0.1,
            default_grid_unit_size: 20,
            default_story_height: 3.0,
            wall_thickness: 0.2,
            panel_type: "WAL_21_CNI_REN".to_string(),
            features: Features::default(),
            preprocessing: vec![
                PreprocessStage::Brightness(-30),
                PreprocessStage::Contrast(60.0),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: DigitizerConfig =
            serde_json::from_str(r#"{"snap_radius": 14.0, "features": {"grid_overlay": false}}"#)
                .unwrap();
        assert_eq!(config.snap_radius, 14.0);
        assert_eq!(config.segment_snap_radius, 5.0);
        assert!(!config.features.grid_overlay);
        assert!(config.features.apartment_grouping);
        assert_eq!(config.preprocessing.len(), 2);
    }
}
