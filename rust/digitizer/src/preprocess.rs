// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Background page handling and contrast preprocessing
//!
//! The page itself is rendered by an external PDF renderer; this module
//! only receives the raster (`width`, `height`, RGBA pixels) and optionally
//! darkens/sharpens it so thin plan lines stay visible under the overlay.

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Rendered page used as the immutable background layer
#[derive(Debug, Clone, PartialEq)]
pub struct SourceImage {
    pixels: RgbaImage,
}

impl SourceImage {
    /// Wrap raw RGBA bytes (4 bytes per pixel, row-major)
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let actual = data.len();
        RgbaImage::from_raw(width, height, data)
            .filter(|_| actual == (width as usize) * (height as usize) * 4)
            .map(|pixels| Self { pixels })
            .ok_or(Error::InvalidImage {
                width,
                height,
                actual,
            })
    }

    /// Decode an encoded raster (PNG or JPEG)
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let decoded = image::load_from_memory(bytes)?;
        Ok(Self {
            pixels: decoded.to_rgba8(),
        })
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

/// One pixel operation of the preprocessing pipeline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stage", content = "value", rename_all = "snake_case")]
pub enum PreprocessStage {
    /// Rec. 601 luminance into all three colour channels
    Grayscale,
    /// Add a constant to every colour channel (negative darkens)
    Brightness(i16),
    /// Stretch channels around mid-grey; positive raises contrast
    Contrast(f64),
    /// Black below the threshold, white at or above it (reads the red channel)
    Threshold(u8),
}

impl PreprocessStage {
    fn apply(&self, image: &mut RgbaImage) {
        match *self {
            PreprocessStage::Grayscale => map_pixels(image, |Rgba([r, g, b, a])| {
                let luma = clamp_channel(0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64);
                Rgba([luma, luma, luma, a])
            }),
            PreprocessStage::Brightness(delta) => map_pixels(image, |Rgba([r, g, b, a])| {
                let shift = |c: u8| clamp_channel(c as f64 + delta as f64);
                Rgba([shift(r), shift(g), shift(b), a])
            }),
            PreprocessStage::Contrast(amount) => {
                let factor = contrast_factor(amount);
                map_pixels(image, |Rgba([r, g, b, a])| {
                    let stretch = |c: u8| clamp_channel(factor * (c as f64 - 128.0) + 128.0);
                    Rgba([stretch(r), stretch(g), stretch(b), a])
                })
            }
            PreprocessStage::Threshold(level) => map_pixels(image, |Rgba([r, _, _, a])| {
                let v = if r < level { 0 } else { 255 };
                Rgba([v, v, v, a])
            }),
        }
    }
}

/// Contrast multiplier for an adjustment in `-255..=255`
pub fn contrast_factor(amount: f64) -> f64 {
    (259.0 * (amount + 255.0)) / (255.0 * (259.0 - amount))
}

fn clamp_channel(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

fn map_pixels(image: &mut RgbaImage, f: impl Fn(Rgba<u8>) -> Rgba<u8>) {
    for pixel in image.pixels_mut() {
        *pixel = f(*pixel);
    }
}

/// Run the stages in order over a copy of the page
pub fn preprocess(source: &SourceImage, stages: &[PreprocessStage]) -> SourceImage {
    let mut pixels = source.pixels.clone();
    for stage in stages {
        stage.apply(&mut pixels);
    }
    tracing::debug!(
        stages = stages.len(),
        width = pixels.width(),
        height = pixels.height(),
        "Preprocessed background page"
    );
    SourceImage { pixels }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_of(pixels: &[[u8; 4]]) -> SourceImage {
        let data = pixels.iter().flatten().copied().collect();
        SourceImage::from_rgba(pixels.len() as u32, 1, data).unwrap()
    }

    #[test]
    fn from_rgba_checks_buffer_length() {
        assert!(SourceImage::from_rgba(2, 2, vec![0; 16]).is_ok());
        assert!(matches!(
            SourceImage::from_rgba(2, 2, vec![0; 15]),
            Err(Error::InvalidImage { actual: 15, .. })
        ));
        assert!(SourceImage::from_rgba(2, 2, vec![0; 20]).is_err());
    }

    #[test]
    fn grayscale_uses_rec601_weights() {
        let img = image_of(&[[255, 0, 0, 255], [255, 255, 255, 7]]);
        let out = preprocess(&img, &[PreprocessStage::Grayscale]);
        assert_eq!(out.pixels().get_pixel(0, 0).0, [76, 76, 76, 255]);
        assert_eq!(out.pixels().get_pixel(1, 0).0, [255, 255, 255, 7]);
    }

    #[test]
    fn brightness_saturates() {
        let img = image_of(&[[10, 100, 250, 255]]);
        let darker = preprocess(&img, &[PreprocessStage::Brightness(-30)]);
        assert_eq!(darker.pixels().get_pixel(0, 0).0, [0, 70, 220, 255]);
        let brighter = preprocess(&img, &[PreprocessStage::Brightness(30)]);
        assert_eq!(brighter.pixels().get_pixel(0, 0).0, [40, 130, 255, 255]);
    }

    #[test]
    fn contrast_pushes_away_from_mid_grey() {
        assert!((contrast_factor(0.0) - 1.0).abs() < 1e-12);
        let img = image_of(&[[100, 128, 160, 255]]);
        let out = preprocess(&img, &[PreprocessStage::Contrast(60.0)]);
        let [r, g, b, _] = out.pixels().get_pixel(0, 0).0;
        assert!(r < 100);
        assert_eq!(g, 128);
        assert!(b > 160);
    }

    #[test]
    fn threshold_binarizes() {
        let img = image_of(&[[127, 0, 0, 255], [128, 0, 0, 255]]);
        let out = preprocess(&img, &[PreprocessStage::Threshold(128)]);
        assert_eq!(out.pixels().get_pixel(0, 0).0, [0, 0, 0, 255]);
        assert_eq!(out.pixels().get_pixel(1, 0).0, [255, 255, 255, 255]);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(
            SourceImage::decode(b"not an image"),
            Err(Error::ImageDecode(_))
        ));
    }

    #[test]
    fn stages_deserialize_from_tagged_json() {
        let stages: Vec<PreprocessStage> = serde_json::from_str(
            r#"[{"stage":"grayscale"},{"stage":"brightness","value":-30},{"stage":"contrast","value":60.0}]"#,
        )
        .unwrap();
        assert_eq!(
            stages,
            vec![
                PreprocessStage::Grayscale,
                PreprocessStage::Brightness(-30),
                PreprocessStage::Contrast(60.0)
            ]
        );
    }
}
