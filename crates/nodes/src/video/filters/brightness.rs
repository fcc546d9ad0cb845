// SPDX-FileCopyrightText: © 2025 FrameKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

use framekit_core::{Filter, Frame, ImageFormat};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

fn level_schema(_gen: &mut schemars::SchemaGenerator) -> schemars::Schema {
    schemars::json_schema!({
        "type": "number",
        "default": 1.0,
        "minimum": 0.0,
        "maximum": 2.0,
        "description": "Luma multiplier around black. 0.0 = black, 1.0 = unchanged, 2.0 = double. Range: 0.0 to 2.0"
    })
}

/// The configuration struct for the BrightnessFilter.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
#[serde(default)]
pub struct BrightnessConfig {
    /// Scales luma above black level. Valid range: 0.0 to 2.0
    #[schemars(schema_with = "level_schema")]
    pub level: f32,
}

impl Default for BrightnessConfig {
    fn default() -> Self {
        Self { level: 1.0 }
    }
}

impl BrightnessConfig {
    /// Validate the level parameter is within acceptable bounds.
    ///
    /// # Errors
    ///
    /// Returns an error if the level is outside the range [0.0, 2.0] or is NaN/infinite.
    pub fn validate(&self) -> Result<(), String> {
        const MIN_LEVEL: f32 = 0.0;
        const MAX_LEVEL: f32 = 2.0;

        if !self.level.is_finite() {
            return Err(format!("Level must be a finite number, got: {}", self.level));
        }
        if self.level < MIN_LEVEL || self.level > MAX_LEVEL {
            return Err(format!(
                "Level must be between {MIN_LEVEL} and {MAX_LEVEL}, got: {}",
                self.level
            ));
        }
        Ok(())
    }
}

/// Scales luma in `yuv422`, leaving chroma alone.
pub struct BrightnessFilter {
    config: BrightnessConfig,
}

impl BrightnessFilter {
    /// # Errors
    ///
    /// Returns an error if the level is out of range.
    pub fn new(config: BrightnessConfig) -> Result<Self, String> {
        config.validate()?;
        Ok(Self { config })
    }
}

impl Filter for BrightnessFilter {
    fn id(&self) -> &str {
        "video::brightness"
    }

    fn process(&self, frame: &mut Frame) -> framekit_core::Result<()> {
        let level = self.config.level;
        if (level - 1.0).abs() < f32::EPSILON {
            return Ok(());
        }
        frame.push_get_image(move |frame, request| {
            let mut image = frame.get_image(&request.with_format(ImageFormat::Yuv422))?;
            // Luma sits at even offsets of each Y0 U Y1 V group.
            for y in image.make_data_mut().iter_mut().step_by(2) {
                *y = scale_luma(*y, level);
            }
            Ok(image)
        });
        Ok(())
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scale_luma(y: u8, level: f32) -> u8 {
    let scaled = 16.0 + (f32::from(y) - 16.0) * level;
    scaled.round().clamp(16.0, 235.0) as u8
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use framekit_core::{Image, ImageRequest, StandardHooks};

    #[test]
    fn validates_level() {
        assert!(BrightnessFilter::new(BrightnessConfig { level: 2.5 }).is_err());
        assert!(BrightnessFilter::new(BrightnessConfig { level: f32::NAN }).is_err());
        assert!(BrightnessFilter::new(BrightnessConfig::default()).is_ok());
    }

    #[test]
    fn scales_luma_only() {
        let mut frame = Frame::new(0);
        frame.push_get_image(|_, _| {
            Image::from_vec(ImageFormat::Yuv422, 2, 1, vec![116, 90, 216, 240])
        });
        BrightnessFilter::new(BrightnessConfig { level: 0.5 }).unwrap().process(&mut frame).unwrap();

        let image = frame.get_image(&ImageRequest::new(ImageFormat::Yuv422, 2, 1)).unwrap();
        assert_eq!(image.data(), &[66, 90, 116, 240]);
    }

    #[test]
    fn clamps_to_broadcast_range() {
        assert_eq!(scale_luma(235, 2.0), 235);
        assert_eq!(scale_luma(16, 0.0), 16);
    }

    #[test]
    fn output_is_converted_back_to_the_requested_format() {
        let mut frame = Frame::new(0);
        frame.set_hooks(StandardHooks::shared());
        BrightnessFilter::new(BrightnessConfig { level: 0.0 }).unwrap().process(&mut frame).unwrap();

        // Upstream is the white test card; level 0 takes it to black.
        let image = frame.get_image(&ImageRequest::new(ImageFormat::Rgb24, 2, 1)).unwrap();
        assert_eq!(image.format, ImageFormat::Rgb24);
        assert_eq!(image.data(), &[0; 6]);
    }
}
