// SPDX-FileCopyrightText: © 2025 FrameKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Process-wide frame defaults.
//!
//! These values fill in whatever a pull leaves unspecified: the size of a
//! synthesised test card, the layout of synthesised silence, and the frame
//! rate used for sample arithmetic when a frame carries no `fps` attribute.
//! They are set once at startup and remain constant for the lifetime of the
//! process.
//!
//! ## Usage
//!
//! Application startup:
//! ```ignore
//! use framekit_core::frame_config::{set_frame_defaults, FrameDefaults};
//!
//! set_frame_defaults(FrameDefaults { width: 1280, height: 720, ..Default::default() });
//! ```
//!
//! ## Default Values
//!
//! If `set_frame_defaults` is never called, [`frame_defaults`] returns
//! PAL-like defaults: 720x576 at 25 fps, 48 kHz stereo, 1920 samples.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

const DEFAULT_WIDTH: usize = 720;
const DEFAULT_HEIGHT: usize = 576;
const DEFAULT_FPS: f64 = 25.0;
const DEFAULT_FREQUENCY: u32 = 48_000;
const DEFAULT_CHANNELS: usize = 2;
/// One frame of 48 kHz audio at 25 fps.
const DEFAULT_SAMPLES: usize = 1920;

/// Defaults applied by the pull protocol when a request leaves a field at zero.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct FrameDefaults {
    /// Test card width in pixels.
    pub width: usize,
    /// Test card height in pixels.
    pub height: usize,
    /// Frame rate used when a frame has no `fps` attribute.
    pub fps: f64,
    /// Sample rate of synthesised silence (Hz).
    pub frequency: u32,
    /// Channel count of synthesised silence.
    pub channels: usize,
    /// Sample frames of synthesised silence.
    pub samples: usize,
    /// Sample aspect ratio stamped on new frames.
    pub aspect_ratio: f64,
}

impl Default for FrameDefaults {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            fps: DEFAULT_FPS,
            frequency: DEFAULT_FREQUENCY,
            channels: DEFAULT_CHANNELS,
            samples: DEFAULT_SAMPLES,
            aspect_ratio: 1.0,
        }
    }
}

impl FrameDefaults {
    /// Validates the defaults.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.width == 0 || self.height == 0 {
            return Err(format!("frame size must be non-zero, got {}x{}", self.width, self.height));
        }
        if !(self.fps.is_finite() && self.fps > 0.0) {
            return Err(format!("fps must be positive, got {}", self.fps));
        }
        if self.frequency == 0 || self.channels == 0 {
            return Err("audio frequency and channels must be non-zero".to_string());
        }
        if !(self.aspect_ratio.is_finite() && self.aspect_ratio > 0.0) {
            return Err(format!("aspect ratio must be positive, got {}", self.aspect_ratio));
        }
        Ok(())
    }
}

static FRAME_DEFAULTS: OnceLock<FrameDefaults> = OnceLock::new();

/// Sets the process-wide frame defaults.
///
/// Call once at startup, before frames are pulled. Subsequent calls are
/// ignored (the first configuration wins).
pub fn set_frame_defaults(defaults: FrameDefaults) {
    if FRAME_DEFAULTS.set(defaults).is_err() {
        tracing::warn!("Frame defaults already set, ignoring new configuration");
    }
}

/// Returns the configured defaults, or the built-in ones if none were set.
#[inline]
pub fn frame_defaults() -> &'static FrameDefaults {
    FRAME_DEFAULTS.get_or_init(FrameDefaults::default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let defaults = FrameDefaults::default();
        assert_eq!((defaults.width, defaults.height), (720, 576));
        assert_eq!(defaults.frequency, 48_000);
        assert_eq!(defaults.samples, 1920);
        assert!(defaults.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let bad = FrameDefaults { width: 0, ..Default::default() };
        assert!(bad.validate().is_err());
        let bad = FrameDefaults { fps: f64::NAN, ..Default::default() };
        assert!(bad.validate().is_err());
        let bad = FrameDefaults { channels: 0, ..Default::default() };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_partial_deserialize_fills_defaults() {
        let defaults: FrameDefaults = serde_json::from_str(r#"{"width": 1280}"#).unwrap();
        assert_eq!(defaults.width, 1280);
        assert_eq!(defaults.height, 576);
    }
}
