// SPDX-FileCopyrightText: © 2025 FrameKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Per-frame conversion and alpha capabilities.
//!
//! A frame holds at most one [`FrameHooks`] implementation. Every method has
//! a default, so an implementation overrides only what it supports and a
//! frame without hooks behaves as if every method used its default.

use crate::error::{FrameError, Result};
use crate::format::{AudioFormat, ImageFormat};
use crate::frame::Frame;
use crate::types::{AlphaMask, Audio, Image};

/// Format conversion and alpha access for a frame.
///
/// Conversions must either succeed, leaving `image`/`audio` in `output`
/// format with matching data, or fail leaving them untouched.
pub trait FrameHooks: Send + Sync {
    /// # Errors
    ///
    /// Returns `FrameError::UnsupportedConversion` for pairs the hook does not implement.
    fn convert_image(&self, frame: &mut Frame, image: &mut Image, output: ImageFormat) -> Result<()> {
        let _ = frame;
        Err(FrameError::unsupported_image(image.format, output))
    }

    /// # Errors
    ///
    /// Returns `FrameError::UnsupportedConversion` for pairs the hook does not implement.
    fn convert_audio(&self, frame: &mut Frame, audio: &mut Audio, output: AudioFormat) -> Result<()> {
        let _ = frame;
        Err(FrameError::unsupported_audio(audio.format, output))
    }

    /// Alpha supplied by the hook; `None` falls through to the frame's own mask.
    fn alpha_mask(&self, frame: &Frame) -> Option<AlphaMask> {
        let _ = frame;
        None
    }

    /// Short name for diagnostics.
    fn name(&self) -> &'static str {
        "custom"
    }
}
