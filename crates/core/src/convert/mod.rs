// SPDX-FileCopyrightText: © 2025 FrameKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Built-in format conversions.
//!
//! [`StandardHooks`] covers every image pair among the packed and planar
//! layouts (routing through `Yuv422` where there is no direct path) and
//! every audio pair among the sample formats. Conversions build the output
//! in a fresh buffer and only commit on success.

pub mod audio;
pub mod image;

use crate::error::Result;
use crate::format::{AudioFormat, ImageFormat};
use crate::frame::Frame;
use crate::hooks::FrameHooks;
use crate::types::{Audio, Image};
use std::sync::Arc;

/// Conversion hooks backed by the software converters in this module.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardHooks;

impl StandardHooks {
    pub fn shared() -> Arc<dyn FrameHooks> {
        Arc::new(Self)
    }
}

impl FrameHooks for StandardHooks {
    fn convert_image(&self, frame: &mut Frame, image: &mut Image, output: ImageFormat) -> Result<()> {
        image::convert(frame, image, output)
    }

    fn convert_audio(&self, _frame: &mut Frame, audio: &mut Audio, output: AudioFormat) -> Result<()> {
        audio::convert(audio, output)
    }

    fn name(&self) -> &'static str {
        "standard"
    }
}
