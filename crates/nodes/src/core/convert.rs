// SPDX-FileCopyrightText: © 2025 FrameKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

use framekit_core::{AudioFormat, Filter, Frame, ImageFormat, StandardHooks};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The configuration struct for the ConvertFilter.
#[derive(Deserialize, Serialize, Debug, Clone, Default, JsonSchema)]
#[serde(default)]
pub struct ConvertConfig {
    /// Force the image through this format before it continues downstream.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_format: Option<ImageFormat>,
    /// Force the audio through this format before it continues downstream.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_format: Option<AudioFormat>,
}

/// Installs the software converters on every frame it sees.
///
/// Optionally pins an intermediate format, so everything downstream of the
/// filter sees data that went through that layout.
pub struct ConvertFilter {
    config: ConvertConfig,
}

impl ConvertFilter {
    pub const fn new(config: ConvertConfig) -> Self {
        Self { config }
    }
}

impl Filter for ConvertFilter {
    fn id(&self) -> &str {
        "core::convert"
    }

    fn process(&self, frame: &mut Frame) -> framekit_core::Result<()> {
        frame.set_hooks(StandardHooks::shared());

        if let Some(format) = self.config.image_format.filter(|f| *f != ImageFormat::None) {
            frame.push_get_image(move |frame, request| frame.get_image(&request.with_format(format)));
        }
        if let Some(format) = self.config.audio_format.filter(|f| *f != AudioFormat::None) {
            frame.push_audio(move |frame, request| frame.get_audio(&request.with_format(format)));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use framekit_core::{Audio, AudioRequest, Image, ImageRequest};

    #[test]
    fn installs_hooks() {
        let mut frame = Frame::new(0);
        frame.push_get_image(|_, _| Image::from_vec(ImageFormat::Rgb24, 1, 1, vec![0, 0, 0]));
        ConvertFilter::new(ConvertConfig::default()).process(&mut frame).unwrap();
        assert_eq!(frame.hooks().unwrap().name(), "standard");

        let image = frame.get_image(&ImageRequest::new(ImageFormat::Rgb24a, 1, 1)).unwrap();
        assert_eq!(image.data(), &[0, 0, 0, 255]);
    }

    #[test]
    fn pinned_image_format_is_lossy_like_the_real_path() {
        let mut frame = Frame::new(0);
        frame.push_get_image(|_, _| Image::from_vec(ImageFormat::Rgb24, 1, 1, vec![255, 255, 255]));
        let config = ConvertConfig { image_format: Some(ImageFormat::Yuv422), audio_format: None };
        ConvertFilter::new(config).process(&mut frame).unwrap();

        // White goes through luma 234 and comes back one step darker.
        let image = frame.get_image(&ImageRequest::new(ImageFormat::Rgb24, 1, 1)).unwrap();
        assert_eq!(image.data(), &[253, 253, 253]);
    }

    #[test]
    fn pinned_audio_format_quantises() {
        let mut frame = Frame::new(0);
        frame.push_audio(|_, _| Audio::from_f32(48_000, 1, &[0.5, -0.25]));
        let config = ConvertConfig { image_format: None, audio_format: Some(AudioFormat::U8) };
        ConvertFilter::new(config).process(&mut frame).unwrap();

        let audio = frame.get_audio(&AudioRequest::new(AudioFormat::F32le, 48_000, 1, 2)).unwrap();
        let samples = audio.f32_samples().unwrap();
        assert!((samples[0] - 0.5).abs() < 1.0 / 128.0);
        assert!((samples[1] + 0.25).abs() < 1.0 / 128.0);
    }

    #[test]
    fn config_parses_format_names() {
        let config: ConvertConfig =
            serde_json::from_value(serde_json::json!({ "image_format": "yuv420p" })).unwrap();
        assert_eq!(config.image_format, Some(ImageFormat::Yuv420p));
        assert_eq!(config.audio_format, None);
    }
}
