// SPDX-FileCopyrightText: © 2025 FrameKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

use framekit_core::convert::audio::remix;
use framekit_core::{
    keys, Audio, AudioFormat, Frame, FrameError, FrameHandle, Image, ImageFormat, Transition,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::MutexGuard;

fn mix_schema(_gen: &mut schemars::SchemaGenerator) -> schemars::Schema {
    schemars::json_schema!({
        "type": "number",
        "default": 0.5,
        "minimum": 0.0,
        "maximum": 1.0,
        "description": "Weight of the second track. 0.0 = first track only, 1.0 = second track only."
    })
}

/// The configuration struct for the MixTransition.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
#[serde(default)]
pub struct MixConfig {
    #[schemars(schema_with = "mix_schema")]
    pub mix: f32,
}

impl Default for MixConfig {
    fn default() -> Self {
        Self { mix: 0.5 }
    }
}

impl MixConfig {
    /// # Errors
    ///
    /// Returns an error if `mix` is outside [0.0, 1.0] or not finite.
    pub fn validate(&self) -> Result<(), String> {
        if !self.mix.is_finite() || !(0.0..=1.0).contains(&self.mix) {
            return Err(format!("Mix must be between 0 and 1, got: {}", self.mix));
        }
        Ok(())
    }
}

/// Dissolves the second frame's image over the first and crossfades audio.
///
/// Each pushed callback owns its own handle to the second frame, so several
/// mixes stacked on one frame always blend their own track. The second frame
/// is released once both callbacks have run or been dropped.
pub struct MixTransition {
    config: MixConfig,
}

impl MixTransition {
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: MixConfig) -> Result<Self, String> {
        config.validate()?;
        Ok(Self { config })
    }
}

impl Transition for MixTransition {
    fn id(&self) -> &str {
        "core::mix"
    }

    fn process(&self, a: &mut Frame, b: FrameHandle) -> framekit_core::Result<()> {
        let mix = self.config.mix;

        // A muted first track would skip the crossfade callback entirely.
        let b_audible = b.lock().map(|b| !b.is_test_audio()).unwrap_or(false);
        if b_audible && a.is_test_audio() {
            a.properties_mut().remove(keys::TEST_AUDIO);
        }

        let other = FrameHandle::clone(&b);
        a.push_get_image(move |frame, request| {
            let request = request.with_format(ImageFormat::Rgb24a);
            let mut image = frame.get_image(&request)?;
            let theirs = lock(&other)?.get_image(&request)?;
            dissolve(&mut image, &theirs, mix);
            Ok(image)
        });

        a.push_audio(move |frame, request| {
            let request = request.with_format(AudioFormat::F32le);
            let mut audio = frame.get_audio(&request)?;
            let mut theirs = lock(&b)?.get_audio(&request)?;
            if theirs.channels != audio.channels {
                remix(&mut theirs, audio.channels)?;
            }
            crossfade(&mut audio, &theirs, mix)?;
            Ok(audio)
        });
        Ok(())
    }
}

fn lock(frame: &FrameHandle) -> framekit_core::Result<MutexGuard<'_, Frame>> {
    frame.lock().map_err(|_| FrameError::InvalidState("mix: b frame lock poisoned".to_string()))
}

/// Blends `b` over `a` per pixel, weighted by `mix` and b's alpha.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn dissolve(a: &mut Image, b: &Image, mix: f32) {
    if (a.width, a.height) != (b.width, b.height) {
        tracing::warn!(
            a = ?(a.width, a.height),
            b = ?(b.width, b.height),
            "mix: image sizes differ, keeping first track"
        );
        return;
    }
    if mix <= 0.0 {
        return;
    }
    for (dst, src) in a.make_data_mut().chunks_exact_mut(4).zip(b.data().chunks_exact(4)) {
        let weight = mix * f32::from(src[3]) / 255.0;
        for (d, s) in dst[..3].iter_mut().zip(&src[..3]) {
            let value = f32::from(*d).mul_add(1.0 - weight, f32::from(*s) * weight);
            *d = value.round().clamp(0.0, 255.0) as u8;
        }
    }
}

/// `a * (1 - mix) + b * mix` over the overlapping samples.
fn crossfade(a: &mut Audio, b: &Audio, mix: f32) -> framekit_core::Result<()> {
    let (Some(ours), Some(theirs)) = (a.f32_samples(), b.f32_samples()) else {
        return Err(FrameError::InvalidState("mix: audio is not f32le".to_string()));
    };
    let mixed: Vec<f32> = ours
        .iter()
        .enumerate()
        .map(|(i, s)| theirs.get(i).map_or(*s, |t| s.mul_add(1.0 - mix, t * mix)))
        .collect();
    *a = Audio::from_f32(a.frequency, a.channels, &mixed)?;
    Ok(())
}
