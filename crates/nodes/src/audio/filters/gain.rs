// SPDX-FileCopyrightText: © 2025 FrameKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

use framekit_core::convert::audio::apply_gain;
use framekit_core::{Filter, Frame};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

fn gain_schema(_gen: &mut schemars::SchemaGenerator) -> schemars::Schema {
    schemars::json_schema!({
        "type": "number",
        "default": 1.0,
        "minimum": 0.0,
        "maximum": 4.0,
        "description": "Linear gain multiplier. 0.0 = mute, 1.0 = unity (no change), 2.0 = +6dB, 4.0 = +12dB. Range: 0.0 to 4.0"
    })
}

/// The configuration struct for the AudioGainFilter.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
#[serde(default)]
pub struct AudioGainConfig {
    /// A linear multiplier for the audio amplitude (e.g., 0.5 is -6dB).
    /// Valid range: 0.0 to 4.0
    #[schemars(schema_with = "gain_schema")]
    pub gain: f32,
}

impl Default for AudioGainConfig {
    fn default() -> Self {
        Self { gain: 1.0 } // Default to no volume change
    }
}

impl AudioGainConfig {
    /// Validate the gain parameter is within acceptable bounds.
    ///
    /// # Errors
    ///
    /// Returns an error if the gain is outside the range [0.0, 4.0] or is NaN/infinite.
    pub fn validate(&self) -> Result<(), String> {
        const MIN_GAIN: f32 = 0.0;
        const MAX_GAIN: f32 = 4.0;

        if !self.gain.is_finite() {
            return Err(format!("Gain must be a finite number, got: {}", self.gain));
        }

        if self.gain < MIN_GAIN || self.gain > MAX_GAIN {
            return Err(format!(
                "Gain must be between {} and {}, got: {}",
                MIN_GAIN, MAX_GAIN, self.gain
            ));
        }

        Ok(())
    }
}

/// A filter that adjusts the volume of a frame's audio when it is pulled.
/// Works in whatever sample format the consumer asked for.
pub struct AudioGainFilter {
    config: AudioGainConfig,
}

impl AudioGainFilter {
    /// Create a new audio gain filter with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the gain configuration is invalid (e.g., out of range or non-finite).
    pub fn new(config: AudioGainConfig) -> Result<Self, String> {
        config.validate()?;
        Ok(Self { config })
    }
}

impl Filter for AudioGainFilter {
    fn id(&self) -> &str {
        "audio::gain"
    }

    fn process(&self, frame: &mut Frame) -> framekit_core::Result<()> {
        let gain = f64::from(self.config.gain);
        frame.push_audio(move |frame, request| {
            let mut audio = frame.get_audio(request)?;
            // Copy-on-write: clones only if the buffer is shared
            apply_gain(&mut audio, gain)?;
            Ok(audio)
        });
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use framekit_core::{Audio, AudioFormat, AudioRequest};

    #[test]
    fn test_gain_validation() {
        assert!(AudioGainFilter::new(AudioGainConfig { gain: 1.0 }).is_ok());
        assert!(AudioGainFilter::new(AudioGainConfig { gain: 0.0 }).is_ok());
        assert!(AudioGainFilter::new(AudioGainConfig { gain: 4.0 }).is_ok());
        assert!(AudioGainFilter::new(AudioGainConfig { gain: -0.1 }).is_err());
        assert!(AudioGainFilter::new(AudioGainConfig { gain: 4.1 }).is_err());
        assert!(AudioGainFilter::new(AudioGainConfig { gain: f32::NAN }).is_err());
        assert!(AudioGainFilter::new(AudioGainConfig { gain: f32::INFINITY }).is_err());
    }

    #[test]
    fn test_gain_applied_on_pull() {
        let mut frame = Frame::new(0);
        frame.push_audio(|_, _| Audio::from_f32(48_000, 2, &[0.1, -0.2, 0.3, -0.4]));
        AudioGainFilter::new(AudioGainConfig { gain: 2.0 }).unwrap().process(&mut frame).unwrap();

        let audio = frame.get_audio(&AudioRequest::new(AudioFormat::F32le, 48_000, 2, 2)).unwrap();
        let samples = audio.f32_samples().unwrap();
        for (got, want) in samples.iter().zip([0.2, -0.4, 0.6, -0.8]) {
            assert!((got - want).abs() < 1e-6);
        }
    }

    #[test]
    fn test_upstream_buffer_is_not_mutated() {
        let source = Audio::from_s16(48_000, 1, &[1000, -1000]).unwrap();
        let upstream = source.clone();
        let mut frame = Frame::new(0);
        frame.push_audio(move |_, _| Ok(upstream.clone()));
        AudioGainFilter::new(AudioGainConfig { gain: 0.5 }).unwrap().process(&mut frame).unwrap();

        let audio = frame.get_audio(&AudioRequest::new(AudioFormat::S16, 48_000, 1, 2)).unwrap();
        assert_eq!(audio.s16_samples().unwrap(), vec![500, -500]);
        assert_eq!(source.s16_samples().unwrap(), vec![1000, -1000]);
    }

    #[test]
    fn test_muted_frame_skips_gain() {
        let mut frame = Frame::new(0);
        frame.set_int(framekit_core::keys::TEST_AUDIO, 1);
        AudioGainFilter::new(AudioGainConfig { gain: 4.0 }).unwrap().process(&mut frame).unwrap();

        let audio = frame.get_audio(&AudioRequest::new(AudioFormat::S16, 48_000, 1, 4)).unwrap();
        assert!(audio.data().iter().all(|&b| b == 0));
        assert!(frame.audio_stack().is_empty());
    }
}
