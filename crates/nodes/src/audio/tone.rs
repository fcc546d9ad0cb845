// SPDX-FileCopyrightText: © 2025 FrameKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

use framekit_core::{
    sample_calculator, sample_calculator_to_now, Audio, AudioFormat, Frame, Producer,
    StandardHooks,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

fn amplitude_schema(_gen: &mut schemars::SchemaGenerator) -> schemars::Schema {
    schemars::json_schema!({
        "type": "number",
        "default": 0.5,
        "minimum": 0.0,
        "maximum": 1.0,
        "description": "Peak amplitude relative to full scale. Range: 0.0 to 1.0"
    })
}

/// The configuration struct for the ToneProducer.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
#[serde(default)]
pub struct ToneConfig {
    /// Sine frequency in Hz.
    pub frequency_hz: f64,
    #[schemars(schema_with = "amplitude_schema")]
    pub amplitude: f32,
    /// Used when the consumer's request leaves the sample rate open.
    pub sample_rate: u32,
    /// Used when the consumer's request leaves the channel count open.
    pub channels: usize,
    /// Native sample format: s16 or f32le.
    pub format: AudioFormat,
}

impl Default for ToneConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 1000.0,
            amplitude: 0.5,
            sample_rate: 48_000,
            channels: 2,
            format: AudioFormat::S16,
        }
    }
}

impl ToneConfig {
    /// # Errors
    ///
    /// Returns an error if any parameter is out of range.
    pub fn validate(&self) -> Result<(), String> {
        if !self.frequency_hz.is_finite() || self.frequency_hz <= 0.0 {
            return Err(format!("Tone frequency must be positive, got: {}", self.frequency_hz));
        }
        if !self.amplitude.is_finite() || !(0.0..=1.0).contains(&self.amplitude) {
            return Err(format!("Amplitude must be between 0 and 1, got: {}", self.amplitude));
        }
        if self.sample_rate == 0 || self.channels == 0 {
            return Err("Sample rate and channel count must be non-zero".to_string());
        }
        if !matches!(self.format, AudioFormat::S16 | AudioFormat::F32le) {
            return Err(format!("Tone producer cannot render {}", self.format));
        }
        Ok(())
    }
}

/// Produces a continuous sine tone; the image is left to the test card.
///
/// Each frame starts at the sample offset implied by its position, so the
/// waveform is continuous across frames and after seeks.
pub struct ToneProducer {
    config: ToneConfig,
}

impl ToneProducer {
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: ToneConfig) -> Result<Self, String> {
        config.validate()?;
        Ok(Self { config })
    }
}

impl Producer for ToneProducer {
    fn id(&self) -> &str {
        "audio::tone"
    }

    fn get_frame(&self, position: i64) -> framekit_core::Result<Frame> {
        let mut frame = Frame::new(position);
        frame.set_hooks(StandardHooks::shared());

        let config = self.config.clone();
        frame.push_audio(move |frame, request| {
            let frequency = if request.frequency == 0 { config.sample_rate } else { request.frequency };
            let channels = if request.channels == 0 { config.channels } else { request.channels };
            let fps = frame.fps();
            let samples = if request.samples == 0 {
                usize::try_from(sample_calculator(fps, frequency, position)).unwrap_or(0)
            } else {
                request.samples
            };
            let offset = sample_calculator_to_now(fps, frequency, position - 1);

            tracing::trace!(position, offset, samples, frequency, "Rendering tone");
            let wave = (0..samples).map(|i| {
                tone_sample(config.frequency_hz, config.amplitude, frequency, offset + i64::try_from(i).unwrap_or(0))
            });
            if config.format == AudioFormat::F32le {
                let pcm: Vec<f32> = wave.flat_map(|s| std::iter::repeat_n(s, channels)).collect();
                Audio::from_f32(frequency, channels, &pcm)
            } else {
                let pcm: Vec<i16> =
                    wave.flat_map(|s| std::iter::repeat_n(to_s16(s), channels)).collect();
                Audio::from_s16(frequency, channels, &pcm)
            }
        });
        Ok(frame)
    }
}

/// Value of sample `n` of the tone, in [-1, 1].
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn tone_sample(tone_hz: f64, amplitude: f32, frequency: u32, n: i64) -> f32 {
    let t = n as f64 / f64::from(frequency);
    ((TAU * tone_hz * t).sin() * f64::from(amplitude)) as f32
}

#[allow(clippy::cast_possible_truncation)]
fn to_s16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)).round() as i16
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use framekit_core::AudioRequest;

    #[test]
    fn validates_config() {
        assert!(ToneProducer::new(ToneConfig { amplitude: 1.5, ..Default::default() }).is_err());
        assert!(ToneProducer::new(ToneConfig { format: AudioFormat::U8, ..Default::default() })
            .is_err());
        assert!(ToneProducer::new(ToneConfig { frequency_hz: 0.0, ..Default::default() }).is_err());
        assert!(ToneProducer::new(ToneConfig::default()).is_ok());
    }

    #[test]
    fn sample_count_follows_the_frame_rate() {
        let producer = ToneProducer::new(ToneConfig::default()).unwrap();
        let mut frame = producer.get_frame(0).unwrap();
        frame.set_double(framekit_core::keys::FPS, 30000.0 / 1001.0);
        let audio = frame.get_audio(&AudioRequest::new(AudioFormat::S16, 48_000, 2, 0)).unwrap();
        assert_eq!(audio.samples, 1602);
        assert_eq!(audio.channels, 2);
        assert!(!frame.is_test_audio());
    }

    #[test]
    fn waveform_is_continuous_across_frames() {
        let config = ToneConfig { frequency_hz: 440.0, format: AudioFormat::F32le, ..Default::default() };
        let producer = ToneProducer::new(config).unwrap();
        let request = AudioRequest::new(AudioFormat::F32le, 48_000, 1, 0);

        let mut joined = Vec::new();
        for position in 0..3 {
            let mut frame = producer.get_frame(position).unwrap();
            joined.extend(frame.get_audio(&request).unwrap().f32_samples().unwrap());
        }
        assert_eq!(joined.len(), 3 * 1920);
        for (n, sample) in joined.iter().enumerate() {
            let expected = tone_sample(440.0, 0.5, 48_000, i64::try_from(n).unwrap());
            assert!((sample - expected).abs() < 1e-6, "discontinuity at {n}");
        }
    }

    #[test]
    fn converts_to_the_requested_format() {
        let producer = ToneProducer::new(ToneConfig::default()).unwrap();
        let mut frame = producer.get_frame(5).unwrap();
        let audio = frame.get_audio(&AudioRequest::new(AudioFormat::S32le, 44_100, 1, 10)).unwrap();
        assert_eq!(audio.format, AudioFormat::S32le);
        assert_eq!(audio.frequency, 44_100);
        assert_eq!(audio.samples, 10);
    }
}
