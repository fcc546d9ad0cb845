// SPDX-FileCopyrightText: © 2025 FrameKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Audio retrieval protocol, mirroring the image one.

use crate::buffer::{Destructor, MediaBuffer};
use crate::convert::audio::{apply_gain, remix};
use crate::error::{FrameError, Result};
use crate::format::AudioFormat;
use crate::frame::{drain_stale, Frame};
use crate::frame_config::frame_defaults;
use crate::properties::keys;
use crate::stack::{GetAudio, StackEntry};
use crate::timing::sample_calculator;
use crate::types::{Audio, AudioRequest, Waveform};

/// Sample rate the waveform view pulls at.
const WAVEFORM_FREQUENCY: u32 = 48_000;

impl Frame {
    pub const fn audio_stack(&self) -> &crate::stack::OperationStack {
        &self.audio_stack
    }

    /// Queues a deferred audio operation.
    pub fn push_audio<F>(&mut self, callback: F)
    where
        F: FnOnce(&mut Self, &AudioRequest) -> Result<Audio> + Send + 'static,
    {
        self.audio_stack.push(StackEntry::GetAudio(Box::new(callback)));
    }

    /// Pops the most recently pushed audio callback.
    ///
    /// # Errors
    ///
    /// `FrameError::EmptyStack` when no operations remain.
    /// `FrameError::InvalidState` if the top entry is not a callback; it stays in place.
    pub fn pop_audio(&mut self) -> Result<GetAudio> {
        match self.audio_stack.pop()? {
            StackEntry::GetAudio(callback) => Ok(callback),
            other => {
                let err = FrameError::InvalidState(format!(
                    "expected get_audio on audio stack, found {}",
                    other.kind()
                ));
                self.audio_stack.push(other);
                Err(err)
            },
        }
    }

    /// Pulls the frame's audio.
    ///
    /// A muted frame (`test_audio` set, or the audio bit of `hide`) skips its
    /// callbacks. Otherwise the top callback runs; failing that the resolved
    /// audio is returned, and failing that silence flagged with
    /// `test_audio=1`. The result is converted to `request.format` unless it
    /// is `None`, remixed to `request.channels` unless that is 0, and a
    /// pending `meta.volume` is applied once.
    ///
    /// # Errors
    ///
    /// `FrameError::UnsupportedConversion` when negotiation fails,
    /// `FrameError::InvalidState` for a malformed stack,
    /// `FrameError::AllocationFailure` if silence cannot be allocated.
    pub fn get_audio(&mut self, request: &AudioRequest) -> Result<Audio> {
        self.audio_depth += 1;
        let result = self.resolve_audio(request);
        self.audio_depth -= 1;
        if self.audio_depth == 0 {
            drain_stale(&mut self.audio_stack, "audio");
        }
        result
    }

    fn resolve_audio(&mut self, request: &AudioRequest) -> Result<Audio> {
        let muted = self.is_test_audio() || self.is_muted();
        let popped = if muted { Err(FrameError::EmptyStack) } else { self.pop_audio() };

        let mut audio = match popped {
            Ok(callback) => match callback(self, request) {
                Ok(audio) => audio,
                Err(e) => {
                    tracing::warn!(
                        position = self.position(),
                        error = %e,
                        "Audio operation failed, substituting silence"
                    );
                    self.test_audio(request)?
                },
            },
            Err(FrameError::EmptyStack) => match &self.audio {
                Some(resolved) => resolved.clone(),
                None => self.test_audio(request)?,
            },
            Err(e) => return Err(e),
        };

        if request.format != AudioFormat::None && audio.format != request.format {
            self.convert_audio(&mut audio, request.format)?;
        }
        if request.channels != 0 && audio.channels != request.channels {
            remix(&mut audio, request.channels)?;
        }

        if let Some(volume) = self.properties_mut().remove(keys::META_VOLUME) {
            let gain = volume.as_double().unwrap_or(1.0);
            tracing::trace!(gain, "Applying pending volume");
            apply_gain(&mut audio, gain)?;
        }

        self.record_audio(&audio);
        self.audio = Some(audio.clone());
        Ok(audio)
    }

    fn test_audio(&mut self, request: &AudioRequest) -> Result<Audio> {
        let defaults = frame_defaults();
        let format = if request.format == AudioFormat::None { AudioFormat::S16 } else { request.format };
        let frequency = if request.frequency == 0 { defaults.frequency } else { request.frequency };
        let channels = if request.channels == 0 { defaults.channels } else { request.channels };
        let samples = if request.samples == 0 { defaults.samples } else { request.samples };

        tracing::debug!(position = self.position(), %format, frequency, channels, samples, "Generating silence");
        let audio = Audio::silence(format, frequency, channels, samples)?;
        self.set_int(keys::TEST_AUDIO, 1);
        Ok(audio)
    }

    fn record_audio(&mut self, audio: &Audio) {
        let props = self.properties_mut();
        props.set_int(keys::AUDIO_FREQUENCY, i64::from(audio.frequency));
        props.set_int(keys::AUDIO_CHANNELS, i64::try_from(audio.channels).unwrap_or(i64::MAX));
        props.set_int(keys::AUDIO_SAMPLES, i64::try_from(audio.samples).unwrap_or(i64::MAX));
        props.set_string(keys::AUDIO_FORMAT, audio.format.name());
    }

    /// Converts `audio` to `output` through the frame's hooks.
    ///
    /// # Errors
    ///
    /// `FrameError::UnsupportedConversion` if no hooks are installed or the
    /// pair is not implemented; `audio` is untouched in that case.
    pub fn convert_audio(&mut self, audio: &mut Audio, output: AudioFormat) -> Result<()> {
        if audio.format == output {
            return Ok(());
        }
        let Some(hooks) = self.hooks().cloned() else {
            return Err(FrameError::unsupported_audio(audio.format, output));
        };
        let from = audio.format;
        hooks.convert_audio(self, audio, output)?;
        tracing::trace!(%from, to = %output, hooks = hooks.name(), "Converted audio");
        Ok(())
    }

    /// Installs ready audio, taking ownership of `buffer`.
    ///
    /// With a `destructor`, the bytes are handed back to it exactly once when
    /// the frame drops them (replacement or teardown). Clears `test_audio`.
    ///
    /// # Errors
    ///
    /// `FrameError::InvalidState` if `buffer` is too small for the layout. The
    /// destructor still runs in that case, since ownership already moved.
    pub fn set_audio(
        &mut self,
        buffer: Vec<u8>,
        format: AudioFormat,
        frequency: u32,
        channels: usize,
        samples: usize,
        destructor: Option<Destructor>,
    ) -> Result<()> {
        let data = match destructor {
            Some(release) => MediaBuffer::with_destructor(buffer, release),
            None => MediaBuffer::from_vec(buffer),
        };
        let audio = Audio::new(format, frequency, channels, samples, data)?;
        self.replace_audio(audio);
        Ok(())
    }

    /// Records resolved audio. Pending audio operations are kept.
    pub fn replace_audio(&mut self, audio: Audio) {
        self.properties_mut().remove(keys::TEST_AUDIO);
        self.record_audio(&audio);
        self.audio = Some(audio);
    }

    /// The resolved audio, if any, without pulling.
    pub const fn audio(&self) -> Option<&Audio> {
        self.audio.as_ref()
    }

    pub fn is_test_audio(&self) -> bool {
        self.get_int(keys::TEST_AUDIO) != 0
    }

    /// Rasterises the frame's audio as an 8-bit `width` x `height` image.
    ///
    /// Pulls 16-bit audio for this frame's share of samples (from its
    /// position and `fps`), so any pending audio operations run. Each channel
    /// gets a horizontal band; each column accumulates `samples / width`
    /// samples drawn from the band's centre line with additive grey.
    ///
    /// # Errors
    ///
    /// `FrameError::InvalidState` for a zero dimension or if 16-bit audio
    /// cannot be resolved.
    pub fn get_waveform(&mut self, width: usize, height: usize) -> Result<Waveform> {
        if width == 0 || height == 0 {
            return Err(FrameError::InvalidState(format!(
                "waveform size must be non-zero, got {width}x{height}"
            )));
        }

        let count = sample_calculator(self.fps(), WAVEFORM_FREQUENCY, self.position());
        let samples = usize::try_from(count).ok().filter(|&n| n > 0).unwrap_or(frame_defaults().samples);
        let request = AudioRequest::new(AudioFormat::S16, WAVEFORM_FREQUENCY, 2, samples);
        let audio = self
            .get_audio(&request)
            .map_err(|e| FrameError::InvalidState(format!("waveform needs audio: {e}")))?;
        let pcm = audio
            .s16_samples()
            .ok_or_else(|| FrameError::InvalidState(format!("waveform needs s16, got {}", audio.format)))?;

        let channels = audio.channels.max(1);
        let band = (height / channels).max(1);
        let skip = (audio.samples / width).max(1);
        let gray = u8::try_from((255 / skip).max(1)).unwrap_or(u8::MAX);
        let mut data = vec![0u8; width * height];

        for x in 0..width {
            for s in (x * skip..(x + 1) * skip).take_while(|&s| s < audio.samples) {
                for channel in 0..channels {
                    let top = channel * band;
                    if top >= height {
                        break;
                    }
                    let bottom = (top + band).min(height) - 1;
                    let center = top + band / 2;
                    let sample = pcm[s * channels + channel];
                    let amplitude = usize::from(sample.unsigned_abs()) * (band / 2) / 32_767;
                    let (lo, hi) = if sample >= 0 {
                        (center.saturating_sub(amplitude).max(top), center.min(bottom))
                    } else {
                        (center.min(bottom), (center + amplitude).min(bottom))
                    };
                    for y in lo..=hi {
                        let px = &mut data[y * width + x];
                        *px = px.saturating_add(gray);
                    }
                }
            }
        }
        Ok(Waveform { width, height, data })
    }
}
