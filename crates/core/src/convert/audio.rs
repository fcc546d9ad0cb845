// SPDX-FileCopyrightText: © 2025 FrameKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Software sample-format converters.
//!
//! Samples are decoded to an interleaved intermediate that keeps integer
//! data as full-scale `i32` and float data as `f32`, so integer <-> integer
//! conversions are pure shifts and float <-> float ones are pure re-layouts.

use crate::buffer::MediaBuffer;
use crate::error::{FrameError, Result};
use crate::format::AudioFormat;
use crate::types::Audio;

/// Interleaved samples in their natural numeric domain.
enum Samples {
    Int(Vec<i32>),
    Float(Vec<f32>),
}

/// Converts `audio` to `output` in a new buffer, committing only on success.
///
/// # Errors
///
/// `FrameError::UnsupportedConversion` when either side is `None`,
/// `FrameError::AllocationFailure` if the output cannot be allocated.
pub fn convert(audio: &mut Audio, output: AudioFormat) -> Result<()> {
    let from = audio.format;
    if from == output {
        return Ok(());
    }
    if from == AudioFormat::None || output == AudioFormat::None {
        return Err(FrameError::unsupported_audio(from, output));
    }
    let samples = decode(audio);
    let data = encode(&samples, output, audio.samples, audio.channels)?;
    audio.replace_data(output, data);
    Ok(())
}

/// Scales every sample by `gain` in place. A gain of 0 writes silence.
///
/// # Errors
///
/// `FrameError::AllocationFailure` if a new buffer is needed and cannot be allocated.
#[allow(clippy::cast_possible_truncation)]
pub fn apply_gain(audio: &mut Audio, gain: f64) -> Result<()> {
    if audio.format == AudioFormat::None || (gain - 1.0).abs() < f64::EPSILON {
        return Ok(());
    }
    let scaled = match decode(audio) {
        Samples::Int(v) => Samples::Int(
            v.into_iter()
                .map(|s| (f64::from(s) * gain).round().clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32)
                .collect(),
        ),
        Samples::Float(v) => Samples::Float(v.into_iter().map(|s| (f64::from(s) * gain) as f32).collect()),
    };
    let data = encode(&scaled, audio.format, audio.samples, audio.channels)?;
    audio.replace_data(audio.format, data);
    Ok(())
}

/// Re-lays `audio` out over `channels` channels, keeping its format.
///
/// Upmixing repeats the source channels in order (mono fills every output
/// channel); downmixing averages every source channel `i` into output
/// channel `i % channels`.
///
/// # Errors
///
/// `FrameError::InvalidState` for zero channels or a `None` format,
/// `FrameError::AllocationFailure` if the output cannot be allocated.
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap, clippy::cast_precision_loss)]
pub fn remix(audio: &mut Audio, channels: usize) -> Result<()> {
    let from = audio.channels;
    if from == channels {
        return Ok(());
    }
    if channels == 0 || from == 0 || audio.format == AudioFormat::None {
        return Err(FrameError::InvalidState(format!(
            "cannot remix {} audio from {from} to {channels} channels",
            audio.format
        )));
    }

    let frames = audio.samples;
    // Source channels feeding each output channel.
    let sources: Vec<Vec<usize>> = (0..channels)
        .map(|c| if channels > from { vec![c % from] } else { (c..from).step_by(channels).collect() })
        .collect();
    let remixed = match decode(audio) {
        Samples::Int(v) => Samples::Int(fold_channels(&v, from, &sources, |sum: i64, n| {
            (sum / n as i64) as i32
        })),
        Samples::Float(v) => Samples::Float(fold_channels(&v, from, &sources, |sum: f32, n| sum / n as f32)),
    };
    let data = encode(&remixed, audio.format, frames, channels)?;
    audio.channels = channels;
    audio.replace_data(audio.format, data);
    tracing::trace!(from, to = channels, "Remixed audio channels");
    Ok(())
}

/// Sums each output channel's sources per sample frame and lets `average`
/// scale the sum by the number of sources.
fn fold_channels<T, A>(v: &[T], from: usize, sources: &[Vec<usize>], average: impl Fn(A, usize) -> T) -> Vec<T>
where
    T: Copy,
    A: std::iter::Sum<A> + From<T>,
{
    let mut out = Vec::with_capacity(v.len() / from * sources.len());
    for frame in v.chunks_exact(from) {
        for src in sources {
            let sum: A = src.iter().map(|&c| A::from(frame[c])).sum();
            out.push(average(sum, src.len()));
        }
    }
    out
}

/// Index of (sample, channel) in a buffer of `format`.
const fn slot(format: AudioFormat, sample: usize, channel: usize, samples: usize, channels: usize) -> usize {
    if format.is_planar() {
        channel * samples + sample
    } else {
        sample * channels + channel
    }
}

fn decode(audio: &Audio) -> Samples {
    let (format, samples, channels) = (audio.format, audio.samples, audio.channels);
    let data = audio.data();
    let bps = format.bytes_per_sample();
    let read4 = |i: usize| [data[i * 4], data[i * 4 + 1], data[i * 4 + 2], data[i * 4 + 3]];
    let mut ints = Vec::new();
    let mut floats = Vec::new();

    for sample in 0..samples {
        for channel in 0..channels {
            let i = slot(format, sample, channel, samples, channels);
            match format {
                AudioFormat::U8 => ints.push((i32::from(data[i]) - 128) << 24),
                AudioFormat::S16 => {
                    ints.push(i32::from(i16::from_le_bytes([data[i * bps], data[i * bps + 1]])) << 16);
                },
                AudioFormat::S32 | AudioFormat::S32le => ints.push(i32::from_le_bytes(read4(i))),
                AudioFormat::Float | AudioFormat::F32le => floats.push(f32::from_le_bytes(read4(i))),
                AudioFormat::None => {},
            }
        }
    }
    if format.is_float() {
        Samples::Float(floats)
    } else {
        Samples::Int(ints)
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, clippy::cast_sign_loss)]
fn encode(samples: &Samples, format: AudioFormat, count: usize, channels: usize) -> Result<MediaBuffer> {
    let mut out = MediaBuffer::alloc(format.buffer_size(count, channels))?;
    let dst = out.as_mut_slice();
    let bps = format.bytes_per_sample();

    for sample in 0..count {
        for channel in 0..channels {
            let src = sample * channels + channel;
            let o = slot(format, sample, channel, count, channels) * bps;
            if format.is_float() {
                let value = match samples {
                    Samples::Float(v) => v[src],
                    Samples::Int(v) => v[src] as f32 / 2_147_483_648.0,
                };
                dst[o..o + 4].copy_from_slice(&value.to_le_bytes());
                continue;
            }
            let value = match samples {
                Samples::Int(v) => v[src],
                Samples::Float(v) => (f64::from(v[src]).clamp(-1.0, 1.0) * f64::from(i32::MAX)).round() as i32,
            };
            match format {
                AudioFormat::U8 => dst[o] = ((value >> 24) + 128) as u8,
                AudioFormat::S16 => dst[o..o + 2].copy_from_slice(&((value >> 16) as i16).to_le_bytes()),
                _ => dst[o..o + 4].copy_from_slice(&value.to_le_bytes()),
            }
        }
    }
    Ok(out)
}
