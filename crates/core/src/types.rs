// SPDX-FileCopyrightText: © 2025 FrameKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Media payloads that a pull resolves to, and the requests that drive a pull.
//!
//! - [`Image`]: pixel data tagged with its [`ImageFormat`] and geometry
//! - [`Audio`]: sample data tagged with its [`AudioFormat`], rate and layout
//! - [`AlphaMask`]: 8-bit coverage per pixel
//! - [`Waveform`]: rasterised amplitude view, owned by the caller
//! - [`ImageRequest`] / [`AudioRequest`]: what the consumer asks for
//!
//! # Immutability by Default
//! Payloads keep their bytes behind an `Arc<MediaBuffer>`:
//! - Cloning is cheap (O(1), a refcount increment)
//! - A read-only consumer (`writable = false`) shares the frame's buffer
//! - Mutation goes through `make_data_mut()`, which copies only if shared

use crate::buffer::MediaBuffer;
use crate::error::{FrameError, Result};
use crate::format::{AudioFormat, ImageFormat};
use std::sync::Arc;

/// What the consumer wants out of `Frame::get_image`.
///
/// A `format` of [`ImageFormat::None`] accepts whatever the chain produces.
/// Zero dimensions leave the size to the producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImageRequest {
    pub format: ImageFormat,
    pub width: usize,
    pub height: usize,
    /// The consumer intends to mutate the returned buffer.
    pub writable: bool,
}

impl ImageRequest {
    pub const fn new(format: ImageFormat, width: usize, height: usize) -> Self {
        Self { format, width, height, writable: false }
    }

    #[must_use]
    pub const fn writable(mut self, writable: bool) -> Self {
        self.writable = writable;
        self
    }

    /// Same geometry, different format.
    #[must_use]
    pub const fn with_format(mut self, format: ImageFormat) -> Self {
        self.format = format;
        self
    }
}

/// What the consumer wants out of `Frame::get_audio`.
///
/// Zero values leave the choice to the producer; `AudioFormat::None` accepts
/// the produced format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AudioRequest {
    pub format: AudioFormat,
    pub frequency: u32,
    pub channels: usize,
    pub samples: usize,
}

impl AudioRequest {
    pub const fn new(format: AudioFormat, frequency: u32, channels: usize, samples: usize) -> Self {
        Self { format, frequency, channels, samples }
    }

    #[must_use]
    pub const fn with_format(mut self, format: AudioFormat) -> Self {
        self.format = format;
        self
    }
}

/// A resolved image.
#[derive(Debug, Clone)]
pub struct Image {
    pub format: ImageFormat,
    pub width: usize,
    pub height: usize,
    data: Arc<MediaBuffer>,
}

impl Image {
    /// Wrap a buffer that already holds `format` data for `width` x `height`.
    ///
    /// # Errors
    ///
    /// Returns `FrameError::InvalidState` if the buffer is smaller than the layout requires.
    pub fn new(format: ImageFormat, width: usize, height: usize, data: MediaBuffer) -> Result<Self> {
        let needed = format.buffer_size(width, height);
        if data.len() < needed {
            return Err(FrameError::InvalidState(format!(
                "{format} image {width}x{height} needs {needed} bytes, buffer has {}",
                data.len()
            )));
        }
        Ok(Self { format, width, height, data: Arc::new(data) })
    }

    /// # Errors
    ///
    /// Returns `FrameError::InvalidState` if `data` is too short for the layout.
    pub fn from_vec(format: ImageFormat, width: usize, height: usize, data: Vec<u8>) -> Result<Self> {
        Self::new(format, width, height, MediaBuffer::from_vec(data))
    }

    /// Allocate a zeroed image.
    ///
    /// # Errors
    ///
    /// Returns `FrameError::AllocationFailure` if the storage cannot be obtained.
    pub fn alloc(format: ImageFormat, width: usize, height: usize) -> Result<Self> {
        Self::new(format, width, height, MediaBuffer::alloc(format.buffer_size(width, height))?)
    }

    /// The layout-sized view of the pixel data.
    pub fn data(&self) -> &[u8] {
        &self.data.as_slice()[..self.format.buffer_size(self.width, self.height)]
    }

    /// Mutable pixel data, cloning the buffer first if it is shared.
    pub fn make_data_mut(&mut self) -> &mut [u8] {
        let size = self.format.buffer_size(self.width, self.height);
        &mut Arc::make_mut(&mut self.data).as_mut_slice()[..size]
    }

    /// True if no other `Image` shares this buffer.
    pub fn has_unique_data(&self) -> bool {
        Arc::strong_count(&self.data) == 1
    }

    /// True if both images share one buffer.
    pub fn shares_data_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    pub const fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    /// Swap in converted data, updating the descriptor in the same step.
    pub(crate) fn replace_data(&mut self, format: ImageFormat, data: MediaBuffer) {
        self.format = format;
        self.data = Arc::new(data);
    }
}

/// Resolved audio.
#[derive(Debug, Clone)]
pub struct Audio {
    pub format: AudioFormat,
    pub frequency: u32,
    pub channels: usize,
    /// Sample frames per channel.
    pub samples: usize,
    data: Arc<MediaBuffer>,
}

impl Audio {
    /// Wrap a buffer that already holds `format` samples.
    ///
    /// # Errors
    ///
    /// Returns `FrameError::InvalidState` if the buffer is smaller than the layout requires.
    pub fn new(
        format: AudioFormat,
        frequency: u32,
        channels: usize,
        samples: usize,
        data: MediaBuffer,
    ) -> Result<Self> {
        let needed = format.buffer_size(samples, channels);
        if data.len() < needed {
            return Err(FrameError::InvalidState(format!(
                "{format} audio {samples}x{channels} needs {needed} bytes, buffer has {}",
                data.len()
            )));
        }
        Ok(Self { format, frequency, channels, samples, data: Arc::new(data) })
    }

    /// # Errors
    ///
    /// Returns `FrameError::InvalidState` if `data` is too short for the layout.
    pub fn from_vec(
        format: AudioFormat,
        frequency: u32,
        channels: usize,
        samples: usize,
        data: Vec<u8>,
    ) -> Result<Self> {
        Self::new(format, frequency, channels, samples, MediaBuffer::from_vec(data))
    }

    /// Build interleaved 16-bit audio from samples.
    ///
    /// # Errors
    ///
    /// Returns `FrameError::InvalidState` if the sample count is not a multiple of `channels`.
    pub fn from_s16(frequency: u32, channels: usize, pcm: &[i16]) -> Result<Self> {
        if channels == 0 || pcm.len() % channels != 0 {
            return Err(FrameError::InvalidState(format!(
                "{} samples cannot be split across {channels} channels",
                pcm.len()
            )));
        }
        let bytes = pcm.iter().flat_map(|s| s.to_le_bytes()).collect();
        Self::from_vec(AudioFormat::S16, frequency, channels, pcm.len() / channels, bytes)
    }

    /// Build interleaved float audio from samples.
    ///
    /// # Errors
    ///
    /// Returns `FrameError::InvalidState` if the sample count is not a multiple of `channels`.
    pub fn from_f32(frequency: u32, channels: usize, pcm: &[f32]) -> Result<Self> {
        if channels == 0 || pcm.len() % channels != 0 {
            return Err(FrameError::InvalidState(format!(
                "{} samples cannot be split across {channels} channels",
                pcm.len()
            )));
        }
        let bytes = pcm.iter().flat_map(|s| s.to_le_bytes()).collect();
        Self::from_vec(AudioFormat::F32le, frequency, channels, pcm.len() / channels, bytes)
    }

    /// Allocate silence. Every supported format is silent at all-zero bytes
    /// except `U8`, whose midpoint is 128.
    ///
    /// # Errors
    ///
    /// Returns `FrameError::AllocationFailure` if the storage cannot be obtained.
    pub fn silence(
        format: AudioFormat,
        frequency: u32,
        channels: usize,
        samples: usize,
    ) -> Result<Self> {
        let len = format.buffer_size(samples, channels);
        let data = if format == AudioFormat::U8 {
            MediaBuffer::filled(len, 128)?
        } else {
            MediaBuffer::alloc(len)?
        };
        Self::new(format, frequency, channels, samples, data)
    }

    pub fn data(&self) -> &[u8] {
        &self.data.as_slice()[..self.format.buffer_size(self.samples, self.channels)]
    }

    /// Mutable sample data, cloning the buffer first if it is shared.
    pub fn make_data_mut(&mut self) -> &mut [u8] {
        let size = self.format.buffer_size(self.samples, self.channels);
        &mut Arc::make_mut(&mut self.data).as_mut_slice()[..size]
    }

    pub fn has_unique_data(&self) -> bool {
        Arc::strong_count(&self.data) == 1
    }

    pub fn shares_data_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    /// Interleaved 16-bit view; `None` unless the format is `S16`.
    pub fn s16_samples(&self) -> Option<Vec<i16>> {
        (self.format == AudioFormat::S16).then(|| {
            self.data().chunks_exact(2).map(|b| i16::from_le_bytes([b[0], b[1]])).collect()
        })
    }

    /// Interleaved float view; `None` unless the format is `F32le`.
    pub fn f32_samples(&self) -> Option<Vec<f32>> {
        (self.format == AudioFormat::F32le).then(|| {
            self.data()
                .chunks_exact(4)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect()
        })
    }

    /// Duration in microseconds; `None` if the frequency is 0.
    pub fn duration_us(&self) -> Option<u64> {
        crate::timing::samples_to_duration_us(self.samples as u64, self.frequency)
    }

    pub(crate) fn replace_data(&mut self, format: AudioFormat, data: MediaBuffer) {
        self.format = format;
        self.data = Arc::new(data);
    }
}

/// 8-bit alpha per pixel, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlphaMask {
    pub width: usize,
    pub height: usize,
    data: Arc<[u8]>,
}

impl AlphaMask {
    /// # Errors
    ///
    /// Returns `FrameError::InvalidState` if `data` is not `width * height` bytes.
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Result<Self> {
        if data.len() != width * height {
            return Err(FrameError::InvalidState(format!(
                "alpha mask {width}x{height} needs {} bytes, got {}",
                width * height,
                data.len()
            )));
        }
        Ok(Self { width, height, data: data.into() })
    }

    /// A fully opaque mask.
    pub fn opaque(width: usize, height: usize) -> Self {
        Self { width, height, data: vec![0xFF; width * height].into() }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn is_opaque(&self) -> bool {
        self.data.iter().all(|&a| a == 0xFF)
    }

    pub const fn matches(&self, width: usize, height: usize) -> bool {
        self.width == width && self.height == height
    }
}

/// Rasterised amplitude view of a frame's audio. Owned by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Waveform {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl Waveform {
    pub fn pixel(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }
}
