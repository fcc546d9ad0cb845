// SPDX-FileCopyrightText: © 2025 FrameKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Pixel and sample format descriptors.
//!
//! Both enumerations are closed sets. Every layout knows its byte size for a
//! given geometry, which is what buffer allocation and conversion validation
//! rely on.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Describes the layout of image data.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// No image, or "whatever the producer has" when used in a request.
    #[default]
    None,
    /// Packed 8-bit R, G, B.
    Rgb24,
    /// Packed 8-bit R, G, B, A.
    Rgb24a,
    /// Packed 8-bit Y0 Cb Y1 Cr.
    Yuv422,
    /// Planar 8-bit Y, Cb, Cr with chroma subsampled both ways.
    Yuv420p,
    /// Planar 16-bit little-endian Y, Cb, Cr with horizontally subsampled chroma.
    Yuv422p16,
}

impl ImageFormat {
    pub const ALL: [Self; 6] =
        [Self::None, Self::Rgb24, Self::Rgb24a, Self::Yuv422, Self::Yuv420p, Self::Yuv422p16];

    /// Human-readable name for diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Rgb24 => "rgb24",
            Self::Rgb24a => "rgb24a",
            Self::Yuv422 => "yuv422",
            Self::Yuv420p => "yuv420p",
            Self::Yuv422p16 => "yuv422p16",
        }
    }

    /// Size in bytes of a `width` x `height` image in this layout.
    ///
    /// Chroma planes of subsampled layouts round up for odd dimensions.
    pub const fn buffer_size(self, width: usize, height: usize) -> usize {
        let pixels = width * height;
        let half_width = width.div_ceil(2);
        match self {
            Self::None => 0,
            Self::Rgb24 => pixels * 3,
            Self::Rgb24a => pixels * 4,
            Self::Yuv422 => half_width * 2 * height * 2,
            Self::Yuv420p => pixels + 2 * half_width * height.div_ceil(2),
            Self::Yuv422p16 => (pixels + 2 * half_width * height) * 2,
        }
    }

    pub const fn has_alpha(self) -> bool {
        matches!(self, Self::Rgb24a)
    }

    pub const fn is_yuv(self) -> bool {
        matches!(self, Self::Yuv422 | Self::Yuv420p | Self::Yuv422p16)
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ImageFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|fmt| fmt.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown image format '{s}'"))
    }
}

/// Describes the layout of audio sample data.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    /// No audio, or "whatever the producer has" when used in a request.
    #[default]
    None,
    /// Signed 16-bit, interleaved.
    S16,
    /// Signed 32-bit, planar.
    S32,
    /// 32-bit float, planar.
    Float,
    /// Signed 32-bit little-endian, interleaved.
    S32le,
    /// 32-bit float little-endian, interleaved.
    F32le,
    /// Unsigned 8-bit, interleaved.
    U8,
}

impl AudioFormat {
    pub const ALL: [Self; 7] =
        [Self::None, Self::S16, Self::S32, Self::Float, Self::S32le, Self::F32le, Self::U8];

    /// Human-readable name for diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::S16 => "s16",
            Self::S32 => "s32",
            Self::Float => "float",
            Self::S32le => "s32le",
            Self::F32le => "f32le",
            Self::U8 => "u8",
        }
    }

    pub const fn bytes_per_sample(self) -> usize {
        match self {
            Self::None => 0,
            Self::U8 => 1,
            Self::S16 => 2,
            Self::S32 | Self::Float | Self::S32le | Self::F32le => 4,
        }
    }

    /// Size in bytes of `samples` sample frames across `channels` channels.
    pub const fn buffer_size(self, samples: usize, channels: usize) -> usize {
        samples * channels * self.bytes_per_sample()
    }

    pub const fn is_planar(self) -> bool {
        matches!(self, Self::S32 | Self::Float)
    }

    pub const fn is_float(self) -> bool {
        matches!(self, Self::Float | Self::F32le)
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AudioFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|fmt| fmt.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown audio format '{s}'"))
    }
}
