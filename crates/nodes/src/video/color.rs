// SPDX-FileCopyrightText: © 2025 FrameKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

use framekit_core::{
    frame_defaults, keys, rgb_to_yuv, AlphaMask, Frame, FrameError, Image, ImageFormat,
    MediaBuffer, Producer, StandardHooks,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The configuration struct for the ColorProducer.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
#[serde(default)]
pub struct ColorConfig {
    /// `#RRGGBB`, `#RRGGBBAA`, `0xRRGGBBAA` or one of
    /// black, white, red, green, blue, transparent.
    pub color: String,
    /// Layout the producer renders in: rgb24, rgb24a or yuv422.
    pub format: ImageFormat,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self { color: "black".to_string(), format: ImageFormat::Rgb24a }
    }
}

impl ColorConfig {
    /// Validate the color and format.
    ///
    /// # Errors
    ///
    /// Returns an error if the color cannot be parsed or the format is not renderable.
    pub fn validate(&self) -> Result<[u8; 4], String> {
        if !matches!(self.format, ImageFormat::Rgb24 | ImageFormat::Rgb24a | ImageFormat::Yuv422) {
            return Err(format!("Color producer cannot render {}", self.format));
        }
        parse_color(&self.color)
    }
}

/// Parses a color into RGBA.
///
/// # Errors
///
/// Returns an error for unknown names or malformed hex.
pub fn parse_color(color: &str) -> Result<[u8; 4], String> {
    let named = match color.to_ascii_lowercase().as_str() {
        "black" => Some([0, 0, 0, 255]),
        "white" => Some([255, 255, 255, 255]),
        "red" => Some([255, 0, 0, 255]),
        "green" => Some([0, 255, 0, 255]),
        "blue" => Some([0, 0, 255, 255]),
        "transparent" => Some([0, 0, 0, 0]),
        _ => None,
    };
    if let Some(rgba) = named {
        return Ok(rgba);
    }

    let hex = color
        .strip_prefix('#')
        .or_else(|| color.strip_prefix("0x"))
        .ok_or_else(|| format!("Unrecognised color '{color}'"))?;
    if !matches!(hex.len(), 6 | 8) || !hex.is_ascii() {
        return Err(format!("Color '{color}' must have 6 or 8 hex digits"));
    }
    let mut rgba = [0, 0, 0, 255];
    for (i, slot) in rgba.iter_mut().enumerate().take(hex.len() / 2) {
        *slot = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
            .map_err(|e| format!("Color '{color}': {e}"))?;
    }
    Ok(rgba)
}

/// Produces frames of a single solid color with muted audio.
pub struct ColorProducer {
    id: String,
    rgba: [u8; 4],
    format: ImageFormat,
}

impl ColorProducer {
    /// Create a new color producer with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: &ColorConfig) -> Result<Self, String> {
        let rgba = config.validate()?;
        Ok(Self { id: format!("color:{}", config.color), rgba, format: config.format })
    }

    pub const fn rgba(&self) -> [u8; 4] {
        self.rgba
    }
}

impl Producer for ColorProducer {
    fn id(&self) -> &str {
        &self.id
    }

    fn get_frame(&self, position: i64) -> framekit_core::Result<Frame> {
        let mut frame = Frame::new(position);
        frame.set_hooks(StandardHooks::shared());
        frame.set_int(keys::TEST_AUDIO, 1);

        let (rgba, format) = (self.rgba, self.format);
        frame.push_get_image(move |frame, request| {
            let defaults = frame_defaults();
            let width = if request.width == 0 { defaults.width } else { request.width };
            let height = if request.height == 0 { defaults.height } else { request.height };
            let image = render(rgba, format, width, height)?;
            if format == ImageFormat::Yuv422 && rgba[3] != 0xFF {
                frame.set_alpha(AlphaMask::new(width, height, vec![rgba[3]; width * height])?);
            }
            Ok(image)
        });
        Ok(frame)
    }
}

fn render(rgba: [u8; 4], format: ImageFormat, width: usize, height: usize) -> Result<Image, FrameError> {
    let mut data = MediaBuffer::alloc(format.buffer_size(width, height))?;
    let dst = data.as_mut_slice();
    match format {
        ImageFormat::Rgb24 => dst.chunks_exact_mut(3).for_each(|px| px.copy_from_slice(&rgba[..3])),
        ImageFormat::Rgb24a => dst.chunks_exact_mut(4).for_each(|px| px.copy_from_slice(&rgba)),
        _ => {
            let (y, u, v) = rgb_to_yuv(rgba[0], rgba[1], rgba[2]);
            dst.chunks_exact_mut(4).for_each(|pair| pair.copy_from_slice(&[y, u, y, v]));
        },
    }
    Image::new(format, width, height, data)
}
