// SPDX-FileCopyrightText: © 2025 FrameKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Test utilities for service testing

use framekit_core::{Audio, Frame, Image, ImageFormat};

/// A frame whose image is a solid RGBA fill at whatever size is requested.
pub fn frame_with_rgba(rgba: [u8; 4]) -> Frame {
    let mut frame = Frame::new(0);
    frame.push_get_image(move |_, request| {
        let (width, height) = (request.width.max(1), request.height.max(1));
        let data = rgba.iter().copied().cycle().take(width * height * 4).collect();
        Image::from_vec(ImageFormat::Rgb24a, width, height, data)
    });
    frame
}

/// A frame whose audio is a constant float level at whatever shape is requested.
pub fn frame_with_audio(level: f32) -> Frame {
    let mut frame = Frame::new(0);
    frame.push_audio(move |_, request| {
        let channels = request.channels.max(1);
        Audio::from_f32(request.frequency, channels, &vec![level; request.samples * channels])
    });
    frame
}
