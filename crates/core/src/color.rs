// SPDX-FileCopyrightText: © 2025 FrameKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! BT.601 RGB <-> YCbCr in 10-bit fixed point.
//!
//! The coefficients and shifts are fixed: codecs downstream expect these
//! exact roundings, so do not "improve" them.

/// Full-range RGB to broadcast-range YCbCr.
#[inline]
pub const fn rgb_to_yuv(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
    let (r, g, b) = (r as i32, g as i32, b as i32);
    let y = ((263 * r + 516 * g + 100 * b) >> 10) + 16;
    let u = ((-152 * r - 298 * g + 450 * b) >> 10) + 128;
    let v = ((450 * r - 377 * g - 73 * b) >> 10) + 128;
    (clamp_u8(y, 0, 255), clamp_u8(u, 0, 255), clamp_u8(v, 0, 255))
}

/// RGB already in broadcast range to YCbCr, clamped to legal levels:
/// luma to [16, 235], chroma to [16, 240].
#[inline]
pub const fn rgb_to_yuv_unscaled(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
    let (r, g, b) = (r as i32, g as i32, b as i32);
    let y = (299 * r + 587 * g + 114 * b) >> 10;
    let u = ((-169 * r - 331 * g + 500 * b) >> 10) + 128;
    let v = ((500 * r - 419 * g - 81 * b) >> 10) + 128;
    (clamp_u8(y, 16, 235), clamp_u8(u, 16, 240), clamp_u8(v, 16, 240))
}

/// Broadcast-range YCbCr to full-range RGB, clamped to [0, 255].
#[inline]
pub const fn yuv_to_rgb(y: u8, u: u8, v: u8) -> (u8, u8, u8) {
    let y = 1192 * (y as i32 - 16);
    let u = u as i32 - 128;
    let v = v as i32 - 128;
    let r = (y + 1634 * v) >> 10;
    let g = (y - 832 * v - 400 * u) >> 10;
    let b = (y + 2066 * u) >> 10;
    (clamp_u8(r, 0, 255), clamp_u8(g, 0, 255), clamp_u8(b, 0, 255))
}

#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
const fn clamp_u8(value: i32, lo: i32, hi: i32) -> u8 {
    let clamped = if value < lo {
        lo
    } else if value > hi {
        hi
    } else {
        value
    };
    clamped as u8
}
