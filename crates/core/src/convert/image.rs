// SPDX-FileCopyrightText: © 2025 FrameKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Software image converters.
//!
//! Direct paths:
//! - `rgb24` <-> `rgb24a`
//! - `rgb24`/`rgb24a` <-> `yuv422`
//! - `yuv422` <-> `yuv420p`
//! - `yuv422` <-> `yuv422p16`
//!
//! Any other pair of real formats goes through `yuv422`. Alpha dropped by a
//! conversion out of `rgb24a` moves into the frame's alpha mask; alpha needed
//! by a conversion into `rgb24a` comes from that mask (opaque if absent).

use crate::buffer::MediaBuffer;
use crate::color::{rgb_to_yuv, yuv_to_rgb};
use crate::error::{FrameError, Result};
use crate::format::ImageFormat;
use crate::frame::Frame;
use crate::types::{AlphaMask, Image};

/// Converts `image` to `output` in a new buffer, committing only on success.
///
/// # Errors
///
/// `FrameError::UnsupportedConversion` when either side is `None`,
/// `FrameError::AllocationFailure` if the output cannot be allocated.
pub fn convert(frame: &mut Frame, image: &mut Image, output: ImageFormat) -> Result<()> {
    let from = image.format;
    if from == output {
        return Ok(());
    }
    if from == ImageFormat::None || output == ImageFormat::None {
        return Err(FrameError::unsupported_image(from, output));
    }

    let (width, height) = (image.width, image.height);
    let stored = frame.alpha().filter(|mask| mask.matches(width, height)).cloned();
    let mut split = None;

    let data = match direct(image.data(), from, output, width, height, stored.as_ref(), &mut split)? {
        Some(data) => data,
        None => {
            let mid = direct(image.data(), from, ImageFormat::Yuv422, width, height, None, &mut split)?
                .ok_or_else(|| FrameError::unsupported_image(from, output))?;
            let alpha = split.as_ref().or(stored.as_ref());
            let mut unused = None;
            direct(mid.as_slice(), ImageFormat::Yuv422, output, width, height, alpha, &mut unused)?
                .ok_or_else(|| FrameError::unsupported_image(from, output))?
        },
    };

    if let Some(mask) = split {
        frame.set_alpha(mask);
    }
    image.replace_data(output, data);
    Ok(())
}

/// One direct conversion step; `Ok(None)` if the pair has no direct path.
fn direct(
    src: &[u8],
    from: ImageFormat,
    to: ImageFormat,
    width: usize,
    height: usize,
    alpha: Option<&AlphaMask>,
    split: &mut Option<AlphaMask>,
) -> Result<Option<MediaBuffer>> {
    use ImageFormat::{Rgb24, Rgb24a, Yuv420p, Yuv422, Yuv422p16};

    let out = match (from, to) {
        (Rgb24, Rgb24a) => rgb_to_rgba(src, width, height, alpha)?,
        (Rgb24a, Rgb24) => {
            *split = Some(extract_alpha(src, width, height)?);
            rgba_to_rgb(src, width, height)?
        },
        (Rgb24 | Rgb24a, Yuv422) => {
            if from == Rgb24a {
                *split = Some(extract_alpha(src, width, height)?);
            }
            rgb_to_yuv422(src, if from == Rgb24a { 4 } else { 3 }, width, height)?
        },
        (Yuv422, Rgb24) => yuv422_to_rgb(src, 3, width, height, None)?,
        (Yuv422, Rgb24a) => yuv422_to_rgb(src, 4, width, height, alpha)?,
        (Yuv422, Yuv420p) => yuv422_to_yuv420p(src, width, height)?,
        (Yuv420p, Yuv422) => yuv420p_to_yuv422(src, width, height)?,
        (Yuv422, Yuv422p16) => yuv422_to_yuv422p16(src, width, height)?,
        (Yuv422p16, Yuv422) => yuv422p16_to_yuv422(src, width, height)?,
        _ => return Ok(None),
    };
    Ok(Some(out))
}

const fn yuv422_stride(width: usize) -> usize {
    width.div_ceil(2) * 4
}

fn extract_alpha(rgba: &[u8], width: usize, height: usize) -> Result<AlphaMask> {
    let alpha = rgba.chunks_exact(4).take(width * height).map(|px| px[3]).collect();
    AlphaMask::new(width, height, alpha)
}

fn rgb_to_rgba(src: &[u8], width: usize, height: usize, alpha: Option<&AlphaMask>) -> Result<MediaBuffer> {
    let mut out = MediaBuffer::alloc(ImageFormat::Rgb24a.buffer_size(width, height))?;
    for (i, (dst, px)) in out.as_mut_slice().chunks_exact_mut(4).zip(src.chunks_exact(3)).enumerate() {
        dst[..3].copy_from_slice(px);
        dst[3] = alpha.map_or(0xFF, |mask| mask.data()[i]);
    }
    Ok(out)
}

fn rgba_to_rgb(src: &[u8], width: usize, height: usize) -> Result<MediaBuffer> {
    let mut out = MediaBuffer::alloc(ImageFormat::Rgb24.buffer_size(width, height))?;
    for (dst, px) in out.as_mut_slice().chunks_exact_mut(3).zip(src.chunks_exact(4)) {
        dst.copy_from_slice(&px[..3]);
    }
    Ok(out)
}

/// Packs RGB pixel pairs as Y0 Cb Y1 Cr with chroma averaged over the pair.
/// An odd trailing pixel is paired with itself.
fn rgb_to_yuv422(src: &[u8], bpp: usize, width: usize, height: usize) -> Result<MediaBuffer> {
    let stride = yuv422_stride(width);
    let mut out = MediaBuffer::alloc(ImageFormat::Yuv422.buffer_size(width, height))?;
    let dst = out.as_mut_slice();
    for row in 0..height {
        let line = &src[row * width * bpp..(row + 1) * width * bpp];
        for pair in 0..width.div_ceil(2) {
            let x0 = pair * 2;
            let x1 = (x0 + 1).min(width - 1);
            let (y0, u0, v0) = rgb_to_yuv(line[x0 * bpp], line[x0 * bpp + 1], line[x0 * bpp + 2]);
            let (y1, u1, v1) = rgb_to_yuv(line[x1 * bpp], line[x1 * bpp + 1], line[x1 * bpp + 2]);
            let o = row * stride + pair * 4;
            dst[o] = y0;
            dst[o + 1] = average(u0, u1);
            dst[o + 2] = y1;
            dst[o + 3] = average(v0, v1);
        }
    }
    Ok(out)
}

fn yuv422_to_rgb(
    src: &[u8],
    bpp: usize,
    width: usize,
    height: usize,
    alpha: Option<&AlphaMask>,
) -> Result<MediaBuffer> {
    let stride = yuv422_stride(width);
    let format = if bpp == 4 { ImageFormat::Rgb24a } else { ImageFormat::Rgb24 };
    let mut out = MediaBuffer::alloc(format.buffer_size(width, height))?;
    let dst = out.as_mut_slice();
    for row in 0..height {
        for x in 0..width {
            let pair = row * stride + (x / 2) * 4;
            let y = src[pair + (x % 2) * 2];
            let (r, g, b) = yuv_to_rgb(y, src[pair + 1], src[pair + 3]);
            let o = (row * width + x) * bpp;
            dst[o] = r;
            dst[o + 1] = g;
            dst[o + 2] = b;
            if bpp == 4 {
                dst[o + 3] = alpha.map_or(0xFF, |mask| mask.data()[row * width + x]);
            }
        }
    }
    Ok(out)
}

fn yuv422_to_yuv420p(src: &[u8], width: usize, height: usize) -> Result<MediaBuffer> {
    let stride = yuv422_stride(width);
    let (cw, ch) = (width.div_ceil(2), height.div_ceil(2));
    let mut out = MediaBuffer::alloc(ImageFormat::Yuv420p.buffer_size(width, height))?;
    let dst = out.as_mut_slice();
    let (luma, chroma) = dst.split_at_mut(width * height);
    let (cb, cr) = chroma.split_at_mut(cw * ch);

    for row in 0..height {
        for x in 0..width {
            luma[row * width + x] = src[row * stride + (x / 2) * 4 + (x % 2) * 2];
        }
    }
    for crow in 0..ch {
        let top = crow * 2;
        let bottom = (top + 1).min(height - 1);
        for pair in 0..cw {
            let a = top * stride + pair * 4;
            let b = bottom * stride + pair * 4;
            cb[crow * cw + pair] = average(src[a + 1], src[b + 1]);
            cr[crow * cw + pair] = average(src[a + 3], src[b + 3]);
        }
    }
    Ok(out)
}

fn yuv420p_to_yuv422(src: &[u8], width: usize, height: usize) -> Result<MediaBuffer> {
    let stride = yuv422_stride(width);
    let (cw, ch) = (width.div_ceil(2), height.div_ceil(2));
    let (luma, chroma) = src.split_at(width * height);
    let (cb, cr) = chroma.split_at(cw * ch);
    let mut out = MediaBuffer::alloc(ImageFormat::Yuv422.buffer_size(width, height))?;
    let dst = out.as_mut_slice();
    for row in 0..height {
        let line = &luma[row * width..(row + 1) * width];
        for pair in 0..cw {
            let o = row * stride + pair * 4;
            dst[o] = line[pair * 2];
            dst[o + 1] = cb[(row / 2) * cw + pair];
            dst[o + 2] = line[(pair * 2 + 1).min(width - 1)];
            dst[o + 3] = cr[(row / 2) * cw + pair];
        }
    }
    Ok(out)
}

fn yuv422_to_yuv422p16(src: &[u8], width: usize, height: usize) -> Result<MediaBuffer> {
    let stride = yuv422_stride(width);
    let cw = width.div_ceil(2);
    let mut out = MediaBuffer::alloc(ImageFormat::Yuv422p16.buffer_size(width, height))?;
    let dst = out.as_mut_slice();
    let (luma, chroma) = dst.split_at_mut(width * height * 2);
    let (cb, cr) = chroma.split_at_mut(cw * height * 2);
    let widen = |v: u8| (u16::from(v) << 8).to_le_bytes();

    for row in 0..height {
        for x in 0..width {
            let i = (row * width + x) * 2;
            luma[i..i + 2].copy_from_slice(&widen(src[row * stride + (x / 2) * 4 + (x % 2) * 2]));
        }
        for pair in 0..cw {
            let s = row * stride + pair * 4;
            let i = (row * cw + pair) * 2;
            cb[i..i + 2].copy_from_slice(&widen(src[s + 1]));
            cr[i..i + 2].copy_from_slice(&widen(src[s + 3]));
        }
    }
    Ok(out)
}

fn yuv422p16_to_yuv422(src: &[u8], width: usize, height: usize) -> Result<MediaBuffer> {
    let stride = yuv422_stride(width);
    let cw = width.div_ceil(2);
    let (luma, chroma) = src.split_at(width * height * 2);
    let (cb, cr) = chroma.split_at(cw * height * 2);
    // The high byte of a little-endian 16-bit sample.
    let narrow = |plane: &[u8], i: usize| plane[i * 2 + 1];

    let mut out = MediaBuffer::alloc(ImageFormat::Yuv422.buffer_size(width, height))?;
    let dst = out.as_mut_slice();
    for row in 0..height {
        for pair in 0..cw {
            let o = row * stride + pair * 4;
            let x0 = pair * 2;
            let x1 = (x0 + 1).min(width - 1);
            dst[o] = narrow(luma, row * width + x0);
            dst[o + 1] = narrow(cb, row * cw + pair);
            dst[o + 2] = narrow(luma, row * width + x1);
            dst[o + 3] = narrow(cr, row * cw + pair);
        }
    }
    Ok(out)
}

#[allow(clippy::cast_possible_truncation)]
const fn average(a: u8, b: u8) -> u8 {
    ((a as u16 + b as u16) >> 1) as u8
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::image::white_image;

    fn rgb(width: usize, height: usize, pixels: &[[u8; 3]]) -> Image {
        Image::from_vec(ImageFormat::Rgb24, width, height, pixels.concat()).unwrap()
    }

    #[test]
    fn rgb_to_yuv422_averages_chroma() {
        let mut frame = Frame::new(0);
        let mut image = rgb(2, 1, &[[255, 255, 255], [0, 0, 0]]);
        convert(&mut frame, &mut image, ImageFormat::Yuv422).unwrap();
        assert_eq!(image.format, ImageFormat::Yuv422);
        assert_eq!(image.data(), &[234, 128, 16, 128]);
    }

    #[test]
    fn odd_width_pairs_last_pixel_with_itself() {
        let mut frame = Frame::new(0);
        let mut image = rgb(3, 1, &[[0, 0, 0], [0, 0, 0], [255, 255, 255]]);
        convert(&mut frame, &mut image, ImageFormat::Yuv422).unwrap();
        assert_eq!(image.data(), &[16, 128, 16, 128, 234, 128, 234, 128]);

        convert(&mut frame, &mut image, ImageFormat::Rgb24).unwrap();
        assert_eq!(image.data(), &[0, 0, 0, 0, 0, 0, 253, 253, 253]);
    }

    #[test]
    fn rgba_alpha_moves_into_frame_mask_and_back() {
        let mut frame = Frame::new(0);
        let mut image =
            Image::from_vec(ImageFormat::Rgb24a, 2, 1, vec![10, 20, 30, 40, 50, 60, 70, 80]).unwrap();
        convert(&mut frame, &mut image, ImageFormat::Rgb24).unwrap();
        assert_eq!(image.data(), &[10, 20, 30, 50, 60, 70]);
        assert_eq!(frame.alpha().unwrap().data(), &[40, 80]);

        convert(&mut frame, &mut image, ImageFormat::Rgb24a).unwrap();
        assert_eq!(image.data(), &[10, 20, 30, 40, 50, 60, 70, 80]);
    }

    #[test]
    fn planar_round_trips_are_lossless_for_flat_chroma() {
        let mut frame = Frame::new(0);
        let original = white_image(ImageFormat::Yuv422, 5, 3).unwrap();
        for target in [ImageFormat::Yuv420p, ImageFormat::Yuv422p16] {
            let mut image = original.clone();
            convert(&mut frame, &mut image, target).unwrap();
            assert_eq!(image.data().len(), target.buffer_size(5, 3));
            convert(&mut frame, &mut image, ImageFormat::Yuv422).unwrap();
            assert_eq!(image.data(), original.data(), "{target}");
        }
    }

    #[test]
    fn yuv420p_to_rgb_goes_through_yuv422() {
        let mut frame = Frame::new(0);
        let mut image = white_image(ImageFormat::Yuv420p, 2, 2).unwrap();
        convert(&mut frame, &mut image, ImageFormat::Rgb24a).unwrap();
        assert_eq!(image.format, ImageFormat::Rgb24a);
        assert_eq!(&image.data()[..4], &[254, 254, 254, 255]);
    }

    #[test]
    fn none_is_never_convertible() {
        let mut frame = Frame::new(0);
        let mut image = rgb(1, 1, &[[1, 2, 3]]);
        let err = convert(&mut frame, &mut image, ImageFormat::None).unwrap_err();
        assert!(matches!(err, FrameError::UnsupportedConversion(_)));
        assert_eq!(image.format, ImageFormat::Rgb24);
        assert_eq!(image.data(), &[1, 2, 3]);
    }
}
