// SPDX-FileCopyrightText: © 2025 FrameKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

use framekit_core::{Filter, Frame, ImageFormat};

/// Inverts RGB, keeping alpha.
#[derive(Debug, Default, Clone, Copy)]
pub struct InvertFilter;

impl Filter for InvertFilter {
    fn id(&self) -> &str {
        "video::invert"
    }

    fn process(&self, frame: &mut Frame) -> framekit_core::Result<()> {
        frame.push_get_image(|frame, request| {
            let mut image = frame.get_image(&request.with_format(ImageFormat::Rgb24a))?;
            for px in image.make_data_mut().chunks_exact_mut(4) {
                px[0] = !px[0];
                px[1] = !px[1];
                px[2] = !px[2];
            }
            Ok(image)
        });
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use framekit_core::{Image, ImageRequest};

    #[test]
    fn inverts_colour_but_not_alpha() {
        let mut frame = Frame::new(0);
        frame.push_get_image(|_, _| Image::from_vec(ImageFormat::Rgb24a, 1, 1, vec![0, 100, 255, 7]));
        InvertFilter.process(&mut frame).unwrap();

        let image = frame.get_image(&ImageRequest::new(ImageFormat::Rgb24a, 1, 1)).unwrap();
        assert_eq!(image.data(), &[255, 155, 0, 7]);
    }

    #[test]
    fn twice_is_identity() {
        let mut frame = Frame::new(0);
        frame.push_get_image(|_, _| Image::from_vec(ImageFormat::Rgb24a, 1, 1, vec![1, 2, 3, 4]));
        InvertFilter.process(&mut frame).unwrap();
        InvertFilter.process(&mut frame).unwrap();

        let image = frame.get_image(&ImageRequest::new(ImageFormat::Rgb24a, 1, 1)).unwrap();
        assert_eq!(image.data(), &[1, 2, 3, 4]);
    }
}
