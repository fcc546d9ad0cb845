// SPDX-FileCopyrightText: © 2025 FrameKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Image retrieval protocol.
//!
//! ```text
//!   Empty ---push_get_image---> HasPendingOps ---get_image---> Resolved
//!                                     ^                            |
//!                                     +-------push_get_image-------+
//!   any state ---replace_image---> Resolved
//! ```
//!
//! `get_image` pops the top callback and runs it. A callback that needs
//! upstream pixels calls `get_image` again on the same frame, which pops the
//! next one, so the most recently pushed callback is entered first and the
//! earliest pushed one supplies the base image.

use crate::error::{FrameError, Result};
use crate::format::ImageFormat;
use crate::frame::{drain_stale, Frame};
use crate::frame_config::frame_defaults;
use crate::properties::keys;
use crate::stack::{GetImage, StackEntry};
use crate::types::{AlphaMask, Image, ImageRequest};

/// Where a frame's image currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageState {
    Empty,
    HasPendingOps,
    Resolved,
}

/// Luma and chroma of the test card (white, broadcast range).
const TEST_CARD_Y: u8 = 235;
const TEST_CARD_C: u8 = 128;

impl Frame {
    pub fn image_state(&self) -> ImageState {
        if !self.image_stack.is_empty() {
            ImageState::HasPendingOps
        } else if self.image.is_some() {
            ImageState::Resolved
        } else {
            ImageState::Empty
        }
    }

    pub const fn image_stack(&self) -> &crate::stack::OperationStack {
        &self.image_stack
    }

    /// Queues a deferred image operation.
    pub fn push_get_image<F>(&mut self, callback: F)
    where
        F: FnOnce(&mut Self, &ImageRequest) -> Result<Image> + Send + 'static,
    {
        self.image_stack.push(StackEntry::GetImage(Box::new(callback)));
    }

    /// Queues opaque context for the callback pushed after it.
    pub fn push_image_context(&mut self, context: std::sync::Arc<dyn std::any::Any + Send + Sync>) {
        self.image_stack.push(StackEntry::Context(context));
    }

    /// Pops context pushed with [`Frame::push_image_context`].
    ///
    /// # Errors
    ///
    /// `FrameError::EmptyStack` if nothing is queued, `FrameError::InvalidState`
    /// if the top entry is not context of type `T` (the entry stays in place).
    pub fn pop_image_context<T: std::any::Any + Send + Sync>(
        &mut self,
    ) -> Result<std::sync::Arc<T>> {
        match self.image_stack.pop()? {
            StackEntry::Context(ctx) => ctx.downcast::<T>().map_err(|ctx| {
                self.image_stack.push(StackEntry::Context(ctx));
                FrameError::InvalidState("image stack context has an unexpected type".into())
            }),
            other => {
                let err = FrameError::InvalidState(format!(
                    "expected context on image stack, found {}",
                    other.kind()
                ));
                self.image_stack.push(other);
                Err(err)
            },
        }
    }

    /// Pops the most recently pushed image callback.
    ///
    /// # Errors
    ///
    /// `FrameError::EmptyStack` when no operations remain (the base case).
    /// `FrameError::InvalidState` if the top entry is not a callback; it stays in place.
    pub fn pop_get_image(&mut self) -> Result<GetImage> {
        match self.image_stack.pop()? {
            StackEntry::GetImage(callback) => Ok(callback),
            other => {
                let err = FrameError::InvalidState(format!(
                    "expected get_image on image stack, found {}",
                    other.kind()
                ));
                self.image_stack.push(other);
                Err(err)
            },
        }
    }

    /// Pulls the frame's image.
    ///
    /// Runs the top callback, else returns the already resolved image, else a
    /// white test card (flagged with `test_image=1`). A callback failure also
    /// yields the test card. The result is converted to `request.format`
    /// unless that is [`ImageFormat::None`]; conversion failure is returned.
    ///
    /// The returned image shares its buffer with the frame. Writers go
    /// through `Image::make_data_mut`, which copies before the first write.
    ///
    /// # Errors
    ///
    /// `FrameError::UnsupportedConversion` when negotiation fails,
    /// `FrameError::InvalidState` for a malformed stack,
    /// `FrameError::AllocationFailure` if the test card cannot be allocated.
    pub fn get_image(&mut self, request: &ImageRequest) -> Result<Image> {
        self.image_depth += 1;
        let result = self.resolve_image(request);
        self.image_depth -= 1;
        if self.image_depth == 0 {
            drain_stale(&mut self.image_stack, "image");
        }
        result
    }

    fn resolve_image(&mut self, request: &ImageRequest) -> Result<Image> {
        let mut image = match self.pop_get_image() {
            Ok(callback) => match callback(self, request) {
                Ok(image) => image,
                Err(e) => {
                    tracing::warn!(
                        position = self.position(),
                        error = %e,
                        "Image operation failed, substituting test card"
                    );
                    self.test_card(request)?
                },
            },
            Err(FrameError::EmptyStack) => match &self.image {
                Some(resolved) => resolved.clone(),
                None => self.test_card(request)?,
            },
            Err(e) => return Err(e),
        };

        if request.format != ImageFormat::None && image.format != request.format {
            self.convert_image(&mut image, request.format)?;
        }

        self.record_image(&image);
        self.image = Some(image.clone());
        Ok(image)
    }

    fn test_card(&mut self, request: &ImageRequest) -> Result<Image> {
        let defaults = frame_defaults();
        let format =
            if request.format == ImageFormat::None { ImageFormat::Yuv422 } else { request.format };
        let width = if request.width == 0 { defaults.width } else { request.width };
        let height = if request.height == 0 { defaults.height } else { request.height };

        tracing::debug!(position = self.position(), %format, width, height, "Generating test card");
        let image = white_image(format, width, height)?;
        self.properties_mut().set_int(keys::TEST_IMAGE, 1);
        Ok(image)
    }

    fn record_image(&mut self, image: &Image) {
        let props = self.properties_mut();
        props.set_int(keys::WIDTH, i64::try_from(image.width).unwrap_or(i64::MAX));
        props.set_int(keys::HEIGHT, i64::try_from(image.height).unwrap_or(i64::MAX));
        props.set_string(keys::FORMAT, image.format.name());
    }

    /// Converts `image` to `output` through the frame's hooks.
    ///
    /// Converting to the current format is a no-op that always succeeds.
    ///
    /// # Errors
    ///
    /// `FrameError::UnsupportedConversion` if no hooks are installed or the
    /// pair is not implemented; `image` is untouched in that case.
    pub fn convert_image(&mut self, image: &mut Image, output: ImageFormat) -> Result<()> {
        if image.format == output {
            return Ok(());
        }
        let Some(hooks) = self.hooks().cloned() else {
            return Err(FrameError::unsupported_image(image.format, output));
        };
        let from = image.format;
        hooks.convert_image(self, image, output)?;
        tracing::trace!(%from, to = %output, hooks = hooks.name(), "Converted image");
        Ok(())
    }

    /// Returns the alpha mask for the frame's image size.
    ///
    /// Tries the hooks, then stored alpha of the right size, and otherwise
    /// synthesises (and stores) a fully opaque mask. Never empty unless the
    /// frame has a zero-sized image.
    pub fn get_alpha_mask(&mut self) -> AlphaMask {
        if let Some(mask) = self.hooks().cloned().and_then(|hooks| hooks.alpha_mask(self)) {
            return mask;
        }
        let (width, height) = self.image_size();
        match &self.alpha {
            Some(mask) if mask.matches(width, height) => mask.clone(),
            _ => {
                let mask = AlphaMask::opaque(width, height);
                self.alpha = Some(mask.clone());
                mask
            },
        }
    }

    /// Stored alpha, if any, without synthesising.
    pub const fn alpha(&self) -> Option<&AlphaMask> {
        self.alpha.as_ref()
    }

    pub fn set_alpha(&mut self, mask: AlphaMask) {
        self.alpha = Some(mask);
    }

    pub fn clear_alpha(&mut self) {
        self.alpha = None;
    }

    /// Image dimensions from the resolved image, then the attributes, then the defaults.
    pub fn image_size(&self) -> (usize, usize) {
        if let Some(image) = &self.image {
            return (image.width, image.height);
        }
        let width = usize::try_from(self.get_int(keys::WIDTH)).unwrap_or(0);
        let height = usize::try_from(self.get_int(keys::HEIGHT)).unwrap_or(0);
        if width > 0 && height > 0 {
            (width, height)
        } else {
            let defaults = frame_defaults();
            (defaults.width, defaults.height)
        }
    }

    /// Short-circuits the pipeline with a resolved image.
    ///
    /// Pending image operations are discarded and `test_image` is cleared.
    /// The previous image buffer is released if nothing else shares it.
    pub fn replace_image(&mut self, image: Image) {
        let discarded = self.image_stack.len();
        self.image_stack.clear();
        if discarded > 0 {
            tracing::debug!(discarded, "replace_image dropped pending image operations");
        }
        self.properties_mut().remove(keys::TEST_IMAGE);
        self.set_image(image);
    }

    /// Records a resolved image, keeping pending operations.
    pub fn set_image(&mut self, image: Image) {
        self.record_image(&image);
        self.image = Some(image);
    }

    /// The resolved image, if any, without pulling.
    pub const fn image(&self) -> Option<&Image> {
        self.image.as_ref()
    }

    pub fn is_test_card(&self) -> bool {
        self.get_int(keys::TEST_IMAGE) != 0
    }
}

/// Allocates a white image in `format`.
///
/// # Errors
///
/// `FrameError::UnsupportedConversion` for [`ImageFormat::None`],
/// `FrameError::AllocationFailure` if the buffer cannot be allocated.
pub fn white_image(format: ImageFormat, width: usize, height: usize) -> Result<Image> {
    let mut image = match format {
        ImageFormat::None => {
            return Err(FrameError::unsupported_image(ImageFormat::None, ImageFormat::None))
        },
        ImageFormat::Rgb24 | ImageFormat::Rgb24a => {
            return Image::new(
                format,
                width,
                height,
                crate::buffer::MediaBuffer::filled(format.buffer_size(width, height), 0xFF)?,
            )
        },
        _ => Image::alloc(format, width, height)?,
    };

    let luma = width * height;
    let data = image.make_data_mut();
    match format {
        ImageFormat::Yuv422 => {
            for pair in data.chunks_exact_mut(2) {
                pair[0] = TEST_CARD_Y;
                pair[1] = TEST_CARD_C;
            }
        },
        ImageFormat::Yuv420p => {
            data[..luma].fill(TEST_CARD_Y);
            data[luma..].fill(TEST_CARD_C);
        },
        ImageFormat::Yuv422p16 => {
            let (y, c) = data.split_at_mut(luma * 2);
            for px in y.chunks_exact_mut(2) {
                px.copy_from_slice(&(u16::from(TEST_CARD_Y) << 8).to_le_bytes());
            }
            for px in c.chunks_exact_mut(2) {
                px.copy_from_slice(&(u16::from(TEST_CARD_C) << 8).to_le_bytes());
            }
        },
        ImageFormat::None | ImageFormat::Rgb24 | ImageFormat::Rgb24a => {},
    }
    Ok(image)
}
