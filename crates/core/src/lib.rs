// SPDX-FileCopyrightText: © 2025 FrameKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! FrameKit Core - the frame and its deferred, stack-based composition protocol.
//!
//! A [`Frame`] carries no pixels or samples until something pulls it.
//! Services push callbacks onto the frame's operation stacks as it travels
//! forward through a chain; the consumer calls [`Frame::get_image`] or
//! [`Frame::get_audio`], which pops and runs them in reverse.
//!
//! ## Core Modules
//!
//! - [`frame`]: The frame aggregate, service stack and attribute helpers
//! - [`stack`]: Tagged LIFO operation stacks
//! - [`image`] / [`audio`]: The pull protocols (impl blocks on `Frame`)
//! - [`types`]: Resolved payloads and pull requests
//! - [`format`]: Pixel and sample format descriptors
//! - [`hooks`]: Per-frame conversion capability
//! - [`convert`]: Software converters ([`StandardHooks`])
//! - [`color`]: BT.601 fixed-point RGB <-> YUV
//! - [`timing`]: Sample-count and timestamp arithmetic
//! - [`properties`]: Ordered attribute store
//! - [`service`]: Producer / filter / transition traits
//! - [`registry`]: Service factory and discovery
//! - [`buffer`] / [`frame_pool`]: Buffer ownership and pooling
//! - [`frame_config`]: Process-wide defaults
//! - [`helpers`]: Parameter parsing
//!
//! ## Quick Start
//!
//! ```ignore
//! use framekit_core::{Frame, ImageFormat, ImageRequest};
//!
//! let mut frame = Frame::new(0);
//! frame.push_get_image(|frame, request| {
//!     let mut image = frame.get_image(request)?; // upstream (test card here)
//!     for px in image.make_data_mut() {
//!         *px = 255 - *px;
//!     }
//!     Ok(image)
//! });
//! let image = frame.get_image(&ImageRequest::new(ImageFormat::Rgb24, 64, 48))?;
//! ```

pub mod audio;
pub mod buffer;
pub mod color;
pub mod convert;
pub mod error;
pub mod format;
pub mod frame;
pub mod frame_config;
pub mod frame_pool;
pub mod helpers;
pub mod hooks;
pub mod image;
pub mod properties;
pub mod registry;
pub mod service;
pub mod stack;
pub mod timing;
pub mod types;

// Error handling
pub use error::{ConversionPair, FrameError, Result};

// Frame and protocol
pub use frame::{Frame, HIDE_AUDIO, HIDE_VIDEO};
pub use image::ImageState;
pub use stack::{FrameHandle, GetAudio, GetImage, OperationStack, StackEntry};
pub use types::{AlphaMask, Audio, AudioRequest, Image, ImageRequest, Waveform};

// Formats and conversion
pub use convert::StandardHooks;
pub use format::{AudioFormat, ImageFormat};
pub use hooks::FrameHooks;

// Utilities
pub use color::{rgb_to_yuv, rgb_to_yuv_unscaled, yuv_to_rgb};
pub use timing::{
    position_to_timestamp_us, sample_calculator, sample_calculator_to_now, samples_to_duration_us,
};

// Attributes
pub use properties::{keys, Properties, Value};

// Services and registry
pub use registry::{Service, ServiceDefinition, ServiceRegistry, ServiceType};
pub use service::{pull_frame, Filter, Producer, Transition};

// Buffers
pub use buffer::{Destructor, MediaBuffer};
pub use frame_pool::{byte_pool, BytePool, FramePool, PooledBytes, PooledFrameData};

// Configuration
pub use frame_config::{frame_defaults, set_frame_defaults, FrameDefaults};
pub use helpers::config_helpers;
