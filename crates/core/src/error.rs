// SPDX-FileCopyrightText: © 2025 FrameKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Structured error types for FrameKit.
//!
//! Most of these are *recoverable* in the pull protocol: a layer that receives
//! one either substitutes a safe default (a test card, silence) or forwards it
//! to its caller. Nothing in the frame core panics for these conditions.

use crate::format::{AudioFormat, ImageFormat};
use thiserror::Error;

/// A pair of formats a conversion was asked to bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionPair {
    Image { from: ImageFormat, to: ImageFormat },
    Audio { from: AudioFormat, to: AudioFormat },
}

impl std::fmt::Display for ConversionPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Image { from, to } => write!(f, "image {from} -> {to}"),
            Self::Audio { from, to } => write!(f, "audio {from} -> {to}"),
        }
    }
}

/// Main error type for frame operations.
#[derive(Debug, Error)]
pub enum FrameError {
    /// An operation stack was popped while empty.
    ///
    /// This is the protocol's own "end of chain" signal. Callers of
    /// `pop_get_image`/`pop_audio` usually treat it as the base case and
    /// supply a default rather than failing.
    #[error("operation stack is empty")]
    EmptyStack,

    /// The requested format pair has no conversion, or no conversion hook is
    /// installed on the frame.
    #[error("unsupported conversion: {0}")]
    UnsupportedConversion(ConversionPair),

    /// A buffer could not be obtained.
    #[error("allocation failure: {0}")]
    AllocationFailure(String),

    /// The frame or a stack is not in a state that allows the operation.
    ///
    /// Examples:
    /// - Top of the image stack holds a context entry, not a callback
    /// - A waveform was requested but audio could not be resolved
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Service parameter or configuration validation error.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl FrameError {
    pub const fn unsupported_image(from: ImageFormat, to: ImageFormat) -> Self {
        Self::UnsupportedConversion(ConversionPair::Image { from, to })
    }

    pub const fn unsupported_audio(from: AudioFormat, to: AudioFormat) -> Self {
        Self::UnsupportedConversion(ConversionPair::Audio { from, to })
    }

    /// True for the end-of-chain signal.
    pub const fn is_empty_stack(&self) -> bool {
        matches!(self, Self::EmptyStack)
    }
}

/// Convenience type alias for Results using `FrameError`.
pub type Result<T> = std::result::Result<T, FrameError>;

impl From<FrameError> for String {
    fn from(err: FrameError) -> Self {
        err.to_string()
    }
}

// Free-form strings from service factories are treated as configuration errors.
impl From<String> for FrameError {
    fn from(s: String) -> Self {
        Self::Configuration(s)
    }
}

impl From<std::collections::TryReserveError> for FrameError {
    fn from(err: std::collections::TryReserveError) -> Self {
        Self::AllocationFailure(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FrameError::unsupported_image(ImageFormat::Yuv420p, ImageFormat::None);
        assert_eq!(err.to_string(), "unsupported conversion: image yuv420p -> none");

        let err = FrameError::unsupported_audio(AudioFormat::S16, AudioFormat::None);
        assert_eq!(err.to_string(), "unsupported conversion: audio s16 -> none");

        assert_eq!(FrameError::EmptyStack.to_string(), "operation stack is empty");
    }

    #[test]
    fn test_string_to_error_conversion() {
        let err: FrameError = "gain out of range".to_string().into();
        assert!(matches!(err, FrameError::Configuration(_)));
        let s: String = err.into();
        assert_eq!(s, "configuration error: gain out of range");
    }

    #[test]
    fn test_try_reserve_conversion() {
        let mut v: Vec<u8> = Vec::new();
        let err: FrameError = v.try_reserve_exact(usize::MAX).unwrap_err().into();
        assert!(matches!(err, FrameError::AllocationFailure(_)));
    }

    #[test]
    fn test_empty_stack_predicate() {
        assert!(FrameError::EmptyStack.is_empty_stack());
        assert!(!FrameError::InvalidState("x".into()).is_empty_stack());
    }
}
