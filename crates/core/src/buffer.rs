// SPDX-FileCopyrightText: © 2025 FrameKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Frame-owned byte storage with an explicit release token.
//!
//! A [`MediaBuffer`] either came from the byte pool (and returns there when
//! dropped) or was handed in by a caller together with a [`Destructor`]. In
//! the second case the destructor receives the bytes back exactly once, when
//! the last reference goes away: on replacement inside the frame or at frame
//! teardown.

use crate::error::Result;
use crate::frame_pool::{byte_pool, PooledBytes};

/// Release callback for caller-supplied buffers.
pub type Destructor = Box<dyn FnOnce(Vec<u8>) + Send + Sync>;

/// Byte storage plus its ownership token.
pub struct MediaBuffer {
    bytes: PooledBytes,
    release: Option<Destructor>,
}

impl MediaBuffer {
    /// Allocate `len` zeroed bytes from the process-wide pool.
    ///
    /// # Errors
    ///
    /// Returns `FrameError::AllocationFailure` when the storage cannot be reserved.
    pub fn alloc(len: usize) -> Result<Self> {
        let mut bytes = byte_pool().try_get(len)?;
        bytes.fill(0);
        Ok(Self { bytes, release: None })
    }

    /// Allocate `len` bytes, every one set to `value`.
    ///
    /// # Errors
    ///
    /// Returns `FrameError::AllocationFailure` when the storage cannot be reserved.
    pub fn filled(len: usize, value: u8) -> Result<Self> {
        let mut bytes = byte_pool().try_get(len)?;
        bytes.fill(value);
        Ok(Self { bytes, release: None })
    }

    /// Wrap bytes the frame now owns outright.
    pub const fn from_vec(data: Vec<u8>) -> Self {
        Self { bytes: PooledBytes::from_vec(data), release: None }
    }

    /// Wrap caller bytes; `release` gets them back when the buffer is dropped.
    pub fn with_destructor(data: Vec<u8>, release: Destructor) -> Self {
        Self { bytes: PooledBytes::from_vec(data), release: Some(release) }
    }

    pub fn as_slice(&self) -> &[u8] {
        self.bytes.as_slice()
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        self.bytes.as_mut_slice()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// True when a caller-supplied destructor is still pending.
    pub const fn has_destructor(&self) -> bool {
        self.release.is_some()
    }
}

// A copy is frame-private storage: the destructor stays with the original.
impl Clone for MediaBuffer {
    fn clone(&self) -> Self {
        Self { bytes: self.bytes.clone(), release: None }
    }
}

impl std::fmt::Debug for MediaBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaBuffer")
            .field("len", &self.len())
            .field("owned_by_caller", &self.release.is_some())
            .finish_non_exhaustive()
    }
}

impl Drop for MediaBuffer {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            let bytes = std::mem::replace(&mut self.bytes, PooledBytes::from_vec(Vec::new()));
            release(bytes.into_vec());
        }
    }
}
