// SPDX-FileCopyrightText: © 2025 FrameKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! LIFO operation stacks.
//!
//! A frame carries three of these (image, audio, service). Entries are a
//! tagged union so that callbacks, opaque context, small integers and sibling
//! frame references can share one stack without losing type information.
//! The stack itself has no policy; the frame protocols decide what an entry
//! on top means.

use crate::error::{FrameError, Result};
use crate::frame::Frame;
use crate::types::{Audio, AudioRequest, Image, ImageRequest};
use smallvec::SmallVec;
use std::any::Any;
use std::fmt;
use std::sync::{Arc, Mutex};

/// Deferred image operation. Receives the frame so it can pull upstream.
pub type GetImage = Box<dyn FnOnce(&mut Frame, &ImageRequest) -> Result<Image> + Send>;

/// Deferred audio operation. Receives the frame so it can pull upstream.
pub type GetAudio = Box<dyn FnOnce(&mut Frame, &AudioRequest) -> Result<Audio> + Send>;

/// Shared reference to a sibling frame.
pub type FrameHandle = Arc<Mutex<Frame>>;

/// Typical chains are shallow; this many entries stay inline.
const INLINE_ENTRIES: usize = 4;

/// One entry on an operation stack.
pub enum StackEntry {
    GetImage(GetImage),
    GetAudio(GetAudio),
    Context(Arc<dyn Any + Send + Sync>),
    Int(i32),
    Frame(FrameHandle),
}

impl StackEntry {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::GetImage(_) => "get_image",
            Self::GetAudio(_) => "get_audio",
            Self::Context(_) => "context",
            Self::Int(_) => "int",
            Self::Frame(_) => "frame",
        }
    }
}

impl fmt::Debug for StackEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "Int({value})"),
            other => f.write_str(other.kind()),
        }
    }
}

/// A strictly LIFO sequence of [`StackEntry`] values.
#[derive(Default)]
pub struct OperationStack {
    entries: SmallVec<[StackEntry; INLINE_ENTRIES]>,
}

impl OperationStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: StackEntry) {
        self.entries.push(entry);
    }

    /// Removes the top entry.
    ///
    /// # Errors
    ///
    /// Returns `FrameError::EmptyStack` when nothing is left.
    pub fn pop(&mut self) -> Result<StackEntry> {
        self.entries.pop().ok_or(FrameError::EmptyStack)
    }

    pub fn peek(&self) -> Option<&StackEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Empties the stack, yielding entries in pop order.
    pub fn drain(&mut self) -> impl Iterator<Item = StackEntry> + '_ {
        self.entries.drain(..).rev()
    }
}

impl fmt::Debug for OperationStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.iter()).finish()
    }
}
