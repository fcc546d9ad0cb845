// SPDX-FileCopyrightText: © 2025 FrameKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! The frame: an attribute store, three operation stacks and a hooks object.
//!
//! Services push deferred work onto a frame as it travels forward through a
//! chain; the consumer pulls with [`Frame::get_image`] / [`Frame::get_audio`],
//! which pop and run that work in reverse. The pull protocols live in
//! `image.rs` and `audio.rs`; this file holds the aggregate itself, the
//! generic service stack and the attribute helpers.

use crate::error::{FrameError, Result};
use crate::frame_config::frame_defaults;
use crate::hooks::FrameHooks;
use crate::properties::{keys, Properties, Value};
use crate::stack::{FrameHandle, OperationStack, StackEntry};
use crate::types::{AlphaMask, Audio, Image};
use std::any::Any;
use std::fmt;
use std::sync::{Arc, Mutex};

/// Bit in the `hide` attribute that hides video.
pub const HIDE_VIDEO: i64 = 1;
/// Bit in the `hide` attribute that mutes audio.
pub const HIDE_AUDIO: i64 = 2;

/// A unit of deferred media work.
///
/// `Frame` is `Send` but not `Sync`: it moves between worker threads, and a
/// pull needs `&mut` access, so one frame is only ever evaluated by one
/// thread at a time. Siblings shared between services go through
/// [`FrameHandle`].
pub struct Frame {
    properties: Properties,
    pub(crate) image_stack: OperationStack,
    pub(crate) audio_stack: OperationStack,
    service_stack: OperationStack,
    hooks: Option<Arc<dyn FrameHooks>>,
    pub(crate) image: Option<Image>,
    pub(crate) alpha: Option<AlphaMask>,
    pub(crate) audio: Option<Audio>,
    pub(crate) image_depth: u32,
    pub(crate) audio_depth: u32,
}

impl Frame {
    /// Creates an empty frame for `position`, stamped with the process defaults.
    pub fn new(position: i64) -> Self {
        let mut properties = Properties::new();
        properties.set_int(keys::POSITION, position);
        properties.set_double(keys::SPEED, 1.0);
        properties.set_double(keys::ASPECT_RATIO, frame_defaults().aspect_ratio);
        Self {
            properties,
            image_stack: OperationStack::new(),
            audio_stack: OperationStack::new(),
            service_stack: OperationStack::new(),
            hooks: None,
            image: None,
            alpha: None,
            audio: None,
            image_depth: 0,
            audio_depth: 0,
        }
    }

    /// Wraps the frame for sharing between services.
    pub fn into_handle(self) -> FrameHandle {
        Arc::new(Mutex::new(self))
    }

    pub const fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut Properties {
        &mut self.properties
    }

    pub fn get_int(&self, key: &str) -> i64 {
        self.properties.get_int(key)
    }

    pub fn set_int(&mut self, key: &str, value: i64) {
        self.properties.set_int(key, value);
    }

    pub fn get_double(&self, key: &str) -> f64 {
        self.properties.get_double(key)
    }

    pub fn set_double(&mut self, key: &str, value: f64) {
        self.properties.set_double(key, value);
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.properties.get_string(key)
    }

    pub fn set_string(&mut self, key: &str, value: impl Into<String>) {
        self.properties.set_string(key, value);
    }

    // Hooks

    pub fn set_hooks(&mut self, hooks: Arc<dyn FrameHooks>) {
        tracing::trace!(hooks = hooks.name(), "Installing frame hooks");
        self.hooks = Some(hooks);
    }

    pub fn clear_hooks(&mut self) {
        self.hooks = None;
    }

    pub const fn hooks(&self) -> Option<&Arc<dyn FrameHooks>> {
        self.hooks.as_ref()
    }

    // Attribute helpers

    pub fn position(&self) -> i64 {
        self.properties.get_int(keys::POSITION)
    }

    pub fn set_position(&mut self, position: i64) {
        self.properties.set_int(keys::POSITION, position);
    }

    pub fn speed(&self) -> f64 {
        self.properties.get_double(keys::SPEED)
    }

    pub fn set_speed(&mut self, speed: f64) {
        self.properties.set_double(keys::SPEED, speed);
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.properties.get_double(keys::ASPECT_RATIO)
    }

    pub fn set_aspect_ratio(&mut self, ratio: f64) {
        self.properties.set_double(keys::ASPECT_RATIO, ratio);
    }

    /// Frame rate from the `fps` attribute, else the process default.
    pub fn fps(&self) -> f64 {
        let fps = self.properties.get_double(keys::FPS);
        if fps > 0.0 {
            fps
        } else {
            frame_defaults().fps
        }
    }

    pub fn is_hidden(&self) -> bool {
        self.properties.get_int(keys::HIDE) & HIDE_VIDEO != 0
    }

    pub fn is_muted(&self) -> bool {
        self.properties.get_int(keys::HIDE) & HIDE_AUDIO != 0
    }

    pub fn set_previous_frame(&mut self, frame: FrameHandle) {
        self.properties.set_data(keys::PREVIOUS_FRAME, frame);
    }

    pub fn previous_frame(&self) -> Option<FrameHandle> {
        self.properties.get_data::<Mutex<Self>>(keys::PREVIOUS_FRAME)
    }

    pub fn set_next_frame(&mut self, frame: FrameHandle) {
        self.properties.set_data(keys::NEXT_FRAME, frame);
    }

    pub fn next_frame(&self) -> Option<FrameHandle> {
        self.properties.get_data::<Mutex<Self>>(keys::NEXT_FRAME)
    }

    /// `meta.*` attributes in insertion order.
    pub fn meta(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.properties.with_prefix(keys::META_PREFIX)
    }

    // Generic service stack

    pub const fn service_stack(&self) -> &OperationStack {
        &self.service_stack
    }

    pub fn service_stack_mut(&mut self) -> &mut OperationStack {
        &mut self.service_stack
    }

    pub fn push_service(&mut self, service: Arc<dyn Any + Send + Sync>) {
        self.service_stack.push(StackEntry::Context(service));
    }

    /// Pops opaque context and downcasts it to `T`.
    ///
    /// # Errors
    ///
    /// `FrameError::EmptyStack` if the stack is empty. `FrameError::InvalidState`
    /// if the top entry is not context of type `T`; the entry stays in place.
    pub fn pop_service<T: Any + Send + Sync>(&mut self) -> Result<Arc<T>> {
        match self.service_stack.pop()? {
            StackEntry::Context(ctx) => ctx.downcast::<T>().map_err(|ctx| {
                self.service_stack.push(StackEntry::Context(ctx));
                FrameError::InvalidState(format!(
                    "service stack context is not a {}",
                    std::any::type_name::<T>()
                ))
            }),
            other => Err(self.restore_service(other, "context")),
        }
    }

    pub fn push_service_int(&mut self, value: i32) {
        self.service_stack.push(StackEntry::Int(value));
    }

    /// # Errors
    ///
    /// `FrameError::EmptyStack` if the stack is empty, `FrameError::InvalidState`
    /// if the top entry is not an integer.
    pub fn pop_service_int(&mut self) -> Result<i32> {
        match self.service_stack.pop()? {
            StackEntry::Int(value) => Ok(value),
            other => Err(self.restore_service(other, "int")),
        }
    }

    /// Stacks a sibling frame. The handle is shared, not transferred.
    pub fn push_frame(&mut self, frame: FrameHandle) {
        self.service_stack.push(StackEntry::Frame(frame));
    }

    /// # Errors
    ///
    /// `FrameError::EmptyStack` if the stack is empty, `FrameError::InvalidState`
    /// if the top entry is not a frame.
    pub fn pop_frame(&mut self) -> Result<FrameHandle> {
        match self.service_stack.pop()? {
            StackEntry::Frame(frame) => Ok(frame),
            other => Err(self.restore_service(other, "frame")),
        }
    }

    fn restore_service(&mut self, entry: StackEntry, wanted: &str) -> FrameError {
        let err = FrameError::InvalidState(format!(
            "expected {wanted} on service stack, found {}",
            entry.kind()
        ));
        self.service_stack.push(entry);
        err
    }
}

/// Discards entries a pull left behind, so the next pull starts clean.
pub(crate) fn drain_stale(stack: &mut OperationStack, which: &'static str) {
    if stack.is_empty() {
        return;
    }
    let kinds: Vec<&'static str> = stack.drain().map(|entry| entry.kind()).collect();
    tracing::warn!(
        stack = which,
        stale = kinds.len(),
        ?kinds,
        "Discarding operations that were not consumed by the pull"
    );
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("position", &self.position())
            .field("image_stack", &self.image_stack)
            .field("audio_stack", &self.audio_stack)
            .field("service_stack", &self.service_stack)
            .field("hooks", &self.hooks.as_ref().map(|h| h.name()))
            .field("image", &self.image.as_ref().map(|i| (i.format, i.width, i.height)))
            .field("audio", &self.audio.as_ref().map(|a| (a.format, a.samples)))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn new_frame_defaults() {
        let frame = Frame::new(12);
        assert_eq!(frame.position(), 12);
        assert!((frame.speed() - 1.0).abs() < f64::EPSILON);
        assert!((frame.fps() - 25.0).abs() < f64::EPSILON);
        assert!(!frame.is_hidden());
        assert!(frame.hooks().is_none());
    }

    #[test]
    fn service_stack_typed_pops() {
        let mut frame = Frame::new(0);
        frame.push_service(Arc::new(String::from("track")));
        frame.push_service_int(3);

        assert_eq!(frame.pop_service_int().unwrap(), 3);
        assert!(matches!(frame.pop_service::<u32>(), Err(FrameError::InvalidState(_))));
        // Mismatch leaves the entry in place.
        assert_eq!(frame.service_stack().len(), 1);
        assert_eq!(*frame.pop_service::<String>().unwrap(), "track");
        assert!(frame.pop_service_int().unwrap_err().is_empty_stack());
    }

    #[test]
    fn wrong_kind_is_restored() {
        let mut frame = Frame::new(0);
        frame.push_service_int(1);
        assert!(matches!(frame.pop_frame(), Err(FrameError::InvalidState(_))));
        assert_eq!(frame.pop_service_int().unwrap(), 1);
    }

    #[test]
    fn frame_handles_are_shared() {
        let mut a = Frame::new(0);
        let b = Frame::new(1).into_handle();
        a.push_frame(Arc::clone(&b));
        let popped = a.pop_frame().unwrap();
        assert!(Arc::ptr_eq(&popped, &b));
        assert_eq!(popped.lock().unwrap().position(), 1);
    }

    #[test]
    fn adjacent_frames_and_meta() {
        let mut frame = Frame::new(5);
        let prev = Frame::new(4).into_handle();
        frame.set_previous_frame(Arc::clone(&prev));
        frame.set_string("meta.title", "intro");
        frame.set_int("width", 720);

        assert!(Arc::ptr_eq(&frame.previous_frame().unwrap(), &prev));
        assert!(frame.next_frame().is_none());
        let meta: Vec<_> = frame.meta().map(|(k, _)| k).collect();
        assert_eq!(meta, ["meta.title"]);
    }

    #[test]
    fn hide_flags() {
        let mut frame = Frame::new(0);
        frame.set_int(keys::HIDE, HIDE_AUDIO);
        assert!(frame.is_muted());
        assert!(!frame.is_hidden());
    }
}
