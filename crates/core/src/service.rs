// SPDX-FileCopyrightText: © 2025 FrameKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Service object model: producers create frames, filters and transitions
//! queue work on them.
//!
//! Services do no pixel or sample work when a frame passes through them.
//! They push callbacks onto the frame's stacks and return; the work happens
//! when the consumer pulls.

use crate::error::Result;
use crate::frame::Frame;
use crate::properties::keys;
use crate::stack::FrameHandle;
use std::sync::{Arc, Weak};

/// Creates frames.
pub trait Producer: Send + Sync {
    /// Identifier used in logs and registry listings.
    fn id(&self) -> &str;

    /// Creates the frame for `position` with its image/audio work queued.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame cannot be set up.
    fn get_frame(&self, position: i64) -> Result<Frame>;

    /// The producer this one wraps, if any (e.g. a cut over a clip).
    fn parent(&self) -> Option<Arc<dyn Producer>> {
        None
    }
}

/// Queues a transformation on one frame.
pub trait Filter: Send + Sync {
    fn id(&self) -> &str;

    /// Pushes this filter's callbacks onto `frame`.
    ///
    /// # Errors
    ///
    /// Returns an error if the filter cannot attach to the frame.
    fn process(&self, frame: &mut Frame) -> Result<()>;
}

/// Queues a composition of a second frame onto the first.
pub trait Transition: Send + Sync {
    fn id(&self) -> &str;

    /// Pushes this transition's callbacks onto `a`, holding on to `b`.
    ///
    /// # Errors
    ///
    /// Returns an error if the transition cannot attach to the frames.
    fn process(&self, a: &mut Frame, b: FrameHandle) -> Result<()>;
}

/// Weak back-reference from a frame to its producer.
struct ProducerRef(Weak<dyn Producer>);

/// Asks `producer` for a frame and stamps it with a weak `_producer`
/// reference unless the producer already set one.
///
/// # Errors
///
/// Forwards the producer's error.
pub fn pull_frame(producer: &Arc<dyn Producer>, position: i64) -> Result<Frame> {
    let mut frame = producer.get_frame(position)?;
    if frame.producer().is_none() {
        frame.set_producer(producer);
    }
    tracing::trace!(producer = producer.id(), position, "Pulled frame");
    Ok(frame)
}

impl Frame {
    /// Records `producer` as this frame's origin without keeping it alive.
    pub fn set_producer(&mut self, producer: &Arc<dyn Producer>) {
        self.properties_mut().set_data(keys::PRODUCER, Arc::new(ProducerRef(Arc::downgrade(producer))));
    }

    /// The producer that created this frame, if it is still alive.
    pub fn producer(&self) -> Option<Arc<dyn Producer>> {
        self.properties().get_data::<ProducerRef>(keys::PRODUCER)?.0.upgrade()
    }

    /// Walks `parent()` from the frame's producer to the outermost source.
    pub fn original_producer(&self) -> Option<Arc<dyn Producer>> {
        let mut current = self.producer()?;
        while let Some(parent) = current.parent() {
            current = parent;
        }
        Some(current)
    }
}
