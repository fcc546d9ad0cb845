// SPDX-FileCopyrightText: © 2025 FrameKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

use framekit_core::{Frame, Producer};
use std::sync::Arc;

/// A window `[in_point, out_point]` over another producer.
///
/// Position 0 of the cut is `in_point` of the parent; positions past the
/// end hold the last frame of the window.
pub struct CutProducer {
    id: String,
    parent: Arc<dyn Producer>,
    in_point: i64,
    out_point: i64,
}

impl CutProducer {
    /// # Errors
    ///
    /// Returns an error if the window is empty or starts before 0.
    pub fn new(parent: Arc<dyn Producer>, in_point: i64, out_point: i64) -> Result<Self, String> {
        if in_point < 0 || out_point < in_point {
            return Err(format!("Invalid cut window [{in_point}, {out_point}]"));
        }
        Ok(Self { id: format!("cut:{}", parent.id()), parent, in_point, out_point })
    }
}

impl Producer for CutProducer {
    fn id(&self) -> &str {
        &self.id
    }

    fn get_frame(&self, position: i64) -> framekit_core::Result<Frame> {
        let source = position.saturating_add(self.in_point).clamp(self.in_point, self.out_point);
        let mut frame = self.parent.get_frame(source)?;
        frame.set_position(position);
        Ok(frame)
    }

    fn parent(&self) -> Option<Arc<dyn Producer>> {
        Some(Arc::clone(&self.parent))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use framekit_core::{keys, pull_frame};

    struct Counter;

    impl Producer for Counter {
        fn id(&self) -> &str {
            "counter"
        }

        fn get_frame(&self, position: i64) -> framekit_core::Result<Frame> {
            let mut frame = Frame::new(position);
            frame.set_int("source_position", position);
            Ok(frame)
        }
    }

    #[test]
    fn offsets_and_clamps_positions() {
        let cut: Arc<dyn Producer> = Arc::new(CutProducer::new(Arc::new(Counter), 10, 12).unwrap());
        let frame = pull_frame(&cut, 0).unwrap();
        assert_eq!(frame.get_int("source_position"), 10);
        assert_eq!(frame.position(), 0);
        assert_eq!(pull_frame(&cut, 7).unwrap().get_int("source_position"), 12);
        assert_eq!(pull_frame(&cut, -3).unwrap().get_int("source_position"), 10);
    }

    #[test]
    fn original_producer_is_the_parent() {
        let source: Arc<dyn Producer> = Arc::new(Counter);
        let cut: Arc<dyn Producer> = Arc::new(CutProducer::new(Arc::clone(&source), 0, 5).unwrap());
        let frame = pull_frame(&cut, 1).unwrap();
        assert_eq!(frame.producer().unwrap().id(), "cut:counter");
        assert_eq!(frame.original_producer().unwrap().id(), "counter");
        assert!(frame.properties().contains(keys::PRODUCER));
    }

    #[test]
    fn rejects_empty_window() {
        assert!(CutProducer::new(Arc::new(Counter), 5, 4).is_err());
        assert!(CutProducer::new(Arc::new(Counter), -1, 4).is_err());
        assert!(CutProducer::new(Arc::new(Counter), 4, 4).is_ok());
    }
}
