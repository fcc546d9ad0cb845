// SPDX-FileCopyrightText: © 2025 FrameKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

use framekit_core::{pull_frame, Filter, Frame, Producer, Transition};
use std::sync::Arc;

/// A producer followed by filters, applied in order.
///
/// Because each filter pushes onto the frame's stacks, the last filter's
/// callback runs first at pull time and the first filter sits nearest the
/// source.
pub struct Chain {
    id: String,
    producer: Arc<dyn Producer>,
    filters: Vec<Arc<dyn Filter>>,
}

impl Chain {
    pub fn new(producer: Arc<dyn Producer>) -> Self {
        Self { id: format!("chain:{}", producer.id()), producer, filters: Vec::new() }
    }

    #[must_use]
    pub fn with_filter(mut self, filter: Arc<dyn Filter>) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn attach(&mut self, filter: Arc<dyn Filter>) {
        self.filters.push(filter);
    }

    pub fn filters(&self) -> &[Arc<dyn Filter>] {
        &self.filters
    }
}

impl Producer for Chain {
    fn id(&self) -> &str {
        &self.id
    }

    fn get_frame(&self, position: i64) -> framekit_core::Result<Frame> {
        let mut frame = pull_frame(&self.producer, position)?;
        for filter in &self.filters {
            filter.process(&mut frame)?;
            tracing::trace!(chain = %self.id, filter = filter.id(), position, "Attached filter");
        }
        Ok(frame)
    }

    fn parent(&self) -> Option<Arc<dyn Producer>> {
        Some(Arc::clone(&self.producer))
    }
}

/// Two tracks combined by a transition. Track `a` is the frame returned.
pub struct MixProducer {
    id: String,
    a: Arc<dyn Producer>,
    b: Arc<dyn Producer>,
    transition: Arc<dyn Transition>,
}

impl MixProducer {
    pub fn new(a: Arc<dyn Producer>, b: Arc<dyn Producer>, transition: Arc<dyn Transition>) -> Self {
        let id = format!("{}({}, {})", transition.id(), a.id(), b.id());
        Self { id, a, b, transition }
    }
}

impl Producer for MixProducer {
    fn id(&self) -> &str {
        &self.id
    }

    fn get_frame(&self, position: i64) -> framekit_core::Result<Frame> {
        let mut a = pull_frame(&self.a, position)?;
        let b = pull_frame(&self.b, position)?;
        self.transition.process(&mut a, b.into_handle())?;
        Ok(a)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::video::filters::invert::InvertFilter;
    use framekit_core::{Image, ImageFormat, ImageRequest};

    struct Gray(u8);

    impl Producer for Gray {
        fn id(&self) -> &str {
            "gray"
        }

        fn get_frame(&self, position: i64) -> framekit_core::Result<Frame> {
            let mut frame = Frame::new(position);
            let level = self.0;
            frame.push_get_image(move |_, _| {
                Image::from_vec(ImageFormat::Rgb24a, 1, 1, vec![level, level, level, 255])
            });
            Ok(frame)
        }
    }

    #[test]
    fn filters_attach_in_order() {
        let chain = Chain::new(Arc::new(Gray(10)))
            .with_filter(Arc::new(InvertFilter))
            .with_filter(Arc::new(InvertFilter));
        assert_eq!(chain.filters().len(), 2);
        let mut frame = chain.get_frame(3).unwrap();
        assert_eq!(frame.image_stack().len(), 3);
        assert_eq!(frame.position(), 3);

        let image = frame.get_image(&ImageRequest::new(ImageFormat::Rgb24a, 1, 1)).unwrap();
        assert_eq!(image.data(), &[10, 10, 10, 255]);
    }

    #[test]
    fn chain_parent_is_its_producer() {
        let chain: Arc<dyn Producer> = Arc::new(Chain::new(Arc::new(Gray(0))));
        assert_eq!(chain.parent().unwrap().id(), "gray");
        assert_eq!(chain.id(), "chain:gray");
    }
}
