// SPDX-FileCopyrightText: © 2025 FrameKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Insertion-ordered attribute store embedded in every frame.
//!
//! Values are loosely typed in the traditional way: numeric accessors parse
//! strings, string accessors format numbers. Opaque data is carried as
//! `Arc<dyn Any>` and recovered with a typed downcast.

use indexmap::IndexMap;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Reserved attribute names.
pub mod keys {
    /// Set to 1 when the image is a synthesised test card.
    pub const TEST_IMAGE: &str = "test_image";
    /// Set to 1 when the audio is synthesised silence (also mutes callbacks).
    pub const TEST_AUDIO: &str = "test_audio";
    /// Weak reference to the producer that created the frame.
    pub const PRODUCER: &str = "_producer";
    pub const SPEED: &str = "_speed";
    pub const POSITION: &str = "_position";
    /// Bit 1 hides video, bit 2 mutes audio.
    pub const HIDE: &str = "hide";
    pub const PREVIOUS_FRAME: &str = "previous frame";
    pub const NEXT_FRAME: &str = "next frame";
    pub const ASPECT_RATIO: &str = "aspect_ratio";
    pub const FPS: &str = "fps";
    pub const WIDTH: &str = "width";
    pub const HEIGHT: &str = "height";
    pub const FORMAT: &str = "format";
    pub const AUDIO_FREQUENCY: &str = "audio_frequency";
    pub const AUDIO_CHANNELS: &str = "audio_channels";
    pub const AUDIO_SAMPLES: &str = "audio_samples";
    pub const AUDIO_FORMAT: &str = "audio_format";
    pub const META_PREFIX: &str = "meta.";
    /// Pending gain applied once by the next audio pull.
    pub const META_VOLUME: &str = "meta.volume";
}

/// A single attribute value.
#[derive(Clone)]
pub enum Value {
    String(String),
    Int(i64),
    Double(f64),
    Data(Arc<dyn Any + Send + Sync>),
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s:?}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Double(d) => write!(f, "{d}"),
            Self::Data(_) => f.write_str("<data>"),
        }
    }
}

impl Value {
    /// String form; `None` for opaque data.
    pub fn as_string(&self) -> Option<String> {
        match self {
            Self::String(s) => Some(s.clone()),
            Self::Int(i) => Some(i.to_string()),
            Self::Double(d) => Some(d.to_string()),
            Self::Data(_) => None,
        }
    }

    /// Integer form. Doubles truncate toward zero, strings are parsed.
    #[allow(clippy::cast_possible_truncation)]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Double(d) => Some(*d as i64),
            Self::String(s) => {
                let s = s.trim();
                s.parse::<i64>().ok().or_else(|| s.parse::<f64>().ok().map(|d| d as i64))
            },
            Self::Data(_) => None,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Double(d) => Some(*d),
            Self::String(s) => s.trim().parse().ok(),
            Self::Data(_) => None,
        }
    }
}

/// Insertion-ordered key/value store.
#[derive(Clone, Default, Debug)]
pub struct Properties {
    values: IndexMap<String, Value>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    pub fn set_string(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.set(key, Value::String(value.into()));
    }

    pub fn set_int(&mut self, key: impl Into<String>, value: i64) {
        self.set(key, Value::Int(value));
    }

    pub fn set_double(&mut self, key: impl Into<String>, value: f64) {
        self.set(key, Value::Double(value));
    }

    pub fn set_data<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: Arc<T>) {
        self.set(key, Value::Data(value));
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.get(key).and_then(Value::as_string)
    }

    /// Integer value, 0 when missing or not numeric.
    pub fn get_int(&self, key: &str) -> i64 {
        self.get(key).and_then(Value::as_int).unwrap_or(0)
    }

    /// Double value, 0.0 when missing or not numeric.
    pub fn get_double(&self, key: &str) -> f64 {
        self.get(key).and_then(Value::as_double).unwrap_or(0.0)
    }

    /// Opaque data downcast to `T`.
    pub fn get_data<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        match self.get(key)? {
            Value::Data(data) => Arc::clone(data).downcast::<T>().ok(),
            _ => None,
        }
    }

    /// Removes `key`, keeping the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.shift_remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Entries whose key starts with `prefix`, in insertion order.
    pub fn with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = (&'a str, &'a Value)> {
        self.iter().filter(move |(k, _)| k.starts_with(prefix))
    }

    /// Copies every entry whose key starts with `prefix` into `self`.
    pub fn inherit_prefix(&mut self, other: &Self, prefix: &str) {
        for (key, value) in other.with_prefix(prefix) {
            self.set(key, value.clone());
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn numeric_coercion() {
        let mut props = Properties::new();
        props.set_string("a", " 42 ");
        props.set_string("b", "2.75");
        props.set_double("c", -3.9);
        props.set_int("d", 7);

        assert_eq!(props.get_int("a"), 42);
        assert_eq!(props.get_int("b"), 2);
        assert_eq!(props.get_int("c"), -3);
        assert!((props.get_double("b") - 2.75).abs() < f64::EPSILON);
        assert_eq!(props.get_string("d").as_deref(), Some("7"));
        assert_eq!(props.get_int("missing"), 0);
    }

    #[test]
    fn insertion_order_survives_removal() {
        let mut props = Properties::new();
        props.set_int("x", 1);
        props.set_int("y", 2);
        props.set_int("z", 3);
        props.remove("y");
        let keys: Vec<_> = props.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["x", "z"]);
    }

    #[test]
    fn typed_data() {
        let mut props = Properties::new();
        props.set_data("blob", Arc::new(vec![1u8, 2, 3]));
        assert_eq!(*props.get_data::<Vec<u8>>("blob").unwrap(), vec![1, 2, 3]);
        assert!(props.get_data::<String>("blob").is_none());
        assert_eq!(props.get_string("blob"), None);
    }

    #[test]
    fn prefix_iteration() {
        let mut src = Properties::new();
        src.set_string("meta.title", "intro");
        src.set_int("width", 720);
        src.set_double("meta.volume", 0.5);

        let mut dst = Properties::new();
        dst.inherit_prefix(&src, keys::META_PREFIX);
        assert_eq!(dst.len(), 2);
        assert_eq!(dst.get_string("meta.title").as_deref(), Some("intro"));
        assert!(!dst.contains("width"));
    }
}
