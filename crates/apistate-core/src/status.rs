//! Opaque synchronization status markers.
//!
//! Markers are created and updated by whatever owns the store. This crate
//! only clones the handle onto denormalized output, so an update made through
//! one handle is visible through every other.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// A shared handle to externally managed status metadata.
#[derive(Clone, Default)]
pub struct StatusMarker {
    inner: Arc<RwLock<Value>>,
}

impl StatusMarker {
    pub fn new(value: Value) -> Self {
        Self {
            inner: Arc::new(RwLock::new(value)),
        }
    }

    /// Copy of the current status payload.
    pub fn snapshot(&self) -> Value {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the payload in place. Every clone of this marker observes it.
    pub fn replace(&self, value: Value) -> Value {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, value)
    }

    /// Whether both handles point at the same marker.
    pub fn ptr_eq(&self, other: &StatusMarker) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for StatusMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StatusMarker").field(&self.snapshot()).finish()
    }
}

/// Markers compare by payload, so two independent denormalizations of the
/// same store are structurally equal.
impl PartialEq for StatusMarker {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.snapshot() == other.snapshot()
    }
}

impl Serialize for StatusMarker {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.snapshot().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for StatusMarker {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(StatusMarker::new)
    }
}
