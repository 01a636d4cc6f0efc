//! Ambient context — host-supplied values threaded through one invocation.
//!
//! Capability handlers receive the context alongside the backend-chosen
//! arguments, but the backend itself never sees it. The typed fields cover
//! what every transport has (where the message came from and from whom);
//! platform handles ride along in the extension map.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// Caller-supplied values made available to capability handlers without
/// being exposed to the model backend.
///
/// Cloning is cheap — extensions are `Arc`-shared — so the dispatcher can
/// hand an owned copy to handlers running on the blocking pool.
#[derive(Debug, Clone, Default)]
pub struct AmbientContext {
    /// Chat protocol of the originating message
    pub protocol: String,

    /// Channel the invocation belongs to
    pub channel: String,

    /// User id of the person being answered
    pub uid: String,

    /// Display name of the person being answered
    pub author: String,

    extensions: HashMap<String, Arc<dyn Any + Send + Sync>>,
}

impl AmbientContext {
    pub fn new(
        protocol: impl Into<String>,
        channel: impl Into<String>,
        uid: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        Self {
            protocol: protocol.into(),
            channel: channel.into(),
            uid: uid.into(),
            author: author.into(),
            extensions: HashMap::new(),
        }
    }

    /// Attach a platform handle under a well-known key.
    pub fn with_extension<T: Any + Send + Sync>(mut self, key: impl Into<String>, value: T) -> Self {
        self.extensions.insert(key.into(), Arc::new(value));
        self
    }

    /// Look up a platform handle by key and type.
    pub fn extension<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        self.extensions
            .get(key)
            .cloned()
            .and_then(|any| any.downcast::<T>().ok())
    }
}
