//! Transport abstraction for topic-based pub/sub
//!
//! Handles only ever talk to a [`Transport`], so the same arm and scene code
//! runs over Zenoh in production and over the in-process loopback in tests.

use crate::Result;
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;

/// Callback invoked with the raw payload of each sample on a topic.
///
/// Runs on the transport's delivery thread, so it must not block.
pub type SampleHandler = Arc<dyn Fn(&[u8]) + Send + Sync>;

/// Publish endpoint for a single topic
#[async_trait]
pub trait TopicPublisher: Send + Sync {
    fn topic(&self) -> &str;

    /// Fire-and-forget publish. Succeeds whether or not anyone listens.
    async fn put(&self, payload: Vec<u8>) -> Result<()>;
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Short name for logs ("zenoh", "loopback")
    fn kind(&self) -> &'static str;

    async fn advertise(&self, topic: &str) -> Result<Box<dyn TopicPublisher>>;

    async fn subscribe(&self, topic: &str, handler: SampleHandler) -> Result<Subscription>;

    async fn close(&self) -> Result<()>;
}

/// Keeps a subscription declared. Dropping it stops delivery.
pub struct Subscription {
    topic: String,
    _guard: Box<dyn Any + Send + Sync>,
}

impl Subscription {
    pub fn new(topic: impl Into<String>, guard: Box<dyn Any + Send + Sync>) -> Self {
        Self {
            topic: topic.into(),
            _guard: guard,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("topic", &self.topic).finish()
    }
}
