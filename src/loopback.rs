//! In-process loopback transport
//!
//! Delivers every published payload synchronously to the subscribers of the
//! same topic and keeps a log of what was published. Used for offline runs of
//! the example and as the test double for the handles.

use crate::transport::{SampleHandler, Subscription, TopicPublisher, Transport};
use crate::{CrtkError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tracing::debug;

#[derive(Default)]
struct LoopbackState {
    next_id: u64,
    subscribers: HashMap<String, Vec<(u64, SampleHandler)>>,
    published: HashMap<String, Vec<Vec<u8>>>,
    closed: bool,
}

type SharedState = Arc<Mutex<LoopbackState>>;

fn lock(state: &Mutex<LoopbackState>) -> MutexGuard<'_, LoopbackState> {
    // Handlers never run under the lock, so a poisoned state is still consistent
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn dispatch(state: &SharedState, topic: &str, payload: Vec<u8>) -> Result<usize> {
    let handlers: Vec<SampleHandler> = {
        let mut guard = lock(state);
        if guard.closed {
            return Err(CrtkError::Transport("loopback transport is closed".to_string()));
        }
        let handlers = guard
            .subscribers
            .get(topic)
            .map(|subs| subs.iter().map(|(_, h)| Arc::clone(h)).collect())
            .unwrap_or_default();
        guard
            .published
            .entry(topic.to_string())
            .or_default()
            .push(payload.clone());
        handlers
    };

    for handler in &handlers {
        handler(&payload);
    }
    debug!(
        "Loopback delivered {} bytes on {} to {} subscriber(s)",
        payload.len(),
        topic,
        handlers.len()
    );
    Ok(handlers.len())
}

/// Loopback transport. Clones share the same topic table.
#[derive(Clone, Default)]
pub struct LoopbackTransport {
    state: SharedState,
}

impl LoopbackTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish from outside any handle, e.g. to play the simulator's side.
    /// Returns the number of subscribers reached.
    pub fn inject(&self, topic: &str, payload: Vec<u8>) -> Result<usize> {
        dispatch(&self.state, topic, payload)
    }

    /// Every payload published on `topic`, oldest first
    pub fn published(&self, topic: &str) -> Vec<Vec<u8>> {
        lock(&self.state).published.get(topic).cloned().unwrap_or_default()
    }

    pub fn last_published(&self, topic: &str) -> Option<Vec<u8>> {
        lock(&self.state)
            .published
            .get(topic)
            .and_then(|log| log.last().cloned())
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        lock(&self.state).subscribers.get(topic).map_or(0, Vec::len)
    }

    /// Topics that currently have at least one subscriber, sorted
    pub fn subscribed_topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = lock(&self.state)
            .subscribers
            .iter()
            .filter(|(_, subs)| !subs.is_empty())
            .map(|(topic, _)| topic.clone())
            .collect();
        topics.sort();
        topics
    }
}

struct LoopbackPublisher {
    topic: String,
    state: SharedState,
}

#[async_trait]
impl TopicPublisher for LoopbackPublisher {
    fn topic(&self) -> &str {
        &self.topic
    }

    async fn put(&self, payload: Vec<u8>) -> Result<()> {
        dispatch(&self.state, &self.topic, payload).map(|_| ())
    }
}

struct LoopbackSubscriptionGuard {
    topic: String,
    id: u64,
    state: Weak<Mutex<LoopbackState>>,
}

impl Drop for LoopbackSubscriptionGuard {
    fn drop(&mut self) {
        if let Some(state) = self.state.upgrade() {
            let mut guard = lock(&state);
            if let Some(subs) = guard.subscribers.get_mut(&self.topic) {
                subs.retain(|(id, _)| *id != self.id);
            }
        }
    }
}

#[async_trait]
impl Transport for LoopbackTransport {
    fn kind(&self) -> &'static str {
        "loopback"
    }

    async fn advertise(&self, topic: &str) -> Result<Box<dyn TopicPublisher>> {
        Ok(Box::new(LoopbackPublisher {
            topic: topic.to_string(),
            state: Arc::clone(&self.state),
        }))
    }

    async fn subscribe(&self, topic: &str, handler: SampleHandler) -> Result<Subscription> {
        let id = {
            let mut guard = lock(&self.state);
            if guard.closed {
                return Err(CrtkError::Transport("loopback transport is closed".to_string()));
            }
            let id = guard.next_id;
            guard.next_id += 1;
            guard
                .subscribers
                .entry(topic.to_string())
                .or_default()
                .push((id, handler));
            id
        };

        let guard = LoopbackSubscriptionGuard {
            topic: topic.to_string(),
            id,
            state: Arc::downgrade(&self.state),
        };
        Ok(Subscription::new(topic, Box::new(guard)))
    }

    async fn close(&self) -> Result<()> {
        let mut guard = lock(&self.state);
        guard.closed = true;
        guard.subscribers.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_handler(counter: &Arc<AtomicUsize>) -> SampleHandler {
        let counter = Arc::clone(counter);
        Arc::new(move |_payload: &[u8]| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[tokio::test]
    async fn test_publish_reaches_only_matching_topic() {
        let transport = LoopbackTransport::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let _sub = transport.subscribe("/a", counting_handler(&hits)).await.unwrap();

        let on_a = transport.advertise("/a").await.unwrap();
        let on_b = transport.advertise("/b").await.unwrap();
        on_a.put(b"1".to_vec()).await.unwrap();
        on_b.put(b"2".to_vec()).await.unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(transport.published("/a"), vec![b"1".to_vec()]);
        assert_eq!(transport.last_published("/b"), Some(b"2".to_vec()));
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_succeeds() {
        let transport = LoopbackTransport::new();
        let publisher = transport.advertise("/nobody").await.unwrap();
        assert!(publisher.put(vec![1, 2, 3]).await.is_ok());
        assert_eq!(transport.inject("/nobody", vec![4]).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_dropping_subscription_stops_delivery() {
        let transport = LoopbackTransport::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let sub = transport.subscribe("/t", counting_handler(&hits)).await.unwrap();
        assert_eq!(sub.topic(), "/t");
        assert_eq!(transport.subscriber_count("/t"), 1);

        drop(sub);
        assert_eq!(transport.subscriber_count("/t"), 0);
        transport.inject("/t", vec![0]).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_closed_transport_rejects_traffic() {
        let transport = LoopbackTransport::new();
        let publisher = transport.advertise("/t").await.unwrap();
        transport.close().await.unwrap();

        assert!(matches!(publisher.put(vec![0]).await, Err(CrtkError::Transport(_))));
        let hits = Arc::new(AtomicUsize::new(0));
        assert!(transport.subscribe("/t", counting_handler(&hits)).await.is_err());
    }
}
