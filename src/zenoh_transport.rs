//! Zenoh Transport Module
//!
//! Carries CRTK topics over Zenoh. Topic names keep their ROS-style leading
//! slash everywhere else in the crate; here they are mapped to key
//! expressions by dropping it (`/PSM1/servo_cp` -> `PSM1/servo_cp`), which
//! is what the ROS/Zenoh bridges expose.

use crate::{CrtkError, Result};

/// Map a topic name to its Zenoh key expression
pub fn topic_to_key_expr(topic: &str) -> Result<String> {
    let key = topic.trim_start_matches('/');
    if key.is_empty() || key.split('/').any(str::is_empty) {
        return Err(CrtkError::invalid_argument(format!(
            "topic {:?} does not map to a valid key expression",
            topic
        )));
    }
    Ok(key.to_string())
}

#[cfg(feature = "zenoh-integration")]
pub use enabled::ZenohTransport;

#[cfg(feature = "zenoh-integration")]
mod enabled {
    use super::topic_to_key_expr;
    use crate::config::TransportConfig;
    use crate::transport::{SampleHandler, Subscription, TopicPublisher, Transport};
    use crate::{CrtkError, Result};
    use async_trait::async_trait;
    use std::sync::Arc;
    use tracing::{debug, info};
    use zenoh::{pubsub::Publisher, Session};

    /// Zenoh-backed transport
    ///
    /// One session per node; publishers and subscribers hold a clone of the
    /// session so it stays open as long as any of them is alive.
    #[derive(Clone)]
    pub struct ZenohTransport {
        session: Arc<Session>,
    }

    impl ZenohTransport {
        pub async fn open(transport: &TransportConfig) -> Result<Self> {
            info!("Opening Zenoh session ({} mode)", transport.mode.as_str());

            let mut config = zenoh::Config::default();
            let insert = |config: &mut zenoh::Config, key: &str, value: String| {
                config
                    .insert_json5(key, &value)
                    .map_err(|e| CrtkError::Config(format!("Invalid zenoh setting {}: {}", key, e)))
            };
            insert(&mut config, "mode", format!("\"{}\"", transport.mode.as_str()))?;
            if !transport.connect.is_empty() {
                let endpoints = serde_json::to_string(&transport.connect)
                    .map_err(|e| CrtkError::Config(e.to_string()))?;
                insert(&mut config, "connect/endpoints", endpoints)?;
            }
            if !transport.listen.is_empty() {
                let endpoints = serde_json::to_string(&transport.listen)
                    .map_err(|e| CrtkError::Config(e.to_string()))?;
                insert(&mut config, "listen/endpoints", endpoints)?;
            }

            let session = zenoh::open(config)
                .await
                .map_err(|e| CrtkError::Transport(format!("Failed to open Zenoh session: {}", e)))?;

            info!("Zenoh session opened");
            Ok(Self {
                session: Arc::new(session),
            })
        }
    }

    struct ZenohTopicPublisher {
        topic: String,
        publisher: Publisher<'static>,
        _session: Arc<Session>,
    }

    #[async_trait]
    impl TopicPublisher for ZenohTopicPublisher {
        fn topic(&self) -> &str {
            &self.topic
        }

        async fn put(&self, payload: Vec<u8>) -> Result<()> {
            let len = payload.len();
            self.publisher
                .put(payload)
                .await
                .map_err(|e| {
                    CrtkError::Transport(format!("Failed to publish on {}: {}", self.topic, e))
                })?;

            debug!("Published {} bytes to {}", len, self.topic);
            Ok(())
        }
    }

    #[async_trait]
    impl Transport for ZenohTransport {
        fn kind(&self) -> &'static str {
            "zenoh"
        }

        async fn advertise(&self, topic: &str) -> Result<Box<dyn TopicPublisher>> {
            let key = topic_to_key_expr(topic)?;
            let publisher = self
                .session
                .declare_publisher(key.clone())
                .await
                .map_err(|e| {
                    CrtkError::Transport(format!("Failed to create publisher {}: {}", key, e))
                })?;

            debug!("  - Publisher: {}", key);
            Ok(Box::new(ZenohTopicPublisher {
                topic: topic.to_string(),
                publisher,
                _session: Arc::clone(&self.session),
            }))
        }

        async fn subscribe(&self, topic: &str, handler: SampleHandler) -> Result<Subscription> {
            let key = topic_to_key_expr(topic)?;
            let subscriber = self
                .session
                .declare_subscriber(key.clone())
                .callback(move |sample| {
                    let payload = sample.payload().to_bytes();
                    handler(&*payload);
                })
                .await
                .map_err(|e| {
                    CrtkError::Transport(format!("Failed to create subscriber {}: {}", key, e))
                })?;

            debug!("  - Subscriber: {}", key);
            Ok(Subscription::new(topic, Box::new(subscriber)))
        }

        async fn close(&self) -> Result<()> {
            self.session
                .close()
                .await
                .map_err(|e| {
                    CrtkError::Transport(format!("Failed to close Zenoh session: {}", e))
                })?;
            info!("Zenoh session closed");
            Ok(())
        }
    }
}
