//! Client node lifecycle
//!
//! A [`Node`] owns the transport session, the payload codec and the topic
//! namespaces. It is created once with [`Node::init`], handed by reference to
//! every handle constructor, and closed with [`Node::shutdown`].

use crate::arm::ArmType;
use crate::codec::Codec;
use crate::config::{ClientConfig, NamespaceConfig, TransportKind};
use crate::loopback::LoopbackTransport;
use crate::sample::LatestSample;
use crate::scene::SceneObject;
use crate::transport::{SampleHandler, Subscription, TopicPublisher, Transport};
use crate::Result;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct Node {
    name: String,
    transport: Arc<dyn Transport>,
    codec: Codec,
    namespaces: NamespaceConfig,
}

impl Node {
    /// Open the transport selected in `config`
    pub async fn init(config: &ClientConfig) -> Result<Self> {
        info!("Initializing node '{}'", config.node_name);

        let transport: Arc<dyn Transport> = match config.transport.kind {
            TransportKind::Loopback => Arc::new(LoopbackTransport::new()),
            TransportKind::Zenoh => Self::open_zenoh(config).await?,
        };

        Ok(Self::with_transport(
            config.node_name.clone(),
            transport,
            config.codec,
            config.namespaces.clone(),
        ))
    }

    #[cfg(feature = "zenoh-integration")]
    async fn open_zenoh(config: &ClientConfig) -> Result<Arc<dyn Transport>> {
        let transport = crate::zenoh_transport::ZenohTransport::open(&config.transport).await?;
        Ok(Arc::new(transport))
    }

    #[cfg(not(feature = "zenoh-integration"))]
    async fn open_zenoh(_config: &ClientConfig) -> Result<Arc<dyn Transport>> {
        Err(crate::CrtkError::Transport(
            "Zenoh integration not enabled. Enable with --features zenoh-integration".to_string(),
        ))
    }

    pub fn with_transport(
        name: impl Into<String>,
        transport: Arc<dyn Transport>,
        codec: Codec,
        namespaces: NamespaceConfig,
    ) -> Self {
        let node = Self {
            name: name.into(),
            transport,
            codec,
            namespaces,
        };
        info!(
            "Node '{}' ready ({} transport, {:?} payloads)",
            node.name,
            node.transport.kind(),
            node.codec
        );
        node
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn codec(&self) -> Codec {
        self.codec
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Namespace of an arm, e.g. `/PSM1` or `/CRTK/PSM1` with a prefix
    pub fn arm_namespace(&self, arm: ArmType) -> String {
        format!("{}{}", self.namespaces.arm_prefix, arm.namespace())
    }

    pub fn arm_topic(&self, arm: ArmType, suffix: &str) -> String {
        format!("{}/{}", self.arm_namespace(arm), suffix)
    }

    /// `<scene-ns>/<Name>/State/pose`
    pub fn scene_topic(&self, object: SceneObject) -> String {
        format!("{}/{}/State/pose", self.namespaces.scene, object.name())
    }

    pub async fn advertise(&self, topic: &str) -> Result<Box<dyn TopicPublisher>> {
        self.transport.advertise(topic).await
    }

    /// Subscribe `topic` and keep its most recent decodable sample in `cell`.
    ///
    /// Payloads that fail to decode are logged and dropped; the cell keeps
    /// its previous sample.
    pub async fn subscribe_latest<T>(
        &self,
        topic: &str,
        cell: Arc<LatestSample<T>>,
    ) -> Result<Subscription>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        let codec = self.codec;
        let owned_topic = topic.to_string();
        let handler: SampleHandler =
            Arc::new(move |payload: &[u8]| match codec.decode::<T>(payload) {
                Ok(msg) => {
                    cell.store(msg);
                    debug!("Sample on {} ({} bytes)", owned_topic, payload.len());
                }
                Err(e) => warn!("Dropping sample on {}: {}", owned_topic, e),
            });

        self.transport.subscribe(topic, handler).await
    }

    /// Close the transport. Handles created from this node stop receiving.
    pub async fn shutdown(self) -> Result<()> {
        info!("Shutting down node '{}'", self.name);
        self.transport.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::JointState;
    use crate::CrtkError;

    fn loopback_node(namespaces: NamespaceConfig) -> (Node, LoopbackTransport) {
        let loopback = LoopbackTransport::new();
        let node = Node::with_transport(
            "test_node",
            Arc::new(loopback.clone()),
            Codec::Json,
            namespaces,
        );
        (node, loopback)
    }

    #[test]
    fn test_topic_paths() {
        let (node, _) = loopback_node(NamespaceConfig::default());
        assert_eq!(node.arm_topic(ArmType::Psm1, "servo_cp"), "/PSM1/servo_cp");
        assert_eq!(node.arm_topic(ArmType::Ecm, "measured_jp"), "/ECM/measured_jp");
        assert_eq!(node.scene_topic(SceneObject::Exit4), "/ambf/env/Exit4/State/pose");
    }

    #[test]
    fn test_arm_prefix() {
        let namespaces = NamespaceConfig {
            arm_prefix: "/CRTK".to_string(),
            ..Default::default()
        };
        let (node, _) = loopback_node(namespaces);
        assert_eq!(node.arm_topic(ArmType::Psm2, "T_b_w"), "/CRTK/PSM2/T_b_w");
    }

    #[tokio::test]
    async fn test_init_loopback_from_config() {
        let config =
            ClientConfig::from_yaml("transport:\n  kind: loopback\ncodec: cbor\n").unwrap();
        let node = Node::init(&config).await.unwrap();
        assert_eq!(node.name(), "crtk_example_node");
        assert_eq!(node.transport().kind(), "loopback");
        assert_eq!(node.codec(), Codec::Cbor);
        node.shutdown().await.unwrap();
    }

    #[cfg(not(feature = "zenoh-integration"))]
    #[tokio::test]
    async fn test_init_zenoh_without_feature_fails() {
        let result = Node::init(&ClientConfig::default()).await;
        assert!(matches!(result, Err(CrtkError::Transport(_))));
    }

    #[tokio::test]
    async fn test_subscribe_latest_ignores_garbage() {
        let (node, loopback) = loopback_node(NamespaceConfig::default());
        let cell = Arc::new(LatestSample::<JointState>::new());
        let _sub = node.subscribe_latest("/PSM1/measured_jp", Arc::clone(&cell)).await.unwrap();

        let good = Codec::Json.encode(&JointState::from_positions(&[1.0])).unwrap();
        loopback.inject("/PSM1/measured_jp", good).unwrap();
        loopback.inject("/PSM1/measured_jp", b"not json".to_vec()).unwrap();

        assert_eq!(cell.latest().unwrap().position, vec![1.0]);
    }
}
