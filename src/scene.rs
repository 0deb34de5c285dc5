//! Scene landmark handle

use crate::messages::TransformStamped;
use crate::node::Node;
use crate::sample::LatestSample;
use crate::transport::Subscription;
use crate::{CrtkError, Result};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

/// Fixed points of interest published by the simulator, all w.r.t. world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneObject {
    Needle,
    Entry1,
    Entry2,
    Entry3,
    Entry4,
    Exit1,
    Exit2,
    Exit3,
    Exit4,
}

impl SceneObject {
    pub const ALL: [SceneObject; 9] = [
        SceneObject::Needle,
        SceneObject::Entry1,
        SceneObject::Entry2,
        SceneObject::Entry3,
        SceneObject::Entry4,
        SceneObject::Exit1,
        SceneObject::Exit2,
        SceneObject::Exit3,
        SceneObject::Exit4,
    ];

    /// Object name as used in the simulator's topic tree
    pub fn name(&self) -> &'static str {
        match self {
            SceneObject::Needle => "Needle",
            SceneObject::Entry1 => "Entry1",
            SceneObject::Entry2 => "Entry2",
            SceneObject::Entry3 => "Entry3",
            SceneObject::Entry4 => "Entry4",
            SceneObject::Exit1 => "Exit1",
            SceneObject::Exit2 => "Exit2",
            SceneObject::Exit3 => "Exit3",
            SceneObject::Exit4 => "Exit4",
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for SceneObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SceneObject {
    type Err = CrtkError;

    fn from_str(s: &str) -> Result<Self> {
        SceneObject::ALL
            .into_iter()
            .find(|object| object.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| CrtkError::invalid_argument(format!("Unknown scene object: {:?}", s)))
    }
}

/// Latest pose of every [`SceneObject`]
pub struct SceneInterface {
    poses: [Arc<LatestSample<TransformStamped>>; 9],
    _subscriptions: Vec<Subscription>,
}

impl SceneInterface {
    pub async fn new(node: &Node) -> Result<Self> {
        info!("Creating scene interface for {} objects", SceneObject::ALL.len());

        let poses: [Arc<LatestSample<TransformStamped>>; 9] =
            std::array::from_fn(|_| Arc::new(LatestSample::new()));
        let mut subscriptions = Vec::with_capacity(SceneObject::ALL.len());
        for object in SceneObject::ALL {
            let topic = node.scene_topic(object);
            subscriptions.push(
                node.subscribe_latest(&topic, Arc::clone(&poses[object.index()]))
                    .await?,
            );
        }

        Ok(Self {
            poses,
            _subscriptions: subscriptions,
        })
    }

    pub fn measured_pose(&self, object: SceneObject) -> Option<TransformStamped> {
        self.poses[object.index()].latest()
    }

    /// Like [`SceneInterface::measured_pose`], looked up by object name
    pub fn measured_pose_by_name(&self, name: &str) -> Result<Option<TransformStamped>> {
        let object: SceneObject = name.parse()?;
        Ok(self.measured_pose(object))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Codec;
    use crate::config::NamespaceConfig;
    use crate::loopback::LoopbackTransport;
    use crate::messages::{Transform, Vector3};

    fn pose_msg(x: f64) -> TransformStamped {
        TransformStamped {
            child_frame_id: "world".to_string(),
            transform: Transform {
                translation: Vector3 { x, y: 1.0, z: 2.0 },
                ..Default::default()
            },
            ..Default::default()
        }
    }

    async fn scene_with_loopback() -> (SceneInterface, Node, LoopbackTransport) {
        let loopback = LoopbackTransport::new();
        let node = Node::with_transport(
            "scene_test",
            Arc::new(loopback.clone()),
            Codec::Json,
            NamespaceConfig::default(),
        );
        let scene = SceneInterface::new(&node).await.unwrap();
        (scene, node, loopback)
    }

    #[tokio::test]
    async fn test_subscribes_by_object_name() {
        let (_scene, _node, loopback) = scene_with_loopback().await;
        let topics = loopback.subscribed_topics();
        assert_eq!(topics.len(), 9);
        assert!(topics.contains(&"/ambf/env/Needle/State/pose".to_string()));
        assert!(topics.contains(&"/ambf/env/Entry3/State/pose".to_string()));
        assert!(topics.contains(&"/ambf/env/Exit4/State/pose".to_string()));
    }

    #[tokio::test]
    async fn test_absent_then_last_write_wins() {
        let (scene, _node, loopback) = scene_with_loopback().await;
        for object in SceneObject::ALL {
            assert!(scene.measured_pose(object).is_none());
        }

        for (i, object) in SceneObject::ALL.into_iter().enumerate() {
            let topic = format!("/ambf/env/{}/State/pose", object.name());
            loopback.inject(&topic, Codec::Json.encode(&pose_msg(-1.0)).unwrap()).unwrap();
            loopback.inject(&topic, Codec::Json.encode(&pose_msg(i as f64)).unwrap()).unwrap();
        }

        for (i, object) in SceneObject::ALL.into_iter().enumerate() {
            assert_eq!(scene.measured_pose(object), Some(pose_msg(i as f64)));
        }
    }

    #[tokio::test]
    async fn test_lookup_by_name() {
        let (scene, _node, loopback) = scene_with_loopback().await;
        loopback
            .inject("/ambf/env/Entry1/State/pose", Codec::Json.encode(&pose_msg(0.5)).unwrap())
            .unwrap();

        assert_eq!(scene.measured_pose_by_name("Entry1").unwrap(), Some(pose_msg(0.5)));
        assert_eq!(scene.measured_pose_by_name("exit4").unwrap(), None);
    }

    #[tokio::test]
    async fn test_unknown_name_is_invalid_argument() {
        let (scene, _node, _loopback) = scene_with_loopback().await;
        let err = scene.measured_pose_by_name("Entry5").unwrap_err();
        assert!(err.is_invalid_argument());
    }
}
