//! Manipulator handles
//!
//! An [`ArmInterface`] mirrors the CRTK topics of one arm: it keeps the
//! latest `measured_cp`, `measured_jp` and `T_b_w` samples and publishes
//! `servo_cp` / `servo_jp` commands.

use crate::codec::Codec;
use crate::geometry::CartesianTarget;
use crate::messages::{JointState, TransformStamped};
use crate::node::Node;
use crate::sample::LatestSample;
use crate::transport::{Subscription, TopicPublisher};
use crate::{CrtkError, Result};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const MEASURED_CP: &str = "measured_cp";
pub const MEASURED_JP: &str = "measured_jp";
pub const BASE_IN_WORLD: &str = "T_b_w";
pub const SERVO_CP: &str = "servo_cp";
pub const SERVO_JP: &str = "servo_jp";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArmType {
    /// Patient-side manipulator 1
    Psm1,
    /// Patient-side manipulator 2
    Psm2,
    /// Endoscopic camera manipulator
    Ecm,
}

impl ArmType {
    pub const ALL: [ArmType; 3] = [ArmType::Psm1, ArmType::Psm2, ArmType::Ecm];

    pub fn namespace(&self) -> &'static str {
        match self {
            ArmType::Psm1 => "/PSM1",
            ArmType::Psm2 => "/PSM2",
            ArmType::Ecm => "/ECM",
        }
    }

    /// Length of the joint vector accepted by `servo_jp`
    pub fn joint_count(&self) -> usize {
        match self {
            ArmType::Psm1 | ArmType::Psm2 => 6,
            ArmType::Ecm => 4,
        }
    }

    pub fn name(&self) -> &'static str {
        self.namespace().trim_start_matches('/')
    }
}

impl fmt::Display for ArmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ArmType {
    type Err = CrtkError;

    fn from_str(s: &str) -> Result<Self> {
        ArmType::ALL
            .into_iter()
            .find(|arm| arm.name().eq_ignore_ascii_case(s.trim_start_matches('/')))
            .ok_or_else(|| CrtkError::invalid_argument(format!("Invalid arm type: {:?}", s)))
    }
}

/// Handle to one manipulator
pub struct ArmInterface {
    arm: ArmType,
    namespace: String,
    codec: Codec,
    measured_cp: Arc<LatestSample<TransformStamped>>,
    measured_jp: Arc<LatestSample<JointState>>,
    base_cp: Arc<LatestSample<TransformStamped>>,
    servo_cp_pub: Box<dyn TopicPublisher>,
    servo_jp_pub: Box<dyn TopicPublisher>,
    _subscriptions: Vec<Subscription>,
}

impl ArmInterface {
    pub async fn new(node: &Node, arm: ArmType) -> Result<Self> {
        let namespace = node.arm_namespace(arm);
        info!("Creating arm interface for {} at {}", arm, namespace);

        let measured_cp = Arc::new(LatestSample::new());
        let measured_jp = Arc::new(LatestSample::new());
        let base_cp = Arc::new(LatestSample::new());

        let subscriptions = vec![
            node.subscribe_latest(&node.arm_topic(arm, MEASURED_CP), Arc::clone(&measured_cp))
                .await?,
            node.subscribe_latest(&node.arm_topic(arm, MEASURED_JP), Arc::clone(&measured_jp))
                .await?,
            node.subscribe_latest(&node.arm_topic(arm, BASE_IN_WORLD), Arc::clone(&base_cp))
                .await?,
        ];
        let servo_cp_pub = node.advertise(&node.arm_topic(arm, SERVO_CP)).await?;
        let servo_jp_pub = node.advertise(&node.arm_topic(arm, SERVO_JP)).await?;

        Ok(Self {
            arm,
            namespace,
            codec: node.codec(),
            measured_cp,
            measured_jp,
            base_cp,
            servo_cp_pub,
            servo_jp_pub,
            _subscriptions: subscriptions,
        })
    }

    pub fn arm(&self) -> ArmType {
        self.arm
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Latest end-effector pose. For PSMs it is expressed in the arm's base
    /// frame, for the ECM in the world frame.
    pub fn measured_pose(&self) -> Option<TransformStamped> {
        self.measured_cp.latest()
    }

    pub fn measured_joint_positions(&self) -> Option<JointState> {
        self.measured_jp.latest()
    }

    /// Latest pose of the arm's base in the world frame
    pub fn measured_base_pose(&self) -> Option<TransformStamped> {
        self.base_cp.latest()
    }

    /// Command the end-effector pose (PSMs: w.r.t. the base frame)
    pub async fn servo_pose(&self, target: impl Into<CartesianTarget>) -> Result<()> {
        let msg = target.into().to_message()?;
        if self.arm == ArmType::Ecm {
            warn!("servo_cp on ECM; the camera arm is meant to be driven in joint space");
        }

        let payload = self.codec.encode(&msg)?;
        self.servo_cp_pub.put(payload).await?;
        debug!("{} servo_cp -> {:?}", self.arm, msg.transform);
        Ok(())
    }

    /// Command joint positions. One finite value per joint, in joint order.
    pub async fn servo_joint_positions(&self, positions: &[f64]) -> Result<()> {
        if let Some((index, value)) = positions.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(CrtkError::invalid_argument(format!(
                "joint position {} is not a number: {}",
                index, value
            )));
        }
        let expected = self.arm.joint_count();
        if positions.len() != expected {
            return Err(CrtkError::invalid_argument(format!(
                "{} expects {} joint positions, got {}",
                self.arm,
                expected,
                positions.len()
            )));
        }

        let msg = JointState::from_positions(positions);
        let payload = self.codec.encode(&msg)?;
        self.servo_jp_pub.put(payload).await?;
        debug!("{} servo_jp -> {:?}", self.arm, positions);
        Ok(())
    }
}
