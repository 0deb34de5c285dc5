//! Wire message shapes
//!
//! Field layout follows `geometry_msgs/TransformStamped` and
//! `sensor_msgs/JointState` so payloads line up with what the simulator's
//! CRTK bridge emits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Time {
    pub secs: i64,
    pub nsecs: u32,
}

impl Time {
    pub fn now() -> Self {
        Self::from(Utc::now())
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.secs as f64 + self.nsecs as f64 * 1e-9
    }
}

impl From<DateTime<Utc>> for Time {
    fn from(t: DateTime<Utc>) -> Self {
        Self {
            secs: t.timestamp(),
            nsecs: t.timestamp_subsec_nanos(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Header {
    #[serde(default)]
    pub seq: u32,
    #[serde(default)]
    pub stamp: Time,
    #[serde(default)]
    pub frame_id: String,
}

impl Header {
    /// Header stamped with the current wall-clock time
    pub fn stamped_now() -> Self {
        Self {
            seq: 0,
            stamp: Time::now(),
            frame_id: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self { x: 0.0, y: 0.0, z: 0.0, w: 1.0 }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub translation: Vector3,
    pub rotation: Quaternion,
}

/// Pose sample as carried on `measured_cp`, `servo_cp`, `T_b_w` and scene topics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformStamped {
    #[serde(default)]
    pub header: Header,
    #[serde(default)]
    pub child_frame_id: String,
    pub transform: Transform,
}

/// Joint sample as carried on `measured_jp` and `servo_jp`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JointState {
    #[serde(default)]
    pub header: Header,
    #[serde(default)]
    pub name: Vec<String>,
    #[serde(default)]
    pub position: Vec<f64>,
    #[serde(default)]
    pub velocity: Vec<f64>,
    #[serde(default)]
    pub effort: Vec<f64>,
}

impl JointState {
    /// Position-only command, stamped now
    pub fn from_positions(positions: &[f64]) -> Self {
        Self {
            header: Header::stamped_now(),
            position: positions.to_vec(),
            ..Default::default()
        }
    }
}

impl fmt::Display for TransformStamped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = self.transform.translation;
        let q = self.transform.rotation;
        write!(
            f,
            "p=[{:.4}, {:.4}, {:.4}] q=[{:.4}, {:.4}, {:.4}, {:.4}] @ {:.3}s",
            p.x,
            p.y,
            p.z,
            q.x,
            q.y,
            q.z,
            q.w,
            self.header.stamp.as_secs_f64()
        )
    }
}

impl fmt::Display for JointState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let positions: Vec<String> = self.position.iter().map(|v| format!("{:.4}", v)).collect();
        write!(f, "[{}]", positions.join(", "))
    }
}
