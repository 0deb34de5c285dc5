//! Pose representations and frame conversion
//!
//! Commands can be expressed either as a [`Pose`] (translation + unit
//! quaternion) or as a [`Frame`] (translation + 3x3 rotation matrix, built
//! e.g. from roll/pitch/yaw). Both are converted to a [`TransformStamped`]
//! before going on the wire.

use crate::messages::{self, Header, Transform, TransformStamped};
use crate::{CrtkError, Result};
use nalgebra::{Matrix3, Quaternion, Rotation3, Unit, UnitQuaternion, Vector3};

/// Tolerance used when checking a rotation matrix for orthonormality
const ORTHONORMAL_TOLERANCE: f64 = 1e-6;

/// Allowed deviation from unit length for a command quaternion
const UNIT_NORM_TOLERANCE: f64 = 1e-6;

/// Smallest quaternion norm accepted from the wire
const MIN_QUATERNION_NORM: f64 = 1e-9;

/// Translation + unit quaternion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub translation: Vector3<f64>,
    pub rotation: UnitQuaternion<f64>,
}

impl Pose {
    pub fn new(translation: Vector3<f64>, rotation: UnitQuaternion<f64>) -> Self {
        Self { translation, rotation }
    }

    /// Fails with `InvalidArgument` on any non-finite component or a
    /// rotation that is not a unit quaternion
    pub fn validate(&self) -> Result<()> {
        if !self.translation.iter().all(|v| v.is_finite()) {
            return Err(CrtkError::invalid_argument(format!(
                "pose translation must be finite, got {:?}",
                self.translation.as_slice()
            )));
        }
        if !self.rotation.coords.iter().all(|v| v.is_finite()) {
            return Err(CrtkError::invalid_argument(format!(
                "pose rotation must be finite, got {:?}",
                self.rotation.coords.as_slice()
            )));
        }
        let norm = self.rotation.norm();
        if (norm - 1.0).abs() > UNIT_NORM_TOLERANCE {
            return Err(CrtkError::invalid_argument(format!(
                "pose rotation must be a unit quaternion, norm is {}",
                norm
            )));
        }
        Ok(())
    }

    pub fn to_transform(&self) -> Transform {
        let q = self.rotation.quaternion();
        Transform {
            translation: messages::Vector3 {
                x: self.translation.x,
                y: self.translation.y,
                z: self.translation.z,
            },
            rotation: messages::Quaternion {
                x: q.i,
                y: q.j,
                z: q.k,
                w: q.w,
            },
        }
    }

    /// Wrap into a wire message stamped with the current time
    pub fn to_transform_stamped(&self) -> TransformStamped {
        TransformStamped {
            header: Header::stamped_now(),
            child_frame_id: String::new(),
            transform: self.to_transform(),
        }
    }
}

impl TryFrom<&Transform> for Pose {
    type Error = CrtkError;

    fn try_from(t: &Transform) -> Result<Self> {
        let r = t.rotation;
        let q = Quaternion::new(r.w, r.x, r.y, r.z);
        let norm = q.norm();
        if !norm.is_finite() || norm < MIN_QUATERNION_NORM {
            return Err(CrtkError::invalid_argument(format!(
                "degenerate rotation quaternion {:?}",
                r
            )));
        }
        let pose = Pose::new(
            Vector3::new(t.translation.x, t.translation.y, t.translation.z),
            Unit::new_normalize(q),
        );
        pose.validate()?;
        Ok(pose)
    }
}

impl TryFrom<&TransformStamped> for Pose {
    type Error = CrtkError;

    fn try_from(msg: &TransformStamped) -> Result<Self> {
        Pose::try_from(&msg.transform)
    }
}

/// Translation + rotation matrix
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub m: Matrix3<f64>,
    pub p: Vector3<f64>,
}

impl Frame {
    pub fn new(m: Matrix3<f64>, p: Vector3<f64>) -> Self {
        Self { m, p }
    }

    /// Rotation about fixed X (roll), then Y (pitch), then Z (yaw)
    pub fn from_rpy(roll: f64, pitch: f64, yaw: f64, p: Vector3<f64>) -> Self {
        let r = Rotation3::from_euler_angles(roll, pitch, yaw);
        Self::new(*r.matrix(), p)
    }

    /// Returns (roll, pitch, yaw)
    pub fn rpy(&self) -> (f64, f64, f64) {
        Rotation3::from_matrix_unchecked(self.m).euler_angles()
    }

    /// Fails with `InvalidArgument` unless the matrix is a proper rotation
    /// and every component is finite.
    pub fn validate(&self) -> Result<()> {
        if !self.p.iter().all(|v| v.is_finite()) || !self.m.iter().all(|v| v.is_finite()) {
            return Err(CrtkError::invalid_argument("frame contains non-finite values"));
        }
        let deviation = (self.m.transpose() * self.m - Matrix3::identity()).abs().max();
        if deviation > ORTHONORMAL_TOLERANCE {
            return Err(CrtkError::invalid_argument(format!(
                "frame rotation is not orthonormal (deviation {:e})",
                deviation
            )));
        }
        if self.m.determinant() <= 0.0 {
            return Err(CrtkError::invalid_argument(
                "frame rotation is a reflection, not a rotation",
            ));
        }
        Ok(())
    }

    /// Convert to quaternion form. Call [`Frame::validate`] first for
    /// matrices that did not come from a rotation constructor.
    pub fn to_pose(&self) -> Pose {
        let rotation =
            UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(self.m));
        Pose::new(self.p, rotation)
    }
}

impl From<Pose> for Frame {
    fn from(pose: Pose) -> Self {
        Frame::new(*pose.rotation.to_rotation_matrix().matrix(), pose.translation)
    }
}

/// Cartesian command accepted by `servo_pose`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CartesianTarget {
    Pose(Pose),
    Frame(Frame),
}

impl CartesianTarget {
    /// Validate and lower into the wire message
    pub fn to_message(&self) -> Result<TransformStamped> {
        let pose = match self {
            CartesianTarget::Pose(pose) => {
                pose.validate()?;
                *pose
            }
            CartesianTarget::Frame(frame) => {
                frame.validate()?;
                frame.to_pose()
            }
        };
        Ok(pose.to_transform_stamped())
    }
}

impl From<Pose> for CartesianTarget {
    fn from(pose: Pose) -> Self {
        CartesianTarget::Pose(pose)
    }
}

impl From<Frame> for CartesianTarget {
    fn from(frame: Frame) -> Self {
        CartesianTarget::Frame(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_pose_message_copies_components_exactly() {
        let rotation = Unit::new_unchecked(Quaternion::new(0.5, 0.5, -0.5, 0.5));
        let pose = Pose::new(Vector3::new(0.25, -0.2, -1.0), rotation);
        let msg = CartesianTarget::from(pose).to_message().unwrap();

        let t = msg.transform;
        assert_eq!((t.translation.x, t.translation.y, t.translation.z), (0.25, -0.2, -1.0));
        assert_eq!((t.rotation.x, t.rotation.y, t.rotation.z, t.rotation.w), (0.5, -0.5, 0.5, 0.5));
    }

    #[test]
    fn test_frame_rotation_survives_conversion() {
        let frame = Frame::from_rpy(PI, 0.0, PI / 2.0, Vector3::new(0.0, 0.0, -1.0));
        let msg = CartesianTarget::from(frame).to_message().unwrap();
        let back = Frame::from(Pose::try_from(&msg).unwrap());

        assert!((back.m - frame.m).abs().max() < 1e-9);
        assert!((back.p - frame.p).norm() < 1e-12);
    }

    #[test]
    fn test_rpy_yaw_only() {
        let frame = Frame::from_rpy(0.0, 0.0, PI / 2.0, Vector3::zeros());
        // +X maps to +Y under a quarter turn about Z
        let x = frame.m * Vector3::x();
        assert!((x - Vector3::y()).norm() < 1e-12);

        let (roll, pitch, yaw) = frame.rpy();
        assert!(roll.abs() < 1e-12);
        assert!(pitch.abs() < 1e-12);
        assert!((yaw - PI / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_non_finite_pose_rejected() {
        let pose = Pose::new(Vector3::new(f64::NAN, 0.0, 0.0), UnitQuaternion::identity());
        let err = CartesianTarget::from(pose).to_message().unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_non_unit_quaternion_rejected() {
        for coords in [(0.0, 0.0, 0.0, 0.0), (2.0, 0.0, 0.0, 0.0)] {
            let (w, i, j, k) = coords;
            let rotation = Unit::new_unchecked(Quaternion::new(w, i, j, k));
            let pose = Pose::new(Vector3::zeros(), rotation);
            assert!(pose.validate().unwrap_err().is_invalid_argument());
        }
    }

    #[test]
    fn test_scaled_matrix_rejected() {
        let frame = Frame::new(Matrix3::identity() * 2.0, Vector3::zeros());
        assert!(frame.validate().unwrap_err().is_invalid_argument());
    }

    #[test]
    fn test_reflection_rejected() {
        let mut m = Matrix3::identity();
        m[(2, 2)] = -1.0;
        let frame = Frame::new(m, Vector3::zeros());
        assert!(frame.validate().unwrap_err().is_invalid_argument());
    }

    #[test]
    fn test_zero_quaternion_from_wire_rejected() {
        let transform = Transform {
            translation: messages::Vector3::default(),
            rotation: messages::Quaternion { x: 0.0, y: 0.0, z: 0.0, w: 0.0 },
        };
        assert!(Pose::try_from(&transform).unwrap_err().is_invalid_argument());
    }

    #[test]
    fn test_unnormalized_wire_quaternion_is_normalized() {
        let transform = Transform {
            translation: messages::Vector3 { x: 1.0, y: 2.0, z: 3.0 },
            rotation: messages::Quaternion { x: 0.0, y: 0.0, z: 0.0, w: 2.0 },
        };
        let pose = Pose::try_from(&transform).unwrap();
        assert!((pose.rotation.angle_to(&UnitQuaternion::identity())).abs() < 1e-12);
        assert_eq!(pose.translation, Vector3::new(1.0, 2.0, 3.0));
    }
}
