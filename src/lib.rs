//! Surgical CRTK - pose and joint client for the surgical robotics simulation
//!
//! Talks to the simulated patient-side manipulators, the camera arm and the
//! scene landmarks over a topic-based pub/sub transport, following the CRTK
//! naming convention (`measured_cp`, `measured_jp`, `servo_cp`, `servo_jp`).
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use surgical_crtk::{ArmInterface, ArmType, ClientConfig, Node, SceneInterface, SceneObject};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let node = Node::init(&ClientConfig::load("config/default_config.yaml")?).await?;
//!
//!     let psm1 = ArmInterface::new(&node, ArmType::Psm1).await?;
//!     let scene = SceneInterface::new(&node).await?;
//!
//!     println!("PSM1 pose: {:?}", psm1.measured_pose());
//!     println!("Needle pose: {:?}", scene.measured_pose(SceneObject::Needle));
//!
//!     psm1.servo_joint_positions(&[0.0, 0.0, 1.0, 0.5, 0.7, 0.9]).await?;
//!     node.shutdown().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - **Node**: transport session, codec and namespaces; explicit init/shutdown
//! - **ArmInterface**: latest pose/joint samples of one arm plus servo commands
//! - **SceneInterface**: latest pose of each scene landmark
//! - **Transport**: pub/sub seam, implemented by Zenoh and an in-process loopback

pub mod arm;
pub mod codec;
pub mod config;
pub mod error;
pub mod geometry;
pub mod loopback;
pub mod messages;
pub mod node;
pub mod sample;
pub mod scene;
pub mod transport;
pub mod zenoh_transport;

pub use arm::{ArmInterface, ArmType};
pub use codec::Codec;
pub use config::{ClientConfig, NamespaceConfig, SessionMode, TransportConfig, TransportKind};
pub use error::{CrtkError, Result};
pub use geometry::{CartesianTarget, Frame, Pose};
pub use loopback::LoopbackTransport;
pub use messages::{Header, JointState, Time, TransformStamped};
pub use node::Node;
pub use sample::LatestSample;
pub use scene::{SceneInterface, SceneObject};
pub use transport::{SampleHandler, Subscription, TopicPublisher, Transport};

#[cfg(feature = "zenoh-integration")]
pub use zenoh_transport::ZenohTransport;
