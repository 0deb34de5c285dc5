//! CRTK Example
//!
//! Walks through the client API against the surgical robotics simulation:
//! reads the state of PSM1, PSM2, the ECM and a few scene landmarks, then
//! sends cartesian and joint-space commands to the arms.

use anyhow::{Context, Result};
use clap::Parser;
use nalgebra::Vector3;
use std::f64::consts::PI;
use std::fmt::Display;
use surgical_crtk::{
    ArmInterface, ArmType, ClientConfig, Frame, Node, SceneInterface, SceneObject, TransportKind,
};
use tokio::time::{sleep, Duration};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "crtk_example")]
#[command(about = "Example CRTK client for the surgical robotics simulation")]
#[command(version)]
struct Args {
    /// Path to the client configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Run against the in-process loopback transport instead of the network
    #[arg(long)]
    loopback: bool,
}

impl Args {
    fn get_config_path(&self) -> String {
        self.config
            .clone()
            .or_else(|| std::env::var("CRTK_CONFIG").ok())
            .unwrap_or_else(|| "config/default_config.yaml".to_string())
    }
}

fn show<T: Display>(sample: Option<T>) -> String {
    sample.map_or_else(|| "None".to_string(), |s| s.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = args.get_config_path();
    info!("Using config: {}", config_path);
    let mut config = ClientConfig::load_or_default(&config_path)
        .with_context(|| format!("Failed to load config {}", config_path))?;
    if args.loopback {
        config.transport.kind = TransportKind::Loopback;
    }

    let node = Node::init(&config).await.context("Failed to initialize node")?;
    info!("Running example as node '{}'", node.name());

    let psm1 = ArmInterface::new(&node, ArmType::Psm1)
        .await
        .context("Failed to create PSM1 handle")?;
    let psm2 = ArmInterface::new(&node, ArmType::Psm2)
        .await
        .context("Failed to create PSM2 handle")?;
    let ecm = ArmInterface::new(&node, ArmType::Ecm)
        .await
        .context("Failed to create ECM handle")?;
    let scene = SceneInterface::new(&node).await.context("Failed to create scene handle")?;

    // Let the first samples arrive
    sleep(Duration::from_millis(config.settle_ms)).await;

    println!("PSM1 End-effector pose in Base Frame {}", show(psm1.measured_pose()));
    println!("PSM1 Base pose in World Frame {}", show(psm1.measured_base_pose()));
    println!("PSM1 Joint state {}", show(psm1.measured_joint_positions()));
    println!("---------");
    println!("PSM2 End-effector pose in Base Frame {}", show(psm2.measured_pose()));
    println!("PSM2 Base pose in World Frame {}", show(psm2.measured_base_pose()));
    println!("PSM2 Joint state {}", show(psm2.measured_joint_positions()));
    println!("---------");
    // The ECM reports its pose directly in the world frame
    println!("ECM pose in World {}", show(ecm.measured_pose()));
    println!("---------");
    println!("Entry 1 pose in World {}", show(scene.measured_pose(SceneObject::Entry1)));
    println!("Exit 4 pose in World {}", show(scene.measured_pose(SceneObject::Exit4)));

    // servo_cp sets the end-effector pose w.r.t. the arm's base frame
    let t_e_b = Frame::from_rpy(PI, 0.0, PI / 2.0, Vector3::new(0.0, 0.0, -1.0));
    println!("Setting the end-effector frame of PSM1 w.r.t Base {:?}", t_e_b.p.as_slice());
    psm1.servo_pose(t_e_b).await.context("PSM1 servo_cp failed")?;
    println!("---------");
    let t_e_b = Frame::from_rpy(PI, 0.0, PI / 4.0, Vector3::new(0.0, -0.2, -1.0));
    println!("Setting the end-effector frame of PSM2 w.r.t Base {:?}", t_e_b.p.as_slice());
    psm2.servo_pose(t_e_b).await.context("PSM2 servo_cp failed")?;
    println!("---------");

    let jp = [0.0, 0.0, 1.0, 0.5, 0.7, 0.9];
    println!("Setting PSM1 joint positions to {:?}", jp);
    psm1.servo_joint_positions(&jp).await.context("PSM1 servo_jp failed")?;
    let jp = [0.0, 0.0, 1.0, -0.5, -0.7, -0.9];
    println!("Setting PSM2 joint positions to {:?}", jp);
    psm2.servo_joint_positions(&jp).await.context("PSM2 servo_jp failed")?;
    println!("---------");

    // The ECM is controlled through its joint interface
    let jp = [0.0, 0.0, 0.5, 0.3];
    println!("Setting ECM joint positions to {:?}", jp);
    ecm.servo_joint_positions(&jp).await.context("ECM servo_jp failed")?;

    println!("END");

    drop((psm1, psm2, ecm, scene));
    node.shutdown().await.context("Failed during shutdown")?;
    Ok(())
}
