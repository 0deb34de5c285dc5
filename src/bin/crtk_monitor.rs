//! CRTK Monitor
//!
//! Subscribes to the arm and/or scene topics and logs the latest samples at
//! a fixed period. Run it alongside the simulator to check that the
//! measured streams are flowing.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use surgical_crtk::{ArmInterface, ArmType, ClientConfig, Node, SceneInterface, SceneObject};
use tokio::time::{interval, Duration};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, ValueEnum)]
enum StreamFilter {
    Arms,
    Scene,
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the client configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Which streams to monitor (omit for both)
    #[arg(short, long, value_enum)]
    streams: Option<StreamFilter>,

    /// Reporting period in milliseconds
    #[arg(short, long, default_value_t = 1000)]
    period_ms: u64,
}

impl Args {
    fn get_config_path(&self) -> String {
        self.config
            .clone()
            .or_else(|| std::env::var("CRTK_CONFIG").ok())
            .unwrap_or_else(|| "config/default_config.yaml".to_string())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Starting CRTK Monitor");

    let config_path = args.get_config_path();
    info!("Using config: {}", config_path);
    let config = ClientConfig::load_or_default(&config_path)
        .with_context(|| format!("Failed to load config {}", config_path))?;
    let node = Node::init(&config).await.context("Failed to initialize node")?;
    info!("Monitoring as node '{}'", node.name());

    let mut arms = Vec::new();
    if matches!(args.streams, None | Some(StreamFilter::Arms)) {
        for arm in ArmType::ALL {
            arms.push(ArmInterface::new(&node, arm).await?);
        }
    }
    let scene = if matches!(args.streams, None | Some(StreamFilter::Scene)) {
        Some(SceneInterface::new(&node).await?)
    } else {
        None
    };

    info!("Listening for samples... (Ctrl+C to stop)");
    let mut ticker = interval(Duration::from_millis(args.period_ms.max(1)));

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                for arm in &arms {
                    match arm.measured_pose() {
                        Some(cp) => info!("{} measured_cp: {}", arm.arm(), cp),
                        None => warn!("{} measured_cp: no sample yet", arm.arm()),
                    }
                    if let Some(jp) = arm.measured_joint_positions() {
                        info!("{} measured_jp: {}", arm.arm(), jp);
                    }
                }
                if let Some(scene) = &scene {
                    for object in SceneObject::ALL {
                        if let Some(pose) = scene.measured_pose(object) {
                            info!("{}: {}", object, pose);
                        }
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received, stopping");
                break;
            }
        }
    }

    drop((arms, scene));
    node.shutdown().await.context("Failed during shutdown")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_config_wins() {
        let args = Args::parse_from(["crtk_monitor", "--config", "config/lab.yaml"]);
        assert_eq!(args.get_config_path(), "config/lab.yaml");
    }

    #[test]
    fn test_config_path_defaults_without_flag() {
        let args = Args::parse_from(["crtk_monitor"]);
        let expected = std::env::var("CRTK_CONFIG")
            .unwrap_or_else(|_| "config/default_config.yaml".to_string());
        assert_eq!(args.get_config_path(), expected);
    }
}
